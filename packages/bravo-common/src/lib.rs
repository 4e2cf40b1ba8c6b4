pub mod analytics;
pub mod cpf;
pub mod digest;
pub mod env;
pub mod mask;
pub mod response;
pub mod types;

pub use analytics::{EventSink, MemorySink, NullSink, TracingSink};
pub use cpf::{strip_non_digits, validate_cpf, Cpf, InvalidCpf};
pub use digest::{pool_digest, seed_commitment};
pub use env::ConfigError;
pub use mask::{mask_email, mask_name, mask_national_id};
pub use response::{Event, Response};
pub use types::{Experience, GeoLocation, Lead, PageView, Ticket, TicketNumber, ViewLocation};
