pub mod auth;
pub mod config;
pub mod desk;
pub mod error;
pub mod execute;
pub mod form;
pub mod geo;
pub mod msg;
pub mod query;
pub mod state;

pub use crate::auth::{AuthError, AuthProvider, AuthSession, InMemoryAuth};
pub use crate::config::DeskConfig;
pub use crate::desk::LeadDesk;
pub use crate::error::DeskError;
pub use crate::form::AffiliateForm;
pub use crate::geo::{clean_ip, CachedLocator, GeoLocator, StaticLocator, UNKNOWN_IP};
pub use crate::msg::{Env, ExecuteMsg, LeadFilter, MessageInfo, QueryMsg, SubmissionForm};
pub use crate::query::whatsapp_link;
pub use crate::state::{StoreError, TicketStore};
