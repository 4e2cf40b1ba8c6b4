use thiserror::Error;

use crate::auth::AuthError;
use crate::state::StoreError;

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("{what} not found")]
    NotFound { what: String },

    #[error("ticket {ticket_number} not found")]
    TicketNotFound { ticket_number: String },

    #[error("invalid CPF")]
    InvalidCpf,

    #[error("invalid form: {reason}")]
    InvalidForm { reason: String },

    #[error("no free ticket number after {attempts} attempts")]
    TicketSpaceExhausted { attempts: u32 },

    #[error("{0}")]
    Auth(#[from] AuthError),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Serialization(#[from] serde_json::Error),
}

impl DeskError {
    /// Copy shown to the operator or visitor for this failure.
    pub fn user_message(&self) -> String {
        match self {
            DeskError::Unauthorized { .. } => "Usuário não autenticado".to_string(),
            DeskError::TicketNotFound { .. } => "Código do ticket não existe!".to_string(),
            DeskError::NotFound { .. } => "Registro não encontrado".to_string(),
            DeskError::InvalidCpf => "CPF inválido".to_string(),
            DeskError::InvalidForm { reason } => reason.clone(),
            DeskError::TicketSpaceExhausted { .. } => {
                "Não foi possível gerar o ticket. Tente novamente.".to_string()
            }
            DeskError::Auth(AuthError::InvalidCredentials) => {
                "Email ou senha incorretos".to_string()
            }
            DeskError::Auth(_) => "Erro ao fazer login".to_string(),
            DeskError::Store(_) | DeskError::Serialization(_) => {
                "Erro ao processar a solicitação".to_string()
            }
        }
    }
}

/// Turns a store miss into the desk's own `NotFound`.
pub(crate) fn not_found(err: StoreError) -> DeskError {
    match err {
        StoreError::NotFound { what } => DeskError::NotFound { what },
        other => DeskError::Store(other),
    }
}
