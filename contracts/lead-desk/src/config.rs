use std::time::Duration;

use bravo_common::env::{try_load, try_load_millis};
use bravo_common::ConfigError;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct DeskConfig {
    /// Views from the same IP closer than this count once.
    pub page_view_dedup: Duration,
    /// Dialling prefix for WhatsApp links, digits only.
    pub whatsapp_country_code: String,
    /// Random draws tried before ticket issuance gives up.
    pub ticket_attempts: u32,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            page_view_dedup: Duration::from_millis(5000),
            whatsapp_country_code: "55".to_string(),
            ticket_attempts: 32,
        }
    }
}

impl DeskConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let d = Self::default();
        let config = Self {
            page_view_dedup: try_load_millis("DESK_PAGE_VIEW_DEDUP_MS", d.page_view_dedup)?,
            whatsapp_country_code: try_load("DESK_WHATSAPP_COUNTRY_CODE", d.whatsapp_country_code)?,
            ticket_attempts: try_load("DESK_TICKET_ATTEMPTS", d.ticket_attempts)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ticket_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "ticket_attempts".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.whatsapp_country_code.is_empty()
            || !self.whatsapp_country_code.chars().all(|c| c.is_ascii_digit())
        {
            return Err(ConfigError::Invalid {
                key: "whatsapp_country_code".to_string(),
                reason: format!("expected digits, got {:?}", self.whatsapp_country_code),
            });
        }
        Ok(())
    }
}
