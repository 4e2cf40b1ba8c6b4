use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier printed on a raffle ticket.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, JsonSchema)]
#[serde(transparent)]
pub struct TicketNumber(String);

impl TicketNumber {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters, used to pace the reveal of this field.
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}

impl From<u32> for TicketNumber {
    fn from(value: u32) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for TicketNumber {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for TicketNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A raffle participant. Only `validated` ever changes after creation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct Ticket {
    pub ticket_number: TicketNumber,
    pub holder_name: String,
    pub phone: String,
    pub email: String,
    pub national_id: String,
    #[serde(default)]
    pub validated: bool,
    pub created_at: DateTime<Utc>,
}

/// Answer to "do you already work as an iGaming affiliate?".
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, JsonSchema)]
pub enum Experience {
    #[serde(rename = "SIM")]
    Yes,
    #[serde(rename = "NÃO")]
    No,
    #[serde(rename = "NÃO SEI O QUE É")]
    DontKnow,
}

impl Experience {
    pub const ALL: [Experience; 3] = [Experience::Yes, Experience::No, Experience::DontKnow];

    pub fn label(&self) -> &'static str {
        match self {
            Experience::Yes => "SIM",
            Experience::No => "NÃO",
            Experience::DontKnow => "NÃO SEI O QUE É",
        }
    }
}

/// One affiliate-form submission, as listed on the admin dashboard.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct Lead {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub experience: Experience,
    pub monthly_revenue: Option<String>,
    pub traffic_source: Option<String>,
    pub cpf: Option<String>,
    pub ip_address: Option<String>,
    pub submitted_at: DateTime<Utc>,
    #[serde(default)]
    pub contacted: bool,
    pub contact_date: Option<DateTime<Utc>>,
}

/// Coarse location stored alongside a landing-page view.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct ViewLocation {
    pub city: String,
    pub region: String,
    pub country: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct PageView {
    pub ip_address: String,
    pub location: Option<ViewLocation>,
    pub timestamp: DateTime<Utc>,
}

/// Result of an IP geolocation lookup.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct GeoLocation {
    pub lat: f64,
    pub lng: f64,
    pub city: String,
    pub region: String,
    pub country: String,
}

impl GeoLocation {
    /// Builds a location from a partial lookup, filling the unknown names.
    pub fn from_parts(
        lat: f64,
        lng: f64,
        city: Option<String>,
        region: Option<String>,
        country: Option<String>,
    ) -> Self {
        let or_unknown = |value: Option<String>, unknown: &str| {
            value
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| unknown.to_string())
        };
        Self {
            lat,
            lng,
            city: or_unknown(city, "Cidade desconhecida"),
            region: or_unknown(region, "Região desconhecida"),
            country: or_unknown(country, "País desconhecido"),
        }
    }
}
