use std::collections::BTreeMap;

use bravo_common::{Experience, GeoLocation, Lead, PageView, Ticket, ViewLocation};
use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ambient facts about the call, mirroring a block environment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Env {
    pub now: DateTime<Utc>,
}

impl Env {
    pub fn now() -> Self {
        Self { now: Utc::now() }
    }

    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}

/// Who is calling: an admin session token, when there is one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MessageInfo {
    pub token: Option<String>,
}

impl MessageInfo {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, JsonSchema)]
pub struct SubmissionForm {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub experience: Experience,
    pub monthly_revenue: Option<String>,
    pub traffic_source: Option<String>,
    pub cpf: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExecuteMsg {
    SubmitForm {
        form: SubmissionForm,
        ip_address: Option<String>,
    },
    IssueTicket {
        holder_name: String,
        phone: String,
        email: String,
        cpf: String,
    },
    RecordPageView {
        ip_address: Option<String>,
        location: Option<ViewLocation>,
    },
    ValidateTicket {
        ticket_number: String,
    },
    SetContacted {
        id: Uuid,
        contacted: bool,
    },
    DeleteLead {
        id: Uuid,
    },
}

impl ExecuteMsg {
    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            ExecuteMsg::ValidateTicket { .. }
                | ExecuteMsg::SetContacted { .. }
                | ExecuteMsg::DeleteLead { .. }
        )
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
pub struct LeadFilter {
    /// Case-insensitive match against name, phone or IP.
    pub search: Option<String>,
    pub experience: Option<Experience>,
    /// Inclusive, whole days in UTC.
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QueryMsg {
    Leads {
        #[serde(default)]
        filter: LeadFilter,
    },
    PageViews {},
    ValidatedTickets {},
    FindTicket {
        cpf: Option<String>,
        email: Option<String>,
        phone: Option<String>,
    },
    LeadLocations {},
    WhatsAppLink {
        phone: String,
    },
}

impl QueryMsg {
    pub fn requires_admin(&self) -> bool {
        !matches!(
            self,
            QueryMsg::FindTicket { .. } | QueryMsg::WhatsAppLink { .. }
        )
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
pub struct ExperienceCounts {
    pub yes: usize,
    pub no: usize,
    pub dont_know: usize,
    pub total: usize,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct LeadsResponse {
    pub leads: Vec<Lead>,
    pub counts: ExperienceCounts,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct PageViewsResponse {
    pub views: Vec<PageView>,
    pub unique: usize,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct TicketsResponse {
    pub tickets: Vec<Ticket>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct TicketResponse {
    pub ticket: Option<Ticket>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct LocationsResponse {
    pub locations: BTreeMap<String, GeoLocation>,
    /// Leads per located IP; the heat-map weight of each point.
    pub counts: BTreeMap<String, u32>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, JsonSchema)]
pub struct WhatsAppLinkResponse {
    pub url: String,
}
