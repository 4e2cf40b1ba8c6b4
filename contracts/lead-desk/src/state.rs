//! Record stores the desk reads and writes through, plus in-memory versions.

use bravo_common::{strip_non_digits, Lead, PageView, Ticket, TicketNumber};
use rand::RngCore;
use thiserror::Error;
use uuid::Uuid;

use crate::config::DeskConfig;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{what} not found")]
    NotFound { what: String },

    #[error("{what} already exists")]
    Duplicate { what: String },

    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Contact fields a visitor can look their ticket up by. Empty fields are
/// ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContactQuery {
    pub cpf: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl ContactQuery {
    pub fn is_empty(&self) -> bool {
        [&self.cpf, &self.email, &self.phone]
            .iter()
            .all(|field| field.as_deref().map_or(true, |v| v.trim().is_empty()))
    }

    /// True when any provided field matches `ticket`.
    pub fn matches(&self, ticket: &Ticket) -> bool {
        let digits_eq = |query: &Option<String>, stored: &str| {
            query.as_deref().map_or(false, |q| {
                let q = strip_non_digits(q);
                !q.is_empty() && q == strip_non_digits(stored)
            })
        };
        let email_eq = self.email.as_deref().map_or(false, |q| {
            let q = q.trim();
            !q.is_empty() && q.eq_ignore_ascii_case(ticket.email.trim())
        });

        digits_eq(&self.cpf, &ticket.national_id) || email_eq || digits_eq(&self.phone, &ticket.phone)
    }
}

pub trait TicketStore {
    /// Fails with `Duplicate` when the number is taken.
    fn insert(&mut self, ticket: Ticket) -> Result<(), StoreError>;
    fn get(&self, number: &TicketNumber) -> Result<Option<Ticket>, StoreError>;
    fn find_by_contact(&self, query: &ContactQuery) -> Result<Option<Ticket>, StoreError>;
    /// Validated tickets in insertion order: the raffle pool.
    fn fetch_validated(&self) -> Result<Vec<Ticket>, StoreError>;
    fn mark_validated(&mut self, number: &TicketNumber) -> Result<Ticket, StoreError>;

    fn exists(&self, number: &TicketNumber) -> Result<bool, StoreError> {
        Ok(self.get(number)?.is_some())
    }
}

pub trait LeadStore {
    fn insert(&mut self, lead: Lead) -> Result<(), StoreError>;
    fn get(&self, id: &Uuid) -> Result<Option<Lead>, StoreError>;
    fn update(&mut self, lead: Lead) -> Result<(), StoreError>;
    fn delete(&mut self, id: &Uuid) -> Result<(), StoreError>;
    fn list(&self) -> Result<Vec<Lead>, StoreError>;
}

pub trait PageViewStore {
    fn insert(&mut self, view: PageView) -> Result<(), StoreError>;
    fn list(&self) -> Result<Vec<PageView>, StoreError>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryTicketStore {
    tickets: Vec<Ticket>,
}

impl MemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }
}

impl TicketStore for MemoryTicketStore {
    fn insert(&mut self, ticket: Ticket) -> Result<(), StoreError> {
        if self.exists(&ticket.ticket_number)? {
            return Err(StoreError::Duplicate {
                what: format!("ticket {}", ticket.ticket_number),
            });
        }
        self.tickets.push(ticket);
        Ok(())
    }

    fn get(&self, number: &TicketNumber) -> Result<Option<Ticket>, StoreError> {
        Ok(self
            .tickets
            .iter()
            .find(|t| &t.ticket_number == number)
            .cloned())
    }

    fn find_by_contact(&self, query: &ContactQuery) -> Result<Option<Ticket>, StoreError> {
        Ok(self.tickets.iter().find(|t| query.matches(t)).cloned())
    }

    fn fetch_validated(&self) -> Result<Vec<Ticket>, StoreError> {
        Ok(self.tickets.iter().filter(|t| t.validated).cloned().collect())
    }

    fn mark_validated(&mut self, number: &TicketNumber) -> Result<Ticket, StoreError> {
        let ticket = self
            .tickets
            .iter_mut()
            .find(|t| &t.ticket_number == number)
            .ok_or_else(|| StoreError::NotFound {
                what: format!("ticket {number}"),
            })?;
        ticket.validated = true;
        Ok(ticket.clone())
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryLeadStore {
    leads: Vec<Lead>,
}

impl MemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LeadStore for MemoryLeadStore {
    fn insert(&mut self, lead: Lead) -> Result<(), StoreError> {
        if self.leads.iter().any(|l| l.id == lead.id) {
            return Err(StoreError::Duplicate {
                what: format!("lead {}", lead.id),
            });
        }
        self.leads.push(lead);
        Ok(())
    }

    fn get(&self, id: &Uuid) -> Result<Option<Lead>, StoreError> {
        Ok(self.leads.iter().find(|l| &l.id == id).cloned())
    }

    fn update(&mut self, lead: Lead) -> Result<(), StoreError> {
        let slot = self
            .leads
            .iter_mut()
            .find(|l| l.id == lead.id)
            .ok_or_else(|| StoreError::NotFound {
                what: format!("lead {}", lead.id),
            })?;
        *slot = lead;
        Ok(())
    }

    fn delete(&mut self, id: &Uuid) -> Result<(), StoreError> {
        let before = self.leads.len();
        self.leads.retain(|l| &l.id != id);
        if self.leads.len() == before {
            return Err(StoreError::NotFound {
                what: format!("lead {id}"),
            });
        }
        Ok(())
    }

    fn list(&self) -> Result<Vec<Lead>, StoreError> {
        Ok(self.leads.clone())
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryPageViewStore {
    views: Vec<PageView>,
}

impl MemoryPageViewStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PageViewStore for MemoryPageViewStore {
    fn insert(&mut self, view: PageView) -> Result<(), StoreError> {
        self.views.push(view);
        Ok(())
    }

    fn list(&self) -> Result<Vec<PageView>, StoreError> {
        Ok(self.views.clone())
    }
}

/// Mutable handles an execute handler works with.
pub struct DepsMut<'a> {
    pub tickets: &'a mut dyn TicketStore,
    pub leads: &'a mut dyn LeadStore,
    pub views: &'a mut dyn PageViewStore,
    pub config: &'a DeskConfig,
    pub rng: &'a mut dyn RngCore,
}

/// Read-only handles a query works with.
#[derive(Clone, Copy)]
pub struct Deps<'a> {
    pub tickets: &'a dyn TicketStore,
    pub leads: &'a dyn LeadStore,
    pub views: &'a dyn PageViewStore,
    pub config: &'a DeskConfig,
}
