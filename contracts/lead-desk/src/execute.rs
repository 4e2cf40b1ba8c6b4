use bravo_common::{
    strip_non_digits, validate_cpf, Event, Lead, PageView, Response, Ticket, TicketNumber,
    ViewLocation,
};
use rand::Rng;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{not_found, DeskError};
use crate::geo::UNKNOWN_IP;
use crate::msg::{Env, SubmissionForm};
use crate::state::{ContactQuery, DepsMut, StoreError};

/// Lowest and highest printable ticket numbers.
const TICKET_MIN: u32 = 100_000;
const TICKET_MAX: u32 = 999_999;

/// Store an affiliate-form submission as a lead.
pub fn submit_form(
    deps: DepsMut,
    env: &Env,
    form: SubmissionForm,
    ip_address: Option<String>,
) -> Result<Response, DeskError> {
    let name = required(&form.name, "Por favor, insira seu nome")?;
    let phone = required(&form.phone, "Por favor, insira seu telefone")?;
    let email = form.email.trim().to_string();
    if !email.contains('@') {
        return Err(DeskError::InvalidForm {
            reason: "Por favor, insira um email válido".to_string(),
        });
    }
    let cpf = match form.cpf.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => {
            if !validate_cpf(raw) {
                return Err(DeskError::InvalidCpf);
            }
            Some(raw.to_string())
        }
        _ => None,
    };

    let lead = Lead {
        id: Uuid::new_v4(),
        name,
        phone,
        email,
        experience: form.experience,
        monthly_revenue: form.monthly_revenue,
        traffic_source: form.traffic_source,
        cpf,
        ip_address: ip_address.filter(|ip| !ip.trim().is_empty()),
        submitted_at: env.now,
        contacted: false,
        contact_date: None,
    };
    deps.leads.insert(lead.clone())?;

    info!(lead_id = %lead.id, experience = lead.experience.label(), "lead submitted");

    let submitted = Event::new("lead_submitted")
        .add_attribute("lead_id", lead.id.to_string())
        .add_attribute("experience", lead.experience.label())
        .add_attribute(
            "traffic_source",
            lead.traffic_source.clone().unwrap_or_default(),
        );
    let conversion = Event::new("conversion")
        .add_attribute("value", "1.0")
        .add_attribute("currency", "BRL")
        .add_attribute("content_name", "affiliate_signup");

    Ok(Response::new()
        .add_attribute("action", "submit_form")
        .add_attribute("lead_id", lead.id.to_string())
        .add_event(submitted)
        .add_event(conversion)
        .set_data(&lead)?)
}

/// Issue a raffle ticket, or hand back the one this contact already holds.
pub fn issue_ticket(
    deps: DepsMut,
    env: &Env,
    holder_name: String,
    phone: String,
    email: String,
    cpf: String,
) -> Result<Response, DeskError> {
    if !validate_cpf(&cpf) {
        return Err(DeskError::InvalidCpf);
    }
    let holder_name = required(&holder_name, "Por favor, insira seu nome")?;
    let phone = required(&phone, "Por favor, insira seu telefone")?;
    let email = email.trim().to_string();
    if !email.contains('@') {
        return Err(DeskError::InvalidForm {
            reason: "Por favor, insira um email válido".to_string(),
        });
    }
    let national_id = strip_non_digits(&cpf);

    let query = ContactQuery {
        cpf: Some(national_id.clone()),
        email: Some(email.clone()),
        phone: Some(phone.clone()),
    };
    if let Some(existing) = deps.tickets.find_by_contact(&query)? {
        debug!(ticket_number = %existing.ticket_number, "contact already holds a ticket");
        return Ok(Response::new()
            .add_attribute("action", "issue_ticket")
            .add_attribute("ticket_number", existing.ticket_number.to_string())
            .add_attribute("existing", "true")
            .set_data(&existing)?);
    }

    let attempts = deps.config.ticket_attempts;
    let mut ticket_number = None;
    for _ in 0..attempts {
        let candidate = TicketNumber::from(deps.rng.gen_range(TICKET_MIN..=TICKET_MAX));
        if !deps.tickets.exists(&candidate)? {
            ticket_number = Some(candidate);
            break;
        }
    }
    let ticket_number = ticket_number.ok_or(DeskError::TicketSpaceExhausted { attempts })?;

    let ticket = Ticket {
        ticket_number,
        holder_name,
        phone,
        email,
        national_id,
        validated: false,
        created_at: env.now,
    };
    deps.tickets.insert(ticket.clone())?;

    info!(ticket_number = %ticket.ticket_number, "ticket issued");

    Ok(Response::new()
        .add_attribute("action", "issue_ticket")
        .add_attribute("ticket_number", ticket.ticket_number.to_string())
        .add_attribute("existing", "false")
        .add_event(
            Event::new("ticket_issued")
                .add_attribute("ticket_number", ticket.ticket_number.to_string()),
        )
        .set_data(&ticket)?)
}

pub fn record_page_view(
    deps: DepsMut,
    env: &Env,
    ip_address: Option<String>,
    location: Option<ViewLocation>,
) -> Result<Response, DeskError> {
    let ip_address = ip_address
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .unwrap_or_else(|| UNKNOWN_IP.to_string());

    deps.views.insert(PageView {
        ip_address: ip_address.clone(),
        location,
        timestamp: env.now,
    })?;

    debug!(ip = %ip_address, "page view recorded");

    Ok(Response::new()
        .add_attribute("action", "record_page_view")
        .add_event(Event::new("page_view").add_attribute("ip_address", ip_address)))
}

/// Admin: mark a ticket as eligible for the raffle.
pub fn validate_ticket(deps: DepsMut, ticket_number: String) -> Result<Response, DeskError> {
    let number = TicketNumber::new(ticket_number);
    let ticket = deps
        .tickets
        .mark_validated(&number)
        .map_err(|err| match err {
            StoreError::NotFound { .. } => DeskError::TicketNotFound {
                ticket_number: number.to_string(),
            },
            other => DeskError::Store(other),
        })?;

    info!(ticket_number = %ticket.ticket_number, "ticket validated");

    Ok(Response::new()
        .add_attribute("action", "validate_ticket")
        .add_attribute("ticket_number", ticket.ticket_number.to_string())
        .add_event(
            Event::new("ticket_validated")
                .add_attribute("ticket_number", ticket.ticket_number.to_string()),
        )
        .set_data(&ticket)?)
}

/// Admin: flag a lead as contacted, stamping the date, or clear the flag.
pub fn set_contacted(
    deps: DepsMut,
    env: &Env,
    id: Uuid,
    contacted: bool,
) -> Result<Response, DeskError> {
    let mut lead = deps
        .leads
        .get(&id)?
        .ok_or_else(|| DeskError::NotFound {
            what: format!("lead {id}"),
        })?;

    lead.contacted = contacted;
    lead.contact_date = contacted.then_some(env.now);
    deps.leads.update(lead.clone()).map_err(not_found)?;

    info!(lead_id = %id, contacted, "lead contact status changed");

    Ok(Response::new()
        .add_attribute("action", "set_contacted")
        .add_attribute("lead_id", id.to_string())
        .add_attribute("contacted", contacted.to_string())
        .set_data(&lead)?)
}

pub fn delete_lead(deps: DepsMut, id: Uuid) -> Result<Response, DeskError> {
    deps.leads.delete(&id).map_err(not_found)?;

    info!(lead_id = %id, "lead deleted");

    Ok(Response::new()
        .add_attribute("action", "delete_lead")
        .add_attribute("lead_id", id.to_string()))
}

fn required(value: &str, reason: &str) -> Result<String, DeskError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DeskError::InvalidForm {
            reason: reason.to_string(),
        });
    }
    Ok(value.to_string())
}
