use std::collections::BTreeMap;

use bravo_common::{strip_non_digits, Experience, Lead, PageView};
use chrono::Duration as ChronoDuration;

use crate::error::DeskError;
use crate::geo::{clean_ip, GeoLocator};
use crate::msg::{
    ExperienceCounts, LeadFilter, LeadsResponse, LocationsResponse, PageViewsResponse,
    TicketResponse, TicketsResponse, WhatsAppLinkResponse,
};
use crate::state::{ContactQuery, Deps};

pub fn query_leads(deps: Deps, filter: &LeadFilter) -> Result<LeadsResponse, DeskError> {
    let mut leads: Vec<Lead> = deps
        .leads
        .list()?
        .into_iter()
        .filter(|lead| lead_matches(lead, filter))
        .collect();
    leads.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));

    let counts = experience_counts(&leads);
    Ok(LeadsResponse { leads, counts })
}

pub fn lead_matches(lead: &Lead, filter: &LeadFilter) -> bool {
    if let Some(search) = filter.search.as_deref().map(str::trim) {
        if !search.is_empty() {
            let needle = search.to_lowercase();
            let hit = lead.name.to_lowercase().contains(&needle)
                || lead.phone.contains(search)
                || lead
                    .ip_address
                    .as_deref()
                    .map_or(false, |ip| ip.contains(search));
            if !hit {
                return false;
            }
        }
    }

    if let Some(experience) = filter.experience {
        if lead.experience != experience {
            return false;
        }
    }

    let day = lead.submitted_at.date_naive();
    if filter.start_date.map_or(false, |start| day < start) {
        return false;
    }
    if filter.end_date.map_or(false, |end| day > end) {
        return false;
    }
    true
}

pub fn experience_counts(leads: &[Lead]) -> ExperienceCounts {
    let mut counts = ExperienceCounts {
        total: leads.len(),
        ..ExperienceCounts::default()
    };
    for lead in leads {
        match lead.experience {
            Experience::Yes => counts.yes += 1,
            Experience::No => counts.no += 1,
            Experience::DontKnow => counts.dont_know += 1,
        }
    }
    counts
}

pub fn query_page_views(deps: Deps) -> Result<PageViewsResponse, DeskError> {
    let mut views = deps.views.list()?;
    views.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let window = ChronoDuration::from_std(deps.config.page_view_dedup)
        .unwrap_or_else(|_| ChronoDuration::zero());
    let views = dedup_views(views, window);
    Ok(PageViewsResponse {
        unique: views.len(),
        views,
    })
}

/// Keeps a view unless an already kept one has the same IP and lies within
/// `window` of it, either side.
pub fn dedup_views(views: Vec<PageView>, window: ChronoDuration) -> Vec<PageView> {
    let mut kept: Vec<PageView> = Vec::with_capacity(views.len());
    for view in views {
        let duplicate = kept.iter().any(|k| {
            k.ip_address == view.ip_address && (k.timestamp - view.timestamp).abs() < window
        });
        if !duplicate {
            kept.push(view);
        }
    }
    kept
}

pub fn query_validated_tickets(deps: Deps) -> Result<TicketsResponse, DeskError> {
    Ok(TicketsResponse {
        tickets: deps.tickets.fetch_validated()?,
    })
}

pub fn query_find_ticket(
    deps: Deps,
    cpf: Option<String>,
    email: Option<String>,
    phone: Option<String>,
) -> Result<TicketResponse, DeskError> {
    let query = ContactQuery { cpf, email, phone };
    if query.is_empty() {
        return Ok(TicketResponse { ticket: None });
    }
    Ok(TicketResponse {
        ticket: deps.tickets.find_by_contact(&query)?,
    })
}

pub fn query_lead_locations(
    deps: Deps,
    locator: &dyn GeoLocator,
) -> Result<LocationsResponse, DeskError> {
    let mut locations = BTreeMap::new();
    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    for lead in deps.leads.list()? {
        let Some(ip) = lead.ip_address.as_deref().and_then(clean_ip) else {
            continue;
        };
        if !locations.contains_key(&ip) {
            let Some(location) = locator.locate(&ip) else {
                continue;
            };
            locations.insert(ip.clone(), location);
        }
        *counts.entry(ip).or_default() += 1;
    }
    Ok(LocationsResponse { locations, counts })
}

pub fn query_whatsapp_link(deps: Deps, phone: &str) -> WhatsAppLinkResponse {
    WhatsAppLinkResponse {
        url: whatsapp_link(&deps.config.whatsapp_country_code, phone),
    }
}

/// `https://wa.me/<country><digits>` for a phone typed in any format.
pub fn whatsapp_link(country_code: &str, phone: &str) -> String {
    format!("https://wa.me/{}{}", country_code, strip_non_digits(phone))
}
