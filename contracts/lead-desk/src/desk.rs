use bravo_common::{EventSink, Response, Ticket, TracingSink};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;
use tracing::{info, warn};

use crate::auth::{AuthProvider, AuthSession};
use crate::config::DeskConfig;
use crate::error::DeskError;
use crate::execute;
use crate::form::AffiliateForm;
use crate::geo::{CachedLocator, GeoLocator};
use crate::msg::{Env, ExecuteMsg, MessageInfo, QueryMsg};
use crate::query;
use crate::state::{
    Deps, DepsMut, LeadStore, MemoryLeadStore, MemoryPageViewStore, MemoryTicketStore,
    PageViewStore, TicketStore,
};

/// The funnel's back office: lead capture, ticket issuance and the admin
/// dashboard, over pluggable stores and collaborators.
pub struct LeadDesk {
    config: DeskConfig,
    tickets: Box<dyn TicketStore>,
    leads: Box<dyn LeadStore>,
    views: Box<dyn PageViewStore>,
    auth: Box<dyn AuthProvider>,
    locator: CachedLocator<Box<dyn GeoLocator>>,
    sink: Box<dyn EventSink>,
    rng: StdRng,
}

impl LeadDesk {
    /// In-memory stores, logging sink, OS-seeded ticket numbers.
    pub fn new(
        config: DeskConfig,
        auth: impl AuthProvider + 'static,
        locator: impl GeoLocator + 'static,
    ) -> Self {
        let locator: Box<dyn GeoLocator> = Box::new(locator);
        Self {
            config,
            tickets: Box::new(MemoryTicketStore::new()),
            leads: Box::new(MemoryLeadStore::new()),
            views: Box::new(MemoryPageViewStore::new()),
            auth: Box::new(auth),
            locator: CachedLocator::new(locator),
            sink: Box::new(TracingSink),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn with_stores(
        mut self,
        tickets: impl TicketStore + 'static,
        leads: impl LeadStore + 'static,
        views: impl PageViewStore + 'static,
    ) -> Self {
        self.tickets = Box::new(tickets);
        self.leads = Box::new(leads);
        self.views = Box::new(views);
        self
    }

    /// Fixes the ticket-number sequence, for replays and tests.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn config(&self) -> &DeskConfig {
        &self.config
    }

    pub fn login(&mut self, email: &str, password: &str) -> Result<AuthSession, DeskError> {
        match self.auth.sign_in(email, password) {
            Ok(session) => {
                info!(email = %session.email, "admin signed in");
                Ok(session)
            }
            Err(err) => {
                warn!(%err, "admin sign-in failed");
                Err(err.into())
            }
        }
    }

    pub fn logout(&mut self, info: &MessageInfo) {
        if let Some(token) = info.token.as_deref() {
            self.auth.sign_out(token);
            info!("admin signed out");
        }
    }

    pub fn session(&self, info: &MessageInfo) -> Option<AuthSession> {
        info.token
            .as_deref()
            .and_then(|token| self.auth.get_session(token))
    }

    pub fn execute(
        &mut self,
        env: &Env,
        info: &MessageInfo,
        msg: ExecuteMsg,
    ) -> Result<Response, DeskError> {
        if msg.requires_admin() {
            self.ensure_admin(info)?;
        }

        let deps = DepsMut {
            tickets: self.tickets.as_mut(),
            leads: self.leads.as_mut(),
            views: self.views.as_mut(),
            config: &self.config,
            rng: &mut self.rng,
        };
        let res = match msg {
            ExecuteMsg::SubmitForm { form, ip_address } => {
                execute::submit_form(deps, env, form, ip_address)
            }
            ExecuteMsg::IssueTicket {
                holder_name,
                phone,
                email,
                cpf,
            } => execute::issue_ticket(deps, env, holder_name, phone, email, cpf),
            ExecuteMsg::RecordPageView {
                ip_address,
                location,
            } => execute::record_page_view(deps, env, ip_address, location),
            ExecuteMsg::ValidateTicket { ticket_number } => {
                execute::validate_ticket(deps, ticket_number)
            }
            ExecuteMsg::SetContacted { id, contacted } => {
                execute::set_contacted(deps, env, id, contacted)
            }
            ExecuteMsg::DeleteLead { id } => execute::delete_lead(deps, id),
        };

        match &res {
            Ok(response) => self.forward_events(response),
            Err(err) => warn!(%err, "desk execute failed"),
        }
        res
    }

    pub fn query(&self, _env: &Env, info: &MessageInfo, msg: QueryMsg) -> Result<Value, DeskError> {
        if msg.requires_admin() {
            self.ensure_admin(info)?;
        }

        let deps = self.deps();
        let value = match msg {
            QueryMsg::Leads { filter } => serde_json::to_value(query::query_leads(deps, &filter)?)?,
            QueryMsg::PageViews {} => serde_json::to_value(query::query_page_views(deps)?)?,
            QueryMsg::ValidatedTickets {} => {
                serde_json::to_value(query::query_validated_tickets(deps)?)?
            }
            QueryMsg::FindTicket { cpf, email, phone } => {
                serde_json::to_value(query::query_find_ticket(deps, cpf, email, phone)?)?
            }
            QueryMsg::LeadLocations {} => {
                serde_json::to_value(query::query_lead_locations(deps, &self.locator)?)?
            }
            QueryMsg::WhatsAppLink { phone } => {
                serde_json::to_value(query::query_whatsapp_link(deps, &phone))?
            }
        };
        Ok(value)
    }

    /// Submits a finished wizard and moves it to its closing step. The form
    /// stays on the phone step if the desk rejects it.
    pub fn submit_wizard(
        &mut self,
        env: &Env,
        form: &mut AffiliateForm,
        ip_address: Option<String>,
    ) -> Result<Response, DeskError> {
        let submission = form.submission()?;
        let res = self.execute(
            env,
            &MessageInfo::anonymous(),
            ExecuteMsg::SubmitForm {
                form: submission,
                ip_address,
            },
        )?;
        form.mark_submitted();
        Ok(res)
    }

    /// Admin: the validated tickets, ready to hand to a raffle draw.
    pub fn raffle_pool(&self, info: &MessageInfo) -> Result<Vec<Ticket>, DeskError> {
        self.ensure_admin(info)?;
        Ok(self.tickets.fetch_validated()?)
    }

    fn deps(&self) -> Deps<'_> {
        Deps {
            tickets: self.tickets.as_ref(),
            leads: self.leads.as_ref(),
            views: self.views.as_ref(),
            config: &self.config,
        }
    }

    fn ensure_admin(&self, info: &MessageInfo) -> Result<AuthSession, DeskError> {
        let Some(token) = info.token.as_deref() else {
            return Err(DeskError::Unauthorized {
                reason: "no session".to_string(),
            });
        };
        self.auth
            .get_session(token)
            .ok_or_else(|| DeskError::Unauthorized {
                reason: "session expired or unknown".to_string(),
            })
    }

    fn forward_events(&self, response: &Response) {
        for event in &response.events {
            self.sink.track(&event.ty, &event.props());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bravo_common::{Experience, MemorySink};
    use chrono::Utc;

    use super::*;
    use crate::auth::InMemoryAuth;
    use crate::geo::StaticLocator;
    use crate::msg::{LeadFilter, LeadsResponse, SubmissionForm, TicketResponse, TicketsResponse};

    fn desk(sink: Arc<MemorySink>) -> LeadDesk {
        LeadDesk::new(
            DeskConfig::default(),
            InMemoryAuth::new().with_user("admin@bravo.bet", "s3nha"),
            StaticLocator::new(),
        )
        .with_sink(sink)
        .with_rng_seed(7)
    }

    fn admin(desk: &mut LeadDesk) -> MessageInfo {
        let session = desk.login("admin@bravo.bet", "s3nha").unwrap();
        MessageInfo::with_token(session.token)
    }

    fn issue(desk: &mut LeadDesk, email: &str, cpf: &str) -> String {
        let res = desk
            .execute(
                &Env::now(),
                &MessageInfo::anonymous(),
                ExecuteMsg::IssueTicket {
                    holder_name: "Ana Lima".to_string(),
                    phone: format!("11{}", &cpf[..9]),
                    email: email.to_string(),
                    cpf: cpf.to_string(),
                },
            )
            .unwrap();
        res.attribute("ticket_number").unwrap().to_string()
    }

    #[test]
    fn test_admin_messages_require_session() {
        let mut desk = desk(Arc::new(MemorySink::new()));
        let env = Env::now();

        let err = desk
            .execute(
                &env,
                &MessageInfo::anonymous(),
                ExecuteMsg::ValidateTicket {
                    ticket_number: "123456".to_string(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, DeskError::Unauthorized { .. }));

        let err = desk
            .query(
                &env,
                &MessageInfo::with_token("forged"),
                QueryMsg::Leads {
                    filter: LeadFilter::default(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, DeskError::Unauthorized { .. }));

        let info = admin(&mut desk);
        desk.logout(&info);
        assert!(desk.session(&info).is_none());
        assert!(desk.query(&env, &info, QueryMsg::PageViews {}).is_err());
    }

    #[test]
    fn test_login_failure() {
        let mut desk = desk(Arc::new(MemorySink::new()));
        let err = desk.login("admin@bravo.bet", "wrong").unwrap_err();
        assert_eq!(err.user_message(), "Email ou senha incorretos");
    }

    #[test]
    fn test_public_messages_and_event_forwarding() {
        let sink = Arc::new(MemorySink::new());
        let mut desk = desk(sink.clone());
        let env = Env::now();

        desk.execute(
            &env,
            &MessageInfo::anonymous(),
            ExecuteMsg::SubmitForm {
                form: SubmissionForm {
                    name: "Ana Lima".to_string(),
                    phone: "11988887777".to_string(),
                    email: "ana@bravo.bet".to_string(),
                    experience: Experience::No,
                    monthly_revenue: None,
                    traffic_source: None,
                    cpf: None,
                },
                ip_address: None,
            },
        )
        .unwrap();
        desk.execute(
            &env,
            &MessageInfo::anonymous(),
            ExecuteMsg::RecordPageView {
                ip_address: Some("187.10.2.3".to_string()),
                location: None,
            },
        )
        .unwrap();

        assert_eq!(sink.names(), vec!["lead_submitted", "conversion", "page_view"]);
        let (_, props) = &sink.events()[1];
        assert_eq!(props.get("currency"), Some(&Value::String("BRL".into())));

        let link = desk
            .query(
                &env,
                &MessageInfo::anonymous(),
                QueryMsg::WhatsAppLink {
                    phone: "(11) 98888-7777".to_string(),
                },
            )
            .unwrap();
        assert_eq!(link["url"], "https://wa.me/5511988887777");
    }

    #[test]
    fn test_failed_execute_tracks_nothing() {
        let sink = Arc::new(MemorySink::new());
        let mut desk = desk(sink.clone());
        let info = admin(&mut desk);

        let err = desk
            .execute(
                &Env::now(),
                &info,
                ExecuteMsg::ValidateTicket {
                    ticket_number: "999999".to_string(),
                },
            )
            .unwrap_err();
        assert_eq!(err.user_message(), "Código do ticket não existe!");
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_ticket_lifecycle() {
        let mut desk = desk(Arc::new(MemorySink::new()));
        let env = Env::now();
        let info = admin(&mut desk);

        let first = issue(&mut desk, "ana@bravo.bet", "52998224725");
        let second = issue(&mut desk, "bia@bravo.bet", "11144477735");
        assert_ne!(first, second);

        let found: TicketResponse = serde_json::from_value(
            desk.query(
                &env,
                &MessageInfo::anonymous(),
                QueryMsg::FindTicket {
                    cpf: None,
                    email: Some("bia@bravo.bet".to_string()),
                    phone: None,
                },
            )
            .unwrap(),
        )
        .unwrap();
        assert_eq!(found.ticket.map(|t| t.ticket_number.to_string()), Some(second.clone()));

        desk.execute(
            &env,
            &info,
            ExecuteMsg::ValidateTicket {
                ticket_number: second.clone(),
            },
        )
        .unwrap();

        let pool: TicketsResponse =
            serde_json::from_value(desk.query(&env, &info, QueryMsg::ValidatedTickets {}).unwrap())
                .unwrap();
        assert_eq!(pool.tickets.len(), 1);
        assert_eq!(pool.tickets[0].ticket_number.to_string(), second);
        assert_eq!(desk.raffle_pool(&info).unwrap(), pool.tickets);
        assert!(desk.raffle_pool(&MessageInfo::anonymous()).is_err());
    }

    #[test]
    fn test_wizard_submission() {
        let mut desk = desk(Arc::new(MemorySink::new()));
        let info = admin(&mut desk);
        let env = Env::now();

        let mut form = AffiliateForm::new();
        form.choose_experience(Experience::DontKnow).unwrap();
        assert!(desk.submit_wizard(&env, &mut form, None).is_err());
        form.set_email("curioso@x.com");
        form.next().unwrap();
        desk.submit_wizard(&env, &mut form, Some("200.1.1.1".to_string()))
            .unwrap();
        assert!(form.is_done());

        let leads: LeadsResponse = serde_json::from_value(
            desk.query(
                &env,
                &info,
                QueryMsg::Leads {
                    filter: LeadFilter::default(),
                },
            )
            .unwrap(),
        )
        .unwrap();
        assert_eq!(leads.leads.len(), 1);
        assert_eq!(leads.leads[0].name, "Usuário Interessado");
        assert_eq!(leads.counts.dont_know, 1);
        assert!(leads.leads[0].submitted_at <= Utc::now());
    }
}
