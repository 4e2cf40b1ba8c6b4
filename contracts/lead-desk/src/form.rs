//! The affiliate signup wizard.
//!
//! Steps: 1 experience, 2 monthly revenue, 3 traffic source, 4 name,
//! 5 email, 6 phone, 7 done. Visitors who don't know what iGaming is skip
//! straight to the email step with placeholder name and phone.

use bravo_common::Experience;

use crate::error::DeskError;
use crate::msg::SubmissionForm;

pub const LAST_INPUT_STEP: u8 = 6;
pub const DONE_STEP: u8 = 7;

pub const REVENUE_OPTIONS: [&str; 5] = [
    "- R$1.000,00",
    "de 1 a R$5.000,00",
    "de 5 a R$15.000,00",
    "de 15 a R$50.000,00",
    "mais de R$100.000,00",
];

pub const TRAFFIC_OPTIONS: [&str; 4] = [
    "Tráfego pago (google, face ads, tik tok ads, google)",
    "Orgânico (facebook, instagram, tik tok)",
    "Grupo no telegram",
    "grupo de whatsapp",
];

pub const PLACEHOLDER_NAME: &str = "Usuário Interessado";
pub const PLACEHOLDER_PHONE: &str = "Não informado";

#[derive(Clone, Debug, PartialEq)]
pub struct AffiliateForm {
    step: u8,
    experience: Option<Experience>,
    monthly_revenue: Option<String>,
    traffic_source: Option<String>,
    name: String,
    email: String,
    phone: String,
}

impl Default for AffiliateForm {
    fn default() -> Self {
        Self {
            step: 1,
            experience: None,
            monthly_revenue: None,
            traffic_source: None,
            name: String::new(),
            email: String::new(),
            phone: String::new(),
        }
    }
}

impl AffiliateForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> u8 {
        self.step
    }

    pub fn is_done(&self) -> bool {
        self.step == DONE_STEP
    }

    /// Share of the wizard completed, in `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        (f64::from(self.step) / f64::from(LAST_INPUT_STEP)).min(1.0)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn choose_experience(&mut self, experience: Experience) -> Result<(), DeskError> {
        self.expect_step(1)?;
        self.experience = Some(experience);
        if experience == Experience::DontKnow {
            self.name = PLACEHOLDER_NAME.to_string();
            self.phone = PLACEHOLDER_PHONE.to_string();
            self.step = 5;
        } else {
            self.step = 2;
        }
        Ok(())
    }

    pub fn choose_revenue(&mut self, option: &str) -> Result<(), DeskError> {
        self.expect_step(2)?;
        self.monthly_revenue = Some(pick(&REVENUE_OPTIONS, option)?);
        self.step = 3;
        Ok(())
    }

    pub fn choose_traffic_source(&mut self, option: &str) -> Result<(), DeskError> {
        self.expect_step(3)?;
        self.traffic_source = Some(pick(&TRAFFIC_OPTIONS, option)?);
        self.step = 4;
        Ok(())
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn set_email(&mut self, email: &str) {
        self.email = email.to_string();
    }

    pub fn set_phone(&mut self, phone: &str) {
        self.phone = phone.to_string();
    }

    /// Leaves a text step once its field is filled in.
    pub fn next(&mut self) -> Result<(), DeskError> {
        match self.step {
            4 if self.name.trim().is_empty() => Err(invalid("Por favor, insira seu nome")),
            5 if !self.email.contains('@') => Err(invalid("Por favor, insira um email válido")),
            4 | 5 => {
                self.step += 1;
                Ok(())
            }
            _ => Err(invalid("Etapa inválida")),
        }
    }

    pub fn back(&mut self) -> Result<(), DeskError> {
        if !(2..=LAST_INPUT_STEP).contains(&self.step) {
            return Err(invalid("Etapa inválida"));
        }
        self.step -= 1;
        Ok(())
    }

    /// The payload to submit from the phone step.
    pub fn submission(&self) -> Result<SubmissionForm, DeskError> {
        self.expect_step(LAST_INPUT_STEP)?;
        if self.phone.trim().is_empty() {
            return Err(invalid("Por favor, insira seu telefone"));
        }
        let experience = self
            .experience
            .ok_or_else(|| invalid("Por favor, responda se já trabalha como afiliado"))?;

        Ok(SubmissionForm {
            name: self.name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: self.email.trim().to_string(),
            experience,
            monthly_revenue: self.monthly_revenue.clone(),
            traffic_source: self.traffic_source.clone(),
            cpf: None,
        })
    }

    /// Moves to the closing step once the submission was accepted.
    pub fn mark_submitted(&mut self) {
        self.step = DONE_STEP;
    }

    fn expect_step(&self, step: u8) -> Result<(), DeskError> {
        if self.step != step {
            return Err(invalid("Etapa inválida"));
        }
        Ok(())
    }
}

fn pick(options: &[&str], option: &str) -> Result<String, DeskError> {
    options
        .iter()
        .find(|o| **o == option)
        .map(|o| o.to_string())
        .ok_or_else(|| invalid("Opção inválida"))
}

fn invalid(reason: &str) -> DeskError {
    DeskError::InvalidForm {
        reason: reason.to_string(),
    }
}
