//! CPF (Cadastro de Pessoas Físicas) check-digit validation.
//!
//! A CPF is 11 decimal digits; the last two are check digits computed from the
//! preceding ones with descending weights (10..2 for the first, 11..2 for the
//! second). Punctuation such as `529.982.247-25` is ignored.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const CPF_LEN: usize = 11;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid CPF: {input:?}")]
pub struct InvalidCpf {
    pub input: String,
}

/// Removes every character that is not an ASCII digit.
pub fn strip_non_digits(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Returns whether `input` reduces to a CPF with correct check digits.
///
/// Total over all strings: anything that does not reduce to exactly 11 digits,
/// or reduces to 11 copies of the same digit, is rejected.
pub fn validate_cpf(input: &str) -> bool {
    digits_of(input).is_some()
}

fn digits_of(input: &str) -> Option<[u8; CPF_LEN]> {
    let cleaned = strip_non_digits(input);
    if cleaned.len() != CPF_LEN {
        return None;
    }

    let mut digits = [0u8; CPF_LEN];
    for (slot, byte) in digits.iter_mut().zip(cleaned.bytes()) {
        *slot = byte - b'0';
    }

    if digits.iter().all(|&d| d == digits[0]) {
        return None;
    }

    if check_digit(&digits[..9]) != digits[9] {
        return None;
    }
    if check_digit(&digits[..10]) != digits[10] {
        return None;
    }

    Some(digits)
}

/// Weighted sum with weights `len+1` down to 2, folded to a single digit.
fn check_digit(digits: &[u8]) -> u8 {
    let top = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, &d)| u32::from(d) * (top - i as u32))
        .sum();

    let check = 11 - (sum % 11);
    if check > 9 {
        0
    } else {
        check as u8
    }
}

/// A CPF that passed validation, stored as its 11 bare digits.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, JsonSchema)]
#[serde(try_from = "String", into = "String")]
pub struct Cpf(String);

impl Cpf {
    pub fn parse(input: &str) -> Result<Self, InvalidCpf> {
        let digits = digits_of(input).ok_or_else(|| InvalidCpf {
            input: input.to_string(),
        })?;
        Ok(Self(digits.iter().map(|d| char::from(b'0' + d)).collect()))
    }

    pub fn digits(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cpf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.0;
        write!(f, "{}.{}.{}-{}", &d[0..3], &d[3..6], &d[6..9], &d[9..11])
    }
}

impl TryFrom<String> for Cpf {
    type Error = InvalidCpf;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Cpf::parse(&value)
    }
}

impl From<Cpf> for String {
    fn from(cpf: Cpf) -> Self {
        cpf.0
    }
}
