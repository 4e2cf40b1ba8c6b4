//! Masking applied to a raffle winner's personal data before it is shown.

use crate::cpf::strip_non_digits;

/// `"Maria Silva Souza"` becomes `"Maria S."`; a single token is kept as is.
pub fn mask_name(name: &str) -> String {
    let mut tokens = name.split_whitespace();
    let Some(first) = tokens.next() else {
        return String::new();
    };

    match tokens.next().and_then(|second| second.chars().next()) {
        Some(initial) => format!("{first} {initial}."),
        None => first.to_string(),
    }
}

/// `"12345678900"` becomes `"123.***.***-00"`.
///
/// Identifiers that do not clean up to 11 digits mask to an empty string.
pub fn mask_national_id(national_id: &str) -> String {
    let digits = strip_non_digits(national_id);
    if digits.len() != 11 {
        return String::new();
    }
    format!("{}.***.***-{}", &digits[..3], &digits[9..])
}

/// `"ana@x.com"` becomes `"a***@x.com"`.
pub fn mask_email(email: &str) -> String {
    let Some((local, domain)) = email.trim().split_once('@') else {
        return String::new();
    };
    match local.chars().next() {
        Some(first) if !domain.is_empty() => format!("{first}***@{domain}"),
        _ => String::new(),
    }
}
