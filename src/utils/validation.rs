use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use validator::{ValidationError, ValidationErrors};

/// Country codes offered by the application form.
pub const COUNTRY_CODES: [&str; 6] = ["+1", "+44", "+91", "+61", "+33", "+49"];

static TEN_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("static regex"));

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("static regex")
});

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

pub fn is_valid_whatsapp(number: &str) -> bool {
    TEN_DIGITS.is_match(number)
}

pub fn validate_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// Splits a comma separated tech stack, trimming entries and dropping empty ones.
pub fn parse_tech_stack(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tech| !tech.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(invalid("blank", "must not be empty"));
    }
    Ok(())
}

pub fn validate_whatsapp_number(number: &str) -> Result<(), ValidationError> {
    if !is_valid_whatsapp(number) {
        return Err(invalid("whatsapp", "WhatsApp number must be exactly 10 digits"));
    }
    Ok(())
}

pub fn validate_phone_number(number: &str) -> Result<(), ValidationError> {
    if !TEN_DIGITS.is_match(number) {
        return Err(invalid("phone", "Phone number must be exactly 10 digits"));
    }
    Ok(())
}

pub fn validate_country_code(code: &str) -> Result<(), ValidationError> {
    if !COUNTRY_CODES.contains(&code) {
        return Err(invalid("country_code", "Unsupported country code"));
    }
    Ok(())
}

pub fn validate_tech_stack(raw: &str) -> Result<(), ValidationError> {
    if parse_tech_stack(raw).is_empty() {
        return Err(invalid("tech_stack", "At least one technology is required"));
    }
    Ok(())
}

/// Flattens validator output into "field: message" pairs, sorted by field.
pub fn validation_message(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                format!("{}: {}", field, message)
            })
        })
        .collect();
    parts.sort();
    parts.join("; ")
}
