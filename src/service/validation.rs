//! User field validation
//!
//! Format checks on user data before it reaches the store. Collects all
//! failures into one message rather than stopping at the first.

use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::DomainError;

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L} \-]+$").expect("invalid name regex"));

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("invalid email regex"));

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9\-\s]{7,15}$").expect("invalid phone regex"));

/// Validate the full user field set.
///
/// # Errors
/// `DomainError::InvalidUser` listing every failed field.
pub fn validate_user_fields(
    last_name: &str,
    first_name: &str,
    patronymic_name: Option<&str>,
    birth_date: NaiveDate,
    email: &str,
    phone_number: &str,
) -> Result<(), DomainError> {
    let mut problems = Vec::new();

    if !NAME_RE.is_match(last_name) {
        problems.push("last name is invalid");
    }
    if !NAME_RE.is_match(first_name) {
        problems.push("first name is invalid");
    }
    if let Some(patronymic) = patronymic_name {
        if !patronymic.is_empty() && !NAME_RE.is_match(patronymic) {
            problems.push("patronymic name is invalid");
        }
    }
    if birth_date >= Utc::now().date_naive() {
        problems.push("birth date must be in the past");
    }
    if !EMAIL_RE.is_match(email) {
        problems.push("email is invalid");
    }
    if !PHONE_RE.is_match(phone_number) {
        problems.push("phone number is invalid");
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(DomainError::InvalidUser(problems.join(", ")))
    }
}
