use chrono::{DateTime, Datelike, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    static ref EXPIRY_FORMAT: Regex = Regex::new(r"^(0[1-9]|1[0-2])/\d{2}$").expect("valid pattern");
}

/// The raw card fields a payment form submits
#[derive(Debug, Clone, Default)]
pub struct CardDetails {
    pub number: String,
    pub expiry: String,
    pub cvc: String,
}

/// Why a single card field was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("Required")]
    Required,
    #[error("Must be 13-19 digits")]
    InvalidNumber,
    #[error("Format MM/YY")]
    InvalidExpiry,
    #[error("Card expired")]
    Expired,
    #[error("3-4 digits")]
    InvalidCvc,
}

/// Every failing field of a rejected card, reported together so a form can
/// mark all of them at once
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("Please check your card details.")]
pub struct CardError {
    pub number: Option<FieldError>,
    pub expiry: Option<FieldError>,
    pub cvc: Option<FieldError>,
}

impl CardError {
    fn is_clean(&self) -> bool {
        self.number.is_none() && self.expiry.is_none() && self.cvc.is_none()
    }

    /// The failing fields with their messages, for surfacing to a caller
    pub fn fields(&self) -> Vec<(&'static str, FieldError)> {
        [
            ("cardNumber", self.number),
            ("expiry", self.expiry),
            ("cvc", self.cvc),
        ]
        .into_iter()
        .filter_map(|(name, error)| error.map(|e| (name, e)))
        .collect()
    }
}

/// Validates card details against the given moment.
///
/// Submissions with any failing field must never reach the processor, so
/// every field is checked and reported in one pass.
pub fn validate_card(details: &CardDetails, now: DateTime<Utc>) -> Result<(), CardError> {
    let mut errors = CardError::default();

    let digits: String = details
        .number
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();

    if details.number.trim().is_empty() {
        errors.number = Some(FieldError::Required);
    } else if digits.len() < 13 || digits.len() > 19 {
        errors.number = Some(FieldError::InvalidNumber);
    }

    if details.expiry.trim().is_empty() {
        errors.expiry = Some(FieldError::Required);
    } else if !EXPIRY_FORMAT.is_match(&details.expiry) {
        errors.expiry = Some(FieldError::InvalidExpiry);
    } else {
        let month: u32 = details.expiry[0..2].parse().expect("matched digits");
        let year: i32 = details.expiry[3..5].parse().expect("matched digits");

        // Compared against the two-digit year, same as the cards themselves
        let current_year = now.year() % 100;
        let current_month = now.month();

        if year < current_year || (year == current_year && month < current_month) {
            errors.expiry = Some(FieldError::Expired);
        }
    }

    if details.cvc.trim().is_empty() {
        errors.cvc = Some(FieldError::Required);
    } else if details.cvc.len() < 3
        || details.cvc.len() > 4
        || !details.cvc.chars().all(|c| c.is_ascii_digit())
    {
        errors.cvc = Some(FieldError::InvalidCvc);
    }

    if errors.is_clean() {
        Ok(())
    } else {
        Err(errors)
    }
}
