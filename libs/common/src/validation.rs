//! Email format shared by the auth and API services

use regex::Regex;
use std::sync::OnceLock;

/// Longest address accepted anywhere in the back office
pub const MAX_EMAIL_LEN: usize = 254;

/// Whether `email` is a plausible address: a local part, `@`, and a dotted
/// domain ending in an alphabetic label of two or more letters
pub fn is_valid_email(email: &str) -> bool {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@(?:[a-zA-Z0-9-]+\.)+[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    email.len() <= MAX_EMAIL_LEN && regex.is_match(email)
}
