//! Field rules that gate writes to the remote collection.
//!
//! Validation is pure: it inspects a [`ContactDraft`] and reports every field
//! that fails, keyed by field. `message` and `category` are optional and never
//! reported.

use crate::api::models::ContactDraft;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;

pub const NAME_MAX_LEN: usize = 100;
pub const PHONE_MIN_LEN: usize = 10;
pub const PHONE_MAX_LEN: usize = 15;

/// `local@domain.tld`, none of the parts containing whitespace or `@`.
static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid"));

/// Digits stay ASCII-only: `\d` would also accept other scripts' digits.
static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^[0-9\s+()-]{{{},{}}}$", PHONE_MIN_LEN, PHONE_MAX_LEN))
        .expect("phone regex is valid")
});

static WHITESPACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s").expect("whitespace regex is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    Email,
    Phone,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Phone => "phone",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    Required,
    TooLong,
    InvalidFormat,
}

impl FieldError {
    pub fn code(self) -> &'static str {
        match self {
            FieldError::Required => "required",
            FieldError::TooLong => "too_long",
            FieldError::InvalidFormat => "invalid_format",
        }
    }

    /// User-facing message for this failure on `field`.
    pub fn message(self, field: Field) -> &'static str {
        match (field, self) {
            (Field::Name, FieldError::Required) => "Name is required",
            (Field::Name, _) => "Name must be less than 100 characters",
            (Field::Email, FieldError::Required) => "Email is required",
            (Field::Email, _) => "Please enter a valid email",
            (Field::Phone, FieldError::Required) => "Phone is required",
            (Field::Phone, _) => "Please enter a valid phone number",
        }
    }
}

/// Per-field failures for one draft. Empty means the draft is submittable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<Field, FieldError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: Field) -> Option<FieldError> {
        self.0.get(&field).copied()
    }

    pub fn message(&self, field: Field) -> Option<&'static str> {
        self.get(field).map(|e| e.message(field))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, FieldError)> + '_ {
        self.0.iter().map(|(f, e)| (*f, *e))
    }

    /// Field name to message mapping, as shown inline next to form inputs.
    pub fn messages(&self) -> BTreeMap<&'static str, &'static str> {
        self.iter().map(|(f, e)| (f.as_str(), e.message(f))).collect()
    }

    fn insert(&mut self, field: Field, error: FieldError) {
        self.0.insert(field, error);
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(field, err)| format!("{}: {}", field, err.message(field)))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

pub fn validate(draft: &ContactDraft) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    if let Some(e) = check_name(&draft.name) {
        errors.insert(Field::Name, e);
    }
    if let Some(e) = check_email(&draft.email) {
        errors.insert(Field::Email, e);
    }
    if let Some(e) = check_phone(&draft.phone) {
        errors.insert(Field::Phone, e);
    }
    errors
}

/// `Ok(())` when the draft may be sent to the remote collection.
pub fn ensure_valid(draft: &ContactDraft) -> Result<(), ValidationErrors> {
    let errors = validate(draft);
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn check_name(name: &str) -> Option<FieldError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Some(FieldError::Required)
    } else if trimmed.chars().count() > NAME_MAX_LEN {
        Some(FieldError::TooLong)
    } else {
        None
    }
}

fn check_email(email: &str) -> Option<FieldError> {
    if email.trim().is_empty() {
        Some(FieldError::Required)
    } else if !is_email_shaped(email) {
        Some(FieldError::InvalidFormat)
    } else {
        None
    }
}

fn check_phone(phone: &str) -> Option<FieldError> {
    if phone.trim().is_empty() {
        return Some(FieldError::Required);
    }
    let compact = WHITESPACE_REGEX.replace_all(phone, "");
    if PHONE_REGEX.is_match(&compact) {
        None
    } else {
        Some(FieldError::InvalidFormat)
    }
}

fn is_email_shaped(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}
