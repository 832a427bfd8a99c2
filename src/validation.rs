// 📐 Shape Layer - validation of new records before they reach the store
// Field limits for clients and programs, checked before any insert.

use crate::models::{NewClient, NewProgram};
use once_cell::sync::Lazy;
use regex::Regex;

pub const MAX_NAME_LEN: usize = 50;
pub const MAX_AGE: u32 = 150;
pub const MAX_AREA_LEN: usize = 100;
pub const MAX_PROFESSION_LEN: usize = 100;
pub const MAX_PROGRAM_NAME_LEN: usize = 100;
pub const MAX_SHORT_CODE_LEN: usize = 10;

static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?1?\d{9,15}$").expect("phone pattern is valid"));

static SHORT_CODE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9]+$").expect("short code pattern is valid"));

// ============================================================================
// VALIDATION ERROR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub context: String,
}

impl ValidationError {
    pub fn new(context: &str, field: &str, message: impl Into<String>) -> Self {
        ValidationError {
            field: field.to_string(),
            message: message.into(),
            context: context.to_string(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.context, self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), Vec<ValidationError>>;

// ============================================================================
// RULES
// ============================================================================

fn check_required(errors: &mut Vec<ValidationError>, context: &str, field: &str, value: &str, max: usize) {
    if value.trim().is_empty() {
        errors.push(ValidationError::new(context, field, "Required field is empty"));
    } else if value.chars().count() > max {
        errors.push(ValidationError::new(
            context,
            field,
            format!("Must be at most {} characters", max),
        ));
    }
}

pub fn validate_new_client(client: &NewClient) -> ValidationResult {
    let mut errors = Vec::new();
    let context = "Client";

    check_required(&mut errors, context, "first_name", &client.first_name, MAX_NAME_LEN);
    check_required(&mut errors, context, "last_name", &client.last_name, MAX_NAME_LEN);
    check_required(
        &mut errors,
        context,
        "area_of_residence",
        &client.area_of_residence,
        MAX_AREA_LEN,
    );

    if client.age > MAX_AGE {
        errors.push(ValidationError::new(
            context,
            "age",
            format!("Must be between 0 and {}, got {}", MAX_AGE, client.age),
        ));
    }

    if !PHONE_PATTERN.is_match(&client.phone_number) {
        errors.push(ValidationError::new(
            context,
            "phone_number",
            "Enter a valid phone number (e.g., +1234567890)",
        ));
    }

    if let Some(profession) = &client.profession {
        if profession.chars().count() > MAX_PROFESSION_LEN {
            errors.push(ValidationError::new(
                context,
                "profession",
                format!("Must be at most {} characters", MAX_PROFESSION_LEN),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

pub fn validate_new_program(program: &NewProgram) -> ValidationResult {
    let mut errors = Vec::new();
    let context = "Program";

    check_required(&mut errors, context, "name", &program.name, MAX_PROGRAM_NAME_LEN);

    if program.short_code.chars().count() > MAX_SHORT_CODE_LEN {
        errors.push(ValidationError::new(
            context,
            "short_code",
            format!("Must be at most {} characters", MAX_SHORT_CODE_LEN),
        ));
    }

    if !SHORT_CODE_PATTERN.is_match(&program.short_code) {
        errors.push(ValidationError::new(
            context,
            "short_code",
            "Only uppercase letters and numbers are allowed",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
