//! Input validation for report requests.
//!
//! Checks run in a fixed order and the first failure is reported; callers get
//! a single message rather than a list.

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

use super::models::ReportRequest;
use super::registry::TemplateRegistry;

/// Categories played with two referees on the pitch.
pub const SECOND_REFEREE_CATEGORIES: [&str; 2] = ["U11", "U13"];

lazy_static! {
    static ref DATE_PATTERN: Regex =
        Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid date pattern");
    static ref TIME_PATTERN: Regex =
        Regex::new(r"^[0-9]{2}:[0-9]{2}$").expect("valid time pattern");
}

/// Validation error with a message meant for the person filling in the form.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// The request field that failed validation
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn empty_field(field: &str, label: &str) -> Self {
        Self::new(field, format!("{} is required", label))
    }

    pub fn unknown_category(category: &str, known: &[String]) -> Self {
        Self::new(
            "age_category",
            format!(
                "Unknown age category '{}'. Valid categories: {}",
                category,
                known.join(", ")
            ),
        )
    }

    pub fn unknown_locality(locality: &str, known: &[&str]) -> Self {
        Self::new(
            "locality",
            format!(
                "Unknown locality '{}'. Valid localities: {}",
                locality,
                known.join(", ")
            ),
        )
    }

    pub fn unsupported_category(locality: &str, category: &str, supported: &[&str]) -> Self {
        Self::new(
            "age_category",
            format!(
                "Age category '{}' is not available for {}. Supported categories: {}",
                category,
                locality,
                supported.join(", ")
            ),
        )
    }

    pub fn missing_second_referee(category: &str) -> Self {
        Self::new(
            "second_referee_name",
            format!("Age category {} requires a second referee name", category),
        )
    }

    pub fn invalid_date(value: &str) -> Self {
        Self::new(
            "match_date",
            format!("Invalid match date '{}'. Expected format: YYYY-MM-DD", value),
        )
    }

    pub fn invalid_time(value: &str) -> Self {
        Self::new(
            "start_time",
            format!("Invalid start time '{}'. Expected format: HH:MM", value),
        )
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

fn require(value: &str, field: &str, label: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::empty_field(field, label));
    }
    Ok(())
}

pub fn requires_second_referee(category: &str) -> bool {
    SECOND_REFEREE_CATEGORIES.contains(&category)
}

pub fn validate(
    request: &ReportRequest,
    registry: &TemplateRegistry,
) -> Result<(), ValidationError> {
    require(&request.referee_name, "referee_name", "Referee name")?;
    require(&request.match_date, "match_date", "Match date")?;
    require(&request.start_time, "start_time", "Start time")?;
    require(&request.team_1, "team_1", "Home team")?;
    require(&request.team_2, "team_2", "Away team")?;
    require(&request.age_category, "age_category", "Age category")?;
    require(&request.locality, "locality", "Locality")?;

    if !registry.is_known_category(&request.age_category) {
        return Err(ValidationError::unknown_category(
            &request.age_category,
            registry.known_categories(),
        ));
    }

    if !registry.is_known_locality(&request.locality) {
        let known: Vec<&str> = registry.localities().collect();
        return Err(ValidationError::unknown_locality(&request.locality, &known));
    }

    if !registry.supports(&request.locality, &request.age_category) {
        return Err(ValidationError::unsupported_category(
            &request.locality,
            &request.age_category,
            &registry.categories_for(&request.locality),
        ));
    }

    if requires_second_referee(&request.age_category) {
        let second = request.second_referee_name.as_deref().unwrap_or("");
        if second.trim().is_empty() {
            return Err(ValidationError::missing_second_referee(&request.age_category));
        }
    }

    if !DATE_PATTERN.is_match(&request.match_date) {
        return Err(ValidationError::invalid_date(&request.match_date));
    }

    if !TIME_PATTERN.is_match(&request.start_time) {
        return Err(ValidationError::invalid_time(&request.start_time));
    }

    Ok(())
}
