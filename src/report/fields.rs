//! Field resolution: turns an overlay's field tag plus the submitted form
//! into the literal text drawn on the template.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::models::ReportRequest;
use super::registry::OverlayPlacement;

/// Categories whose templates print day and month in two separate boxes.
pub const SHORT_DATE_CATEGORIES: [&str; 3] = ["U9", "U11", "U13"];

/// Rendering of a match date that is not a real calendar date.
pub const INVALID_DATE: &str = "Invalid Date";

/// Gap between day and month in the short layout; the template boxes are
/// aligned to it.
const SHORT_DATE_GAP: &str = "     ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldTag {
    RefereeName,
    SecondRefereeName,
    StartTime,
    #[serde(rename = "team_1")]
    Team1,
    #[serde(rename = "team_2")]
    Team2,
    AgeCategory,
    Competition,
    Stadium,
    #[serde(rename = "assistant_referee_1")]
    AssistantReferee1,
    #[serde(rename = "assistant_referee_2")]
    AssistantReferee2,
    Observer,
    FormattedDate,
    TeamVsTeam,
    LocalityLabel,
    CombinedRefereeNames,
    #[serde(other)]
    Unknown,
}

/// An overlay with its final text.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOverlay {
    pub x: f32,
    pub y: f32,
    pub page: usize,
    pub text: String,
}

pub fn uses_short_date(category: &str) -> bool {
    SHORT_DATE_CATEGORIES.contains(&category)
}

/// Format an ISO match date for the template of `category`.
///
/// Long form is `DD.MM.YYYY`; the short form used by the small-field youth
/// templates is `DD` followed by five spaces and `MM`, without the year.
pub fn format_date(date: &str, category: &str) -> String {
    let Ok(parsed) = NaiveDate::parse_from_str(date, "%Y-%m-%d") else {
        return INVALID_DATE.to_string();
    };

    if uses_short_date(category) {
        format!("{:02}{}{:02}", parsed.day(), SHORT_DATE_GAP, parsed.month())
    } else {
        format!("{:02}.{:02}.{:04}", parsed.day(), parsed.month(), parsed.year())
    }
}

fn optional(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

pub fn resolve(tag: FieldTag, request: &ReportRequest) -> String {
    match tag {
        FieldTag::RefereeName => request.referee_name.clone(),
        FieldTag::SecondRefereeName => optional(&request.second_referee_name),
        FieldTag::StartTime => request.start_time.clone(),
        FieldTag::Team1 => request.team_1.clone(),
        FieldTag::Team2 => request.team_2.clone(),
        FieldTag::AgeCategory => request.age_category.clone(),
        FieldTag::Competition => optional(&request.competition),
        FieldTag::Stadium => optional(&request.stadium),
        FieldTag::AssistantReferee1 => optional(&request.assistant_referee_1),
        FieldTag::AssistantReferee2 => optional(&request.assistant_referee_2),
        FieldTag::Observer => optional(&request.observer),
        FieldTag::FormattedDate => format_date(&request.match_date, &request.age_category),
        FieldTag::TeamVsTeam => format!("{} - {}", request.team_1, request.team_2),
        FieldTag::LocalityLabel => request.locality.clone(),
        // No guard for a missing second name: the layout expects the double gap.
        FieldTag::CombinedRefereeNames => format!(
            "{}  {}",
            request.referee_name,
            optional(&request.second_referee_name)
        ),
        FieldTag::Unknown => String::new(),
    }
}

/// Resolve every placement, dropping the ones whose text is blank.
pub fn resolve_overlays(
    placements: &[OverlayPlacement],
    request: &ReportRequest,
) -> Vec<ResolvedOverlay> {
    placements
        .iter()
        .filter_map(|placement| {
            let text = resolve(placement.field, request);
            if text.trim().is_empty() {
                return None;
            }
            Some(ResolvedOverlay {
                x: placement.x,
                y: placement.y,
                page: placement.page,
                text,
            })
        })
        .collect()
}
