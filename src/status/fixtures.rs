//! Canned requests for the generation self-test.

use crate::report::{ReportRequest, TemplateRegistry};

/// A request with every field filled, including the second referee.
pub fn canned_request(locality: &str, category: &str) -> ReportRequest {
    ReportRequest {
        referee_name: "Max Mustermann".to_string(),
        second_referee_name: Some("Erika Musterfrau".to_string()),
        match_date: "2025-11-04".to_string(),
        start_time: "14:30".to_string(),
        team_1: "FC Beispielstadt".to_string(),
        team_2: "SV Musterdorf".to_string(),
        age_category: category.to_string(),
        locality: locality.to_string(),
        competition: Some("Kreispokal".to_string()),
        stadium: Some("Sportpark Am See".to_string()),
        assistant_referee_1: Some("Jonas Beispiel".to_string()),
        assistant_referee_2: Some("Lena Beispiel".to_string()),
        observer: Some("Paul Probe".to_string()),
    }
}

/// One canned request per supported (locality, category) pair.
pub fn canned_requests(registry: &TemplateRegistry) -> Vec<ReportRequest> {
    registry
        .supported_pairs()
        .into_iter()
        .map(|(locality, category)| canned_request(locality, category))
        .collect()
}
