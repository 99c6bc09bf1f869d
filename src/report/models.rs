use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Form data submitted to generate one referee report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ReportRequest {
    #[schema(example = "Max Mustermann")]
    pub referee_name: String,
    #[schema(example = "Erika Musterfrau")]
    pub second_referee_name: Option<String>,
    #[schema(example = "2025-11-04")]
    pub match_date: String,
    #[schema(example = "14:30")]
    pub start_time: String,
    #[schema(example = "FC Beispielstadt")]
    pub team_1: String,
    #[schema(example = "SV Musterdorf 1920")]
    pub team_2: String,
    #[schema(example = "U15")]
    pub age_category: String,
    #[schema(example = "Kreis Nord")]
    pub locality: String,
    #[schema(example = "Kreispokal")]
    pub competition: Option<String>,
    #[schema(example = "Sportpark Am See")]
    pub stadium: Option<String>,
    pub assistant_referee_1: Option<String>,
    pub assistant_referee_2: Option<String>,
    pub observer: Option<String>,
}

/// A generated report, ready to be sent as an attachment.
#[derive(Debug)]
pub struct GeneratedReport {
    pub filename: String,
    pub pdf: Vec<u8>,
}
