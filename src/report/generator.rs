use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::fields::{resolve_overlays, ResolvedOverlay};
use super::models::{GeneratedReport, ReportRequest};
use super::pdf::{OverlayDocument, RenderError, TextDraw};
use super::registry::TemplateRegistry;
use super::ReportError;
use crate::storage::{ObjectStorage, StorageError};

pub const FONT_SIZE: f32 = 13.0;
const FONT_NAME: &str = "DejaVuSans";

/// Fills a registered template with the submitted form data.
#[derive(Clone)]
pub struct ReportGenerator {
    registry: Arc<TemplateRegistry>,
    storage: Arc<dyn ObjectStorage + Send + Sync>,
}

impl ReportGenerator {
    pub fn new(
        registry: Arc<TemplateRegistry>,
        storage: Arc<dyn ObjectStorage + Send + Sync>,
    ) -> Self {
        Self { registry, storage }
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Generate the report PDF. Nothing is fetched for an unregistered pair.
    pub async fn generate(&self, request: &ReportRequest) -> Result<GeneratedReport, ReportError> {
        let template_path = self
            .registry
            .resolve_template(&request.locality, &request.age_category)
            .ok_or_else(|| ReportError::TemplateNotFound {
                locality: request.locality.clone(),
                category: request.age_category.clone(),
            })?;
        let placements = self
            .registry
            .resolve_overlays(&request.locality, &request.age_category);
        let font_path = self.registry.font_path();

        debug!("Fetching template {} and font {}", template_path, font_path);
        let (template, font) = futures::future::join(
            self.storage.download_file(template_path),
            self.storage.download_file(font_path),
        )
        .await;
        let template = template.map_err(asset_error)?;
        let font = font.map_err(asset_error)?;

        let overlays = resolve_overlays(placements, request);
        let pdf = render_report(&template, &font, &overlays)?;

        let filename = report_filename(request);
        info!(
            "Generated {} ({} bytes, {} overlays)",
            filename,
            pdf.len(),
            overlays.len()
        );
        Ok(GeneratedReport { filename, pdf })
    }
}

fn asset_error(err: StorageError) -> ReportError {
    match err {
        StorageError::NotFound(path) => ReportError::AssetNotFound(path),
        other => ReportError::Storage(other),
    }
}

/// Draw resolved overlays onto a template. Overlays on pages the template
/// does not have are skipped.
pub fn render_report(
    template: &[u8],
    font: &[u8],
    overlays: &[ResolvedOverlay],
) -> Result<Vec<u8>, RenderError> {
    let mut document = OverlayDocument::load(template)?;
    let embedded = document.embed_font(font, FONT_NAME)?;
    let page_count = document.page_count();

    let mut by_page: BTreeMap<usize, Vec<TextDraw<'_>>> = BTreeMap::new();
    for overlay in overlays {
        by_page.entry(overlay.page).or_default().push(TextDraw {
            x: overlay.x,
            y: overlay.y,
            text: &overlay.text,
        });
    }

    for (page, items) in by_page {
        if page >= page_count {
            warn!(
                "Skipping {} overlay(s) on page {}: template has {} page(s)",
                items.len(),
                page,
                page_count
            );
            continue;
        }
        document.draw_text(page, &embedded, FONT_SIZE, &items)?;
    }

    document.save()
}

fn alnum_only(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

pub fn report_filename(request: &ReportRequest) -> String {
    let date: String = request
        .match_date
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    format!(
        "referee_report_{}_{}_vs_{}_{}.pdf",
        request.age_category,
        alnum_only(&request.team_1),
        alnum_only(&request.team_2),
        date
    )
}
