#![allow(dead_code)]

use async_trait::async_trait;
use lopdf::{dictionary, Dictionary, Document, Object, Stream};
use referee_report_server::report::{ReportRequest, TemplateRegistry};
use referee_report_server::storage::{ObjectStorage, StorageError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const FONT: &[u8] = include_bytes!("../../static/fonts/DejaVuSans.ttf");
pub const TEST_TEMPLATE: &str = "templates/test.pdf";
pub const TEST_FONT: &str = "fonts/test.ttf";

/// In-memory storage that counts every download.
pub struct MockStorage {
    files: HashMap<String, Vec<u8>>,
    fetch_count: AtomicUsize,
}

impl MockStorage {
    pub fn new() -> Self {
        Self {
            files: HashMap::new(),
            fetch_count: AtomicUsize::new(0),
        }
    }

    pub fn with_file(mut self, path: &str, bytes: Vec<u8>) -> Self {
        self.files.insert(path.to_string(), bytes);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStorage for MockStorage {
    async fn download_file(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    fn get_asset_url(&self, path: &str) -> String {
        format!("http://mock-assets/{}", path)
    }
}

/// A blank A4 document with `page_count` pages.
pub fn sample_template(page_count: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::new();
    for _ in 0..page_count {
        let content_id = doc.add_object(Stream::new(Dictionary::new(), b"0 0 0 rg".to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(595),
                Object::Integer(842),
            ],
            "Contents" => Object::Reference(content_id),
            "Resources" => Dictionary::new(),
        });
        kids.push(Object::Reference(page_id));
    }
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(page_count as i64),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut out = Vec::new();
    doc.save_to(&mut out).expect("serialize sample template");
    out
}

/// A one-locality table pointing at [`TEST_TEMPLATE`] and [`TEST_FONT`],
/// with no recorded baselines. `U15` draws on pages 0 and 3.
pub fn test_registry() -> TemplateRegistry {
    let table = serde_json::json!({
        "font": TEST_FONT,
        "categories": ["U9", "U11", "U15"],
        "layouts": {
            "small": {
                "template": TEST_TEMPLATE,
                "overlays": [
                    { "x": 215, "y": 740, "page": 0, "field": "formatted_date" },
                    { "x": 215, "y": 706, "page": 0, "field": "team_vs_team" },
                    { "x": 215, "y": 672, "page": 0, "field": "combined_referee_names" }
                ]
            },
            "split": {
                "template": TEST_TEMPLATE,
                "overlays": [
                    { "x": 215, "y": 740, "page": 0, "field": "referee_name" },
                    { "x": 215, "y": 740, "page": 3, "field": "stadium" }
                ]
            }
        },
        "localities": {
            "Testkreis": { "U9": "small", "U15": "split" }
        }
    });
    TemplateRegistry::from_json(&table.to_string()).expect("valid test table")
}

/// Storage holding a valid template and font for [`test_registry`].
pub fn healthy_storage() -> MockStorage {
    MockStorage::new()
        .with_file(TEST_TEMPLATE, sample_template(1))
        .with_file(TEST_FONT, FONT.to_vec())
}

pub fn sample_request(locality: &str, category: &str) -> ReportRequest {
    ReportRequest {
        referee_name: "Max Mustermann".to_string(),
        second_referee_name: Some("Erika Musterfrau".to_string()),
        match_date: "2025-11-04".to_string(),
        start_time: "14:30".to_string(),
        team_1: "FC Beispielstadt".to_string(),
        team_2: "SV Musterdorf".to_string(),
        age_category: category.to_string(),
        locality: locality.to_string(),
        stadium: Some("Sportpark Am See".to_string()),
        ..Default::default()
    }
}

/// Concatenated, decoded content of a page (zero-based).
pub fn page_text(pdf: &[u8], page_index: usize) -> String {
    let doc = Document::load_mem(pdf).expect("load generated pdf");
    let pages = doc.get_pages();
    let page_id = pages[&(page_index as u32 + 1)];
    let content = doc.get_page_content(page_id).expect("page content");
    String::from_utf8_lossy(&content).into_owned()
}
