//! Minimal PDF overlay layer on top of `lopdf`.
//!
//! Loads a template, embeds one TrueType font with WinAnsi encoding, appends
//! text to existing pages and serializes the result. Existing page content is
//! wrapped in `q`/`Q` so graphics state left behind by the template cannot
//! shift the overlay.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use thiserror::Error;

const FONT_RESOURCE_NAME: &str = "FReport";
const FIRST_CHAR: u8 = 32;
const LAST_CHAR: u8 = 255;
const MAX_TREE_DEPTH: usize = 32;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to load template PDF: {0}")]
    Load(String),
    #[error("failed to parse font: {0}")]
    Font(String),
    #[error("malformed template PDF: {0}")]
    Structure(String),
    #[error("page {0} does not exist")]
    MissingPage(usize),
    #[error("failed to encode page content: {0}")]
    Encode(String),
    #[error("failed to serialize PDF: {0}")]
    Save(String),
}

/// Handle to a font embedded in an [`OverlayDocument`].
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedFont {
    id: ObjectId,
}

/// One piece of text to draw on a page.
#[derive(Debug, Clone, Copy)]
pub struct TextDraw<'a> {
    pub x: f32,
    pub y: f32,
    pub text: &'a str,
}

pub struct OverlayDocument {
    doc: Document,
}

impl OverlayDocument {
    pub fn load(bytes: &[u8]) -> Result<Self, RenderError> {
        let doc = Document::load_mem(bytes).map_err(|e| RenderError::Load(e.to_string()))?;
        Ok(Self { doc })
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Embed a TrueType font program. `name` becomes the PDF `BaseFont`.
    pub fn embed_font(
        &mut self,
        font_bytes: &[u8],
        name: &str,
    ) -> Result<EmbeddedFont, RenderError> {
        let metrics = FontMetrics::parse(font_bytes)?;
        let base_font = sanitize_font_name(name);

        let file_id = self.doc.add_object(Stream::new(
            dictionary! { "Length1" => Object::Integer(font_bytes.len() as i64) },
            font_bytes.to_vec(),
        ));

        let descriptor_id = self.doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => Object::Name(base_font.clone().into_bytes()),
            "Flags" => Object::Integer(32),
            "FontBBox" => metrics.bbox.iter().map(|v| Object::Integer(*v)).collect::<Vec<_>>(),
            "ItalicAngle" => Object::Integer(0),
            "Ascent" => Object::Integer(metrics.ascent),
            "Descent" => Object::Integer(metrics.descent),
            "CapHeight" => Object::Integer(metrics.cap_height),
            "StemV" => Object::Integer(80),
            "FontFile2" => file_id,
        });

        let font_id = self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "TrueType",
            "BaseFont" => Object::Name(base_font.into_bytes()),
            "FirstChar" => Object::Integer(i64::from(FIRST_CHAR)),
            "LastChar" => Object::Integer(i64::from(LAST_CHAR)),
            "Widths" => metrics.widths.iter().map(|w| Object::Integer(*w)).collect::<Vec<_>>(),
            "FontDescriptor" => descriptor_id,
            "Encoding" => "WinAnsiEncoding",
        });

        Ok(EmbeddedFont { id: font_id })
    }

    /// Draw `items` on the zero-based `page_index` with black fill.
    pub fn draw_text(
        &mut self,
        page_index: usize,
        font: &EmbeddedFont,
        size: f32,
        items: &[TextDraw<'_>],
    ) -> Result<(), RenderError> {
        let page_id = self
            .doc
            .get_pages()
            .get(&(page_index as u32 + 1))
            .copied()
            .ok_or(RenderError::MissingPage(page_index))?;

        self.register_font(page_id, font)?;

        let mut operations = Vec::with_capacity(items.len() * 6);
        for item in items {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new(
                "Tf",
                vec![Object::Name(FONT_RESOURCE_NAME.as_bytes().to_vec()), size.into()],
            ));
            operations.push(Operation::new(
                "rg",
                vec![Object::Integer(0), Object::Integer(0), Object::Integer(0)],
            ));
            operations.push(Operation::new("Td", vec![item.x.into(), item.y.into()]));
            operations.push(Operation::new(
                "Tj",
                vec![Object::string_literal(encode_win_ansi(item.text))],
            ));
            operations.push(Operation::new("ET", vec![]));
        }

        let content = Content { operations }
            .encode()
            .map_err(|e| RenderError::Encode(e.to_string()))?;
        self.append_page_content(page_id, content)
    }

    pub fn save(mut self) -> Result<Vec<u8>, RenderError> {
        let mut out = Vec::new();
        self.doc
            .save_to(&mut out)
            .map_err(|e| RenderError::Save(e.to_string()))?;
        Ok(out)
    }

    fn resolve_dictionary(&self, object: &Object) -> Result<Dictionary, RenderError> {
        match object {
            Object::Reference(id) => self
                .doc
                .get_dictionary(*id)
                .cloned()
                .map_err(|e| RenderError::Structure(e.to_string())),
            Object::Dictionary(dict) => Ok(dict.clone()),
            _ => Ok(Dictionary::new()),
        }
    }

    /// The resources in effect for a page, following inheritance up the page tree.
    fn effective_resources(&self, page_id: ObjectId) -> Result<Dictionary, RenderError> {
        let mut current = Some(page_id);
        let mut depth = 0;
        while let Some(node_id) = current {
            if depth > MAX_TREE_DEPTH {
                return Err(RenderError::Structure("page tree too deep".to_string()));
            }
            let node = self
                .doc
                .get_dictionary(node_id)
                .map_err(|e| RenderError::Structure(e.to_string()))?;
            if let Ok(resources) = node.get(b"Resources") {
                return self.resolve_dictionary(resources);
            }
            current = node.get(b"Parent").and_then(Object::as_reference).ok();
            depth += 1;
        }
        Ok(Dictionary::new())
    }

    /// Give the page its own resource dictionary that includes our font.
    fn register_font(&mut self, page_id: ObjectId, font: &EmbeddedFont) -> Result<(), RenderError> {
        let mut resources = self.effective_resources(page_id)?;
        let mut fonts = match resources.get(b"Font") {
            Ok(existing) => self.resolve_dictionary(existing)?,
            Err(_) => Dictionary::new(),
        };
        fonts.set(FONT_RESOURCE_NAME, Object::Reference(font.id));
        resources.set("Font", fonts);

        let page = self
            .doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| RenderError::Structure(e.to_string()))?;
        page.set("Resources", resources);
        Ok(())
    }

    fn existing_contents(&self, page_id: ObjectId) -> Result<Vec<Object>, RenderError> {
        let page = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| RenderError::Structure(e.to_string()))?;
        let contents = match page.get(b"Contents") {
            Ok(Object::Reference(id)) => match self.doc.get_object(*id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        Ok(contents)
    }

    fn append_page_content(
        &mut self,
        page_id: ObjectId,
        content: Vec<u8>,
    ) -> Result<(), RenderError> {
        let existing = self.existing_contents(page_id)?;

        let mut overlay = b"Q\n".to_vec();
        overlay.extend_from_slice(&content);
        let save_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let overlay_id = self.doc.add_object(Stream::new(Dictionary::new(), overlay));

        let mut contents = Vec::with_capacity(existing.len() + 2);
        contents.push(Object::Reference(save_id));
        contents.extend(existing);
        contents.push(Object::Reference(overlay_id));

        let page = self
            .doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| RenderError::Structure(e.to_string()))?;
        page.set("Contents", contents);
        Ok(())
    }
}

/// Metrics needed for a simple (non-CID) TrueType font dictionary, in
/// thousandths of an em.
struct FontMetrics {
    widths: Vec<i64>,
    bbox: [i64; 4],
    ascent: i64,
    descent: i64,
    cap_height: i64,
}

impl FontMetrics {
    fn parse(font_bytes: &[u8]) -> Result<Self, RenderError> {
        let face = ttf_parser::Face::parse(font_bytes, 0)
            .map_err(|e| RenderError::Font(e.to_string()))?;
        let scale = 1000.0 / f32::from(face.units_per_em().max(1));
        let scaled = |value: i16| (f32::from(value) * scale).round() as i64;

        let widths = (FIRST_CHAR..=LAST_CHAR)
            .map(|code| {
                win_ansi_char(code)
                    .and_then(|ch| face.glyph_index(ch))
                    .and_then(|glyph| face.glyph_hor_advance(glyph))
                    .map(|advance| (f32::from(advance) * scale).round() as i64)
                    .unwrap_or(0)
            })
            .collect();

        let bbox = face.global_bounding_box();
        Ok(Self {
            widths,
            bbox: [
                scaled(bbox.x_min),
                scaled(bbox.y_min),
                scaled(bbox.x_max),
                scaled(bbox.y_max),
            ],
            ascent: scaled(face.ascender()),
            descent: scaled(face.descender()),
            cap_height: scaled(face.capital_height().unwrap_or_else(|| face.ascender())),
        })
    }
}

fn sanitize_font_name(name: &str) -> String {
    let cleaned: String = name.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    if cleaned.is_empty() {
        "EmbeddedFont".to_string()
    } else {
        cleaned
    }
}

/// cp1252 code points in 0x80..=0x9F that differ from Latin-1.
const WIN_ANSI_HIGH: [(u8, char); 27] = [
    (0x80, '\u{20AC}'),
    (0x82, '\u{201A}'),
    (0x83, '\u{0192}'),
    (0x84, '\u{201E}'),
    (0x85, '\u{2026}'),
    (0x86, '\u{2020}'),
    (0x87, '\u{2021}'),
    (0x88, '\u{02C6}'),
    (0x89, '\u{2030}'),
    (0x8A, '\u{0160}'),
    (0x8B, '\u{2039}'),
    (0x8C, '\u{0152}'),
    (0x8E, '\u{017D}'),
    (0x91, '\u{2018}'),
    (0x92, '\u{2019}'),
    (0x93, '\u{201C}'),
    (0x94, '\u{201D}'),
    (0x95, '\u{2022}'),
    (0x96, '\u{2013}'),
    (0x97, '\u{2014}'),
    (0x98, '\u{02DC}'),
    (0x99, '\u{2122}'),
    (0x9A, '\u{0161}'),
    (0x9B, '\u{203A}'),
    (0x9C, '\u{0153}'),
    (0x9E, '\u{017E}'),
    (0x9F, '\u{0178}'),
];

fn win_ansi_char(code: u8) -> Option<char> {
    match code {
        0x20..=0x7E | 0xA0..=0xFF => Some(char::from(code)),
        0x80..=0x9F => WIN_ANSI_HIGH
            .iter()
            .find(|(byte, _)| *byte == code)
            .map(|(_, ch)| *ch),
        _ => None,
    }
}

/// Encode text as WinAnsi bytes. Unmappable characters become `?`, control
/// characters become spaces.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch {
            '\u{20}'..='\u{7E}' | '\u{A0}'..='\u{FF}' => ch as u8,
            c if c.is_control() => b' ',
            c => WIN_ANSI_HIGH
                .iter()
                .find(|(_, mapped)| *mapped == c)
                .map(|(byte, _)| *byte)
                .unwrap_or(b'?'),
        })
        .collect()
}
