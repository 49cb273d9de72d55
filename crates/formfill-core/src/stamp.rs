//! Generation timestamp
//!
//! The stamp is a FreeText annotation on page 0, titled with a fixed tag so
//! the previous stamp can be found and replaced. Re-stamping a document
//! always leaves exactly one timestamp.

use crate::config::StampConfig;
use crate::error::{FormError, Result};
use crate::session::{Document, PageRect};
use chrono::{Local, NaiveDateTime};
use lopdf::{dictionary, Object, ObjectId, Stream};

/// `March 07, 2024 02:05 PM`
pub const TIMESTAMP_FORMAT: &str = "%B %d, %Y %I:%M %p";

/// Font resource name used by the stamp's appearance stream and `/DA`.
const FONT_RESOURCE: &str = "Helv";

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

pub fn format_timestamp(time: &NaiveDateTime) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

/// Box corners `[llx, lly, urx, ury]` in default user space.
pub type StampRect = [f32; 4];

#[derive(Debug, Clone, Default)]
pub struct Stamper {
    config: StampConfig,
}

impl Stamper {
    pub fn new(config: StampConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StampConfig {
        &self.config
    }

    /// Where the stamp lands on a page: its top-left corner sits `offset_x`
    /// left of and `offset_y` above the page's bottom-right corner.
    pub fn placement(&self, page: &PageRect) -> StampRect {
        let llx = page.x1 - self.config.offset_x;
        let ury = page.y0 + self.config.offset_y;
        [
            llx,
            ury - self.config.height,
            llx + self.config.width,
            ury,
        ]
    }

    /// Replace any previous stamp on page 0 with one showing `now`.
    ///
    /// # Errors
    ///
    /// [`FormError::InvalidPageGeometry`] when page 0 has an empty or infinite
    /// MediaBox; the document is left untouched.
    pub fn stamp(&self, doc: &mut Document, now: NaiveDateTime) -> Result<ObjectId> {
        let page = doc.page_rect()?;
        tracing::debug!("Page width: {}, Page height: {}", page.width(), page.height());

        if !page.is_valid() {
            return Err(FormError::InvalidPageGeometry {
                width: page.width(),
                height: page.height(),
            });
        }

        let text = format_timestamp(&now);
        let rect = self.placement(&page);

        let removed = doc.remove_annotations_titled(&self.config.title)?;
        if removed > 0 {
            tracing::debug!("Removed {} previous timestamp annotation(s)", removed);
        }

        let appearance = self.appearance_stream(&text);
        let appearance_id = doc.pdf_mut().add_object(appearance);

        let [r, g, b] = self.config.color;
        let da = format!(
            "/{} {} Tf {} {} {} rg",
            FONT_RESOURCE, self.config.font_size, r, g, b
        );

        let annot = dictionary! {
            "Type" => "Annot",
            "Subtype" => "FreeText",
            "Rect" => rect.iter().map(|v| Object::Real(*v)).collect::<Vec<_>>(),
            "Contents" => Object::string_literal(text.as_str()),
            "T" => Object::string_literal(self.config.title.as_str()),
            "DA" => Object::string_literal(da),
            // Print flag, so the stamp shows up on paper
            "F" => 4,
            "Border" => vec![0.into(), 0.into(), 0.into()],
            "AP" => dictionary! { "N" => Object::Reference(appearance_id) },
        };
        let annot_id = doc.add_annotation(annot)?;

        tracing::info!("Stamped '{}' at {:?}", text, rect);
        Ok(annot_id)
    }

    fn appearance_stream(&self, text: &str) -> Stream {
        let StampConfig {
            width,
            height,
            font_size,
            color: [r, g, b],
            ..
        } = self.config;
        let baseline = ((height - font_size) / 2.0 + font_size * 0.2).max(0.0);

        let content = format!(
            "BT /{} {} Tf {} {} {} rg 2 {:.2} Td ({}) Tj ET",
            FONT_RESOURCE,
            font_size,
            r,
            g,
            b,
            baseline,
            escape_literal(text)
        );

        Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => vec![0.into(), 0.into(), Object::Real(width), Object::Real(height)],
                "Resources" => dictionary! {
                    "Font" => dictionary! {
                        FONT_RESOURCE => dictionary! {
                            "Type" => "Font",
                            "Subtype" => "Type1",
                            "BaseFont" => Object::Name(self.config.font.as_bytes().to_vec()),
                            "Encoding" => "WinAnsiEncoding",
                        },
                    },
                },
            },
            content.into_bytes(),
        )
    }
}

fn escape_literal(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '(' | ')' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
