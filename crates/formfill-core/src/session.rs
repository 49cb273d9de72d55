//! Document session: the one open template and its first-page form fields
//!
//! Only page 0 is ever inspected or mutated. Field metadata is read from the
//! widget annotations on that page, following the AcroForm parent chain for
//! inherited attributes (`/FT`, `/V`, `/Ff`) and fully qualified names.

use crate::error::{FormError, Result};
use lopdf::{Dictionary, Object, ObjectId, StringFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Parent chains deeper than this are treated as malformed.
const MAX_FIELD_DEPTH: usize = 32;

/// Button field flags (PDF 32000-1, table 226)
const FLAG_RADIO: i64 = 1 << 15;
const FLAG_PUSHBUTTON: i64 = 1 << 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Text,
    Checkbox,
    Choice,
    Other,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Choice => "choice",
            FieldKind::Other => "other",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A form field on page 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    pub value: String,
    #[serde(skip)]
    pub(crate) id: ObjectId,
}

/// A page box in default user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl PageRect {
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// The overlap of two boxes; invalid when they do not overlap.
    pub fn intersect(&self, other: &PageRect) -> PageRect {
        PageRect {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        }
    }

    /// False for empty, inverted or infinite boxes.
    pub fn is_valid(&self) -> bool {
        let (w, h) = (self.width(), self.height());
        w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0
    }
}

/// An opened PDF.
pub struct Document {
    path: PathBuf,
    pdf: lopdf::Document,
    page_id: ObjectId,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("path", &self.path)
            .field("page_id", &self.page_id)
            .finish_non_exhaustive()
    }
}

impl Document {
    /// Load a PDF from disk.
    ///
    /// # Errors
    ///
    /// [`FormError::OpenNotFound`] if the file does not exist,
    /// [`FormError::OpenCorrupt`] if it cannot be parsed and
    /// [`FormError::OpenEmpty`] if it has no pages.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(FormError::OpenNotFound(path.to_path_buf()));
        }

        let pdf = lopdf::Document::load(path).map_err(|e| FormError::OpenCorrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::from_pdf(pdf, path.to_path_buf())
    }

    /// Load a PDF from memory. `path` is only used for messages.
    pub fn from_bytes(bytes: &[u8], path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let pdf = lopdf::Document::load_mem(bytes).map_err(|e| FormError::OpenCorrupt {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        Self::from_pdf(pdf, path)
    }

    fn from_pdf(pdf: lopdf::Document, path: PathBuf) -> Result<Self> {
        let pages = pdf.get_pages();
        let page_id = match pages.values().next() {
            Some(id) => *id,
            None => return Err(FormError::OpenEmpty(path)),
        };

        tracing::info!("PDF loaded successfully: {}", path.display());
        tracing::info!("Number of pages: {}", pages.len());

        Ok(Self { path, pdf, page_id })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn page_count(&self) -> usize {
        self.pdf.get_pages().len()
    }

    /// The underlying `lopdf` document.
    pub fn pdf(&self) -> &lopdf::Document {
        &self.pdf
    }

    pub(crate) fn pdf_mut(&mut self) -> &mut lopdf::Document {
        &mut self.pdf
    }

    pub(crate) fn page_id(&self) -> ObjectId {
        self.page_id
    }

    /// Page 0 fields in `/Annots` order.
    ///
    /// A field with several widgets on the page is reported once, at the
    /// position of its first widget.
    pub fn fields(&self) -> Vec<Field> {
        let mut seen = HashSet::new();
        let mut fields = Vec::new();

        for widget_id in self.annotation_ids() {
            let Ok(widget) = self.pdf.get_dictionary(widget_id) else {
                continue;
            };
            if !has_name(widget, b"Subtype", b"Widget") {
                continue;
            }

            let field_id = terminal_field_id(widget_id, widget);
            if !seen.insert(field_id) {
                continue;
            }

            let field = self.read_field(field_id);
            tracing::debug!(
                "Field: {}, Type: {}, Value: {}",
                field.name,
                field.kind,
                field.value
            );
            fields.push(field);
        }

        fields
    }

    /// Set the value of every field called `name`.
    ///
    /// Returns `false` without touching the document when no field matches.
    pub fn write_field(&mut self, name: &str, value: &str) -> Result<bool> {
        let targets: Vec<Field> = self
            .fields()
            .into_iter()
            .filter(|f| f.name == name)
            .collect();

        if targets.is_empty() {
            tracing::debug!("No field named '{}' on page 0", name);
            return Ok(false);
        }

        for field in &targets {
            match field.kind {
                FieldKind::Text | FieldKind::Choice => self.write_text_value(field.id, value)?,
                FieldKind::Checkbox => self.write_checkbox_value(field.id, value)?,
                FieldKind::Other if self.is_radio(field.id) => {
                    self.write_radio_value(field.id, value)?
                }
                FieldKind::Other => {
                    tracing::debug!("Skipping unsupported field '{}'", name);
                    continue;
                }
            }
            tracing::debug!("Updated {} to {}", name, value);
        }

        self.set_need_appearances()?;
        Ok(true)
    }

    /// Serialize the current state.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.pdf
            .save_to(&mut output)
            .map_err(|e| FormError::Structure(e.to_string()))?;
        Ok(output)
    }

    /// Serialize the current state to `path`.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let write_error = |reason: String| FormError::Write {
            path: path.to_path_buf(),
            reason,
        };

        let bytes = self.to_bytes().map_err(|e| write_error(e.to_string()))?;
        fs::write(path, bytes).map_err(|e| write_error(e.to_string()))
    }

    /// Page 0's visible area: the CropBox clipped to the MediaBox, or the
    /// MediaBox alone when there is no usable CropBox. Both boxes may be
    /// inherited from the page tree.
    pub fn page_rect(&self) -> Result<PageRect> {
        let media_box = self
            .page_box(b"MediaBox")?
            .ok_or_else(|| FormError::Structure("page 0 has no MediaBox".to_string()))?;

        match self.page_box(b"CropBox") {
            Ok(Some(crop_box)) => {
                let visible = crop_box.intersect(&media_box);
                if visible.is_valid() {
                    Ok(visible)
                } else {
                    tracing::debug!(
                        "CropBox {:?} lies outside the MediaBox; ignoring it",
                        crop_box
                    );
                    Ok(media_box)
                }
            }
            Ok(None) => Ok(media_box),
            Err(e) => {
                tracing::debug!("Ignoring malformed CropBox: {}", e);
                Ok(media_box)
            }
        }
    }

    fn page_box(&self, key: &[u8]) -> Result<Option<PageRect>> {
        let Some(page_box) = self.inherited_page_attr(key) else {
            return Ok(None);
        };

        let values: Vec<f32> = page_box
            .as_array()?
            .iter()
            .filter_map(|o| number(self.resolve(o)))
            .collect();

        match values.as_slice() {
            [a, b, c, d] => Ok(Some(PageRect {
                x0: a.min(*c),
                y0: b.min(*d),
                x1: a.max(*c),
                y1: b.max(*d),
            })),
            _ => Err(FormError::Structure(format!(
                "{} has {} numeric entries",
                String::from_utf8_lossy(key),
                values.len()
            ))),
        }
    }

    /// Ids of page 0 annotations whose title (`/T`) equals `title`.
    pub fn annotations_titled(&self, title: &str) -> Vec<ObjectId> {
        self.annotation_ids()
            .into_iter()
            .filter(|id| {
                self.pdf
                    .get_dictionary(*id)
                    .map(|annot| {
                        !has_name(annot, b"Subtype", b"Widget")
                            && string_entry(annot, b"T").as_deref() == Some(title)
                    })
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Remove every page 0 annotation titled `title`, together with the
    /// appearance streams it references. Returns how many annotations went.
    pub fn remove_annotations_titled(&mut self, title: &str) -> Result<usize> {
        let doomed = self.annotations_titled(title);
        if doomed.is_empty() {
            return Ok(0);
        }

        let appearances: Vec<ObjectId> = doomed
            .iter()
            .filter_map(|id| self.pdf.get_dictionary(*id).ok())
            .flat_map(|annot| self.appearance_ids(annot))
            .collect();

        let annots = self.annots_mut()?;
        annots.retain(|o| !matches!(o, Object::Reference(id) if doomed.contains(id)));
        for id in doomed.iter().chain(&appearances) {
            self.pdf.objects.remove(id);
        }
        Ok(doomed.len())
    }

    /// Append an annotation to page 0.
    pub fn add_annotation(&mut self, mut annot: Dictionary) -> Result<ObjectId> {
        annot.set("P", Object::Reference(self.page_id));
        let annot_id = self.pdf.add_object(Object::Dictionary(annot));
        self.annots_mut()?.push(Object::Reference(annot_id));
        Ok(annot_id)
    }

    fn annotation_ids(&self) -> Vec<ObjectId> {
        let Ok(page) = self.pdf.get_dictionary(self.page_id) else {
            return Vec::new();
        };
        match page.get(b"Annots").map(|o| self.resolve(o)) {
            Ok(Object::Array(items)) => items
                .iter()
                .filter_map(|o| o.as_reference().ok())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Page 0's `/Annots` array, created when missing.
    fn annots_mut(&mut self) -> Result<&mut Vec<Object>> {
        let indirect = match self.pdf.get_dictionary(self.page_id)?.get(b"Annots") {
            Ok(Object::Reference(id)) => Some(*id),
            _ => None,
        };
        if let Some(id) = indirect {
            return Ok(self.pdf.get_object_mut(id)?.as_array_mut()?);
        }

        let page = self.pdf.get_object_mut(self.page_id)?.as_dict_mut()?;
        if !matches!(page.get(b"Annots"), Ok(Object::Array(_))) {
            page.set("Annots", Object::Array(Vec::new()));
        }
        Ok(page.get_mut(b"Annots")?.as_array_mut()?)
    }

    fn read_field(&self, field_id: ObjectId) -> Field {
        let field_type = self
            .inherited_field_attr(field_id, b"FT")
            .and_then(|o| o.as_name().ok());
        let flags = self
            .inherited_field_attr(field_id, b"Ff")
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(0);

        let kind = match field_type {
            Some(ft) if ft == b"Tx" => FieldKind::Text,
            Some(ft) if ft == b"Btn" && (flags & (FLAG_RADIO | FLAG_PUSHBUTTON)) == 0 => {
                FieldKind::Checkbox
            }
            Some(ft) if ft == b"Ch" => FieldKind::Choice,
            _ => FieldKind::Other,
        };

        let value = match self.inherited_field_attr(field_id, b"V") {
            Some(Object::String(bytes, _)) => decode_text(bytes),
            Some(Object::Name(name)) => String::from_utf8_lossy(name).into_owned(),
            Some(Object::Array(items)) => items
                .iter()
                .find_map(|o| self.resolve(o).as_str().ok())
                .map(decode_text)
                .unwrap_or_default(),
            _ => String::new(),
        };

        Field {
            name: self.qualified_name(field_id),
            kind,
            value,
            id: field_id,
        }
    }

    fn write_text_value(&mut self, field_id: ObjectId, value: &str) -> Result<()> {
        let widgets = self.widget_ids(field_id);

        self.pdf
            .get_object_mut(field_id)?
            .as_dict_mut()?
            .set("V", text_object(value));

        // Stale appearances would keep showing the template's value.
        for widget_id in widgets {
            self.pdf.get_object_mut(widget_id)?.as_dict_mut()?.remove(b"AP");
        }
        Ok(())
    }

    fn write_checkbox_value(&mut self, field_id: ObjectId, value: &str) -> Result<()> {
        let checked = crate::binder::is_checked_value(value);
        let widgets = self.widget_ids(field_id);

        let mut field_state = b"Yes".to_vec();
        for widget_id in &widgets {
            let on_state = self.on_state(*widget_id);
            let state = if checked { on_state.clone() } else { b"Off".to_vec() };
            self.pdf
                .get_object_mut(*widget_id)?
                .as_dict_mut()?
                .set("AS", Object::Name(state));
            field_state = on_state;
        }

        let state = if checked { field_state } else { b"Off".to_vec() };
        self.pdf
            .get_object_mut(field_id)?
            .as_dict_mut()?
            .set("V", Object::Name(state));
        Ok(())
    }

    /// Ask viewers to regenerate field appearances.
    fn set_need_appearances(&mut self) -> Result<()> {
        let root_id = self.pdf.trailer.get(b"Root")?.as_reference()?;
        let indirect = match self.pdf.get_dictionary(root_id)?.get(b"AcroForm") {
            Ok(Object::Reference(id)) => Some(*id),
            _ => None,
        };

        let acroform = match indirect {
            Some(id) => self.pdf.get_object_mut(id)?.as_dict_mut()?,
            None => match self.pdf.get_object_mut(root_id)?.as_dict_mut()?.get_mut(b"AcroForm") {
                Ok(Object::Dictionary(form)) => form,
                _ => {
                    tracing::warn!("Document has widgets but no AcroForm dictionary");
                    return Ok(());
                }
            },
        };
        acroform.set("NeedAppearances", Object::Boolean(true));
        Ok(())
    }

    /// Widget annotations belonging to a terminal field.
    fn widget_ids(&self, field_id: ObjectId) -> Vec<ObjectId> {
        let Ok(field) = self.pdf.get_dictionary(field_id) else {
            return Vec::new();
        };

        let mut ids = Vec::new();
        if has_name(field, b"Subtype", b"Widget") {
            ids.push(field_id);
        }
        if let Ok(Object::Array(kids)) = field.get(b"Kids").map(|o| self.resolve(o)) {
            for kid_id in kids.iter().filter_map(|o| o.as_reference().ok()) {
                if let Ok(kid) = self.pdf.get_dictionary(kid_id) {
                    if has_name(kid, b"Subtype", b"Widget") {
                        ids.push(kid_id);
                    }
                }
            }
        }
        ids
    }

    fn write_radio_value(&mut self, field_id: ObjectId, value: &str) -> Result<()> {
        let state = if value.is_empty() {
            b"Off".to_vec()
        } else {
            value.as_bytes().to_vec()
        };

        for widget_id in self.widget_ids(field_id) {
            let appearance = if self.appearance_states(widget_id).contains(&state) {
                state.clone()
            } else {
                b"Off".to_vec()
            };
            self.pdf
                .get_object_mut(widget_id)?
                .as_dict_mut()?
                .set("AS", Object::Name(appearance));
        }

        self.pdf
            .get_object_mut(field_id)?
            .as_dict_mut()?
            .set("V", Object::Name(state));
        Ok(())
    }

    fn is_radio(&self, field_id: ObjectId) -> bool {
        let is_button = self
            .inherited_field_attr(field_id, b"FT")
            .and_then(|o| o.as_name().ok())
            == Some(b"Btn".as_slice());
        let flags = self
            .inherited_field_attr(field_id, b"Ff")
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(0);
        is_button && (flags & FLAG_RADIO) != 0
    }

    /// Names of the widget's normal appearance states.
    fn appearance_states(&self, widget_id: ObjectId) -> Vec<Vec<u8>> {
        self.pdf
            .get_dictionary(widget_id)
            .ok()
            .and_then(|w| w.get(b"AP").ok())
            .map(|ap| self.resolve(ap))
            .and_then(|ap| ap.as_dict().ok())
            .and_then(|ap| ap.get(b"N").ok())
            .map(|n| self.resolve(n))
            .and_then(|n| n.as_dict().ok())
            .map(|n| n.iter().map(|(k, _)| k.clone()).collect())
            .unwrap_or_default()
    }

    /// The checkbox's "on" appearance state, `Yes` when not declared.
    fn on_state(&self, widget_id: ObjectId) -> Vec<u8> {
        self.appearance_states(widget_id)
            .into_iter()
            .find(|k| k.as_slice() != b"Off")
            .unwrap_or_else(|| b"Yes".to_vec())
    }

    /// Indirect objects reachable from an annotation's `/AP`: the
    /// appearance dictionaries and the streams they name.
    fn appearance_ids(&self, annot: &Dictionary) -> Vec<ObjectId> {
        let Ok(ap) = annot.get(b"AP") else {
            return Vec::new();
        };

        let mut ids: Vec<ObjectId> = ap.as_reference().ok().into_iter().collect();
        let Ok(ap) = self.resolve(ap).as_dict() else {
            return ids;
        };
        for (_, entry) in ap.iter() {
            ids.extend(entry.as_reference().ok());
            if let Ok(states) = self.resolve(entry).as_dict() {
                ids.extend(states.iter().filter_map(|(_, s)| s.as_reference().ok()));
            }
        }
        ids
    }

    fn qualified_name(&self, field_id: ObjectId) -> String {
        let mut parts = Vec::new();
        let mut current = Some(field_id);

        for _ in 0..MAX_FIELD_DEPTH {
            let Some(id) = current else { break };
            let Ok(dict) = self.pdf.get_dictionary(id) else {
                break;
            };
            if let Some(part) = string_entry(dict, b"T") {
                parts.push(part);
            }
            current = dict.get(b"Parent").and_then(Object::as_reference).ok();
        }

        parts.reverse();
        parts.join(".")
    }

    fn inherited_field_attr(&self, field_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut current = Some(field_id);
        for _ in 0..MAX_FIELD_DEPTH {
            let dict = self.pdf.get_dictionary(current?).ok()?;
            if let Ok(value) = dict.get(key) {
                return Some(self.resolve(value));
            }
            current = dict.get(b"Parent").and_then(Object::as_reference).ok();
        }
        None
    }

    fn inherited_page_attr(&self, key: &[u8]) -> Option<&Object> {
        let mut current = Some(self.page_id);
        for _ in 0..MAX_FIELD_DEPTH {
            let dict = self.pdf.get_dictionary(current?).ok()?;
            if let Ok(value) = dict.get(key) {
                return Some(self.resolve(value));
            }
            current = dict.get(b"Parent").and_then(Object::as_reference).ok();
        }
        None
    }

    fn resolve<'a>(&'a self, object: &'a Object) -> &'a Object {
        match object {
            Object::Reference(id) => self.pdf.get_object(*id).unwrap_or(object),
            other => other,
        }
    }
}

/// Holds the currently opened document, if any.
#[derive(Debug, Default)]
pub struct Session {
    current: Option<Document>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `path`, replacing the current document on success.
    ///
    /// On failure the previously opened document stays current.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<&mut Document> {
        let document = Document::open(path)?;
        Ok(self.current.insert(document))
    }

    pub fn current(&self) -> Option<&Document> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Result<&mut Document> {
        self.current.as_mut().ok_or(FormError::NoDocument)
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn close(&mut self) {
        self.current = None;
    }
}

fn terminal_field_id(widget_id: ObjectId, widget: &Dictionary) -> ObjectId {
    if widget.has(b"T") {
        return widget_id;
    }
    widget
        .get(b"Parent")
        .and_then(Object::as_reference)
        .unwrap_or(widget_id)
}

fn has_name(dict: &Dictionary, key: &[u8], expected: &[u8]) -> bool {
    dict.get(key)
        .and_then(Object::as_name)
        .map(|name| name == expected)
        .unwrap_or(false)
}

fn string_entry(dict: &Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key).and_then(Object::as_str).ok().map(decode_text)
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(v) => Some(*v as f32),
        Object::Real(v) => Some(*v),
        _ => None,
    }
}

/// Decode a PDF text string: UTF-16BE with BOM, otherwise UTF-8 when valid,
/// otherwise one byte per character.
pub(crate) fn decode_text(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|b| *b as char).collect(),
    }
}

pub(crate) fn text_object(s: &str) -> Object {
    let format = if s.is_ascii() {
        StringFormat::Literal
    } else {
        StringFormat::Hexadecimal
    };
    Object::String(encode_text(s), format)
}

/// Encode a PDF text string: plain bytes for ASCII, UTF-16BE with BOM otherwise.
pub(crate) fn encode_text(s: &str) -> Vec<u8> {
    if s.is_ascii() {
        return s.as_bytes().to_vec();
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in s.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    bytes
}
