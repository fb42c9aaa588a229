//! PDF Document wrapper

use crate::cmap::build_tounicode_cmap;
use crate::encoding::{dingbat_decode, win_ansi_decode};
use crate::font::{FontData, FontHandle};
use crate::form::{read_form_fields, InteractiveFieldsResult};
use crate::geometry::{Point, Rect};
use crate::interpret::{FormCall, Interpreter, ShowOp};
use crate::objects::{get, get_dict, get_name, number, resolve};
use crate::pdf_font::strip_subset_tag;
use crate::redact::{fill_rect_operations, remove_glyphs, touches};
use crate::standard::Standard14;
use crate::stext::{TextPage, TextPageOptions};
use crate::style::Color;
use crate::text::{generate_glyph_run_operators, EncodedGlyph, TextRenderContext};
use crate::{PdfError, Result};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

/// A character to draw at a baseline origin in page coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedChar {
    pub c: char,
    pub origin: Point,
}

/// Object ids of a TrueType font embedded by this wrapper
struct EmbeddedFont {
    data: FontData,
    type0_id: ObjectId,
    cid_font_id: ObjectId,
    tounicode_id: ObjectId,
}

/// PDF Document wrapper providing inspection and editing operations
pub struct PdfDocument {
    /// The underlying lopdf document
    inner: Document,
    /// Font dictionaries added by this wrapper (font key -> object)
    font_objects: HashMap<String, ObjectId>,
    /// TrueType fonts embedded by this wrapper (font key -> objects)
    embedded_fonts: HashMap<String, EmbeddedFont>,
    /// Pages whose original content has been isolated in `q`..`Q`
    wrapped_pages: HashSet<ObjectId>,
    /// Content stream written by this wrapper for each edited page
    page_streams: HashMap<ObjectId, ObjectId>,
    /// Deflate streams when saving
    compress: bool,
}

impl PdfDocument {
    fn from_document(inner: Document) -> Self {
        Self {
            inner,
            font_objects: HashMap::new(),
            embedded_fonts: HashMap::new(),
            wrapped_pages: HashSet::new(),
            page_streams: HashMap::new(),
            compress: true,
        }
    }

    /// Open a PDF document from a file path
    ///
    /// # Example
    /// ```ignore
    /// let doc = PdfDocument::open("form.pdf")?;
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let inner = Document::load(path).map_err(|e| PdfError::OpenError(e.to_string()))?;
        Ok(Self::from_document(inner))
    }

    /// Open a PDF document from bytes
    pub fn open_from_bytes(data: &[u8]) -> Result<Self> {
        let inner = Document::load_mem(data).map_err(|e| PdfError::OpenError(e.to_string()))?;
        Ok(Self::from_document(inner))
    }

    /// Wrap an already loaded lopdf document
    pub fn from_lopdf(inner: Document) -> Self {
        Self::from_document(inner)
    }

    /// Get the number of pages in the document
    pub fn page_count(&self) -> usize {
        self.inner.get_pages().len()
    }

    /// Deflate streams on save (default: true)
    pub fn set_compress(&mut self, compress: bool) {
        self.compress = compress;
    }

    /// Get a reference to the underlying lopdf document
    pub fn inner(&self) -> &Document {
        &self.inner
    }

    fn page_id(&self, page_index: usize) -> Result<ObjectId> {
        let pages = self.inner.get_pages();
        pages
            .get(&(page_index as u32 + 1))
            .copied()
            .ok_or(PdfError::InvalidPage(page_index, pages.len()))
    }

    /// Page rectangle with the origin at the top-left corner
    pub fn page_rect(&self, page_index: usize) -> Result<Rect> {
        let media_box = self.media_box(self.page_id(page_index)?)?;
        Ok(Rect::new(0.0, 0.0, media_box.width(), media_box.height()))
    }

    /// Look up a page attribute, following the Parent chain for inherited keys
    fn inherited_attribute(&self, page_id: ObjectId, key: &[u8]) -> Result<Option<&Object>> {
        let mut current_id = page_id;

        // Follow parent chain up to 10 levels (safety limit)
        for _ in 0..10 {
            let dict = self
                .inner
                .get_object(current_id)?
                .as_dict()
                .map_err(|_| PdfError::ParseError("Page node is not a dictionary".to_string()))?;

            if let Some(value) = get(&self.inner, dict, key) {
                return Ok(Some(value));
            }

            match dict.get(b"Parent") {
                Ok(Object::Reference(parent_id)) => current_id = *parent_id,
                _ => break,
            }
        }
        Ok(None)
    }

    /// MediaBox in user space, falling back to A4
    fn media_box(&self, page_id: ObjectId) -> Result<Rect> {
        let values: Option<Vec<f64>> = match self.inherited_attribute(page_id, b"MediaBox")? {
            Some(Object::Array(arr)) => arr
                .iter()
                .map(|o| number(resolve(&self.inner, o)))
                .collect(),
            _ => None,
        };

        match values.as_deref() {
            Some([x0, y0, x1, y1, ..]) => Ok(Rect::new(*x0, *y0, *x1, *y1)),
            Some(_) => Err(PdfError::ParseError("Invalid MediaBox format".to_string())),
            None => Ok(Rect::new(0.0, 0.0, 595.28, 841.89)),
        }
    }

    fn resources(&self, page_id: ObjectId) -> Result<Option<&Dictionary>> {
        Ok(match self.inherited_attribute(page_id, b"Resources")? {
            Some(Object::Dictionary(dict)) => Some(dict),
            _ => None,
        })
    }

    /// Concatenated, decompressed content of a page
    fn page_content(&self, page_id: ObjectId) -> Result<Vec<u8>> {
        let page_dict = self
            .inner
            .get_object(page_id)?
            .as_dict()
            .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))?;

        let decoded = |stream: &Stream| {
            stream
                .decompressed_content()
                .unwrap_or_else(|_| stream.content.clone())
        };

        let content = match page_dict.get(b"Contents").map(|c| resolve(&self.inner, c)) {
            Ok(Object::Stream(stream)) => decoded(stream),
            Ok(Object::Array(arr)) => {
                let mut combined = Vec::new();
                for obj in arr {
                    if let Object::Stream(stream) = resolve(&self.inner, obj) {
                        combined.extend_from_slice(&decoded(stream));
                        // Streams may split mid-token only at whitespace
                        combined.push(b'\n');
                    }
                }
                combined
            }
            _ => Vec::new(),
        };
        Ok(content)
    }

    fn page_operations(&self, page_id: ObjectId) -> Result<Vec<Operation>> {
        let content = self.page_content(page_id)?;
        Content::decode(&content)
            .map(|c| c.operations)
            .map_err(|e| PdfError::ContentError(e.to_string()))
    }

    /// Replace a page's content with a single stream
    ///
    /// The first edit of a page adds the stream; later edits overwrite it.
    fn set_page_content(&mut self, page_id: ObjectId, content: Vec<u8>) -> Result<()> {
        let stream = Stream::new(Dictionary::new(), content);
        if let Some(stream_id) = self.page_streams.get(&page_id) {
            self.inner.objects.insert(*stream_id, Object::Stream(stream));
            return Ok(());
        }
        let stream_id = self.inner.add_object(stream);
        self.page_streams.insert(page_id, stream_id);
        let page_dict = self
            .inner
            .get_object_mut(page_id)?
            .as_dict_mut()
            .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))?;
        page_dict.set("Contents", Object::Reference(stream_id));
        Ok(())
    }

    /// Isolate the original content in `q`..`Q` so appended operators start
    /// from the default graphics state
    fn wrapped_operations(&mut self, page_id: ObjectId) -> Result<Vec<Operation>> {
        let mut ops = self.page_operations(page_id)?;
        if self.wrapped_pages.insert(page_id) {
            ops.insert(0, Operation::new("q", vec![]));
            ops.push(Operation::new("Q", vec![]));
        }
        Ok(ops)
    }

    fn encode_operations(operations: Vec<Operation>) -> Result<Vec<u8>> {
        Content { operations }
            .encode()
            .map_err(|e| PdfError::ContentError(e.to_string()))
    }

    fn shows(&self, page_id: ObjectId, operations: &[Operation]) -> Result<Vec<ShowOp>> {
        let media_box = self.media_box(page_id)?;
        let resources = self.resources(page_id)?;
        Ok(Interpreter::new(&self.inner, resources, media_box).run(operations))
    }

    /// Structured text of a page
    pub fn text_page(&self, page_index: usize, options: &TextPageOptions) -> Result<TextPage> {
        let page_id = self.page_id(page_index)?;
        let operations = self.page_operations(page_id)?;
        let shows = self.shows(page_id, &operations)?;
        let rect = self.page_rect(page_index)?;
        Ok(TextPage::from_shows(page_index, rect, &shows, options))
    }

    /// Remove every glyph whose centre lies inside `rect` (page coordinates)
    /// and optionally paint the rectangle with `fill`
    ///
    /// Returns the number of glyphs removed. Text outside the rectangle keeps
    /// its exact position.
    pub fn apply_redaction(
        &mut self,
        page_index: usize,
        rect: &Rect,
        fill: Option<Color>,
    ) -> Result<usize> {
        let page_id = self.page_id(page_index)?;
        let operations = self.page_operations(page_id)?;
        let shows = self.shows(page_id, &operations)?;
        let shows: Vec<&ShowOp> = shows.iter().collect();
        let resources = self.resources(page_id)?.cloned().unwrap_or_default();
        let (rewritten, forms, removed) =
            self.redact_operations(operations, &shows, 0, &resources, rect)?;

        if removed == 0 && fill.is_none() {
            return Ok(0);
        }

        if !forms.is_empty() {
            let resources = self.with_xobjects(&resources, &forms);
            let page_dict = self
                .inner
                .get_object_mut(page_id)?
                .as_dict_mut()
                .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))?;
            page_dict.set("Resources", Object::Dictionary(resources));
        }

        let mut ops = rewritten;
        if self.wrapped_pages.insert(page_id) {
            ops.insert(0, Operation::new("q", vec![]));
            ops.push(Operation::new("Q", vec![]));
        }
        if let Some(color) = fill {
            let media_box = self.media_box(page_id)?;
            let user_rect = Rect::new(
                rect.x0 + media_box.x0,
                media_box.y1 - rect.y1,
                rect.x1 + media_box.x0,
                media_box.y1 - rect.y0,
            );
            ops.extend(fill_rect_operations(&user_rect, color));
        }

        let content = Self::encode_operations(ops)?;
        self.set_page_content(page_id, content)?;
        tracing::debug!(page = page_index, removed, "applied redaction");
        Ok(removed)
    }

    /// Remove glyphs in `rect` from `operations` and from the forms they draw
    ///
    /// `shows` are the text operators reached from `operations`, with `depth`
    /// forms already entered. A form holding removed glyphs is copied, never
    /// edited, so its other uses keep their text; the `Do` operator is renamed
    /// to the copy. Returns the rewritten operations, the XObject resources
    /// the renamed operators need, and the number of glyphs removed.
    fn redact_operations(
        &mut self,
        mut operations: Vec<Operation>,
        shows: &[&ShowOp],
        depth: usize,
        resources: &Dictionary,
        rect: &Rect,
    ) -> Result<(Vec<Operation>, Vec<(Vec<u8>, ObjectId)>, usize)> {
        let mut calls: BTreeMap<FormCall, Vec<&ShowOp>> = BTreeMap::new();
        for show in shows {
            if let Some(call) = show.forms.get(depth) {
                calls.entry(*call).or_default().push(*show);
            }
        }

        let mut added: Vec<(Vec<u8>, ObjectId)> = Vec::new();
        let mut removed = 0;
        for (call, nested) in calls {
            if !nested.iter().any(|show| touches(show, rect)) {
                continue;
            }
            let form = self.inner.get_object(call.form_id)?.as_stream()?.clone();
            let content = form
                .decompressed_content()
                .unwrap_or_else(|_| form.content.clone());
            let form_operations = Content::decode(&content)
                .map(|c| c.operations)
                .map_err(|e| PdfError::ContentError(e.to_string()))?;
            let mut form_resources = get_dict(&self.inner, &form.dict, b"Resources")
                .cloned()
                .unwrap_or_else(|| resources.clone());

            let (form_operations, form_added, count) =
                self.redact_operations(form_operations, &nested, depth + 1, &form_resources, rect)?;
            if count == 0 {
                continue;
            }

            let mut dict = form.dict.clone();
            dict.remove(b"Filter");
            dict.remove(b"DecodeParms");
            dict.remove(b"Length");
            if !form_added.is_empty() {
                form_resources = self.with_xobjects(&form_resources, &form_added);
                dict.set("Resources", Object::Dictionary(form_resources));
            }
            let copy_id = self
                .inner
                .add_object(Stream::new(dict, Self::encode_operations(form_operations)?));

            let taken = get_dict(&self.inner, resources, b"XObject");
            let name = (1..)
                .map(|n| format!("FX{n}").into_bytes())
                .find(|name| {
                    !taken.is_some_and(|x| x.has(name)) && !added.iter().any(|(n, _)| n == name)
                })
                .unwrap_or_else(|| b"FX0".to_vec());
            if let Some(op) = operations.get_mut(call.op_index) {
                op.operands = vec![Object::Name(name.clone())];
            }
            added.push((name, copy_id));
            removed += count;
            tracing::debug!(form = ?call.form_id, copy = ?copy_id, count, "redacted form XObject copy");
        }

        let direct = shows.iter().copied().filter(|show| show.forms.len() == depth);
        let (rewritten, count) = remove_glyphs(&operations, direct, rect);
        Ok((rewritten, added, removed + count))
    }

    /// `resources` with extra XObject entries
    fn with_xobjects(&self, resources: &Dictionary, entries: &[(Vec<u8>, ObjectId)]) -> Dictionary {
        let mut resources = resources.clone();
        let mut xobjects = get_dict(&self.inner, &resources, b"XObject")
            .cloned()
            .unwrap_or_default();
        for (name, id) in entries {
            xobjects.set(name.clone(), Object::Reference(*id));
        }
        resources.set("XObject", Object::Dictionary(xobjects));
        resources
    }

    /// Draw characters with one font, size and colour
    ///
    /// Characters the font cannot encode are skipped; callers choose fonts
    /// per character beforehand.
    pub fn draw_glyph_run(
        &mut self,
        page_index: usize,
        font: &FontHandle,
        size: f64,
        color: Color,
        glyphs: &[PlacedChar],
    ) -> Result<()> {
        if glyphs.is_empty() {
            return Ok(());
        }
        let page_id = self.page_id(page_index)?;
        let media_box = self.media_box(page_id)?;

        let mut encoded = Vec::with_capacity(glyphs.len());
        for glyph in glyphs {
            match font.encode(glyph.c) {
                Some(code) => encoded.push(EncodedGlyph {
                    code,
                    x: glyph.origin.x + media_box.x0,
                    y: media_box.y1 - glyph.origin.y,
                }),
                None => tracing::warn!(
                    character = %glyph.c,
                    font = font.name(),
                    "character not encodable, skipped"
                ),
            }
        }

        let used: String = glyphs.iter().map(|g| g.c).collect();
        let resource_name = self.register_font(page_index, font, &used)?;

        let ctx = TextRenderContext {
            font_name: resource_name,
            font_size: size,
            color,
        };
        let operators = generate_glyph_run_operators(&encoded, &ctx);

        let wrapped = self.wrapped_operations(page_id)?;
        let mut content = Self::encode_operations(wrapped)?;
        content.push(b'\n');
        content.extend_from_slice(&operators);
        self.set_page_content(page_id, content)
    }

    /// Make `font` usable on a page for drawing `text`, returning its
    /// resource name
    ///
    /// Drawing registers fonts too; registering first reports embedding
    /// errors before the page is edited.
    pub fn register_font(&mut self, page_index: usize, font: &FontHandle, text: &str) -> Result<String> {
        let page_id = self.page_id(page_index)?;
        let font_id = self.font_object(font, text)?;
        self.add_font_to_page_resources(page_id, font_id)
    }

    /// Font dictionary for a handle, created on first use
    fn font_object(&mut self, font: &FontHandle, used: &str) -> Result<ObjectId> {
        match font {
            FontHandle::Standard(std) => {
                let key = font.key();
                if let Some(id) = self.font_objects.get(&key) {
                    return Ok(*id);
                }
                let id = self.embed_standard_font(*std);
                self.font_objects.insert(key, id);
                Ok(id)
            }
            FontHandle::Embedded(data) => self.embed_font_object(data, used),
        }
    }

    fn embed_standard_font(&mut self, font: Standard14) -> ObjectId {
        let entries: Vec<(u32, char)> = (0u8..=255)
            .filter_map(|code| {
                let c = if font == Standard14::ZapfDingbats {
                    dingbat_decode(code)
                } else {
                    win_ansi_decode(code)
                };
                c.map(|c| (code as u32, c))
            })
            .collect();
        let cmap = build_tounicode_cmap(1, &entries);
        let tounicode_id = self
            .inner
            .add_object(Stream::new(Dictionary::new(), cmap.into_bytes()));

        let mut dict = Dictionary::from_iter(vec![
            ("Type", Object::from("Font")),
            ("Subtype", "Type1".into()),
            ("BaseFont", font.base_font().into()),
            ("ToUnicode", Object::Reference(tounicode_id)),
        ]);
        if !font.is_symbolic() {
            dict.set("Encoding", "WinAnsiEncoding");
        }
        self.inner.add_object(dict)
    }

    /// Embed a TrueType font, or extend an embedded one with new characters
    fn embed_font_object(&mut self, data: &Arc<FontData>, used: &str) -> Result<ObjectId> {
        let key = format!("ttf:{}", data.name);

        if let Some(embedded) = self.embedded_fonts.get_mut(&key) {
            let before = embedded.data.used_chars.len();
            embedded.data.add_chars(used);
            if embedded.data.used_chars.len() != before {
                let widths = embedded.data.generate_widths_array();
                let cmap = embedded.data.generate_tounicode_cmap();
                let (type0_id, cid_font_id, tounicode_id) =
                    (embedded.type0_id, embedded.cid_font_id, embedded.tounicode_id);

                if let Ok(cid_font) = self
                    .inner
                    .get_object_mut(cid_font_id)
                    .and_then(Object::as_dict_mut)
                {
                    cid_font.set("W", Object::Array(widths));
                }
                self.inner.objects.insert(
                    tounicode_id,
                    Object::Stream(Stream::new(Dictionary::new(), cmap.into_bytes())),
                );
                return Ok(type0_id);
            }
            return Ok(embedded.type0_id);
        }

        let mut font_data = FontData::clone(data);
        font_data.add_chars(used);
        let font_objects = font_data.to_pdf_objects()?;

        let font_file_id = self.inner.add_object(font_objects.font_file_stream);

        let mut font_descriptor = font_objects.font_descriptor;
        font_descriptor.set("FontFile2", Object::Reference(font_file_id));
        let font_descriptor_id = self.inner.add_object(font_descriptor);

        let mut cid_font = font_objects.cid_font;
        cid_font.set("FontDescriptor", Object::Reference(font_descriptor_id));
        let cid_font_id = self.inner.add_object(cid_font);

        let tounicode_id = self.inner.add_object(font_objects.tounicode_stream);

        let mut type0_font = font_objects.type0_font;
        type0_font.set(
            "DescendantFonts",
            Object::Array(vec![Object::Reference(cid_font_id)]),
        );
        type0_font.set("ToUnicode", Object::Reference(tounicode_id));
        let type0_id = self.inner.add_object(type0_font);

        self.embedded_fonts.insert(
            key,
            EmbeddedFont {
                data: font_data,
                type0_id,
                cid_font_id,
                tounicode_id,
            },
        );
        Ok(type0_id)
    }

    /// Register a font in the page's Resources and return its resource name
    fn add_font_to_page_resources(&mut self, page_id: ObjectId, font_id: ObjectId) -> Result<String> {
        let mut resources_dict = self.resources(page_id)?.cloned().unwrap_or_default();
        let mut font_dict = get_dict(&self.inner, &resources_dict, b"Font")
            .cloned()
            .unwrap_or_default();

        let existing = font_dict
            .iter()
            .find(|(_, v)| matches!(v, Object::Reference(id) if *id == font_id))
            .map(|(k, _)| String::from_utf8_lossy(k).into_owned());

        let resource_name = match existing {
            Some(name) => return Ok(name),
            None => (1..)
                .map(|n| format!("FF{n}"))
                .find(|name| !font_dict.has(name.as_bytes()))
                .unwrap_or_else(|| "FF0".to_string()),
        };

        font_dict.set(resource_name.as_bytes(), Object::Reference(font_id));
        resources_dict.set("Font", Object::Dictionary(font_dict));

        let page_dict = self
            .inner
            .get_object_mut(page_id)?
            .as_dict_mut()
            .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))?;
        page_dict.set("Resources", Object::Dictionary(resources_dict));

        Ok(resource_name)
    }

    /// Find a complete (non-subset) TrueType program embedded under `name`
    pub fn embedded_font_program(&self, name: &str) -> Option<FontData> {
        let wanted = strip_subset_tag(name);
        for object in self.inner.objects.values() {
            let Ok(dict) = object.as_dict() else {
                continue;
            };
            if get_name(&self.inner, dict, b"Type") != Some(&b"Font"[..]) {
                continue;
            }
            let Some(base_font) = get_name(&self.inner, dict, b"BaseFont") else {
                continue;
            };
            let base_font = String::from_utf8_lossy(base_font);
            // Subset programs only carry the glyphs the document already uses
            if strip_subset_tag(&base_font) != base_font || base_font != wanted {
                continue;
            }

            let descriptor = match get_name(&self.inner, dict, b"Subtype") {
                Some(b"Type0") => get(&self.inner, dict, b"DescendantFonts")
                    .and_then(|d| d.as_array().ok())
                    .and_then(|a| a.first())
                    .and_then(|o| resolve(&self.inner, o).as_dict().ok())
                    .and_then(|cid| get_dict(&self.inner, cid, b"FontDescriptor")),
                _ => get_dict(&self.inner, dict, b"FontDescriptor"),
            };
            let program = descriptor
                .and_then(|fd| get(&self.inner, fd, b"FontFile2"))
                .and_then(crate::objects::stream_bytes);

            if let Some(bytes) = program {
                match FontData::from_ttf(&base_font, &bytes) {
                    Ok(font) => return Some(font),
                    Err(e) => tracing::debug!(font = %base_font, error = %e, "embedded program unusable"),
                }
            }
        }
        None
    }

    /// Interactive form fields, or `Flat` when the document has none
    pub fn form_kind(&self) -> InteractiveFieldsResult {
        read_form_fields(&self.inner)
    }

    /// Drop objects nothing refers to any more, such as replaced page
    /// content, then compress
    fn prepare_save(&mut self) {
        let pruned = self.inner.prune_objects();
        if !pruned.is_empty() {
            tracing::debug!(count = pruned.len(), "pruned unreferenced objects");
        }
        if self.compress {
            self.inner.compress();
        }
    }

    /// Save the document to a file
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.prepare_save();
        self.inner
            .save(path)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;
        Ok(())
    }

    /// Save the document to bytes
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.prepare_save();
        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_page(content: &str) -> PdfDocument {
        build_page(content, None).0
    }

    /// Page whose resources name `/X1`, a form showing `form` through `matrix`
    fn page_with_form(content: &str, matrix: [i64; 6], form: &str) -> (PdfDocument, ObjectId) {
        let (doc, form_id) = build_page(content, Some((matrix, form)));
        (doc, form_id.unwrap())
    }

    fn build_page(content: &str, form: Option<([i64; 6], &str)>) -> (PdfDocument, Option<ObjectId>) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::from("Font")),
            ("Subtype", "Type1".into()),
            ("BaseFont", "Helvetica".into()),
            ("Encoding", "WinAnsiEncoding".into()),
        ]));
        let fonts = Dictionary::from_iter(vec![("F1", Object::Reference(font_id))]);
        let mut resources = Dictionary::from_iter(vec![("Font", fonts.clone().into())]);

        let form_id = form.map(|(matrix, form)| {
            let dict = Dictionary::from_iter(vec![
                ("Type", Object::from("XObject")),
                ("Subtype", "Form".into()),
                (
                    "BBox",
                    vec![0.into(), 0.into(), 612.into(), 792.into()].into(),
                ),
                (
                    "Matrix",
                    matrix.iter().map(|v| Object::Integer(*v)).collect::<Vec<_>>().into(),
                ),
                (
                    "Resources",
                    Dictionary::from_iter(vec![("Font", fonts.into())]).into(),
                ),
            ]);
            let form_id = doc.add_object(Stream::new(dict, form.as_bytes().to_vec()));
            resources.set(
                "XObject",
                Dictionary::from_iter(vec![("X1", Object::Reference(form_id))]),
            );
            form_id
        });

        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.as_bytes().to_vec()));
        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::from("Page")),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
            ("Resources", resources.into()),
        ]));
        doc.objects.insert(
            pages_id,
            Object::Dictionary(Dictionary::from_iter(vec![
                ("Type", Object::from("Pages")),
                ("Kids", vec![Object::Reference(page_id)].into()),
                ("Count", 1.into()),
                (
                    "MediaBox",
                    vec![0.into(), 0.into(), 612.into(), 792.into()].into(),
                ),
            ])),
        );
        let catalog_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::from("Catalog")),
            ("Pages", Object::Reference(pages_id)),
        ]));
        doc.trailer.set("Root", Object::Reference(catalog_id));
        (PdfDocument::from_lopdf(doc), form_id)
    }

    fn draw_text(doc: &mut PdfDocument, text: &str, at: Point) {
        let helvetica = FontHandle::Standard(Standard14::Helvetica);
        let glyphs: Vec<PlacedChar> = text
            .chars()
            .scan(at.x, |x, c| {
                let placed = PlacedChar {
                    c,
                    origin: Point::new(*x, at.y),
                };
                *x += helvetica.char_width(c, 12.0);
                Some(placed)
            })
            .collect();
        doc.draw_glyph_run(0, &helvetica, 12.0, Color::black(), &glyphs)
            .unwrap();
    }

    #[test]
    fn test_inherited_media_box() {
        let doc = single_page("");
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.page_rect(0).unwrap(), Rect::new(0.0, 0.0, 612.0, 792.0));
        assert!(matches!(doc.page_rect(1), Err(PdfError::InvalidPage(1, 1))));
    }

    #[test]
    fn test_redaction_then_draw() {
        let mut doc = single_page("BT /F1 12 Tf 72 700 Td (Name: ____) Tj ET");
        let options = TextPageOptions::default();
        let page = doc.text_page(0, &options).unwrap();
        let hit = page.search("____")[0];

        let removed = doc.apply_redaction(0, &hit, Some(Color::white())).unwrap();
        assert_eq!(removed, 4);
        draw_text(&mut doc, "Ada", Point::new(hit.x0, 92.0));

        let page = doc.text_page(0, &options).unwrap();
        assert_eq!(page.lines.len(), 1);
        assert_eq!(page.lines[0].text(), "Name: Ada");
        assert!(page.search("____").is_empty());
    }

    #[test]
    fn test_redaction_without_hits_is_noop() {
        let mut doc = single_page("BT /F1 12 Tf 72 700 Td (Hello) Tj ET");
        let before = doc.page_content(doc.page_id(0).unwrap()).unwrap();
        let removed = doc
            .apply_redaction(0, &Rect::new(0.0, 0.0, 10.0, 10.0), None)
            .unwrap();
        assert_eq!(removed, 0);
        assert_eq!(doc.page_content(doc.page_id(0).unwrap()).unwrap(), before);
    }

    #[test]
    fn test_font_resource_names_do_not_collide() {
        let mut doc = single_page("");
        let page_id = doc.page_id(0).unwrap();
        let helv = FontHandle::Standard(Standard14::Helvetica);
        let dingbats = FontHandle::Standard(Standard14::ZapfDingbats);

        let helv_id = doc.font_object(&helv, "").unwrap();
        let first = doc.add_font_to_page_resources(page_id, helv_id).unwrap();
        let again = doc.add_font_to_page_resources(page_id, helv_id).unwrap();
        let dingbats_id = doc.font_object(&dingbats, "").unwrap();
        let second = doc.add_font_to_page_resources(page_id, dingbats_id).unwrap();

        assert_eq!(first, "FF1");
        assert_eq!(again, "FF1");
        assert_eq!(second, "FF2");
        assert_eq!(doc.font_object(&helv, "").unwrap(), helv_id);
    }

    #[test]
    fn test_embedded_font_program_missing() {
        let doc = single_page("");
        assert!(doc.embedded_font_program("Helvetica").is_none());
    }

    #[test]
    fn test_to_bytes_roundtrip() {
        let mut doc = single_page("BT /F1 12 Tf 72 700 Td (Hello) Tj ET");
        let bytes = doc.to_bytes().unwrap();
        let reopened = PdfDocument::open_from_bytes(&bytes).unwrap();
        let page = reopened.text_page(0, &TextPageOptions::default()).unwrap();
        assert_eq!(page.text(), "Hello");
    }

    #[test]
    fn test_edits_overwrite_one_content_stream() {
        let mut doc = single_page("BT /F1 12 Tf 72 700 Td (A: ____ B: ____ C: ____) Tj ET");
        let options = TextPageOptions::default();

        let mut counts = Vec::new();
        for value in ["1", "2", "3"] {
            let hit = doc.text_page(0, &options).unwrap().search("____")[0];
            doc.apply_redaction(0, &hit, Some(Color::white())).unwrap();
            draw_text(&mut doc, value, Point::new(hit.x0, 92.0));
            counts.push(doc.inner.objects.len());
        }
        assert_eq!(counts[1], counts[0]);
        assert_eq!(counts[2], counts[0]);
        assert_eq!(doc.text_page(0, &options).unwrap().text(), "A: 1 B: 2 C: 3");

        doc.to_bytes().unwrap();
        assert!(doc.inner.prune_objects().is_empty());
    }

    #[test]
    fn test_form_xobject_text_is_read() {
        let (doc, _) = page_with_form(
            "q /X1 Do Q",
            [1, 0, 0, 1, 72, 700],
            "BT /F1 12 Tf 0 0 Td (Name: ____) Tj ET",
        );
        let page = doc.text_page(0, &TextPageOptions::default()).unwrap();
        assert_eq!(page.text(), "Name: ____");
        let hit = page.search("____")[0];
        assert!(hit.x0 > 72.0);
        assert!(hit.y0 < 92.0 && hit.y1 > 92.0);
    }

    #[test]
    fn test_self_invoking_form_is_entered_once() {
        let (mut doc, form_id) = page_with_form(
            "/X1 Do",
            [1, 0, 0, 1, 72, 700],
            "BT /F1 12 Tf 0 0 Td (Loop) Tj ET /X1 Do",
        );
        let xobjects = Dictionary::from_iter(vec![("X1", Object::Reference(form_id))]);
        let form = doc.inner.get_object_mut(form_id).unwrap().as_stream_mut().unwrap();
        let resources = form.dict.get_mut(b"Resources").unwrap().as_dict_mut().unwrap();
        resources.set("XObject", xobjects);

        let page = doc.text_page(0, &TextPageOptions::default()).unwrap();
        assert_eq!(page.text(), "Loop");
    }

    #[test]
    fn test_redaction_inside_shared_form_copies_it() {
        let (mut doc, form_id) = page_with_form(
            "q /X1 Do Q q 1 0 0 1 0 -100 cm /X1 Do Q",
            [1, 0, 0, 1, 72, 700],
            "BT /F1 12 Tf 0 0 Td (Name: ____) Tj ET",
        );
        let options = TextPageOptions::default();
        let hits = doc.text_page(0, &options).unwrap().search("____");
        assert_eq!(hits.len(), 2);

        let removed = doc.apply_redaction(0, &hits[0], None).unwrap();
        assert_eq!(removed, 4);
        draw_text(&mut doc, "Ada", Point::new(hits[0].x0, 92.0));

        let page = doc.text_page(0, &options).unwrap();
        let remaining = page.search("____");
        assert_eq!(remaining.len(), 1);
        assert!((remaining[0].y0 - hits[1].y0).abs() < 1e-6);
        assert_eq!(page.search("Ada").len(), 1);

        // The second use still draws the untouched original
        let original = doc.inner.get_object(form_id).unwrap().as_stream().unwrap();
        assert!(original.content.windows(4).any(|w| w == b"____"));
        let resources = doc.resources(doc.page_id(0).unwrap()).unwrap().unwrap();
        let xobjects = get_dict(&doc.inner, resources, b"XObject").unwrap();
        assert!(xobjects.has(b"X1"));
        assert!(xobjects.has(b"FX1"));
    }

    #[test]
    fn test_register_broken_font_fails_without_edit() {
        let mut doc = single_page("BT /F1 12 Tf 72 700 Td (Hello) Tj ET");
        let page_id = doc.page_id(0).unwrap();
        let before = doc.page_content(page_id).unwrap();
        let broken = FontHandle::Embedded(Arc::new(FontData {
            name: "Broken".to_string(),
            ttf_data: vec![0; 16],
            used_chars: Default::default(),
        }));

        let result = doc.register_font(0, &broken, "x");
        assert!(matches!(result, Err(PdfError::FontParseError(_))));
        assert_eq!(doc.page_content(page_id).unwrap(), before);

        let helvetica = FontHandle::Standard(Standard14::Helvetica);
        assert_eq!(doc.register_font(0, &helvetica, "x").unwrap(), "FF1");
    }
}
