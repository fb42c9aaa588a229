//! Content stream interpretation: where every shown glyph lands on the page

use crate::geometry::{Matrix, Point, Rect};
use crate::objects::{get_array, get_dict, get_name, number, resolve};
use crate::pdf_font::PdfFont;
use crate::style::Color;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashMap;
use std::ops::Range;
use std::rc::Rc;

/// A glyph placed by a text-showing operator
#[derive(Debug, Clone)]
pub(crate) struct ShownGlyph {
    pub text: String,
    /// Glyph box in top-down page coordinates
    pub bbox: Rect,
    /// Baseline origin in top-down page coordinates
    pub origin: Point,
    /// Index of the string element inside the operator's operands (TJ arrays)
    pub element: usize,
    /// Byte range of the glyph's code inside that string
    pub bytes: Range<usize>,
    /// `TJ` adjustment that moves by exactly this glyph's advance
    pub adjustment: Option<f64>,
}

/// Nesting limit for Form XObjects drawing other forms
const MAX_FORM_DEPTH: usize = 8;

/// A `Do` operator that entered a Form XObject
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct FormCall {
    /// Index of the `Do` operator in the invoking stream
    pub op_index: usize,
    pub form_id: ObjectId,
}

/// One text-showing operator with its resolved state
#[derive(Debug, Clone)]
pub(crate) struct ShowOp {
    /// Index of the operator in the stream that owns it
    pub op_index: usize,
    /// Forms entered to reach the operator, outermost first; empty for page
    /// content
    pub forms: Vec<FormCall>,
    pub font: Rc<PdfFont>,
    /// Font size after text and graphics scaling
    pub size: f64,
    pub color: Color,
    pub glyphs: Vec<ShownGlyph>,
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    fill: Color,
    char_spacing: f64,
    word_spacing: f64,
    horizontal_scale: f64,
    leading: f64,
    rise: f64,
    font: Option<Rc<PdfFont>>,
    font_size: f64,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Matrix::identity(),
            fill: Color::black(),
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
            font: None,
            font_size: 0.0,
        }
    }
}

/// Walks a decoded content stream keeping the graphics and text state
pub(crate) struct Interpreter<'a> {
    doc: &'a Document,
    fonts: Option<&'a Dictionary>,
    xobjects: Option<&'a Dictionary>,
    /// MediaBox in user space, used to flip into top-down coordinates
    media_box: Rect,
    font_cache: HashMap<Vec<u8>, Rc<PdfFont>>,
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    forms: Vec<FormCall>,
}

fn operand(op: &Operation, i: usize) -> f64 {
    op.operands.get(i).and_then(number).unwrap_or(0.0)
}

fn numbers(op: &Operation) -> Vec<f64> {
    op.operands.iter().filter_map(number).collect()
}

impl<'a> Interpreter<'a> {
    pub fn new(doc: &'a Document, resources: Option<&'a Dictionary>, media_box: Rect) -> Self {
        Self {
            doc,
            fonts: resources.and_then(|r| get_dict(doc, r, b"Font")),
            xobjects: resources.and_then(|r| get_dict(doc, r, b"XObject")),
            media_box,
            font_cache: HashMap::new(),
            state: GraphicsState::default(),
            stack: Vec::new(),
            text_matrix: Matrix::identity(),
            line_matrix: Matrix::identity(),
            forms: Vec::new(),
        }
    }

    /// Interpret the Form XObject a `Do` operator names
    ///
    /// The form starts from the invoking graphics state with its `/Matrix`
    /// applied, and uses its own `/Resources` when it has them. Image
    /// XObjects, inline forms and recursive invocations are skipped.
    fn run_form(&self, op_index: usize, name: &[u8]) -> Vec<ShowOp> {
        let Some(Object::Reference(form_id)) = self.xobjects.and_then(|x| x.get(name).ok())
        else {
            return Vec::new();
        };
        let form_id = *form_id;
        if self.forms.len() >= MAX_FORM_DEPTH || self.forms.iter().any(|c| c.form_id == form_id) {
            tracing::debug!(?form_id, "recursive form XObject not entered");
            return Vec::new();
        }

        let doc = self.doc;
        let Ok(stream) = doc.get_object(form_id).and_then(Object::as_stream) else {
            return Vec::new();
        };
        if get_name(doc, &stream.dict, b"Subtype") != Some(&b"Form"[..]) {
            return Vec::new();
        }
        let content = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());
        let operations = match Content::decode(&content) {
            Ok(content) => content.operations,
            Err(e) => {
                tracing::warn!(?form_id, error = %e, "unreadable form XObject content");
                return Vec::new();
            }
        };

        let matrix = get_array(doc, &stream.dict, b"Matrix")
            .map(|arr| arr.iter().filter_map(|o| number(resolve(doc, o))).collect::<Vec<_>>())
            .filter(|v| v.len() == 6)
            .map(|v| Matrix::new(v[0], v[1], v[2], v[3], v[4], v[5]))
            .unwrap_or_else(Matrix::identity);
        let (fonts, xobjects) = match get_dict(doc, &stream.dict, b"Resources") {
            Some(res) => (get_dict(doc, res, b"Font"), get_dict(doc, res, b"XObject")),
            None => (self.fonts, self.xobjects),
        };

        let mut state = self.state.clone();
        state.ctm = matrix.concat(&self.state.ctm);
        let mut forms = self.forms.clone();
        forms.push(FormCall { op_index, form_id });

        Interpreter {
            doc,
            fonts,
            xobjects,
            media_box: self.media_box,
            font_cache: HashMap::new(),
            state,
            stack: Vec::new(),
            text_matrix: Matrix::identity(),
            line_matrix: Matrix::identity(),
            forms,
        }
        .run(&operations)
    }

    fn load_font(&mut self, name: &[u8]) -> Rc<PdfFont> {
        if let Some(font) = self.font_cache.get(name) {
            return Rc::clone(font);
        }
        let font = self
            .fonts
            .and_then(|fonts| fonts.get(name).ok())
            .and_then(|obj| resolve(self.doc, obj).as_dict().ok())
            .map(|dict| PdfFont::load(self.doc, dict))
            .unwrap_or_else(|| {
                tracing::debug!(
                    font = %String::from_utf8_lossy(name),
                    "font resource missing, using Helvetica metrics"
                );
                PdfFont::fallback()
            });
        let font = Rc::new(font);
        self.font_cache.insert(name.to_vec(), Rc::clone(&font));
        font
    }

    fn to_page(&self, p: Point) -> Point {
        Point::new(p.x - self.media_box.x0, self.media_box.y1 - p.y)
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = Matrix::translate(tx, ty).concat(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    /// Interpret all operations, returning every text-showing operator
    pub fn run(mut self, operations: &[Operation]) -> Vec<ShowOp> {
        let mut shows = Vec::new();

        for (index, op) in operations.iter().enumerate() {
            match op.operator.as_str() {
                "q" => self.stack.push(self.state.clone()),
                "Q" => {
                    if let Some(state) = self.stack.pop() {
                        self.state = state;
                    }
                }
                "cm" => {
                    let v = numbers(op);
                    if v.len() == 6 {
                        let m = Matrix::new(v[0], v[1], v[2], v[3], v[4], v[5]);
                        self.state.ctm = m.concat(&self.state.ctm);
                    }
                }
                "g" => self.state.fill = Color::gray(operand(op, 0) as f32),
                "rg" => {
                    self.state.fill = Color::rgb(
                        operand(op, 0) as f32,
                        operand(op, 1) as f32,
                        operand(op, 2) as f32,
                    )
                }
                "k" => {
                    self.state.fill = Color::cmyk(
                        operand(op, 0) as f32,
                        operand(op, 1) as f32,
                        operand(op, 2) as f32,
                        operand(op, 3) as f32,
                    )
                }
                "cs" => self.state.fill = Color::black(),
                "sc" | "scn" => {
                    let v = numbers(op);
                    match v.len() {
                        1 => self.state.fill = Color::gray(v[0] as f32),
                        3 => self.state.fill = Color::rgb(v[0] as f32, v[1] as f32, v[2] as f32),
                        4 => {
                            self.state.fill =
                                Color::cmyk(v[0] as f32, v[1] as f32, v[2] as f32, v[3] as f32)
                        }
                        _ => {}
                    }
                }
                "BT" => {
                    self.text_matrix = Matrix::identity();
                    self.line_matrix = Matrix::identity();
                }
                "Tc" => self.state.char_spacing = operand(op, 0),
                "Tw" => self.state.word_spacing = operand(op, 0),
                "Tz" => self.state.horizontal_scale = operand(op, 0) / 100.0,
                "TL" => self.state.leading = operand(op, 0),
                "Ts" => self.state.rise = operand(op, 0),
                "Tf" => {
                    if let Some(Object::Name(name)) = op.operands.first() {
                        self.state.font = Some(self.load_font(name));
                    }
                    self.state.font_size = operand(op, 1);
                }
                "Td" => self.move_line(operand(op, 0), operand(op, 1)),
                "TD" => {
                    self.state.leading = -operand(op, 1);
                    self.move_line(operand(op, 0), operand(op, 1));
                }
                "Tm" => {
                    let v = numbers(op);
                    if v.len() == 6 {
                        self.line_matrix = Matrix::new(v[0], v[1], v[2], v[3], v[4], v[5]);
                        self.text_matrix = self.line_matrix;
                    }
                }
                "T*" => self.move_line(0.0, -self.state.leading),
                "Tj" => {
                    if let Some(Object::String(bytes, _)) = op.operands.first() {
                        let mut show = self.begin_show(index);
                        self.show_string(&mut show, 0, bytes);
                        shows.push(show);
                    }
                }
                "'" => {
                    self.move_line(0.0, -self.state.leading);
                    if let Some(Object::String(bytes, _)) = op.operands.first() {
                        let mut show = self.begin_show(index);
                        self.show_string(&mut show, 0, bytes);
                        shows.push(show);
                    }
                }
                "\"" => {
                    self.state.word_spacing = operand(op, 0);
                    self.state.char_spacing = operand(op, 1);
                    self.move_line(0.0, -self.state.leading);
                    if let Some(Object::String(bytes, _)) = op.operands.get(2) {
                        let mut show = self.begin_show(index);
                        self.show_string(&mut show, 2, bytes);
                        shows.push(show);
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = op.operands.first() {
                        let mut show = self.begin_show(index);
                        for (element, item) in items.iter().enumerate() {
                            match item {
                                Object::String(bytes, _) => {
                                    self.show_string(&mut show, element, bytes)
                                }
                                other => {
                                    if let Some(n) = number(other) {
                                        let tx = -n / 1000.0
                                            * self.state.font_size
                                            * self.state.horizontal_scale;
                                        self.text_matrix =
                                            Matrix::translate(tx, 0.0).concat(&self.text_matrix);
                                    }
                                }
                            }
                        }
                        shows.push(show);
                    }
                }
                "Do" => {
                    if let Some(Object::Name(name)) = op.operands.first() {
                        shows.extend(self.run_form(index, name));
                    }
                }
                _ => {}
            }
        }

        shows
    }

    fn begin_show(&mut self, op_index: usize) -> ShowOp {
        let font = match &self.state.font {
            Some(font) => Rc::clone(font),
            None => {
                let font = Rc::new(PdfFont::fallback());
                self.state.font = Some(Rc::clone(&font));
                font
            }
        };
        let m = self.text_matrix.concat(&self.state.ctm);
        let size = (self.state.font_size * m.c.hypot(m.d)).abs();
        ShowOp {
            op_index,
            forms: self.forms.clone(),
            font,
            size,
            color: self.state.fill,
            glyphs: Vec::new(),
        }
    }

    fn show_string(&mut self, show: &mut ShowOp, element: usize, bytes: &[u8]) {
        let font = Rc::clone(&show.font);
        let st = &self.state;
        let (asc, desc) = (font.ascent / 1000.0, font.descent / 1000.0);

        for glyph in font.decode(bytes) {
            let w0 = glyph.width / 1000.0;
            let rendering = Matrix::new(
                st.font_size * st.horizontal_scale,
                0.0,
                0.0,
                st.font_size,
                0.0,
                st.rise,
            )
            .concat(&self.text_matrix)
            .concat(&st.ctm);

            let corners = [
                rendering.transform(0.0, desc),
                rendering.transform(w0, desc),
                rendering.transform(0.0, asc),
                rendering.transform(w0, asc),
            ]
            .map(|p| self.to_page(p));
            let bbox = Rect::from_points(&corners).unwrap_or_default();
            let origin = self.to_page(rendering.transform(0.0, 0.0));

            let spacing = st.char_spacing + if glyph.is_word_space { st.word_spacing } else { 0.0 };
            let adjustment = (st.font_size != 0.0)
                .then(|| -(glyph.width + spacing * 1000.0 / st.font_size));

            show.glyphs.push(ShownGlyph {
                text: glyph.text,
                bbox,
                origin,
                element,
                bytes: glyph.bytes,
                adjustment,
            });

            let tx = (w0 * st.font_size + spacing) * st.horizontal_scale;
            self.text_matrix = Matrix::translate(tx, 0.0).concat(&self.text_matrix);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Content;

    fn shows_for(content: &str) -> Vec<ShowOp> {
        let doc = Document::with_version("1.5");
        let ops = Content::decode(content.as_bytes()).unwrap().operations;
        Interpreter::new(&doc, None, Rect::new(0.0, 0.0, 612.0, 792.0)).run(&ops)
    }

    #[test]
    fn test_glyph_positions_follow_widths() {
        let shows = shows_for("BT /F1 10 Tf 100 700 Td (AB) Tj ET");
        assert_eq!(shows.len(), 1);
        let glyphs = &shows[0].glyphs;
        assert_eq!(glyphs[0].text, "A");
        assert!((glyphs[0].origin.x - 100.0).abs() < 1e-6);
        assert!((glyphs[0].origin.y - 92.0).abs() < 1e-6);
        // Helvetica A is 667/1000 em wide
        assert!((glyphs[1].origin.x - 106.67).abs() < 1e-6);
        assert!((glyphs[0].bbox.y1 - (92.0 + 2.07)).abs() < 1e-6);
        assert!((shows[0].size - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_tj_adjustments_and_spacing() {
        let shows = shows_for("BT /F1 10 Tf 2 Tc 0 0 Td [(A) -1000 (B)] TJ ET");
        let glyphs = &shows[0].glyphs;
        // 6.67 advance + 2 char spacing + 10 from the -1000 adjustment
        assert!((glyphs[1].origin.x - 18.67).abs() < 1e-6);
        assert_eq!(glyphs[1].element, 2);
        let adj = glyphs[0].adjustment.unwrap();
        assert!((adj + 867.0).abs() < 1e-6);
    }

    #[test]
    fn test_state_stack_and_color() {
        let shows = shows_for(
            "q 1 0 0 rg 2 0 0 2 0 0 cm BT /F1 10 Tf 10 10 Td (x) Tj ET Q BT /F1 10 Tf (y) Tj ET",
        );
        assert_eq!(shows[0].color, Color::rgb(1.0, 0.0, 0.0));
        assert!((shows[0].size - 20.0).abs() < 1e-9);
        assert!((shows[0].glyphs[0].origin.x - 20.0).abs() < 1e-6);
        assert_eq!(shows[1].color, Color::black());
        assert!((shows[1].size - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_quote_operators_move_to_next_line() {
        let shows = shows_for("BT /F1 10 Tf 12 TL 0 100 Td (a) Tj (b) ' 1 2 (c) \" ET");
        assert!((shows[1].glyphs[0].origin.y - (792.0 - 88.0)).abs() < 1e-6);
        assert!((shows[2].glyphs[0].origin.y - (792.0 - 76.0)).abs() < 1e-6);
        assert_eq!(shows[2].glyphs[0].element, 2);
    }
}
