//! Interactive form (AcroForm) detection

use crate::objects::{get, get_array, get_dict, get_name, resolve, text_string};
use lopdf::{Dictionary, Document, Object};

const MAX_FIELD_DEPTH: usize = 32;

/// Field type from `/FT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Button,
    Choice,
    Signature,
    Unknown,
}

impl FieldKind {
    fn from_name(name: Option<&[u8]>) -> Self {
        match name {
            Some(b"Tx") => Self::Text,
            Some(b"Btn") => Self::Button,
            Some(b"Ch") => Self::Choice,
            Some(b"Sig") => Self::Signature,
            _ => Self::Unknown,
        }
    }
}

/// A terminal form field
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    /// Fully qualified name, partial names joined with '.'
    pub name: String,
    pub kind: FieldKind,
    pub value: Option<String>,
    /// Alternate (user-facing) name from `/TU`
    pub label: Option<String>,
}

impl FormField {
    /// Copy the user-editable attributes of `other` onto this field
    pub fn update_from(&mut self, other: &FormField) {
        self.value = other.value.clone();
        self.label = other.label.clone();
    }
}

/// Whether a document carries fillable fields
#[derive(Debug, Clone, PartialEq)]
pub enum InteractiveFieldsResult {
    Interactive(Vec<FormField>),
    Flat,
}

impl InteractiveFieldsResult {
    pub fn is_flat(&self) -> bool {
        matches!(self, Self::Flat)
    }
}

/// Read the AcroForm field tree; anything malformed reads as flat
pub fn read_form_fields(doc: &Document) -> InteractiveFieldsResult {
    let catalog = doc
        .trailer
        .get(b"Root")
        .ok()
        .and_then(|root| resolve(doc, root).as_dict().ok());
    let Some(fields) = catalog
        .and_then(|catalog| get_dict(doc, catalog, b"AcroForm"))
        .and_then(|acroform| get_array(doc, acroform, b"Fields"))
    else {
        return InteractiveFieldsResult::Flat;
    };

    let mut collected = Vec::new();
    for field in fields {
        if let Ok(dict) = resolve(doc, field).as_dict() {
            collect_fields(doc, dict, "", None, 0, &mut collected);
        }
    }

    if collected.is_empty() {
        InteractiveFieldsResult::Flat
    } else {
        InteractiveFieldsResult::Interactive(collected)
    }
}

fn collect_fields<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    parent_name: &str,
    parent_kind: Option<&'a [u8]>,
    depth: usize,
    out: &mut Vec<FormField>,
) {
    if depth > MAX_FIELD_DEPTH {
        return;
    }

    let partial = get(doc, dict, b"T").and_then(text_string);
    let name = match (&partial, parent_name.is_empty()) {
        (Some(p), true) => p.clone(),
        (Some(p), false) => format!("{parent_name}.{p}"),
        (None, _) => parent_name.to_string(),
    };
    let kind_name = get_name(doc, dict, b"FT").or(parent_kind);

    // Kids carrying their own /T are child fields; the rest are widgets
    let child_fields: Vec<&'a Dictionary> = get_array(doc, dict, b"Kids")
        .map(|kids| {
            kids.iter()
                .filter_map(|kid| resolve(doc, kid).as_dict().ok())
                .filter(|kid| kid.has(b"T"))
                .collect()
        })
        .unwrap_or_default();

    if !child_fields.is_empty() {
        for child in child_fields {
            collect_fields(doc, child, &name, kind_name, depth + 1, out);
        }
        return;
    }

    if name.is_empty() {
        return;
    }

    let value = match get(doc, dict, b"V") {
        Some(Object::Name(n)) => Some(String::from_utf8_lossy(n).into_owned()),
        Some(obj) => text_string(obj),
        None => None,
    };
    out.push(FormField {
        name,
        kind: FieldKind::from_name(kind_name),
        value,
        label: get(doc, dict, b"TU").and_then(text_string),
    });
}
