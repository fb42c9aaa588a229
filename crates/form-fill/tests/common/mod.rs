//! Fixture forms written to temporary directories

#![allow(dead_code)]

use lopdf::content::Content;
use lopdf::{dictionary, Document, Object, Stream};
use pdf_core::{PdfDocument, TextPageOptions};
use std::path::{Path, PathBuf};

/// Write a Letter-sized PDF with one page per content stream
///
/// Pages get Helvetica as `/F1`, Times-Roman as `/F2` and ZapfDingbats as
/// `/F3`.
pub fn write_form<S: AsRef<str>>(dir: &Path, name: &str, pages: &[S]) -> PathBuf {
    save(build(pages, None), dir, name)
}

/// Write a one-page PDF whose resources name `/X1`, a Form XObject showing
/// `form` through `matrix` with the same fonts as the page
pub fn write_form_with_xobject(
    dir: &Path,
    name: &str,
    page: &str,
    matrix: [i64; 6],
    form: &str,
) -> PathBuf {
    save(build(&[page], Some((matrix, form))), dir, name)
}

fn build<S: AsRef<str>>(pages: &[S], form: Option<([i64; 6], &str)>) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut fonts = lopdf::Dictionary::new();
    for (key, base) in [("F1", "Helvetica"), ("F2", "Times-Roman"), ("F3", "ZapfDingbats")] {
        let mut font = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => base,
        };
        if base != "ZapfDingbats" {
            font.set("Encoding", "WinAnsiEncoding");
        }
        fonts.set(key, doc.add_object(font));
    }

    let mut resources = dictionary! { "Font" => fonts.clone() };
    if let Some((matrix, content)) = form {
        let matrix: Vec<Object> = matrix.iter().map(|v| Object::Integer(*v)).collect();
        let form_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Matrix" => matrix,
                "Resources" => dictionary! { "Font" => fonts.clone() },
            },
            content.as_bytes().to_vec(),
        ));
        resources.set("XObject", dictionary! { "X1" => form_id });
    }

    let mut kids: Vec<Object> = Vec::new();
    for content in pages {
        let contents_id = doc.add_object(Stream::new(dictionary! {}, content.as_ref().as_bytes().to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Resources" => resources.clone(),
            "Contents" => contents_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => pages.len() as i64,
            "Kids" => kids,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

fn save(mut doc: Document, dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    doc.save(&path).unwrap();
    path
}

/// Content stream showing each `(user-space y, text)` pair at x = 72 in
/// 12 pt Helvetica
pub fn lines(lines: &[(f64, &str)]) -> String {
    lines
        .iter()
        .map(|(y, text)| format!("BT /F1 12 Tf 72 {y} Td ({text}) Tj ET"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extracted text of one page of the PDF at `path`
pub fn page_text(path: &Path, page: usize) -> String {
    PdfDocument::open(path)
        .unwrap()
        .text_page(page, &TextPageOptions::default())
        .unwrap()
        .text()
}

/// Decoded content operators of one page, for exact comparisons
pub fn page_operations(path: &Path, page: u32) -> Vec<String> {
    let doc = Document::load(path).unwrap();
    let page_id = doc.get_pages()[&(page + 1)];
    let content = doc.get_page_content(page_id).unwrap();
    Content::decode(&content)
        .unwrap()
        .operations
        .iter()
        .map(|op| format!("{op:?}"))
        .collect()
}
