//! In-memory fixture documents for unit tests

use lopdf::{dictionary, Document, Object, Stream};
use pdf_core::PdfDocument;

/// A Letter-sized page per content stream, with Helvetica as `/F1`,
/// Times-Roman as `/F2` and ZapfDingbats as `/F3`
pub(crate) fn pages<S: AsRef<str>>(contents: &[S]) -> PdfDocument {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font = |doc: &mut Document, base: &str| {
        let mut dict = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => base,
        };
        if base != "ZapfDingbats" {
            dict.set("Encoding", "WinAnsiEncoding");
        }
        doc.add_object(dict)
    };
    let helvetica = font(&mut doc, "Helvetica");
    let times = font(&mut doc, "Times-Roman");
    let dingbats = font(&mut doc, "ZapfDingbats");

    let mut kids: Vec<Object> = Vec::new();
    for content in contents {
        let contents_id = doc.add_object(Stream::new(dictionary! {}, content.as_ref().as_bytes().to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Resources" => dictionary! {
                "Font" => dictionary! {
                    "F1" => helvetica,
                    "F2" => times,
                    "F3" => dingbats,
                },
            },
            "Contents" => contents_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => contents.len() as i64,
            "Kids" => kids,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    PdfDocument::from_lopdf(doc)
}

pub(crate) fn single_page(content: &str) -> PdfDocument {
    pages(&[content])
}

/// Content stream showing each `(user-space y, text)` pair at x = 72 in
/// 12 pt Helvetica
pub(crate) fn lines_content(lines: &[(f64, &str)]) -> String {
    lines
        .iter()
        .map(|(y, text)| format!("BT /F1 12 Tf 72 {y} Td ({text}) Tj ET"))
        .collect::<Vec<_>>()
        .join("\n")
}
