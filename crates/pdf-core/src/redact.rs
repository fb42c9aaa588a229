//! Glyph removal by rewriting text operators

use crate::geometry::Rect;
use crate::interpret::{ShowOp, ShownGlyph};
use crate::style::Color;
use lopdf::content::Operation;
use lopdf::Object;
use std::collections::HashMap;

/// Rewrite `operations` so no glyph whose centre lies in `rect` is painted
///
/// Each removed glyph is replaced by a `TJ` adjustment with the glyph's own
/// advance, leaving every other glyph where it was. Returns the rewritten
/// operations and the number of glyphs removed.
pub(crate) fn remove_glyphs<'s>(
    operations: &[Operation],
    shows: impl IntoIterator<Item = &'s ShowOp>,
    rect: &Rect,
) -> (Vec<Operation>, usize) {
    let mut replacements: HashMap<usize, Vec<Operation>> = HashMap::new();
    let mut removed_total = 0;

    for show in shows {
        let removed: Vec<bool> = show.glyphs.iter().map(|g| removable(g, rect)).collect();
        let count = removed.iter().filter(|r| **r).count();
        if count == 0 {
            continue;
        }
        let Some(op) = operations.get(show.op_index) else {
            continue;
        };
        if let Some(ops) = rewrite_show(op, show, &removed) {
            removed_total += count;
            replacements.insert(show.op_index, ops);
        }
    }

    let mut result = Vec::with_capacity(operations.len() + replacements.len() * 3);
    for (index, op) in operations.iter().enumerate() {
        match replacements.remove(&index) {
            Some(ops) => result.extend(ops),
            None => result.push(op.clone()),
        }
    }
    (result, removed_total)
}

fn removable(glyph: &ShownGlyph, rect: &Rect) -> bool {
    glyph.adjustment.is_some() && rect.contains_point(glyph.bbox.center())
}

/// Whether [`remove_glyphs`] would remove any glyph of `show`
pub(crate) fn touches(show: &ShowOp, rect: &Rect) -> bool {
    show.glyphs.iter().any(|g| removable(g, rect))
}

fn rewrite_show(op: &Operation, show: &ShowOp, removed: &[bool]) -> Option<Vec<Operation>> {
    let elements: Vec<(usize, &Object)> = match op.operator.as_str() {
        "Tj" | "'" => vec![(0, op.operands.first()?)],
        "\"" => vec![(2, op.operands.get(2)?)],
        "TJ" => match op.operands.first()? {
            Object::Array(items) => items.iter().enumerate().collect(),
            _ => return None,
        },
        _ => return None,
    };

    let mut items = Vec::new();
    for (element, obj) in elements {
        let Object::String(bytes, format) = obj else {
            items.push(obj.clone());
            continue;
        };

        let mut pending: Vec<u8> = Vec::new();
        let glyphs = show
            .glyphs
            .iter()
            .zip(removed)
            .filter(|(g, _)| g.element == element);
        for (glyph, is_removed) in glyphs {
            match (*is_removed, glyph.adjustment) {
                (true, Some(adjustment)) => {
                    if !pending.is_empty() {
                        items.push(Object::String(std::mem::take(&mut pending), format.clone()));
                    }
                    items.push(Object::Real(adjustment as f32));
                }
                _ => pending.extend_from_slice(bytes.get(glyph.bytes.clone()).unwrap_or(&[])),
            }
        }
        if !pending.is_empty() {
            items.push(Object::String(pending, format.clone()));
        }
    }

    let show_array = Operation::new("TJ", vec![Object::Array(items)]);
    let ops = match op.operator.as_str() {
        "'" => vec![Operation::new("T*", vec![]), show_array],
        "\"" => vec![
            Operation::new("Tw", vec![op.operands.first()?.clone()]),
            Operation::new("Tc", vec![op.operands.get(1)?.clone()]),
            Operation::new("T*", vec![]),
            show_array,
        ],
        _ => vec![show_array],
    };
    Some(ops)
}

/// Operators painting `rect` (user space) with a solid colour
pub(crate) fn fill_rect_operations(rect: &Rect, color: Color) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "rg",
            vec![
                Object::Real(color.r),
                Object::Real(color.g),
                Object::Real(color.b),
            ],
        ),
        Operation::new(
            "re",
            vec![
                Object::Real(rect.x0 as f32),
                Object::Real(rect.y0 as f32),
                Object::Real(rect.width() as f32),
                Object::Real(rect.height() as f32),
            ],
        ),
        Operation::new("f", vec![]),
        Operation::new("Q", vec![]),
    ]
}
