//! Replacement text clean-up before drawing

use std::borrow::Cow;

/// Characters many fonts cannot draw, with their ASCII stand-ins
const REPLACEMENTS: [(char, &str); 8] = [
    ('\u{201C}', "\""),
    ('\u{201D}', "\""),
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{2014}', "--"),
    ('\u{2013}', "-"),
    ('\u{2026}', "..."),
    ('\u{00A0}', " "),
];

fn ascii_for(c: char) -> Option<&'static str> {
    REPLACEMENTS
        .iter()
        .find(|(from, _)| *from == c)
        .map(|(_, to)| *to)
}

/// Replace smart quotes, dashes, ellipsis and no-break space with ASCII
pub fn sanitize_for_pdf(text: &str) -> Cow<'_, str> {
    if !text.chars().any(|c| ascii_for(c).is_some()) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut replaced: Vec<char> = Vec::new();
    for c in text.chars() {
        match ascii_for(c) {
            Some(ascii) => {
                out.push_str(ascii);
                if !replaced.contains(&c) {
                    replaced.push(c);
                }
            }
            None => out.push(c),
        }
    }

    let summary: Vec<String> = replaced
        .iter()
        .filter_map(|c| ascii_for(*c).map(|ascii| format!("'{c}' -> '{ascii}'")))
        .collect();
    tracing::debug!(replaced = %summary.join(", "), "sanitized replacement text");
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_text_is_borrowed() {
        assert!(matches!(sanitize_for_pdf("Alice"), Cow::Borrowed("Alice")));
        assert_eq!(sanitize_for_pdf(""), "");
    }

    #[test]
    fn test_replacements() {
        assert_eq!(
            sanitize_for_pdf("\u{201C}Hi\u{201D} \u{2014} it\u{2019}s 1\u{2013}2\u{2026}"),
            "\"Hi\" -- it's 1-2..."
        );
        assert_eq!(sanitize_for_pdf("a\u{00A0}b"), "a b");
    }

    #[test]
    fn test_other_unicode_untouched() {
        assert_eq!(sanitize_for_pdf("café ☑ ภาษาไทย"), "café ☑ ภาษาไทย");
    }
}
