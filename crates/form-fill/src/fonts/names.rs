//! Font name normalisation

use once_cell::sync::Lazy;
use pdf_core::strip_subset_tag;
use regex::Regex;

/// Vendor suffixes glued to PostScript family names ("ArialMT", "TimesNewRomanPSMT")
static VENDOR_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:PSMT|PS|MT)$").unwrap());

/// Split the family part of a font name from its style suffix
///
/// "ABCDEF+Arial-BoldMT" gives ("Arial", Some("BoldMT")); "Arial,Italic"
/// gives ("Arial", Some("Italic")).
pub fn split_style(name: &str) -> (&str, Option<&str>) {
    let name = strip_subset_tag(name);
    match name.find(['-', ',']) {
        Some(i) if i > 0 => {
            let style = &name[i + 1..];
            (&name[..i], (!style.is_empty()).then_some(style))
        }
        _ => (name, None),
    }
}

/// Human family name of a PDF font name
///
/// "TimesNewRomanPSMT" becomes "Times New Roman", "ABCDEF+Arial-BoldMT"
/// becomes "Arial".
pub fn family_name(name: &str) -> String {
    let (family, _) = split_style(name);
    let family = VENDOR_SUFFIX.replace(family, "");
    split_camel_case(family.trim())
}

fn split_camel_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || (prev.is_uppercase() && next_lower) {
                out.push(' ');
            }
        }
        if c == '_' {
            out.push(' ');
        } else {
            out.push(c);
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercase alphanumerics only, for comparing names and file stems
pub fn compact(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_style() {
        assert_eq!(split_style("Arial-BoldMT"), ("Arial", Some("BoldMT")));
        assert_eq!(split_style("ABCDEF+Arial,Italic"), ("Arial", Some("Italic")));
        assert_eq!(split_style("Helvetica"), ("Helvetica", None));
        assert_eq!(split_style("Foo-"), ("Foo", None));
    }

    #[test]
    fn test_family_name() {
        assert_eq!(family_name("TimesNewRomanPSMT"), "Times New Roman");
        assert_eq!(family_name("ABCDEF+Arial-BoldMT"), "Arial");
        assert_eq!(family_name("ArialMT"), "Arial");
        assert_eq!(family_name("DejaVuSans"), "Deja Vu Sans");
        assert_eq!(family_name("OpenSans-Regular"), "Open Sans");
        assert_eq!(family_name("PTSerif"), "PT Serif");
        assert_eq!(family_name("Noto_Sans"), "Noto Sans");
    }

    #[test]
    fn test_compact() {
        assert_eq!(compact("Times New Roman"), "timesnewroman");
        assert_eq!(compact("Open-Sans_Bold"), "opensansbold");
    }
}
