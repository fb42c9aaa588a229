//! Built-in metrics for the standard 14 Type1 fonts

use crate::encoding::{dingbat_width, win_ansi_decode, LATIN1_BASE_LETTERS};

/// Widths for codes 32..=126
type AsciiWidths = [u16; 95];

#[rustfmt::skip]
const HELVETICA: AsciiWidths = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: AsciiWidths = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[rustfmt::skip]
const TIMES_ROMAN: AsciiWidths = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

#[rustfmt::skip]
const TIMES_BOLD: AsciiWidths = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500,
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500,
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];

#[rustfmt::skip]
const TIMES_ITALIC: AsciiWidths = [
    250, 333, 420, 500, 500, 833, 778, 214, 333, 333, 500, 675, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 675, 675, 675, 500,
    920, 611, 611, 667, 722, 611, 611, 722, 722, 333, 444, 667, 556, 833, 667, 722,
    611, 722, 611, 500, 556, 722, 611, 833, 611, 556, 556, 389, 278, 389, 422, 500,
    333, 500, 500, 444, 500, 444, 278, 500, 500, 278, 278, 444, 278, 722, 500, 500,
    500, 500, 389, 389, 278, 500, 444, 667, 444, 444, 389, 400, 275, 400, 541,
];

/// The standard 14 fonts every PDF viewer provides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Standard14 {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
    Symbol,
    ZapfDingbats,
}

impl Standard14 {
    /// Resolve a base font name, including the common aliases PDF producers use
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim_start_matches('/');
        let normalized: String = name
            .chars()
            .filter(|c| !matches!(c, ' ' | '_'))
            .collect::<String>()
            .to_ascii_lowercase();

        let font = match normalized.as_str() {
            "helvetica" | "helv" => Self::Helvetica,
            "helvetica-bold" | "helvetica,bold" | "hebo" => Self::HelveticaBold,
            "helvetica-oblique" | "helvetica-italic" | "helvetica,italic" | "heit" => {
                Self::HelveticaOblique
            }
            "helvetica-boldoblique" | "helvetica-bolditalic" | "helvetica,bolditalic" | "hebi" => {
                Self::HelveticaBoldOblique
            }
            "times-roman" | "times" | "timesroman" | "tiro" => Self::TimesRoman,
            "times-bold" | "times,bold" | "tibo" => Self::TimesBold,
            "times-italic" | "times,italic" | "tiit" => Self::TimesItalic,
            "times-bolditalic" | "times,bolditalic" | "tibi" => Self::TimesBoldItalic,
            "courier" | "cour" => Self::Courier,
            "courier-bold" | "courier,bold" | "cobo" => Self::CourierBold,
            "courier-oblique" | "courier-italic" | "courier,italic" | "coit" => {
                Self::CourierOblique
            }
            "courier-boldoblique" | "courier-bolditalic" | "courier,bolditalic" | "cobi" => {
                Self::CourierBoldOblique
            }
            "symbol" | "symb" => Self::Symbol,
            "zapfdingbats" | "zadb" => Self::ZapfDingbats,
            _ => return None,
        };
        Some(font)
    }

    /// PostScript base font name
    pub fn base_font(self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::HelveticaOblique => "Helvetica-Oblique",
            Self::HelveticaBoldOblique => "Helvetica-BoldOblique",
            Self::TimesRoman => "Times-Roman",
            Self::TimesBold => "Times-Bold",
            Self::TimesItalic => "Times-Italic",
            Self::TimesBoldItalic => "Times-BoldItalic",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
            Self::CourierOblique => "Courier-Oblique",
            Self::CourierBoldOblique => "Courier-BoldOblique",
            Self::Symbol => "Symbol",
            Self::ZapfDingbats => "ZapfDingbats",
        }
    }

    /// Symbolic fonts use their built-in encoding instead of WinAnsi
    pub fn is_symbolic(self) -> bool {
        matches!(self, Self::Symbol | Self::ZapfDingbats)
    }

    pub fn is_bold(self) -> bool {
        matches!(
            self,
            Self::HelveticaBold
                | Self::HelveticaBoldOblique
                | Self::TimesBold
                | Self::TimesBoldItalic
                | Self::CourierBold
                | Self::CourierBoldOblique
        )
    }

    pub fn is_italic(self) -> bool {
        matches!(
            self,
            Self::HelveticaOblique
                | Self::HelveticaBoldOblique
                | Self::TimesItalic
                | Self::TimesBoldItalic
                | Self::CourierOblique
                | Self::CourierBoldOblique
        )
    }

    pub fn is_serif(self) -> bool {
        matches!(
            self,
            Self::TimesRoman | Self::TimesBold | Self::TimesItalic | Self::TimesBoldItalic
        )
    }

    pub fn is_monospace(self) -> bool {
        matches!(
            self,
            Self::Courier | Self::CourierBold | Self::CourierOblique | Self::CourierBoldOblique
        )
    }

    /// Ascent and descent in 1/1000 em
    pub fn ascent_descent(self) -> (f64, f64) {
        match self {
            Self::Helvetica
            | Self::HelveticaBold
            | Self::HelveticaOblique
            | Self::HelveticaBoldOblique => (718.0, -207.0),
            Self::TimesRoman | Self::TimesBold | Self::TimesItalic | Self::TimesBoldItalic => {
                (683.0, -217.0)
            }
            Self::Courier
            | Self::CourierBold
            | Self::CourierOblique
            | Self::CourierBoldOblique => (629.0, -157.0),
            Self::Symbol => (1010.0, -293.0),
            Self::ZapfDingbats => (820.0, -143.0),
        }
    }

    fn ascii_table(self) -> Option<&'static AsciiWidths> {
        match self {
            Self::Helvetica | Self::HelveticaOblique => Some(&HELVETICA),
            Self::HelveticaBold | Self::HelveticaBoldOblique => Some(&HELVETICA_BOLD),
            Self::TimesRoman => Some(&TIMES_ROMAN),
            Self::TimesBold | Self::TimesBoldItalic => Some(&TIMES_BOLD),
            Self::TimesItalic => Some(&TIMES_ITALIC),
            _ => None,
        }
    }

    /// Width in 1/1000 em of a WinAnsi code (or built-in code for symbolic fonts)
    pub fn code_width(self, code: u8) -> u16 {
        if self.is_monospace() {
            return 600;
        }
        if self == Self::ZapfDingbats {
            return dingbat_width(code).unwrap_or(788);
        }
        let Some(table) = self.ascii_table() else {
            return 600;
        };
        match code {
            32..=126 => table[(code - 32) as usize],
            0xA0 => table[0],
            0xC0..=0xFF => {
                // Accented letters take the width of their base letter
                let base = LATIN1_BASE_LETTERS[(code - 0xC0) as usize] as u8;
                table[(base - 32) as usize]
            }
            _ => match win_ansi_decode(code) {
                Some('\u{2014}') | Some('\u{2030}') => 1000,
                Some('\u{2013}') | Some('\u{2020}') | Some('\u{2021}') => table[(b'0' - 32) as usize],
                Some('\u{2026}') => 1000,
                Some('\u{2018}') | Some('\u{2019}') | Some('\u{201A}') => table[(b',' - 32) as usize],
                Some(_) => table[(b'n' - 32) as usize],
                None => 0,
            },
        }
    }
}
