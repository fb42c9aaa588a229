//! Single-byte text encodings used by simple PDF fonts

/// WinAnsiEncoding code points for 0x80..=0x9F (0 = undefined)
const WIN_ANSI_HIGH: [u32; 32] = [
    0x20AC, 0, 0x201A, 0x0192, 0x201E, 0x2026, 0x2020, 0x2021, 0x02C6, 0x2030, 0x0160, 0x2039,
    0x0152, 0, 0x017D, 0, 0, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022, 0x2013, 0x2014, 0x02DC,
    0x2122, 0x0161, 0x203A, 0x0153, 0, 0x017E, 0x0178,
];

/// Glyph names for Latin-1 0xC0..=0xFF, in code order
const LATIN1_UPPER_NAMES: [&str; 64] = [
    "Agrave", "Aacute", "Acircumflex", "Atilde", "Adieresis", "Aring", "AE", "Ccedilla",
    "Egrave", "Eacute", "Ecircumflex", "Edieresis", "Igrave", "Iacute", "Icircumflex",
    "Idieresis", "Eth", "Ntilde", "Ograve", "Oacute", "Ocircumflex", "Otilde", "Odieresis",
    "multiply", "Oslash", "Ugrave", "Uacute", "Ucircumflex", "Udieresis", "Yacute", "Thorn",
    "germandbls", "agrave", "aacute", "acircumflex", "atilde", "adieresis", "aring", "ae",
    "ccedilla", "egrave", "eacute", "ecircumflex", "edieresis", "igrave", "iacute",
    "icircumflex", "idieresis", "eth", "ntilde", "ograve", "oacute", "ocircumflex", "otilde",
    "odieresis", "divide", "oslash", "ugrave", "uacute", "ucircumflex", "udieresis", "yacute",
    "thorn", "ydieresis",
];

/// ASCII stand-ins for Latin-1 0xC0..=0xFF when only ASCII metrics are known
#[rustfmt::skip]
pub(crate) const LATIN1_BASE_LETTERS: [char; 64] = [
    'A', 'A', 'A', 'A', 'A', 'A', 'W', 'C', 'E', 'E', 'E', 'E', 'I', 'I', 'I', 'I',
    'D', 'N', 'O', 'O', 'O', 'O', 'O', '+', 'O', 'U', 'U', 'U', 'U', 'Y', 'P', 'b',
    'a', 'a', 'a', 'a', 'a', 'a', 'm', 'c', 'e', 'e', 'e', 'e', 'i', 'i', 'i', 'i',
    'o', 'n', 'o', 'o', 'o', 'o', 'o', '+', 'o', 'u', 'u', 'u', 'u', 'y', 'p', 'y',
];

/// Glyph names for printable ASCII 0x20..=0x7E, in code order
const ASCII_NAMES: [&str; 95] = [
    "space", "exclam", "quotedbl", "numbersign", "dollar", "percent", "ampersand",
    "quotesingle", "parenleft", "parenright", "asterisk", "plus", "comma", "hyphen", "period",
    "slash", "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
    "colon", "semicolon", "less", "equal", "greater", "question", "at", "A", "B", "C", "D", "E",
    "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q", "R", "S", "T", "U", "V", "W",
    "X", "Y", "Z", "bracketleft", "backslash", "bracketright", "asciicircum", "underscore",
    "grave", "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p",
    "q", "r", "s", "t", "u", "v", "w", "x", "y", "z", "braceleft", "bar", "braceright",
    "asciitilde",
];

/// Other glyph names commonly found in Differences arrays
const EXTRA_NAMES: &[(&str, u32)] = &[
    ("quoteleft", 0x2018),
    ("quoteright", 0x2019),
    ("quotedblleft", 0x201C),
    ("quotedblright", 0x201D),
    ("quotesinglbase", 0x201A),
    ("quotedblbase", 0x201E),
    ("endash", 0x2013),
    ("emdash", 0x2014),
    ("bullet", 0x2022),
    ("ellipsis", 0x2026),
    ("dagger", 0x2020),
    ("daggerdbl", 0x2021),
    ("trademark", 0x2122),
    ("copyright", 0x00A9),
    ("registered", 0x00AE),
    ("degree", 0x00B0),
    ("section", 0x00A7),
    ("paragraph", 0x00B6),
    ("periodcentered", 0x00B7),
    ("plusminus", 0x00B1),
    ("minus", 0x2212),
    ("Euro", 0x20AC),
    ("sterling", 0x00A3),
    ("yen", 0x00A5),
    ("cent", 0x00A2),
    ("currency", 0x00A4),
    ("nbspace", 0x00A0),
    ("exclamdown", 0x00A1),
    ("questiondown", 0x00BF),
    ("guillemotleft", 0x00AB),
    ("guillemotright", 0x00BB),
    ("ordfeminine", 0x00AA),
    ("ordmasculine", 0x00BA),
    ("mu", 0x00B5),
    ("fi", 0xFB01),
    ("fl", 0xFB02),
    ("ff", 0xFB00),
    ("ffi", 0xFB03),
    ("ffl", 0xFB04),
    ("dotlessi", 0x0131),
    ("florin", 0x0192),
    ("perthousand", 0x2030),
    ("Scaron", 0x0160),
    ("scaron", 0x0161),
    ("Zcaron", 0x017D),
    ("zcaron", 0x017E),
    ("OE", 0x0152),
    ("oe", 0x0153),
    ("Ydieresis", 0x0178),
    ("checkbox", 0x2610),
    ("a71", 0x25CF),
    ("a72", 0x274D),
    ("a73", 0x25A0),
    ("a74", 0x274F),
    ("a20", 0x2714),
    ("a19", 0x2713),
];

/// Checkbox and bullet symbols drawn through ZapfDingbats: (char, code, width)
const DINGBATS: &[(char, u8, u16)] = &[
    ('\u{2713}', 0x33, 834), // ✓
    ('\u{2714}', 0x34, 874), // ✔
    ('\u{2611}', 0x34, 874), // ☑ drawn as a heavy check mark
    ('\u{2612}', 0x38, 776), // ☒ drawn as a ballot x
    ('\u{2718}', 0x38, 776), // ✘
    ('\u{25CF}', 0x6C, 791), // ●
    ('\u{274D}', 0x6D, 873), // ❍
    ('\u{25CB}', 0x6D, 873), // ○
    ('\u{25EF}', 0x6D, 873), // ◯
    ('\u{25A0}', 0x6E, 761), // ■
    ('\u{2B1B}', 0x6E, 761), // ⬛
    ('\u{274F}', 0x6F, 762), // ❏
    ('\u{2610}', 0x6F, 762), // ☐
    ('\u{25A1}', 0x6F, 762), // □
    ('\u{2B1C}', 0x6F, 762), // ⬜
];

/// Base encodings of simple fonts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseEncoding {
    WinAnsi,
    Standard,
    /// MacRomanEncoding, read as Latin-1 for the upper half
    MacRoman,
    /// Symbolic fonts: codes carry no reliable meaning without a ToUnicode map
    Symbolic,
}

impl BaseEncoding {
    /// Parse an `/Encoding` name
    pub fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"WinAnsiEncoding" => Some(Self::WinAnsi),
            b"StandardEncoding" => Some(Self::Standard),
            b"MacRomanEncoding" | b"MacExpertEncoding" => Some(Self::MacRoman),
            _ => None,
        }
    }

    /// Decode a single-byte code
    pub fn decode(self, code: u8) -> Option<char> {
        match self {
            Self::WinAnsi => win_ansi_decode(code),
            Self::Standard => match code {
                0x27 => Some('\u{2019}'),
                0x60 => Some('\u{2018}'),
                _ => latin1_decode(code),
            },
            Self::MacRoman => latin1_decode(code),
            Self::Symbolic => latin1_decode(code),
        }
    }
}

fn latin1_decode(code: u8) -> Option<char> {
    match code {
        0x20..=0x7E | 0xA0..=0xFF => Some(code as char),
        _ => None,
    }
}

/// Decode a WinAnsiEncoding byte
pub fn win_ansi_decode(code: u8) -> Option<char> {
    match code {
        0x80..=0x9F => {
            let cp = WIN_ANSI_HIGH[(code - 0x80) as usize];
            if cp == 0 {
                None
            } else {
                char::from_u32(cp)
            }
        }
        _ => latin1_decode(code),
    }
}

/// Encode a character as a WinAnsiEncoding byte
pub fn win_ansi_encode(c: char) -> Option<u8> {
    let cp = c as u32;
    match cp {
        0x20..=0x7E | 0xA0..=0xFF => Some(cp as u8),
        _ => WIN_ANSI_HIGH
            .iter()
            .position(|&v| v != 0 && v == cp)
            .map(|i| 0x80 + i as u8),
    }
}

/// Map a PostScript glyph name to a character
///
/// Covers printable ASCII, Latin-1, the usual typographic names and the
/// `uniXXXX` / `uXXXX[XX]` conventions.
pub fn glyph_name_to_char(name: &str) -> Option<char> {
    if let Some(i) = ASCII_NAMES.iter().position(|&n| n == name) {
        return char::from_u32(0x20 + i as u32);
    }
    if let Some(i) = LATIN1_UPPER_NAMES.iter().position(|&n| n == name) {
        return char::from_u32(0xC0 + i as u32);
    }
    if let Some((_, cp)) = EXTRA_NAMES.iter().find(|(n, _)| *n == name) {
        return char::from_u32(*cp);
    }
    if let Some(hex) = name.strip_prefix("uni") {
        if hex.len() >= 4 {
            return u32::from_str_radix(&hex[..4], 16)
                .ok()
                .and_then(char::from_u32);
        }
    }
    if let Some(hex) = name.strip_prefix('u') {
        if (4..=6).contains(&hex.len()) {
            return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
        }
    }
    // Suffixed variants such as "a.sc" or "one.oldstyle"
    if let Some((base, _)) = name.split_once('.') {
        if !base.is_empty() {
            return glyph_name_to_char(base);
        }
    }
    None
}

/// ZapfDingbats code and glyph width (per 1000 em) for a checkbox-like symbol
pub fn dingbat_for(c: char) -> Option<(u8, u16)> {
    DINGBATS
        .iter()
        .find(|(ch, _, _)| *ch == c)
        .map(|(_, code, width)| (*code, *width))
}

/// Character a ZapfDingbats code stands for (first entry wins)
pub fn dingbat_decode(code: u8) -> Option<char> {
    DINGBATS
        .iter()
        .find(|(_, c, _)| *c == code)
        .map(|(ch, _, _)| *ch)
}

/// Width (per 1000 em) of a ZapfDingbats code
pub fn dingbat_width(code: u8) -> Option<u16> {
    DINGBATS
        .iter()
        .find(|(_, c, _)| *c == code)
        .map(|(_, _, w)| *w)
}
