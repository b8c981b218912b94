use pdf_writer::{Name, Pdf, Ref};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FontStyle {
    Regular,
    Bold,
    Italic,
}

pub(crate) struct FontEntry {
    pub(crate) pdf_name: String,
    pub(crate) font_ref: Ref,
    pub(crate) widths_1000: Vec<f32>,
}

impl FontEntry {
    /// Width of a single character in 1000-units, measured after substitution.
    pub(crate) fn char_width_1000(&self, ch: char) -> f32 {
        let byte = char_to_winansi(ch);
        if byte >= 32 {
            self.widths_1000[(byte - 32) as usize]
        } else {
            0.0
        }
    }

    pub(crate) fn word_width(&self, word: &str, font_size: f32) -> f32 {
        word.chars()
            .map(substitute_char)
            .map(|ch| self.char_width_1000(ch) * font_size / 1000.0)
            .sum()
    }

    pub(crate) fn space_width(&self, font_size: f32) -> f32 {
        self.char_width_1000(' ') * font_size / 1000.0
    }
}

/// The three standard Helvetica faces every report uses.
pub(crate) struct StandardFonts {
    regular: FontEntry,
    bold: FontEntry,
    italic: FontEntry,
}

impl StandardFonts {
    pub(crate) fn register(pdf: &mut Pdf, alloc: &mut impl FnMut() -> Ref) -> Self {
        let mut register = |pdf_name: &str, base: &[u8], widths: Vec<f32>| {
            let font_ref = alloc();
            pdf.type1_font(font_ref)
                .base_font(Name(base))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
            log::debug!("register_font: {} as {pdf_name}", String::from_utf8_lossy(base));
            FontEntry {
                pdf_name: pdf_name.to_string(),
                font_ref,
                widths_1000: widths,
            }
        };
        Self {
            regular: register("F1", b"Helvetica", helvetica_widths()),
            bold: register("F2", b"Helvetica-Bold", helvetica_bold_widths()),
            italic: register("F3", b"Helvetica-Oblique", helvetica_widths()),
        }
    }

    pub(crate) fn get(&self, style: FontStyle) -> &FontEntry {
        match style {
            FontStyle::Regular => &self.regular,
            FontStyle::Bold => &self.bold,
            FontStyle::Italic => &self.italic,
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &FontEntry> {
        [&self.regular, &self.bold, &self.italic].into_iter()
    }
}

/// Closest plain letter for the diacritics the standard fonts cannot show.
/// Lossy and one-way.
fn substitute_char(c: char) -> char {
    match c {
        'ą' => 'a',
        'ć' => 'c',
        'ę' => 'e',
        'ł' => 'l',
        'ń' => 'n',
        'ó' => 'o',
        'ś' => 's',
        'ź' | 'ż' => 'z',
        'Ą' => 'A',
        'Ć' => 'C',
        'Ę' => 'E',
        'Ł' => 'L',
        'Ń' => 'N',
        'Ó' => 'O',
        'Ś' => 'S',
        'Ź' | 'Ż' => 'Z',
        _ => c,
    }
}

/// Applies the diacritic substitution table to a whole string.
pub fn substitute_diacritics(s: &str) -> String {
    s.chars().map(substitute_char).collect()
}

/// Map a single Unicode char to its WinAnsi byte, or 0 if unmappable.
fn char_to_winansi(c: char) -> u8 {
    match c as u32 {
        0x0020..=0x007F => c as u8,
        0x00A0..=0x00FF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95, // bullet
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => 0,
    }
}

/// Substitute diacritics, then encode as WinAnsi (Windows-1252) bytes for a PDF
/// string. Characters with no WinAnsi code are dropped.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    substitute_diacritics(s)
        .chars()
        .filter_map(|c| match char_to_winansi(c) {
            0 => None,
            b => Some(b),
        })
        .collect()
}

/// Approximate Helvetica widths at 1000 units/em for WinAnsi chars 32..=255.
fn helvetica_widths() -> Vec<f32> {
    (32u8..=255u8)
        .map(|b| match b {
            32 => 278.0,                          // space
            33..=47 => 333.0,                     // punctuation
            48..=57 => 556.0,                     // digits
            58..=64 => 333.0,                     // more punctuation
            73 | 74 => 278.0,                     // I J (narrow uppercase)
            77 => 833.0,                          // M (wide)
            65..=90 => 667.0,                     // uppercase A-Z (average)
            91..=96 => 333.0,                     // brackets etc.
            102 | 105 | 106 | 108 | 116 => 278.0, // narrow lowercase: f i j l t
            109 | 119 => 833.0,                   // m w (wide)
            97..=122 => 556.0,                    // lowercase a-z (average)
            _ => 556.0,
        })
        .collect()
}

/// Helvetica-Bold runs roughly 5% wider than the regular face, with wider
/// narrow glyphs.
fn helvetica_bold_widths() -> Vec<f32> {
    (32u8..=255u8)
        .zip(helvetica_widths())
        .map(|(b, w)| match b {
            105 | 106 | 108 => 278.0,
            102 | 116 => 333.0,
            48..=57 => 556.0,
            65..=90 | 97..=122 => (w * 1.05).round(),
            _ => w,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polish_diacritics_become_ascii() {
        assert_eq!(substitute_diacritics("Źródło zażółć gęślą jaźń"), "Zrodlo zazolc gesla jazn");
        assert_eq!(substitute_diacritics("ĄĆĘŁŃÓŚŹŻ"), "ACELNOSZZ");
    }

    #[test]
    fn winansi_encoding_drops_unmappable() {
        assert_eq!(to_winansi_bytes("Łódź"), b"Lodz".to_vec());
        assert_eq!(to_winansi_bytes("a\u{4e2d}b"), b"ab".to_vec());
        assert_eq!(to_winansi_bytes("\u{2022}"), vec![0x95]);
    }

    #[test]
    fn widths_measure_substituted_text() {
        let entry = FontEntry {
            pdf_name: "F1".into(),
            font_ref: Ref::new(1),
            widths_1000: helvetica_widths(),
        };
        assert_eq!(entry.word_width("ł", 10.0), entry.word_width("l", 10.0));
        assert!((entry.space_width(10.0) - 2.78).abs() < 1e-4);
    }
}
