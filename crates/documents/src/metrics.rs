//! Text measurement for the base-14 Helvetica faces.
//!
//! Widths are the standard Helvetica AFM advance widths (1/1000 em) for
//! printable ASCII. Anything else measures as a digit. Bold is approximated
//! by scaling the regular widths; it is only used for the centred title.

/// Font face used in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    /// Resource name the PDF encoder registers this face under.
    pub fn resource_name(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }

    pub fn base_font(self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
        }
    }
}

const ELLIPSIS: &str = "...";
const DEFAULT_WIDTH: u16 = 556;
const BOLD_SCALE: f32 = 1.06;

#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,      // 'p'..'~'
];

fn char_units(c: char) -> u16 {
    let code = c as u32;
    if (0x20..=0x7E).contains(&code) {
        HELVETICA_WIDTHS[(code - 0x20) as usize]
    } else {
        DEFAULT_WIDTH
    }
}

fn scale(font: Font, size: f32) -> f32 {
    match font {
        Font::Regular => size / 1000.0,
        Font::Bold => size * BOLD_SCALE / 1000.0,
    }
}

/// Advance width of `text` in points.
pub fn text_width(text: &str, font: Font, size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(char_units(c))).sum();
    units as f32 * scale(font, size)
}

/// Clip `text` so it fits in `max_width`, marking the cut with `...`.
///
/// Returns an empty string when not even the marker fits.
pub fn fit_text(text: &str, font: Font, size: f32, max_width: f32) -> String {
    if text_width(text, font, size) <= max_width {
        return text.to_string();
    }

    let budget = max_width - text_width(ELLIPSIS, font, size);
    if budget < 0.0 {
        return String::new();
    }

    let mut used = 0.0;
    let mut clipped = String::new();
    for c in text.chars() {
        let w = f32::from(char_units(c)) * scale(font, size);
        if used + w > budget {
            break;
        }
        used += w;
        clipped.push(c);
    }
    clipped.push_str(ELLIPSIS);
    clipped
}
