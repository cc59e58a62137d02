//! Page geometry and flow layout for generated pages.
//!
//! # Coordinate System
//!
//! PDF uses a bottom-left origin, so the layout cursor starts at
//! `page_height - margin` and moves down as content is placed. A page is
//! full when the next block would cross the bottom margin.

use lopdf::content::Operation;
use lopdf::{Object, ObjectId, StringFormat};

use crate::config::LayoutConfig;
use super::raster::ImageXObject;

// =============================================================================
// Layout Constants
// =============================================================================

/// Line height as a multiple of font size.
pub const LINE_HEIGHT_FACTOR: f32 = 1.2;

/// Average Helvetica glyph width as a fraction of font size.
const CHAR_WIDTH_FACTOR: f32 = 0.5;

/// Vertical space after each paragraph (in points).
pub const PARAGRAPH_SPACING: f32 = 4.0;

/// Resource name of the body font in page content streams.
pub const FONT_RESOURCE: &str = "F1";

// =============================================================================
// Public Types
// =============================================================================

/// One layout instruction for the output document.
#[derive(Debug, Clone)]
pub enum Element {
    /// A block of text, wrapped to the printable width
    Paragraph(String),
    /// A raster image, scaled down to the printable area if needed
    Image(ImageXObject),
    /// Close the current page; the next element starts a fresh one
    PageBreak,
}

/// Page size and margins used for generated pages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl PageGeometry {
    pub const fn new(width: f32, height: f32, margin: f32) -> Self {
        Self {
            width,
            height,
            margin,
        }
    }

    pub fn printable_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    pub fn printable_height(&self) -> f32 {
        self.height - 2.0 * self.margin
    }

    pub fn top(&self) -> f32 {
        self.height - self.margin
    }

    pub const fn bottom(&self) -> f32 {
        self.margin
    }

    pub const fn left(&self) -> f32 {
        self.margin
    }

    pub fn media_box(&self) -> Object {
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(self.width),
            Object::Real(self.height),
        ])
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::from(&LayoutConfig::default())
    }
}

impl From<&LayoutConfig> for PageGeometry {
    fn from(layout: &LayoutConfig) -> Self {
        Self::new(layout.page_width, layout.page_height, layout.margin)
    }
}

// =============================================================================
// Canvas
// =============================================================================

/// Content of the page currently being laid out.
pub(crate) struct Canvas {
    pub(crate) operations: Vec<Operation>,
    pub(crate) xobjects: Vec<(String, ObjectId)>,
    pub(crate) uses_font: bool,
    cursor_y: f32,
}

impl Canvas {
    pub(crate) fn new(geometry: &PageGeometry) -> Self {
        Self {
            operations: Vec::new(),
            xobjects: Vec::new(),
            uses_font: false,
            cursor_y: geometry.top(),
        }
    }

    pub(crate) fn is_blank(&self) -> bool {
        self.operations.is_empty()
    }

    /// Vertical space left above the bottom margin.
    pub(crate) fn remaining(&self, geometry: &PageGeometry) -> f32 {
        self.cursor_y - geometry.bottom()
    }

    pub(crate) fn skip(&mut self, amount: f32) {
        self.cursor_y -= amount;
    }

    /// Draw one line of text with its top at the cursor.
    pub(crate) fn draw_text_line(&mut self, text: &str, x: f32, font_size: f32, line_height: f32) {
        let baseline = self.cursor_y - font_size;

        self.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(FONT_RESOURCE.as_bytes().to_vec()), Object::Real(font_size)],
            ),
            Operation::new("Td", vec![Object::Real(x), Object::Real(baseline)]),
            Operation::new(
                "Tj",
                vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ]);

        self.uses_font = true;
        self.cursor_y -= line_height;
    }

    /// Draw an image XObject with its top-left corner at (`x`, cursor).
    pub(crate) fn draw_image(&mut self, image_id: ObjectId, x: f32, width: f32, height: f32) {
        let name = format!("Im{}", self.xobjects.len() + 1);
        let y = self.cursor_y - height;

        self.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(width),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(height),
                    Object::Real(x),
                    Object::Real(y),
                ],
            ),
            Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ]);

        self.xobjects.push((name, image_id));
        self.cursor_y = y;
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Maximum characters per line for the given printable width and font size.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn max_chars_per_line(printable_width: f32, font_size: f32) -> usize {
    let char_width = font_size * CHAR_WIDTH_FACTOR;
    (printable_width / char_width).floor().max(1.0) as usize
}

/// Word wrap text to fit within max_chars per line.
///
/// Words longer than a whole line are split. An empty input yields a single
/// empty line so blank lines keep their vertical space.
pub fn word_wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current_line = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > max_chars {
            if !current_line.is_empty() {
                lines.push(std::mem::take(&mut current_line));
                current_len = 0;
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        if word.is_empty() {
            continue;
        }

        if current_line.is_empty() {
            current_line = word.iter().collect();
            current_len = word.len();
        } else if current_len + 1 + word.len() <= max_chars {
            current_line.push(' ');
            current_line.extend(word.iter());
            current_len += 1 + word.len();
        } else {
            lines.push(std::mem::replace(&mut current_line, word.iter().collect()));
            current_len = word.len();
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

/// Encode text for a standard Type1 font using WinAnsiEncoding.
///
/// Characters outside the encoding become '?'. Tabs become spaces and other
/// control characters are dropped.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .filter_map(|c| match c {
            '\t' => Some(b' '),
            c if c.is_control() => None,
            c if (c as u32) < 0x80 => u8::try_from(c as u32).ok(),
            '€' => Some(0x80),
            '‚' => Some(0x82),
            '„' => Some(0x84),
            '…' => Some(0x85),
            '‘' => Some(0x91),
            '’' => Some(0x92),
            '“' => Some(0x93),
            '”' => Some(0x94),
            '•' => Some(0x95),
            '–' => Some(0x96),
            '—' => Some(0x97),
            '™' => Some(0x99),
            c if (0xA0..=0xFF).contains(&(c as u32)) => u8::try_from(c as u32).ok(),
            _ => Some(b'?'),
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
