//! Per-type conversion of input files into output content.

use image::ImageFormat;

use crate::error::Result;
use crate::input::InputFile;
use crate::pdf::{Element, ImageXObject, OutputDocument};

/// Copy all pages of a PDF input. Returns the number of pages copied.
pub fn append_pdf(doc: &mut OutputDocument, file: &InputFile) -> Result<usize> {
    doc.append_pdf(file.bytes(), file.name())
}

/// Layout elements for an image input: the image, then a page break.
pub fn image_elements(file: &InputFile, format: ImageFormat) -> Result<Vec<Element>> {
    let image = ImageXObject::decode(file.bytes(), format, file.name())?;
    Ok(vec![Element::Image(image), Element::PageBreak])
}

/// Layout elements for a text input: one paragraph per line, then a page break.
///
/// Bytes are read as UTF-8 with invalid sequences replaced.
pub fn text_elements(file: &InputFile) -> Vec<Element> {
    let text = String::from_utf8_lossy(file.bytes());

    split_lines(&text)
        .into_iter()
        .map(|line| Element::Paragraph(line.to_string()))
        .chain(std::iter::once(Element::PageBreak))
        .collect()
}

/// Split text into lines ended by `\n`, `\r\n`, or a lone `\r`.
///
/// A final line terminator does not add an empty line.
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let Some(end) = rest.find(['\r', '\n']) else {
            lines.push(rest);
            break;
        };

        lines.push(&rest[..end]);
        let terminator = if rest[end..].starts_with("\r\n") { 2 } else { 1 };
        rest = &rest[end + terminator..];
    }

    lines
}
