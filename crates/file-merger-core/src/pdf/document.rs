use std::io::Write;

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;

use crate::config::LayoutConfig;
use crate::error::{Error, Result};
use super::copy::copy_pages;
use super::raster::ImageXObject;
use super::layout::{
    Canvas, Element, FONT_RESOURCE, LINE_HEIGHT_FACTOR, PARAGRAPH_SPACING, PageGeometry,
    max_chars_per_line, word_wrap,
};

/// A PDF under construction.
///
/// Pages are only ever appended: either copied from a source PDF or produced
/// by laying out paragraphs and images. Generated content is collected on an
/// open page until a page break, a page copy, or finalization closes it.
///
/// Finalizing consumes the document, so nothing can be appended afterwards.
pub struct OutputDocument {
    doc: Document,
    /// Root of the page tree; written out on finalize
    pages_id: ObjectId,
    /// Closed pages in output order
    kids: Vec<ObjectId>,
    /// Helvetica font object, created on first use
    font_id: Option<ObjectId>,
    geometry: PageGeometry,
    font_size: f32,
    /// Page currently being laid out
    canvas: Option<Canvas>,
}

impl OutputDocument {
    pub fn new(layout: &LayoutConfig) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        Self {
            doc,
            pages_id,
            kids: Vec::new(),
            font_id: None,
            geometry: PageGeometry::from(layout),
            font_size: layout.font_size,
            canvas: None,
        }
    }

    pub const fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    /// Number of pages so far, counting the open page if it has content.
    pub fn page_count(&self) -> usize {
        self.kids.len() + usize::from(self.canvas.as_ref().is_some_and(|c| !c.is_blank()))
    }

    /// Append one layout element.
    pub fn push(&mut self, element: Element) -> Result<()> {
        match element {
            Element::Paragraph(text) => self.add_paragraph(&text),
            Element::Image(image) => self.add_image(&image),
            Element::PageBreak => self.add_page_break(),
        }
    }

    /// Lay out a paragraph, wrapping it and flowing onto new pages as needed.
    pub fn add_paragraph(&mut self, text: &str) -> Result<()> {
        let font_size = self.font_size;
        let line_height = font_size * LINE_HEIGHT_FACTOR;
        let x = self.geometry.left();
        let max_chars = max_chars_per_line(self.geometry.printable_width(), font_size);

        self.ensure_font();

        for line in word_wrap(text, max_chars) {
            let canvas = self.canvas_with_room(line_height)?;
            canvas.draw_text_line(&line, x, font_size, line_height);
        }

        if let Some(canvas) = self.canvas.as_mut() {
            canvas.skip(PARAGRAPH_SPACING);
        }

        Ok(())
    }

    /// Place an image below the current content, scaled to the printable area.
    ///
    /// An image taller than the space left on a non-empty page moves to the
    /// next page.
    pub fn add_image(&mut self, image: &ImageXObject) -> Result<()> {
        let (width, height) = image.fitted_size(
            self.geometry.printable_width(),
            self.geometry.printable_height(),
        );
        let x = self.geometry.left();
        let image_id = image.embed(&mut self.doc);

        let canvas = self.canvas_with_room(height)?;
        canvas.draw_image(image_id, x, width, height);

        Ok(())
    }

    /// Close the open page. Without an open page this does nothing.
    pub fn add_page_break(&mut self) -> Result<()> {
        self.flush_canvas()
    }

    /// Copy every page of a source PDF, in order, after the current content.
    ///
    /// Returns the number of pages copied.
    pub fn append_pdf(&mut self, bytes: &[u8], file: &str) -> Result<usize> {
        self.flush_canvas()?;

        let copied = copy_pages(&mut self.doc, self.pages_id, bytes, file)?;
        let count = copied.len();
        self.kids.extend(copied);

        debug!("Copied {} pages from {}", count, file);
        Ok(count)
    }

    /// Finalize the document and serialize it into `writer`.
    ///
    /// Returns the number of pages written.
    pub fn write_to<W: Write>(mut self, writer: &mut W) -> Result<usize> {
        self.flush_canvas()?;

        let page_count = self.kids.len();
        let kids: Vec<Object> = self.kids.iter().map(|&id| Object::Reference(id)).collect();

        let pages_dict = Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(i64::try_from(page_count).unwrap_or(i64::MAX))),
        ]);
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages_dict));

        let catalog_id = self.doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(self.pages_id)),
        ]));
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        self.doc.compress();
        self.doc
            .save_to(writer)
            .map_err(|e| Error::PdfSave(format!("Failed to save merged PDF: {e}")))?;

        Ok(page_count)
    }

    /// Finalize the document into an in-memory buffer.
    pub fn finish(self) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.write_to(&mut output)?;
        Ok(output)
    }

    fn ensure_font(&mut self) -> ObjectId {
        if let Some(id) = self.font_id {
            return id;
        }

        let id = self.doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(b"Helvetica".to_vec())),
            ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ]));
        self.font_id = Some(id);
        id
    }

    /// The open page, after starting a new one if `height` does not fit.
    fn canvas_with_room(&mut self, height: f32) -> Result<&mut Canvas> {
        let geometry = self.geometry;
        let page_full = self
            .canvas
            .as_ref()
            .is_some_and(|c| !c.is_blank() && c.remaining(&geometry) < height);

        if page_full {
            self.flush_canvas()?;
        }

        Ok(self.canvas.get_or_insert_with(|| Canvas::new(&geometry)))
    }

    /// Turn the open page into a page object. Blank pages are discarded.
    fn flush_canvas(&mut self) -> Result<()> {
        let Some(canvas) = self.canvas.take() else {
            return Ok(());
        };
        if canvas.is_blank() {
            return Ok(());
        }

        let content = Content {
            operations: canvas.operations,
        }
        .encode()
        .map_err(|e| Error::Lopdf(format!("Failed to encode page content: {e}")))?;
        let content_id = self.doc.add_object(Stream::new(Dictionary::new(), content));

        let mut resources = Dictionary::new();
        if canvas.uses_font
            && let Some(font_id) = self.font_id
        {
            resources.set(
                "Font",
                Dictionary::from_iter([(FONT_RESOURCE, Object::Reference(font_id))]),
            );
        }
        if !canvas.xobjects.is_empty() {
            let xobjects: Dictionary = canvas
                .xobjects
                .into_iter()
                .map(|(name, id)| (name, Object::Reference(id)))
                .collect();
            resources.set("XObject", xobjects);
        }

        let page_id = self.doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(self.pages_id)),
            ("MediaBox", self.geometry.media_box()),
            ("Resources", Object::Dictionary(resources)),
            ("Contents", Object::Reference(content_id)),
        ]));
        self.kids.push(page_id);

        Ok(())
    }
}

impl std::fmt::Debug for OutputDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputDocument")
            .field("page_count", &self.page_count())
            .field("geometry", &self.geometry)
            .finish_non_exhaustive()
    }
}
