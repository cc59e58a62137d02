//! Raster images embedded as PDF image XObjects.
//!
//! Images are decoded with the `image` crate and stored as 8-bit DeviceRGB
//! samples. An alpha channel, if present, becomes a DeviceGray soft mask.
//! Streams are left uncompressed here and Flate-compressed when the output
//! document is finalized.

use image::{DynamicImage, ImageFormat};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::{Error, Result};

/// A decoded raster image ready to be placed on a page.
#[derive(Clone)]
pub struct ImageXObject {
    width: u32,
    height: u32,
    rgb: Vec<u8>,
    alpha: Option<Vec<u8>>,
}

impl ImageXObject {
    /// Decode image bytes in the given format.
    ///
    /// `file` is only used for error messages.
    pub fn decode(bytes: &[u8], format: ImageFormat, file: &str) -> Result<Self> {
        let image = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| Error::malformed(file, format!("failed to decode image: {e}")))?;
        Ok(Self::from_image(&image))
    }

    pub fn from_image(image: &DynamicImage) -> Self {
        let alpha = image.color().has_alpha().then(|| {
            image
                .to_rgba8()
                .pixels()
                .map(|p| p.0[3])
                .collect::<Vec<u8>>()
        });

        Self {
            width: image.width(),
            height: image.height(),
            rgb: image.to_rgb8().into_raw(),
            alpha,
        }
    }

    /// Size in pixels. One pixel is drawn as one PDF point unless scaled.
    pub const fn pixel_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub const fn has_alpha(&self) -> bool {
        self.alpha.is_some()
    }

    /// Size to draw the image at so that it fits in `max_width` x `max_height`.
    #[allow(clippy::cast_precision_loss)]
    pub fn fitted_size(&self, max_width: f32, max_height: f32) -> (f32, f32) {
        fit_within(self.width as f32, self.height as f32, max_width, max_height)
    }

    /// Add the image (and its soft mask) to `doc`, returning the image object id.
    pub(crate) fn embed(&self, doc: &mut Document) -> ObjectId {
        let mut dict = sample_dict(self.width, self.height, b"DeviceRGB");

        if let Some(alpha) = &self.alpha {
            let mask_dict = sample_dict(self.width, self.height, b"DeviceGray");
            let mask_id = doc.add_object(Stream::new(mask_dict, alpha.clone()));
            dict.set("SMask", Object::Reference(mask_id));
        }

        doc.add_object(Stream::new(dict, self.rgb.clone()))
    }
}

impl std::fmt::Debug for ImageXObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageXObject")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("has_alpha", &self.alpha.is_some())
            .finish()
    }
}

fn sample_dict(width: u32, height: u32, color_space: &[u8]) -> Dictionary {
    Dictionary::from_iter([
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Image".to_vec())),
        ("Width", Object::Integer(i64::from(width))),
        ("Height", Object::Integer(i64::from(height))),
        ("ColorSpace", Object::Name(color_space.to_vec())),
        ("BitsPerComponent", Object::Integer(8)),
    ])
}

/// Uniformly scale `width` x `height` down to fit the bounding box.
///
/// Sizes already inside the box are returned unchanged; images are never
/// scaled up.
pub fn fit_within(width: f32, height: f32, max_width: f32, max_height: f32) -> (f32, f32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }

    let scale = (max_width / width).min(max_height / height);
    (width * scale, height * scale)
}
