mod copy;
mod document;
mod raster;
mod layout;

pub use document::OutputDocument;
pub use raster::{ImageXObject, fit_within};
pub use layout::{Element, PageGeometry, encode_win_ansi, word_wrap};
