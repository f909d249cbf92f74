//! Export core modules shared by the HTML and built-in PDF renderers.

pub mod html_core;
pub mod pdf_core;

pub use html_core::{build_report_html, escape_html, PhotoCell, ReportRow, PHOTO_PLACEHOLDER};
