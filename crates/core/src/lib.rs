//! zpl-label core library.
//!
//! Models a label design (text and barcode elements on a physical label),
//! binds it to rows of tabular data, and renders ZPL for Zebra-compatible
//! printers. The main entry points are [`render`] and
//! [`LabelDesign::render`]; [`DataSet::parse_csv`] imports data rows.
//!
//! Nothing in this crate performs I/O. Delivering the rendered document to
//! a printer is the job of `zpl_label_print_client`.

#![warn(missing_docs)]

/// Data rows, CSV import, and the quantity policy.
pub mod data;
/// Label layout model.
pub mod layout;
/// Layout-to-ZPL rendering.
pub mod render;
/// Display-unit / dot / inch conversions.
pub mod units;

// ── Convenience re-exports ──────────────────────────────────────────────────

// Model
pub use layout::{
    BarcodeStyle, Element, ElementKind, FontSize, LabelDesign, LabelSize, ParseLabelSizeError,
    Symbology, TextStyle,
};

// Data
pub use data::{DataError, DataRow, DataSet, detect_quantity_column, label_count, quantity};

// Renderer
pub use render::{render, render_label, test_label};
