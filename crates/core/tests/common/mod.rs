//! Shared fixtures for `zpl_label_core` integration tests.

#![allow(unreachable_pub)]

use zpl_label_core::{
    BarcodeStyle, DataRow, Element, ElementKind, FontSize, LabelDesign, LabelSize, Symbology,
    TextStyle,
};

/// Build a data row from `(column, value)` pairs.
pub fn row(pairs: &[(&str, &str)]) -> DataRow {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// A shipping-style design: a bound product name, a static caption, a bound
/// Code 128 SKU, and a QR code.
pub fn shipping_design() -> LabelDesign {
    let mut name = Element::text(1, 192.0, 20.0, "Product").bound_to("name");
    name.kind = ElementKind::Text(TextStyle {
        font_size: FontSize::Large,
    });

    let caption = Element::text(2, 192.0, 80.0, "Handle with care");

    let sku = Element::barcode(3, 20.0, 120.0, "000000").bound_to("sku");

    let mut qr = Element::barcode(4, 300.0, 120.0, "https://example.com/track");
    qr.kind = ElementKind::Barcode(BarcodeStyle {
        symbology: Symbology::Qr,
        height: 40,
        ..BarcodeStyle::default()
    });

    LabelDesign {
        label_size: LabelSize::new(4.0, 2.0),
        elements: vec![name, caption, sku, qr],
        quantity_column: Some("qty".into()),
    }
}

/// Count occurrences of `needle` in `haystack`.
#[allow(dead_code)]
pub fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}
