//! ZPL renderer: turns a layout plus data rows into a print document.
//!
//! Each label copy is a self-contained `^XA ... ^XZ` block followed by a
//! blank line. Copies are emitted in row order, then copy order; elements
//! inside a copy follow layout order. Rendering is pure and infallible:
//! out-of-range numbers are coerced, never rejected.

use std::fmt::Write;

use crate::data::{DataRow, quantity};
use crate::layout::{BarcodeStyle, Element, ElementKind, LabelDesign, LabelSize, Symbology, TextStyle};
use crate::units::{display_to_dots, round_half_up};

/// Render every row of `rows`, repeated per the quantity policy.
///
/// Callers with no data set pass a single empty row; an empty slice
/// produces an empty document.
pub fn render(
    elements: &[Element],
    size: &LabelSize,
    rows: &[DataRow],
    quantity_column: Option<&str>,
) -> String {
    let mut out = String::new();
    for row in rows {
        let copies = quantity(row, quantity_column);
        for _ in 0..copies {
            render_label(&mut out, elements, size, row);
        }
    }
    out
}

/// Append one label copy for `row` to `out`.
pub fn render_label(out: &mut String, elements: &[Element], size: &LabelSize, row: &DataRow) {
    out.push_str("^XA\n");
    push_line(out, format_args!("^PW{}", size.width_dots()));
    push_line(out, format_args!("^LL{}", size.height_dots()));

    for element in elements {
        render_element(out, element, row);
    }

    out.push_str("^XZ\n\n");
}

impl LabelDesign {
    /// Render this design against `rows` using its own quantity column.
    pub fn render(&self, rows: &[DataRow]) -> String {
        render(&self.elements, &self.label_size, rows, self.quantity_column())
    }

    /// Render a single copy with no data bound.
    pub fn render_static(&self) -> String {
        self.render(&[DataRow::new()])
    }
}

// ── Elements ────────────────────────────────────────────────────────────

fn render_element(out: &mut String, element: &Element, row: &DataRow) {
    let content = element.resolve_content(row);
    let x = display_to_dots(element.x);
    let y = display_to_dots(element.y);

    match &element.kind {
        ElementKind::Text(style) => render_text(out, x, y, content, style),
        ElementKind::Barcode(style) => render_barcode(out, x, y, content, style),
    }
}

fn render_text(out: &mut String, x: i64, y: i64, content: &str, style: &TextStyle) {
    let font = style.font_size;
    let cx = centered_x(x, content, font.glyph_advance());
    push_line(
        out,
        format_args!(
            "^FO{cx},{y}^A0N,{},{}^FD{content}^FS",
            font.glyph_height(),
            font.glyph_advance()
        ),
    );
}

fn render_barcode(out: &mut String, x: i64, y: i64, content: &str, style: &BarcodeStyle) {
    match style.symbology {
        Symbology::Qr => push_line(
            out,
            format_args!(
                "^FO{x},{y}^BQN,2,{}^FDMA,{content}^FS",
                qr_magnification(style.height)
            ),
        ),
        symbology => push_line(
            out,
            format_args!(
                "^FO{x},{y}^BY{}^{}N,{},{},N,N^FD{content}^FS",
                style.module_width,
                symbology.mnemonic(),
                style.height,
                if style.show_text { 'Y' } else { 'N' },
            ),
        ),
    }
}

/// Left edge for text centred on `x`: `max(0, round(x - width / 2))` where
/// `width = chars(content) * advance`.
///
/// Width counts Unicode scalar values, one glyph cell each. The web
/// designer counted UTF-16 code units, so text outside the Basic
/// Multilingual Plane (emoji, for one) is half as wide here as it was there.
pub fn centered_x(x: i64, content: &str, advance: u32) -> i64 {
    let width = content.chars().count() as f64 * f64::from(advance);
    round_half_up(x as f64 - width / 2.0).max(0)
}

/// QR magnification factor derived from the element height: `round(height / 10)`.
pub fn qr_magnification(height: u32) -> u32 {
    height.saturating_add(5) / 10
}

fn push_line(out: &mut String, args: std::fmt::Arguments<'_>) {
    // Writing into a String cannot fail.
    let _ = out.write_fmt(args);
    out.push('\n');
}

// ── Test label ──────────────────────────────────────────────────────────

/// The diagnostic label sent by "print test label": a title, the printer
/// address, a timestamp, and a Code 128 sample.
pub fn test_label(printer_address: &str, timestamp: &str) -> String {
    [
        "^XA".to_string(),
        "^FO50,50^A0N,50,50^FDTest Label^FS".to_string(),
        format!("^FO50,120^A0N,30,30^FDPrinter: {printer_address}^FS"),
        format!("^FO50,170^A0N,30,30^FDTime: {timestamp}^FS"),
        "^FO50,240^BY2^BCN,80,Y,N,N^FDTEST123^FS".to_string(),
        "^XZ".to_string(),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::FontSize;

    fn empty_row() -> DataRow {
        DataRow::new()
    }

    #[test]
    fn centering_example() {
        assert_eq!(centered_x(100, "AB", 26), 74);
    }

    #[test]
    fn centering_floors_at_zero() {
        assert_eq!(centered_x(10, "WIDE TEXT", 40), 0);
        assert_eq!(centered_x(0, "", 40), 0);
    }

    #[test]
    fn centering_counts_characters_not_bytes() {
        assert_eq!(centered_x(100, "éé", 26), 74);
        // One scalar value, two UTF-16 units: a single glyph cell.
        assert_eq!(centered_x(100, "\u{1F4E6}", 26), 87);
    }

    #[test]
    fn qr_magnification_rounds() {
        assert_eq!(qr_magnification(60), 6);
        assert_eq!(qr_magnification(64), 6);
        assert_eq!(qr_magnification(65), 7);
        assert_eq!(qr_magnification(0), 0);
    }

    #[test]
    fn header_and_footer() {
        let mut out = String::new();
        render_label(&mut out, &[], &LabelSize::new(2.0, 1.0), &empty_row());
        assert_eq!(out, "^XA\n^PW406\n^LL203\n^XZ\n\n");
    }

    #[test]
    fn text_element_markup() {
        let mut el = Element::text(1, 96.0, 96.0, "AB");
        el.kind = ElementKind::Text(TextStyle {
            font_size: FontSize::Large,
        });
        let mut out = String::new();
        render_element(&mut out, &el, &empty_row());
        // x = 203, width = 2 * 40 = 80 → 163
        assert_eq!(out, "^FO163,203^A0N,48,40^FDAB^FS\n");
    }

    #[test]
    fn qr_element_markup() {
        let mut el = Element::barcode(1, 0.0, 48.0, "https://example.com");
        el.kind = ElementKind::Barcode(BarcodeStyle {
            symbology: Symbology::Qr,
            height: 100,
            ..BarcodeStyle::default()
        });
        let mut out = String::new();
        render_element(&mut out, &el, &empty_row());
        assert_eq!(out, "^FO0,102^BQN,2,10^FDMA,https://example.com^FS\n");
    }

    #[test]
    fn linear_barcode_markup() {
        let mut el = Element::barcode(1, 96.0, 0.0, "0123456789012");
        el.kind = ElementKind::Barcode(BarcodeStyle {
            symbology: Symbology::Ean13,
            height: 70,
            module_width: 3,
            show_text: false,
        });
        let mut out = String::new();
        render_element(&mut out, &el, &empty_row());
        assert_eq!(out, "^FO203,0^BY3^BEN,70,N,N,N^FD0123456789012^FS\n");
    }

    #[test]
    fn empty_content_still_emits_field() {
        let el = Element::barcode(1, 0.0, 0.0, "");
        let mut out = String::new();
        render_element(&mut out, &el, &empty_row());
        assert_eq!(out, "^FO0,0^BY2^BCN,60,Y,N,N^FD^FS\n");
    }

    #[test]
    fn test_label_mentions_printer_and_time() {
        let zpl = test_label("192.168.1.50", "2026-01-01T00:00:00Z");
        assert!(zpl.starts_with("^XA\n"));
        assert!(zpl.ends_with("^XZ"));
        assert!(zpl.contains("^FDPrinter: 192.168.1.50^FS"));
        assert!(zpl.contains("^FDTime: 2026-01-01T00:00:00Z^FS"));
        assert!(zpl.contains("^BCN,80,Y,N,N^FDTEST123^FS"));
    }
}
