//! Label layout model: elements, font presets, symbologies, and label sizes.
//!
//! The serialized form is the saved design document (camelCase JSON):
//!
//! ```json
//! {
//!   "labelSize": { "name": "4\" x 6\"", "width": 4, "height": 6 },
//!   "quantityColumn": "qty",
//!   "elements": [
//!     { "id": 1, "type": "text", "x": 192, "y": 40, "content": "SKU",
//!       "labelName": "sku", "isVariable": true, "fontSize": "Large" },
//!     { "id": 2, "type": "barcode", "x": 40, "y": 120, "content": "123456789",
//!       "symbology": "code128", "height": 60, "moduleWidth": 2, "showText": true }
//!   ]
//! }
//! ```
//!
//! Designs saved by the web designer are read as well: there `fontSize` is a
//! `{ "name", "height", "width" }` object and the symbology is stored as
//! `"barcodeType": { "name", "zpl" }`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::DataRow;
use crate::units::{inches_to_display, inches_to_dots};

// ── Elements ────────────────────────────────────────────────────────────

/// One printable field on a label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    /// Stable identity assigned by the designer.
    pub id: u64,
    /// Horizontal position in display units.
    pub x: f64,
    /// Vertical position in display units.
    pub y: f64,
    /// Stored content, used whenever no data-row value applies.
    #[serde(default)]
    pub content: String,
    /// Name of the data column substituted into this element.
    #[serde(default, alias = "labelName", skip_serializing_if = "Option::is_none")]
    pub bound_field: Option<String>,
    /// Whether `bound_field` substitution is active.
    #[serde(default)]
    pub is_variable: bool,
    /// Variant-specific styling.
    #[serde(flatten)]
    pub kind: ElementKind,
}

/// Variant-specific part of an [`Element`].
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    /// A line of text in the scalable `A0` font.
    Text(TextStyle),
    /// A one- or two-dimensional barcode.
    Barcode(BarcodeStyle),
}

/// Styling for a text element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    /// Font preset.
    #[serde(default)]
    pub font_size: FontSize,
}

/// Styling for a barcode element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarcodeStyle {
    /// Barcode symbology. Required: a barcode with no recognisable
    /// symbology is an error, not a Code 128.
    #[serde(alias = "barcodeType")]
    pub symbology: Symbology,
    /// Bar height in dots. For QR this drives the magnification factor.
    #[serde(default = "default_barcode_height")]
    pub height: u32,
    /// Narrow module width in dots (`^BY`).
    #[serde(default = "default_module_width")]
    pub module_width: u32,
    /// Print the human-readable interpretation line.
    #[serde(default = "default_show_text")]
    pub show_text: bool,
}

fn default_barcode_height() -> u32 {
    60
}

fn default_module_width() -> u32 {
    2
}

fn default_show_text() -> bool {
    true
}

impl Default for BarcodeStyle {
    fn default() -> Self {
        Self {
            symbology: Symbology::default(),
            height: default_barcode_height(),
            module_width: default_module_width(),
            show_text: default_show_text(),
        }
    }
}

impl Element {
    /// A static text element with the default (`Medium`) font.
    pub fn text(id: u64, x: f64, y: f64, content: impl Into<String>) -> Self {
        Self {
            id,
            x,
            y,
            content: content.into(),
            bound_field: None,
            is_variable: false,
            kind: ElementKind::Text(TextStyle::default()),
        }
    }

    /// A static barcode element with default styling (Code 128, 60 dots high).
    pub fn barcode(id: u64, x: f64, y: f64, content: impl Into<String>) -> Self {
        Self {
            id,
            x,
            y,
            content: content.into(),
            bound_field: None,
            is_variable: false,
            kind: ElementKind::Barcode(BarcodeStyle::default()),
        }
    }

    /// Bind the element to a data column and enable substitution.
    pub fn bound_to(mut self, column: impl Into<String>) -> Self {
        self.bound_field = Some(column.into());
        self.is_variable = true;
        self
    }

    /// Content to print for `row`.
    ///
    /// The bound column's value wins when substitution is active and the
    /// row carries a non-empty value for it; otherwise the stored content is
    /// used. The element itself is never modified.
    pub fn resolve_content<'a>(&'a self, row: &'a DataRow) -> &'a str {
        if self.is_variable
            && let Some(field) = self.bound_field.as_deref()
            && !field.is_empty()
            && let Some(value) = row.get(field)
            && !value.is_empty()
        {
            return value;
        }
        &self.content
    }
}

// ── Font presets ────────────────────────────────────────────────────────

/// Named font size preset for text elements.
///
/// Serialized as the preset name. Deserializes from the name or from a
/// `{ name, height, width }` object, matched by name first and then by
/// dimensions.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "FontSizeRepr")]
pub enum FontSize {
    /// 20 x 16 dots.
    Small,
    /// 32 x 26 dots.
    #[default]
    Medium,
    /// 48 x 40 dots.
    Large,
    /// 64 x 52 dots.
    #[serde(rename = "X-Large")]
    XLarge,
    /// 96 x 80 dots.
    Huge,
}

impl FontSize {
    /// All presets, smallest first.
    pub const ALL: [FontSize; 5] = [
        FontSize::Small,
        FontSize::Medium,
        FontSize::Large,
        FontSize::XLarge,
        FontSize::Huge,
    ];

    /// Glyph height in dots.
    pub fn glyph_height(self) -> u32 {
        match self {
            FontSize::Small => 20,
            FontSize::Medium => 32,
            FontSize::Large => 48,
            FontSize::XLarge => 64,
            FontSize::Huge => 96,
        }
    }

    /// Glyph advance (width) in dots.
    pub fn glyph_advance(self) -> u32 {
        match self {
            FontSize::Small => 16,
            FontSize::Medium => 26,
            FontSize::Large => 40,
            FontSize::XLarge => 52,
            FontSize::Huge => 80,
        }
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            FontSize::Small => "Small",
            FontSize::Medium => "Medium",
            FontSize::Large => "Large",
            FontSize::XLarge => "X-Large",
            FontSize::Huge => "Huge",
        }
    }

    /// Look up a preset by display name (case-insensitive; `XLarge` is
    /// accepted for `X-Large`).
    pub fn from_name(name: &str) -> Option<FontSize> {
        let name = name.trim();
        FontSize::ALL.into_iter().find(|f| {
            f.name().eq_ignore_ascii_case(name)
                || (*f == FontSize::XLarge && name.eq_ignore_ascii_case("XLarge"))
        })
    }

    /// Look up a preset by its `(height, advance)` in dots.
    pub fn from_dimensions(height: u32, advance: u32) -> Option<FontSize> {
        FontSize::ALL
            .into_iter()
            .find(|f| f.glyph_height() == height && f.glyph_advance() == advance)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FontSizeRepr {
    Name(String),
    Preset {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        height: Option<u32>,
        #[serde(default)]
        width: Option<u32>,
    },
}

impl TryFrom<FontSizeRepr> for FontSize {
    type Error = String;

    fn try_from(repr: FontSizeRepr) -> Result<Self, Self::Error> {
        match repr {
            FontSizeRepr::Name(name) => {
                FontSize::from_name(&name).ok_or_else(|| format!("unknown font size '{name}'"))
            }
            FontSizeRepr::Preset {
                name,
                height,
                width,
            } => name
                .as_deref()
                .and_then(FontSize::from_name)
                .or_else(|| FontSize::from_dimensions(height?, width?))
                .ok_or_else(|| {
                    format!(
                        "unknown font size (name {name:?}, height {height:?}, width {width:?})"
                    )
                }),
        }
    }
}

// ── Symbologies ─────────────────────────────────────────────────────────

/// Barcode symbology.
///
/// Serialized as a lowercase key (`code128`, `qr`, ...). Deserializes from
/// that key, the ZPL mnemonic, the display name, or a `{ name, zpl }`
/// object resolved through `zpl` first.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "SymbologyRepr")]
pub enum Symbology {
    /// Code 128 (`^BC`).
    #[default]
    Code128,
    /// Code 39 (`^B3`).
    Code39,
    /// QR Code (`^BQ`).
    Qr,
    /// UPC-A (`^BU`).
    #[serde(rename = "upca")]
    UpcA,
    /// EAN-13 (`^BE`).
    #[serde(rename = "ean13")]
    Ean13,
}

impl Symbology {
    /// ZPL command mnemonic, without the `^` prefix.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Symbology::Code128 => "BC",
            Symbology::Code39 => "B3",
            Symbology::Qr => "BQ",
            Symbology::UpcA => "BU",
            Symbology::Ean13 => "BE",
        }
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Symbology::Code128 => "Code 128",
            Symbology::Code39 => "Code 39",
            Symbology::Qr => "QR Code",
            Symbology::UpcA => "UPC-A",
            Symbology::Ean13 => "EAN-13",
        }
    }

    /// All symbologies, in designer order.
    pub const ALL: [Symbology; 5] = [
        Symbology::Code128,
        Symbology::Code39,
        Symbology::Qr,
        Symbology::UpcA,
        Symbology::Ean13,
    ];

    /// Look up a symbology by ZPL mnemonic (`BC`, `^BQ`, ...).
    pub fn from_mnemonic(mnemonic: &str) -> Option<Symbology> {
        let mnemonic = mnemonic.trim().trim_start_matches('^');
        Symbology::ALL
            .into_iter()
            .find(|s| s.mnemonic().eq_ignore_ascii_case(mnemonic))
    }

    /// Look up a symbology by lowercase key, mnemonic, or display name.
    pub fn lookup(text: &str) -> Option<Symbology> {
        let key: String = text
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        let by_key = match key.as_str() {
            "code128" => Some(Symbology::Code128),
            "code39" => Some(Symbology::Code39),
            "qr" | "qrcode" => Some(Symbology::Qr),
            "upca" => Some(Symbology::UpcA),
            "ean13" => Some(Symbology::Ean13),
            _ => None,
        };
        by_key.or_else(|| Symbology::from_mnemonic(text))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SymbologyRepr {
    Key(String),
    Preset {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        zpl: Option<String>,
    },
}

impl TryFrom<SymbologyRepr> for Symbology {
    type Error = String;

    fn try_from(repr: SymbologyRepr) -> Result<Self, Self::Error> {
        match repr {
            SymbologyRepr::Key(key) => {
                Symbology::lookup(&key).ok_or_else(|| format!("unknown barcode symbology '{key}'"))
            }
            SymbologyRepr::Preset { name, zpl } => zpl
                .as_deref()
                .and_then(Symbology::from_mnemonic)
                .or_else(|| name.as_deref().and_then(Symbology::lookup))
                .ok_or_else(|| {
                    format!("unknown barcode symbology (name {name:?}, zpl {zpl:?})")
                }),
        }
    }
}

// ── Label size ──────────────────────────────────────────────────────────

/// Physical label dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelSize {
    /// Optional display name (e.g. `4" x 6"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Width in inches.
    #[serde(rename = "width")]
    pub width_in: f64,
    /// Height in inches.
    #[serde(rename = "height")]
    pub height_in: f64,
}

/// Stock label sizes offered by the designer, as `(width, height)` inches.
pub const LABEL_SIZE_PRESETS: [(f64, f64); 6] = [
    (4.0, 6.0),
    (4.0, 3.0),
    (2.0, 1.0),
    (3.0, 2.0),
    (2.25, 1.25),
    (4.0, 2.0),
];

impl LabelSize {
    /// An unnamed size in inches.
    pub fn new(width_in: f64, height_in: f64) -> Self {
        Self {
            name: None,
            width_in,
            height_in,
        }
    }

    /// The stock presets, named in the designer's `W" x H"` style.
    pub fn presets() -> Vec<LabelSize> {
        LABEL_SIZE_PRESETS
            .iter()
            .map(|&(w, h)| LabelSize {
                name: Some(format!("{w}\" x {h}\"")),
                width_in: w,
                height_in: h,
            })
            .collect()
    }

    /// Print width in dots (`^PW`).
    pub fn width_dots(&self) -> i64 {
        inches_to_dots(self.width_in)
    }

    /// Label length in dots (`^LL`).
    pub fn height_dots(&self) -> i64 {
        inches_to_dots(self.height_in)
    }

    /// Design canvas size in display units, `(width, height)`.
    pub fn canvas_size(&self) -> (f64, f64) {
        (
            inches_to_display(self.width_in),
            inches_to_display(self.height_in),
        )
    }
}

impl Default for LabelSize {
    fn default() -> Self {
        let (w, h) = LABEL_SIZE_PRESETS[0];
        LabelSize::new(w, h)
    }
}

impl fmt::Display for LabelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "{}x{}", self.width_in, self.height_in),
        }
    }
}

/// Error returned when a label size string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid label size '{0}' (expected WIDTHxHEIGHT in inches, e.g. 4x6)")]
pub struct ParseLabelSizeError(String);

impl FromStr for LabelSize {
    type Err = ParseLabelSizeError;

    /// Parse `"4x6"`, `"2.25 x 1.25"` or `4"x6"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseLabelSizeError(s.to_string());
        let cleaned: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '"')
            .collect();
        let (w, h) = cleaned
            .split_once(['x', 'X'])
            .ok_or_else(err)?;
        let width_in: f64 = w.parse().map_err(|_| err())?;
        let height_in: f64 = h.parse().map_err(|_| err())?;
        if !(width_in.is_finite() && height_in.is_finite() && width_in > 0.0 && height_in > 0.0) {
            return Err(err());
        }
        Ok(LabelSize::new(width_in, height_in))
    }
}

// ── Design document ─────────────────────────────────────────────────────

/// A complete saved design: label size, elements, and quantity column.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelDesign {
    /// Physical label size.
    #[serde(default)]
    pub label_size: LabelSize,
    /// Elements in insertion order.
    #[serde(default)]
    pub elements: Vec<Element>,
    /// Column holding per-row copy counts. Empty means unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity_column: Option<String>,
}

impl LabelDesign {
    /// The configured quantity column, treating an empty name as unset.
    pub fn quantity_column(&self) -> Option<&str> {
        self.quantity_column.as_deref().filter(|c| !c.is_empty())
    }
}
