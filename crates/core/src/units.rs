//! Unit conversion between the design canvas and the printer.
//!
//! Designs are laid out in display units (96 per inch, the CSS pixel ratio).
//! Printers address the label in dots at a fixed 203 dpi. Both systems are
//! derived from inches independently and never converted into each other
//! except through [`display_to_dots`].

/// Printer resolution in dots per inch.
pub const PRINT_DPI: f64 = 203.0;

/// Design canvas resolution in display units per inch.
pub const DISPLAY_UNITS_PER_INCH: f64 = 96.0;

/// Round half up (`floor(v + 0.5)`), coercing non-finite values to 0.
///
/// Ties go towards positive infinity: `2.5` rounds to `3`, `-2.5` to `-2`.
pub fn round_half_up(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    (value + 0.5).floor() as i64
}

/// Convert a position in display units to printer dots.
pub fn display_to_dots(units: f64) -> i64 {
    round_half_up((units / DISPLAY_UNITS_PER_INCH) * PRINT_DPI)
}

/// Convert a physical length in inches to printer dots.
pub fn inches_to_dots(inches: f64) -> i64 {
    round_half_up(inches * PRINT_DPI)
}

/// Convert a physical length in inches to display units (unrounded).
pub fn inches_to_display(inches: f64) -> f64 {
    inches * DISPLAY_UNITS_PER_INCH
}
