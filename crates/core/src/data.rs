//! Data rows, CSV import, and the per-row quantity policy.

use std::collections::BTreeMap;

/// One record of the bound data set: column name to value.
pub type DataRow = BTreeMap<String, String>;

/// Errors raised while importing a data set.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataError {
    /// The input had no data row after the header.
    #[error("CSV must have at least a header row and one data row")]
    NotEnoughRows,
}

/// A parsed data set: header names plus rows in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataSet {
    /// Column names from the header line.
    pub headers: Vec<String>,
    /// Records, keyed by header name.
    pub rows: Vec<DataRow>,
}

impl DataSet {
    /// Parse simple comma-separated text.
    ///
    /// Blank lines are skipped and the first remaining line is the header.
    /// Double quotes toggle quoting (commas inside quotes are literal) and
    /// are dropped from the value. Fields are trimmed; rows shorter than the
    /// header get empty strings for the missing columns.
    pub fn parse_csv(text: &str) -> Result<Self, DataError> {
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());
        let headers = lines.next().map(split_csv_line).unwrap_or_default();

        let rows: Vec<DataRow> = lines
            .map(|line| {
                let mut values = split_csv_line(line).into_iter();
                headers
                    .iter()
                    .map(|h| (h.clone(), values.next().unwrap_or_default()))
                    .collect()
            })
            .collect();

        if rows.is_empty() {
            return Err(DataError::NotEnoughRows);
        }
        Ok(Self { headers, rows })
    }

    /// Guess the quantity column from the headers. See [`detect_quantity_column`].
    pub fn detect_quantity_column(&self) -> Option<&str> {
        detect_quantity_column(&self.headers)
    }

    /// Total labels this data set produces under `quantity_column`.
    pub fn label_count(&self, quantity_column: Option<&str>) -> u64 {
        label_count(&self.rows, quantity_column)
    }
}

fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

// ── Quantity policy ─────────────────────────────────────────────────────

/// Header spellings recognised as a copy-count column. Whitespace may appear
/// (or not) between the words of a multi-word name.
const QUANTITY_HEADERS: &[&[&str]] = &[
    &["qty"],
    &["quantity"],
    &["count"],
    &["copies"],
    &["#", "labels"],
    &["num", "labels"],
    &["number", "of", "labels"],
    &["labels"],
    &["num"],
    &["#"],
];

/// First header that names a copy count (`qty`, `quantity`, `copies`,
/// `# labels`, ...), compared case-insensitively.
pub fn detect_quantity_column<S: AsRef<str>>(headers: &[S]) -> Option<&str> {
    headers.iter().map(|h| h.as_ref()).find(|h| {
        let lower = h.trim().to_ascii_lowercase();
        QUANTITY_HEADERS
            .iter()
            .any(|words| matches_words(&lower, words))
    })
}

fn matches_words(mut s: &str, words: &[&str]) -> bool {
    for (i, word) in words.iter().enumerate() {
        if i > 0 {
            s = s.trim_start();
        }
        match s.strip_prefix(word) {
            Some(rest) => s = rest,
            None => return false,
        }
    }
    s.is_empty()
}

/// Parse the leading integer of `s` the way `parseInt(s)` does without a
/// radix: optional whitespace, optional sign, then decimal digits, or hex
/// digits after a `0x`/`0X` prefix. Anything after the digits is ignored.
/// Returns `None` when no digit is found. Saturates instead of overflowing.
pub fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let (radix, digits) = match rest.get(..2) {
        Some("0x" | "0X") => (16, &rest[2..]),
        _ => (10, rest),
    };

    let mut value: i64 = 0;
    let mut seen = false;
    for digit in digits.chars().map_while(|c| c.to_digit(radix)) {
        seen = true;
        value = value
            .saturating_mul(i64::from(radix))
            .saturating_add(i64::from(digit));
    }
    if !seen {
        return None;
    }
    Some(if negative { -value } else { value })
}

/// Number of copies to print for `row`.
///
/// `max(1, parseInt(row[column]))`; an unset column, a missing or empty
/// value, or non-numeric text all yield 1.
pub fn quantity(row: &DataRow, column: Option<&str>) -> u64 {
    column
        .filter(|c| !c.is_empty())
        .and_then(|c| row.get(c))
        .and_then(|v| parse_leading_int(v))
        .map_or(1, |n| n.max(1) as u64)
}

/// Sum of [`quantity`] over `rows`: the number of labels a render emits.
pub fn label_count(rows: &[DataRow], column: Option<&str>) -> u64 {
    rows.iter()
        .map(|row| quantity(row, column))
        .fold(0u64, u64::saturating_add)
}
