// =============================================================================
// Numeric Cleaner
// =============================================================================
//
// Coerces every cell of every column to `Option<f64>`:
//
//   Number(v)   finite or infinite values are kept, NaN becomes missing
//   Empty       missing
//   Text(s)     decoration stripped, then parsed; failures become missing
//
// Text decoration covers currency symbols and codes, thousands separators,
// percent signs, surrounding whitespace and accounting-style negatives
// "(12.50)". Any other character makes the cell a coercion failure.
// Columns are cleaned independently. A column with at least one non-blank
// cell that still fails coercion yields one `CoercionWarning`; the cleaner
// itself never fails.
// =============================================================================

use tracing::warn;

use crate::error::CoercionWarning;
use crate::table::{NumericColumn, NumericTable, RawCell, RawColumn, RawTable};

/// Placeholder spellings that mean "no value" rather than a coercion failure.
const MISSING_TOKENS: &[&str] = &["-", "--", "n/a", "na", "nan", "null", "none", "#n/a"];

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '₹', '₩', '₽', '¢'];

/// Clean a (flattened) raw table. Labels are taken from the primary level.
pub fn clean_table(table: RawTable) -> (NumericTable, Vec<CoercionWarning>) {
    let mut warnings = Vec::new();
    let columns = table
        .columns
        .into_iter()
        .map(|column| {
            let (cleaned, warning) = clean_column(column);
            if let Some(w) = warning {
                warn!(
                    column = %w.column,
                    failed = w.failed_cells,
                    first_row = w.first_row,
                    "column could not be fully coerced to numbers"
                );
                warnings.push(w);
            }
            cleaned
        })
        .collect();

    (
        NumericTable {
            index: table.index,
            columns,
        },
        warnings,
    )
}

/// Clean a single column, reporting partial coercion failure as a warning.
pub fn clean_column(column: RawColumn) -> (NumericColumn, Option<CoercionWarning>) {
    let name = column.label.primary().to_string();
    let mut failed_cells = 0usize;
    let mut first_failure: Option<(usize, String)> = None;

    let values = column
        .cells
        .into_iter()
        .enumerate()
        .map(|(row, cell)| match cell {
            RawCell::Number(v) if v.is_nan() => None,
            RawCell::Number(v) => Some(v),
            RawCell::Empty => None,
            RawCell::Text(text) => match parse_decorated(&text) {
                ParsedCell::Value(v) => Some(v),
                ParsedCell::Blank => None,
                ParsedCell::Invalid => {
                    failed_cells += 1;
                    if first_failure.is_none() {
                        first_failure = Some((row, text));
                    }
                    None
                }
            },
        })
        .collect();

    let warning = first_failure.map(|(first_row, sample)| CoercionWarning {
        column: name.clone(),
        failed_cells,
        first_row,
        sample,
    });

    (NumericColumn::new(name, values), warning)
}

/// Outcome of parsing one text cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParsedCell {
    Value(f64),
    /// Blank or a recognised placeholder such as `N/A`.
    Blank,
    Invalid,
}

/// Parse a decorated numeric string such as `"$1,234.50"` or `"1,234.50 EUR"`.
///
/// Only known decoration is removed: one currency symbol or ISO code at
/// either end, a trailing `%`, `,` thousands separators in valid groups,
/// surrounding whitespace and accounting parentheses. Whatever remains must
/// parse as a number in full, otherwise the cell is `Invalid`.
pub fn parse_decorated(text: &str) -> ParsedCell {
    let trimmed = text.trim();
    if trimmed.is_empty() || MISSING_TOKENS.contains(&trimmed.to_ascii_lowercase().as_str()) {
        return ParsedCell::Blank;
    }

    let (negated, body) = match trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let body = strip_currency(body);
    let body = body.strip_suffix('%').map_or(body, str::trim_end);

    // A sign may sit in front of the currency symbol: "-$12.50".
    let (sign, body) = match body.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", body.strip_prefix('+').unwrap_or(body)),
    };
    let body = strip_currency(body);

    let Some(number) = ungroup_thousands(body) else {
        return ParsedCell::Invalid;
    };
    let plain = number
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
    if !plain || !number.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return ParsedCell::Invalid;
    }

    match format!("{sign}{number}").parse::<f64>() {
        Ok(value) if !value.is_nan() => ParsedCell::Value(if negated { -value } else { value }),
        _ => ParsedCell::Invalid,
    }
}

/// Remove one currency symbol and one ISO-4217-style code from either end.
fn strip_currency(text: &str) -> &str {
    let text = text
        .trim()
        .trim_start_matches(CURRENCY_SYMBOLS)
        .trim_end_matches(CURRENCY_SYMBOLS)
        .trim();

    let leading = text
        .get(..3)
        .filter(|code| is_currency_code(code))
        .map(|_| &text[3..])
        .filter(|rest| !rest.starts_with(|c: char| c.is_alphabetic()));
    if let Some(rest) = leading {
        return rest.trim();
    }

    let trailing = text
        .len()
        .checked_sub(3)
        .and_then(|at| text.get(at..).map(|code| (at, code)))
        .filter(|(_, code)| is_currency_code(code))
        .map(|(at, _)| &text[..at])
        .filter(|rest| !rest.ends_with(|c: char| c.is_alphabetic()));
    trailing.map_or(text, str::trim)
}

fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase())
}

/// Drop `,` separators when they split the integer part into groups of
/// three. Misplaced separators make the cell invalid.
fn ungroup_thousands(body: &str) -> Option<String> {
    if !body.contains(',') {
        return Some(body.to_string());
    }
    let (integer, fraction) = match body.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (body, None),
    };
    if fraction.is_some_and(|f| f.contains(',')) {
        return None;
    }

    let mut groups = integer.split(',');
    let first = groups.next()?;
    let grouped = (1..=3).contains(&first.len())
        && groups.all(|g| g.len() == 3 && g.chars().all(|c| c.is_ascii_digit()));
    grouped.then(|| body.replace(',', ""))
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ColumnLabel;

    fn raw(name: &str, cells: Vec<RawCell>) -> RawColumn {
        RawColumn::new(ColumnLabel::flat(name), cells)
    }

    #[test]
    fn strips_currency_and_thousands_separator() {
        assert_eq!(parse_decorated("$1,234.50"), ParsedCell::Value(1234.50));
        assert_eq!(parse_decorated(" €2,000 "), ParsedCell::Value(2000.0));
        assert_eq!(parse_decorated("£ 99"), ParsedCell::Value(99.0));
    }

    #[test]
    fn accounting_negative_and_percent() {
        assert_eq!(parse_decorated("(12.50)"), ParsedCell::Value(-12.5));
        assert_eq!(parse_decorated("-3.5%"), ParsedCell::Value(-3.5));
    }

    #[test]
    fn placeholders_are_missing_not_failures() {
        assert_eq!(parse_decorated(""), ParsedCell::Blank);
        assert_eq!(parse_decorated("N/A"), ParsedCell::Blank);
        assert_eq!(parse_decorated("nan"), ParsedCell::Blank);
    }

    #[test]
    fn garbage_fails_coercion() {
        assert_eq!(parse_decorated("abc"), ParsedCell::Invalid);
        assert_eq!(parse_decorated("1.2.3"), ParsedCell::Invalid);
    }

    #[test]
    fn currency_codes_are_decoration() {
        assert_eq!(parse_decorated("1,234.50 EUR"), ParsedCell::Value(1234.50));
        assert_eq!(parse_decorated("USD 12"), ParsedCell::Value(12.0));
        assert_eq!(parse_decorated("-$12.50"), ParsedCell::Value(-12.5));
        assert_eq!(parse_decorated("($1,000)"), ParsedCell::Value(-1000.0));
    }

    #[test]
    fn digits_split_by_other_text_are_rejected() {
        assert_eq!(parse_decorated("10 to 12"), ParsedCell::Invalid);
        assert_eq!(parse_decorated("1/2/2024"), ParsedCell::Invalid);
        assert_eq!(parse_decorated("v2 build 7"), ParsedCell::Invalid);
        assert_eq!(parse_decorated("12.5 (est)"), ParsedCell::Invalid);
        assert_eq!(parse_decorated("1,23"), ParsedCell::Invalid);
        assert_eq!(parse_decorated("EUR"), ParsedCell::Invalid);
    }

    #[test]
    fn rejected_text_is_counted_in_warning() {
        let cells = vec![RawCell::from("11.5"), RawCell::from("10 to 12")];
        let (col, warning) = clean_column(raw("Close", cells));
        assert_eq!(col.values, vec![Some(11.5), None]);
        let w = warning.expect("warning expected");
        assert_eq!(w.first_row, 1);
        assert_eq!(w.sample, "10 to 12");
    }

    #[test]
    fn dollar_column_cleans_to_number() {
        let (col, warning) = clean_column(raw("Close", vec![RawCell::from("$1,234.50")]));
        assert_eq!(col.values, vec![Some(1234.50)]);
        assert!(warning.is_none());
    }

    #[test]
    fn numeric_column_is_identity() {
        let values = vec![10.0, 12.5, -3.25, 0.0];
        let cells = values.iter().copied().map(RawCell::Number).collect();
        let (col, warning) = clean_column(raw("Open", cells));
        assert_eq!(col.values, values.into_iter().map(Some).collect::<Vec<_>>());
        assert!(warning.is_none());
    }

    #[test]
    fn partial_failure_records_one_warning() {
        let cells = vec![
            RawCell::from("10"),
            RawCell::from("oops"),
            RawCell::Empty,
            RawCell::from("bad"),
        ];
        let (col, warning) = clean_column(raw("High", cells));
        assert_eq!(col.values, vec![Some(10.0), None, None, None]);
        let w = warning.expect("warning expected");
        assert_eq!(w.column, "High");
        assert_eq!(w.failed_cells, 2);
        assert_eq!(w.first_row, 1);
        assert_eq!(w.sample, "oops");
    }

    #[test]
    fn nan_number_becomes_missing() {
        let (col, _) = clean_column(raw("Low", vec![RawCell::Number(f64::NAN)]));
        assert_eq!(col.values, vec![None]);
    }

    #[test]
    fn columns_are_cleaned_independently() {
        let a = raw("A", vec![RawCell::from("x")]);
        let b = raw("B", vec![RawCell::from("1")]);
        let (forward, w1) = clean_table(RawTable::with_positional_index(vec![a.clone(), b.clone()]));
        let (backward, w2) = clean_table(RawTable::with_positional_index(vec![b, a]));
        assert_eq!(forward.column("A"), backward.column("A"));
        assert_eq!(forward.column("B"), backward.column("B"));
        assert_eq!(w1.len(), 1);
        assert_eq!(w2.len(), 1);
    }
}
