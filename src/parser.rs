//! Numeric field parsing for spreadsheet cells.

use crate::error::{Field, ParseError};
use crate::record::RawRecord;

/// How malformed numeric cells are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    /// Read the leading numeric prefix of each cell, the way the sheet has
    /// always been processed. Cells without one become NaN scores or missing
    /// absences, and a NaN score classifies the student as `Passed`.
    #[default]
    Lenient,
    /// Require clean values: a non-negative integer for absences and a
    /// finite score within the exam range. Anything else is a [`ParseError`].
    Strict,
}

/// Numeric view of a [`RawRecord`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedFields {
    pub absences: Option<u32>,
    pub scores: [f64; 3],
}

/// Parses the numeric fields of `raw`, the `index`-th record of the batch.
///
/// # Errors
///
/// Only in [`ParseMode::Strict`], for the first field that is not a clean
/// value. Scores must lie in `0..=max_score`.
pub fn parse_record(
    index: usize,
    raw: &RawRecord,
    mode: ParseMode,
    max_score: f64,
) -> Result<ParsedFields, ParseError> {
    let invalid = |field: Field, value: &str| ParseError {
        index,
        name: raw.display_name().to_string(),
        field,
        value: value.to_string(),
    };

    match mode {
        ParseMode::Lenient => Ok(ParsedFields {
            absences: leading_int(&raw.absences).map(|n| n.clamp(0, u32::MAX as i64) as u32),
            scores: [
                leading_float(&raw.scores[0]),
                leading_float(&raw.scores[1]),
                leading_float(&raw.scores[2]),
            ],
        }),
        ParseMode::Strict => {
            let absences = raw
                .absences
                .trim()
                .parse::<u32>()
                .map_err(|_| invalid(Field::Absences, &raw.absences))?;

            let mut scores = [0.0; 3];
            for (i, cell) in raw.scores.iter().enumerate() {
                let score = cell
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|s| s.is_finite() && (0.0..=max_score).contains(s))
                    .ok_or_else(|| invalid(Field::Score(i + 1), cell))?;
                scores[i] = score;
            }

            Ok(ParsedFields {
                absences: Some(absences),
                scores,
            })
        }
    }
}

/// Integer value of the leading `[+-]digits` run after leading whitespace.
///
/// `"12 faltas"` gives 12, `"3.9"` gives 3, `"abc"` and `""` give `None`.
/// Values beyond `i64` saturate.
pub fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }

    let negative = bytes[0] == b'-';
    Some(s[digits_start..end].parse::<i64>().map_or(
        if negative { i64::MIN } else { i64::MAX },
        |n| if negative { -n } else { n },
    ))
}

/// Float value of the longest leading decimal literal after leading
/// whitespace, or NaN when there is none.
///
/// `"7,5"` gives 7.0 (the comma ends the literal), `".5"` gives 0.5,
/// `"1e1x"` gives 10.0 and `"Infinity"` is accepted with an optional sign.
pub fn leading_float(s: &str) -> f64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    if s[end..].starts_with("Infinity") {
        return if bytes[0] == b'-' {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut mantissa_digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        mantissa_digits += frac_end - frac_start;
        if mantissa_digits > 0 {
            end = frac_end;
        }
    }

    if mantissa_digits == 0 {
        return f64::NAN;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_int() {
        assert_eq!(leading_int("12"), Some(12));
        assert_eq!(leading_int("  7 faltas"), Some(7));
        assert_eq!(leading_int("3.9"), Some(3));
        assert_eq!(leading_int("-4"), Some(-4));
        assert_eq!(leading_int("+5"), Some(5));
        assert_eq!(leading_int(""), None);
        assert_eq!(leading_int("abc"), None);
        assert_eq!(leading_int("-"), None);
        assert_eq!(leading_int("99999999999999999999999"), Some(i64::MAX));
    }

    #[test]
    fn test_leading_float() {
        assert_eq!(leading_float("8.25"), 8.25);
        assert_eq!(leading_float(" 6"), 6.0);
        assert_eq!(leading_float("7,5"), 7.0);
        assert_eq!(leading_float(".5"), 0.5);
        assert_eq!(leading_float("5."), 5.0);
        assert_eq!(leading_float("1e1x"), 10.0);
        assert_eq!(leading_float("2e"), 2.0);
        assert_eq!(leading_float("-Infinity"), f64::NEG_INFINITY);
        assert!(leading_float("").is_nan());
        assert!(leading_float("n/a").is_nan());
        assert!(leading_float(".").is_nan());
        assert!(leading_float("-").is_nan());
    }

    #[test]
    fn test_lenient_parse_keeps_malformed_cells() {
        let raw = RawRecord::new(Some("Bia"), "dez", ["7", "", "8,5"]);
        let parsed = parse_record(0, &raw, ParseMode::Lenient, 10.0).unwrap();

        assert_eq!(parsed.absences, None);
        assert_eq!(parsed.scores[0], 7.0);
        assert!(parsed.scores[1].is_nan());
        assert_eq!(parsed.scores[2], 8.0);
    }

    #[test]
    fn test_lenient_parse_clamps_negative_absences() {
        let raw = RawRecord::new(Some("Caio"), "-3", ["7", "7", "7"]);
        let parsed = parse_record(0, &raw, ParseMode::Lenient, 10.0).unwrap();
        assert_eq!(parsed.absences, Some(0));
    }

    #[test]
    fn test_strict_parse_accepts_clean_values() {
        let raw = RawRecord::new(Some("Duda"), " 4 ", ["10", "0", "6.5"]);
        let parsed = parse_record(0, &raw, ParseMode::Strict, 10.0).unwrap();
        assert_eq!(parsed.absences, Some(4));
        assert_eq!(parsed.scores, [10.0, 0.0, 6.5]);
    }

    #[test]
    fn test_strict_parse_rejects_bad_absences() {
        let raw = RawRecord::new(Some("Eva"), "4 faltas", ["1", "2", "3"]);
        let err = parse_record(2, &raw, ParseMode::Strict, 10.0).unwrap_err();
        assert_eq!(err.index, 2);
        assert_eq!(err.name, "Eva");
        assert_eq!(err.field, Field::Absences);
        assert_eq!(err.value, "4 faltas");
    }

    #[test]
    fn test_strict_parse_rejects_out_of_range_and_missing_scores() {
        let raw = RawRecord::new(None, "0", ["1", "11", "3"]);
        let err = parse_record(0, &raw, ParseMode::Strict, 10.0).unwrap_err();
        assert_eq!(err.field, Field::Score(2));
        assert_eq!(err.name, "<unnamed>");

        let raw = RawRecord::new(Some("Fabi"), "0", ["1", "2", ""]);
        let err = parse_record(0, &raw, ParseMode::Strict, 10.0).unwrap_err();
        assert_eq!(err.field, Field::Score(3));

        let raw = RawRecord::new(Some("Gui"), "0", ["NaN", "2", "3"]);
        assert!(parse_record(0, &raw, ParseMode::Strict, 10.0).is_err());
    }

    #[test]
    fn test_parse_error_message() {
        let raw = RawRecord::new(Some("Hugo"), "0", ["x", "2", "3"]);
        let err = parse_record(5, &raw, ParseMode::Strict, 10.0).unwrap_err();
        assert_eq!(err.to_string(), "record 5 (Hugo): invalid score1 value \"x\"");
    }
}
