use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected a boolean value, got {input:?}")]
/// Raised when a CSV cell or CLI flag does not parse as a boolean.
pub struct BoolCellError {
    pub input: String,
}

/// Parses a boolean cell the way the CSV import layer accepts them.
///
/// Accepts, case-insensitively, `y`/`yes`/`t`/`true`/`on`/`1` for true and
/// `n`/`no`/`f`/`false`/`off`/`0` for false. Anything else is an error.
pub fn parse_bool_cell(raw: &str) -> Result<bool, BoolCellError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "t" | "true" | "on" | "1" => Ok(true),
        "n" | "no" | "f" | "false" | "off" | "0" => Ok(false),
        _ => Err(BoolCellError {
            input: raw.to_string(),
        }),
    }
}

/// Collapses whitespace runs so multi-line payloads log as one line.
pub fn single_line(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::{parse_bool_cell, single_line};

    #[test]
    fn unit_parse_bool_cell_accepts_truthy_spellings() {
        for raw in ["YES", "1", "On", "t", "true", "y"] {
            assert_eq!(parse_bool_cell(raw), Ok(true), "input {raw:?}");
        }
    }

    #[test]
    fn unit_parse_bool_cell_accepts_falsy_spellings() {
        for raw in ["no", "0", "Off", "F", "false", "N"] {
            assert_eq!(parse_bool_cell(raw), Ok(false), "input {raw:?}");
        }
    }

    #[test]
    fn unit_parse_bool_cell_rejects_everything_else() {
        for raw in ["", "maybe", "2", "tru", "yes please"] {
            assert!(parse_bool_cell(raw).is_err(), "input {raw:?}");
        }
    }

    #[test]
    fn unit_single_line_collapses_whitespace() {
        assert_eq!(single_line("a\n  b\tc "), "a b c");
    }
}
