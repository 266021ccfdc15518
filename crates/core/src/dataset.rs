//! Companion dataset CSV helpers.
//!
//! Parses a dataset companion file into row objects keyed by header so
//! the dashboard can render tables and pick chart columns without
//! shipping raw CSV to the browser. Handles basic quoting; numeric
//! values are coerced to JSON numbers and blank cells become null.

use serde_json::{Map, Value};

/// Parse raw CSV bytes into a list of row objects keyed by header.
///
/// Expects the first line to be a header row. Rows shorter than the
/// header are padded with nulls; extra cells are dropped.
pub fn parse_rows(data: &[u8]) -> Result<Vec<Map<String, Value>>, String> {
    let text = std::str::from_utf8(data).map_err(|e| format!("Invalid UTF-8: {e}"))?;
    let mut lines = text.lines();

    let header_line = lines.next().ok_or("CSV is empty")?;
    let headers = parse_line(header_line);

    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err("CSV header row is empty".into());
    }

    let mut rows = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let values = parse_line(line);
        let mut row = Map::new();
        for (i, header) in headers.iter().enumerate() {
            let cell = values.get(i).map(String::as_str).unwrap_or("");
            row.insert(header.clone(), coerce_value(cell));
        }
        rows.push(row);
    }

    Ok(rows)
}

/// Coerce a CSV cell into the most specific JSON value.
fn coerce_value(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Value::from(n);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if f.is_finite() {
            return Value::from(f);
        }
    }
    Value::String(cell.to_string())
}

/// Parse a single CSV line, handling quoted fields.
fn parse_line(line: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    // Escaped quote.
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(ch);
            }
        } else if ch == '"' {
            in_quotes = true;
        } else if ch == ',' {
            result.push(current.clone());
            current.clear();
        } else {
            current.push(ch);
        }
    }
    result.push(current);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_rows() {
        let data = b"name,age\nalice,30\nbob,25\n";
        let rows = parse_rows(data).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], "alice");
        assert_eq!(rows[0]["age"], 30);
        assert_eq!(rows[1]["name"], "bob");
    }

    #[test]
    fn coerces_floats_and_blanks() {
        let data = b"x,y\n1.5,\n";
        let rows = parse_rows(data).unwrap();
        assert_eq!(rows[0]["x"], 1.5);
        assert_eq!(rows[0]["y"], Value::Null);
    }

    #[test]
    fn handles_quoted_fields_with_commas() {
        let data = b"city,note\n\"Springfield, IL\",\"said \"\"hi\"\"\"\n";
        let rows = parse_rows(data).unwrap();
        assert_eq!(rows[0]["city"], "Springfield, IL");
        assert_eq!(rows[0]["note"], "said \"hi\"");
    }

    #[test]
    fn pads_short_rows_with_null() {
        let data = b"a,b,c\n1,2\n";
        let rows = parse_rows(data).unwrap();
        assert_eq!(rows[0]["a"], 1);
        assert_eq!(rows[0]["c"], Value::Null);
    }

    #[test]
    fn skips_blank_lines() {
        let data = b"a\n1\n\n2\n";
        let rows = parse_rows(data).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn rejects_empty_input() {
        assert!(parse_rows(b"").is_err());
    }

    #[test]
    fn rejects_invalid_utf8() {
        assert!(parse_rows(&[0xff, 0xfe, b'a']).is_err());
    }
}
