//! Normalisation applied before anything reaches a JSON response.
//!
//! CSV cells arrive as free text: empty, `NaN`, `inf`, `1.2e3`, or garbage.
//! Numbers leave this module finite and text leaves it non-null, so every
//! serialized report is valid JSON with no `NaN`/`Infinity` and no `null`
//! standing in for a number.

/// Replace NaN and ±Infinity with zero.
pub fn finite(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Lenient numeric parse for count columns; anything unusable becomes 0.
pub fn parse_count(raw: &str) -> f64 {
    raw.trim().parse::<f64>().map(finite).unwrap_or(0.0)
}

/// `a / b`, with a zero denominator replaced by 1.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    let denominator = if denominator == 0.0 { 1.0 } else { denominator };
    finite(numerator / denominator)
}

/// Text cells that a spreadsheet round-trip turned into `NaN` become empty.
pub fn clean_text(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("nan") {
        String::new()
    } else {
        raw.to_string()
    }
}

/// Count cell as exported to clients: kept when it parses to a finite
/// number, otherwise `"0"`.
pub fn clean_count(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => trimmed.to_string(),
        _ => "0".to_string(),
    }
}

/// True when `value` contains no nulls and no non-finite numbers anywhere.
pub fn is_json_clean(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Number(n) => n.as_f64().map(f64::is_finite).unwrap_or(true),
        serde_json::Value::Array(items) => items.iter().all(is_json_clean),
        serde_json::Value::Object(map) => map.values().all(is_json_clean),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_count_handles_messy_cells() {
        assert_eq!(parse_count("1200"), 1200.0);
        assert_eq!(parse_count(" 1.5e3 "), 1500.0);
        assert_eq!(parse_count(""), 0.0);
        assert_eq!(parse_count("abc"), 0.0);
        assert_eq!(parse_count("NaN"), 0.0);
        assert_eq!(parse_count("inf"), 0.0);
        assert_eq!(parse_count("-Infinity"), 0.0);
    }

    #[test]
    fn ratio_replaces_zero_denominator() {
        assert_eq!(ratio(10.0, 0.0), 10.0);
        assert_eq!(ratio(10.0, 4.0), 2.5);
        assert_eq!(ratio(f64::NAN, 2.0), 0.0);
    }

    #[test]
    fn clean_text_drops_nan_marker() {
        assert_eq!(clean_text("nan"), "");
        assert_eq!(clean_text(" NaN "), "");
        assert_eq!(clean_text("Nancy"), "Nancy");
    }

    #[test]
    fn clean_count_keeps_finite_cells() {
        assert_eq!(clean_count(" 1200 "), "1200");
        assert_eq!(clean_count("1.5e3"), "1.5e3");
        assert_eq!(clean_count("NaN"), "0");
        assert_eq!(clean_count("inf"), "0");
        assert_eq!(clean_count(""), "0");
        assert_eq!(clean_count("n/a"), "0");
    }

    #[test]
    fn is_json_clean_flags_nulls() {
        assert!(is_json_clean(&serde_json::json!({"a": [1, 2.5, "x"]})));
        assert!(!is_json_clean(&serde_json::json!({"a": [1, null]})));
        // serde_json turns NaN into null, which is exactly what we guard against.
        assert!(!is_json_clean(&serde_json::to_value(f64::NAN).unwrap()));
    }
}
