//! Argument extraction for postal tools
//!
//! Models often omit fields or fill them with placeholders. Every extractor
//! returns `None` when the value is absent, null, blank, zero or cannot be
//! interpreted; the tool then asks the user for those fields instead of
//! failing.

use chrono::NaiveDate;
use serde_json::Value;

use postal_assistant_core::InputSchema;

pub const TRACKING_NUMBER_DIGITS: usize = 14;
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Non-blank text, trimmed
pub fn text(input: &Value, name: &str) -> Option<String> {
    match input.get(name)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Strictly positive number; numeric strings with a decimal comma are accepted
pub fn positive_number(input: &Value, name: &str) -> Option<f64> {
    let value = match input.get(name)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok()?,
        _ => return None,
    };
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Tracking number of exactly 14 digits; spaces are ignored
pub fn tracking_number(input: &Value, name: &str) -> Option<String> {
    let raw = match input.get(name)? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let digits: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    (digits.len() == TRACKING_NUMBER_DIGITS && digits.chars().all(|c| c.is_ascii_digit()))
        .then_some(digits)
}

/// Calendar date in `dd.mm.yyyy`, normalized to two-digit day and month
pub fn date(input: &Value, name: &str) -> Option<String> {
    let raw = text(input, name)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT)
        .ok()
        .map(|d| d.format(DATE_FORMAT).to_string())
}

/// One of `allowed`, compared case-insensitively; returns the canonical spelling
pub fn one_of(input: &Value, name: &str, allowed: &[String]) -> Option<String> {
    let raw = text(input, name)?.to_lowercase();
    allowed.iter().find(|a| a.to_lowercase() == raw).cloned()
}

/// Header followed by `"{i}. {description}"` for each missing field
///
/// Fields are listed in schema declaration order regardless of the order in
/// `missing`.
pub fn missing_arguments_prompt(header: &str, schema: &InputSchema, missing: &[&str]) -> String {
    let lines: Vec<String> = schema
        .properties
        .iter()
        .filter(|p| missing.contains(&p.name.as_str()))
        .enumerate()
        .map(|(i, p)| format!("{}. {}", i + 1, p.schema.description))
        .collect();

    format!("{}{}", header, lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use postal_assistant_core::PropertySchema;
    use serde_json::json;

    #[test]
    fn test_text() {
        let input = json!({"a": "  Київ ", "b": "   ", "c": null, "d": 5});
        assert_eq!(text(&input, "a").as_deref(), Some("Київ"));
        assert_eq!(text(&input, "b"), None);
        assert_eq!(text(&input, "c"), None);
        assert_eq!(text(&input, "d").as_deref(), Some("5"));
        assert_eq!(text(&input, "missing"), None);
    }

    #[test]
    fn test_positive_number() {
        let input = json!({"a": 2.5, "b": 0, "c": "1,5", "d": "abc", "e": -3});
        assert_eq!(positive_number(&input, "a"), Some(2.5));
        assert_eq!(positive_number(&input, "b"), None);
        assert_eq!(positive_number(&input, "c"), Some(1.5));
        assert_eq!(positive_number(&input, "d"), None);
        assert_eq!(positive_number(&input, "e"), None);
    }

    #[test]
    fn test_tracking_number() {
        let input = json!({
            "ok": "2040 0123 4567 89",
            "num": 20400123456789u64,
            "short": "12345",
            "letters": "2040012345678A"
        });
        assert_eq!(tracking_number(&input, "ok").as_deref(), Some("20400123456789"));
        assert_eq!(tracking_number(&input, "num").as_deref(), Some("20400123456789"));
        assert_eq!(tracking_number(&input, "short"), None);
        assert_eq!(tracking_number(&input, "letters"), None);
    }

    #[test]
    fn test_date() {
        let input = json!({"ok": "1.3.2024", "iso": "2024-03-01", "bad": "31.02.2024"});
        assert_eq!(date(&input, "ok").as_deref(), Some("01.03.2024"));
        assert_eq!(date(&input, "iso"), None);
        assert_eq!(date(&input, "bad"), None);
    }

    #[test]
    fn test_one_of() {
        let allowed = vec!["Вантажі".to_string(), "Палети".to_string()];
        let input = json!({"t": "палети", "u": "Коробки"});
        assert_eq!(one_of(&input, "t", &allowed).as_deref(), Some("Палети"));
        assert_eq!(one_of(&input, "u", &allowed), None);
    }

    #[test]
    fn test_missing_prompt_uses_declaration_order() {
        let schema = InputSchema::object()
            .property("a", PropertySchema::string("Перше"), true)
            .property("b", PropertySchema::string("Друге"), true)
            .property("c", PropertySchema::string("Третє"), true);

        let prompt = missing_arguments_prompt("Потрібно надати:\n", &schema, &["c", "a"]);
        assert_eq!(prompt, "Потрібно надати:\n1. Перше\n2. Третє");
    }
}
