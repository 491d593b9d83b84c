//! Lenient decoding of model output into [`ParsedQuery`].
//!
//! Models wrap JSON in code fences, add prose around it, quote numbers and
//! invent type aliases. Everything recoverable is recovered; anything else
//! becomes a `PARSE_ERROR` result instead of an error.

use std::str::FromStr;

use loanscout_domain::LoanType;
use serde_json::{Map, Value};

use crate::types::{ExtractedPhrases, ParsedQuery, ProviderKind};

/// Decode raw model text produced by `provider`.
pub fn decode_response(provider: ProviderKind, raw: &str) -> ParsedQuery {
    let Some(body) = outermost_object(raw) else {
        tracing::debug!(%provider, "response has no JSON object");
        return ParsedQuery::parse_error("response did not contain a JSON object");
    };
    let obj = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(obj)) => obj,
        Ok(_) => return ParsedQuery::parse_error("response JSON is not an object"),
        Err(e) => {
            tracing::debug!(%provider, error = %e, "response JSON is malformed");
            return ParsedQuery::parse_error(format!("malformed JSON: {}", e));
        }
    };
    from_object(provider, &obj)
}

fn outermost_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

fn from_object(provider: ProviderKind, obj: &Map<String, Value>) -> ParsedQuery {
    let mut parsed = ParsedQuery::new(provider);

    parsed.uncertainties = match obj.get("uncertainties") {
        Some(Value::Array(items)) => items.iter().filter_map(text).collect(),
        Some(other) => text(other).into_iter().collect(),
        None => vec![],
    };

    if let Some(name) = obj.get("type").or_else(|| obj.get("credit_type")).and_then(text) {
        match LoanType::from_str(&name) {
            Ok(t) => parsed.credit_type = Some(t),
            Err(_) => parsed
                .uncertainties
                .push(format!("unrecognized credit type '{}'", name)),
        }
    }

    parsed.amount = obj
        .get("amount")
        .and_then(number)
        .filter(|a| a.is_finite());
    parsed.term = obj
        .get("term")
        .and_then(number)
        .filter(|t| t.is_finite() && *t >= 1.0 && *t <= u32::MAX as f64)
        .map(|t| t.round() as u32);
    parsed.confidence = obj
        .get("confidence")
        .and_then(number)
        .filter(|c| !c.is_nan())
        .map(|c| c.clamp(0.0, 1.0))
        .unwrap_or(0.0);
    parsed.reasoning = obj.get("reasoning").and_then(text).unwrap_or_default();
    parsed.is_loan_query = match obj.get("is_loan_query") {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes" | "evet"),
        _ => false,
    };

    if let Some(Value::Object(phrases)) = obj.get("extracted_phrases") {
        parsed.extracted_phrases = ExtractedPhrases {
            amount: phrases.get("amount").and_then(text),
            term: phrases.get("term").and_then(text),
            credit_type: phrases.get("type").and_then(text),
        };
    }

    parsed
}

/// Strings and scalars as text; null and empty strings are absent.
fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.trim().is_empty() || s.trim().eq_ignore_ascii_case("null") => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Numbers, or strings holding one ("5000000", "5,000,000", "48 ay").
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .take_while(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | '_' | ' '))
                .filter(|c| !matches!(c, '_' | ' '))
                .collect();
            cleaned
                .parse()
                .ok()
                .or_else(|| cleaned.replace(',', "").parse().ok())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_json_with_prose() {
        let raw = "Sure! Here it is:\n```json\n{\"type\": \"konut\", \"amount\": 5000000, \"term\": 48, \"confidence\": 0.92, \"reasoning\": \"clear\", \"extracted_phrases\": {\"amount\": \"5 milyon\", \"term\": \"48 ay\", \"type\": \"konut\"}, \"uncertainties\": [], \"is_loan_query\": true}\n```";
        let parsed = decode_response(ProviderKind::OpenAI, raw);
        assert_eq!(parsed.credit_type, Some(LoanType::Housing));
        assert_eq!(parsed.amount, Some(5_000_000.0));
        assert_eq!(parsed.term, Some(48));
        assert_eq!(parsed.confidence, 0.92);
        assert!(parsed.is_loan_query);
        assert_eq!(parsed.provider, "openai");
        assert_eq!(parsed.extracted_phrases.term.as_deref(), Some("48 ay"));
    }

    #[test]
    fn test_string_numbers_and_clamping() {
        let raw = r#"{"type": "Vehicle", "amount": "750,000", "term": "36", "confidence": 1.7}"#;
        let parsed = decode_response(ProviderKind::Anthropic, raw);
        assert_eq!(parsed.credit_type, Some(LoanType::Vehicle));
        assert_eq!(parsed.amount, Some(750_000.0));
        assert_eq!(parsed.term, Some(36));
        assert_eq!(parsed.confidence, 1.0);
        assert!(!parsed.is_loan_query);
        assert!(parsed.uncertainties.is_empty());
    }

    #[test]
    fn test_missing_keys_default() {
        let parsed = decode_response(ProviderKind::OpenAI, "{}");
        assert!(!parsed.is_parse_error());
        assert_eq!(parsed.missing_fields().len(), 3);
        assert_eq!(parsed.confidence, 0.0);
        assert_eq!(parsed.reasoning, "");
    }

    #[test]
    fn test_unknown_type_is_noted() {
        let parsed = decode_response(ProviderKind::OpenAI, r#"{"type": "boat", "term": 0}"#);
        assert_eq!(parsed.credit_type, None);
        assert_eq!(parsed.term, None);
        assert_eq!(parsed.uncertainties.len(), 1);
    }

    #[test]
    fn test_non_json_is_parse_error() {
        for raw in ["I cannot help with that.", "{not json}", "", "} backwards {"] {
            let parsed = decode_response(ProviderKind::OpenAI, raw);
            assert!(parsed.is_parse_error(), "{:?}", raw);
            assert_eq!(parsed.confidence, 0.0);
        }
    }
}
