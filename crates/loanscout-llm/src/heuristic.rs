//! Keyword heuristic behind the deterministic provider.
//!
//! Handles the common shapes of Turkish and English loan queries without any
//! network access: "5 milyon 48 ay konut", "car loan 750k 3 years",
//! "1.500.000 TL ihtiyaç kredisi 24 ay".

use loanscout_domain::{fold_keyword, LoanType};

use crate::types::{ParsedQuery, ProviderKind};

const MILLION_WORDS: &[&str] = &[
    "milyon", "milyonluk", "milyonluga", "milyonla", "million", "millions", "mn", "m", "mio",
];
const THOUSAND_WORDS: &[&str] = &["bin", "binlik", "binlige", "binle", "thousand", "k"];
const MONTH_WORDS: &[&str] = &["ay", "aylik", "ayda", "ayligina", "month", "months", "mo"];
const YEAR_WORDS: &[&str] = &["yil", "yillik", "yilda", "sene", "senelik", "year", "years", "yr", "yrs"];
const CURRENCY_WORDS: &[&str] = &["tl", "lira", "liralik", "try", "₺"];
const LOAN_WORDS: &[&str] = &["kredi", "kredisi", "kredim", "loan", "credit", "borc"];

/// Unit-less numbers at or above this are read as amounts.
const BARE_AMOUNT_THRESHOLD: f64 = 1_000.0;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64, String),
    Word(String),
}

/// Extract loan parameters by keyword matching.
pub fn parse_keywords(text: &str) -> ParsedQuery {
    let tokens = tokenize(&fold_keyword(text));
    let mut parsed = ParsedQuery::new(ProviderKind::Deterministic);
    let mut mentions_loan = false;

    let mut i = 0;
    while i < tokens.len() {
        match &tokens[i] {
            Token::Word(word) => {
                if parsed.credit_type.is_none() {
                    if let Some(t) = LoanType::from_keyword(word) {
                        parsed.credit_type = Some(t);
                        parsed.extracted_phrases.credit_type = Some(word.clone());
                    }
                }
                mentions_loan |= LOAN_WORDS.contains(&word.as_str());
                i += 1;
            }
            Token::Number(value, raw) => {
                let next = word_at(&tokens, i + 1);
                let consumed = if let Some(unit) = next.filter(|w| MILLION_WORDS.contains(w)) {
                    set_amount(&mut parsed, value * 1_000_000.0, format!("{} {}", raw, unit));
                    2
                } else if let Some(unit) = next.filter(|w| THOUSAND_WORDS.contains(w)) {
                    set_amount(&mut parsed, value * 1_000.0, format!("{} {}", raw, unit));
                    2
                } else if let Some(unit) = next.filter(|w| MONTH_WORDS.contains(w)) {
                    set_term(&mut parsed, *value, format!("{} {}", raw, unit));
                    2
                } else if let Some(unit) = next.filter(|w| YEAR_WORDS.contains(w)) {
                    set_term(&mut parsed, value * 12.0, format!("{} {}", raw, unit));
                    2
                } else if let Some(unit) = next.filter(|w| CURRENCY_WORDS.contains(w)) {
                    set_amount(&mut parsed, *value, format!("{} {}", raw, unit));
                    2
                } else if *value >= BARE_AMOUNT_THRESHOLD {
                    set_amount(&mut parsed, *value, raw.clone());
                    1
                } else {
                    parsed
                        .uncertainties
                        .push(format!("number '{}' has no unit", raw));
                    1
                };
                i += consumed;
            }
        }
    }

    let found = [
        parsed.credit_type.is_some(),
        parsed.amount.is_some(),
        parsed.term.is_some(),
    ]
    .iter()
    .filter(|f| **f)
    .count();

    parsed.is_loan_query = found > 0 || mentions_loan;
    parsed.confidence = match found {
        0 if mentions_loan => 0.1,
        0 => 0.0,
        1 => 0.4,
        2 => 0.6,
        _ => 0.8,
    };
    parsed.reasoning = format!(
        "Keyword match found {} of 3 fields (type: {}, amount: {}, term: {})",
        found,
        parsed.credit_type.map(|t| t.as_str()).unwrap_or("-"),
        parsed.amount.map(|a| format!("{:.0}", a)).unwrap_or_else(|| "-".into()),
        parsed.term.map(|t| t.to_string()).unwrap_or_else(|| "-".into()),
    );
    for field in parsed.missing_fields() {
        parsed.uncertainties.push(format!("{} not stated", field));
    }
    parsed
}

fn word_at(tokens: &[Token], i: usize) -> Option<&str> {
    match tokens.get(i) {
        Some(Token::Word(w)) => Some(w.as_str()),
        _ => None,
    }
}

fn set_amount(parsed: &mut ParsedQuery, amount: f64, phrase: String) {
    if parsed.amount.is_none() {
        parsed.amount = Some(amount);
        parsed.extracted_phrases.amount = Some(phrase);
    }
}

fn set_term(parsed: &mut ParsedQuery, months: f64, phrase: String) {
    let months = months.round();
    if parsed.term.is_none() && months >= 1.0 && months <= u32::MAX as f64 {
        parsed.term = Some(months as u32);
        parsed.extracted_phrases.term = Some(phrase);
    }
}

/// Splits on whitespace and punctuation, and at digit/letter boundaries so
/// that "48ay" and "750k" become two tokens.
fn tokenize(folded: &str) -> Vec<Token> {
    let mut tokens = vec![];
    let mut number = String::new();
    let mut word = String::new();

    let flush_number = |number: &mut String, tokens: &mut Vec<Token>| {
        let raw = number.trim_end_matches(['.', ',']).to_string();
        if let Some(value) = parse_number(&raw) {
            tokens.push(Token::Number(value, raw));
        }
        number.clear();
    };
    let flush_word = |word: &mut String, tokens: &mut Vec<Token>| {
        if !word.is_empty() {
            tokens.push(Token::Word(std::mem::take(word)));
        }
    };

    for c in folded.chars() {
        if c.is_ascii_digit() || (!number.is_empty() && matches!(c, '.' | ',')) {
            flush_word(&mut word, &mut tokens);
            number.push(c);
        } else if c.is_alphabetic() {
            flush_number(&mut number, &mut tokens);
            word.push(c);
        } else {
            flush_number(&mut number, &mut tokens);
            flush_word(&mut word, &mut tokens);
            if c == '₺' {
                tokens.push(Token::Word(c.to_string()));
            }
        }
    }
    flush_number(&mut number, &mut tokens);
    flush_word(&mut word, &mut tokens);
    tokens
}

/// "1.500.000" and "1,500,000" are grouped thousands; "2,5" and "2.5" are
/// decimals; "1.500.000,50" is Turkish style with both.
fn parse_number(raw: &str) -> Option<f64> {
    if raw.is_empty() {
        return None;
    }
    let normalized = match (raw.contains('.'), raw.contains(',')) {
        (true, true) => {
            let (group, decimal) = if raw.rfind(',') > raw.rfind('.') {
                ('.', ',')
            } else {
                (',', '.')
            };
            raw.replace(group, "").replace(decimal, ".")
        }
        (true, false) => ungroup(raw, '.'),
        (false, true) => ungroup(raw, ','),
        (false, false) => raw.to_string(),
    };
    normalized.parse().ok()
}

fn ungroup(raw: &str, sep: char) -> String {
    let parts: Vec<&str> = raw.split(sep).collect();
    let grouped = parts.len() > 1
        && !parts[0].is_empty()
        && parts[0].len() <= 3
        && parts[1..].iter().all(|p| p.len() == 3);
    if grouped {
        parts.concat()
    } else if parts.len() == 2 {
        format!("{}.{}", parts[0], parts[1])
    } else {
        parts.concat()
    }
}
