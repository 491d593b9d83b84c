//! Prompt templates for loan query extraction

/// System instruction shared by every LLM backend.
pub const SYSTEM_PROMPT: &str = r#"You extract loan search parameters from short queries written in Turkish or English.

Credit types (field "type"):
- "housing": konut, ev, mortgage, home, house
- "vehicle": taşıt, araç, araba, otomobil, car, auto
- "personal": ihtiyaç, kişisel, tüketici, personal, consumer, cash

Amounts (field "amount", a plain number in the local currency):
- "milyon" / "million" / "mn" multiply by 1,000,000
- "bin" / "thousand" / "k" multiply by 1,000
- Turkish numbers use "." as thousands separator and "," as decimal mark ("1.500.000", "2,5 milyon")

Terms (field "term", an integer number of months):
- "ay" / "month" are months
- "yıl" / "sene" / "year" are years; multiply by 12

Reply with ONE JSON object and nothing else:
{
  "type": "housing" | "vehicle" | "personal" | null,
  "amount": number | null,
  "term": integer | null,
  "confidence": number between 0 and 1,
  "reasoning": "one sentence",
  "extracted_phrases": {"amount": string | null, "term": string | null, "type": string | null},
  "uncertainties": [string],
  "is_loan_query": boolean
}

Use null for anything the query does not state. Never guess a missing value."#;

/// Query used by connectivity probes.
pub const PROBE_QUERY: &str = "100 bin TL 12 ay ihtiyaç kredisi";

pub fn user_prompt(query: &str) -> String {
    format!("Query: {}\n\nJSON:", query.trim())
}
