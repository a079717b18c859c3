//! Boundary parsing of the semi-structured verdict text. The upstream
//! format is inherently unstable, so everything here is pure, lenient on
//! unknown lines and exhaustively unit-tested.

use crate::store::TokenAnalysisRecord;
use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

/// Split the verdict into key/value fields: one `N. Label: value` per line,
/// numeric prefix stripped. Lines without `": "` are dropped silently.
pub fn parse_verdict(text: &str) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    for line in text.lines() {
        let Some((key, value)) = line.split_once(": ") else {
            continue;
        };
        let key = strip_numeric_prefix(key.trim()).to_string();
        fields.insert(key, value.to_string());
    }
    fields
}

fn strip_numeric_prefix(key: &str) -> &str {
    if let Some((prefix, rest)) = key.split_once(". ") {
        if !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_digit()) {
            return rest;
        }
    }
    key
}

/// `$FOO` → `FOO`; only the symbol field gets currency stripping.
pub fn clean_symbol(value: &str) -> String {
    value.trim().trim_matches('$').trim().to_string()
}

/// Parse a price like `$0.0032` or `1,234.5`
pub fn parse_price(value: &str) -> Option<f64> {
    let cleaned: String = value
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();
    cleaned.parse().ok()
}

/// Parse a count like `1,000`
pub fn parse_count(value: &str) -> Option<i64> {
    let cleaned: String = value
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    cleaned.parse().ok()
}

/// Percentage change between two price strings, e.g. `"+100.00%"`.
/// None when either side fails to parse or the base is zero.
pub fn price_change(previous: &str, current: &str) -> Option<String> {
    let previous = parse_price(previous)?;
    let current = parse_price(current)?;
    if previous == 0.0 {
        return None;
    }
    let pct = ((current - previous) / previous) * 100.0;
    Some(format!("{pct:+.2}%"))
}

/// Signed, digit-grouped holder delta between two count strings,
/// e.g. `"-100"` or `"+1,234"`.
pub fn holder_change(previous: &str, current: &str) -> Option<String> {
    let previous = parse_count(previous)?;
    let current = parse_count(current)?;
    let diff = current - previous;
    let sign = if diff < 0 { "-" } else { "+" };
    Some(format!("{}{}", sign, group_digits(diff.unsigned_abs())))
}

fn group_digits(mut n: u64) -> String {
    let mut groups = Vec::new();
    loop {
        let group = n % 1000;
        n /= 1000;
        if n == 0 {
            groups.push(group.to_string());
            break;
        }
        groups.push(format!("{group:03}"));
    }
    groups.reverse();
    groups.join(",")
}

/// Assemble the flattened analysis record from a parsed verdict, computing
/// deltas against the immediately prior record when one exists.
pub fn build_analysis_record(
    parsed: &HashMap<String, String>,
    address: &str,
    chain: &str,
    previous: Option<&TokenAnalysisRecord>,
) -> TokenAnalysisRecord {
    let get = |key: &str| {
        parsed
            .get(key)
            .map(|value| value.trim().to_string())
            .unwrap_or_default()
    };

    let current_price = get("Current price");
    let current_holders_count = get("Current holders count");

    let (price_delta, holder_delta) = match previous {
        Some(prev) => (
            price_change(&prev.current_price, &current_price),
            holder_change(&prev.current_holders_count, &current_holders_count),
        ),
        None => (None, None),
    };

    let now = Utc::now();
    TokenAnalysisRecord {
        id: Uuid::new_v4(),
        token_name: get("Token name"),
        token_symbol: clean_symbol(&get("Token symbol")),
        token_address: address.trim().to_string(),
        token_chain: chain.trim().to_string(),
        current_price,
        current_holders_count,
        technical_analysis: get("Brief technical side analysis"),
        community_analysis: get("Brief community side analysis"),
        final_decision: get("Final decision"),
        final_confidence: get("Final confidence level"),
        explanation: get("Explanation"),
        price_change: price_delta,
        holder_change: holder_delta,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_verdict_extracts_fields_and_strips_prefix() {
        let text = "1. Token name: Foo\n2. Token symbol: $FOO\n6. Current price: $0.0032";
        let parsed = parse_verdict(text);
        assert_eq!(parsed.get("Token name").map(String::as_str), Some("Foo"));
        assert_eq!(parsed.get("Token symbol").map(String::as_str), Some("$FOO"));
        assert_eq!(
            parsed.get("Current price").map(String::as_str),
            Some("$0.0032")
        );
    }

    #[test]
    fn test_parse_verdict_drops_nonmatching_lines() {
        let text = "preamble without delimiter\n9. Final decision: HIGH RISK\n---";
        let parsed = parse_verdict(text);
        assert_eq!(parsed.len(), 1);
        assert_eq!(
            parsed.get("Final decision").map(String::as_str),
            Some("HIGH RISK")
        );
    }

    #[test]
    fn test_non_numeric_prefix_is_kept() {
        let parsed = parse_verdict("N.B. Note: careful");
        // "N.B" is not numeric, so the key keeps its prefix
        assert!(parsed.contains_key("N.B. Note"));
    }

    #[test]
    fn test_clean_symbol_strips_currency_only_from_symbol() {
        assert_eq!(clean_symbol("$FOO"), "FOO");
        assert_eq!(clean_symbol(" $FOO "), "FOO");
        // the price value itself is untouched by symbol cleaning
        assert_eq!(parse_price("$0.0032"), Some(0.0032));
    }

    #[test]
    fn test_price_change() {
        assert_eq!(
            price_change("$0.01", "$0.02").as_deref(),
            Some("+100.00%")
        );
        assert_eq!(price_change("$0.02", "$0.01").as_deref(), Some("-50.00%"));
        assert_eq!(price_change("$0", "$0.01"), None);
        assert_eq!(price_change("n/a", "$0.01"), None);
    }

    #[test]
    fn test_holder_change() {
        assert_eq!(holder_change("1,000", "900").as_deref(), Some("-100"));
        assert_eq!(holder_change("1,000", "2,500").as_deref(), Some("+1,500"));
        assert_eq!(holder_change("100", "100").as_deref(), Some("+0"));
        assert_eq!(holder_change("many", "900"), None);
    }

    #[test]
    fn test_group_digits() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(1_000), "1,000");
        assert_eq!(group_digits(1_234_567), "1,234,567");
    }

    #[test]
    fn test_build_analysis_record_with_deltas() {
        let verdict = "\
1. Token name: Foo\n\
2. Token symbol: $FOO\n\
3. Token address: 0xabc\n\
4. Token chain: base\n\
5. Current holders count: 900\n\
6. Current price: $0.02\n\
7. Brief technical side analysis: Thin liquidity.\n\
8. Brief community side analysis: Genuine believers.\n\
9. Final decision: HIGH RISK\n\
10. Final confidence level: 40%\n\
11. Explanation: Early and volatile.";
        let parsed = parse_verdict(verdict);

        let previous = build_analysis_record(
            &parse_verdict("5. Current holders count: 1,000\n6. Current price: $0.01"),
            "0xabc",
            "base",
            None,
        );

        let record = build_analysis_record(&parsed, "0xabc", "base", Some(&previous));
        assert_eq!(record.token_symbol, "FOO");
        assert_eq!(record.current_price, "$0.02");
        assert_eq!(record.price_change.as_deref(), Some("+100.00%"));
        assert_eq!(record.holder_change.as_deref(), Some("-100"));
        assert_eq!(record.final_decision, "HIGH RISK");
    }
}
