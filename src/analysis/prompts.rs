//! Fixed role framings and prompt builders for every generative call.
//! The verdict and community formats carry textual contracts that the
//! boundary parsers in `verdict.rs` depend on; change both together.

use super::token_info::TokenSnapshot;
use crate::dyor::DyorReport;
use crate::orchestrator::refresh::UpdatedPlatform;
use serde_json::Value;

/// Role framing for the structured report extraction call
pub const REPORT_PARSER_LORE: &str = "You are a DYOR (Do Your Own Research) report parser. \
Your task is to extract structured information from cryptocurrency project research reports. \
Parse the given text and return only the requested JSON structure with relevant URLs and data. \
If a field is not found, use null instead of leaving it empty.";

/// Target shape for the extraction call, kept as a literal skeleton so the
/// model sees exactly the keys the decoder expects.
pub const REPORT_TARGET_SCHEMA: &str = r#"{
  "document_title": null,
  "metadata": {"source": null, "date_created": null, "author": null, "version": null},
  "general_info": {
    "project_name": null,
    "research_date": null,
    "token_info": {"token_chain": null, "token_address": null},
    "github_url": null
  },
  "summary": null,
  "sections": [{"section_title": null, "content": null, "subsections": [{"subsection_title": null, "content": null}]}],
  "team": [{"name": null, "role": null, "bio": null, "contacts": {"linkedin": null, "twitter": null, "other": null}}],
  "social_media": {"platforms": [{"name": null, "url": null, "followers": null}]},
  "investments": [{"round_name": null, "date": null, "amount_raised": null, "investors": [{"name": null, "url": null}]}],
  "additional_info": {"notes": null, "references": [{"description": null, "url": null}]}
}"#;

pub fn report_extraction_prompt(flattened_text: &str) -> String {
    format!(
        "Parse the following document and return only JSON matching this exact structure, \
         using null for any field that is not found:\n{REPORT_TARGET_SCHEMA}\n\nDocument:\n{flattened_text}"
    )
}

/// Role framing for the quant-trader technical verdict
pub const TECHNICAL_LORE: &str = "\
You are a professional quant trader with 10 years of experience who recently switched to memecoin trading.
You are analyzing the provided token info and answering what future you see for this token, leaning on your experience.
First look at the number of holders and the top holders.
Second look at liquidity and current price. If liquidity is low or current price is high, the token is not a good investment.
Third look at max price and max price date.
Fourth look at total supply.
Fifth look at token name and symbol.
Your response should contain only your conclusion, no more than 4 sentences.
Respond as plain text without any markup tags.";

pub fn token_info_prompt(snapshot: &TokenSnapshot) -> String {
    format!(
        "Token name: {name}\n\
         Token symbol: {symbol}\n\
         Token address: {address}\n\
         Token holders count: {holders}\n\
         Token top holders in format 'percentage_relative_to_total_supply of top holder1;percentage_relative_to_total_supply of top holder2; ...': {top_holders}\n\
         Token liquidity in USDT: {liquidity}\n\
         Current price in USDT: {price}\n\
         Max price in USDT: {max_price}\n\
         Max price date: {max_price_date}\n\
         Total supply: {supply}",
        name = snapshot.name,
        symbol = snapshot.symbol,
        address = snapshot.address,
        holders = snapshot.holders_count,
        top_holders = snapshot.top_holders,
        liquidity = snapshot.liquidity,
        price = snapshot.current_price,
        max_price = snapshot.max_price,
        max_price_date = snapshot.max_price_date,
        supply = snapshot.total_supply_formatted,
    )
}

/// Role framing for the community-psychology verdict. The closing
/// confidence line is a fixed textual contract.
pub const COMMUNITY_LORE: &str = "\
You are an ethereum trader and a professional psychologist.
You analyze the community of a crypto token and provide details about that community.
You analyze the top accounts shilling the token: do they do it for a lot of coins or only for this one.
Your response should contain a psychological analysis of the community.
Your response should check whether community posts about this token are pure shilling or genuine belief.
Your response should analyze whether the community believes in this token.
Do not list steps to check; provide the analysis itself.
Your response must always end with your confidence that the community will rug the token, in exactly this format: \"Confidence in rugging token: <percentage> %\".";

pub fn community_prompt(symbol: &str, address: &str) -> String {
    format!("Analyze community of token ${symbol}. Contract address is {address}.")
}

/// Role framing for the final 11-field investment verdict
pub const VERDICT_LORE: &str = "\
You are a General Partner of a hedge fund.
You received two reports about a meme coin token.
The first is from your quant trader, who analyzed the technical side of the token.
The second is from your professional psychologist, who analyzed the token's community.
Your task is to carefully read both reports and decide whether to invest in this token.
Your company wants to invest in tokens with a high probability of long-term success.
Everything that affects your decision should be included in the final document.
Your company keeps documents very clean, so your final report must be in exactly the format shown below:
1. Token name: TOKEN NAME HERE (Only name)
2. Token symbol: TOKEN SYMBOL HERE (Only symbol with $)
3. Token address: TOKEN ADDRESS HERE (Only address)
4. Token chain: TOKEN CHAIN HERE (Only chain)
5. Current holders count: CURRENT HOLDERS COUNT HERE (Only number)
6. Current price: CURRENT PRICE HERE (Only number with $ symbol)
7. Brief technical side analysis: BRIEF QUANT TRADER ANALYSIS HERE (No longer than 3 sentences)
8. Brief community side analysis: BRIEF PSYCHOLOGICAL ANALYSIS HERE (No longer than 3 sentences)
9. Final decision: FINAL DECISION HERE (ONLY HIGH RISK, MEDIUM RISK, LOW RISK)
10. Final confidence level: FINAL CONFIDENCE LEVEL HERE (Only number in %)
11. Explanation: FINAL EXPLANATION HERE (No longer than 4 sentences)
Respond as plain text without any markup tags.";

pub fn verdict_prompt(snapshot: &TokenSnapshot, technical: &str, community: &str) -> String {
    format!(
        "Token name: {name}\n\
         Token symbol: {symbol}\n\
         Token address: {address}\n\
         Token chain: {chain}\n\
         Quant trader analysis:\n{technical}\n\
         Psychological analysis:\n{community}",
        name = snapshot.name,
        symbol = snapshot.symbol,
        address = snapshot.address,
        chain = snapshot.chain,
    )
}

/// Role framing for the development-status summary over the repo listing
pub fn development_status_lore(current_date: &str) -> String {
    format!(
        "You are a DYOR (Do Your Own Research) report expert that builds reports for crypto projects.\n\
         You specialise in analyzing the GitHub repositories of projects.\n\
         You are tasked with analyzing a project's repositories and describing the development status \
         of the project in no more than 5 sentences.\n\
         You will be provided with a list of repositories and information about them: \
         name, description, last commit date, programming language and stars.\n\
         Current date: {current_date}\n\
         Respond as plain text, no more than 5 sentences, without any markup tags."
    )
}

/// Role framing for the refreshed conclusion
pub const FINAL_CONCLUSION_LORE: &str = "\
You are a DYOR (Do Your Own Research) report expert that builds reports for crypto projects.
You are tasked with writing a new Conclusion section for a DYOR report.
You will be provided with the initial report and the previous AI analysis (if one exists) in JSON format, \
plus the updated development status, the updated platforms, and the ticker analytic if the token is already live.
Write the new Conclusion section based on the provided information.
Respond as plain text, no more than 4 sentences, without any markup tags.";

pub fn final_conclusion_prompt(
    report: &DyorReport,
    development_status: &str,
    platforms: &[UpdatedPlatform],
    ticker_analytic: &str,
    last_ai_report: Option<&Value>,
) -> String {
    let report_json =
        serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string());
    let platforms_json =
        serde_json::to_string_pretty(platforms).unwrap_or_else(|_| "[]".to_string());
    let last_ai_json = last_ai_report
        .map(|v| serde_json::to_string_pretty(v).unwrap_or_else(|_| "{}".to_string()))
        .unwrap_or_else(|| "{}".to_string());

    format!(
        "Initial report:\n{report_json}\n\
         Updated development status:\n{development_status}\n\
         Updated platforms:\n{platforms_json}\n\
         Ticker analytic:\n{ticker_analytic}\n\
         Previous ai analysis:\n{last_ai_json}"
    )
}

/// Default role framing for the research-assistant chat endpoint
pub const CHAT_LORE: &str = "\
You are an AI assistant specialized in cryptocurrency research and analysis.
You help users understand crypto projects, analyze market data and provide insights based on available information.
If a user requests detailed research about a specific token, suggest using the DYOR (Do Your Own Research) agent.";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::token_info::TokenSnapshot;

    fn snapshot() -> TokenSnapshot {
        TokenSnapshot {
            name: "Acme".to_string(),
            symbol: "ACME".to_string(),
            address: "0xabc".to_string(),
            chain: "base".to_string(),
            twitter: None,
            telegram: None,
            website: None,
            total_supply_formatted: 1_000_000.0,
            holders_count: 1234,
            top_holders: "4.2;1.3".to_string(),
            liquidity: "50000".to_string(),
            current_price: "0.0032".to_string(),
            max_price: "0.01".to_string(),
            max_price_date: "2025-01-15T13:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_token_info_prompt_embeds_every_field() {
        let prompt = token_info_prompt(&snapshot());
        assert!(prompt.contains("Token name: Acme"));
        assert!(prompt.contains("Token holders count: 1234"));
        assert!(prompt.contains("4.2;1.3"));
        assert!(prompt.contains("Max price date: 2025-01-15T13:00:00Z"));
        assert!(prompt.contains("Total supply: 1000000"));
    }

    #[test]
    fn test_community_prompt() {
        assert_eq!(
            community_prompt("ACME", "0xabc"),
            "Analyze community of token $ACME. Contract address is 0xabc."
        );
    }

    #[test]
    fn test_verdict_lore_lists_all_eleven_fields() {
        for label in [
            "1. Token name:",
            "2. Token symbol:",
            "3. Token address:",
            "4. Token chain:",
            "5. Current holders count:",
            "6. Current price:",
            "7. Brief technical side analysis:",
            "8. Brief community side analysis:",
            "9. Final decision:",
            "10. Final confidence level:",
            "11. Explanation:",
        ] {
            assert!(VERDICT_LORE.contains(label), "missing label {label}");
        }
    }

    #[test]
    fn test_extraction_prompt_contains_schema_and_text() {
        let prompt = report_extraction_prompt("Project Acme raised $2M");
        assert!(prompt.contains("\"general_info\""));
        assert!(prompt.contains("Project Acme raised $2M"));
    }
}
