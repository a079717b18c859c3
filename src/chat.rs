//! Research-assistant chat: keyword-routed between a plain generative reply
//! and a pointer at the full DYOR flow.

use crate::analysis::prompts;
use crate::data::DataResult;
use crate::llm::TextGenerator;
use serde::Serialize;
use std::sync::Arc;

const DYOR_KEYWORDS: [&str; 6] = [
    "research",
    "analyze token",
    "dyor",
    "token analysis",
    "investigate project",
    "token research",
];

/// Check whether a message is asking for detailed token research.
pub fn is_dyor_request(message: &str) -> bool {
    let message = message.to_lowercase();
    DYOR_KEYWORDS.iter().any(|keyword| message.contains(keyword))
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub success: bool,
    pub response: String,
    pub requires_dyor: bool,
}

pub struct ChatAgent {
    llm: Arc<dyn TextGenerator>,
}

impl ChatAgent {
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self { llm }
    }

    pub async fn respond(&self, message: &str) -> DataResult<ChatReply> {
        if is_dyor_request(message) {
            return Ok(ChatReply {
                success: true,
                response: "I notice you're interested in detailed token research. \
                           I recommend using our specialized DYOR agent for in-depth analysis. \
                           Would you like me to initiate a DYOR report for this token?"
                    .to_string(),
                requires_dyor: true,
            });
        }

        let response = self.llm.complete(prompts::CHAT_LORE, message).await?;
        Ok(ChatReply {
            success: true,
            response,
            requires_dyor: false,
        })
    }
}
