// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt composition for a chat turn.

use crate::types::Message;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Shown in place of similar contexts when the subject has none.
pub const NO_HISTORY: &str = "No previous interaction history with this customer.";

/// Everything that goes into one completion request.
#[derive(Debug, Clone, Copy)]
pub struct PromptParts<'a> {
    pub persona: &'a str,
    pub knowledge: &'a str,
    pub similar: &'a [String],
    pub history: &'a [Message],
    pub message: &'a str,
}

/// Renders the prompt: persona, shared knowledge, the subject's own past
/// exchanges, recent history and the new message, in that order.
pub fn compose_prompt(parts: &PromptParts<'_>) -> String {
    let similar = if parts.similar.is_empty() {
        NO_HISTORY.to_string()
    } else {
        parts.similar.join("\n")
    };
    let history = parts
        .history
        .iter()
        .map(|m| format!("{}: {}", m.role.prompt_label(), m.content))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{persona}

{RULE}
GLOBAL COMPANY KNOWLEDGE (shared):
{RULE}
{knowledge}

{RULE}
PERSONAL CUSTOMER CONTEXT (this user only):
{RULE}
{similar}

Conversation history with this customer:
{history}

Customer: {message}

Instructions:
- Use GLOBAL KNOWLEDGE for accurate company information
- Use PERSONAL CONTEXT to personalize your response to THIS customer
- Never mix up customers - each has separate memory
- Be helpful, professional, and specific to their needs
- If you don't know something, say so - never make up information

Provide your response:
",
        persona = parts.persona,
        knowledge = parts.knowledge,
        message = parts.message,
    )
}
