// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it;
// this file holds the cross-cutting pieces.

/// Appended to every prompt whose answer must be a single JSON object.
pub const JSON_ONLY_INSTRUCTION: &str = "Return JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to prompts whose answer must be plain lines.
pub const PLAIN_LINES_INSTRUCTION: &str = "Return plain text only, one item per line. \
    Do NOT number the lines. \
    Do NOT include a heading, introduction or closing remark.";
