use anyhow::{Context, Result};

use crate::pipeline::AnalysisRequest;

const INSTRUCTIONS: &str = "\
I have a MySQL query analysis request. Please analyze the information below and provide:
1. An explanation of the EXPLAIN plan, in particular why each select_type and access_type has its current value
2. Query optimization suggestions based on the table structures and indexes
3. Problems that may exist in the current execution plan";

const CLOSING: &str =
    "Please give a detailed answer with clear explanations and actionable optimization suggestions.";

/// Render `request` as the user prompt. Same request, same bytes.
pub fn build_prompt(request: &AnalysisRequest) -> Result<String> {
    let payload =
        serde_json::to_string_pretty(request).context("Failed to serialize analysis request")?;

    let mut prompt = String::with_capacity(INSTRUCTIONS.len() + payload.len() + 256);
    prompt.push_str(INSTRUCTIONS);
    prompt.push_str("\n\n");

    if let Some(version) = &request.server_version {
        prompt.push_str(&format!("MySQL version: {}\n\n", version));
    }

    prompt.push_str("Here is the analysis request data in JSON format:\n\n");
    prompt.push_str(&payload);
    prompt.push_str("\n\n");
    prompt.push_str(CLOSING);

    Ok(prompt)
}
