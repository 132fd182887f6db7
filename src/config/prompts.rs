//! Prompt templates for Callpilot.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    pub qa: QaPrompts,
    pub summary: SummaryPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for answering questions over call snippets.
///
/// `user` sees `{{question}}` and `{{snippets}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QaPrompts {
    pub system: String,
    pub user: String,
}

impl Default for QaPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a sales-call analysis copilot.
Answer ONLY using the provided call snippets.
After each factual claim, include bracketed citations like [call_id start_ts–end_ts].
If the context is insufficient, say so briefly.
Keep answers concise (3–6 sentences), neutral, and precise.
"#
            .to_string(),

            user: r#"You must answer ONLY using the snippets below.
If the answer is not present in the snippets, say you don't know.
Answer concisely (1–6 sentences). Do NOT include citations or a 'Sources' section.

Question: {{question}}

Snippets:
{{snippets}}"#
                .to_string(),
        }
    }
}

/// Prompts for single-call summaries.
///
/// `user` sees `{{call_id}}` and `{{snippets}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryPrompts {
    pub system: String,
    pub user: String,
}

impl Default for SummaryPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a precise meeting summarizer for sales calls. You MUST use only the provided Snippets as ground truth.
Do not invent, infer, or bring in outside knowledge. If something is not present in the snippets, write “Unknown”.

Output Markdown with these sections in this exact order and casing (no extra sections):
TL;DR
Agenda / Topics
Key Moments
Objections & Responses
Pricing
Security
Competitors
Action Items
Risks / Open Questions

Formatting & style rules:
- TL;DR: 3–5 short bullets.
- Use compact bullets elsewhere; one idea per bullet.
- Prefer present tense and plain, un-hyped language.
- Include timestamps like [mm:ss] when available in snippets.
- Use role labels from snippets (e.g., AE, SE, Prospect, or names if shown).
- If a section has nothing in the snippets, write “None mentioned.” (not omitted).
- Do NOT add citations in the body; they’ll be appended by the caller.
"#
            .to_string(),

            user: r#"You must summarize ONLY using the snippets below.
If a detail isn't present, say you don't know.
Output the following sections, concise, no citations:
TL;DR (3–5 bullets)
Agenda / Topics
Key Moments (use timestamps if present)
Objections & Responses
Pricing
Security
Competitors
Action Items (who/what/when)
Risks / Open Questions

Call ID: {{call_id}}

Snippets:
{{snippets}}"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let qa_path = custom_path.join("qa.toml");
            if qa_path.exists() {
                let content = std::fs::read_to_string(&qa_path)?;
                prompts.qa = toml::from_str(&content)?;
            }

            let summary_path = custom_path.join("summary.toml");
            if summary_path.exists() {
                let content = std::fs::read_to_string(&summary_path)?;
                prompts.summary = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
