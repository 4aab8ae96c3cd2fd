//! Prompt templates for tubechat.
//!
//! The answer prompts can be replaced by placing a `rag.toml` in the custom
//! prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prompts {
    pub rag: RagPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for answer synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    pub system: String,
    /// User message template; `{{context}}` and `{{question}}` are filled in.
    pub user: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a knowledgeable assistant that gives detailed, well-structured answers based only on YouTube video transcripts.
Follow these guidelines:
1. Answer only from the transcripts provided; never add outside knowledge
2. Give specific details, examples and steps when the videos contain them
3. Structure your response with clear sections using bullet points or numbered lists where appropriate
4. Cite the specific video source for each major point
5. If different videos give conflicting information, say so and present both perspectives
6. If the information seems incomplete, say what is missing
7. Focus on actionable advice and practical tips when relevant"#
                .to_string(),

            user: r#"Based on these video transcripts:

{{context}}

Question: {{question}}

Please provide a detailed, well-structured answer that covers all relevant information from the videos:"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts, with an optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let rag_path = PathBuf::from(shellexpand::tilde(dir).to_string()).join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
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

    /// Render with both provided and custom config variables.
    /// Provided variables take precedence.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
