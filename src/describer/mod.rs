//! Documentation backend selector.
//!
//! Orders the description backends by capability and degrades across them:
//! remote instruct → local instruct → local base → rule-based. First
//! success wins. The rule-based extractor terminates every chain, so the
//! selector never fails — the price of a missing backend is quality, not
//! an error.

pub mod ollama;
pub mod remote;
pub mod rules;

use tracing::debug;

use crate::chain::{self, attempt, Attempt};
use crate::config::Config;
use ollama::OllamaGenerator;
use remote::RemoteInstructClient;

const DESCRIBE_PROMPT: &str = r#"Describe what this code does in 2-3 short sentences suitable for text-to-speech. Mention the main functions and classes by name. Output ONLY the description, nothing else.

Code:
{code}

Description:"#;

/// Input larger than this is clipped before prompting a model.
const MAX_INPUT_CHARS: usize = 4000;

/// Generated descriptions are clipped to this many characters.
const MAX_DESCRIPTION_CHARS: usize = 600;

/// Which tier produced a description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocMethod {
    RemoteInstruct,
    LocalInstruct,
    LocalBase,
    RuleBased,
}

impl DocMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RemoteInstruct => "remote-instruct",
            Self::LocalInstruct => "local-instruct",
            Self::LocalBase => "local-base",
            Self::RuleBased => "rule-based",
        }
    }
}

impl std::fmt::Display for DocMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability hint for a describe call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocHint {
    /// Use the remote backend when a token is configured.
    Auto,
    /// Never leave the machine, even with a token configured.
    LocalOnly,
}

/// Generated description plus how it was produced.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub description: String,
    pub method: DocMethod,
    /// Present only when every model tier failed and the rule-based
    /// extractor produced the description.
    pub note: Option<String>,
}

pub struct DocSelector {
    remote: Option<RemoteInstructClient>,
    ollama: OllamaGenerator,
    instruct_model: String,
    base_model: String,
}

impl DocSelector {
    pub fn new(config: &Config) -> Self {
        let remote = if config.remote.enabled {
            config
                .remote_token()
                .map(|token| RemoteInstructClient::new(&config.remote, token))
        } else {
            None
        };

        Self {
            remote,
            ollama: OllamaGenerator::new(&config.ollama),
            instruct_model: config.ollama.instruct_model.clone(),
            base_model: config.ollama.base_model.clone(),
        }
    }

    /// Produce a description for `code`. Never fails.
    pub async fn describe(&self, code: &str, hint: DocHint) -> AnalysisResult {
        if code.trim().is_empty() {
            debug!("Empty submission, skipping model tiers");
            return AnalysisResult {
                description: rules::EMPTY_PLACEHOLDER.to_string(),
                method: DocMethod::RuleBased,
                note: None,
            };
        }

        let input = rules::truncate_chars(code, MAX_INPUT_CHARS);
        let prompt = DESCRIBE_PROMPT.replace("{code}", &input);

        let mut tiers: Vec<(DocMethod, Attempt<'_, String>)> = Vec::new();

        if hint == DocHint::Auto {
            if let Some(remote) = &self.remote {
                tiers.push((DocMethod::RemoteInstruct, attempt(remote.generate(&prompt))));
            }
        }
        tiers.push((
            DocMethod::LocalInstruct,
            attempt(self.ollama.generate(&self.instruct_model, &prompt, false)),
        ));
        tiers.push((
            DocMethod::LocalBase,
            attempt(self.ollama.generate(&self.base_model, &prompt, true)),
        ));

        let outcome =
            chain::first_success(tiers, DocMethod::RuleBased, || rules::describe(code)).await;

        AnalysisResult {
            description: rules::truncate_chars(&outcome.output, MAX_DESCRIPTION_CHARS),
            method: outcome.tag,
            note: outcome.note,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_only_selector() -> DocSelector {
        let mut config = Config::default();
        // Guaranteed-unset variable: no remote tier regardless of the
        // machine this runs on.
        config.remote.token_env = "CODE_NARRATOR_TEST_TOKEN_THAT_IS_NEVER_SET".into();
        // Closed port: local tiers fail with connection refused, instantly.
        config.ollama.host = "http://127.0.0.1:1".into();
        DocSelector::new(&config)
    }

    #[tokio::test]
    async fn empty_input_short_circuits_to_placeholder() {
        let selector = local_only_selector();
        let result = selector.describe("", DocHint::Auto).await;
        assert_eq!(result.method, DocMethod::RuleBased);
        assert_eq!(result.description, rules::EMPTY_PLACEHOLDER);
        assert!(result.note.is_none());
    }

    #[tokio::test]
    async fn unreachable_backends_degrade_to_rules_with_note() {
        let selector = local_only_selector();
        let result = selector
            .describe("def add(a, b):\n    return a + b", DocHint::Auto)
            .await;
        assert_eq!(result.method, DocMethod::RuleBased);
        assert!(result.description.contains("1 function"));
        let note = result.note.expect("degradation note");
        assert!(note.contains("local-instruct"));
        assert!(note.contains("local-base"));
    }

    #[tokio::test]
    async fn local_only_hint_never_reports_remote() {
        let selector = local_only_selector();
        let result = selector
            .describe("class Foo:\n    pass", DocHint::LocalOnly)
            .await;
        assert_ne!(result.method, DocMethod::RemoteInstruct);
        assert!(!result.description.is_empty());
    }

    #[test]
    fn tags_have_stable_wire_names() {
        assert_eq!(DocMethod::RemoteInstruct.as_str(), "remote-instruct");
        assert_eq!(DocMethod::LocalInstruct.as_str(), "local-instruct");
        assert_eq!(DocMethod::LocalBase.as_str(), "local-base");
        assert_eq!(DocMethod::RuleBased.as_str(), "rule-based");
    }
}
