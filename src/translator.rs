use crate::config::Config;
use crate::locale::Locale;
use crate::validator::ContentValidator;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

/// One (source file, target locale) unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationTask {
    /// Source document, relative to the docs root
    pub source: String,
    /// Destination document, relative to the docs root
    pub destination: String,
    pub locale: Locale,
}

/// Produces or refreshes the translated copy of a document.
///
/// An `Err` means the destination was not (re)written; the caller decides
/// what that means for the run.
#[allow(async_fn_in_trait)]
pub trait Translator {
    async fn translate(&self, task: &TranslationTask) -> Result<()>;
}

/// OpenAI Chat Completion request for translation
#[derive(Debug, Serialize)]
struct TranslationRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<String>,
}

/// Check if a model is a reasoning model that doesn't support temperature
fn is_reasoning_model(model: &str) -> bool {
    model.starts_with("gpt-5")
        || model.starts_with("o1")
        || model.starts_with("o3")
        || model.starts_with("o4")
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

fn build_translation_system_prompt(source_language: &str, target_language: &str) -> String {
    format!(
        r#"You are a professional technical translator. Translate the following documentation page from {} to {}.

## Translation Rules

### DO NOT translate:
- Code blocks, inline code and command lines
- URLs, link targets and image paths
- Frontmatter keys (translate only the values of `title` and `description`)
- MDX/JSX component names and their props
- Product names and API identifiers

### DO translate:
- Headings, paragraphs, list items and table cells
- Link text and image alt text
- Callout and admonition bodies

### Formatting:
- Preserve all markdown and MDX syntax exactly
- Keep the same heading levels, lists and table layout
- Output only the translated document, with no commentary"#,
        source_language, target_language
    )
}

fn build_translation_user_prompt(content: &str, target_language: &str) -> String {
    format!(
        "Please translate the following documentation page to {}:\n\n{}",
        target_language, content
    )
}

/// Relative link from `destination` back to the English `source`, one `../`
/// per directory level of the destination.
fn relative_source_link(destination: &str, source: &str) -> String {
    let depth = destination.split('/').count().saturating_sub(1);
    format!("{}{}", "../".repeat(depth), source)
}

/// Translator backed by an OpenAI-compatible chat completion endpoint.
///
/// Reads the English page from the docs root, sends it to the model, validates
/// the answer and writes it to the destination with the locale's AI notice.
pub struct ModelTranslator {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
    model: String,
    docs_root: PathBuf,
}

impl ModelTranslator {
    pub fn new(
        client: reqwest::Client,
        api_key: impl Into<String>,
        api_url: impl Into<String>,
        model: impl Into<String>,
        docs_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            api_url: api_url.into(),
            model: model.into(),
            docs_root: docs_root.into(),
        }
    }

    /// A missing key yields a translator with an empty key; the orchestrator
    /// refuses to run without a credential, so it is never sent.
    pub fn from_config(client: reqwest::Client, config: &Config) -> Self {
        Self::new(
            client,
            config.openai_api_key.clone().unwrap_or_default(),
            config.openai_api_url.clone(),
            config.openai_model.clone(),
            config.docs_root.clone(),
        )
    }

    fn build_request(&self, content: &str, locale: Locale) -> TranslationRequest {
        // Reasoning models don't support temperature - use reasoning_effort instead
        let is_reasoning = is_reasoning_model(&self.model);

        TranslationRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: build_translation_system_prompt(Locale::source().name(), locale.name()),
                },
                Message {
                    role: "user".to_string(),
                    content: build_translation_user_prompt(content, locale.name()),
                },
            ],
            temperature: if is_reasoning { None } else { Some(0.3) },
            reasoning_effort: if is_reasoning {
                Some("low".to_string())
            } else {
                None
            },
        }
    }

    async fn request_translation(&self, request: &TranslationRequest) -> Result<String> {
        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .context("Failed to send translation request to OpenAI API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            anyhow::bail!("OpenAI API error during translation ({}): {}", status, body);
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI translation response")?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .context("OpenAI translation response contained no choices")
    }
}

impl Translator for ModelTranslator {
    async fn translate(&self, task: &TranslationTask) -> Result<()> {
        let source_path = self.docs_root.join(&task.source);
        let original = tokio::fs::read_to_string(&source_path)
            .await
            .with_context(|| format!("Failed to read source file {}", source_path.display()))?;

        let request = self.build_request(&original, task.locale);
        let translated = self.request_translation(&request).await?;

        let validation = ContentValidator::validate(&original, &translated);
        if validation.has_warnings() {
            warn!(
                "Translation validation warnings for {} ({}): {:?}",
                task.destination, task.locale, validation.warnings
            );
        }
        if validation.has_errors() {
            anyhow::bail!(
                "Translation of {} rejected: {}",
                task.destination,
                validation.errors.join("; ")
            );
        }

        let notice = task
            .locale
            .notice_for(&relative_source_link(&task.destination, &task.source));

        let target_path = self.docs_root.join(&task.destination);
        if let Some(parent) = target_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        tokio::fs::write(&target_path, format!("{}{}", notice, translated))
            .await
            .with_context(|| format!("Failed to write {}", target_path.display()))?;

        debug!("Wrote {} ({} bytes)", task.destination, translated.len());
        Ok(())
    }
}
