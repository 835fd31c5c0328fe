//! Configuration types for quiz generation.
//!
//! Every knob of the upload → prompt → model pipeline lives in
//! [`QuizConfig`], built via its [`QuizConfigBuilder`]. The HTTP server holds
//! one `Arc<QuizConfig>` for its whole lifetime and hands it to each request.

use crate::error::QuizgenError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Default character budget for document text inside the prompt.
pub const DEFAULT_TEXT_BUDGET: usize = 2000;

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Default provider name passed to `ProviderFactory`.
pub const DEFAULT_PROVIDER: &str = "openai";

/// Environment variable holding the provider secret.
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Configuration for quiz generation.
///
/// # Example
/// ```rust
/// use pdfquiz::QuizConfig;
///
/// let config = QuizConfig::builder()
///     .text_budget(1500)
///     .model("gpt-4.1-mini")
///     .build()
///     .unwrap();
/// assert_eq!(config.text_budget, 1500);
/// ```
#[derive(Clone)]
pub struct QuizConfig {
    /// Maximum characters of document text placed in the prompt. Default: 2000.
    ///
    /// Bounds token usage regardless of document length. The instruction
    /// prefix is not counted against this budget.
    pub text_budget: usize,

    /// Separator used when a page yields several text runs. Default: `" "`.
    pub page_separator: String,

    /// LLM model identifier. Default: `gpt-4.1-nano`.
    pub model: String,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama"). Default: `openai`.
    pub provider_name: String,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name` and
    /// skips the API-key check.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Environment variable that must hold the provider secret. Default: `OPENAI_API_KEY`.
    pub api_key_env: String,

    /// Sampling temperature. Default: 0.7.
    ///
    /// Quiz writing benefits from some variety in distractors, unlike
    /// transcription work.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 4096.
    pub max_tokens: usize,

    /// Per-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Largest accepted upload in bytes. Default: 20 MiB.
    pub max_upload_bytes: usize,

    /// USD per million input tokens, for diagnostics only. Default: 0.10.
    pub input_price_per_million: f64,

    /// USD per million output tokens, for diagnostics only. Default: 0.40.
    pub output_price_per_million: f64,

    /// Optional stage-level progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            text_budget: DEFAULT_TEXT_BUDGET,
            page_separator: " ".to_string(),
            model: DEFAULT_MODEL.to_string(),
            provider_name: DEFAULT_PROVIDER.to_string(),
            provider: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            temperature: 0.7,
            max_tokens: 4096,
            api_timeout_secs: 60,
            max_upload_bytes: 20 * 1024 * 1024,
            input_price_per_million: 0.10,
            output_price_per_million: 0.40,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for QuizConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizConfig")
            .field("text_budget", &self.text_budget)
            .field("page_separator", &self.page_separator)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("api_key_env", &self.api_key_env)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

impl QuizConfig {
    /// Create a new builder for `QuizConfig`.
    pub fn builder() -> QuizConfigBuilder {
        QuizConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`QuizConfig`].
#[derive(Debug)]
pub struct QuizConfigBuilder {
    config: QuizConfig,
}

impl QuizConfigBuilder {
    pub fn text_budget(mut self, chars: usize) -> Self {
        self.config.text_budget = chars;
        self
    }

    pub fn page_separator(mut self, sep: impl Into<String>) -> Self {
        self.config.page_separator = sep.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = name.into();
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn api_key_env(mut self, var: impl Into<String>) -> Self {
        self.config.api_key_env = var.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    pub fn prices_per_million(mut self, input: f64, output: f64) -> Self {
        self.config.input_price_per_million = input.max(0.0);
        self.config.output_price_per_million = output.max(0.0);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<QuizConfig, QuizgenError> {
        let c = &self.config;
        if c.text_budget == 0 {
            return Err(QuizgenError::InvalidConfig(
                "Text budget must be ≥ 1 character".into(),
            ));
        }
        if c.model.trim().is_empty() {
            return Err(QuizgenError::InvalidConfig("Model must not be empty".into()));
        }
        if c.provider.is_none() && c.api_key_env.trim().is_empty() {
            return Err(QuizgenError::InvalidConfig(
                "API key variable name must not be empty".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(QuizgenError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.max_upload_bytes == 0 {
            return Err(QuizgenError::InvalidConfig(
                "Upload limit must be ≥ 1 byte".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = QuizConfig::default();
        assert_eq!(c.text_budget, 2000);
        assert_eq!(c.page_separator, " ");
        assert_eq!(c.api_key_env, "OPENAI_API_KEY");
        assert!(c.provider.is_none());
    }

    #[test]
    fn temperature_is_clamped() {
        let c = QuizConfig::builder().temperature(9.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn zero_budget_is_rejected() {
        let err = QuizConfig::builder().text_budget(0).build().unwrap_err();
        assert!(matches!(err, QuizgenError::InvalidConfig(_)));
    }

    #[test]
    fn debug_hides_provider() {
        let c = QuizConfig::default();
        let s = format!("{c:?}");
        assert!(s.contains("gpt-4.1-nano"));
        assert!(s.contains("provider: None"));
    }
}
