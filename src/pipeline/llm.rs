//! LLM interaction: send the prompt and get a structured quiz back.
//!
//! The rest of the crate only sees the [`QuizGenerator`] trait, so the HTTP
//! server and the tests can swap the real provider for a canned one. All
//! prompt wording lives in [`crate::prompts`] and all response cleanup in
//! [`crate::pipeline::postprocess`].
//!
//! ## Structured output
//!
//! The quiz schema is offered as a single `submit_quiz` function and the
//! provider is forced to call it, so the quiz arrives as the call's JSON
//! arguments. Providers without function calling are asked for JSON mode
//! (`response_format = "json_object"`) when they support it, and their text
//! reply goes through [`parse_quiz`].
//!
//! ## Failure policy
//!
//! There is no retry. A missing API key is a configuration error and is
//! reported before any network call; a provider error or a timeout is handed
//! straight back to the caller.

use crate::config::QuizConfig;
use crate::error::{GenerationError, QuizgenError};
use crate::model::GeneratedQuiz;
use crate::pipeline::postprocess::{parse_quiz, parse_tool_arguments, QuizSchema};
use crate::prompts::{system_prompt, SUBMIT_QUIZ_DESCRIPTION, SUBMIT_QUIZ_TOOL};
use async_trait::async_trait;
use edgequake_llm::{
    ChatMessage, CompletionOptions, LLMProvider, LLMResponse, ProviderFactory, ToolChoice,
    ToolDefinition,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Rough characters-per-token ratio used for cost diagnostics.
const CHARS_PER_TOKEN: usize = 4;

/// A quiz produced by a [`QuizGenerator`], with diagnostics.
#[derive(Debug, Clone)]
pub struct Generation {
    pub quiz: GeneratedQuiz,
    pub usage: UsageEstimate,
    pub duration_ms: u64,
}

/// Token and cost estimate computed from string lengths.
///
/// For logs only; nothing is billed or limited on these numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct UsageEstimate {
    pub input_chars: usize,
    pub output_chars: usize,
    pub estimated_input_tokens: usize,
    pub estimated_output_tokens: usize,
    pub estimated_cost_usd: f64,
}

impl UsageEstimate {
    pub fn from_lengths(
        input_chars: usize,
        output_chars: usize,
        input_price_per_million: f64,
        output_price_per_million: f64,
    ) -> Self {
        let estimated_input_tokens = input_chars.div_ceil(CHARS_PER_TOKEN);
        let estimated_output_tokens = output_chars.div_ceil(CHARS_PER_TOKEN);
        let estimated_cost_usd = (estimated_input_tokens as f64 * input_price_per_million
            + estimated_output_tokens as f64 * output_price_per_million)
            / 1_000_000.0;
        Self {
            input_chars,
            output_chars,
            estimated_input_tokens,
            estimated_output_tokens,
            estimated_cost_usd,
        }
    }
}

/// Anything that can turn a prompt into a quiz.
#[async_trait]
pub trait QuizGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Generation, GenerationError>;
}

/// [`QuizGenerator`] backed by an `edgequake-llm` provider.
pub struct LlmQuizGenerator {
    config: Arc<QuizConfig>,
    schema: QuizSchema,
}

impl LlmQuizGenerator {
    pub fn new(config: Arc<QuizConfig>) -> Result<Self, QuizgenError> {
        Ok(Self {
            config,
            schema: QuizSchema::new()?,
        })
    }

    /// Resolve the provider for one call.
    ///
    /// 1. A pre-built provider in the config is used as-is.
    /// 2. Otherwise the API-key variable must be set and non-empty; it is
    ///    read on every call so a key added after startup is picked up.
    /// 3. Then [`ProviderFactory::create_llm_provider`] builds the named provider.
    fn resolve_provider(&self) -> Result<Arc<dyn LLMProvider>, GenerationError> {
        if let Some(ref provider) = self.config.provider {
            return Ok(Arc::clone(provider));
        }

        let var = &self.config.api_key_env;
        let key_present = std::env::var(var)
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false);
        if !key_present {
            return Err(GenerationError::ProviderNotConfigured {
                provider: self.config.provider_name.clone(),
                hint: format!("{var} is not set."),
            });
        }

        ProviderFactory::create_llm_provider(&self.config.provider_name, &self.config.model)
            .map_err(|e| GenerationError::ProviderNotConfigured {
                provider: self.config.provider_name.clone(),
                hint: e.to_string(),
            })
    }
}

#[async_trait]
impl QuizGenerator for LlmQuizGenerator {
    async fn generate(&self, prompt: &str) -> Result<Generation, GenerationError> {
        let provider = self.resolve_provider()?;
        let start = Instant::now();

        let system = system_prompt(self.schema.as_json());
        let messages = vec![ChatMessage::system(system.as_str()), ChatMessage::user(prompt)];
        let function_calling = provider.supports_function_calling();
        let json_mode = !function_calling && provider.supports_json_mode();
        let options = build_options(&self.config, json_mode);

        info!(
            "Requesting quiz from {}/{} ({} prompt chars, {})",
            self.config.provider_name,
            self.config.model,
            prompt.chars().count(),
            if function_calling {
                "function call"
            } else {
                "text reply"
            }
        );

        let call = async {
            if function_calling {
                let tools = [submit_quiz_tool(&self.schema)];
                provider
                    .chat_with_tools(
                        &messages,
                        &tools,
                        Some(ToolChoice::function(SUBMIT_QUIZ_TOOL)),
                        Some(&options),
                    )
                    .await
            } else {
                provider.chat(&messages, Some(&options)).await
            }
        };

        let secs = self.config.api_timeout_secs;
        let response = tokio::time::timeout(Duration::from_secs(secs), call)
            .await
            .map_err(|_| {
                warn!("LLM call timed out after {}s", secs);
                GenerationError::Timeout { secs }
            })?
            .map_err(|e| GenerationError::Api {
                message: e.to_string(),
            })?;

        let duration_ms = start.elapsed().as_millis() as u64;
        let (quiz, output_chars) = quiz_from_response(&response, &self.schema)?;
        let usage = UsageEstimate::from_lengths(
            system.chars().count() + prompt.chars().count(),
            output_chars,
            self.config.input_price_per_million,
            self.config.output_price_per_million,
        );
        debug!(
            "LLM answered in {}ms: reported {} in / {} out tokens, estimated ${:.5}",
            duration_ms, response.prompt_tokens, response.completion_tokens, usage.estimated_cost_usd
        );

        Ok(Generation {
            quiz,
            usage,
            duration_ms,
        })
    }
}

/// The `submit_quiz` function, its parameters being the quiz schema.
///
/// Strict mode stays off: it needs `additionalProperties: false` on every
/// object, which the generated schema does not declare. The arguments are
/// validated locally instead.
fn submit_quiz_tool(schema: &QuizSchema) -> ToolDefinition {
    let mut tool = ToolDefinition::function(
        SUBMIT_QUIZ_TOOL,
        SUBMIT_QUIZ_DESCRIPTION,
        schema.tool_parameters(),
    );
    tool.function.strict = None;
    tool
}

/// Take the quiz from the `submit_quiz` call, or from the text when the
/// provider answered without one. Also returns the answer's length in chars.
fn quiz_from_response(
    response: &LLMResponse,
    schema: &QuizSchema,
) -> Result<(GeneratedQuiz, usize), GenerationError> {
    if let Some(call) = response
        .tool_calls
        .iter()
        .find(|c| c.name() == SUBMIT_QUIZ_TOOL)
    {
        let quiz = parse_tool_arguments(call.arguments(), schema)?;
        return Ok((quiz, call.arguments().chars().count()));
    }

    for call in &response.tool_calls {
        warn!("Ignoring call to unknown function '{}'", call.name());
    }
    debug!("No {} call in the response; parsing the text reply", SUBMIT_QUIZ_TOOL);
    let quiz = parse_quiz(&response.content, schema)?;
    Ok((quiz, response.content.chars().count()))
}

/// Build `CompletionOptions` from the quiz config, in JSON mode if asked.
fn build_options(config: &QuizConfig, json_mode: bool) -> CompletionOptions {
    let base = if json_mode {
        CompletionOptions::json_mode()
    } else {
        CompletionOptions::default()
    };
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgequake_llm::{FunctionCall, ToolCall};
    use std::sync::Mutex;

    const SKY: &str = r#"{"name":"Sky","description":"Colours","questions":[{"questionText":"What colour is the sky?","answers":[{"answerText":"Blue","isCorrect":true},{"answerText":"Green","isCorrect":false},{"answerText":"Red","isCorrect":false},{"answerText":"Black","isCorrect":false}]}]}"#;

    /// What the provider was asked for.
    #[derive(Debug, Default, Clone)]
    struct Request {
        tools: Vec<String>,
        forced: Option<String>,
        response_format: Option<String>,
    }

    /// Provider with fixed capabilities and a canned response.
    struct ScriptedProvider {
        function_calling: bool,
        json_mode: bool,
        response: LLMResponse,
        requests: Mutex<Vec<Request>>,
    }

    impl ScriptedProvider {
        fn new(function_calling: bool, json_mode: bool, response: LLMResponse) -> Arc<Self> {
            Arc::new(Self {
                function_calling,
                json_mode,
                response,
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<Request> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted-1"
        }

        fn max_context_length(&self) -> usize {
            128_000
        }

        async fn complete(&self, _prompt: &str) -> edgequake_llm::Result<LLMResponse> {
            Ok(self.response.clone())
        }

        async fn complete_with_options(
            &self,
            _prompt: &str,
            _options: &CompletionOptions,
        ) -> edgequake_llm::Result<LLMResponse> {
            Ok(self.response.clone())
        }

        async fn chat(
            &self,
            _messages: &[ChatMessage],
            options: Option<&CompletionOptions>,
        ) -> edgequake_llm::Result<LLMResponse> {
            self.requests.lock().unwrap().push(Request {
                response_format: options.and_then(|o| o.response_format.clone()),
                ..Request::default()
            });
            Ok(self.response.clone())
        }

        async fn chat_with_tools(
            &self,
            _messages: &[ChatMessage],
            tools: &[ToolDefinition],
            tool_choice: Option<ToolChoice>,
            options: Option<&CompletionOptions>,
        ) -> edgequake_llm::Result<LLMResponse> {
            let forced = match tool_choice {
                Some(ToolChoice::Function { function, .. }) => Some(function.name),
                _ => None,
            };
            self.requests.lock().unwrap().push(Request {
                tools: tools.iter().map(|t| t.function.name.clone()).collect(),
                forced,
                response_format: options.and_then(|o| o.response_format.clone()),
            });
            Ok(self.response.clone())
        }

        fn supports_json_mode(&self) -> bool {
            self.json_mode
        }

        fn supports_function_calling(&self) -> bool {
            self.function_calling
        }
    }

    fn submit_call(arguments: &str) -> ToolCall {
        ToolCall {
            id: "call_1".to_string(),
            call_type: "function".to_string(),
            function: FunctionCall {
                name: SUBMIT_QUIZ_TOOL.to_string(),
                arguments: arguments.to_string(),
            },
        }
    }

    fn generator_for(provider: Arc<ScriptedProvider>) -> LlmQuizGenerator {
        let config = QuizConfig::builder().provider(provider).build().unwrap();
        LlmQuizGenerator::new(Arc::new(config)).unwrap()
    }

    #[tokio::test]
    async fn quiz_is_taken_from_the_forced_function_call() {
        // The text is deliberately not JSON: only the call arguments count.
        let response = LLMResponse::new("Calling submit_quiz {now}.", "scripted-1")
            .with_tool_calls(vec![submit_call(SKY)]);
        let provider = ScriptedProvider::new(true, true, response);
        let generator = generator_for(Arc::clone(&provider));

        let generation = generator.generate("The sky is blue.").await.unwrap();

        assert_eq!(generation.quiz.name, "Sky");
        assert_eq!(generation.quiz.questions[0].correct_count(), 1);
        assert_eq!(generation.usage.output_chars, SKY.chars().count());

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].tools, vec![SUBMIT_QUIZ_TOOL.to_string()]);
        assert_eq!(requests[0].forced.as_deref(), Some(SUBMIT_QUIZ_TOOL));
        assert_eq!(requests[0].response_format, None);
    }

    #[tokio::test]
    async fn invalid_call_arguments_are_schema_violations() {
        let bad = SKY.replace("\"isCorrect\":true", "\"isCorrect\":\"yes\"");
        let response = LLMResponse::new("", "scripted-1").with_tool_calls(vec![submit_call(&bad)]);
        let generator = generator_for(ScriptedProvider::new(true, false, response));

        let err = generator.generate("prompt").await.unwrap_err();
        assert!(matches!(err, GenerationError::SchemaViolation { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn providers_without_functions_get_json_mode() {
        let provider = ScriptedProvider::new(false, true, LLMResponse::new(SKY, "scripted-1"));
        let generator = generator_for(Arc::clone(&provider));

        let generation = generator.generate("prompt").await.unwrap();

        assert_eq!(generation.quiz.name, "Sky");
        let requests = provider.requests();
        assert!(requests[0].tools.is_empty());
        assert_eq!(requests[0].response_format.as_deref(), Some("json_object"));
    }

    #[tokio::test]
    async fn plain_text_providers_still_parse_a_chatty_reply() {
        let reply = format!("Note: I used {{braces}} in prose.\n{SKY}");
        let provider = ScriptedProvider::new(false, false, LLMResponse::new(reply, "scripted-1"));
        let generator = generator_for(Arc::clone(&provider));

        assert_eq!(generator.generate("prompt").await.unwrap().quiz.name, "Sky");
        assert_eq!(provider.requests()[0].response_format, None);
    }

    #[test]
    fn submit_tool_carries_the_quiz_schema() {
        let tool = submit_quiz_tool(&QuizSchema::new().unwrap());
        assert_eq!(tool.function.name, SUBMIT_QUIZ_TOOL);
        assert_eq!(tool.function.strict, None);
        assert!(tool.function.parameters["properties"].get("questions").is_some());
    }

    #[test]
    fn build_options_defaults() {
        let config = QuizConfig::default();
        let opts = build_options(&config, false);
        assert_eq!(opts.temperature, Some(0.7));
        assert_eq!(opts.max_tokens, Some(4096));
        assert_eq!(opts.response_format, None);

        let opts = build_options(&config, true);
        assert_eq!(opts.response_format.as_deref(), Some("json_object"));
        assert_eq!(opts.temperature, Some(0.7));
    }

    #[test]
    fn usage_estimate_rounds_tokens_up() {
        let u = UsageEstimate::from_lengths(9, 4, 1_000_000.0, 2_000_000.0);
        assert_eq!(u.estimated_input_tokens, 3);
        assert_eq!(u.estimated_output_tokens, 1);
        assert!((u.estimated_cost_usd - 5.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_call() {
        let config = QuizConfig::builder()
            .api_key_env("PDFQUIZ_TEST_KEY_THAT_IS_NEVER_SET")
            .build()
            .unwrap();
        let generator = LlmQuizGenerator::new(Arc::new(config)).unwrap();
        let err = generator.generate("prompt").await.unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("PDFQUIZ_TEST_KEY_THAT_IS_NEVER_SET"));
    }
}
