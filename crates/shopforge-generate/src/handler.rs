use std::sync::Arc;

use shopforge_preview::{CandidateSource, ValidationVerdict, check_and_log, extract};
use tracing::{info, warn};

use crate::chat::ChatCompletionsProvider;
use crate::config::GenerateConfig;
use crate::errors::GenerateError;
use crate::prompt::build_prompt;
use crate::provider::{ChatMessage, CompletionProvider, CompletionRequest};
use crate::request::{GenerationRequest, GenerationResponse};

/// A successful generation: extracted source plus its advisory verdict.
#[derive(Clone, Debug, PartialEq)]
pub struct Generation {
    pub request_id: uuid::Uuid,
    pub source: CandidateSource,
    pub verdict: ValidationVerdict,
}

/// Runs generation requests against a completion provider.
pub struct Generator {
    provider: Arc<dyn CompletionProvider>,
    config: GenerateConfig,
}

impl Generator {
    pub fn new(provider: Arc<dyn CompletionProvider>, config: GenerateConfig) -> Self {
        Self { provider, config }
    }

    /// Builds a generator backed by [`ChatCompletionsProvider`] from the
    /// environment.
    pub fn from_env() -> Result<Self, GenerateError> {
        let config = GenerateConfig::from_env()?;
        let provider = ChatCompletionsProvider::new(config.clone())?;
        Ok(Self::new(Arc::new(provider), config))
    }

    pub fn config(&self) -> &GenerateConfig {
        &self.config
    }

    /// Overrides the model requested from the provider.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn completion_request(&self, request: &GenerationRequest) -> CompletionRequest {
        CompletionRequest {
            request_id: uuid::Uuid::new_v4(),
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(self.config.system_prompt.clone()),
                ChatMessage::user(build_prompt(request)),
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }

    /// Generates (or refines) a page.
    ///
    /// A blank description is rejected before the provider is called. The
    /// completion goes through extraction, which can fail the generation, and
    /// then through the advisory check, which only logs.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<Generation, GenerateError> {
        if request.description.trim().is_empty() {
            return Err(GenerateError::validation("Description is required"));
        }

        let completion = self.completion_request(request);
        let request_id = completion.request_id;
        info!(
            event = "generate.request",
            domain = "generate",
            request_id = %request_id,
            provider = self.provider.name(),
            model = completion.model.as_str(),
            page_type = request.page_type.as_str(),
            refine = request.refining().is_some()
        );

        let raw = self.provider.complete(completion).await?;
        if raw.is_empty() {
            return Err(GenerateError::NoCompletion);
        }
        let source = extract(&raw)?;
        let verdict = check_and_log(&source);
        info!(
            event = "generate.completed",
            domain = "generate",
            request_id = %request_id,
            completion_len = raw.len() as u64,
            code_len = source.len() as u64,
            valid = verdict.valid
        );
        Ok(Generation {
            request_id,
            source,
            verdict,
        })
    }

    /// Like [`Generator::generate`] but folds failures into the response
    /// body, the way an HTTP host answers.
    pub async fn respond(&self, request: &GenerationRequest) -> GenerationResponse {
        match self.generate(request).await {
            Ok(generation) => GenerationResponse::success(&generation.source),
            Err(err) => {
                warn!(
                    event = "generate.failed",
                    domain = "generate",
                    status = err.status_code(),
                    error = %err
                );
                GenerationResponse::failure(&err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::provider::ChatRole;
    use crate::request::PageType;

    struct FakeProvider {
        reply: Result<String, GenerateError>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl FakeProvider {
        fn replying(reply: Result<&str, GenerateError>) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.map(ToOwned::to_owned),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.seen.lock().expect("seen lock").len()
        }
    }

    #[async_trait::async_trait]
    impl CompletionProvider for FakeProvider {
        fn name(&self) -> &str {
            "fake"
        }

        async fn complete(&self, request: CompletionRequest) -> Result<String, GenerateError> {
            self.seen.lock().expect("seen lock").push(request);
            self.reply.clone()
        }
    }

    fn generator(provider: &Arc<FakeProvider>) -> Generator {
        Generator::new(provider.clone(), GenerateConfig::new("test-key"))
    }

    #[tokio::test]
    async fn blank_description_is_rejected_before_calling_the_provider() {
        let provider = FakeProvider::replying(Ok("unused"));
        let err = generator(&provider)
            .generate(&GenerationRequest::new("   ", PageType::Landing))
            .await
            .expect_err("blank description");
        assert_eq!(err, GenerateError::validation("Description is required"));
        assert_eq!(err.status_code(), 400);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn fenced_completion_is_extracted_and_checked() {
        let provider = FakeProvider::replying(Ok(
            "Here you go!\n```tsx\nexport default function GeneratedPage() {\n  return <div className=\"min-h-screen\">Shop</div>;\n}\n```",
        ));
        let generation = generator(&provider)
            .generate(&GenerationRequest::new("Tea shop", PageType::Landing))
            .await
            .expect("generation");
        assert_eq!(
            generation.source.as_str(),
            "export default function GeneratedPage() {\n  return <div className=\"min-h-screen\">Shop</div>;\n}"
        );
        assert!(generation.verdict.valid);

        let seen = provider.seen.lock().expect("seen lock");
        let request = &seen[0];
        assert_eq!(request.model, "llama-3.3-70b-versatile");
        assert_eq!(request.max_tokens, 3_000);
        assert_eq!(request.messages[0].role, ChatRole::System);
        assert!(request.messages[1].content.starts_with("Generate a landing page for this shop:"));
    }

    #[tokio::test]
    async fn failing_verdict_does_not_fail_the_generation() {
        let provider = FakeProvider::replying(Ok(
            "export default function GeneratedPage(){ return <div style={{color:'red'}}>X</div>; }",
        ));
        let generation = generator(&provider)
            .generate(&GenerationRequest::new("Red shop", PageType::Product))
            .await
            .expect("generation");
        assert!(!generation.verdict.valid);
        assert_eq!(
            generation.verdict.reason.as_deref(),
            Some("no tailwind classes found")
        );
    }

    #[tokio::test]
    async fn empty_completion_is_no_code_generated() {
        let provider = FakeProvider::replying(Ok(""));
        let response = generator(&provider)
            .respond(&GenerationRequest::new("Anything", PageType::Landing))
            .await;
        assert_eq!(response.error.as_deref(), Some("No code generated"));
        assert!(response.code.is_empty());
    }

    #[tokio::test]
    async fn prose_only_completion_fails_extraction() {
        let provider = FakeProvider::replying(Ok("Sorry, I can't help with that."));
        let err = generator(&provider)
            .generate(&GenerationRequest::new("Anything", PageType::Landing))
            .await
            .expect_err("extraction");
        assert!(matches!(err, GenerateError::Extraction(_)));
        assert_eq!(err.to_string(), "doesn't look like valid component code");
    }

    #[tokio::test]
    async fn provider_errors_surface_in_the_response() {
        let provider = FakeProvider::replying(Err(GenerateError::provider("quota exceeded", Some(429))));
        let response = generator(&provider)
            .respond(&GenerationRequest::new("Anything", PageType::Landing))
            .await;
        assert_eq!(response.error.as_deref(), Some("provider error: quota exceeded"));
    }

    #[tokio::test]
    async fn refine_requests_send_the_previous_code() {
        let provider = FakeProvider::replying(Ok("export default function GeneratedPage(){ return <p className=\"text-blue-500\" />; }"));
        let response = generator(&provider)
            .respond(
                &GenerationRequest::new("Make it blue", PageType::Landing)
                    .previous_code("export default function GeneratedPage(){ return <p />; }"),
            )
            .await;
        assert!(response.is_success());
        let seen = provider.seen.lock().expect("seen lock");
        assert!(seen[0].messages[1].content.starts_with("Refine this landing page:"));
    }
}
