use crate::args::AdvisorType;
use crate::common_types::ApiKey;
use crate::errors::AppError;
use crate::reporter::AppReporter;
use crate::AppResult;
use rvstruct::ValueStruct;
use std::fmt::Display;
use std::time::Duration;

mod invoice_image;
pub use invoice_image::*;

mod prompt;
pub use prompt::*;

mod open_ai_llm;
pub use open_ai_llm::*;

mod gemini_llm;
pub use gemini_llm::*;

#[derive(Debug, Clone)]
pub struct AdvisorRequest {
    pub image: InvoiceImage,
    pub instruction: String,
}

/// Free-text answer of the remote model, kept exactly as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisorResponse {
    pub text: String,
}

#[derive(Clone)]
pub enum Advisors<'a> {
    OpenAiLlm(OpenAiLlmAdvisor<'a>),
    GeminiLlm(GeminiLlmAdvisor<'a>),
}

#[derive(Debug, Clone)]
pub struct AdvisorOptions {
    pub provider_options: AdvisorProviderOptions,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub enum AdvisorProviderOptions {
    OpenAiLlm(OpenAiLlmAdvisorOptions),
    GeminiLlm(GeminiLlmAdvisorOptions),
}

impl AdvisorOptions {
    pub fn advisor_type(&self) -> AdvisorType {
        match self.provider_options {
            AdvisorProviderOptions::OpenAiLlm(ref options) => options.api.advisor_type(),
            AdvisorProviderOptions::GeminiLlm(_) => AdvisorType::GeminiLlm,
        }
    }

    /// Fails with [`AppError::CredentialRequired`] when the credential is missing or blank.
    pub fn check_credentials(&self) -> AppResult<()> {
        let has_credential = match self.provider_options {
            AdvisorProviderOptions::OpenAiLlm(ref options) => options
                .api_key
                .as_ref()
                .is_some_and(|api_key| !api_key.is_blank()),
            AdvisorProviderOptions::GeminiLlm(ref options) => options
                .project_id
                .as_ref()
                .is_some_and(|project_id| !project_id.value().trim().is_empty()),
        };
        if has_credential {
            Ok(())
        } else {
            Err(credential_required(self.advisor_type()))
        }
    }
}

impl Display for AdvisorOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.advisor_type())
    }
}

impl<'a> Advisors<'a> {
    pub async fn new_advisor(
        advisor_options: &AdvisorOptions,
        reporter: &'a AppReporter<'a>,
    ) -> AppResult<Self> {
        advisor_options.check_credentials()?;
        match advisor_options.provider_options {
            AdvisorProviderOptions::OpenAiLlm(ref options) => Ok(Advisors::OpenAiLlm(
                OpenAiLlmAdvisor::new(options.clone(), advisor_options.timeout, reporter).await?,
            )),
            AdvisorProviderOptions::GeminiLlm(ref options) => Ok(Advisors::GeminiLlm(
                GeminiLlmAdvisor::new(options.clone(), advisor_options.timeout, reporter).await?,
            )),
        }
    }
}

pub trait Advisor {
    async fn analyze(&self, request: AdvisorRequest) -> AppResult<AdvisorResponse>;

    fn advisor_type(&self) -> AdvisorType;
}

impl<'a> Advisor for Advisors<'a> {
    async fn analyze(&self, request: AdvisorRequest) -> AppResult<AdvisorResponse> {
        match self {
            Advisors::OpenAiLlm(advisor) => advisor.analyze(request).await,
            Advisors::GeminiLlm(advisor) => advisor.analyze(request).await,
        }
    }

    fn advisor_type(&self) -> AdvisorType {
        match self {
            Advisors::OpenAiLlm(advisor) => advisor.advisor_type(),
            Advisors::GeminiLlm(advisor) => advisor.advisor_type(),
        }
    }
}

pub fn credential_required(advisor_type: AdvisorType) -> AppError {
    AppError::CredentialRequired {
        advisor: advisor_type.to_string(),
        hint: advisor_type.credential_hint().to_string(),
    }
}

const RESPONSE_EXCERPT_MAX_CHARS: usize = 300;

/// Shortens a response body for error messages.
pub fn response_excerpt(response_text: &str) -> String {
    let trimmed = response_text.trim();
    if trimmed.is_empty() {
        return "<empty response>".to_string();
    }
    let mut chars = trimmed.chars();
    let excerpt: String = chars.by_ref().take(RESPONSE_EXCERPT_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{excerpt}...")
    } else {
        excerpt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common_types::GcpProjectId;

    fn open_ai_options(api_key: Option<&str>) -> AdvisorOptions {
        AdvisorOptions {
            provider_options: AdvisorProviderOptions::OpenAiLlm(OpenAiLlmAdvisorOptions {
                api: OpenAiCompatibleApi::XAi,
                api_key: api_key.map(|key| ApiKey::new(key.to_string())),
                model: None,
                endpoint_url: None,
                temperature: 0.0,
            }),
            timeout: None,
        }
    }

    #[test]
    fn test_check_credentials() {
        assert!(open_ai_options(Some("xai-key")).check_credentials().is_ok());
        for missing in [None, Some(""), Some("   ")] {
            match open_ai_options(missing).check_credentials() {
                Err(AppError::CredentialRequired { advisor, hint }) => {
                    assert_eq!(advisor, "x-ai-llm");
                    assert!(hint.contains("--api-key"));
                }
                other => panic!("Unexpected result: {other:?}"),
            }
        }
    }

    #[test]
    fn test_check_gemini_credentials() {
        let options = |project_id: Option<&str>| AdvisorOptions {
            provider_options: AdvisorProviderOptions::GeminiLlm(GeminiLlmAdvisorOptions {
                project_id: project_id.map(|id| GcpProjectId::new(id.to_string())),
                gemini_model: None,
                temperature: 0.0,
            }),
            timeout: None,
        };
        assert!(options(Some("my-project")).check_credentials().is_ok());
        match options(Some(" ")).check_credentials() {
            Err(err @ AppError::CredentialRequired { .. }) => {
                let message = err.to_string();
                assert!(message.contains("--gcp-project-id"));
                assert!(!message.contains("--api-key"));
            }
            other => panic!("Unexpected result: {other:?}"),
        }
        assert!(matches!(
            options(None).check_credentials(),
            Err(AppError::CredentialRequired { .. })
        ));
    }

    #[tokio::test]
    async fn test_new_advisor_requires_credentials() {
        let term = console::Term::stdout();
        let reporter = AppReporter::from(&term);
        let result = Advisors::new_advisor(&open_ai_options(Some("")), &reporter).await;
        assert!(matches!(result, Err(AppError::CredentialRequired { .. })));
    }

    #[test]
    fn test_response_excerpt() {
        assert_eq!(response_excerpt("  {\"error\": \"bad key\"}\n"), "{\"error\": \"bad key\"}");
        assert_eq!(response_excerpt(""), "<empty response>");

        let long_body = "é".repeat(RESPONSE_EXCERPT_MAX_CHARS + 10);
        let excerpt = response_excerpt(&long_body);
        assert!(excerpt.ends_with("..."));
        assert_eq!(excerpt.chars().count(), RESPONSE_EXCERPT_MAX_CHARS + 3);
    }
}
