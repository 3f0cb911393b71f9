use rvstruct::ValueStruct;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::advisors::{
    credential_required, response_excerpt, Advisor, AdvisorRequest, AdvisorResponse,
};
use crate::args::AdvisorType;
use crate::common_types::{ApiKey, ModelName};
use crate::errors::AppError;
use crate::reporter::AppReporter;
use crate::AppResult;

/// Chat completion APIs that share the OpenAI wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAiCompatibleApi {
    OpenAi,
    XAi,
}

impl OpenAiCompatibleApi {
    pub fn advisor_type(&self) -> AdvisorType {
        match self {
            OpenAiCompatibleApi::OpenAi => AdvisorType::OpenAiLlm,
            OpenAiCompatibleApi::XAi => AdvisorType::XAiLlm,
        }
    }

    pub fn default_endpoint_url(&self) -> &'static str {
        match self {
            OpenAiCompatibleApi::OpenAi => "https://api.openai.com/v1/chat/completions",
            OpenAiCompatibleApi::XAi => "https://api.x.ai/v1/chat/completions",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            OpenAiCompatibleApi::OpenAi => "gpt-4o-mini",
            OpenAiCompatibleApi::XAi => "grok-2-vision-latest",
        }
    }

    pub fn api_key_env_var(&self) -> &'static str {
        match self {
            OpenAiCompatibleApi::OpenAi => "OPENAI_API_KEY",
            OpenAiCompatibleApi::XAi => "XAI_API_KEY",
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiLlmAdvisorOptions {
    pub api: OpenAiCompatibleApi,
    pub api_key: Option<ApiKey>,
    pub model: Option<ModelName>,
    pub endpoint_url: Option<Url>,
    pub temperature: f32,
}

#[derive(Clone)]
pub struct OpenAiLlmAdvisor<'a> {
    client: reqwest::Client,
    open_ai_llm_options: OpenAiLlmAdvisorOptions,
    api_key: ApiKey,
    #[allow(dead_code)]
    reporter: &'a AppReporter<'a>,
}

#[derive(Serialize, Clone, Debug)]
struct OpenAiLlmAnalyzeRequest {
    model: String,
    messages: Vec<OpenAiLlmAnalyzeMessage>,
    temperature: f32,
}

#[derive(Serialize, Clone, Debug)]
struct OpenAiLlmAnalyzeMessage {
    role: String,
    content: Vec<OpenAiLlmContentPart>,
}

#[derive(Serialize, Clone, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OpenAiLlmContentPart {
    Text { text: String },
    ImageUrl { image_url: OpenAiLlmImageUrl },
}

#[derive(Serialize, Clone, Debug)]
struct OpenAiLlmImageUrl {
    url: String,
}

#[derive(Deserialize, Clone, Debug)]
struct OpenAiLlmAnalyzeResponse {
    choices: Vec<OpenAiLlmAnalyzeChoice>,
}

#[derive(Deserialize, Clone, Debug)]
struct OpenAiLlmAnalyzeChoice {
    message: OpenAiLlmResponseMessage,
}

#[derive(Deserialize, Clone, Debug)]
struct OpenAiLlmResponseMessage {
    content: Option<String>,
}

impl<'a> OpenAiLlmAdvisor<'a> {
    pub async fn new(
        open_ai_llm_options: OpenAiLlmAdvisorOptions,
        timeout: Option<Duration>,
        reporter: &'a AppReporter<'a>,
    ) -> AppResult<Self> {
        let api_key = open_ai_llm_options
            .api_key
            .clone()
            .filter(|api_key| !api_key.is_blank())
            .ok_or_else(|| credential_required(open_ai_llm_options.api.advisor_type()))?;
        let client = match timeout {
            Some(timeout) => reqwest::Client::builder().timeout(timeout).build()?,
            None => reqwest::Client::new(),
        };
        Ok(Self {
            client,
            open_ai_llm_options,
            api_key,
            reporter,
        })
    }

    fn endpoint_url(&self) -> String {
        self.open_ai_llm_options
            .endpoint_url
            .as_ref()
            .map(|url| url.to_string())
            .unwrap_or_else(|| self.open_ai_llm_options.api.default_endpoint_url().to_string())
    }

    fn model_name(&self) -> String {
        self.open_ai_llm_options
            .model
            .as_ref()
            .map(|v| v.value().clone())
            .unwrap_or_else(|| self.open_ai_llm_options.api.default_model().to_string())
    }

    fn malformed_response(&self, message: String, response_text: &str) -> AppError {
        AppError::MalformedAdvisorResponse {
            advisor: self.advisor_type().to_string(),
            message,
            excerpt: response_excerpt(response_text),
        }
    }
}

impl<'a> Advisor for OpenAiLlmAdvisor<'a> {
    async fn analyze(&self, request: AdvisorRequest) -> AppResult<AdvisorResponse> {
        let analyze_request = OpenAiLlmAnalyzeRequest {
            model: self.model_name(),
            messages: vec![OpenAiLlmAnalyzeMessage {
                role: "user".to_string(),
                content: vec![
                    OpenAiLlmContentPart::Text {
                        text: request.instruction,
                    },
                    OpenAiLlmContentPart::ImageUrl {
                        image_url: OpenAiLlmImageUrl {
                            url: request.image.to_data_url(),
                        },
                    },
                ],
            }],
            temperature: self.open_ai_llm_options.temperature,
        };
        let endpoint_url = self.endpoint_url();
        tracing::info!(
            advisor = %self.advisor_type(),
            model = %analyze_request.model,
            endpoint = %endpoint_url,
            image_bytes = request.image.data.len(),
            "Sending invoice analysis request"
        );
        let response = self
            .client
            .post(endpoint_url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.value()),
            )
            .json(&analyze_request)
            .send()
            .await?;

        let response_status = response.status();
        let response_text = response.text().await?;
        if !response_status.is_success() {
            tracing::debug!(status = %response_status, "Invoice analysis request failed");
            return Err(AppError::AdvisorApiError {
                advisor: self.advisor_type().to_string(),
                status: response_status.as_u16(),
                excerpt: response_excerpt(&response_text),
            });
        }

        let open_ai_response: OpenAiLlmAnalyzeResponse = serde_json::from_str(&response_text)
            .map_err(|e| self.malformed_response(e.to_string(), &response_text))?;
        match open_ai_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
        {
            Some(content) => Ok(AdvisorResponse { text: content }),
            None => Err(self.malformed_response(
                "No text content in the response".to_string(),
                &response_text,
            )),
        }
    }

    fn advisor_type(&self) -> AdvisorType {
        self.open_ai_llm_options.api.advisor_type()
    }
}
