use crate::advisors::{credential_required, Advisor, AdvisorRequest, AdvisorResponse};
use crate::args::AdvisorType;
use crate::common_types::GcpProjectId;
use crate::errors::AppError;
use crate::reporter::AppReporter;
use crate::AppResult;
use gcloud_sdk::google::ai::generativelanguage::v1beta::generative_service_client::GenerativeServiceClient;
use gcloud_sdk::google::ai::generativelanguage::v1beta::{
    part, safety_setting, Blob, Content, GenerateContentRequest, GenerationConfig, HarmCategory,
    Part, SafetySetting,
};
use gcloud_sdk::{tonic, GoogleApi, GoogleAuthMiddleware};
use rvstruct::ValueStruct;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct GeminiLlmAdvisorOptions {
    pub project_id: Option<GcpProjectId>,
    pub gemini_model: Option<GeminiLlmModelName>,
    pub temperature: f32,
}

#[derive(Debug, Clone, ValueStruct)]
pub struct GeminiLlmModelName(String);

#[derive(Clone)]
pub struct GeminiLlmAdvisor<'a> {
    client: GoogleApi<GenerativeServiceClient<GoogleAuthMiddleware>>,
    gemini_llm_options: GeminiLlmAdvisorOptions,
    project_id: GcpProjectId,
    timeout: Option<Duration>,
    #[allow(dead_code)]
    reporter: &'a AppReporter<'a>,
}

impl<'a> GeminiLlmAdvisor<'a> {
    const DEFAULT_GEMINI_MODEL: &'static str = "models/gemini-1.5-flash";

    pub async fn new(
        gemini_llm_options: GeminiLlmAdvisorOptions,
        timeout: Option<Duration>,
        reporter: &'a AppReporter<'a>,
    ) -> AppResult<Self> {
        let project_id = gemini_llm_options
            .project_id
            .clone()
            .filter(|project_id| !project_id.value().trim().is_empty())
            .ok_or_else(|| credential_required(AdvisorType::GeminiLlm))?;
        let client = GoogleApi::from_function_with_scopes(
            GenerativeServiceClient::new,
            "https://generativelanguage.googleapis.com",
            None,
            vec![
                "https://www.googleapis.com/auth/cloud-platform".to_string(),
                "https://www.googleapis.com/auth/generative-language".to_string(),
            ],
        )
        .await?;
        Ok(GeminiLlmAdvisor {
            client,
            gemini_llm_options,
            project_id,
            timeout,
            reporter,
        })
    }

    fn model_name(&self) -> String {
        self.gemini_llm_options
            .gemini_model
            .as_ref()
            .map(|model_name| model_name.value().to_string())
            .unwrap_or_else(|| Self::DEFAULT_GEMINI_MODEL.to_string())
    }
}

impl<'a> Advisor for GeminiLlmAdvisor<'a> {
    async fn analyze(&self, request: AdvisorRequest) -> AppResult<AdvisorResponse> {
        let model_name = self.model_name();
        tracing::info!(
            advisor = %self.advisor_type(),
            model = %model_name,
            image_bytes = request.image.data.len(),
            "Sending invoice analysis request"
        );
        let mut grpc_request = tonic::Request::new(GenerateContentRequest {
            model: model_name,
            safety_settings: [
                HarmCategory::HateSpeech,
                HarmCategory::SexuallyExplicit,
                HarmCategory::DangerousContent,
                HarmCategory::Harassment,
            ]
            .into_iter()
            .map(|category| SafetySetting {
                category: category.into(),
                threshold: safety_setting::HarmBlockThreshold::BlockNone.into(),
                ..std::default::Default::default()
            })
            .collect(),
            contents: vec![Content {
                parts: vec![
                    Part {
                        data: Some(part::Data::Text(request.instruction)),
                        ..std::default::Default::default()
                    },
                    Part {
                        data: Some(part::Data::InlineData(Blob {
                            mime_type: request.image.mime_type.to_string(),
                            data: request.image.data.to_vec(),
                        })),
                        ..std::default::Default::default()
                    },
                ],
                role: "user".to_string(),
                ..std::default::Default::default()
            }],
            generation_config: Some(GenerationConfig {
                candidate_count: Some(1),
                temperature: Some(self.gemini_llm_options.temperature),
                ..std::default::Default::default()
            }),
            ..std::default::Default::default()
        });
        grpc_request.metadata_mut().insert(
            "x-goog-user-project",
            tonic::metadata::MetadataValue::<tonic::metadata::Ascii>::try_from(
                self.project_id.value().as_str(),
            )?,
        );
        if let Some(timeout) = self.timeout {
            grpc_request.set_timeout(timeout);
        }
        let response = self.client.get().generate_content(grpc_request).await?;

        let inner = response.into_inner();
        match inner.candidates.first().and_then(|c| c.content.as_ref()) {
            Some(content) => {
                let text = content
                    .parts
                    .iter()
                    .fold("".to_string(), |acc, entity| match &entity.data {
                        Some(part::Data::Text(text)) => acc + text,
                        _ => acc,
                    });
                if text.is_empty() {
                    Err(AppError::MalformedAdvisorResponse {
                        advisor: self.advisor_type().to_string(),
                        message: "No text content in the response".to_string(),
                        excerpt: crate::advisors::response_excerpt(&format!("{:?}", content)),
                    })
                } else {
                    Ok(AdvisorResponse { text })
                }
            }
            None => Err(AppError::MalformedAdvisorResponse {
                advisor: self.advisor_type().to_string(),
                message: "No content item in the response".to_string(),
                excerpt: crate::advisors::response_excerpt(&format!("{:?}", inner)),
            }),
        }
    }

    fn advisor_type(&self) -> AdvisorType {
        AdvisorType::GeminiLlm
    }
}

#[cfg(test)]
#[allow(unused_imports)]
mod tests {
    use super::*;
    use crate::advisors::{InvoiceImage, DEFAULT_INSTRUCTION};
    use crate::file_systems::FileSystemRef;
    use console::Term;

    #[tokio::test]
    async fn new_requires_project_id() {
        let term = Term::stdout();
        let reporter: AppReporter = AppReporter::from(&term);
        let result = GeminiLlmAdvisor::new(
            GeminiLlmAdvisorOptions {
                project_id: Some(GcpProjectId::new("".to_string())),
                gemini_model: None,
                temperature: 0.0,
            },
            None,
            &reporter,
        )
        .await;
        assert!(matches!(result, Err(AppError::CredentialRequired { .. })));
    }

    #[tokio::test]
    #[cfg_attr(not(feature = "ci-gcp-llm"), ignore)]
    async fn analyze_invoice_test() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let term = Term::stdout();
        let reporter: AppReporter = AppReporter::from(&term);
        let test_gcp_project_id =
            std::env::var("TEST_GCP_PROJECT").expect("TEST_GCP_PROJECT required");
        let image_data = tokio::fs::read("test-fixtures/media/invoice-example.png").await?;

        let advisor = GeminiLlmAdvisor::new(
            GeminiLlmAdvisorOptions {
                project_id: Some(GcpProjectId::new(test_gcp_project_id)),
                gemini_model: None,
                temperature: 0.0,
            },
            None,
            &reporter,
        )
        .await?;

        let response = advisor
            .analyze(AdvisorRequest {
                image: InvoiceImage::new(
                    FileSystemRef {
                        relative_path: "invoice-example.png".into(),
                        media_type: Some(mime::IMAGE_PNG),
                        file_size: Some(image_data.len() as u64),
                    },
                    image_data.into(),
                )?,
                instruction: DEFAULT_INSTRUCTION.to_string(),
            })
            .await?;
        assert!(!response.text.trim().is_empty());

        Ok(())
    }
}
