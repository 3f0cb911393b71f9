use crate::advisors::{
    AdvisorOptions, AdvisorProviderOptions, GeminiLlmAdvisorOptions, OpenAiCompatibleApi,
    OpenAiLlmAdvisorOptions,
};
use crate::common_types::{ApiKey, GcpProjectId, ModelName};
use crate::errors::AppError;
use clap::*;
use std::fmt::Display;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    #[command(about = "Analyze an invoice image and suggest an accounting journal entry")]
    Analyze {
        #[arg(
            help = "Invoice image such as /tmp/invoice.jpg, file:///tmp/invoice.png or clipboard:// to capture an image from the clipboard"
        )]
        source: String,
        #[arg(
            short = 'o',
            long,
            help = "Export the answer as text to a file, a directory (trailing slash) or clipboard://"
        )]
        output: Option<String>,
        #[arg(short = 'm', long, help = "Maximum size of the invoice image in bytes")]
        max_size_limit: Option<u64>,
        #[arg(
            long,
            help = "Downsize the image before sending so that neither side exceeds this number of pixels"
        )]
        resize_max: Option<u32>,
        #[arg(
            long,
            help = "Run local OCR and include the recognized text in the request",
            default_value = "false"
        )]
        ocr: bool,
        #[arg(
            long,
            help = "Debit account proposed by a student, the answer will include a critique",
            requires = "student_credit"
        )]
        student_debit: Option<String>,
        #[arg(
            long,
            help = "Credit account proposed by a student, the answer will include a critique",
            requires = "student_debit"
        )]
        student_credit: Option<String>,
        #[arg(
            long,
            help = "File with a custom instruction that replaces the default accountant instruction"
        )]
        instruction_file: Option<PathBuf>,

        #[command(flatten)]
        advisor_args: AdvisorArgs,
    },
    #[command(about = "Run local OCR over an invoice image and print the recognized text")]
    Ocr {
        #[arg(help = "Invoice image such as /tmp/invoice.jpg or clipboard://")]
        source: String,
        #[arg(short = 'm', long, help = "Maximum size of the invoice image in bytes")]
        max_size_limit: Option<u64>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvisorType {
    OpenAiLlm,
    XAiLlm,
    GeminiLlm,
}

impl AdvisorType {
    pub fn credential_hint(&self) -> &'static str {
        match self {
            AdvisorType::OpenAiLlm => "--api-key, INVOICE_ADVISOR_API_KEY or OPENAI_API_KEY",
            AdvisorType::XAiLlm => "--api-key, INVOICE_ADVISOR_API_KEY or XAI_API_KEY",
            AdvisorType::GeminiLlm => "--gcp-project-id or GOOGLE_CLOUD_PROJECT",
        }
    }
}

impl std::str::FromStr for AdvisorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open-ai-llm" => Ok(AdvisorType::OpenAiLlm),
            "x-ai-llm" => Ok(AdvisorType::XAiLlm),
            "gemini-llm" => Ok(AdvisorType::GeminiLlm),
            _ => Err(format!("Unknown advisor type: {}", s)),
        }
    }
}

impl Display for AdvisorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdvisorType::OpenAiLlm => write!(f, "open-ai-llm"),
            AdvisorType::XAiLlm => write!(f, "x-ai-llm"),
            AdvisorType::GeminiLlm => write!(f, "gemini-llm"),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct AdvisorArgs {
    #[arg(
        short = 'a',
        long,
        value_enum,
        default_value_t = AdvisorType::XAiLlm,
        help = "Advisor type"
    )]
    pub advisor: AdvisorType,

    #[arg(
        long,
        env = "INVOICE_ADVISOR_API_KEY",
        hide_env_values = true,
        help = "API key for OpenAI-compatible advisors. Falls back to OPENAI_API_KEY or XAI_API_KEY"
    )]
    pub api_key: Option<String>,

    #[arg(long, help = "Model name to use instead of the advisor default")]
    pub model: Option<String>,

    #[arg(
        long,
        help = "Chat completions endpoint URL for OpenAI-compatible advisors"
    )]
    pub endpoint_url: Option<Url>,

    #[arg(
        long,
        help = "Sampling temperature (0 to 2)",
        default_value_t = 0.0
    )]
    pub temperature: f32,

    #[arg(
        long,
        env = "GOOGLE_CLOUD_PROJECT",
        help = "GCP project id that will be used to bill Gemini API calls"
    )]
    pub gcp_project_id: Option<String>,

    #[arg(long, help = "Timeout for the advisor call in seconds. No timeout by default")]
    pub timeout_secs: Option<u64>,
}

impl TryInto<AdvisorOptions> for AdvisorArgs {
    type Error = AppError;

    fn try_into(self) -> Result<AdvisorOptions, Self::Error> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AppError::AdvisorConfigError {
                message: format!(
                    "Temperature should be between 0 and 2, got {}",
                    self.temperature
                ),
            });
        }
        if self.timeout_secs == Some(0) {
            return Err(AppError::AdvisorConfigError {
                message: "Timeout should be at least 1 second".to_string(),
            });
        }
        let provider_options = match self.advisor {
            AdvisorType::OpenAiLlm | AdvisorType::XAiLlm => {
                let api = if self.advisor == AdvisorType::OpenAiLlm {
                    OpenAiCompatibleApi::OpenAi
                } else {
                    OpenAiCompatibleApi::XAi
                };
                let api_key = self
                    .api_key
                    .filter(|key| !key.trim().is_empty())
                    .or_else(|| crate::config_env_var(api.api_key_env_var()).ok())
                    .map(ApiKey::new);
                Ok(AdvisorProviderOptions::OpenAiLlm(OpenAiLlmAdvisorOptions {
                    api,
                    api_key,
                    model: self.model.map(ModelName::new),
                    endpoint_url: self.endpoint_url,
                    temperature: self.temperature,
                }))
            }
            AdvisorType::GeminiLlm => match self.endpoint_url {
                Some(_) => Err(AppError::AdvisorConfigError {
                    message: "Endpoint URL is supported only by OpenAI-compatible advisors"
                        .to_string(),
                }),
                None => Ok(AdvisorProviderOptions::GeminiLlm(GeminiLlmAdvisorOptions {
                    project_id: self.gcp_project_id.map(GcpProjectId::new),
                    gemini_model: self.model.map(|model| model.into()),
                    temperature: self.temperature,
                })),
            },
        }?;
        Ok(AdvisorOptions {
            provider_options,
            timeout: self.timeout_secs.map(Duration::from_secs),
        })
    }
}
