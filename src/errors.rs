use gcloud_sdk::tonic::metadata::errors::InvalidMetadataValue;
use indicatif::style::TemplateError;
use std::time::SystemTimeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unknown file system is specified: {file_path}")]
    UnknownFileSystem { file_path: String },
    #[error("Input/output error: {0}")]
    InputOutputError(#[from] std::io::Error),
    #[error("A credential is required for {advisor}. Provide it with {hint}")]
    CredentialRequired { advisor: String, hint: String },
    #[error("{advisor} responded with HTTP status {status}: {excerpt}")]
    AdvisorApiError {
        advisor: String,
        status: u16,
        excerpt: String,
    },
    #[error("Malformed response from {advisor}: {message}. Response: {excerpt}")]
    MalformedAdvisorResponse {
        advisor: String,
        message: String,
        excerpt: String,
    },
    #[error("Advisor config error: {message}")]
    AdvisorConfigError { message: String },
    #[error("Media type '{media_type}' is not a supported invoice image")]
    UnsupportedMediaType { media_type: String },
    #[error("Invoice image is too large: {file_size} bytes (limit is {max_size_limit} bytes)")]
    FileTooLarge {
        file_size: u64,
        max_size_limit: u64,
    },
    #[error("Google Cloud SDK error:\n{0}")]
    GoogleCloudSdkError(#[from] gcloud_sdk::error::Error),
    #[error("Google Cloud API error:\n{0}")]
    GoogleCloudGrpcError(#[from] gcloud_sdk::tonic::Status),
    #[error("Google Cloud invalid metadata value:\n{0}")]
    GoogleCloudInvalidMetadataValue(#[from] InvalidMetadataValue),
    #[error("HTTP client error:\n{0}")]
    HttpClientError(#[from] reqwest::Error),
    #[error("Template error: {0}")]
    TemplateError(#[from] TemplateError),
    #[error("Image conversion error: {0}")]
    ImageError(#[from] image::ImageError),
    #[cfg(feature = "clipboard")]
    #[error("Clipboard error: {0}")]
    ClipboardError(#[from] arboard::Error),
    #[error("OCR error: {message}")]
    OcrError { message: String },
    #[error("SystemTimeError: {0}")]
    SystemTimeError(#[from] SystemTimeError),
    #[error("System error: {message}")]
    SystemError { message: String },
}
