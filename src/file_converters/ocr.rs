use crate::AppResult;

pub trait Ocr {
    fn image_to_text(&self, image: image::DynamicImage) -> AppResult<String>;
}

/// Outcome of running OCR over an invoice. Extraction never fails the analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedText {
    Recognized(String),
    Unavailable,
}

impl ExtractedText {
    pub const PLACEHOLDER: &'static str = "[No text could be extracted from the invoice image]";

    pub fn from_ocr_result(result: AppResult<String>) -> Self {
        match result {
            Ok(text) if !text.trim().is_empty() => ExtractedText::Recognized(text),
            Ok(_) => {
                tracing::debug!("OCR finished without recognizing any text");
                ExtractedText::Unavailable
            }
            Err(err) => {
                tracing::warn!(error = %err, "OCR failed, continuing with placeholder text");
                ExtractedText::Unavailable
            }
        }
    }

    pub fn as_text(&self) -> &str {
        match self {
            ExtractedText::Recognized(text) => text.as_str(),
            ExtractedText::Unavailable => Self::PLACEHOLDER,
        }
    }

    pub fn is_recognized(&self) -> bool {
        matches!(self, ExtractedText::Recognized(_))
    }
}
