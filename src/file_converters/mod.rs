use crate::reporter::AppReporter;
use crate::AppResult;

pub mod ocr;
pub use ocr::{ExtractedText, Ocr};

#[cfg(feature = "ocr")]
mod ocr_ocrs;

pub struct FileConverters {
    pub ocr: Option<Box<dyn Ocr + 'static>>,
}

impl FileConverters {
    pub fn new() -> Self {
        Self { ocr: None }
    }

    pub fn with_ocr(ocr: Box<dyn Ocr + 'static>) -> Self {
        Self { ocr: Some(ocr) }
    }

    /// Loads the local OCR engine when available. A missing engine is reported, not fatal.
    pub async fn init(&mut self, reporter: &AppReporter<'_>) -> AppResult<()> {
        #[cfg(feature = "ocr")]
        {
            match ocr_ocrs::Ocrs::new(reporter) {
                Ok(ocrs) => {
                    self.ocr = Some(Box::new(ocrs));
                }
                Err(err) => {
                    reporter.warn(format!("OCR is not available: {err}"))?;
                }
            }
        }
        #[cfg(not(feature = "ocr"))]
        {
            reporter.warn("OCR support is not compiled into this build")?;
        }
        Ok(())
    }

    pub fn extract_text(&self, image_bytes: &[u8]) -> ExtractedText {
        match self.ocr {
            Some(ref ocr) => ExtractedText::from_ocr_result(
                image::load_from_memory(image_bytes)
                    .map_err(crate::errors::AppError::from)
                    .and_then(|image| ocr.image_to_text(image)),
            ),
            None => ExtractedText::Unavailable,
        }
    }
}
