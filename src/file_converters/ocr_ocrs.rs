use crate::errors::AppError;
use crate::file_converters::ocr::Ocr;
use crate::reporter::AppReporter;
use crate::AppResult;
use ocrs::{ImageSource, OcrEngine, OcrEngineParams, OcrInput, TextItem};
use std::path::PathBuf;

pub struct Ocrs {
    ocr_engine: OcrEngine,
}

fn ocr_error<E: std::fmt::Display>(err: E) -> AppError {
    AppError::OcrError {
        message: err.to_string(),
    }
}

impl Ocrs {
    pub fn new(app_reporter: &AppReporter<'_>) -> AppResult<Self> {
        let find_models_dir = Self::find_models_dir()?;
        app_reporter.report(format!(
            "Loading OCR models from {}",
            find_models_dir.to_string_lossy()
        ))?;
        let detection_model_path = find_models_dir.join("text-detection.rten");
        let rec_model_path = find_models_dir.join("text-recognition.rten");
        let detection_model = rten::Model::load_file(detection_model_path).map_err(ocr_error)?;
        let recognition_model = rten::Model::load_file(rec_model_path).map_err(ocr_error)?;
        let ocr_engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(ocr_error)?;
        Ok(Self { ocr_engine })
    }

    fn find_models_dir() -> AppResult<PathBuf> {
        let executable = std::env::current_exe()?;
        let current_dir = executable.parent().map(|p| p.to_path_buf());

        [
            current_dir.clone().map(|p| p.join("models").join("ocrs")),
            current_dir
                .clone()
                .and_then(|p| p.parent().map(|p| p.join("share").join("ocrs"))),
            dirs::home_dir().map(|p| p.join(".cache").join("ocrs")),
        ]
        .into_iter()
        .flatten()
        .find(|p| p.exists())
        .ok_or_else(|| AppError::OcrError {
            message: "Could not find OCR models directory".to_string(),
        })
    }
}

impl Ocr for Ocrs {
    fn image_to_text(&self, image: image::DynamicImage) -> AppResult<String> {
        let rgb_image = image.to_rgb8();
        let image_source =
            ImageSource::from_bytes(rgb_image.as_raw(), rgb_image.dimensions()).map_err(ocr_error)?;
        let input: OcrInput = self
            .ocr_engine
            .prepare_input(image_source)
            .map_err(ocr_error)?;
        let word_rects = self.ocr_engine.detect_words(&input).map_err(ocr_error)?;
        let line_rects = self.ocr_engine.find_text_lines(&input, &word_rects);
        let lines: Vec<String> = self
            .ocr_engine
            .recognize_text(&input, &line_rects)
            .map_err(ocr_error)?
            .into_iter()
            .flatten()
            .map(|text_line| {
                text_line
                    .chars()
                    .iter()
                    .map(|c| c.char)
                    .collect::<String>()
                    .trim_end()
                    .to_string()
            })
            .filter(|line| !line.is_empty())
            .collect();
        tracing::debug!(lines = lines.len(), "OCR recognized text lines");
        Ok(lines.join("\n"))
    }
}
