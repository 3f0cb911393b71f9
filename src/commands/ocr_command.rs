use crate::commands::acquire_invoice_image;
use crate::file_converters::{ExtractedText, FileConverters};
use crate::reporter::AppReporter;
use crate::AppResult;
use console::{Style, Term};

pub async fn command_ocr(
    term: &Term,
    source: &str,
    max_size_limit: Option<u64>,
) -> AppResult<ExtractedText> {
    let bold_style = Style::new().bold();
    term.write_line(
        format!(
            "Recognizing text on {}.",
            bold_style.clone().white().apply_to(source)
        )
        .as_str(),
    )?;
    let app_reporter = AppReporter::from(term);
    let invoice_image = acquire_invoice_image(source, max_size_limit, &app_reporter).await?;

    let mut file_converters = FileConverters::new();
    file_converters.init(&app_reporter).await?;
    let extracted_text = file_converters.extract_text(&invoice_image.data);
    if !extracted_text.is_recognized() {
        app_reporter.warn("No text was extracted by OCR")?;
    }
    term.write_line(extracted_text.as_text())?;
    Ok(extracted_text)
}
