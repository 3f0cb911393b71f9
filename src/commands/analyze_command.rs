use crate::advisors::{
    Advisor, AdvisorOptions, AdvisorRequest, Advisors, InvoiceImage, InvoicePrompt,
};
use crate::common_types::StudentJournalEntry;
use crate::errors::AppError;
use crate::file_converters::FileConverters;
use crate::file_systems::{download_all, DetectFileSystem, FileSystemConnection, FileSystemRef};
use crate::reporter::AppReporter;
use crate::AppResult;
use bytes::Bytes;
use console::{Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use rvstruct::ValueStruct;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct AnalyzeCommandOptions {
    pub max_size_limit: Option<u64>,
    pub resize_max: Option<u32>,
    pub ocr_enabled: bool,
    pub student_entry: Option<StudentJournalEntry>,
    pub instruction: Option<String>,
    pub output: Option<String>,
}

impl AnalyzeCommandOptions {
    #[allow(clippy::too_many_arguments)]
    pub async fn new(
        max_size_limit: Option<u64>,
        resize_max: Option<u32>,
        ocr_enabled: bool,
        student_debit: Option<String>,
        student_credit: Option<String>,
        instruction_file: Option<PathBuf>,
        output: Option<String>,
    ) -> AppResult<Self> {
        let student_entry = match (student_debit, student_credit) {
            (Some(debit), Some(credit)) => Some(
                StudentJournalEntry::new(&debit, &credit)
                    .map_err(|message| AppError::AdvisorConfigError { message })?,
            ),
            (None, None) => None,
            _ => {
                return Err(AppError::AdvisorConfigError {
                    message: "Both student debit and credit accounts are required".to_string(),
                })
            }
        };
        let instruction = match instruction_file {
            Some(path) => Some(tokio::fs::read_to_string(path).await?),
            None => None,
        };
        Ok(Self {
            max_size_limit,
            resize_max,
            ocr_enabled,
            student_entry,
            instruction,
            output,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyzeCommandResult {
    Answered {
        text: String,
        exported_to: Option<String>,
        export_error: Option<String>,
    },
    Failed {
        message: String,
    },
}

pub async fn command_analyze(
    term: &Term,
    source: &str,
    options: AnalyzeCommandOptions,
    advisor_options: AdvisorOptions,
) -> AppResult<AnalyzeCommandResult> {
    let bold_style = Style::new().bold();
    advisor_options.check_credentials()?;

    term.write_line(
        format!(
            "Analyzing {} using {}.",
            bold_style.clone().white().apply_to(source),
            bold_style.clone().green().apply_to(&advisor_options)
        )
        .as_str(),
    )?;
    let app_reporter = AppReporter::from(term);

    let invoice_image =
        acquire_invoice_image(source, options.max_size_limit, &app_reporter).await?;
    let invoice_image = match options.resize_max {
        Some(max_dimension) => invoice_image.resize_to_fit(max_dimension)?,
        None => invoice_image,
    };

    let extracted_text = if options.ocr_enabled {
        let mut file_converters = FileConverters::new();
        file_converters.init(&app_reporter).await?;
        let extracted_text = file_converters.extract_text(&invoice_image.data);
        if !extracted_text.is_recognized() {
            app_reporter.warn("No text was extracted by OCR, continuing with a placeholder")?;
        }
        Some(extracted_text)
    } else {
        None
    };

    let prompt = InvoicePrompt {
        instruction: options.instruction.clone(),
        extracted_text,
        student_entry: options.student_entry.clone(),
    };
    let source_file_ref = invoice_image.file_ref.clone();
    let request = AdvisorRequest {
        image: invoice_image,
        instruction: prompt.to_instruction_text(),
    };

    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {msg}",
    )?);
    bar.set_message(format!("Waiting for {} to answer...", advisor_options));
    bar.enable_steady_tick(Duration::from_millis(100));
    let bar_reporter = AppReporter::from(&bar);
    let analyze_result = match Advisors::new_advisor(&advisor_options, &bar_reporter).await {
        Ok(advisor) => advisor.analyze(request).await,
        Err(err) => Err(err),
    };
    bar.finish_and_clear();

    match analyze_result {
        Ok(response) => {
            let (exported_to, export_error) = match options.output {
                Some(ref output) => {
                    match export_answer(output, &source_file_ref, &response.text, &app_reporter)
                        .await
                    {
                        Ok(exported_to) => (Some(exported_to), None),
                        Err(err) => {
                            tracing::debug!(error = ?err, destination = %output, "Export failed");
                            (None, Some(err.to_string()))
                        }
                    }
                }
                None => (None, None),
            };
            Ok(AnalyzeCommandResult::Answered {
                text: response.text,
                exported_to,
                export_error,
            })
        }
        Err(err) => {
            tracing::debug!(error = ?err, "Invoice analysis failed");
            Ok(AnalyzeCommandResult::Failed {
                message: err.to_string(),
            })
        }
    }
}

pub fn render_analyze_result(term: &Term, result: &AnalyzeCommandResult) -> AppResult<()> {
    term.write_line(format_analyze_result(result).as_str())?;
    Ok(())
}

pub fn format_analyze_result(result: &AnalyzeCommandResult) -> String {
    let bold_style = Style::new().bold();
    match result {
        AnalyzeCommandResult::Answered {
            text,
            exported_to,
            export_error,
        } => {
            let mut lines = vec![
                format!("{}", bold_style.clone().green().apply_to("Suggested journal entry:")),
                text.clone(),
            ];
            if let Some(exported_to) = exported_to {
                lines.push(format!(
                    "Answer exported to {}",
                    bold_style.clone().white().apply_to(exported_to)
                ));
            }
            if let Some(export_error) = export_error {
                lines.push(format!(
                    "{}: {}",
                    bold_style.clone().yellow().apply_to("Export failed"),
                    export_error
                ));
            }
            lines.join("\n")
        }
        AnalyzeCommandResult::Failed { message } => format!(
            "{}: {}\nCheck the credential and the connection, then run the command again.",
            bold_style.clone().red().apply_to("Analysis failed"),
            message
        ),
    }
}

pub(crate) async fn acquire_invoice_image(
    source: &str,
    max_size_limit: Option<u64>,
    reporter: &AppReporter<'_>,
) -> AppResult<InvoiceImage> {
    let mut source_fs = DetectFileSystem::open(source, reporter).await?;
    let (file_ref, data) = download_all(&mut source_fs, None, max_size_limit).await?;
    source_fs.close().await?;
    let invoice_image = InvoiceImage::new(file_ref, data)?;
    tracing::debug!(
        file = %invoice_image.file_ref.relative_path.value(),
        media_type = %invoice_image.mime_type,
        size = invoice_image.data.len(),
        "Acquired invoice image"
    );
    Ok(invoice_image)
}

async fn export_answer(
    destination: &str,
    source_file_ref: &FileSystemRef,
    text: &str,
    reporter: &AppReporter<'_>,
) -> AppResult<String> {
    let mut destination_fs = DetectFileSystem::open(destination, reporter).await?;
    let bytes = Bytes::from(text.to_string());
    let dest_file_ref = FileSystemRef {
        relative_path: format!(
            "{}-journal-entry.txt",
            source_file_ref.relative_path.file_stem()
        )
        .into(),
        media_type: Some(mime::TEXT_PLAIN),
        file_size: Some(bytes.len() as u64),
    };
    let exported_to = destination_fs.resolve(Some(&dest_file_ref)).file_path;
    destination_fs
        .upload(
            futures::stream::iter(vec![Ok(bytes)]),
            Some(&dest_file_ref),
        )
        .await?;
    destination_fs.close().await?;
    Ok(exported_to)
}
