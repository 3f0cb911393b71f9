use clap::Parser;
use console::{Style, Term};

use std::error::Error;

mod args;
use crate::commands::*;
use crate::errors::AppError;
use args::*;

mod reporter;

mod file_systems;

mod file_converters;

mod errors;

mod commands;

mod advisors;

pub type AppResult<T> = Result<T, AppError>;

mod common_types;

#[cfg(test)]
mod test_support;

pub fn config_env_var(name: &str) -> Result<String, String> {
    std::env::var(name).map_err(|e| format!("{}: {}", name, e))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = rustls::crypto::ring::default_provider().install_default();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let term = Term::stdout();
    let bold_style = Style::new().bold();

    term.write_line(
        format!(
            "{} v{}",
            bold_style.clone().green().apply_to("Invoice Advisor"),
            bold_style.apply_to(env!("CARGO_PKG_VERSION"))
        )
        .as_str(),
    )?;

    let cli = CliArgs::parse();
    if let Err(err) = handle_args(cli, &term).await {
        tracing::debug!(error = ?err, "Command failed");
        term.write_line(
            format!(
                "{}: {}\nDetails: {:?}",
                bold_style.clone().red().apply_to("Error"),
                err,
                err.source()
            )
            .as_str(),
        )?;
        std::process::exit(1);
    }

    Ok(())
}

async fn handle_args(cli: CliArgs, term: &Term) -> AppResult<()> {
    match cli.command {
        CliCommand::Analyze {
            source,
            output,
            max_size_limit,
            resize_max,
            ocr,
            student_debit,
            student_credit,
            instruction_file,
            advisor_args,
        } => {
            let options = AnalyzeCommandOptions::new(
                max_size_limit,
                resize_max,
                ocr,
                student_debit,
                student_credit,
                instruction_file,
                output,
            )
            .await?;
            let analyze_result =
                command_analyze(term, &source, options, advisor_args.try_into()?).await?;
            render_analyze_result(term, &analyze_result)?;
            if let AnalyzeCommandResult::Failed { .. } = analyze_result {
                std::process::exit(2);
            }
        }
        CliCommand::Ocr {
            source,
            max_size_limit,
        } => {
            command_ocr(term, &source, max_size_limit).await?;
        }
    }

    Ok(())
}
