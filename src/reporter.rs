use crate::AppResult;
use console::Term;
use indicatif::ProgressBar;

/// Routes progress messages to the terminal, or above the spinner while a call is in flight.
#[derive(Debug, Clone)]
pub struct AppReporter<'a> {
    inner: AppReporterInner<'a>,
}

impl<'a> AppReporter<'a> {
    pub fn report<S>(&self, message: S) -> AppResult<()>
    where
        S: AsRef<str>,
    {
        tracing::debug!(message = message.as_ref(), "report");
        match &self.inner {
            AppReporterInner::Term(term) => Ok(term.write_line(message.as_ref())?),
            AppReporterInner::ProgressBar(progress_bar) => {
                progress_bar.println(message.as_ref());
                Ok(())
            }
        }
    }

    pub fn warn<S>(&self, message: S) -> AppResult<()>
    where
        S: AsRef<str>,
    {
        tracing::debug!(message = message.as_ref(), "warning");
        self.report(format!(
            "{} {}",
            console::style("!").yellow().bold(),
            message.as_ref()
        ))
    }
}

#[derive(Debug, Clone)]
enum AppReporterInner<'a> {
    Term(&'a Term),
    ProgressBar(&'a ProgressBar),
}

impl<'a> From<&'a Term> for AppReporter<'a> {
    fn from(term: &'a Term) -> Self {
        AppReporter {
            inner: AppReporterInner::Term(term),
        }
    }
}

impl<'a> From<&'a ProgressBar> for AppReporter<'a> {
    fn from(progress_bar: &'a ProgressBar) -> Self {
        AppReporter {
            inner: AppReporterInner::ProgressBar(progress_bar),
        }
    }
}
