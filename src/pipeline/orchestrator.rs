//! Step table and the fold that runs it

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

use super::steps;
use crate::config::{non_empty, AdminConfig};
use crate::mail::{send_verification_email, EmailRequest, Mailer};
use crate::types::TaskResult;

/// What a failed step does to the rest of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log a warning and move on
    Continue,
    /// Stop the run and mark it failed
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    #[value(name = "rename")]
    Rename,
    #[value(name = "vue-globale")]
    VueGlobale,
    #[value(name = "clear-tx")]
    ClearTx,
    #[value(name = "clear-after-tx3")]
    ClearAfterTx3,
    #[value(name = "clear-template")]
    ClearTemplate,
}

/// Execution order of a full run
pub const PIPELINE: [Step; 5] = [
    Step::Rename,
    Step::VueGlobale,
    Step::ClearTx,
    Step::ClearAfterTx3,
    Step::ClearTemplate,
];

impl Step {
    pub fn number(self) -> usize {
        match self {
            Step::Rename => 1,
            Step::VueGlobale => 2,
            Step::ClearTx => 3,
            Step::ClearAfterTx3 => 4,
            Step::ClearTemplate => 5,
        }
    }

    /// Path segment under `/api/step/`
    pub fn slug(self) -> &'static str {
        match self {
            Step::Rename => "rename",
            Step::VueGlobale => "vue-globale",
            Step::ClearTx => "clear-tx",
            Step::ClearAfterTx3 => "clear-after-tx3",
            Step::ClearTemplate => "clear-template",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Step::Rename => "Rename file",
            Step::VueGlobale => "Add Vue Globale row",
            Step::ClearTx => "Clear TX1/TX2/TX3",
            Step::ClearAfterTx3 => "Clear sheets after TX3",
            Step::ClearTemplate => "Clear template",
        }
    }

    pub fn policy(self) -> FailurePolicy {
        match self {
            Step::VueGlobale | Step::ClearTx => FailurePolicy::Abort,
            Step::Rename | Step::ClearAfterTx3 | Step::ClearTemplate => FailurePolicy::Continue,
        }
    }

    pub fn header(self) -> String {
        format!("=== STEP {} : {} ===", self.number(), self.label())
    }

    pub fn run(self, config: &mut AdminConfig, today: NaiveDate) -> TaskResult {
        info!(step = self.slug(), "running step");
        match self {
            Step::Rename => steps::rename_verification_file(config, today),
            Step::VueGlobale => steps::add_date_row(config, today),
            Step::ClearTx => steps::clear_tx_sheets(config),
            Step::ClearAfterTx3 => steps::clear_sheets_after_tx3(config),
            Step::ClearTemplate => steps::clear_template(config),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Run a single step outside the pipeline.
pub fn run_step(step: Step, config: &mut AdminConfig, today: NaiveDate) -> TaskResult {
    step.run(config, today)
}

/// Run all five steps in order, folding each step's trail under its header.
pub fn run_all(config: &mut AdminConfig, today: NaiveDate) -> TaskResult {
    run_pipeline(config, today, Step::run)
}

/// The fold behind [`run_all`], with the step runner as a parameter.
fn run_pipeline<F>(config: &mut AdminConfig, today: NaiveDate, mut run: F) -> TaskResult
where
    F: FnMut(Step, &mut AdminConfig, NaiveDate) -> TaskResult,
{
    let folded = PIPELINE
        .iter()
        .try_fold(TaskResult::new(), |mut acc, &step| {
            let outcome = run(step, config, today);
            acc.log(step.header());
            acc.extend_logs(&outcome);

            if outcome.success {
                return Ok(acc);
            }
            match step.policy() {
                FailurePolicy::Continue => {
                    warn!(step = step.slug(), error = %outcome.message, "step failed, continuing");
                    acc.log(format!("⚠️ {} (processing continued)", outcome.message));
                    Ok(acc)
                }
                FailurePolicy::Abort => {
                    warn!(step = step.slug(), error = %outcome.message, "step failed, aborting");
                    acc.log(format!("❌ {}", outcome.message));
                    acc.success = false;
                    acc.message = format!("Step {} failed: {}", step.number(), outcome.message);
                    Err(acc)
                }
            }
        });

    match folded {
        Ok(mut acc) => {
            acc.success = true;
            acc.message = "Excel processing completed successfully".to_string();
            acc
        }
        Err(aborted) => aborted,
    }
}

/// Run the pipeline and, only if it succeeded, email the verification file.
pub fn run_complete(
    config: &mut AdminConfig,
    mailer: &dyn Mailer,
    today: NaiveDate,
    email_to: Option<String>,
    email_subject: Option<String>,
) -> TaskResult {
    let mut excel = run_all(config, today);
    if !excel.success {
        excel.message = format!("Excel processing error: {}", excel.message);
        return excel;
    }

    let request = EmailRequest {
        to: email_to,
        subject: non_empty(&email_subject).map(str::to_string),
        ..EmailRequest::default()
    };
    let email = send_verification_email(config, mailer, today, &request);

    excel.log("=== STEP 6 : Send email ===");
    excel.extend_logs(&email);
    excel.success = email.success;
    excel.message = if email.success {
        "Complete workflow finished successfully".to_string()
    } else {
        format!("Excel OK, but email error: {}", email.message)
    };
    excel
}
