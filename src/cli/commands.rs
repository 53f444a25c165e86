use crate::config::AdminConfig;
use crate::error::AdminResult;
use crate::mail::{send_verification_email, EmailRequest, Mailer, SmtpMailer};
use crate::pipeline::{self, Step};
use crate::types::TaskResult;
use chrono::{Local, NaiveDate};
use colored::Colorize;
use regex::{Captures, Regex};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use tracing::warn;

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Print a result trail, coloured by outcome
pub fn print_result(result: &TaskResult) {
    for line in &result.logs {
        if line.starts_with("===") {
            println!("{}", line.bold().cyan());
        } else {
            println!("   {}", line);
        }
    }
    println!();
    if result.success {
        println!("{}", format!("✅ {}", result.message).bold().green());
    } else {
        println!("{}", format!("❌ {}", result.message).bold().red());
    }
}

fn verification_file_line() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?m)^([ \t]*verification_file[ \t]*:[ \t]*)[^\n#]*?([ \t]+#[^\n]*)?$")
            .expect("valid verification_file regex")
    })
}

/// Point the `verification_file` key of a YAML document at `file`.
///
/// Only that line changes; comments, key order and the rest of the document
/// stay as written. Returns `None` when the key is not on a line of its own.
pub fn replace_verification_file(yaml: &str, file: &Path) -> AdminResult<Option<String>> {
    let pattern = verification_file_line();
    if !pattern.is_match(yaml) {
        return Ok(None);
    }
    let scalar = serde_yaml::to_string(&file.display().to_string())?;
    let scalar = scalar.trim_end();
    let updated = pattern.replace(yaml, |caps: &Captures| {
        format!(
            "{}{}{}",
            &caps[1],
            scalar,
            caps.get(2).map_or("", |m| m.as_str())
        )
    });
    Ok(Some(updated.into_owned()))
}

/// Write the configuration back when an operation changed it (the rename
/// step moves the verification file).
///
/// The verification file line is edited in place. A file where that key
/// cannot be found on its own line is rewritten whole.
fn persist_if_changed(path: &Path, before: &AdminConfig, after: &AdminConfig) -> AdminResult<()> {
    if before == after {
        return Ok(());
    }
    let original = fs::read_to_string(path)?;
    let mut patched = before.clone();
    patched.excel.verification_file = after.excel.verification_file.clone();
    let in_place = if patched == *after {
        replace_verification_file(&original, &after.excel.verification_file)?
    } else {
        None
    };
    let updated = match in_place {
        Some(updated) => updated,
        None => {
            warn!(path = %path.display(), "rewriting the whole configuration file");
            serde_yaml::to_string(after)?
        }
    };
    fs::write(path, updated)?;
    println!(
        "{}",
        format!(
            "📝 Configuration updated: verification file is now {}",
            after.excel.verification_file.display()
        )
        .yellow()
    );
    Ok(())
}

/// Load the config, run `operation`, persist any change and print the trail.
///
/// Returns whether the operation succeeded.
fn with_config<F>(config_path: &Path, operation: F) -> AdminResult<bool>
where
    F: FnOnce(&mut AdminConfig) -> AdminResult<TaskResult>,
{
    let before = AdminConfig::load(config_path)?;
    let mut config = before.clone();
    let result = operation(&mut config)?;
    persist_if_changed(config_path, &before, &config)?;
    print_result(&result);
    Ok(result.success)
}

fn smtp_mailer(config: &AdminConfig) -> AdminResult<Box<dyn Mailer>> {
    Ok(Box::new(SmtpMailer::new(&config.smtp)?))
}

/// Execute the run-all command
pub fn run_all(config_path: &Path) -> AdminResult<bool> {
    println!("{}", "🗂  NAUTIL Admin - Running Excel pipeline".bold().green());
    println!("   Config: {}\n", config_path.display());
    with_config(config_path, |config| Ok(pipeline::run_all(config, today())))
}

/// Execute a single step
pub fn step(config_path: &Path, step: Step) -> AdminResult<bool> {
    println!(
        "{}",
        format!("🗂  NAUTIL Admin - Step {}: {}", step.number(), step.label())
            .bold()
            .green()
    );
    with_config(config_path, |config| {
        Ok(pipeline::run_step(step, config, today()))
    })
}

/// Execute the send-email command
pub fn send_email(config_path: &Path, request: EmailRequest) -> AdminResult<bool> {
    println!("{}", "📧 NAUTIL Admin - Sending verification email".bold().green());
    with_config(config_path, |config| {
        let mailer = smtp_mailer(config)?;
        Ok(send_verification_email(
            config,
            mailer.as_ref(),
            today(),
            &request,
        ))
    })
}

/// Execute the run-complete command
pub fn run_complete(
    config_path: &Path,
    email_to: Option<String>,
    email_subject: Option<String>,
) -> AdminResult<bool> {
    println!("{}", "🗂  NAUTIL Admin - Complete workflow".bold().green());
    with_config(config_path, |config| {
        let mailer = smtp_mailer(config)?;
        Ok(pipeline::run_complete(
            config,
            mailer.as_ref(),
            today(),
            email_to,
            email_subject,
        ))
    })
}

/// Execute the show-config command
pub fn show_config(config_path: &Path) -> AdminResult<()> {
    let config = AdminConfig::load(config_path)?;
    println!("{}", "⚙️  NAUTIL Admin configuration".bold().green());
    println!("   Config file:       {}", config_path.display());
    println!(
        "   Verification file: {}",
        config.excel.verification_file.display()
    );
    println!("   Template file:     {}", config.excel.template_file.display());
    println!("   Output directory:  {}", config.excel.output_dir.display());
    println!("   Global sheet:      {}", config.excel.sheet_global);
    println!("   TX sheets:         {}", config.tx_sheets().join(", "));
    println!("   Email:             {} → {}", config.email.from, config.email.default_to);
    println!("   SMTP:              {}:{}", config.smtp.host, config.smtp.port);
    Ok(())
}
