//! API request handlers
//!
//! Every `/api` endpoint answers `{success, message, logs}` with HTTP 200.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::error;

use super::server::AppState;
use crate::config::{AdminConfig, ConfigUpdate};
use crate::mail::{send_verification_email, EmailRequest, Mailer};
use crate::pipeline::{self, Step};
use crate::types::TaskResult;

/// Run a blocking operation with the configuration locked.
///
/// Panics inside the operation come back as a failed result rather than a
/// dropped connection.
async fn run_locked<F>(state: Arc<AppState>, operation: F) -> Json<TaskResult>
where
    F: FnOnce(&mut AdminConfig, &dyn Mailer, NaiveDate) -> TaskResult + Send + 'static,
{
    let joined = tokio::task::spawn_blocking(move || {
        let today = state.today();
        let mut config = state.config();
        operation(&mut *config, state.mailer.as_ref(), today)
    })
    .await;

    match joined {
        Ok(result) => Json(result),
        Err(e) => {
            error!(error = %e, "operation crashed");
            Json(TaskResult::failed(format!("Unexpected error: {}", e)))
        }
    }
}

/// GET / - Status page
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let today = state.today();
    let config = state.config().clone();
    Html(render_status_page(&config, today, &state.version))
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn render_status_page(config: &AdminConfig, today: NaiveDate, version: &str) -> String {
    let rows = [
        ("Date", today.format("%d/%m/%Y").to_string()),
        (
            "Verification file",
            config.excel.verification_file.display().to_string(),
        ),
        ("Template file", config.excel.template_file.display().to_string()),
        ("Output directory", config.excel.output_dir.display().to_string()),
        ("Recipient", config.email.default_to.clone()),
    ];
    let table: String = rows
        .iter()
        .map(|(key, value)| format!("<tr><th>{}</th><td>{}</td></tr>", key, escape_html(value)))
        .collect();
    let steps: String = pipeline::PIPELINE
        .iter()
        .map(|step| {
            format!(
                "<li><code>POST /api/step/{}</code> {}</li>",
                step.slug(),
                step.label()
            )
        })
        .collect();

    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>NAUTIL Admin</title></head>\
         <body><h1>NAUTIL Admin</h1><p>v{}</p><table>{}</table>\
         <h2>Steps</h2><ol>{}</ol>\
         <p><code>POST /api/run-all</code> · <code>POST /api/run-complete</code> · \
         <code>POST /api/step/send-email</code></p></body></html>",
        escape_html(version),
        table,
        steps
    )
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// GET /health - Health check
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
    })
}

/// POST /api/run-all - Full five-step pipeline
pub async fn run_all(State(state): State<Arc<AppState>>) -> Json<TaskResult> {
    run_locked(state, |config, _, today| pipeline::run_all(config, today)).await
}

async fn run_single(state: Arc<AppState>, step: Step) -> Json<TaskResult> {
    run_locked(state, move |config, _, today| pipeline::run_step(step, config, today)).await
}

/// POST /api/step/rename
pub async fn step_rename(State(state): State<Arc<AppState>>) -> Json<TaskResult> {
    run_single(state, Step::Rename).await
}

/// POST /api/step/vue-globale
pub async fn step_vue_globale(State(state): State<Arc<AppState>>) -> Json<TaskResult> {
    run_single(state, Step::VueGlobale).await
}

/// POST /api/step/clear-tx
pub async fn step_clear_tx(State(state): State<Arc<AppState>>) -> Json<TaskResult> {
    run_single(state, Step::ClearTx).await
}

/// POST /api/step/clear-after-tx3
pub async fn step_clear_after_tx3(State(state): State<Arc<AppState>>) -> Json<TaskResult> {
    run_single(state, Step::ClearAfterTx3).await
}

/// POST /api/step/clear-template
pub async fn step_clear_template(State(state): State<Arc<AppState>>) -> Json<TaskResult> {
    run_single(state, Step::ClearTemplate).await
}

/// Query of `POST /api/step/send-email`
#[derive(Debug, Default, Deserialize)]
pub struct SendEmailParams {
    pub to: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
}

/// POST /api/step/send-email
pub async fn send_email(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SendEmailParams>,
) -> Json<TaskResult> {
    let request = EmailRequest {
        to: params.to,
        from: None,
        subject: params.subject,
        body: params.body,
    };
    run_locked(state, move |config, mailer, today| {
        send_verification_email(config, mailer, today, &request)
    })
    .await
}

/// Query of `POST /api/run-complete`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunCompleteParams {
    pub email_to: Option<String>,
    pub email_subject: Option<String>,
}

/// POST /api/run-complete - Pipeline, then email when it succeeded
pub async fn run_complete(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RunCompleteParams>,
) -> Json<TaskResult> {
    run_locked(state, move |config, mailer, today| {
        pipeline::run_complete(config, mailer, today, params.email_to, params.email_subject)
    })
    .await
}

/// POST /api/config/update
pub async fn update_config(
    State(state): State<Arc<AppState>>,
    Query(update): Query<ConfigUpdate>,
) -> Json<TaskResult> {
    run_locked(state, move |config, _, _| {
        config.apply_update(&update);
        let mut result = TaskResult::ok("Configuration updated");
        result.log(format!(
            "Verification file: {}",
            config.excel.verification_file.display()
        ));
        result.log(format!("Template file: {}", config.excel.template_file.display()));
        result.log(format!("Output directory: {}", config.excel.output_dir.display()));
        result
    })
    .await
}
