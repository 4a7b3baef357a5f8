//! PatentWatch Reminder Service
//!
//! Tracks patent fee due dates uploaded from spreadsheets, classifies each
//! record by urgency, and issues throttled email reminders plus an in-app
//! alert feed. Evaluation cycles run on upload and on a periodic tick.

use anyhow::Result;
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use patentwatch_reminder::service::SchedulerStatus;
use patentwatch_reminder::{CycleReport, ReminderService};
use patentwatch_utils::{
    generate_csv_template, init_logging, AppConfig, EmailConfig, PatentwatchError, SheetFormat,
    SheetParser, TEMPLATE_FILENAME,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration ({}), using defaults", e);
        AppConfig::default()
    });
    init_logging(&config.logging)?;
    info!("Starting PatentWatch Reminder Service");

    let service = ReminderService::new(&config);

    spawn_periodic_tick(service.clone(), config.reminder.tick_interval_minutes);

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/patents/upload", post(upload_patents))
        .route("/api/v1/patents", get(list_patents))
        .route("/api/v1/patents/due", get(list_due_patents))
        .route("/api/v1/patents/distribution", get(status_distribution))
        .route("/api/v1/alerts", get(list_alerts))
        .route("/api/v1/status", get(reminder_status))
        .route("/api/v1/config/lead-time", put(update_lead_time))
        .route("/api/v1/config/email", put(update_email_config))
        .route("/api/v1/cycle/run", post(run_cycle))
        .route("/api/v1/template", get(download_template))
        .layer(DefaultBodyLimit::max(config.server.max_upload_size))
        .layer(TraceLayer::new_for_http())
        .with_state(service);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Reminder Service listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodic evaluation, independent of the HTTP path. Each tick runs one
/// full cycle; a deferred or failed send is simply retried next tick.
fn spawn_periodic_tick(service: ReminderService, interval_minutes: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_minutes * 60));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick fires immediately; skip it so startup stays quiet.
        interval.tick().await;

        loop {
            interval.tick().await;
            let report = service.run_cycle().await;
            info!(
                total = report.total,
                new_alerts = report.new_alerts,
                email = ?report.email,
                "Periodic evaluation cycle finished"
            );
        }
    });
}

type ApiError = (StatusCode, String);

fn api_error(error: PatentwatchError) -> ApiError {
    (
        StatusCode::from_u16(error.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        error.to_string(),
    )
}

async fn health_check(State(service): State<ReminderService>) -> Json<serde_json::Value> {
    let scheduler = service.scheduler_status(Utc::now()).await;
    Json(serde_json::json!({
        "status": "healthy",
        "service": "patentwatch-reminder",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
        "last_data_upload": service.last_upload_at().await,
        "last_email_sent": scheduler.last_sent_at,
    }))
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    records_loaded: usize,
    total_rows: usize,
    warnings: Vec<String>,
    uploaded_at: String,
}

/// Accept a spreadsheet upload, replace the working set, and kick off an
/// evaluation cycle in the background so the response stays fast.
async fn upload_patents(
    State(service): State<ReminderService>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut upload: Option<(String, Option<SheetFormat>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_error(PatentwatchError::ingestion(format!("Invalid multipart body: {}", e))))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload").to_string();
        let format = field.content_type().and_then(SheetFormat::from_content_type);
        let data = field
            .bytes()
            .await
            .map_err(|e| api_error(PatentwatchError::ingestion(format!("Failed to read upload: {}", e))))?;
        upload = Some((filename, format, data.to_vec()));
    }

    let (filename, format, data) = upload
        .ok_or_else(|| api_error(PatentwatchError::validation("file", "no file field in upload")))?;

    let parser = SheetParser::new();
    let sheet = parser.parse_bytes(&filename, &data, format).map_err(api_error)?;

    let now = Utc::now();
    let records_loaded = service.replace_records(sheet.records, now).await;

    // Evaluate in the background; the uploader gets the ingest result
    // immediately and alerts/email follow through the normal cycle.
    let background = service.clone();
    tokio::spawn(async move {
        background.run_cycle().await;
    });

    Ok(Json(UploadResponse {
        records_loaded,
        total_rows: sheet.total_rows,
        warnings: sheet.warnings,
        uploaded_at: now.to_rfc3339(),
    }))
}

async fn list_patents(State(service): State<ReminderService>) -> Json<serde_json::Value> {
    let classified = service.classified_records(Local::now().date_naive()).await;
    Json(serde_json::json!({ "patents": classified }))
}

async fn list_due_patents(State(service): State<ReminderService>) -> Json<serde_json::Value> {
    let due = service.due_records(Local::now().date_naive()).await;
    Json(serde_json::json!({ "patents": due }))
}

async fn status_distribution(State(service): State<ReminderService>) -> Json<serde_json::Value> {
    let counts = service.status_counts(Local::now().date_naive()).await;
    Json(serde_json::json!({ "distribution": counts }))
}

async fn list_alerts(State(service): State<ReminderService>) -> Json<serde_json::Value> {
    let alerts = service.alerts().await;
    let rendered: Vec<_> = alerts
        .iter()
        .map(|alert| {
            serde_json::json!({
                "id": alert.id,
                "key": alert.key.to_string(),
                "message": alert.message(),
                "raised_at": alert.raised_at,
            })
        })
        .collect();
    Json(serde_json::json!({ "alerts": rendered }))
}

#[derive(Debug, Serialize)]
struct ReminderStatusResponse {
    lead_time_days: i64,
    last_upload_at: Option<String>,
    scheduler: SchedulerStatus,
}

async fn reminder_status(
    State(service): State<ReminderService>,
) -> Json<ReminderStatusResponse> {
    Json(ReminderStatusResponse {
        lead_time_days: service.lead_time_days().await,
        last_upload_at: service.last_upload_at().await.map(|t| t.to_rfc3339()),
        scheduler: service.scheduler_status(Utc::now()).await,
    })
}

#[derive(Debug, Deserialize)]
struct UpdateLeadTimeRequest {
    lead_time_days: i64,
}

async fn update_lead_time(
    State(service): State<ReminderService>,
    Json(request): Json<UpdateLeadTimeRequest>,
) -> Json<serde_json::Value> {
    let applied = service.set_lead_time_days(request.lead_time_days).await;
    Json(serde_json::json!({ "lead_time_days": applied }))
}

async fn update_email_config(
    State(service): State<ReminderService>,
    Json(config): Json<EmailConfig>,
) -> Json<serde_json::Value> {
    let complete = config.is_complete();
    service.set_email_config(config).await;
    Json(serde_json::json!({ "status": "saved", "complete": complete }))
}

async fn run_cycle(State(service): State<ReminderService>) -> Json<CycleReport> {
    Json(service.run_cycle().await)
}

async fn download_template() -> Result<impl IntoResponse, ApiError> {
    let bytes = generate_csv_template(Local::now().date_naive()).map_err(api_error)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", TEMPLATE_FILENAME),
            ),
        ],
        bytes,
    ))
}
