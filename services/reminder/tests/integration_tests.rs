//! End-to-end tests for the reminder service: ingest a sheet, run
//! evaluation cycles against a tempdir-backed store, and observe alerts,
//! scheduler gating, and restart behavior.

use chrono::{DateTime, Days, NaiveDate, Utc};

use patentwatch_reminder::{EmailOutcome, ReminderService};
use patentwatch_utils::{generate_csv_template, AppConfig, SheetParser, TEMPLATE_FILENAME};

fn test_config(dir: &tempfile::TempDir) -> AppConfig {
    let mut config = AppConfig::default();
    config.reminder.data_file = dir
        .path()
        .join("patentwatch_state.json")
        .to_string_lossy()
        .into_owned();
    config.reminder.send_log_file = dir
        .path()
        .join("email_log.txt")
        .to_string_lossy()
        .into_owned();
    config.reminder.lead_time_days = 15;
    config
}

fn config_with_unreachable_smtp(dir: &tempfile::TempDir) -> AppConfig {
    let mut config = test_config(dir);
    config.email.enabled = true;
    config.email.sender_address = "sender@example.com".to_string();
    config.email.sender_password = "authcode".to_string();
    config.email.smtp_host = "smtp.invalid".to_string();
    config.email.recipient_address = "recipient@example.com".to_string();
    config
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 24).unwrap()
}

fn now() -> DateTime<Utc> {
    "2026-08-24T10:00:00Z".parse().unwrap()
}

#[tokio::test]
async fn test_template_upload_cycle_flow() {
    let dir = tempfile::tempdir().unwrap();
    let service = ReminderService::new(&test_config(&dir));

    // The downloadable template round-trips through ingestion
    let template = generate_csv_template(today()).unwrap();
    let sheet = SheetParser::new()
        .parse_bytes(TEMPLATE_FILENAME, &template, None)
        .unwrap();
    assert_eq!(sheet.records.len(), 3);

    service.replace_records(sheet.records, now()).await;
    let report = service.run_cycle_at(now(), today()).await;

    // Template rows: +15 days (upcoming at lead time 15), +45 (normal), -5 (expired)
    assert_eq!(report.total, 3);
    assert_eq!(report.upcoming, 1);
    assert_eq!(report.expired, 1);
    assert_eq!(report.new_alerts, 2);

    let counts = service.status_counts(today()).await;
    assert_eq!(counts.get("normal"), Some(&1));

    let alerts = service.alerts().await;
    assert_eq!(alerts.len(), 2);
    assert!(alerts.iter().any(|a| a.message().contains("due in 15 days")));
    assert!(alerts.iter().any(|a| a.message().contains("5 days past")));
}

#[tokio::test]
async fn test_due_scenarios_from_upload() {
    let dir = tempfile::tempdir().unwrap();
    let service = ReminderService::new(&test_config(&dir));

    let csv = format!(
        "patent_name,patent_number,due_date,fee_amount\n\
         Invention A,ZL1,{},1300\n\
         Design C,ZL2,{},500",
        today().checked_add_days(Days::new(10)).unwrap().format("%Y-%m-%d"),
        today().checked_sub_days(Days::new(5)).unwrap().format("%Y-%m-%d"),
    );
    let sheet = SheetParser::new().parse_bytes("fees.csv", csv.as_bytes(), None).unwrap();
    service.replace_records(sheet.records, now()).await;

    let due = service.due_records(today()).await;
    assert_eq!(due.len(), 2);

    let zl1 = due.iter().find(|c| c.record.number == "ZL1").unwrap();
    assert_eq!(zl1.days_remaining, 10);
    assert_eq!(zl1.status.to_string(), "upcoming");

    let zl2 = due.iter().find(|c| c.record.number == "ZL2").unwrap();
    assert_eq!(zl2.days_remaining, -5);
    assert_eq!(zl2.status.to_string(), "expired");
}

#[tokio::test]
async fn test_email_window_defers_second_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let service = ReminderService::new(&config_with_unreachable_smtp(&dir));

    let csv = format!(
        "patent_name,patent_number,due_date,fee_amount\nInvention A,ZL1,{},1300",
        today().checked_add_days(Days::new(2)).unwrap().format("%Y-%m-%d"),
    );
    let sheet = SheetParser::new().parse_bytes("fees.csv", csv.as_bytes(), None).unwrap();
    service.replace_records(sheet.records, now()).await;

    // First cycle passes the gate and fails at the unreachable SMTP host
    let first = service.run_cycle_at(now(), today()).await;
    assert!(matches!(first.email, EmailOutcome::Failed { .. }));

    // Two minutes later the armed window still holds: ~1 minute remains
    let second = service
        .run_cycle_at(now() + chrono::Duration::minutes(2), today())
        .await;
    match second.email {
        EmailOutcome::Deferred { remaining_seconds } => {
            assert!(remaining_seconds > 0 && remaining_seconds <= 60);
        }
        other => panic!("expected deferred outcome, got {:?}", other),
    }

    // The failed attempt was recorded in the send log with the schema
    // consumers rely on
    let log = std::fs::read_to_string(dir.path().join("email_log.txt")).unwrap();
    assert!(log.contains("status=fail"));
    assert!(log.contains("detail="));
    assert!(!log.contains("authcode"));
}

#[tokio::test]
async fn test_rescheduled_due_date_realerts_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);

    let first_due = today().checked_add_days(Days::new(5)).unwrap();
    {
        let service = ReminderService::new(&config);
        let csv = format!(
            "patent_name,patent_number,due_date,fee_amount\nInvention A,ZL1,{},1300",
            first_due.format("%Y-%m-%d")
        );
        let sheet = SheetParser::new().parse_bytes("fees.csv", csv.as_bytes(), None).unwrap();
        service.replace_records(sheet.records, now()).await;
        assert_eq!(service.run_cycle_at(now(), today()).await.new_alerts, 1);
    }

    // Restart, upload the same patent with a pushed-out deadline that is
    // still inside the lead-time window: new fact, new alert
    let service = ReminderService::new(&config);
    let new_due = today().checked_add_days(Days::new(12)).unwrap();
    let csv = format!(
        "patent_name,patent_number,due_date,fee_amount\nInvention A,ZL1,{},1300",
        new_due.format("%Y-%m-%d")
    );
    let sheet = SheetParser::new().parse_bytes("fees.csv", csv.as_bytes(), None).unwrap();
    service.replace_records(sheet.records, now()).await;

    let report = service.run_cycle_at(now(), today()).await;
    assert_eq!(report.new_alerts, 1);

    // But re-uploading the old fact stays silent
    let csv = format!(
        "patent_name,patent_number,due_date,fee_amount\nInvention A,ZL1,{},1300",
        first_due.format("%Y-%m-%d")
    );
    let sheet = SheetParser::new().parse_bytes("fees.csv", csv.as_bytes(), None).unwrap();
    service.replace_records(sheet.records, now()).await;
    assert_eq!(service.run_cycle_at(now(), today()).await.new_alerts, 0);
}

#[tokio::test]
async fn test_disabled_email_still_alerts() {
    let dir = tempfile::tempdir().unwrap();
    let service = ReminderService::new(&test_config(&dir));

    let csv = format!(
        "patent_name,patent_number,due_date,fee_amount\nInvention A,ZL1,{},1300",
        today().checked_sub_days(Days::new(1)).unwrap().format("%Y-%m-%d")
    );
    let sheet = SheetParser::new().parse_bytes("fees.csv", csv.as_bytes(), None).unwrap();
    service.replace_records(sheet.records, now()).await;

    let report = service.run_cycle_at(now(), today()).await;
    assert_eq!(report.email, EmailOutcome::Disabled);
    assert_eq!(report.new_alerts, 1);

    // And the scheduler never armed a window
    let status = service.scheduler_status(now()).await;
    assert!(status.next_allowed_at.is_none());
    assert!(status.last_sent_at.is_none());
}
