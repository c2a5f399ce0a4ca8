use super::reminders::{format_events, format_local};
use super::*;
use chrono::{Duration, Local, NaiveDate};
use iva_core::config::{FocusConfig, GoogleConfig};
use iva_core::context::ContextEntry;
use iva_google::{EventSummary, Period, StaticToken, TasksClient};
use iva_memory::store::NewReminder;
use iva_memory::ReminderRecord;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn test_store() -> Store {
    Store::in_memory(10).await.unwrap()
}

fn focus() -> FocusTimer {
    FocusTimer::new(&FocusConfig::default()).0
}

async fn run(
    store: &Store,
    calendar: Option<&CalendarClient>,
    focus: &FocusTimer,
    text: &str,
) -> String {
    run_with_tasks(store, calendar, None, focus, text).await
}

async fn run_with_tasks(
    store: &Store,
    calendar: Option<&CalendarClient>,
    tasks: Option<&TasksClient>,
    focus: &FocusTimer,
    text: &str,
) -> String {
    let uptime = Instant::now();
    let ctx = CommandContext {
        store,
        channel: "console",
        sender_id: "local",
        text,
        uptime: &uptime,
        provider_name: "openai",
        voice: "text in, no speech out",
        calendar,
        tasks,
        focus,
    };
    let cmd = Command::parse(text).expect("known command");
    handle(cmd, &ctx).await
}

fn reminder(id: &str, content: &str, due_date: NaiveDate, recurring: bool) -> ReminderRecord {
    ReminderRecord {
        id: id.into(),
        content: content.into(),
        due_date: due_date.format("%Y-%m-%d").to_string(),
        due_time: "09:00 AM".into(),
        recurring,
        event_id: None,
        event_link: None,
        status: "pending".into(),
    }
}

#[test]
fn test_parse_all_commands() {
    assert_eq!(Command::parse("/reminders"), Some(Command::Reminders));
    assert_eq!(Command::parse("/reminders week"), Some(Command::Reminders));
    assert_eq!(Command::parse("/todo"), Some(Command::Reminders));
    assert_eq!(Command::parse("/done abc"), Some(Command::Done));
    assert_eq!(Command::parse("/tasks"), Some(Command::Tasks));
    assert_eq!(Command::parse("/focus start"), Some(Command::Focus));
    assert_eq!(Command::parse("/history"), Some(Command::History));
    assert_eq!(Command::parse("/forget"), Some(Command::Forget));
    assert_eq!(Command::parse("/STATUS"), Some(Command::Status));
    assert_eq!(Command::parse("/help"), Some(Command::Help));
}

#[test]
fn test_parse_passes_through() {
    assert_eq!(Command::parse("/unknown"), None);
    assert_eq!(Command::parse("remind me to stretch"), None);
    assert_eq!(Command::parse(""), None);
}

#[test]
fn test_focus_usage() {
    let f = focus();
    assert!(handle_focus(&f, &["sideways"]).starts_with("Usage: /focus"));
    assert_eq!(handle_focus(&f, &[]), f.status());
    assert_eq!(handle_focus(&f, &["longer"]), "Work period set to 30 minutes.");
}

#[test]
fn test_format_events() {
    assert_eq!(format_events(Period::Day, &[]), "No reminders for today.");
    assert_eq!(format_events(Period::Week, &[]), "No reminders for this week.");

    let events = vec![EventSummary {
        id: "0123456789abcdef".into(),
        summary: "Dentist".into(),
        time: "All Day".into(),
    }];
    assert_eq!(
        format_events(Period::Day, &events),
        "Reminders for today:\n[01234567] Dentist (All Day)"
    );
}

#[test]
fn test_format_local_filters_by_period() {
    let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
    let all = vec![
        reminder("aaaaaaaa-1", "water plants", today, false),
        reminder("bbbbbbbb-2", "dentist", today + Duration::days(3), false),
        reminder("cccccccc-3", "meds", today - Duration::days(10), true),
        reminder("dddddddd-4", "old", today - Duration::days(1), false),
    ];

    let day = format_local(Period::Day, &all, today);
    assert!(day.contains("water plants"));
    assert!(day.contains("[cccccccc] meds (every day at 09:00 AM)"));
    assert!(!day.contains("dentist"));
    assert!(!day.contains("old"));

    let week = format_local(Period::Week, &all, today);
    assert!(week.starts_with("Reminders for this week:"));
    assert!(week.contains("dentist (2026-10-21 at 09:00 AM)"));
}

#[tokio::test]
async fn test_reminders_invalid_period() {
    let store = test_store().await;
    let f = focus();
    assert_eq!(
        run(&store, None, &f, "/reminders month").await,
        "Invalid period specified. Choose 'day' or 'week'."
    );
}

#[tokio::test]
async fn test_reminders_from_local_store() {
    let store = test_store().await;
    let f = focus();
    assert_eq!(run(&store, None, &f, "/reminders").await, "No reminders for today.");

    let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
    store
        .save_reminder(&NewReminder {
            sender_id: "local",
            content: "take a walk",
            due_date: &today,
            due_time: "11:59 PM",
            recurring: false,
        })
        .await
        .unwrap();
    let out = run(&store, None, &f, "/reminders").await;
    assert!(out.contains("take a walk"), "{out}");
}

#[tokio::test]
async fn test_done_local_reminder() {
    let store = test_store().await;
    let f = focus();
    let id = store
        .save_reminder(&NewReminder {
            sender_id: "local",
            content: "pay rent",
            due_date: "2030-01-01",
            due_time: "09:00 AM",
            recurring: false,
        })
        .await
        .unwrap();

    assert_eq!(run(&store, None, &f, "/done").await, "Usage: /done <id>");
    assert_eq!(
        run(&store, None, &f, &format!("/done {}", &id[..8])).await,
        "Marked 'pay rent' as done."
    );
    assert!(store.pending_reminders("local").await.unwrap().is_empty());
    assert_eq!(
        run(&store, None, &f, "/done zzzz").await,
        "No reminder matches that id."
    );
}

#[tokio::test]
async fn test_done_calendar_only_event() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [
                {"id": "evt42abc", "summary": "Dentist",
                 "start": {"dateTime": "2030-01-01T09:00:00Z"}}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/calendars/primary/events/evt42abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "evt42abc", "summary": "Dentist", "status": "confirmed"
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/calendars/primary/events/evt42abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "evt42abc", "status": "cancelled"
        })))
        .expect(1)
        .mount(&server)
        .await;
    let calendar = CalendarClient::new(
        &GoogleConfig::default(),
        Arc::new(StaticToken("tok".into())),
    )
    .with_base_url(server.uri());

    let store = test_store().await;
    let f = focus();
    assert_eq!(
        run(&store, Some(&calendar), &f, "/done evt42").await,
        "Marked 'Dentist' as done."
    );
}

#[tokio::test]
async fn test_tasks_list_and_complete() {
    let store = test_store().await;
    let f = focus();
    assert_eq!(run(&store, None, &f, "/tasks").await, "No open tasks.");

    let id = store
        .save_task("local", "file taxes", Some("2027-04-15"), None)
        .await
        .unwrap();
    let out = run(&store, None, &f, "/tasks").await;
    assert_eq!(
        out,
        format!("Open tasks:\n[{}] file taxes (due 2027-04-15)", &id[..8])
    );

    assert_eq!(
        run(&store, None, &f, &format!("/tasks done {}", &id[..8])).await,
        "Task marked as done."
    );
    assert_eq!(run(&store, None, &f, "/tasks").await, "No open tasks.");
}

fn tasks_client(server: &MockServer) -> TasksClient {
    TasksClient::new(&GoogleConfig::default(), Arc::new(StaticToken("tok".into())))
        .with_base_url(server.uri())
}

#[tokio::test]
async fn test_tasks_listed_from_google() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lists/@default/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [
                {"id": "remote-task-1", "title": "renew passport",
                 "due": "2030-05-01T00:00:00.000Z"},
                {"id": "remote-task-2", "title": "water plants"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = test_store().await;
    store.save_task("local", "local only", None, None).await.unwrap();
    let f = focus();
    let client = tasks_client(&server);
    assert_eq!(
        run_with_tasks(&store, None, Some(&client), &f, "/tasks").await,
        "Open tasks:\n[remote-t] renew passport (due 2030-05-01)\n[remote-t] water plants"
    );
}

#[tokio::test]
async fn test_tasks_fall_back_to_store_when_google_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let store = test_store().await;
    let id = store.save_task("local", "call the bank", None, None).await.unwrap();
    let f = focus();
    let client = tasks_client(&server);
    assert_eq!(
        run_with_tasks(&store, None, Some(&client), &f, "/tasks").await,
        format!("Open tasks:\n[{}] call the bank", &id[..8])
    );
}

#[tokio::test]
async fn test_history_and_forget() {
    let store = test_store().await;
    let f = focus();
    assert_eq!(
        run(&store, None, &f, "/forget").await,
        "No active conversation to clear."
    );

    store
        .append_turn("console", "local", &ContextEntry::user("hi"), None)
        .await
        .unwrap();
    store
        .append_turn("console", "local", &ContextEntry::assistant("hello!"), None)
        .await
        .unwrap();
    assert_eq!(
        run(&store, None, &f, "/history").await,
        "Recent conversation:\n\nUser: hi\nAssistant: hello!"
    );
    assert_eq!(
        run(&store, None, &f, "/forget").await,
        "Conversation cleared. Fresh start!"
    );
    assert_eq!(
        run(&store, None, &f, "/history").await,
        "No conversation history yet."
    );
}

#[tokio::test]
async fn test_status() {
    let store = test_store().await;
    let f = focus();
    let out = run(&store, None, &f, "/status").await;
    assert!(out.starts_with("IVA Status"));
    assert!(out.contains("Provider: openai"));
    assert!(out.contains("Google: disabled"));
    assert!(out.contains("Focus work: 25:00 left (paused)."));
}
