use super::*;
use iva_core::context::ContextEntry;

async fn test_store() -> Store {
    Store::in_memory(10).await.unwrap()
}

#[tokio::test]
async fn test_recent_turns_chronological_and_trimmed() {
    let store = test_store().await;
    for i in 0..14 {
        let entry = if i % 2 == 0 {
            ContextEntry::user(format!("question {i}"))
        } else {
            ContextEntry::assistant(format!("answer {i}"))
        };
        store
            .append_turn("console", "local", &entry, None)
            .await
            .unwrap();
    }

    let recent = store.recent_turns("console", "local", 10).await.unwrap();
    assert_eq!(recent.len(), 10);
    assert_eq!(recent[0].content, "question 4");
    assert_eq!(recent[9].content, "answer 13");
    assert_eq!(recent[9].role, "assistant");

    let all = store.conversation_turns("console", "local").await.unwrap();
    assert_eq!(all.len(), 14);
    assert_eq!(all[0].content, "question 0");
}

#[tokio::test]
async fn test_turns_are_scoped_per_sender() {
    let store = test_store().await;
    store
        .append_turn("console", "alice", &ContextEntry::user("hi"), None)
        .await
        .unwrap();
    store
        .append_turn("console", "bob", &ContextEntry::user("hello"), None)
        .await
        .unwrap();

    let alice = store.recent_turns("console", "alice", 10).await.unwrap();
    assert_eq!(alice, vec![ContextEntry::user("hi")]);
}

#[tokio::test]
async fn test_close_conversation_starts_fresh() {
    let store = test_store().await;
    store
        .append_turn("console", "local", &ContextEntry::user("old"), None)
        .await
        .unwrap();

    assert!(store.close_conversation("console", "local").await.unwrap());
    assert!(!store.close_conversation("console", "local").await.unwrap());
    assert!(store
        .recent_turns("console", "local", 10)
        .await
        .unwrap()
        .is_empty());

    store
        .append_turn("console", "local", &ContextEntry::user("new"), None)
        .await
        .unwrap();
    let turns = store.recent_turns("console", "local", 10).await.unwrap();
    assert_eq!(turns, vec![ContextEntry::user("new")]);
}

#[tokio::test]
async fn test_append_turn_with_metadata() {
    let store = test_store().await;
    let meta = iva_core::message::MessageMetadata {
        provider_used: "openai".into(),
        tokens_used: Some(12),
        processing_time_ms: 5,
        model: Some("gpt-3.5-turbo".into()),
    };
    store
        .append_turn(
            "console",
            "local",
            &ContextEntry::assistant("done"),
            Some(&meta),
        )
        .await
        .unwrap();

    let (json,): (Option<String>,) =
        sqlx::query_as("SELECT metadata_json FROM messages LIMIT 1")
            .fetch_one(store.pool())
            .await
            .unwrap();
    assert!(json.unwrap().contains("gpt-3.5-turbo"));
}

#[test]
fn test_format_transcript() {
    let turns = vec![
        ContextEntry::user("remind me"),
        ContextEntry::assistant("sure"),
    ];
    assert_eq!(
        format_transcript(&turns),
        "User: remind me\nAssistant: sure"
    );
}

#[tokio::test]
async fn test_reminder_lifecycle() {
    let store = test_store().await;
    let id = store
        .save_reminder(&NewReminder {
            sender_id: "local",
            content: "call mom",
            due_date: "2026-10-19",
            due_time: "05:00 PM",
            recurring: false,
        })
        .await
        .unwrap();

    store
        .attach_event(&id, "evt123", Some("https://calendar.google.com/e/evt123"))
        .await
        .unwrap();

    let pending = store.pending_reminders("local").await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].content, "call mom");
    assert_eq!(pending[0].event_id.as_deref(), Some("evt123"));
    assert!(!pending[0].recurring);

    assert!(store.mark_reminder_done("evt123").await.unwrap());
    assert!(!store.mark_reminder_done("evt123").await.unwrap());
    assert!(store.pending_reminders("local").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_complete_reminder_by_prefix() {
    let store = test_store().await;
    let local_only = store
        .save_reminder(&NewReminder {
            sender_id: "local",
            content: "stretch",
            due_date: "2026-10-19",
            due_time: "09:00 AM",
            recurring: true,
        })
        .await
        .unwrap();
    let synced = store
        .save_reminder(&NewReminder {
            sender_id: "local",
            content: "pay rent",
            due_date: "2026-11-01",
            due_time: "12:00 AM",
            recurring: false,
        })
        .await
        .unwrap();
    store.attach_event(&synced, "gcal42abc", None).await.unwrap();

    let done = store.complete_reminder(&local_only[..8], "local").await.unwrap().unwrap();
    assert_eq!(done.content, "stretch");

    let done = store.complete_reminder("gcal42", "local").await.unwrap().unwrap();
    assert_eq!(done.event_id.as_deref(), Some("gcal42abc"));

    assert!(store.complete_reminder("gcal42", "local").await.unwrap().is_none());
    assert!(store.complete_reminder("", "local").await.unwrap().is_none());
    assert!(store.pending_reminders("local").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_task_lifecycle() {
    let store = test_store().await;
    let first = store
        .save_task("local", "buy milk", Some("2026-10-20"), None)
        .await
        .unwrap();
    store
        .save_task("local", "water plants", None, Some("the big ones"))
        .await
        .unwrap();
    store.attach_remote_task(&first, "remote-1").await.unwrap();

    let open = store.open_tasks("local").await.unwrap();
    assert_eq!(open.len(), 2);
    assert_eq!(open[0].title, "buy milk");
    assert_eq!(open[0].remote_id.as_deref(), Some("remote-1"));
    assert_eq!(open[1].notes.as_deref(), Some("the big ones"));

    assert!(store.complete_task(&first[..8], "local").await.unwrap());
    assert!(!store.complete_task("", "local").await.unwrap());
    assert_eq!(store.open_tasks("local").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_wildcards_in_prefix_match_literally() {
    let store = test_store().await;
    store
        .save_reminder(&NewReminder {
            sender_id: "local",
            content: "pay rent",
            due_date: "2026-11-01",
            due_time: "12:00 AM",
            recurring: false,
        })
        .await
        .unwrap();
    store.save_task("local", "buy milk", None, None).await.unwrap();

    for pattern in ["%", "_", "%%%%%%%%", "\\"] {
        assert!(store.complete_reminder(pattern, "local").await.unwrap().is_none());
        assert!(!store.complete_task(pattern, "local").await.unwrap());
    }
    assert_eq!(store.pending_reminders("local").await.unwrap().len(), 1);
    assert_eq!(store.open_tasks("local").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_complete_task_other_sender_is_noop() {
    let store = test_store().await;
    let id = store.save_task("alice", "secret", None, None).await.unwrap();
    assert!(!store.complete_task(&id, "bob").await.unwrap());
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let store = test_store().await;
    Store::run_migrations(store.pool()).await.unwrap();
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM _migrations")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(count, 3);
}
