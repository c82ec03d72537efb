use maveli::monitor::{ActivityStatus, Snapshot, load_tail, parse_log_line, render_text};
use std::io::Write;
use tempfile::NamedTempFile;

#[tokio::test]
async fn snapshot_reads_only_the_tail() {
    let mut log = NamedTempFile::new().unwrap();
    for i in 0..30 {
        writeln!(
            log,
            "2025-09-05 10:{i:02}:00,000 - maveli::bot - INFO - Received message from user {i} (U{i}): m{i}..."
        )
        .unwrap();
    }

    let snapshot = Snapshot::load(log.path(), 10).await.unwrap();
    assert_eq!(snapshot.lines.len(), 10);
    assert_eq!(snapshot.stats.user_messages, 10);
    assert_eq!(snapshot.stats.recent_user_messages[0].user_id, 20);
    assert_eq!(
        snapshot.stats.last_activity,
        parse_log_line(snapshot.lines.last().unwrap()).map(|e| e.timestamp)
    );
}

#[tokio::test]
async fn unparseable_lines_count_but_do_not_break_stats() {
    let mut log = NamedTempFile::new().unwrap();
    writeln!(log, "garbage").unwrap();
    writeln!(log, "thread 'main' panicked at src/main.rs:1:1").unwrap();
    writeln!(
        log,
        "2025-09-05 10:00:00,000 - maveli::speech - WARNING - Text became empty after emoji removal"
    )
    .unwrap();

    let lines = load_tail(log.path(), 1000).await.unwrap();
    let snapshot = Snapshot::load(log.path(), 1000).await.unwrap();
    assert_eq!(lines.len(), 3);
    assert_eq!(snapshot.stats.total_logs, 3);
    assert_eq!(snapshot.stats.warning_count, 1);
    assert!(snapshot.stats.recent_user_messages.is_empty());
}

#[tokio::test]
async fn missing_log_reports_unknown_status() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = Snapshot::load(&dir.path().join("bot.log"), 1000)
        .await
        .unwrap();
    assert_eq!(snapshot.stats.total_logs, 0);

    let now = chrono::Local::now().naive_local();
    assert_eq!(
        ActivityStatus::classify(snapshot.stats.last_activity, now),
        ActivityStatus::Unknown
    );
    assert!(render_text(&snapshot.stats, now).contains("Unknown"));
}
