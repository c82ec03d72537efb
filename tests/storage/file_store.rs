use chrono::Utc;
use maveli::storage::ConversationStore;
use tempfile::TempDir;

#[tokio::test]
async fn turns_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("maveli.db");

    let store = ConversationStore::connect(&path).await.unwrap();
    assert!(store.upsert_user(9, Some("anu"), Some("Anu"), None).await);
    assert!(store.save_turn(9, "ഹലോ", "ഓണാശംസകൾ", Some(1200), true, Some("mal")).await);
    assert!(store.save_turn(9, "വീണ്ടും", "തീർച്ചയായും", None, false, None).await);
    store.close().await;

    let reopened = ConversationStore::connect(&path).await.unwrap();
    let history = reopened.get_history(9, 10).await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].user_message, "ഹലോ");
    assert_eq!(history[1].bot_response, "തീർച്ചയായും");

    let user = reopened.get_user(9).await.unwrap();
    assert_eq!(user.first_name.as_deref(), Some("Anu"));

    let context = reopened.get_formatted_context(9, 1).await;
    assert!(context.contains("വീണ്ടും"));
    assert!(!context.contains("ഹലോ"));
}

#[tokio::test]
async fn rollup_counts_todays_turns() {
    let dir = TempDir::new().unwrap();
    let store = ConversationStore::connect(&dir.path().join("maveli.db"))
        .await
        .unwrap();
    store.upsert_user(1, None, Some("A"), None).await;
    store.upsert_user(2, None, Some("B"), None).await;
    store.save_turn(1, "a", "b", None, true, None).await;
    store.save_turn(2, "c", "d", None, false, None).await;
    store.save_turn(2, "e", "f", None, true, None).await;

    let today = Utc::now().date_naive();
    let row = store.record_daily_rollup(today).await.unwrap();
    assert_eq!(row.total_messages, 3);
    assert_eq!(row.successful_responses, 3);
    assert_eq!(row.audio_generations, 2);
    assert_eq!(row.unique_users, 2);
    assert_eq!(store.get_daily_stats(today).await, Some(row));

    let totals = store.get_aggregate_user_stats().await;
    assert_eq!(totals.total_users, 2);
    assert_eq!(totals.total_conversations, 3);
    assert_eq!(totals.total_audio_messages, 2);
}
