use super::aggregate::{ActivityStatus, LogStats};
use chrono::NaiveDateTime;
use std::fmt::Write;

const REPORT_RECENT_MESSAGES: usize = 10;

/// Plain-text rendering of `stats` for the terminal.
pub fn render_text(stats: &LogStats, now: NaiveDateTime) -> String {
    let status = ActivityStatus::classify(stats.last_activity, now);
    let last = stats.last_activity.map_or_else(
        || "Unknown".to_string(),
        |t| t.format("%Y-%m-%d %H:%M:%S").to_string(),
    );

    let mut out = String::from("🎭 Maveli Bot Monitor\n\n");
    let _ = writeln!(out, "Status:          {} (last activity: {last})", status.label());
    let _ = writeln!(out, "User messages:   {}", stats.user_messages);
    let _ = writeln!(out, "Audio generated: {}", stats.audio_generations);
    let _ = writeln!(out, "AI responses:    {}", stats.gemini_responses);
    let _ = writeln!(
        out,
        "Log levels:      INFO {} | WARNING {} | ERROR {}",
        stats.info_count, stats.warning_count, stats.error_count
    );
    let _ = writeln!(out, "Log lines read:  {}", stats.total_logs);

    if !stats.hourly_activity.is_empty() {
        out.push_str("\nHourly activity:\n");
        for (hour, count) in &stats.hourly_activity {
            let _ = writeln!(out, "  {hour}  {count}");
        }
    }

    if stats.recent_user_messages.is_empty() {
        out.push_str("\nNo recent user messages\n");
    } else {
        out.push_str("\nRecent user messages:\n");
        for m in stats
            .recent_user_messages
            .iter()
            .rev()
            .take(REPORT_RECENT_MESSAGES)
        {
            let _ = writeln!(
                out,
                "  {}  {} ({}): {}",
                m.timestamp.format("%H:%M:%S"),
                m.user_name,
                m.user_id,
                m.message
            );
        }
        let _ = write!(out, "\nUnique users: {}", stats.unique_users);
        if let Some(avg) = stats.average_message_length {
            let _ = write!(out, "   Avg message length: {avg:.0} chars");
        }
        out.push('\n');
    }
    out
}
