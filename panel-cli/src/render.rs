//! Text rendering of panel data

use chrono::{DateTime, Utc};
use panel_core::format::{format_file_size, format_number, time_ago, truncate};
use panel_core::DashboardStats;
use std::fmt::Write;

const ACTIVITY_LIMIT: usize = 5;
const TITLE_WIDTH: usize = 40;

/// Dashboard summary as shown by `panel dashboard`
pub fn render_dashboard(stats: &DashboardStats, now: DateTime<Utc>) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "📊 Dashboard");
    let _ = writeln!(
        out,
        "  Posts: {} ({} published, {} drafts)",
        format_number(stats.total_posts),
        format_number(stats.published_posts),
        format_number(stats.draft_posts)
    );
    let _ = writeln!(out, "  Pages: {}", format_number(stats.total_pages));
    let _ = writeln!(
        out,
        "  Media: {} files, {}",
        format_number(stats.total_media),
        format_file_size(stats.media_size)
    );
    let _ = writeln!(out, "  Users: {}", format_number(stats.total_users));

    if stats.recent_activity.is_empty() {
        let _ = writeln!(out, "\n  No recent activity");
        return out;
    }

    let _ = writeln!(out, "\n📝 Recent activity:");
    for item in stats.recent_activity.iter().take(ACTIVITY_LIMIT) {
        let by = item
            .user
            .as_deref()
            .map(|user| format!(" by {}", user))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "  • {} \"{}\"{} ({})",
            item.action,
            truncate(&item.title, TITLE_WIDTH),
            by,
            time_ago(item.created_at, now)
        );
    }

    if stats.recent_activity.len() > ACTIVITY_LIMIT {
        let _ = writeln!(
            out,
            "  ... and {} more",
            stats.recent_activity.len() - ACTIVITY_LIMIT
        );
    }

    out
}
