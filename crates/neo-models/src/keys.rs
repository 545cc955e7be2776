//! Cache key schema and fixed per-feature TTLs.

use std::time::Duration;

use crate::ids::VideoId;

/// Hash field holding the [`crate::VideoStatus`] of a video.
pub const ANALYSIS_STATUS_FIELD: &str = "analysis_status";

/// Recommendations expire after one hour.
pub const RECOMMENDATIONS_TTL: Duration = Duration::from_secs(3600);

/// Creator insights expire after 24 hours.
pub const CREATOR_INSIGHTS_TTL: Duration = Duration::from_secs(86_400);

/// Maximum number of entries kept per user in the search history list.
pub const SEARCH_HISTORY_LIMIT: usize = 100;

/// Read-only preferences written by other services.
pub fn user_preferences(user_id: &str) -> String {
    format!("user_preferences:{}", user_id)
}

pub fn recommendations(user_id: &str) -> String {
    format!("recommendations:{}", user_id)
}

/// Per-video hash; see [`ANALYSIS_STATUS_FIELD`].
pub fn video(video_id: &VideoId) -> String {
    format!("video:{}", video_id)
}

pub fn creator_insights(user_id: &str) -> String {
    format!("creator_insights:{}", user_id)
}

pub fn search_history(user_id: &str) -> String {
    format!("search_history:{}", user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_follow_schema() {
        assert_eq!(user_preferences("u1"), "user_preferences:u1");
        assert_eq!(recommendations("u1"), "recommendations:u1");
        assert_eq!(video(&VideoId::from("v1")), "video:v1");
        assert_eq!(creator_insights("u1"), "creator_insights:u1");
        assert_eq!(search_history("u1"), "search_history:u1");
    }

    #[test]
    fn ttls_are_fixed() {
        assert_eq!(RECOMMENDATIONS_TTL.as_secs(), 3600);
        assert_eq!(CREATOR_INSIGHTS_TTL.as_secs(), 86_400);
    }
}
