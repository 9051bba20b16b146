//! User-facing message texts.

use crate::job::{FailureReason, Job};

/// Lines of tool diagnostics shown for a transform failure.
pub const TRANSFORM_EXCERPT_LINES: usize = 5;

/// Progress message sent when a job starts.
pub fn started_message(job: &Job) -> String {
    format!(
        "🔥 Processing your video from {}...\nURL: {}",
        job.origin, job.source_url
    )
}

/// Terminal message for a failed job.
pub fn failure_message(job: &Job, reason: &FailureReason) -> String {
    let mut text = format!(
        "⚠️ {}.\nURL: {}",
        reason.kind.headline(),
        job.source_url
    );
    if !reason.detail.is_empty() {
        text.push_str("\nDetails:\n");
        text.push_str(&reason.detail);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{ErrorKind, JobOrigin};

    #[test]
    fn test_started_message_names_origin() {
        let job = Job::new("https://example.com/v1", JobOrigin::Bot { user_id: 99 });
        let text = started_message(&job);
        assert!(text.contains("Telegram User: 99"));
        assert!(text.contains("https://example.com/v1"));
    }

    #[test]
    fn test_failure_message_includes_detail() {
        let job = Job::new(
            "https://example.com/v1",
            JobOrigin::Api {
                method: "GET".to_string(),
            },
        );
        let reason = FailureReason::new(ErrorKind::TransformFailed, "line 4\nline 5");
        let text = failure_message(&job, &reason);
        assert!(text.starts_with("⚠️ Video processing failed."));
        assert!(text.ends_with("Details:\nline 4\nline 5"));
    }

    #[test]
    fn test_failure_message_without_detail() {
        let job = Job::new("https://example.com/v1", JobOrigin::Bot { user_id: 1 });
        let reason = FailureReason::new(ErrorKind::Internal, "");
        assert!(!failure_message(&job, &reason).contains("Details"));
    }
}
