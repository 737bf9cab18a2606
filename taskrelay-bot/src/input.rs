/// Free-form input parsing for flow steps
///
/// Optional steps accept a single `-` to skip. Deadlines use the
/// `DD.MM.YYYY HH:MM` format and are stored as UTC.
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::PgPool;

use taskrelay_shared::models::{Membership, User};

use crate::error::{BotError, BotResult};

/// Single-character skip marker for optional steps
pub const SKIP: &str = "-";

/// Accepted deadline format
pub const DEADLINE_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Returns None for the skip marker, otherwise the trimmed text
pub fn optional_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed == SKIP {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parses a deadline, `-` meaning no deadline
///
/// A malformed date is a validation error; the flow stays on the deadline
/// step and asks again.
pub fn parse_deadline(text: &str) -> BotResult<Option<DateTime<Utc>>> {
    let trimmed = text.trim();
    if trimmed == SKIP {
        return Ok(None);
    }

    let naive = NaiveDateTime::parse_from_str(trimmed, DEADLINE_FORMAT).map_err(|_| {
        BotError::Validation(
            "Could not read that date. Use DD.MM.YYYY HH:MM (for example 31.12.2026 18:00), or - for no deadline."
                .to_string(),
        )
    })?;

    Ok(Some(naive.and_utc()))
}

/// Parsed target step input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSpec {
    /// Assign to every current project member
    AllMembers,

    /// Assign to the named handles (without the leading `@`)
    Handles(Vec<String>),
}

/// Parses the target step: `all`, or a whitespace-separated `@handle` list
///
/// Input containing no `@handle` tokens at all is a validation error.
pub fn parse_targets(text: &str) -> BotResult<TargetSpec> {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("all") {
        return Ok(TargetSpec::AllMembers);
    }

    let handles: Vec<String> = trimmed
        .split_whitespace()
        .filter_map(|token| token.strip_prefix('@'))
        .filter(|h| !h.is_empty())
        .map(|h| h.to_string())
        .collect();

    if handles.is_empty() {
        return Err(BotError::Validation(
            "Send 'all' to assign everyone in the project, or a list of handles like @alice @bob."
                .to_string(),
        ));
    }

    Ok(TargetSpec::Handles(handles))
}

/// Resolves a target spec against a project's current members
///
/// `AllMembers` snapshots the membership as of now. Handles that do not
/// match a registered project member are dropped without failing the flow;
/// the returned list is what actually gets assigned.
pub async fn resolve_targets(
    pool: &PgPool,
    project_id: i64,
    spec: &TargetSpec,
) -> BotResult<Vec<i64>> {
    match spec {
        TargetSpec::AllMembers => Ok(Membership::member_ids(pool, project_id).await?),
        TargetSpec::Handles(handles) => {
            let mut ids = Vec::with_capacity(handles.len());
            for handle in handles {
                match User::find_by_handle(pool, handle).await? {
                    Some(user) if Membership::is_member(pool, project_id, user.id).await? => {
                        ids.push(user.id);
                    }
                    Some(user) => {
                        tracing::debug!(handle = %handle, user_id = user.id, project_id, "target not a project member, dropped");
                    }
                    None => {
                        tracing::debug!(handle = %handle, project_id, "unknown target handle, dropped");
                    }
                }
            }
            Ok(ids)
        }
    }
}

/// Normalizes a handle argument, stripping a leading `@`
pub fn normalize_handle(text: &str) -> BotResult<String> {
    let handle = text.trim().trim_start_matches('@');
    if handle.is_empty() || handle.contains(char::is_whitespace) {
        return Err(BotError::Validation(
            "Send a single handle, like @alice.".to_string(),
        ));
    }
    Ok(handle.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_optional_text_skip() {
        assert_eq!(optional_text("-"), None);
        assert_eq!(optional_text("  -  "), None);
        assert_eq!(optional_text(" keep me "), Some("keep me".to_string()));
    }

    #[test]
    fn test_parse_deadline_valid() {
        let deadline = parse_deadline("31.12.2026 18:00").unwrap().unwrap();
        assert_eq!(deadline.day(), 31);
        assert_eq!(deadline.month(), 12);
        assert_eq!(deadline.year(), 2026);
        assert_eq!(deadline.hour(), 18);
    }

    #[test]
    fn test_parse_deadline_skip() {
        assert_eq!(parse_deadline("-").unwrap(), None);
    }

    #[test]
    fn test_parse_deadline_malformed_is_validation_error() {
        for bad in ["2026-12-31 18:00", "31.12.2026", "tomorrow", ""] {
            let err = parse_deadline(bad).unwrap_err();
            assert!(err.is_retryable_input(), "{:?} should re-prompt", bad);
        }
    }

    #[test]
    fn test_parse_targets_all_is_case_insensitive() {
        assert_eq!(parse_targets("all").unwrap(), TargetSpec::AllMembers);
        assert_eq!(parse_targets("  ALL ").unwrap(), TargetSpec::AllMembers);
    }

    #[test]
    fn test_parse_targets_handles() {
        assert_eq!(
            parse_targets("@alice @bob").unwrap(),
            TargetSpec::Handles(vec!["alice".to_string(), "bob".to_string()])
        );
        // Tokens without @ are ignored as long as at least one handle remains
        assert_eq!(
            parse_targets("@alice and @bob").unwrap(),
            TargetSpec::Handles(vec!["alice".to_string(), "bob".to_string()])
        );
    }

    #[test]
    fn test_parse_targets_rejects_empty() {
        assert!(parse_targets("").is_err());
        assert!(parse_targets("alice bob").is_err());
        assert!(parse_targets("@").is_err());
    }

    #[test]
    fn test_normalize_handle() {
        assert_eq!(normalize_handle("@alice").unwrap(), "alice");
        assert_eq!(normalize_handle("alice").unwrap(), "alice");
        assert!(normalize_handle("").is_err());
        assert!(normalize_handle("@a b").is_err());
    }
}
