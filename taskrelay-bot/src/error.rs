/// Error handling for the bot
///
/// One unified error type covers the four failure classes the flows care
/// about:
///
/// - not-found: a referenced entity vanished; tell the initiating user
/// - validation: malformed input; re-prompt the same step
/// - database: rolled back, logged, generic apology, no automatic retry
/// - delivery: a recipient could not be reached; logged and skipped,
///   never aborts a batch
///
/// Every variant degrades to a short user-facing message. The router pairs
/// it with a navigation affordance back to a safe menu, and `/cancel` stays
/// reachable from any state.
use thiserror::Error;

use crate::payload::PayloadError;
use crate::transport::DeliveryError;

/// Bot result type alias
pub type BotResult<T> = Result<T, BotError>;

/// Unified bot error type
#[derive(Debug, Error)]
pub enum BotError {
    /// A referenced entity no longer exists
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Malformed callback payload
    #[error(transparent)]
    Payload(#[from] PayloadError),

    /// Invalid user input; the flow stays on the same step
    #[error("validation failed: {0}")]
    Validation(String),

    /// Persistence failure (already rolled back)
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Delivery failure for a direct reply
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

impl BotError {
    /// Short apologetic message shown to the user
    pub fn user_message(&self) -> String {
        match self {
            BotError::NotFound(what) => format!("❌ Sorry, that {} no longer exists.", what),
            BotError::Payload(_) => "❌ Sorry, that button is no longer valid.".to_string(),
            BotError::Validation(msg) => format!("❌ {}", msg),
            BotError::Database(_) => {
                "❌ Sorry, something went wrong on our side. Please try again.".to_string()
            }
            BotError::Delivery(_) => {
                "❌ Sorry, the message could not be delivered.".to_string()
            }
        }
    }

    /// Whether the current flow step should be retried with new input
    /// rather than abandoned
    pub fn is_retryable_input(&self) -> bool {
        matches!(self, BotError::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_names_entity() {
        let err = BotError::NotFound("project");
        assert!(err.user_message().contains("project"));
    }

    #[test]
    fn test_validation_is_retryable() {
        assert!(BotError::Validation("bad date".into()).is_retryable_input());
        assert!(!BotError::NotFound("task").is_retryable_input());
    }

    #[test]
    fn test_database_message_is_generic() {
        let err = BotError::Database(sqlx::Error::PoolTimedOut);
        let msg = err.user_message();
        assert!(!msg.contains("Pool"), "internal detail must not leak: {}", msg);
    }
}
