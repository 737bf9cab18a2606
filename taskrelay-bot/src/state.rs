/// Conversation states
///
/// Each chat is in exactly one state at a time. `Idle` means no flow is in
/// progress and free-form text gets a gentle nudge back to the menu. Every
/// other state names the input the bot is waiting for; `/cancel` returns to
/// `Idle` from any of them.
///
/// Flows are linear. A state that needs context beyond the chat itself
/// (which task is being answered, which submission is being reviewed)
/// carries the entity id, so a crash of one step cannot be misapplied to
/// another entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConvState {
    /// No flow in progress
    #[default]
    Idle,

    /// Waiting for the admin passphrase
    AwaitAdminPassword,

    // Project creation
    /// Waiting for the new project's name
    ProjectName,

    /// Waiting for the description (`-` skips)
    ProjectDescription,

    /// Waiting for the board link (`-` skips); completes the flow
    ProjectBoard,

    /// Waiting for a board link for an existing project
    ProjectBoardFor(i64),

    /// Waiting for a handle to add to a project's members
    AddMemberHandle(i64),

    // Task creation (project is chosen via buttons before these)
    /// Waiting for the task title
    TaskTitle,

    /// Waiting for the description (`-` skips)
    TaskDescription,

    /// Waiting for a photo (`-` skips)
    TaskMedia,

    /// Waiting for the target list (`all` or `@handle` list)
    TaskTargets,

    /// Waiting for the deadline (`DD.MM.YYYY HH:MM` or `-`); completes
    /// the flow
    TaskDeadline,

    // Admin management
    /// Waiting for the handle to promote
    AddAdminHandle,

    /// Waiting for the handle to demote
    RemoveAdminHandle,

    /// Waiting for the broadcast text (scope already chosen)
    BroadcastMessage,

    // User flows
    /// Waiting for an answer to the task
    AwaitAnswer(i64),

    /// Waiting for a clarification question about the task
    AwaitClarification(i64),

    /// Waiting for rejection feedback on the submission
    AwaitFeedback(i64),

    /// Waiting for a new display name
    EditName,

    /// Waiting for a new status line
    EditStatus,
}

impl ConvState {
    pub fn is_idle(&self) -> bool {
        matches!(self, ConvState::Idle)
    }

    /// Whether this state consumes free-form text input
    pub fn expects_text(&self) -> bool {
        !self.is_idle()
    }

    /// Whether this state also accepts a photo
    pub fn accepts_photo(&self) -> bool {
        matches!(self, ConvState::TaskMedia | ConvState::AwaitAnswer(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        assert!(ConvState::default().is_idle());
        assert!(!ConvState::default().expects_text());
    }

    #[test]
    fn test_photo_acceptance() {
        assert!(ConvState::TaskMedia.accepts_photo());
        assert!(ConvState::AwaitAnswer(3).accepts_photo());
        assert!(!ConvState::TaskTitle.accepts_photo());
        assert!(!ConvState::Idle.accepts_photo());
    }
}
