/// Authorization checks
///
/// Capabilities derive from the stored user role at dispatch time, never
/// from the session, so a demoted admin loses access on their next event.
use sha2::{Digest, Sha256};

use taskrelay_shared::models::UserRole;

use crate::payload::CallbackAction;

/// What the sender of the current event may do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub manage_projects: bool,
    pub manage_tasks: bool,
    pub review_answers: bool,
    pub broadcast: bool,
    pub manage_admins: bool,
}

impl Capabilities {
    pub fn for_role(role: UserRole) -> Self {
        let admin = role.is_admin();
        Self {
            manage_projects: admin,
            manage_tasks: admin,
            review_answers: admin,
            broadcast: admin,
            manage_admins: admin,
        }
    }

    /// Whether the admin panel is reachable at all
    pub fn admin_panel(&self) -> bool {
        self.manage_projects
    }

    /// Whether the sender may perform this action
    ///
    /// Each button is gated on the one capability its surface belongs to;
    /// actions reachable from the user menu need none.
    pub fn permits(&self, action: CallbackAction) -> bool {
        use CallbackAction::*;
        match action {
            AdminMain | AdminProjects | AdminArchive | ExitAdmin | ProjectCreate
            | ProjectDetail(_) | ProjectMembers(_) | ProjectAddMember(_) | ProjectTasks(_)
            | ProjectAddBoard(_) | ProjectArchive(_) | ConfirmArchiveProject(_) => {
                self.manage_projects
            }

            AdminCreateTask | SelectProjectForTask(_) | DeactivateTask(_)
            | ConfirmDeactivateTask(_) => self.manage_tasks,

            AdminViewAnswers | ViewTaskAnswers(_) | ViewAnswer(_) | ApproveAnswer(_)
            | RejectAnswer(_) | FeedbackAnswer(_) => self.review_answers,

            AdminBroadcast | BroadcastAll | BroadcastProject | BroadcastUser
            | BroadcastToProject(_) | BroadcastToUser(_) => self.broadcast,

            AdminManage | AdminAdd | AdminRemove | AdminList => self.manage_admins,

            UserMain | MyTasks | MyAnswers | MyProfile | CommonBoard | EditName | EditStatus
            | TaskDetail(_) | AnswerTask(_) | ClarifyTask(_) | ViewMyAnswer(_) | CancelAction => {
                true
            }
        }
    }
}

/// Compares a supplied passphrase against the configured one
///
/// Both sides are hashed before comparison so equal-length digests are
/// compared rather than raw inputs of differing lengths.
pub fn verify_passphrase(configured: &str, supplied: &str) -> bool {
    let expected = Sha256::digest(configured.as_bytes());
    let got = Sha256::digest(supplied.trim().as_bytes());
    expected == got
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_has_no_admin_capabilities() {
        let caps = Capabilities::for_role(UserRole::User);
        assert!(!caps.admin_panel());
        assert!(!caps.review_answers);
        assert!(!caps.manage_admins);
    }

    #[test]
    fn test_admin_has_all_capabilities() {
        let caps = Capabilities::for_role(UserRole::Admin);
        assert!(caps.admin_panel());
        assert!(caps.manage_tasks);
        assert!(caps.broadcast);
    }

    #[test]
    fn test_user_actions_need_no_capability() {
        let caps = Capabilities::for_role(UserRole::User);
        assert!(caps.permits(CallbackAction::MyTasks));
        assert!(caps.permits(CallbackAction::TaskDetail(3)));
        assert!(caps.permits(CallbackAction::AnswerTask(3)));
        assert!(caps.permits(CallbackAction::CancelAction));
    }

    #[test]
    fn test_privileged_actions_gated_on_their_capability() {
        let mut caps = Capabilities::for_role(UserRole::User);
        assert!(!caps.permits(CallbackAction::ApproveAnswer(1)));
        assert!(!caps.permits(CallbackAction::BroadcastAll));
        assert!(!caps.permits(CallbackAction::AdminAdd));
        assert!(!caps.permits(CallbackAction::ConfirmDeactivateTask(1)));

        caps.review_answers = true;
        assert!(caps.permits(CallbackAction::ApproveAnswer(1)));
        assert!(!caps.permits(CallbackAction::BroadcastAll));
    }

    #[test]
    fn test_admin_permitted_everywhere() {
        let caps = Capabilities::for_role(UserRole::Admin);
        assert!(caps.permits(CallbackAction::ConfirmArchiveProject(2)));
        assert!(caps.permits(CallbackAction::DeactivateTask(2)));
        assert!(caps.permits(CallbackAction::BroadcastToUser(2)));
        assert!(caps.permits(CallbackAction::AdminRemove));
    }

    #[test]
    fn test_verify_passphrase() {
        assert!(verify_passphrase("s3cret", "s3cret"));
        assert!(verify_passphrase("s3cret", "  s3cret  "));
        assert!(!verify_passphrase("s3cret", "S3cret"));
        assert!(!verify_passphrase("s3cret", ""));
    }
}
