/// Callback payload encoding
///
/// Every inline button carries a compact string payload of the form
/// `verb` or `verb_<id>`. Payloads are decoded fail-closed: an unknown verb
/// or a malformed id is rejected rather than partially interpreted, since a
/// stale client may press buttons from a previous version of a menu.
use std::fmt;

use thiserror::Error;

/// Payload decoding failure
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    /// The verb is not one the router knows
    #[error("unknown callback action: {0}")]
    UnknownAction(String),

    /// The id suffix is not a valid integer
    #[error("invalid id in callback payload: {0}")]
    InvalidId(String),
}

/// Decoded button press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    // Admin navigation
    AdminMain,
    AdminProjects,
    AdminManage,
    AdminCreateTask,
    AdminViewAnswers,
    AdminBroadcast,
    AdminArchive,
    AdminAdd,
    AdminRemove,
    AdminList,
    ExitAdmin,

    // Project management
    ProjectCreate,
    ProjectDetail(i64),
    ProjectMembers(i64),
    ProjectAddMember(i64),
    ProjectTasks(i64),
    ProjectAddBoard(i64),
    ProjectArchive(i64),
    ConfirmArchiveProject(i64),
    SelectProjectForTask(i64),

    // User navigation
    UserMain,
    MyTasks,
    MyAnswers,
    MyProfile,
    CommonBoard,
    EditName,
    EditStatus,

    // Task management
    DeactivateTask(i64),
    ConfirmDeactivateTask(i64),

    // Task interaction
    TaskDetail(i64),
    AnswerTask(i64),
    ClarifyTask(i64),
    ViewMyAnswer(i64),

    // Review
    ViewTaskAnswers(i64),
    ViewAnswer(i64),
    ApproveAnswer(i64),
    RejectAnswer(i64),
    FeedbackAnswer(i64),

    // Broadcast
    BroadcastAll,
    BroadcastProject,
    BroadcastUser,
    BroadcastToProject(i64),
    BroadcastToUser(i64),

    // Shared
    CancelAction,
}

impl CallbackAction {
    /// Decodes a payload string, rejecting anything not produced by
    /// [`CallbackAction::encode`]
    pub fn decode(payload: &str) -> Result<Self, PayloadError> {
        use CallbackAction::*;

        let action = match payload {
            "admin_main" => AdminMain,
            "admin_projects" => AdminProjects,
            "admin_manage" => AdminManage,
            "admin_create_task" => AdminCreateTask,
            "admin_view_answers" => AdminViewAnswers,
            "admin_broadcast" => AdminBroadcast,
            "admin_archive" => AdminArchive,
            "admin_add" => AdminAdd,
            "admin_remove" => AdminRemove,
            "admin_list" => AdminList,
            "exit_admin" => ExitAdmin,
            "project_create" => ProjectCreate,
            "user_main" => UserMain,
            "my_tasks" => MyTasks,
            "my_answers" => MyAnswers,
            "my_profile" => MyProfile,
            "common_board" => CommonBoard,
            "edit_name" => EditName,
            "edit_status" => EditStatus,
            "broadcast_all" => BroadcastAll,
            "broadcast_project" => BroadcastProject,
            "broadcast_user" => BroadcastUser,
            "cancel_action" => CancelAction,
            other => return Self::decode_with_id(other),
        };

        Ok(action)
    }

    fn decode_with_id(payload: &str) -> Result<Self, PayloadError> {
        use CallbackAction::*;

        const PREFIXES: &[(&str, fn(i64) -> CallbackAction)] = &[
            ("project_detail_", ProjectDetail),
            ("project_members_", ProjectMembers),
            ("project_add_member_", ProjectAddMember),
            ("project_tasks_", ProjectTasks),
            ("project_add_board_", ProjectAddBoard),
            ("project_archive_", ProjectArchive),
            ("confirm_archive_project_", ConfirmArchiveProject),
            ("select_project_task_", SelectProjectForTask),
            ("deactivate_task_", DeactivateTask),
            ("confirm_deactivate_task_", ConfirmDeactivateTask),
            ("task_detail_", TaskDetail),
            ("answer_task_", AnswerTask),
            ("clarify_task_", ClarifyTask),
            ("view_my_answer_", ViewMyAnswer),
            ("view_task_answers_", ViewTaskAnswers),
            ("view_answer_", ViewAnswer),
            ("approve_answer_", ApproveAnswer),
            ("reject_answer_", RejectAnswer),
            ("feedback_answer_", FeedbackAnswer),
            ("broadcast_to_project_", BroadcastToProject),
            ("broadcast_to_user_", BroadcastToUser),
        ];

        for (prefix, make) in PREFIXES {
            if let Some(rest) = payload.strip_prefix(prefix) {
                let id: i64 = rest
                    .parse()
                    .map_err(|_| PayloadError::InvalidId(payload.to_string()))?;
                return Ok(make(id));
            }
        }

        Err(PayloadError::UnknownAction(payload.to_string()))
    }

    /// Encodes the action into its payload string
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use CallbackAction::*;

        match self {
            AdminMain => write!(f, "admin_main"),
            AdminProjects => write!(f, "admin_projects"),
            AdminManage => write!(f, "admin_manage"),
            AdminCreateTask => write!(f, "admin_create_task"),
            AdminViewAnswers => write!(f, "admin_view_answers"),
            AdminBroadcast => write!(f, "admin_broadcast"),
            AdminArchive => write!(f, "admin_archive"),
            AdminAdd => write!(f, "admin_add"),
            AdminRemove => write!(f, "admin_remove"),
            AdminList => write!(f, "admin_list"),
            ExitAdmin => write!(f, "exit_admin"),
            ProjectCreate => write!(f, "project_create"),
            ProjectDetail(id) => write!(f, "project_detail_{}", id),
            ProjectMembers(id) => write!(f, "project_members_{}", id),
            ProjectAddMember(id) => write!(f, "project_add_member_{}", id),
            ProjectTasks(id) => write!(f, "project_tasks_{}", id),
            ProjectAddBoard(id) => write!(f, "project_add_board_{}", id),
            ProjectArchive(id) => write!(f, "project_archive_{}", id),
            ConfirmArchiveProject(id) => write!(f, "confirm_archive_project_{}", id),
            SelectProjectForTask(id) => write!(f, "select_project_task_{}", id),
            DeactivateTask(id) => write!(f, "deactivate_task_{}", id),
            ConfirmDeactivateTask(id) => write!(f, "confirm_deactivate_task_{}", id),
            UserMain => write!(f, "user_main"),
            MyTasks => write!(f, "my_tasks"),
            MyAnswers => write!(f, "my_answers"),
            MyProfile => write!(f, "my_profile"),
            CommonBoard => write!(f, "common_board"),
            EditName => write!(f, "edit_name"),
            EditStatus => write!(f, "edit_status"),
            TaskDetail(id) => write!(f, "task_detail_{}", id),
            AnswerTask(id) => write!(f, "answer_task_{}", id),
            ClarifyTask(id) => write!(f, "clarify_task_{}", id),
            ViewMyAnswer(id) => write!(f, "view_my_answer_{}", id),
            ViewTaskAnswers(id) => write!(f, "view_task_answers_{}", id),
            ViewAnswer(id) => write!(f, "view_answer_{}", id),
            ApproveAnswer(id) => write!(f, "approve_answer_{}", id),
            RejectAnswer(id) => write!(f, "reject_answer_{}", id),
            FeedbackAnswer(id) => write!(f, "feedback_answer_{}", id),
            BroadcastAll => write!(f, "broadcast_all"),
            BroadcastProject => write!(f, "broadcast_project"),
            BroadcastUser => write!(f, "broadcast_user"),
            BroadcastToProject(id) => write!(f, "broadcast_to_project_{}", id),
            BroadcastToUser(id) => write!(f, "broadcast_to_user_{}", id),
            CancelAction => write!(f, "cancel_action"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_verbs() {
        assert_eq!(CallbackAction::decode("admin_main").unwrap(), CallbackAction::AdminMain);
        assert_eq!(CallbackAction::decode("my_tasks").unwrap(), CallbackAction::MyTasks);
        assert_eq!(
            CallbackAction::decode("cancel_action").unwrap(),
            CallbackAction::CancelAction
        );
    }

    #[test]
    fn test_decode_id_verbs() {
        assert_eq!(
            CallbackAction::decode("task_detail_42").unwrap(),
            CallbackAction::TaskDetail(42)
        );
        assert_eq!(
            CallbackAction::decode("confirm_archive_project_7").unwrap(),
            CallbackAction::ConfirmArchiveProject(7)
        );
        assert_eq!(
            CallbackAction::decode("broadcast_to_user_1001").unwrap(),
            CallbackAction::BroadcastToUser(1001)
        );
        assert_eq!(
            CallbackAction::decode("confirm_deactivate_task_8").unwrap(),
            CallbackAction::ConfirmDeactivateTask(8)
        );
    }

    #[test]
    fn test_decode_rejects_unknown_verbs() {
        assert_eq!(
            CallbackAction::decode("frobnicate"),
            Err(PayloadError::UnknownAction("frobnicate".to_string()))
        );
        assert_eq!(
            CallbackAction::decode(""),
            Err(PayloadError::UnknownAction(String::new()))
        );
    }

    #[test]
    fn test_decode_rejects_malformed_ids() {
        assert!(matches!(
            CallbackAction::decode("task_detail_abc"),
            Err(PayloadError::InvalidId(_))
        ));
        assert!(matches!(
            CallbackAction::decode("task_detail_"),
            Err(PayloadError::InvalidId(_))
        ));
    }

    #[test]
    fn test_longer_prefix_wins() {
        // "project_add_member_" must not be swallowed by a shorter prefix
        assert_eq!(
            CallbackAction::decode("project_add_member_3").unwrap(),
            CallbackAction::ProjectAddMember(3)
        );
        assert_eq!(
            CallbackAction::decode("project_add_board_3").unwrap(),
            CallbackAction::ProjectAddBoard(3)
        );
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let actions = [
            CallbackAction::AdminViewAnswers,
            CallbackAction::ProjectDetail(1),
            CallbackAction::SelectProjectForTask(99),
            CallbackAction::ApproveAnswer(5),
            CallbackAction::BroadcastToProject(12),
            CallbackAction::ExitAdmin,
        ];
        for action in actions {
            assert_eq!(CallbackAction::decode(&action.encode()).unwrap(), action);
        }
    }
}
