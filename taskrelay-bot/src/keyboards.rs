/// Inline keyboard builders
///
/// Every menu the bot shows is built here, so navigation stays consistent
/// and handlers never assemble payload strings by hand.
use taskrelay_shared::models::{Project, Task, User};

use crate::payload::CallbackAction;
use crate::transport::{Button, Keyboard};

fn btn(label: &str, action: CallbackAction) -> Button {
    Button::new(label, action.encode())
}

/// Main menu for regular users
pub fn user_main_menu() -> Keyboard {
    Keyboard::new()
        .row(vec![
            btn("📋 My tasks", CallbackAction::MyTasks),
            btn("📝 My answers", CallbackAction::MyAnswers),
        ])
        .row(vec![
            btn("👤 Profile", CallbackAction::MyProfile),
            btn("📌 Common board", CallbackAction::CommonBoard),
        ])
}

/// Admin panel root menu
pub fn admin_main_menu() -> Keyboard {
    Keyboard::new()
        .row(vec![
            btn("📁 Projects", CallbackAction::AdminProjects),
            btn("➕ New task", CallbackAction::AdminCreateTask),
        ])
        .row(vec![
            btn("📬 Review answers", CallbackAction::AdminViewAnswers),
            btn("📢 Broadcast", CallbackAction::AdminBroadcast),
        ])
        .row(vec![
            btn("🗂 Archive", CallbackAction::AdminArchive),
            btn("👥 Admins", CallbackAction::AdminManage),
        ])
        .button("🚪 Exit admin panel", CallbackAction::ExitAdmin.encode())
}

/// Projects listing with one button per active project
pub fn projects_menu(projects: &[Project]) -> Keyboard {
    let mut kb = Keyboard::new();
    for project in projects {
        kb = kb.button(&project.name, CallbackAction::ProjectDetail(project.id).encode());
    }
    kb.row(vec![
        btn("➕ New project", CallbackAction::ProjectCreate),
        btn("⬅️ Back", CallbackAction::AdminMain),
    ])
}

/// Actions on one project
pub fn project_actions_menu(project_id: i64) -> Keyboard {
    Keyboard::new()
        .row(vec![
            btn("👥 Members", CallbackAction::ProjectMembers(project_id)),
            btn("📋 Tasks", CallbackAction::ProjectTasks(project_id)),
        ])
        .row(vec![
            btn("🔗 Set board link", CallbackAction::ProjectAddBoard(project_id)),
            btn("🗂 Archive", CallbackAction::ProjectArchive(project_id)),
        ])
        .button("⬅️ Back", CallbackAction::AdminProjects.encode())
}

/// Member view of one project, with an add-member entry point
pub fn project_members_menu(project_id: i64) -> Keyboard {
    Keyboard::new()
        .button("➕ Add member", CallbackAction::ProjectAddMember(project_id).encode())
        .button("⬅️ Back", CallbackAction::ProjectDetail(project_id).encode())
}

/// Project picker for task creation
pub fn task_project_picker(projects: &[Project]) -> Keyboard {
    let mut kb = Keyboard::new();
    for project in projects {
        kb = kb.button(
            &project.name,
            CallbackAction::SelectProjectForTask(project.id).encode(),
        );
    }
    kb.button("⬅️ Back", CallbackAction::AdminMain.encode())
}

/// Active tasks of a project with a deactivate button per task
pub fn project_tasks_menu(project_id: i64, tasks: &[Task]) -> Keyboard {
    let mut kb = Keyboard::new();
    for task in tasks {
        kb = kb.button(
            format!("🚫 Deactivate '{}'", task.title),
            CallbackAction::DeactivateTask(task.id).encode(),
        );
    }
    kb.button("⬅️ Back", CallbackAction::ProjectDetail(project_id).encode())
}

/// Yes/no confirmation pair
pub fn confirmation_menu(confirm: CallbackAction) -> Keyboard {
    Keyboard::new().row(vec![
        btn("✅ Confirm", confirm),
        btn("❌ Cancel", CallbackAction::CancelAction),
    ])
}

/// Admin management submenu
pub fn admin_management_menu() -> Keyboard {
    Keyboard::new()
        .row(vec![
            btn("➕ Add admin", CallbackAction::AdminAdd),
            btn("➖ Remove admin", CallbackAction::AdminRemove),
        ])
        .row(vec![
            btn("📄 List admins", CallbackAction::AdminList),
            btn("⬅️ Back", CallbackAction::AdminMain),
        ])
}

/// Broadcast scope selection
pub fn broadcast_scope_menu() -> Keyboard {
    Keyboard::new()
        .button("🌐 Everyone", CallbackAction::BroadcastAll.encode())
        .button("📁 One project", CallbackAction::BroadcastProject.encode())
        .button("👤 One user", CallbackAction::BroadcastUser.encode())
        .button("⬅️ Back", CallbackAction::AdminMain.encode())
}

/// Project picker for a project-scoped broadcast
pub fn broadcast_project_picker(projects: &[Project]) -> Keyboard {
    let mut kb = Keyboard::new();
    for project in projects {
        kb = kb.button(
            &project.name,
            CallbackAction::BroadcastToProject(project.id).encode(),
        );
    }
    kb.button("⬅️ Back", CallbackAction::AdminBroadcast.encode())
}

/// User picker for a single-recipient broadcast
pub fn broadcast_user_picker(users: &[User]) -> Keyboard {
    let mut kb = Keyboard::new();
    for user in users {
        let label = match &user.handle {
            Some(handle) => format!("{} (@{})", user.display_name, handle),
            None => user.display_name.clone(),
        };
        kb = kb.button(label, CallbackAction::BroadcastToUser(user.id).encode());
    }
    kb.button("⬅️ Back", CallbackAction::AdminBroadcast.encode())
}

/// Task listing with one button per task
pub fn task_list_menu(tasks: &[Task], back: CallbackAction) -> Keyboard {
    let mut kb = Keyboard::new();
    for task in tasks {
        kb = kb.button(&task.title, CallbackAction::TaskDetail(task.id).encode());
    }
    kb.button("⬅️ Back", back.encode())
}

/// Actions available on a task detail view
pub fn task_detail_menu(task_id: i64, has_answer: bool) -> Keyboard {
    let answer_label = if has_answer {
        "✏️ Replace my answer"
    } else {
        "✍️ Answer"
    };
    let mut kb = Keyboard::new().row(vec![
        btn(answer_label, CallbackAction::AnswerTask(task_id)),
        btn("❓ Ask a question", CallbackAction::ClarifyTask(task_id)),
    ]);
    if has_answer {
        kb = kb.button("👀 View my answer", CallbackAction::ViewMyAnswer(task_id).encode());
    }
    kb.button("⬅️ Back", CallbackAction::MyTasks.encode())
}

/// Review queue: one button per task with pending answers
pub fn review_queue_menu(tasks_with_counts: &[(Task, i64)]) -> Keyboard {
    let mut kb = Keyboard::new();
    for (task, pending) in tasks_with_counts {
        kb = kb.button(
            format!("{} ({} pending)", task.title, pending),
            CallbackAction::ViewTaskAnswers(task.id).encode(),
        );
    }
    kb.button("⬅️ Back", CallbackAction::AdminMain.encode())
}

/// Pending answers of one task, one button per submission
///
/// `entries` pairs each submission id with the label to show (the author's
/// display name).
pub fn pending_answers_menu(entries: &[(i64, String)]) -> Keyboard {
    let mut kb = Keyboard::new();
    for (submission_id, label) in entries {
        kb = kb.button(label, CallbackAction::ViewAnswer(*submission_id).encode());
    }
    kb.button("⬅️ Back", CallbackAction::AdminViewAnswers.encode())
}

/// Moderation actions for one submission
pub fn moderation_menu(submission_id: i64, task_id: i64) -> Keyboard {
    Keyboard::new()
        .row(vec![
            btn("✅ Approve", CallbackAction::ApproveAnswer(submission_id)),
            btn("❌ Reject", CallbackAction::RejectAnswer(submission_id)),
        ])
        .button(
            "💬 Reject with feedback",
            CallbackAction::FeedbackAnswer(submission_id).encode(),
        )
        .button("⬅️ Back", CallbackAction::ViewTaskAnswers(task_id).encode())
}

/// Profile edit entry points
pub fn profile_menu() -> Keyboard {
    Keyboard::new()
        .row(vec![
            btn("✏️ Edit name", CallbackAction::EditName),
            btn("💼 Edit status", CallbackAction::EditStatus),
        ])
        .button("⬅️ Back", CallbackAction::UserMain.encode())
}

/// Single back button
pub fn back_menu(back: CallbackAction) -> Keyboard {
    Keyboard::new().button("⬅️ Back", back.encode())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_menu_payloads_decode() {
        for row in admin_main_menu().rows {
            for button in row {
                assert!(
                    CallbackAction::decode(&button.payload).is_ok(),
                    "payload {} must decode",
                    button.payload
                );
            }
        }
    }

    #[test]
    fn test_confirmation_menu_carries_target_id() {
        let kb = confirmation_menu(CallbackAction::ConfirmArchiveProject(12));
        let payloads: Vec<&str> = kb.rows[0].iter().map(|b| b.payload.as_str()).collect();
        assert!(payloads.contains(&"confirm_archive_project_12"));
        assert!(payloads.contains(&"cancel_action"));
    }

    #[test]
    fn test_pending_answers_menu_payloads_decode() {
        let kb = pending_answers_menu(&[(7, "Alice".to_string()), (9, "Bob".to_string())]);
        assert_eq!(kb.rows.len(), 3);
        assert_eq!(
            CallbackAction::decode(&kb.rows[0][0].payload).unwrap(),
            CallbackAction::ViewAnswer(7)
        );
        assert_eq!(
            CallbackAction::decode(&kb.rows[1][0].payload).unwrap(),
            CallbackAction::ViewAnswer(9)
        );
        assert_eq!(kb.rows[2][0].payload, "admin_view_answers");
    }

    #[test]
    fn test_project_tasks_menu_carries_deactivate_payloads() {
        let task = Task {
            id: 31,
            project_id: 4,
            title: "Write intro".to_string(),
            description: None,
            image_ref: None,
            deadline: None,
            created_by: None,
            active: true,
            target_user_ids: sqlx::types::Json(vec![]),
            created_at: chrono::Utc::now(),
        };
        let kb = project_tasks_menu(4, &[task]);
        assert_eq!(
            CallbackAction::decode(&kb.rows[0][0].payload).unwrap(),
            CallbackAction::DeactivateTask(31)
        );
        assert_eq!(kb.rows[1][0].payload, "project_detail_4");
    }

    #[test]
    fn test_task_detail_menu_varies_with_answer() {
        let fresh = task_detail_menu(5, false);
        let answered = task_detail_menu(5, true);
        assert!(answered.rows.len() > fresh.rows.len());
    }
}
