/// Admin flows: login, project and task management, review, broadcast,
/// and admin roster changes
///
/// Every mutating flow writes its audit row in the same transaction as the
/// mutation, then sends notifications after commit. Notification failures
/// never roll anything back.
use taskrelay_shared::models::project::CreateProject;
use taskrelay_shared::models::task::CreateTask;
use taskrelay_shared::models::{
    AdminAction, Membership, Project, Submission, Task, User, UserRole,
};

use crate::authz::verify_passphrase;
use crate::context::Context;
use crate::error::{BotError, BotResult};
use crate::input::{self, TargetSpec};
use crate::keyboards;
use crate::payload::CallbackAction;
use crate::session::BroadcastScope;
use crate::state::ConvState;

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

/// `/admin`: open the panel directly for admins, otherwise ask for the
/// passphrase
pub async fn login_entry(ctx: &Context, user: &User) -> BotResult<()> {
    if user.role.is_admin() {
        ctx.sessions.clear(user.chat_id).await;
        return show_admin_menu(ctx, user.chat_id).await;
    }

    ctx.sessions.enter(user.chat_id, ConvState::AwaitAdminPassword).await;
    ctx.reply(user.chat_id, "🔐 Enter the admin passphrase:", None).await
}

/// Passphrase attempt. One shot: a wrong passphrase ends the flow.
pub async fn handle_password(ctx: &Context, user: &User, text: &str) -> BotResult<()> {
    ctx.sessions.clear(user.chat_id).await;

    if !verify_passphrase(&ctx.admin_passphrase, text) {
        tracing::warn!(chat_id = user.chat_id, "failed admin login attempt");
        return ctx
            .reply(user.chat_id, "❌ Wrong passphrase.", Some(keyboards::user_main_menu()))
            .await;
    }

    let admin = User::grant_admin_by_chat_id(
        &ctx.pool,
        user.chat_id,
        user.handle.as_deref(),
        &user.display_name,
    )
    .await?;
    AdminAction::record(&ctx.pool, admin.id, "admin_login", Some(admin.id), "passphrase login")
        .await?;

    tracing::info!(user_id = admin.id, "admin login");
    ctx.reply(
        user.chat_id,
        "✅ Welcome to the admin panel.",
        Some(keyboards::admin_main_menu()),
    )
    .await
}

/// Shows the admin panel root menu
pub async fn show_admin_menu(ctx: &Context, chat_id: i64) -> BotResult<()> {
    ctx.reply(chat_id, "⚙️ Admin panel", Some(keyboards::admin_main_menu())).await
}

/// Leaves the admin panel back to the user menu (the role is untouched)
pub async fn exit_admin(ctx: &Context, chat_id: i64) -> BotResult<()> {
    ctx.sessions.clear(chat_id).await;
    ctx.reply(chat_id, "👋 Back to the main menu.", Some(keyboards::user_main_menu())).await
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

pub async fn show_projects(ctx: &Context, chat_id: i64) -> BotResult<()> {
    let projects = Project::list_active(&ctx.pool).await?;
    let text = if projects.is_empty() {
        "📁 No active projects yet.".to_string()
    } else {
        format!("📁 Active projects: {}", projects.len())
    };
    ctx.reply(chat_id, text, Some(keyboards::projects_menu(&projects))).await
}

pub async fn show_project_detail(ctx: &Context, chat_id: i64, project_id: i64) -> BotResult<()> {
    let project = Project::find_by_id(&ctx.pool, project_id)
        .await?
        .ok_or(BotError::NotFound("project"))?;

    let members = Membership::count_by_project(&ctx.pool, project_id).await?;
    let tasks = Task::count_active_by_project(&ctx.pool, project_id).await?;

    let mut text = format!("📁 {}\n", project.name);
    if let Some(description) = &project.description {
        text.push_str(&format!("\n{}\n", description));
    }
    if let Some(board) = &project.board_link {
        text.push_str(&format!("\n🔗 Board: {}\n", board));
    }
    text.push_str(&format!("\n👥 Members: {}\n📋 Active tasks: {}", members, tasks));

    ctx.reply(chat_id, text, Some(keyboards::project_actions_menu(project_id))).await
}

pub async fn show_project_members(ctx: &Context, chat_id: i64, project_id: i64) -> BotResult<()> {
    let project = Project::find_by_id(&ctx.pool, project_id)
        .await?
        .ok_or(BotError::NotFound("project"))?;
    let members = Membership::list_members(&ctx.pool, project_id).await?;

    let mut text = format!("👥 Members of {}:\n", project.name);
    if members.is_empty() {
        text.push_str("\n(nobody yet)");
    }
    for member in &members {
        match &member.handle {
            Some(handle) => text.push_str(&format!("\n• {} (@{})", member.display_name, handle)),
            None => text.push_str(&format!("\n• {}", member.display_name)),
        }
    }

    ctx.reply(chat_id, text, Some(keyboards::project_members_menu(project_id))).await
}

pub async fn start_add_member(ctx: &Context, chat_id: i64, project_id: i64) -> BotResult<()> {
    Project::find_by_id(&ctx.pool, project_id)
        .await?
        .ok_or(BotError::NotFound("project"))?;
    ctx.sessions.enter(chat_id, ConvState::AddMemberHandle(project_id)).await;
    ctx.reply(chat_id, "👤 Send the handle to add, like @alice:", None).await
}

pub async fn handle_add_member(
    ctx: &Context,
    admin: &User,
    project_id: i64,
    text: &str,
) -> BotResult<()> {
    let handle = input::normalize_handle(text)?;
    let target = User::find_by_handle(&ctx.pool, &handle)
        .await?
        .ok_or_else(|| BotError::Validation(format!("@{} has not started the bot yet.", handle)))?;

    if Membership::is_member(&ctx.pool, project_id, target.id).await? {
        ctx.sessions.clear(admin.chat_id).await;
        return ctx
            .reply(
                admin.chat_id,
                format!("ℹ️ @{} is already a member.", handle),
                Some(keyboards::back_menu(CallbackAction::ProjectMembers(project_id))),
            )
            .await;
    }

    let mut tx = ctx.pool.begin().await?;
    Membership::create(&mut *tx, project_id, target.id, "participant").await?;
    AdminAction::record(
        &mut *tx,
        admin.id,
        "add_member",
        Some(project_id),
        &format!("added @{}", handle),
    )
    .await?;
    tx.commit().await?;

    ctx.sessions.clear(admin.chat_id).await;
    tracing::info!(project_id, user_id = target.id, "member added");
    ctx.reply(
        admin.chat_id,
        format!("✅ @{} added to the project.", handle),
        Some(keyboards::back_menu(CallbackAction::ProjectMembers(project_id))),
    )
    .await
}

pub async fn show_project_tasks(ctx: &Context, chat_id: i64, project_id: i64) -> BotResult<()> {
    let project = Project::find_by_id(&ctx.pool, project_id)
        .await?
        .ok_or(BotError::NotFound("project"))?;
    let tasks = Task::list_active_by_project(&ctx.pool, project_id).await?;

    let mut text = format!("📋 Tasks in {}:\n", project.name);
    if tasks.is_empty() {
        text.push_str("\n(no active tasks)");
    }
    for task in &tasks {
        let pending = Submission::count_pending_by_task(&ctx.pool, task.id).await?;
        text.push_str(&format!("\n• {} ({} pending answers)", task.title, pending));
    }

    ctx.reply(chat_id, text, Some(keyboards::project_tasks_menu(project_id, &tasks))).await
}

pub async fn request_deactivate(ctx: &Context, chat_id: i64, task_id: i64) -> BotResult<()> {
    let task = Task::find_by_id(&ctx.pool, task_id)
        .await?
        .ok_or(BotError::NotFound("task"))?;

    ctx.reply(
        chat_id,
        format!("🚫 Deactivate '{}'? Members will no longer see it.", task.title),
        Some(keyboards::confirmation_menu(CallbackAction::ConfirmDeactivateTask(task_id))),
    )
    .await
}

/// Deactivates a task, auditing the change in the same transaction
pub async fn confirm_deactivate(ctx: &Context, admin: &User, task_id: i64) -> BotResult<()> {
    let mut tx = ctx.pool.begin().await?;
    let Some(task) = Task::deactivate(&mut *tx, task_id).await? else {
        tx.rollback().await?;
        return ctx
            .reply(
                admin.chat_id,
                "ℹ️ That task is already inactive or gone.",
                Some(keyboards::back_menu(CallbackAction::AdminMain)),
            )
            .await;
    };
    AdminAction::record(&mut *tx, admin.id, "deactivate_task", Some(task.id), &task.title)
        .await?;
    tx.commit().await?;

    tracing::info!(task_id, "task deactivated");
    ctx.reply(
        admin.chat_id,
        format!("🚫 '{}' is now inactive.", task.title),
        Some(keyboards::back_menu(CallbackAction::ProjectTasks(task.project_id))),
    )
    .await
}

pub async fn show_archive(ctx: &Context, chat_id: i64) -> BotResult<()> {
    let projects = Project::list_archived(&ctx.pool).await?;
    let mut text = "🗂 Archived projects:\n".to_string();
    if projects.is_empty() {
        text.push_str("\n(empty)");
    }
    for project in &projects {
        text.push_str(&format!("\n• {}", project.name));
    }
    ctx.reply(chat_id, text, Some(keyboards::back_menu(CallbackAction::AdminMain))).await
}

// --- creation flow: name, description, board link ---

pub async fn start_project_creation(ctx: &Context, chat_id: i64) -> BotResult<()> {
    ctx.sessions.enter(chat_id, ConvState::ProjectName).await;
    ctx.reply(chat_id, "📁 Name of the new project:", None).await
}

pub async fn handle_project_name(ctx: &Context, chat_id: i64, text: &str) -> BotResult<()> {
    let name = text.trim();
    if name.is_empty() {
        return Err(BotError::Validation("The project name cannot be empty.".to_string()));
    }
    let name = name.to_string();
    ctx.sessions
        .update(chat_id, |s| {
            s.project.name = Some(name);
            s.state = ConvState::ProjectDescription;
        })
        .await;
    ctx.reply(chat_id, "📝 Description (or - to skip):", None).await
}

pub async fn handle_project_description(ctx: &Context, chat_id: i64, text: &str) -> BotResult<()> {
    let description = input::optional_text(text);
    ctx.sessions
        .update(chat_id, |s| {
            s.project.description = description;
            s.state = ConvState::ProjectBoard;
        })
        .await;
    ctx.reply(chat_id, "🔗 Board link (or - to skip):", None).await
}

/// Final step: persists the project and its audit row atomically
pub async fn handle_project_board(ctx: &Context, admin: &User, text: &str) -> BotResult<()> {
    let session = ctx
        .sessions
        .take(admin.chat_id)
        .await
        .ok_or(BotError::NotFound("draft"))?;
    let name = session.project.name.ok_or(BotError::NotFound("draft"))?;

    let mut tx = ctx.pool.begin().await?;
    let project = Project::create(
        &mut *tx,
        CreateProject {
            name,
            description: session.project.description,
            board_link: input::optional_text(text),
            created_by: Some(admin.id),
        },
    )
    .await?;
    AdminAction::record(
        &mut *tx,
        admin.id,
        "create_project",
        Some(project.id),
        &project.name,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(project_id = project.id, "project created");
    ctx.reply(
        admin.chat_id,
        format!("✅ Project '{}' created.", project.name),
        Some(keyboards::back_menu(CallbackAction::AdminProjects)),
    )
    .await
}

// --- board link for an existing project ---

pub async fn start_board_link(ctx: &Context, chat_id: i64, project_id: i64) -> BotResult<()> {
    Project::find_by_id(&ctx.pool, project_id)
        .await?
        .ok_or(BotError::NotFound("project"))?;
    ctx.sessions.enter(chat_id, ConvState::ProjectBoardFor(project_id)).await;
    ctx.reply(chat_id, "🔗 Send the new board link:", None).await
}

pub async fn handle_board_link(
    ctx: &Context,
    chat_id: i64,
    project_id: i64,
    text: &str,
) -> BotResult<()> {
    let link = text.trim();
    if link.is_empty() {
        return Err(BotError::Validation("The link cannot be empty.".to_string()));
    }

    Project::set_board_link(&ctx.pool, project_id, link)
        .await?
        .ok_or(BotError::NotFound("project"))?;

    ctx.sessions.clear(chat_id).await;
    ctx.reply(
        chat_id,
        "✅ Board link updated.",
        Some(keyboards::back_menu(CallbackAction::ProjectDetail(project_id))),
    )
    .await
}

// --- archiving, with confirmation ---

pub async fn request_archive(ctx: &Context, chat_id: i64, project_id: i64) -> BotResult<()> {
    let project = Project::find_by_id(&ctx.pool, project_id)
        .await?
        .ok_or(BotError::NotFound("project"))?;
    ctx.reply(
        chat_id,
        format!("🗂 Archive '{}'? This cannot be undone.", project.name),
        Some(keyboards::confirmation_menu(CallbackAction::ConfirmArchiveProject(project_id))),
    )
    .await
}

pub async fn confirm_archive(ctx: &Context, admin: &User, project_id: i64) -> BotResult<()> {
    let mut tx = ctx.pool.begin().await?;
    let archived = Project::archive(&mut *tx, project_id).await?;
    let Some(project) = archived else {
        tx.rollback().await?;
        return ctx
            .reply(
                admin.chat_id,
                "ℹ️ That project is already archived or gone.",
                Some(keyboards::back_menu(CallbackAction::AdminProjects)),
            )
            .await;
    };
    AdminAction::record(&mut *tx, admin.id, "archive_project", Some(project.id), &project.name)
        .await?;
    tx.commit().await?;

    tracing::info!(project_id, "project archived");
    ctx.reply(
        admin.chat_id,
        format!("✅ '{}' archived.", project.name),
        Some(keyboards::back_menu(CallbackAction::AdminProjects)),
    )
    .await
}

// ---------------------------------------------------------------------------
// Task creation
// ---------------------------------------------------------------------------

pub async fn start_task_creation(ctx: &Context, chat_id: i64) -> BotResult<()> {
    let projects = Project::list_active(&ctx.pool).await?;
    if projects.is_empty() {
        return ctx
            .reply(
                chat_id,
                "📁 Create a project first.",
                Some(keyboards::back_menu(CallbackAction::AdminMain)),
            )
            .await;
    }
    ctx.reply(chat_id, "📋 Which project is the task for?", Some(keyboards::task_project_picker(&projects)))
        .await
}

pub async fn select_task_project(ctx: &Context, chat_id: i64, project_id: i64) -> BotResult<()> {
    let project = Project::find_by_id(&ctx.pool, project_id)
        .await?
        .ok_or(BotError::NotFound("project"))?;
    if project.archived {
        return Err(BotError::Validation(
            "That project is archived; tasks cannot be added to it.".to_string(),
        ));
    }

    ctx.sessions.enter(chat_id, ConvState::TaskTitle).await;
    ctx.sessions.update(chat_id, |s| s.task.project_id = Some(project_id)).await;
    ctx.reply(chat_id, format!("📋 Task title for {}:", project.name), None).await
}

pub async fn handle_task_title(ctx: &Context, chat_id: i64, text: &str) -> BotResult<()> {
    let title = text.trim();
    if title.is_empty() {
        return Err(BotError::Validation("The title cannot be empty.".to_string()));
    }
    let title = title.to_string();
    ctx.sessions
        .update(chat_id, |s| {
            s.task.title = Some(title);
            s.state = ConvState::TaskDescription;
        })
        .await;
    ctx.reply(chat_id, "📝 Description (or - to skip):", None).await
}

pub async fn handle_task_description(ctx: &Context, chat_id: i64, text: &str) -> BotResult<()> {
    let description = input::optional_text(text);
    ctx.sessions
        .update(chat_id, |s| {
            s.task.description = description;
            s.state = ConvState::TaskMedia;
        })
        .await;
    ctx.reply(chat_id, "🖼 Attach a photo (or - to skip):", None).await
}

/// Media step. `file_id` is set when the admin sent a photo; text `-`
/// skips.
pub async fn handle_task_media(
    ctx: &Context,
    chat_id: i64,
    file_id: Option<&str>,
    text: Option<&str>,
) -> BotResult<()> {
    let image_ref = match (file_id, text) {
        (Some(id), _) => Some(id.to_string()),
        (None, Some(t)) if input::optional_text(t).is_none() => None,
        _ => {
            return Err(BotError::Validation(
                "Send a photo, or - to skip.".to_string(),
            ))
        }
    };

    ctx.sessions
        .update(chat_id, |s| {
            s.task.image_ref = image_ref;
            s.state = ConvState::TaskTargets;
        })
        .await;
    ctx.reply(
        chat_id,
        "🎯 Who is this task for? Send 'all' or a list like @alice @bob:",
        None,
    )
    .await
}

/// Targets step: parse, resolve against the project membership, stash the
/// resolved snapshot
pub async fn handle_task_targets(ctx: &Context, chat_id: i64, text: &str) -> BotResult<()> {
    let session = ctx.sessions.snapshot(chat_id).await;
    let project_id = session.task.project_id.ok_or(BotError::NotFound("draft"))?;

    let spec = input::parse_targets(text)?;
    let resolved = input::resolve_targets(&ctx.pool, project_id, &spec).await?;

    if matches!(spec, TargetSpec::AllMembers) && resolved.is_empty() {
        return Err(BotError::Validation(
            "That project has no members yet. Add members first, or name handles directly."
                .to_string(),
        ));
    }

    ctx.sessions
        .update(chat_id, |s| {
            s.task.target_user_ids = Some(resolved);
            s.state = ConvState::TaskDeadline;
        })
        .await;
    ctx.reply(chat_id, "⏰ Deadline (DD.MM.YYYY HH:MM, or - for none):", None).await
}

/// Final step: parses the deadline, persists task plus audit row, then
/// notifies the assigned users
pub async fn handle_task_deadline(ctx: &Context, admin: &User, text: &str) -> BotResult<()> {
    // A malformed date leaves the session in place for a retry
    let deadline = input::parse_deadline(text)?;

    let session = ctx
        .sessions
        .take(admin.chat_id)
        .await
        .ok_or(BotError::NotFound("draft"))?;
    let project_id = session.task.project_id.ok_or(BotError::NotFound("draft"))?;
    let title = session.task.title.ok_or(BotError::NotFound("draft"))?;
    let targets = session.task.target_user_ids.unwrap_or_default();

    let project = Project::find_by_id(&ctx.pool, project_id)
        .await?
        .ok_or(BotError::NotFound("project"))?;

    let mut tx = ctx.pool.begin().await?;
    let task = Task::create(
        &mut *tx,
        CreateTask {
            project_id,
            title,
            description: session.task.description,
            image_ref: session.task.image_ref,
            deadline,
            created_by: Some(admin.id),
            target_user_ids: targets.clone(),
        },
    )
    .await?;
    AdminAction::record(&mut *tx, admin.id, "create_task", Some(task.id), &task.title).await?;
    tx.commit().await?;

    let mut announcement = format!("📬 New task in {}: {}", project.name, task.title);
    if let Some(description) = &task.description {
        announcement.push_str(&format!("\n\n{}", description));
    }
    if let Some(deadline) = task.deadline {
        announcement.push_str(&format!("\n\n⏰ Due: {}", deadline.format("%d.%m.%Y %H:%M")));
    }

    let report = ctx.notifier.notify_users(&ctx.pool, &targets, &announcement).await?;
    tracing::info!(
        task_id = task.id,
        attempted = report.attempted,
        delivered = report.delivered,
        "task created and announced"
    );

    ctx.reply(
        admin.chat_id,
        format!(
            "✅ Task '{}' created and assigned to {} member(s) ({} notified).",
            task.title, report.attempted, report.delivered
        ),
        Some(keyboards::back_menu(CallbackAction::AdminMain)),
    )
    .await
}

// ---------------------------------------------------------------------------
// Review
// ---------------------------------------------------------------------------

pub async fn show_review_queue(ctx: &Context, chat_id: i64) -> BotResult<()> {
    let tasks = Task::list_with_pending_submissions(&ctx.pool).await?;
    if tasks.is_empty() {
        return ctx
            .reply(
                chat_id,
                "📬 Nothing to review.",
                Some(keyboards::back_menu(CallbackAction::AdminMain)),
            )
            .await;
    }

    let mut with_counts = Vec::with_capacity(tasks.len());
    for task in tasks {
        let pending = Submission::count_pending_by_task(&ctx.pool, task.id).await?;
        with_counts.push((task, pending));
    }

    ctx.reply(
        chat_id,
        "📬 Tasks with pending answers:",
        Some(keyboards::review_queue_menu(&with_counts)),
    )
    .await
}

pub async fn show_task_answers(ctx: &Context, chat_id: i64, task_id: i64) -> BotResult<()> {
    let task = Task::find_by_id(&ctx.pool, task_id)
        .await?
        .ok_or(BotError::NotFound("task"))?;
    let pending = Submission::list_pending_by_task(&ctx.pool, task_id).await?;

    if pending.is_empty() {
        return ctx
            .reply(
                chat_id,
                format!("📬 No pending answers for '{}'.", task.title),
                Some(keyboards::back_menu(CallbackAction::AdminViewAnswers)),
            )
            .await;
    }

    let mut entries = Vec::with_capacity(pending.len());
    for submission in &pending {
        let author = User::find_by_id(&ctx.pool, submission.user_id).await?;
        let label = author
            .map(|u| u.display_name)
            .unwrap_or_else(|| format!("user #{}", submission.user_id));
        entries.push((submission.id, label));
    }

    ctx.reply(
        chat_id,
        format!("📬 Pending answers for '{}':", task.title),
        Some(keyboards::pending_answers_menu(&entries)),
    )
    .await
}

pub async fn show_answer(ctx: &Context, chat_id: i64, submission_id: i64) -> BotResult<()> {
    let submission = Submission::find_by_id(&ctx.pool, submission_id)
        .await?
        .ok_or(BotError::NotFound("answer"))?;
    let author = User::find_by_id(&ctx.pool, submission.user_id).await?;
    let task = Task::find_by_id(&ctx.pool, submission.task_id).await?;

    let author_name = author
        .map(|u| u.display_name)
        .unwrap_or_else(|| format!("user #{}", submission.user_id));
    let task_title = task.map(|t| t.title).unwrap_or_else(|| "(deleted task)".to_string());

    let mut text = format!(
        "{} Answer from {} to '{}':\n\n{}",
        submission.status.icon(),
        author_name,
        task_title,
        submission.answer_text
    );
    if submission.answer_media.is_some() {
        text.push_str("\n\n📎 (has an attachment)");
    }
    if let Some(question) = &submission.clarification {
        text.push_str(&format!("\n\n❓ They asked: {}", question));
    }

    ctx.reply(
        chat_id,
        text,
        Some(keyboards::moderation_menu(submission.id, submission.task_id)),
    )
    .await
}

/// Approves a pending answer and notifies its author once
pub async fn approve_answer(ctx: &Context, admin: &User, submission_id: i64) -> BotResult<()> {
    let Some(approved) = Submission::approve(&ctx.pool, submission_id).await? else {
        return ctx
            .reply(
                admin.chat_id,
                "ℹ️ That answer was already reviewed or is gone.",
                Some(keyboards::back_menu(CallbackAction::AdminViewAnswers)),
            )
            .await;
    };
    AdminAction::record(&ctx.pool, admin.id, "approve_answer", Some(approved.id), "").await?;

    let task_title = Task::find_by_id(&ctx.pool, approved.task_id)
        .await?
        .map(|t| t.title)
        .unwrap_or_else(|| "your task".to_string());
    ctx.notifier
        .notify_users(
            &ctx.pool,
            &[approved.user_id],
            &format!("✅ Your answer to '{}' was approved!", task_title),
        )
        .await?;

    tracing::info!(submission_id, "answer approved");
    ctx.reply(
        admin.chat_id,
        "✅ Approved.",
        Some(keyboards::back_menu(CallbackAction::AdminViewAnswers)),
    )
    .await
}

/// Rejects a pending answer without feedback
pub async fn reject_answer(ctx: &Context, admin: &User, submission_id: i64) -> BotResult<()> {
    reject_with_feedback(ctx, admin, submission_id, None).await
}

pub async fn start_feedback(ctx: &Context, chat_id: i64, submission_id: i64) -> BotResult<()> {
    let submission = Submission::find_by_id(&ctx.pool, submission_id)
        .await?
        .ok_or(BotError::NotFound("answer"))?;
    if submission.status.is_reviewed() {
        return ctx
            .reply(
                chat_id,
                "ℹ️ That answer was already reviewed.",
                Some(keyboards::back_menu(CallbackAction::AdminViewAnswers)),
            )
            .await;
    }

    ctx.sessions.enter(chat_id, ConvState::AwaitFeedback(submission_id)).await;
    ctx.reply(chat_id, "💬 Send the feedback to attach to the rejection:", None).await
}

pub async fn handle_feedback(
    ctx: &Context,
    admin: &User,
    submission_id: i64,
    text: &str,
) -> BotResult<()> {
    let feedback = text.trim();
    if feedback.is_empty() {
        return Err(BotError::Validation("Feedback cannot be empty.".to_string()));
    }
    ctx.sessions.clear(admin.chat_id).await;
    reject_with_feedback(ctx, admin, submission_id, Some(feedback)).await
}

async fn reject_with_feedback(
    ctx: &Context,
    admin: &User,
    submission_id: i64,
    feedback: Option<&str>,
) -> BotResult<()> {
    let Some(rejected) = Submission::reject(&ctx.pool, submission_id, feedback).await? else {
        return ctx
            .reply(
                admin.chat_id,
                "ℹ️ That answer was already reviewed or is gone.",
                Some(keyboards::back_menu(CallbackAction::AdminViewAnswers)),
            )
            .await;
    };
    AdminAction::record(&ctx.pool, admin.id, "reject_answer", Some(rejected.id), "").await?;

    let task_title = Task::find_by_id(&ctx.pool, rejected.task_id)
        .await?
        .map(|t| t.title)
        .unwrap_or_else(|| "your task".to_string());
    let mut message = format!("❌ Your answer to '{}' was rejected.", task_title);
    if let Some(feedback) = &rejected.feedback {
        message.push_str(&format!("\n\n💬 {}", feedback));
    }
    message.push_str("\n\nYou can submit a new answer.");
    ctx.notifier.notify_users(&ctx.pool, &[rejected.user_id], &message).await?;

    tracing::info!(submission_id, "answer rejected");
    ctx.reply(
        admin.chat_id,
        "❌ Rejected.",
        Some(keyboards::back_menu(CallbackAction::AdminViewAnswers)),
    )
    .await
}

// ---------------------------------------------------------------------------
// Broadcast
// ---------------------------------------------------------------------------

pub async fn start_broadcast(ctx: &Context, chat_id: i64) -> BotResult<()> {
    ctx.reply(chat_id, "📢 Who should receive the broadcast?", Some(keyboards::broadcast_scope_menu()))
        .await
}

pub async fn choose_broadcast_all(ctx: &Context, chat_id: i64) -> BotResult<()> {
    enter_broadcast(ctx, chat_id, BroadcastScope::All).await
}

pub async fn choose_broadcast_project(ctx: &Context, chat_id: i64) -> BotResult<()> {
    let projects = Project::list_active(&ctx.pool).await?;
    if projects.is_empty() {
        return ctx
            .reply(
                chat_id,
                "📁 No active projects to broadcast to.",
                Some(keyboards::back_menu(CallbackAction::AdminBroadcast)),
            )
            .await;
    }
    ctx.reply(chat_id, "📁 Which project?", Some(keyboards::broadcast_project_picker(&projects)))
        .await
}

pub async fn choose_broadcast_user(ctx: &Context, chat_id: i64) -> BotResult<()> {
    let users = User::list_all(&ctx.pool).await?;
    ctx.reply(chat_id, "👤 Which user?", Some(keyboards::broadcast_user_picker(&users))).await
}

pub async fn set_broadcast_project(ctx: &Context, chat_id: i64, project_id: i64) -> BotResult<()> {
    Project::find_by_id(&ctx.pool, project_id)
        .await?
        .ok_or(BotError::NotFound("project"))?;
    enter_broadcast(ctx, chat_id, BroadcastScope::Project(project_id)).await
}

pub async fn set_broadcast_user(ctx: &Context, chat_id: i64, user_id: i64) -> BotResult<()> {
    User::find_by_id(&ctx.pool, user_id)
        .await?
        .ok_or(BotError::NotFound("user"))?;
    enter_broadcast(ctx, chat_id, BroadcastScope::User(user_id)).await
}

async fn enter_broadcast(ctx: &Context, chat_id: i64, scope: BroadcastScope) -> BotResult<()> {
    ctx.sessions.enter(chat_id, ConvState::BroadcastMessage).await;
    ctx.sessions.update(chat_id, |s| s.broadcast_scope = Some(scope)).await;
    ctx.reply(chat_id, "✉️ Send the broadcast text:", None).await
}

/// Resolves the chosen scope to user ids, fans the message out, and reports
/// delivered/attempted back to the admin
pub async fn handle_broadcast_text(ctx: &Context, admin: &User, text: &str) -> BotResult<()> {
    let message = text.trim();
    if message.is_empty() {
        return Err(BotError::Validation("The broadcast text cannot be empty.".to_string()));
    }

    let session = ctx
        .sessions
        .take(admin.chat_id)
        .await
        .ok_or(BotError::NotFound("draft"))?;
    let scope = session.broadcast_scope.ok_or(BotError::NotFound("draft"))?;

    let recipients: Vec<i64> = match scope {
        BroadcastScope::All => User::list_all(&ctx.pool).await?.iter().map(|u| u.id).collect(),
        BroadcastScope::Project(project_id) => {
            Membership::member_ids(&ctx.pool, project_id).await?
        }
        BroadcastScope::User(user_id) => vec![user_id],
    };

    let report = ctx
        .notifier
        .notify_users(&ctx.pool, &recipients, &format!("📢 {}", message))
        .await?;
    AdminAction::record(
        &ctx.pool,
        admin.id,
        "broadcast",
        None,
        &format!("{} of {} delivered", report.delivered, report.attempted),
    )
    .await?;

    tracing::info!(attempted = report.attempted, delivered = report.delivered, "broadcast sent");
    ctx.reply(
        admin.chat_id,
        format!("📢 Delivered to {} of {} recipient(s).", report.delivered, report.attempted),
        Some(keyboards::back_menu(CallbackAction::AdminMain)),
    )
    .await
}

// ---------------------------------------------------------------------------
// Admin roster
// ---------------------------------------------------------------------------

pub async fn show_admin_management(ctx: &Context, chat_id: i64) -> BotResult<()> {
    ctx.reply(chat_id, "👥 Admin management", Some(keyboards::admin_management_menu())).await
}

pub async fn list_admins(ctx: &Context, chat_id: i64) -> BotResult<()> {
    let admins = User::list_admins(&ctx.pool).await?;
    let mut text = "📄 Administrators:\n".to_string();
    for admin in &admins {
        match &admin.handle {
            Some(handle) => text.push_str(&format!("\n• {} (@{})", admin.display_name, handle)),
            None => text.push_str(&format!("\n• {}", admin.display_name)),
        }
    }
    ctx.reply(chat_id, text, Some(keyboards::back_menu(CallbackAction::AdminManage))).await
}

pub async fn start_add_admin(ctx: &Context, chat_id: i64) -> BotResult<()> {
    ctx.sessions.enter(chat_id, ConvState::AddAdminHandle).await;
    ctx.reply(chat_id, "➕ Send the handle to promote, like @alice:", None).await
}

pub async fn start_remove_admin(ctx: &Context, chat_id: i64) -> BotResult<()> {
    ctx.sessions.enter(chat_id, ConvState::RemoveAdminHandle).await;
    ctx.reply(chat_id, "➖ Send the handle to demote, like @alice:", None).await
}

pub async fn handle_add_admin(ctx: &Context, admin: &User, text: &str) -> BotResult<()> {
    let handle = input::normalize_handle(text)?;
    let target = User::find_by_handle(&ctx.pool, &handle)
        .await?
        .ok_or_else(|| BotError::Validation(format!("@{} has not started the bot yet.", handle)))?;

    ctx.sessions.clear(admin.chat_id).await;

    if target.role.is_admin() {
        return ctx
            .reply(
                admin.chat_id,
                format!("ℹ️ @{} is already an admin.", handle),
                Some(keyboards::back_menu(CallbackAction::AdminManage)),
            )
            .await;
    }

    let mut tx = ctx.pool.begin().await?;
    User::set_role(&mut *tx, target.id, UserRole::Admin)
        .await?
        .ok_or(BotError::NotFound("user"))?;
    AdminAction::record(&mut *tx, admin.id, "add_admin", Some(target.id), &handle).await?;
    tx.commit().await?;

    ctx.notifier
        .notify_users(&ctx.pool, &[target.id], "⭐ You were granted admin access. Use /admin.")
        .await?;

    tracing::info!(user_id = target.id, "admin granted");
    ctx.reply(
        admin.chat_id,
        format!("✅ @{} is now an admin.", handle),
        Some(keyboards::back_menu(CallbackAction::AdminManage)),
    )
    .await
}

/// Demotes an admin. Demoting yourself is rejected, so the roster can
/// never empty itself from inside the panel.
pub async fn handle_remove_admin(ctx: &Context, admin: &User, text: &str) -> BotResult<()> {
    let handle = input::normalize_handle(text)?;
    let target = User::find_by_handle(&ctx.pool, &handle)
        .await?
        .ok_or_else(|| BotError::Validation(format!("@{} is not a known user.", handle)))?;

    ctx.sessions.clear(admin.chat_id).await;

    if target.id == admin.id {
        return ctx
            .reply(
                admin.chat_id,
                "❌ You cannot remove yourself.",
                Some(keyboards::back_menu(CallbackAction::AdminManage)),
            )
            .await;
    }
    if !target.role.is_admin() {
        return ctx
            .reply(
                admin.chat_id,
                format!("ℹ️ @{} is not an admin.", handle),
                Some(keyboards::back_menu(CallbackAction::AdminManage)),
            )
            .await;
    }

    let mut tx = ctx.pool.begin().await?;
    User::set_role(&mut *tx, target.id, UserRole::User)
        .await?
        .ok_or(BotError::NotFound("user"))?;
    AdminAction::record(&mut *tx, admin.id, "remove_admin", Some(target.id), &handle).await?;
    tx.commit().await?;

    ctx.notifier
        .notify_users(&ctx.pool, &[target.id], "ℹ️ Your admin access was revoked.")
        .await?;

    tracing::info!(user_id = target.id, "admin revoked");
    ctx.reply(
        admin.chat_id,
        format!("✅ @{} is no longer an admin.", handle),
        Some(keyboards::back_menu(CallbackAction::AdminManage)),
    )
    .await
}
