/// User-facing flows: registration, task browsing, answering,
/// clarifications, and profile edits
use taskrelay_shared::models::{Membership, Project, Submission, Task, User};

use crate::context::Context;
use crate::error::{BotError, BotResult};
use crate::keyboards;
use crate::payload::CallbackAction;
use crate::state::ConvState;
use crate::transport::Event;

/// `/start`: registers (or refreshes) the user and shows the main menu
pub async fn start(ctx: &Context, event: &Event) -> BotResult<()> {
    ctx.sessions.clear(event.chat_id).await;

    let (user, created) = User::register(
        &ctx.pool,
        event.chat_id,
        event.handle.as_deref(),
        &event.display_name,
    )
    .await?;

    if created {
        tracing::info!(user_id = user.id, "new user registered");
    }

    let greeting = format!(
        "👋 Hi, {}! Pick an option below. Use /admin for the admin panel and /cancel to abandon any flow.",
        user.display_name
    );
    ctx.reply(event.chat_id, greeting, Some(keyboards::user_main_menu())).await
}

/// `/cancel`: abandons whatever flow is in progress
pub async fn cancel(ctx: &Context, user: &User) -> BotResult<()> {
    let had_session = ctx.sessions.take(user.chat_id).await.is_some();
    let text = if had_session {
        "🚫 Cancelled."
    } else {
        "Nothing to cancel."
    };
    let menu = if user.role.is_admin() {
        keyboards::admin_main_menu()
    } else {
        keyboards::user_main_menu()
    };
    ctx.reply(user.chat_id, text, Some(menu)).await
}

pub async fn show_user_menu(ctx: &Context, chat_id: i64) -> BotResult<()> {
    ctx.reply(chat_id, "🏠 Main menu", Some(keyboards::user_main_menu())).await
}

/// Nudge shown for free-form text outside any flow
pub async fn nudge_idle(ctx: &Context, user: &User) -> BotResult<()> {
    let menu = if user.role.is_admin() {
        keyboards::admin_main_menu()
    } else {
        keyboards::user_main_menu()
    };
    ctx.reply(user.chat_id, "🤔 Use the buttons below, or /start.", Some(menu)).await
}

// ---------------------------------------------------------------------------
// Task browsing
// ---------------------------------------------------------------------------

/// Active tasks in the user's projects, each with their own answer status
pub async fn my_tasks(ctx: &Context, user: &User) -> BotResult<()> {
    let tasks = Task::list_active_for_user(&ctx.pool, user.id).await?;
    if tasks.is_empty() {
        return ctx
            .reply(
                user.chat_id,
                "📋 No active tasks for you right now.",
                Some(keyboards::back_menu(CallbackAction::UserMain)),
            )
            .await;
    }

    let mut text = "📋 Your tasks:\n".to_string();
    for task in &tasks {
        let marker = match Submission::find_by_user_task(&ctx.pool, user.id, task.id).await? {
            Some(submission) => submission.status.icon(),
            None => "▫️",
        };
        text.push_str(&format!("\n{} {}", marker, task.title));
    }

    ctx.reply(
        user.chat_id,
        text,
        Some(keyboards::task_list_menu(&tasks, CallbackAction::UserMain)),
    )
    .await
}

pub async fn task_detail(ctx: &Context, user: &User, task_id: i64) -> BotResult<()> {
    let task = Task::find_by_id(&ctx.pool, task_id)
        .await?
        .ok_or(BotError::NotFound("task"))?;
    let project = Project::find_by_id(&ctx.pool, task.project_id).await?;
    let submission = Submission::find_by_user_task(&ctx.pool, user.id, task_id).await?;

    let mut text = format!("📋 {}\n", task.title);
    if let Some(project) = &project {
        text.push_str(&format!("📁 {}\n", project.name));
    }
    if let Some(description) = &task.description {
        text.push_str(&format!("\n{}\n", description));
    }
    if let Some(deadline) = task.deadline {
        text.push_str(&format!("\n⏰ Due: {}\n", deadline.format("%d.%m.%Y %H:%M")));
    }
    if let Some(submission) = &submission {
        text.push_str(&format!(
            "\n{} Your answer is {}.",
            submission.status.icon(),
            submission.status.as_str()
        ));
        if let Some(feedback) = &submission.feedback {
            text.push_str(&format!("\n💬 Feedback: {}", feedback));
        }
    }

    ctx.reply(
        user.chat_id,
        text,
        Some(keyboards::task_detail_menu(task_id, submission.is_some())),
    )
    .await
}

// ---------------------------------------------------------------------------
// Answering
// ---------------------------------------------------------------------------

pub async fn start_answer(ctx: &Context, user: &User, task_id: i64) -> BotResult<()> {
    let task = Task::find_by_id(&ctx.pool, task_id)
        .await?
        .ok_or(BotError::NotFound("task"))?;
    if !task.active {
        return Err(BotError::Validation("That task is no longer active.".to_string()));
    }

    let replacing = Submission::find_by_user_task(&ctx.pool, user.id, task_id)
        .await?
        .is_some();
    let prompt = if replacing {
        "✍️ Send your new answer (it replaces the previous one):"
    } else {
        "✍️ Send your answer (text or photo):"
    };

    ctx.sessions.enter(user.chat_id, ConvState::AwaitAnswer(task_id)).await;
    ctx.reply(user.chat_id, prompt, None).await
}

/// Stores the answer (text and/or photo) and tells every admin
pub async fn handle_answer(
    ctx: &Context,
    user: &User,
    task_id: i64,
    text: Option<&str>,
    file_id: Option<&str>,
) -> BotResult<()> {
    let answer_text = text.map(str::trim).unwrap_or("");
    if answer_text.is_empty() && file_id.is_none() {
        return Err(BotError::Validation("Send text or a photo.".to_string()));
    }

    let task = Task::find_by_id(&ctx.pool, task_id)
        .await?
        .ok_or(BotError::NotFound("task"))?;

    let submission = Submission::upsert(&ctx.pool, user.id, task_id, answer_text, file_id).await?;
    ctx.sessions.clear(user.chat_id).await;

    let notice = format!(
        "📬 {} answered '{}':\n\n{}",
        user.display_name, task.title, submission.answer_text
    );
    let report = ctx.notifier.notify_admins(&ctx.pool, &notice).await?;
    tracing::info!(
        submission_id = submission.id,
        admins_notified = report.delivered,
        "answer submitted"
    );

    ctx.reply(
        user.chat_id,
        "✅ Answer sent for review!",
        Some(keyboards::back_menu(CallbackAction::MyTasks)),
    )
    .await
}

pub async fn view_my_answer(ctx: &Context, user: &User, task_id: i64) -> BotResult<()> {
    let submission = Submission::find_by_user_task(&ctx.pool, user.id, task_id)
        .await?
        .ok_or(BotError::NotFound("answer"))?;

    let mut text = format!(
        "{} Your answer ({}):\n\n{}",
        submission.status.icon(),
        submission.status.as_str(),
        submission.answer_text
    );
    if let Some(feedback) = &submission.feedback {
        text.push_str(&format!("\n\n💬 Feedback: {}", feedback));
    }

    ctx.reply(
        user.chat_id,
        text,
        Some(keyboards::back_menu(CallbackAction::TaskDetail(task_id))),
    )
    .await
}

// ---------------------------------------------------------------------------
// Clarifications
// ---------------------------------------------------------------------------

pub async fn start_clarify(ctx: &Context, user: &User, task_id: i64) -> BotResult<()> {
    Task::find_by_id(&ctx.pool, task_id)
        .await?
        .ok_or(BotError::NotFound("task"))?;
    ctx.sessions.enter(user.chat_id, ConvState::AwaitClarification(task_id)).await;
    ctx.reply(user.chat_id, "❓ What would you like to ask about this task?", None).await
}

/// Relays the question to every admin and stores it on the user's
/// submission row when one exists
pub async fn handle_clarify(ctx: &Context, user: &User, task_id: i64, text: &str) -> BotResult<()> {
    let question = text.trim();
    if question.is_empty() {
        return Err(BotError::Validation("The question cannot be empty.".to_string()));
    }

    let task = Task::find_by_id(&ctx.pool, task_id)
        .await?
        .ok_or(BotError::NotFound("task"))?;

    Submission::set_clarification(&ctx.pool, user.id, task_id, question).await?;
    ctx.sessions.clear(user.chat_id).await;

    let notice = format!(
        "❓ {} asks about '{}':\n\n{}",
        user.display_name, task.title, question
    );
    ctx.notifier.notify_admins(&ctx.pool, &notice).await?;

    ctx.reply(
        user.chat_id,
        "✅ Question sent to the admins.",
        Some(keyboards::back_menu(CallbackAction::TaskDetail(task_id))),
    )
    .await
}

// ---------------------------------------------------------------------------
// Answers, board, profile
// ---------------------------------------------------------------------------

pub async fn my_answers(ctx: &Context, user: &User) -> BotResult<()> {
    let submissions = Submission::list_by_user(&ctx.pool, user.id).await?;
    if submissions.is_empty() {
        return ctx
            .reply(
                user.chat_id,
                "📝 You have not answered anything yet.",
                Some(keyboards::back_menu(CallbackAction::UserMain)),
            )
            .await;
    }

    let mut text = "📝 Your answers:\n".to_string();
    for submission in &submissions {
        let title = Task::find_by_id(&ctx.pool, submission.task_id)
            .await?
            .map(|t| t.title)
            .unwrap_or_else(|| "(deleted task)".to_string());
        text.push_str(&format!(
            "\n{} {} ({})",
            submission.status.icon(),
            title,
            submission.status.as_str()
        ));
        if let Some(feedback) = &submission.feedback {
            text.push_str(&format!("\n   💬 {}", feedback));
        }
    }

    ctx.reply(user.chat_id, text, Some(keyboards::back_menu(CallbackAction::UserMain))).await
}

/// Board links of every active project the user belongs to
pub async fn common_board(ctx: &Context, user: &User) -> BotResult<()> {
    let projects = Project::list_active(&ctx.pool).await?;
    let mut lines = Vec::new();
    for project in &projects {
        if !Membership::is_member(&ctx.pool, project.id, user.id).await? {
            continue;
        }
        match &project.board_link {
            Some(link) => lines.push(format!("• {}: {}", project.name, link)),
            None => lines.push(format!("• {}: (no board yet)", project.name)),
        }
    }

    let text = if lines.is_empty() {
        "📌 You are not in any project yet.".to_string()
    } else {
        format!("📌 Project boards:\n\n{}", lines.join("\n"))
    };
    ctx.reply(user.chat_id, text, Some(keyboards::back_menu(CallbackAction::UserMain))).await
}

pub async fn my_profile(ctx: &Context, user: &User) -> BotResult<()> {
    let projects = Membership::count_by_user(&ctx.pool, user.id).await?;
    let answers = Submission::count_by_user(&ctx.pool, user.id).await?;
    let approved = Submission::count_approved_by_user(&ctx.pool, user.id).await?;

    let handle = user
        .handle
        .as_ref()
        .map(|h| format!("@{}", h))
        .unwrap_or_else(|| "(no handle)".to_string());
    let text = format!(
        "👤 {}\n{}\n💼 {}\n\n📁 Projects: {}\n📝 Answers: {} ({} approved)",
        user.display_name, handle, user.status, projects, answers, approved
    );

    ctx.reply(user.chat_id, text, Some(keyboards::profile_menu())).await
}

pub async fn start_edit_name(ctx: &Context, chat_id: i64) -> BotResult<()> {
    ctx.sessions.enter(chat_id, ConvState::EditName).await;
    ctx.reply(chat_id, "✏️ Send your new display name:", None).await
}

pub async fn handle_edit_name(ctx: &Context, user: &User, text: &str) -> BotResult<()> {
    let name = text.trim();
    if name.is_empty() {
        return Err(BotError::Validation("The name cannot be empty.".to_string()));
    }

    User::set_display_name(&ctx.pool, user.id, name)
        .await?
        .ok_or(BotError::NotFound("user"))?;
    ctx.sessions.clear(user.chat_id).await;
    ctx.reply(
        user.chat_id,
        format!("✅ You are now '{}'.", name),
        Some(keyboards::back_menu(CallbackAction::MyProfile)),
    )
    .await
}

pub async fn start_edit_status(ctx: &Context, chat_id: i64) -> BotResult<()> {
    ctx.sessions.enter(chat_id, ConvState::EditStatus).await;
    ctx.reply(chat_id, "💼 Send your new status line:", None).await
}

pub async fn handle_edit_status(ctx: &Context, user: &User, text: &str) -> BotResult<()> {
    let status = text.trim();
    if status.is_empty() {
        return Err(BotError::Validation("The status cannot be empty.".to_string()));
    }

    User::set_status(&ctx.pool, user.id, status)
        .await?
        .ok_or(BotError::NotFound("user"))?;
    ctx.sessions.clear(user.chat_id).await;
    ctx.reply(
        user.chat_id,
        "✅ Status updated.",
        Some(keyboards::back_menu(CallbackAction::MyProfile)),
    )
    .await
}
