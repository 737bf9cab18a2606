/// Event routing
///
/// Every inbound event is resolved to exactly one handler in three steps:
/// commands first, then callback payloads, then free-form input interpreted
/// through the chat's conversation state. Authorization is checked from the
/// stored role on every event, so stale admin menus held by a demoted user
/// stop working immediately.
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use taskrelay_shared::models::User;

use crate::authz::Capabilities;
use crate::context::Context;
use crate::error::{BotError, BotResult};
use crate::handlers::{admin, user};
use crate::keyboards;
use crate::payload::CallbackAction;
use crate::state::ConvState;
use crate::transport::{Command, Event, EventKind};

#[derive(Clone)]
pub struct Router {
    ctx: Arc<Context>,
}

impl Router {
    pub fn new(ctx: Arc<Context>) -> Self {
        Self { ctx }
    }

    /// Handles one event end to end, converting errors into a reply
    pub async fn dispatch(&self, event: Event) {
        if let Err(err) = self.handle(&event).await {
            if err.is_retryable_input() {
                // The flow stays on the same step; just ask again
                if let Err(send_err) = self.ctx.reply(event.chat_id, err.user_message(), None).await
                {
                    tracing::warn!(chat_id = event.chat_id, error = %send_err, "failed to send re-prompt");
                }
                return;
            }

            tracing::error!(chat_id = event.chat_id, error = %err, "event handling failed");
            let menu = match User::find_by_chat_id(&self.ctx.pool, event.chat_id).await {
                Ok(Some(user)) if user.role.is_admin() => keyboards::admin_main_menu(),
                _ => keyboards::user_main_menu(),
            };
            if let Err(send_err) = self
                .ctx
                .reply(event.chat_id, err.user_message(), Some(menu))
                .await
            {
                tracing::warn!(chat_id = event.chat_id, error = %send_err, "failed to send error reply");
            }
        }
    }

    async fn handle(&self, event: &Event) -> BotResult<()> {
        let ctx = &self.ctx;

        // Everyone who talks to the bot gets a user row
        let user = match User::find_by_chat_id(&ctx.pool, event.chat_id).await? {
            Some(user) => user,
            None => {
                User::register(
                    &ctx.pool,
                    event.chat_id,
                    event.handle.as_deref(),
                    &event.display_name,
                )
                .await?
                .0
            }
        };

        match &event.kind {
            EventKind::Command(Command::Start) => user::start(ctx, event).await,
            EventKind::Command(Command::Admin) => admin::login_entry(ctx, &user).await,
            EventKind::Command(Command::Cancel) => user::cancel(ctx, &user).await,
            EventKind::Callback(payload) => {
                let action = CallbackAction::decode(payload)?;
                self.handle_callback(&user, action).await
            }
            EventKind::Text(text) => self.handle_input(&user, Some(text), None).await,
            EventKind::Photo { file_id, caption } => {
                self.handle_input(&user, caption.as_deref(), Some(file_id)).await
            }
        }
    }

    async fn handle_callback(&self, user: &User, action: CallbackAction) -> BotResult<()> {
        let ctx = &self.ctx;
        let caps = Capabilities::for_role(user.role);

        if !caps.permits(action) {
            ctx.sessions.clear(user.chat_id).await;
            return ctx
                .reply(
                    user.chat_id,
                    "🔒 That action needs admin access. Use /admin.",
                    Some(keyboards::user_main_menu()),
                )
                .await;
        }

        use CallbackAction::*;
        match action {
            // Admin navigation
            AdminMain => admin::show_admin_menu(ctx, user.chat_id).await,
            AdminProjects => admin::show_projects(ctx, user.chat_id).await,
            AdminManage => admin::show_admin_management(ctx, user.chat_id).await,
            AdminCreateTask => admin::start_task_creation(ctx, user.chat_id).await,
            AdminViewAnswers => admin::show_review_queue(ctx, user.chat_id).await,
            AdminBroadcast => admin::start_broadcast(ctx, user.chat_id).await,
            AdminArchive => admin::show_archive(ctx, user.chat_id).await,
            AdminAdd => admin::start_add_admin(ctx, user.chat_id).await,
            AdminRemove => admin::start_remove_admin(ctx, user.chat_id).await,
            AdminList => admin::list_admins(ctx, user.chat_id).await,
            ExitAdmin => admin::exit_admin(ctx, user.chat_id).await,

            // Projects
            ProjectCreate => admin::start_project_creation(ctx, user.chat_id).await,
            ProjectDetail(id) => admin::show_project_detail(ctx, user.chat_id, id).await,
            ProjectMembers(id) => admin::show_project_members(ctx, user.chat_id, id).await,
            ProjectAddMember(id) => admin::start_add_member(ctx, user.chat_id, id).await,
            ProjectTasks(id) => admin::show_project_tasks(ctx, user.chat_id, id).await,
            ProjectAddBoard(id) => admin::start_board_link(ctx, user.chat_id, id).await,
            ProjectArchive(id) => admin::request_archive(ctx, user.chat_id, id).await,
            ConfirmArchiveProject(id) => admin::confirm_archive(ctx, user, id).await,
            SelectProjectForTask(id) => admin::select_task_project(ctx, user.chat_id, id).await,
            DeactivateTask(id) => admin::request_deactivate(ctx, user.chat_id, id).await,
            ConfirmDeactivateTask(id) => admin::confirm_deactivate(ctx, user, id).await,

            // User navigation
            UserMain => user::show_user_menu(ctx, user.chat_id).await,
            MyTasks => user::my_tasks(ctx, user).await,
            MyAnswers => user::my_answers(ctx, user).await,
            MyProfile => user::my_profile(ctx, user).await,
            CommonBoard => user::common_board(ctx, user).await,
            EditName => user::start_edit_name(ctx, user.chat_id).await,
            EditStatus => user::start_edit_status(ctx, user.chat_id).await,

            // Tasks
            TaskDetail(id) => user::task_detail(ctx, user, id).await,
            AnswerTask(id) => user::start_answer(ctx, user, id).await,
            ClarifyTask(id) => user::start_clarify(ctx, user, id).await,
            ViewMyAnswer(id) => user::view_my_answer(ctx, user, id).await,

            // Review
            ViewTaskAnswers(id) => admin::show_task_answers(ctx, user.chat_id, id).await,
            ViewAnswer(id) => admin::show_answer(ctx, user.chat_id, id).await,
            ApproveAnswer(id) => admin::approve_answer(ctx, user, id).await,
            RejectAnswer(id) => admin::reject_answer(ctx, user, id).await,
            FeedbackAnswer(id) => admin::start_feedback(ctx, user.chat_id, id).await,

            // Broadcast
            BroadcastAll => admin::choose_broadcast_all(ctx, user.chat_id).await,
            BroadcastProject => admin::choose_broadcast_project(ctx, user.chat_id).await,
            BroadcastUser => admin::choose_broadcast_user(ctx, user.chat_id).await,
            BroadcastToProject(id) => admin::set_broadcast_project(ctx, user.chat_id, id).await,
            BroadcastToUser(id) => admin::set_broadcast_user(ctx, user.chat_id, id).await,

            // Shared
            CancelAction => user::cancel(ctx, user).await,
        }
    }

    /// Interprets free-form input through the chat's conversation state
    async fn handle_input(
        &self,
        user: &User,
        text: Option<&str>,
        file_id: Option<&str>,
    ) -> BotResult<()> {
        let ctx = &self.ctx;
        let state = ctx.sessions.state(user.chat_id).await;
        let caps = Capabilities::for_role(user.role);

        // Admin flow states stop consuming input the moment the role is gone
        let admin_state = !matches!(
            state,
            ConvState::Idle
                | ConvState::AwaitAdminPassword
                | ConvState::AwaitAnswer(_)
                | ConvState::AwaitClarification(_)
                | ConvState::EditName
                | ConvState::EditStatus
        );
        if admin_state && !caps.admin_panel() {
            ctx.sessions.clear(user.chat_id).await;
            return user::nudge_idle(ctx, user).await;
        }

        // States that accept a photo are handled before the text-only check
        match state {
            ConvState::TaskMedia => {
                return admin::handle_task_media(ctx, user.chat_id, file_id, text).await
            }
            ConvState::AwaitAnswer(task_id) => {
                return user::handle_answer(ctx, user, task_id, text, file_id).await
            }
            _ => {}
        }

        let Some(text) = text else {
            return Err(BotError::Validation(
                "Text is expected at this step.".to_string(),
            ));
        };

        match state {
            ConvState::Idle => user::nudge_idle(ctx, user).await,
            ConvState::AwaitAdminPassword => admin::handle_password(ctx, user, text).await,

            ConvState::ProjectName => admin::handle_project_name(ctx, user.chat_id, text).await,
            ConvState::ProjectDescription => {
                admin::handle_project_description(ctx, user.chat_id, text).await
            }
            ConvState::ProjectBoard => admin::handle_project_board(ctx, user, text).await,
            ConvState::ProjectBoardFor(id) => {
                admin::handle_board_link(ctx, user.chat_id, id, text).await
            }
            ConvState::AddMemberHandle(id) => admin::handle_add_member(ctx, user, id, text).await,

            ConvState::TaskTitle => admin::handle_task_title(ctx, user.chat_id, text).await,
            ConvState::TaskDescription => {
                admin::handle_task_description(ctx, user.chat_id, text).await
            }
            ConvState::TaskTargets => admin::handle_task_targets(ctx, user.chat_id, text).await,
            ConvState::TaskDeadline => admin::handle_task_deadline(ctx, user, text).await,

            ConvState::AddAdminHandle => admin::handle_add_admin(ctx, user, text).await,
            ConvState::RemoveAdminHandle => admin::handle_remove_admin(ctx, user, text).await,
            ConvState::BroadcastMessage => admin::handle_broadcast_text(ctx, user, text).await,
            ConvState::AwaitFeedback(id) => admin::handle_feedback(ctx, user, id, text).await,

            ConvState::AwaitClarification(id) => user::handle_clarify(ctx, user, id, text).await,
            ConvState::EditName => user::handle_edit_name(ctx, user, text).await,
            ConvState::EditStatus => user::handle_edit_status(ctx, user, text).await,

            // Photo-capable states were handled above
            ConvState::TaskMedia | ConvState::AwaitAnswer(_) => unreachable!(),
        }
    }
}

/// Consumes inbound events until the channel closes or shutdown is
/// requested, processing different chats concurrently
pub async fn run(router: Router, mut events: mpsc::Receiver<Event>, shutdown: CancellationToken) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("dispatcher shutting down");
                break;
            }
            event = events.recv() => {
                let Some(event) = event else {
                    tracing::info!("event channel closed");
                    break;
                };
                let router = router.clone();
                tokio::spawn(async move {
                    router.dispatch(event).await;
                });
            }
        }
    }
}
