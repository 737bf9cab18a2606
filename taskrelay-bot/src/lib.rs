/// TaskRelay bot
///
/// Conversational task management: admins create projects and tasks, assign
/// them, and review submitted answers; participants browse their tasks,
/// submit answers, and ask clarifying questions. The chat platform is an
/// external collaborator behind [`transport::ChatTransport`].
pub mod authz;
pub mod context;
pub mod error;
pub mod handlers;
pub mod heartbeat;
pub mod input;
pub mod keyboards;
pub mod notify;
pub mod payload;
pub mod router;
pub mod session;
pub mod state;
pub mod transport;

pub use context::Context;
pub use error::{BotError, BotResult};
pub use router::Router;
