/// Flow handlers, split by audience
///
/// `admin` holds everything behind the capability check; `user` holds
/// registration and the participant-facing flows. The router decides which
/// handler runs; handlers never re-dispatch.
pub mod admin;
pub mod user;
