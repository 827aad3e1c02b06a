//! Command implementations

pub mod auth;
pub mod project;
pub mod session;

pub use auth::{run_login, run_logout, run_whoami};
pub use project::{run_deploy, run_export, run_watch};
pub use session::{run_session, SessionArgs};
