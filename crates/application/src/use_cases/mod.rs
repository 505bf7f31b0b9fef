//! Application use cases (session and task orchestration).

mod auth_service;
mod task_service;

pub use auth_service::{AuthService, LOGIN_PATH, LOGOUT_PATH, REGISTER_PATH};
pub use task_service::TaskService;
