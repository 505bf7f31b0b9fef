//! Taskdeck Domain - Core types
//!
//! This crate defines the domain model for the Taskdeck client:
//! users and sessions, tasks, and the request/response shapes that
//! travel through the authenticated API client.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod error;
pub mod request;
pub mod response;
pub mod task;
pub mod user;

pub use auth::{AuthPayload, LoginRequest, RefreshPayload, RegisterRequest, token_preview};
pub use error::{DomainError, DomainResult};
pub use request::{ApiRequest, Header, Headers, HttpMethod};
pub use response::ApiResponse;
pub use task::{
    DEFAULT_PAGE_SIZE, Pagination, Task, TaskCreate, TaskListEnvelope, TaskPage, TaskQuery,
    TaskStats, TaskStatus, TaskUpdate,
};
pub use user::{Session, UserProfile};
