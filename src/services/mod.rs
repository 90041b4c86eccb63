//! Services layer - business logic
//!
//! Task rules and exports on top of the repositories, plus the signed-token
//! codec and admin credential check used by the auth routes.

pub mod export;
pub mod password;
pub mod task;
pub mod token;

pub use export::{export_filename, json_export, render_markdown, JsonExport};
pub use password::{hash_password, verify_password, AdminCredentials};
pub use task::{parse_due_date, parse_filter, FieldError, TaskService, TaskServiceError};
pub use token::{
    IssuedToken, TokenClaims, TokenCodec, TokenCodecError, TokenRejection, Verification,
    TOKEN_TTL_MS,
};
