//! # session
//!
//! Client-side session core for the formbase front-ends.
//!
//! The browser app (`client`) and the terminal app (`cli`) both drive the
//! same [`SessionController`]: it owns the persisted bearer token, the
//! in-memory user, and the login/signup/logout/OAuth-callback flows. Network
//! access goes through [`HttpClient`], which attaches the token to every
//! request and reports rejected tokens back to the controller.
//!
//! ARCHITECTURE
//! ============
//! `token` → `transport` → `http` → `session` → `guard`, with `forms` and
//! `dashboard` as thin resource helpers over `http`.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod forms;
pub mod guard;
pub mod http;
pub mod session;
pub mod token;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use config::ClientConfig;
pub use error::{ApiError, SessionError};
pub use forms::FormsApi;
pub use guard::GuardDecision;
pub use http::{HttpClient, extract_error_message};
pub use session::{Operation, Route, SessionController, SessionSnapshot, SessionStatus};
pub use token::{MemoryTokenStore, TokenStore};
pub use transport::Transport;
pub use types::User;
