//! Page modules for route-level screens.
//!
//! ARCHITECTURE
//! ============
//! Each page owns route-scoped orchestration and delegates rendering details
//! to `components`. Input checks live in pure helpers next to each page so
//! they can be tested without a DOM.

pub mod callback;
pub(crate) mod credentials;
pub mod dashboard;
pub mod form_detail;
pub mod login;
pub mod profile;
pub mod reset_password;
pub mod signup;
