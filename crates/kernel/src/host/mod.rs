//! Host-side collaborators of settings pages.
//!
//! Pages never reach into global state. The host hands them:
//! - an [`AdminRequest`] per request (query, form body, user)
//! - a [`MenuRegistry`](crate::menu::MenuRegistry) during the menu phase
//! - a [`NonceService`](crate::nonce::NonceService) at construction

mod admin;
mod request;

pub use admin::{AdminHost, PAGE_PARAM};
pub use request::{ADMIN_CAPABILITY, AdminRequest, FormBody, UserContext};
