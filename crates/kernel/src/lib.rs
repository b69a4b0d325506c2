//! Tabset Kernel Library
//!
//! Tabbed admin settings pages: menu registration, tab dispatch, and
//! nonce-protected form handling. The `tabset` binary previews page
//! definition files.

pub mod cli;
pub mod config;
pub mod error;
pub mod extension;
pub mod host;
pub mod menu;
pub mod nonce;
pub mod page;
