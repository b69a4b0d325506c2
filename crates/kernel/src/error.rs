//! Error types for page construction, configuration, and host routing.
//!
//! Request-time rendering never returns these: a settings page always
//! produces HTML. They surface only while building pages, loading page
//! definitions, or routing a request inside [`AdminHost`](crate::host::AdminHost).

use thiserror::Error;

/// Errors raised while validating or loading page configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("page `{0}` has no tabs")]
    NoTabs(String),

    #[error("page `{page}` declares tab `{tab}` more than once")]
    DuplicateTab { page: String, tab: String },

    #[error("page `{page}` has default tab `{tab}` which is not one of its tabs")]
    UnknownDefaultTab { page: String, tab: String },

    #[error("page `{0}` has a tab with an empty key")]
    EmptyTabKey(String),

    #[error("invalid page slug `{0}`: use lowercase letters, digits, `-` or `_`")]
    InvalidSlug(String),

    #[error("invalid nonce secret: {0}")]
    InvalidSecret(String),

    #[error("unsupported page definition format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to parse page definition: {0}")]
    Parse(String),

    #[error("failed to read page definition")]
    Io(#[from] std::io::Error),
}

/// Errors raised while building a [`SettingsPage`](crate::page::SettingsPage).
#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to load page templates")]
    Template(#[from] tera::Error),
}

/// Errors raised by the admin host while routing a request.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("no admin page registered for `{0}`")]
    NotFound(String),

    #[error("missing `page` query parameter")]
    MissingPage,

    #[error("access denied: `{capability}` required")]
    Forbidden { capability: String },
}

/// Result type alias using PageError.
pub type PageResult<T> = Result<T, PageError>;
