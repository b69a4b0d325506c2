//! Per-request context handed to admin pages by the host.
//!
//! An [`AdminRequest`] carries the query parameters used for tab selection,
//! the submitted form body (if any), and the [`UserContext`] that nonces and
//! capability checks are scoped to.

use std::collections::{BTreeMap, HashMap};

use uuid::Uuid;

/// Capability granted to site administrators.
pub const ADMIN_CAPABILITY: &str = "administer site";

/// Submitted form fields, keyed by field name.
pub type FormBody = BTreeMap<String, String>;

/// User context for the current request.
#[derive(Debug, Clone)]
pub struct UserContext {
    /// User ID (Uuid::nil() for anonymous).
    pub id: Uuid,
    /// Whether the user is authenticated.
    pub authenticated: bool,
    /// Session token; nonces issued in one session do not verify in another.
    pub session_token: String,
    /// Capabilities held by the user.
    pub capabilities: Vec<String>,
}

impl UserContext {
    /// Create context for anonymous user.
    pub fn anonymous() -> Self {
        Self {
            id: Uuid::nil(),
            authenticated: false,
            session_token: String::new(),
            capabilities: Vec::new(),
        }
    }

    /// Create context for authenticated user.
    pub fn authenticated(
        id: Uuid,
        session_token: impl Into<String>,
        capabilities: Vec<String>,
    ) -> Self {
        Self {
            id,
            authenticated: true,
            session_token: session_token.into(),
            capabilities,
        }
    }

    /// Check if user has a specific capability.
    pub fn has_capability(&self, capability: &str) -> bool {
        self.authenticated && self.capabilities.iter().any(|c| c == capability)
    }

    /// Check if user is admin.
    pub fn is_admin(&self) -> bool {
        self.has_capability(ADMIN_CAPABILITY)
    }
}

impl Default for UserContext {
    fn default() -> Self {
        Self::anonymous()
    }
}

/// A single admin request: query string, optional form body, and user.
///
/// The presence of a non-empty form body is what distinguishes a submission
/// from a plain page view.
#[derive(Debug, Clone, Default)]
pub struct AdminRequest {
    /// Decoded query parameters.
    pub query: HashMap<String, String>,
    /// Submitted form fields, `None` for GET requests.
    pub form: Option<FormBody>,
    /// The requesting user.
    pub user: UserContext,
}

impl AdminRequest {
    /// Create a view request for the given user.
    pub fn new(user: UserContext) -> Self {
        Self {
            query: HashMap::new(),
            form: None,
            user,
        }
    }

    /// Create a view request from a raw query string such as
    /// `page=demo&tab=advanced`.
    ///
    /// Pairs that fail to percent-decode are skipped.
    pub fn from_query_string(query: &str, user: UserContext) -> Self {
        let query = query
            .trim_start_matches('?')
            .split('&')
            .filter(|pair| !pair.is_empty())
            .filter_map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                let key = urlencoding::decode(&key.replace('+', " ")).ok()?.into_owned();
                let value = urlencoding::decode(&value.replace('+', " ")).ok()?.into_owned();
                Some((key, value))
            })
            .collect();

        Self {
            query,
            form: None,
            user,
        }
    }

    /// Set a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Attach a submitted form body.
    pub fn with_form(mut self, form: FormBody) -> Self {
        self.form = Some(form);
        self
    }

    /// Add a single submitted field, creating the form body if needed.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form
            .get_or_insert_with(FormBody::new)
            .insert(key.into(), value.into());
        self
    }

    /// Get a query parameter.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(|s| s.as_str())
    }

    /// Get a submitted form field.
    pub fn form_field(&self, key: &str) -> Option<&str> {
        self.form
            .as_ref()
            .and_then(|form| form.get(key))
            .map(|s| s.as_str())
    }

    /// Whether the request carries a non-empty form body.
    pub fn has_submission(&self) -> bool {
        self.form.as_ref().is_some_and(|form| !form.is_empty())
    }
}
