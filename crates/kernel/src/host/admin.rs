//! Admin host: owns the menu registry and routes requests to pages.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{ConfigError, HostError};
use crate::menu::MenuRegistry;
use crate::nonce::{HmacNonce, NonceService};
use crate::page::{PageBuilder, SettingsPage};

use super::AdminRequest;

/// Query parameter naming the requested admin page.
pub const PAGE_PARAM: &str = "page";

/// The host side of the admin area.
///
/// Holds the process-wide [`MenuRegistry`] and the nonce service shared by
/// every page it builds.
pub struct AdminHost {
    menus: RwLock<MenuRegistry>,
    nonces: Arc<dyn NonceService>,
}

impl AdminHost {
    /// Create a host with the given nonce service.
    pub fn new(nonces: Arc<dyn NonceService>) -> Self {
        Self {
            menus: RwLock::new(MenuRegistry::new()),
            nonces,
        }
    }

    /// Create a host from runtime configuration.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(Arc::new(HmacNonce::from_config(config)?)))
    }

    /// The shared nonce service.
    pub fn nonces(&self) -> Arc<dyn NonceService> {
        Arc::clone(&self.nonces)
    }

    /// Start building a page that uses this host's nonce service.
    pub fn page(&self, id: impl Into<String>) -> PageBuilder {
        SettingsPage::builder(id).nonces(self.nonces())
    }

    /// Run a page's menu-building phase against this host.
    pub fn register_page(&self, page: &Arc<SettingsPage>) {
        page.initialize(&mut self.menus.write());
    }

    /// Read access to the menu registry.
    pub fn menus(&self) -> RwLockReadGuard<'_, MenuRegistry> {
        self.menus.read()
    }

    /// Route a request by its `page` parameter, check the entry's
    /// capability, and render it.
    pub fn handle(&self, req: &AdminRequest) -> Result<String, HostError> {
        let slug = req
            .query_param(PAGE_PARAM)
            .filter(|s| !s.is_empty())
            .ok_or(HostError::MissingPage)?;

        let (capability, callback) = {
            let menus = self.menus.read();
            let entry = menus
                .get(slug)
                .ok_or_else(|| HostError::NotFound(slug.to_string()))?;
            let callback = menus
                .callback(slug)
                .ok_or_else(|| HostError::NotFound(slug.to_string()))?;
            (entry.capability.clone(), callback)
        };

        if !req.user.has_capability(&capability) {
            warn!(page = %slug, user = %req.user.id, capability = %capability, "admin page access denied");
            return Err(HostError::Forbidden { capability });
        }

        debug!(page = %slug, "rendering admin page");
        Ok(callback(req))
    }
}

impl std::fmt::Debug for AdminHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminHost")
            .field("menus", &*self.menus.read())
            .field("nonces", &"NonceService")
            .finish()
    }
}
