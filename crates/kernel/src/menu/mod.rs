//! Admin menu system.
//!
//! Settings pages register into a host-owned [`MenuRegistry`], which provides:
//! - Top-level and submenu entries with their render callbacks
//! - Per-page submenu links (one per settings tab)
//! - Capability requirements per entry

mod registry;

pub use registry::{MenuEntry, MenuRegistry, MenuTree, RenderCallback, SubmenuLink};
