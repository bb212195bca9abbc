//! NetworkManager Settings proxies.

use std::collections::HashMap;
use zbus::{Result, proxy};
use zvariant::{OwnedObjectPath, OwnedValue};

/// Proxy for the saved connection list.
#[proxy(
    interface = "org.freedesktop.NetworkManager.Settings",
    default_service = "org.freedesktop.NetworkManager",
    default_path = "/org/freedesktop/NetworkManager/Settings"
)]
pub trait NMSettings {
    /// Paths of all saved connection profiles.
    fn list_connections(&self) -> Result<Vec<OwnedObjectPath>>;

    #[zbus(signal)]
    fn new_connection(&self, connection: OwnedObjectPath);

    #[zbus(signal)]
    fn connection_removed(&self, connection: OwnedObjectPath);
}

/// Proxy for a single saved connection profile.
#[proxy(
    interface = "org.freedesktop.NetworkManager.Settings.Connection",
    default_service = "org.freedesktop.NetworkManager"
)]
pub trait NMSettingsConnection {
    /// The connection settings, keyed by setting name then property.
    fn get_settings(&self) -> Result<HashMap<String, HashMap<String, OwnedValue>>>;
}
