//! Main NetworkManager proxy.

use std::collections::HashMap;
use zbus::proxy;
use zvariant::OwnedObjectPath;

/// Proxy for the main NetworkManager interface.
///
/// Provides the device list, the global connectivity state and the
/// connection activation calls the indicator issues.
#[proxy(
    interface = "org.freedesktop.NetworkManager",
    default_service = "org.freedesktop.NetworkManager",
    default_path = "/org/freedesktop/NetworkManager"
)]
pub trait NM {
    /// Returns paths to all network devices.
    fn get_devices(&self) -> zbus::Result<Vec<OwnedObjectPath>>;

    /// Signal emitted when a device appears.
    #[zbus(signal)]
    fn device_added(&self, device_path: OwnedObjectPath);

    /// Signal emitted when a device disappears.
    #[zbus(signal)]
    fn device_removed(&self, device_path: OwnedObjectPath);

    /// Overall networking state (see `nm_state`).
    #[zbus(property)]
    fn state(&self) -> zbus::Result<u32>;

    /// Signal emitted when the overall networking state changes.
    #[zbus(signal, name = "StateChanged")]
    fn nm_state_changed(&self, state: u32);

    /// Connection type of the primary connection (empty if none).
    #[zbus(property)]
    fn primary_connection_type(&self) -> zbus::Result<String>;

    /// Creates a new connection and activates it simultaneously.
    ///
    /// Returns paths to both the new connection settings and active connection.
    fn add_and_activate_connection(
        &self,
        connection: HashMap<&str, HashMap<&str, zvariant::Value<'_>>>,
        device: OwnedObjectPath,
        specific_object: OwnedObjectPath,
    ) -> zbus::Result<(OwnedObjectPath, OwnedObjectPath)>;

    /// Activates an existing saved connection.
    fn activate_connection(
        &self,
        connection: OwnedObjectPath,
        device: OwnedObjectPath,
        specific_object: OwnedObjectPath,
    ) -> zbus::Result<OwnedObjectPath>;

    /// Deactivates an active connection.
    fn deactivate_connection(&self, active_connection: OwnedObjectPath) -> zbus::Result<()>;
}
