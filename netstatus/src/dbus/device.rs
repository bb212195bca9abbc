//! NetworkManager Device proxy.

use zbus::{Result, proxy};

/// Proxy for NetworkManager device interface.
///
/// Only the device type is needed: the indicator filters the device list
/// down to Wi-Fi devices and tracks those through the wireless interface.
#[proxy(
    interface = "org.freedesktop.NetworkManager.Device",
    default_service = "org.freedesktop.NetworkManager"
)]
pub trait NMDevice {
    /// The network interface name (e.g., "wlan0").
    #[zbus(property)]
    fn interface(&self) -> Result<String>;

    /// Device type as a numeric code (2 = Wi-Fi, 8 = modem).
    #[zbus(property)]
    fn device_type(&self) -> Result<u32>;

    /// Path to the active connection of this device ("/" if none).
    #[zbus(property)]
    fn active_connection(&self) -> Result<zvariant::OwnedObjectPath>;
}
