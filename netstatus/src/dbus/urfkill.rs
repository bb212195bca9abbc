//! URfkill proxies for radio kill-switches.

use zbus::{Result, proxy};

/// Proxy for the URfkill daemon.
#[proxy(
    interface = "org.freedesktop.URfkill",
    default_service = "org.freedesktop.URfkill",
    default_path = "/org/freedesktop/URfkill"
)]
pub trait URfkill {
    /// Blocks or unblocks every radio.
    fn flight_mode(&self, block: bool) -> Result<bool>;

    /// Blocks or unblocks one radio type.
    fn block(&self, radio_type: u32, block: bool) -> Result<bool>;

    fn is_flight_mode(&self) -> Result<bool>;

    #[zbus(signal)]
    fn flight_mode_changed(&self, flight_mode: bool);
}

/// Proxy for the kill-switch of one radio type.
#[proxy(
    interface = "org.freedesktop.URfkill.Killswitch",
    default_service = "org.freedesktop.URfkill"
)]
pub trait URfkillKillswitch {
    /// Kill-switch state (-1 = no adapter, 0 = unblocked, 1 = soft, 2 = hard).
    #[zbus(property)]
    fn state(&self) -> Result<i32>;
}
