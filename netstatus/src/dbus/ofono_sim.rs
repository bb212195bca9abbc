//! ofono SIM manager proxy.

use std::collections::HashMap;
use zbus::{Result, proxy};
use zvariant::OwnedValue;

/// Proxy for the SIM card of a modem.
#[proxy(interface = "org.ofono.SimManager", default_service = "org.ofono")]
pub trait OfonoSimManager {
    fn get_properties(&self) -> Result<HashMap<String, OwnedValue>>;

    /// Enters a PIN of the given type (`"pin"`, `"puk"`, ...).
    fn enter_pin(&self, pin_type: &str, pin: &str) -> Result<()>;

    /// Unblocks the SIM with a PUK and sets a new PIN.
    fn reset_pin(&self, puk_type: &str, puk: &str, new_pin: &str) -> Result<()>;

    #[zbus(signal)]
    fn property_changed(&self, name: String, value: OwnedValue);
}
