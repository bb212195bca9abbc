//! ofono network registration proxy.

use std::collections::HashMap;
use zbus::{Result, proxy};
use zvariant::OwnedValue;

/// Proxy for network registration (status, strength, technology, operator).
#[proxy(
    interface = "org.ofono.NetworkRegistration",
    default_service = "org.ofono"
)]
pub trait OfonoNetworkRegistration {
    fn get_properties(&self) -> Result<HashMap<String, OwnedValue>>;

    #[zbus(signal)]
    fn property_changed(&self, name: String, value: OwnedValue);
}
