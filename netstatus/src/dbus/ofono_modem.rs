//! ofono modem proxy.
//!
//! Every ofono interface exposes its state as a property dictionary
//! (`GetProperties`) plus a `PropertyChanged` signal carrying one entry.

use std::collections::HashMap;
use zbus::{Result, proxy};
use zvariant::OwnedValue;

/// Proxy for a modem (`Online`, `Powered`, `Interfaces`).
#[proxy(interface = "org.ofono.Modem", default_service = "org.ofono")]
pub trait OfonoModem {
    fn get_properties(&self) -> Result<HashMap<String, OwnedValue>>;

    #[zbus(signal)]
    fn property_changed(&self, name: String, value: OwnedValue);
}
