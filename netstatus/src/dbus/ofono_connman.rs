//! ofono packet data connection manager proxy.

use std::collections::HashMap;
use zbus::{Result, proxy};
use zvariant::{OwnedValue, Value};

/// Proxy for the packet data connection manager (`Powered` = mobile data).
#[proxy(interface = "org.ofono.ConnectionManager", default_service = "org.ofono")]
pub trait OfonoConnectionManager {
    fn get_properties(&self) -> Result<HashMap<String, OwnedValue>>;

    fn set_property(&self, name: &str, value: Value<'_>) -> Result<()>;

    #[zbus(signal)]
    fn property_changed(&self, name: String, value: OwnedValue);
}
