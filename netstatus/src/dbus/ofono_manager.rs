//! ofono manager proxy.

use std::collections::HashMap;
use zbus::{Result, proxy};
use zvariant::{OwnedObjectPath, OwnedValue};

/// Proxy for the ofono manager, which lists modems.
#[proxy(
    interface = "org.ofono.Manager",
    default_service = "org.ofono",
    default_path = "/"
)]
pub trait OfonoManager {
    /// Returns every modem with its property dictionary.
    fn get_modems(&self) -> Result<Vec<(OwnedObjectPath, HashMap<String, OwnedValue>)>>;

    #[zbus(signal)]
    fn modem_added(&self, path: OwnedObjectPath, properties: HashMap<String, OwnedValue>);

    #[zbus(signal)]
    fn modem_removed(&self, path: OwnedObjectPath);
}
