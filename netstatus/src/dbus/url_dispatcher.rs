//! URL dispatcher proxy, used to open the system settings panels.

use zbus::{Result, proxy};

#[proxy(
    interface = "com.canonical.URLDispatcher",
    default_service = "com.canonical.URLDispatcher",
    default_path = "/com/canonical/URLDispatcher"
)]
pub trait URLDispatcher {
    /// Opens `url` in the application registered for its scheme.
    #[zbus(name = "DispatchURL")]
    fn dispatch_url(&self, url: &str, package: &str) -> Result<()>;
}
