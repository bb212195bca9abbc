//! freedesktop notification daemon proxy.

use std::collections::HashMap;
use zbus::{Result, proxy};
use zvariant::Value;

#[proxy(
    interface = "org.freedesktop.Notifications",
    default_service = "org.freedesktop.Notifications",
    default_path = "/org/freedesktop/Notifications"
)]
pub trait Notifications {
    /// Shows a notification, replacing `replaces_id` if non-zero.
    fn notify(
        &self,
        app_name: &str,
        replaces_id: u32,
        app_icon: &str,
        summary: &str,
        body: &str,
        actions: &[&str],
        hints: HashMap<&str, Value<'_>>,
        expire_timeout: i32,
    ) -> Result<u32>;

    fn close_notification(&self, id: u32) -> Result<()>;

    #[zbus(signal)]
    fn notification_closed(&self, id: u32, reason: u32);
}
