//! Notification daemon monitoring.

use futures::stream::StreamExt;
use log::{debug, warn};
use zbus::Connection;

use crate::core::events::{IndicatorEvent, NotificationEvent};
use crate::dbus::NotificationsProxy;
use crate::monitoring::{EventSender, send};
use crate::Result;

/// Forwards `NotificationClosed` signals of the session bus daemon.
///
/// Closes of notifications the indicator did not show are ignored by the
/// core.
pub(crate) async fn monitor_notifications(conn: Connection, tx: EventSender) -> Result<()> {
    let notifications = NotificationsProxy::new(&conn).await?;
    let mut closed = notifications.receive_notification_closed().await?;

    while let Some(signal) = closed.next().await {
        match signal.args() {
            Ok(args) => {
                debug!("Notification {} closed (reason {})", args.id, args.reason);
                send(&tx, IndicatorEvent::Notification(NotificationEvent::Closed(args.id)));
            }
            Err(e) => warn!("Malformed NotificationClosed signal: {e}"),
        }
    }

    warn!("Notification monitoring stream ended");
    Ok(())
}
