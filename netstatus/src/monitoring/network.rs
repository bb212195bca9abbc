//! Global connectivity monitoring.
//!
//! Follows the NetworkManager state and the type of the primary connection,
//! which together give the networking status and the limited-bandwidth flag.

use futures::stream::StreamExt;
use log::{debug, warn};
use zbus::Connection;

use crate::api::models::NmState;
use crate::core::events::{ConnectivityEvent, IndicatorEvent};
use crate::dbus::NMProxy;
use crate::monitoring::{EventSender, send};
use crate::Result;

/// Monitors the NetworkManager state and primary connection type.
///
/// Sends the current values first, then every change. Runs until the
/// NetworkManager signal streams end.
pub(crate) async fn monitor_connectivity(conn: Connection, tx: EventSender) -> Result<()> {
    let nm = NMProxy::new(&conn).await?;
    let mut state_changes = nm.receive_nm_state_changed().await?;
    let mut primary_changes = nm.receive_primary_connection_type_changed().await;

    send(
        &tx,
        IndicatorEvent::Connectivity(ConnectivityEvent::StateChanged(NmState::from(
            nm.state().await?,
        ))),
    );
    send(
        &tx,
        IndicatorEvent::Connectivity(ConnectivityEvent::PrimaryConnectionType(
            nm.primary_connection_type().await.unwrap_or_default(),
        )),
    );

    loop {
        tokio::select! {
            Some(signal) = state_changes.next() => {
                match signal.args() {
                    Ok(args) => {
                        let state = NmState::from(args.state);
                        debug!("NetworkManager state: {state}");
                        send(&tx, IndicatorEvent::Connectivity(ConnectivityEvent::StateChanged(state)));
                    }
                    Err(e) => warn!("Malformed StateChanged signal: {e}"),
                }
            }
            Some(change) = primary_changes.next() => {
                match change.get().await {
                    Ok(kind) => {
                        debug!("Primary connection type: {kind:?}");
                        send(
                            &tx,
                            IndicatorEvent::Connectivity(ConnectivityEvent::PrimaryConnectionType(kind)),
                        );
                    }
                    Err(e) => warn!("Failed to read primary connection type: {e}"),
                }
            }
            else => break,
        }
    }

    warn!("Connectivity monitoring stream ended");
    Ok(())
}
