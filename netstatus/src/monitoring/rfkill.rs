//! Radio kill-switch monitoring through URfkill.

use futures::stream::StreamExt;
use log::{debug, warn};
use zbus::Connection;

use crate::api::models::{RadioBlock, RadioType};
use crate::core::events::{IndicatorEvent, RadioEvent};
use crate::dbus::{URfkillKillswitchProxy, URfkillProxy};
use crate::monitoring::{EventSender, send};
use crate::types::constants::urfkill;
use crate::Result;

fn block_changed(radio: RadioType, state: i32) -> IndicatorEvent {
    IndicatorEvent::Radio(RadioEvent::BlockChanged {
        radio,
        block: RadioBlock::from(state),
    })
}

/// Monitors the flight mode flag and the Wi-Fi and cellular kill-switches.
///
/// Sends the current values first, then every change.
pub(crate) async fn monitor_radios(conn: Connection, tx: EventSender) -> Result<()> {
    let rfkill = URfkillProxy::new(&conn).await?;
    let wlan = URfkillKillswitchProxy::builder(&conn)
        .path(urfkill::WLAN_PATH)?
        .build()
        .await?;
    let wwan = URfkillKillswitchProxy::builder(&conn)
        .path(urfkill::WWAN_PATH)?
        .build()
        .await?;

    let mut flight_mode_changes = rfkill.receive_flight_mode_changed().await?;
    let mut wlan_changes = wlan.receive_state_changed().await;
    let mut wwan_changes = wwan.receive_state_changed().await;

    for (radio, switch) in [(RadioType::Wifi, &wlan), (RadioType::Wwan, &wwan)] {
        match switch.state().await {
            Ok(state) => send(&tx, block_changed(radio, state)),
            Err(e) => warn!("Failed to read {radio} kill-switch: {e}"),
        }
    }
    send(
        &tx,
        IndicatorEvent::Radio(RadioEvent::FlightModeChanged(rfkill.is_flight_mode().await?)),
    );

    loop {
        tokio::select! {
            Some(signal) = flight_mode_changes.next() => {
                match signal.args() {
                    Ok(args) => {
                        debug!("Flight mode changed: {}", args.flight_mode);
                        send(&tx, IndicatorEvent::Radio(RadioEvent::FlightModeChanged(args.flight_mode)));
                    }
                    Err(e) => warn!("Malformed FlightModeChanged signal: {e}"),
                }
            }
            Some(change) = wlan_changes.next() => {
                match change.get().await {
                    Ok(state) => send(&tx, block_changed(RadioType::Wifi, state)),
                    Err(e) => warn!("Failed to read Wi-Fi kill-switch: {e}"),
                }
            }
            Some(change) = wwan_changes.next() => {
                match change.get().await {
                    Ok(state) => send(&tx, block_changed(RadioType::Wwan, state)),
                    Err(e) => warn!("Failed to read cellular kill-switch: {e}"),
                }
            }
            else => break,
        }
    }

    warn!("Kill-switch monitoring stream ended");
    Ok(())
}
