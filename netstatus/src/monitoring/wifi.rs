//! Wi-Fi device, access point and saved connection monitoring.
//!
//! Every Wi-Fi device gets a watcher task that follows its access point list
//! and its active connection. Every access point gets a watcher of its own
//! that re-reads the properties the indicator groups and displays by.

use futures::stream::{Stream, StreamExt};
use log::{debug, warn};
use std::collections::HashMap;
use std::pin::Pin;
use zbus::Connection;
use zbus::proxy::CacheProperties;
use zvariant::{OwnedObjectPath, OwnedValue, Value};

use crate::api::models::{
    AccessPointId, AccessPointProps, ActiveAccessPoint, ActiveConnectionId, ConnectionId,
    ConnectionStatus, DeviceId, SavedConnection,
};
use crate::core::events::{IndicatorEvent, WifiEvent};
use crate::dbus::{
    NMAccessPointProxy, NMActiveConnectionProxy, NMDeviceProxy, NMProxy,
    NMSettingsConnectionProxy, NMSettingsProxy, NMWirelessProxy,
};
use crate::monitoring::{EventSender, Watchers, send};
use crate::try_log;
use crate::types::constants::{ApFlags, active_connection_state, device_type, wifi_mode};
use crate::Result;

type ChangeStream = Pin<Box<dyn Stream<Item = ()> + Send>>;

/// Whether an access point requires authentication.
pub(crate) fn is_secured(flags: u32, wpa_flags: u32, rsn_flags: u32) -> bool {
    ApFlags::from_bits_truncate(flags).contains(ApFlags::PRIVACY) || wpa_flags != 0 || rsn_flags != 0
}

/// Reads the grouping and display properties of an access point.
pub(crate) async fn access_point_props(ap: &NMAccessPointProxy<'_>) -> Result<AccessPointProps> {
    let flags = ap.flags().await?;
    let wpa_flags = ap.wpa_flags().await?;
    let rsn_flags = ap.rsn_flags().await?;

    Ok(AccessPointProps {
        ssid: ap.ssid().await?,
        secured: is_secured(flags, wpa_flags, rsn_flags),
        adhoc: ap.mode().await? == wifi_mode::ADHOC,
        strength: ap.strength().await?,
    })
}

/// Monitors Wi-Fi devices appearing and disappearing.
///
/// Non Wi-Fi devices are ignored. Runs until the NetworkManager signal
/// streams end.
pub(crate) async fn monitor_wifi(conn: Connection, tx: EventSender) -> Result<()> {
    let nm = NMProxy::new(&conn).await?;
    let mut added = nm.receive_device_added().await?;
    let mut removed = nm.receive_device_removed().await?;
    let mut devices = Watchers::new();

    for path in nm.get_devices().await? {
        start_device(&conn, &tx, &mut devices, path).await;
    }

    loop {
        tokio::select! {
            Some(signal) = added.next() => {
                match signal.args() {
                    Ok(args) => start_device(&conn, &tx, &mut devices, args.device_path).await,
                    Err(e) => warn!("Malformed DeviceAdded signal: {e}"),
                }
            }
            Some(signal) = removed.next() => {
                match signal.args() {
                    Ok(args) => {
                        if devices.remove(&args.device_path) {
                            debug!("Wi-Fi device removed: {}", args.device_path.as_str());
                            send(
                                &tx,
                                IndicatorEvent::Wifi(WifiEvent::DeviceRemoved(DeviceId::new(
                                    args.device_path.as_str(),
                                ))),
                            );
                        }
                    }
                    Err(e) => warn!("Malformed DeviceRemoved signal: {e}"),
                }
            }
            else => break,
        }
    }

    warn!("Wi-Fi device monitoring stream ended");
    Ok(())
}

async fn start_device(
    conn: &Connection,
    tx: &EventSender,
    devices: &mut Watchers<OwnedObjectPath>,
    path: OwnedObjectPath,
) {
    if devices.contains(&path) || !is_wifi_device(conn, &path).await {
        return;
    }
    debug!("Watching Wi-Fi device {}", path.as_str());

    let conn = conn.clone();
    let tx = tx.clone();
    let watched = path.clone();
    devices.insert(
        path,
        tokio::spawn(async move {
            if let Err(e) = watch_device(conn, watched.clone(), tx).await {
                warn!("Stopped watching Wi-Fi device {}: {e}", watched.as_str());
            }
        }),
    );
}

async fn is_wifi_device(conn: &Connection, path: &OwnedObjectPath) -> bool {
    let check = async {
        let dev = NMDeviceProxy::builder(conn).path(path.clone())?.build().await?;
        Ok::<_, zbus::Error>(dev.device_type().await?)
    };
    matches!(check.await, Ok(kind) if kind == device_type::WIFI)
}

/// Follows the access points and the active connection of one device.
async fn watch_device(conn: Connection, path: OwnedObjectPath, tx: EventSender) -> Result<()> {
    let id = DeviceId::new(path.as_str());
    let device = NMDeviceProxy::builder(&conn).path(path.clone())?.build().await?;
    let wireless = NMWirelessProxy::builder(&conn).path(path)?.build().await?;

    let mut added = wireless.receive_access_point_added().await?;
    let mut removed = wireless.receive_access_point_removed().await?;
    let mut active_changes = device.receive_active_connection_changed().await;

    send(&tx, IndicatorEvent::Wifi(WifiEvent::DeviceAdded(id.clone())));

    let mut access_points = Watchers::new();
    for ap in wireless.access_points().await? {
        start_access_point(&conn, &tx, &mut access_points, &id, ap);
    }

    let mut state_changes: Option<ChangeStream> = None;
    let mut last: Option<ActiveAccessPoint> = None;
    let mut refresh = true;

    loop {
        if refresh {
            let (active, changes) = resolve_active(&conn, &device).await;
            state_changes = changes;
            if active != last {
                debug!("Active access point of {id}: {active:?}");
                send(
                    &tx,
                    IndicatorEvent::Wifi(WifiEvent::ActiveConnectionChanged {
                        device: id.clone(),
                        active: active.clone(),
                    }),
                );
                last = active;
            }
        }

        refresh = tokio::select! {
            Some(signal) = added.next() => {
                match signal.args() {
                    Ok(args) => start_access_point(&conn, &tx, &mut access_points, &id, args.path),
                    Err(e) => warn!("Malformed AccessPointAdded signal: {e}"),
                }
                false
            }
            Some(signal) = removed.next() => {
                match signal.args() {
                    Ok(args) => {
                        access_points.remove(&args.path);
                        send(
                            &tx,
                            IndicatorEvent::Wifi(WifiEvent::AccessPointRemoved(AccessPointId::new(
                                args.path.as_str(),
                            ))),
                        );
                    }
                    Err(e) => warn!("Malformed AccessPointRemoved signal: {e}"),
                }
                false
            }
            Some(_) = active_changes.next() => true,
            Some(()) = next_change(&mut state_changes) => true,
            else => break,
        };
    }

    warn!("Signal streams of Wi-Fi device {id} ended");
    Ok(())
}

/// Waits for the next item of an optional stream; never resolves for `None`.
async fn next_change(stream: &mut Option<ChangeStream>) -> Option<()> {
    match stream {
        Some(stream) => stream.next().await,
        None => futures::future::pending().await,
    }
}

/// Reads the active connection of a device and subscribes to its
/// activation state.
async fn resolve_active(
    conn: &Connection,
    device: &NMDeviceProxy<'_>,
) -> (Option<ActiveAccessPoint>, Option<ChangeStream>) {
    let Some((path, active)) = active_connection(conn, device).await else {
        return (None, None);
    };
    let changes = match active.receive_activation_state_changed().await {
        Ok(stream) => Some(Box::pin(stream.map(|_| ())) as ChangeStream),
        Err(e) => {
            warn!("Failed to follow active connection {}: {e}", path.as_str());
            None
        }
    };
    (active_access_point(&path, &active).await, changes)
}

async fn active_connection(
    conn: &Connection,
    device: &NMDeviceProxy<'_>,
) -> Option<(OwnedObjectPath, NMActiveConnectionProxy<'static>)> {
    let path = try_log!(
        device.active_connection().await,
        "Failed to get active connection of device"
    );
    if path.as_str() == "/" {
        return None;
    }
    let builder = try_log!(
        NMActiveConnectionProxy::builder(conn).path(path.clone()),
        "Failed to create active connection proxy builder"
    );
    let active = try_log!(
        builder
            .cache_properties(CacheProperties::No)
            .build()
            .await,
        "Failed to build active connection proxy"
    );
    Some((path, active))
}

async fn active_access_point(
    path: &OwnedObjectPath,
    active: &NMActiveConnectionProxy<'_>,
) -> Option<ActiveAccessPoint> {
    let status = match try_log!(active.state().await, "Failed to get activation state") {
        active_connection_state::ACTIVATING => ConnectionStatus::Connecting,
        active_connection_state::ACTIVATED => ConnectionStatus::Connected,
        _ => return None,
    };
    let ap = try_log!(
        active.specific_object().await,
        "Failed to get access point of active connection"
    );
    if ap.as_str() == "/" {
        return None;
    }

    Some(ActiveAccessPoint {
        connection: ActiveConnectionId::new(path.as_str()),
        access_point: AccessPointId::new(ap.as_str()),
        status,
    })
}

fn start_access_point(
    conn: &Connection,
    tx: &EventSender,
    access_points: &mut Watchers<OwnedObjectPath>,
    device: &DeviceId,
    path: OwnedObjectPath,
) {
    if access_points.contains(&path) {
        return;
    }
    let conn = conn.clone();
    let tx = tx.clone();
    let device = device.clone();
    let watched = path.clone();
    access_points.insert(
        path,
        tokio::spawn(async move {
            if let Err(e) = watch_access_point(&conn, device, watched.clone(), &tx).await {
                // Access points routinely vanish between the signal and the read.
                debug!("Stopped watching access point {}: {e}", watched.as_str());
            }
        }),
    );
}

async fn watch_access_point(
    conn: &Connection,
    device: DeviceId,
    path: OwnedObjectPath,
    tx: &EventSender,
) -> Result<()> {
    let id = AccessPointId::new(path.as_str());
    let ap = NMAccessPointProxy::builder(conn).path(path)?.build().await?;

    let streams: Vec<ChangeStream> = vec![
        Box::pin(ap.receive_strength_changed().await.map(|_| ())),
        Box::pin(ap.receive_ssid_changed().await.map(|_| ())),
        Box::pin(ap.receive_flags_changed().await.map(|_| ())),
        Box::pin(ap.receive_wpa_flags_changed().await.map(|_| ())),
        Box::pin(ap.receive_rsn_flags_changed().await.map(|_| ())),
    ];
    let mut changes = futures::stream::select_all(streams);

    let mut last = access_point_props(&ap).await?;
    send(
        tx,
        IndicatorEvent::Wifi(WifiEvent::AccessPointAdded {
            device,
            id: id.clone(),
            props: last.clone(),
        }),
    );

    while changes.next().await.is_some() {
        let props = access_point_props(&ap).await?;
        if props != last {
            send(
                tx,
                IndicatorEvent::Wifi(WifiEvent::AccessPointUpdated {
                    id: id.clone(),
                    props: props.clone(),
                }),
            );
            last = props;
        }
    }
    Ok(())
}

/// Extracts the SSID of a Wi-Fi connection profile.
pub(crate) fn wireless_ssid(settings: &HashMap<String, HashMap<String, OwnedValue>>) -> Option<Vec<u8>> {
    let value = settings.get("802-11-wireless")?.get("ssid")?;
    Vec::<u8>::try_from(Value::from(value.try_clone().ok()?)).ok()
}

async fn saved_connection(conn: &Connection, path: OwnedObjectPath) -> Option<SavedConnection> {
    let builder = try_log!(
        NMSettingsConnectionProxy::builder(conn).path(path.clone()),
        "Failed to create settings connection proxy builder"
    );
    let proxy = try_log!(builder.build().await, "Failed to build settings connection proxy");
    let settings = try_log!(proxy.get_settings().await, "Failed to read connection settings");

    Some(SavedConnection {
        id: ConnectionId::new(path.as_str()),
        ssid: wireless_ssid(&settings)?,
    })
}

/// Monitors the saved Wi-Fi connection profiles.
pub(crate) async fn monitor_saved_connections(conn: Connection, tx: EventSender) -> Result<()> {
    let settings = NMSettingsProxy::new(&conn).await?;
    let mut added = settings.receive_new_connection().await?;
    let mut removed = settings.receive_connection_removed().await?;

    for path in settings.list_connections().await? {
        if let Some(saved) = saved_connection(&conn, path).await {
            send(&tx, IndicatorEvent::Wifi(WifiEvent::ConnectionAdded(saved)));
        }
    }

    loop {
        tokio::select! {
            Some(signal) = added.next() => {
                match signal.args() {
                    Ok(args) => {
                        if let Some(saved) = saved_connection(&conn, args.connection).await {
                            send(&tx, IndicatorEvent::Wifi(WifiEvent::ConnectionAdded(saved)));
                        }
                    }
                    Err(e) => warn!("Malformed NewConnection signal: {e}"),
                }
            }
            Some(signal) = removed.next() => {
                match signal.args() {
                    Ok(args) => send(
                        &tx,
                        IndicatorEvent::Wifi(WifiEvent::ConnectionRemoved(ConnectionId::new(
                            args.connection.as_str(),
                        ))),
                    ),
                    Err(e) => warn!("Malformed ConnectionRemoved signal: {e}"),
                }
            }
            else => break,
        }
    }

    warn!("Saved connection monitoring stream ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn security_from_flags() {
        assert!(!is_secured(0, 0, 0));
        assert!(is_secured(ApFlags::PRIVACY.bits(), 0, 0));
        assert!(is_secured(0, 0x100, 0));
        assert!(is_secured(0, 0, 0x100));
        // WPS alone does not imply security.
        assert!(!is_secured((ApFlags::WPS | ApFlags::WPS_PBC).bits(), 0, 0));
    }

    #[test]
    fn ssid_from_connection_settings() {
        let ssid = OwnedValue::try_from(Value::from(vec![b'h', b'o', b'm', b'e'])).expect("owned");
        let mut wireless = HashMap::new();
        wireless.insert("ssid".to_string(), ssid);
        let mut settings = HashMap::new();
        settings.insert("802-11-wireless".to_string(), wireless);

        assert_eq!(wireless_ssid(&settings), Some(b"home".to_vec()));
    }

    #[test]
    fn non_wireless_connection_has_no_ssid() {
        let mut gsm = HashMap::new();
        gsm.insert(
            "apn".to_string(),
            OwnedValue::try_from(Value::from("internet")).expect("owned"),
        );
        let mut settings = HashMap::new();
        settings.insert("gsm".to_string(), gsm);

        assert_eq!(wireless_ssid(&settings), None);
    }
}
