//! Cellular modem monitoring through ofono.
//!
//! Every modem gets its own watcher task that reads the property dictionaries
//! of the modem, SIM, network registration and connection manager interfaces
//! and follows their `PropertyChanged` signals.

use futures::stream::{Stream, StreamExt};
use log::{debug, warn};
use std::collections::HashMap;
use std::pin::Pin;
use zbus::Connection;
use zvariant::{OwnedObjectPath, OwnedValue, Value};

use crate::api::models::{
    LockState, ModemId, ModemProperty, RegistrationStatus, Retries, Technology,
};
use crate::core::events::{IndicatorEvent, ModemEvent};
use crate::dbus::{
    OfonoConnectionManagerProxy, OfonoManagerProxy, OfonoModemProxy,
    OfonoNetworkRegistrationProxy, OfonoSimManagerProxy,
};
use crate::monitoring::{EventSender, Watchers, send};
use crate::types::constants::ofono;
use crate::Result;

/// The ofono interfaces a modem's state is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ModemInterface {
    Modem,
    SimManager,
    NetworkRegistration,
    ConnectionManager,
}

/// Translates one ofono property into a modem property.
///
/// Returns `None` for properties the indicator does not track and for values
/// of an unexpected type.
pub(crate) fn modem_property(
    interface: ModemInterface,
    name: &str,
    value: &OwnedValue,
) -> Option<ModemProperty> {
    use ofono::{connection_manager, modem, network_registration, sim_manager};

    match (interface, name) {
        (ModemInterface::Modem, modem::ONLINE) => {
            value.downcast_ref::<bool>().ok().map(ModemProperty::Online)
        }
        (ModemInterface::SimManager, sim_manager::PRESENT) => {
            value.downcast_ref::<bool>().ok().map(ModemProperty::SimPresent)
        }
        (ModemInterface::SimManager, sim_manager::PIN_REQUIRED) => value
            .downcast_ref::<&str>()
            .ok()
            .map(|s| ModemProperty::LockState(LockState::from(s))),
        (ModemInterface::SimManager, sim_manager::RETRIES) => {
            let retries = HashMap::<String, u8>::try_from(Value::from(value.try_clone().ok()?)).ok()?;
            Some(ModemProperty::Retries(Retries {
                pin: retries.get("pin").copied(),
                puk: retries.get("puk").copied(),
            }))
        }
        (ModemInterface::NetworkRegistration, network_registration::STATUS) => {
            value.downcast_ref::<&str>().ok().map(|s| {
                let (status, roaming) = RegistrationStatus::from_ofono(s);
                ModemProperty::Registration { status, roaming }
            })
        }
        (ModemInterface::NetworkRegistration, network_registration::STRENGTH) => {
            value.downcast_ref::<u8>().ok().map(ModemProperty::Strength)
        }
        (ModemInterface::NetworkRegistration, network_registration::TECHNOLOGY) => value
            .downcast_ref::<&str>()
            .ok()
            .map(|s| ModemProperty::Technology(Technology::from(s))),
        (ModemInterface::NetworkRegistration, network_registration::NAME) => value
            .downcast_ref::<&str>()
            .ok()
            .map(|s| ModemProperty::Operator(s.to_string())),
        (ModemInterface::ConnectionManager, connection_manager::POWERED) => {
            value.downcast_ref::<bool>().ok().map(ModemProperty::DataEnabled)
        }
        _ => None,
    }
}

fn properties_of(
    interface: ModemInterface,
    dict: &HashMap<String, OwnedValue>,
) -> Vec<ModemProperty> {
    dict.iter()
        .filter_map(|(name, value)| modem_property(interface, name, value))
        .collect()
}

/// Monitors modem additions and removals and spawns a watcher per modem.
///
/// Runs until the ofono manager signal streams end.
pub(crate) async fn monitor_modems(conn: Connection, tx: EventSender) -> Result<()> {
    let manager = OfonoManagerProxy::new(&conn).await?;
    let mut added = manager.receive_modem_added().await?;
    let mut removed = manager.receive_modem_removed().await?;
    let mut watchers = Watchers::new();

    for (path, _) in manager.get_modems().await? {
        start_watcher(&conn, &tx, &mut watchers, path);
    }

    loop {
        tokio::select! {
            Some(signal) = added.next() => {
                match signal.args() {
                    Ok(args) => start_watcher(&conn, &tx, &mut watchers, args.path),
                    Err(e) => warn!("Malformed ModemAdded signal: {e}"),
                }
            }
            Some(signal) = removed.next() => {
                match signal.args() {
                    Ok(args) => {
                        watchers.remove(&args.path);
                        send(&tx, IndicatorEvent::Modem(ModemEvent::Removed(ModemId::new(
                            args.path.as_str(),
                        ))));
                    }
                    Err(e) => warn!("Malformed ModemRemoved signal: {e}"),
                }
            }
            else => break,
        }
    }

    warn!("ofono monitoring stream ended");
    Ok(())
}

fn start_watcher(
    conn: &Connection,
    tx: &EventSender,
    watchers: &mut Watchers<OwnedObjectPath>,
    path: OwnedObjectPath,
) {
    if watchers.contains(&path) {
        return;
    }
    let id = ModemId::new(path.as_str());
    send(tx, IndicatorEvent::Modem(ModemEvent::Added(id.clone())));

    let conn = conn.clone();
    let tx = tx.clone();
    let watched = path.clone();
    let handle = tokio::spawn(async move {
        if let Err(e) = watch_modem(&conn, watched, id.clone(), &tx).await {
            warn!("Stopped watching modem {id}: {e}");
        }
    });
    watchers.insert(path, handle);
}

type PropertyStream = Pin<Box<dyn Stream<Item = Option<ModemProperty>> + Send>>;

/// Reads the initial property dictionaries of a modem and forwards every
/// subsequent property change.
async fn watch_modem(
    conn: &Connection,
    path: OwnedObjectPath,
    id: ModemId,
    tx: &EventSender,
) -> Result<()> {
    let modem = OfonoModemProxy::builder(conn).path(path.clone())?.build().await?;
    let sim = OfonoSimManagerProxy::builder(conn).path(path.clone())?.build().await?;
    let netreg = OfonoNetworkRegistrationProxy::builder(conn)
        .path(path.clone())?
        .build()
        .await?;
    let data = OfonoConnectionManagerProxy::builder(conn)
        .path(path)?
        .build()
        .await?;

    // Subscribe before reading so no change between the two is lost.
    let mut streams: Vec<PropertyStream> = Vec::new();
    streams.push(Box::pin(modem.receive_property_changed().await?.map(|s| {
        let args = s.args().ok()?;
        modem_property(ModemInterface::Modem, &args.name, &args.value)
    })));
    streams.push(Box::pin(sim.receive_property_changed().await?.map(|s| {
        let args = s.args().ok()?;
        modem_property(ModemInterface::SimManager, &args.name, &args.value)
    })));
    streams.push(Box::pin(netreg.receive_property_changed().await?.map(|s| {
        let args = s.args().ok()?;
        modem_property(ModemInterface::NetworkRegistration, &args.name, &args.value)
    })));
    streams.push(Box::pin(data.receive_property_changed().await?.map(|s| {
        let args = s.args().ok()?;
        modem_property(ModemInterface::ConnectionManager, &args.name, &args.value)
    })));

    // Interfaces appear as the modem powers up; a missing one is not fatal.
    let dictionaries = [
        (ModemInterface::Modem, modem.get_properties().await),
        (ModemInterface::SimManager, sim.get_properties().await),
        (ModemInterface::NetworkRegistration, netreg.get_properties().await),
        (ModemInterface::ConnectionManager, data.get_properties().await),
    ];
    for (interface, dict) in dictionaries {
        match dict {
            Ok(dict) => {
                let props = properties_of(interface, &dict);
                if !props.is_empty() {
                    send(tx, IndicatorEvent::Modem(ModemEvent::Properties(id.clone(), props)));
                }
            }
            Err(e) => debug!("{interface:?} of {id} not available yet: {e}"),
        }
    }

    let mut merged = futures::stream::select_all(streams);
    while let Some(change) = merged.next().await {
        if let Some(property) = change {
            debug!("Modem {id}: {property:?}");
            send(
                tx,
                IndicatorEvent::Modem(ModemEvent::Properties(id.clone(), vec![property])),
            );
        }
    }

    Ok(())
}
