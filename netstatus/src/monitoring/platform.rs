//! Execution of core effects against the platform services.

use async_trait::async_trait;
use log::debug;
use std::collections::HashMap;
use zbus::Connection;
use zvariant::{OwnedObjectPath, Value};

use crate::api::models::{IndicatorOptions, ModemId, NotifyRequest};
use crate::core::events::{Effect, IndicatorEvent, NotificationEvent, UnlockNotification};
use crate::dbus::{
    NMProxy, NotificationsProxy, OfonoConnectionManagerProxy, OfonoSimManagerProxy,
    URLDispatcherProxy, URfkillProxy,
};
use crate::types::constants::{notification, ofono};
use crate::Result;

/// Runs effects emitted by the core.
///
/// Effects are fire-and-forget: their outcomes are observed through the
/// monitors. The only direct answer is the id of a shown notification,
/// returned as an event to feed back into the queue.
#[async_trait]
pub trait Platform: Send + Sync {
    async fn execute(&self, effect: Effect) -> Result<Option<IndicatorEvent>>;
}

/// Object path of the snap-decision menu of the unlock notification for a
/// SIM slot. Slots are numbered from 1, menus from 0.
pub(crate) fn unlock_menu_path(object_path: &str, slot: u32) -> String {
    format!("{object_path}/unlocksim{}", slot.saturating_sub(1))
}

/// Hints turning a notification into a PIN entry snap decision whose menu
/// lives at `menu_path` on `bus_name`.
pub(crate) fn unlock_hints(bus_name: &str, menu_path: &str) -> HashMap<&'static str, Value<'static>> {
    let mut actions: HashMap<String, Value<'static>> = HashMap::new();
    actions.insert("notifications".to_string(), Value::from(menu_path.to_string()));

    let mut menu: HashMap<String, Value<'static>> = HashMap::new();
    menu.insert("busName".to_string(), Value::from(bus_name.to_string()));
    menu.insert("menuPath".to_string(), Value::from(menu_path.to_string()));
    menu.insert("actions".to_string(), Value::from(actions));

    let mut hints = HashMap::new();
    hints.insert(notification::SNAP_DECISIONS, Value::from(true));
    hints.insert(notification::SNAP_DECISIONS_TIMEOUT, Value::from(i32::MAX));
    hints.insert(notification::PRIVATE_MENU_MODEL, Value::from(menu));
    hints
}

/// [`Platform`] talking to the services over D-Bus.
///
/// NetworkManager, ofono and URfkill live on the system bus; the
/// notification daemon and the URL dispatcher on the session bus.
#[derive(Debug, Clone)]
pub struct DbusPlatform {
    system: Connection,
    session: Connection,
    options: IndicatorOptions,
}

impl DbusPlatform {
    pub fn new(system: Connection, session: Connection, options: IndicatorOptions) -> Self {
        Self {
            system,
            session,
            options,
        }
    }

    async fn sim_manager(&self, modem: &ModemId) -> Result<OfonoSimManagerProxy<'static>> {
        Ok(OfonoSimManagerProxy::builder(&self.system)
            .path(OwnedObjectPath::try_from(modem.as_str())?)?
            .build()
            .await?)
    }

    async fn notify(
        &self,
        modem: ModemId,
        slot: u32,
        request: NotifyRequest,
        replaces: Option<u32>,
        content: &UnlockNotification,
    ) -> Result<Option<IndicatorEvent>> {
        let notifications = NotificationsProxy::new(&self.session).await?;
        let menu_path = unlock_menu_path(&self.options.object_path, slot);
        let id = notifications
            .notify(
                &self.options.notification_app_name,
                replaces.unwrap_or(0),
                "",
                &content.title,
                &content.body,
                &[],
                unlock_hints(&self.options.bus_name, &menu_path),
                -1,
            )
            .await?;
        debug!("Unlock notification for {modem} shown as {id}");
        Ok(Some(IndicatorEvent::Notification(NotificationEvent::Shown {
            modem,
            request,
            id,
        })))
    }
}

#[async_trait]
impl Platform for DbusPlatform {
    async fn execute(&self, effect: Effect) -> Result<Option<IndicatorEvent>> {
        debug!("Executing {effect:?}");
        match effect {
            Effect::EnterPin {
                modem,
                pin_type,
                pin,
            } => {
                self.sim_manager(&modem)
                    .await?
                    .enter_pin(pin_type.as_str(), &pin)
                    .await?;
            }
            Effect::ResetPin {
                modem,
                pin_type,
                puk,
                new_pin,
            } => {
                self.sim_manager(&modem)
                    .await?
                    .reset_pin(pin_type.as_str(), &puk, &new_pin)
                    .await?;
            }
            Effect::SetModemPowered { modem, powered } => {
                OfonoConnectionManagerProxy::builder(&self.system)
                    .path(OwnedObjectPath::try_from(modem.as_str())?)?
                    .build()
                    .await?
                    .set_property(ofono::connection_manager::POWERED, Value::from(powered))
                    .await?;
            }
            Effect::BlockRadio { radio, block } => {
                URfkillProxy::new(&self.system)
                    .await?
                    .block(radio.to_code(), block)
                    .await?;
            }
            Effect::SetFlightMode(enabled) => {
                URfkillProxy::new(&self.system)
                    .await?
                    .flight_mode(enabled)
                    .await?;
            }
            Effect::ActivateConnection {
                device,
                connection,
                access_point,
            } => {
                NMProxy::new(&self.system)
                    .await?
                    .activate_connection(
                        OwnedObjectPath::try_from(connection.as_str())?,
                        OwnedObjectPath::try_from(device.as_str())?,
                        OwnedObjectPath::try_from(access_point.as_str())?,
                    )
                    .await?;
            }
            Effect::AddAndActivateConnection {
                device,
                access_point,
            } => {
                // NetworkManager completes the profile from the access point.
                NMProxy::new(&self.system)
                    .await?
                    .add_and_activate_connection(
                        HashMap::new(),
                        OwnedObjectPath::try_from(device.as_str())?,
                        OwnedObjectPath::try_from(access_point.as_str())?,
                    )
                    .await?;
            }
            Effect::DeactivateConnection(active) => {
                NMProxy::new(&self.system)
                    .await?
                    .deactivate_connection(OwnedObjectPath::try_from(active.as_str())?)
                    .await?;
            }
            Effect::Notify {
                modem,
                slot,
                request,
                replaces,
                content,
            } => return self.notify(modem, slot, request, replaces, &content).await,
            Effect::CloseNotification(id) => {
                NotificationsProxy::new(&self.session)
                    .await?
                    .close_notification(id)
                    .await?;
            }
            Effect::OpenSettings(url) => {
                URLDispatcherProxy::new(&self.session)
                    .await?
                    .dispatch_url(url, "")
                    .await?;
            }
        }
        Ok(None)
    }
}
