//! The single processing step of the indicator.
//!
//! [`IndicatorCore`] owns every leaf component. A batch of events is applied
//! in arrival order, then the view model is rebuilt once and diffed, so no
//! torn state is ever published.

use log::{debug, warn};
use std::collections::BTreeMap;

use crate::api::models::{IndicatorOptions, ModemId, NotificationId, ViewModel};
use crate::core::access_points::AccessPointRegistry;
use crate::core::connectivity::{ConnectivityState, RadioState};
use crate::core::events::{
    ConnectivityEvent, Effect, IndicatorEvent, ModemEvent, NotificationEvent, RadioEvent,
    UserAction, WifiEvent,
};
use crate::core::menu::{MenuModel, MenuProjection, Variant, unlock_menu};
use crate::core::modem_set::ModemSet;
use crate::core::root_state::{RootStateAggregator, ViewUpdate, build_view_model};
use crate::core::sim_unlock::{SimUnlockController, UnlockState};
use crate::types::constants::settings;
use crate::Result;

/// Outcome of processing one batch of events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Step {
    /// Platform requests to run, in order.
    pub effects: Vec<Effect>,
    /// Granular view model changes since the previous step.
    pub updates: Vec<ViewUpdate>,
    /// Whether a shutdown was processed.
    pub shutdown: bool,
}

/// Owns the aggregation state and processes event batches.
///
/// # Example
///
/// ```rust
/// use netstatus::{IndicatorCore, IndicatorEvent, IndicatorOptions, ModemEvent, ModemId};
///
/// let mut core = IndicatorCore::new(&IndicatorOptions::default());
/// let step = core.process([IndicatorEvent::Modem(ModemEvent::Added(ModemId::new("/ril_0")))]);
/// assert!(step.effects.is_empty());
/// assert_eq!(core.view().sim_slots[0].label, "No SIM");
/// ```
#[derive(Debug)]
pub struct IndicatorCore {
    modems: ModemSet,
    access_points: AccessPointRegistry,
    radio: RadioState,
    connectivity: ConnectivityState,
    root: RootStateAggregator,
    unlock: SimUnlockController,
    menu: MenuProjection,
}

impl IndicatorCore {
    pub fn new(options: &IndicatorOptions) -> Self {
        Self {
            modems: ModemSet::new(),
            access_points: AccessPointRegistry::new(),
            radio: RadioState::new(),
            connectivity: ConnectivityState::new(),
            root: RootStateAggregator::new(),
            unlock: SimUnlockController::new(),
            menu: MenuProjection::new(options.profile, options.show_settings_items),
        }
    }

    /// Applies a batch of events, then recomputes and diffs the view model.
    pub fn process(&mut self, events: impl IntoIterator<Item = IndicatorEvent>) -> Step {
        let mut step = Step::default();

        for event in events {
            if matches!(event, IndicatorEvent::Shutdown) {
                step.shutdown = true;
            }
            step.effects.extend(self.apply(event));
        }

        let view = build_view_model(
            &self.modems,
            &self.access_points,
            &self.radio,
            &self.connectivity,
        );
        step.updates = self.root.publish(view);
        self.menu.sync(self.root.current());

        if !step.updates.is_empty() {
            debug!("View model changed: {} update(s)", step.updates.len());
        }
        step
    }

    /// The last published view model.
    pub fn view(&self) -> &ViewModel {
        self.root.current()
    }

    /// Menu rendering of the last published view model.
    pub fn menu(&self) -> MenuModel {
        self.menu.render(self.root.current())
    }

    /// Snap-decision menus of the unlock notifications, by SIM slot.
    pub fn unlock_menus(&self) -> BTreeMap<u32, MenuModel> {
        self.unlock
            .presented(&self.modems)
            .iter()
            .map(|(slot, content)| (*slot, unlock_menu(content)))
            .collect()
    }

    /// Translates a menu action invocation into an event for the queue.
    pub fn action(&self, name: &str, parameter: Option<&Variant>) -> Result<IndicatorEvent> {
        self.menu
            .action_event(self.root.current(), name, parameter)
            .map(IndicatorEvent::User)
    }

    pub fn unlock_state(&self, modem: &ModemId) -> Option<&UnlockState> {
        self.unlock.state(modem)
    }

    pub fn unlock_notification(&self, modem: &ModemId) -> Option<NotificationId> {
        self.unlock.notification(modem)
    }

    fn apply(&mut self, event: IndicatorEvent) -> Vec<Effect> {
        match event {
            IndicatorEvent::Modem(event) => self.apply_modem(event),
            IndicatorEvent::Wifi(event) => {
                self.apply_wifi(event);
                Vec::new()
            }
            IndicatorEvent::Radio(RadioEvent::BlockChanged { radio, block }) => {
                self.radio.set_block(radio, block);
                Vec::new()
            }
            IndicatorEvent::Radio(RadioEvent::FlightModeChanged(enabled)) => {
                self.radio.set_flight_mode(enabled);
                Vec::new()
            }
            IndicatorEvent::Connectivity(ConnectivityEvent::StateChanged(state)) => {
                self.connectivity.set_state(state);
                Vec::new()
            }
            IndicatorEvent::Connectivity(ConnectivityEvent::PrimaryConnectionType(kind)) => {
                self.connectivity.set_primary_type(kind);
                Vec::new()
            }
            IndicatorEvent::Notification(NotificationEvent::Shown { modem, request, id }) => {
                self.unlock.shown(&modem, request, id, &self.modems)
            }
            IndicatorEvent::Notification(NotificationEvent::Failed { modem, request }) => {
                self.unlock.failed(&modem, request)
            }
            IndicatorEvent::Notification(NotificationEvent::Closed(id)) => self.unlock.closed(id),
            IndicatorEvent::User(action) => self.apply_user(action),
            IndicatorEvent::Shutdown => {
                debug!("Shutting down, cancelling unlock sessions");
                self.unlock.shutdown()
            }
        }
    }

    fn apply_modem(&mut self, event: ModemEvent) -> Vec<Effect> {
        match event {
            ModemEvent::Added(id) => {
                self.modems.add_modem(id);
                Vec::new()
            }
            ModemEvent::Removed(id) => {
                let effects = self.unlock.modem_removed(&id);
                self.modems.remove_modem(&id);
                effects
            }
            ModemEvent::Properties(id, properties) => {
                if self.modems.update_properties(&id, properties) {
                    self.unlock.modem_changed(&id, &self.modems)
                } else {
                    Vec::new()
                }
            }
        }
    }

    fn apply_wifi(&mut self, event: WifiEvent) {
        let reg = &mut self.access_points;
        match event {
            WifiEvent::DeviceAdded(device) => {
                reg.add_device(device);
            }
            WifiEvent::DeviceRemoved(device) => {
                reg.remove_device(&device);
            }
            WifiEvent::AccessPointAdded { device, id, props } => {
                reg.add_access_point(device, id, props);
            }
            WifiEvent::AccessPointRemoved(id) => {
                reg.remove_access_point(&id);
            }
            WifiEvent::AccessPointUpdated { id, props } => {
                reg.update_access_point(&id, props);
            }
            WifiEvent::ConnectionAdded(connection) => {
                reg.add_connection(connection);
            }
            WifiEvent::ConnectionRemoved(id) => {
                reg.remove_connection(&id);
            }
            WifiEvent::ActiveConnectionChanged { device, active } => {
                reg.set_active_connection(&device, active);
            }
        }
    }

    fn apply_user(&mut self, action: UserAction) -> Vec<Effect> {
        debug!("User action: {action:?}");
        match action {
            UserAction::SetFlightMode(enabled) => self.radio.request_flight_mode(enabled),
            UserAction::SetWifiEnabled(enabled) => self.radio.request_wifi(enabled),
            UserAction::SetMobileData(enabled) => match self.modems.data_switch_target() {
                Some(modem) if modem.data_enabled != enabled => vec![Effect::SetModemPowered {
                    modem: modem.id.clone(),
                    powered: enabled,
                }],
                Some(_) => Vec::new(),
                None => {
                    warn!("No modem to switch mobile data on");
                    Vec::new()
                }
            },
            UserAction::ActivateAccessPoint(index) => {
                let effect = self
                    .menu
                    .access_point_key(index)
                    .and_then(|key| self.access_points.activation(key));
                if effect.is_none() {
                    warn!("Access point action {index} no longer maps to a network");
                }
                effect.into_iter().collect()
            }
            UserAction::UnlockSim(slot) => match self.modems.by_slot(slot) {
                Some(modem) => {
                    let id = modem.id.clone();
                    self.unlock.activate(&id, &self.modems)
                }
                None => {
                    warn!("Unlock requested for empty SIM slot {slot}");
                    Vec::new()
                }
            },
            UserAction::SubmitPin(text) => self.unlock.submit(&text, &self.modems),
            UserAction::DismissUnlock => self.unlock.dismiss(),
            UserAction::DismissError => self.unlock.dismiss_error(&self.modems),
            UserAction::DismissPopup => self.unlock.dismiss_popup(&self.modems),
            UserAction::OpenWifiSettings => vec![Effect::OpenSettings(settings::WIFI)],
            UserAction::OpenCellularSettings => vec![Effect::OpenSettings(settings::CELLULAR)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{LockState, ModemProperty, Retries};

    fn core() -> IndicatorCore {
        IndicatorCore::new(&IndicatorOptions::default())
    }

    #[test]
    fn burst_is_coalesced_into_one_snapshot() {
        let mut core = core();
        let id = ModemId::new("/ril_0");
        let step = core.process([
            IndicatorEvent::Modem(ModemEvent::Added(id.clone())),
            IndicatorEvent::Modem(ModemEvent::Properties(
                id.clone(),
                vec![ModemProperty::SimPresent(true)],
            )),
            IndicatorEvent::Modem(ModemEvent::Properties(
                id,
                vec![ModemProperty::Online(true), ModemProperty::Strength(50)],
            )),
        ]);

        let slot_updates = step
            .updates
            .iter()
            .filter(|u| matches!(u, ViewUpdate::SimSlot(_)))
            .count();
        assert_eq!(slot_updates, 1);
        assert_eq!(core.view().sim_slots[0].label, "No Signal");
    }

    #[test]
    fn unlock_action_goes_through_slot() {
        let mut core = core();
        let id = ModemId::new("/ril_0");
        core.process([
            IndicatorEvent::Modem(ModemEvent::Added(id.clone())),
            IndicatorEvent::Modem(ModemEvent::Properties(
                id.clone(),
                vec![
                    ModemProperty::SimPresent(true),
                    ModemProperty::LockState(LockState::PinRequired),
                    ModemProperty::Retries(Retries {
                        pin: Some(3),
                        puk: Some(10),
                    }),
                ],
            )),
        ]);

        let event = core.action("indicator.modem.1::locked", None);
        assert!(event.is_ok());
        let step = core.process(event.ok());
        assert_eq!(step.effects.len(), 1);
        assert_eq!(core.unlock_state(&id), Some(&UnlockState::AwaitingPin));
        assert!(step.updates.is_empty());
        assert_eq!(core.unlock_menus().keys().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn settings_and_shutdown() {
        let mut core = core();
        let step = core.process([IndicatorEvent::User(UserAction::OpenWifiSettings)]);
        assert_eq!(step.effects, vec![Effect::OpenSettings("settings:///system/wifi")]);
        let step = core.process([IndicatorEvent::Shutdown]);
        assert!(step.shutdown);
    }

    #[test]
    fn mobile_data_switch_targets_unlocked_modem() {
        let mut core = core();
        let id = ModemId::new("/ril_0");
        core.process([
            IndicatorEvent::Modem(ModemEvent::Added(id.clone())),
            IndicatorEvent::Modem(ModemEvent::Properties(
                id.clone(),
                vec![ModemProperty::SimPresent(true)],
            )),
        ]);
        let step = core.process([IndicatorEvent::User(UserAction::SetMobileData(true))]);
        assert_eq!(
            step.effects,
            vec![Effect::SetModemPowered {
                modem: id,
                powered: true,
            }]
        );
        let step = core.process([IndicatorEvent::User(UserAction::SetMobileData(false))]);
        assert!(step.effects.is_empty());
    }
}
