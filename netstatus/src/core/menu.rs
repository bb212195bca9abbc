//! Rendering of the view model into a menu tree and an action group.
//!
//! The menu exporter consumes a [`MenuModel`]: sections of items with typed
//! attributes, plus the named actions they refer to. Action invocations come
//! back through [`MenuProjection::action_event`].

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::api::models::{
    AccessPointEntry, ApKey, IndicatorError, MenuProfile, NetworkingStatus, SimSlotSummary,
    ViewModel,
};
use crate::core::events::{UnlockNotification, UserAction};
use crate::types::constants::notification::{
    ACTION_ERROR, ACTION_PIN_MIN_MAX, ACTION_POPUP, ACTION_SIM_UNLOCK, SNAP_DECISION_TYPE,
};
use crate::Result;

const ACTION_PREFIX: &str = "indicator.";

const SWITCH_WIDGET: &str = "com.canonical.indicator.switch";
const MODEM_INFO_WIDGET: &str = "com.canonical.indicator.network.modeminfoitem";
const ACCESS_POINT_WIDGET: &str = "unity.widgets.systemsettings.tablet.accesspoint";

const FLIGHT_MODE: &str = "airplane.enabled";
const WIFI_ENABLE: &str = "wifi.enable";
const MOBILE_DATA: &str = "mobiledata.enabled";
const WIFI_SETTINGS: &str = "wifi.settings";
const CELLULAR_SETTINGS: &str = "cellular.settings";

/// A typed attribute or action state value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Variant {
    Bool(bool),
    Byte(u8),
    Str(String),
    StrList(Vec<String>),
    /// Inclusive bounds, exported as an `(ii)` tuple.
    Range(u8, u8),
    Dict(BTreeMap<String, Variant>),
}

impl From<bool> for Variant {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<u8> for Variant {
    fn from(v: u8) -> Self {
        Self::Byte(v)
    }
}

impl From<&str> for Variant {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Variant {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MenuItem {
    pub label: String,
    /// Fully qualified action name (`indicator.…`)
    pub action: Option<String>,
    pub attributes: BTreeMap<String, Variant>,
}

impl MenuItem {
    fn new(label: impl Into<String>, action: &str) -> Self {
        Self {
            label: label.into(),
            action: Some(format!("{ACTION_PREFIX}{action}")),
            attributes: BTreeMap::new(),
        }
    }

    fn attr(mut self, name: &str, value: impl Into<Variant>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    fn widget(self, kind: &str) -> Self {
        self.attr("x-canonical-type", kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MenuSection {
    pub items: Vec<MenuItem>,
}

/// An exported action: its current state and whether it can be invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    pub state: Option<Variant>,
    pub enabled: bool,
}

impl Action {
    fn stateful(state: impl Into<Variant>) -> Self {
        Self {
            state: Some(state.into()),
            enabled: true,
        }
    }

    fn stateless() -> Self {
        Self {
            state: None,
            enabled: true,
        }
    }
}

/// The full menu rendering of one view model snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MenuModel {
    /// Root item whose action state carries the indicator icons
    pub root: MenuItem,
    pub sections: Vec<MenuSection>,
    /// Actions keyed by name without the `indicator.` prefix
    pub actions: BTreeMap<String, Action>,
}

/// Projects view models into menus and menu actions back into events.
#[derive(Debug)]
pub struct MenuProjection {
    profile: MenuProfile,
    show_settings_items: bool,
    /// Stable action index per visible access point group.
    access_point_ids: HashMap<ApKey, u32>,
    next_access_point_id: u32,
}

impl MenuProjection {
    pub fn new(profile: MenuProfile, show_settings_items: bool) -> Self {
        Self {
            profile,
            show_settings_items,
            access_point_ids: HashMap::new(),
            next_access_point_id: 0,
        }
    }

    /// Name of the root action for the configured profile.
    pub fn root_action(&self) -> String {
        format!("{}.network-status", self.profile.prefix())
    }

    /// Assigns action indices to newly visible groups and drops the indices
    /// of groups that are gone.
    pub fn sync(&mut self, view: &ViewModel) {
        self.access_point_ids
            .retain(|key, _| view.access_points.iter().any(|a| &a.key == key));
        for entry in &view.access_points {
            if !self.access_point_ids.contains_key(&entry.key) {
                self.access_point_ids
                    .insert(entry.key.clone(), self.next_access_point_id);
                self.next_access_point_id += 1;
            }
        }
    }

    /// The group currently rendered under `accesspoint.<index>`.
    pub fn access_point_key(&self, index: u32) -> Option<&ApKey> {
        self.access_point_ids
            .iter()
            .find(|(_, id)| **id == index)
            .map(|(key, _)| key)
    }

    pub fn render(&self, view: &ViewModel) -> MenuModel {
        let mut actions = BTreeMap::new();
        let mut sections = Vec::new();

        actions.insert(self.root_action(), Action::stateful(root_state(view)));

        actions.insert(FLIGHT_MODE.to_string(), Action::stateful(view.flight_mode));
        sections.push(MenuSection {
            items: vec![MenuItem::new("Flight Mode", FLIGHT_MODE).widget(SWITCH_WIDGET)],
        });

        if !view.sim_slots.is_empty() {
            let mut items: Vec<MenuItem> = view
                .sim_slots
                .iter()
                .map(|slot| self.modem_item(slot, view, &mut actions))
                .collect();

            if self.profile == MenuProfile::Desktop {
                actions.insert(MOBILE_DATA.to_string(), Action::stateful(view.mobile_data_enabled));
                items.push(MenuItem::new("Cellular data", MOBILE_DATA).widget(SWITCH_WIDGET));
            }
            if self.show_settings_items {
                actions.insert(CELLULAR_SETTINGS.to_string(), Action::stateless());
                items.push(MenuItem::new("Cellular settings…", CELLULAR_SETTINGS));
            }
            sections.push(MenuSection { items });
        }

        actions.insert(WIFI_ENABLE.to_string(), Action::stateful(view.wifi_enabled));
        sections.push(MenuSection {
            items: vec![MenuItem::new("Wi-Fi", WIFI_ENABLE).widget(SWITCH_WIDGET)],
        });

        sections.push(MenuSection {
            items: view
                .access_points
                .iter()
                .filter_map(|entry| self.access_point_item(entry, &mut actions))
                .collect(),
        });

        if self.show_settings_items {
            actions.insert(WIFI_SETTINGS.to_string(), Action::stateless());
            sections.push(MenuSection {
                items: vec![MenuItem::new("Wi-Fi settings…", WIFI_SETTINGS)],
            });
        }

        MenuModel {
            root: MenuItem::new("", &self.root_action())
                .attr("x-canonical-type", "com.canonical.indicator.root"),
            sections,
            actions,
        }
    }

    fn modem_item(
        &self,
        slot: &SimSlotSummary,
        view: &ViewModel,
        actions: &mut BTreeMap<String, Action>,
    ) -> MenuItem {
        let base = format!("modem.{}", slot.slot);
        let connectivity_icon = view
            .cellular_data_icon
            .as_deref()
            .filter(|_| view.mobile_data_enabled && !slot.locked)
            .unwrap_or("");

        let states: [(&str, Variant); 6] = [
            ("sim-identifier-label", slot.sim_identifier.as_str().into()),
            ("connectivity-icon", connectivity_icon.into()),
            ("status-label", slot.label.as_str().into()),
            ("status-icon", slot.icon.as_str().into()),
            ("roaming", slot.roaming.into()),
            ("locked", slot.locked.into()),
        ];

        let mut item = MenuItem {
            label: String::new(),
            action: None,
            attributes: BTreeMap::new(),
        }
        .widget(MODEM_INFO_WIDGET);

        for (name, state) in states {
            let action = format!("{base}::{name}");
            item = item.attr(
                &format!("x-canonical-modem-{name}-action"),
                format!("{ACTION_PREFIX}{action}"),
            );
            actions.insert(action, Action::stateful(state));
        }
        item
    }

    fn access_point_item(
        &self,
        entry: &AccessPointEntry,
        actions: &mut BTreeMap<String, Action>,
    ) -> Option<MenuItem> {
        let id = self.access_point_ids.get(&entry.key)?;
        let action = format!("accesspoint.{id}");
        let strength_action = format!("{action}::strength");

        actions.insert(action.clone(), Action::stateful(entry.status.is_active()));
        actions.insert(strength_action.clone(), Action::stateful(entry.strength));

        Some(
            MenuItem::new(entry.label.as_str(), &action)
                .widget(ACCESS_POINT_WIDGET)
                .attr(
                    "x-canonical-wifi-ap-strength-action",
                    format!("{ACTION_PREFIX}{strength_action}"),
                )
                .attr("x-canonical-wifi-ap-is-secure", entry.secured())
                .attr("x-canonical-wifi-ap-is-adhoc", entry.adhoc()),
        )
    }

    /// Translates an action invocation into a user action.
    ///
    /// Switches without a parameter toggle their current state.
    pub fn action_event(
        &self,
        view: &ViewModel,
        name: &str,
        parameter: Option<&Variant>,
    ) -> Result<UserAction> {
        let name = name.strip_prefix(ACTION_PREFIX).unwrap_or(name);

        let switch = |current: bool| match parameter {
            None => Ok(!current),
            Some(Variant::Bool(v)) => Ok(*v),
            Some(other) => Err(IndicatorError::InvalidActionParameter(format!(
                "{name}: {other:?}"
            ))),
        };

        match name {
            FLIGHT_MODE => switch(view.flight_mode).map(UserAction::SetFlightMode),
            WIFI_ENABLE => switch(view.wifi_enabled).map(UserAction::SetWifiEnabled),
            MOBILE_DATA => switch(view.mobile_data_enabled).map(UserAction::SetMobileData),
            WIFI_SETTINGS => Ok(UserAction::OpenWifiSettings),
            CELLULAR_SETTINGS => Ok(UserAction::OpenCellularSettings),
            ACTION_ERROR => Ok(UserAction::DismissError),
            ACTION_POPUP => Ok(UserAction::DismissPopup),
            ACTION_SIM_UNLOCK => match parameter {
                Some(Variant::Str(text)) => Ok(UserAction::SubmitPin(text.clone())),
                Some(Variant::Bool(false)) => Ok(UserAction::DismissUnlock),
                other => Err(IndicatorError::InvalidActionParameter(format!(
                    "{name}: {other:?}"
                ))),
            },
            _ => parse_indexed(name).ok_or_else(|| IndicatorError::UnknownAction(name.to_string())),
        }
    }
}

/// Renders the snap-decision menu of a SIM unlock notification.
///
/// Action names carry the `notifications.` group and are keyed without it,
/// like the `indicator.` actions of [`MenuModel`].
pub fn unlock_menu(content: &UnlockNotification) -> MenuModel {
    let key = |name: &str| {
        name.strip_prefix("notifications.")
            .unwrap_or(name)
            .to_string()
    };
    let (min, max) = content.pin_min_max;

    let item = MenuItem {
        label: content.title.clone(),
        action: Some(ACTION_SIM_UNLOCK.to_string()),
        attributes: BTreeMap::new(),
    }
    .widget(SNAP_DECISION_TYPE)
    .attr("x-canonical-pin-min-max", ACTION_PIN_MIN_MAX)
    .attr("x-canonical-pin-popup", ACTION_POPUP)
    .attr("x-canonical-pin-error", ACTION_ERROR);

    let mut actions = BTreeMap::new();
    actions.insert(key(ACTION_SIM_UNLOCK), Action::stateless());
    actions.insert(key(ACTION_PIN_MIN_MAX), Action::stateful(Variant::Range(min, max)));
    actions.insert(key(ACTION_POPUP), Action::stateful(content.popup.as_str()));
    actions.insert(key(ACTION_ERROR), Action::stateful(content.error.as_str()));

    MenuModel {
        root: MenuItem::default(),
        sections: vec![MenuSection { items: vec![item] }],
        actions,
    }
}

fn parse_indexed(name: &str) -> Option<UserAction> {
    if let Some(index) = name.strip_prefix("accesspoint.") {
        return index.parse().ok().map(UserAction::ActivateAccessPoint);
    }
    let slot = name.strip_prefix("modem.")?.strip_suffix("::locked")?;
    slot.parse().ok().map(UserAction::UnlockSim)
}

fn root_state(view: &ViewModel) -> Variant {
    let status = match view.status {
        NetworkingStatus::Offline => "offline",
        NetworkingStatus::Connecting => "connecting",
        NetworkingStatus::Online => "online",
    };

    let mut state = BTreeMap::new();
    state.insert("title".to_string(), Variant::from("Network"));
    state.insert("visible".to_string(), Variant::Bool(true));
    state.insert(
        "icons".to_string(),
        Variant::StrList(view.indicator_icons.clone()),
    );
    state.insert("networking-status".to_string(), Variant::from(status));
    state.insert(
        "limited-bandwidth".to_string(),
        Variant::Bool(view.limited_bandwidth),
    );
    Variant::Dict(state)
}
