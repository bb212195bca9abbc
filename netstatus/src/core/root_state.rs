//! Fan-in of the leaf components into one [`ViewModel`], plus diffing.
//!
//! The view model is always rebuilt as a whole and compared against the
//! previous one; only the differences are handed to the projection.

use std::collections::HashSet;
use std::hash::Hash;

use crate::api::models::{AccessPointEntry, NetworkingStatus, SimSlotSummary, ViewModel};
use crate::core::access_points::AccessPointRegistry;
use crate::core::connectivity::{ConnectivityState, RadioState};
use crate::core::modem_set::ModemSet;
use crate::types::constants::icons;

/// A positional change to a keyed list.
///
/// Changes are meant to be applied in order; each index refers to the list
/// as left by the previous change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListChange<T> {
    Insert { index: usize, item: T },
    Remove { index: usize },
    Update { index: usize, item: T },
}

/// Computes the changes turning `old` into `new`.
///
/// Items are matched by `key`, which must be unique within each list. Items
/// that moved are expressed as a removal followed by an insertion.
pub fn diff_keyed<T, K, F>(old: &[T], new: &[T], key: F) -> Vec<ListChange<T>>
where
    T: Clone + PartialEq,
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut changes = Vec::new();
    let new_keys: HashSet<K> = new.iter().map(&key).collect();

    let mut working: Vec<T> = old.to_vec();
    for index in (0..working.len()).rev() {
        if !new_keys.contains(&key(&working[index])) {
            working.remove(index);
            changes.push(ListChange::Remove { index });
        }
    }

    for (index, item) in new.iter().enumerate() {
        let wanted = key(item);
        match working.get(index) {
            Some(current) if key(current) == wanted => {
                if current != item {
                    working[index] = item.clone();
                    changes.push(ListChange::Update {
                        index,
                        item: item.clone(),
                    });
                }
            }
            _ => {
                if let Some(from) = working.iter().skip(index).position(|t| key(t) == wanted) {
                    let from = from + index;
                    working.remove(from);
                    changes.push(ListChange::Remove { index: from });
                }
                working.insert(index, item.clone());
                changes.push(ListChange::Insert {
                    index,
                    item: item.clone(),
                });
            }
        }
    }

    changes
}

/// Applies changes produced by [`diff_keyed`] to a list.
pub fn apply_changes<T>(list: &mut Vec<T>, changes: impl IntoIterator<Item = ListChange<T>>) {
    for change in changes {
        match change {
            ListChange::Insert { index, item } => list.insert(index, item),
            ListChange::Remove { index } => {
                list.remove(index);
            }
            ListChange::Update { index, item } => list[index] = item,
        }
    }
}

/// A granular update of the view model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewUpdate {
    SimSlot(ListChange<SimSlotSummary>),
    AccessPoint(ListChange<AccessPointEntry>),
    IndicatorIcons(Vec<String>),
    FlightMode(bool),
    WifiEnabled(bool),
    MobileData(bool),
    CellularDataIcon(Option<String>),
    WifiIcon(Option<String>),
    Status {
        status: NetworkingStatus,
        limited_bandwidth: bool,
    },
}

/// Builds the complete view model from the leaf components.
pub(crate) fn build_view_model(
    modems: &ModemSet,
    access_points: &AccessPointRegistry,
    radio: &RadioState,
    connectivity: &ConnectivityState,
) -> ViewModel {
    let radio_enabled = radio.wifi_enabled(access_points.device_present());
    let sim_slots = modems.summaries();
    let cellular_data_icon = modems.cellular_data_icon().map(str::to_string);
    let wifi_icon = radio_enabled
        .then(|| access_points.connected_icon())
        .flatten();
    let flight_mode = radio.flight_mode();

    let mut indicator_icons = Vec::new();
    if flight_mode {
        indicator_icons.push(icons::AIRPLANE_MODE.to_string());
    }
    indicator_icons.extend(
        sim_slots
            .iter()
            .filter(|s| s.in_indicator)
            .map(|s| s.icon.clone()),
    );
    indicator_icons.push(
        wifi_icon
            .clone()
            .or_else(|| cellular_data_icon.clone())
            .unwrap_or_else(|| icons::NO_CONNECTION.to_string()),
    );

    ViewModel {
        sim_slots,
        cellular_data_icon,
        wifi_icon,
        flight_mode,
        wifi_enabled: radio.wifi_toggle(),
        mobile_data_enabled: modems.data_modem().is_some(),
        access_points: access_points.visible(radio_enabled),
        status: connectivity.status(),
        limited_bandwidth: connectivity.limited_bandwidth(),
        indicator_icons,
    }
}

/// Holds the last published view model and diffs successors against it.
#[derive(Debug, Default)]
pub(crate) struct RootStateAggregator {
    current: ViewModel,
}

impl RootStateAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &ViewModel {
        &self.current
    }

    /// Replaces the current view model, returning the minimal update set.
    pub fn publish(&mut self, next: ViewModel) -> Vec<ViewUpdate> {
        let prev = std::mem::replace(&mut self.current, next);
        let next = &self.current;
        let mut updates = Vec::new();

        updates.extend(
            diff_keyed(&prev.sim_slots, &next.sim_slots, |s| s.modem.clone())
                .into_iter()
                .map(ViewUpdate::SimSlot),
        );
        updates.extend(
            diff_keyed(&prev.access_points, &next.access_points, |a| a.key.clone())
                .into_iter()
                .map(ViewUpdate::AccessPoint),
        );

        if prev.indicator_icons != next.indicator_icons {
            updates.push(ViewUpdate::IndicatorIcons(next.indicator_icons.clone()));
        }
        if prev.flight_mode != next.flight_mode {
            updates.push(ViewUpdate::FlightMode(next.flight_mode));
        }
        if prev.wifi_enabled != next.wifi_enabled {
            updates.push(ViewUpdate::WifiEnabled(next.wifi_enabled));
        }
        if prev.mobile_data_enabled != next.mobile_data_enabled {
            updates.push(ViewUpdate::MobileData(next.mobile_data_enabled));
        }
        if prev.cellular_data_icon != next.cellular_data_icon {
            updates.push(ViewUpdate::CellularDataIcon(next.cellular_data_icon.clone()));
        }
        if prev.wifi_icon != next.wifi_icon {
            updates.push(ViewUpdate::WifiIcon(next.wifi_icon.clone()));
        }
        if prev.status != next.status || prev.limited_bandwidth != next.limited_bandwidth {
            updates.push(ViewUpdate::Status {
                status: next.status,
                limited_bandwidth: next.limited_bandwidth,
            });
        }

        updates
    }
}
