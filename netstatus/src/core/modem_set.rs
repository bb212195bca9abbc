//! Tracking of cellular modems and their SIM slots.
//!
//! Owns every [`Modem`] discovered on the platform, assigns SIM slot numbers
//! in discovery order and derives the per-slot status label and icon.

use log::{debug, warn};
use std::collections::HashMap;

use crate::api::models::{
    LockState, Modem, ModemId, ModemProperty, RegistrationStatus, SimSlotSummary,
};
use crate::types::constants::icons;
use crate::util::utils::{modem_bars_icon, signal_bars};

/// Status label and icon of one modem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ModemStatus {
    pub label: String,
    pub icon: &'static str,
    pub locked: bool,
}

/// Derives the status of a modem using a fixed precedence:
/// no SIM, locked, offline, searching, no signal, then the carrier.
pub(crate) fn modem_status(modem: &Modem) -> ModemStatus {
    let status = |label: &str, icon| ModemStatus {
        label: label.to_string(),
        icon,
        locked: false,
    };

    if !modem.sim_present {
        return status("No SIM", icons::NO_SIM);
    }
    if modem.lock_state.is_locked() {
        return ModemStatus {
            locked: true,
            ..status("SIM Locked", icons::SIM_LOCKED)
        };
    }
    if !modem.online {
        return status("Offline", icons::MODEM_DISABLED);
    }

    match (modem.registration, signal_bars(modem.strength)) {
        (RegistrationStatus::Searching, _) => status("Searching", icons::MODEM_DISABLED),
        (RegistrationStatus::Denied | RegistrationStatus::Unregistered, _) | (_, None) => {
            status("No Signal", icons::MODEM_NO_SERVICE)
        }
        (RegistrationStatus::Registered, Some(bars)) => {
            status(&modem.operator, modem_bars_icon(bars))
        }
    }
}

/// The dynamic set of cellular modems.
#[derive(Debug, Default)]
pub(crate) struct ModemSet {
    modems: HashMap<ModemId, Modem>,
}

impl ModemSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a modem, assigning it the lowest free SIM slot.
    ///
    /// Returns `false` if the modem is already known.
    pub fn add_modem(&mut self, id: ModemId) -> bool {
        if self.modems.contains_key(&id) {
            debug!("Modem {id} already tracked");
            return false;
        }

        let slot = (1..)
            .find(|n| !self.modems.values().any(|m| m.slot == *n))
            .unwrap_or(1);
        debug!("Modem {id} added in slot {slot}");
        self.modems.insert(id.clone(), Modem::new(id, slot));
        true
    }

    /// Removes a modem, returning it if it was known.
    pub fn remove_modem(&mut self, id: &ModemId) -> Option<Modem> {
        let removed = self.modems.remove(id);
        if removed.is_some() {
            debug!("Modem {id} removed");
        }
        removed
    }

    /// Applies a single property change. Unknown modems are ignored.
    #[cfg(test)]
    pub fn update_property(&mut self, id: &ModemId, property: ModemProperty) -> bool {
        match self.modems.get_mut(id) {
            Some(modem) => modem.apply(property),
            None => {
                warn!("Property change for unknown modem {id} ignored");
                false
            }
        }
    }

    /// Applies a burst of property changes as one update.
    pub fn update_properties(&mut self, id: &ModemId, properties: Vec<ModemProperty>) -> bool {
        let Some(modem) = self.modems.get_mut(id) else {
            warn!("Property burst for unknown modem {id} ignored");
            return false;
        };

        properties
            .into_iter()
            .fold(false, |changed, p| modem.apply(p) || changed)
    }

    pub fn get(&self, id: &ModemId) -> Option<&Modem> {
        self.modems.get(id)
    }

    pub fn by_slot(&self, slot: u32) -> Option<&Modem> {
        self.modems.values().find(|m| m.slot == slot)
    }

    /// Modems ordered by slot.
    pub fn iter(&self) -> impl Iterator<Item = &Modem> {
        let mut modems: Vec<&Modem> = self.modems.values().collect();
        modems.sort_by_key(|m| m.slot);
        modems.into_iter()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.modems.is_empty()
    }

    /// Slot labels are only shown once two or more modems exist.
    pub fn is_multi_sim(&self) -> bool {
        self.modems.len() >= 2
    }

    /// `"SIM N"` in multi-SIM mode, `None` otherwise.
    pub fn sim_identifier(&self, modem: &Modem) -> Option<String> {
        self.is_multi_sim().then(|| format!("SIM {}", modem.slot))
    }

    /// The modem whose connection manager is powered.
    pub fn data_modem(&self) -> Option<&Modem> {
        self.iter().find(|m| m.data_enabled)
    }

    /// The modem the mobile data switch acts on: the powered one, else the
    /// first with a present, unlocked SIM.
    pub fn data_switch_target(&self) -> Option<&Modem> {
        self.data_modem().or_else(|| {
            self.iter()
                .find(|m| m.sim_present && m.lock_state == LockState::None)
        })
    }

    /// Technology icon of the modem currently carrying mobile data.
    pub fn cellular_data_icon(&self) -> Option<&'static str> {
        self.data_modem()
            .filter(|m| m.online && m.sim_present && !m.lock_state.is_locked())
            .and_then(|m| m.technology.icon())
    }

    /// Per-slot summaries ordered by slot.
    pub fn summaries(&self) -> Vec<SimSlotSummary> {
        self.iter()
            .map(|modem| {
                let status = modem_status(modem);
                SimSlotSummary {
                    modem: modem.id.clone(),
                    slot: modem.slot,
                    sim_identifier: self.sim_identifier(modem).unwrap_or_default(),
                    in_indicator: modem.sim_present && (status.locked || modem.online),
                    label: status.label,
                    icon: status.icon.to_string(),
                    locked: status.locked,
                    roaming: modem.roaming,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{Retries, Technology};

    fn registered(set: &mut ModemSet, id: &ModemId, strength: u8) {
        set.update_properties(
            id,
            vec![
                ModemProperty::SimPresent(true),
                ModemProperty::Online(true),
                ModemProperty::Registration {
                    status: RegistrationStatus::Registered,
                    roaming: false,
                },
                ModemProperty::Strength(strength),
                ModemProperty::Operator("fake.tel".into()),
            ],
        );
    }

    #[test]
    fn slots_follow_discovery_order() {
        let mut set = ModemSet::new();
        let a = ModemId::new("/ril_1");
        let b = ModemId::new("/ril_0");
        assert!(set.add_modem(a.clone()));
        assert!(set.add_modem(b.clone()));
        assert!(!set.add_modem(a.clone()));

        assert_eq!(set.get(&a).map(|m| m.slot), Some(1));
        assert_eq!(set.get(&b).map(|m| m.slot), Some(2));
    }

    #[test]
    fn freed_slot_is_reused() {
        let mut set = ModemSet::new();
        let a = ModemId::new("/a");
        let b = ModemId::new("/b");
        let c = ModemId::new("/c");
        set.add_modem(a.clone());
        set.add_modem(b.clone());
        set.remove_modem(&a);
        set.add_modem(c.clone());

        assert_eq!(set.get(&b).map(|m| m.slot), Some(2));
        assert_eq!(set.get(&c).map(|m| m.slot), Some(1));
    }

    #[test]
    fn single_modem_has_no_sim_identifier() {
        let mut set = ModemSet::new();
        set.add_modem(ModemId::new("/ril_0"));
        let summaries = set.summaries();
        assert_eq!(summaries[0].sim_identifier, "");
    }

    #[test]
    fn status_precedence() {
        let mut set = ModemSet::new();
        let id = ModemId::new("/ril_0");
        set.add_modem(id.clone());

        assert_eq!(set.summaries()[0].label, "No SIM");
        assert_eq!(set.summaries()[0].icon, "no-simcard");

        registered(&mut set, &id, 50);
        set.update_property(&id, ModemProperty::LockState(LockState::PinRequired));
        let s = &set.summaries()[0];
        assert_eq!((s.label.as_str(), s.icon.as_str(), s.locked), ("SIM Locked", "simcard-locked", true));

        set.update_property(&id, ModemProperty::LockState(LockState::None));
        set.update_property(&id, ModemProperty::Online(false));
        assert_eq!(set.summaries()[0].label, "Offline");
        assert_eq!(set.summaries()[0].icon, "gsm-3g-disabled");
        assert!(!set.summaries()[0].in_indicator);

        set.update_property(&id, ModemProperty::Online(true));
        set.update_property(
            &id,
            ModemProperty::Registration {
                status: RegistrationStatus::Searching,
                roaming: false,
            },
        );
        assert_eq!(set.summaries()[0].label, "Searching");
        assert_eq!(set.summaries()[0].icon, "gsm-3g-disabled");

        set.update_property(
            &id,
            ModemProperty::Registration {
                status: RegistrationStatus::Denied,
                roaming: false,
            },
        );
        assert_eq!(set.summaries()[0].label, "No Signal");
        assert_eq!(set.summaries()[0].icon, "gsm-3g-no-service");

        registered(&mut set, &id, 50);
        assert_eq!(set.summaries()[0].label, "fake.tel");
        assert_eq!(set.summaries()[0].icon, "gsm-3g-full");
    }

    #[test]
    fn registered_without_strength_is_no_signal() {
        let mut set = ModemSet::new();
        let id = ModemId::new("/ril_0");
        set.add_modem(id.clone());
        registered(&mut set, &id, 0);
        assert_eq!(set.summaries()[0].label, "No Signal");

        set.update_property(&id, ModemProperty::Strength(1));
        assert_eq!(set.summaries()[0].label, "fake.tel");
        assert_eq!(set.summaries()[0].icon, "gsm-3g-none");
    }

    #[test]
    fn unknown_modem_updates_are_ignored() {
        let mut set = ModemSet::new();
        assert!(!set.update_property(&ModemId::new("/gone"), ModemProperty::Online(true)));
        assert!(set.is_empty());
    }

    #[test]
    fn burst_reports_single_change() {
        let mut set = ModemSet::new();
        let id = ModemId::new("/ril_0");
        set.add_modem(id.clone());
        assert!(set.update_properties(
            &id,
            vec![
                ModemProperty::Retries(Retries {
                    pin: Some(3),
                    puk: Some(10),
                }),
                ModemProperty::Strength(3),
            ],
        ));
        assert!(!set.update_properties(&id, vec![ModemProperty::Strength(3)]));
    }

    #[test]
    fn data_icon_follows_powered_modem() {
        let mut set = ModemSet::new();
        let a = ModemId::new("/a");
        let b = ModemId::new("/b");
        set.add_modem(a.clone());
        set.add_modem(b.clone());
        registered(&mut set, &a, 50);
        registered(&mut set, &b, 50);
        set.update_property(&a, ModemProperty::Technology(Technology::Umts));
        set.update_property(&b, ModemProperty::Technology(Technology::Lte));
        assert_eq!(set.cellular_data_icon(), None);

        set.update_property(&b, ModemProperty::DataEnabled(true));
        assert_eq!(set.cellular_data_icon(), Some("network-cellular-lte"));
        assert_eq!(set.data_switch_target().map(|m| m.slot), Some(2));

        set.update_property(&b, ModemProperty::DataEnabled(false));
        assert_eq!(set.data_switch_target().map(|m| m.slot), Some(1));
    }
}
