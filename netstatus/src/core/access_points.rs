//! Wi-Fi devices, access points and their presentation groups.
//!
//! Physically distinct access points that share an [`ApKey`] collapse into one
//! [`AccessPointGroup`]. The key index is maintained incrementally: every
//! mutation recomputes only the groups whose key it touched.

use log::{debug, warn};
use std::collections::{BTreeSet, HashMap};

use crate::api::models::{
    AccessPoint, AccessPointEntry, AccessPointGroup, AccessPointId, AccessPointProps,
    ActiveAccessPoint, ApKey, ConnectionId, ConnectionStatus, DeviceId, SavedConnection,
};
use crate::core::events::Effect;
use crate::util::utils::{decode_ssid_lossy, wifi_signal_icon};

#[derive(Debug, Default)]
pub(crate) struct AccessPointRegistry {
    /// Known Wi-Fi devices and their active connection, if any.
    devices: HashMap<DeviceId, Option<ActiveAccessPoint>>,
    access_points: HashMap<AccessPointId, AccessPoint>,
    groups: HashMap<ApKey, AccessPointGroup>,
    connections: HashMap<ConnectionId, SavedConnection>,
}

impl AccessPointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_device(&mut self, device: DeviceId) -> bool {
        if self.devices.contains_key(&device) {
            return false;
        }
        debug!("Wi-Fi device {device} added");
        self.devices.insert(device, None);
        true
    }

    /// Removes a device together with every access point it owned.
    pub fn remove_device(&mut self, device: &DeviceId) -> bool {
        if self.devices.remove(device).is_none() {
            return false;
        }

        let owned: Vec<AccessPointId> = self
            .access_points
            .values()
            .filter(|ap| &ap.device == device)
            .map(|ap| ap.id.clone())
            .collect();
        for id in owned {
            self.remove_access_point(&id);
        }
        debug!("Wi-Fi device {device} removed");
        true
    }

    /// Whether at least one Wi-Fi device exists.
    pub fn device_present(&self) -> bool {
        !self.devices.is_empty()
    }

    pub fn add_access_point(
        &mut self,
        device: DeviceId,
        id: AccessPointId,
        props: AccessPointProps,
    ) -> bool {
        if !self.devices.contains_key(&device) {
            warn!("Access point {id} for unknown device {device} ignored");
            return false;
        }
        if self.access_points.contains_key(&id) {
            return self.update_access_point(&id, props);
        }

        let key = props.key();
        let status = self.status_of(&device, &id);
        self.access_points.insert(
            id.clone(),
            AccessPoint {
                id: id.clone(),
                device,
                props,
                status,
            },
        );
        self.groups
            .entry(key.clone())
            .or_insert_with(|| empty_group(&key))
            .members
            .insert(id);
        self.recompute_group(&key);
        true
    }

    pub fn remove_access_point(&mut self, id: &AccessPointId) -> bool {
        let Some(ap) = self.access_points.remove(id) else {
            return false;
        };

        let key = ap.props.key();
        if let Some(group) = self.groups.get_mut(&key) {
            group.members.remove(id);
        }
        self.recompute_group(&key);
        true
    }

    /// Updates an access point, moving it between groups if its key changed.
    pub fn update_access_point(&mut self, id: &AccessPointId, props: AccessPointProps) -> bool {
        let Some(ap) = self.access_points.get_mut(id) else {
            warn!("Update for unknown access point {id} ignored");
            return false;
        };
        if ap.props == props {
            return false;
        }

        let old_key = ap.props.key();
        let new_key = props.key();
        ap.props = props;

        if old_key != new_key {
            if let Some(group) = self.groups.get_mut(&old_key) {
                group.members.remove(id);
            }
            self.groups
                .entry(new_key.clone())
                .or_insert_with(|| empty_group(&new_key))
                .members
                .insert(id.clone());
            self.recompute_group(&old_key);
        }
        self.recompute_group(&new_key);
        true
    }

    pub fn add_connection(&mut self, connection: SavedConnection) -> bool {
        let previous = self
            .connections
            .insert(connection.id.clone(), connection.clone());
        previous.as_ref() != Some(&connection)
    }

    pub fn remove_connection(&mut self, id: &ConnectionId) -> bool {
        self.connections.remove(id).is_some()
    }

    /// Records the active connection of a device and updates the status of
    /// the access points involved.
    pub fn set_active_connection(
        &mut self,
        device: &DeviceId,
        active: Option<ActiveAccessPoint>,
    ) -> bool {
        let Some(slot) = self.devices.get_mut(device) else {
            warn!("Active connection for unknown device {device} ignored");
            return false;
        };
        if *slot == active {
            return false;
        }

        let previous = std::mem::replace(slot, active.clone());
        let touched = previous
            .into_iter()
            .chain(active)
            .map(|a| a.access_point)
            .collect::<BTreeSet<_>>();

        for id in touched {
            let status = self.status_of(device, &id);
            if let Some(ap) = self.access_points.get_mut(&id) {
                ap.status = status;
                let key = ap.props.key();
                self.recompute_group(&key);
            }
        }
        true
    }

    #[cfg(test)]
    fn group(&self, key: &ApKey) -> Option<&AccessPointGroup> {
        self.groups.get(key)
    }

    #[cfg(test)]
    fn groups(&self) -> impl Iterator<Item = &AccessPointGroup> {
        self.groups.values()
    }

    /// The visible group list.
    ///
    /// Empty while the radio is disabled; the underlying data is kept.
    /// Groups with an active connection sort first, the rest by label.
    pub fn visible(&self, radio_enabled: bool) -> Vec<AccessPointEntry> {
        if !radio_enabled {
            return Vec::new();
        }

        let mut entries: Vec<AccessPointEntry> = self
            .groups
            .values()
            .filter(|g| !g.key.ssid.is_empty())
            .map(|g| AccessPointEntry {
                key: g.key.clone(),
                label: g.label.clone(),
                strength: g.strength,
                status: g.status,
            })
            .collect();

        entries.sort_by(|a, b| {
            b.status
                .is_active()
                .cmp(&a.status.is_active())
                .then_with(|| a.label.cmp(&b.label))
                .then_with(|| a.key.cmp(&b.key))
        });
        entries
    }

    /// Icon of the connected network, if any.
    pub fn connected_icon(&self) -> Option<String> {
        self.groups
            .values()
            .filter(|g| g.status == ConnectionStatus::Connected)
            .max_by(|a, b| a.strength.cmp(&b.strength).then_with(|| b.key.cmp(&a.key)))
            .map(|g| wifi_signal_icon(g.strength, g.key.secured))
    }

    /// Resolves the platform request for activating a group.
    ///
    /// An active group is deactivated. Otherwise a saved connection with the
    /// same SSID is activated on the device owning the strongest member, or
    /// a new connection is added for that member.
    pub fn activation(&self, key: &ApKey) -> Option<Effect> {
        let group = self.groups.get(key)?;

        if group.status.is_active() {
            return self
                .devices
                .values()
                .flatten()
                .find(|a| group.members.contains(&a.access_point))
                .map(|a| Effect::DeactivateConnection(a.connection.clone()));
        }

        let strongest = group
            .members
            .iter()
            .filter_map(|id| self.access_points.get(id))
            .max_by(|a, b| a.props.strength.cmp(&b.props.strength).then_with(|| b.id.cmp(&a.id)))?;

        let saved = self
            .connections
            .values()
            .filter(|c| c.ssid == key.ssid)
            .min_by(|a, b| a.id.cmp(&b.id));

        Some(match saved {
            Some(connection) => Effect::ActivateConnection {
                device: strongest.device.clone(),
                connection: connection.id.clone(),
                access_point: strongest.id.clone(),
            },
            None => Effect::AddAndActivateConnection {
                device: strongest.device.clone(),
                access_point: strongest.id.clone(),
            },
        })
    }

    fn status_of(&self, device: &DeviceId, id: &AccessPointId) -> ConnectionStatus {
        match self.devices.get(device) {
            Some(Some(active)) if &active.access_point == id => active.status,
            _ => ConnectionStatus::Disconnected,
        }
    }

    /// Recomputes one group from its members, dropping it once empty.
    fn recompute_group(&mut self, key: &ApKey) {
        let Some(group) = self.groups.get_mut(key) else {
            return;
        };

        let members: Vec<&AccessPoint> = group
            .members
            .iter()
            .filter_map(|id| self.access_points.get(id))
            .collect();

        if members.is_empty() {
            self.groups.remove(key);
            return;
        }

        group.strength = members.iter().map(|ap| ap.props.strength).max().unwrap_or(0);
        group.status = members
            .iter()
            .map(|ap| ap.status)
            .max()
            .unwrap_or_default();
    }
}

fn empty_group(key: &ApKey) -> AccessPointGroup {
    AccessPointGroup {
        key: key.clone(),
        label: decode_ssid_lossy(&key.ssid),
        strength: 0,
        status: ConnectionStatus::Disconnected,
        members: BTreeSet::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::ActiveConnectionId;

    fn props(ssid: &[u8], strength: u8) -> AccessPointProps {
        AccessPointProps {
            ssid: ssid.to_vec(),
            secured: true,
            adhoc: false,
            strength,
        }
    }

    fn registry() -> (AccessPointRegistry, DeviceId) {
        let mut reg = AccessPointRegistry::new();
        let dev = DeviceId::new("/dev/wlan0");
        reg.add_device(dev.clone());
        (reg, dev)
    }

    #[test]
    fn group_takes_max_strength() {
        let (mut reg, dev) = registry();
        reg.add_access_point(dev.clone(), "ap1".into(), props(b"groupA", 40));
        reg.add_access_point(dev.clone(), "ap2".into(), props(b"groupA", 60));

        let visible = reg.visible(true);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].label, "groupA");
        assert_eq!(visible[0].strength, 60);

        reg.remove_access_point(&"ap2".into());
        let visible = reg.visible(true);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].strength, 40);

        reg.remove_access_point(&"ap1".into());
        assert!(reg.visible(true).is_empty());
        assert_eq!(reg.groups().count(), 0);
    }

    #[test]
    fn security_and_mode_split_groups() {
        let (mut reg, dev) = registry();
        reg.add_access_point(dev.clone(), "ap1".into(), props(b"net", 40));
        let mut open = props(b"net", 50);
        open.secured = false;
        reg.add_access_point(dev.clone(), "ap2".into(), open);
        let mut adhoc = props(b"net", 50);
        adhoc.adhoc = true;
        reg.add_access_point(dev, "ap3".into(), adhoc);
        assert_eq!(reg.visible(true).len(), 3);
    }

    #[test]
    fn ssid_change_moves_access_point_between_groups() {
        let (mut reg, dev) = registry();
        reg.add_access_point(dev.clone(), "ap1".into(), props(b"one", 40));
        reg.add_access_point(dev, "ap2".into(), props(b"one", 70));
        reg.update_access_point(&"ap2".into(), props(b"two", 70));

        let one = reg.group(&props(b"one", 0).key()).map(|g| g.strength);
        let two = reg.group(&props(b"two", 0).key()).map(|g| g.strength);
        assert_eq!(one, Some(40));
        assert_eq!(two, Some(70));
    }

    #[test]
    fn hidden_networks_are_not_listed() {
        let (mut reg, dev) = registry();
        reg.add_access_point(dev, "ap1".into(), props(b"", 90));
        assert!(reg.visible(true).is_empty());
    }

    #[test]
    fn disabled_radio_hides_but_retains() {
        let (mut reg, dev) = registry();
        reg.add_access_point(dev, "ap1".into(), props(b"net", 40));
        assert!(reg.visible(false).is_empty());
        assert_eq!(reg.visible(true).len(), 1);
    }

    #[test]
    fn active_group_sorts_first() {
        let (mut reg, dev) = registry();
        reg.add_access_point(dev.clone(), "a".into(), props(b"alpha", 10));
        reg.add_access_point(dev.clone(), "z".into(), props(b"zulu", 10));
        reg.add_access_point(dev.clone(), "b".into(), props(b"Bravo", 10));

        let labels: Vec<String> = reg.visible(true).into_iter().map(|e| e.label).collect();
        assert_eq!(labels, ["Bravo", "alpha", "zulu"]);

        reg.set_active_connection(
            &dev,
            Some(ActiveAccessPoint {
                connection: ActiveConnectionId::new("/active/1"),
                access_point: "z".into(),
                status: ConnectionStatus::Connecting,
            }),
        );
        let visible = reg.visible(true);
        assert_eq!(visible[0].label, "zulu");
        assert_eq!(visible[0].status, ConnectionStatus::Connecting);
    }

    #[test]
    fn access_point_for_unknown_device_is_ignored() {
        let mut reg = AccessPointRegistry::new();
        assert!(!reg.add_access_point("/nope".into(), "ap".into(), props(b"x", 1)));
        assert!(!reg.update_access_point(&"ap".into(), props(b"x", 2)));
    }

    #[test]
    fn removing_device_drops_its_access_points() {
        let (mut reg, dev) = registry();
        reg.add_access_point(dev.clone(), "ap1".into(), props(b"net", 40));
        assert!(reg.remove_device(&dev));
        assert!(reg.visible(true).is_empty());
        assert!(!reg.device_present());
    }

    #[test]
    fn activation_prefers_saved_connection() {
        let (mut reg, dev) = registry();
        reg.add_access_point(dev.clone(), "weak".into(), props(b"home", 20));
        reg.add_access_point(dev.clone(), "strong".into(), props(b"home", 80));
        let key = props(b"home", 0).key();

        assert_eq!(
            reg.activation(&key),
            Some(Effect::AddAndActivateConnection {
                device: dev.clone(),
                access_point: "strong".into(),
            })
        );

        reg.add_connection(SavedConnection {
            id: ConnectionId::new("/settings/3"),
            ssid: b"home".to_vec(),
        });
        assert_eq!(
            reg.activation(&key),
            Some(Effect::ActivateConnection {
                device: dev.clone(),
                connection: ConnectionId::new("/settings/3"),
                access_point: "strong".into(),
            })
        );

        reg.set_active_connection(
            &dev,
            Some(ActiveAccessPoint {
                connection: ActiveConnectionId::new("/active/7"),
                access_point: "weak".into(),
                status: ConnectionStatus::Connected,
            }),
        );
        assert_eq!(
            reg.activation(&key),
            Some(Effect::DeactivateConnection(ActiveConnectionId::new("/active/7")))
        );
        assert_eq!(reg.connected_icon().as_deref(), Some("nm-signal-100-secure"));
    }
}
