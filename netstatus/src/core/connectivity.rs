//! Radio kill-switch and global connectivity state.

use log::debug;

use crate::api::models::{NetworkingStatus, NmState, RadioBlock, RadioType};
use crate::core::events::Effect;
use crate::types::constants::connection_type;

/// Kill-switch state of the wifi and wwan radios, plus the flight mode flag.
///
/// Requested toggles are shown immediately. A requested flight mode holds
/// until the platform reports flight mode or a kill-switch moves against
/// it; a requested Wi-Fi state holds until the next Wi-Fi block signal.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct RadioState {
    wifi: RadioBlock,
    wwan: RadioBlock,
    observed_flight_mode: bool,
    pending_flight_mode: Option<bool>,
    pending_wifi: Option<bool>,
}

impl RadioState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_block(&mut self, radio: RadioType, block: RadioBlock) {
        debug!("Radio {radio} block changed: {block:?}");
        match radio {
            RadioType::Wifi => {
                self.wifi = block;
                self.pending_wifi = None;
            }
            RadioType::Wwan => self.wwan = block,
        }
        // Blocks arrive one radio at a time while flight mode is applied.
        if self
            .pending_flight_mode
            .is_some_and(|requested| requested != block.is_blocked())
        {
            self.pending_flight_mode = None;
        }
    }

    pub fn set_flight_mode(&mut self, enabled: bool) {
        debug!("Flight mode observed: {enabled}");
        self.observed_flight_mode = enabled;
        self.pending_flight_mode = None;
        self.pending_wifi = None;
    }

    /// On when requested, when the platform reports it, or when every radio
    /// is blocked and at least one block is a hardware one.
    pub fn flight_mode(&self) -> bool {
        let all_blocked = self.wifi.is_blocked() && self.wwan.is_blocked();
        let any_hard = self.wifi.hard || self.wwan.hard;
        self.pending_flight_mode
            .unwrap_or(self.observed_flight_mode || (all_blocked && any_hard))
    }

    pub fn wifi_blocked(&self) -> bool {
        self.wifi.is_blocked()
    }

    /// State of the Wi-Fi toggle as shown to the user.
    pub fn wifi_toggle(&self) -> bool {
        self.pending_wifi.unwrap_or(!self.wifi_blocked())
    }

    /// Whether access points should be listed.
    pub fn wifi_enabled(&self, device_present: bool) -> bool {
        !self.wifi_blocked() && device_present
    }

    pub fn request_flight_mode(&mut self, enabled: bool) -> Vec<Effect> {
        if self.flight_mode() == enabled {
            return Vec::new();
        }
        self.pending_flight_mode = Some(enabled);
        vec![Effect::SetFlightMode(enabled)]
    }

    pub fn request_wifi(&mut self, enabled: bool) -> Vec<Effect> {
        if self.wifi_toggle() == enabled {
            return Vec::new();
        }
        self.pending_wifi = Some(enabled);
        vec![Effect::BlockRadio {
            radio: RadioType::Wifi,
            block: !enabled,
        }]
    }
}

/// Global connectivity as reported by the connection manager.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct ConnectivityState {
    state: NmState,
    primary_type: String,
}

impl ConnectivityState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_state(&mut self, state: NmState) {
        debug!("Connectivity state: {state}");
        self.state = state;
    }

    pub fn set_primary_type(&mut self, connection_type: String) {
        self.primary_type = connection_type;
    }

    pub fn status(&self) -> NetworkingStatus {
        NetworkingStatus::from(self.state)
    }

    /// Online over a cellular primary connection.
    pub fn limited_bandwidth(&self) -> bool {
        self.status() == NetworkingStatus::Online
            && matches!(
                self.primary_type.as_str(),
                connection_type::GSM | connection_type::CDMA
            )
    }
}
