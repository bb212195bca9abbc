use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use thiserror::Error;

use crate::types::constants::{icons, nm_state, urfkill};

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Wraps a platform handle (usually a D-Bus object path).
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the underlying handle.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

opaque_id!(
    /// Identity of a cellular modem (the ofono object path).
    ModemId
);
opaque_id!(
    /// Identity of a Wi-Fi device.
    DeviceId
);
opaque_id!(
    /// Identity of a single radio access point.
    AccessPointId
);
opaque_id!(
    /// Identity of a saved connection profile.
    ConnectionId
);
opaque_id!(
    /// Identity of an active connection.
    ActiveConnectionId
);

/// Identifier assigned to a notification by the notification daemon.
pub type NotificationId = u32;

/// Token of one notification request, echoed back with its outcome.
pub type NotifyRequest = u64;

/// SIM lock state as reported by the SIM manager's `PinRequired` property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LockState {
    /// The SIM is unlocked (or has no PIN).
    #[default]
    None,
    /// The SIM PIN must be entered.
    PinRequired,
    /// The SIM is blocked and requires the PUK.
    PukRequired,
}

impl From<&str> for LockState {
    fn from(value: &str) -> Self {
        match value {
            "pin" => Self::PinRequired,
            "puk" => Self::PukRequired,
            _ => Self::None,
        }
    }
}

impl LockState {
    /// Returns `true` if the SIM needs either its PIN or its PUK.
    pub fn is_locked(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// The kind of secret passed to the modem's enter/reset operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinType {
    Pin,
    Puk,
}

impl PinType {
    /// The ofono name of this secret type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pin => "pin",
            Self::Puk => "puk",
        }
    }
}

impl Display for PinType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remaining PIN/PUK attempts as reported by the SIM.
///
/// The SIM is the authoritative source; entries are absent when the modem
/// does not report them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Retries {
    pub pin: Option<u8>,
    pub puk: Option<u8>,
}

impl Retries {
    /// Returns the remaining attempts for the given secret type.
    pub fn get(&self, pin_type: PinType) -> Option<u8> {
        match pin_type {
            PinType::Pin => self.pin,
            PinType::Puk => self.puk,
        }
    }
}

/// Network registration status of a modem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RegistrationStatus {
    #[default]
    Unregistered,
    Searching,
    Registered,
    Denied,
}

impl RegistrationStatus {
    /// Parses an ofono registration status, returning the status together
    /// with the roaming flag (`"roaming"` is a registered modem).
    pub fn from_ofono(value: &str) -> (Self, bool) {
        match value {
            "registered" => (Self::Registered, false),
            "roaming" => (Self::Registered, true),
            "searching" => (Self::Searching, false),
            "denied" => (Self::Denied, false),
            _ => (Self::Unregistered, false),
        }
    }
}

/// Radio access technology of a modem's current registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Technology {
    #[default]
    None,
    Gsm,
    Edge,
    Umts,
    Hspa,
    Lte,
}

impl From<&str> for Technology {
    fn from(value: &str) -> Self {
        match value {
            "gsm" => Self::Gsm,
            "edge" => Self::Edge,
            "umts" => Self::Umts,
            "hspa" | "hsdpa" | "hsupa" | "hspap" => Self::Hspa,
            "lte" => Self::Lte,
            _ => Self::None,
        }
    }
}

impl Technology {
    /// The cellular data icon shown while this technology carries data.
    pub fn icon(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Gsm => Some(icons::CELLULAR_PRE_EDGE),
            Self::Edge => Some(icons::CELLULAR_EDGE),
            Self::Umts => Some(icons::CELLULAR_3G),
            Self::Hspa => Some(icons::CELLULAR_HSPA),
            Self::Lte => Some(icons::CELLULAR_LTE),
        }
    }
}

/// A single observed modem property change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModemProperty {
    SimPresent(bool),
    LockState(LockState),
    Retries(Retries),
    Online(bool),
    Strength(u8),
    Registration {
        status: RegistrationStatus,
        roaming: bool,
    },
    Technology(Technology),
    Operator(String),
    DataEnabled(bool),
}

/// A cellular modem and its SIM as tracked by the modem set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Modem {
    /// Platform identity
    pub id: ModemId,
    /// SIM slot number, assigned at discovery
    pub slot: u32,
    /// Whether a SIM card is inserted
    pub sim_present: bool,
    /// PIN/PUK lock state
    pub lock_state: LockState,
    /// Remaining PIN/PUK attempts
    pub retries: Retries,
    /// Whether the modem radio is online (false in flight mode)
    pub online: bool,
    /// Raw signal strength (0-100)
    pub strength: u8,
    /// Network registration status
    pub registration: RegistrationStatus,
    /// Whether the registration is a roaming one
    pub roaming: bool,
    /// Current access technology
    pub technology: Technology,
    /// Carrier name, may be empty
    pub operator: String,
    /// Whether the connection manager is powered (mobile data enabled)
    pub data_enabled: bool,
}

impl Modem {
    /// Creates a modem with no observed properties yet.
    pub fn new(id: ModemId, slot: u32) -> Self {
        Self {
            id,
            slot,
            sim_present: false,
            lock_state: LockState::None,
            retries: Retries::default(),
            online: false,
            strength: 0,
            registration: RegistrationStatus::Unregistered,
            roaming: false,
            technology: Technology::None,
            operator: String::new(),
            data_enabled: false,
        }
    }

    /// Applies a property change, returning whether anything changed.
    pub fn apply(&mut self, property: ModemProperty) -> bool {
        fn set<T: PartialEq>(slot: &mut T, value: T) -> bool {
            if *slot == value {
                false
            } else {
                *slot = value;
                true
            }
        }

        match property {
            ModemProperty::SimPresent(v) => set(&mut self.sim_present, v),
            ModemProperty::LockState(v) => set(&mut self.lock_state, v),
            ModemProperty::Retries(v) => set(&mut self.retries, v),
            ModemProperty::Online(v) => set(&mut self.online, v),
            ModemProperty::Strength(v) => set(&mut self.strength, v),
            ModemProperty::Registration { status, roaming } => {
                let a = set(&mut self.registration, status);
                let b = set(&mut self.roaming, roaming);
                a || b
            }
            ModemProperty::Technology(v) => set(&mut self.technology, v),
            ModemProperty::Operator(v) => set(&mut self.operator, v),
            ModemProperty::DataEnabled(v) => set(&mut self.data_enabled, v),
        }
    }
}

/// Connection status of an access point or access point group.
///
/// Ordered so that the status of a group is the maximum over its members.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionStatus {
    /// Returns `true` for connecting or connected.
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Disconnected)
    }
}

/// Observable properties of an access point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPointProps {
    /// SSID as raw bytes (may not be valid UTF-8)
    pub ssid: Vec<u8>,
    /// Whether the network requires authentication
    pub secured: bool,
    /// Whether this is an ad-hoc network
    pub adhoc: bool,
    /// Signal strength (0-100)
    pub strength: u8,
}

impl AccessPointProps {
    /// The presentation key this access point is grouped under.
    pub fn key(&self) -> ApKey {
        ApKey {
            ssid: self.ssid.clone(),
            secured: self.secured,
            adhoc: self.adhoc,
        }
    }
}

/// A physical access point owned by a Wi-Fi device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessPoint {
    pub id: AccessPointId,
    pub device: DeviceId,
    pub props: AccessPointProps,
    pub status: ConnectionStatus,
}

/// Network identity access points are grouped by.
///
/// Compared byte-for-byte on the SSID; never by the decoded label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApKey {
    pub ssid: Vec<u8>,
    pub secured: bool,
    pub adhoc: bool,
}

/// Presentation-level merge of access points sharing one [`ApKey`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessPointGroup {
    pub key: ApKey,
    /// Decoded SSID
    pub label: String,
    /// Maximum strength over the members
    pub strength: u8,
    /// Strongest status over the members
    pub status: ConnectionStatus,
    pub members: BTreeSet<AccessPointId>,
}

/// A saved connection profile for a Wi-Fi network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedConnection {
    pub id: ConnectionId,
    pub ssid: Vec<u8>,
}

/// The access point a device is currently activating or connected to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveAccessPoint {
    pub connection: ActiveConnectionId,
    pub access_point: AccessPointId,
    pub status: ConnectionStatus,
}

/// Radio types that can be blocked by a kill-switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RadioType {
    Wifi,
    Wwan,
}

impl RadioType {
    /// The URfkill type code of this radio.
    pub fn to_code(self) -> u32 {
        match self {
            Self::Wifi => urfkill::TYPE_WLAN,
            Self::Wwan => urfkill::TYPE_WWAN,
        }
    }
}

impl Display for RadioType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Wifi => write!(f, "wifi"),
            Self::Wwan => write!(f, "wwan"),
        }
    }
}

/// Kill-switch state of one radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RadioBlock {
    /// Blocked by software policy
    pub soft: bool,
    /// Blocked by a hardware switch
    pub hard: bool,
}

impl RadioBlock {
    pub fn is_blocked(self) -> bool {
        self.soft || self.hard
    }
}

impl From<i32> for RadioBlock {
    fn from(state: i32) -> Self {
        match state {
            urfkill::STATE_SOFT_BLOCKED => Self {
                soft: true,
                hard: false,
            },
            urfkill::STATE_HARD_BLOCKED => Self {
                soft: false,
                hard: true,
            },
            _ => Self::default(),
        }
    }
}

/// NetworkManager global connectivity state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NmState {
    #[default]
    Unknown,
    Asleep,
    Disconnected,
    Disconnecting,
    Connecting,
    ConnectedLocal,
    ConnectedSite,
    ConnectedGlobal,
}

impl From<u32> for NmState {
    fn from(code: u32) -> Self {
        match code {
            nm_state::ASLEEP => Self::Asleep,
            nm_state::DISCONNECTED => Self::Disconnected,
            nm_state::DISCONNECTING => Self::Disconnecting,
            nm_state::CONNECTING => Self::Connecting,
            nm_state::CONNECTED_LOCAL => Self::ConnectedLocal,
            nm_state::CONNECTED_SITE => Self::ConnectedSite,
            nm_state::CONNECTED_GLOBAL => Self::ConnectedGlobal,
            _ => Self::Unknown,
        }
    }
}

impl Display for NmState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Asleep => write!(f, "asleep"),
            Self::Disconnected => write!(f, "disconnected"),
            Self::Disconnecting => write!(f, "disconnecting"),
            Self::Connecting => write!(f, "connecting"),
            Self::ConnectedLocal => write!(f, "connected (local)"),
            Self::ConnectedSite => write!(f, "connected (site)"),
            Self::ConnectedGlobal => write!(f, "connected (global)"),
        }
    }
}

/// Collapsed networking status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NetworkingStatus {
    #[default]
    Offline,
    Connecting,
    Online,
}

impl From<NmState> for NetworkingStatus {
    fn from(state: NmState) -> Self {
        match state {
            NmState::Connecting => Self::Connecting,
            NmState::ConnectedLocal | NmState::ConnectedSite | NmState::ConnectedGlobal => {
                Self::Online
            }
            NmState::Unknown | NmState::Asleep | NmState::Disconnected | NmState::Disconnecting => {
                Self::Offline
            }
        }
    }
}

/// Per-SIM-slot summary rendered in the cellular section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimSlotSummary {
    pub modem: ModemId,
    pub slot: u32,
    /// `"SIM N"` when two or more modems exist, empty otherwise
    pub sim_identifier: String,
    /// Status label ("No SIM", "SIM Locked", carrier name, ...)
    pub label: String,
    /// Status icon name
    pub icon: String,
    pub locked: bool,
    pub roaming: bool,
    /// Whether this slot contributes an icon to the indicator
    pub in_indicator: bool,
}

/// A visible access point group as rendered in the Wi-Fi section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessPointEntry {
    pub key: ApKey,
    pub label: String,
    pub strength: u8,
    pub status: ConnectionStatus,
}

impl AccessPointEntry {
    pub fn secured(&self) -> bool {
        self.key.secured
    }

    pub fn adhoc(&self) -> bool {
        self.key.adhoc
    }
}

/// The full, consistent presentation snapshot.
///
/// Always rebuilt as a whole from the leaf components; the projection only
/// ever sees complete snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ViewModel {
    /// Per-SIM summaries, ordered by slot
    pub sim_slots: Vec<SimSlotSummary>,
    /// Technology icon of the modem carrying mobile data
    pub cellular_data_icon: Option<String>,
    /// Icon of the connected Wi-Fi network
    pub wifi_icon: Option<String>,
    /// Flight mode toggle state
    pub flight_mode: bool,
    /// Wi-Fi enable toggle state
    pub wifi_enabled: bool,
    /// Whether the mobile data switch is on
    pub mobile_data_enabled: bool,
    /// Visible access point groups, connected group first
    pub access_points: Vec<AccessPointEntry>,
    pub status: NetworkingStatus,
    pub limited_bandwidth: bool,
    /// Ordered indicator icons
    pub indicator_icons: Vec<String>,
}

/// Menu flavour the projection renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MenuProfile {
    #[default]
    Phone,
    Desktop,
}

impl MenuProfile {
    /// Prefix used for the root action (`indicator.<prefix>.network-status`).
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Phone => "phone",
            Self::Desktop => "desktop",
        }
    }
}

impl Display for MenuProfile {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.prefix())
    }
}

impl std::str::FromStr for MenuProfile {
    type Err = IndicatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "phone" => Ok(Self::Phone),
            "desktop" => Ok(Self::Desktop),
            other => Err(IndicatorError::InvalidProfile(other.to_string())),
        }
    }
}

/// Indicator configuration.
///
/// # Examples
///
/// ```rust
/// use netstatus::{IndicatorOptions, MenuProfile};
///
/// let opts = IndicatorOptions {
///     profile: MenuProfile::Desktop,
///     show_settings_items: false,
///     ..Default::default()
/// };
/// assert_eq!(opts.notification_app_name, "indicator-network");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorOptions {
    /// Menu flavour to render
    pub profile: MenuProfile,
    /// Whether to render the "… settings" entries
    pub show_settings_items: bool,
    /// Application name passed to the notification daemon
    pub notification_app_name: String,
    /// Bus name advertised in the snap-decision menu reference
    pub bus_name: String,
    /// Object path advertised in the snap-decision menu reference
    pub object_path: String,
}

impl Default for IndicatorOptions {
    fn default() -> Self {
        Self {
            profile: MenuProfile::Phone,
            show_settings_items: true,
            notification_app_name: "indicator-network".into(),
            bus_name: "com.canonical.indicator.network".into(),
            object_path: "/com/canonical/indicator/network".into(),
        }
    }
}

/// Errors surfaced by the indicator outside the aggregation core.
///
/// Core components never fail; these come from the D-Bus glue, action
/// invocation and startup.
#[derive(Debug, Error)]
pub enum IndicatorError {
    /// A D-Bus communication error occurred.
    #[error("D-Bus error: {0}")]
    Dbus(#[from] zbus::Error),

    /// A D-Bus standard interface call failed.
    #[error("D-Bus call failed: {0}")]
    Fdo(#[from] zbus::fdo::Error),

    /// A property value had an unexpected type.
    #[error("unexpected property value: {0}")]
    Variant(#[from] zvariant::Error),

    /// The connection manager could not be reached at startup.
    #[error("network manager unavailable: {0}")]
    ManagerUnavailable(String),

    /// An action name the projection does not know.
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// An action was invoked with a parameter of the wrong shape.
    #[error("invalid parameter for action: {0}")]
    InvalidActionParameter(String),

    /// Unrecognized menu profile name.
    #[error("invalid menu profile: {0}")]
    InvalidProfile(String),

    /// The event loop has shut down.
    #[error("indicator event queue closed")]
    QueueClosed,
}
