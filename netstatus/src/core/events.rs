//! Typed event and effect vocabulary of the indicator core.
//!
//! Every platform observer and every user interaction is translated into an
//! [`IndicatorEvent`] and pushed onto the single event queue. The core answers
//! with [`Effect`]s: fire-and-forget platform requests whose outcomes come
//! back later as events.

use crate::api::models::{
    AccessPointId, AccessPointProps, ActiveAccessPoint, ActiveConnectionId, ConnectionId,
    DeviceId, ModemId, ModemProperty, NmState, NotificationId, NotifyRequest, PinType, RadioBlock,
    RadioType, SavedConnection,
};

/// An event delivered to the indicator core.
#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorEvent {
    Modem(ModemEvent),
    Wifi(WifiEvent),
    Radio(RadioEvent),
    Connectivity(ConnectivityEvent),
    Notification(NotificationEvent),
    User(UserAction),
    /// The menu is being torn down; all unlock sessions are cancelled.
    Shutdown,
}

/// Cellular modem observations.
#[derive(Debug, Clone, PartialEq)]
pub enum ModemEvent {
    Added(ModemId),
    Removed(ModemId),
    /// One property dictionary or signal burst for a modem.
    Properties(ModemId, Vec<ModemProperty>),
}

/// Wi-Fi device, access point and connection observations.
#[derive(Debug, Clone, PartialEq)]
pub enum WifiEvent {
    DeviceAdded(DeviceId),
    DeviceRemoved(DeviceId),
    AccessPointAdded {
        device: DeviceId,
        id: AccessPointId,
        props: AccessPointProps,
    },
    AccessPointRemoved(AccessPointId),
    AccessPointUpdated {
        id: AccessPointId,
        props: AccessPointProps,
    },
    ConnectionAdded(SavedConnection),
    ConnectionRemoved(ConnectionId),
    /// The active connection of a device changed (`None` when idle).
    ActiveConnectionChanged {
        device: DeviceId,
        active: Option<ActiveAccessPoint>,
    },
}

/// Kill-switch observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioEvent {
    BlockChanged { radio: RadioType, block: RadioBlock },
    FlightModeChanged(bool),
}

/// Global connection-manager observations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityEvent {
    StateChanged(NmState),
    /// Connection type of the primary connection (empty when none).
    PrimaryConnectionType(String),
}

/// Notification daemon callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    /// The daemon answered `request` for the unlock notification of
    /// `modem` with `id`.
    Shown {
        modem: ModemId,
        request: NotifyRequest,
        id: NotificationId,
    },
    /// The notification `request` could not be delivered.
    Failed {
        modem: ModemId,
        request: NotifyRequest,
    },
    /// The daemon closed the notification.
    Closed(NotificationId),
}

/// User interactions with the menu or the unlock notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    SetFlightMode(bool),
    SetWifiEnabled(bool),
    SetMobileData(bool),
    /// Activate the access point group shown under the given action index.
    ActivateAccessPoint(u32),
    /// Activate the locked indicator of a SIM slot.
    UnlockSim(u32),
    /// Text submitted in the unlock notification.
    SubmitPin(String),
    /// The unlock notification was cancelled.
    DismissUnlock,
    /// The error text of the unlock notification was dismissed.
    DismissError,
    /// The popup of the unlock notification was dismissed.
    DismissPopup,
    OpenWifiSettings,
    OpenCellularSettings,
}

/// Content of one SIM unlock notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockNotification {
    pub title: String,
    pub body: String,
    /// Accepted input length, inclusive.
    pub pin_min_max: (u8, u8),
    /// Popup text, empty when none.
    pub popup: String,
    /// Error text, empty when none.
    pub error: String,
}

/// A fire-and-forget platform request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    EnterPin {
        modem: ModemId,
        pin_type: PinType,
        pin: String,
    },
    ResetPin {
        modem: ModemId,
        pin_type: PinType,
        puk: String,
        new_pin: String,
    },
    SetModemPowered {
        modem: ModemId,
        powered: bool,
    },
    BlockRadio {
        radio: RadioType,
        block: bool,
    },
    SetFlightMode(bool),
    ActivateConnection {
        device: DeviceId,
        connection: ConnectionId,
        access_point: AccessPointId,
    },
    AddAndActivateConnection {
        device: DeviceId,
        access_point: AccessPointId,
    },
    DeactivateConnection(ActiveConnectionId),
    /// Show or replace the unlock notification of `modem`.
    Notify {
        modem: ModemId,
        /// SIM slot of the modem, names the unlock menu.
        slot: u32,
        request: NotifyRequest,
        replaces: Option<NotificationId>,
        content: UnlockNotification,
    },
    CloseNotification(NotificationId),
    OpenSettings(&'static str),
}
