//! Constants for the platform D-Bus contracts and indicator presentation.
//!
//! These correspond to the numeric codes and strings used by NetworkManager,
//! ofono and URfkill, plus the icon names and thresholds the indicator
//! renders with.

/// NetworkManager device type constants.
pub mod device_type {
    pub const WIFI: u32 = 2;
}

/// NetworkManager global state (`org.freedesktop.NetworkManager.State`).
pub mod nm_state {
    pub const ASLEEP: u32 = 10;
    pub const DISCONNECTED: u32 = 20;
    pub const DISCONNECTING: u32 = 30;
    pub const CONNECTING: u32 = 40;
    pub const CONNECTED_LOCAL: u32 = 50;
    pub const CONNECTED_SITE: u32 = 60;
    pub const CONNECTED_GLOBAL: u32 = 70;
}

/// NetworkManager active connection state.
pub mod active_connection_state {
    pub const ACTIVATING: u32 = 1;
    pub const ACTIVATED: u32 = 2;
}

bitflags::bitflags! {
    /// NetworkManager 802.11 access point capability flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ApFlags: u32 {
        /// Privacy (WEP) is required
        const PRIVACY = 0x1;
        const WPS = 0x2;
        const WPS_PBC = 0x4;
        const WPS_PIN = 0x8;
    }
}

/// WiFi mode constants
pub mod wifi_mode {
    pub const ADHOC: u32 = 1;
}

/// Primary connection types that imply a metered, bandwidth-limited link.
pub mod connection_type {
    pub const GSM: &str = "gsm";
    pub const CDMA: &str = "cdma";
}

/// URfkill radio types and killswitch states.
pub mod urfkill {
    pub const TYPE_WLAN: u32 = 1;
    pub const TYPE_WWAN: u32 = 5;

    pub const STATE_SOFT_BLOCKED: i32 = 1;
    pub const STATE_HARD_BLOCKED: i32 = 2;

    pub const WLAN_PATH: &str = "/org/freedesktop/URfkill/WLAN";
    pub const WWAN_PATH: &str = "/org/freedesktop/URfkill/WWAN";
}

/// ofono property names, grouped by interface.
pub mod ofono {
    pub mod modem {
        pub const ONLINE: &str = "Online";
    }

    pub mod sim_manager {
        pub const PRESENT: &str = "Present";
        pub const PIN_REQUIRED: &str = "PinRequired";
        pub const RETRIES: &str = "Retries";
    }

    pub mod network_registration {
        pub const STATUS: &str = "Status";
        pub const STRENGTH: &str = "Strength";
        pub const TECHNOLOGY: &str = "Technology";
        pub const NAME: &str = "Name";
    }

    pub mod connection_manager {
        pub const POWERED: &str = "Powered";
    }
}

/// Modem signal strength thresholds for bar display.
///
/// A strength of 0 means no service; everything from 1 upwards maps to a bar
/// count, the ranges below being inclusive.
pub mod modem_signal {
    pub const BARS_0_MAX: u8 = 5;
    pub const BARS_1_MAX: u8 = 15;
    pub const BARS_2_MAX: u8 = 25;
    pub const BARS_3_MAX: u8 = 38;
}

/// Wi-Fi strength thresholds for the `nm-signal-*` icons (lower bounds).
pub mod wifi_signal {
    pub const SIGNAL_100_MIN: u8 = 80;
    pub const SIGNAL_75_MIN: u8 = 60;
    pub const SIGNAL_50_MIN: u8 = 40;
    pub const SIGNAL_25_MIN: u8 = 20;
}

/// PIN and PUK length bounds advertised to the notification.
pub mod pin_length {
    pub const PIN_MIN: u8 = 4;
    pub const PIN_MAX: u8 = 8;
    pub const PUK_MIN: u8 = 8;
    pub const PUK_MAX: u8 = 8;
}

/// Icon names.
pub mod icons {
    pub const AIRPLANE_MODE: &str = "airplane-mode";
    pub const NO_CONNECTION: &str = "nm-no-connection";

    pub const NO_SIM: &str = "no-simcard";
    pub const SIM_LOCKED: &str = "simcard-locked";
    pub const MODEM_DISABLED: &str = "gsm-3g-disabled";
    pub const MODEM_NO_SERVICE: &str = "gsm-3g-no-service";
    pub const MODEM_BARS: [&str; 5] = [
        "gsm-3g-none",
        "gsm-3g-low",
        "gsm-3g-medium",
        "gsm-3g-high",
        "gsm-3g-full",
    ];

    pub const CELLULAR_PRE_EDGE: &str = "network-cellular-pre-edge";
    pub const CELLULAR_EDGE: &str = "network-cellular-edge";
    pub const CELLULAR_3G: &str = "network-cellular-3g";
    pub const CELLULAR_HSPA: &str = "network-cellular-hspa";
    pub const CELLULAR_LTE: &str = "network-cellular-lte";
}

/// Settings URLs opened by the settings menu entries.
pub mod settings {
    pub const WIFI: &str = "settings:///system/wifi";
    pub const CELLULAR: &str = "settings:///system/cellular";
}

/// Notification daemon hint keys and the snap-decision action names.
pub mod notification {
    pub const SNAP_DECISIONS: &str = "x-canonical-snap-decisions";
    pub const SNAP_DECISIONS_TIMEOUT: &str = "x-canonical-snap-decisions-timeout";
    pub const PRIVATE_MENU_MODEL: &str = "x-canonical-private-menu-model";

    pub const ACTION_SIM_UNLOCK: &str = "notifications.simunlock";
    pub const ACTION_PIN_MIN_MAX: &str = "notifications.pinMinMax";
    pub const ACTION_POPUP: &str = "notifications.popup";
    pub const ACTION_ERROR: &str = "notifications.error";

    pub const SNAP_DECISION_TYPE: &str = "com.canonical.snapdecision.pinlock";
}
