//! State aggregation core for a network status indicator.
//!
//! This crate combines the state of NetworkManager (Wi-Fi and global
//! connectivity), ofono (cellular modems and their SIM cards) and URfkill
//! (radio kill-switches) into one view model, and drives the SIM PIN/PUK
//! unlock flow:
//!
//! - Modems are numbered into SIM slots and summarised with a status label
//!   and icon
//! - Access points are grouped by network identity and sorted
//! - Flight mode and Wi-Fi switch states are derived from the kill-switches
//! - Every change is published as one consistent snapshot plus granular,
//!   position-stable list updates
//! - The view model is rendered into a menu and an action group
//!
//! # Example
//!
//! ```no_run
//! use netstatus::{Indicator, IndicatorOptions};
//!
//! # async fn example() -> netstatus::Result<()> {
//! let indicator = Indicator::start(IndicatorOptions::default()).await?;
//!
//! let snapshot = indicator.snapshot();
//! for slot in &snapshot.view.sim_slots {
//!     println!("{} {}", slot.sim_identifier, slot.label);
//! }
//!
//! // Toggle flight mode through its menu action
//! indicator.invoke("indicator.airplane.enabled", None).await?;
//! indicator.shutdown().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! Platform monitors turn D-Bus signals into [`IndicatorEvent`]s on a single
//! queue. One event loop applies every queued event to an
//! [`IndicatorCore`], recomputes the view model once per batch and diffs it.
//! The core never talks to D-Bus: platform requests come out as [`Effect`]s
//! and are executed in order by a separate task through a [`Platform`].
//! [`IndicatorCore`] can therefore be driven directly, which is how the
//! tests exercise it.
//!
//! # Error Handling
//!
//! Aggregation never fails; platform races are ignored and incorrect PINs
//! are state transitions. Errors of the D-Bus glue, of action invocation
//! and of startup are reported as [`IndicatorError`].
//!
//! # Logging
//!
//! This crate uses the [`log`](https://docs.rs/log) facade for logging. To see
//! log output, add a logging implementation like `env_logger`.

// Internal implementation modules
mod core;
mod dbus;
mod monitoring;
mod types;
mod util;

// Public API modules
pub mod api;

// Re-exported public API
pub use api::indicator::{Indicator, Snapshot};
pub use api::models::{
    AccessPoint, AccessPointEntry, AccessPointGroup, AccessPointId, AccessPointProps,
    ActiveAccessPoint, ActiveConnectionId, ApKey, ConnectionId, ConnectionStatus, DeviceId,
    IndicatorError, IndicatorOptions, LockState, MenuProfile, Modem, ModemId, ModemProperty,
    NetworkingStatus, NmState, NotificationId, NotifyRequest, PinType, RadioBlock, RadioType,
    RegistrationStatus, Retries, SavedConnection, SimSlotSummary, Technology, ViewModel,
};
pub use crate::core::dispatch::{IndicatorCore, Step};
pub use crate::core::events::{
    ConnectivityEvent, Effect, IndicatorEvent, ModemEvent, NotificationEvent, RadioEvent,
    UnlockNotification, UserAction, WifiEvent,
};
pub use crate::core::menu::{Action, MenuItem, MenuModel, MenuSection, Variant, unlock_menu};
pub use crate::core::root_state::{ListChange, ViewUpdate, apply_changes, diff_keyed};
pub use crate::core::sim_unlock::UnlockState;
pub use monitoring::platform::{DbusPlatform, Platform};
pub use util::utils::{decode_ssid_lossy, signal_bars, wifi_signal_icon};

/// A specialized `Result` type for indicator operations.
pub type Result<T> = std::result::Result<T, IndicatorError>;
