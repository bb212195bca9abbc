//! D-Bus proxy interfaces.
//!
//! Low-level proxy definitions for NetworkManager, ofono and URfkill on the
//! system bus, and for the notification daemon and URL dispatcher on the
//! session bus.

mod access_point;
mod active_connection;
mod device;
mod main_nm;
mod notifications;
mod ofono_connman;
mod ofono_manager;
mod ofono_modem;
mod ofono_registration;
mod ofono_sim;
mod settings;
mod urfkill;
mod url_dispatcher;
mod wireless;

pub(crate) use access_point::NMAccessPointProxy;
pub(crate) use active_connection::NMActiveConnectionProxy;
pub(crate) use device::NMDeviceProxy;
pub(crate) use main_nm::NMProxy;
pub(crate) use notifications::NotificationsProxy;
pub(crate) use ofono_connman::OfonoConnectionManagerProxy;
pub(crate) use ofono_manager::OfonoManagerProxy;
pub(crate) use ofono_modem::OfonoModemProxy;
pub(crate) use ofono_registration::OfonoNetworkRegistrationProxy;
pub(crate) use ofono_sim::OfonoSimManagerProxy;
pub(crate) use settings::{NMSettingsConnectionProxy, NMSettingsProxy};
pub(crate) use urfkill::{URfkillKillswitchProxy, URfkillProxy};
pub(crate) use url_dispatcher::URLDispatcherProxy;
pub(crate) use wireless::NMWirelessProxy;
