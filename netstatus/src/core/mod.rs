//! Core aggregation logic.
//!
//! The leaf components (modems, access points, radio and connectivity state),
//! the root aggregator, the SIM unlock state machine and the menu projection.
//! Nothing in here touches D-Bus; every platform interaction is an event in
//! or an effect out.

pub(crate) mod access_points;
pub(crate) mod connectivity;
pub(crate) mod dispatch;
pub(crate) mod events;
pub(crate) mod menu;
pub(crate) mod modem_set;
pub(crate) mod root_state;
pub(crate) mod sim_unlock;
