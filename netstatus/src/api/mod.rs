//! Public API module.
//!
//! This module contains the user-facing API of the `netstatus` crate: the
//! data model and the [`Indicator`](indicator::Indicator) handle.

pub mod indicator;
pub mod models;
