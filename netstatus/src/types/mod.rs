//! Type definitions and constants.
//!
//! This module contains platform constants shared by the core and the
//! D-Bus glue.

pub(crate) mod constants;
