//! Shared helpers.

pub(crate) mod utils;
