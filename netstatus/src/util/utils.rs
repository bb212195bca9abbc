//! Utility functions for signal and SSID presentation.
//!
//! Provides the helpers shared by the core and the D-Bus glue: SSID bytes to
//! labels, signal strength to bar counts and icon names, and the `try_log!`
//! macro for downgrading per-object failures.

use std::str;

use crate::types::constants::{icons, modem_signal, wifi_signal};

/// Unicode replacement character used for undecodable SSID bytes.
pub(crate) const REPLACEMENT: char = '\u{FFFD}';

/// Decodes SSID bytes as UTF-8, replacing every invalid byte individually.
///
/// Unlike [`String::from_utf8_lossy`], which emits one marker per maximal
/// invalid sequence, this emits one U+FFFD per byte that is not part of a
/// valid sequence, so four consecutive `0xFF` bytes become four markers.
pub fn decode_ssid_lossy(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut rest = bytes;

    loop {
        match str::from_utf8(rest) {
            Ok(valid) => {
                out.push_str(valid);
                break;
            }
            Err(e) => {
                let (valid, after) = rest.split_at(e.valid_up_to());
                out.push_str(str::from_utf8(valid).unwrap_or_default());
                // A truncated sequence at the end has no error length; every
                // remaining byte is invalid then.
                let bad = e.error_len().unwrap_or(after.len());
                out.extend(std::iter::repeat_n(REPLACEMENT, bad));
                rest = &after[bad..];
            }
        }
    }

    out
}

/// Maps a raw modem signal strength (0-100) to a bar count.
///
/// Returns `None` for a strength of 0 (no service). Thresholds are inclusive:
/// 1-5 → 0 bars, 6-15 → 1, 16-25 → 2, 26-38 → 3, 39 and up → 4.
pub fn signal_bars(strength: u8) -> Option<u8> {
    match strength {
        0 => None,
        s if s <= modem_signal::BARS_0_MAX => Some(0),
        s if s <= modem_signal::BARS_1_MAX => Some(1),
        s if s <= modem_signal::BARS_2_MAX => Some(2),
        s if s <= modem_signal::BARS_3_MAX => Some(3),
        _ => Some(4),
    }
}

/// Icon name for a modem bar count, clamped to the full icon.
pub(crate) fn modem_bars_icon(bars: u8) -> &'static str {
    icons::MODEM_BARS[usize::from(bars).min(icons::MODEM_BARS.len() - 1)]
}

/// Icon name for a Wi-Fi network of the given strength.
///
/// Produces `nm-signal-{0,25,50,75,100}`, with `-secure` appended for
/// secured networks.
pub fn wifi_signal_icon(strength: u8, secured: bool) -> String {
    let level = match strength {
        s if s >= wifi_signal::SIGNAL_100_MIN => 100,
        s if s >= wifi_signal::SIGNAL_75_MIN => 75,
        s if s >= wifi_signal::SIGNAL_50_MIN => 50,
        s if s >= wifi_signal::SIGNAL_25_MIN => 25,
        _ => 0,
    };

    if secured {
        format!("nm-signal-{level}-secure")
    } else {
        format!("nm-signal-{level}")
    }
}

/// Macro to convert Result to Option with error logging.
/// Usage: `try_log!(result, "context message")`
#[macro_export]
macro_rules! try_log {
    ($result:expr, $context:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => {
                log::warn!("{}: {:?}", $context, e);
                return None;
            }
        }
    };
}
