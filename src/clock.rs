//! ISP clock configuration
//!
//! The MPSSE TCK generator divides a 6 MHz master clock:
//!
//! ```text
//! SCK = 6 MHz / (divisor + 1)
//! ```
//!
//! so the representable range is ~91.553 Hz (divisor 65535) up to 6 MHz
//! (divisor 0). Requests outside that band are clamped.

use crate::protocol::{MASTER_CLOCK_HZ, TCK_DIVISOR};

/// How a frequency request was adjusted to fit the divider range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockCap {
    /// Request was representable as-is
    None,
    /// Request above 6 MHz, clamped to maximum speed
    Maximum,
    /// Request below ~91.553 Hz, clamped to minimum speed
    Minimum,
}

/// A TCK divisor derived from a requested ISP frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockDivisor {
    /// Divider register value
    pub divisor: u16,
    /// Clamping applied to the request, if any
    pub cap: ClockCap,
}

impl ClockDivisor {
    /// Derive the divisor for a requested frequency in Hz
    pub fn from_hz(requested_hz: u32) -> Self {
        let (divisor, cap) = if requested_hz > MASTER_CLOCK_HZ {
            log::warn!(
                "frequency too high ({} Hz > 6 MHz), resetting to 6 MHz",
                requested_hz
            );
            (0, ClockCap::Maximum)
        } else {
            let raw = (MASTER_CLOCK_HZ as f64 / requested_hz as f64).round() as i64 - 1;
            if raw > u16::MAX as i64 {
                log::warn!(
                    "frequency too low ({} Hz < 91.553 Hz), resetting to 91.553 Hz",
                    requested_hz
                );
                (u16::MAX, ClockCap::Minimum)
            } else {
                (raw as u16, ClockCap::None)
            }
        };

        log::debug!("clock divisor: {:#06x}", divisor);
        ClockDivisor { divisor, cap }
    }

    /// The frequency the engine will actually generate
    pub fn effective_hz(&self) -> u32 {
        MASTER_CLOCK_HZ / (self.divisor as u32 + 1)
    }

    /// The 3-byte TCK_DIVISOR command frame
    pub fn frame(&self) -> [u8; 3] {
        [
            TCK_DIVISOR,
            (self.divisor & 0xff) as u8,
            (self.divisor >> 8) as u8,
        ]
    }
}
