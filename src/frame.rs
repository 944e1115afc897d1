//! MPSSE command frame encoding
//!
//! The driver uses exactly two command shapes: the 6-byte "set GPIO state"
//! frame and the variable-length "shift data" frame. Both are built fresh
//! per transaction into an owned buffer and written in a single call.

use bitflags::bitflags;

use crate::pins::GpioState;
use crate::protocol::{
    MPSSE_DO_READ, MPSSE_DO_WRITE, MPSSE_WRITE_NEG, SEND_IMMEDIATE, SET_BITS_HIGH, SET_BITS_LOW,
};

bitflags! {
    /// Transfer phases of a shift frame
    ///
    /// The bits double as the MPSSE mode byte: byte-out on the falling
    /// clock edge, byte-in on the rising edge (SPI mode 0, MSB first).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ShiftMode: u8 {
        /// Transmit phase
        const TX = MPSSE_DO_WRITE | MPSSE_WRITE_NEG;
        /// Receive phase
        const RX = MPSSE_DO_READ;
        /// Combined transmit + receive
        const TRX = Self::TX.bits() | Self::RX.bits();
    }
}

/// Encode a GPIO-set frame from the full current masks
///
/// One atomic 6-byte write; the engine applies the low byte before the
/// high byte.
pub fn gpio_set(gpio: &GpioState) -> [u8; 6] {
    [
        SET_BITS_LOW,
        (gpio.value & 0xff) as u8,
        (gpio.direction & 0xff) as u8,
        SET_BITS_HIGH,
        (gpio.value >> 8) as u8,
        (gpio.direction >> 8) as u8,
    ]
}

/// Encode a shift frame carrying `payload` out through the engine
///
/// Header is {mode, (len-1) low, (len-1) high}; a SEND_IMMEDIATE trailer
/// flushes the response when the mode has a receive phase. Total length is
/// `payload.len() + 4` bytes, written in one transport call.
pub fn shift(mode: ShiftMode, payload: &[u8]) -> Vec<u8> {
    debug_assert!(mode.contains(ShiftMode::TX));
    debug_assert!(!payload.is_empty() && payload.len() <= 0x10000);

    let len = payload.len() - 1;
    let mut buf = Vec::with_capacity(payload.len() + 4);
    buf.push(mode.bits());
    buf.push((len & 0xff) as u8);
    buf.push((len >> 8) as u8);
    buf.extend_from_slice(payload);
    buf.push(SEND_IMMEDIATE);
    buf
}
