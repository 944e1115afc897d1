//! FTDI MPSSE protocol constants for ISP programming
//!
//! Based on the FTDI MPSSE command set documentation. The ISP driver only
//! uses the bit-bang GPIO and byte-shift subset of the engine.

// Allow unused constants - they're provided for completeness
#![allow(dead_code)]

// ============================================================================
// USB VID/PID constants
// ============================================================================

/// FTDI vendor ID
pub const FTDI_VID: u16 = 0x0403;

/// FT2232C/D/H product ID (dual channel)
pub const FTDI_FT2232_PID: u16 = 0x6010;

/// FT4232H product ID (quad channel)
pub const FTDI_FT4232H_PID: u16 = 0x6011;

/// FT232H product ID (single channel)
pub const FTDI_FT232H_PID: u16 = 0x6014;

// ============================================================================
// MPSSE Commands
// ============================================================================

/// Write bytes on negative clock edge (SPI mode 0)
pub const MPSSE_DO_WRITE: u8 = 0x10;

/// Read bytes on positive clock edge (SPI mode 0)
pub const MPSSE_DO_READ: u8 = 0x20;

/// Write on negative clock edge
pub const MPSSE_WRITE_NEG: u8 = 0x01;

/// Set data bits low byte (value, direction)
pub const SET_BITS_LOW: u8 = 0x80;

/// Get data bits low byte
pub const GET_BITS_LOW: u8 = 0x81;

/// Set data bits high byte (value, direction)
pub const SET_BITS_HIGH: u8 = 0x82;

/// Get data bits high byte
pub const GET_BITS_HIGH: u8 = 0x83;

/// Set clock divisor
pub const TCK_DIVISOR: u8 = 0x86;

/// Send immediate (flush buffers)
pub const SEND_IMMEDIATE: u8 = 0x87;

// ============================================================================
// Clocking
// ============================================================================

/// Master clock feeding the TCK divider (6 MHz with the divide-by-5
/// prescaler active, which is the power-on state used by this driver).
pub const MASTER_CLOCK_HZ: u32 = 6_000_000;

/// Default ISP clock frequency
pub const DEFAULT_FREQUENCY_HZ: u32 = 150_000;

// ============================================================================
// Pin layout
//
// The MPSSE serial engine hard-wires the shift function onto the first
// three ADBUS lines, counted 1-based here the way programmer pin
// definitions count them:
//
// SCK  is pin 1 (TCK/SK)
// MOSI is pin 2 (TDI/DO, data out to the target)
// MISO is pin 3 (TDO/DI, data in from the target)
//
// Everything from pin 4 upwards is free-form GPIO.
// ============================================================================

/// Fixed physical pin for SCK
pub const PIN_SCK: u8 = 1;

/// Fixed physical pin for MOSI
pub const PIN_MOSI: u8 = 2;

/// Fixed physical pin for MISO
pub const PIN_MISO: u8 = 3;

/// Lowest pin RESET may occupy (everything below is shift-engine wiring)
pub const MIN_RESET_PIN: u8 = 4;

/// Default RESET pin
pub const DEFAULT_RESET_PIN: u8 = 4;

/// Highest addressable GPIO pin
pub const MAX_PIN: u8 = 11;

/// Group masks must fit below this bit index
pub const GROUP_PIN_LIMIT: u8 = 12;

/// Every ISP command and response is exactly this many bytes
pub const ISP_CMD_LEN: usize = 4;

// ============================================================================
// Supported device types
// ============================================================================

/// A USB device the driver knows how to talk to
pub struct SupportedDevice {
    pub vendor_id: u16,
    pub product_id: u16,
    pub vendor_name: &'static str,
    pub device_name: &'static str,
}

/// FTDI devices with an MPSSE engine usable for ISP
pub const SUPPORTED_DEVICES: &[SupportedDevice] = &[
    SupportedDevice {
        vendor_id: FTDI_VID,
        product_id: FTDI_FT2232_PID,
        vendor_name: "FTDI",
        device_name: "FT2232",
    },
    SupportedDevice {
        vendor_id: FTDI_VID,
        product_id: FTDI_FT4232H_PID,
        vendor_name: "FTDI",
        device_name: "FT4232H",
    },
    SupportedDevice {
        vendor_id: FTDI_VID,
        product_id: FTDI_FT232H_PID,
        vendor_name: "FTDI",
        device_name: "FT232H",
    },
];

/// Get device info for a VID/PID pair
pub fn get_device_info(vid: u16, pid: u16) -> Option<&'static SupportedDevice> {
    SUPPORTED_DEVICES
        .iter()
        .find(|d| d.vendor_id == vid && d.product_id == pid)
}
