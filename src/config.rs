//! Programmer configuration
//!
//! Raw pin specs use the programmer-definition encoding: bits 0-6 carry
//! the 1-based pin number, bit 7 marks the signal inverted, 0 means
//! unused. The VCC and BUFF roles take 12-bit pin masks instead.

use crate::error::ConfigError;
use crate::protocol::{
    DEFAULT_FREQUENCY_HZ, DEFAULT_RESET_PIN, FTDI_FT2232_PID, FTDI_VID, PIN_MISO, PIN_MOSI,
    PIN_SCK,
};

/// Configuration inputs for opening a programmer session
#[derive(Debug, Clone)]
pub struct IspConfig {
    /// USB vendor ID
    pub vid: u16,
    /// USB product ID
    pub pid: u16,
    /// Requested ISP clock frequency in Hz
    pub frequency_hz: u32,
    /// Raw pin spec for SCK
    pub sck: u8,
    /// Raw pin spec for MOSI (data out to the target)
    pub mosi: u8,
    /// Raw pin spec for MISO (data in from the target)
    pub miso: u8,
    /// Raw pin spec for RESET
    pub reset: u8,
    /// Raw pin spec for the "programming" LED (0 = unused)
    pub led_pgm: u8,
    /// Raw pin spec for the "ready" LED (0 = unused)
    pub led_rdy: u8,
    /// Raw pin spec for the "error" LED (0 = unused)
    pub led_err: u8,
    /// Raw pin spec for the "verifying" LED (0 = unused)
    pub led_vfy: u8,
    /// Pin mask powering the target (0 = unused)
    pub vcc: u16,
    /// Pin mask enabling level-shift buffers (0 = unused)
    pub buff: u16,
}

impl Default for IspConfig {
    fn default() -> Self {
        IspConfig {
            vid: FTDI_VID,
            pid: FTDI_FT2232_PID,
            frequency_hz: DEFAULT_FREQUENCY_HZ,
            sck: PIN_SCK,
            mosi: PIN_MOSI,
            miso: PIN_MISO,
            reset: DEFAULT_RESET_PIN,
            led_pgm: 0,
            led_rdy: 0,
            led_err: 0,
            led_vfy: 0,
            vcc: 0,
            buff: 0,
        }
    }
}

fn parse_u32(value: &str) -> Option<u32> {
    if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        value.parse().ok()
    }
}

fn parse_field<T: TryFrom<u32>>(key: &str, value: &str) -> Result<T, ConfigError> {
    parse_u32(value)
        .and_then(|v| T::try_from(v).ok())
        .ok_or_else(|| ConfigError::InvalidOption(format!("{}={}", key, value)))
}

/// Parse programmer options from key/value pairs
///
/// Recognized keys: `vid`, `pid`, `frequency`, `reset`, `led-pgm`,
/// `led-rdy`, `led-err`, `led-vfy`, `vcc`, `buff`. Numeric values accept
/// decimal or `0x` hex; pin specs may set bit 7 for inversion.
pub fn parse_options(options: &[(&str, &str)]) -> Result<IspConfig, ConfigError> {
    let mut config = IspConfig::default();

    for (key, value) in options {
        match *key {
            "vid" => config.vid = parse_field(key, value)?,
            "pid" => config.pid = parse_field(key, value)?,
            "frequency" | "speed" => config.frequency_hz = parse_field(key, value)?,
            "reset" => config.reset = parse_field(key, value)?,
            "led-pgm" => config.led_pgm = parse_field(key, value)?,
            "led-rdy" => config.led_rdy = parse_field(key, value)?,
            "led-err" => config.led_err = parse_field(key, value)?,
            "led-vfy" => config.led_vfy = parse_field(key, value)?,
            "vcc" => config.vcc = parse_field(key, value)?,
            "buff" => config.buff = parse_field(key, value)?,
            _ => {
                log::warn!("unknown option: {}={}", key, value);
            }
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_canonical_wiring() {
        let config = IspConfig::default();
        assert_eq!((config.vid, config.pid), (0x0403, 0x6010));
        assert_eq!(config.frequency_hz, 150_000);
        assert_eq!(
            (config.sck, config.mosi, config.miso, config.reset),
            (1, 2, 3, 4)
        );
    }

    #[test]
    fn options_accept_decimal_and_hex() {
        let config = parse_options(&[
            ("pid", "0x6014"),
            ("frequency", "250000"),
            ("reset", "0x85"),
            ("vcc", "0x0030"),
        ])
        .unwrap();
        assert_eq!(config.pid, 0x6014);
        assert_eq!(config.frequency_hz, 250_000);
        assert_eq!(config.reset, 0x85);
        assert_eq!(config.vcc, 0x0030);
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(matches!(
            parse_options(&[("frequency", "fast")]),
            Err(ConfigError::InvalidOption(_))
        ));
        // pin specs are one byte
        assert!(parse_options(&[("reset", "0x1ff")]).is_err());
    }
}
