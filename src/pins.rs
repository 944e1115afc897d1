//! Logical-pin-role to physical-pin mapping
//!
//! Programmer configurations describe wiring as "role -> raw pin spec":
//! bits 0-6 carry the 1-based physical pin number, bit 7 marks the signal
//! as inverted, and 0 means the role is unused. The two power/buffer roles
//! take a 12-bit mask of pins instead of a single number.
//!
//! `PinMap` resolves those specs into the direction and inversion masks the
//! MPSSE engine works with and rejects double-claimed or out-of-range pins.

use std::fmt;

use crate::error::ConfigError;
use crate::protocol::{GROUP_PIN_LIMIT, MAX_PIN, MIN_RESET_PIN, PIN_MISO, PIN_MOSI, PIN_SCK};

/// Logical signal roles of the programmer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinRole {
    /// ISP clock
    Sck,
    /// Data out to the target (target MOSI)
    Mosi,
    /// Data in from the target (target MISO)
    Miso,
    /// Target reset
    Reset,
    /// "Programming in progress" LED
    LedPgm,
    /// "Ready" LED
    LedRdy,
    /// "Error" LED
    LedErr,
    /// "Verifying" LED
    LedVfy,
    /// Target power enable (group of pins)
    Vcc,
    /// Level-shifter / buffer enable (group of pins)
    Buff,
}

impl PinRole {
    const SINGLE_COUNT: usize = 8;

    /// Whether this role takes a pin mask instead of a single pin
    pub fn is_group(self) -> bool {
        matches!(self, PinRole::Vcc | PinRole::Buff)
    }

    fn single_index(self) -> usize {
        match self {
            PinRole::Sck => 0,
            PinRole::Mosi => 1,
            PinRole::Miso => 2,
            PinRole::Reset => 3,
            PinRole::LedPgm => 4,
            PinRole::LedRdy => 5,
            PinRole::LedErr => 6,
            PinRole::LedVfy => 7,
            PinRole::Vcc | PinRole::Buff => unreachable!("group role has no single pin slot"),
        }
    }
}

impl fmt::Display for PinRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PinRole::Sck => "SCK",
            PinRole::Mosi => "MOSI",
            PinRole::Miso => "MISO",
            PinRole::Reset => "RESET",
            PinRole::LedPgm => "PGM LED",
            PinRole::LedRdy => "RDY LED",
            PinRole::LedErr => "ERR LED",
            PinRole::LedVfy => "VFY LED",
            PinRole::Vcc => "VCC",
            PinRole::Buff => "BUFF",
        };
        f.write_str(name)
    }
}

/// Live GPIO masks of an open session
///
/// Direction and inversion are fixed once pin mapping completes; only the
/// value mask mutates afterwards. The inversion mask affects the written
/// value bit, never the direction bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GpioState {
    /// Output level per pin
    pub value: u16,
    /// 1 = output, per pin
    pub direction: u16,
    /// 1 = logical levels are inverted on the wire, per pin
    pub inversion: u16,
}

impl GpioState {
    /// Update the value bit for one physical pin to the given logical level
    pub fn write_pin(&mut self, pin: u8, level: bool) {
        let bit = pin_bit(pin);
        let wire_level = level ^ (self.inversion & bit != 0);
        if wire_level {
            self.value |= bit;
        } else {
            self.value &= !bit;
        }
    }

    /// Update the value bits for a whole pin mask (groups have no inversion)
    pub fn write_mask(&mut self, mask: u16, level: bool) {
        if level {
            self.value |= mask;
        } else {
            self.value &= !mask;
        }
    }
}

fn pin_bit(pin: u8) -> u16 {
    1 << (pin - 1)
}

/// Collect the 1-based pin numbers of all set bits
fn mask_pins(mask: u16) -> Vec<u8> {
    (0u8..16)
        .filter(|i| mask & (1u16 << i) != 0)
        .map(|i| i + 1)
        .collect()
}

/// Resolves pin roles to physical pins and accumulates the session masks
#[derive(Debug, Clone, Default)]
pub struct PinMap {
    /// Physical pin per single-pin role, 0 = unassigned
    pins: [u8; PinRole::SINGLE_COUNT],
    /// Pin mask of the VCC group
    vcc_mask: u16,
    /// Pin mask of the buffer-enable group
    buff_mask: u16,
    direction: u16,
    inversion: u16,
}

impl PinMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a single-pin role from a raw pin spec
    ///
    /// Bits 0-6 carry the pin number, bit 7 the inversion flag. A raw value
    /// of 0 marks the role unused and succeeds without claiming anything.
    pub fn assign_single(&mut self, role: PinRole, raw: u8) -> Result<(), ConfigError> {
        debug_assert!(!role.is_group());

        if raw == 0 {
            return Ok(());
        }

        let inverted = raw & 0x80 != 0;
        let pin = raw & 0x7f;

        if pin > MAX_PIN {
            return Err(ConfigError::PinOutOfRange {
                role,
                pins: vec![pin],
            });
        }

        let bit = pin_bit(pin);
        if self.direction & bit != 0 {
            return Err(ConfigError::PinConflict {
                role,
                pins: vec![pin],
            });
        }

        log::debug!("{}: pin {}{}", role, pin, if inverted { " (inverted)" } else { "" });

        self.direction |= bit;
        if inverted {
            self.inversion |= bit;
        }
        self.pins[role.single_index()] = pin;
        Ok(())
    }

    /// Assign a group role from a 12-bit pin mask
    ///
    /// Groups are output-only and carry no inversion support.
    pub fn assign_group(&mut self, role: PinRole, mask: u16) -> Result<(), ConfigError> {
        debug_assert!(role.is_group());

        if mask >> GROUP_PIN_LIMIT != 0 {
            return Err(ConfigError::PinOutOfRange {
                role,
                pins: mask_pins(mask & !((1 << GROUP_PIN_LIMIT) - 1)),
            });
        }

        let clash = mask & self.direction;
        if clash != 0 {
            return Err(ConfigError::PinConflict {
                role,
                pins: mask_pins(clash),
            });
        }

        if mask != 0 {
            log::debug!("{}: pin mask {:#06x}", role, mask);
        }

        self.direction |= mask;
        match role {
            PinRole::Vcc => self.vcc_mask = mask,
            PinRole::Buff => self.buff_mask = mask,
            _ => unreachable!(),
        }
        Ok(())
    }

    /// Check the fixed wiring constraint of the MPSSE shift engine
    ///
    /// SCK, MOSI and MISO are hard-wired to pins 1, 2 and 3; RESET must sit
    /// on pin 4 or above so it cannot collide with the shift lines.
    pub fn validate_layout(&self) -> Result<(), ConfigError> {
        let sck = self.pin(PinRole::Sck);
        let mosi = self.pin(PinRole::Mosi);
        let miso = self.pin(PinRole::Miso);
        if sck != Some(PIN_SCK) || mosi != Some(PIN_MOSI) || miso != Some(PIN_MISO) {
            return Err(ConfigError::PinLayoutInvalid(format!(
                "MPSSE wiring requires SCK: 1, MOSI: 2, MISO: 3 (is: {:?}, {:?}, {:?})",
                sck, mosi, miso
            )));
        }
        match self.pin(PinRole::Reset) {
            Some(pin) if pin >= MIN_RESET_PIN => Ok(()),
            Some(pin) => Err(ConfigError::PinLayoutInvalid(format!(
                "RESET pin {} clashes with a data pin (must be {} or above)",
                pin, MIN_RESET_PIN
            ))),
            None => Err(ConfigError::PinLayoutInvalid(
                "RESET pin is not assigned".to_string(),
            )),
        }
    }

    /// Physical pin of a single-pin role, if assigned
    ///
    /// Group roles have no single pin and always return None; their
    /// wiring is exposed through [`group_mask`](PinMap::group_mask).
    pub fn pin(&self, role: PinRole) -> Option<u8> {
        if role.is_group() {
            return None;
        }
        let pin = self.pins[role.single_index()];
        (pin != 0).then_some(pin)
    }

    /// Pin mask of a group role
    pub fn group_mask(&self, role: PinRole) -> u16 {
        match role {
            PinRole::Vcc => self.vcc_mask,
            PinRole::Buff => self.buff_mask,
            _ => 0,
        }
    }

    /// Accumulated direction mask
    pub fn direction(&self) -> u16 {
        self.direction
    }

    /// Accumulated inversion mask
    pub fn inversion(&self) -> u16 {
        self.inversion
    }

    /// Initial GPIO state for a session using this mapping
    pub fn gpio_state(&self) -> GpioState {
        GpioState {
            value: 0,
            direction: self.direction,
            inversion: self.inversion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unused_spec_is_a_noop() {
        let mut map = PinMap::new();
        map.assign_single(PinRole::LedPgm, 0).unwrap();
        assert_eq!(map.direction(), 0);
        assert_eq!(map.pin(PinRole::LedPgm), None);
    }

    #[test]
    fn inverted_spec_sets_direction_and_inversion() {
        let mut map = PinMap::new();
        // 0x85 = pin 5, inverted
        map.assign_single(PinRole::Reset, 0x85).unwrap();
        assert_eq!(map.direction(), 1 << 4);
        assert_eq!(map.inversion(), 1 << 4);
        assert_eq!(map.pin(PinRole::Reset), Some(5));
        // Value stays untouched until a write occurs
        assert_eq!(map.gpio_state().value, 0);
    }

    #[test]
    fn pin_out_of_range_is_rejected() {
        let mut map = PinMap::new();
        let err = map.assign_single(PinRole::LedErr, 12).unwrap_err();
        assert_eq!(
            err,
            ConfigError::PinOutOfRange {
                role: PinRole::LedErr,
                pins: vec![12],
            }
        );
    }

    #[test]
    fn double_claimed_pin_is_a_conflict() {
        let mut map = PinMap::new();
        map.assign_single(PinRole::LedPgm, 5).unwrap();
        let err = map.assign_single(PinRole::LedRdy, 5).unwrap_err();
        assert_eq!(
            err,
            ConfigError::PinConflict {
                role: PinRole::LedRdy,
                pins: vec![5],
            }
        );
    }

    #[test]
    fn inversion_of_raw_pin_does_not_dodge_conflicts() {
        let mut map = PinMap::new();
        map.assign_single(PinRole::LedPgm, 0x85).unwrap();
        assert!(map.assign_single(PinRole::LedRdy, 5).is_err());
    }

    #[test]
    fn group_mask_claims_pins() {
        let mut map = PinMap::new();
        map.assign_group(PinRole::Vcc, 0x0030).unwrap();
        assert_eq!(map.direction(), 0x0030);
        assert_eq!(map.group_mask(PinRole::Vcc), 0x0030);
    }

    #[test]
    fn group_roles_have_no_single_pin() {
        let mut map = PinMap::new();
        map.assign_group(PinRole::Vcc, 0x0030).unwrap();
        assert_eq!(map.pin(PinRole::Vcc), None);
        assert_eq!(map.pin(PinRole::Buff), None);
    }

    #[test]
    fn group_mask_above_twelve_bits_is_rejected() {
        let mut map = PinMap::new();
        let err = map.assign_group(PinRole::Buff, 0x1010).unwrap_err();
        assert_eq!(
            err,
            ConfigError::PinOutOfRange {
                role: PinRole::Buff,
                pins: vec![13],
            }
        );
    }

    #[test]
    fn group_conflict_reports_only_the_clashing_pins() {
        let mut map = PinMap::new();
        map.assign_single(PinRole::LedPgm, 5).unwrap();
        let err = map.assign_group(PinRole::Vcc, 0x0070).unwrap_err();
        assert_eq!(
            err,
            ConfigError::PinConflict {
                role: PinRole::Vcc,
                pins: vec![5],
            }
        );
    }

    #[test]
    fn canonical_layout_validates() {
        let mut map = PinMap::new();
        map.assign_single(PinRole::Sck, 1).unwrap();
        map.assign_single(PinRole::Mosi, 2).unwrap();
        map.assign_single(PinRole::Miso, 3).unwrap();
        map.assign_single(PinRole::Reset, 4).unwrap();
        map.validate_layout().unwrap();
    }

    #[test]
    fn swapped_data_pins_fail_layout_validation() {
        let mut map = PinMap::new();
        map.assign_single(PinRole::Sck, 2).unwrap();
        map.assign_single(PinRole::Mosi, 1).unwrap();
        map.assign_single(PinRole::Miso, 3).unwrap();
        map.assign_single(PinRole::Reset, 4).unwrap();
        assert!(matches!(
            map.validate_layout(),
            Err(ConfigError::PinLayoutInvalid(_))
        ));
    }

    #[test]
    fn unassigned_reset_fails_layout_validation() {
        let mut map = PinMap::new();
        map.assign_single(PinRole::Sck, 1).unwrap();
        map.assign_single(PinRole::Mosi, 2).unwrap();
        map.assign_single(PinRole::Miso, 3).unwrap();
        assert!(matches!(
            map.validate_layout(),
            Err(ConfigError::PinLayoutInvalid(_))
        ));
    }

    #[test]
    fn inverted_write_matches_plain_write_of_opposite_level() {
        let mut inverted = GpioState {
            value: 0,
            direction: 1 << 4,
            inversion: 1 << 4,
        };
        let mut plain = GpioState {
            value: 0,
            direction: 1 << 4,
            inversion: 0,
        };
        inverted.write_pin(5, true);
        plain.write_pin(5, false);
        assert_eq!(inverted.value, plain.value);

        inverted.write_pin(5, false);
        plain.write_pin(5, true);
        assert_eq!(inverted.value, plain.value);
    }

    #[test]
    fn write_pin_touches_only_its_own_bit() {
        let mut gpio = GpioState {
            value: 0b1010,
            direction: 0xffff,
            inversion: 0,
        };
        gpio.write_pin(1, true);
        assert_eq!(gpio.value, 0b1011);
        gpio.write_pin(2, false);
        assert_eq!(gpio.value, 0b1001);
    }
}
