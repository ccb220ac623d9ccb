use crate::error::DecodeError;
use crate::state::KettleState;
use modular_bitfield::prelude::*;
use zerocopy::byteorder::little_endian::U16;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Typed view of the status flag byte (offset 0).
#[bitfield(bytes = 1)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusFlags {
    #[skip]
    reserved_low: B3,
    pub schedule_enabled: bool,
    #[skip]
    reserved_high: B4,
}

/// Typed view of the control flag byte (offset 1).
#[bitfield(bytes = 1)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlFlags {
    #[skip]
    reserved0: B1,
    pub celsius_units: bool,
    #[skip]
    reserved2: B1,
    pub pre_boil: bool,
    #[skip]
    reserved_high: B4,
}

/// The 17-byte configuration state frame exchanged over the main
/// characteristic.
///
/// The layout matches the wire format byte for byte; the two temperature
/// fields occupy 2 bytes each but only the low byte carries the
/// Celsius-times-two value, so encode paths must preserve the high byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct RawFrame {
    pub status_flags: u8,
    pub control_flags: u8,
    pub altitude_low: u8,
    pub altitude_high: u8,
    pub target_temp: U16,
    pub schedule_temp: U16,
    pub schedule_minutes: u8,
    pub schedule_hours: u8,
    pub clock_minutes: u8,
    pub clock_hours: u8,
    pub clock_mode: u8,
    pub hold_time: u8,
    pub chime_volume: u8,
    pub language: u8,
    pub counter: u8,
}

impl RawFrame {
    /// Parse a frame from raw characteristic bytes, rejecting anything that
    /// is not exactly 17 bytes long.
    pub fn parse(bytes: &[u8]) -> Result<Self, DecodeError> {
        Self::read_from_bytes(bytes).map_err(|_| DecodeError::InvalidLength {
            actual: bytes.len(),
        })
    }

    /// Decode this frame into a structured state snapshot.
    pub fn decode(&self) -> KettleState {
        KettleState::from(self)
    }

    pub fn status(&self) -> StatusFlags {
        StatusFlags::from_bytes([self.status_flags])
    }

    pub fn control(&self) -> ControlFlags {
        ControlFlags::from_bytes([self.control_flags])
    }

    pub fn set_status(&mut self, status: StatusFlags) {
        self.status_flags = status.into_bytes()[0];
    }

    /// The raw 15-bit altitude value spanning the two altitude bytes.
    pub fn altitude_raw(&self) -> u16 {
        ((self.altitude_high as u16 & 0x7F) << 8) | self.altitude_low as u16
    }

    /// Target temperature as stored on the wire: Celsius times two, in the
    /// low byte of the field.
    pub fn target_half_degrees(&self) -> u8 {
        self.target_temp.get() as u8
    }

    pub(crate) fn set_target_half_degrees(&mut self, half: u8) {
        let high = self.target_temp.get() & 0xFF00;
        self.target_temp.set(high | half as u16);
    }

    pub fn schedule_half_degrees(&self) -> u8 {
        self.schedule_temp.get() as u8
    }

    pub(crate) fn set_schedule_half_degrees(&mut self, half: u8) {
        let high = self.schedule_temp.get() & 0xFF00;
        self.schedule_temp.set(high | half as u16);
    }
}

impl TryFrom<&[u8]> for RawFrame {
    type Error = DecodeError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::parse(bytes)
    }
}
