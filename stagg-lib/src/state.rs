use crate::constants::COUNTER_SUBMODE_ONCE;
use crate::frame::RawFrame;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{Display, EnumString};

/// Temperature units the kettle displays in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Units {
    Celsius,
    Fahrenheit,
}

/// Schedule activation mode.
///
/// The once/daily submode is not stored in a schedule byte: it lives in bit
/// 0x08 of the counter byte at the end of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ScheduleMode {
    #[default]
    Off,
    Once,
    Daily,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub mode: ScheduleMode,
    pub temperature_celsius: f32,
    pub hour: u8,
    pub minute: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clock {
    pub hour: u8,
    pub minute: u8,
}

/// Structured snapshot of the kettle configuration.
///
/// This is a lossy projection of [`RawFrame`]: chime volume, clock mode and
/// the unknown flag bits stay in the frame and ride along unchanged through
/// every edit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KettleState {
    /// Target temperature in Celsius, 0.5 degree resolution
    pub target_temperature: f32,
    pub units: Units,
    pub pre_boil_enabled: bool,
    /// Altitude compensation, snapped to the nearest 30 m
    pub altitude_meters: u16,
    pub hold_time_minutes: u8,
    pub schedule: Schedule,
    /// Opaque language code byte
    pub language: u8,
    pub clock: Clock,
    /// Set by the transport collaborator, not derived from frame bytes
    pub connected: bool,
}

impl From<&RawFrame> for KettleState {
    fn from(raw: &RawFrame) -> Self {
        // The firmware reports altitude in an odd unit: collapse to a 30 m
        // quotient first, then scale back. Keep the two-step rounding.
        let altitude_raw = raw.altitude_raw();
        let altitude_meters = ((altitude_raw as f32 / 30.0).round() * 30.0).round() as u16;

        let units = if raw.control().celsius_units() {
            Units::Celsius
        } else {
            Units::Fahrenheit
        };

        let mode = if !raw.status().schedule_enabled() {
            ScheduleMode::Off
        } else if raw.counter & COUNTER_SUBMODE_ONCE != 0 {
            ScheduleMode::Once
        } else {
            ScheduleMode::Daily
        };

        KettleState {
            target_temperature: raw.target_half_degrees() as f32 / 2.0,
            units,
            pre_boil_enabled: raw.control().pre_boil(),
            altitude_meters,
            hold_time_minutes: raw.hold_time,
            schedule: Schedule {
                mode,
                temperature_celsius: raw.schedule_half_degrees() as f32 / 2.0,
                hour: raw.schedule_hours,
                minute: raw.schedule_minutes,
            },
            language: raw.language,
            clock: Clock {
                hour: raw.clock_hours,
                minute: raw.clock_minutes,
            },
            connected: true,
        }
    }
}

impl fmt::Display for KettleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Target: {:.1} °C ({}), Hold: {} min, Altitude: {} m, Schedule: {}",
            self.target_temperature,
            self.units,
            self.hold_time_minutes,
            self.altitude_meters,
            self.schedule
        )
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            ScheduleMode::Off => write!(f, "off"),
            mode => write!(
                f,
                "{} @ {:02}:{:02} ({:.1} °C)",
                mode, self.hour, self.minute, self.temperature_celsius
            ),
        }
    }
}
