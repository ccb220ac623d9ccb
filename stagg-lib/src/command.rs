use crate::constants::{
    COUNTER_SUBMODE_ONCE, HOLD_TIME_MAX_MINUTES, SCHEDULE_TEMP_OFF, TARGET_TEMP_MAX_C,
};
use crate::frame::RawFrame;
use crate::state::ScheduleMode;

/// A single field-level mutation of the configuration frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldEdit {
    /// Target temperature in Celsius, clamped to [0, 100]
    TargetTemperature(f32),
    /// Hold time in minutes, clamped to [0, 60]
    HoldTime(u8),
    /// Schedule configuration. Hour and minute are written as given; callers
    /// must supply valid ranges.
    Schedule {
        mode: ScheduleMode,
        hour: u8,
        minute: u8,
        temperature_celsius: f32,
    },
}

/// Apply an edit to a copy of `base` and return the resulting frame.
///
/// Copy-forward semantics: every byte not implicated by the edit passes
/// through unchanged, including the counter. The one exception is the
/// schedule submode bit, which the wire format aliases onto counter bit 0x08;
/// a schedule edit writes that bit here, and the sequencer's generic counter
/// advance is applied on top of it afterwards.
pub fn encode(base: &RawFrame, edit: &FieldEdit) -> RawFrame {
    let mut next = *base;
    match *edit {
        FieldEdit::TargetTemperature(celsius) => {
            let clamped = celsius.clamp(0.0, TARGET_TEMP_MAX_C);
            next.set_target_half_degrees((clamped * 2.0).round() as u8);
        }
        FieldEdit::HoldTime(minutes) => {
            next.hold_time = minutes.min(HOLD_TIME_MAX_MINUTES);
        }
        FieldEdit::Schedule {
            mode,
            hour,
            minute,
            temperature_celsius,
        } => {
            let mut status = base.status();
            match mode {
                ScheduleMode::Off => {
                    status.set_schedule_enabled(false);
                    next.set_schedule_half_degrees(SCHEDULE_TEMP_OFF);
                    next.schedule_hours = 0;
                    next.schedule_minutes = 0;
                }
                ScheduleMode::Once | ScheduleMode::Daily => {
                    status.set_schedule_enabled(true);
                    next.set_schedule_half_degrees((temperature_celsius * 2.0).round() as u8);
                    next.schedule_hours = hour;
                    next.schedule_minutes = minute;
                    if mode == ScheduleMode::Once {
                        next.counter |= COUNTER_SUBMODE_ONCE;
                    } else {
                        next.counter &= !COUNTER_SUBMODE_ONCE;
                    }
                }
            }
            next.set_status(status);
        }
    }
    next
}
