use crate::command::{self, FieldEdit};
use crate::error::{DecodeError, TransportError, WriteError};
use crate::frame::RawFrame;
use crate::session::{CounterPolicy, Kettle};
use crate::state::ScheduleMode;
use crate::transport::Transport;
use bytes::Bytes;
use std::sync::Mutex;
use tokio::sync::mpsc;
use zerocopy::IntoBytes;

/// Transport backed by an in-memory frame, recording every write.
struct MockTransport {
    initial: Vec<u8>,
    writes: Mutex<Vec<Vec<u8>>>,
    fail_writes: bool,
}

impl MockTransport {
    fn new(frame: RawFrame) -> Self {
        Self {
            initial: frame.as_bytes().to_vec(),
            writes: Mutex::new(Vec::new()),
            fail_writes: false,
        }
    }

    fn failing(frame: RawFrame) -> Self {
        Self {
            fail_writes: true,
            ..Self::new(frame)
        }
    }

    fn written(&self) -> Vec<Vec<u8>> {
        self.writes.lock().unwrap().clone()
    }
}

impl Transport for MockTransport {
    async fn read(&self) -> Result<Bytes, TransportError> {
        Ok(Bytes::copy_from_slice(&self.initial))
    }

    async fn write(&self, frame: &[u8]) -> Result<(), TransportError> {
        if self.fail_writes {
            return Err(TransportError::NotConnected);
        }
        self.writes.lock().unwrap().push(frame.to_vec());
        Ok(())
    }

    async fn subscribe(&self) -> Result<mpsc::Receiver<Bytes>, TransportError> {
        let (_tx, rx) = mpsc::channel(1);
        Ok(rx)
    }
}

fn frame_from_hex(hex_data: &str) -> RawFrame {
    let bytes = hex::decode(hex_data).expect("Failed to decode hex");
    RawFrame::parse(&bytes).expect("Failed to parse frame")
}

/// Schedule enabled (once), Celsius, 100 m raw altitude, 100.0 °C target,
/// 70.0 °C schedule at 06:30, clock 12:00, 15 min hold, counter 0x08.
fn example_frame() -> RawFrame {
    frame_from_hex("08026400c8008c001e06000c000f020108")
}

#[test]
fn test_parse_rejects_short_and_long_buffers() {
    let short = [0u8; 16];
    let long = [0u8; 18];

    assert!(matches!(
        RawFrame::parse(&short),
        Err(DecodeError::InvalidLength { actual: 16 })
    ));
    assert!(matches!(
        RawFrame::parse(&long),
        Err(DecodeError::InvalidLength { actual: 18 })
    ));
    assert!(matches!(
        RawFrame::parse(&[]),
        Err(DecodeError::InvalidLength { actual: 0 })
    ));
}

#[test]
fn test_decode_example_frame() {
    let state = example_frame().decode();

    assert_eq!(state.target_temperature, 100.0);
    assert_eq!(state.units, crate::state::Units::Celsius);
    assert!(!state.pre_boil_enabled);
    // raw 100 m: round(100 / 30) * 30 = 90
    assert_eq!(state.altitude_meters, 90);
    assert_eq!(state.hold_time_minutes, 15);
    assert_eq!(state.schedule.mode, ScheduleMode::Once);
    assert_eq!(state.schedule.temperature_celsius, 70.0);
    assert_eq!(state.schedule.hour, 6);
    assert_eq!(state.schedule.minute, 30);
    assert_eq!(state.clock.hour, 12);
    assert_eq!(state.clock.minute, 0);
    assert_eq!(state.language, 1);
    assert!(state.connected);
}

#[test]
fn test_decode_fahrenheit_and_pre_boil() {
    // control_flags 0x08: Fahrenheit display, pre-boil enabled
    let mut raw = example_frame();
    raw.control_flags = 0x08;
    let state = raw.decode();
    assert_eq!(state.units, crate::state::Units::Fahrenheit);
    assert!(state.pre_boil_enabled);

    // 0x0A: Celsius with pre-boil
    raw.control_flags = 0x0A;
    let state = raw.decode();
    assert_eq!(state.units, crate::state::Units::Celsius);
    assert!(state.pre_boil_enabled);
}

#[test]
fn test_schedule_mode_from_str() {
    assert_eq!("off".parse::<ScheduleMode>().unwrap(), ScheduleMode::Off);
    assert_eq!("once".parse::<ScheduleMode>().unwrap(), ScheduleMode::Once);
    assert_eq!("DAILY".parse::<ScheduleMode>().unwrap(), ScheduleMode::Daily);
    assert!("weekly".parse::<ScheduleMode>().is_err());
}

#[test]
fn test_decode_schedule_daily_and_off() {
    let mut raw = example_frame();

    // Enable bit set, counter submode bit clear: daily
    raw.counter = 0x07;
    assert_eq!(raw.decode().schedule.mode, ScheduleMode::Daily);

    // Enable bit clear: off regardless of the counter bit
    raw.status_flags = 0x00;
    raw.counter = 0x08;
    assert_eq!(raw.decode().schedule.mode, ScheduleMode::Off);
}

#[test]
fn test_encode_temperature_half_degree_rounding() {
    let base = example_frame();

    let next = command::encode(&base, &FieldEdit::TargetTemperature(61.3));
    assert_eq!(next.target_half_degrees(), 123);
    assert_eq!(next.decode().target_temperature, 61.5);
}

#[test]
fn test_encode_temperature_clamps() {
    let base = example_frame();

    let hot = command::encode(&base, &FieldEdit::TargetTemperature(120.0));
    assert_eq!(hot.decode().target_temperature, 100.0);

    let cold = command::encode(&base, &FieldEdit::TargetTemperature(-5.0));
    assert_eq!(cold.decode().target_temperature, 0.0);
}

#[test]
fn test_encode_hold_time_clamps() {
    let base = example_frame();

    let next = command::encode(&base, &FieldEdit::HoldTime(90));
    assert_eq!(next.hold_time, 60);
    assert_eq!(next.decode().hold_time_minutes, 60);

    let next = command::encode(&base, &FieldEdit::HoldTime(0));
    assert_eq!(next.hold_time, 0);
}

#[test]
fn test_encode_preserves_unrelated_bytes() {
    let base = example_frame();
    let next = command::encode(&base, &FieldEdit::TargetTemperature(80.0));

    // Codec never advances the counter; that is the sequencer's job.
    assert_eq!(next.counter, base.counter);
    assert_eq!(next.chime_volume, base.chime_volume);
    assert_eq!(next.clock_mode, base.clock_mode);
    assert_eq!(next.language, base.language);
    assert_eq!(next.schedule_temp, base.schedule_temp);
}

#[test]
fn test_encode_preserves_temp_high_byte() {
    // Same frame but with a nonzero high byte in the target temp field
    let base = frame_from_hex("08026400c8018c001e06000c000f020108");
    assert_eq!(base.target_temp.get(), 0x01C8);

    let next = command::encode(&base, &FieldEdit::TargetTemperature(80.0));
    assert_eq!(next.target_half_degrees(), 160);
    assert_eq!(next.target_temp.get(), 0x01A0);
    // Decode only reads the low byte
    assert_eq!(next.decode().target_temperature, 80.0);
}

#[test]
fn test_encode_is_idempotent() {
    let base = example_frame();
    let edit = FieldEdit::Schedule {
        mode: ScheduleMode::Daily,
        hour: 7,
        minute: 45,
        temperature_celsius: 85.0,
    };

    let once = command::encode(&base, &edit);
    let twice = command::encode(&base, &edit);
    assert_eq!(once, twice);
}

#[test]
fn test_encode_schedule_off() {
    let base = example_frame();
    let next = command::encode(
        &base,
        &FieldEdit::Schedule {
            mode: ScheduleMode::Off,
            hour: 0,
            minute: 0,
            temperature_celsius: 0.0,
        },
    );

    assert!(!next.status().schedule_enabled());
    assert_eq!(next.schedule_half_degrees(), 0xC0);
    assert_eq!(next.schedule_hours, 0);
    assert_eq!(next.schedule_minutes, 0);
    assert_eq!(next.decode().schedule.mode, ScheduleMode::Off);
}

#[tokio::test]
async fn test_set_hold_time_advances_counter() {
    let kettle = Kettle::new(MockTransport::new(example_frame())).await.unwrap();

    let state = kettle.set_hold_time(45).await.unwrap();
    assert_eq!(state.hold_time_minutes, 45);
    // counter 0x08 -> 0x09; bit 0x08 still set, submode stays "once"
    assert_eq!(kettle.current_frame().await.counter, 0x09);
    assert_eq!(state.schedule.mode, ScheduleMode::Once);

    let writes = kettle.transport().written();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0][16], 0x09);
}

#[tokio::test]
async fn test_counter_increment_flips_submode() {
    // Counter 0x0F: schedule decodes as "once". The increment to 0x10 clears
    // bit 0x08, silently flipping the submode to "daily" on an unrelated
    // write. Wire-compatible behavior, intentional or not.
    let mut initial = example_frame();
    initial.counter = 0x0F;
    assert_eq!(initial.decode().schedule.mode, ScheduleMode::Once);

    let kettle = Kettle::new(MockTransport::new(initial)).await.unwrap();
    let state = kettle.set_hold_time(45).await.unwrap();

    assert_eq!(kettle.current_frame().await.counter, 0x10);
    assert_eq!(state.schedule.mode, ScheduleMode::Daily);
}

#[tokio::test]
async fn test_counter_wraps_at_255() {
    let mut initial = example_frame();
    initial.counter = 0xFF;

    let kettle = Kettle::new(MockTransport::new(initial)).await.unwrap();
    kettle.set_temperature(90.0).await.unwrap();

    assert_eq!(kettle.current_frame().await.counter, 0x00);
}

#[tokio::test]
async fn test_schedule_once_clobbered_by_counter_advance() {
    // Requesting "once" writes counter bit 0x08, but the generic advance
    // starts from the previous counter byte and overwrites it: from 0x00 the
    // outgoing counter is 0x01 and the device sees "daily".
    let mut initial = example_frame();
    initial.status_flags = 0x00;
    initial.counter = 0x00;

    let kettle = Kettle::new(MockTransport::new(initial)).await.unwrap();
    let state = kettle
        .set_schedule(ScheduleMode::Once, 6, 30, 70.0)
        .await
        .unwrap();

    assert_eq!(kettle.current_frame().await.counter, 0x01);
    assert_eq!(state.schedule.mode, ScheduleMode::Daily);
    assert_eq!(state.schedule.hour, 6);
    assert_eq!(state.schedule.minute, 30);
    assert_eq!(state.schedule.temperature_celsius, 70.0);
}

#[tokio::test]
async fn test_shadow_submode_policy_keeps_requested_mode() {
    let mut initial = example_frame();
    initial.status_flags = 0x00;
    initial.counter = 0x00;

    let kettle = Kettle::with_policy(MockTransport::new(initial), CounterPolicy::ShadowSubmode)
        .await
        .unwrap();

    let state = kettle
        .set_schedule(ScheduleMode::Once, 6, 30, 70.0)
        .await
        .unwrap();
    assert_eq!(state.schedule.mode, ScheduleMode::Once);
    assert_eq!(kettle.current_frame().await.counter, 0x09);

    // Unrelated writes keep re-asserting the requested submode
    let state = kettle.set_hold_time(30).await.unwrap();
    assert_eq!(state.schedule.mode, ScheduleMode::Once);
    assert_eq!(kettle.current_frame().await.counter, 0x0A);
}

#[tokio::test]
async fn test_shadow_submode_policy_daily() {
    // Inverse hazard: from counter 0x07 the advance sets bit 0x08, turning a
    // requested "daily" into "once" on the wire. The shadow policy clears it.
    let mut initial = example_frame();
    initial.counter = 0x07;

    let kettle = Kettle::with_policy(MockTransport::new(initial), CounterPolicy::ShadowSubmode)
        .await
        .unwrap();
    let state = kettle
        .set_schedule(ScheduleMode::Daily, 7, 0, 85.0)
        .await
        .unwrap();

    assert_eq!(state.schedule.mode, ScheduleMode::Daily);
    assert_eq!(kettle.current_frame().await.counter, 0x00);
}

#[tokio::test]
async fn test_failed_write_keeps_previous_frame() {
    let kettle = Kettle::new(MockTransport::failing(example_frame()))
        .await
        .unwrap();

    let err = kettle.set_hold_time(45).await.unwrap_err();
    match err {
        WriteError::TransportRejected { frame, .. } => {
            // The attempted frame carried the advanced counter...
            assert_eq!(frame.counter, 0x09);
            assert_eq!(frame.hold_time, 45);
        }
        other => panic!("expected TransportRejected, got {other:?}"),
    }

    // ...but the session still holds the original
    let current = kettle.current_frame().await;
    assert_eq!(current, example_frame());
}

#[tokio::test]
async fn test_notification_replaces_current_frame() {
    let kettle = Kettle::new(MockTransport::new(example_frame())).await.unwrap();

    // Device pushes new state after physical dial use: 91.5 °C, hold 30 min
    let pushed = frame_from_hex("08026400b7008c001e06000c001e020108");
    let state = kettle.on_notification(pushed.as_bytes()).await.unwrap();

    assert_eq!(state.target_temperature, 91.5);
    assert_eq!(state.hold_time_minutes, 30);
    assert_eq!(kettle.current_frame().await, pushed);
}

#[tokio::test]
async fn test_notification_rejects_malformed_frame() {
    let kettle = Kettle::new(MockTransport::new(example_frame())).await.unwrap();

    let err = kettle.on_notification(&[0u8; 20]).await.unwrap_err();
    assert!(matches!(err, DecodeError::InvalidLength { actual: 20 }));
    // Current frame untouched
    assert_eq!(kettle.current_frame().await, example_frame());
}

#[tokio::test]
async fn test_writes_are_strictly_ordered() {
    let kettle = Kettle::new(MockTransport::new(example_frame())).await.unwrap();

    kettle.set_temperature(95.0).await.unwrap();
    kettle.set_hold_time(20).await.unwrap();
    kettle.set_temperature(85.0).await.unwrap();

    let counters: Vec<u8> = kettle.transport().written().iter().map(|w| w[16]).collect();
    assert_eq!(counters, vec![0x09, 0x0A, 0x0B]);
}
