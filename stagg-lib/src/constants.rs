// Protocol constants for the Stagg EKG configuration characteristic

/// Size of the configuration state frame (17 bytes)
pub const FRAME_SIZE: usize = 17;

/// Bit in the counter byte that selects the "once" schedule submode.
///
/// The device aliases this bit onto the write sequence counter, so a plain
/// counter increment can flip it. See [`crate::session::CounterPolicy`].
pub const COUNTER_SUBMODE_ONCE: u8 = 0x08;

/// Sentinel written to the schedule temperature byte when the schedule is off
pub const SCHEDULE_TEMP_OFF: u8 = 0xC0;

/// Upper bound for the target temperature, in Celsius
pub const TARGET_TEMP_MAX_C: f32 = 100.0;

/// Upper bound for the hold time, in minutes
pub const HOLD_TIME_MAX_MINUTES: u8 = 60;

/// UUID of the main configuration characteristic
pub const MAIN_CONFIG_UUID: &str = "2291c4b5-5d7f-4477-a88b-b266edb97142";

/// Parent services that may host the configuration characteristic, in the
/// priority order the firmware variants expose them
pub const CANDIDATE_SERVICE_UUIDS: [&str; 4] = [
    "7aebf330-6cb1-46e4-b23b-7cc2262c605e",
    "b4df5a1c-3f6b-f4bf-ea4a-820304901a02",
    "00001820-0000-1000-8000-00805f9b34fb",
    MAIN_CONFIG_UUID,
];

/// Advertised name prefixes used to pick the kettle out of a scan
pub const KETTLE_NAME_PREFIXES: [&str; 3] = ["Stagg", "Fellow", "EKG"];
