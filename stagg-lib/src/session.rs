use crate::command::{self, FieldEdit};
use crate::constants::COUNTER_SUBMODE_ONCE;
use crate::error::{DecodeError, KettleError, TransportError, WriteError};
use crate::frame::RawFrame;
use crate::state::{KettleState, ScheduleMode};
use crate::transport::Transport;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use zerocopy::IntoBytes;

/// How the sequencer treats the schedule submode bit aliased into the
/// counter byte.
///
/// The wire protocol stores once/daily in bit 0x08 of the write counter, so
/// the unconditional per-write increment can flip the submode as a side
/// effect of an unrelated edit. `WireCompatible` reproduces that behavior
/// exactly as the device firmware sees it today. `ShadowSubmode` keeps the
/// last requested submode in a counter-independent field and re-asserts the
/// bit after every increment; it is the candidate fix, kept isolated until
/// confirmed against real device behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CounterPolicy {
    #[default]
    WireCompatible,
    ShadowSubmode,
}

struct SequencerState {
    current: RawFrame,
    // Last submode explicitly requested through a schedule edit; None until
    // one happens or after the schedule is turned off.
    shadow_once: Option<bool>,
}

/// A connected kettle session: the last-known frame plus the write sequencer.
///
/// All mutations of the current frame (local writes and inbound
/// notifications) are serialized through one mutex, held across the
/// acknowledged write so counters leave this session strictly ordered.
pub struct Kettle<T: Transport> {
    transport: T,
    state: Mutex<SequencerState>,
    policy: CounterPolicy,
}

impl<T: Transport> Kettle<T> {
    /// Create a session by reading the initial frame from the transport.
    pub async fn new(transport: T) -> Result<Self, KettleError> {
        Self::with_policy(transport, CounterPolicy::default()).await
    }

    pub async fn with_policy(transport: T, policy: CounterPolicy) -> Result<Self, KettleError> {
        let bytes = transport.read().await?;
        let current = RawFrame::parse(&bytes)?;
        info!(counter = current.counter, "session established");
        Ok(Self {
            transport,
            state: Mutex::new(SequencerState {
                current,
                shadow_once: None,
            }),
            policy,
        })
    }

    /// Snapshot of the decoded current state.
    pub async fn state(&self) -> KettleState {
        self.state.lock().await.current.decode()
    }

    /// Snapshot of the current raw frame.
    pub async fn current_frame(&self) -> RawFrame {
        self.state.lock().await.current
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Apply one edit: encode from the current frame, advance the counter,
    /// submit with acknowledgment, and promote the new frame on success.
    ///
    /// On failure the previous frame stays authoritative and the attempted
    /// frame is returned inside the error.
    pub async fn apply(&self, edit: FieldEdit) -> Result<KettleState, WriteError> {
        let mut guard = self.state.lock().await;
        let mut next = command::encode(&guard.current, &edit);

        if let FieldEdit::Schedule { mode, .. } = edit {
            guard.shadow_once = match mode {
                ScheduleMode::Off => None,
                ScheduleMode::Once => Some(true),
                ScheduleMode::Daily => Some(false),
            };
        }

        // The advance starts from the current counter byte, so it overwrites
        // whatever the codec just did to the submode bit and may carry into
        // it. That is the wire behavior; ShadowSubmode re-asserts the bit.
        next.counter = guard.current.counter.wrapping_add(1);
        if self.policy == CounterPolicy::ShadowSubmode {
            if let Some(once) = guard.shadow_once {
                if once {
                    next.counter |= COUNTER_SUBMODE_ONCE;
                } else {
                    next.counter &= !COUNTER_SUBMODE_ONCE;
                }
            }
        }

        match self.transport.write(next.as_bytes()).await {
            Ok(()) => {
                debug!(counter = next.counter, ?edit, "frame written");
                guard.current = next;
                Ok(next.decode())
            }
            Err(TransportError::Timeout(_)) => {
                warn!(counter = next.counter, "write timed out, keeping previous frame");
                Err(WriteError::Timeout { frame: next })
            }
            Err(source) => {
                warn!(counter = next.counter, %source, "write rejected, keeping previous frame");
                Err(WriteError::TransportRejected {
                    frame: next,
                    source,
                })
            }
        }
    }

    /// Set the target temperature in Celsius (clamped to [0, 100]).
    pub async fn set_temperature(&self, celsius: f32) -> Result<KettleState, WriteError> {
        self.apply(FieldEdit::TargetTemperature(celsius)).await
    }

    /// Set the hold time in minutes (clamped to [0, 60]).
    pub async fn set_hold_time(&self, minutes: u8) -> Result<KettleState, WriteError> {
        self.apply(FieldEdit::HoldTime(minutes)).await
    }

    /// Configure the schedule. Hour and minute are written as given.
    pub async fn set_schedule(
        &self,
        mode: ScheduleMode,
        hour: u8,
        minute: u8,
        temperature_celsius: f32,
    ) -> Result<KettleState, WriteError> {
        self.apply(FieldEdit::Schedule {
            mode,
            hour,
            minute,
            temperature_celsius,
        })
        .await
    }

    /// Handle an unsolicited frame pushed by the device, e.g. after someone
    /// turns the physical dial. The device is authoritative: the frame
    /// replaces the current one unconditionally, last writer wins.
    pub async fn on_notification(&self, bytes: &[u8]) -> Result<KettleState, DecodeError> {
        let frame = RawFrame::parse(bytes)?;
        let mut guard = self.state.lock().await;
        debug!(counter = frame.counter, "notification replaced current frame");
        guard.current = frame;
        Ok(frame.decode())
    }
}
