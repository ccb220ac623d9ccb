use crate::constants::FRAME_SIZE;
use crate::frame::RawFrame;
use thiserror::Error;

/// Errors produced when turning raw characteristic bytes into a frame.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("invalid frame length: expected {FRAME_SIZE} bytes, got {actual}")]
    InvalidLength { actual: usize },
}

/// Errors surfaced by the byte transport underneath the session.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("no Bluetooth adapter found")]
    AdapterNotFound,

    #[error("no kettle found. Is the Stagg EKG powered on and in range?")]
    DeviceNotFound,

    #[error("main configuration characteristic not found on any candidate service")]
    CharacteristicNotFound,

    #[error("transport is not connected")]
    NotConnected,

    #[error("BLE error: {0}")]
    Ble(#[from] btleplug::Error),

    #[error("timeout waiting for the device: {0}")]
    Timeout(#[from] tokio::time::error::Elapsed),
}

/// A failed or unacknowledged frame write.
///
/// Both variants carry the frame that was attempted so callers can log the
/// exact bytes; the session's current frame is never mutated on failure.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("write rejected by transport: {source}")]
    TransportRejected {
        frame: RawFrame,
        source: TransportError,
    },

    #[error("write timed out waiting for acknowledgment")]
    Timeout { frame: RawFrame },
}

impl WriteError {
    /// The frame whose write failed.
    pub fn attempted_frame(&self) -> &RawFrame {
        match self {
            WriteError::TransportRejected { frame, .. } => frame,
            WriteError::Timeout { frame } => frame,
        }
    }
}

/// The primary error type for the `stagg-lib` library.
#[derive(Error, Debug)]
pub enum KettleError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Write(#[from] WriteError),
}
