pub mod ble;
pub mod command;
pub mod constants;
pub mod error;
pub mod frame;
pub mod session;
pub mod state;
pub mod transport;

#[cfg(test)]
mod tests;

// Re-export the session and state types for easy access
pub use command::FieldEdit;
pub use error::{DecodeError, KettleError, TransportError, WriteError};
pub use frame::RawFrame;
pub use session::{CounterPolicy, Kettle};
pub use state::{KettleState, Schedule, ScheduleMode, Units};
pub use transport::Transport;
