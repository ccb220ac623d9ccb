use crate::error::TransportError;
use bytes::Bytes;
use tokio::sync::mpsc;

/// Byte pipe to the main configuration characteristic.
///
/// The session only needs "bytes in, bytes out" from its collaborator: a
/// direct read, an acknowledged write, and a notification stream. Service
/// discovery, pairing and reconnect policy all live behind this seam.
pub trait Transport {
    /// Read the current characteristic value.
    fn read(&self) -> impl Future<Output = Result<Bytes, TransportError>> + Send;

    /// Write a frame and wait for the device to acknowledge it. The counter
    /// protocol is only meaningful with acknowledged writes.
    fn write(&self, frame: &[u8]) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Subscribe to unsolicited value notifications.
    fn subscribe(
        &self,
    ) -> impl Future<Output = Result<mpsc::Receiver<Bytes>, TransportError>> + Send;
}
