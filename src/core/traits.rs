//! The transport interface the protocol engine drives.

use std::io;
use std::time::Duration;

/// A byte-oriented, half-duplex channel to the device.
///
/// Implementations wrap whatever carries the bytes (typically a serial
/// port at 115200 8N1). The driver never opens, configures or closes the
/// channel; it only writes request frames and reads response bytes.
///
/// # Requirements
///
/// - `write` MUST transmit the whole buffer or fail.
/// - `read` blocks until at least one byte is available and MAY return
///   fewer than `n` bytes.
/// - `bytes_available` MUST NOT block.
///
/// # Example
///
/// ```
/// use std::io;
/// use std::time::Duration;
/// use minihsm::core::traits::Transport;
///
/// struct LoopbackPort {
///     pending: Vec<u8>,
///     timeout: Duration,
/// }
///
/// impl Transport for LoopbackPort {
///     fn write(&mut self, data: &[u8]) -> io::Result<()> {
///         self.pending.extend_from_slice(data);
///         Ok(())
///     }
///
///     fn read(&mut self, n: usize) -> io::Result<Vec<u8>> {
///         let n = n.min(self.pending.len());
///         Ok(self.pending.drain(..n).collect())
///     }
///
///     fn bytes_available(&mut self) -> io::Result<usize> {
///         Ok(self.pending.len())
///     }
///
///     fn drain(&mut self) -> io::Result<()> {
///         self.pending.clear();
///         Ok(())
///     }
///
///     fn timeout(&self) -> Duration {
///         self.timeout
///     }
///
///     fn set_timeout(&mut self, timeout: Duration) {
///         self.timeout = timeout;
///     }
/// }
/// ```
pub trait Transport: Send {
    /// Transmit `data` to the device in one piece.
    fn write(&mut self, data: &[u8]) -> io::Result<()>;

    /// Read up to `n` bytes; may return fewer.
    fn read(&mut self, n: usize) -> io::Result<Vec<u8>>;

    /// Number of bytes ready to read without blocking.
    fn bytes_available(&mut self) -> io::Result<usize>;

    /// Discard any pending inbound bytes.
    fn drain(&mut self) -> io::Result<()>;

    /// Configured response timeout. Zero means "use the engine default".
    fn timeout(&self) -> Duration;

    /// Set the response timeout for subsequent commands.
    fn set_timeout(&mut self, timeout: Duration);
}
