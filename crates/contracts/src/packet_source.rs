//! PacketSource trait - upstream producer abstraction
//!
//! A camera stream and a motion detector both push [`Packet`]s through a
//! callback. The recording core only consumes these callbacks; it never
//! drives the producers.

use std::sync::Arc;

use crate::Packet;

/// Packet callback type
///
/// Uses `Arc` so the same callback can be shared by several producer threads.
pub type PacketCallback = Arc<dyn Fn(Packet) + Send + Sync>;

/// Producer of packets (raw video or motion flags)
///
/// # Example
///
/// ```ignore
/// let source: Box<dyn PacketSource> = Box::new(camera);
/// source.listen(handler.input_port().callback());
/// // ...
/// source.stop();
/// ```
pub trait PacketSource: Send + Sync {
    /// Source name
    fn name(&self) -> &str;

    /// Register callback and start producing
    ///
    /// Repeated calls while already listening are ignored.
    fn listen(&self, callback: PacketCallback);

    /// Stop producing
    fn stop(&self);

    /// Check if currently listening
    fn is_listening(&self) -> bool;
}
