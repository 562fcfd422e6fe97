//! # Motion Engine
//!
//! Motion-triggered recording decisions for one video packet stream.
//!
//! Raw packets are kept in a pre-roll buffer bounded by time. Motion flags
//! arrive out of band and are merged into buffered packets by `seq`. A
//! single engine thread feeds a sliding window with the motion bit of every
//! new packet and forwards packets to a [`contracts::PacketSink`] while the
//! motion percentage holds the session open.
//!
//! ## Usage
//!
//! ```ignore
//! use motion_engine::MotionHandler;
//!
//! let handler = MotionHandler::spawn("front-door", config, Box::new(sink))?;
//! let raw = handler.input_port();
//! let flags = handler.flag_port();
//!
//! raw.push(packet);                         // from the camera
//! flags.push(Packet::motion_flag(seq, on)); // from the detector
//!
//! let status = handler.destroy()?;
//! ```

mod buffer;
mod engine;
mod error;
mod handler;
mod ports;
mod window;

pub use buffer::{PacketBuffer, SeqLookup};
pub use engine::{
    EngineStats, PassOutcome, RecordingEngine, RecordingSession, RecordingState, Transition,
};
pub use error::MotionError;
pub use handler::{HandlerStatus, MotionHandler};
pub use ports::{FlagMergePort, PortStats, RawInputPort};
pub use window::MotionWindow;

pub use contracts::{MotionConfig, Packet, PacketFlags, PacketSink};
