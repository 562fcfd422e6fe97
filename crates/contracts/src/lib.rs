//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - `pts` (codec clock, signed) drives motion analysis
//! - `ts_monotonic` (seconds) drives pre-roll trimming and post-roll timing
//! - `seq` is the only ordering/identity key; `seq = 0` is the sentinel

mod blueprint;
mod error;
mod motion_config;
mod packet;
mod packet_source;
mod segment;
mod sink;

pub use blueprint::*;
pub use error::*;
pub use motion_config::*;
pub use packet::*;
pub use packet_source::{PacketCallback, PacketSource};
pub use segment::*;
pub use sink::*;
