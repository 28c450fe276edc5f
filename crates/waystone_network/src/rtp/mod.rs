//! Random-teleport helpers shared by the RTP handlers and the outbound API.

pub mod tracker;

pub use tracker::{PendingRtpRequest, RtpRequestTracker};

use crate::types::Position;
use rand::Rng;

/// Horizontal spread of API batch candidates around their anchor.
pub const RANDOMIZATION_RADIUS: f64 = 15.0;

/// A position uniformly offset from `anchor` on x and z by at most
/// [`RANDOMIZATION_RADIUS`], keeping its height, world and server.
pub fn randomize_around(anchor: &Position) -> Position {
    randomize_around_with(anchor, &mut rand::thread_rng())
}

/// [`randomize_around`] with a caller-supplied random source.
pub fn randomize_around_with<R: Rng + ?Sized>(anchor: &Position, rng: &mut R) -> Position {
    let x = anchor.x + rng.gen_range(-1.0..=1.0) * RANDOMIZATION_RADIUS;
    let z = anchor.z + rng.gen_range(-1.0..=1.0) * RANDOMIZATION_RADIUS;
    Position::at(x, anchor.y, z, anchor.world.clone(), anchor.server.clone())
}
