//! Participant capability
//!
//! The one thing a room needs from a member: a way to hand it a message.
//! Keeping this a trait means the room never touches socket details and
//! tests can join in-memory fakes.

use crate::types::SessionId;

/// A room member that can receive delivered messages.
///
/// `deliver` is fire-and-forget: it must never block the caller and
/// reports no error back to the room. A participant that cannot accept
/// the message (queue full, already closing) handles that itself.
pub trait Participant: Send + Sync {
    /// Identity used for room membership
    fn id(&self) -> SessionId;

    /// Hand a message to this participant.
    ///
    /// Called with the room lock held, so implementations must not
    /// call back into the room.
    fn deliver(&self, msg: &str);
}
