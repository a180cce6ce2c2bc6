//! The dealer's view of its players: one registration channel, one
//! broadcast channel and one inbox that every reply lands in.

use log::{debug, info, warn};
use std::time::{Duration, Instant};

use super::{
    errors::{Result, TransportError},
    messages::{MoveReply, ServerMessage},
};
use crate::game::entities::Player;

/// Something a player sent the dealer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Inbound {
    Register { name: Option<String> },
    Move(MoveReply),
    /// A message that didn't decode, with a description of what was wrong.
    Malformed(String),
    /// A peer went away. Carries whatever identifies it to the transport.
    Disconnected(String),
}

pub trait Transport {
    /// Block until the next registration attempt arrives. The transport
    /// holds on to whoever sent it until it's confirmed or rejected.
    ///
    /// # Errors
    ///
    /// Fails when the transport can never produce another attempt.
    fn accept_registration(&mut self) -> Result<Inbound>;

    /// Tell the pending registrant who they are and add them to every
    /// future broadcast.
    ///
    /// # Errors
    ///
    /// Fails when no registration is pending or the reply can't be sent.
    fn confirm_registration(&mut self, player: &Player) -> Result<()>;

    /// Refuse the pending registrant and forget them.
    ///
    /// # Errors
    ///
    /// Fails when no registration is pending.
    fn reject_registration(&mut self, reason: &str) -> Result<()>;

    /// Send `msg` to every registered player. Delivery is best effort.
    ///
    /// # Errors
    ///
    /// Fails only if the message can't be encoded.
    fn broadcast(&mut self, msg: &ServerMessage) -> Result<()>;

    /// Next inbound message, waiting at most `timeout` (forever if `None`).
    /// `Ok(None)` means the wait expired.
    ///
    /// # Errors
    ///
    /// Fails when nothing can ever arrive again.
    fn recv(&mut self, timeout: Option<Duration>) -> Result<Option<Inbound>>;
}

/// Wait for the first move reply accepted by `is_expected`, discarding
/// everything else. Returns `None` if `timeout` runs out first.
///
/// Registration attempts that show up mid-game are turned away. One the
/// transport can't answer is dropped.
///
/// # Errors
///
/// Propagates transport failures.
pub fn await_reply<T, F>(
    transport: &mut T,
    timeout: Option<Duration>,
    mut is_expected: F,
) -> Result<Option<MoveReply>>
where
    T: Transport + ?Sized,
    F: FnMut(&MoveReply) -> bool,
{
    let deadline = timeout.map(|timeout| Instant::now() + timeout);
    loop {
        let remaining = match deadline {
            Some(deadline) => match deadline.checked_duration_since(Instant::now()) {
                Some(remaining) => Some(remaining),
                None => return Ok(None),
            },
            None => None,
        };

        match transport.recv(remaining)? {
            None => return Ok(None),
            Some(Inbound::Move(reply)) if is_expected(&reply) => return Ok(Some(reply)),
            Some(Inbound::Move(reply)) => debug!("discarding out-of-turn reply: {reply}"),
            Some(Inbound::Register { name }) => {
                warn!(
                    "turning away registration from {} mid-game",
                    name.as_deref().unwrap_or("anonymous player")
                );
                match transport.reject_registration("tournament already started") {
                    Ok(()) | Err(TransportError::NoPendingRegistration) => {}
                    Err(error) => return Err(error),
                }
            }
            Some(Inbound::Malformed(reason)) => warn!("discarding malformed message: {reason}"),
            Some(Inbound::Disconnected(peer)) => info!("{peer} disconnected"),
        }
    }
}
