//! Actor interface
//!
//! The driver takes the pending message out of an actor's mailbox slot and
//! hands it to [`Actor::handle`]. The actor posts at most one new message and
//! reports the hop category and any final outcome through [`Step`].

use baron_core::{ActorId, Link, Mailbox, Message, Step};
use rand::RngCore;

use crate::error::{HandoverError, HandoverResult};

/// A protocol participant
pub trait Actor {
    /// Mailbox address
    fn id(&self) -> ActorId;

    /// Consume `msg` and emit the response, if any
    fn handle(
        &mut self,
        mailbox: &mut Mailbox,
        msg: Message,
        rng: &mut dyn RngCore,
    ) -> HandoverResult<Step>;
}

/// Post `msg` from `from` to `to` and report the hop
pub(crate) fn send(
    mailbox: &mut Mailbox,
    from: ActorId,
    to: ActorId,
    msg: Message,
) -> HandoverResult<Step> {
    log::debug!("{} -> {}: {}", from, to, msg);
    mailbox.post(to, msg)?;
    Ok(Step::sent(Link::between(from, to)))
}

/// Error for a message the actor has no handler for in `state`
pub(crate) fn unexpected(actor: ActorId, msg: &Message, state: &'static str) -> HandoverError {
    log::error!("{}: unexpected {} in state {}", actor, msg.msg_type(), state);
    HandoverError::UnexpectedMessage {
        actor,
        message: msg.msg_type(),
        state,
    }
}
