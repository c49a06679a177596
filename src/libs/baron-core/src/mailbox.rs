//! Mailbox bus
//!
//! One delivery slot per actor identity. A slot holds at most one undelivered
//! message; posting into an occupied slot is an error rather than an overwrite.

use std::collections::BTreeMap;

use crate::error::{MailboxError, MailboxResult};
use crate::message::Message;
use crate::types::ActorId;

/// Single-message slots keyed by actor identity
#[derive(Debug, Clone, Default)]
pub struct Mailbox {
    slots: BTreeMap<ActorId, Message>,
    delivered: u64,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `msg` in the slot of `to`
    pub fn post(&mut self, to: ActorId, msg: Message) -> MailboxResult<()> {
        if self.slots.contains_key(&to) {
            return Err(MailboxError::SlotOccupied(to));
        }
        log::trace!("mailbox: {} -> {}", msg, to);
        self.slots.insert(to, msg);
        Ok(())
    }

    /// Remove and return the message waiting for `id`
    pub fn take(&mut self, id: ActorId) -> MailboxResult<Message> {
        let msg = self.slots.remove(&id).ok_or(MailboxError::EmptySlot(id))?;
        self.delivered += 1;
        Ok(msg)
    }

    pub fn peek(&self, id: ActorId) -> Option<&Message> {
        self.slots.get(&id)
    }

    pub fn is_occupied(&self, id: ActorId) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn occupied_count(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// First occupied slot in dispatch order
    pub fn next_occupied(&self) -> Option<ActorId> {
        self.slots.keys().next().copied()
    }

    /// Occupied slots in dispatch order
    pub fn occupied(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.slots.keys().copied()
    }

    /// Total number of messages taken so far
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
