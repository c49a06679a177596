//! Counter ratchet
//!
//! A request/response round between two holders of the same counter `c`:
//! the requester presents `c + 1`, the verifier accepts it, moves to `c + 2`
//! and answers with that value, and the requester accepts the answer because
//! it is its own presented value plus one. Both sides end on `c + 2`.
//!
//! Counters wrap on overflow.

/// Counter discipline shared by authentication and reconnection exchanges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ratchet {
    counter: u32,
}

impl Ratchet {
    pub const fn new(counter: u32) -> Self {
        Self { counter }
    }

    pub const fn counter(&self) -> u32 {
        self.counter
    }

    /// Value the peer must present next
    pub const fn expected(&self) -> u32 {
        self.counter.wrapping_add(1)
    }

    /// Requester side: step by one and return the value to present
    pub fn advance(&mut self) -> u32 {
        self.counter = self.counter.wrapping_add(1);
        self.counter
    }

    /// Verifier side: accept `presented` iff it equals `counter + 1`,
    /// then step by two and return the answer
    pub fn verify(&mut self, presented: u32) -> Option<u32> {
        if presented != self.expected() {
            return None;
        }
        self.counter = self.counter.wrapping_add(2);
        Some(self.counter)
    }

    /// Requester side: accept the verifier's answer iff it is one past the
    /// presented value, and adopt it
    pub fn confirm(&mut self, answer: u32) -> bool {
        if answer != self.expected() {
            return false;
        }
        self.counter = answer;
        true
    }
}
