//! The crawl frontier: pending addresses plus the set already dispatched
//!
//! Pending addresses are served LIFO, so the most recently discovered link
//! is crawled next. An address enters the pending sequence only if it is a
//! valid crawl target that is neither pending nor seen, and popping for
//! dispatch marks it seen in the same step.

use crate::url::is_valid_crawl_target;
use std::collections::HashSet;

/// Outcome of pushing an address onto the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// The address was appended to the pending sequence
    Queued,
    /// The address has already been dispatched
    AlreadySeen,
    /// The address is already waiting in the pending sequence
    AlreadyPending,
    /// The address is not an absolute http(s) crawl target
    Invalid,
}

/// Outcome of claiming the next address for dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// A fresh address, now marked seen
    Fresh(String),
    /// The popped address had already been dispatched
    AlreadySeen(String),
    /// Nothing is pending
    Empty,
}

/// Pending-work stack plus seen-set
#[derive(Debug, Default)]
pub struct Frontier {
    pending: Vec<String>,
    pending_set: HashSet<String>,
    seen: HashSet<String>,
}

impl Frontier {
    /// Creates an empty frontier
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an address to the pending sequence
    ///
    /// No-op (reported through the outcome) if the address is invalid,
    /// already seen, or already pending.
    pub fn push(&mut self, address: &str) -> PushOutcome {
        if !is_valid_crawl_target(address) {
            return PushOutcome::Invalid;
        }
        if self.seen.contains(address) {
            return PushOutcome::AlreadySeen;
        }
        if !self.pending_set.insert(address.to_string()) {
            return PushOutcome::AlreadyPending;
        }
        self.pending.push(address.to_string());
        PushOutcome::Queued
    }

    /// Removes and returns the most recently pushed address
    pub fn pop(&mut self) -> Option<String> {
        let address = self.pending.pop()?;
        self.pending_set.remove(&address);
        Some(address)
    }

    /// Pops the next address and marks it seen in one step
    pub fn claim(&mut self) -> Claim {
        match self.pop() {
            None => Claim::Empty,
            Some(address) => {
                if self.seen.insert(address.clone()) {
                    Claim::Fresh(address)
                } else {
                    Claim::AlreadySeen(address)
                }
            }
        }
    }

    /// Adds an address to the seen-set; idempotent
    pub fn mark_seen(&mut self, address: &str) {
        self.seen.insert(address.to_string());
    }

    /// Returns a claimed address to the pending sequence unvisited
    ///
    /// Used when a dispatched worker aborts before fetching. The address
    /// leaves the seen-set and goes back on top of the stack.
    pub fn release(&mut self, address: &str) -> PushOutcome {
        self.seen.remove(address);
        self.push(address)
    }

    /// Returns whether an address has been dispatched
    pub fn is_seen(&self, address: &str) -> bool {
        self.seen.contains(address)
    }

    /// Number of addresses waiting to be crawled
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Returns whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of addresses dispatched so far
    pub fn seen_len(&self) -> usize {
        self.seen.len()
    }

    /// Clears the seen-set at crawl teardown
    pub fn clear_seen(&mut self) {
        self.seen.clear();
    }
}
