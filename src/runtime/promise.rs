//! Promise registry
//!
//! A promise handle is the correlation key between a task that suspends in
//! `promise_await` and whoever settles the promise later. Settlement is
//! one-way: a settled promise never changes again.

use std::fmt;
use thiserror::Error;

/// Promise handle as seen by generated code (`i32`); `0` is never issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PromiseHandle(pub u32);

impl fmt::Display for PromiseHandle {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "Promise({})", self.0)
    }
}

/// Promise state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromiseState {
    Pending,
    Resolved(i64),
    Rejected(i64),
}

impl PromiseState {
    #[inline]
    pub fn is_settled(&self) -> bool {
        !matches!(self, PromiseState::Pending)
    }
}

/// Promise errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PromiseError {
    #[error("unknown promise handle {0}")]
    UnknownHandle(PromiseHandle),

    #[error("{0} is already settled")]
    AlreadySettled(PromiseHandle),
}

#[derive(Debug)]
struct Entry<W> {
    state: PromiseState,
    waiters: Vec<W>,
}

/// All promises of one running module, with the waiters parked on each
#[derive(Debug)]
pub struct PromiseRegistry<W> {
    entries: Vec<Entry<W>>,
}

impl<W> Default for PromiseRegistry<W> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<W> PromiseRegistry<W> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a pending promise
    pub fn create(&mut self) -> PromiseHandle {
        self.entries.push(Entry {
            state: PromiseState::Pending,
            waiters: Vec::new(),
        });
        PromiseHandle(self.entries.len() as u32)
    }

    fn entry(
        &self,
        handle: PromiseHandle,
    ) -> Result<&Entry<W>, PromiseError> {
        (handle.0 as usize)
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
            .ok_or(PromiseError::UnknownHandle(handle))
    }

    fn entry_mut(
        &mut self,
        handle: PromiseHandle,
    ) -> Result<&mut Entry<W>, PromiseError> {
        (handle.0 as usize)
            .checked_sub(1)
            .and_then(|i| self.entries.get_mut(i))
            .ok_or(PromiseError::UnknownHandle(handle))
    }

    pub fn state(
        &self,
        handle: PromiseHandle,
    ) -> Result<PromiseState, PromiseError> {
        self.entry(handle).map(|e| e.state)
    }

    /// Settle with a value; returns the waiters to wake
    pub fn resolve(
        &mut self,
        handle: PromiseHandle,
        value: i64,
    ) -> Result<Vec<W>, PromiseError> {
        self.settle(handle, PromiseState::Resolved(value))
    }

    /// Settle with an error value; returns the waiters to wake
    pub fn reject(
        &mut self,
        handle: PromiseHandle,
        value: i64,
    ) -> Result<Vec<W>, PromiseError> {
        self.settle(handle, PromiseState::Rejected(value))
    }

    fn settle(
        &mut self,
        handle: PromiseHandle,
        state: PromiseState,
    ) -> Result<Vec<W>, PromiseError> {
        let entry = self.entry_mut(handle)?;
        if entry.state.is_settled() {
            return Err(PromiseError::AlreadySettled(handle));
        }
        entry.state = state;
        Ok(std::mem::take(&mut entry.waiters))
    }

    /// Park `waiter` on a pending promise. Returns the state instead when
    /// the promise has already settled.
    pub fn wait(
        &mut self,
        handle: PromiseHandle,
        waiter: W,
    ) -> Result<Option<PromiseState>, PromiseError> {
        let entry = self.entry_mut(handle)?;
        if entry.state.is_settled() {
            return Ok(Some(entry.state));
        }
        entry.waiters.push(waiter);
        Ok(None)
    }

    /// Number of promises not yet settled
    pub fn pending(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| !e.state.is_settled())
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
