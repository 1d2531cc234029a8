//! Scoped rollback for diagnosis.
//!
//! Diagnosis mutates words and phrases while it searches for a working
//! combination. A [`Checkpoint`] takes a copy of the element on entry and
//! writes it back when the guard goes out of scope, on every exit path
//! (early `return`, `?`, or unwinding).
//!
//! ```text
//! let mut scratch = Checkpoint::new(self); // snapshot
//! scratch.mutate(..)?;                     // change through DerefMut
//! scratch.parse(input)?;
//! // drop(scratch)                         // restore
//! ```

use std::ops::{Deref, DerefMut};

pub struct Checkpoint<'a, T: Clone> {
    target: &'a mut T,
    saved: T,
}

impl<'a, T: Clone> Checkpoint<'a, T> {
    pub fn new(target: &'a mut T) -> Self {
        let saved = target.clone();
        Checkpoint { target, saved }
    }

    /// State at the time the checkpoint was taken.
    pub fn original(&self) -> &T {
        &self.saved
    }
}

impl<T: Clone> Deref for Checkpoint<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &*self.target
    }
}

impl<T: Clone> DerefMut for Checkpoint<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut *self.target
    }
}

impl<T: Clone> Drop for Checkpoint<'_, T> {
    fn drop(&mut self) {
        std::mem::swap(&mut *self.target, &mut self.saved);
    }
}
