//! Mutation triples and the row-selection modes used by phrases.
//!
//! A mutation names, for each DTT slot, the candidate a component should
//! switch to. Indices are absolute: applying the same mutation twice leaves the
//! component where the first application put it. Negative indices count from
//! the end of the candidate list, so the reserved candidates appended by
//! [`WordBuilder::build`](super::WordBuilder::build) are reachable with the
//! same index on every component regardless of how many user candidates it
//! declares:
//!
//! ```text
//! -1  drop      ""
//! -2  lazy      .*?
//! -3  lazy+     .+?
//! -4  anchor    ^ / [^markers]+ / $
//! ```

use super::component::Role;
use serde::Serialize;
use std::fmt;

/// Drop the component entirely (empty pattern).
pub const DROP: isize = -1;
/// Lazy wildcard that may match nothing.
pub const LAZY: isize = -2;
/// Lazy wildcard that must match at least one character.
pub const LAZY_NON_EMPTY: isize = -3;
/// Start/end anchor for boundaries, non-marker class for tokens.
pub const ANCHOR: isize = -4;

/// Number of candidates appended to every component at construction.
pub(crate) const RESERVED_CANDIDATES: usize = 4;

/// Resolve a forward or from-end index against a list of `len` candidates.
///
/// Returns `None` when the index falls outside the list.
pub fn resolve_index(index: isize, len: usize) -> Option<usize> {
    if index >= 0 {
        let index = index as usize;
        (index < len).then_some(index)
    } else {
        len.checked_sub(index.unsigned_abs())
    }
}

/// One optional candidate index per slot, in `[determiner, token, terminator]`
/// order. `None` leaves the slot untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Mutation(pub [Option<isize>; 3]);

impl Mutation {
    /// Every slot back to its first candidate.
    pub const PRISTINE: Mutation = Mutation([Some(0), Some(0), Some(0)]);

    pub const fn new(determiner: isize, token: isize, terminator: isize) -> Self {
        Mutation([Some(determiner), Some(token), Some(terminator)])
    }

    /// Boundary-only mutation; tokens keep their current pattern.
    pub const fn scaffold(determiner: isize, terminator: isize) -> Self {
        Mutation([Some(determiner), None, Some(terminator)])
    }

    pub fn slot(&self, role: Role) -> Option<isize> {
        self.0[role.slot()]
    }

    /// Copy of `self` with `role` set to `index`.
    pub fn with(mut self, role: Role, index: isize) -> Self {
        self.0[role.slot()] = Some(index);
        self
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots: Vec<String> =
            self.0.iter().map(|slot| slot.map(|i| i.to_string()).unwrap_or_else(|| "_".to_string())).collect();
        write!(f, "[{}]", slots.join(", "))
    }
}

/// Which rows of a phrase table a mutation touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Every row.
    All,
    /// Rows flagged as ambiguous seams.
    Conflict,
    /// Ambiguous rows plus the first and last row.
    Both,
    /// Only the first and last row.
    Ends,
}

impl Mode {
    /// Narrow `rows` (table indices, in table order) down to the rows this mode
    /// selects. `conflicts` is indexed by table row.
    pub(crate) fn select(self, rows: &[usize], conflicts: &[bool]) -> Vec<usize> {
        let flagged = |row: usize| conflicts.get(row).copied().unwrap_or(false);
        match self {
            Mode::All => rows.to_vec(),
            Mode::Conflict => rows.iter().copied().filter(|&row| flagged(row)).collect(),
            Mode::Ends => match (rows.first(), rows.last()) {
                (Some(&head), Some(&tail)) if head != tail => vec![head, tail],
                (Some(&head), _) => vec![head],
                _ => Vec::new(),
            },
            Mode::Both => {
                let last = rows.len().saturating_sub(1);
                rows.iter()
                    .enumerate()
                    .filter(|&(pos, &row)| pos == 0 || pos == last || flagged(row))
                    .map(|(_, &row)| row)
                    .collect()
            }
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::All => "all",
            Mode::Conflict => "conflict",
            Mode::Both => "both",
            Mode::Ends => "ends",
        };
        f.write_str(name)
    }
}
