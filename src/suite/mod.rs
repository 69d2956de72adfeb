// suite/mod.rs - The three check groups
//
// A case is a plain async function over a `Session`. Cases never seed or
// clean up themselves; `fixtures::with_fixture` does that around them.

pub mod additional;
pub mod negative;
pub mod positive;

use crate::exec::Session;
use crate::fixtures::tables::{AdditionalTable, People};
use crate::fixtures::TestTable;
use std::future::Future;
use std::pin::Pin;

// Cases run one at a time on a current-thread runtime, so the future need
// not be Send.
pub type CaseFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<()>> + 'a>>;

/// Signature of every case body.
pub type CaseFn = for<'a> fn(&'a mut Session) -> CaseFuture<'a>;

#[derive(Clone, Copy)]
pub struct Case {
    pub name: &'static str,
    pub run: CaseFn,
}

impl std::fmt::Debug for Case {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Case").field("name", &self.name).finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    Positive,
    Negative,
    Additional,
}

impl Group {
    pub const ALL: [Group; 3] = [Group::Positive, Group::Negative, Group::Additional];

    pub fn name(self) -> &'static str {
        match self {
            Group::Positive => "PositiveTests",
            Group::Negative => "NegativeTests",
            Group::Additional => "AdditionalTests",
        }
    }

    pub fn table(self) -> &'static dyn TestTable {
        match self {
            Group::Positive | Group::Negative => &People,
            Group::Additional => &AdditionalTable,
        }
    }

    pub fn cases(self) -> &'static [Case] {
        match self {
            Group::Positive => positive::CASES,
            Group::Negative => negative::CASES,
            Group::Additional => additional::CASES,
        }
    }
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
