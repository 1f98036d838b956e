//! Validated newtypes shared across the harness
//!
//! Names are the only addressing mechanism a test author sees, so they are
//! validated at the boundary instead of being passed around as bare strings.

use nutype::nutype;
#[allow(unused_imports)] // These are used by nutype derive macros
use serde::{Deserialize, Serialize};

/// Base name a directive uses to address a timetable entry
///
/// May carry a disambiguation suffix (`"fetch[2]"`) when the author wants to
/// target a specific duplicate directly.
#[nutype(
    validate(not_empty),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Hash,
        Serialize,
        Deserialize,
        AsRef,
        Display
    )
)]
pub struct EntryName(String);

impl EntryName {
    /// Display name of the `index`-th entry sharing this base name
    ///
    /// The first entry keeps the bare name; later ones get `[2]`, `[3]`, ...
    pub fn suffixed(&self, index: usize) -> String {
        suffixed(self.as_ref(), index)
    }
}

pub(crate) fn suffixed(base: &str, index: usize) -> String {
    if index > 1 {
        format!("{base}[{index}]")
    } else {
        base.to_string()
    }
}

/// Upper bound on settlements performed by one auto-resolve simulation
#[nutype(
    validate(greater = 0),
    default = 1000,
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Serialize,
        Deserialize,
        AsRef,
        Display,
        Default
    )
)]
pub struct AutoResolveLimit(usize);
