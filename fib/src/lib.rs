// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The forwarding information base (fib).
//!
//! This crate holds the data model shared between the route-facing
//! upper half and the intent-facing lower half: IP prefixes, network
//! interfaces, route entries, the forwarding-intent content model and
//! the `FibTable` mapping each active prefix to its desired intent.
//! Everything here is a value; identities assigned by the intent
//! store live alongside the values, never inside them.

pub mod intent;
pub mod table;
pub mod types;

mod log;

pub use intent::*;
pub use table::{FibEntry, FibTable};
pub use types::*;

#[cfg(test)]
mod test;

pub const COMPONENT_FIB: &str = "fib";
pub const MOD_TABLE: &str = "table";
