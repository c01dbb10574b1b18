// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The authoritative mapping from route prefix to desired forwarding
//! intent. Exclusively mutated by the reconciler; snapshot reads serve
//! the resync algorithm and observability.

use crate::intent::{ForwardingIntent, IntentRef};
use crate::log::fib_log;
use crate::types::{MacAddr, Prefix, RouteEntry};
use fib_common::lock;
use serde::Serialize;
use slog::Logger;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// One desired-state entry: the route that produced it, the resolved
/// next-hop MAC, the intent content, and whatever identity the store
/// assigned when the intent was last submitted.
#[derive(Debug, Clone, Serialize)]
pub struct FibEntry {
    pub route: RouteEntry,
    pub nexthop_mac: MacAddr,
    pub intent: ForwardingIntent,
    pub reference: Option<IntentRef>,
}

/// Cloneable handle over the shared prefix table. A read during an
/// in-flight write never observes a partially updated intent; writers
/// replace whole entries under the lock.
#[derive(Clone)]
pub struct FibTable {
    entries: Arc<Mutex<HashMap<Prefix, FibEntry>>>,
    log: Logger,
}

impl FibTable {
    pub fn new(log: Logger) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            log,
        }
    }

    pub fn get(&self, prefix: &Prefix) -> Option<FibEntry> {
        lock!(self.entries).get(prefix).cloned()
    }

    /// Install or replace the desired entry for a prefix.
    pub fn insert(&self, entry: FibEntry) {
        let prefix = entry.route.prefix;
        fib_log!(self, debug, "desired {prefix} -> {}", entry.intent;
            "prefix" => format!("{prefix}"));
        lock!(self.entries).insert(prefix, entry);
    }

    pub fn remove(&self, prefix: &Prefix) -> Option<FibEntry> {
        let removed = lock!(self.entries).remove(prefix);
        if removed.is_some() {
            fib_log!(self, debug, "removed desired entry for {prefix}";
                "prefix" => format!("{prefix}"));
        }
        removed
    }

    /// Record the store-assigned identity for a prefix's intent. A
    /// no-op if the entry was removed or replaced in the meantime.
    pub fn set_reference(&self, prefix: &Prefix, reference: IntentRef) {
        if let Some(entry) = lock!(self.entries).get_mut(prefix) {
            entry.reference = Some(reference);
        }
    }

    /// Point-in-time copy of the whole table, for snapshot-then-diff.
    pub fn snapshot(&self) -> HashMap<Prefix, FibEntry> {
        lock!(self.entries).clone()
    }

    /// The current desired intents, for observability and tests.
    pub fn intents(&self) -> Vec<ForwardingIntent> {
        lock!(self.entries)
            .values()
            .map(|e| e.intent.clone())
            .collect()
    }

    /// Serialize the current table for observability dumps.
    pub fn dump(&self) -> Result<String, serde_json::Error> {
        let entries: Vec<FibEntry> =
            lock!(self.entries).values().cloned().collect();
        serde_json::to_string_pretty(&entries)
    }

    pub fn len(&self) -> usize {
        lock!(self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        lock!(self.entries).is_empty()
    }
}
