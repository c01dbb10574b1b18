// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The reconciliation engine. One instance runs on the event loop
//! thread and exclusively owns all mutable state other than the shared
//! `FibTable`. Route, interface, resolution and leadership events all
//! arrive through a single queue, so per-prefix transitions are
//! serialized and a full resync never races an incremental update.

use crate::builder;
use crate::error::Error;
use crate::log::{store_log, sync_log};
use crate::platform::{HostResolver, IntentStore};
use crate::{Event, SyncConfig};
use fib::{
    FibEntry, FibTable, ForwardingIntent, Interface, InterfaceEvent,
    IntentKey, IntentRecord, IntentRef, IntentState, MacAddr, Prefix,
    RouteEntry,
};
use slog::Logger;
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::Arc;
use tokio::time::timeout;

pub(crate) struct Reconciler<Store: IntentStore, Resolver: HostResolver> {
    store: Store,
    resolver: Resolver,
    fib: FibTable,

    /// Current interface snapshot, seeded from the interface source
    /// and updated by interface events.
    interfaces: Vec<Interface>,

    /// Routes whose next hop has no MAC yet, keyed by prefix. The
    /// stored next hop is the one currently desired; a resolution
    /// callback for any other next hop is stale and discarded.
    pending: HashMap<Prefix, IpAddr>,

    /// While false, no submit/withdraw reaches the store. Events still
    /// update the fib so desired state stays current.
    is_leader: bool,

    config: SyncConfig,
    log: Logger,
    rt: Arc<tokio::runtime::Handle>,
}

impl<Store: IntentStore, Resolver: HostResolver> Reconciler<Store, Resolver> {
    pub(crate) fn new(
        store: Store,
        resolver: Resolver,
        interfaces: Vec<Interface>,
        fib: FibTable,
        config: SyncConfig,
        log: Logger,
        rt: Arc<tokio::runtime::Handle>,
    ) -> Self {
        Self {
            store,
            resolver,
            fib,
            interfaces,
            pending: HashMap::new(),
            is_leader: false,
            config,
            log,
            rt,
        }
    }

    pub(crate) fn handle_event(&mut self, event: Event) {
        match event {
            Event::RoutesUpdated { added, removed } => {
                for route in removed {
                    self.remove_route(route);
                }
                for route in added {
                    self.apply_route(route);
                }
            }
            Event::Interface(ev) => self.interface_event(ev),
            Event::Resolved { ip, mac } => self.resolved(ip, mac),
            Event::LeaderChanged(is_leader) => self.leader_changed(is_leader),
            Event::Resync => self.full_sync(),
            // consumed by the event loop before dispatch
            Event::Shutdown => {}
        }
    }

    fn egress_for(&self, nexthop: IpAddr) -> Option<Interface> {
        self.interfaces.iter().find(|i| i.covers(nexthop)).cloned()
    }

    /// Drive a route toward `Submitted`, through `PendingResolution`
    /// when the next-hop MAC is not yet known.
    fn apply_route(&mut self, route: RouteEntry) {
        let prefix = route.prefix;

        // A next hop we own marks a locally-originated route; it must
        // not generate a forwarding intent.
        if self.interfaces.iter().any(|i| i.owns(route.nexthop)) {
            sync_log!(self, debug, "{route}: next hop is local, no intent";
                "prefix" => format!("{prefix}"));
            self.pending.remove(&prefix);
            if let Some(entry) = self.fib.remove(&prefix) {
                self.withdraw_entry(&entry);
            }
            return;
        }

        let Some(egress) = self.egress_for(route.nexthop) else {
            sync_log!(self, warn, "{route}: no egress interface for next hop";
                "prefix" => format!("{prefix}"),
                "nexthop" => format!("{}", route.nexthop));
            self.pending.insert(prefix, route.nexthop);
            if let Some(entry) = self.fib.remove(&prefix) {
                self.withdraw_entry(&entry);
            }
            return;
        };

        match self.resolver.known_mac(route.nexthop) {
            Some(mac) => {
                let intent =
                    builder::build(prefix, mac, &egress, &self.interfaces);
                self.install(route, mac, intent);
            }
            None => {
                self.resolver.start_monitoring(route.nexthop);
                sync_log!(self, debug,
                    "{route}: awaiting next hop resolution";
                    "prefix" => format!("{prefix}"),
                    "nexthop" => format!("{}", route.nexthop));
                // any previous intent points at a superseded next hop
                if let Some(entry) = self.fib.remove(&prefix) {
                    self.withdraw_entry(&entry);
                }
                self.pending.insert(prefix, route.nexthop);
            }
        }
    }

    fn remove_route(&mut self, route: RouteEntry) {
        self.pending.remove(&route.prefix);
        if let Some(entry) = self.fib.remove(&route.prefix) {
            sync_log!(self, info, "route withdrawn: {route}";
                "prefix" => format!("{}", route.prefix));
            self.withdraw_entry(&entry);
        }
    }

    /// Record a freshly built intent as desired and, when leading,
    /// push it to the store (withdraw-then-submit across a content
    /// change to avoid duplicate forwarding during the transition).
    fn install(
        &mut self,
        route: RouteEntry,
        mac: MacAddr,
        intent: ForwardingIntent,
    ) {
        let prefix = route.prefix;
        self.pending.remove(&prefix);

        let previous = self.fib.get(&prefix);
        if let Some(existing) = &previous {
            if existing.intent == intent {
                // content unchanged; refresh the route if the next hop
                // moved to an address with the same MAC and egress
                if existing.route != route {
                    self.fib.insert(FibEntry {
                        route,
                        nexthop_mac: mac,
                        intent,
                        reference: existing.reference,
                    });
                }
                return;
            }
        }

        self.fib.insert(FibEntry {
            route,
            nexthop_mac: mac,
            intent: intent.clone(),
            reference: None,
        });

        if !self.is_leader {
            sync_log!(self, debug,
                "not leader, deferring submission for {prefix}";
                "prefix" => format!("{prefix}"));
            return;
        }

        if let Some(entry) = previous {
            self.withdraw_entry(&entry);
        }
        self.submit_intent(&prefix, &intent);
    }

    fn submit_intent(&self, prefix: &Prefix, intent: &ForwardingIntent) {
        if intent.ingress.is_empty() {
            sync_log!(self, debug,
                "{prefix}: no ingress points, deferring submission";
                "prefix" => format!("{prefix}"));
            return;
        }
        match self.store_submit(intent) {
            Ok(reference) => {
                store_log!(self, info, "submitted {intent} as {reference}";
                    "prefix" => format!("{prefix}"));
                self.fib.set_reference(prefix, reference);
            }
            Err(e) => {
                store_log!(self, error, "submit for {prefix} failed: {e}";
                    "prefix" => format!("{prefix}"),
                    "error" => format!("{e}"));
            }
        }
    }

    fn withdraw_entry(&self, entry: &FibEntry) {
        if !self.is_leader {
            return;
        }
        // entries never submitted have no reference; any stray store
        // copy is cleaned up by the next resync
        let Some(reference) = entry.reference else {
            return;
        };
        match self.store_withdraw(&reference) {
            Ok(()) => {
                store_log!(self, info, "withdrew {reference} for {}",
                    entry.route.prefix;
                    "prefix" => format!("{}", entry.route.prefix));
            }
            Err(e) => {
                store_log!(self, error, "withdraw of {reference} failed: {e}";
                    "error" => format!("{e}"));
            }
        }
    }

    /// A resolution completed. Callbacks may arrive out of order and
    /// long after the route moved on; only `(prefix, nexthop)` pairs
    /// still pending act on it.
    fn resolved(&mut self, ip: IpAddr, mac: MacAddr) {
        let matched: Vec<Prefix> = self
            .pending
            .iter()
            .filter(|(_, nexthop)| **nexthop == ip)
            .map(|(prefix, _)| *prefix)
            .collect();

        if matched.is_empty() {
            sync_log!(self, debug, "discarding stale resolution for {ip}";
                "nexthop" => format!("{ip}"));
            return;
        }

        for prefix in matched {
            let route = RouteEntry {
                prefix,
                nexthop: ip,
            };
            // the covering interface may have gone away while we
            // waited; in that case the prefix stays pending
            let Some(egress) = self.egress_for(ip) else {
                continue;
            };
            let intent = builder::build(prefix, mac, &egress, &self.interfaces);
            self.install(route, mac, intent);
        }
    }

    fn interface_event(&mut self, event: InterfaceEvent) {
        match event {
            InterfaceEvent::Added(ifx) => {
                sync_log!(self, info, "interface added: {ifx}");
                self.interfaces.retain(|x| x.name != ifx.name);
                self.interfaces.push(ifx);
            }
            InterfaceEvent::Removed(ifx) => {
                let before = self.interfaces.len();
                self.interfaces.retain(|x| x.name != ifx.name);
                if self.interfaces.len() == before {
                    sync_log!(self, warn,
                        "ignoring removal of unknown interface {ifx}");
                    return;
                }
                sync_log!(self, info, "interface removed: {ifx}");
            }
        }
        self.reevaluate();
    }

    /// Recompute every entry whose ingress/egress set may have been
    /// affected by an interface change, and retry unresolved routes.
    fn reevaluate(&mut self) {
        for (prefix, entry) in self.fib.snapshot() {
            let nexthop = entry.route.nexthop;

            if self.interfaces.iter().any(|i| i.owns(nexthop)) {
                self.pending.remove(&prefix);
                if let Some(e) = self.fib.remove(&prefix) {
                    self.withdraw_entry(&e);
                }
                continue;
            }

            match self.egress_for(nexthop) {
                Some(egress) => {
                    let intent = builder::build(
                        prefix,
                        entry.nexthop_mac,
                        &egress,
                        &self.interfaces,
                    );
                    if intent != entry.intent {
                        self.install(entry.route, entry.nexthop_mac, intent);
                    }
                }
                None => {
                    sync_log!(self, warn,
                        "{}: egress vanished, awaiting interfaces",
                        entry.route;
                        "prefix" => format!("{prefix}"));
                    self.pending.insert(prefix, nexthop);
                    if let Some(e) = self.fib.remove(&prefix) {
                        self.withdraw_entry(&e);
                    }
                }
            }
        }

        // unresolved routes may have become reachable
        for (prefix, nexthop) in self.pending.clone() {
            self.apply_route(RouteEntry { prefix, nexthop });
        }
    }

    fn leader_changed(&mut self, is_leader: bool) {
        if is_leader == self.is_leader {
            return;
        }
        self.is_leader = is_leader;
        if is_leader {
            sync_log!(self, info,
                "acquired write leadership, resynchronizing");
            self.full_sync();
        } else {
            sync_log!(self, info, "lost write leadership, writes gated");
        }
    }

    /// Full resynchronization: take a point-in-time read of both the
    /// fib and the store listing, then repair the difference. Safe to
    /// run repeatedly; with no drift it issues zero store calls.
    pub(crate) fn full_sync(&mut self) {
        if !self.is_leader {
            sync_log!(self, debug, "resync requested while not leader");
            return;
        }

        let desired = self.fib.snapshot();
        let listed = match self.store_list() {
            Ok(listed) => listed,
            Err(e) => {
                store_log!(self, error, "resync listing failed: {e}";
                    "error" => format!("{e}"));
                return;
            }
        };

        // Withdrawing intents are about to disappear and must not
        // satisfy a desired entry; failed ones carry no forwarding
        // behavior. Neither counts as present. The store may hold
        // several content-equal copies, e.g. when a submit timed out
        // at our end but landed anyway and a later resync resubmitted.
        let mut present: HashMap<IntentKey, Vec<IntentRef>> = HashMap::new();
        for record in listed.iter().filter(|r| r.state.is_present()) {
            present
                .entry(IntentKey::from(record))
                .or_default()
                .push(record.reference);
        }

        let mut desired_keys: HashSet<IntentKey> =
            HashSet::with_capacity(desired.len());
        for (prefix, entry) in &desired {
            let key = entry.intent.key();
            match present.get(&key) {
                Some(references) => {
                    // already installed; adopt one store identity and
                    // withdraw any duplicate copies of the same content
                    self.fib.set_reference(prefix, references[0]);
                    for duplicate in &references[1..] {
                        store_log!(self, info,
                            "resync: withdrawing duplicate {duplicate} for {prefix}";
                            "prefix" => format!("{prefix}"));
                        if let Err(e) = self.store_withdraw(duplicate) {
                            store_log!(self, error,
                                "withdraw of {duplicate} failed: {e}";
                                "error" => format!("{e}"));
                        }
                    }
                }
                None => {
                    sync_log!(self, info,
                        "resync: submitting missing intent for {prefix}";
                        "prefix" => format!("{prefix}"));
                    self.submit_intent(prefix, &entry.intent);
                }
            }
            desired_keys.insert(key);
        }

        for record in &listed {
            if record.state == IntentState::Withdrawing {
                continue;
            }
            if desired_keys.contains(&IntentKey::from(record)) {
                continue;
            }
            store_log!(self, info, "resync: withdrawing drifted intent {} ({})",
                record.reference, record.intent);
            if let Err(e) = self.store_withdraw(&record.reference) {
                store_log!(self, error, "withdraw of {} failed: {e}",
                    record.reference;
                    "error" => format!("{e}"));
            }
        }
    }

    //
    // Store calls, bounded by the configured timeout. A timeout is a
    // failure like any other: reported, never retried inline, healed
    // by the next resync pass.
    //

    fn store_submit(
        &self,
        intent: &ForwardingIntent,
    ) -> Result<IntentRef, Error> {
        self.rt
            .block_on(async {
                timeout(self.config.store_timeout, self.store.submit(intent))
                    .await
            })
            .map_err(|_| Error::StoreTimeout("submit"))?
            .map_err(Error::from)
    }

    fn store_withdraw(&self, reference: &IntentRef) -> Result<(), Error> {
        self.rt
            .block_on(async {
                timeout(
                    self.config.store_timeout,
                    self.store.withdraw(reference),
                )
                .await
            })
            .map_err(|_| Error::StoreTimeout("withdraw"))?
            .map_err(Error::from)
    }

    fn store_list(&self) -> Result<Vec<IntentRecord>, Error> {
        self.rt
            .block_on(async {
                timeout(self.config.store_timeout, self.store.list_intents())
                    .await
            })
            .map_err(|_| Error::StoreTimeout("list"))?
            .map_err(Error::from)
    }
}
