// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! This crate is the lower half of the forwarding control plane. It
//! consumes route, interface, next-hop resolution and leadership
//! events, derives one canonical forwarding intent per prefix, and
//! keeps an external content-addressed intent store converged with
//! that desired state.
//!
//! All event handling runs on a single thread started by [`run`],
//! which returns a [`Synchronizer`] handle for feeding events in and
//! observing the resulting fib. Store interactions go through the
//! [`platform`] traits so the engine can be driven against real
//! controllers or test fixtures alike.

use fib::{FibTable, ForwardingIntent, InterfaceEvent, MacAddr, RouteEntry};
use slog::{error, Logger};
use std::net::IpAddr;
use std::sync::mpsc::{channel, Sender};
use std::sync::Arc;
use std::thread::{sleep, spawn};
use std::time::Duration;

pub mod builder;
mod error;
mod log;
pub mod platform;
mod sync;


pub use error::Error;

use platform::{HostResolver, IntentStore, InterfaceSource};
use sync::Reconciler;

pub const COMPONENT_FIB_LOWER: &str = "fib-lower";
pub const MOD_SYNC: &str = "sync";
pub const UNIT_RECONCILER: &str = "reconciler";
pub const UNIT_STORE: &str = "store";

/// Tunables for the synchronization loop.
#[derive(Debug, Clone, Copy)]
pub struct SyncConfig {
    /// Upper bound on any single store call.
    pub store_timeout: Duration,

    /// When set, a periodic full resynchronization is scheduled at
    /// this interval. When unset, resyncs run only on leadership
    /// acquisition or explicit request.
    pub resync_interval: Option<Duration>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_secs(5),
            resync_interval: None,
        }
    }
}

pub(crate) enum Event {
    RoutesUpdated {
        added: Vec<RouteEntry>,
        removed: Vec<RouteEntry>,
    },
    Interface(InterfaceEvent),
    Resolved {
        ip: IpAddr,
        mac: MacAddr,
    },
    LeaderChanged(bool),
    Resync,
    Shutdown,
}

/// Handle to a running synchronization loop. Dropping the handle shuts
/// the loop down.
pub struct Synchronizer {
    tx: Sender<Event>,
    fib: FibTable,
}

impl Synchronizer {
    /// Apply a batch of route changes. Removals are processed before
    /// additions so a nexthop change expressed as remove+add of the
    /// same prefix lands on the added entry.
    pub fn update(
        &self,
        added: Vec<RouteEntry>,
        removed: Vec<RouteEntry>,
    ) -> Result<(), Error> {
        self.send(Event::RoutesUpdated { added, removed })
    }

    pub fn interface_event(&self, event: InterfaceEvent) -> Result<(), Error> {
        self.send(Event::Interface(event))
    }

    /// Report a completed next-hop resolution. Completions for next
    /// hops no longer desired are discarded by the loop.
    pub fn resolved(&self, ip: IpAddr, mac: MacAddr) -> Result<(), Error> {
        self.send(Event::Resolved { ip, mac })
    }

    pub fn leader_changed(&self, is_leader: bool) -> Result<(), Error> {
        self.send(Event::LeaderChanged(is_leader))
    }

    /// Request an immediate full resynchronization against the store.
    pub fn force_resync(&self) -> Result<(), Error> {
        self.send(Event::Resync)
    }

    /// The forwarding intents currently desired, one per routed
    /// prefix.
    pub fn current_intents(&self) -> Vec<ForwardingIntent> {
        self.fib.intents()
    }

    pub fn fib(&self) -> &FibTable {
        &self.fib
    }

    fn send(&self, event: Event) -> Result<(), Error> {
        self.tx
            .send(event)
            .map_err(|e| Error::Channel(e.to_string()))
    }
}

impl Drop for Synchronizer {
    fn drop(&mut self) {
        let _ = self.tx.send(Event::Shutdown);
    }
}

/// Start the synchronization loop. The interface source is consulted
/// once for the initial snapshot; subsequent changes arrive as
/// [`InterfaceEvent`]s through the returned handle.
pub fn run<Store, Resolver, Ifx>(
    store: Store,
    resolver: Resolver,
    interface_source: &Ifx,
    fib: FibTable,
    config: SyncConfig,
    log: Logger,
    rt: Arc<tokio::runtime::Handle>,
) -> Synchronizer
where
    Store: IntentStore + Send + 'static,
    Resolver: HostResolver + Send + 'static,
    Ifx: InterfaceSource + ?Sized,
{
    let (tx, rx) = channel();

    // seed the interface cache before any events can arrive
    let interfaces = interface_source.interfaces();
    let mut reconciler = Reconciler::new(
        store,
        resolver,
        interfaces,
        fib.clone(),
        config,
        log.clone(),
        rt,
    );

    if let Some(interval) = config.resync_interval {
        let tick_tx = tx.clone();
        spawn(move || loop {
            sleep(interval);
            if tick_tx.send(Event::Resync).is_err() {
                break;
            }
        });
    }

    spawn(move || loop {
        match rx.recv() {
            Ok(Event::Shutdown) => break,
            Ok(event) => reconciler.handle_event(event),
            Err(e) => {
                error!(log, "event loop rx: {e}");
                break;
            }
        }
    });

    Synchronizer { tx, fib }
}
