// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Traits that decouple the reconciler from the underlying platform:
//! the intent store, the host (ARP/NDP) resolver and the interface
//! view. This is useful for testing the reconciler while not having a
//! running controller cluster behind it.

use fib::{
    ForwardingIntent, Interface, IntentRecord, IntentRef, IntentState,
    MacAddr,
};
use std::net::IpAddr;
use std::sync::Arc;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("unknown intent {0}")]
    UnknownIntent(IntentRef),
}

/// The shared intent store. Submission is by content; the store
/// assigns an opaque [`IntentRef`] per submission. Listings are scoped
/// to this application's intents.
#[allow(async_fn_in_trait)]
pub trait IntentStore {
    async fn submit(
        &self,
        intent: &ForwardingIntent,
    ) -> Result<IntentRef, StoreError>;

    async fn withdraw(&self, reference: &IntentRef) -> Result<(), StoreError>;

    async fn list_intents(&self) -> Result<Vec<IntentRecord>, StoreError>;

    async fn get_state(
        &self,
        reference: &IntentRef,
    ) -> Result<Option<IntentState>, StoreError>;
}

/// Next-hop MAC resolution. A cached answer comes back synchronously;
/// otherwise `start_monitoring` registers interest and the embedder
/// delivers the completion through `Synchronizer::resolved`, possibly
/// out of order and on another thread.
pub trait HostResolver {
    fn known_mac(&self, ip: IpAddr) -> Option<MacAddr>;

    /// Begin asynchronous resolution for `ip`. Idempotent.
    fn start_monitoring(&self, ip: IpAddr);
}

/// Synchronous view of the current network-facing interfaces, used to
/// seed the reconciler at startup. Subsequent changes arrive as
/// interface events through the `Synchronizer` handle.
pub trait InterfaceSource {
    fn interfaces(&self) -> Vec<Interface>;
}

// Collaborators are often shared with the embedding process, so the
// traits pass through an Arc.

impl<T: IntentStore> IntentStore for Arc<T> {
    async fn submit(
        &self,
        intent: &ForwardingIntent,
    ) -> Result<IntentRef, StoreError> {
        self.as_ref().submit(intent).await
    }

    async fn withdraw(&self, reference: &IntentRef) -> Result<(), StoreError> {
        self.as_ref().withdraw(reference).await
    }

    async fn list_intents(&self) -> Result<Vec<IntentRecord>, StoreError> {
        self.as_ref().list_intents().await
    }

    async fn get_state(
        &self,
        reference: &IntentRef,
    ) -> Result<Option<IntentState>, StoreError> {
        self.as_ref().get_state(reference).await
    }
}

impl<T: HostResolver> HostResolver for Arc<T> {
    fn known_mac(&self, ip: IpAddr) -> Option<MacAddr> {
        self.as_ref().known_mac(ip)
    }

    fn start_monitoring(&self, ip: IpAddr) {
        self.as_ref().start_monitoring(ip)
    }
}

impl<T: InterfaceSource> InterfaceSource for Arc<T> {
    fn interfaces(&self) -> Vec<Interface> {
        self.as_ref().interfaces()
    }
}
