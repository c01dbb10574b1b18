// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The forwarding-intent content model.
//!
//! An intent is a pure content value: the store assigns an opaque
//! [`IntentRef`] at submission time, and that identity is never part
//! of the value. All diffing, matching, and deduplication is defined
//! over [`IntentKey`], which is computed from content alone.

use crate::types::{ConnectPoint, MacAddr, Prefix};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

#[derive(
    Debug,
    Copy,
    Clone,
    Serialize,
    Deserialize,
    Eq,
    Hash,
    PartialEq,
    PartialOrd,
    Ord,
)]
pub enum EtherType {
    Ipv4,
    Ipv6,
}

impl From<&Prefix> for EtherType {
    fn from(value: &Prefix) -> Self {
        match value {
            Prefix::V4(_) => EtherType::Ipv4,
            Prefix::V6(_) => EtherType::Ipv6,
        }
    }
}

/// Header rewrite applied to traffic leaving through the egress point.
#[derive(
    Debug,
    Copy,
    Clone,
    Serialize,
    Deserialize,
    Eq,
    Hash,
    PartialEq,
    PartialOrd,
    Ord,
)]
pub enum VlanAction {
    None,
    Push(u16),
    Pop,
}

/// A connect point paired with an optional VLAN match describing where
/// traffic enters or exits the intent's scope.
#[derive(
    Debug,
    Clone,
    Serialize,
    Deserialize,
    Eq,
    Hash,
    PartialEq,
    PartialOrd,
    Ord,
)]
pub struct FilteredConnectPoint {
    pub connect_point: ConnectPoint,
    pub vlan_id: Option<u16>,
}

impl Display for FilteredConnectPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.vlan_id {
            Some(vid) => write!(f, "{}.{}", self.connect_point, vid),
            None => write!(f, "{}", self.connect_point),
        }
    }
}

/// Traffic match for a forwarding intent: the address family plus the
/// destination prefix. Per-port VLAN matching lives on the ingress
/// legs, not here.
#[derive(
    Debug,
    Copy,
    Clone,
    Serialize,
    Deserialize,
    Eq,
    Hash,
    PartialEq,
    PartialOrd,
    Ord,
)]
pub struct Selector {
    pub ether_type: EtherType,
    pub prefix: Prefix,
}

/// Header rewrites for matched traffic: destination MAC of the next
/// hop, plus any VLAN manipulation required to reach the egress.
#[derive(
    Debug,
    Copy,
    Clone,
    Serialize,
    Deserialize,
    Eq,
    Hash,
    PartialEq,
    PartialOrd,
    Ord,
)]
pub struct Treatment {
    pub dst_mac: MacAddr,
    pub vlan: VlanAction,
}

/// The canonical desired forwarding behavior for one route prefix: one
/// egress point and N ingress points. Content value, not identity.
///
/// Two intents are equal iff selector, treatment, egress and ingress
/// set are equal. The ingress set is a `BTreeSet`, so equality and
/// hashing are order-independent.
#[derive(
    Debug,
    Clone,
    Serialize,
    Deserialize,
    Eq,
    Hash,
    PartialEq,
    PartialOrd,
    Ord,
)]
pub struct ForwardingIntent {
    pub selector: Selector,
    pub treatment: Treatment,
    pub egress: FilteredConnectPoint,
    pub ingress: BTreeSet<FilteredConnectPoint>,
}

impl ForwardingIntent {
    pub fn key(&self) -> IntentKey {
        IntentKey(self.clone())
    }
}

impl Display for ForwardingIntent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} ({} ingress)",
            self.selector.prefix,
            self.egress,
            self.ingress.len()
        )
    }
}

/// Content-equality key over a forwarding intent. The store hands back
/// an [`IntentRef`] for every submission and that identity is not
/// known in advance, so comparisons between desired and observed state
/// go through this key, never through references.
#[derive(Debug, Clone, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct IntentKey(ForwardingIntent);

impl From<&ForwardingIntent> for IntentKey {
    fn from(value: &ForwardingIntent) -> Self {
        IntentKey(value.clone())
    }
}

impl From<&IntentRecord> for IntentKey {
    fn from(value: &IntentRecord) -> Self {
        IntentKey(value.intent.clone())
    }
}

/// Opaque identity assigned by the intent store at submission time.
#[derive(
    Debug,
    Copy,
    Clone,
    Serialize,
    Deserialize,
    Eq,
    Hash,
    PartialEq,
    PartialOrd,
    Ord,
)]
pub struct IntentRef(pub u64);

impl Display for IntentRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "intent-{}", self.0)
    }
}

/// Store-reported lifecycle state of a submitted intent.
#[derive(
    Debug, Copy, Clone, Serialize, Deserialize, Eq, Hash, PartialEq,
)]
pub enum IntentState {
    Installing,
    Installed,
    Withdrawing,
    Failed,
}

impl IntentState {
    /// Withdrawing intents are about to disappear and failed intents
    /// carry no forwarding behavior; neither counts as present when
    /// diffing the store against the fib.
    pub fn is_present(&self) -> bool {
        matches!(self, IntentState::Installing | IntentState::Installed)
    }
}

/// One row of a store listing: identity, content and lifecycle state.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct IntentRecord {
    pub reference: IntentRef,
    pub intent: ForwardingIntent,
    pub state: IntentState,
}
