// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pure construction of the canonical forwarding intent for a prefix.
//! Used both to build desired state and to build the expected value
//! during reconciliation, so it must be deterministic.

use fib::{
    EtherType, FilteredConnectPoint, ForwardingIntent, Interface, MacAddr,
    Prefix, Selector, Treatment, VlanAction,
};
use std::collections::BTreeSet;

/// Build the forwarding intent for `prefix` toward a next hop with
/// MAC `nexthop_mac` reachable through `egress`.
///
/// Every interface other than the egress contributes one ingress leg,
/// filtered by that interface's own VLAN. The exclusion compares whole
/// interfaces, so a second logical interface sharing the egress
/// connect point under a different VLAN still contributes a leg. The
/// result may have an empty ingress set; the caller decides whether
/// such an intent is worth submitting.
pub fn build(
    prefix: Prefix,
    nexthop_mac: MacAddr,
    egress: &Interface,
    interfaces: &[Interface],
) -> ForwardingIntent {
    let ingress: BTreeSet<FilteredConnectPoint> = interfaces
        .iter()
        .filter(|ifx| *ifx != egress)
        .map(|ifx| FilteredConnectPoint {
            connect_point: ifx.connect_point.clone(),
            vlan_id: ifx.vlan_id,
        })
        .collect();

    // Tagged egress with untagged sources needs a push; untagged
    // egress with tagged sources needs a pop. Tagged-to-tagged legs
    // are matched per ingress VLAN and carried through as-is.
    let vlan = match egress.vlan_id {
        Some(vid) if ingress.iter().any(|i| i.vlan_id.is_none()) => {
            VlanAction::Push(vid)
        }
        Some(_) => VlanAction::None,
        None if ingress.iter().any(|i| i.vlan_id.is_some()) => {
            VlanAction::Pop
        }
        None => VlanAction::None,
    };

    ForwardingIntent {
        selector: Selector {
            ether_type: EtherType::from(&prefix),
            prefix,
        },
        treatment: Treatment {
            dst_mac: nexthop_mac,
            vlan,
        },
        egress: FilteredConnectPoint {
            connect_point: egress.connect_point.clone(),
            vlan_id: egress.vlan_id,
        },
        ingress,
    }
}
