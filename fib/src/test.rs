// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::*;
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;
use std::net::Ipv4Addr;

fn interface(
    name: &str,
    cp: &str,
    addr: &str,
    mac: &str,
    vlan_id: Option<u16>,
) -> Interface {
    Interface {
        name: name.to_string(),
        connect_point: cp.parse().unwrap(),
        addresses: BTreeSet::from([addr.parse().unwrap()]),
        mac: mac.parse().unwrap(),
        vlan_id,
    }
}

#[test]
fn prefix_host_bits() {
    let p = Prefix4::new(Ipv4Addr::new(10, 0, 0, 10), 24);
    assert_eq!(p.value, Ipv4Addr::new(10, 0, 0, 0));
    assert!(p.host_bits_are_unset());

    let p: Prefix4 = "10.0.0.10/24".parse().unwrap();
    assert!(!p.host_bits_are_unset());
}

#[test]
fn prefix_contains() {
    let p: Prefix = "10.0.0.0/24".parse().unwrap();
    assert!(p.contains("10.0.0.7".parse().unwrap()));
    assert!(!p.contains("10.0.1.7".parse().unwrap()));
    assert!(!p.contains("fd00::1".parse().unwrap()));

    let p: Prefix = "fd00:a::/64".parse().unwrap();
    assert!(p.contains("fd00:a::99".parse().unwrap()));
    assert!(!p.contains("fd00:b::99".parse().unwrap()));

    let all: Prefix = "0.0.0.0/0".parse().unwrap();
    assert!(all.contains("192.168.7.7".parse().unwrap()));
}

#[test]
fn prefix_parse_roundtrip() {
    for s in ["1.1.1.0/24", "0.0.0.0/0", "fd00:1701::/64"] {
        let p: Prefix = s.parse().unwrap();
        assert_eq!(p.to_string(), s);
    }
    assert!("1.1.1.0".parse::<Prefix>().is_err());
    assert!("foo/24".parse::<Prefix>().is_err());

    // out-of-range lengths must fail at parse time, not at masking
    assert!("1.1.1.0/33".parse::<Prefix4>().is_err());
    assert!("fd00::/129".parse::<Prefix6>().is_err());
    assert!("1.1.1.0/33".parse::<Prefix>().is_err());
}

#[test]
fn mac_parse_display() {
    let m: MacAddr = "aa:bb:cc:00:11:02".parse().unwrap();
    assert_eq!(m, MacAddr([0xaa, 0xbb, 0xcc, 0x00, 0x11, 0x02]));
    assert_eq!(m.to_string(), "aa:bb:cc:00:11:02");
    assert!("aa:bb:cc:00:11".parse::<MacAddr>().is_err());
    assert!("aa:bb:cc:00:11:zz".parse::<MacAddr>().is_err());
}

#[test]
fn connect_point_parse() {
    let cp: ConnectPoint = "sw1/1".parse().unwrap();
    assert_eq!(cp, ConnectPoint::new("sw1", 1));
    assert_eq!(cp.to_string(), "sw1/1");
    assert!("sw1".parse::<ConnectPoint>().is_err());
    assert!("/1".parse::<ConnectPoint>().is_err());
}

#[test]
fn interface_covers_and_owns() {
    let ifx = interface(
        "sw3-eth1",
        "sw3/1",
        "10.0.3.1/24",
        "00:00:00:00:03:01",
        None,
    );
    assert!(ifx.covers("10.0.3.50".parse().unwrap()));
    assert!(!ifx.covers("10.0.4.50".parse().unwrap()));
    assert!(ifx.owns("10.0.3.1".parse().unwrap()));
    assert!(!ifx.owns("10.0.3.50".parse().unwrap()));
}

fn sample_intent(ingress_order: &[(&str, Option<u16>)]) -> ForwardingIntent {
    let prefix: Prefix = "1.1.1.0/24".parse().unwrap();
    ForwardingIntent {
        selector: Selector {
            ether_type: EtherType::from(&prefix),
            prefix,
        },
        treatment: Treatment {
            dst_mac: "00:00:00:00:03:64".parse().unwrap(),
            vlan: VlanAction::None,
        },
        egress: FilteredConnectPoint {
            connect_point: "sw3/1".parse().unwrap(),
            vlan_id: None,
        },
        ingress: ingress_order
            .iter()
            .map(|(cp, vid)| FilteredConnectPoint {
                connect_point: cp.parse().unwrap(),
                vlan_id: *vid,
            })
            .collect(),
    }
}

#[test]
fn intent_key_ignores_ingress_order() {
    let a = sample_intent(&[("sw1/1", Some(10)), ("sw2/1", Some(20))]);
    let b = sample_intent(&[("sw2/1", Some(20)), ("sw1/1", Some(10))]);
    assert_eq!(a.key(), b.key());
    assert_eq!(a, b);
}

#[test]
fn intent_key_ignores_store_identity() {
    let intent = sample_intent(&[("sw1/1", Some(10))]);
    let first = IntentRecord {
        reference: IntentRef(1),
        intent: intent.clone(),
        state: IntentState::Installed,
    };
    let second = IntentRecord {
        reference: IntentRef(99),
        intent,
        state: IntentState::Installed,
    };
    assert_eq!(IntentKey::from(&first), IntentKey::from(&second));
}

#[test]
fn intent_key_differs_on_content() {
    let a = sample_intent(&[("sw1/1", Some(10))]);
    let mut b = a.clone();
    b.treatment.dst_mac = "00:00:00:00:02:64".parse().unwrap();
    assert_ne!(a.key(), b.key());

    let mut c = a.clone();
    c.ingress.insert(FilteredConnectPoint {
        connect_point: "sw4/1".parse().unwrap(),
        vlan_id: None,
    });
    assert_ne!(a.key(), c.key());
}

#[test]
fn intent_state_presence() {
    assert!(IntentState::Installed.is_present());
    assert!(IntentState::Installing.is_present());
    assert!(!IntentState::Withdrawing.is_present());
    assert!(!IntentState::Failed.is_present());
}

#[test]
fn table_insert_replace_remove() {
    let log = fib_common::test::logger();
    let table = FibTable::new(log);

    let route = RouteEntry {
        prefix: "1.1.1.0/24".parse().unwrap(),
        nexthop: "10.0.3.100".parse().unwrap(),
    };
    let intent = sample_intent(&[("sw1/1", Some(10))]);
    table.insert(FibEntry {
        route,
        nexthop_mac: "00:00:00:00:03:64".parse().unwrap(),
        intent: intent.clone(),
        reference: None,
    });
    assert_eq!(table.len(), 1);

    table.set_reference(&route.prefix, IntentRef(7));
    assert_eq!(table.get(&route.prefix).unwrap().reference, Some(IntentRef(7)));

    // replacing the entry drops the stale reference
    let replacement = sample_intent(&[("sw2/1", Some(20))]);
    table.insert(FibEntry {
        route,
        nexthop_mac: "00:00:00:00:03:64".parse().unwrap(),
        intent: replacement.clone(),
        reference: None,
    });
    assert_eq!(table.len(), 1);
    let entry = table.get(&route.prefix).unwrap();
    assert_eq!(entry.intent, replacement);
    assert_eq!(entry.reference, None);

    let removed = table.remove(&route.prefix).unwrap();
    assert_eq!(removed.intent, replacement);
    assert!(table.is_empty());

    // removing an absent prefix is a no-op
    assert!(table.remove(&route.prefix).is_none());
}

#[test]
fn table_snapshot_is_point_in_time() {
    let log = fib_common::test::logger();
    let table = FibTable::new(log);
    let route = RouteEntry {
        prefix: "1.1.1.0/24".parse().unwrap(),
        nexthop: "10.0.3.100".parse().unwrap(),
    };
    table.insert(FibEntry {
        route,
        nexthop_mac: "00:00:00:00:03:64".parse().unwrap(),
        intent: sample_intent(&[("sw1/1", Some(10))]),
        reference: None,
    });

    let snap = table.snapshot();
    table.remove(&route.prefix);
    assert_eq!(snap.len(), 1);
    assert!(table.is_empty());
}
