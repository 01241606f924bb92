//! Canonical network constructors.
//!
//! Two families cover the scenario classes exercised by the test suite
//! and the quickstart: a closed single-route ring and an open highway
//! with an on-ramp merge.

use smallvec::smallvec;

use tarmac_core::{EdgeId, NodeId};

use crate::network::{Edge, Network, Node, Route};

/// A closed ring road of `length` meters, split into four equal arcs.
///
/// One cyclic route ("ring") covers all four edges; vehicles wrap
/// around indefinitely. Mirrors the classic ring-road wave-attenuation
/// setup.
pub fn ring_network(length: f64, lanes: u8, speed_limit: f64) -> Network {
    let nodes = vec![
        Node {
            name: "ring_0".into(),
        },
        Node {
            name: "ring_1".into(),
        },
        Node {
            name: "ring_2".into(),
        },
        Node {
            name: "ring_3".into(),
        },
    ];
    let arc = length / 4.0;
    let edge = |name: &str, from: u32, to: u32| Edge {
        name: name.into(),
        from: NodeId(from),
        to: NodeId(to),
        length: arc,
        speed_limit,
        lanes,
    };
    let edges = vec![
        edge("bottom", 0, 1),
        edge("right", 1, 2),
        edge("top", 2, 3),
        edge("left", 3, 0),
    ];
    let routes = vec![Route {
        name: "ring".into(),
        edges: smallvec![EdgeId(0), EdgeId(1), EdgeId(2), EdgeId(3)],
    }];
    Network::new("ring", nodes, edges, routes)
        .expect("ring construction parameters are always valid")
}

/// An open highway with a single on-ramp merging in.
///
/// ```text
/// inflow_highway ──► left ──► center ──► exit
///                              ▲
///               inflow_merge ──┘ (bottom)
/// ```
///
/// Two routes: "highway" (all four mainline edges) and "merge" (ramp
/// then mainline from the junction). Both are open — vehicles leave at
/// the end of "exit".
pub fn merge_network(
    highway_len: f64,
    ramp_len: f64,
    lanes: u8,
    highway_speed: f64,
    ramp_speed: f64,
) -> Network {
    let nodes = vec![
        Node {
            name: "inflow_highway".into(),
        },
        Node {
            name: "pre_merge".into(),
        },
        Node {
            name: "merge_junction".into(),
        },
        Node {
            name: "post_merge".into(),
        },
        Node {
            name: "inflow_merge".into(),
        },
        Node {
            name: "outflow".into(),
        },
    ];
    let quarter = highway_len / 4.0;
    let edges = vec![
        Edge {
            name: "inflow_highway".into(),
            from: NodeId(0),
            to: NodeId(1),
            length: quarter,
            speed_limit: highway_speed,
            lanes,
        },
        Edge {
            name: "left".into(),
            from: NodeId(1),
            to: NodeId(2),
            length: quarter,
            speed_limit: highway_speed,
            lanes,
        },
        Edge {
            name: "center".into(),
            from: NodeId(2),
            to: NodeId(3),
            length: quarter,
            speed_limit: highway_speed,
            lanes,
        },
        Edge {
            name: "exit".into(),
            from: NodeId(3),
            to: NodeId(5),
            length: quarter,
            speed_limit: highway_speed,
            lanes,
        },
        Edge {
            name: "bottom".into(),
            from: NodeId(4),
            to: NodeId(2),
            length: ramp_len,
            speed_limit: ramp_speed,
            lanes: 1,
        },
    ];
    let routes = vec![
        Route {
            name: "highway".into(),
            edges: smallvec![EdgeId(0), EdgeId(1), EdgeId(2), EdgeId(3)],
        },
        Route {
            name: "merge".into(),
            edges: smallvec![EdgeId(4), EdgeId(2), EdgeId(3)],
        },
    ];
    Network::new("merge", nodes, edges, routes)
        .expect("merge construction parameters are always valid")
}
