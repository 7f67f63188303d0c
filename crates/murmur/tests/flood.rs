//! End-to-end propagation over built topologies.

use std::time::Duration;

use murmur::{Action, LoopBuilder, Network, Parameters, WebBuilder};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn action(tag: &str) -> Action {
    let mut params = Parameters::new();
    params.insert("tag".to_string(), serde_json::json!(tag));
    Action::new("sim", "emit", params).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn loop_flood_reaches_every_node() {
    init_tracing();
    let network = Network::new(LoopBuilder::new(32, 6).build().unwrap());

    let a = action("loop-flood");
    network.push(&a).unwrap();

    for i in 0..32 {
        let delivered = network
            .node(i)
            .unwrap()
            .read_timeout(Duration::from_secs(5))
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("node {i} never saw the action"));
        assert_eq!(delivered.hash, a.hash, "node {i} saw a different action");
    }

    network.shutdown();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn loop_flood_delivers_exactly_once() {
    init_tracing();
    let network = Network::new(LoopBuilder::new(8, 3).build().unwrap());

    let a = action("once");
    network.push(&a).unwrap();

    for i in 0..8 {
        let node = network.node(i).unwrap();
        node.read_timeout(Duration::from_secs(5))
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("node {i} never saw the action"));
    }

    // The graph is full of cycles, yet no node sees the action twice.
    for i in 0..8 {
        let extra = network
            .node(i)
            .unwrap()
            .read_timeout(Duration::from_millis(200))
            .await
            .unwrap();
        assert!(extra.is_none(), "node {i} saw a duplicate delivery");
    }

    network.shutdown();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn web_leaf_propagates_back_to_root() {
    init_tracing();
    let nodes = WebBuilder::new(8, 3).build().unwrap();

    // 3-ary tree over 8 nodes: root fans out to 3 children, node 1 keeps
    // 3 children plus its return link to the root.
    assert_eq!(nodes[0].connection_count(), 3);
    assert_eq!(nodes[1].connection_count(), 4);
    assert_eq!(nodes[2].connection_count(), 2);
    assert_eq!(nodes[5].connection_count(), 1);

    let network = Network::new(nodes);
    let a = action("leaf-to-root");
    network.node(5).unwrap().write(&a).unwrap();

    let delivered = network
        .node(0)
        .unwrap()
        .read_timeout(Duration::from_secs(5))
        .await
        .unwrap()
        .expect("root never saw the leaf's action");
    assert_eq!(delivered.hash, a.hash);

    network.shutdown();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn web_flood_from_root_reaches_all() {
    init_tracing();
    let network = Network::new(WebBuilder::new(8, 3).build().unwrap());

    let a = action("root-down");
    network.push(&a).unwrap();

    for i in 0..8 {
        let delivered = network
            .node(i)
            .unwrap()
            .read_timeout(Duration::from_secs(5))
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("node {i} never saw the action"));
        assert_eq!(delivered.hash, a.hash);
    }

    network.shutdown();
}
