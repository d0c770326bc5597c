// crates/opruntime/tests/config_test.rs
//
// Kept in its own binary: it mutates process environment variables.

use opruntime::{ExecutorKind, RuntimeConfig};

#[test]
fn test_config_reads_environment() {
    std::env::set_var("OPFLOW_EXECUTOR", "threads");
    std::env::set_var("OPFLOW_MAX_PARALLEL", "3");
    std::env::set_var("OPFLOW_EVENT_BUFFER", "not-a-number");
    std::env::set_var("OPFLOW_NODE_TIMEOUT_MS", "250");

    let config = RuntimeConfig::default();
    assert_eq!(config.executor, ExecutorKind::Threads);
    assert_eq!(config.max_parallel_nodes, 3);
    assert_eq!(config.event_buffer_size, 1000);
    assert_eq!(config.node_timeout_ms, Some(250));
    assert_eq!(config.build_executor().max_parallel(), 3);

    for key in [
        "OPFLOW_EXECUTOR",
        "OPFLOW_MAX_PARALLEL",
        "OPFLOW_EVENT_BUFFER",
        "OPFLOW_NODE_TIMEOUT_MS",
    ] {
        std::env::remove_var(key);
    }

    let config = RuntimeConfig::default();
    assert_eq!(config.executor, ExecutorKind::Local);
    assert_eq!(config.max_parallel_nodes, 10);
    assert_eq!(config.node_timeout_ms, None);
}
