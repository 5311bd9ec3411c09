//! Tests for the metrics module.

use anyhow::Result;
use blocktake::metrics::{MetricsCollector, TAKE_BLOCKS_PROCESSED, TAKE_STEPS_PROCESSED};
use blocktake::testing::cpu_by_dc;
use blocktake::{Block, Controller, NodeId, NodeParams, QueryContext, TakeOp};
use serde_json::json;

#[test]
fn test_increment_counter() {
    let collector = MetricsCollector::new();
    collector.increment_counter("requests", 1);
    collector.increment_counter("requests", 5);

    assert_eq!(collector.snapshot().get("requests"), Some(&6));
}

#[test]
fn test_set_counter() {
    let collector = MetricsCollector::new();
    collector.set_counter("operations", 100);
    assert_eq!(collector.counter("operations"), Some(100));

    // Overwrite with new value
    collector.set_counter("operations", 200);
    assert_eq!(collector.counter("operations"), Some(200));
}

#[test]
fn test_clones_share_counters() {
    let collector = MetricsCollector::new();
    let other = collector.clone();
    other.increment_counter("shared", 3);
    assert_eq!(collector.counter("shared"), Some(3));
}

#[test]
fn test_to_json_includes_descriptions() {
    let collector = MetricsCollector::new();
    collector.increment_counter(TAKE_BLOCKS_PROCESSED, 2);
    collector.describe(TAKE_BLOCKS_PROCESSED, "blocks finished by take nodes");

    assert_eq!(
        collector.to_json(),
        json!({
            "take_blocks_processed": {
                "value": 2,
                "description": "blocks finished by take nodes"
            }
        })
    );
}

#[test]
fn test_save_to_file() -> Result<()> {
    let metrics = MetricsCollector::new();
    let controller = Controller::default().with_metrics(metrics.clone());
    let node = TakeOp::top_k(NodeParams::with_k(1)).node(controller);

    let blocks = [cpu_by_dc()?, cpu_by_dc()?];
    let refs: Vec<&dyn Block> = blocks.iter().map(|b| b as &dyn Block).collect();
    node.process_blocks_par(&QueryContext::range(), &refs)?;

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("metrics.json");
    metrics.save_to_file(&path)?;

    let saved: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    assert_eq!(saved[TAKE_BLOCKS_PROCESSED]["value"], json!(2));
    assert_eq!(saved[TAKE_STEPS_PROCESSED]["value"], json!(6));
    Ok(())
}

#[test]
fn test_save_to_missing_directory_fails() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let err = MetricsCollector::new().save_to_file(dir.path().join("missing/metrics.json")).err();
    assert!(matches!(err, Some(blocktake::Error::Io(_))));
    Ok(())
}

#[test]
fn test_nodes_without_metrics_record_nothing() -> Result<()> {
    let node = TakeOp::top_k(NodeParams::with_k(1)).node(Controller::default());
    node.process_block(&QueryContext::range(), NodeId::new(1), &cpu_by_dc()?)?;
    assert!(node.controller().metrics().is_none());
    Ok(())
}
