#![allow(dead_code)]

use oasdom::{Node, PathItem};
use serde_json::Value;

/// Link the process-wide registry and route logs to the test writer.
pub fn setup() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("oasdom=debug")
        .with_test_writer()
        .try_init();
    oasdom::link().expect("built-in node types link");
}

/// Decode YAML the way a document loader would.
pub fn yaml(input: &str) -> Value {
    serde_yaml::from_str(input).expect("fixture is valid YAML")
}

pub fn parse_yaml(input: &str) -> PathItem {
    PathItem::parse(&yaml(input)).expect("fixture is a valid path item")
}
