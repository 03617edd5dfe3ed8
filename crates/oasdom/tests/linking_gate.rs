//! The process-wide registry refuses to parse until it is linked.
//!
//! Kept as the only test in this binary so nothing links the registry first.

use oasdom::{Node, ModelError, PathItem, UnlinkedTypeError};
use serde_json::json;

#[test]
fn parse_before_link_fails_and_link_is_idempotent() {
    let raw = json!({"summary": "s", "get": {"operationId": "a"}});

    assert!(!oasdom::registry().is_linked());
    let err = PathItem::parse(&raw).unwrap_err();
    assert_eq!(
        err,
        ModelError::Unlinked(UnlinkedTypeError {
            type_name: "PathItem"
        })
    );
    assert!(err.to_string().starts_with("E2010"));

    oasdom::link().unwrap();
    let once = PathItem::parse(&raw).unwrap();

    oasdom::link().unwrap();
    let twice = PathItem::parse(&raw).unwrap();

    assert_eq!(once, twice);
    assert_eq!(twice.to_value().unwrap(), raw);
}
