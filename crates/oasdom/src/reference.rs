//! `$ref` nodes.

use serde_json::{Map, Value};

use crate::coerce::Cx;
use crate::node::{sealed::NodeImpl, serde_via_registry, Node, Writer};
use crate::registry::{FieldDecl, NodeDecl, Shape};

/// A pointer (`$ref`) to a definition elsewhere in the document.
///
/// Keys next to `$ref` (OpenAPI 3.1 allows `summary` and `description`)
/// are kept as extensions.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    ref_path: String,
    extensions: Map<String, Value>,
}

impl Reference {
    /// The `$ref` target, e.g. `#/components/parameters/id`.
    pub fn ref_path(&self) -> &str {
        &self.ref_path
    }

    pub fn extensions(&self) -> &Map<String, Value> {
        &self.extensions
    }
}

impl Node for Reference {
    const NAME: &'static str = "Reference";
}

impl NodeImpl for Reference {
    fn declare() -> NodeDecl {
        NodeDecl::object(
            Self::NAME,
            vec![FieldDecl::required("$ref", Shape::String)],
        )
    }

    fn parse_fields(cx: &mut Cx<'_>, decl: &NodeDecl, obj: &Map<String, Value>) -> Self {
        Self {
            ref_path: cx.required_string(obj, "$ref").unwrap_or_default(),
            extensions: cx.extensions(decl, obj),
        }
    }

    fn write_fields(&self, w: &mut Writer<'_>, out: &mut Map<String, Value>) {
        out.insert("$ref".to_string(), Value::String(self.ref_path.clone()));
        w.put_extensions(out, &self.extensions);
    }
}

serde_via_registry!(Reference);
