//! Callback node: runtime expressions mapped to path items.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::coerce::Cx;
use crate::node::{sealed::NodeImpl, serde_via_registry, Node, Writer};
use crate::path_item::PathItem;
use crate::registry::{Layout, NodeDecl, Shape};

/// Requests the API may send back to the caller, keyed by runtime
/// expression (e.g. `{$request.body#/callbackUrl}`).
#[derive(Debug, Clone, PartialEq)]
pub struct Callback {
    paths: IndexMap<String, PathItem>,
}

impl Callback {
    pub fn get(&self, expression: &str) -> Option<&PathItem> {
        self.paths.get(expression)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PathItem)> {
        self.paths.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl Node for Callback {
    const NAME: &'static str = "Callback";
}

impl NodeImpl for Callback {
    fn declare() -> NodeDecl {
        NodeDecl::map(Self::NAME, Shape::node("PathItem"))
    }

    fn parse_fields(cx: &mut Cx<'_>, decl: &NodeDecl, obj: &Map<String, Value>) -> Self {
        let values = match &decl.layout {
            Layout::Map(values) => Some(values),
            Layout::Object(_) => None,
        };
        if !cx.linked_to(values, PathItem::NAME) {
            return Self {
                paths: IndexMap::new(),
            };
        }

        let paths = obj
            .iter()
            .filter_map(|(expression, item)| {
                cx.within(expression.as_str(), |cx| cx.node::<PathItem>(item))
                    .map(|item| (expression.clone(), item))
            })
            .collect();
        Self { paths }
    }

    fn write_fields(&self, w: &mut Writer<'_>, out: &mut Map<String, Value>) {
        for (expression, item) in &self.paths {
            out.insert(expression.clone(), Value::Object(w.node(item)));
        }
    }
}

serde_via_registry!(Callback);
