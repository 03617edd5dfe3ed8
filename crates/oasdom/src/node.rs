//! The document node trait and serialization back to decoded values.

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::coerce::Cx;
use crate::config::ParseOptions;
use crate::error::{ModelError, UnlinkedTypeError};
use crate::logging::events;
use crate::registry::{registry, Layout, LinkedTypes, NodeDecl, TypeRegistry};

pub(crate) mod sealed {
    use serde_json::{Map, Value};

    use super::Writer;
    use crate::coerce::Cx;
    use crate::registry::NodeDecl;

    /// Per-type hooks. Kept out of the public API.
    pub trait NodeImpl: Sized {
        /// Field table registered for this type.
        fn declare() -> NodeDecl;

        fn parse_fields(cx: &mut Cx<'_>, decl: &NodeDecl, obj: &Map<String, Value>) -> Self;

        /// Write recognized fields and extensions; order is fixed up by the caller.
        fn write_fields(&self, w: &mut Writer<'_>, out: &mut Map<String, Value>);
    }
}

/// A typed document node.
///
/// Every node parses from, and serializes to, the generic value tree a
/// JSON/YAML decoder produces. Both directions need a linked
/// [`TypeRegistry`].
pub trait Node: sealed::NodeImpl + Clone + PartialEq + fmt::Debug {
    /// Name the type is registered under.
    const NAME: &'static str;

    /// Parse with the process-wide registry and default options.
    ///
    /// Fails with [`ModelError::Unlinked`] if [`crate::link`] has not run.
    fn parse(value: &Value) -> Result<Self, ModelError> {
        Self::parse_with(registry(), value, &ParseOptions::default())
    }

    /// Parse against an explicit registry.
    ///
    /// All violations in the tree are reported together.
    fn parse_with(
        registry: &TypeRegistry,
        value: &Value,
        options: &ParseOptions,
    ) -> Result<Self, ModelError> {
        let types = registry.linked(Self::NAME)?;
        let mut cx = Cx::new(types, options);
        let node = cx.node::<Self>(value);
        cx.finish(node).inspect_err(|err| {
            if let ModelError::Invalid(errors) = err {
                tracing::debug!(
                    event = events::NODE_REJECTED,
                    node = Self::NAME,
                    violations = errors.len(),
                    "document node rejected"
                );
            }
        })
    }

    /// Serialize with the process-wide registry.
    fn to_map(&self) -> Result<Map<String, Value>, ModelError> {
        self.serialize_with(registry())
    }

    fn to_value(&self) -> Result<Value, ModelError> {
        self.to_map().map(Value::Object)
    }

    /// Serialize against an explicit registry.
    ///
    /// Recognized fields come first in declaration order, then extensions
    /// in input order. Absent fields are omitted.
    fn serialize_with(&self, registry: &TypeRegistry) -> Result<Map<String, Value>, ModelError> {
        let types = registry.linked(Self::NAME)?;
        let mut w = Writer::new(types);
        let out = w.node(self);
        w.finish(out)
    }
}

/// Serialization state for one node tree.
pub struct Writer<'a> {
    types: &'a LinkedTypes,
    fatal: Option<UnlinkedTypeError>,
}

impl<'a> Writer<'a> {
    fn new(types: &'a LinkedTypes) -> Self {
        Self { types, fatal: None }
    }

    fn finish(self, out: Map<String, Value>) -> Result<Map<String, Value>, ModelError> {
        match self.fatal {
            Some(err) => Err(err.into()),
            None => Ok(out),
        }
    }

    pub(crate) fn node<T: Node>(&mut self, node: &T) -> Map<String, Value> {
        let types = self.types;
        let decl = match types.decl(T::NAME) {
            Ok(decl) => decl,
            Err(err) => {
                self.fatal.get_or_insert(err);
                return Map::new();
            }
        };
        let mut written = Map::new();
        node.write_fields(self, &mut written);
        in_declared_order(decl, written)
    }

    pub(crate) fn put<V: Into<Value> + Clone>(
        &self,
        out: &mut Map<String, Value>,
        key: &str,
        value: &Option<V>,
    ) {
        if let Some(v) = value {
            out.insert(key.to_string(), v.clone().into());
        }
    }

    pub(crate) fn put_node<T: Node>(&mut self, out: &mut Map<String, Value>, key: &str, node: &Option<T>) {
        if let Some(node) = node {
            let value = Value::Object(self.node(node));
            out.insert(key.to_string(), value);
        }
    }

    pub(crate) fn put_nodes<T: Node>(
        &mut self,
        out: &mut Map<String, Value>,
        key: &str,
        nodes: &Option<Vec<T>>,
    ) {
        if let Some(nodes) = nodes {
            let items = nodes.iter().map(|n| Value::Object(self.node(n))).collect();
            out.insert(key.to_string(), Value::Array(items));
        }
    }

    pub(crate) fn put_node_map<T: Node>(
        &mut self,
        out: &mut Map<String, Value>,
        key: &str,
        nodes: &Option<IndexMap<String, T>>,
    ) {
        if let Some(nodes) = nodes {
            let entries = nodes
                .iter()
                .map(|(k, n)| (k.clone(), Value::Object(self.node(n))))
                .collect();
            out.insert(key.to_string(), Value::Object(entries));
        }
    }

    pub(crate) fn put_extensions(&self, out: &mut Map<String, Value>, extensions: &Map<String, Value>) {
        for (k, v) in extensions {
            out.insert(k.clone(), v.clone());
        }
    }
}

/// Reorder recognized keys to follow the declaration; the rest keep their order.
fn in_declared_order(decl: &NodeDecl, written: Map<String, Value>) -> Map<String, Value> {
    let Layout::Object(fields) = &decl.layout else {
        return written;
    };

    let mut known = HashMap::new();
    let mut rest = Vec::new();
    for (k, v) in written {
        if decl.recognizes(&k) {
            known.insert(k, v);
        } else {
            rest.push((k, v));
        }
    }

    let mut out = Map::new();
    for field in fields {
        if let Some(v) = known.remove(field.wire) {
            out.insert(field.wire.to_string(), v);
        }
    }
    out.extend(rest);
    out
}

/// Serde support through the process-wide registry, linking it on first use.
macro_rules! serde_via_registry {
    ($($ty:ty),+ $(,)?) => {$(
        impl serde::Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                use serde::ser::Error as _;
                $crate::registry::link().map_err(S::Error::custom)?;
                let value = $crate::node::Node::to_value(self).map_err(S::Error::custom)?;
                serde::Serialize::serialize(&value, serializer)
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                use serde::de::Error as _;
                let value = <serde_json::Value as serde::Deserialize>::deserialize(deserializer)?;
                $crate::registry::link().map_err(D::Error::custom)?;
                <$ty as $crate::node::Node>::parse(&value).map_err(D::Error::custom)
            }
        }
    )+};
}

pub(crate) use serde_via_registry;
