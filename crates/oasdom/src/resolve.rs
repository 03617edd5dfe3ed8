//! Fields that hold either a [`Reference`] or an inline node.
//!
//! The two shapes carry no discriminant, so each entry is tried against
//! the candidates in the order its field declares them. Every OpenAPI
//! declaration lists `Reference` first: an entry with a string `$ref` is a
//! reference no matter how permissive the inline shape is.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::coerce::Cx;
use crate::error::{Attempt, UnlinkedTypeError, Violation};
use crate::logging::events;
use crate::node::{Node, Writer};
use crate::reference::Reference;
use crate::registry::NodeDecl;

/// A node given inline or by reference.
#[derive(Debug, Clone, PartialEq)]
pub enum RefOr<T> {
    Reference(Reference),
    Item(T),
}

impl<T> RefOr<T> {
    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            RefOr::Reference(r) => Some(r),
            RefOr::Item(_) => None,
        }
    }

    pub fn as_item(&self) -> Option<&T> {
        match self {
            RefOr::Item(item) => Some(item),
            RefOr::Reference(_) => None,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, RefOr::Reference(_))
    }
}

impl<T: Node> RefOr<T> {
    /// Resolve one entry against `order`, first match wins.
    fn resolve(cx: &mut Cx<'_>, order: &[&'static str], value: &Value) -> Option<Self> {
        let mut attempts = Vec::with_capacity(order.len());
        for &shape in order {
            let outcome = if shape == Reference::NAME {
                cx.attempt::<Reference>(value).map(RefOr::Reference)
            } else if shape == T::NAME {
                cx.attempt::<T>(value).map(RefOr::Item)
            } else {
                cx.fail(UnlinkedTypeError { type_name: shape });
                return None;
            };
            match outcome {
                Ok(resolved) => {
                    tracing::trace!(
                        event = events::VARIANT_RESOLVED,
                        path = %cx.pointer(),
                        variant = shape,
                        "polymorphic entry resolved"
                    );
                    return Some(resolved);
                }
                Err(violations) => attempts.push(Attempt { shape, violations }),
            }
        }

        let path = cx.pointer();
        tracing::trace!(
            event = events::VARIANT_UNRESOLVED,
            path = %path,
            "polymorphic entry matched no candidate"
        );
        cx.report(Violation::Unresolved { path, attempts });
        None
    }

    /// Candidate names for `decl.key`, in trial order.
    fn order(cx: &mut Cx<'_>, decl: &NodeDecl, key: &str) -> Option<Vec<&'static str>> {
        let types = cx.types();
        let order: Option<Vec<&'static str>> = decl
            .field(key)
            .and_then(|f| f.shape.candidates())
            .map(|refs| refs.iter().filter_map(|r| types.target_name(r)).collect());
        match order {
            Some(order) if order.contains(&T::NAME) => Some(order),
            _ => {
                cx.fail(UnlinkedTypeError { type_name: T::NAME });
                None
            }
        }
    }

    /// Optional sequence field of references or inline nodes.
    pub(crate) fn list(
        cx: &mut Cx<'_>,
        decl: &NodeDecl,
        obj: &Map<String, Value>,
        key: &str,
    ) -> Option<Vec<Self>> {
        if !obj.contains_key(key) {
            return None;
        }
        let order = Self::order(cx, decl, key)?;
        cx.list(obj, key, |cx, item| Self::resolve(cx, &order, item))
    }

    /// Optional mapping field of references or inline nodes.
    pub(crate) fn map(
        cx: &mut Cx<'_>,
        decl: &NodeDecl,
        obj: &Map<String, Value>,
        key: &str,
    ) -> Option<IndexMap<String, Self>> {
        if !obj.contains_key(key) {
            return None;
        }
        let order = Self::order(cx, decl, key)?;
        cx.map(obj, key, |cx, item| Self::resolve(cx, &order, item))
    }

    fn write(&self, w: &mut Writer<'_>) -> Value {
        match self {
            RefOr::Reference(r) => Value::Object(w.node(r)),
            RefOr::Item(item) => Value::Object(w.node(item)),
        }
    }

    pub(crate) fn put_list(
        w: &mut Writer<'_>,
        out: &mut Map<String, Value>,
        key: &str,
        entries: &Option<Vec<Self>>,
    ) {
        if let Some(entries) = entries {
            let items = entries.iter().map(|e| e.write(w)).collect();
            out.insert(key.to_string(), Value::Array(items));
        }
    }

    pub(crate) fn put_map(
        w: &mut Writer<'_>,
        out: &mut Map<String, Value>,
        key: &str,
        entries: &Option<IndexMap<String, Self>>,
    ) {
        if let Some(entries) = entries {
            let items = entries
                .iter()
                .map(|(k, e)| (k.clone(), e.write(w)))
                .collect();
            out.insert(key.to_string(), Value::Object(items));
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::ParseOptions;
    use crate::error::ModelError;
    use crate::parameter::{Parameter, ParameterLocation};
    use crate::path_item::PathItem;
    use crate::registry::TypeRegistry;

    fn parameters(value: Value) -> Result<Vec<RefOr<Parameter>>, ModelError> {
        crate::logging::init_test_logging();
        let registry = TypeRegistry::openapi();
        registry.link().unwrap();
        let item = PathItem::parse_with(
            &registry,
            &json!({ "parameters": value }),
            &ParseOptions::default(),
        )?;
        Ok(item.parameters().unwrap().to_vec())
    }

    #[test]
    fn ref_entry_is_a_reference() {
        let params = parameters(json!([{"$ref": "#/components/parameters/id"}])).unwrap();
        assert_eq!(
            params[0].as_reference().unwrap().ref_path(),
            "#/components/parameters/id"
        );
    }

    #[test]
    fn reference_wins_even_when_parameter_would_match() {
        let params = parameters(json!([{
            "$ref": "#/components/parameters/id",
            "name": "id",
            "in": "path",
        }]))
        .unwrap();
        let reference = params[0].as_reference().unwrap();
        assert_eq!(reference.extensions().get("name"), Some(&json!("id")));
    }

    #[test]
    fn entry_without_ref_is_a_parameter() {
        let params = parameters(json!([{
            "name": "id",
            "in": "path",
            "required": true,
            "schema": {"type": "string"}
        }]))
        .unwrap();
        let param = params[0].as_item().unwrap();
        assert_eq!(param.name(), "id");
        assert_eq!(param.location(), ParameterLocation::Path);
        assert_eq!(param.required(), Some(true));
    }

    #[test]
    fn order_of_entries_is_kept() {
        let params = parameters(json!([
            {"name": "b", "in": "query"},
            {"$ref": "#/components/parameters/a"},
            {"name": "c", "in": "header"},
        ]))
        .unwrap();
        assert!(params[0].as_item().is_some());
        assert!(params[1].is_reference());
        assert_eq!(params[2].as_item().unwrap().name(), "c");
    }

    #[test]
    fn unmatched_entry_lists_both_attempts() {
        let err = parameters(json!([{"description": "neither"}])).unwrap_err();
        let errors = err.violations().unwrap();
        assert_eq!(errors.len(), 1);
        let Violation::Unresolved { path, attempts } = &errors.violations()[0] else {
            panic!("expected an unresolved entry, got {:?}", errors);
        };
        assert_eq!(path, "#/parameters/0");
        let shapes: Vec<_> = attempts.iter().map(|a| a.shape).collect();
        assert_eq!(shapes, vec!["Reference", "Parameter"]);
        assert!(attempts.iter().all(|a| !a.violations.is_empty()));
    }

    #[test]
    fn non_mapping_entry_is_unresolved() {
        let err = parameters(json!(["id"])).unwrap_err();
        let errors = err.violations().unwrap();
        assert!(matches!(
            errors.violations()[0],
            Violation::Unresolved { .. }
        ));
    }

    #[test]
    fn non_string_ref_falls_through_to_parameter() {
        let err = parameters(json!([{"$ref": 7}])).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("matches none of Reference, Parameter"));
        assert!(message.contains("#/parameters/0/$ref"));
    }
}
