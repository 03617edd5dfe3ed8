//! Coercion of decoded values into typed fields.
//!
//! [`Cx`] walks one document tree, tracks the current location and
//! collects every violation instead of stopping at the first one.

use std::fmt;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::config::ParseOptions;
use crate::error::{ModelError, UnlinkedTypeError, ValidationErrors, Violation};
use crate::node::Node;
use crate::registry::{LinkedTypes, NodeDecl, Shape};

/// Basic kind of a decoded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Boolean,
    Number,
    String,
    Sequence,
    Mapping,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Boolean,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Sequence,
            Value::Object(_) => ValueKind::Mapping,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Sequence => "sequence",
            ValueKind::Mapping => "mapping",
        })
    }
}

/// Render path segments as a JSON pointer rooted at `#`.
fn pointer(segments: &[String]) -> String {
    let mut out = String::from("#");
    for seg in segments {
        out.push('/');
        out.push_str(&seg.replace('~', "~0").replace('/', "~1"));
    }
    out
}

/// Parse state for one document tree.
pub struct Cx<'a> {
    types: &'a LinkedTypes,
    options: &'a ParseOptions,
    segments: Vec<String>,
    depth: usize,
    violations: Vec<Violation>,
    fatal: Option<UnlinkedTypeError>,
}

impl<'a> Cx<'a> {
    pub(crate) fn new(types: &'a LinkedTypes, options: &'a ParseOptions) -> Self {
        Self {
            types,
            options,
            segments: Vec::new(),
            depth: 0,
            violations: Vec::new(),
            fatal: None,
        }
    }

    pub(crate) fn types(&self) -> &'a LinkedTypes {
        self.types
    }

    /// Turn the collected state into the parse result.
    pub(crate) fn finish<T>(self, node: Option<T>) -> Result<T, ModelError> {
        if let Some(err) = self.fatal {
            return Err(err.into());
        }
        match node {
            Some(node) if self.violations.is_empty() => Ok(node),
            _ => Err(ValidationErrors::new(self.violations).into()),
        }
    }

    pub(crate) fn pointer(&self) -> String {
        pointer(&self.segments)
    }

    pub(crate) fn report(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Record an initialization error. Only the first one is kept.
    pub(crate) fn fail(&mut self, err: UnlinkedTypeError) {
        self.fatal.get_or_insert(err);
    }

    /// Run `f` one level deeper in the document.
    pub(crate) fn within<R>(
        &mut self,
        segment: impl Into<String>,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        self.segments.push(segment.into());
        let out = f(self);
        self.segments.pop();
        out
    }

    fn mismatch(&mut self, expected: &'static str, found: &Value) {
        let path = self.pointer();
        self.report(Violation::Shape {
            path,
            expected,
            found: ValueKind::of(found),
        });
    }

    /// Scalar coercion. `null` is a shape violation, not an absent field:
    /// an absent field is omitted on serialize, so accepting `null` would
    /// drop the key from the round trip. YAML `description:` with no value
    /// decodes to `null` and is rejected the same way.
    pub(crate) fn as_string(&mut self, value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            other => {
                self.mismatch("string", other);
                None
            }
        }
    }

    pub(crate) fn as_bool(&mut self, value: &Value) -> Option<bool> {
        match value {
            Value::Bool(b) => Some(*b),
            other => {
                self.mismatch("boolean", other);
                None
            }
        }
    }

    pub(crate) fn string(&mut self, obj: &Map<String, Value>, key: &str) -> Option<String> {
        let value = obj.get(key)?;
        self.within(key, |cx| cx.as_string(value))
    }

    pub(crate) fn required_string(
        &mut self,
        obj: &Map<String, Value>,
        key: &'static str,
    ) -> Option<String> {
        if !obj.contains_key(key) {
            let path = self.pointer();
            self.report(Violation::Missing { path, field: key });
            return None;
        }
        self.string(obj, key)
    }

    pub(crate) fn boolean(&mut self, obj: &Map<String, Value>, key: &str) -> Option<bool> {
        let value = obj.get(key)?;
        self.within(key, |cx| cx.as_bool(value))
    }

    /// Opaque value; any kind is accepted, `null` included.
    pub(crate) fn any(&self, obj: &Map<String, Value>, key: &str) -> Option<Value> {
        obj.get(key).cloned()
    }

    pub(crate) fn strings(&mut self, obj: &Map<String, Value>, key: &str) -> Option<Vec<String>> {
        self.list(obj, key, |cx, item| cx.as_string(item))
    }

    /// Sequence field, each element coerced by `each` at its own index.
    pub(crate) fn list<T>(
        &mut self,
        obj: &Map<String, Value>,
        key: &str,
        mut each: impl FnMut(&mut Self, &Value) -> Option<T>,
    ) -> Option<Vec<T>> {
        let value = obj.get(key)?;
        self.within(key, |cx| {
            let Some(items) = value.as_array() else {
                cx.mismatch("sequence", value);
                return None;
            };
            let out: Vec<T> = items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| cx.within(i.to_string(), |cx| each(cx, item)))
                .collect();
            Some(out)
        })
    }

    /// Mapping field, each value coerced by `each` under its own key.
    pub(crate) fn map<T>(
        &mut self,
        obj: &Map<String, Value>,
        key: &str,
        each: impl FnMut(&mut Self, &Value) -> Option<T>,
    ) -> Option<IndexMap<String, T>> {
        let value = obj.get(key)?;
        self.within(key, |cx| cx.entries(value, each))
    }

    /// Coerce every value of a mapping.
    pub(crate) fn entries<T>(
        &mut self,
        value: &Value,
        mut each: impl FnMut(&mut Self, &Value) -> Option<T>,
    ) -> Option<IndexMap<String, T>> {
        let Some(entries) = value.as_object() else {
            self.mismatch("mapping", value);
            return None;
        };
        let out: IndexMap<String, T> = entries
            .iter()
            .filter_map(|(k, v)| {
                self.within(k.as_str(), |cx| each(cx, v))
                    .map(|parsed| (k.clone(), parsed))
            })
            .collect();
        Some(out)
    }

    /// Parse a nested node at the current location.
    ///
    /// Returns `None` if the node, or anything below it, had a violation.
    pub(crate) fn node<T: Node>(&mut self, value: &Value) -> Option<T> {
        let types = self.types;
        let decl = match types.decl(T::NAME) {
            Ok(decl) => decl,
            Err(err) => {
                self.fail(err);
                return None;
            }
        };
        let Some(obj) = value.as_object() else {
            self.mismatch("mapping", value);
            return None;
        };
        if self.depth >= self.options.max_depth {
            let path = self.pointer();
            self.report(Violation::TooDeep {
                path,
                limit: self.options.max_depth,
            });
            return None;
        }

        let before = self.violations.len();
        self.depth += 1;
        let node = T::parse_fields(self, decl, obj);
        self.depth -= 1;
        (self.violations.len() == before && self.fatal.is_none()).then_some(node)
    }

    /// Check that `decl.key` was linked to the node type `name`.
    fn bound_to(&mut self, decl: &NodeDecl, key: &str, name: &'static str) -> bool {
        self.linked_to(decl.field(key).map(|f| &f.shape), name)
    }

    /// Check that `shape` was linked to the node type `name`.
    pub(crate) fn linked_to(&mut self, shape: Option<&Shape>, name: &'static str) -> bool {
        let target = shape
            .and_then(Shape::target)
            .and_then(|r| self.types.target_name(r));
        if target == Some(name) {
            true
        } else {
            self.fail(UnlinkedTypeError { type_name: name });
            false
        }
    }

    /// Optional single-node field.
    pub(crate) fn node_field<T: Node>(
        &mut self,
        decl: &NodeDecl,
        obj: &Map<String, Value>,
        key: &str,
    ) -> Option<T> {
        let value = obj.get(key)?;
        if !self.bound_to(decl, key, T::NAME) {
            return None;
        }
        self.within(key, |cx| cx.node::<T>(value))
    }

    /// Optional sequence-of-nodes field.
    pub(crate) fn node_list<T: Node>(
        &mut self,
        decl: &NodeDecl,
        obj: &Map<String, Value>,
        key: &str,
    ) -> Option<Vec<T>> {
        if !obj.contains_key(key) || !self.bound_to(decl, key, T::NAME) {
            return None;
        }
        self.list(obj, key, |cx, item| cx.node::<T>(item))
    }

    /// Optional mapping-of-nodes field.
    pub(crate) fn node_map<T: Node>(
        &mut self,
        decl: &NodeDecl,
        obj: &Map<String, Value>,
        key: &str,
    ) -> Option<IndexMap<String, T>> {
        if !obj.contains_key(key) || !self.bound_to(decl, key, T::NAME) {
            return None;
        }
        self.map(obj, key, |cx, item| cx.node::<T>(item))
    }

    /// Parse `value` as `T` without touching the collected violations.
    ///
    /// Used for trial parses; the caller decides what to report.
    pub(crate) fn attempt<T: Node>(&mut self, value: &Value) -> Result<T, Vec<Violation>> {
        let saved = std::mem::take(&mut self.violations);
        let node = self.node::<T>(value);
        let found = std::mem::replace(&mut self.violations, saved);
        match node {
            Some(node) => Ok(node),
            None => Err(found),
        }
    }

    /// Every key of `obj` that `decl` does not recognize, in input order.
    pub(crate) fn extensions(&self, decl: &NodeDecl, obj: &Map<String, Value>) -> Map<String, Value> {
        obj.iter()
            .filter(|(k, _)| !decl.recognizes(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::registry::TypeRegistry;

    fn with_cx<R>(f: impl FnOnce(&mut Cx<'_>) -> R) -> (R, Vec<Violation>) {
        let registry = TypeRegistry::openapi();
        let types = registry.link().unwrap();
        let options = ParseOptions::default();
        let mut cx = Cx::new(types, &options);
        let out = f(&mut cx);
        (out, cx.violations)
    }

    #[test]
    fn absent_field_is_none_without_violation() {
        let obj = json!({}).as_object().cloned().unwrap();
        let (out, violations) = with_cx(|cx| cx.string(&obj, "summary"));
        assert_eq!(out, None);
        assert!(violations.is_empty());
    }

    #[test]
    fn wrong_kind_reports_expected_and_found() {
        let obj = json!({"summary": 3}).as_object().cloned().unwrap();
        let (out, violations) = with_cx(|cx| cx.string(&obj, "summary"));
        assert_eq!(out, None);
        assert_eq!(
            violations,
            vec![Violation::Shape {
                path: "#/summary".into(),
                expected: "string",
                found: ValueKind::Number,
            }]
        );
    }

    #[test]
    fn null_is_not_an_absent_string() {
        let obj = json!({"summary": null}).as_object().cloned().unwrap();
        let (_, violations) = with_cx(|cx| cx.string(&obj, "summary"));
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn list_reports_each_bad_element() {
        let obj = json!({"tags": ["a", 1, "b", false]}).as_object().cloned().unwrap();
        let (out, violations) = with_cx(|cx| cx.strings(&obj, "tags"));
        assert_eq!(out, Some(vec!["a".to_string(), "b".to_string()]));
        let paths: Vec<_> = violations.iter().map(Violation::path).collect();
        assert_eq!(paths, vec!["#/tags/1", "#/tags/3"]);
    }

    #[test]
    fn pointer_escapes_slash_and_tilde() {
        let (path, _) = with_cx(|cx| cx.within("/pets/{id}", |cx| cx.within("a~b", |cx| cx.pointer())));
        assert_eq!(path, "#/~1pets~1{id}/a~0b");
    }

    #[test]
    fn required_string_reports_missing() {
        let obj = json!({}).as_object().cloned().unwrap();
        let (_, violations) = with_cx(|cx| cx.required_string(&obj, "url"));
        assert_eq!(
            violations,
            vec![Violation::Missing {
                path: "#".into(),
                field: "url"
            }]
        );
    }
}
