//! Operation parameters and where they are carried.

use std::fmt;

use serde_json::{Map, Value};

use crate::coerce::Cx;
use crate::error::Violation;
use crate::node::{sealed::NodeImpl, serde_via_registry, Node, Writer};
use crate::registry::{FieldDecl, NodeDecl, Shape};

/// Where a parameter is carried (`in`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterLocation {
    Query,
    Header,
    Path,
    Cookie,
}

impl ParameterLocation {
    pub const ALL: [ParameterLocation; 4] = [
        ParameterLocation::Query,
        ParameterLocation::Header,
        ParameterLocation::Path,
        ParameterLocation::Cookie,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Path => "path",
            ParameterLocation::Cookie => "cookie",
        }
    }

    /// Parse from the wire value.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.as_str() == s)
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single operation parameter.
///
/// `schema`, `example`, `examples` and `content` are kept as opaque values.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    location: ParameterLocation,
    description: Option<String>,
    required: Option<bool>,
    deprecated: Option<bool>,
    allow_empty_value: Option<bool>,
    style: Option<String>,
    explode: Option<bool>,
    allow_reserved: Option<bool>,
    schema: Option<Value>,
    example: Option<Value>,
    examples: Option<Value>,
    content: Option<Value>,
    extensions: Map<String, Value>,
}

impl Parameter {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> ParameterLocation {
        self.location
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The `required` flag as written; `None` when the document omits it.
    pub fn required(&self) -> Option<bool> {
        self.required
    }

    /// Whether the parameter must be supplied (path parameters always are).
    pub fn is_required(&self) -> bool {
        self.location == ParameterLocation::Path || self.required.unwrap_or(false)
    }

    pub fn deprecated(&self) -> Option<bool> {
        self.deprecated
    }

    pub fn allow_empty_value(&self) -> Option<bool> {
        self.allow_empty_value
    }

    pub fn style(&self) -> Option<&str> {
        self.style.as_deref()
    }

    pub fn explode(&self) -> Option<bool> {
        self.explode
    }

    pub fn allow_reserved(&self) -> Option<bool> {
        self.allow_reserved
    }

    pub fn schema(&self) -> Option<&Value> {
        self.schema.as_ref()
    }

    pub fn example(&self) -> Option<&Value> {
        self.example.as_ref()
    }

    pub fn examples(&self) -> Option<&Value> {
        self.examples.as_ref()
    }

    pub fn content(&self) -> Option<&Value> {
        self.content.as_ref()
    }

    pub fn extensions(&self) -> &Map<String, Value> {
        &self.extensions
    }
}

fn location(cx: &mut Cx<'_>, obj: &Map<String, Value>) -> Option<ParameterLocation> {
    let raw = cx.required_string(obj, "in")?;
    let parsed = ParameterLocation::parse(&raw);
    if parsed.is_none() {
        let path = cx.within("in", |cx| cx.pointer());
        cx.report(Violation::Invalid {
            path,
            reason: format!(
                "unknown parameter location '{}' (expected query, header, path or cookie)",
                raw
            ),
        });
    }
    parsed
}

impl Node for Parameter {
    const NAME: &'static str = "Parameter";
}

impl NodeImpl for Parameter {
    fn declare() -> NodeDecl {
        NodeDecl::object(
            Self::NAME,
            vec![
                FieldDecl::required("name", Shape::String),
                FieldDecl::required("in", Shape::String),
                FieldDecl::optional("description", Shape::String),
                FieldDecl::optional("required", Shape::Bool),
                FieldDecl::optional("deprecated", Shape::Bool),
                FieldDecl::optional("allowEmptyValue", Shape::Bool),
                FieldDecl::optional("style", Shape::String),
                FieldDecl::optional("explode", Shape::Bool),
                FieldDecl::optional("allowReserved", Shape::Bool),
                FieldDecl::optional("schema", Shape::Any),
                FieldDecl::optional("example", Shape::Any),
                FieldDecl::optional("examples", Shape::Any),
                FieldDecl::optional("content", Shape::Any),
            ],
        )
    }

    fn parse_fields(cx: &mut Cx<'_>, decl: &NodeDecl, obj: &Map<String, Value>) -> Self {
        Self {
            name: cx.required_string(obj, "name").unwrap_or_default(),
            location: location(cx, obj).unwrap_or(ParameterLocation::Query),
            description: cx.string(obj, "description"),
            required: cx.boolean(obj, "required"),
            deprecated: cx.boolean(obj, "deprecated"),
            allow_empty_value: cx.boolean(obj, "allowEmptyValue"),
            style: cx.string(obj, "style"),
            explode: cx.boolean(obj, "explode"),
            allow_reserved: cx.boolean(obj, "allowReserved"),
            schema: cx.any(obj, "schema"),
            example: cx.any(obj, "example"),
            examples: cx.any(obj, "examples"),
            content: cx.any(obj, "content"),
            extensions: cx.extensions(decl, obj),
        }
    }

    fn write_fields(&self, w: &mut Writer<'_>, out: &mut Map<String, Value>) {
        out.insert("name".to_string(), Value::String(self.name.clone()));
        out.insert("in".to_string(), Value::String(self.location.to_string()));
        w.put(out, "description", &self.description);
        w.put(out, "required", &self.required);
        w.put(out, "deprecated", &self.deprecated);
        w.put(out, "allowEmptyValue", &self.allow_empty_value);
        w.put(out, "style", &self.style);
        w.put(out, "explode", &self.explode);
        w.put(out, "allowReserved", &self.allow_reserved);
        w.put(out, "schema", &self.schema);
        w.put(out, "example", &self.example);
        w.put(out, "examples", &self.examples);
        w.put(out, "content", &self.content);
        w.put_extensions(out, &self.extensions);
    }
}

serde_via_registry!(Parameter);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::ParseOptions;
    use crate::registry::TypeRegistry;

    fn parse(value: Value) -> Result<Parameter, crate::ModelError> {
        let registry = TypeRegistry::openapi();
        registry.link().unwrap();
        Parameter::parse_with(&registry, &value, &ParseOptions::default())
    }

    #[test]
    fn location_round_trips_through_wire_name() {
        for location in ParameterLocation::ALL {
            assert_eq!(ParameterLocation::parse(location.as_str()), Some(location));
        }
        assert_eq!(ParameterLocation::parse("body"), None);
    }

    #[test]
    fn parse_query_parameter() {
        let param = parse(json!({
            "name": "limit",
            "in": "query",
            "schema": {"type": "integer", "maximum": 100},
            "example": 20
        }))
        .unwrap();
        assert_eq!(param.location(), ParameterLocation::Query);
        assert_eq!(param.required(), None);
        assert!(!param.is_required());
        assert_eq!(param.example(), Some(&json!(20)));
    }

    #[test]
    fn path_parameter_is_always_required() {
        let param = parse(json!({"name": "id", "in": "path"})).unwrap();
        assert!(param.is_required());
    }

    #[test]
    fn unknown_location_is_invalid() {
        let err = parse(json!({"name": "payload", "in": "body"})).unwrap_err();
        let errors = err.violations().unwrap();
        assert_eq!(errors.paths(), vec!["#/in"]);
        assert!(errors.to_string().contains("unknown parameter location 'body'"));
    }

    #[test]
    fn all_field_problems_are_reported() {
        let err = parse(json!({"in": "query", "required": "yes", "explode": 1})).unwrap_err();
        assert_eq!(
            err.violations().unwrap().paths(),
            vec!["#", "#/required", "#/explode"]
        );
    }
}
