//! Server and server variable nodes.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::coerce::Cx;
use crate::node::{sealed::NodeImpl, serde_via_registry, Node, Writer};
use crate::registry::{FieldDecl, NodeDecl, Shape};

/// A server the API is reachable at.
#[derive(Debug, Clone, PartialEq)]
pub struct Server {
    url: String,
    description: Option<String>,
    variables: Option<IndexMap<String, ServerVariable>>,
    extensions: Map<String, Value>,
}

impl Server {
    /// URL template; `{name}` segments are substituted from `variables`.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn variables(&self) -> Option<&IndexMap<String, ServerVariable>> {
        self.variables.as_ref()
    }

    pub fn extensions(&self) -> &Map<String, Value> {
        &self.extensions
    }
}

impl Node for Server {
    const NAME: &'static str = "Server";
}

impl NodeImpl for Server {
    fn declare() -> NodeDecl {
        NodeDecl::object(
            Self::NAME,
            vec![
                FieldDecl::required("url", Shape::String),
                FieldDecl::optional("description", Shape::String),
                FieldDecl::optional("variables", Shape::map(Shape::node("ServerVariable"))),
            ],
        )
    }

    fn parse_fields(cx: &mut Cx<'_>, decl: &NodeDecl, obj: &Map<String, Value>) -> Self {
        Self {
            url: cx.required_string(obj, "url").unwrap_or_default(),
            description: cx.string(obj, "description"),
            variables: cx.node_map(decl, obj, "variables"),
            extensions: cx.extensions(decl, obj),
        }
    }

    fn write_fields(&self, w: &mut Writer<'_>, out: &mut Map<String, Value>) {
        out.insert("url".to_string(), Value::String(self.url.clone()));
        w.put(out, "description", &self.description);
        w.put_node_map(out, "variables", &self.variables);
        w.put_extensions(out, &self.extensions);
    }
}

/// A substitutable segment of a server URL template.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerVariable {
    allowed: Option<Vec<String>>,
    default: String,
    description: Option<String>,
    extensions: Map<String, Value>,
}

impl ServerVariable {
    /// The `enum` list of allowed values, if restricted.
    pub fn allowed(&self) -> Option<&[String]> {
        self.allowed.as_deref()
    }

    pub fn default_value(&self) -> &str {
        &self.default
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn extensions(&self) -> &Map<String, Value> {
        &self.extensions
    }
}

impl Node for ServerVariable {
    const NAME: &'static str = "ServerVariable";
}

impl NodeImpl for ServerVariable {
    fn declare() -> NodeDecl {
        NodeDecl::object(
            Self::NAME,
            vec![
                FieldDecl::optional("enum", Shape::list(Shape::String)),
                FieldDecl::required("default", Shape::String),
                FieldDecl::optional("description", Shape::String),
            ],
        )
    }

    fn parse_fields(cx: &mut Cx<'_>, decl: &NodeDecl, obj: &Map<String, Value>) -> Self {
        Self {
            allowed: cx.strings(obj, "enum"),
            default: cx.required_string(obj, "default").unwrap_or_default(),
            description: cx.string(obj, "description"),
            extensions: cx.extensions(decl, obj),
        }
    }

    fn write_fields(&self, w: &mut Writer<'_>, out: &mut Map<String, Value>) {
        w.put(out, "enum", &self.allowed);
        out.insert("default".to_string(), Value::String(self.default.clone()));
        w.put(out, "description", &self.description);
        w.put_extensions(out, &self.extensions);
    }
}

serde_via_registry!(Server, ServerVariable);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::ParseOptions;
    use crate::registry::TypeRegistry;

    fn parse(value: Value) -> Result<Server, crate::ModelError> {
        let registry = TypeRegistry::openapi();
        registry.link().unwrap();
        Server::parse_with(&registry, &value, &ParseOptions::default())
    }

    #[test]
    fn parse_server_with_variables() {
        let server = parse(json!({
            "url": "https://{region}.example.com/v1",
            "description": "regional",
            "variables": {
                "region": {"enum": ["eu", "us"], "default": "eu"}
            }
        }))
        .unwrap();

        assert_eq!(server.url(), "https://{region}.example.com/v1");
        let region = &server.variables().unwrap()["region"];
        assert_eq!(region.default_value(), "eu");
        assert_eq!(region.allowed().unwrap(), ["eu", "us"]);
    }

    #[test]
    fn server_requires_url() {
        let err = parse(json!({"description": "nowhere"})).unwrap_err();
        assert_eq!(err.violations().unwrap().paths(), vec!["#"]);
    }

    #[test]
    fn variable_requires_default() {
        let err = parse(json!({
            "url": "https://{env}.example.com",
            "variables": {"env": {"enum": ["dev"]}}
        }))
        .unwrap_err();
        assert_eq!(
            err.violations().unwrap().paths(),
            vec!["#/variables/env"]
        );
    }
}
