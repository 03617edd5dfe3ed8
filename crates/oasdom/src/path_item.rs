//! The Path Item node: the operations available on a single path.

use std::fmt;

use serde_json::{Map, Value};

use crate::coerce::Cx;
use crate::node::{sealed::NodeImpl, serde_via_registry, Node, Writer};
use crate::operation::Operation;
use crate::parameter::Parameter;
use crate::registry::{FieldDecl, NodeDecl, Shape};
use crate::resolve::RefOr;
use crate::server::Server;

/// HTTP methods a path item can declare an operation for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl Method {
    /// All methods, in document field order.
    pub const ALL: [Method; 8] = [
        Method::Get,
        Method::Put,
        Method::Post,
        Method::Delete,
        Method::Options,
        Method::Head,
        Method::Patch,
        Method::Trace,
    ];

    /// The lowercase field name used in documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Put => "put",
            Method::Post => "post",
            Method::Delete => "delete",
            Method::Options => "options",
            Method::Head => "head",
            Method::Patch => "patch",
            Method::Trace => "trace",
        }
    }

    /// Parse from a method name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

/// Operations, parameters and servers shared by one URL path template.
///
/// `$ref` does not suppress the other fields: a path item may point at a
/// shared definition and still declare its own operations. Keys the node
/// does not recognize are kept in [`PathItem::extensions`] and written back
/// unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct PathItem {
    ref_path: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    operations: [Option<Operation>; 8],
    servers: Option<Vec<Server>>,
    parameters: Option<Vec<RefOr<Parameter>>>,
    extensions: Map<String, Value>,
}

impl PathItem {
    /// Example documents, for documentation tooling only.
    pub const EXAMPLES: &'static [&'static str] = &[r##"{
  "get": {
    "description": "Returns pets based on ID",
    "summary": "Find pets by ID",
    "operationId": "getPetsById",
    "responses": {
      "200": {
        "description": "pet response",
        "content": {
          "*/*": {
            "schema": {"type": "array", "items": {"$ref": "#/components/schemas/Pet"}}
          }
        }
      },
      "default": {
        "description": "error payload",
        "content": {
          "text/html": {"schema": {"$ref": "#/components/schemas/ErrorModel"}}
        }
      }
    }
  },
  "parameters": [
    {
      "name": "id",
      "in": "path",
      "description": "ID of pet to use",
      "required": true,
      "schema": {"type": "array", "items": {"type": "string"}},
      "style": "simple"
    }
  ]
}"##];

    /// The `$ref` field.
    pub fn ref_path(&self) -> Option<&str> {
        self.ref_path.as_deref()
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn operation(&self, method: Method) -> Option<&Operation> {
        self.operations[method.index()].as_ref()
    }

    pub fn get(&self) -> Option<&Operation> {
        self.operation(Method::Get)
    }

    pub fn put(&self) -> Option<&Operation> {
        self.operation(Method::Put)
    }

    pub fn post(&self) -> Option<&Operation> {
        self.operation(Method::Post)
    }

    pub fn delete(&self) -> Option<&Operation> {
        self.operation(Method::Delete)
    }

    pub fn options(&self) -> Option<&Operation> {
        self.operation(Method::Options)
    }

    pub fn head(&self) -> Option<&Operation> {
        self.operation(Method::Head)
    }

    pub fn patch(&self) -> Option<&Operation> {
        self.operation(Method::Patch)
    }

    pub fn trace(&self) -> Option<&Operation> {
        self.operation(Method::Trace)
    }

    /// Declared operations, in method order.
    pub fn operations(&self) -> impl Iterator<Item = (Method, &Operation)> {
        Method::ALL
            .into_iter()
            .filter_map(|m| self.operation(m).map(|op| (m, op)))
    }

    pub fn servers(&self) -> Option<&[Server]> {
        self.servers.as_deref()
    }

    pub fn parameters(&self) -> Option<&[RefOr<Parameter>]> {
        self.parameters.as_deref()
    }

    /// Unrecognized keys, in input order.
    pub fn extensions(&self) -> &Map<String, Value> {
        &self.extensions
    }

    /// True when no field at all was given.
    pub fn is_empty(&self) -> bool {
        self.ref_path.is_none()
            && self.summary.is_none()
            && self.description.is_none()
            && self.operations.iter().all(Option::is_none)
            && self.servers.is_none()
            && self.parameters.is_none()
            && self.extensions.is_empty()
    }
}

impl Node for PathItem {
    const NAME: &'static str = "PathItem";
}

impl NodeImpl for PathItem {
    fn declare() -> NodeDecl {
        let mut fields = vec![
            FieldDecl::optional("$ref", Shape::String),
            FieldDecl::optional("summary", Shape::String),
            FieldDecl::optional("description", Shape::String),
        ];
        fields.extend(
            Method::ALL
                .iter()
                .map(|m| FieldDecl::optional(m.as_str(), Shape::node("Operation"))),
        );
        fields.push(FieldDecl::optional(
            "servers",
            Shape::list(Shape::node("Server")),
        ));
        fields.push(FieldDecl::optional(
            "parameters",
            Shape::list(Shape::one_of(&["Reference", "Parameter"])),
        ));
        NodeDecl::object(Self::NAME, fields)
    }

    fn parse_fields(cx: &mut Cx<'_>, decl: &NodeDecl, obj: &Map<String, Value>) -> Self {
        Self {
            ref_path: cx.string(obj, "$ref"),
            summary: cx.string(obj, "summary"),
            description: cx.string(obj, "description"),
            operations: Method::ALL.map(|m| cx.node_field(decl, obj, m.as_str())),
            servers: cx.node_list(decl, obj, "servers"),
            parameters: RefOr::list(cx, decl, obj, "parameters"),
            extensions: cx.extensions(decl, obj),
        }
    }

    fn write_fields(&self, w: &mut Writer<'_>, out: &mut Map<String, Value>) {
        w.put(out, "$ref", &self.ref_path);
        w.put(out, "summary", &self.summary);
        w.put(out, "description", &self.description);
        for method in Method::ALL {
            w.put_node(out, method.as_str(), &self.operations[method.index()]);
        }
        w.put_nodes(out, "servers", &self.servers);
        RefOr::put_list(w, out, "parameters", &self.parameters);
        w.put_extensions(out, &self.extensions);
    }
}

serde_via_registry!(PathItem);
