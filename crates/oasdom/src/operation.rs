//! The Operation node.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::callback::Callback;
use crate::coerce::Cx;
use crate::node::{sealed::NodeImpl, serde_via_registry, Node, Writer};
use crate::parameter::Parameter;
use crate::registry::{FieldDecl, NodeDecl, Shape};
use crate::resolve::RefOr;
use crate::server::Server;

/// A single API operation on a path.
///
/// `externalDocs`, `requestBody`, `responses` and `security` are kept as
/// opaque values.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    tags: Option<Vec<String>>,
    summary: Option<String>,
    description: Option<String>,
    external_docs: Option<Value>,
    operation_id: Option<String>,
    parameters: Option<Vec<RefOr<Parameter>>>,
    request_body: Option<Value>,
    responses: Option<Value>,
    callbacks: Option<IndexMap<String, RefOr<Callback>>>,
    deprecated: Option<bool>,
    security: Option<Value>,
    servers: Option<Vec<Server>>,
    extensions: Map<String, Value>,
}

impl Operation {
    pub fn tags(&self) -> Option<&[String]> {
        self.tags.as_deref()
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn external_docs(&self) -> Option<&Value> {
        self.external_docs.as_ref()
    }

    pub fn operation_id(&self) -> Option<&str> {
        self.operation_id.as_deref()
    }

    pub fn parameters(&self) -> Option<&[RefOr<Parameter>]> {
        self.parameters.as_deref()
    }

    pub fn request_body(&self) -> Option<&Value> {
        self.request_body.as_ref()
    }

    pub fn responses(&self) -> Option<&Value> {
        self.responses.as_ref()
    }

    pub fn callbacks(&self) -> Option<&IndexMap<String, RefOr<Callback>>> {
        self.callbacks.as_ref()
    }

    pub fn deprecated(&self) -> Option<bool> {
        self.deprecated
    }

    pub fn security(&self) -> Option<&Value> {
        self.security.as_ref()
    }

    pub fn servers(&self) -> Option<&[Server]> {
        self.servers.as_deref()
    }

    pub fn extensions(&self) -> &Map<String, Value> {
        &self.extensions
    }
}

impl Node for Operation {
    const NAME: &'static str = "Operation";
}

impl NodeImpl for Operation {
    fn declare() -> NodeDecl {
        NodeDecl::object(
            Self::NAME,
            vec![
                FieldDecl::optional("tags", Shape::list(Shape::String)),
                FieldDecl::optional("summary", Shape::String),
                FieldDecl::optional("description", Shape::String),
                FieldDecl::optional("externalDocs", Shape::Any),
                FieldDecl::optional("operationId", Shape::String),
                FieldDecl::optional(
                    "parameters",
                    Shape::list(Shape::one_of(&["Reference", "Parameter"])),
                ),
                FieldDecl::optional("requestBody", Shape::Any),
                FieldDecl::optional("responses", Shape::Any),
                FieldDecl::optional(
                    "callbacks",
                    Shape::map(Shape::one_of(&["Reference", "Callback"])),
                ),
                FieldDecl::optional("deprecated", Shape::Bool),
                FieldDecl::optional("security", Shape::Any),
                FieldDecl::optional("servers", Shape::list(Shape::node("Server"))),
            ],
        )
    }

    fn parse_fields(cx: &mut Cx<'_>, decl: &NodeDecl, obj: &Map<String, Value>) -> Self {
        Self {
            tags: cx.strings(obj, "tags"),
            summary: cx.string(obj, "summary"),
            description: cx.string(obj, "description"),
            external_docs: cx.any(obj, "externalDocs"),
            operation_id: cx.string(obj, "operationId"),
            parameters: RefOr::list(cx, decl, obj, "parameters"),
            request_body: cx.any(obj, "requestBody"),
            responses: cx.any(obj, "responses"),
            callbacks: RefOr::map(cx, decl, obj, "callbacks"),
            deprecated: cx.boolean(obj, "deprecated"),
            security: cx.any(obj, "security"),
            servers: cx.node_list(decl, obj, "servers"),
            extensions: cx.extensions(decl, obj),
        }
    }

    fn write_fields(&self, w: &mut Writer<'_>, out: &mut Map<String, Value>) {
        w.put(out, "tags", &self.tags);
        w.put(out, "summary", &self.summary);
        w.put(out, "description", &self.description);
        w.put(out, "externalDocs", &self.external_docs);
        w.put(out, "operationId", &self.operation_id);
        RefOr::put_list(w, out, "parameters", &self.parameters);
        w.put(out, "requestBody", &self.request_body);
        w.put(out, "responses", &self.responses);
        RefOr::put_map(w, out, "callbacks", &self.callbacks);
        w.put(out, "deprecated", &self.deprecated);
        w.put(out, "security", &self.security);
        w.put_nodes(out, "servers", &self.servers);
        w.put_extensions(out, &self.extensions);
    }
}

serde_via_registry!(Operation);
