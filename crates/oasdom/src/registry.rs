//! Node type declarations and the linking pass.
//!
//! Node types refer to each other by name: a path item holds operations,
//! an operation holds callbacks, a callback holds path items. Types are
//! first declared with [`TypeRef::Named`] placeholders, then a single
//! [`TypeRegistry::link`] call resolves every placeholder to a [`TypeId`].
//! Parsing and serializing only work against a linked registry.

use std::collections::HashMap;
use std::sync::{LazyLock, OnceLock};

use parking_lot::Mutex;

use crate::callback::Callback;
use crate::error::{LinkError, UnlinkedTypeError};
use crate::logging::events;
use crate::node::sealed::NodeImpl;
use crate::operation::Operation;
use crate::parameter::Parameter;
use crate::path_item::PathItem;
use crate::reference::Reference;
use crate::server::{Server, ServerVariable};

/// Index of a declaration inside a linked registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(usize);

/// A reference from a field to a node type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// Placeholder, not yet resolved.
    Named(&'static str),
    /// Resolved by the linking pass. The id is only meaningful in the
    /// registry that produced it; linking again re-resolves by `name`.
    Linked { name: &'static str, id: TypeId },
}

/// Declared type of a field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    String,
    Bool,
    /// Any decoded value, kept opaque.
    Any,
    Node(TypeRef),
    List(Box<Shape>),
    /// String-keyed mapping of values.
    Map(Box<Shape>),
    /// One of several node types, tried in the listed order.
    OneOf(Vec<TypeRef>),
}

impl Shape {
    pub fn node(name: &'static str) -> Self {
        Shape::Node(TypeRef::Named(name))
    }

    pub fn list(item: Shape) -> Self {
        Shape::List(Box::new(item))
    }

    pub fn map(value: Shape) -> Self {
        Shape::Map(Box::new(value))
    }

    pub fn one_of(names: &[&'static str]) -> Self {
        Shape::OneOf(names.iter().map(|n| TypeRef::Named(*n)).collect())
    }

    /// Candidate types of the innermost `OneOf`, looking through lists and maps.
    pub fn candidates(&self) -> Option<&[TypeRef]> {
        match self {
            Shape::OneOf(refs) => Some(refs),
            Shape::List(inner) | Shape::Map(inner) => inner.candidates(),
            _ => None,
        }
    }

    /// Target of the innermost single-node shape, looking through lists and maps.
    pub fn target(&self) -> Option<&TypeRef> {
        match self {
            Shape::Node(r) => Some(r),
            Shape::List(inner) | Shape::Map(inner) => inner.target(),
            _ => None,
        }
    }

    fn resolve(
        &mut self,
        owner: &'static str,
        field: &'static str,
        index: &HashMap<&'static str, TypeId>,
    ) -> Result<(), LinkError> {
        match self {
            Shape::String | Shape::Bool | Shape::Any => Ok(()),
            Shape::Node(r) => r.resolve(owner, field, index),
            Shape::List(inner) | Shape::Map(inner) => inner.resolve(owner, field, index),
            Shape::OneOf(refs) => refs
                .iter_mut()
                .try_for_each(|r| r.resolve(owner, field, index)),
        }
    }
}

impl TypeRef {
    /// Name of the referenced type.
    pub fn name(&self) -> &'static str {
        match self {
            TypeRef::Named(name) | TypeRef::Linked { name, .. } => *name,
        }
    }

    fn resolve(
        &mut self,
        owner: &'static str,
        field: &'static str,
        index: &HashMap<&'static str, TypeId>,
    ) -> Result<(), LinkError> {
        let name = self.name();
        let id = index
            .get(name)
            .copied()
            .ok_or(LinkError::UnknownType { owner, field, name })?;
        *self = TypeRef::Linked { name, id };
        Ok(())
    }
}

/// A recognized field of an object-shaped node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    /// Key used in the document.
    pub wire: &'static str,
    pub shape: Shape,
    pub required: bool,
}

impl FieldDecl {
    pub fn optional(wire: &'static str, shape: Shape) -> Self {
        Self {
            wire,
            shape,
            required: false,
        }
    }

    pub fn required(wire: &'static str, shape: Shape) -> Self {
        Self {
            wire,
            shape,
            required: true,
        }
    }
}

/// How a node's keys are laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    /// Fixed set of recognized fields; every other key is an extension.
    Object(Vec<FieldDecl>),
    /// Free-form keys, every value of the given shape.
    Map(Shape),
}

/// Declaration of one node type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDecl {
    pub name: &'static str,
    pub layout: Layout,
}

impl NodeDecl {
    pub fn object(name: &'static str, fields: Vec<FieldDecl>) -> Self {
        Self {
            name,
            layout: Layout::Object(fields),
        }
    }

    pub fn map(name: &'static str, values: Shape) -> Self {
        Self {
            name,
            layout: Layout::Map(values),
        }
    }

    pub fn fields(&self) -> &[FieldDecl] {
        match &self.layout {
            Layout::Object(fields) => fields,
            Layout::Map(_) => &[],
        }
    }

    pub fn field(&self, wire: &str) -> Option<&FieldDecl> {
        self.fields().iter().find(|f| f.wire == wire)
    }

    /// Whether `key` is a recognized field (never true for map layouts).
    pub fn recognizes(&self, key: &str) -> bool {
        self.field(key).is_some()
    }

    fn resolve(&mut self, index: &HashMap<&'static str, TypeId>) -> Result<(), LinkError> {
        let owner = self.name;
        match &mut self.layout {
            Layout::Object(fields) => fields
                .iter_mut()
                .try_for_each(|f| f.shape.resolve(owner, f.wire, index)),
            Layout::Map(values) => values.resolve(owner, "*", index),
        }
    }
}

/// The resolution table produced by linking.
#[derive(Debug)]
pub struct LinkedTypes {
    decls: Vec<NodeDecl>,
    index: HashMap<&'static str, TypeId>,
}

impl LinkedTypes {
    pub fn id(&self, name: &str) -> Option<TypeId> {
        self.index.get(name).copied()
    }

    pub fn name(&self, id: TypeId) -> Option<&'static str> {
        self.decls.get(id.0).map(|d| d.name)
    }

    /// Linked declaration for `name`.
    pub fn decl(&self, name: &'static str) -> Result<&NodeDecl, UnlinkedTypeError> {
        self.id(name)
            .map(|id| &self.decls[id.0])
            .ok_or(UnlinkedTypeError { type_name: name })
    }

    /// Names a resolved reference points at.
    pub fn target_name(&self, r: &TypeRef) -> Option<&'static str> {
        match r {
            TypeRef::Linked { name, id } => self.name(*id).filter(|n| n == name),
            TypeRef::Named(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}

/// A set of node type declarations, in the Declared or Linked state.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    decls: Vec<NodeDecl>,
    linked: OnceLock<LinkedTypes>,
    link_guard: Mutex<()>,
}

impl TypeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry declaring the OpenAPI node types. Not linked yet.
    pub fn openapi() -> Self {
        Self {
            decls: vec![
                Reference::declare(),
                ServerVariable::declare(),
                Server::declare(),
                Parameter::declare(),
                PathItem::declare(),
                Operation::declare(),
                Callback::declare(),
            ],
            ..Self::default()
        }
    }

    /// Add a declaration. Its placeholders may name types declared later.
    pub fn declare(&mut self, decl: NodeDecl) -> Result<(), LinkError> {
        if self.is_linked() {
            return Err(LinkError::AlreadyLinked(decl.name));
        }
        if self.decls.iter().any(|d| d.name == decl.name) {
            return Err(LinkError::Duplicate(decl.name));
        }
        self.decls.push(decl);
        Ok(())
    }

    pub fn is_linked(&self) -> bool {
        self.linked.get().is_some()
    }

    /// Resolve every placeholder in every declaration.
    ///
    /// Runs at most once; later calls return the existing table. Safe to
    /// call from several threads, all of them observe the same table.
    pub fn link(&self) -> Result<&LinkedTypes, LinkError> {
        if let Some(linked) = self.linked.get() {
            tracing::trace!(event = events::LINK_SKIPPED, "type registry already linked");
            return Ok(linked);
        }

        let _guard = self.link_guard.lock();
        if let Some(linked) = self.linked.get() {
            return Ok(linked);
        }

        let index: HashMap<&'static str, TypeId> = self
            .decls
            .iter()
            .enumerate()
            .map(|(i, d)| (d.name, TypeId(i)))
            .collect();

        let mut decls = self.decls.clone();
        for decl in &mut decls {
            decl.resolve(&index)?;
        }

        tracing::debug!(
            event = events::TYPES_LINKED,
            types = decls.len(),
            "type registry linked"
        );
        Ok(self.linked.get_or_init(|| LinkedTypes { decls, index }))
    }

    /// The linked table, or the error to raise when used too early.
    pub fn linked(&self, type_name: &'static str) -> Result<&LinkedTypes, UnlinkedTypeError> {
        self.linked.get().ok_or(UnlinkedTypeError { type_name })
    }
}

static OPENAPI: LazyLock<TypeRegistry> = LazyLock::new(TypeRegistry::openapi);

/// The process-wide OpenAPI registry. Declared on first access, linked by [`link`].
pub fn registry() -> &'static TypeRegistry {
    &OPENAPI
}

/// Link the process-wide registry.
///
/// Call once during startup, before the first parse. Repeated calls are no-ops.
pub fn link() -> Result<(), LinkError> {
    OPENAPI.link().map(|_| ())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::ParseOptions;
    use crate::node::Node;

    #[test]
    fn openapi_registry_starts_declared() {
        let registry = TypeRegistry::openapi();
        assert!(!registry.is_linked());
        assert_eq!(
            registry.linked("PathItem").unwrap_err(),
            UnlinkedTypeError {
                type_name: "PathItem"
            }
        );
    }

    #[test]
    fn link_resolves_the_path_item_operation_cycle() {
        let registry = TypeRegistry::openapi();
        let types = registry.link().unwrap();

        let path_item = types.decl("PathItem").unwrap();
        let get = path_item.field("get").unwrap();
        let target = get.shape.target().unwrap();
        assert_eq!(types.target_name(target), Some("Operation"));

        let callback = types.decl("Callback").unwrap();
        let Layout::Map(values) = &callback.layout else {
            panic!("callback should be a map layout");
        };
        assert_eq!(types.target_name(values.target().unwrap()), Some("PathItem"));
    }

    #[test]
    fn link_is_idempotent() {
        let registry = TypeRegistry::openapi();
        let first = registry.link().unwrap() as *const LinkedTypes;
        let second = registry.link().unwrap() as *const LinkedTypes;
        assert_eq!(first, second);
        assert!(registry.is_linked());
    }

    #[test]
    fn parameters_try_reference_first() {
        let registry = TypeRegistry::openapi();
        let types = registry.link().unwrap();
        let field = types.decl("PathItem").unwrap().field("parameters").unwrap();
        let order: Vec<_> = field
            .shape
            .candidates()
            .unwrap()
            .iter()
            .filter_map(|r| types.target_name(r))
            .collect();
        assert_eq!(order, vec!["Reference", "Parameter"]);
    }

    #[test]
    fn link_reports_undeclared_placeholder() {
        let mut registry = TypeRegistry::new();
        registry
            .declare(NodeDecl::object(
                "PathItem",
                vec![FieldDecl::optional("get", Shape::node("Operation"))],
            ))
            .unwrap();

        let err = registry.link().unwrap_err();
        assert_eq!(
            err,
            LinkError::UnknownType {
                owner: "PathItem",
                field: "get",
                name: "Operation"
            }
        );
        assert!(!registry.is_linked());
    }

    #[test]
    fn placeholders_may_precede_their_declaration() {
        let mut registry = TypeRegistry::new();
        registry
            .declare(NodeDecl::object(
                "A",
                vec![FieldDecl::optional("b", Shape::node("B"))],
            ))
            .unwrap();
        registry
            .declare(NodeDecl::map("B", Shape::node("A")))
            .unwrap();
        assert!(registry.link().is_ok());
    }

    #[test]
    fn declare_rejects_duplicates() {
        let mut registry = TypeRegistry::new();
        registry.declare(NodeDecl::map("A", Shape::Any)).unwrap();
        assert_eq!(
            registry.declare(NodeDecl::map("A", Shape::Any)),
            Err(LinkError::Duplicate("A"))
        );
    }

    #[test]
    fn declare_after_link_is_rejected() {
        let mut registry = TypeRegistry::new();
        registry.declare(NodeDecl::map("A", Shape::Any)).unwrap();
        registry.link().unwrap();
        assert_eq!(
            registry.declare(NodeDecl::map("B", Shape::Any)),
            Err(LinkError::AlreadyLinked("B"))
        );
    }

    #[test]
    fn linked_decl_is_relinked_by_name_in_another_registry() {
        let source = TypeRegistry::openapi();
        let path_item = source.link().unwrap().decl("PathItem").unwrap().clone();

        let mut alone = TypeRegistry::new();
        alone.declare(path_item).unwrap();
        assert_eq!(
            alone.link().unwrap_err(),
            LinkError::UnknownType {
                owner: "PathItem",
                field: "get",
                name: "Operation"
            }
        );
    }

    #[test]
    fn relinked_decls_get_ids_from_the_new_registry() {
        let source = TypeRegistry::openapi();
        let linked = source.link().unwrap();

        let mut reordered = TypeRegistry::new();
        for name in [
            "PathItem",
            "Callback",
            "Operation",
            "Parameter",
            "Server",
            "ServerVariable",
            "Reference",
        ] {
            reordered.declare(linked.decl(name).unwrap().clone()).unwrap();
        }
        let types = reordered.link().unwrap();
        let get = types.decl("PathItem").unwrap().field("get").unwrap();
        assert_eq!(types.target_name(get.shape.target().unwrap()), Some("Operation"));

        let item = PathItem::parse_with(
            &reordered,
            &json!({"get": {"operationId": "a"}}),
            &ParseOptions::default(),
        )
        .unwrap();
        assert_eq!(item.get().unwrap().operation_id(), Some("a"));
    }

    #[test]
    fn foreign_type_id_does_not_resolve() {
        let registry = TypeRegistry::new();
        registry.link().unwrap();
        let types = registry.linked("PathItem").unwrap();
        let stray = TypeRef::Linked {
            name: "Operation",
            id: TypeId(5),
        };
        assert_eq!(types.name(TypeId(5)), None);
        assert_eq!(types.target_name(&stray), None);
    }

    #[test]
    fn concurrent_link_publishes_one_table() {
        let registry = TypeRegistry::openapi();
        let ptrs: Vec<usize> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| registry.link().unwrap() as *const LinkedTypes as usize))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(ptrs.windows(2).all(|w| w[0] == w[1]));
    }
}
