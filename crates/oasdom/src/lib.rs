//! Typed document model for OpenAPI 3.x path items.
//!
//! Decoded JSON/YAML values (`serde_json::Value`) are validated into
//! immutable nodes ([`PathItem`], [`Operation`], [`Parameter`], ...) and
//! serialized back without losing unrecognized keys.
//!
//! Path items hold operations, operations hold callbacks, callbacks hold
//! path items. The node types are declared by name in a [`TypeRegistry`]
//! and resolved by one linking pass, which must run before the first parse:
//!
//! ```
//! use oasdom::{Node, PathItem};
//!
//! oasdom::link().expect("built-in types link");
//!
//! let raw = serde_json::json!({
//!     "summary": "Pets",
//!     "get": {"operationId": "listPets"},
//!     "x-owner": "pets-team"
//! });
//! let item = PathItem::parse(&raw).unwrap();
//! assert_eq!(item.get().unwrap().operation_id(), Some("listPets"));
//! assert_eq!(item.to_value().unwrap(), raw);
//! ```

mod coerce;
pub mod config;
pub mod error;
pub mod logging;
pub mod node;
pub mod registry;
pub mod resolve;

pub mod callback;
pub mod operation;
pub mod parameter;
pub mod path_item;
pub mod reference;
pub mod server;

pub use callback::Callback;
pub use coerce::ValueKind;
pub use config::ParseOptions;
pub use error::{Attempt, LinkError, ModelError, UnlinkedTypeError, ValidationErrors, Violation};
pub use node::Node;
pub use operation::Operation;
pub use parameter::{Parameter, ParameterLocation};
pub use path_item::{Method, PathItem};
pub use reference::Reference;
pub use registry::{link, registry, TypeRegistry};
pub use resolve::RefOr;
pub use server::{Server, ServerVariable};
