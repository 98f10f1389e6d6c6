pub mod auth;
pub mod binder;
pub mod descriptor;
pub mod error;
pub mod schema;

pub use binder::{BoundRequest, bind, unbind};
pub use descriptor::{EndpointDescriptor, HttpMethod, ParameterBinding, ParameterLocation, Registry};
pub use error::{BindingError, Issue, IssueKind, RegistryError, SchemaError, ValidationError};
pub use schema::{Schema, SchemaKind, StringFormat, validate_arguments};
