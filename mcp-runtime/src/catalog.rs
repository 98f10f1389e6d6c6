use configcat_core::{Registry, RegistryError};
use serde_json::{Value, json};
use tracing::debug;

/// Descriptor table for the ConfigCat Public Management API.
pub const ENDPOINT_CATALOG: &str = include_str!("../catalog/endpoints.json");

pub fn load_registry() -> Result<Registry, RegistryError> {
    let registry = Registry::from_json_catalog(ENDPOINT_CATALOG)?;
    debug!(tools = registry.len(), "endpoint registry loaded");
    Ok(registry)
}

/// Compact index of the registered endpoints, served as a resource.
pub fn catalog_index(registry: &Registry) -> Value {
    let endpoints: Vec<Value> = registry
        .iter()
        .map(|descriptor| {
            json!({
                "name": descriptor.name,
                "method": descriptor.method,
                "pathTemplate": descriptor.path_template,
                "parameters": descriptor.parameters,
            })
        })
        .collect();
    json!({ "count": endpoints.len(), "endpoints": endpoints })
}
