//! Endpoint descriptors and the registry that holds them.

use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RegistryError;
use crate::schema::Schema;

/// Field name that carries the request body. Never bound as a parameter.
pub const REQUEST_BODY_FIELD: &str = "requestBody";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterBinding {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
}

/// One remote operation: how it is named and described to the caller, which
/// arguments it accepts, and how those arguments map onto an HTTP request.
#[derive(Debug, Clone)]
pub struct EndpointDescriptor {
    pub name: String,
    pub description: String,
    pub method: HttpMethod,
    pub path_template: String,
    pub parameters: Vec<ParameterBinding>,
    pub input_schema: Schema,
}

impl EndpointDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        method: HttpMethod,
        path_template: impl Into<String>,
        input_schema: Schema,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            method,
            path_template: path_template.into(),
            parameters: Vec::new(),
            input_schema,
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, location: ParameterLocation) -> Self {
        self.parameters.push(ParameterBinding {
            name: name.into(),
            location,
        });
        self
    }

    pub fn placeholders(&self) -> Vec<&str> {
        placeholders(&self.path_template)
    }

    fn check(&self) -> Result<(), RegistryError> {
        let mut seen = HashSet::new();
        for binding in &self.parameters {
            if binding.name == REQUEST_BODY_FIELD {
                return Err(RegistryError::ReservedBinding {
                    tool: self.name.clone(),
                });
            }
            if !seen.insert(binding.name.as_str()) {
                return Err(RegistryError::DuplicateBinding {
                    tool: self.name.clone(),
                    name: binding.name.clone(),
                });
            }
        }

        let placeholders = self.placeholders();
        for placeholder in &placeholders {
            let bound = self
                .parameters
                .iter()
                .any(|b| b.location == ParameterLocation::Path && b.name == *placeholder);
            if !bound {
                return Err(RegistryError::UnboundPlaceholder {
                    tool: self.name.clone(),
                    placeholder: placeholder.to_string(),
                });
            }
        }
        for binding in self
            .parameters
            .iter()
            .filter(|b| b.location == ParameterLocation::Path)
        {
            if !placeholders.contains(&binding.name.as_str()) {
                return Err(RegistryError::OrphanPathBinding {
                    tool: self.name.clone(),
                    name: binding.name.clone(),
                    path_template: self.path_template.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Names of the `{name}` placeholders in a path template, in order of appearance.
pub fn placeholders(template: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            break;
        };
        names.push(&after[..close]);
        rest = &after[close + 1..];
    }
    names
}

/// Immutable, name-indexed set of endpoint descriptors. Iteration follows
/// insertion order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    descriptors: Vec<EndpointDescriptor>,
    index: HashMap<String, usize>,
}

impl Registry {
    pub fn new(descriptors: Vec<EndpointDescriptor>) -> Result<Self, RegistryError> {
        let mut index = HashMap::with_capacity(descriptors.len());
        for (position, descriptor) in descriptors.iter().enumerate() {
            descriptor.check()?;
            if index.insert(descriptor.name.clone(), position).is_some() {
                return Err(RegistryError::DuplicateName(descriptor.name.clone()));
            }
        }
        Ok(Self { descriptors, index })
    }

    /// Builds a registry from a JSON catalog document: an array of
    /// `{name, description, method, pathTemplate, parameters, inputSchema}`.
    pub fn from_json_catalog(raw: &str) -> Result<Self, RegistryError> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(raw)?;
        let descriptors = entries
            .into_iter()
            .map(CatalogEntry::into_descriptor)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(descriptors)
    }

    pub fn lookup(&self, name: &str) -> Option<&EndpointDescriptor> {
        self.index.get(name).map(|&i| &self.descriptors[i])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EndpointDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a EndpointDescriptor;
    type IntoIter = std::slice::Iter<'a, EndpointDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogEntry {
    name: String,
    #[serde(default)]
    description: String,
    method: HttpMethod,
    path_template: String,
    #[serde(default)]
    parameters: Vec<ParameterBinding>,
    #[serde(default)]
    input_schema: Option<Value>,
}

impl CatalogEntry {
    fn into_descriptor(self) -> Result<EndpointDescriptor, RegistryError> {
        let input_schema = match &self.input_schema {
            Some(doc) => Schema::from_json_schema(doc).map_err(|source| RegistryError::Schema {
                tool: self.name.clone(),
                source,
            })?,
            None => Schema::object(),
        };
        Ok(EndpointDescriptor {
            name: self.name,
            description: self.description,
            method: self.method,
            path_template: self.path_template,
            parameters: self.parameters,
            input_schema,
        })
    }
}
