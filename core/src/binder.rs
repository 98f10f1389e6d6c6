//! Maps validated arguments onto a concrete HTTP request.

use serde_json::{Map, Value};

use crate::descriptor::{EndpointDescriptor, HttpMethod, ParameterLocation, REQUEST_BODY_FIELD};
use crate::error::BindingError;

/// A request ready for the executor. Query values stay as JSON; the executor
/// decides how each shape is serialized.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, Value)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

pub fn bind(
    descriptor: &EndpointDescriptor,
    args: &Map<String, Value>,
) -> Result<BoundRequest, BindingError> {
    let mut path = descriptor.path_template.clone();
    let mut query = Vec::new();
    let mut headers = Vec::new();

    for binding in &descriptor.parameters {
        let value = match args.get(&binding.name) {
            None | Some(Value::Null) => continue,
            Some(value) => value,
        };
        match binding.location {
            ParameterLocation::Path => {
                let encoded = urlencoding::encode(&stringify(value)).into_owned();
                path = path.replace(&format!("{{{}}}", binding.name), &encoded);
            }
            ParameterLocation::Query => query.push((binding.name.clone(), value.clone())),
            ParameterLocation::Header => {
                headers.push((binding.name.to_ascii_lowercase(), stringify(value)));
            }
        }
    }

    if path.contains('{') {
        return Err(BindingError::UnresolvedPath { path });
    }

    let body = args
        .get(REQUEST_BODY_FIELD)
        .filter(|body| !body.is_null())
        .cloned();

    Ok(BoundRequest {
        method: descriptor.method,
        path,
        query,
        headers,
        body,
    })
}

/// Recovers placeholder values from a resolved path. Returns `None` when the
/// path does not match the template's shape.
///
/// Recovered values are always strings: a number bound into the path comes
/// back as its decimal text (`7` as `"7"`).
pub fn unbind(template: &str, path: &str) -> Option<Map<String, Value>> {
    let template_segments: Vec<&str> = template.split('/').collect();
    let path_segments: Vec<&str> = path.split('/').collect();
    if template_segments.len() != path_segments.len() {
        return None;
    }

    let mut values = Map::new();
    for (pattern, actual) in template_segments.iter().zip(&path_segments) {
        match (pattern.find('{'), pattern.find('}')) {
            (Some(open), Some(close)) if open < close => {
                let prefix = &pattern[..open];
                let suffix = &pattern[close + 1..];
                let name = &pattern[open + 1..close];
                let raw = actual.strip_prefix(prefix)?.strip_suffix(suffix)?;
                let decoded = urlencoding::decode(raw).ok()?;
                values.insert(name.to_string(), Value::String(decoded.into_owned()));
            }
            _ if pattern == actual => {}
            _ => return None,
        }
    }
    Some(values)
}

/// Strings pass through verbatim; every other value is rendered as JSON text.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::schema::Schema;

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test arguments must be an object"),
        }
    }

    fn get_product() -> EndpointDescriptor {
        EndpointDescriptor::new(
            "get-product",
            "",
            HttpMethod::Get,
            "/v1/products/{productId}",
            Schema::object().required("productId", Schema::string()),
        )
        .with_parameter("productId", ParameterLocation::Path)
    }

    fn update_setting_value() -> EndpointDescriptor {
        EndpointDescriptor::new(
            "update-setting-value",
            "",
            HttpMethod::Put,
            "/v1/environments/{environmentId}/settings/{settingId}/value",
            Schema::object(),
        )
        .with_parameter("environmentId", ParameterLocation::Path)
        .with_parameter("settingId", ParameterLocation::Path)
        .with_parameter("reason", ParameterLocation::Query)
        .with_parameter("X-CONFIGCAT-SDKKEY", ParameterLocation::Header)
    }

    #[test]
    fn get_product_binds_only_the_path() {
        let bound = bind(&get_product(), &args(json!({ "productId": "abc-123" }))).unwrap();
        assert_eq!(bound.method, HttpMethod::Get);
        assert_eq!(bound.path, "/v1/products/abc-123");
        assert!(bound.query.is_empty());
        assert!(bound.headers.is_empty());
        assert!(bound.body.is_none());
    }

    #[test]
    fn binds_every_location_and_body() {
        let bound = bind(
            &update_setting_value(),
            &args(json!({
                "environmentId": "env 1/a",
                "settingId": 42,
                "reason": "rollout",
                "X-CONFIGCAT-SDKKEY": "sdk-key",
                "requestBody": { "value": true }
            })),
        )
        .unwrap();

        assert_eq!(bound.path, "/v1/environments/env%201%2Fa/settings/42/value");
        assert_eq!(bound.query, vec![("reason".to_string(), json!("rollout"))]);
        assert_eq!(
            bound.headers,
            vec![("x-configcat-sdkkey".to_string(), "sdk-key".to_string())]
        );
        assert_eq!(bound.body, Some(json!({ "value": true })));
    }

    #[test]
    fn omitted_and_null_optionals_never_appear() {
        let bound = bind(
            &update_setting_value(),
            &args(json!({
                "environmentId": "e",
                "settingId": 1,
                "reason": null,
                "requestBody": null
            })),
        )
        .unwrap();
        assert!(bound.query.is_empty());
        assert!(bound.headers.is_empty());
        assert!(bound.body.is_none());
    }

    #[test]
    fn unresolved_placeholder_fails() {
        let err = bind(&update_setting_value(), &args(json!({ "settingId": 1 }))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to resolve path parameters: /v1/environments/{environmentId}/settings/1/value"
        );
    }

    #[test]
    fn fields_without_binding_are_ignored() {
        let bound = bind(
            &get_product(),
            &args(json!({ "productId": "p", "verbose": true })),
        )
        .unwrap();
        assert_eq!(bound.path, "/v1/products/p");
        assert!(bound.query.is_empty());
    }

    #[test]
    fn bind_then_unbind_recovers_path_values() {
        let descriptor = update_setting_value();
        let bound = bind(
            &descriptor,
            &args(json!({ "environmentId": "prod/eu ü", "settingId": 7 })),
        )
        .unwrap();
        let recovered = unbind(&descriptor.path_template, &bound.path).unwrap();
        assert_eq!(recovered["environmentId"], json!("prod/eu ü"));
        assert_eq!(recovered["settingId"], json!("7"));
    }

    #[test]
    fn unbind_rejects_other_shapes() {
        assert!(unbind("/v1/products/{productId}", "/v1/configs/x").is_none());
        assert!(unbind("/v1/products/{productId}", "/v1/products/x/tags").is_none());
        let recovered = unbind("/v1/{id}.json", "/v1/abc.json").unwrap();
        assert_eq!(recovered["id"], json!("abc"));
    }

    proptest::proptest! {
        #[test]
        fn bound_path_is_resolved_and_reversible(
            environment_id in ".*",
            setting_id in ".*",
            reason in proptest::option::of(".*"),
        ) {
            let mut input = json!({ "environmentId": environment_id, "settingId": setting_id });
            if let Some(reason) = &reason {
                input["reason"] = json!(reason);
            }
            let descriptor = update_setting_value();
            let bound = bind(&descriptor, &args(input)).unwrap();

            proptest::prop_assert!(!bound.path.contains('{'), "bound path still contains a placeholder: {}", bound.path);
            proptest::prop_assert!(bound.headers.is_empty());
            proptest::prop_assert!(bound.body.is_none());
            proptest::prop_assert_eq!(bound.query.is_empty(), reason.is_none());

            let recovered = unbind(&descriptor.path_template, &bound.path).unwrap();
            proptest::prop_assert_eq!(&recovered["environmentId"], &json!(environment_id));
            proptest::prop_assert_eq!(&recovered["settingId"], &json!(setting_id));
        }
    }
}
