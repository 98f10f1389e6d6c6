//! Argument schemas and the interpreter that checks caller arguments against them.
//!
//! A [`Schema`] can be built directly with the builder methods, or converted once
//! from a JSON-Schema document with [`Schema::from_json_schema`]. Validation walks
//! the native schema recursively; nothing is generated or evaluated at runtime.

use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::error::{Issue, IssueKind, SchemaError, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringFormat {
    Uuid,
    DateTime,
    Uri,
}

impl StringFormat {
    fn from_keyword(raw: &str) -> Option<Self> {
        match raw {
            "uuid" => Some(StringFormat::Uuid),
            "date-time" => Some(StringFormat::DateTime),
            "uri" | "url" => Some(StringFormat::Uri),
            _ => None,
        }
    }

    fn as_keyword(self) -> &'static str {
        match self {
            StringFormat::Uuid => "uuid",
            StringFormat::DateTime => "date-time",
            StringFormat::Uri => "uri",
        }
    }

    fn accepts(self, value: &str) -> bool {
        match self {
            // Only the canonical 8-4-4-4-12 form; braced/urn/simple forms are rejected.
            StringFormat::Uuid => value.len() == 36 && Uuid::try_parse(value).is_ok(),
            StringFormat::DateTime => chrono::DateTime::parse_from_rfc3339(value).is_ok(),
            StringFormat::Uri => url::Url::parse(value).is_ok(),
        }
    }

    fn label(self) -> &'static str {
        match self {
            StringFormat::Uuid => "uuid",
            StringFormat::DateTime => "datetime",
            StringFormat::Uri => "url",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringRules {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub format: Option<StringFormat>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumberRules {
    pub integer: bool,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub schema: Schema,
    pub required: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    pub properties: Vec<Property>,
    /// Schema applied to keys not listed in `properties`. `None` means such keys
    /// pass through unchecked.
    pub additional: Option<Box<Schema>>,
}

impl ObjectSchema {
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    Any,
    Null,
    Boolean,
    String(StringRules),
    Number(NumberRules),
    Enum(Vec<Value>),
    Array {
        items: Box<Schema>,
        min_items: Option<usize>,
        max_items: Option<usize>,
    },
    Object(ObjectSchema),
    Union(Vec<Schema>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub kind: SchemaKind,
    pub nullable: bool,
    pub description: Option<String>,
}

impl Schema {
    fn of(kind: SchemaKind) -> Self {
        Self {
            kind,
            nullable: false,
            description: None,
        }
    }

    pub fn any() -> Self {
        Self::of(SchemaKind::Any)
    }

    pub fn null() -> Self {
        Self::of(SchemaKind::Null)
    }

    pub fn boolean() -> Self {
        Self::of(SchemaKind::Boolean)
    }

    pub fn string() -> Self {
        Self::of(SchemaKind::String(StringRules::default()))
    }

    pub fn number() -> Self {
        Self::of(SchemaKind::Number(NumberRules::default()))
    }

    pub fn integer() -> Self {
        Self::of(SchemaKind::Number(NumberRules {
            integer: true,
            ..NumberRules::default()
        }))
    }

    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::of(SchemaKind::Enum(
            values
                .into_iter()
                .map(|v| Value::String(v.into()))
                .collect(),
        ))
    }

    pub fn array(items: Schema) -> Self {
        Self::of(SchemaKind::Array {
            items: Box::new(items),
            min_items: None,
            max_items: None,
        })
    }

    pub fn object() -> Self {
        Self::of(SchemaKind::Object(ObjectSchema::default()))
    }

    /// Object whose every key must match `values` (a string-keyed map).
    pub fn map(values: Schema) -> Self {
        Self::of(SchemaKind::Object(ObjectSchema {
            properties: Vec::new(),
            additional: Some(Box::new(values)),
        }))
    }

    pub fn union(variants: Vec<Schema>) -> Self {
        Self::of(SchemaKind::Union(variants))
    }

    pub fn required(self, name: impl Into<String>, schema: Schema) -> Self {
        self.with_property(name.into(), schema, true)
    }

    pub fn optional(self, name: impl Into<String>, schema: Schema) -> Self {
        self.with_property(name.into(), schema, false)
    }

    fn with_property(mut self, name: String, schema: Schema, required: bool) -> Self {
        if let SchemaKind::Object(obj) = &mut self.kind {
            obj.properties.retain(|p| p.name != name);
            obj.properties.push(Property {
                name,
                schema,
                required,
            });
        }
        self
    }

    pub fn min_length(mut self, n: usize) -> Self {
        if let SchemaKind::String(rules) = &mut self.kind {
            rules.min_length = Some(n);
        }
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        if let SchemaKind::String(rules) = &mut self.kind {
            rules.max_length = Some(n);
        }
        self
    }

    pub fn format(mut self, format: StringFormat) -> Self {
        if let SchemaKind::String(rules) = &mut self.kind {
            rules.format = Some(format);
        }
        self
    }

    pub fn minimum(mut self, n: f64) -> Self {
        if let SchemaKind::Number(rules) = &mut self.kind {
            rules.minimum = Some(n);
        }
        self
    }

    pub fn maximum(mut self, n: f64) -> Self {
        if let SchemaKind::Number(rules) = &mut self.kind {
            rules.maximum = Some(n);
        }
        self
    }

    pub fn min_items(mut self, n: usize) -> Self {
        if let SchemaKind::Array { min_items, .. } = &mut self.kind {
            *min_items = Some(n);
        }
        self
    }

    pub fn max_items(mut self, n: usize) -> Self {
        if let SchemaKind::Array { max_items, .. } = &mut self.kind {
            *max_items = Some(n);
        }
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn as_object(&self) -> Option<&ObjectSchema> {
        match &self.kind {
            SchemaKind::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Checks `value` against the schema, returning every violation found.
    /// On success the value is returned unchanged: nothing is coerced, defaulted
    /// or stripped.
    pub fn validate(&self, value: &Value) -> Result<Value, Vec<Issue>> {
        let mut issues = Vec::new();
        self.check(value, "", &mut issues);
        if issues.is_empty() {
            Ok(value.clone())
        } else {
            Err(issues)
        }
    }

    fn check(&self, value: &Value, path: &str, issues: &mut Vec<Issue>) {
        if value.is_null() {
            if !self.nullable && !matches!(self.kind, SchemaKind::Any | SchemaKind::Null) {
                issues.push(Issue::new(
                    path,
                    IssueKind::InvalidType,
                    format!("Expected {}, received null", self.expected_label()),
                ));
            }
            return;
        }

        match &self.kind {
            SchemaKind::Any => {}
            SchemaKind::Null => issues.push(type_mismatch(path, "null", value)),
            SchemaKind::Boolean => {
                if !value.is_boolean() {
                    issues.push(type_mismatch(path, "boolean", value));
                }
            }
            SchemaKind::String(rules) => check_string(rules, value, path, issues),
            SchemaKind::Number(rules) => check_number(rules, value, path, issues),
            SchemaKind::Enum(options) => {
                if !options.contains(value) {
                    let expected = options
                        .iter()
                        .map(enum_literal)
                        .collect::<Vec<_>>()
                        .join(" | ");
                    issues.push(Issue::new(
                        path,
                        IssueKind::InvalidEnumValue,
                        format!(
                            "Invalid enum value. Expected {expected}, received {}",
                            enum_literal(value)
                        ),
                    ));
                }
            }
            SchemaKind::Array {
                items,
                min_items,
                max_items,
            } => {
                let Some(elements) = value.as_array() else {
                    issues.push(type_mismatch(path, "array", value));
                    return;
                };
                if let Some(min) = min_items.filter(|min| elements.len() < *min) {
                    issues.push(Issue::new(
                        path,
                        IssueKind::TooSmall,
                        format!("Array must contain at least {min} element(s)"),
                    ));
                }
                if let Some(max) = max_items.filter(|max| elements.len() > *max) {
                    issues.push(Issue::new(
                        path,
                        IssueKind::TooBig,
                        format!("Array must contain at most {max} element(s)"),
                    ));
                }
                for (index, element) in elements.iter().enumerate() {
                    items.check(element, &join_path(path, &index.to_string()), issues);
                }
            }
            SchemaKind::Object(obj) => {
                let Some(fields) = value.as_object() else {
                    issues.push(type_mismatch(path, "object", value));
                    return;
                };
                for property in &obj.properties {
                    let field_path = join_path(path, &property.name);
                    match fields.get(&property.name) {
                        Some(field) => property.schema.check(field, &field_path, issues),
                        None if property.required => {
                            property.schema.report_missing(&field_path, issues)
                        }
                        None => {}
                    }
                }
                if let Some(additional) = &obj.additional {
                    for (key, field) in fields {
                        if obj.property(key).is_none() {
                            additional.check(field, &join_path(path, key), issues);
                        }
                    }
                }
            }
            SchemaKind::Union(variants) => {
                let matched = variants.iter().any(|variant| {
                    let mut scratch = Vec::new();
                    variant.check(value, path, &mut scratch);
                    scratch.is_empty()
                });
                if !matched {
                    issues.push(Issue::new(path, IssueKind::InvalidUnion, "Invalid input"));
                }
            }
        }
    }

    /// A required field is absent. Required fields of a missing object are
    /// reported too, so the caller sees the whole expected shape at once.
    fn report_missing(&self, path: &str, issues: &mut Vec<Issue>) {
        issues.push(Issue::new(path, IssueKind::Required, "Required"));
        if let SchemaKind::Object(obj) = &self.kind {
            for property in obj.properties.iter().filter(|p| p.required) {
                property
                    .schema
                    .report_missing(&join_path(path, &property.name), issues);
            }
        }
    }

    fn expected_label(&self) -> String {
        match &self.kind {
            SchemaKind::Any => "any".to_string(),
            SchemaKind::Null => "null".to_string(),
            SchemaKind::Boolean => "boolean".to_string(),
            SchemaKind::String(_) => "string".to_string(),
            SchemaKind::Number(rules) if rules.integer => "integer".to_string(),
            SchemaKind::Number(_) => "number".to_string(),
            SchemaKind::Enum(options) => options
                .iter()
                .map(enum_literal)
                .collect::<Vec<_>>()
                .join(" | "),
            SchemaKind::Array { .. } => "array".to_string(),
            SchemaKind::Object(_) => "object".to_string(),
            SchemaKind::Union(variants) => variants
                .iter()
                .map(Schema::expected_label)
                .collect::<Vec<_>>()
                .join(" | "),
        }
    }

    /// Converts a JSON-Schema document into a native schema.
    ///
    /// Understood keywords: `type` (single or list, `"null"` meaning nullable),
    /// `nullable`, `enum`, `anyOf`/`oneOf`, `properties`, `required`,
    /// `additionalProperties` (schema form), `items`, `minItems`, `maxItems`,
    /// `minLength`, `maxLength`, `format`, `minimum`, `maximum`, `description`.
    /// Other annotation keywords are ignored.
    pub fn from_json_schema(doc: &Value) -> Result<Schema, SchemaError> {
        convert(doc, "")
    }

    /// Renders the schema as a JSON-Schema document (the inverse of
    /// [`Schema::from_json_schema`]).
    pub fn to_json_schema(&self) -> Value {
        let mut doc = match &self.kind {
            SchemaKind::Any => json!({}),
            SchemaKind::Null => json!({ "type": "null" }),
            SchemaKind::Boolean => json!({ "type": "boolean" }),
            SchemaKind::String(rules) => {
                let mut doc = json!({ "type": "string" });
                if let Some(min) = rules.min_length {
                    doc["minLength"] = json!(min);
                }
                if let Some(max) = rules.max_length {
                    doc["maxLength"] = json!(max);
                }
                if let Some(format) = rules.format {
                    doc["format"] = json!(format.as_keyword());
                }
                doc
            }
            SchemaKind::Number(rules) => {
                let ty = if rules.integer { "integer" } else { "number" };
                let mut doc = json!({ "type": ty });
                if let Some(min) = rules.minimum {
                    doc["minimum"] = number_value(min);
                }
                if let Some(max) = rules.maximum {
                    doc["maximum"] = number_value(max);
                }
                doc
            }
            SchemaKind::Enum(options) => json!({ "enum": options }),
            SchemaKind::Array {
                items,
                min_items,
                max_items,
            } => {
                let mut doc = json!({ "type": "array", "items": items.to_json_schema() });
                if let Some(min) = min_items {
                    doc["minItems"] = json!(min);
                }
                if let Some(max) = max_items {
                    doc["maxItems"] = json!(max);
                }
                doc
            }
            SchemaKind::Object(obj) => {
                let mut properties = Map::new();
                let mut required = Vec::new();
                for property in &obj.properties {
                    properties.insert(property.name.clone(), property.schema.to_json_schema());
                    if property.required {
                        required.push(Value::String(property.name.clone()));
                    }
                }
                let mut doc = json!({ "type": "object", "properties": properties });
                if !required.is_empty() {
                    doc["required"] = Value::Array(required);
                }
                if let Some(additional) = &obj.additional {
                    doc["additionalProperties"] = additional.to_json_schema();
                }
                doc
            }
            SchemaKind::Union(variants) => {
                json!({ "anyOf": variants.iter().map(Schema::to_json_schema).collect::<Vec<_>>() })
            }
        };

        if self.nullable {
            doc = make_nullable(doc);
        }
        if let Some(description) = &self.description {
            doc["description"] = Value::String(description.clone());
        }
        doc
    }
}

/// Validates a raw `arguments` value for `tool`. An absent or `null` value is
/// treated as an empty object. Any other non-object value (an array, a string)
/// is not replaced: it fails with a root `invalid_type` issue.
pub fn validate_arguments(
    tool: &str,
    schema: &Schema,
    raw: Option<&Value>,
) -> Result<Map<String, Value>, ValidationError> {
    let empty = Value::Object(Map::new());
    let raw = match raw {
        None | Some(Value::Null) => &empty,
        Some(value) => value,
    };

    match schema.validate(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ValidationError {
            tool: tool.to_string(),
            issues: vec![type_mismatch("", "object", &other)],
        }),
        Err(issues) => Err(ValidationError {
            tool: tool.to_string(),
            issues,
        }),
    }
}

fn check_string(rules: &StringRules, value: &Value, path: &str, issues: &mut Vec<Issue>) {
    let Some(text) = value.as_str() else {
        issues.push(type_mismatch(path, "string", value));
        return;
    };
    let length = text.chars().count();
    if let Some(min) = rules.min_length.filter(|min| length < *min) {
        issues.push(Issue::new(
            path,
            IssueKind::TooSmall,
            format!("String must contain at least {min} character(s)"),
        ));
    }
    if let Some(max) = rules.max_length.filter(|max| length > *max) {
        issues.push(Issue::new(
            path,
            IssueKind::TooBig,
            format!("String must contain at most {max} character(s)"),
        ));
    }
    if let Some(format) = rules.format.filter(|format| !format.accepts(text)) {
        issues.push(Issue::new(
            path,
            IssueKind::InvalidString,
            format!("Invalid {}", format.label()),
        ));
    }
}

fn check_number(rules: &NumberRules, value: &Value, path: &str, issues: &mut Vec<Issue>) {
    let Some(number) = value.as_f64() else {
        let expected = if rules.integer { "integer" } else { "number" };
        issues.push(type_mismatch(path, expected, value));
        return;
    };
    if rules.integer && !(value.is_i64() || value.is_u64() || number.fract() == 0.0) {
        issues.push(Issue::new(
            path,
            IssueKind::InvalidType,
            "Expected integer, received float",
        ));
    }
    if let Some(min) = rules.minimum.filter(|min| number < *min) {
        issues.push(Issue::new(
            path,
            IssueKind::TooSmall,
            format!("Number must be greater than or equal to {min}"),
        ));
    }
    if let Some(max) = rules.maximum.filter(|max| number > *max) {
        issues.push(Issue::new(
            path,
            IssueKind::TooBig,
            format!("Number must be less than or equal to {max}"),
        ));
    }
}

fn type_mismatch(path: &str, expected: &str, value: &Value) -> Issue {
    Issue::new(
        path,
        IssueKind::InvalidType,
        format!("Expected {expected}, received {}", json_type_name(value)),
    )
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn enum_literal(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{s}'"),
        other => other.to_string(),
    }
}

fn join_path(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{parent}.{segment}")
    }
}

fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        json!(n as i64)
    } else {
        json!(n)
    }
}

fn make_nullable(mut doc: Value) -> Value {
    match doc.get("type").cloned() {
        Some(Value::String(ty)) => {
            doc["type"] = json!([ty, "null"]);
            if let Some(Value::Array(options)) = doc.get_mut("enum") {
                options.push(Value::Null);
            }
            doc
        }
        _ => {
            if let Some(Value::Array(variants)) = doc.get_mut("anyOf") {
                variants.push(json!({ "type": "null" }));
                doc
            } else if let Some(Value::Array(options)) = doc.get_mut("enum") {
                options.push(Value::Null);
                doc
            } else {
                doc["nullable"] = Value::Bool(true);
                doc
            }
        }
    }
}

fn pointer(base: &str, segment: &str) -> String {
    format!("{base}/{segment}")
}

fn convert(doc: &Value, at: &str) -> Result<Schema, SchemaError> {
    let obj = match doc {
        Value::Bool(true) => return Ok(Schema::any()),
        Value::Object(obj) => obj,
        _ => return Err(SchemaError::new(at, "expected a schema object")),
    };

    let mut nullable = obj.get("nullable").and_then(Value::as_bool).unwrap_or(false);

    let mut schema = if let Some(options) = obj.get("enum") {
        let options = options
            .as_array()
            .ok_or_else(|| SchemaError::new(pointer(at, "enum"), "expected an array"))?;
        if options.iter().any(Value::is_null) {
            nullable = true;
        }
        Schema::of(SchemaKind::Enum(
            options.iter().filter(|v| !v.is_null()).cloned().collect(),
        ))
    } else if let Some((keyword, variants)) = obj
        .get("anyOf")
        .map(|v| ("anyOf", v))
        .or_else(|| obj.get("oneOf").map(|v| ("oneOf", v)))
    {
        let variants = variants
            .as_array()
            .ok_or_else(|| SchemaError::new(pointer(at, keyword), "expected an array"))?;
        let mut converted = Vec::with_capacity(variants.len());
        for (index, variant) in variants.iter().enumerate() {
            let schema = convert(variant, &pointer(&pointer(at, keyword), &index.to_string()))?;
            if schema.kind == SchemaKind::Null {
                nullable = true;
            } else {
                converted.push(schema);
            }
        }
        match converted.len() {
            0 => Schema::null(),
            1 => converted.remove(0),
            _ => Schema::union(converted),
        }
    } else {
        match obj.get("type") {
            None => {
                if obj.contains_key("properties") || obj.contains_key("additionalProperties") {
                    convert_typed("object", obj, at)?
                } else if obj.contains_key("items") {
                    convert_typed("array", obj, at)?
                } else {
                    Schema::any()
                }
            }
            Some(Value::String(ty)) => convert_typed(ty, obj, at)?,
            Some(Value::Array(types)) => {
                let mut converted = Vec::new();
                for ty in types {
                    let ty = ty.as_str().ok_or_else(|| {
                        SchemaError::new(pointer(at, "type"), "type names must be strings")
                    })?;
                    if ty == "null" {
                        nullable = true;
                    } else {
                        converted.push(convert_typed(ty, obj, at)?);
                    }
                }
                match converted.len() {
                    0 => Schema::null(),
                    1 => converted.remove(0),
                    _ => Schema::union(converted),
                }
            }
            Some(_) => {
                return Err(SchemaError::new(
                    pointer(at, "type"),
                    "expected a string or an array of strings",
                ));
            }
        }
    };

    if nullable && schema.kind != SchemaKind::Null {
        schema.nullable = true;
    }
    if let Some(description) = obj.get("description").and_then(Value::as_str) {
        schema.description = Some(description.to_string());
    }
    Ok(schema)
}

fn convert_typed(ty: &str, obj: &Map<String, Value>, at: &str) -> Result<Schema, SchemaError> {
    match ty {
        "null" => Ok(Schema::null()),
        "boolean" => Ok(Schema::boolean()),
        "string" => {
            let rules = StringRules {
                min_length: read_usize(obj, "minLength", at)?,
                max_length: read_usize(obj, "maxLength", at)?,
                format: obj
                    .get("format")
                    .and_then(Value::as_str)
                    .and_then(StringFormat::from_keyword),
            };
            Ok(Schema::of(SchemaKind::String(rules)))
        }
        "number" | "integer" => {
            let rules = NumberRules {
                integer: ty == "integer",
                minimum: read_f64(obj, "minimum", at)?,
                maximum: read_f64(obj, "maximum", at)?,
            };
            Ok(Schema::of(SchemaKind::Number(rules)))
        }
        "array" => {
            let items = match obj.get("items") {
                Some(items) => convert(items, &pointer(at, "items"))?,
                None => Schema::any(),
            };
            Ok(Schema::of(SchemaKind::Array {
                items: Box::new(items),
                min_items: read_usize(obj, "minItems", at)?,
                max_items: read_usize(obj, "maxItems", at)?,
            }))
        }
        "object" => {
            let required: Vec<&str> = match obj.get("required") {
                None => Vec::new(),
                Some(Value::Array(names)) => names
                    .iter()
                    .map(|name| {
                        name.as_str().ok_or_else(|| {
                            SchemaError::new(pointer(at, "required"), "names must be strings")
                        })
                    })
                    .collect::<Result<_, _>>()?,
                Some(_) => {
                    return Err(SchemaError::new(
                        pointer(at, "required"),
                        "expected an array",
                    ));
                }
            };

            let mut object = ObjectSchema::default();
            if let Some(properties) = obj.get("properties") {
                let properties = properties.as_object().ok_or_else(|| {
                    SchemaError::new(pointer(at, "properties"), "expected an object")
                })?;
                let base = pointer(at, "properties");
                for (name, property) in properties {
                    object.properties.push(Property {
                        name: name.clone(),
                        schema: convert(property, &pointer(&base, name))?,
                        required: required.contains(&name.as_str()),
                    });
                }
            }
            for name in required {
                if object.property(name).is_none() {
                    object.properties.push(Property {
                        name: name.to_string(),
                        schema: Schema::any(),
                        required: true,
                    });
                }
            }
            if let Some(additional) = obj.get("additionalProperties").filter(|v| v.is_object()) {
                object.additional = Some(Box::new(convert(
                    additional,
                    &pointer(at, "additionalProperties"),
                )?));
            }
            Ok(Schema::of(SchemaKind::Object(object)))
        }
        other => Err(SchemaError::new(
            pointer(at, "type"),
            format!("unknown type '{other}'"),
        )),
    }
}

fn read_usize(obj: &Map<String, Value>, key: &str, at: &str) -> Result<Option<usize>, SchemaError> {
    match obj.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| SchemaError::new(pointer(at, key), "expected a non-negative integer")),
    }
}

fn read_f64(obj: &Map<String, Value>, key: &str, at: &str) -> Result<Option<f64>, SchemaError> {
    match obj.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or_else(|| SchemaError::new(pointer(at, key), "expected a number")),
    }
}
