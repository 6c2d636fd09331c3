use serde_json::Value;

/// Validates a value against the JSON Schema subset rule schemas use:
/// `enum`, `type`, `properties`/`required`/`additionalProperties`,
/// `items`, `minItems`/`maxItems`, and `anyOf`/`oneOf`. Unknown
/// keywords are ignored.
pub fn validate_schema(schema: &Value, value: &Value) -> Result<(), String> {
    let Value::Object(schema) = schema else {
        return Ok(());
    };

    if let Some(allowed) = schema.get("enum").and_then(Value::as_array) {
        if !allowed.contains(value) {
            return Err(format!("{value} is not one of the allowed values"));
        }
    }

    if let Some(expected) = schema.get("type") {
        let matches = match expected {
            Value::String(name) => type_matches(name, value),
            Value::Array(names) => names
                .iter()
                .filter_map(Value::as_str)
                .any(|name| type_matches(name, value)),
            _ => true,
        };
        if !matches {
            return Err(format!("{value} should be of type {expected}"));
        }
    }

    if let Some(branches) = schema.get("anyOf").and_then(Value::as_array) {
        if !branches
            .iter()
            .any(|branch| validate_schema(branch, value).is_ok())
        {
            return Err(format!("{value} does not match any allowed schema"));
        }
    }

    if let Some(branches) = schema.get("oneOf").and_then(Value::as_array) {
        let matching = branches
            .iter()
            .filter(|branch| validate_schema(branch, value).is_ok())
            .count();
        if matching != 1 {
            return Err(format!("{value} should match exactly one allowed schema"));
        }
    }

    if let Value::Object(object) = value {
        if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
            for (name, property_schema) in properties {
                if let Some(property) = object.get(name) {
                    validate_schema(property_schema, property)
                        .map_err(|error| format!("{name}: {error}"))?;
                }
            }
            if schema.get("additionalProperties") == Some(&Value::Bool(false)) {
                if let Some(extra) = object.keys().find(|key| !properties.contains_key(*key)) {
                    return Err(format!("unexpected property {extra:?}"));
                }
            }
        }
        if let Some(required) = schema.get("required").and_then(Value::as_array) {
            for name in required.iter().filter_map(Value::as_str) {
                if !object.contains_key(name) {
                    return Err(format!("missing required property {name:?}"));
                }
            }
        }
    }

    if let Value::Array(items) = value {
        match schema.get("items") {
            Some(Value::Array(item_schemas)) => {
                for (item, item_schema) in items.iter().zip(item_schemas) {
                    validate_schema(item_schema, item)?;
                }
            }
            Some(item_schema) => {
                for item in items {
                    validate_schema(item_schema, item)?;
                }
            }
            None => {}
        }
        if let Some(min) = schema.get("minItems").and_then(Value::as_u64) {
            if (items.len() as u64) < min {
                return Err(format!("should have at least {min} item(s)"));
            }
        }
        if let Some(max) = schema.get("maxItems").and_then(Value::as_u64) {
            if (items.len() as u64) > max {
                return Err(format!("should have at most {max} item(s)"));
            }
        }
    }

    Ok(())
}

fn type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

/// Checks a rule's configured options against its declared schema.
/// An array schema is positional, one entry per option; an object
/// schema applies to the whole options array. Rules without a schema
/// accept anything.
pub fn validate_rule_options(schema: Option<&Value>, options: &[Value]) -> Result<(), String> {
    match schema {
        None => Ok(()),
        Some(Value::Array(option_schemas)) => {
            if options.len() > option_schemas.len() {
                return Err(format!(
                    "should have at most {} option(s), got {}",
                    option_schemas.len(),
                    options.len()
                ));
            }
            for (index, (option, option_schema)) in
                options.iter().zip(option_schemas).enumerate()
            {
                validate_schema(option_schema, option)
                    .map_err(|error| format!("option {index}: {error}"))?;
            }
            Ok(())
        }
        Some(schema) => validate_schema(schema, &Value::Array(options.to_vec())),
    }
}
