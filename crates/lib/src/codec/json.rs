//! JSON adapter.
//!
//! Objects become maps, strings, booleans and numbers become scalars, and
//! arrays of strings become lists. `null` and arrays holding anything but
//! strings have no counterpart and fail to decode. Comments cannot be
//! represented, so [`CommentMode`] has no effect.

use serde_json::Value as JsonValue;

use super::errors::{ParseError, ParseErrorKind};
use super::{Codec, CommentMode, check_keys};
use crate::Result;
use crate::map::path::validate_key;
use crate::map::{AttributeMap, Value};
use crate::provider::ContainerProvider;

/// Codec for JSON objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

impl Codec for Json {
    fn decode_with<P>(&self, text: &str, _mode: CommentMode, provider: &P) -> Result<AttributeMap>
    where
        P: ContainerProvider + ?Sized,
    {
        if text.trim().is_empty() {
            return Ok(provider.new_map()?);
        }

        let parsed: JsonValue = serde_json::from_str(text).map_err(|err| {
            ParseError::new(
                err.line(),
                err.column(),
                ParseErrorKind::Json {
                    message: err.to_string(),
                },
            )
        })?;

        match parsed {
            JsonValue::Object(object) => convert_object(object, "", provider),
            other => Err(unsupported("", &other).into()),
        }
    }

    fn encode(&self, map: &AttributeMap) -> Result<String> {
        check_keys(map)?;
        let mut text = serde_json::to_string_pretty(map)?;
        text.push('\n');
        Ok(text)
    }
}

fn json_type(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

fn unsupported(path: &str, value: &JsonValue) -> ParseError {
    ParseError::unpositioned(ParseErrorKind::UnsupportedValue {
        path: if path.is_empty() {
            "(root)".to_string()
        } else {
            path.to_string()
        },
        found: json_type(value),
    })
}

fn convert_object<P>(
    object: serde_json::Map<String, JsonValue>,
    path: &str,
    provider: &P,
) -> Result<AttributeMap>
where
    P: ContainerProvider + ?Sized,
{
    let mut map = provider.new_map()?;
    for (key, value) in object {
        validate_key(&key).map_err(|err| {
            ParseError::unpositioned(ParseErrorKind::InvalidKey {
                key: key.clone(),
                reason: err.to_string(),
            })
        })?;
        let child = if path.is_empty() {
            key.clone()
        } else {
            format!("{path}.{key}")
        };

        let converted = match value {
            JsonValue::Object(nested) => Value::Map(convert_object(nested, &child, provider)?),
            JsonValue::String(s) => Value::Text(s),
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(int) => Value::Int(int),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::Array(items) => {
                let mut list = provider.new_list()?;
                for item in items {
                    match item {
                        JsonValue::String(s) => list.push(s),
                        other => return Err(unsupported(&child, &other).into()),
                    }
                }
                Value::List(list)
            }
            JsonValue::Null => return Err(unsupported(&child, &JsonValue::Null).into()),
        };
        map.add(key, converted);
    }
    Ok(map)
}
