/// Strict schema validation of a parsed TOML table against a serde type.
///
/// Two passes:
///
/// 1. **Unknown keys**: the declared top-level field names are read from the
///    type's `Deserialize` impl (see [`declared_fields`]) and every key not in
///    that list is reported. This holds whether or not the type itself carries
///    `#[serde(deny_unknown_fields)]`. Types with an open field list (those
///    using `#[serde(flatten)]`) are checked after the fact instead: a
///    top-level key that does not survive a serialize round trip of the
///    parsed value was not consumed, and is reported.
/// 2. **Shape**: the remaining keys are deserialized into the type; the first
///    type mismatch or missing field is reported with its dotted path.
use serde::Serialize;
use serde::de::{self, DeserializeOwned, Visitor};
use serde::forward_to_deserialize_any;
use tracing::trace;

use super::errors::{ConfigError, FieldError, ValidationErrors};

const EXTRA_FIELD_MSG: &str = "extra fields not permitted";

/// Validate `table` against `T`, returning the typed value or the violations found.
///
/// Every unknown top-level key is reported, followed by at most one shape
/// error (deserialization stops at the first type mismatch or missing field).
///
/// # Errors
///
/// Returns `ConfigError::Validation` with one `FieldError` per violation.
pub fn validate<T>(mut table: toml::Table) -> Result<T, ConfigError>
where
    T: Serialize + DeserializeOwned,
{
    let mut errors = ValidationErrors::default();

    let input_keys = match declared_fields::<T>() {
        Some(fields) => {
            let unknown: Vec<String> = table
                .keys()
                .filter(|key| !fields.contains(&key.as_str()))
                .cloned()
                .collect();
            for key in unknown {
                table.remove(&key);
                errors.push(FieldError::new(key, EXTRA_FIELD_MSG));
            }
            None
        }
        None => Some(table.keys().cloned().collect::<Vec<String>>()),
    };

    match serde_path_to_error::deserialize::<_, T>(toml::Value::Table(table)) {
        Ok(value) => {
            if let Some(keys) = input_keys {
                for key in unconsumed_keys(&value, keys) {
                    errors.push(FieldError::new(key, EXTRA_FIELD_MSG));
                }
            }
            if errors.is_empty() {
                Ok(value)
            } else {
                Err(ConfigError::Validation(errors))
            }
        }
        Err(err) => {
            errors.push(field_error(&err));
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Input keys missing from `value` serialized back to a table.
fn unconsumed_keys<T: Serialize>(value: &T, keys: Vec<String>) -> Vec<String> {
    let round_trip = match toml::Table::try_from(value) {
        Ok(table) => table,
        Err(err) => {
            trace!(%err, "config value does not serialize to a table, skipping key check");
            return Vec::new();
        }
    };
    keys.into_iter()
        .filter(|key| !round_trip.contains_key(key))
        .collect()
}

fn field_error(err: &serde_path_to_error::Error<toml::de::Error>) -> FieldError {
    let path = err.path().to_string();
    let mut location = if path == "." { String::new() } else { path };
    let message = err.inner().message().trim_end().to_owned();

    // serde reports a missing field at the parent's path; point at the field itself.
    if let Some(missing) = missing_field_name(&message) {
        if !location.is_empty() {
            location.push('.');
        }
        location.push_str(missing);
    }

    FieldError::new(location, message)
}

fn missing_field_name(message: &str) -> Option<&str> {
    message
        .strip_prefix("missing field `")?
        .split('`')
        .next()
        .filter(|name| !name.is_empty())
}

/// Top-level field names declared by `T`'s `Deserialize` impl.
///
/// Returns `None` for types that do not deserialize as a struct (maps, or
/// structs using `#[serde(flatten)]`), where the set of accepted keys is open.
#[must_use]
pub fn declared_fields<T: DeserializeOwned>() -> Option<&'static [&'static str]> {
    let mut fields = None;
    // The probe always errors; only the captured field list matters.
    let _ = T::deserialize(FieldProbe {
        fields: &mut fields,
    });
    trace!(?fields, "introspected config fields");
    fields
}

/// A deserializer that records the field list passed to `deserialize_struct`.
struct FieldProbe<'a> {
    fields: &'a mut Option<&'static [&'static str]>,
}

impl<'de> de::Deserializer<'de> for FieldProbe<'_> {
    type Error = de::value::Error;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Self::Error> {
        Err(de::Error::custom("not a struct"))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        *self.fields = Some(fields);
        Err(de::Error::custom("field probe"))
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map enum identifier ignored_any
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Server {
        host: String,
        port: u16,
        #[serde(default)]
        tags: Vec<String>,
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Nested {
        name: String,
        server: Server,
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Inner {
        a: i64,
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Flat {
        name: String,
        #[serde(flatten)]
        inner: Inner,
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct CatchAll {
        name: String,
        #[serde(flatten)]
        rest: BTreeMap<String, i64>,
    }

    fn table(src: &str) -> toml::Table {
        src.parse().unwrap()
    }

    #[test]
    fn test_declared_fields() {
        assert_eq!(declared_fields::<Server>(), Some(&["host", "port", "tags"][..]));
        assert_eq!(declared_fields::<BTreeMap<String, i64>>(), None);
    }

    #[test]
    fn test_valid() {
        let server: Server = validate(table("host = \"localhost\"\nport = 8080\n")).unwrap();
        assert_eq!(
            server,
            Server {
                host: "localhost".into(),
                port: 8080,
                tags: vec![],
            }
        );
    }

    #[test]
    fn test_wrong_type_located() {
        let err = validate::<Server>(table("host = \"h\"\nport = \"nope\"\n")).unwrap_err();
        let errors = err.validation_errors().unwrap().errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].location, "port");
    }

    #[test]
    fn test_missing_field_located() {
        let err = validate::<Server>(table("host = \"h\"\n")).unwrap_err();
        let errors = err.validation_errors().unwrap().errors();
        assert_eq!(errors[0].location, "port");
        assert!(errors[0].message.contains("missing field"));
    }

    #[test]
    fn test_nested_missing_field_located() {
        let err = validate::<Nested>(table("name = \"n\"\n[server]\nhost = \"h\"\n")).unwrap_err();
        let errors = err.validation_errors().unwrap().errors();
        assert_eq!(errors[0].location, "server.port");
    }

    #[test]
    fn test_unknown_keys_all_reported() {
        let err = validate::<Server>(table(
            "host = \"h\"\nport = 1\nextra = true\nmore = 2\n",
        ))
        .unwrap_err();
        let errors = err.validation_errors().unwrap().errors();
        let locations: Vec<&str> = errors.iter().map(|e| e.location.as_str()).collect();
        assert_eq!(locations, ["extra", "more"]);
        assert!(errors.iter().all(|e| e.message == EXTRA_FIELD_MSG));
    }

    #[test]
    fn test_unknown_key_and_bad_type_together() {
        let err = validate::<Server>(table("host = 1\nport = 1\nextra = true\n")).unwrap_err();
        let errors = err.validation_errors().unwrap().errors();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].location, "extra");
        assert_eq!(errors[1].location, "host");
    }

    #[test]
    fn test_only_first_shape_error_reported() {
        let err = validate::<Server>(table("tags = []\n")).unwrap_err();
        let errors = err.validation_errors().unwrap().errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].location, "host");
    }

    #[test]
    fn test_flattened_unknown_key_reported() {
        assert_eq!(declared_fields::<Flat>(), None);
        let err = validate::<Flat>(table("name = \"n\"\na = 1\nextra = true\n")).unwrap_err();
        let errors = err.validation_errors().unwrap().errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].location, "extra");
        assert_eq!(errors[0].message, EXTRA_FIELD_MSG);
    }

    #[test]
    fn test_flattened_valid() {
        let flat: Flat = validate(table("name = \"n\"\na = 1\n")).unwrap();
        assert_eq!(
            flat,
            Flat {
                name: "n".into(),
                inner: Inner { a: 1 },
            }
        );
    }

    #[test]
    fn test_flattened_map_keeps_extra_keys() {
        let value: CatchAll = validate(table("name = \"n\"\nx = 1\ny = 2\n")).unwrap();
        assert_eq!(value.rest.len(), 2);
        assert_eq!(value.rest["y"], 2);
    }

    #[test]
    fn test_missing_field_name() {
        assert_eq!(missing_field_name("missing field `port`"), Some("port"));
        assert_eq!(missing_field_name("invalid type: string"), None);
    }
}
