//! Normalization and rendering of macro/definition lists.
//!
//! Step settings may carry compiler or CMake cache definitions under
//! `definitions` (alias `macros`). Input shapes are loose (an inline
//! table, or an array mixing bare keys, `[key]`, and `[key, value]`
//! entries) and normalize into an ordered list of [`Define`]s.
//! Normalization is idempotent: feeding back an already-normalized
//! list yields the same sequence.

use toml::Value;

use crate::error::ConfigError;

/// One normalized definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Define {
    pub key: String,
    /// CMake cache type (`BOOL`, `STRING`, `FILEPATH`, …), from the
    /// `{ type = "...", value = ... }` form.
    pub ty: Option<String>,
    pub value: DefineValue,
}

/// The value side of a definition.
#[derive(Debug, Clone, PartialEq)]
pub enum DefineValue {
    /// A bare macro with no value.
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Define {
    fn bare(key: String) -> Self {
        Define {
            key,
            ty: None,
            value: DefineValue::Empty,
        }
    }
}

/// Normalize a `definitions`/`macros` pair from raw step settings.
///
/// `macros` is an accepted alias; supplying both is an error no matter
/// what they contain.
pub fn normalize_definitions(
    definitions: Option<Value>,
    macros: Option<Value>,
) -> Result<Vec<Define>, ConfigError> {
    let raw = match (definitions, macros) {
        (Some(_), Some(_)) => return Err(ConfigError::MacrosConflict),
        (Some(defs), None) | (None, Some(defs)) => defs,
        (None, None) => return Ok(Vec::new()),
    };

    let entries: Vec<(Value, Option<Value>)> = match raw {
        // Inline table: ordered (key, value) pairs.
        Value::Table(table) => table
            .into_iter()
            .map(|(key, value)| (Value::String(key), Some(value)))
            .collect(),
        Value::Array(elements) => elements
            .into_iter()
            .map(split_element)
            .collect::<Result<_, _>>()?,
        other => {
            return Err(ConfigError::Definitions {
                reason: format!("expected an array or table, got {}", other.type_str()),
            })
        }
    };

    entries
        .into_iter()
        .map(|(key, value)| build_define(key, value))
        .collect()
}

/// Split one array element into a (key, value) pair.
fn split_element(element: Value) -> Result<(Value, Option<Value>), ConfigError> {
    match element {
        Value::Array(mut pair) => match pair.len() {
            0 => Err(ConfigError::Definitions {
                reason: "includes an empty element".into(),
            }),
            1 => Ok((pair.remove(0), None)),
            2 => {
                let value = pair.pop().expect("length checked");
                let key = pair.pop().expect("length checked");
                Ok((key, Some(value)))
            }
            n => Err(ConfigError::Definitions {
                reason: format!("element has {n} values, at most two are allowed"),
            }),
        },
        // A non-array element is a macro without a value.
        other => Ok((other, None)),
    }
}

fn build_define(key: Value, value: Option<Value>) -> Result<Define, ConfigError> {
    let Value::String(key) = key else {
        return Err(ConfigError::Definitions {
            reason: format!("key must be a string, got {}", key.type_str()),
        });
    };

    let key = key.trim().to_string();
    if key.is_empty() {
        return Err(ConfigError::Definitions {
            reason: "key is empty after trimming".into(),
        });
    }

    let Some(value) = value else {
        return Ok(Define::bare(key));
    };

    match value {
        Value::Table(table) => {
            // An empty value table is a macro without a value.
            if table.is_empty() {
                return Ok(Define::bare(key));
            }

            let ty = match table.get("type") {
                Some(Value::String(ty)) => Some(ty.clone()),
                Some(other) => {
                    return Err(ConfigError::Definitions {
                        reason: format!(
                            "`{key}` declares a non-string type: {}",
                            other.type_str()
                        ),
                    })
                }
                None => None,
            };

            let inner = match table.get("value") {
                Some(inner) => scalar_value(&key, inner.clone())?,
                None if ty.is_some() => {
                    return Err(ConfigError::Definitions {
                        reason: format!("`{key}` specifies a type but no value"),
                    })
                }
                None => {
                    return Err(ConfigError::Definitions {
                        reason: format!("`{key}` has an unsupported value object"),
                    })
                }
            };

            Ok(Define {
                key,
                ty,
                value: inner,
            })
        }
        other => {
            let value = scalar_value(&key, other)?;
            Ok(Define {
                key,
                ty: None,
                value,
            })
        }
    }
}

fn scalar_value(key: &str, value: Value) -> Result<DefineValue, ConfigError> {
    match value {
        Value::String(s) => Ok(DefineValue::Str(s)),
        Value::Boolean(b) => Ok(DefineValue::Bool(b)),
        Value::Integer(i) => Ok(DefineValue::Int(i)),
        Value::Float(f) => Ok(DefineValue::Float(f)),
        other => Err(ConfigError::Definitions {
            reason: format!("`{key}` has an unsupported value: {}", other.type_str()),
        }),
    }
}

/// Render definitions as CMake cache arguments: `-DKEY[:TYPE]=VALUE`.
///
/// Booleans become `ON`/`OFF`; a bare macro renders with an empty
/// value, which is how CMake unsets-and-defines a cache entry.
pub fn render_cmake(definitions: &[Define]) -> Vec<String> {
    definitions
        .iter()
        .map(|def| {
            let mut arg = format!("-D{}", def.key);
            if let Some(ref ty) = def.ty {
                arg.push(':');
                arg.push_str(ty);
            }
            arg.push('=');
            match &def.value {
                DefineValue::Empty => {}
                DefineValue::Bool(true) => arg.push_str("ON"),
                DefineValue::Bool(false) => arg.push_str("OFF"),
                DefineValue::Int(i) => arg.push_str(&i.to_string()),
                DefineValue::Float(f) => arg.push_str(&f.to_string()),
                DefineValue::Str(s) => arg.push_str(s),
            }
            arg
        })
        .collect()
}

/// Render definitions as Make command-line overrides: `KEY[=VALUE]`.
///
/// Booleans become `1`/`0`; a bare macro renders as the key alone.
/// The CMake cache type, if any, has no meaning to Make and is
/// dropped.
pub fn render_make(definitions: &[Define]) -> Vec<String> {
    definitions
        .iter()
        .map(|def| match &def.value {
            DefineValue::Empty => def.key.clone(),
            DefineValue::Bool(true) => format!("{}=1", def.key),
            DefineValue::Bool(false) => format!("{}=0", def.key),
            DefineValue::Int(i) => format!("{}={}", def.key, i),
            DefineValue::Float(f) => format!("{}={}", def.key, f),
            DefineValue::Str(s) => format!("{}={}", def.key, s),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(s: &str) -> Value {
        // Wrap in a table so bare arrays parse, then unwrap.
        let table: Value = format!("defs = {s}").parse().unwrap();
        table.get("defs").unwrap().clone()
    }

    fn normalize(s: &str) -> Result<Vec<Define>, ConfigError> {
        normalize_definitions(Some(value(s)), None)
    }

    #[test]
    fn test_mixed_entry_shapes() {
        let defs = normalize(r#"["FOO", ["BAR"], ["BAZ", "1"]]"#).unwrap();

        assert_eq!(defs[0], Define::bare("FOO".into()));
        assert_eq!(defs[1], Define::bare("BAR".into()));
        assert_eq!(
            defs[2],
            Define {
                key: "BAZ".into(),
                ty: None,
                value: DefineValue::Str("1".into()),
            }
        );
    }

    #[test]
    fn test_inline_table_preserves_pairs() {
        let defs = normalize(r#"{ FOO = "1", BAR = true }"#).unwrap();

        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].key, "FOO");
        assert_eq!(defs[1].value, DefineValue::Bool(true));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let first = normalize(r#"[["FOO"], ["BAR", "1"]]"#).unwrap();

        // Render the normalized sequence back into the input shape and
        // normalize again.
        let round_trip: Vec<Value> = first
            .iter()
            .map(|def| match &def.value {
                DefineValue::Empty => Value::Array(vec![Value::String(def.key.clone())]),
                DefineValue::Str(s) => Value::Array(vec![
                    Value::String(def.key.clone()),
                    Value::String(s.clone()),
                ]),
                _ => unreachable!("fixture only uses bare and string values"),
            })
            .collect();
        let second = normalize_definitions(Some(Value::Array(round_trip)), None).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_macros_alias() {
        let defs = normalize_definitions(None, Some(value(r#"["FOO"]"#))).unwrap();
        assert_eq!(defs, vec![Define::bare("FOO".into())]);
    }

    #[test]
    fn test_macros_and_definitions_conflict() {
        let err = normalize_definitions(Some(value(r#"["A"]"#)), Some(value(r#"["B"]"#)))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MacrosConflict));

        // The conflict fires regardless of contents, even two empties.
        let err =
            normalize_definitions(Some(value("[]")), Some(value("[]"))).unwrap_err();
        assert!(matches!(err, ConfigError::MacrosConflict));
    }

    #[test]
    fn test_rejects_empty_element() {
        let err = normalize(r#"[[]]"#).unwrap_err();
        assert!(matches!(err, ConfigError::Definitions { .. }));
    }

    #[test]
    fn test_rejects_wide_element() {
        let err = normalize(r#"[["A", "B", "C"]]"#).unwrap_err();
        assert!(matches!(err, ConfigError::Definitions { .. }));
    }

    #[test]
    fn test_rejects_non_string_key() {
        let err = normalize(r#"[[1, "x"]]"#).unwrap_err();
        assert!(matches!(err, ConfigError::Definitions { .. }));
    }

    #[test]
    fn test_rejects_blank_key() {
        let err = normalize(r#"["  "]"#).unwrap_err();
        assert!(matches!(err, ConfigError::Definitions { .. }));
    }

    #[test]
    fn test_rejects_type_without_value() {
        let err = normalize(r#"[["OPT", { type = "BOOL" }]]"#).unwrap_err();
        let ConfigError::Definitions { reason } = err else {
            panic!("wrong variant");
        };
        assert!(reason.contains("no value"));
    }

    #[test]
    fn test_typed_value() {
        let defs = normalize(r#"[["OPT", { type = "BOOL", value = true }]]"#).unwrap();
        assert_eq!(defs[0].ty.as_deref(), Some("BOOL"));
        assert_eq!(defs[0].value, DefineValue::Bool(true));
    }

    #[test]
    fn test_empty_value_table_means_bare_macro() {
        let defs = normalize(r#"[["FOO", {}]]"#).unwrap();
        assert_eq!(defs[0], Define::bare("FOO".into()));
    }

    #[test]
    fn test_key_is_trimmed() {
        let defs = normalize(r#"["  FOO  "]"#).unwrap();
        assert_eq!(defs[0].key, "FOO");
    }

    #[test]
    fn test_cmake_rendering() {
        let defs = normalize(
            r#"[["A", "x"], ["B", true], ["C", false], ["D"], ["E", { type = "STRING", value = "s" }], ["N", 3]]"#,
        )
        .unwrap();

        assert_eq!(
            render_cmake(&defs),
            vec!["-DA=x", "-DB=ON", "-DC=OFF", "-DD=", "-DE:STRING=s", "-DN=3"]
        );
    }

    #[test]
    fn test_make_rendering() {
        let defs =
            normalize(r#"[["A", "x"], ["B", true], ["C", false], ["D"]]"#).unwrap();

        assert_eq!(render_make(&defs), vec!["A=x", "B=1", "C=0", "D"]);
    }
}
