//! Configuration schema validation
//!
//! A [`Schema`] is a tree of nodes mirroring the expected shape of the
//! configuration. Validation walks the value tree and the schema tree in
//! lock-step. Sections are closed: keys they do not declare are rejected,
//! which catches typos in `makelove.toml`.
//!
//! Validation is pure. It neither applies defaults nor rewrites values.

use toml::Value;

use crate::error::SchemaError;

/// A schema node
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    /// Table with a fixed set of named children; unknown keys are errors
    Section(Vec<(String, Schema)>),
    /// Array whose elements all match the inner node
    List(Box<Schema>),
    /// Table with arbitrary keys, validated by the key and value nodes
    Dict(Box<Schema>, Box<Schema>),
    /// String equal to one of the listed choices
    Choice(Vec<String>),
    /// Any string
    String,
    /// Boolean
    Bool,
    /// Filesystem path (syntactic string, existence is not checked)
    Path,
    /// Shell command (syntactic string)
    Command,
    /// Anything
    Any,
    /// The first alternative that validates wins
    Option(Vec<Schema>),
}

/// Internal failure while walking below the nearest section
enum Failure {
    /// Shape mismatch without a message yet; the enclosing section names it
    Mismatch,
    /// Fully described failure from a deeper section
    Reported(SchemaError),
}

impl From<SchemaError> for Failure {
    fn from(err: SchemaError) -> Self {
        Self::Reported(err)
    }
}

impl Schema {
    /// Build a section from `(key, node)` pairs
    pub fn section<I, K>(children: I) -> Self
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<String>,
    {
        Self::Section(children.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build a list node
    pub fn list(elem: Schema) -> Self {
        Self::List(Box::new(elem))
    }

    /// Build a dictionary node
    pub fn dict(key: Schema, value: Schema) -> Self {
        Self::Dict(Box::new(key), Box::new(value))
    }

    /// Build a choice node
    pub fn choice<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Choice(choices.into_iter().map(Into::into).collect())
    }

    /// A single value or a list of such values
    pub fn value_or_list(elem: Schema) -> Self {
        Self::Option(vec![elem.clone(), Self::list(elem)])
    }

    /// Human-readable description of what this node accepts
    pub fn describe(&self) -> String {
        match self {
            Self::Section(_) => "Section".to_string(),
            Self::List(elem) => format!("List({})", elem.describe()),
            Self::Dict(key, value) => format!(
                "Dictionary(key = {}, value = {})",
                key.describe(),
                value.describe()
            ),
            Self::Choice(choices) => format!("One of [{}]", choices.join(", ")),
            Self::String => "String".to_string(),
            Self::Bool => "Boolean".to_string(),
            Self::Path => "Path".to_string(),
            Self::Command => "Command".to_string(),
            Self::Any => "Any value".to_string(),
            Self::Option(alternatives) => format!(
                "Option({})",
                alternatives
                    .iter()
                    .map(Schema::describe)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }

    /// Validate a value against this schema
    ///
    /// Returns the accepted value unchanged, or the failure with the dotted
    /// key path of the deepest offending parameter.
    pub fn validate<'v>(&self, value: &'v Value) -> Result<&'v Value, SchemaError> {
        match self.check(value, "") {
            Ok(()) => Ok(value),
            Err(Failure::Reported(err)) => Err(err),
            Err(Failure::Mismatch) => Err(SchemaError::InvalidValue {
                path: String::new(),
                expected: self.describe(),
            }),
        }
    }

    fn check(&self, value: &Value, path: &str) -> Result<(), Failure> {
        match self {
            Self::Section(children) => {
                let table = value.as_table().ok_or(Failure::Mismatch)?;
                for (key, child_value) in table {
                    let child_path = join_path(path, key);
                    let node = children
                        .iter()
                        .find(|(k, _)| k == key)
                        .map(|(_, node)| node)
                        .ok_or_else(|| SchemaError::UnknownKey {
                            path: child_path.clone(),
                        })?;
                    match node.check(child_value, &child_path) {
                        Ok(()) => {}
                        Err(Failure::Mismatch) => {
                            return Err(SchemaError::InvalidValue {
                                path: child_path,
                                expected: node.describe(),
                            }
                            .into());
                        }
                        Err(reported) => return Err(reported),
                    }
                }
                Ok(())
            }
            Self::List(elem) => {
                let items = value.as_array().ok_or(Failure::Mismatch)?;
                items.iter().try_for_each(|item| elem.check(item, path))
            }
            Self::Dict(key_node, value_node) => {
                let table = value.as_table().ok_or(Failure::Mismatch)?;
                for (key, item) in table {
                    key_node.check(&Value::String(key.clone()), path)?;
                    value_node.check(item, path)?;
                }
                Ok(())
            }
            Self::Choice(choices) => match value.as_str() {
                Some(s) if choices.iter().any(|c| c == s) => Ok(()),
                _ => Err(Failure::Mismatch),
            },
            Self::String | Self::Path | Self::Command => {
                if value.is_str() {
                    Ok(())
                } else {
                    Err(Failure::Mismatch)
                }
            }
            Self::Bool => {
                if value.is_bool() {
                    Ok(())
                } else {
                    Err(Failure::Mismatch)
                }
            }
            Self::Any => Ok(()),
            Self::Option(alternatives) => {
                if alternatives
                    .iter()
                    .any(|alt| alt.check(value, path).is_ok())
                {
                    Ok(())
                } else {
                    Err(Failure::Mismatch)
                }
            }
        }
    }
}

fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}
