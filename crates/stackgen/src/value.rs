//! value representation
//!
//! Resource arguments, context tags and handle attributes share one data model
//! - null
//! - boolean (true/false)
//! - integer (signed, i64)
//! - decimal (f64)
//! - string (utf-8)
//! - array ("list" of values)
//! - object (order-preserving "map"/"dictionary", where the key is of type string)
//!
//! Values are read from yaml ([serde_yaml::Value]) and written as json, yaml or hcl.
use indexmap::IndexMap;
use serde::{
    ser::{SerializeMap, SerializeSeq},
    Serializer,
};

pub type Object = IndexMap<String, Value>;

/// All possible value types
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(try_from = "serde_yaml::Value")]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Decimal(f64),
    String(String),
    Array(Vec<Value>),
    Object(Object),
}

impl Value {
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Loose truthiness as used by flags like `existing`
    ///
    /// `null`, `false`, zero, empty strings and empty collections are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Decimal(d) => *d != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Object(o) => !o.is_empty(),
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Decimal(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Array(value.into_iter().map(Into::into).collect())
    }
}

impl<K: ToString, V: Into<Value>> From<IndexMap<K, V>> for Value {
    fn from(value: IndexMap<K, V>) -> Self {
        Value::Object(
            value
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.into()))
                .collect(),
        )
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ValueError {
    #[error("number {0} is out of range")]
    NumberOutOfRange(String),
    #[error("mapping keys must be scalars, found {0}")]
    UnsupportedKey(&'static str),
}

impl TryFrom<serde_yaml::Number> for Value {
    type Error = ValueError;

    fn try_from(value: serde_yaml::Number) -> Result<Self, Self::Error> {
        if let Some(int) = value.as_i64() {
            return Ok(Value::Integer(int));
        }

        // u64 beyond i64::MAX, or a float
        value
            .as_f64()
            .filter(|_| !value.is_u64())
            .map(Value::Decimal)
            .ok_or_else(|| ValueError::NumberOutOfRange(value.to_string()))
    }
}

impl TryFrom<serde_yaml::Value> for Value {
    type Error = ValueError;

    fn try_from(value: serde_yaml::Value) -> Result<Self, Self::Error> {
        use serde_yaml::Value as Yaml;

        Ok(match value {
            Yaml::Null => Value::Null,
            Yaml::Bool(b) => b.into(),
            Yaml::Number(n) => n.try_into()?,
            Yaml::String(s) => s.into(),
            Yaml::Sequence(seq) => Value::Array(
                seq.into_iter()
                    .map(Value::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            Yaml::Mapping(mapping) => {
                let mut object = Object::with_capacity(mapping.len());
                for (key, value) in mapping {
                    object.insert(mapping_key(key)?, value.try_into()?);
                }
                Value::Object(object)
            }
            // custom tags (`!Ref foo`) carry no meaning here
            Yaml::Tagged(tagged) => tagged.value.try_into()?,
        })
    }
}

fn mapping_key(key: serde_yaml::Value) -> Result<String, ValueError> {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => Ok(s),
        Yaml::Bool(b) => Ok(b.to_string()),
        Yaml::Number(n) => Ok(n.to_string()),
        Yaml::Null => Ok("null".to_string()),
        Yaml::Sequence(_) => Err(ValueError::UnsupportedKey("sequence")),
        Yaml::Mapping(_) => Err(ValueError::UnsupportedKey("mapping")),
        Yaml::Tagged(tagged) => mapping_key(tagged.value),
    }
}

impl From<Value> for hcl::Expression {
    fn from(value: Value) -> Self {
        use hcl::{Expression, ObjectKey, TemplateExpr};

        match value {
            Value::Null => Expression::Null,
            Value::Boolean(b) => Expression::Bool(b),
            Value::Integer(i) => Expression::Number(i.into()),
            Value::Decimal(d) => hcl::Number::from_f64(d)
                .map(Expression::Number)
                .unwrap_or(Expression::Null),
            // interpolation tokens must stay templates, plain strings get `${` escaped
            Value::String(s) => match quoted_template(&s) {
                Some(template) => {
                    Expression::TemplateExpr(Box::new(TemplateExpr::QuotedString(template)))
                }
                None => Expression::String(s),
            },
            Value::Array(array) => {
                Expression::Array(array.into_iter().map(Into::into).collect())
            }
            Value::Object(object) => Expression::Object(
                object
                    .into_iter()
                    .map(|(k, v)| {
                        let key = match hcl::Identifier::new(k.as_str()) {
                            Ok(ident) => ObjectKey::Identifier(ident),
                            Err(_) => ObjectKey::Expression(Expression::String(k)),
                        };
                        (key, v.into())
                    })
                    .collect(),
            ),
        }
    }
}

/// Source of a quoted hcl template for `s`, or `None` if `s` interpolates nothing
///
/// Only `${reference.path}` is kept as interpolation. Quotes, backslashes and control characters
/// are escaped, any other `${` or `%{` becomes a literal (`$${`, `%%{`).
fn quoted_template(s: &str) -> Option<String> {
    let mut template = String::with_capacity(s.len());
    let mut interpolated = false;
    let mut rest = s;

    while let Some(c) = rest.chars().next() {
        let reference = rest
            .strip_prefix("${")
            .and_then(|tail| tail.split_once('}'))
            .map(|(reference, _)| reference)
            .filter(|reference| is_reference(reference));

        if let Some(reference) = reference {
            template.push_str("${");
            template.push_str(reference);
            template.push('}');
            rest = &rest[reference.len() + 3..];
            interpolated = true;
            continue;
        }

        match c {
            '"' => template.push_str("\\\""),
            '\\' => template.push_str("\\\\"),
            '\n' => template.push_str("\\n"),
            '\r' => template.push_str("\\r"),
            '\t' => template.push_str("\\t"),
            '$' | '%' if rest[1..].starts_with('{') => {
                template.push(c);
                template.push(c);
            }
            c => template.push(c),
        }
        rest = &rest[c.len_utf8()..];
    }

    interpolated.then_some(template)
}

/// `aws_vpc.main.id`, every segment an hcl identifier
fn is_reference(path: &str) -> bool {
    path.split('.').all(|segment| {
        segment.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
            && segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    })
}

impl serde::ser::Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Boolean(value) => serializer.serialize_bool(*value),
            Value::Integer(value) => serializer.serialize_i64(*value),
            Value::Decimal(value) => serializer.serialize_f64(*value),
            Value::String(value) => serializer.serialize_str(value),
            Value::Array(value) => {
                let mut ser = serializer.serialize_seq(Some(value.len()))?;
                for element in value {
                    ser.serialize_element(element)?;
                }
                ser.end()
            }
            Value::Object(value) => {
                let mut ser = serializer.serialize_map(Some(value.len()))?;
                for (element_key, element_value) in value {
                    ser.serialize_entry(element_key, element_value)?;
                }
                ser.end()
            }
        }
    }
}
