//! argument resolution
//!
//! Argument values may contain marker strings:
//!
//! | marker                    | resolves to                                          |
//! |---------------------------|------------------------------------------------------|
//! | `secret:<key>`            | the placeholder `${<key>}`, the secret is not read   |
//! | `ref:<resource>`          | attribute `id` of an already built resource          |
//! | `ref:<resource>.<attr>`   | attribute `<attr>` of an already built resource      |
//!
//! Everything else is a literal. Only the first `.` of a reference separates resource and
//! attribute, so `ref:vpc.tags.Name` reads the attribute `tags.Name` of `vpc`.
use crate::backend::{AttributeError, DEFAULT_ATTRIBUTE};
use crate::diagnostics::Diagnostics;
use crate::registry::Registry;
use crate::value::{Object, Value};
use crate::visit::VisitStrings;

pub const SECRET_PREFIX: &str = "secret:";
pub const REFERENCE_PREFIX: &str = "ref:";

/// A recognized marker string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker<'a> {
    Secret(&'a str),
    Reference(Reference<'a>),
}

impl<'a> Marker<'a> {
    /// `None` for literals
    pub fn parse(s: &'a str) -> Option<Self> {
        if let Some(key) = s.strip_prefix(SECRET_PREFIX) {
            return Some(Marker::Secret(key));
        }

        s.strip_prefix(REFERENCE_PREFIX)
            .map(|reference| Marker::Reference(Reference::parse(reference)))
    }
}

#[derive(derive_new::new, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference<'a> {
    pub resource: &'a str,
    pub attribute: &'a str,
}

impl<'a> Reference<'a> {
    /// Parse the part after `ref:`
    pub fn parse(s: &'a str) -> Self {
        match s.split_once('.') {
            Some((resource, attribute)) => Self::new(resource, attribute),
            None => Self::new(s, DEFAULT_ATTRIBUTE),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ResolveError {
    #[error("Referenced resource '{0}' not found")]
    ReferenceNotFound(String),
    #[error("Unable to read attribute '{attribute}' of resource '{resource}'")]
    Attribute {
        resource: String,
        attribute: String,
        #[source]
        source: AttributeError,
    },
}

/// Resolve all markers in `value`
///
/// Marker-free input is returned unchanged.
pub fn resolve(
    value: &Value,
    registry: &Registry,
    diagnostics: &mut Diagnostics,
) -> Result<Value, ResolveError> {
    match value {
        Value::Object(object) => resolve_object(object, registry, diagnostics).map(Value::Object),
        Value::Array(array) => array
            .iter()
            .map(|element| resolve(element, registry, diagnostics))
            .collect::<Result<_, _>>()
            .map(Value::Array),
        Value::String(s) => match Marker::parse(s) {
            Some(marker) => resolve_marker(marker, registry, diagnostics),
            None => Ok(value.clone()),
        },
        Value::Null | Value::Boolean(_) | Value::Integer(_) | Value::Decimal(_) => {
            Ok(value.clone())
        }
    }
}

/// [resolve] for every value of an object, keys and order stay as they are
pub fn resolve_object(
    object: &Object,
    registry: &Registry,
    diagnostics: &mut Diagnostics,
) -> Result<Object, ResolveError> {
    object
        .iter()
        .map(|(key, value)| {
            Ok::<_, ResolveError>((key.clone(), resolve(value, registry, diagnostics)?))
        })
        .collect()
}

#[tracing::instrument(level = "trace", skip(registry, diagnostics))]
fn resolve_marker(
    marker: Marker<'_>,
    registry: &Registry,
    diagnostics: &mut Diagnostics,
) -> Result<Value, ResolveError> {
    match marker {
        Marker::Secret(key) => {
            diagnostics.warn(format!(
                "Secret references like {key} are not fully implemented"
            ));
            Ok(Value::String(format!("${{{key}}}")))
        }
        Marker::Reference(Reference {
            resource,
            attribute,
        }) => {
            let handle = registry
                .get(resource)
                .ok_or_else(|| ResolveError::ReferenceNotFound(resource.to_string()))?;

            if let Some(value) = handle.attribute(attribute) {
                return Ok(value);
            }

            diagnostics.warn(format!(
                "Attribute '{attribute}' not found directly on resource '{resource}'"
            ));
            handle
                .attribute_by_name(attribute)
                .map_err(|source| ResolveError::Attribute {
                    resource: resource.to_string(),
                    attribute: attribute.to_string(),
                    source,
                })
        }
    }
}

/// Names of all resources referenced by `value`, in walk order without duplicates
pub fn references(value: &impl VisitStrings) -> Vec<String> {
    let mut names: Vec<String> = vec![];
    value.visit_strings(&mut |s: &str| {
        if let Some(Marker::Reference(reference)) = Marker::parse(s) {
            if !names.iter().any(|name| name == reference.resource) {
                names.push(reference.resource.to_string());
            }
        }
    });
    names
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::registry::test::StubHandle;
    use crate::value::Object;
    use pretty_assertions::assert_eq;

    fn yaml(input: &str) -> Value {
        serde_yaml::from_str(input).unwrap()
    }

    fn registry() -> Registry {
        let mut registry = Registry::default();
        registry
            .register(
                "vpc-example",
                Box::new(
                    StubHandle::with_id("vpc-123")
                        .direct("cidr_block", "10.0.0.0/16")
                        .direct("tags.Name", "dotted")
                        .by_name("owner_id", "acct-1"),
                ),
            )
            .unwrap();
        registry
    }

    #[test]
    fn marker_parsing() {
        assert_eq!(Marker::parse("secret:db_password"), Some(Marker::Secret("db_password")));
        assert_eq!(
            Marker::parse("ref:vpc"),
            Some(Marker::Reference(Reference::new("vpc", "id")))
        );
        assert_eq!(
            Marker::parse("ref:vpc.tags.Name"),
            Some(Marker::Reference(Reference::new("vpc", "tags.Name")))
        );
        assert_eq!(Marker::parse("env:HOME"), None);
        assert_eq!(Marker::parse(" ref:vpc"), None);
        assert_eq!(Marker::parse("REF:vpc"), None);
    }

    #[test]
    fn reference_with_attribute() {
        let mut diagnostics = Diagnostics::new();
        let resolved = resolve(
            &Value::from("ref:vpc-example.cidr_block"),
            &registry(),
            &mut diagnostics,
        );
        assert_eq!(resolved, Ok(Value::from("10.0.0.0/16")));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn reference_defaults_to_id() {
        let registry = registry();
        let mut diagnostics = Diagnostics::new();

        let bare = resolve(&Value::from("ref:vpc-example"), &registry, &mut diagnostics);
        let explicit = resolve(&Value::from("ref:vpc-example.id"), &registry, &mut diagnostics);

        assert_eq!(bare, Ok(Value::from("vpc-123")));
        assert_eq!(bare, explicit);
    }

    #[test]
    fn attribute_names_keep_their_dots() {
        let resolved = resolve(
            &Value::from("ref:vpc-example.tags.Name"),
            &registry(),
            &mut Diagnostics::new(),
        );
        assert_eq!(resolved, Ok(Value::from("dotted")));
    }

    #[test]
    fn fallback_accessor_warns() {
        let mut diagnostics = Diagnostics::new();
        let resolved = resolve(
            &Value::from("ref:vpc-example.owner_id"),
            &registry(),
            &mut diagnostics,
        );

        assert_eq!(resolved, Ok(Value::from("acct-1")));
        assert_eq!(diagnostics.warnings().count(), 1);
    }

    #[test]
    fn unknown_attribute() {
        let resolved = resolve(
            &Value::from("ref:vpc-example.nope"),
            &registry(),
            &mut Diagnostics::new(),
        );
        assert_eq!(
            resolved,
            Err(ResolveError::Attribute {
                resource: "vpc-example".into(),
                attribute: "nope".into(),
                source: AttributeError::Missing("nope".into()),
            })
        );
    }

    #[test]
    fn missing_resource() {
        let resolved = resolve(
            &yaml("a: [1, {b: 'ref:subnet.id'}]"),
            &registry(),
            &mut Diagnostics::new(),
        );
        assert_eq!(
            resolved,
            Err(ResolveError::ReferenceNotFound("subnet".into()))
        );
    }

    #[test]
    fn secret_placeholder() {
        let mut diagnostics = Diagnostics::new();
        let resolved = resolve(&Value::from("secret:db_password"), &registry(), &mut diagnostics);

        assert_eq!(resolved, Ok(Value::from("${db_password}")));
        assert_eq!(diagnostics.warnings().count(), 1);
    }

    #[test]
    fn nested_structures() {
        let input = yaml(
            r#"
vpc_id: ref:vpc-example
ingress:
  - from_port: 443
    cidr_blocks: ["ref:vpc-example.cidr_block", "0.0.0.0/0"]
password: secret:pw
enabled: true
nothing: null
"#,
        );

        let resolved = resolve(&input, &registry(), &mut Diagnostics::new()).unwrap();

        assert_eq!(
            resolved,
            yaml(
                r#"
vpc_id: vpc-123
ingress:
  - from_port: 443
    cidr_blocks: ["10.0.0.0/16", "0.0.0.0/0"]
password: ${pw}
enabled: true
nothing: null
"#
            )
        );
    }

    #[test]
    fn marker_free_input_is_unchanged() {
        let input = yaml("name: web\nports: [80, 443]\nratio: 0.5\nmeta: {a: b, c: ~}");
        let mut diagnostics = Diagnostics::new();

        let once = resolve(&input, &Registry::default(), &mut diagnostics).unwrap();
        let twice = resolve(&once, &Registry::default(), &mut diagnostics).unwrap();

        assert_eq!(once, input);
        assert_eq!(twice, input);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn object_order_is_preserved() {
        let object: Object = serde_yaml::from_str("z: ref:vpc-example\na: 1").unwrap();
        let resolved = resolve_object(&object, &registry(), &mut Diagnostics::new()).unwrap();
        assert_eq!(resolved.keys().collect::<Vec<_>>(), vec!["z", "a"]);
    }

    #[test]
    fn lists_references() {
        let value = yaml("a: ref:vpc\nb: ['ref:subnet.id', 'ref:vpc.arn']\nc: secret:x");
        assert_eq!(references(&value), vec!["vpc", "subnet"]);
    }
}
