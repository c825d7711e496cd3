//! Terraform synthesizing backend
//!
//! [Stack] records every created resource, looked up data source and output, and serializes the
//! result as a Terraform configuration (json via [serde], or hcl via [Stack::to_hcl]).
//!
//! Handles do not know real attribute values, they hand out interpolation tokens such as
//! `${aws_vpc.main.id}` which Terraform resolves when applying.
use super::{
    AttributeError, Backend, BackendError, Catalog, CatalogEntry, ResourceHandle, ResourceRequest,
};
use crate::value::{Object, Value};
use indexmap::IndexMap;

const PROVIDER: &str = "aws";
const PROVIDER_SOURCE: &str = "hashicorp/aws";

/// terraform type → label → body
type Blocks = IndexMap<String, IndexMap<String, Object>>;

#[derive(Debug, serde::Serialize)]
pub struct Stack {
    terraform: Object,
    provider: IndexMap<&'static str, Vec<Object>>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    data: Blocks,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    resource: Blocks,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    output: IndexMap<String, Object>,

    #[serde(skip)]
    catalog: Catalog,
    /// Construct names in use (resources and data sources share one namespace)
    #[serde(skip)]
    constructs: std::collections::HashSet<String>,
}

impl Stack {
    /// Initialize a stack with the provider configured for `region`
    pub fn new(region: &str) -> Result<Self, BackendError> {
        let region = region.trim();
        if region.is_empty() {
            return Err(BackendError::Init("region must not be empty".to_string()));
        }

        let required_providers = Object::from([(
            PROVIDER.to_string(),
            Value::Object(Object::from([(
                "source".to_string(),
                Value::from(PROVIDER_SOURCE),
            )])),
        )]);
        let terraform = Object::from([(
            "required_providers".to_string(),
            Value::Object(required_providers),
        )]);

        let provider_config = Object::from([("region".to_string(), Value::from(region))]);

        tracing::debug!(region, "stack initialized");
        Ok(Self {
            terraform,
            provider: IndexMap::from([(PROVIDER, vec![provider_config])]),
            data: Default::default(),
            resource: Default::default(),
            output: Default::default(),
            catalog: Catalog::builtin(),
            constructs: Default::default(),
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Body of a created resource
    pub fn resource(&self, terraform_type: &str, name: &str) -> Option<&Object> {
        self.resource.get(terraform_type)?.get(name)
    }

    /// Body of a looked up data source
    pub fn data_source(&self, terraform_type: &str, name: &str) -> Option<&Object> {
        self.data.get(terraform_type)?.get(name)
    }

    pub fn outputs(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.output
            .iter()
            .filter_map(|(name, body)| body.get("value").map(|value| (name.as_str(), value)))
    }

    fn insert(
        &mut self,
        request: ResourceRequest<'_>,
        data_source: bool,
    ) -> Result<Box<dyn ResourceHandle>, BackendError> {
        let entry = self.catalog.resolve(request.resource_type, data_source)?;

        if !self.constructs.insert(request.name.to_string()) {
            return Err(BackendError::DuplicateConstruct(request.name.to_string()));
        }

        let metadata = Object::from([
            ("identifier".to_string(), Value::from(request.identifier)),
            ("type".to_string(), Value::from(request.resource_type.to_string())),
        ]);
        let mut body = Object::with_capacity(request.args.len() + 1);
        body.insert(
            "//".to_string(),
            Value::Object(Object::from([("metadata".to_string(), Value::Object(metadata))])),
        );
        body.extend(request.args);

        let (blocks, prefix) = if data_source {
            (&mut self.data, "data.")
        } else {
            (&mut self.resource, "")
        };
        blocks
            .entry(entry.terraform_type.to_string())
            .or_default()
            .insert(request.name.to_string(), body);

        let address = format!("{prefix}{}.{}", entry.terraform_type, request.name);
        tracing::trace!(%address, "construct added");

        Ok(Box::new(SynthesizedResource::new(address, entry)))
    }

    /// Render as hcl
    ///
    /// Fails if an argument name is not a valid hcl identifier.
    pub fn to_hcl(&self) -> Result<String, hcl::Error> {
        use hcl::{Attribute, Block, Body, Expression, Identifier};

        fn attributes(body: &Object) -> Result<Vec<Attribute>, hcl::Error> {
            body.iter()
                .filter(|(key, _)| key.as_str() != "//")
                .map(|(key, value)| {
                    Ok(Attribute::new(
                        Identifier::new(key.as_str())?,
                        Expression::from(value.clone()),
                    ))
                })
                .collect()
        }

        // settings like `required_providers` are blocks, not object attributes
        let mut terraform = Block::builder("terraform");
        for (key, value) in &self.terraform {
            terraform = match value {
                Value::Object(settings) => terraform.add_block(
                    Block::builder(Identifier::new(key.as_str())?)
                        .add_attributes(attributes(settings)?)
                        .build(),
                ),
                value => terraform.add_attribute(Attribute::new(
                    Identifier::new(key.as_str())?,
                    Expression::from(value.clone()),
                )),
            };
        }
        let mut builder = Body::builder().add_block(terraform.build());

        for (name, configs) in &self.provider {
            for config in configs {
                builder = builder.add_block(
                    Block::builder("provider")
                        .add_label(*name)
                        .add_attributes(attributes(config)?)
                        .build(),
                );
            }
        }

        for (kind, blocks) in [("data", &self.data), ("resource", &self.resource)] {
            for (terraform_type, constructs) in blocks {
                for (name, body) in constructs {
                    builder = builder.add_block(
                        Block::builder(kind)
                            .add_label(terraform_type.as_str())
                            .add_label(name.as_str())
                            .add_attributes(attributes(body)?)
                            .build(),
                    );
                }
            }
        }

        for (name, body) in &self.output {
            builder = builder.add_block(
                Block::builder("output")
                    .add_label(name.as_str())
                    .add_attributes(attributes(body)?)
                    .build(),
            );
        }

        hcl::to_string(&builder.build())
    }
}

impl Backend for Stack {
    #[tracing::instrument(level = "trace", skip_all, fields(name = request.name))]
    fn create(
        &mut self,
        request: ResourceRequest<'_>,
    ) -> Result<Box<dyn ResourceHandle>, BackendError> {
        self.insert(request, false)
    }

    #[tracing::instrument(level = "trace", skip_all, fields(name = request.name))]
    fn lookup(
        &mut self,
        request: ResourceRequest<'_>,
    ) -> Result<Box<dyn ResourceHandle>, BackendError> {
        self.insert(request, true)
    }

    fn export(&mut self, name: &str, value: Value) -> Result<(), BackendError> {
        if self.output.contains_key(name) {
            return Err(BackendError::DuplicateOutput(name.to_string()));
        }

        self.output.insert(
            name.to_string(),
            Object::from([("value".to_string(), value)]),
        );
        Ok(())
    }
}

/// Handle to a resource or data source in a [Stack]
#[derive(Debug, Clone)]
pub struct SynthesizedResource {
    /// `aws_vpc.main` or `data.aws_vpc.main`
    address: String,
    entry: &'static CatalogEntry,
}

impl SynthesizedResource {
    fn new(address: String, entry: &'static CatalogEntry) -> Self {
        Self { address, entry }
    }

    fn token(&self, attribute: &str) -> Value {
        Value::String(format!("${{{}.{attribute}}}", self.address))
    }
}

impl ResourceHandle for SynthesizedResource {
    fn attribute(&self, name: &str) -> Option<Value> {
        self.entry
            .attributes
            .contains(&name)
            .then(|| self.token(name))
    }

    /// Any well formed attribute path, `tags.Name` included
    fn attribute_by_name(&self, name: &str) -> Result<Value, AttributeError> {
        let well_formed = !name.is_empty()
            && name.split('.').all(|segment| {
                !segment.is_empty()
                    && segment
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            });

        if !well_formed {
            return Err(AttributeError::InvalidName(name.to_string()));
        }

        Ok(self.token(name))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::resource_type::ResourceType;
    use pretty_assertions::assert_eq;

    fn args(yaml: &str) -> Object {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn create(stack: &mut Stack, name: &str, tag: &str) -> Result<Box<dyn ResourceHandle>, BackendError> {
        let ty = ResourceType::from_tag(tag);
        stack.create(ResourceRequest::new(name, "generated-id", &ty, args("cidr_block: 10.0.0.0/16")))
    }

    #[test]
    fn empty_region_fails_init() {
        assert!(matches!(Stack::new("  "), Err(BackendError::Init(_))));
    }

    #[test]
    fn created_resource_tokens() {
        let mut stack = Stack::new("us-east-1").unwrap();
        let handle = create(&mut stack, "main", "vpc.Vpc").unwrap();

        assert_eq!(handle.id(), Ok(Value::from("${aws_vpc.main.id}")));
        assert_eq!(handle.attribute("arn"), Some(Value::from("${aws_vpc.main.arn}")));
        assert_eq!(handle.attribute("tags"), None);
        assert_eq!(
            handle.attribute_by_name("tags.Name"),
            Ok(Value::from("${aws_vpc.main.tags.Name}"))
        );
        assert_eq!(
            handle.attribute_by_name("bad name"),
            Err(AttributeError::InvalidName("bad name".into()))
        );
    }

    #[test]
    fn resource_body_keeps_metadata_and_args() {
        let mut stack = Stack::new("us-east-1").unwrap();
        create(&mut stack, "main", "vpc.Vpc").unwrap();

        let body = stack.resource("aws_vpc", "main").unwrap();
        assert_eq!(body.keys().collect::<Vec<_>>(), vec!["//", "cidr_block"]);
        assert_eq!(
            body["//"],
            Value::Object(args("metadata: {identifier: generated-id, type: vpc.Vpc}"))
        );
    }

    #[test]
    fn lookup_creates_data_source() {
        let mut stack = Stack::new("us-east-1").unwrap();
        let ty = ResourceType::from_tag("vpc.Vpc");
        let handle = stack
            .lookup(ResourceRequest::new("shared", "x", &ty, Object::new()))
            .unwrap();

        assert_eq!(handle.id(), Ok(Value::from("${data.aws_vpc.shared.id}")));
        assert!(stack.data_source("aws_vpc", "shared").is_some());
        assert!(stack.resource("aws_vpc", "shared").is_none());
    }

    #[test]
    fn unknown_type_is_rejected() {
        let mut stack = Stack::new("us-east-1").unwrap();
        let err = create(&mut stack, "w", "foo.Widget").unwrap_err();
        assert!(matches!(err, BackendError::TypeResolution(_)));
    }

    #[test]
    fn names_are_unique_across_resources_and_data() {
        let mut stack = Stack::new("us-east-1").unwrap();
        let ty = ResourceType::from_tag("vpc.Vpc");
        stack
            .lookup(ResourceRequest::new("main", "x", &ty, Object::new()))
            .unwrap();

        let err = create(&mut stack, "main", "vpc.Vpc").unwrap_err();
        assert_eq!(err, BackendError::DuplicateConstruct("main".into()));
    }

    #[test]
    fn outputs() {
        let mut stack = Stack::new("us-east-1").unwrap();
        stack.export("output_main", Value::from("${aws_vpc.main.id}")).unwrap();

        assert_eq!(
            stack.export("output_main", Value::Null),
            Err(BackendError::DuplicateOutput("output_main".into()))
        );
        assert_eq!(
            stack.outputs().collect::<Vec<_>>(),
            vec![("output_main", &Value::from("${aws_vpc.main.id}"))]
        );
    }

    #[test]
    fn json_layout() {
        let mut stack = Stack::new("eu-west-1").unwrap();
        create(&mut stack, "main", "vpc.Vpc").unwrap();

        let json = serde_json::to_value(&stack).unwrap();
        assert_eq!(json["provider"]["aws"][0]["region"], "eu-west-1");
        assert_eq!(json["resource"]["aws_vpc"]["main"]["cidr_block"], "10.0.0.0/16");
        assert!(json.get("data").is_none());
        assert!(json.get("output").is_none());
    }

    #[test]
    fn hcl_rendering() {
        let mut stack = Stack::new("us-east-1").unwrap();
        let vpc = create(&mut stack, "main", "vpc.Vpc").unwrap();
        stack.export("output_main", vpc.id().unwrap()).unwrap();

        let hcl = stack.to_hcl().unwrap();
        assert!(hcl.contains(r#"resource "aws_vpc" "main" {"#), "{hcl}");
        assert!(hcl.contains(r#"provider "aws" {"#), "{hcl}");
        assert!(hcl.contains(r#"value = "${aws_vpc.main.id}""#), "{hcl}");
        assert!(!hcl.contains("metadata"), "{hcl}");
    }

    #[test]
    fn hcl_output_parses() {
        let mut stack = Stack::new("us-east-1").unwrap();
        let bucket = create(&mut stack, "data", "s3.Bucket").unwrap();
        let arn = match bucket.attribute("arn") {
            Some(Value::String(arn)) => arn,
            other => panic!("unexpected arn {other:?}"),
        };
        let policy =
            format!(r#"{{"Effect": "Allow", "Resource": ["{arn}/home/${{aws:username}}/*"]}}"#);
        let ty = ResourceType::from_tag("iam.Role");
        stack
            .create(ResourceRequest::new(
                "reader",
                "x",
                &ty,
                Object::from([("assume_role_policy".to_string(), Value::from(policy))]),
            ))
            .unwrap();

        let hcl = stack.to_hcl().unwrap();
        let body: hcl::Body = hcl::from_str(&hcl).unwrap_or_else(|err| panic!("{err}\n{hcl}"));

        assert!(hcl.contains("${aws_s3_bucket.data.arn}/home/$${aws:username}/*"), "{hcl}");
        assert!(hcl.contains(r#"\"Effect\": \"Allow\""#), "{hcl}");

        let terraform = body
            .blocks()
            .find(|block| block.identifier() == "terraform")
            .unwrap();
        assert!(terraform
            .body()
            .blocks()
            .any(|block| block.identifier() == "required_providers"));
        assert_eq!(terraform.body().attributes().count(), 0);
    }

    #[test]
    fn hcl_rejects_invalid_argument_names() {
        let mut stack = Stack::new("us-east-1").unwrap();
        let ty = ResourceType::from_tag("sqs.Queue");
        stack
            .create(ResourceRequest::new(
                "jobs",
                "x",
                &ty,
                Object::from([("my key".to_string(), Value::Integer(1))]),
            ))
            .unwrap();

        assert!(stack.to_hcl().is_err());
    }
}
