//! static catalog of supported resource types
use crate::resource_type::ResourceType;
use indexmap::IndexMap;

/// A resource type known to the backend
#[derive(Debug, PartialEq, Eq)]
pub struct CatalogEntry {
    pub module: &'static str,
    /// Class names accepted for this module
    pub classes: &'static [&'static str],
    pub terraform_type: &'static str,
    /// Attributes exposed directly on handles
    pub attributes: &'static [&'static str],
    /// Whether existing resources can be looked up
    pub data_source: bool,
}

macro_rules! entry {
    ($module:literal [$($class:literal),+] => $tf:literal, data: $data:literal, [$($attr:literal),*]) => {
        CatalogEntry {
            module: $module,
            classes: &[$($class),+],
            terraform_type: $tf,
            attributes: &["id", $($attr),*],
            data_source: $data,
        }
    };
}

static BUILTIN: &[CatalogEntry] = &[
    entry!("vpc" ["Vpc"] => "aws_vpc", data: true,
        ["arn", "cidr_block", "default_security_group_id", "main_route_table_id", "owner_id"]),
    entry!("subnet" ["Subnet"] => "aws_subnet", data: true,
        ["arn", "availability_zone", "cidr_block", "vpc_id"]),
    entry!("security_group" ["SecurityGroup"] => "aws_security_group", data: true,
        ["arn", "name", "vpc_id"]),
    entry!("internet_gateway" ["InternetGateway"] => "aws_internet_gateway", data: true,
        ["arn", "owner_id"]),
    entry!("instance" ["Instance"] => "aws_instance", data: true,
        ["arn", "private_ip", "public_ip", "public_dns"]),
    entry!("s3_bucket" ["Bucket", "S3Bucket"] => "aws_s3_bucket", data: true,
        ["arn", "bucket", "bucket_domain_name", "bucket_regional_domain_name"]),
    entry!("iam_role" ["Role", "IamRole"] => "aws_iam_role", data: true,
        ["arn", "name", "unique_id"]),
    entry!("lambda_function" ["Function", "LambdaFunction"] => "aws_lambda_function", data: true,
        ["arn", "function_name", "invoke_arn", "qualified_arn", "version"]),
    entry!("api_gateway_rest_api" ["RestApi", "ApiGatewayRestApi"] => "aws_api_gateway_rest_api", data: true,
        ["arn", "execution_arn", "root_resource_id"]),
    entry!("apigatewayv2_api" ["Api", "Apigatewayv2Api"] => "aws_apigatewayv2_api", data: true,
        ["arn", "api_endpoint", "execution_arn"]),
    entry!("dynamodb_table" ["Table", "DynamodbTable"] => "aws_dynamodb_table", data: true,
        ["arn", "name", "stream_arn"]),
    entry!("cloudfront_distribution" ["Distribution", "CloudfrontDistribution"] => "aws_cloudfront_distribution", data: true,
        ["arn", "domain_name", "hosted_zone_id"]),
    entry!("cloudwatch_dashboard" ["Dashboard", "CloudwatchDashboard"] => "aws_cloudwatch_dashboard", data: false,
        ["dashboard_arn"]),
    entry!("cognito_user_pool" ["UserPool", "CognitoUserPool"] => "aws_cognito_user_pool", data: true,
        ["arn", "endpoint"]),
    entry!("sqs_queue" ["Queue", "SqsQueue"] => "aws_sqs_queue", data: true,
        ["arn", "url"]),
    entry!("ssm_parameter" ["Parameter", "SsmParameter"] => "aws_ssm_parameter", data: true,
        ["arn", "name", "value", "version"]),
    entry!("bedrock_agent" ["Agent", "BedrockagentAgent"] => "aws_bedrockagent_agent", data: false,
        ["agent_arn", "agent_id", "agent_version"]),
];

/// Lookup table from [ResourceType] to [CatalogEntry]
///
/// Built once when the backend is initialized.
#[derive(Debug)]
pub struct Catalog {
    entries: IndexMap<ResourceType, &'static CatalogEntry>,
}

impl Catalog {
    pub fn builtin() -> Self {
        let mut entries = IndexMap::new();
        for entry in BUILTIN {
            for class in entry.classes {
                entries.insert(
                    ResourceType::new(entry.module.to_string(), class.to_string()),
                    entry,
                );
            }
        }

        Self { entries }
    }

    /// Locate the entry for `resource_type`
    ///
    /// With `data_source` set the type must also support lookups.
    pub fn resolve(
        &self,
        resource_type: &ResourceType,
        data_source: bool,
    ) -> Result<&'static CatalogEntry, TypeResolutionError> {
        let error = || {
            if data_source {
                TypeResolutionError::DataSource(resource_type.clone())
            } else {
                TypeResolutionError::Resource(resource_type.clone())
            }
        };

        let entry = self.entries.get(resource_type).copied().ok_or_else(error)?;
        if data_source && !entry.data_source {
            return Err(error());
        }

        Ok(entry)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ResourceType, &'static CatalogEntry)> {
        self.entries.iter().map(|(ty, entry)| (ty, *entry))
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TypeResolutionError {
    #[error("No resource type named '{}' in module '{}'", .0.class, .0.module)]
    Resource(ResourceType),
    #[error("No data source named '{}' in module '{}'", .0.class, .0.module)]
    DataSource(ResourceType),
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ty(tag: &str) -> ResourceType {
        ResourceType::from_tag(tag)
    }

    #[test]
    fn both_class_spellings_resolve() {
        let catalog = Catalog::builtin();
        assert_eq!(
            catalog.resolve(&ty("s3.Bucket"), false).unwrap().terraform_type,
            "aws_s3_bucket"
        );
        assert_eq!(
            catalog.resolve(&ty("s3.S3Bucket"), false).unwrap().terraform_type,
            "aws_s3_bucket"
        );
    }

    #[test]
    fn unknown_type() {
        let err = Catalog::builtin().resolve(&ty("foo.Widget"), false).unwrap_err();
        assert_eq!(err.to_string(), "No resource type named 'Widget' in module 'foo'");
    }

    #[test]
    fn data_source_must_exist() {
        let catalog = Catalog::builtin();
        assert!(catalog.resolve(&ty("cloudwatch.Dashboard"), false).is_ok());

        let err = catalog.resolve(&ty("cloudwatch.Dashboard"), true).unwrap_err();
        assert_eq!(err, TypeResolutionError::DataSource(ty("cloudwatch.Dashboard")));
        assert_eq!(
            err.to_string(),
            "No data source named 'Dashboard' in module 'cloudwatch_dashboard'"
        );
    }

    #[test]
    fn every_entry_exposes_id() {
        assert!(BUILTIN.iter().all(|entry| entry.attributes.contains(&"id")));
    }

    #[test]
    fn every_mapped_service_is_supported() {
        let catalog = Catalog::builtin();
        for (_, module) in crate::resource_type::SERVICE_MODULES {
            assert!(
                catalog.iter().any(|(ty, _)| ty.module == *module),
                "{module} missing from catalog"
            );
        }
    }
}
