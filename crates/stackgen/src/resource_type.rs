//! resource type addressing
//!
//! Declarations name their type as `service.ClassName` (`s3.Bucket`, `vpc.Vpc`). Backends address
//! types by `(module, class)`, where the module is derived from the service via [SERVICE_MODULES].
//! Changing these tables changes the supported resource surface.

/// Service used when a type tag has no `.`
pub const DEFAULT_SERVICE: &str = "ec2";

/// Service name → backend module
pub const SERVICE_MODULES: &[(&str, &str)] = &[
    ("vpc", "vpc"),
    ("ec2", "instance"),
    ("s3", "s3_bucket"),
    ("s3_bucket", "s3_bucket"),
    ("iam", "iam_role"),
    ("lambda", "lambda_function"),
    ("apigateway", "api_gateway_rest_api"),
    ("apigatewayv2", "apigatewayv2_api"),
    ("dynamodb", "dynamodb_table"),
    ("cloudfront", "cloudfront_distribution"),
    ("cloudwatch", "cloudwatch_dashboard"),
    ("cognito", "cognito_user_pool"),
    ("sqs", "sqs_queue"),
    ("ssm", "ssm_parameter"),
    ("bedrock", "bedrock_agent"),
];

/// Modules whose resources accept a `tags` argument
pub const TAGGABLE_MODULES: &[&str] = &[
    "s3_bucket",
    "lambda_function",
    "dynamodb_table",
    "api_gateway_rest_api",
    "cognito_user_pool",
    "sqs_queue",
    "apigatewayv2_api",
    "ssm_parameter",
    "iam_role",
    "cloudfront_distribution",
];

/// Backend addressing of a resource type
#[derive(derive_new::new, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceType {
    pub module: String,
    pub class: String,
}

impl ResourceType {
    /// Map a `service.ClassName` tag
    ///
    /// Only the first `.` separates service and class. Unknown services pass through lowercased.
    pub fn from_tag(tag: &str) -> Self {
        let (service, class) = tag.split_once('.').unwrap_or((DEFAULT_SERVICE, tag));

        Self::new(module_for_service(service), class.to_string())
    }

    pub fn supports_tags(&self) -> bool {
        TAGGABLE_MODULES.contains(&self.module.as_str())
    }
}

fn module_for_service(service: &str) -> String {
    let service = service.to_lowercase();

    SERVICE_MODULES
        .iter()
        .find(|(known, _)| *known == service)
        .map(|(_, module)| module.to_string())
        .unwrap_or(service)
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.module, self.class)
    }
}
