//! # OpenAPI Synthesis
//!
//! Renders an [`ExtractionResult`] as a partial OpenAPI 3.1 document using
//! the `utoipa` model. Scanned projects have no document of their own; this
//! gives them one that can be fed back through the OpenAPI extractor.

use crate::models::{
    AuthRequirement, EndpointRecord, ExtractionResult, HttpMethod, ParamLocation, SchemaNode,
};
use indexmap::IndexMap;
use utoipa::openapi::path::{
    HttpMethod as OpenApiMethod, Operation, OperationBuilder, ParameterBuilder, ParameterIn,
};
use utoipa::openapi::request_body::RequestBodyBuilder;
use utoipa::openapi::security::{
    ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityRequirement, SecurityScheme,
};
use utoipa::openapi::{
    ComponentsBuilder, ContentBuilder, InfoBuilder, OpenApi, OpenApiBuilder, Paths, RefOr,
    Required, ResponseBuilder, Schema, ServerBuilder,
};

/// Builds the document for `result`, titled `title`.
pub fn synthesize_openapi(title: &str, result: &ExtractionResult) -> OpenApi {
    let version = result.project.version.as_deref().unwrap_or("0.1.0");
    let mut paths = Paths::new();
    let mut schemes: IndexMap<String, SecurityScheme> = IndexMap::new();

    for record in &result.endpoints {
        let operation = build_operation(record, &mut schemes);
        paths.add_path_operation(&record.path, vec![openapi_method(record.method)], operation);
    }

    let mut components = ComponentsBuilder::new();
    for (name, scheme) in schemes {
        components = components.security_scheme(name, scheme);
    }

    let mut builder = OpenApiBuilder::new()
        .info(InfoBuilder::new().title(title).version(version).build())
        .paths(paths)
        .components(Some(components.build()));
    if let Some(base) = &result.project.base_url {
        builder = builder.servers(Some(vec![ServerBuilder::new().url(base).build()]));
    }
    builder.build()
}

fn openapi_method(method: HttpMethod) -> OpenApiMethod {
    match method {
        HttpMethod::Get => OpenApiMethod::Get,
        HttpMethod::Post => OpenApiMethod::Post,
        HttpMethod::Put => OpenApiMethod::Put,
        HttpMethod::Patch => OpenApiMethod::Patch,
        HttpMethod::Delete => OpenApiMethod::Delete,
        HttpMethod::Head => OpenApiMethod::Head,
        HttpMethod::Options => OpenApiMethod::Options,
        HttpMethod::Trace => OpenApiMethod::Trace,
    }
}

fn parameter_in(location: ParamLocation) -> ParameterIn {
    match location {
        ParamLocation::Path => ParameterIn::Path,
        ParamLocation::Query => ParameterIn::Query,
        ParamLocation::Header => ParameterIn::Header,
        ParamLocation::Cookie => ParameterIn::Cookie,
    }
}

fn required(flag: bool) -> Required {
    if flag {
        Required::True
    } else {
        Required::False
    }
}

/// Converts through the JSON-Schema rendering; `None` if utoipa rejects it.
fn schema_of(node: &SchemaNode) -> Option<RefOr<Schema>> {
    serde_json::from_value(node.to_json_schema()).ok()
}

fn build_operation(
    record: &EndpointRecord,
    schemes: &mut IndexMap<String, SecurityScheme>,
) -> Operation {
    let mut op = OperationBuilder::new()
        .operation_id(Some(record.operation_id.clone()))
        .summary(record.summary.clone())
        .description(record.description.clone());
    if !record.tags.is_empty() {
        op = op.tags(Some(record.tags.clone()));
    }

    for param in &record.parameters {
        op = op.parameter(
            ParameterBuilder::new()
                .name(&param.name)
                .parameter_in(parameter_in(param.location))
                .required(required(param.required))
                .description(param.description.clone())
                .schema(schema_of(&param.schema))
                .build(),
        );
    }

    if let Some(body) = &record.request_body {
        let content = ContentBuilder::new()
            .schema(body.schema.as_ref().and_then(schema_of))
            .build();
        op = op.request_body(Some(
            RequestBodyBuilder::new()
                .content(&body.content_type, content)
                .required(Some(required(body.required)))
                .build(),
        ));
    }

    if record.responses.is_empty() {
        op = op.response("200", ResponseBuilder::new().description("Successful response").build());
    }
    for (status, spec) in &record.responses {
        let mut response =
            ResponseBuilder::new().description(spec.description.clone().unwrap_or_default());
        if let Some(content_type) = &spec.content_type {
            let content = ContentBuilder::new()
                .schema(spec.schema.as_ref().and_then(schema_of))
                .build();
            response = response.content(content_type, content);
        }
        op = op.response(status, response.build());
    }

    if let Some(name) = register_scheme(&record.auth, schemes) {
        op = op.security(SecurityRequirement::new(name, Vec::<String>::new()));
    }
    op.build()
}

/// Adds the component for `auth` and returns the name operations refer to.
fn register_scheme(
    auth: &AuthRequirement,
    schemes: &mut IndexMap<String, SecurityScheme>,
) -> Option<String> {
    let (name, scheme) = match auth {
        AuthRequirement::None => return None,
        AuthRequirement::Unknown { scheme } => return Some(scheme.clone()),
        AuthRequirement::Bearer { format } => {
            let mut http = HttpBuilder::new().scheme(HttpAuthScheme::Bearer);
            if let Some(format) = format {
                http = http.bearer_format(format);
            }
            ("bearerAuth".to_string(), SecurityScheme::Http(http.build()))
        }
        AuthRequirement::Basic => (
            "basicAuth".to_string(),
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Basic).build()),
        ),
        AuthRequirement::ApiKey { name, location } => {
            let value = ApiKeyValue::new(name);
            let key = match location {
                ParamLocation::Query => ApiKey::Query(value),
                ParamLocation::Cookie => ApiKey::Cookie(value),
                ParamLocation::Header | ParamLocation::Path => ApiKey::Header(value),
            };
            (format!("apiKey_{}", name), SecurityScheme::ApiKey(key))
        }
    };
    schemes.entry(name.clone()).or_insert(scheme);
    Some(name)
}
