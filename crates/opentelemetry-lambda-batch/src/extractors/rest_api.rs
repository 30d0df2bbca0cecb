//! Attribute extraction for API Gateway REST API (v1) events.
//!
//! Follows the HTTP server span conventions:
//! <https://opentelemetry.io/docs/specs/semconv/http/http-spans/#http-server-semantic-conventions>

use aws_lambda_events::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use aws_lambda_events::encodings::Body;
use http::HeaderMap;
use opentelemetry::KeyValue;
use opentelemetry_semantic_conventions::attribute::{
    CLIENT_ADDRESS, CLIENT_PORT, HTTP_REQUEST_BODY_SIZE, HTTP_REQUEST_METHOD, HTTP_REQUEST_SIZE,
    HTTP_RESPONSE_BODY_SIZE, HTTP_RESPONSE_SIZE, HTTP_RESPONSE_STATUS_CODE, HTTP_ROUTE,
    NETWORK_PROTOCOL_NAME, NETWORK_PROTOCOL_VERSION, NETWORK_TRANSPORT, SERVER_ADDRESS,
    SERVER_PORT, URL_PATH, URL_QUERY, URL_SCHEME, USER_AGENT_ORIGINAL,
};

/// Query parameters whose values carry signatures and must never reach the
/// trace backend. Matched case-insensitively.
const REDACTED_QUERY_PARAMS: [&str; 4] = ["AWSAccessKeyId", "Signature", "sig", "X-Goog-Signature"];

/// Builds the low-cardinality span name, `"{METHOD} {route}"`.
///
/// The route comes from the API Gateway resource template with path
/// parameters rewritten to colon form, falling back to the raw path.
pub fn span_name(event: &ApiGatewayProxyRequest) -> String {
    let route = event
        .request_context
        .resource_path
        .as_deref()
        .or(event.path.as_deref())
        .unwrap_or("/");

    format!(
        "{} {}",
        normalize_method(&event.http_method),
        normalize_route(route)
    )
}

/// Extracts request attributes from a REST API event.
pub fn request_attributes(event: &ApiGatewayProxyRequest) -> Vec<KeyValue> {
    let mut attrs = Vec::new();

    attrs.push(KeyValue::new(
        HTTP_REQUEST_METHOD,
        normalize_method(&event.http_method),
    ));

    if let Some(path) = &event.path {
        attrs.push(KeyValue::new(URL_PATH, path.clone()));
    }

    if let Some(scheme) = header_value(&event.headers, "x-forwarded-proto") {
        attrs.push(KeyValue::new(URL_SCHEME, scheme));
    }

    if let Some(route) = event.request_context.resource_path.as_deref() {
        attrs.push(KeyValue::new(HTTP_ROUTE, normalize_route(route)));
    }

    attrs.push(KeyValue::new(NETWORK_PROTOCOL_NAME, "http"));

    if let Some(port) = forwarded_port(&event.headers) {
        attrs.push(KeyValue::new(SERVER_PORT, port));
        attrs.push(KeyValue::new(CLIENT_PORT, port));
    }

    if !event.multi_value_query_string_parameters.is_empty() {
        attrs.push(KeyValue::new(
            URL_QUERY,
            serialize_query(event.multi_value_query_string_parameters.iter()),
        ));
    }

    if let Some(ip) = &event.request_context.identity.source_ip {
        attrs.push(KeyValue::new(CLIENT_ADDRESS, ip.clone()));
    }

    if let Some(version) = event
        .request_context
        .protocol
        .as_deref()
        .and_then(protocol_version)
    {
        attrs.push(KeyValue::new(NETWORK_PROTOCOL_VERSION, version.to_owned()));
    }

    if let Some(domain) = &event.request_context.domain_name {
        attrs.push(KeyValue::new(SERVER_ADDRESS, domain.clone()));
    }

    if let Some(ua) = header_value(&event.headers, "user-agent") {
        attrs.push(KeyValue::new(USER_AGENT_ORIGINAL, ua));
    }

    attrs.push(KeyValue::new(
        HTTP_REQUEST_BODY_SIZE,
        event.body.as_deref().map(|b| b.len() as i64).unwrap_or(0),
    ));

    attrs.extend(header_attributes(
        &event.multi_value_headers,
        "http.request.header",
    ));

    if let Ok(serialized) = serde_json::to_vec(event) {
        attrs.push(KeyValue::new(HTTP_REQUEST_SIZE, serialized.len() as i64));
    }

    attrs.push(KeyValue::new(NETWORK_TRANSPORT, "tcp"));

    attrs
}

/// Extracts response attributes from a REST API result.
pub fn response_attributes(response: &ApiGatewayProxyResponse) -> Vec<KeyValue> {
    let mut attrs = Vec::new();

    attrs.push(KeyValue::new(
        HTTP_RESPONSE_STATUS_CODE,
        response.status_code,
    ));

    attrs.push(KeyValue::new(
        HTTP_RESPONSE_BODY_SIZE,
        body_size(response.body.as_ref()),
    ));

    attrs.extend(header_attributes(
        &response.multi_value_headers,
        "http.response.header",
    ));

    if let Ok(serialized) = serde_json::to_vec(response) {
        attrs.push(KeyValue::new(HTTP_RESPONSE_SIZE, serialized.len() as i64));
    }

    attrs
}

/// Maps an HTTP method onto the closed semantic-convention vocabulary.
///
/// Matching is case-insensitive; anything outside the known set maps to the
/// `_OTHER` sentinel rather than leaking arbitrary strings into the attribute.
pub fn normalize_method(method: &http::Method) -> &'static str {
    match method.as_str().to_ascii_uppercase().as_str() {
        "GET" => "GET",
        "POST" => "POST",
        "PUT" => "PUT",
        "DELETE" => "DELETE",
        "PATCH" => "PATCH",
        "HEAD" => "HEAD",
        "OPTIONS" => "OPTIONS",
        "CONNECT" => "CONNECT",
        "TRACE" => "TRACE",
        _ => "_OTHER",
    }
}

/// Rewrites API Gateway path-parameter segments to colon form.
///
/// `/todos/{id}` becomes `/todos/:id`; segments without braces pass through,
/// so `/` stays `/`.
pub fn normalize_route(route: &str) -> String {
    route
        .split('/')
        .map(|segment| {
            segment
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
                .map(|name| format!(":{name}"))
                .unwrap_or_else(|| segment.to_owned())
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Re-encodes query parameters as a canonical query string, redacting
/// signature-bearing parameter values.
///
/// Pair order is preserved; only values on the deny-list are replaced with
/// the literal `REDACTED`.
pub fn serialize_query<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut out = String::new();
    for (key, value) in pairs {
        if !out.is_empty() {
            out.push('&');
        }
        out.push_str(&urlencoding::encode(key));
        out.push('=');
        if REDACTED_QUERY_PARAMS
            .iter()
            .any(|denied| denied.eq_ignore_ascii_case(key))
        {
            out.push_str("REDACTED");
        } else {
            out.push_str(&urlencoding::encode(value));
        }
    }
    out
}

/// Byte length of a serialized response body; absent bodies are size 0.
fn body_size(body: Option<&Body>) -> i64 {
    match body {
        Some(Body::Text(text)) => text.len() as i64,
        Some(Body::Binary(bytes)) => bytes.len() as i64,
        Some(Body::Empty) | None => 0,
    }
}

/// One attribute per header name, `{namespace}.{lowercased-name}`, with
/// repeated values joined by commas.
fn header_attributes(headers: &HeaderMap, namespace: &str) -> Vec<KeyValue> {
    headers
        .keys()
        .map(|name| {
            let values: Vec<&str> = headers
                .get_all(name)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .collect();
            KeyValue::new(
                format!("{namespace}.{}", name.as_str().to_ascii_lowercase()),
                values.join(","),
            )
        })
        .collect()
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

fn forwarded_port(headers: &HeaderMap) -> Option<i64> {
    headers
        .get("x-forwarded-port")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok())
}

/// Extracts the version part of a protocol string, e.g. `HTTP/1.1` -> `1.1`.
fn protocol_version(protocol: &str) -> Option<&str> {
    protocol.split('/').nth(1)
}
