use super::types::{ECHO_MESSAGE, EchoResponse, NO_BODY};
use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, Multipart, Request},
    http::{HeaderMap, Method, Uri, header},
    response::Json,
};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::info;

pub async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<EchoResponse> {
    info!("Echoing {} {}", method, uri);

    let query_params = uri
        .query()
        .map(|query| first_values(query.as_bytes()))
        .unwrap_or_default();

    Json(EchoResponse {
        message: ECHO_MESSAGE.to_string(),
        method: method.to_string(),
        path: uri.path().to_string(),
        query_params,
        body: describe_body(&headers, body).await,
    })
}

/// JSON if the request declared and carried a truthy JSON document, else the
/// non-empty form fields, else the sentinel.
pub async fn describe_body(headers: &HeaderMap, body: Bytes) -> Value {
    let mime = mime_type(headers);

    if is_json_mime(&mime) {
        if let Ok(value) = serde_json::from_slice::<Value>(&body) {
            if is_truthy(&value) {
                return value;
            }
        }
    }

    let form = match mime.as_str() {
        "application/x-www-form-urlencoded" => first_values(&body),
        "multipart/form-data" => multipart_fields(headers, body).await,
        _ => BTreeMap::new(),
    };
    if !form.is_empty() {
        return serde_json::to_value(form).unwrap_or(Value::Null);
    }

    Value::String(NO_BODY.to_string())
}

/// Text fields of a multipart body; the first occurrence of a name wins.
async fn multipart_fields(headers: &HeaderMap, body: Bytes) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();

    let mut request = Request::new(Body::from(body));
    if let Some(content_type) = headers.get(header::CONTENT_TYPE) {
        request
            .headers_mut()
            .insert(header::CONTENT_TYPE, content_type.clone());
    }
    let Ok(mut multipart) = Multipart::from_request(request, &()).await else {
        return fields;
    };

    while let Ok(Some(field)) = multipart.next_field().await {
        // Uploaded files are not form fields.
        if field.file_name().is_some() {
            continue;
        }
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if let Ok(value) = field.text().await {
            fields.entry(name).or_insert(value);
        }
    }

    fields
}

fn mime_type(headers: &HeaderMap) -> String {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .unwrap_or_default()
}

fn is_json_mime(mime: &str) -> bool {
    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Decode `key=value` pairs; the first occurrence of a key wins.
fn first_values(encoded: &[u8]) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for (key, value) in url::form_urlencoded::parse(encoded) {
        map.entry(key.into_owned()).or_insert_with(|| value.into_owned());
    }
    map
}
