use aws_sdk_s3::Client;
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_smithy_types::byte_stream::ByteStream;
use tracing::debug;

use crate::error::StorageError;

const JSON: &str = "application/json";

/// Result of a GET operation: the body and its ETag.
pub struct GetObjectOutput {
    pub body: Vec<u8>,
    pub etag: Option<String>,
}

/// Get an object. A missing key is `Ok(None)`.
pub async fn get_object(
    client: &Client,
    bucket: &str,
    key: &str,
) -> Result<Option<GetObjectOutput>, StorageError> {
    let resp = match client.get_object().bucket(bucket).key(key).send().await {
        Ok(resp) => resp,
        Err(e) => {
            let err = e.into_service_error();
            if err.is_no_such_key() {
                return Ok(None);
            }
            return Err(StorageError::GetObject(err.to_string()));
        }
    };

    let etag = resp.e_tag().map(|s| s.to_string());
    let body = resp
        .body
        .collect()
        .await
        .map_err(|e| StorageError::GetObject(e.to_string()))?
        .into_bytes()
        .to_vec();

    debug!(key, bytes = body.len(), "object read");
    Ok(Some(GetObjectOutput { body, etag }))
}

/// Put a JSON object, replacing any existing one. Returns the new ETag.
pub async fn put_object(
    client: &Client,
    bucket: &str,
    key: &str,
    body: Vec<u8>,
) -> Result<String, StorageError> {
    let resp = client
        .put_object()
        .bucket(bucket)
        .key(key)
        .content_type(JSON)
        .body(ByteStream::from(body))
        .send()
        .await
        .map_err(|e| StorageError::PutObject(e.into_service_error().to_string()))?;

    debug!(key, "object written");
    Ok(resp.e_tag().unwrap_or_default().to_string())
}

/// Put a JSON object with an If-Match precondition (ETag optimistic locking).
/// Returns the new ETag, or `StorageError::PreconditionFailed` if the object
/// changed since `expected_etag` was read.
pub async fn put_object_if_match(
    client: &Client,
    bucket: &str,
    key: &str,
    body: Vec<u8>,
    expected_etag: &str,
) -> Result<String, StorageError> {
    let resp = client
        .put_object()
        .bucket(bucket)
        .key(key)
        .content_type(JSON)
        .body(ByteStream::from(body))
        .if_match(expected_etag)
        .send()
        .await
        .map_err(|e| {
            let err = e.into_service_error();
            match err.code() {
                // 412 on a stale ETag, 409 when a concurrent write won the race
                Some("PreconditionFailed" | "ConditionalRequestConflict") => {
                    StorageError::PreconditionFailed {
                        key: key.to_string(),
                    }
                }
                _ => StorageError::PutObject(err.to_string()),
            }
        })?;

    debug!(key, "object written if match");
    Ok(resp.e_tag().unwrap_or_default().to_string())
}

/// Put a JSON object only if the key does not exist yet (`If-None-Match: *`).
/// Returns the new ETag, or `StorageError::AlreadyExists`.
pub async fn put_object_once(
    client: &Client,
    bucket: &str,
    key: &str,
    body: Vec<u8>,
) -> Result<String, StorageError> {
    let resp = client
        .put_object()
        .bucket(bucket)
        .key(key)
        .content_type(JSON)
        .body(ByteStream::from(body))
        .if_none_match("*")
        .send()
        .await
        .map_err(|e| {
            let err = e.into_service_error();
            match err.code() {
                Some("PreconditionFailed" | "ConditionalRequestConflict") => {
                    StorageError::AlreadyExists {
                        key: key.to_string(),
                    }
                }
                _ => StorageError::PutObject(err.to_string()),
            }
        })?;

    debug!(key, "object written once");
    Ok(resp.e_tag().unwrap_or_default().to_string())
}

/// List keys under a prefix, following continuation tokens.
pub async fn list_objects(
    client: &Client,
    bucket: &str,
    prefix: &str,
) -> Result<Vec<String>, StorageError> {
    let mut keys = Vec::new();
    let mut continuation_token: Option<String> = None;

    loop {
        let mut req = client.list_objects_v2().bucket(bucket).prefix(prefix);

        if let Some(token) = &continuation_token {
            req = req.continuation_token(token);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| StorageError::ListObjects(e.into_service_error().to_string()))?;

        keys.extend(resp.contents().iter().filter_map(|o| o.key().map(str::to_string)));

        if resp.is_truncated() == Some(true) {
            continuation_token = resp.next_continuation_token().map(|s| s.to_string());
        } else {
            break;
        }
    }

    Ok(keys)
}
