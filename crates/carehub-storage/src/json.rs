use aws_sdk_s3::Client;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::StorageError;
use crate::objects;

/// Load and deserialize a JSON object. A missing key is `Ok(None)`.
pub async fn load_json<T: DeserializeOwned>(
    client: &Client,
    bucket: &str,
    key: &str,
) -> Result<Option<T>, StorageError> {
    Ok(load_json_tagged(client, bucket, key)
        .await?
        .map(|(value, _)| value))
}

/// Like [`load_json`], also returning the object's ETag.
pub async fn load_json_tagged<T: DeserializeOwned>(
    client: &Client,
    bucket: &str,
    key: &str,
) -> Result<Option<(T, String)>, StorageError> {
    match objects::get_object(client, bucket, key).await? {
        Some(output) => Ok(Some((
            serde_json::from_slice(&output.body)?,
            output.etag.unwrap_or_default(),
        ))),
        None => Ok(None),
    }
}

pub async fn save_json<T: Serialize>(
    client: &Client,
    bucket: &str,
    key: &str,
    value: &T,
) -> Result<String, StorageError> {
    let body = serde_json::to_vec_pretty(value)?;
    objects::put_object(client, bucket, key, body).await
}

/// Save a JSON object only if it is unchanged since `expected_etag`.
pub async fn save_json_if_match<T: Serialize>(
    client: &Client,
    bucket: &str,
    key: &str,
    value: &T,
    expected_etag: &str,
) -> Result<String, StorageError> {
    let body = serde_json::to_vec_pretty(value)?;
    objects::put_object_if_match(client, bucket, key, body, expected_etag).await
}

/// Save a JSON object that must never be overwritten.
pub async fn save_json_once<T: Serialize>(
    client: &Client,
    bucket: &str,
    key: &str,
    value: &T,
) -> Result<String, StorageError> {
    let body = serde_json::to_vec_pretty(value)?;
    objects::put_object_once(client, bucket, key, body).await
}
