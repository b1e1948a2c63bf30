//! Resolution of citation source URIs into a formatted reference list.
//!
//! Every per-source failure is non-fatal: a malformed URI, a fetch
//! error, or a document missing its fields is logged and skipped. The
//! resolver never fails; at worst it returns an empty string.

use serde_json::Value;

/// Failure of the object-store collaborator. A single fetch failure
/// marks that source unusable; no retry is performed here.
#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreError {
    #[error("object store unreachable: {0}")]
    Unavailable(String),
    #[error("object `{bucket}/{key}` not found")]
    NotFound { bucket: String, key: String },
    #[error("object body undecodable: {0}")]
    InvalidBody(String),
}

/// Key→JSON-document lookup collaborator.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    async fn fetch_json(&self, bucket: &str, key: &str) -> Result<Value, ObjectStoreError>;
}

/// A (title, url) pair resolved from a source document.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ResolvedSource {
    title: String,
    url: String,
}

/// Resolve source URIs into a 1-indexed markdown reference list.
///
/// Duplicate (title, url) pairs collapse to their first occurrence;
/// ordering is first-seen. Fetches run sequentially per source.
pub async fn resolve(store: &dyn ObjectStore, sources: &[String]) -> String {
    let mut resolved: Vec<ResolvedSource> = Vec::new();

    for source in sources {
        let Some((bucket, key)) = parse_s3_uri(source) else {
            tracing::warn!(uri = %source, "invalid source URI, skipping");
            continue;
        };

        let document = match store.fetch_json(bucket, key).await {
            Ok(document) => document,
            Err(err) => {
                tracing::warn!(uri = %source, error = %err, "source fetch failed, skipping");
                continue;
            }
        };

        let url = document.get("Url").and_then(Value::as_str);
        let title = document.get("Topic").and_then(Value::as_str);
        let (Some(url), Some(title)) = (url, title) else {
            tracing::warn!(uri = %source, "source document missing Url/Topic, skipping");
            continue;
        };

        let entry = ResolvedSource {
            title: title.to_string(),
            url: url.to_string(),
        };
        // Exact-pair dedup, first-seen order preserved.
        if !resolved.contains(&entry) {
            resolved.push(entry);
        }
    }

    let mut refs = String::new();
    for (index, source) in resolved.iter().enumerate() {
        if !source.url.starts_with("http://") && !source.url.starts_with("https://") {
            tracing::warn!(url = %source.url, "non-http source url, skipping");
            continue;
        }
        refs.push_str(&format!(
            "{}. [{}]({})\n\n",
            index + 1,
            source.title,
            source.url
        ));
    }

    refs
}

/// Split an `s3://bucket/key` URI into bucket and non-empty key.
fn parse_s3_uri(uri: &str) -> Option<(&str, &str)> {
    let rest = uri.strip_prefix("s3://")?;
    let (bucket, key) = rest.split_once('/')?;
    if bucket.is_empty() || key.is_empty() {
        return None;
    }
    Some((bucket, key))
}
