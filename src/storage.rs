//! Object storage client.
//!
//! Writes and deletes objects in an S3 bucket through the S3 REST API with
//! AWS Signature V4 authentication (`hmac` + `sha2`).
//!
//! # Configuration
//!
//! ```toml
//! [storage]
//! bucket = "raw-challenge-globant-uploads"
//! region = "us-east-1"
//! # endpoint_url = "http://localhost:9000"   # MinIO
//! ```
//!
//! # Environment Variables
//!
//! - `AWS_ACCESS_KEY_ID`: required
//! - `AWS_SECRET_ACCESS_KEY`: required
//! - `AWS_SESSION_TOKEN`: optional (temporary credentials / IAM roles)
//!
//! Objects are addressed either virtual-hosted style
//! (`<bucket>.s3.<region>.amazonaws.com/<key>`) or, for a custom endpoint,
//! path style (`<endpoint>/<bucket>/<key>`).

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use quick_xml::events::Event;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::config::StorageConfig;
use crate::error::StoreError;

type HmacSha256 = Hmac<Sha256>;

/// `DeleteObjects` accepts at most this many keys per request.
const MAX_DELETE_BATCH: usize = 1000;

/// "Store blob at key" / "delete these keys".
#[async_trait]
pub trait ObjectStore: Send + Sync {
    fn bucket(&self) -> &str;

    async fn put(&self, key: &str, body: Vec<u8>) -> Result<(), StoreError>;

    /// Delete `keys` with as few requests as the backend allows.
    ///
    /// Keys that do not exist count as deleted. Keys the store refused are
    /// returned; `Err` means a whole batch request failed.
    async fn delete_many(&self, keys: &[String]) -> Result<Vec<DeleteFailure>, StoreError>;
}

/// A key the store refused to delete, as reported in a `DeleteObjects`
/// response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteFailure {
    pub key: String,
    pub code: String,
    pub message: String,
}

/// `s3://{bucket}/{key}`
pub fn location_for(bucket: &str, key: &str) -> String {
    format!("s3://{}/{}", bucket, key)
}

/// Recover the object key from an `s3://{bucket}/{key}` location.
///
/// Returns `None` when the location has no key part.
pub fn key_from_location(location: &str) -> Option<&str> {
    let rest = location.strip_prefix("s3://").unwrap_or(location);
    match rest.split_once('/') {
        Some((_, key)) if !key.is_empty() => Some(key),
        _ => None,
    }
}

// ============ AWS Credentials ============

/// AWS credentials, read once at startup.
#[derive(Clone)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl AwsCredentials {
    /// Load credentials from `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`,
    /// and optionally `AWS_SESSION_TOKEN`.
    pub fn from_env() -> Result<Self> {
        let access_key_id = std::env::var("AWS_ACCESS_KEY_ID")
            .context("AWS_ACCESS_KEY_ID environment variable not set")?;
        let secret_access_key = std::env::var("AWS_SECRET_ACCESS_KEY")
            .context("AWS_SECRET_ACCESS_KEY environment variable not set")?;
        let session_token = std::env::var("AWS_SESSION_TOKEN").ok();

        Ok(Self {
            access_key_id,
            secret_access_key,
            session_token,
        })
    }
}

impl std::fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

// ============ S3 ============

pub struct S3Store {
    config: StorageConfig,
    creds: AwsCredentials,
    client: reqwest::Client,
}

impl S3Store {
    pub fn new(config: StorageConfig, creds: AwsCredentials) -> Self {
        Self {
            config,
            creds,
            client: reqwest::Client::new(),
        }
    }

    /// Send a signed request.
    ///
    /// `key` may be empty to address the bucket itself. `sub_resource` is a
    /// bare query flag such as `delete` (signed as `delete=`).
    async fn send(
        &self,
        method: reqwest::Method,
        key: &str,
        sub_resource: Option<&str>,
        extra_headers: Vec<(String, String)>,
        body: Vec<u8>,
    ) -> Result<reqwest::Response, StoreError> {
        let target = object_target(&self.config, key);
        let mut url = target.url.clone();
        let canonical_query = match sub_resource {
            Some(flag) => {
                url.push('?');
                url.push_str(flag);
                format!("{}=", flag)
            }
            None => String::new(),
        };

        let now = Utc::now();
        let date_stamp = now.format("%Y%m%d").to_string();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();

        let payload_hash = hex_sha256(&body);

        let mut headers = vec![
            ("host".to_string(), target.host.clone()),
            ("x-amz-content-sha256".to_string(), payload_hash.clone()),
            ("x-amz-date".to_string(), amz_date.clone()),
        ];
        if let Some(ref token) = self.creds.session_token {
            headers.push(("x-amz-security-token".to_string(), token.clone()));
        }
        headers.extend(extra_headers);
        headers.sort_by(|a, b| a.0.cmp(&b.0));

        let signed_headers: String = headers
            .iter()
            .map(|(k, _)| k.as_str())
            .collect::<Vec<_>>()
            .join(";");

        let canonical_headers: String = headers
            .iter()
            .map(|(k, v)| format!("{}:{}\n", k, v))
            .collect();

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            method.as_str(),
            target.canonical_uri,
            canonical_query,
            canonical_headers,
            signed_headers,
            payload_hash
        );

        let credential_scope = format!("{}/{}/s3/aws4_request", date_stamp, self.config.region);
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            amz_date,
            credential_scope,
            hex_sha256(canonical_request.as_bytes())
        );

        let signing_key = derive_signing_key(
            &self.creds.secret_access_key,
            &date_stamp,
            &self.config.region,
            "s3",
        );
        let signature = hex_hmac_sha256(&signing_key, string_to_sign.as_bytes());

        let authorization = format!(
            "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
            self.creds.access_key_id, credential_scope, signed_headers, signature
        );

        let mut req_builder = self
            .client
            .request(method, &url)
            .header("Authorization", &authorization);
        for (name, value) in headers.iter().filter(|(name, _)| name != "host") {
            req_builder = req_builder.header(name.as_str(), value.as_str());
        }

        req_builder
            .body(body)
            .send()
            .await
            .map_err(|e| StoreError::Request {
                bucket: self.config.bucket.clone(),
                key: key.to_string(),
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    fn bucket(&self) -> &str {
        &self.config.bucket
    }

    async fn put(&self, key: &str, body: Vec<u8>) -> Result<(), StoreError> {
        let resp = self
            .send(reqwest::Method::PUT, key, None, Vec::new(), body)
            .await?;
        check_status(resp, "PutObject", key).await?;
        Ok(())
    }

    async fn delete_many(&self, keys: &[String]) -> Result<Vec<DeleteFailure>, StoreError> {
        let mut failures = Vec::new();

        for batch in keys.chunks(MAX_DELETE_BATCH) {
            let body = delete_request_body(batch).into_bytes();
            let checksum = STANDARD.encode(Sha256::digest(&body));
            let headers = vec![
                ("x-amz-checksum-sha256".to_string(), checksum),
                ("x-amz-sdk-checksum-algorithm".to_string(), "SHA256".to_string()),
            ];
            let label = format!("{} keys starting at {}", batch.len(), batch[0]);

            let resp = self
                .send(reqwest::Method::POST, "", Some("delete"), headers, body)
                .await?;
            let resp = check_status(resp, "DeleteObjects", &label).await?;
            let text = resp.text().await.map_err(|e| StoreError::Request {
                bucket: self.config.bucket.clone(),
                key: label.clone(),
                message: e.to_string(),
            })?;
            let refused = parse_delete_errors(&text).map_err(|e| StoreError::Request {
                bucket: self.config.bucket.clone(),
                key: label.clone(),
                message: format!("malformed DeleteObjects response: {}", e),
            })?;
            failures.extend(refused);
        }

        Ok(failures)
    }
}

/// Pass 2xx responses through; anything else becomes [`StoreError::Status`].
async fn check_status(
    resp: reqwest::Response,
    operation: &'static str,
    key: &str,
) -> Result<reqwest::Response, StoreError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Err(StoreError::Status {
        operation,
        status,
        key: key.to_string(),
        body: body.chars().take(500).collect(),
    })
}

/// Quiet-mode `DeleteObjects` body: only refused keys are reported back.
fn delete_request_body(keys: &[String]) -> String {
    let mut body =
        String::from(r#"<Delete xmlns="http://s3.amazonaws.com/doc/2006-03-01/"><Quiet>true</Quiet>"#);
    for key in keys {
        body.push_str("<Object><Key>");
        body.push_str(&quick_xml::escape::escape(key.as_str()));
        body.push_str("</Key></Object>");
    }
    body.push_str("</Delete>");
    body
}

/// Collect the `<Error>` entries of a `DeleteResult` document.
fn parse_delete_errors(xml: &str) -> Result<Vec<DeleteFailure>, quick_xml::Error> {
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut failures = Vec::new();
    let mut current: Option<DeleteFailure> = None;
    let mut field: Option<Vec<u8>> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                if name == b"Error" {
                    current = Some(DeleteFailure::default());
                } else {
                    field = Some(name);
                }
            }
            Event::Text(te) => {
                if let (Some(failure), Some(name)) = (current.as_mut(), field.as_deref()) {
                    let value = te.unescape().map_err(quick_xml::Error::from)?.into_owned();
                    match name {
                        b"Key" => failure.key = value,
                        b"Code" => failure.code = value,
                        b"Message" => failure.message = value,
                        _ => {}
                    }
                }
            }
            Event::End(e) => {
                if e.local_name().as_ref() == b"Error" {
                    failures.extend(current.take());
                }
                field = None;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(failures)
}

/// Where a signed request goes.
struct ObjectTarget {
    url: String,
    host: String,
    canonical_uri: String,
}

/// Compute the URL, `Host` header and canonical URI for an object, or for
/// the bucket itself when `key` is empty.
///
/// A custom `endpoint_url` (MinIO, LocalStack, etc.) is addressed path
/// style; AWS proper uses `<bucket>.s3.<region>.amazonaws.com`.
fn object_target(config: &StorageConfig, key: &str) -> ObjectTarget {
    let key_path = if key.is_empty() {
        String::new()
    } else {
        let encoded = key.split('/').map(uri_encode).collect::<Vec<_>>().join("/");
        format!("/{}", encoded)
    };

    if let Some(ref endpoint) = config.endpoint_url {
        let scheme = if endpoint.starts_with("http://") {
            "http"
        } else {
            "https"
        };
        let host = endpoint
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/')
            .to_string();
        let canonical_uri = format!("/{}{}", uri_encode(&config.bucket), key_path);
        ObjectTarget {
            url: format!("{}://{}{}", scheme, host, canonical_uri),
            host,
            canonical_uri,
        }
    } else {
        let host = format!("{}.s3.{}.amazonaws.com", config.bucket, config.region);
        let canonical_uri = if key_path.is_empty() {
            "/".to_string()
        } else {
            key_path
        };
        ObjectTarget {
            url: format!("https://{}{}", host, canonical_uri),
            host,
            canonical_uri,
        }
    }
}

// ============ AWS SigV4 Helpers ============

/// Compute the hex-encoded SHA-256 hash of data.
fn hex_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Compute HMAC-SHA256 of data with the given key.
fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn hex_hmac_sha256(key: &[u8], data: &[u8]) -> String {
    hex::encode(hmac_sha256(key, data))
}

/// Derive the AWS SigV4 signing key for a given date, region, and service.
///
/// ```text
/// kDate    = HMAC("AWS4" + secret, dateStamp)
/// kRegion  = HMAC(kDate, region)
/// kService = HMAC(kRegion, service)
/// kSigning = HMAC(kService, "aws4_request")
/// ```
fn derive_signing_key(secret_key: &str, date_stamp: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(
        format!("AWS4{}", secret_key).as_bytes(),
        date_stamp.as_bytes(),
    );
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

/// URI-encode a string per RFC 3986, leaving only `A-Z a-z 0-9 - _ . ~`.
fn uri_encode(s: &str) -> String {
    let mut result = String::new();
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            _ => {
                result.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    result
}

// ============ In-memory ============

/// In-memory [`ObjectStore`] for tests and local runs.
pub struct MemoryStore {
    bucket: String,
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects
            .read()
            .ok()
            .and_then(|objects| objects.get(key).cloned())
    }

    /// All stored keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .read()
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.objects.read().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(&self, key: &str, body: Vec<u8>) -> Result<(), StoreError> {
        let mut objects = self.objects.write().map_err(|e| StoreError::Request {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            message: e.to_string(),
        })?;
        objects.insert(key.to_string(), body);
        Ok(())
    }

    async fn delete_many(&self, keys: &[String]) -> Result<Vec<DeleteFailure>, StoreError> {
        let mut objects = self.objects.write().map_err(|e| StoreError::Request {
            bucket: self.bucket.clone(),
            key: keys.join(", "),
            message: e.to_string(),
        })?;
        for key in keys {
            objects.remove(key);
        }
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;

    #[test]
    fn test_key_from_location() {
        assert_eq!(
            key_from_location("s3://bucket/departments/abc_chunk0.csv"),
            Some("departments/abc_chunk0.csv")
        );
        assert_eq!(key_from_location("s3://bucket/"), None);
        assert_eq!(key_from_location("s3://bucket"), None);
    }

    #[test]
    fn test_location_round_trip() {
        let loc = location_for("b", "jobs/x_chunk2.csv");
        assert_eq!(loc, "s3://b/jobs/x_chunk2.csv");
        assert_eq!(key_from_location(&loc), Some("jobs/x_chunk2.csv"));
    }

    #[test]
    fn test_uri_encode() {
        assert_eq!(uri_encode("abc_chunk0.csv"), "abc_chunk0.csv");
        assert_eq!(uri_encode("a b+c"), "a%20b%2Bc");
    }

    #[test]
    fn test_signing_key_is_deterministic() {
        let a = derive_signing_key("secret", "20240101", "us-east-1", "s3");
        let b = derive_signing_key("secret", "20240101", "us-east-1", "s3");
        let c = derive_signing_key("secret", "20240102", "us-east-1", "s3");
        assert_eq!(a.len(), 32);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_empty_payload_hash() {
        assert_eq!(
            hex_sha256(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_virtual_hosted_target() {
        let config = StorageConfig {
            bucket: "uploads".to_string(),
            region: "us-east-2".to_string(),
            endpoint_url: None,
        };
        let t = object_target(&config, "jobs/a b.csv");
        assert_eq!(t.host, "uploads.s3.us-east-2.amazonaws.com");
        assert_eq!(t.canonical_uri, "/jobs/a%20b.csv");
        assert_eq!(t.url, "https://uploads.s3.us-east-2.amazonaws.com/jobs/a%20b.csv");
    }

    #[test]
    fn test_custom_endpoint_is_path_style() {
        let config = StorageConfig {
            bucket: "uploads".to_string(),
            region: "us-east-1".to_string(),
            endpoint_url: Some("http://localhost:9000/".to_string()),
        };
        let t = object_target(&config, "jobs/x.csv");
        assert_eq!(t.host, "localhost:9000");
        assert_eq!(t.url, "http://localhost:9000/uploads/jobs/x.csv");
    }

    #[tokio::test]
    async fn test_memory_store_delete_is_idempotent() {
        let store = MemoryStore::new("bucket");
        store.put("a.csv", b"x".to_vec()).await.unwrap();
        assert_eq!(store.get("a.csv"), Some(b"x".to_vec()));

        let keys = vec!["a.csv".to_string(), "missing.csv".to_string()];
        assert!(store.delete_many(&keys).await.unwrap().is_empty());
        assert!(store.delete_many(&keys).await.unwrap().is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_bucket_target_for_empty_key() {
        let mut config = StorageConfig {
            bucket: "uploads".to_string(),
            region: "us-east-1".to_string(),
            endpoint_url: None,
        };
        assert_eq!(object_target(&config, "").canonical_uri, "/");

        config.endpoint_url = Some("http://localhost:9000".to_string());
        let t = object_target(&config, "");
        assert_eq!(t.canonical_uri, "/uploads");
        assert_eq!(t.url, "http://localhost:9000/uploads");
    }

    #[test]
    fn test_delete_body_escapes_keys() {
        let body = delete_request_body(&["jobs/a_chunk0.csv".to_string(), "jobs/b&c.csv".to_string()]);
        assert!(body.contains("<Quiet>true</Quiet>"));
        assert!(body.contains("<Object><Key>jobs/a_chunk0.csv</Key></Object>"));
        assert!(body.contains("<Key>jobs/b&amp;c.csv</Key>"));
    }

    #[test]
    fn test_parse_delete_errors() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<DeleteResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Error><Key>jobs/a_chunk0.csv</Key><Code>AccessDenied</Code><Message>Access Denied</Message></Error>
  <Error><Key>jobs/b_chunk1.csv</Key><Code>InternalError</Code><Message>try again</Message></Error>
</DeleteResult>"#;
        let failures = parse_delete_errors(xml).unwrap();
        assert_eq!(failures.len(), 2);
        assert_eq!(
            failures[0],
            DeleteFailure {
                key: "jobs/a_chunk0.csv".to_string(),
                code: "AccessDenied".to_string(),
                message: "Access Denied".to_string(),
            }
        );
        assert_eq!(failures[1].code, "InternalError");

        assert!(parse_delete_errors("<DeleteResult/>").unwrap().is_empty());
    }

    // ---- S3Store against a local endpoint ----

    struct Captured {
        query: Option<String>,
        headers: axum::http::HeaderMap,
        body: Vec<u8>,
    }

    /// Serve `POST /uploads` with a fixed response, recording each request.
    async fn fake_s3(
        status: axum::http::StatusCode,
        reply: &'static str,
    ) -> (S3Store, std::sync::Arc<std::sync::Mutex<Vec<Captured>>>) {
        use axum::{body::Bytes, http::HeaderMap, http::Uri, routing::post, Router};
        use std::sync::{Arc, Mutex};

        let seen: Arc<Mutex<Vec<Captured>>> = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();
        let app = Router::new().route(
            "/uploads",
            post(move |uri: Uri, headers: HeaderMap, body: Bytes| {
                let recorder = recorder.clone();
                async move {
                    recorder.lock().unwrap().push(Captured {
                        query: uri.query().map(str::to_string),
                        headers,
                        body: body.to_vec(),
                    });
                    (status, reply)
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = StorageConfig {
            bucket: "uploads".to_string(),
            region: "us-east-1".to_string(),
            endpoint_url: Some(format!("http://{}", addr)),
        };
        let creds = AwsCredentials {
            access_key_id: "AKID".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: None,
        };
        (S3Store::new(config, creds), seen)
    }

    #[tokio::test]
    async fn test_delete_many_sends_one_signed_batch() {
        let (store, seen) = fake_s3(axum::http::StatusCode::OK, "<DeleteResult/>").await;
        let keys = vec!["jobs/a_chunk0.csv".to_string(), "jobs/a_chunk1.csv".to_string()];

        let failures = store.delete_many(&keys).await.unwrap();
        assert!(failures.is_empty());

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let req = &seen[0];
        assert_eq!(req.query.as_deref(), Some("delete"));
        let body = String::from_utf8(req.body.clone()).unwrap();
        assert!(body.contains("jobs/a_chunk0.csv"));
        assert!(body.contains("jobs/a_chunk1.csv"));

        let checksum = req.headers["x-amz-checksum-sha256"].to_str().unwrap();
        assert_eq!(checksum, STANDARD.encode(Sha256::digest(&req.body)));
        let auth = req.headers["authorization"].to_str().unwrap();
        assert!(auth.starts_with("AWS4-HMAC-SHA256 Credential=AKID/"));
        assert!(auth.contains("x-amz-checksum-sha256"));
    }

    #[tokio::test]
    async fn test_delete_many_reports_refused_keys() {
        let reply = "<DeleteResult><Error><Key>jobs/a_chunk1.csv</Key>\
                     <Code>AccessDenied</Code><Message>Access Denied</Message></Error></DeleteResult>";
        let (store, _) = fake_s3(axum::http::StatusCode::OK, reply).await;
        let keys = vec!["jobs/a_chunk0.csv".to_string(), "jobs/a_chunk1.csv".to_string()];

        let failures = store.delete_many(&keys).await.unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].key, "jobs/a_chunk1.csv");
        assert_eq!(failures[0].code, "AccessDenied");
    }

    #[tokio::test]
    async fn test_delete_many_missing_bucket_is_an_error() {
        let (store, _) = fake_s3(
            axum::http::StatusCode::NOT_FOUND,
            "<Error><Code>NoSuchBucket</Code></Error>",
        )
        .await;

        let err = store
            .delete_many(&["jobs/a_chunk0.csv".to_string()])
            .await
            .unwrap_err();
        match err {
            StoreError::Status {
                operation, status, ..
            } => {
                assert_eq!(operation, "DeleteObjects");
                assert_eq!(status, 404);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
