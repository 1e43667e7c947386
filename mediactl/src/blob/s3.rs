use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    Client,
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    primitives::ByteStream,
};
use bytes::Bytes;
use tracing::instrument;

use super::{BlobError, BlobObject, BlobStorage, Result, base_uri, check_name};
use crate::config::BlobStorageConfig;

/// S3-compatible object storage backend
#[derive(Clone)]
pub struct S3BlobStorage {
    client: Client,
    bucket: String,
    public_base: String,
}

impl S3BlobStorage {
    pub fn new(client: Client, bucket: String, public_base_url: &str) -> Self {
        Self {
            client,
            bucket,
            public_base: base_uri(public_base_url),
        }
    }

    /// Build the client from the `s3` blob storage configuration.
    ///
    /// Static credentials are used when both keys are configured; otherwise the default AWS
    /// credential chain applies.
    pub async fn from_config(config: &BlobStorageConfig) -> anyhow::Result<Self> {
        let BlobStorageConfig::S3 {
            bucket,
            region,
            endpoint_url,
            access_key_id,
            secret_access_key,
            force_path_style,
            public_base_url,
        } = config
        else {
            anyhow::bail!("S3 blob storage requires the s3 backend configuration");
        };

        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.clone()));
        if let (Some(key_id), Some(secret)) = (access_key_id, secret_access_key) {
            loader = loader.credentials_provider(Credentials::new(key_id, secret, None, None, "mediactl"));
        }
        if let Some(endpoint) = endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        let client = Client::from_conf(
            aws_sdk_s3::config::Builder::from(&sdk_config)
                .force_path_style(*force_path_style)
                .build(),
        );

        let public_base = match public_base_url {
            Some(url) => url.to_string(),
            None => default_public_base(bucket, region, endpoint_url.as_deref(), *force_path_style)?,
        };

        Ok(Self::new(client, bucket.clone(), &public_base))
    }
}

/// Where objects are reachable when no explicit public URL is configured
fn default_public_base(bucket: &str, region: &str, endpoint_url: Option<&str>, force_path_style: bool) -> anyhow::Result<String> {
    match endpoint_url {
        None => Ok(format!("https://{bucket}.s3.{region}.amazonaws.com/")),
        Some(endpoint) if force_path_style => Ok(format!("{}{bucket}/", base_uri(endpoint))),
        Some(endpoint) => {
            let mut url = url::Url::parse(endpoint)?;
            let host = url
                .host_str()
                .ok_or_else(|| anyhow::anyhow!("S3 endpoint URL has no host: {endpoint}"))?
                .to_string();
            url.set_host(Some(&format!("{bucket}.{host}")))?;
            Ok(base_uri(url.as_str()))
        }
    }
}

/// Map an SDK error to the backend status shown to clients
fn backend_error<E>(err: SdkError<E>) -> BlobError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let status = match err.as_service_error() {
        Some(service) => match (service.code(), service.message()) {
            (Some(code), Some(message)) => format!("{code}: {message}"),
            (Some(code), None) => code.to_string(),
            _ => DisplayErrorContext(&err).to_string(),
        },
        None => DisplayErrorContext(&err).to_string(),
    };
    BlobError::Backend { status }
}

#[async_trait]
impl BlobStorage for S3BlobStorage {
    #[instrument(skip(self, content), fields(bucket = %self.bucket, size = content.len()), err)]
    async fn upload(&self, name: &str, content_type: &str, content: Bytes) -> Result<()> {
        check_name(name)?;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(name)
            .content_type(content_type)
            .body(ByteStream::from(content))
            .send()
            .await
            .map_err(backend_error)?;
        Ok(())
    }

    /// S3 deletes are idempotent: removing a missing key succeeds
    #[instrument(skip(self), fields(bucket = %self.bucket), err)]
    async fn delete(&self, name: &str) -> Result<()> {
        check_name(name)?;
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(name)
            .send()
            .await
            .map_err(backend_error)?;
        Ok(())
    }

    #[instrument(skip(self), fields(bucket = %self.bucket), err)]
    async fn list(&self) -> Result<Vec<BlobObject>> {
        let mut objects = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let page = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(backend_error)?;

            objects.extend(page.contents().iter().filter_map(|object| object.key()).map(|key| BlobObject {
                name: key.to_string(),
                uri: format!("{}{}", self.public_base, key),
            }));

            match page.next_continuation_token() {
                Some(token) if page.is_truncated().unwrap_or(false) => continuation_token = Some(token.to_string()),
                _ => break,
            }
        }

        Ok(objects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;
    use wiremock::matchers::{method, path, path_regex, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn storage_for(server: &MockServer, public_base_url: Option<&str>) -> S3BlobStorage {
        let config = BlobStorageConfig::S3 {
            bucket: "site-images".to_string(),
            region: "us-east-1".to_string(),
            endpoint_url: Some(server.uri()),
            access_key_id: Some("test-key".to_string()),
            secret_access_key: Some("test-secret".to_string()),
            force_path_style: true,
            public_base_url: public_base_url.map(|u| Url::parse(u).unwrap()),
        };
        S3BlobStorage::from_config(&config).await.unwrap()
    }

    fn list_body(keys: &[&str], next_token: Option<&str>) -> String {
        let contents: String = keys
            .iter()
            .map(|k| {
                format!(
                    "<Contents><Key>{k}</Key><LastModified>2025-01-01T00:00:00.000Z</LastModified>\
                     <ETag>\"etag\"</ETag><Size>3</Size><StorageClass>STANDARD</StorageClass></Contents>"
                )
            })
            .collect();
        let (truncated, token) = match next_token {
            Some(t) => ("true", format!("<NextContinuationToken>{t}</NextContinuationToken>")),
            None => ("false", String::new()),
        };
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/"><Name>site-images</Name><Prefix></Prefix><KeyCount>{}</KeyCount><MaxKeys>1000</MaxKeys><IsTruncated>{truncated}</IsTruncated>{token}{contents}</ListBucketResult>"#,
            keys.len()
        )
    }

    #[tokio::test]
    async fn test_upload_puts_object_in_bucket() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/site-images/abc.png"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let storage = storage_for(&server, None).await;
        storage.upload("abc.png", "image/png", Bytes::from_static(b"png")).await.unwrap();
    }

    #[tokio::test]
    async fn test_upload_failure_carries_backend_code() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/site-images/abc.png"))
            .respond_with(ResponseTemplate::new(403).set_body_string(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Error><Code>AccessDenied</Code><Message>Access Denied</Message></Error>",
            ))
            .mount(&server)
            .await;

        let storage = storage_for(&server, None).await;
        let err = storage
            .upload("abc.png", "image/png", Bytes::from_static(b"png"))
            .await
            .unwrap_err();
        assert!(err.status().contains("AccessDenied"), "unexpected status: {}", err.status());
    }

    #[tokio::test]
    async fn test_delete_object() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/site-images/abc.png"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let storage = storage_for(&server, None).await;
        storage.delete("abc.png").await.unwrap();
    }

    #[tokio::test]
    async fn test_list_follows_continuation_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/site-images/?$"))
            .and(query_param("list-type", "2"))
            .and(query_param("continuation-token", "page-2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(list_body(&["c.png"], None)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/site-images/?$"))
            .and(query_param("list-type", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(list_body(&["a.png", "b.jpg"], Some("page-2"))))
            .mount(&server)
            .await;

        let storage = storage_for(&server, Some("https://cdn.example.com/images")).await;
        let objects = storage.list().await.unwrap();

        let names: Vec<&str> = objects.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["a.png", "b.jpg", "c.png"]);
        assert_eq!(objects[0].uri, "https://cdn.example.com/images/a.png");
    }

    #[test]
    fn test_default_public_base() {
        assert_eq!(
            default_public_base("imgs", "eu-west-1", None, false).unwrap(),
            "https://imgs.s3.eu-west-1.amazonaws.com/"
        );
        assert_eq!(
            default_public_base("imgs", "eu-west-1", Some("http://localhost:9000"), true).unwrap(),
            "http://localhost:9000/imgs/"
        );
        assert_eq!(
            default_public_base("imgs", "auto", Some("https://r2.example.com"), false).unwrap(),
            "https://imgs.r2.example.com/"
        );
    }
}
