use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tokio::runtime::Runtime;

use super::ObjectStore;
use crate::error::{Error, Result};

/// Bytes left as-is in a copy source: unreserved characters and the `/`
/// separating key segments.
const COPY_SOURCE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// Build the `x-amz-copy-source` value, which S3 URL-decodes before lookup.
fn copy_source(bucket: &str, key: &str) -> String {
    format!("{bucket}/{}", utf8_percent_encode(key, COPY_SOURCE))
}

/// Static credentials passed on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct S3Credentials {
    /// Access key id.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// Session token for temporary credentials.
    pub session_token: Option<String>,
}

/// Amazon S3 backend driven by a private single-threaded tokio runtime.
pub struct S3Store {
    client: Client,
    runtime: Runtime,
}

impl S3Store {
    /// Build a client from static credentials, or from the default provider
    /// chain when `credentials` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the runtime cannot be created.
    pub fn connect(credentials: Option<S3Credentials>, region: Option<String>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let client = runtime.block_on(async {
            let mut loader = aws_config::defaults(BehaviorVersion::latest());
            if let Some(region) = region {
                loader = loader.region(Region::new(region));
            }
            if let Some(creds) = credentials {
                loader = loader.credentials_provider(Credentials::new(
                    creds.access_key_id,
                    creds.secret_access_key,
                    creds.session_token,
                    None,
                    "tsieve-cli",
                ));
            }
            Client::new(&loader.load().await)
        });

        log::info!("S3 session was created");
        Ok(Self { client, runtime })
    }
}

impl ObjectStore for S3Store {
    fn list_objects(&self, bucket: &str) -> Result<Vec<String>> {
        self.runtime.block_on(async {
            let mut keys = Vec::new();
            let mut token: Option<String> = None;
            loop {
                let page = self
                    .client
                    .list_objects_v2()
                    .bucket(bucket)
                    .set_continuation_token(token.take())
                    .send()
                    .await
                    .map_err(|e| Error::store("list", bucket, "", DisplayErrorContext(e)))?;

                keys.extend(
                    page.contents()
                        .iter()
                        .filter_map(|object| object.key().map(str::to_owned)),
                );

                match page.next_continuation_token() {
                    Some(next) if page.is_truncated().unwrap_or(false) => {
                        token = Some(next.to_owned());
                    }
                    _ => break,
                }
            }
            keys.sort();
            Ok(keys)
        })
    }

    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.runtime.block_on(async {
            let object = self
                .client
                .get_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| Error::store("get", bucket, key, DisplayErrorContext(e)))?;
            let body = object
                .body
                .collect()
                .await
                .map_err(|e| Error::store("get", bucket, key, e))?;
            Ok(body.into_bytes().to_vec())
        })
    }

    fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> Result<()> {
        self.runtime.block_on(async {
            self.client
                .copy_object()
                .copy_source(copy_source(src_bucket, src_key))
                .bucket(dst_bucket)
                .key(dst_key)
                .send()
                .await
                .map_err(|e| Error::store("copy", src_bucket, src_key, DisplayErrorContext(e)))?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_source_keeps_plain_keys() {
        assert_eq!(
            copy_source("uploads", "photos/2024/cat-01_v2.png"),
            "uploads/photos/2024/cat-01_v2.png"
        );
    }

    #[test]
    fn copy_source_encodes_reserved_and_non_ascii_keys() {
        assert_eq!(copy_source("src", "a+b.png"), "src/a%2Bb.png");
        assert_eq!(copy_source("src", "été.png"), "src/%C3%A9t%C3%A9.png");
        assert_eq!(
            copy_source("src", "dir/100% done?#1.png"),
            "src/dir/100%25%20done%3F%231.png"
        );
    }
}
