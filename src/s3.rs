use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::Client;
use log::debug;
use thiserror::Error;
use crate::artifact::{self, ObjectStore};

#[derive(Error, Debug)]
pub enum Error {
    #[error("s3: {0}")]
    Sdk(#[from] aws_sdk_s3::Error),
}

/// Static access key pair for the artifact bucket.
#[derive(Clone)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

/// Build artifacts bucket on S3.
pub struct Bucket {
    client: Client,
    name: String,
}

impl Bucket {
    /// Connect to `name` in `region`. Without static credentials the AWS
    /// default credential chain is used.
    pub async fn connect(name: &str, region: &str, credentials: Option<StaticCredentials>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()));

        if let Some(credentials) = credentials {
            debug!("Using static credentials for bucket {name}");
            loader = loader.credentials_provider(Credentials::new(
                credentials.access_key_id,
                credentials.secret_access_key,
                None,
                None,
                "udi",
            ));
        }

        Self {
            client: Client::new(&loader.load().await),
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl ObjectStore for Bucket {
    async fn list(&self, prefix: &str, delimiter: &str) -> Result<Vec<String>, artifact::Error> {
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.name)
            .prefix(prefix)
            .delimiter(delimiter)
            .into_paginator()
            .send();

        let mut keys = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page
                .map_err(|err| Error::from(aws_sdk_s3::Error::from(err)))
                .map_err(|err| artifact::Error::Storage(Box::new(err)))?;
            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .map(str::to_string),
            );
        }
        Ok(keys)
    }
}
