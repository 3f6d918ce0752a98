use async_trait::async_trait;
use log::{debug, info};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("no objects found in the bucket under '{prefix}'")]
    NoObjects { prefix: String },

    #[error("list objects: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A bucket that can list its object keys.
#[async_trait]
pub trait ObjectStore {
    /// All keys directly under `prefix`, bounded by `delimiter`, in the order
    /// the storage service returns them.
    async fn list(&self, prefix: &str, delimiter: &str) -> Result<Vec<String>, Error>;
}

/// Storage "folder" holding the outputs of one build:
/// `<project>/<artifact>/<branch>/<build version>/`.
pub fn storage_prefix(project: &str, artifact: &str, branch: &str, build_version: &str, delimiter: &str) -> String {
    [project, artifact, branch, build_version, ""].join(delimiter)
}

/// Strip trailing extensions from a file name.
///
/// A component that is purely numeric or contains a `-` ends the stripping,
/// so the patch number of `app-1.0.11.tar.gz` survives while `.tar` and `.gz`
/// do not, and `app-1.0.0-SNAPSHOT.jar` keeps its `SNAPSHOT` qualifier.
fn strip_extensions(file_name: &str) -> &str {
    let mut stem = file_name;
    while let Some((rest, extension)) = stem.rsplit_once('.') {
        let numeric = !extension.is_empty() && extension.chars().all(|c| c.is_ascii_digit());
        if rest.is_empty() || numeric || extension.contains('-') {
            break;
        }
        stem = rest;
    }
    stem
}

/// Semantic version embedded in an object key, e.g. `a/b/app-1.2.3.zip` → `1.2.3`.
///
/// The version is whatever follows the last `-` of the file name once its
/// extensions are removed. A file name without any `-` yields the whole
/// stripped name; no validation of the version format is done.
pub fn semantic_version(key: &str, delimiter: &str) -> String {
    let file_name = key.rsplit(delimiter).next().unwrap_or(key);
    let stem = strip_extensions(file_name);
    stem.rsplit('-').next().unwrap_or(stem).to_string()
}

/// List the build outputs under `prefix` and read the semantic version off
/// the last object in listing order.
pub async fn locate<S>(store: &S, prefix: &str, delimiter: &str) -> Result<String, Error>
where
    S: ObjectStore + Sync + ?Sized,
{
    debug!("Listing objects under '{prefix}'");
    let keys = store.list(prefix, delimiter).await?;
    for key in &keys {
        info!("{key}");
    }

    let last = keys.last().ok_or_else(|| Error::NoObjects { prefix: prefix.to_string() })?;
    Ok(semantic_version(last, delimiter))
}

#[cfg(test)]
pub mod test {
    use super::*;

    /// Object store answering every listing with the same keys.
    pub struct StaticListing(pub Vec<String>);

    #[async_trait]
    impl ObjectStore for StaticListing {
        async fn list(&self, _prefix: &str, _delimiter: &str) -> Result<Vec<String>, Error> {
            Ok(self.0.clone())
        }
    }

    /// Object store whose listing always fails.
    pub struct Unreachable;

    #[async_trait]
    impl ObjectStore for Unreachable {
        async fn list(&self, _prefix: &str, _delimiter: &str) -> Result<Vec<String>, Error> {
            Err(Error::Storage("access denied".into()))
        }
    }

    #[test]
    fn prefix_layout() {
        assert_eq!(
            storage_prefix("mp", "mp-api-node", "develop", "42", "/"),
            "mp/mp-api-node/develop/42/"
        );
        assert_eq!(storage_prefix("mp", "api", "", "0", "/"), "mp/api//0/");
    }

    #[test]
    fn version_from_key() {
        assert_eq!(semantic_version("a/b/app-1.2.3.zip", "/"), "1.2.3");
        assert_eq!(
            semantic_version("mp/mp-api-node/develop/42/mp-api-node-1.0.11.tar.gz", "/"),
            "1.0.11"
        );
        assert_eq!(semantic_version("app-2.0.0", "/"), "2.0.0");
    }

    #[test]
    fn qualifier_after_dash_is_the_version() {
        assert_eq!(semantic_version("a/b/app-1.0.0-SNAPSHOT.jar", "/"), "SNAPSHOT");
        assert_eq!(semantic_version("a/b/svc-2.3.1-b45.zip", "/"), "b45");
        assert_eq!(semantic_version("a/b/svc-2.3.1-b45.tar.gz", "/"), "b45");
    }

    #[test]
    fn file_name_without_dash_is_returned_whole() {
        assert_eq!(semantic_version("a/b/release.zip", "/"), "release");
        assert_eq!(semantic_version("a/b/1.4.0.jar", "/"), "1.4.0");
        assert_eq!(semantic_version("a/b/.zip", "/"), ".zip");
    }

    #[tokio::test]
    async fn locate_uses_last_listed_object() {
        let store = StaticListing(vec![
            "a/b/app-1.2.2.zip".to_string(),
            "a/b/app-1.2.3.zip".to_string(),
        ]);
        assert_eq!(locate(&store, "a/b/", "/").await.unwrap(), "1.2.3");
    }

    #[tokio::test]
    async fn locate_empty_listing() {
        let store = StaticListing(vec![]);
        match locate(&store, "a/b/", "/").await {
            Err(Error::NoObjects { prefix }) => assert_eq!(prefix, "a/b/"),
            other => panic!("expected NoObjects, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn locate_listing_failure() {
        match locate(&Unreachable, "a/b/", "/").await {
            Err(Error::Storage(err)) => assert_eq!(err.to_string(), "access denied"),
            other => panic!("expected Storage, got {other:?}"),
        }
    }
}
