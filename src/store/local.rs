use std::fs;
use std::path::{Path, PathBuf};

use super::ObjectStore;
use crate::error::{Error, Result};

/// Directory-backed store: `<root>/<bucket>/<key>`.
///
/// Keys are `/`-separated paths relative to the bucket directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Create a store rooted at `root`. The directory is not created.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory holding the bucket directories.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        key.split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.join(bucket), |path, part| path.join(part))
    }
}

fn collect_keys(dir: &Path, prefix: &str, keys: &mut Vec<String>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let key = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };

        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_keys(&entry.path(), &key, keys)?;
        } else if file_type.is_file() {
            keys.push(key);
        }
    }
    Ok(())
}

impl ObjectStore for LocalStore {
    fn list_objects(&self, bucket: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        collect_keys(&self.root.join(bucket), "", &mut keys)
            .map_err(|e| Error::store("list", bucket, "", e))?;
        keys.sort();
        Ok(keys)
    }

    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        fs::read(self.object_path(bucket, key)).map_err(|e| Error::store("get", bucket, key, e))
    }

    fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> Result<()> {
        let src = self.object_path(src_bucket, src_key);
        let dst = self.object_path(dst_bucket, dst_key);

        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::store("copy", dst_bucket, dst_key, e))?;
        }
        fs::copy(&src, &dst).map_err(|e| Error::store("copy", src_bucket, src_key, e))?;
        Ok(())
    }
}
