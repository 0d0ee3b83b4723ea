//! Object storage
//!
//! Buckets are read through a filesystem mount: `<root>/<bucket>/<key>`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ReportError, Result};

/// Read-only view of a bucketed object store
pub trait ObjectStore {
    /// Every key in `bucket` starting with `prefix`, sorted
    fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>>;
    fn read(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;
    fn size(&self, bucket: &str, key: &str) -> Result<u64>;
}

/// Object store backed by a directory tree
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        let mut path = self.root.join(bucket);
        path.extend(key.split('/').filter(|p| !p.is_empty()));
        path
    }

    fn not_found(bucket: &str, key: &str) -> ReportError {
        ReportError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    }
}

impl ObjectStore for FsObjectStore {
    fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let bucket_dir = self.root.join(bucket);
        if !bucket_dir.is_dir() {
            return Err(Self::not_found(bucket, prefix));
        }
        let mut keys = Vec::new();
        let mut stack = vec![bucket_dir.clone()];
        while let Some(dir) = stack.pop() {
            for entry in fs::read_dir(&dir)? {
                let path = entry?.path();
                if path.is_dir() {
                    stack.push(path);
                    continue;
                }
                let Ok(rel) = path.strip_prefix(&bucket_dir) else {
                    continue;
                };
                let key = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn read(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let path = self.object_path(bucket, key);
        if !path.is_file() {
            return Err(Self::not_found(bucket, key));
        }
        Ok(fs::read(path)?)
    }

    fn size(&self, bucket: &str, key: &str) -> Result<u64> {
        let path = self.object_path(bucket, key);
        if !path.is_file() {
            return Err(Self::not_found(bucket, key));
        }
        Ok(fs::metadata(path)?.len())
    }
}

/// Split an `s3://bucket/key` style URI into bucket and key
pub fn split_uri(uri: &str) -> Option<(&str, &str)> {
    let rest = uri.split_once("://").map(|(_, r)| r).unwrap_or(uri);
    let (bucket, key) = rest.split_once('/')?;
    if bucket.is_empty() || key.is_empty() {
        None
    } else {
        Some((bucket, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(files: &[(&str, &str)]) -> (tempfile::TempDir, FsObjectStore) {
        let dir = tempfile::tempdir().unwrap();
        for (rel, body) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }
        let store = FsObjectStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_list_read_and_size() {
        let (_dir, store) = store_with(&[
            ("bucket/ds1/tool/a.csv", "x\n1\n"),
            ("bucket/ds2/tool/b.csv", "y\n"),
            ("other/c.csv", ""),
        ]);
        let keys = store.list_keys("bucket", "ds1").unwrap();
        assert_eq!(keys, vec!["ds1/tool/a.csv".to_string()]);
        assert_eq!(store.list_keys("bucket", "").unwrap().len(), 2);
        assert_eq!(store.read("bucket", "ds1/tool/a.csv").unwrap(), b"x\n1\n");
        assert_eq!(store.size("bucket", "ds2/tool/b.csv").unwrap(), 2);
    }

    #[test]
    fn test_missing_object_is_not_found() {
        let (_dir, store) = store_with(&[("bucket/a.csv", "x")]);
        assert!(matches!(
            store.read("bucket", "nope.csv"),
            Err(ReportError::NotFound { .. })
        ));
        assert!(store.list_keys("missing-bucket", "").is_err());
    }

    #[test]
    fn test_split_uri() {
        assert_eq!(
            split_uri("s3://raw-bucket/ds/run1.raw"),
            Some(("raw-bucket", "ds/run1.raw"))
        );
        assert_eq!(split_uri("raw-bucket/run1.raw"), Some(("raw-bucket", "run1.raw")));
        assert_eq!(split_uri("s3://raw-bucket"), None);
    }
}
