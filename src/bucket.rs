// File storage stubs
// Uploads, downloads and removals always succeed and keep nothing

use crate::response::Response;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Entry point for bucket operations
#[derive(Debug, Clone, Copy, Default)]
pub struct StorageApi;

impl StorageApi {
    /// Select a bucket
    pub fn from(&self, bucket: &str) -> BucketApi {
        BucketApi {
            bucket: bucket.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadData {
    pub path: String,
}

/// Operations on one bucket
#[derive(Debug, Clone)]
pub struct BucketApi {
    bucket: String,
}

impl BucketApi {
    pub fn name(&self) -> &str {
        &self.bucket
    }

    /// Pretend to store `contents` at `path`; echoes the path back
    pub fn upload(&self, path: &str, contents: &[u8]) -> Response<UploadData> {
        debug!(bucket = %self.bucket, path, bytes = contents.len(), "upload");
        Response::ok(UploadData {
            path: path.to_string(),
        })
    }

    /// Always yields an empty file
    pub fn download(&self, path: &str) -> Response<Vec<u8>> {
        debug!(bucket = %self.bucket, path, "download");
        Response::ok(Vec::new())
    }

    /// Always reports nothing removed
    pub fn remove(&self, paths: &[&str]) -> Response<Vec<UploadData>> {
        debug!(bucket = %self.bucket, count = paths.len(), "remove");
        Response::ok(Vec::new())
    }
}
