// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Location of a dataset artifact in object storage.
///
/// An empty pointer is valid and means there is nothing to inherit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetPointer {
    pub store_bucket: String,
    pub object_key: String,
}

impl DatasetPointer {
    pub fn new(store_bucket: impl Into<String>, object_key: impl Into<String>) -> Self {
        Self {
            store_bucket: store_bucket.into(),
            object_key: object_key.into().trim_start_matches('/').to_string(),
        }
    }

    /// A pointer is only usable when both parts are set.
    pub fn is_empty(&self) -> bool {
        self.store_bucket.is_empty() || self.object_key.is_empty()
    }
}

impl Display for DatasetPointer {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "s3://{}/{}", self.store_bucket, self.object_key)
    }
}

/// Parse `scheme://bucket/key` into a pointer.
///
/// The error is a short reason suitable for
/// [`ValidationError::MalformedPointerUri`](crate::errors::ValidationError).
pub fn parse_s3_uri(uri: &str) -> Result<DatasetPointer, String> {
    let uri = uri.trim();
    let Some((scheme, rest)) = uri.split_once("://") else {
        return Err("expected scheme://bucket/key".to_string());
    };
    if scheme.is_empty() {
        return Err("missing scheme".to_string());
    }

    match rest.split_once('/') {
        Some((bucket, _)) if bucket.is_empty() => Err("missing bucket".to_string()),
        Some((bucket, key)) => {
            let key = key.trim_start_matches('/');
            if key.is_empty() {
                Err("missing key".to_string())
            } else {
                Ok(DatasetPointer::new(bucket, key))
            }
        }
        None => Err("missing key".to_string()),
    }
}
