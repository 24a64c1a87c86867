// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Argo server used when nothing else is configured
pub const DEFAULT_ARGO_HOST: &str = "https://localhost:2746";
pub const DEFAULT_ARGO_NAMESPACE: &str = "argo";
/// Seconds between status polls
pub const DEFAULT_POLL_SEC: u64 = 3;
/// Six hours
pub const DEFAULT_POLL_TIMEOUT_SEC: u64 = 21_600;
/// Per-request timeout for engine HTTP calls
pub const DEFAULT_REQUEST_TIMEOUT_SEC: u64 = 30;
pub const DEFAULT_BUCKET: &str = "test-ngen";

pub const ENV_ARGO_HOST: &str = "ARGO_HOST";
pub const ENV_ARGO_TOKEN: &str = "ARGO_TOKEN";
pub const ENV_ARGO_NAMESPACE: &str = "ARGO_NAMESPACE";
pub const ENV_ARGO_VERIFY_SSL: &str = "ARGO_VERIFY_SSL";
pub const ENV_ARGO_FORCE_TEMPLATE_UPDATE: &str = "ARGO_FORCE_TEMPLATE_UPDATE";
pub const ENV_ARGO_POLL_SEC: &str = "ARGO_POLL_SEC";
pub const ENV_ARGO_POLL_TIMEOUT_SEC: &str = "ARGO_POLL_TIMEOUT_SEC";
pub const ENV_S3_BUCKET: &str = "NGIAB_S3_BUCKET";
