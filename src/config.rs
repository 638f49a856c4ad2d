//! Service configuration read from the environment.

use std::path::PathBuf;
use crate::{Result, StorefrontError};

pub const DEFAULT_PORT: u16 = 8083;
pub const DEFAULT_API_URL: &str = "http://localhost:4000/api";
pub const DEFAULT_STORAGE_DIR: &str = "./data";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Credentials for signed Cloudinary admin calls.
#[derive(Clone, PartialEq, Eq)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl std::fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorefrontConfig {
    pub port: u16,
    pub api_base_url: String,
    pub storage_dir: PathBuf,
    pub request_timeout_secs: u64,
    /// `None` when no Cloudinary variable is set; media deletion then answers 500.
    pub cloudinary: Option<CloudinaryConfig>,
}

impl StorefrontConfig {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let invalid = |key: &str, raw: &str, e: &dyn std::fmt::Display| StorefrontError::Config(format!("{} has invalid value '{}': {}", key, raw, e));

        let port = match value("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| invalid("PORT", &raw, &e))?,
            None => DEFAULT_PORT,
        };
        let request_timeout_secs = match value("STOREFRONT_REQUEST_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(0) => return Err(invalid("STOREFRONT_REQUEST_TIMEOUT_SECS", &raw, &"must be positive")),
                Ok(secs) => secs,
                Err(e) => return Err(invalid("STOREFRONT_REQUEST_TIMEOUT_SECS", &raw, &e)),
            },
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };
        let api_base_url = value("STOREFRONT_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let storage_dir = PathBuf::from(value("CART_STORAGE_DIR").unwrap_or_else(|| DEFAULT_STORAGE_DIR.to_string()));

        let cloudinary = match (value("CLOUDINARY_CLOUD_NAME"), value("CLOUDINARY_API_KEY"), value("CLOUDINARY_API_SECRET")) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(CloudinaryConfig { cloud_name, api_key, api_secret }),
            (None, None, None) => None,
            _ => return Err(StorefrontError::Config(
                "CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET must be set together".into(),
            )),
        };

        Ok(Self { port, api_base_url, storage_dir, request_timeout_secs, cloudinary })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 8083);
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.cloudinary.is_none());
    }

    #[test]
    fn test_full_environment() {
        let config = load(&[
            ("PORT", "9000"), ("STOREFRONT_API_URL", "https://api.example.ng/v1"), ("CART_STORAGE_DIR", "/var/lib/storefront"),
            ("CLOUDINARY_CLOUD_NAME", "demo"), ("CLOUDINARY_API_KEY", "key"), ("CLOUDINARY_API_SECRET", "secret"),
        ]).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.storage_dir, PathBuf::from("/var/lib/storefront"));
        assert_eq!(config.cloudinary.unwrap().cloud_name, "demo");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(load(&[("PORT", "eighty")]), Err(StorefrontError::Config(_))));
        assert!(matches!(load(&[("STOREFRONT_REQUEST_TIMEOUT_SECS", "0")]), Err(StorefrontError::Config(_))));
        assert!(matches!(load(&[("CLOUDINARY_API_KEY", "key")]), Err(StorefrontError::Config(_))));
    }

    #[test]
    fn test_secret_not_in_debug_output() {
        let config = CloudinaryConfig { cloud_name: "demo".into(), api_key: "key".into(), api_secret: "hunter2".into() };
        assert!(!format!("{:?}", config).contains("hunter2"));
    }
}
