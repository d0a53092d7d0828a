use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Blob storage backend types
///
/// Defined in core because configuration selects the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    S3,
    Local,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "s3" => Ok(StorageBackend::S3),
            "local" => Ok(StorageBackend::Local),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackend::S3 => write!(f, "s3"),
            StorageBackend::Local => write!(f, "local"),
        }
    }
}
