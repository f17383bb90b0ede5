//! Typed records for coordinator JSON responses.
//!
//! Payloads are decoded once into these structs; nothing past this module
//! inspects untyped JSON.

use super::{BlobRecord, ClusterStatus, CollectionStatus};
use serde::Deserialize;
use serde::de::IgnoredAny;
use std::collections::{BTreeMap, BTreeSet};

/// Header present on every admin response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseHeader {
    /// Zero on success
    pub status: i64,
    /// Query time in milliseconds
    #[serde(rename = "QTime", default)]
    pub q_time: Option<u64>,
}

impl ResponseHeader {
    pub fn is_success(&self) -> bool {
        self.status == 0
    }
}

/// Every typed response exposes its header.
pub trait AdminResponse {
    fn header(&self) -> &ResponseHeader;
}

macro_rules! admin_response {
    ($($ty:ty),* $(,)?) => {
        $(impl AdminResponse for $ty {
            fn header(&self) -> &ResponseHeader {
                &self.response_header
            }
        })*
    };
}

admin_response!(
    Envelope,
    CollectionListResponse,
    ClusterStatusResponse,
    ConfigSetListResponse,
    BlobQueryResponse,
);

/// Error section of a failed admin response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub code: Option<u16>,
}

/// Minimal envelope shared by every response.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(rename = "responseHeader")]
    pub response_header: ResponseHeader,
    #[serde(default)]
    pub error: Option<ErrorBody>,
    /// Rejections reported by the collection config endpoint
    #[serde(rename = "errorMessages", default)]
    pub error_messages: Vec<CommandError>,
}

/// One rejected command from the collection config endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandError {
    #[serde(rename = "errorMessages", default)]
    pub messages: Vec<String>,
}

impl Envelope {
    /// Whether the response reports a failure.
    pub fn is_failure(&self) -> bool {
        !self.response_header.is_success() || !self.error_messages.is_empty()
    }

    /// Human readable failure reason.
    pub fn reason(&self) -> String {
        if let Some(msg) = self.error.as_ref().and_then(|e| e.msg.clone()) {
            return msg;
        }
        let messages: Vec<&str> = self
            .error_messages
            .iter()
            .flat_map(|e| e.messages.iter().map(String::as_str))
            .collect();
        if messages.is_empty() {
            format!("status {}", self.response_header.status)
        } else {
            messages.join("; ")
        }
    }

    /// True when the body is the coordinator's "file not found" payload.
    pub fn is_not_found(&self) -> bool {
        self.response_header.status == 404
            || self.error.as_ref().and_then(|e| e.code) == Some(404)
    }
}

/// `action=LIST` on the collections API.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionListResponse {
    #[serde(rename = "responseHeader")]
    pub response_header: ResponseHeader,
    #[serde(default)]
    pub collections: Vec<String>,
}

impl CollectionListResponse {
    pub fn into_names(self) -> BTreeSet<String> {
        self.collections.into_iter().collect()
    }
}

/// `action=CLUSTERSTATUS` on the collections API.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterStatusResponse {
    #[serde(rename = "responseHeader")]
    pub response_header: ResponseHeader,
    #[serde(default)]
    pub cluster: ClusterSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClusterSection {
    #[serde(default)]
    pub collections: BTreeMap<String, CollectionState>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollectionState {
    #[serde(rename = "configName", default)]
    pub config_name: Option<String>,
    #[serde(default)]
    pub shards: BTreeMap<String, IgnoredAny>,
}

impl From<ClusterStatusResponse> for ClusterStatus {
    fn from(response: ClusterStatusResponse) -> Self {
        ClusterStatus {
            success: response.response_header.is_success(),
            collections: response
                .cluster
                .collections
                .into_iter()
                .map(|(name, state)| {
                    (
                        name,
                        CollectionStatus {
                            config_name: state.config_name,
                            shard_count: state.shards.len(),
                        },
                    )
                })
                .collect(),
        }
    }
}

/// `action=LIST` on the config sets API.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSetListResponse {
    #[serde(rename = "responseHeader")]
    pub response_header: ResponseHeader,
    #[serde(rename = "configSets", default)]
    pub config_sets: Vec<String>,
}

impl ConfigSetListResponse {
    pub fn into_names(self) -> BTreeSet<String> {
        self.config_sets.into_iter().collect()
    }
}

/// Select query against the blob store collection.
#[derive(Debug, Clone, Deserialize)]
pub struct BlobQueryResponse {
    #[serde(rename = "responseHeader")]
    pub response_header: ResponseHeader,
    pub response: BlobResults,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlobResults {
    #[serde(rename = "numFound")]
    pub num_found: u64,
    #[serde(default)]
    pub docs: Vec<BlobDoc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlobDoc {
    #[serde(rename = "blobName")]
    pub blob_name: String,
    pub version: u64,
}

impl BlobQueryResponse {
    /// Records ordered by descending version.
    pub fn into_records(self) -> Vec<BlobRecord> {
        let mut records: Vec<BlobRecord> = self
            .response
            .docs
            .into_iter()
            .map(|doc| BlobRecord {
                blob_name: doc.blob_name,
                version: doc.version,
            })
            .collect();
        records.sort_by(|a, b| b.version.cmp(&a.version));
        records
    }
}
