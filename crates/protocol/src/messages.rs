use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Outcome tag carried by every reply payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Ok,
    /// The merged artifact already exists; nothing to upload.
    AlreadyMerged,
    /// Some chunks for this hash are already stored.
    Partial,
    /// Nothing is known about this hash.
    Fresh,
    Error,
}

/// A payload consisting only of a status tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReply {
    pub status: Status,
}

impl StatusReply {
    pub fn ok() -> Self {
        Self { status: Status::Ok }
    }
}

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Asks which chunks of an upload the server already holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryChunksRequest {
    pub hash: String,
    #[serde(default)]
    pub suffix: String,
}

/// Requests reassembly of all stored chunks of a hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeChunksRequest {
    pub hash: String,
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

/// Resume state for a hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunksStatusResponse {
    pub status: Status,
    /// Stored chunk file names, ascending by sequence.
    #[serde(default)]
    pub chunks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_path: Option<String>,
}

impl ChunksStatusResponse {
    pub fn already_merged(artifact_path: impl Into<String>) -> Self {
        Self {
            status: Status::AlreadyMerged,
            chunks: Vec::new(),
            artifact_path: Some(artifact_path.into()),
        }
    }

    pub fn partial(chunks: Vec<String>) -> Self {
        Self {
            status: Status::Partial,
            chunks,
            artifact_path: None,
        }
    }

    pub fn fresh() -> Self {
        Self {
            status: Status::Fresh,
            chunks: Vec::new(),
            artifact_path: None,
        }
    }
}

/// Result of a successful merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeResultResponse {
    pub status: Status,
    pub artifact_path: String,
    pub file_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_names() {
        assert_eq!(serde_json::to_string(&Status::Ok).unwrap(), "\"ok\"");
        assert_eq!(
            serde_json::to_string(&Status::AlreadyMerged).unwrap(),
            "\"already-merged\""
        );
        assert_eq!(serde_json::to_string(&Status::Partial).unwrap(), "\"partial\"");
        assert_eq!(serde_json::to_string(&Status::Fresh).unwrap(), "\"fresh\"");
        assert_eq!(serde_json::to_string(&Status::Error).unwrap(), "\"error\"");
    }

    #[test]
    fn already_merged_json() {
        let resp = ChunksStatusResponse::already_merged("http://localhost:5000/abc.bin");
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["status"], "already-merged");
        assert_eq!(value["chunks"], serde_json::json!([]));
        assert_eq!(value["artifactPath"], "http://localhost:5000/abc.bin");
    }

    #[test]
    fn partial_omits_artifact_path() {
        let resp = ChunksStatusResponse::partial(vec!["abc_1.bin".into(), "abc_3.bin".into()]);
        let json = serde_json::to_string(&resp).unwrap();
        assert!(!json.contains("artifactPath"));
        let parsed: ChunksStatusResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, resp);
    }

    #[test]
    fn query_request_suffix_defaults_to_empty() {
        let req: QueryChunksRequest = serde_json::from_str(r#"{"hash":"abc"}"#).unwrap();
        assert_eq!(req.hash, "abc");
        assert!(req.suffix.is_empty());
    }

    #[test]
    fn merge_result_camel_case() {
        let resp = MergeResultResponse {
            status: Status::Ok,
            artifact_path: "/srv/upload/abc.bin".into(),
            file_name: "abc.bin".into(),
        };
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["artifactPath"], "/srv/upload/abc.bin");
        assert_eq!(value["fileName"], "abc.bin");
        assert_eq!(value["status"], "ok");
    }
}
