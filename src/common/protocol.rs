//! Wire messages exchanged between client, coordinator and chunkservers
//!
//! Field names are part of the protocol and must not change.

use crate::common::{ChunkId, FileId};
use serde::{Deserialize, Serialize};

/// `POST /chunkserver`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterChunkserverRequest {
    /// Address (`host:port`) the chunkserver is reachable at
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterChunkserverResponse {}

/// `POST /upload`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadInitRequest {
    pub file_name: String,
    pub file_size: u64,
}

/// Upload plan returned by the coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadInitResponse {
    pub identifier: FileId,
    pub chunk_size: u64,
    pub number_of_chunks: u64,
    pub chunkservers: Vec<String>,
}

/// `POST /uploadSuccessful`, sent by a chunkserver after storing a chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkUploadSuccessRequest {
    pub chunk_identifier: String,
    pub chunkserver: String,
}

/// `GET /get?id=...` query, on both coordinator and chunkserver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetQuery {
    pub id: String,
}

/// Read plan returned by the coordinator: one location per chunk, in index order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetResponse {
    pub file_name: String,
    pub locations: Vec<String>,
}

impl GetResponse {
    /// Pair every location with the chunk identifier it serves
    pub fn chunks(&self, file_id: &FileId) -> impl Iterator<Item = (ChunkId, &str)> + '_ {
        let file_id = file_id.clone();
        self.locations
            .iter()
            .enumerate()
            .map(move |(i, addr)| (ChunkId::new(file_id.clone(), i as u64), addr.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_upload_request_field_names() {
        let req = UploadInitRequest {
            file_name: "a.txt".into(),
            file_size: 2500,
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({ "fileName": "a.txt", "fileSize": 2500 })
        );
    }

    #[test]
    fn test_upload_response_field_names() {
        let id = FileId::from_name("a.txt");
        let resp = UploadInitResponse {
            identifier: id.clone(),
            chunk_size: 1000,
            number_of_chunks: 3,
            chunkservers: vec!["10.0.0.1:8001".into()],
        };
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({
                "identifier": id.as_str(),
                "chunkSize": 1000,
                "numberOfChunks": 3,
                "chunkservers": ["10.0.0.1:8001"],
            })
        );
    }

    #[test]
    fn test_get_response_field_names() {
        let body = r#"{"FileName":"a.txt","Locations":["h1:1","h2:2"]}"#;
        let resp: GetResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.file_name, "a.txt");
        assert_eq!(resp.locations.len(), 2);

        let id = FileId::from_name("a.txt");
        let chunks: Vec<_> = resp.chunks(&id).collect();
        assert_eq!(chunks[1].0, ChunkId::new(id, 1));
        assert_eq!(chunks[1].1, "h2:2");
    }

    #[test]
    fn test_ack_request_field_names() {
        let body = r#"{"chunkIdentifier":"x_0","chunkserver":"h:1"}"#;
        let req: ChunkUploadSuccessRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.chunk_identifier, "x_0");
        assert_eq!(req.chunkserver, "h:1");
    }
}
