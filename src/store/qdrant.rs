// Qdrant-backed vector store for the indexed health corpus
use anyhow::{Context, Result};
use async_trait::async_trait;
use qdrant_client::qdrant::{value::Kind, SearchPointsBuilder, Value as QdrantValue};
use qdrant_client::Qdrant;
use std::collections::HashMap;

use crate::conversation::types::SourceMetadata;
use crate::rag::collaborators::{RetrievalResult, VectorStore};

/// Default Qdrant gRPC endpoint
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";

/// Collection holding the corpus chunks
pub const DEFAULT_COLLECTION: &str = "health_docs";

/// Payload key holding the chunk text
const DOCUMENT_KEY: &str = "document";

/// Read-only view over one Qdrant collection (cosine distance)
pub struct QdrantStore {
    client: Qdrant,
    collection: String,
}

impl QdrantStore {
    /// Connect and check that the collection has been built
    pub async fn connect(url: &str, collection: &str) -> Result<Self> {
        let client = Qdrant::from_url(url)
            .build()
            .context("Failed to create Qdrant client")?;

        let exists = client
            .collection_exists(collection)
            .await
            .with_context(|| format!("Failed to reach Qdrant at {}", url))?;
        if !exists {
            anyhow::bail!("Collection '{}' does not exist; index the corpus first", collection);
        }

        tracing::info!(url, collection, "connected to vector store");

        Ok(Self {
            client,
            collection: collection.to_string(),
        })
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn query_by_embedding(
        &self,
        embedding: &[f32],
        n_results: usize,
    ) -> Result<RetrievalResult> {
        let request = SearchPointsBuilder::new(
            self.collection.as_str(),
            embedding.to_vec(),
            n_results as u64,
        )
        .with_payload(true);
        let response = self
            .client
            .search_points(request)
            .await
            .context("Failed to search points")?;

        let mut result = RetrievalResult::default();
        for point in response.result {
            match chunk_from_payload(&point.payload) {
                Some((document, metadata)) => {
                    result.push(document, metadata, similarity_to_distance(point.score));
                }
                None => tracing::warn!(
                    point_id = ?point.id,
                    collection = %self.collection,
                    "skipping point without chunk text"
                ),
            }
        }
        Ok(result)
    }
}

/// Qdrant reports cosine similarity; the pipeline expects cosine distance
pub fn similarity_to_distance(score: f32) -> f32 {
    1.0 - score
}

/// Typed citation metadata from a point payload
pub fn metadata_from_payload(payload: &HashMap<String, QdrantValue>) -> SourceMetadata {
    SourceMetadata {
        source: payload.get("source").and_then(value_as_string),
        page: payload.get("page").and_then(value_as_u32),
        chunk_index: payload.get("chunk_index").and_then(value_as_u32),
    }
}

/// Chunk text and metadata of a point, `None` when the payload carries no text
pub fn chunk_from_payload(
    payload: &HashMap<String, QdrantValue>,
) -> Option<(String, SourceMetadata)> {
    let document = payload
        .get(DOCUMENT_KEY)
        .and_then(value_as_string)
        .filter(|text| !text.trim().is_empty())?;
    Some((document, metadata_from_payload(payload)))
}

fn value_as_string(value: &QdrantValue) -> Option<String> {
    match value.kind.as_ref()? {
        Kind::StringValue(s) => Some(s.clone()),
        _ => None,
    }
}

fn value_as_u32(value: &QdrantValue) -> Option<u32> {
    match value.kind.as_ref()? {
        Kind::IntegerValue(i) => u32::try_from(*i).ok(),
        Kind::DoubleValue(f) if *f >= 0.0 && f.fract() == 0.0 => u32::try_from(*f as i64).ok(),
        Kind::StringValue(s) => s.trim().parse().ok(),
        _ => None,
    }
}
