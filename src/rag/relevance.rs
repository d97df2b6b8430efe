// Distance-to-relevance conversion and threshold filtering
use serde::{Deserialize, Serialize};

use crate::conversation::types::SourceMetadata;
use crate::rag::collaborators::RetrievalResult;

/// Default minimum relevance for a chunk to count as grounding evidence
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.35;

/// Relevance of a chunk at the given cosine distance.
///
/// 0 is identical, 1 or more is unrelated. Not clamped above 1, and a NaN
/// distance scores 0.
pub fn relevance(distance: f32) -> f32 {
    (1.0 - distance).max(0.0)
}

/// Chunks that passed the threshold, still in retrieval rank order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilteredContext {
    pub documents: Vec<String>,
    pub metadatas: Vec<SourceMetadata>,
}

impl FilteredContext {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Keeps retrieved chunks whose relevance meets a threshold
#[derive(Debug, Clone, Copy)]
pub struct RelevanceFilter {
    threshold: f32,
}

impl RelevanceFilter {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Keep item i iff relevance(distance_i) >= threshold
    pub fn filter(&self, retrieved: &RetrievalResult) -> FilteredContext {
        if retrieved.is_ragged() {
            tracing::warn!(
                documents = retrieved.documents.len(),
                metadatas = retrieved.metadatas.len(),
                distances = retrieved.distances.len(),
                "retrieval result sequences differ in length; extra entries ignored"
            );
        }

        let mut kept = FilteredContext::default();
        for (rank, (document, metadata, distance)) in retrieved.iter().enumerate() {
            let score = relevance(distance);
            let keep = score >= self.threshold;
            tracing::trace!(rank, distance, relevance = score, keep, "relevance check");

            if keep {
                kept.documents.push(document.clone());
                kept.metadatas.push(metadata.clone());
            }
        }
        kept
    }
}

impl Default for RelevanceFilter {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE_THRESHOLD)
    }
}
