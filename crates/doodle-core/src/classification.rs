//! Ranked classification results.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Number of ranked entries kept for display and diagnostics.
pub const DEFAULT_TOP_N: usize = 4;

/// Monotonic identifier assigned to each classification request.
pub type RequestId = u64;

/// A single (label, confidence) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    /// Confidence in `0.0..=1.0`.
    pub confidence: f32,
}

impl Classification {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        let confidence = if confidence.is_nan() { 0.0 } else { confidence.clamp(0.0, 1.0) };
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// The outcome of one classification request, best match first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub request_id: RequestId,
    ranked: Vec<Classification>,
}

impl ClassificationResult {
    /// Build a result, sorting entries by descending confidence. Ties keep
    /// their original order.
    pub fn new(request_id: RequestId, mut entries: Vec<Classification>) -> Self {
        entries.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(Ordering::Equal));
        Self {
            request_id,
            ranked: entries,
        }
    }

    /// The highest-confidence entry.
    pub fn top(&self) -> Option<&Classification> {
        self.ranked.first()
    }

    pub fn top_n(&self, n: usize) -> &[Classification] {
        &self.ranked[..n.min(self.ranked.len())]
    }

    pub fn ranked(&self) -> &[Classification] {
        &self.ranked
    }

    pub fn truncate(&mut self, n: usize) {
        self.ranked.truncate(n);
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }
}
