//! Wire-level data model shared with the remote workspace service.
//!
//! Field names mirror the backend's snake_case JSON contract; the envelope
//! types match the shapes the service wraps collection responses in.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier of a labeling category. Categories are minted server-side.
pub type CategoryId = String;

/// A document in the workspace corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub document_id: String,
}

/// A labeling target (class) the analyst is training a model to recognize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub category_id: CategoryId,
    pub name: String,
}

/// A unit of text within a document that can receive a category label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    pub docid: String,
    pub text: String,
}

/// Envelope for `GET /documents`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentsResponse {
    pub documents: Vec<Document>,
}

/// Envelope for `GET /categories`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoriesResponse {
    pub categories: Vec<Category>,
}

/// Envelope for element collection reads (`/document/{id}`, `/query`, and
/// the derived-view endpoints).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementsResponse {
    pub elements: Vec<Element>,
}

/// One classifier snapshot as listed by `GET /models`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub model_version: i64,
}

/// Envelope for `GET /models`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelRecord>,
}

/// Labeling progress for the current category, as reported by `GET /status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LabelingStatus {
    /// Counts keyed by label value (e.g. `"true"` / `"false"`).
    #[serde(default)]
    pub labeling_counts: BTreeMap<String, u64>,
    /// Percentage toward the next training iteration.
    #[serde(default)]
    pub progress: f64,
}

/// Body of the label mutation `PUT /element/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutLabelRequest {
    pub category_name: String,
    pub value: String,
    pub update_counter: bool,
}

/// Reference to a category inside an upload notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub category_id: CategoryId,
}

/// Transient notice that labels were imported out-of-band.
///
/// Produced by the upload flow, consumed (and cleared) by the
/// synchronization rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedLabels {
    pub categories: Vec<CategoryRef>,
    pub categories_created: bool,
}

impl UploadedLabels {
    /// Whether the notice mentions the given category.
    #[must_use]
    pub fn mentions(&self, category_id: &str) -> bool {
        self.categories.iter().any(|c| c.category_id == category_id)
    }
}
