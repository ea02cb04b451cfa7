//! The workspace state aggregate and its transition methods.
//!
//! One [`WorkspaceState`] exists per labeling session. Every mutation goes
//! through a named transition method; transitions are total for well-formed
//! payloads, and the fallible ones (document navigation, indexed focus and
//! label writes) return an error without touching the aggregate.
//!
//! Focus and label annotations are keyed by element position and rebuilt
//! wholesale on every element replacement: after any replacement the focus
//! map is one-hot at index 0 and every label is empty. Callers that need to
//! survive reorderings must re-derive from stable element ids.

use crate::error::{Error, Result};
use crate::model::{
    Category, CategoryId, Document, Element, LabelingStatus, UploadedLabels,
};
use crate::sync::WatchedState;

/// Labels submitted per training batch before the counter wraps and the
/// session re-checks the model version. Arbitrary constant, config-surfaced.
pub const DEFAULT_BATCH_SIZE: u32 = 11;

/// The "unlabeled" label value.
pub const NO_LABEL: &str = "";

/// Precision-evaluation scratch state for the current category.
#[derive(Debug, Clone, Default)]
pub struct EvaluationState {
    pub in_progress: bool,
    pub elements: Vec<Element>,
    pub score: Option<f64>,
}

/// The single source of truth for a labeling session.
///
/// Collections are replaced wholesale by fetch outcomes; there is no
/// incremental patching and no independent deletion. The aggregate dies
/// with the session.
#[derive(Debug, Clone)]
pub struct WorkspaceState {
    pub workspace_id: String,

    pub documents: Vec<Document>,
    pub cur_doc_id: usize,
    pub cur_doc_name: String,

    pub categories: Vec<Category>,
    pub cur_category: Option<CategoryId>,
    pub model_version: Option<i64>,

    pub elements: Vec<Element>,
    pub focused_index: usize,
    /// One-hot focus map keyed by element position.
    pub focused_state: Vec<bool>,
    /// Label map keyed by element position; [`NO_LABEL`] means unlabeled.
    pub label_state: Vec<String>,

    pub elements_to_label: Vec<Element>,
    pub positive_predictions: Vec<Element>,
    pub suspicious_labels: Vec<Element>,
    pub contradicting_labels: Vec<Element>,
    pub positive_labels: Vec<Element>,
    pub search_result: Vec<Element>,
    pub labeling_status: Option<LabelingStatus>,
    pub evaluation: EvaluationState,

    pub num_cur_batch: u32,
    batch_size: u32,
    pub ready: bool,
    pub workspace_visited: bool,
    pub uploaded_labels: Option<UploadedLabels>,
}

impl WorkspaceState {
    /// Create an empty session aggregate for the given workspace.
    #[must_use]
    pub fn new(workspace_id: impl Into<String>) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            documents: Vec::new(),
            cur_doc_id: 0,
            cur_doc_name: String::new(),
            categories: Vec::new(),
            cur_category: None,
            model_version: None,
            elements: Vec::new(),
            focused_index: 0,
            focused_state: Vec::new(),
            label_state: Vec::new(),
            elements_to_label: Vec::new(),
            positive_predictions: Vec::new(),
            suspicious_labels: Vec::new(),
            contradicting_labels: Vec::new(),
            positive_labels: Vec::new(),
            search_result: Vec::new(),
            labeling_status: None,
            evaluation: EvaluationState::default(),
            num_cur_batch: 0,
            batch_size: DEFAULT_BATCH_SIZE,
            ready: false,
            workspace_visited: false,
            uploaded_labels: None,
        }
    }

    /// Override the batch wraparound threshold. Values below 1 are clamped.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Snapshot of the fields the synchronization rules watch.
    #[must_use]
    pub fn watched(&self) -> WatchedState {
        WatchedState {
            cur_category: self.cur_category.clone(),
            model_version: self.model_version,
            uploaded_labels: self.uploaded_labels.clone(),
            workspace_visited: self.workspace_visited,
        }
    }

    /// Select (or clear) the current category. Does not itself trigger
    /// fetches; the synchronization rules react to the resulting value.
    pub fn set_current_category(&mut self, category: Option<CategoryId>) {
        tracing::debug!(?category, "category selected");
        self.cur_category = category;
    }

    pub fn set_model_version(&mut self, version: Option<i64>) {
        self.model_version = version;
    }

    /// Replace the loaded corpus. Called once per session under normal
    /// operation; resets the cursor to the first document.
    pub fn ingest_documents(&mut self, documents: Vec<Document>) {
        self.cur_doc_name = documents
            .first()
            .map(|d| d.document_id.clone())
            .unwrap_or_default();
        self.cur_doc_id = 0;
        self.documents = documents;
    }

    pub fn ingest_categories(&mut self, categories: Vec<Category>) {
        self.categories = categories;
    }

    /// Replace the current document's elements and rebuild the positional
    /// annotations: focus one-hot at index 0, all labels empty.
    ///
    /// Applied identically for the initial load, navigation, and refetch.
    pub fn replace_elements(&mut self, elements: Vec<Element>) {
        let n = elements.len();
        self.elements = elements;
        self.focused_state = vec![false; n];
        if let Some(first) = self.focused_state.first_mut() {
            *first = true;
        }
        self.focused_index = 0;
        self.label_state = vec![NO_LABEL.to_string(); n];
        self.ready = true;
    }

    /// The document the cursor would advance to, without moving it.
    pub fn peek_next_document(&self) -> Result<&Document> {
        if self.documents.is_empty() {
            return Err(Error::NoDocuments);
        }
        let requested = self.cur_doc_id + 1;
        self.documents
            .get(requested)
            .ok_or(Error::DocumentOutOfRange {
                requested: requested as i64,
                len: self.documents.len(),
            })
    }

    /// The document the cursor would retreat to, without moving it.
    pub fn peek_prev_document(&self) -> Result<&Document> {
        if self.documents.is_empty() {
            return Err(Error::NoDocuments);
        }
        if self.cur_doc_id == 0 {
            return Err(Error::DocumentOutOfRange {
                requested: -1,
                len: self.documents.len(),
            });
        }
        Ok(&self.documents[self.cur_doc_id - 1])
    }

    /// Move to the next document, installing its freshly fetched elements.
    /// Fails fast without mutating when already at the last document.
    pub fn advance_document(&mut self, elements: Vec<Element>) -> Result<()> {
        let name = self.peek_next_document()?.document_id.clone();
        self.cur_doc_id += 1;
        self.cur_doc_name = name;
        self.replace_elements(elements);
        Ok(())
    }

    /// Move to the previous document, installing its freshly fetched
    /// elements. Fails fast without mutating when already at the first.
    pub fn retreat_document(&mut self, elements: Vec<Element>) -> Result<()> {
        let name = self.peek_prev_document()?.document_id.clone();
        self.cur_doc_id -= 1;
        self.cur_doc_name = name;
        self.replace_elements(elements);
        Ok(())
    }

    /// Recompute the one-hot focus map for the given element position.
    pub fn set_focused(&mut self, index: usize) -> Result<()> {
        if index >= self.elements.len() {
            return Err(Error::ElementOutOfRange {
                index,
                len: self.elements.len(),
            });
        }
        self.focused_state.fill(false);
        self.focused_state[index] = true;
        self.focused_index = index;
        Ok(())
    }

    /// Record a local label value for one element position.
    pub fn set_label(&mut self, index: usize, value: impl Into<String>) -> Result<()> {
        if index >= self.elements.len() {
            return Err(Error::ElementOutOfRange {
                index,
                len: self.elements.len(),
            });
        }
        self.label_state[index] = value.into();
        Ok(())
    }

    /// Replace the whole label map. The replacement must cover every element.
    pub fn replace_label_state(&mut self, labels: Vec<String>) -> Result<()> {
        if labels.len() != self.elements.len() {
            return Err(Error::ElementOutOfRange {
                index: labels.len(),
                len: self.elements.len(),
            });
        }
        self.label_state = labels;
        Ok(())
    }

    /// Account for one successfully submitted label.
    ///
    /// Returns `true` when the batch counter wrapped to 0, which is the
    /// session's cue to re-check the model version.
    pub fn note_label_submitted(&mut self) -> bool {
        self.num_cur_batch = (self.num_cur_batch + 1) % self.batch_size;
        self.ready = true;
        self.num_cur_batch == 0
    }

    /// One-shot visited flag; idempotent after the first call.
    pub fn mark_workspace_visited(&mut self) {
        self.workspace_visited = true;
    }

    pub fn notify_uploaded_labels(&mut self, notice: UploadedLabels) {
        self.uploaded_labels = Some(notice);
    }

    pub fn clear_uploaded_labels(&mut self) {
        self.uploaded_labels = None;
    }

    pub fn ingest_recommendations(&mut self, elements: Vec<Element>) {
        self.elements_to_label = elements;
        self.ready = true;
    }

    pub fn ingest_positive_predictions(&mut self, elements: Vec<Element>) {
        self.positive_predictions = elements;
    }

    pub fn ingest_suspicious_labels(&mut self, elements: Vec<Element>) {
        self.suspicious_labels = elements;
    }

    pub fn ingest_contradicting_labels(&mut self, elements: Vec<Element>) {
        self.contradicting_labels = elements;
    }

    pub fn ingest_positive_labels(&mut self, elements: Vec<Element>) {
        self.positive_labels = elements;
    }

    pub fn ingest_search_results(&mut self, elements: Vec<Element>) {
        self.search_result = elements;
    }

    pub fn ingest_status(&mut self, status: LabelingStatus) {
        self.labeling_status = Some(status);
    }

    pub fn reset_evaluation(&mut self) {
        self.evaluation = EvaluationState::default();
    }
}
