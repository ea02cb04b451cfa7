//! A labeling session: the workspace state, the panel state, and the
//! executor that runs reconciliation plans against the backend.
//!
//! [`Session::synchronize`] drives the reconcile→execute loop to a fixpoint:
//! a pass may change a watched field (a model-version fetch lands, the
//! upload notice is consumed), in which case the rules are evaluated again
//! with the previous snapshot until nothing new is planned.
//!
//! Independent fetches of one pass run concurrently and their responses are
//! applied to the aggregate sequentially afterwards, so each response
//! patches its own slice and a failed fetch never blocks or corrupts its
//! siblings. Every fetch is tagged with the `(category, document)` snapshot
//! that triggered it; a response arriving after the analyst has moved on is
//! discarded instead of applied.

use futures::future::join_all;

use crate::api::WorkspaceBackend;
use crate::error::{Error, Result};
use crate::model::{
    Category, CategoryId, Document, Element, LabelingStatus, UploadedLabels,
};
use crate::panels::{PanelId, PanelState};
use crate::state::WorkspaceState;
use crate::sync::{Command, Fetch, WatchedState, reconcile};

/// What one synchronization pass did.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Fetches issued to the backend.
    pub issued: usize,
    /// Responses folded into the aggregate.
    pub applied: usize,
    /// Responses dropped because their trigger snapshot went stale.
    pub discarded_stale: usize,
    /// Per-fetch failures; siblings still completed.
    pub failures: Vec<Error>,
}

impl SyncReport {
    /// True when every issued fetch was applied or discarded cleanly.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn merge(&mut self, other: Self) {
        self.issued += other.issued;
        self.applied += other.applied;
        self.discarded_stale += other.discarded_stale;
        self.failures.extend(other.failures);
    }
}

/// Query parameters captured when a fetch was planned.
#[derive(Debug, Clone)]
struct TriggerTag {
    category: Option<CategoryId>,
    document: String,
}

/// Decoded payload of one settled fetch.
enum Outcome {
    Documents(Vec<Document>),
    Categories(Vec<Category>),
    Elements(Vec<Element>),
    ModelVersion(Option<i64>),
    Status(LabelingStatus),
    Recommendations(Vec<Element>),
    PositivePredictions(Vec<Element>),
    SuspiciousLabels(Vec<Element>),
    PositiveLabels(Vec<Element>),
}

async fn run_fetch<B: WorkspaceBackend>(
    backend: &B,
    fetch: Fetch,
    tag: &TriggerTag,
) -> (Fetch, Result<Outcome>) {
    let result = match fetch {
        Fetch::Documents => backend.fetch_documents().await.map(Outcome::Documents),
        Fetch::Categories => backend.fetch_categories().await.map(Outcome::Categories),
        Fetch::Elements => backend
            .fetch_document_elements(&tag.document)
            .await
            .map(Outcome::Elements),
        Fetch::ModelVersion
        | Fetch::Status
        | Fetch::Recommendations
        | Fetch::PositivePredictions
        | Fetch::SuspiciousLabels
        | Fetch::PositiveLabels => {
            let Some(category) = tag.category.as_deref() else {
                return (fetch, Err(Error::NoCategorySelected));
            };
            match fetch {
                Fetch::ModelVersion => backend
                    .latest_model_version(category)
                    .await
                    .map(Outcome::ModelVersion),
                Fetch::Status => backend.fetch_status(category).await.map(Outcome::Status),
                Fetch::Recommendations => backend
                    .fetch_recommendations(category)
                    .await
                    .map(Outcome::Recommendations),
                Fetch::PositivePredictions => backend
                    .fetch_positive_predictions(category)
                    .await
                    .map(Outcome::PositivePredictions),
                Fetch::SuspiciousLabels => backend
                    .fetch_suspicious_labels(category)
                    .await
                    .map(Outcome::SuspiciousLabels),
                Fetch::PositiveLabels => backend
                    .fetch_positive_labels(category)
                    .await
                    .map(Outcome::PositiveLabels),
                Fetch::Documents | Fetch::Categories | Fetch::Elements => unreachable!(),
            }
        }
    };
    (fetch, result)
}

/// One analyst's labeling session against one workspace.
pub struct Session<B> {
    pub state: WorkspaceState,
    pub panels: PanelState,
    backend: B,
    last_watched: Option<WatchedState>,
}

impl<B: WorkspaceBackend> Session<B> {
    pub fn new(backend: B, workspace_id: impl Into<String>) -> Self {
        Self {
            state: WorkspaceState::new(workspace_id),
            panels: PanelState::default(),
            backend,
            last_watched: None,
        }
    }

    /// Override the batch wraparound threshold.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.state = self.state.with_batch_size(batch_size);
        self
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Session start: loads the corpus and category listings and marks the
    /// workspace visited, then settles any follow-on rules.
    pub async fn start(&mut self) -> SyncReport {
        self.synchronize().await
    }

    /// Select (or clear) the current category and settle the rules.
    pub async fn select_category(&mut self, category: Option<CategoryId>) -> SyncReport {
        self.state.set_current_category(category);
        self.synchronize().await
    }

    /// Hand an uploaded-labels notice to the rules (the upload flow itself
    /// lives outside this core).
    pub async fn notify_uploaded_labels(&mut self, notice: UploadedLabels) -> SyncReport {
        self.state.notify_uploaded_labels(notice);
        self.synchronize().await
    }

    /// Re-evaluate the rules until the watched snapshot stops changing.
    pub async fn synchronize(&mut self) -> SyncReport {
        let mut report = SyncReport::default();
        let mut prev = self.last_watched.take();
        loop {
            let next = self.state.watched();
            if prev.as_ref() == Some(&next) {
                self.last_watched = Some(next);
                break;
            }
            let plan = reconcile(prev.as_ref(), &next);
            prev = Some(next);
            report.merge(self.execute(plan).await);
        }
        report
    }

    /// Fetch the current document's elements and install them.
    pub async fn load_current_document(&mut self) -> Result<()> {
        if self.state.documents.is_empty() {
            return Err(Error::NoDocuments);
        }
        let document = self.state.cur_doc_name.clone();
        let elements = self.backend.fetch_document_elements(&document).await?;
        self.state.replace_elements(elements);
        Ok(())
    }

    /// Move to the next document. Bounds are checked before any network
    /// call, so out-of-range navigation is a pure no-op.
    pub async fn advance_document(&mut self) -> Result<()> {
        let document = self.state.peek_next_document()?.document_id.clone();
        let elements = self.backend.fetch_document_elements(&document).await?;
        self.state.advance_document(elements)
    }

    /// Move to the previous document; same contract as
    /// [`advance_document`](Self::advance_document).
    pub async fn retreat_document(&mut self) -> Result<()> {
        let document = self.state.peek_prev_document()?.document_id.clone();
        let elements = self.backend.fetch_document_elements(&document).await?;
        self.state.retreat_document(elements)
    }

    /// Submit one label for the current category.
    ///
    /// On success the batch counter advances; when it wraps, the model
    /// version is re-checked and any newly trained model's views are pulled
    /// in by the rules. Local label/focus maps are the caller's to update.
    pub async fn submit_label(&mut self, element_id: &str, value: &str) -> Result<SyncReport> {
        let category = self
            .state
            .cur_category
            .clone()
            .ok_or(Error::NoCategorySelected)?;
        self.backend.put_label(element_id, &category, value).await?;
        if self.state.note_label_submitted() {
            tracing::debug!(category, "batch complete, re-checking model");
            return self.refresh_model_version().await;
        }
        Ok(SyncReport::default())
    }

    /// Ask the service for the newest classifier version and settle the
    /// rules against it.
    pub async fn refresh_model_version(&mut self) -> Result<SyncReport> {
        let category = self
            .state
            .cur_category
            .clone()
            .ok_or(Error::NoCategorySelected)?;
        let version = self.backend.latest_model_version(&category).await?;
        self.state.set_model_version(version);
        Ok(self.synchronize().await)
    }

    /// Keyword search scoped to the current category (if any). Returns the
    /// number of hits; results land in the aggregate's `search_result`.
    pub async fn search(&mut self, query: &str) -> Result<usize> {
        self.panels.search_input.set_text(query);
        let results = self
            .backend
            .search(query, self.state.cur_category.as_deref())
            .await?;
        let hits = results.len();
        self.state.ingest_search_results(results);
        Ok(hits)
    }

    /// Select a sidebar panel. The contradicting-labels view has no other
    /// trigger, so opening its panel pulls it fresh.
    pub async fn activate_panel(&mut self, panel: PanelId) -> Result<bool> {
        let open = self.panels.select(panel);
        if open && panel == PanelId::ContradictingLabels {
            if let Some(category) = self.state.cur_category.clone() {
                let elements = self.backend.fetch_contradicting_labels(&category).await?;
                self.state.ingest_contradicting_labels(elements);
            }
        }
        Ok(open)
    }

    /// Run one reconciliation plan: local commands first (in plan order),
    /// then all fetch jobs concurrently, then sequential application.
    async fn execute(&mut self, plan: Vec<Command>) -> SyncReport {
        let mut report = SyncReport::default();
        let mut jobs: Vec<Vec<Fetch>> = Vec::new();

        for command in plan {
            match command {
                Command::MarkVisited => self.state.mark_workspace_visited(),
                Command::ResetEvaluation => self.state.reset_evaluation(),
                Command::ClearUploadNotice => self.state.clear_uploaded_labels(),
                Command::Fetch(fetch) => jobs.push(vec![fetch]),
                Command::FetchThen { first, then } => jobs.push(vec![first, then]),
            }
        }

        let tag = TriggerTag {
            category: self.state.cur_category.clone(),
            document: self.state.cur_doc_name.clone(),
        };

        let backend = &self.backend;
        let settled = join_all(jobs.into_iter().map(|chain| {
            let tag = tag.clone();
            async move {
                let mut results = Vec::new();
                for fetch in chain {
                    let (fetch, result) = run_fetch(backend, fetch, &tag).await;
                    let failed = result.is_err();
                    results.push((fetch, result));
                    if failed {
                        // A failed `first` must not trigger its `then`.
                        break;
                    }
                }
                results
            }
        }))
        .await;

        for (fetch, result) in settled.into_iter().flatten() {
            report.issued += 1;
            match result {
                Ok(outcome) => self.apply_outcome(fetch, outcome, &tag, &mut report),
                Err(err) => {
                    tracing::warn!(?fetch, error = %err, "fetch failed");
                    report.failures.push(err);
                }
            }
        }
        report
    }

    /// Fold one response into the aggregate, unless its trigger snapshot no
    /// longer matches the live state.
    fn apply_outcome(
        &mut self,
        fetch: Fetch,
        outcome: Outcome,
        tag: &TriggerTag,
        report: &mut SyncReport,
    ) {
        let category_live = self.state.cur_category == tag.category;
        let document_live = self.state.cur_doc_name == tag.document;
        let mut stale = |report: &mut SyncReport| {
            tracing::debug!(?fetch, "discarding stale response");
            report.discarded_stale += 1;
        };

        match outcome {
            Outcome::Documents(documents) => {
                self.state.ingest_documents(documents);
                report.applied += 1;
            }
            Outcome::Categories(categories) => {
                self.state.ingest_categories(categories);
                report.applied += 1;
            }
            Outcome::Elements(elements) => {
                if document_live {
                    self.state.replace_elements(elements);
                    report.applied += 1;
                } else {
                    stale(report);
                }
            }
            Outcome::ModelVersion(version) => {
                if category_live {
                    self.state.set_model_version(version);
                    report.applied += 1;
                } else {
                    stale(report);
                }
            }
            Outcome::Status(status) => {
                if category_live {
                    self.state.ingest_status(status);
                    report.applied += 1;
                } else {
                    stale(report);
                }
            }
            Outcome::Recommendations(elements) => {
                if category_live {
                    self.state.ingest_recommendations(elements);
                    report.applied += 1;
                } else {
                    stale(report);
                }
            }
            Outcome::PositivePredictions(elements) => {
                if category_live {
                    self.state.ingest_positive_predictions(elements);
                    report.applied += 1;
                } else {
                    stale(report);
                }
            }
            Outcome::SuspiciousLabels(elements) => {
                if category_live {
                    self.state.ingest_suspicious_labels(elements);
                    report.applied += 1;
                } else {
                    stale(report);
                }
            }
            Outcome::PositiveLabels(elements) => {
                if category_live {
                    self.state.ingest_positive_labels(elements);
                    report.applied += 1;
                } else {
                    stale(report);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CategoryRef;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Recording fake: logs every call, answers with canned data.
    #[derive(Default)]
    struct RecordingBackend {
        calls: Mutex<Vec<String>>,
        model_version: Option<i64>,
        fail_recommendations: bool,
    }

    impl RecordingBackend {
        fn new() -> Self {
            Self::default()
        }

        fn with_model(version: i64) -> Self {
            Self {
                model_version: Some(version),
                ..Self::default()
            }
        }

        fn log(&self, call: impl Into<String>) {
            self.calls.lock().expect("lock").push(call.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("lock").clone()
        }

        fn call_index(&self, call: &str) -> Option<usize> {
            self.calls().iter().position(|c| c == call)
        }

        fn elements_for(doc: &str, n: usize) -> Vec<Element> {
            (0..n)
                .map(|i| Element {
                    id: format!("{doc}-{i}"),
                    docid: doc.to_string(),
                    text: format!("text {i}"),
                })
                .collect()
        }
    }

    #[async_trait]
    impl WorkspaceBackend for RecordingBackend {
        async fn fetch_documents(&self) -> Result<Vec<Document>> {
            self.log("documents");
            Ok(vec![
                Document {
                    document_id: "d0".into(),
                },
                Document {
                    document_id: "d1".into(),
                },
                Document {
                    document_id: "d2".into(),
                },
            ])
        }

        async fn fetch_categories(&self) -> Result<Vec<Category>> {
            self.log("categories");
            Ok(vec![Category {
                category_id: "c1".into(),
                name: "Claims".into(),
            }])
        }

        async fn fetch_document_elements(&self, document_id: &str) -> Result<Vec<Element>> {
            self.log(format!("document:{document_id}"));
            Ok(Self::elements_for(document_id, 3))
        }

        async fn fetch_recommendations(&self, category: &str) -> Result<Vec<Element>> {
            self.log(format!("active_learning:{category}"));
            if self.fail_recommendations {
                return Err(Error::Status {
                    status: 500,
                    endpoint: "active_learning".into(),
                });
            }
            Ok(Self::elements_for("d0", 2))
        }

        async fn fetch_positive_predictions(&self, category: &str) -> Result<Vec<Element>> {
            self.log(format!("positive_predictions:{category}"));
            Ok(Self::elements_for("d1", 1))
        }

        async fn fetch_suspicious_labels(&self, category: &str) -> Result<Vec<Element>> {
            self.log(format!("suspicious_elements:{category}"));
            Ok(Vec::new())
        }

        async fn fetch_contradicting_labels(&self, category: &str) -> Result<Vec<Element>> {
            self.log(format!("contradiction_elements:{category}"));
            Ok(Self::elements_for("d2", 2))
        }

        async fn fetch_positive_labels(&self, category: &str) -> Result<Vec<Element>> {
            self.log(format!("positive_elements:{category}"));
            Ok(Self::elements_for("d0", 1))
        }

        async fn search(&self, query: &str, _category: Option<&str>) -> Result<Vec<Element>> {
            self.log(format!("query:{query}"));
            Ok(Self::elements_for("d0", 2))
        }

        async fn latest_model_version(&self, category: &str) -> Result<Option<i64>> {
            self.log(format!("models:{category}"));
            Ok(self.model_version)
        }

        async fn fetch_status(&self, category: &str) -> Result<LabelingStatus> {
            self.log(format!("status:{category}"));
            Ok(LabelingStatus::default())
        }

        async fn put_label(&self, element_id: &str, category: &str, value: &str) -> Result<()> {
            self.log(format!("label:{element_id}:{category}:{value}"));
            Ok(())
        }
    }

    fn notice(ids: &[&str], created: bool) -> UploadedLabels {
        UploadedLabels {
            categories: ids
                .iter()
                .map(|id| CategoryRef {
                    category_id: (*id).to_string(),
                })
                .collect(),
            categories_created: created,
        }
    }

    #[tokio::test]
    async fn start_loads_corpus_and_marks_visited() {
        let mut session = Session::new(RecordingBackend::new(), "w1");
        let report = session.start().await;

        assert!(report.is_clean());
        assert_eq!(session.state.documents.len(), 3);
        assert_eq!(session.state.cur_doc_name, "d0");
        assert_eq!(session.state.categories.len(), 1);
        assert!(session.state.workspace_visited);

        let calls = session.backend().calls();
        assert!(calls.contains(&"documents".to_string()));
        assert!(calls.contains(&"categories".to_string()));
    }

    #[tokio::test]
    async fn second_start_is_settled() {
        let mut session = Session::new(RecordingBackend::new(), "w1");
        session.start().await;
        let report = session.synchronize().await;
        assert_eq!(report.issued, 0);
    }

    #[tokio::test]
    async fn category_without_model_skips_model_gated_fetches() {
        let mut session = Session::new(RecordingBackend::new(), "w1");
        session.start().await;
        let report = session.select_category(Some("c1".into())).await;

        assert!(report.is_clean());
        assert_eq!(session.state.model_version, None);
        let calls = session.backend().calls();
        assert!(calls.contains(&"models:c1".to_string()));
        assert!(calls.contains(&"positive_elements:c1".to_string()));
        assert!(calls.contains(&"status:c1".to_string()));
        assert!(!calls.iter().any(|c| c.starts_with("active_learning")));
    }

    #[tokio::test]
    async fn model_version_landing_pulls_derived_views() {
        let mut session = Session::new(RecordingBackend::with_model(2), "w1");
        session.start().await;
        session.select_category(Some("c1".into())).await;

        // The model-version fetch changed a watched field, so the loop ran a
        // second pass with the model-gated fetches.
        assert_eq!(session.state.model_version, Some(2));
        assert_eq!(session.state.elements_to_label.len(), 2);
        assert_eq!(session.state.positive_predictions.len(), 1);
        let calls = session.backend().calls();
        assert!(calls.contains(&"active_learning:c1".to_string()));
        assert!(calls.contains(&"suspicious_elements:c1".to_string()));
    }

    #[tokio::test]
    async fn matching_upload_notice_refetches_in_order() {
        let mut session = Session::new(RecordingBackend::new(), "w1");
        session.start().await;
        session.select_category(Some("c1".into())).await;

        let before = session.backend().calls().len();
        let report = session.notify_uploaded_labels(notice(&["c1"], false)).await;

        assert!(report.is_clean());
        assert!(session.state.uploaded_labels.is_none(), "notice consumed");

        let backend = session.backend();
        let elements = backend.call_index("document:d0").expect("elements refetched");
        let status = backend
            .calls()
            .iter()
            .rposition(|c| c == "status:c1")
            .expect("status re-checked");
        assert!(elements >= before, "refetch happened in this pass");
        assert!(elements < status, "status must follow the elements refetch");
    }

    #[tokio::test]
    async fn non_matching_upload_notice_only_clears() {
        let mut session = Session::new(RecordingBackend::new(), "w1");
        session.start().await;
        session.select_category(Some("c1".into())).await;

        let before = session.backend().calls().len();
        let report = session.notify_uploaded_labels(notice(&["c9"], false)).await;

        assert!(session.state.uploaded_labels.is_none(), "notice consumed");
        assert_eq!(report.issued, 0);
        assert_eq!(session.backend().calls().len(), before);
    }

    #[tokio::test]
    async fn upload_notice_with_new_categories_refetches_listing() {
        let mut session = Session::new(RecordingBackend::new(), "w1");
        session.start().await;

        let before = session
            .backend()
            .calls()
            .iter()
            .filter(|c| *c == "categories")
            .count();
        session.notify_uploaded_labels(notice(&["c9"], true)).await;
        let after = session
            .backend()
            .calls()
            .iter()
            .filter(|c| *c == "categories")
            .count();
        assert_eq!(after, before + 1);
    }

    #[tokio::test]
    async fn one_failed_fetch_does_not_block_siblings() {
        let backend = RecordingBackend {
            model_version: Some(1),
            fail_recommendations: true,
            ..RecordingBackend::default()
        };
        let mut session = Session::new(backend, "w1");
        session.start().await;
        let report = session.select_category(Some("c1".into())).await;

        assert_eq!(report.failures.len(), 1);
        assert!(session.state.elements_to_label.is_empty());
        // Siblings of the failed fetch still landed.
        assert_eq!(session.state.positive_predictions.len(), 1);
        assert!(session.state.labeling_status.is_some());
    }

    #[tokio::test]
    async fn navigation_round_trip() {
        let mut session = Session::new(RecordingBackend::new(), "w1");
        session.start().await;
        session.load_current_document().await.expect("load");
        assert_eq!(session.state.elements.len(), 3);

        session.advance_document().await.expect("advance");
        assert_eq!(session.state.cur_doc_name, "d1");
        assert_eq!(session.state.focused_index, 0);

        session.retreat_document().await.expect("retreat");
        assert_eq!(session.state.cur_doc_name, "d0");
    }

    #[tokio::test]
    async fn retreat_at_first_document_issues_no_fetch() {
        let mut session = Session::new(RecordingBackend::new(), "w1");
        session.start().await;
        let before = session.backend().calls().len();

        let err = session.retreat_document().await.expect_err("at start");
        assert!(matches!(err, Error::DocumentOutOfRange { .. }));
        assert_eq!(session.backend().calls().len(), before);
    }

    #[tokio::test]
    async fn submit_label_requires_a_category() {
        let mut session = Session::new(RecordingBackend::new(), "w1");
        session.start().await;
        let err = session.submit_label("d0-0", "true").await.expect_err("gated");
        assert!(matches!(err, Error::NoCategorySelected));
    }

    #[tokio::test]
    async fn batch_wrap_rechecks_the_model() {
        let mut session = Session::new(RecordingBackend::new(), "w1").with_batch_size(2);
        session.start().await;
        session.select_category(Some("c1".into())).await;

        let models_before = session
            .backend()
            .calls()
            .iter()
            .filter(|c| *c == "models:c1")
            .count();

        session.submit_label("d0-0", "true").await.expect("first");
        session.submit_label("d0-1", "false").await.expect("wraps");

        let models_after = session
            .backend()
            .calls()
            .iter()
            .filter(|c| *c == "models:c1")
            .count();
        assert_eq!(models_after, models_before + 1);
        assert_eq!(session.state.num_cur_batch, 0);
    }

    #[tokio::test]
    async fn search_records_hits_and_input_text() {
        let mut session = Session::new(RecordingBackend::new(), "w1");
        session.start().await;
        let hits = session.search("fraud").await.expect("search");
        assert_eq!(hits, 2);
        assert_eq!(session.state.search_result.len(), 2);
        assert_eq!(session.panels.search_input.text, "fraud");
    }

    #[tokio::test]
    async fn contradicting_panel_pulls_its_view_on_open() {
        let mut session = Session::new(RecordingBackend::new(), "w1");
        session.start().await;
        session.select_category(Some("c1".into())).await;

        let open = session
            .activate_panel(PanelId::ContradictingLabels)
            .await
            .expect("open");
        assert!(open);
        assert_eq!(session.state.contradicting_labels.len(), 2);

        // Toggling shut issues no fetch.
        let before = session.backend().calls().len();
        let open = session
            .activate_panel(PanelId::ContradictingLabels)
            .await
            .expect("close");
        assert!(!open);
        assert_eq!(session.backend().calls().len(), before);
    }

    #[tokio::test]
    async fn stale_response_is_discarded() {
        let mut session = Session::new(RecordingBackend::new(), "w1");
        session.state.set_current_category(Some("c1".into()));

        // Response tagged for a category the analyst has already left.
        let tag = TriggerTag {
            category: Some("c0".into()),
            document: String::new(),
        };
        let mut report = SyncReport::default();
        session.apply_outcome(
            Fetch::Recommendations,
            Outcome::Recommendations(RecordingBackend::elements_for("d0", 2)),
            &tag,
            &mut report,
        );

        assert!(session.state.elements_to_label.is_empty());
        assert_eq!(report.discarded_stale, 1);
        assert_eq!(report.applied, 0);
    }
}
