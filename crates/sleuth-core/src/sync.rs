//! Synchronization rules: which server fetches follow which state changes.
//!
//! The rules form a reconciliation loop over a small watched slice of the
//! workspace state. Whenever a watched field changes, the derived server
//! views (recommendation queue, predictions, label-quality sets) are
//! invalidated and re-fetched wholesale rather than patched.
//!
//! [`reconcile`] is a pure function from `(previous, next)` snapshots to a
//! plan of [`Command`]s, so the rule set is unit-testable without a runtime
//! or a network. Rules are level-triggered and independently gated; the one
//! real ordering dependency (elements refetch before status re-check after
//! a label upload) is carried explicitly as [`Command::FetchThen`].

use crate::model::{CategoryId, UploadedLabels};

/// The slice of workspace state the rules watch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WatchedState {
    pub cur_category: Option<CategoryId>,
    pub model_version: Option<i64>,
    pub uploaded_labels: Option<UploadedLabels>,
    pub workspace_visited: bool,
}

/// One remote read the executor knows how to issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fetch {
    /// The workspace corpus listing.
    Documents,
    /// The category listing.
    Categories,
    /// Latest classifier version for the current category.
    ModelVersion,
    /// Labeling progress for the current category.
    Status,
    /// Active-learning recommendation queue.
    Recommendations,
    /// Elements the model currently predicts positive.
    PositivePredictions,
    /// Labels the model flags as suspicious.
    SuspiciousLabels,
    /// The full positive-label set.
    PositiveLabels,
    /// Re-read the current document's elements.
    Elements,
}

/// A step of a reconciliation plan.
///
/// `Fetch` steps with no declared dependency may run concurrently and
/// complete in any order; each patches a disjoint slice of the aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Fetch(Fetch),
    /// Issue `first`, and only after it settles successfully, `then`.
    FetchThen { first: Fetch, then: Fetch },
    /// Clear any evaluation-in-progress scratch state.
    ResetEvaluation,
    /// Set the one-shot visited flag.
    MarkVisited,
    /// Consume the uploaded-labels notice so it cannot leak into later
    /// evaluations.
    ClearUploadNotice,
}

/// Evaluate the rules for one watched-state change.
///
/// `prev = None` means session start: the corpus and category listings are
/// fetched once, and the visited flag is set if unset. The remaining rules
/// are evaluated on every call, each against its own gate:
///
/// 1. category became non-null or changed → model-version check, positive
///    labels, evaluation reset;
/// 2. category non-null and (category or model version changed) → status,
///    plus the four model-gated view fetches when a usable model exists;
/// 3. upload notice appeared → positive labels and an elements→status chain
///    when the notice mentions the current category, a category refetch when
///    new categories were created, and always a notice clear.
#[must_use]
pub fn reconcile(prev: Option<&WatchedState>, next: &WatchedState) -> Vec<Command> {
    let mut plan = Vec::new();

    let session_start = prev.is_none();
    if session_start {
        plan.push(Command::Fetch(Fetch::Documents));
        plan.push(Command::Fetch(Fetch::Categories));
        if !next.workspace_visited {
            plan.push(Command::MarkVisited);
        }
    }

    let category_changed = prev.is_none_or(|p| p.cur_category != next.cur_category);
    let model_changed = prev.is_none_or(|p| p.model_version != next.model_version);

    if next.cur_category.is_some() && category_changed {
        plan.push(Command::Fetch(Fetch::ModelVersion));
        plan.push(Command::Fetch(Fetch::PositiveLabels));
        plan.push(Command::ResetEvaluation);
    }

    if next.cur_category.is_some() && (category_changed || model_changed) {
        plan.push(Command::Fetch(Fetch::Status));
        if next.model_version.is_some_and(|v| v >= 0) {
            plan.push(Command::Fetch(Fetch::Recommendations));
            plan.push(Command::Fetch(Fetch::PositivePredictions));
            plan.push(Command::Fetch(Fetch::SuspiciousLabels));
            plan.push(Command::Fetch(Fetch::PositiveLabels));
        }
    }

    let notice_appeared = next.uploaded_labels.is_some()
        && prev.is_none_or(|p| p.uploaded_labels != next.uploaded_labels);
    if let Some(notice) = next.uploaded_labels.as_ref().filter(|_| notice_appeared) {
        let matches_current = next
            .cur_category
            .as_ref()
            .is_some_and(|c| notice.mentions(c));
        if matches_current {
            plan.push(Command::Fetch(Fetch::PositiveLabels));
            plan.push(Command::FetchThen {
                first: Fetch::Elements,
                then: Fetch::Status,
            });
        }
        if notice.categories_created {
            plan.push(Command::Fetch(Fetch::Categories));
        }
        // Clears even when both branches were skipped.
        plan.push(Command::ClearUploadNotice);
    }

    plan
}
