//! Sidebar panel visibility state machine.
//!
//! At most one panel is active at a time; reselecting the active panel
//! toggles the drawer shut without forgetting which panel was showing, so
//! reopening returns to the same panel. The search input lives here, not in
//! any panel view, so its state survives panel switches: it grabs focus when
//! SEARCH becomes active and its text is cleared exactly once when the
//! active panel moves off SEARCH.

/// The sidebar panels. "No panel" is the absent state ([`None`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelId {
    Search,
    LabelNext,
    PositivePredictions,
    PositiveLabels,
    SuspiciousLabels,
    ContradictingLabels,
    Evaluation,
}

/// The persistent search input.
#[derive(Debug, Clone, Default)]
pub struct SearchInput {
    pub text: String,
    pub focused: bool,
}

impl SearchInput {
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    fn clear(&mut self) {
        self.text.clear();
        self.focused = false;
    }
}

/// Drawer + active-panel state.
#[derive(Debug, Clone, Default)]
pub struct PanelState {
    pub active: Option<PanelId>,
    pub drawer_open: bool,
    pub search_input: SearchInput,
}

impl PanelState {
    /// Select a panel.
    ///
    /// Selecting the active panel while the drawer is open closes the drawer
    /// and leaves the active panel unchanged; any other selection activates
    /// the panel and opens the drawer. Returns `true` when the drawer ends
    /// up open.
    pub fn select(&mut self, id: PanelId) -> bool {
        let leaving_search =
            self.active == Some(PanelId::Search) && id != PanelId::Search;

        if self.active == Some(id) && self.drawer_open {
            self.drawer_open = false;
        } else {
            self.active = Some(id);
            self.drawer_open = true;
        }

        if leaving_search {
            self.search_input.clear();
        }
        if self.active == Some(PanelId::Search) && self.drawer_open {
            self.search_input.focused = true;
        }

        self.drawer_open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selecting_a_panel_opens_the_drawer() {
        let mut panels = PanelState::default();
        assert!(panels.select(PanelId::LabelNext));
        assert_eq!(panels.active, Some(PanelId::LabelNext));
        assert!(panels.drawer_open);
    }

    #[test]
    fn reselecting_active_panel_closes_drawer_but_keeps_panel() {
        let mut panels = PanelState::default();
        panels.select(PanelId::Search);
        assert!(!panels.select(PanelId::Search));
        assert_eq!(panels.active, Some(PanelId::Search));
        assert!(!panels.drawer_open);
    }

    #[test]
    fn reopening_returns_to_the_same_panel() {
        let mut panels = PanelState::default();
        panels.select(PanelId::SuspiciousLabels);
        panels.select(PanelId::SuspiciousLabels);
        assert!(panels.select(PanelId::SuspiciousLabels));
        assert_eq!(panels.active, Some(PanelId::SuspiciousLabels));
    }

    #[test]
    fn switching_panels_keeps_drawer_open() {
        let mut panels = PanelState::default();
        panels.select(PanelId::Search);
        assert!(panels.select(PanelId::LabelNext));
        assert_eq!(panels.active, Some(PanelId::LabelNext));
        assert!(panels.drawer_open);
    }

    #[test]
    fn search_input_focuses_on_activation() {
        let mut panels = PanelState::default();
        panels.select(PanelId::Search);
        assert!(panels.search_input.focused);
    }

    #[test]
    fn search_input_clears_once_on_leaving_search() {
        let mut panels = PanelState::default();
        panels.select(PanelId::Search);
        panels.search_input.set_text("query terms");

        panels.select(PanelId::Evaluation);
        assert_eq!(panels.search_input.text, "");
        assert!(!panels.search_input.focused);

        // Typing after the switch must not be clobbered by a second clear.
        panels.search_input.set_text("fresh");
        panels.select(PanelId::PositiveLabels);
        assert_eq!(panels.search_input.text, "fresh");
    }

    #[test]
    fn closing_search_drawer_preserves_input() {
        let mut panels = PanelState::default();
        panels.select(PanelId::Search);
        panels.search_input.set_text("kept");
        panels.select(PanelId::Search); // toggle shut, still SEARCH
        assert_eq!(panels.search_input.text, "kept");
    }
}
