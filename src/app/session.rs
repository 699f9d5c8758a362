use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::graph::{
    CategoryGroup, FilterChange, FilterConfiguration, FilterWarning, Graph, NodeId,
    VisibleSubgraph, apply_filter, summarize, validate_change, visible_subgraph,
};

use super::highlight::HighlightState;

pub(in crate::app) const FILTER_DEBOUNCE: Duration = Duration::from_millis(250);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::app) enum FilterPhase {
    Idle,
    /// An accepted draft waits for the quiet period to end.
    Debouncing { deadline: Instant },
    /// A new subgraph exists that the view has not picked up yet.
    Applying,
}

/// Owns the snapshot, the filter configuration and the selection. The view
/// reads through accessors and reports user intent through methods.
pub(in crate::app) struct SessionController {
    graph: Graph,
    active: FilterConfiguration,
    draft: FilterConfiguration,
    phase: FilterPhase,
    first_change_pending: bool,
    warning: Option<FilterWarning>,
    subgraph: VisibleSubgraph,
    highlight: HighlightState,
    revision: u64,
}

impl SessionController {
    pub(in crate::app) fn new(graph: Graph) -> Self {
        let config = FilterConfiguration::for_graph(&graph);
        let mut session = Self {
            subgraph: VisibleSubgraph::default(),
            graph: Graph::empty(),
            active: config.clone(),
            draft: config,
            phase: FilterPhase::Idle,
            first_change_pending: true,
            warning: None,
            highlight: HighlightState::clear(),
            revision: 0,
        };
        session.install_snapshot(graph);
        session
    }

    /// Replaces the snapshot. Pending filter work is dropped, toggles carry
    /// over, labels first seen in this snapshot start enabled.
    pub(in crate::app) fn install_snapshot(&mut self, graph: Graph) {
        let mut config = self.active.clone();
        config.include_labels(graph.labels());
        self.graph = graph;
        self.draft = config.clone();
        self.first_change_pending = true;
        self.warning = None;
        self.apply_now(config);
        info!(
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            "installed graph snapshot"
        );
    }

    fn apply_now(&mut self, config: FilterConfiguration) {
        self.subgraph = visible_subgraph(&config, &self.graph);
        self.set_active(config);
    }

    fn set_active(&mut self, config: FilterConfiguration) {
        self.active = config;
        self.highlight = HighlightState::clear();
        self.phase = FilterPhase::Applying;
        self.revision += 1;
        info!(
            visible_nodes = self.subgraph.nodes().len(),
            visible_edges = self.subgraph.edges().len(),
            "applied filter"
        );
    }

    /// Validates `change` against the draft. Accepted changes are applied
    /// after the debounce window, except the first one after a snapshot.
    pub(in crate::app) fn request_change(&mut self, change: FilterChange, now: Instant) -> bool {
        if self.first_change_pending {
            let outcome = apply_filter(&self.draft, &change, &self.graph);
            if !outcome.accepted {
                self.reject(&change, outcome.warning);
                return false;
            }
            self.first_change_pending = false;
            self.warning = None;
            self.draft = outcome.config.clone();
            self.subgraph = outcome.subgraph;
            self.set_active(outcome.config);
            return true;
        }

        match validate_change(&self.draft, &change, &self.graph) {
            Ok(config) => {
                self.warning = None;
                self.draft = config;
                self.phase = FilterPhase::Debouncing {
                    deadline: now + FILTER_DEBOUNCE,
                };
                true
            }
            Err(warning) => {
                self.reject(&change, Some(warning));
                false
            }
        }
    }

    fn reject(&mut self, change: &FilterChange, warning: Option<FilterWarning>) {
        warn!(?change, "rejected filter change");
        self.warning = warning;
    }

    /// Restores the defaults for the current snapshot immediately.
    pub(in crate::app) fn reset_filters(&mut self) {
        let config = FilterConfiguration::for_graph(&self.graph);
        self.draft = config.clone();
        self.warning = None;
        self.apply_now(config);
    }

    /// Applies the draft once its debounce deadline has passed. Returns the
    /// time left when a deadline is still pending.
    pub(in crate::app) fn poll(&mut self, now: Instant) -> Option<Duration> {
        match self.phase {
            FilterPhase::Debouncing { deadline } if now >= deadline => {
                self.apply_now(self.draft.clone());
                None
            }
            FilterPhase::Debouncing { deadline } => Some(deadline - now),
            FilterPhase::Idle | FilterPhase::Applying => None,
        }
    }

    /// Called by the view once it has rebuilt from the current subgraph.
    pub(in crate::app) fn acknowledge_applied(&mut self) {
        if self.phase == FilterPhase::Applying {
            self.phase = FilterPhase::Idle;
        }
    }

    pub(in crate::app) fn select(&mut self, node_id: NodeId) {
        self.highlight = HighlightState::select(node_id, &self.subgraph);
    }

    pub(in crate::app) fn clear_selection(&mut self) {
        self.highlight = HighlightState::clear();
    }

    pub(in crate::app) fn summary(&self) -> Vec<CategoryGroup> {
        summarize(&self.subgraph, self.highlight.selection())
    }

    pub(in crate::app) fn graph(&self) -> &Graph {
        &self.graph
    }

    /// What the controls show; may be ahead of what is rendered.
    pub(in crate::app) fn draft(&self) -> &FilterConfiguration {
        &self.draft
    }

    pub(in crate::app) fn subgraph(&self) -> &VisibleSubgraph {
        &self.subgraph
    }

    pub(in crate::app) fn highlight(&self) -> &HighlightState {
        &self.highlight
    }

    pub(in crate::app) fn warning(&self) -> Option<FilterWarning> {
        self.warning
    }

    pub(in crate::app) fn dismiss_warning(&mut self) {
        self.warning = None;
    }

    pub(in crate::app) fn phase(&self) -> FilterPhase {
        self.phase
    }

    /// Bumped whenever the visible subgraph is replaced.
    pub(in crate::app) fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixtures::{edge, node, scenario_graph};

    fn visible_ids(session: &SessionController) -> Vec<NodeId> {
        session.subgraph().nodes().iter().map(|node| node.id).collect()
    }

    #[test]
    fn new_session_shows_everything() {
        let session = SessionController::new(scenario_graph());
        assert_eq!(visible_ids(&session), vec![1, 2, 3]);
        assert_eq!(session.phase(), FilterPhase::Applying);
        assert_eq!(session.revision(), 1);
    }

    #[test]
    fn first_change_applies_immediately_then_debounces() {
        let start = Instant::now();
        let mut session = SessionController::new(scenario_graph());
        session.acknowledge_applied();

        assert!(session.request_change(FilterChange::ToggleType("Acao".into()), start));
        assert_eq!(visible_ids(&session), vec![1, 2]);
        assert_eq!(session.revision(), 2);

        assert!(session.request_change(FilterChange::SearchText("Risco".into()), start));
        assert_eq!(visible_ids(&session), vec![1, 2]);
        assert!(matches!(session.phase(), FilterPhase::Debouncing { .. }));
        assert_eq!(session.draft().search_text, "Risco");

        let remaining = session.poll(start + Duration::from_millis(100));
        assert_eq!(remaining, Some(Duration::from_millis(150)));
        assert_eq!(visible_ids(&session), vec![1, 2]);

        assert_eq!(session.poll(start + FILTER_DEBOUNCE), None);
        assert_eq!(visible_ids(&session), vec![1]);
        assert_eq!(session.phase(), FilterPhase::Applying);
        assert_eq!(session.revision(), 3);
    }

    #[test]
    fn rapid_changes_collapse_into_one_application() {
        let start = Instant::now();
        let mut session = SessionController::new(scenario_graph());
        session.request_change(FilterChange::SearchText(String::new()), start);
        let revision = session.revision();

        for (step, text) in ["P", "Pl", "Pla", "Plano"].into_iter().enumerate() {
            let at = start + Duration::from_millis(50 * step as u64);
            session.request_change(FilterChange::SearchText(text.into()), at);
            session.poll(at);
        }
        assert_eq!(session.revision(), revision);

        session.poll(start + Duration::from_millis(150) + FILTER_DEBOUNCE);
        assert_eq!(session.revision(), revision + 1);
        assert_eq!(visible_ids(&session), vec![2]);
    }

    #[test]
    fn rejected_toggle_keeps_config_and_sets_warning() {
        let start = Instant::now();
        let mut session = SessionController::new(scenario_graph());
        session.request_change(FilterChange::ToggleType("Risco".into()), start);
        let before = session.draft().clone();

        assert!(!session.request_change(FilterChange::ToggleType("PlanoDeAcao".into()), start));
        assert_eq!(session.draft(), &before);
        assert_eq!(session.warning(), Some(FilterWarning::NoVisibleRelationships));

        session.request_change(FilterChange::ToggleType("Risco".into()), start);
        assert_eq!(session.warning(), None);
    }

    #[test]
    fn reset_applies_immediately_and_clears_warning() {
        let start = Instant::now();
        let mut session = SessionController::new(scenario_graph());
        session.request_change(FilterChange::SetAllTypes(false), start);
        assert_eq!(session.warning(), Some(FilterWarning::CannotDeselectAll));
        session.request_change(FilterChange::SearchText("zzz".into()), start);

        session.reset_filters();
        assert_eq!(session.warning(), None);
        assert_eq!(session.phase(), FilterPhase::Applying);
        assert_eq!(visible_ids(&session), vec![1, 2, 3]);
    }

    #[test]
    fn new_snapshot_discards_pending_work_and_selection() {
        let start = Instant::now();
        let mut session = SessionController::new(scenario_graph());
        session.request_change(FilterChange::ToggleType("Acao".into()), start);
        session.request_change(FilterChange::SearchText("Plano".into()), start);
        session.select(2);
        assert!(session.highlight().selected().is_some());

        let refreshed = Graph::from_parts(
            vec![
                node(1, "Risco A", "Risco"),
                node(2, "Plano B", "PlanoDeAcao"),
                node(3, "Acao C", "Acao"),
                node(4, "Painel", "Misterio"),
            ],
            vec![
                edge(10, 1, 2, "MITIGADO_POR"),
                edge(11, 2, 3, "CONTEM"),
                edge(12, 4, 1, "MONITORA"),
            ],
        );
        session.install_snapshot(refreshed);

        assert_eq!(session.phase(), FilterPhase::Applying);
        assert_eq!(session.draft().search_text, "");
        assert!(!session.draft().is_type_enabled("Acao"));
        assert!(session.draft().is_type_enabled("Misterio"));
        assert_eq!(visible_ids(&session), vec![1, 2, 4]);
        assert_eq!(session.highlight().selected(), None);
        assert_eq!(session.poll(start + FILTER_DEBOUNCE * 4), None);
        assert_eq!(visible_ids(&session), vec![1, 2, 4]);
    }

    #[test]
    fn applying_a_filter_clears_the_selection() {
        let start = Instant::now();
        let mut session = SessionController::new(scenario_graph());
        session.select(1);
        session.request_change(FilterChange::ShowIsolatedNodes(false), start);
        assert_eq!(session.highlight().selected(), None);
    }

    #[test]
    fn summary_follows_the_selection() {
        let mut session = SessionController::new(scenario_graph());
        assert!(session.summary().is_empty());
        session.select(3);
        let labels = session
            .summary()
            .into_iter()
            .map(|group| group.label)
            .collect::<Vec<_>>();
        assert_eq!(labels, vec!["Acao", "PlanoDeAcao"]);
        session.clear_selection();
        assert!(session.summary().is_empty());
    }
}
