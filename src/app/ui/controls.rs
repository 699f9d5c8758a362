use std::collections::HashMap;
use std::time::Instant;

use eframe::egui::{self, RichText, Sense, Ui, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::graph::{FilterChange, NodeId, VisibleSubgraph};

use super::super::ViewModel;
use super::super::render_utils::label_color;
use super::super::session::FilterPhase;

const QUICK_FIND_LIMIT: usize = 8;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

/// Visible nodes whose name fuzzily matches `query`, best match first.
pub(in crate::app) fn quick_find_matches(
    subgraph: &VisibleSubgraph,
    query: &str,
    limit: usize,
) -> Vec<(NodeId, String)> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default();
    let mut scored = subgraph
        .nodes()
        .iter()
        .filter_map(|node| {
            let name = node.display_name();
            fuzzy_match_score(&matcher, &name, query).map(|score| (score, node.id, name))
        })
        .collect::<Vec<_>>();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.2.cmp(&b.2)));
    scored
        .into_iter()
        .take(limit)
        .map(|(_, id, name)| (id, name))
        .collect()
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui, fetching: bool) {
        ui.heading("Filters");
        ui.separator();
        ui.add_space(4.0);

        let now = Instant::now();
        let mut change = None;

        ui.label("Search by name")
            .on_hover_text("Case-insensitive match on the node name.");
        if ui.text_edit_singleline(&mut self.search_input).changed() {
            change = Some(FilterChange::SearchText(self.search_input.clone()));
        }

        ui.add_space(6.0);
        ui.label(RichText::new("Node types").strong());
        ui.horizontal(|ui| {
            if ui.button("Select all").clicked() {
                change = Some(FilterChange::SetAllTypes(true));
            }
            if ui.button("Deselect all").clicked() {
                change = Some(FilterChange::SetAllTypes(false));
            }
        });

        let mut per_label = HashMap::<&str, usize>::new();
        for node in self.session.graph().nodes() {
            *per_label.entry(node.label.as_str()).or_default() += 1;
        }
        for (label, enabled) in &self.session.draft().enabled_types {
            ui.horizontal(|ui| {
                let (swatch, _) = ui.allocate_exact_size(vec2(12.0, 12.0), Sense::hover());
                ui.painter()
                    .circle_filled(swatch.center(), 5.0, label_color(label));
                let mut checked = *enabled;
                let count = per_label.get(label.as_str()).copied().unwrap_or(0);
                if ui
                    .checkbox(&mut checked, format!("{label} ({count})"))
                    .changed()
                {
                    change = Some(FilterChange::ToggleType(label.clone()));
                }
            });
        }

        ui.add_space(6.0);
        let mut show_isolated = self.session.draft().show_isolated_nodes;
        if ui
            .checkbox(&mut show_isolated, "Show isolated nodes")
            .on_hover_text("Nodes without any visible relationship.")
            .changed()
        {
            change = Some(FilterChange::ShowIsolatedNodes(show_isolated));
        }

        if let Some(change) = change {
            self.session.request_change(change, now);
        }

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            if ui.button("Reset filters").clicked() {
                self.session.reset_filters();
                self.search_input.clear();
            }
            if matches!(self.session.phase(), FilterPhase::Debouncing { .. }) {
                ui.weak("applying...");
            }
        });

        if let Some(warning) = self.session.warning() {
            ui.add_space(4.0);
            let color = ui.visuals().warn_fg_color;
            ui.colored_label(color, warning.to_string());
            if ui.small_button("Dismiss").clicked() {
                self.session.dismiss_warning();
            }
        }

        ui.separator();
        ui.label(RichText::new("Find node").strong());
        ui.text_edit_singleline(&mut self.quick_find)
            .on_hover_text("Fuzzy lookup over the visible nodes.");
        let matches =
            quick_find_matches(self.session.subgraph(), &self.quick_find, QUICK_FIND_LIMIT);
        if !self.quick_find.trim().is_empty() && matches.is_empty() {
            ui.weak("No visible node matches.");
        }
        for (node_id, name) in matches {
            if ui.link(name).clicked() {
                self.focus_node(node_id);
            }
        }

        ui.separator();
        egui::CollapsingHeader::new("Add to graph")
            .default_open(false)
            .show(ui, |ui| {
                if let Some(job) = self.add_form.draw(ui, self.session.graph(), fetching) {
                    self.pending_job = Some(job);
                }
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixtures::scenario_graph;
    use crate::graph::{FilterConfiguration, visible_subgraph};

    #[test]
    fn quick_find_matches_visible_names_fuzzily() {
        let graph = scenario_graph();
        let subgraph = visible_subgraph(&FilterConfiguration::for_graph(&graph), &graph);

        assert_eq!(quick_find_matches(&subgraph, "plano", 8), vec![(2, "Plano B".to_owned())]);
        assert_eq!(quick_find_matches(&subgraph, "ac", 8), vec![(3, "Acao C".to_owned())]);
        assert!(quick_find_matches(&subgraph, "  ", 8).is_empty());
        assert!(quick_find_matches(&subgraph, "zzz", 8).is_empty());
        assert_eq!(quick_find_matches(&subgraph, "o", 2).len(), 2);
    }

    #[test]
    fn quick_find_ignores_hidden_nodes() {
        let graph = scenario_graph();
        let mut config = FilterConfiguration::for_graph(&graph);
        config.enabled_types.insert("PlanoDeAcao".into(), false);
        let subgraph = visible_subgraph(&config, &graph);
        assert!(quick_find_matches(&subgraph, "plano", 8).is_empty());
    }
}
