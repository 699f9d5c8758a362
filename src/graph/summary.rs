use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::util::collation_key;

use super::{NodeId, SelectionState, VisibleSubgraph};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryMember {
    pub id: NodeId,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryGroup {
    pub label: String,
    pub members: Vec<CategoryMember>,
}

fn compare_names(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

/// Visible nodes relevant to the selection, grouped by label. Groups are
/// ordered by label and members by display name; empty groups are dropped.
pub fn summarize(subgraph: &VisibleSubgraph, selection: &SelectionState) -> Vec<CategoryGroup> {
    let mut by_label: BTreeMap<&str, Vec<CategoryMember>> = BTreeMap::new();
    for node in subgraph.nodes() {
        if !selection.is_relevant(node.id) {
            continue;
        }
        by_label
            .entry(node.label.as_str())
            .or_default()
            .push(CategoryMember {
                id: node.id,
                name: node.display_name(),
            });
    }

    let mut groups = by_label
        .into_iter()
        .map(|(label, mut members)| {
            members.sort_by(|a, b| compare_names(&a.name, &b.name));
            CategoryGroup {
                label: label.to_owned(),
                members,
            }
        })
        .collect::<Vec<_>>();
    groups.sort_by(|a, b| compare_names(&a.label, &b.label));
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixtures::{edge, node, scenario_graph};
    use crate::graph::{FilterConfiguration, Graph, visible_subgraph};

    fn names(group: &CategoryGroup) -> Vec<&str> {
        group.members.iter().map(|member| member.name.as_str()).collect()
    }

    #[test]
    fn no_selection_yields_no_groups() {
        let graph = scenario_graph();
        let subgraph = visible_subgraph(&FilterConfiguration::for_graph(&graph), &graph);
        assert!(summarize(&subgraph, &SelectionState::default()).is_empty());
    }

    #[test]
    fn groups_selected_node_and_neighbors_by_label() {
        let graph = scenario_graph();
        let subgraph = visible_subgraph(&FilterConfiguration::for_graph(&graph), &graph);
        let selection = SelectionState::select(2, &subgraph);

        let groups = summarize(&subgraph, &selection);
        let labels = groups.iter().map(|group| group.label.as_str()).collect::<Vec<_>>();
        assert_eq!(labels, vec!["Acao", "PlanoDeAcao", "Risco"]);
        assert_eq!(names(&groups[1]), vec!["Plano B"]);
    }

    #[test]
    fn members_sort_accent_and_case_insensitively() {
        let graph = Graph::from_parts(
            vec![
                node(1, "Hub", "Estrategia"),
                node(2, "Órgãos Reguladores", "Stakeholder"),
                node(3, "clientes", "Stakeholder"),
                node(4, "Investidores", "Stakeholder"),
                node(5, "Empresa X", "Competidor"),
                node(6, "Isolado", "Stakeholder"),
            ],
            vec![
                edge(1, 1, 2, "INFLUENCIA"),
                edge(2, 3, 1, "INFLUENCIA"),
                edge(3, 1, 4, "INFLUENCIA"),
                edge(4, 5, 1, "IMPACTA"),
            ],
        );
        let subgraph = visible_subgraph(&FilterConfiguration::for_graph(&graph), &graph);
        let groups = summarize(&subgraph, &SelectionState::select(1, &subgraph));

        let stakeholders = groups
            .iter()
            .find(|group| group.label == "Stakeholder")
            .expect("stakeholder group");
        assert_eq!(
            names(stakeholders),
            vec!["clientes", "Investidores", "Órgãos Reguladores"]
        );
        assert_eq!(
            groups.iter().map(|group| group.label.as_str()).collect::<Vec<_>>(),
            vec!["Competidor", "Estrategia", "Stakeholder"]
        );
    }

    #[test]
    fn hidden_neighbors_are_not_listed() {
        let graph = scenario_graph();
        let mut config = FilterConfiguration::for_graph(&graph);
        config.enabled_types.insert("Acao".into(), false);
        let subgraph = visible_subgraph(&config, &graph);
        let groups = summarize(&subgraph, &SelectionState::select(2, &subgraph));
        assert!(groups.iter().all(|group| group.label != "Acao"));
        assert_eq!(groups.len(), 2);
    }
}
