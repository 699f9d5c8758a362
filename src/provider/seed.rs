use crate::graph::{Graph, normalize};

use super::{ProviderResult, parse_graph_payload};

const SAMPLE_GRAPH_JSON: &str = include_str!("../../assets/sample_graph.json");

/// Organization sample: risks, action plans, strategies, departments and
/// the relationships between them.
pub fn sample_graph() -> ProviderResult<Graph> {
    Ok(normalize(&parse_graph_payload(SAMPLE_GRAPH_JSON)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NODE_TYPE_CATALOG;

    #[test]
    fn sample_graph_loads_completely() {
        let graph = sample_graph().expect("bundled sample parses");
        assert!(!graph.is_malformed());
        assert_eq!(graph.node_count(), 106);
        assert_eq!(graph.edge_count(), 102);
    }

    #[test]
    fn sample_graph_only_uses_catalog_labels() {
        let graph = sample_graph().expect("bundled sample parses");
        assert!(
            graph
                .labels()
                .iter()
                .all(|label| NODE_TYPE_CATALOG.contains(label))
        );
    }

    #[test]
    fn backup_risk_is_mitigated_by_the_backup_policy() {
        let graph = sample_graph().expect("bundled sample parses");
        let risk = graph
            .nodes()
            .iter()
            .find(|node| node.name() == Some("Falha no backup"))
            .expect("backup risk");
        let plan = graph
            .edges()
            .iter()
            .find(|edge| edge.source_id == risk.id && edge.kind == "MITIGADO_POR")
            .and_then(|edge| graph.node(edge.target_id))
            .expect("mitigation plan");
        assert_eq!(plan.name(), Some("Revisar política de backup"));
    }
}
