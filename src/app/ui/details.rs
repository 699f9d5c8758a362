use eframe::egui::{self, RichText, Sense, Ui, vec2};

use crate::graph::GraphNode;

use super::super::ViewModel;
use super::super::render_utils::label_color;

/// Rows for the property grid: everything except `name`.
fn property_rows(node: &GraphNode) -> Vec<(String, String)> {
    node.properties
        .iter()
        .filter(|(key, _)| *key != "name")
        .map(|(key, value)| (key.to_owned(), value.to_string()))
        .collect()
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        let Some(selected) = self.session.highlight().selected() else {
            return;
        };
        let Some(node) = self.session.subgraph().node(selected) else {
            ui.label("The selected node is no longer visible.");
            return;
        };

        let name = node.display_name();
        let label = node.label.clone();
        let rows = property_rows(node);
        let connections = self
            .session
            .subgraph()
            .connection_counts()
            .get(&selected)
            .copied()
            .unwrap_or(0);

        ui.horizontal(|ui| {
            ui.heading(name.as_str());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Close").clicked() {
                    self.session.clear_selection();
                }
            });
        });
        ui.horizontal(|ui| {
            let (swatch, _) = ui.allocate_exact_size(vec2(12.0, 12.0), Sense::hover());
            ui.painter()
                .circle_filled(swatch.center(), 5.0, label_color(&label));
            ui.label(label.as_str());
        });
        ui.add_space(6.0);

        if rows.is_empty() {
            ui.weak("No further properties.");
        } else {
            egui::Grid::new("node_properties")
                .num_columns(2)
                .striped(true)
                .show(ui, |ui| {
                    for (key, value) in &rows {
                        ui.label(RichText::new(key.as_str()).strong());
                        ui.label(value.as_str());
                        ui.end_row();
                    }
                });
        }
        ui.add_space(4.0);
        ui.label(format!("Connections: {connections}"));

        ui.separator();
        ui.label(RichText::new("Nearby nodes").strong());
        let mut clicked = None;
        for group in self.session.summary() {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                let (swatch, _) = ui.allocate_exact_size(vec2(10.0, 10.0), Sense::hover());
                ui.painter()
                    .circle_filled(swatch.center(), 4.0, label_color(&group.label));
                ui.label(format!("{} ({})", group.label, group.members.len()));
            });
            ui.indent(("nearby", group.label.as_str()), |ui| {
                for member in &group.members {
                    let text = if member.id == selected {
                        RichText::new(member.name.as_str()).strong()
                    } else {
                        RichText::new(member.name.as_str())
                    };
                    if ui.link(text).clicked() {
                        clicked = Some(member.id);
                    }
                }
            });
        }

        if let Some(node_id) = clicked {
            self.session.select(node_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Properties, PropertyValue};

    #[test]
    fn property_rows_skip_the_name_and_render_nested_values_as_json() {
        let properties: Properties = [
            ("name", PropertyValue::Text("Falha no backup".into())),
            ("impact", PropertyValue::Text("Alto".into())),
            ("score", PropertyValue::Number(3.0)),
            (
                "tags",
                PropertyValue::List(vec![
                    PropertyValue::Text("ti".into()),
                    PropertyValue::Bool(true),
                ]),
            ),
        ]
        .into_iter()
        .collect();
        let node = GraphNode {
            id: 1,
            label: "Risco".into(),
            properties,
        };

        assert_eq!(
            property_rows(&node),
            vec![
                ("impact".to_owned(), "Alto".to_owned()),
                ("score".to_owned(), "3".to_owned()),
                ("tags".to_owned(), r#"["ti",true]"#.to_owned()),
            ]
        );
    }
}
