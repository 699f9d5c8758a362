use eframe::egui::{self, Color32, RichText, Ui};

use crate::graph::{Graph, NODE_TYPE_CATALOG, NodeId, Properties, PropertyValue};
use crate::provider::{NewNode, NewRelationship};

use super::super::Job;

const SUCCESS_COLOR: Color32 = Color32::from_rgb(67, 160, 71);

/// Default properties and suggested outgoing relationship types per label.
struct NodeTemplate {
    label: &'static str,
    properties: &'static [(&'static str, &'static str)],
    relationships: &'static [&'static str],
}

const NODE_TEMPLATES: &[NodeTemplate] = &[
    NodeTemplate {
        label: "Risco",
        properties: &[
            ("description", ""),
            ("impact", "Médio"),
            ("probability", "Média"),
            ("area", ""),
            ("status", "Identificado"),
        ],
        relationships: &["AFETA", "MITIGADO_POR", "RELACIONADO_A", "IDENTIFICADO_POR"],
    },
    NodeTemplate {
        label: "PlanoDeAcao",
        properties: &[
            ("description", ""),
            ("deadline", ""),
            ("status", "Planejado"),
            ("priority", "Média"),
            ("responsible", ""),
        ],
        relationships: &["MITIGA", "IMPLEMENTA", "RESPONSABILIDADE_DE", "POSSUI"],
    },
    NodeTemplate {
        label: "Acao",
        properties: &[
            ("description", ""),
            ("deadline", ""),
            ("status", "Pendente"),
            ("responsible", ""),
        ],
        relationships: &["PARTE_DE", "EXECUTADO_POR", "IMPACTA"],
    },
    NodeTemplate {
        label: "Estrategia",
        properties: &[
            ("description", ""),
            ("timeframe", ""),
            ("status", "Ativa"),
            ("objective", ""),
        ],
        relationships: &["ENDEREÇA", "APOIA", "DEPENDE_DE", "ALINHADO_COM"],
    },
    NodeTemplate {
        label: "Visao",
        properties: &[("description", ""), ("timeframe", "")],
        relationships: &["ORIENTA", "SUPORTA"],
    },
    NodeTemplate {
        label: "Missao",
        properties: &[("description", "")],
        relationships: &["FUNDAMENTA", "DIRECIONA"],
    },
    NodeTemplate {
        label: "Oportunidade",
        properties: &[
            ("description", ""),
            ("potential", "Médio"),
            ("timeframe", ""),
            ("area", ""),
        ],
        relationships: &["EXPLORADA_POR", "RELACIONADA_A", "CONTRIBUI_PARA"],
    },
    NodeTemplate {
        label: "Departamento",
        properties: &[("description", ""), ("manager", ""), ("size", "")],
        relationships: &["RESPONSÁVEL_POR", "REPORTA_PARA", "GERENCIA"],
    },
    NodeTemplate {
        label: "Projeto",
        properties: &[
            ("description", ""),
            ("status", "Em andamento"),
            ("startDate", ""),
            ("endDate", ""),
            ("manager", ""),
        ],
        relationships: &["CONTRIBUI_PARA", "DEPENDE_DE", "GERENCIADO_POR", "INCLUI"],
    },
    NodeTemplate {
        label: "Objetivo",
        properties: &[
            ("description", ""),
            ("timeframe", ""),
            ("status", "Ativo"),
            ("metric", ""),
        ],
        relationships: &["SUPORTADO_POR", "ALINHADO_COM", "MENSURADO_POR"],
    },
    NodeTemplate {
        label: "KPI",
        properties: &[
            ("description", ""),
            ("target", ""),
            ("current", ""),
            ("unit", ""),
            ("frequency", "Mensal"),
        ],
        relationships: &["MEDE", "RELACIONADO_A"],
    },
    NodeTemplate {
        label: "Stakeholder",
        properties: &[
            ("description", ""),
            ("role", ""),
            ("influence", "Média"),
            ("interest", "Médio"),
        ],
        relationships: &["INTERESSADO_EM", "INFLUENCIA", "RESPONDE_POR"],
    },
    NodeTemplate {
        label: "Tecnologia",
        properties: &[
            ("description", ""),
            ("version", ""),
            ("status", "Ativo"),
            ("vendor", ""),
        ],
        relationships: &["SUPORTA", "INTEGRADA_COM", "PARTE_DE"],
    },
    NodeTemplate {
        label: "Produto",
        properties: &[
            ("description", ""),
            ("status", "Ativo"),
            ("lifecycle", "Desenvolvimento"),
            ("manager", ""),
        ],
        relationships: &["DEPENDENTE_DE", "ENTREGUE_POR", "INCLUI"],
    },
    NodeTemplate {
        label: "Mercado",
        properties: &[
            ("description", ""),
            ("size", ""),
            ("growth", ""),
            ("region", ""),
        ],
        relationships: &["INCLUI", "RELACIONADO_A"],
    },
    NodeTemplate {
        label: "Competidor",
        properties: &[
            ("description", ""),
            ("size", ""),
            ("strength", "Médio"),
            ("threat", "Médio"),
        ],
        relationships: &["COMPETE_COM", "ATUA_EM", "AMEAÇA"],
    },
];

fn template(label: &str) -> Option<&'static NodeTemplate> {
    NODE_TEMPLATES.iter().find(|template| template.label == label)
}

/// Suggested relationship types for a source label; every known type when
/// the label has no template.
fn suggested_relationships(label: Option<&str>) -> Vec<&'static str> {
    if let Some(template) = label.and_then(template) {
        return template.relationships.to_vec();
    }
    let mut all = NODE_TEMPLATES
        .iter()
        .flat_map(|template| template.relationships.iter().copied())
        .collect::<Vec<_>>();
    all.sort_unstable();
    all.dedup();
    all
}

#[derive(Clone, Debug, Default, PartialEq)]
struct PropertyRow {
    key: String,
    value: String,
}

fn template_rows(label: &str) -> Vec<PropertyRow> {
    template(label)
        .map(|template| {
            template
                .properties
                .iter()
                .map(|(key, value)| PropertyRow {
                    key: (*key).to_owned(),
                    value: (*value).to_owned(),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Rows with a blank key or value are left out.
fn rows_to_properties(rows: &[PropertyRow]) -> Properties {
    rows.iter()
        .filter(|row| !row.key.trim().is_empty() && !row.value.trim().is_empty())
        .map(|row| {
            (
                row.key.trim().to_owned(),
                PropertyValue::Text(row.value.trim().to_owned()),
            )
        })
        .collect()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum FormMode {
    #[default]
    Node,
    Relationship,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum FormMessage {
    Success(String),
    Error(String),
}

#[derive(Clone, Debug)]
pub(in crate::app) struct AddForm {
    mode: FormMode,
    name: String,
    label: String,
    node_rows: Vec<PropertyRow>,
    source_id: Option<NodeId>,
    target_id: Option<NodeId>,
    kind: String,
    relationship_rows: Vec<PropertyRow>,
    new_key: String,
    new_value: String,
    message: Option<FormMessage>,
}

impl Default for AddForm {
    fn default() -> Self {
        let label = NODE_TYPE_CATALOG[0].to_owned();
        Self {
            mode: FormMode::Node,
            name: String::new(),
            node_rows: template_rows(&label),
            label,
            source_id: None,
            target_id: None,
            kind: String::new(),
            relationship_rows: Vec::new(),
            new_key: String::new(),
            new_value: String::new(),
            message: None,
        }
    }
}

impl AddForm {
    pub(in crate::app) fn show_error(&mut self, message: String) {
        self.message = Some(FormMessage::Error(message));
    }

    /// Clears the submitted fields and keeps the mode and node type.
    pub(in crate::app) fn on_created(&mut self, notice: String) {
        self.name.clear();
        self.node_rows = template_rows(&self.label);
        self.source_id = None;
        self.target_id = None;
        self.kind.clear();
        self.relationship_rows.clear();
        self.new_key.clear();
        self.new_value.clear();
        self.message = Some(FormMessage::Success(notice));
    }

    fn select_label(&mut self, label: String) {
        if label != self.label {
            self.node_rows = template_rows(&label);
            self.label = label;
        }
    }

    fn select_source(&mut self, source_id: NodeId, graph: &Graph) {
        if self.source_id == Some(source_id) {
            return;
        }
        self.source_id = Some(source_id);
        let label = graph.node(source_id).map(|node| node.label.as_str());
        self.kind = suggested_relationships(label)
            .first()
            .map(|kind| (*kind).to_owned())
            .unwrap_or_default();
    }

    fn node_request(&self) -> Result<NewNode, String> {
        if self.name.trim().is_empty() {
            return Err("Node name is required".to_owned());
        }
        let request = NewNode {
            name: self.name.trim().to_owned(),
            label: self.label.clone(),
            properties: rows_to_properties(&self.node_rows),
        };
        request.validate().map_err(|error| error.to_string())?;
        Ok(request)
    }

    fn relationship_request(&self, graph: &Graph) -> Result<NewRelationship, String> {
        let (Some(source_id), Some(target_id)) = (self.source_id, self.target_id) else {
            return Err("Source, target, and type are required".to_owned());
        };
        for id in [source_id, target_id] {
            if !graph.contains_node(id) {
                return Err(format!("Node {id} is no longer in the graph"));
            }
        }
        let request = NewRelationship {
            source_id,
            target_id,
            kind: self.kind.trim().to_owned(),
            properties: rows_to_properties(&self.relationship_rows),
        };
        request.validate().map_err(|error| error.to_string())?;
        Ok(request)
    }

    /// Draws the form. Returns a creation job when the user submits a valid
    /// request.
    pub(in crate::app) fn draw(
        &mut self,
        ui: &mut Ui,
        graph: &Graph,
        fetching: bool,
    ) -> Option<Job> {
        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.mode, FormMode::Node, "Node");
            ui.selectable_value(&mut self.mode, FormMode::Relationship, "Relationship");
        });
        ui.add_space(4.0);

        let submitted = match self.mode {
            FormMode::Node => self.draw_node_fields(ui, fetching),
            FormMode::Relationship => self.draw_relationship_fields(ui, graph, fetching),
        };

        let job = if submitted {
            let request = match self.mode {
                FormMode::Node => self.node_request().map(Job::CreateNode),
                FormMode::Relationship => self
                    .relationship_request(graph)
                    .map(Job::CreateRelationship),
            };
            match request {
                Ok(job) => {
                    self.message = None;
                    Some(job)
                }
                Err(message) => {
                    self.message = Some(FormMessage::Error(message));
                    None
                }
            }
        } else {
            None
        };

        match &self.message {
            Some(FormMessage::Success(text)) => {
                ui.colored_label(SUCCESS_COLOR, text.as_str());
            }
            Some(FormMessage::Error(text)) => {
                let color = ui.visuals().error_fg_color;
                ui.colored_label(color, text.as_str());
            }
            None => {}
        }

        job
    }

    fn draw_node_fields(&mut self, ui: &mut Ui, fetching: bool) -> bool {
        ui.label("Name");
        ui.text_edit_singleline(&mut self.name);

        ui.label("Type");
        let mut label = self.label.clone();
        egui::ComboBox::from_id_salt("add_node_label")
            .selected_text(label.as_str())
            .show_ui(ui, |ui| {
                for catalog_label in NODE_TYPE_CATALOG {
                    ui.selectable_value(&mut label, catalog_label.to_owned(), catalog_label);
                }
            });
        self.select_label(label);

        ui.add_space(4.0);
        ui.label(RichText::new("Properties").strong());
        draw_property_rows(
            ui,
            "node_properties_form",
            &mut self.node_rows,
            &mut self.new_key,
            &mut self.new_value,
        );

        ui.add_space(6.0);
        ui.add_enabled(!fetching, egui::Button::new("Create node"))
            .clicked()
    }

    fn draw_relationship_fields(&mut self, ui: &mut Ui, graph: &Graph, fetching: bool) -> bool {
        if graph.node_count() < 2 {
            ui.weak("At least two nodes are needed to create a relationship.");
            return false;
        }

        let mut options = graph
            .nodes()
            .iter()
            .map(|node| (node.id, format!("{} ({})", node.display_name(), node.label)))
            .collect::<Vec<_>>();
        options.sort_by(|a, b| a.1.cmp(&b.1));
        let caption = |id: Option<NodeId>| {
            id.and_then(|id| options.iter().find(|(option, _)| *option == id))
                .map(|(_, text)| text.clone())
                .unwrap_or_else(|| "Choose a node".to_owned())
        };

        ui.label("Source");
        let mut source_id = self.source_id;
        egui::ComboBox::from_id_salt("add_relationship_source")
            .selected_text(caption(source_id))
            .width(220.0)
            .show_ui(ui, |ui| {
                for (id, text) in &options {
                    ui.selectable_value(&mut source_id, Some(*id), text.as_str());
                }
            });
        if let Some(source_id) = source_id {
            self.select_source(source_id, graph);
        }

        ui.label("Target");
        let mut target_id = self.target_id;
        egui::ComboBox::from_id_salt("add_relationship_target")
            .selected_text(caption(target_id))
            .width(220.0)
            .show_ui(ui, |ui| {
                for (id, text) in &options {
                    ui.selectable_value(&mut target_id, Some(*id), text.as_str());
                }
            });
        self.target_id = target_id;

        ui.label("Relationship type");
        ui.text_edit_singleline(&mut self.kind);
        let source_label = self
            .source_id
            .and_then(|id| graph.node(id))
            .map(|node| node.label.as_str());
        ui.horizontal_wrapped(|ui| {
            for suggestion in suggested_relationships(source_label) {
                if ui.small_button(suggestion).clicked() {
                    self.kind = suggestion.to_owned();
                }
            }
        });

        ui.add_space(4.0);
        ui.label(RichText::new("Properties").strong());
        draw_property_rows(
            ui,
            "relationship_properties_form",
            &mut self.relationship_rows,
            &mut self.new_key,
            &mut self.new_value,
        );

        ui.add_space(6.0);
        ui.add_enabled(!fetching, egui::Button::new("Create relationship"))
            .clicked()
    }
}

fn draw_property_rows(
    ui: &mut Ui,
    id: &str,
    rows: &mut Vec<PropertyRow>,
    new_key: &mut String,
    new_value: &mut String,
) {
    let mut removed = None;
    egui::Grid::new(id).num_columns(3).show(ui, |ui| {
        for (index, row) in rows.iter_mut().enumerate() {
            ui.label(row.key.as_str());
            ui.text_edit_singleline(&mut row.value);
            if ui.small_button("x").on_hover_text("Remove property").clicked() {
                removed = Some(index);
            }
            ui.end_row();
        }
    });
    if let Some(index) = removed {
        rows.remove(index);
    }

    ui.horizontal(|ui| {
        ui.add(egui::TextEdit::singleline(new_key).hint_text("key").desired_width(90.0));
        ui.add(egui::TextEdit::singleline(new_value).hint_text("value").desired_width(110.0));
        if ui.button("Add").clicked() && !new_key.trim().is_empty() {
            let key = new_key.trim().to_owned();
            match rows.iter_mut().find(|row| row.key == key) {
                Some(row) => row.value = new_value.clone(),
                None => rows.push(PropertyRow {
                    key,
                    value: new_value.clone(),
                }),
            }
            new_key.clear();
            new_value.clear();
        }
    });
}
