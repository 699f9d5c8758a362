use std::time::Instant;

use eframe::egui::{self, Align, Context, Layout, RichText, Vec2};

use crate::graph::Graph;

use super::super::graph::DEFAULT_CANVAS_SIZE;
use super::super::physics::LayoutEnergy;
use super::super::render_utils::Theme;
use super::super::session::SessionController;
use super::super::{Job, ViewModel};
use super::AddForm;

const INITIAL_ZOOM: f32 = 0.85;

impl ViewModel {
    pub(in crate::app) fn new(graph: Graph) -> Self {
        Self {
            session: SessionController::new(graph),
            search_input: String::new(),
            quick_find: String::new(),
            pan: Vec2::ZERO,
            zoom: INITIAL_ZOOM,
            canvas_size: DEFAULT_CANVAS_SIZE,
            render_graph_revision: 0,
            graph_cache: None,
            energy: LayoutEnergy::default(),
            dragging: None,
            add_form: AddForm::default(),
            pending_job: None,
        }
    }

    /// Swaps in a refetched snapshot; the layout of surviving nodes is kept.
    pub(in crate::app) fn install_snapshot(&mut self, graph: Graph, notice: Option<String>) {
        self.session.install_snapshot(graph);
        self.search_input = self.session.draft().search_text.clone();
        if let Some(notice) = notice {
            self.add_form.on_created(notice);
        }
    }

    /// Draws one frame. Returns the provider request the user asked for.
    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        theme: &mut Theme,
        provider: &str,
        fetching: bool,
    ) -> Option<Job> {
        if let Some(remaining) = self.session.poll(Instant::now()) {
            ctx.request_repaint_after(remaining);
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("grafo-lens");
                    ui.separator();
                    ui.label(format!("source: {provider}"));
                    ui.label(format!(
                        "nodes: {} / {}",
                        self.session.subgraph().nodes().len(),
                        self.session.graph().node_count()
                    ));
                    ui.label(format!(
                        "edges: {} / {}",
                        self.session.subgraph().edges().len(),
                        self.session.graph().edge_count()
                    ));
                    let refresh = ui.add_enabled(!fetching, egui::Button::new("Refresh"));
                    if refresh.clicked() {
                        self.pending_job = Some(Job::Refresh);
                    }
                    if fetching {
                        ui.spinner();
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        let label = match theme {
                            Theme::Dark => "Light theme",
                            Theme::Light => "Dark theme",
                        };
                        if ui.button(label).clicked() {
                            *theme = theme.toggled();
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .id_salt("controls_scroll")
                    .show(ui, |ui| self.draw_controls(ui, fetching));
            });

        if self.session.highlight().selected().is_some() {
            egui::SidePanel::right("details")
                .resizable(true)
                .default_width(340.0)
                .show(ctx, |ui| {
                    egui::ScrollArea::vertical()
                        .id_salt("details_scroll")
                        .show(ui, |ui| self.draw_details(ui));
                });
        }

        let current_theme = *theme;
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                if self.session.graph().is_empty() {
                    self.draw_empty_state(ui, fetching);
                } else {
                    self.draw_graph(ui, current_theme);
                }
            });

        self.pending_job.take()
    }

    fn draw_empty_state(&mut self, ui: &mut egui::Ui, fetching: bool) {
        ui.vertical_centered(|ui| {
            ui.add_space(120.0);
            ui.heading("No graph data");
            ui.add_space(6.0);
            if self.session.graph().is_malformed() {
                ui.label("The provider answered with an unexpected payload.");
            } else {
                ui.label("The provider holds no nodes yet.");
            }
            ui.add_space(10.0);
            let seed = ui.add_enabled(
                !fetching,
                egui::Button::new(RichText::new("Load sample data").strong()),
            );
            if seed.clicked() {
                self.pending_job = Some(Job::Seed);
            }
        });
    }
}
