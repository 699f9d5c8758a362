use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use anyhow::Context as _;
use eframe::egui::{self, Context, Pos2, Vec2};
use tracing::{info, warn};

use crate::graph::{EdgeId, Graph, NodeId, normalize};
use crate::provider::{GraphProvider, NewNode, NewRelationship};

mod graph;
mod highlight;
mod physics;
mod render_utils;
mod session;
mod ui;

pub use render_utils::Theme;

use physics::LayoutEnergy;
use session::SessionController;
use ui::AddForm;

pub struct KnowledgeGraphApp {
    provider: Arc<dyn GraphProvider>,
    provider_description: String,
    theme: Theme,
    state: AppState,
    fetch: FetchState,
}

enum AppState {
    Loading,
    Ready(Box<ViewModel>),
    Error(String),
}

/// At most one provider request is in flight.
enum FetchState {
    Idle,
    Fetching {
        job: &'static str,
        rx: Receiver<JobOutcome>,
    },
}

/// Work handed to the background thread. Every job ends with a refetch so
/// the view always shows what the provider holds.
pub(in crate::app) enum Job {
    Refresh,
    Seed,
    CreateNode(NewNode),
    CreateRelationship(NewRelationship),
}

impl Job {
    fn name(&self) -> &'static str {
        match self {
            Self::Refresh => "refresh",
            Self::Seed => "seed",
            Self::CreateNode(_) => "create node",
            Self::CreateRelationship(_) => "create relationship",
        }
    }
}

enum JobOutcome {
    Loaded {
        graph: Graph,
        notice: Option<String>,
    },
    /// The provider refused a creation; the current snapshot stays.
    Rejected(String),
    Failed(String),
}

struct ViewModel {
    session: SessionController,
    search_input: String,
    quick_find: String,
    pan: Vec2,
    zoom: f32,
    canvas_size: Vec2,
    render_graph_revision: u64,
    graph_cache: Option<RenderGraph>,
    energy: LayoutEnergy,
    dragging: Option<usize>,
    add_form: AddForm,
    pending_job: Option<Job>,
}

/// Per-node simulation and drawing state for the current visible subgraph,
/// indexed in subgraph order.
struct RenderGraph {
    nodes: Vec<RenderNode>,
    edges: Vec<RenderEdge>,
    index_by_id: HashMap<NodeId, usize>,
    physics_scratch: PhysicsScratch,
    view_scratch: ViewScratch,
}

#[derive(Default)]
struct PhysicsScratch {
    delta_velocities: Vec<Vec2>,
    positions: Vec<Vec2>,
    radii: Vec<f32>,
    degrees: Vec<usize>,
}

#[derive(Default)]
struct ViewScratch {
    screen_positions: Vec<Pos2>,
    screen_radii: Vec<f32>,
}

struct RenderNode {
    id: NodeId,
    name: String,
    label: String,
    connections: usize,
    radius: f32,
    world_pos: Vec2,
    velocity: Vec2,
    last_valid_pos: Vec2,
    pinned: Option<Vec2>,
}

struct RenderEdge {
    id: EdgeId,
    from: usize,
    to: usize,
    kind: String,
}

impl KnowledgeGraphApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        provider: Arc<dyn GraphProvider>,
        theme: Theme,
    ) -> Self {
        cc.egui_ctx.set_visuals(theme.visuals());
        let mut app = Self {
            provider_description: provider.describe(),
            provider,
            theme,
            state: AppState::Loading,
            fetch: FetchState::Idle,
        };
        app.request(&cc.egui_ctx, Job::Refresh);
        app
    }

    fn request(&mut self, ctx: &Context, job: Job) {
        if let FetchState::Fetching { job: running, .. } = &self.fetch {
            warn!(
                requested = job.name(),
                running = *running,
                "provider request already in flight; dropping"
            );
            return;
        }

        let name = job.name();
        let (tx, rx) = mpsc::channel();
        let provider = Arc::clone(&self.provider);
        let ctx = ctx.clone();
        thread::spawn(move || {
            let outcome = run_job(provider.as_ref(), job);
            let _ = tx.send(outcome);
            ctx.request_repaint();
        });
        self.fetch = FetchState::Fetching { job: name, rx };
    }

    fn poll_fetch(&mut self) -> Option<JobOutcome> {
        let FetchState::Fetching { rx, .. } = &self.fetch else {
            return None;
        };

        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => {
                JobOutcome::Failed("Background provider worker disconnected".to_owned())
            }
        };
        self.fetch = FetchState::Idle;
        Some(outcome)
    }

    fn apply_outcome(&mut self, outcome: JobOutcome) {
        match outcome {
            JobOutcome::Loaded { graph, notice } => {
                if let AppState::Ready(model) = &mut self.state {
                    model.install_snapshot(graph, notice);
                    return;
                }
                self.state = AppState::Ready(Box::new(ViewModel::new(graph)));
            }
            JobOutcome::Rejected(message) => {
                warn!(%message, "provider rejected the request");
                if let AppState::Ready(model) = &mut self.state {
                    model.add_form.show_error(message);
                    return;
                }
                self.state = AppState::Error(message);
            }
            JobOutcome::Failed(message) => {
                warn!(%message, "provider request failed");
                self.state = AppState::Error(message);
            }
        }
    }
}

fn run_job(provider: &dyn GraphProvider, job: Job) -> JobOutcome {
    let prepared = match job {
        Job::Refresh => Ok(None),
        Job::Seed => provider
            .seed()
            .context("failed to load the sample data")
            .map(|()| None),
        Job::CreateNode(request) => match provider.create_node(&request) {
            Ok(node) => {
                info!(id = node.id, label = %node.label, "created node");
                Ok(Some(format!("Node \"{}\" created", node.display_name())))
            }
            Err(error) => return JobOutcome::Rejected(error.to_string()),
        },
        Job::CreateRelationship(request) => match provider.create_relationship(&request) {
            Ok(edge) => {
                info!(
                    id = edge.id,
                    source = edge.source_id,
                    target = edge.target_id,
                    kind = %edge.kind,
                    "created relationship"
                );
                Ok(Some(format!("Relationship {} created", edge.kind)))
            }
            Err(error) => return JobOutcome::Rejected(error.to_string()),
        },
    };

    match prepared.and_then(|notice| Ok((fetch_snapshot(provider)?, notice))) {
        Ok((graph, notice)) => JobOutcome::Loaded { graph, notice },
        Err(error) => JobOutcome::Failed(format!("{error:#}")),
    }
}

fn fetch_snapshot(provider: &dyn GraphProvider) -> anyhow::Result<Graph> {
    info!(provider = %provider.describe(), "fetching graph");
    let raw = provider
        .fetch_graph()
        .context("failed to fetch the knowledge graph")?;
    let graph = normalize(&raw);
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        malformed = graph.is_malformed(),
        "fetched graph"
    );
    Ok(graph)
}

impl eframe::App for KnowledgeGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        if let Some(outcome) = self.poll_fetch() {
            self.apply_outcome(outcome);
        }

        let fetching = matches!(self.fetch, FetchState::Fetching { .. });
        let theme_before = self.theme;
        let mut requested = None;

        match &mut self.state {
            AppState::Loading => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading knowledge graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the knowledge graph");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        requested = Some(Job::Refresh);
                    }
                });
            }
            AppState::Ready(model) => {
                requested = model.show(ctx, &mut self.theme, &self.provider_description, fetching);
            }
        }

        if self.theme != theme_before {
            info!(theme = ?self.theme, "switched theme");
            ctx.set_visuals(self.theme.visuals());
        }

        if let Some(job) = requested {
            if matches!(self.state, AppState::Error(_)) {
                self.state = AppState::Loading;
            }
            self.request(ctx, job);
        }
    }
}
