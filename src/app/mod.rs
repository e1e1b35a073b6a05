use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Color32, Context, Pos2, Vec2};
use log::{error, info};

use crate::cluster::Clustering;
use crate::report::{Session, SessionSource, SimilarityGraph, load_session};
use crate::settings::ViewSettings;

mod compare;
mod graph;
mod physics;
mod render_utils;
mod ui;

use compare::CompareView;

type LoadResult = Result<Session, String>;

pub struct SimLensApp {
    source: SessionSource,
    settings: ViewSettings,
    state: AppState,
    reload_rx: Option<Receiver<LoadResult>>,
}

enum AppState {
    Loading { rx: Receiver<LoadResult> },
    Ready(Box<ViewModel>),
    Error(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tab {
    Map,
    Comparison,
}

/// Per-node interaction flags, keyed by submission id and rebuilt each frame
/// from the view model's selection, hover and search state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct NodeUiState {
    pub focused: bool,
    pub hovered: bool,
    pub neighbor: bool,
    pub search_match: bool,
}

struct ViewModel {
    settings: ViewSettings,
    tab: Tab,
    graph: Option<SimilarityGraph>,
    pair_normalized: bool,
    clustering: Clustering,
    cutoff: f32,
    search: String,
    selected: Option<String>,
    hovered: Option<String>,
    pan: Vec2,
    zoom: f32,
    live_physics: bool,
    physics_intensity: f32,
    physics_repulsion: f32,
    physics_spring: f32,
    physics_collision: f32,
    physics_velocity_damping: f32,
    physics_group_pull: f32,
    graph_dirty: bool,
    render_graph_revision: u64,
    graph_cache: Option<RenderGraph>,
    search_match_cache: Option<SearchMatchCache>,
    visible_node_count: usize,
    visible_edge_count: usize,
    node_ui: HashMap<String, NodeUiState>,
    compare: Option<CompareView>,
}

struct SearchMatchCache {
    query: String,
    graph_revision: u64,
    matches: Arc<HashSet<String>>,
}

struct RenderGraph {
    nodes: Vec<RenderNode>,
    edges: Vec<RenderEdge>,
    index_by_id: HashMap<String, usize>,
    physics_scratch: PhysicsScratch,
    view_scratch: ViewScratch,
}

#[derive(Default)]
struct PhysicsScratch {
    forces: Vec<Vec2>,
    positions: Vec<Vec2>,
    radii: Vec<f32>,
    group_sums: Vec<(Vec2, usize)>,
}

#[derive(Default)]
struct ViewScratch {
    screen_positions: Vec<Pos2>,
    screen_radii: Vec<f32>,
    visible_indices: Vec<usize>,
    visible_mask: Vec<bool>,
    draw_order: Vec<usize>,
}

struct RenderNode {
    id: String,
    world_pos: Vec2,
    velocity: Vec2,
    base_radius: f32,
    group: Option<usize>,
    color: Color32,
    is_archive: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct RenderEdge {
    source: usize,
    target: usize,
    value: f32,
    synthetic: bool,
}

#[derive(Clone, Copy)]
struct PhysicsConfig {
    intensity: f32,
    repulsion_scale: f32,
    spring_scale: f32,
    collision_scale: f32,
    velocity_damping: f32,
    group_pull: f32,
    delta_seconds: f32,
}

impl SimLensApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        source: SessionSource,
        settings: ViewSettings,
    ) -> Self {
        let state = Self::start_load(source.clone());
        Self {
            source,
            settings,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(source: SessionSource) -> Receiver<LoadResult> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            info!("loading session ({})", source.describe());
            let result = load_session(&source).map_err(|err| {
                error!("session load failed: {err:#}");
                format!("{err:#}")
            });
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(source: SessionSource) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(source),
        }
    }

    fn ready(&self, session: Session) -> AppState {
        AppState::Ready(Box::new(ViewModel::new(session, self.settings.clone())))
    }
}

impl eframe::App for SimLensApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;
        let mut retry = false;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => transition = Some(result),
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(Err("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading comparator output...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load comparator output");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    retry = ui.button("Retry").clicked();
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &self.source, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.source.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => transition = Some(result),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(Err("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if retry {
            self.state = Self::start_load(self.source.clone());
            return;
        }

        if let Some(result) = transition {
            self.reload_rx = None;
            self.state = match result {
                Ok(session) => self.ready(session),
                Err(error) => AppState::Error(error),
            };
        }
    }
}
