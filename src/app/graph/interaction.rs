use eframe::egui::{self, Pos2, Rect, Ui};
use tracing::debug;

use crate::graph::NodeId;

use super::super::render_utils::screen_to_world;
use super::super::{ViewModel, ViewScratch};

const MIN_ZOOM: f32 = 0.05;
const MAX_ZOOM: f32 = 10.0;

/// Topmost node under `pointer`. Later nodes are drawn over earlier ones.
pub(in crate::app) fn node_at(scratch: &ViewScratch, pointer: Pos2) -> Option<usize> {
    (0..scratch.screen_positions.len()).rev().find(|&index| {
        scratch.screen_positions[index].distance(pointer) <= scratch.screen_radii[index]
    })
}

impl ViewModel {
    /// Zooms about the pointer so the world point under it stays put.
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = screen_to_world(rect, self.pan, self.zoom, pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan = pointer - rect.center() - (world_before * self.zoom);
    }

    /// Primary drag on a node pins it under the pointer; anywhere else it
    /// pans, as do the secondary and middle buttons.
    pub(in crate::app) fn handle_graph_drag(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        let Some(cache) = self.graph_cache.as_mut() else {
            return;
        };

        if response.drag_started_by(egui::PointerButton::Primary) {
            let origin = ui.input(|input| input.pointer.press_origin());
            if let Some(index) = origin.and_then(|origin| node_at(&cache.view_scratch, origin)) {
                let node = &mut cache.nodes[index];
                node.pinned = Some(node.world_pos);
                self.dragging = Some(index);
                self.energy.begin_drag();
                debug!(node = node.id, "drag started");
            }
        }

        if response.dragged_by(egui::PointerButton::Primary) {
            match self.dragging {
                Some(index) => {
                    if let (Some(pointer), Some(node)) =
                        (response.interact_pointer_pos(), cache.nodes.get_mut(index))
                    {
                        let world = screen_to_world(rect, self.pan, self.zoom, pointer);
                        node.pinned = Some(world);
                        node.world_pos = world;
                    }
                }
                None => self.pan += response.drag_delta(),
            }
        } else if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.pan += response.drag_delta();
        }

        if response.drag_stopped()
            && let Some(index) = self.dragging.take()
        {
            if let Some(node) = cache.nodes.get_mut(index) {
                node.pinned = None;
            }
            self.energy.end_drag();
        }
    }

    /// Click on a node selects it; click on the background clears.
    pub(in crate::app) fn handle_graph_click(&mut self, response: &egui::Response) {
        if !response.clicked_by(egui::PointerButton::Primary) {
            return;
        }

        let clicked = self.graph_cache.as_ref().and_then(|cache| {
            response
                .interact_pointer_pos()
                .and_then(|pointer| node_at(&cache.view_scratch, pointer))
                .map(|index| cache.nodes[index].id)
        });
        match clicked {
            Some(node_id) => self.session.select(node_id),
            None => self.session.clear_selection(),
        }
    }

    /// Selects the node and moves the view so it sits in the middle of the
    /// canvas.
    pub(in crate::app) fn focus_node(&mut self, node_id: NodeId) {
        self.session.select(node_id);
        let position = self.graph_cache.as_ref().and_then(|cache| {
            let index = cache.index_by_id.get(&node_id)?;
            cache.nodes.get(*index).map(|node| node.world_pos)
        });
        if let Some(position) = position {
            self.pan = -(position * self.zoom);
        }
    }
}
