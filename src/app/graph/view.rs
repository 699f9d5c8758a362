use eframe::egui::{self, Align2, FontId, Pos2, Rect, Sense, Shape, Stroke, Ui, Vec2, vec2};

use crate::util::truncate_label;

use super::super::highlight::{EdgeTier, NodeTier};
use super::super::physics::step_layout;
use super::super::render_utils::{
    Theme, border_color, circle_visible, count_text_color, draw_background, edge_visible,
    label_color, with_opacity, world_to_screen,
};
use super::super::{RenderGraph, ViewModel};
use super::interaction::node_at;

const ARROW_LENGTH: f32 = 9.0;
const ARROW_HALF_WIDTH: f32 = 4.0;
const MIN_READABLE_FONT: f32 = 4.0;

fn update_screen_space(rect: Rect, pan: Vec2, zoom: f32, cache: &mut RenderGraph) {
    let scratch = &mut cache.view_scratch;
    scratch.screen_positions.clear();
    scratch.screen_radii.clear();
    for node in &cache.nodes {
        scratch
            .screen_positions
            .push(world_to_screen(rect, pan, zoom, node.world_pos));
        scratch.screen_radii.push(node.radius * zoom);
    }
}

fn text_if_readable(
    painter: &egui::Painter,
    position: Pos2,
    anchor: Align2,
    text: &str,
    size: f32,
    color: egui::Color32,
) {
    if size >= MIN_READABLE_FONT {
        painter.text(position, anchor, text, FontId::proportional(size), color);
    }
}

impl ViewModel {
    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui, theme: Theme) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        self.canvas_size = rect.size();
        self.sync_render_graph();

        let painter = ui.painter_at(rect);
        draw_background(&painter, rect, self.pan, self.zoom, theme);

        if self.session.subgraph().is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No nodes match the current filters.",
                FontId::proportional(15.0),
                theme.muted_text(),
            );
            return;
        }

        self.handle_graph_zoom(ui, rect, &response);
        if let Some(cache) = self.graph_cache.as_mut() {
            update_screen_space(rect, self.pan, self.zoom, cache);
        }
        self.handle_graph_drag(ui, rect, &response);
        self.handle_graph_click(&response);

        let zoom = self.zoom;
        let Some(cache) = self.graph_cache.as_mut() else {
            return;
        };
        if step_layout(cache, &mut self.energy) || self.dragging.is_some() {
            ui.ctx().request_repaint();
        }
        update_screen_space(rect, self.pan, zoom, cache);

        let highlight = self.session.highlight();
        let positions = &cache.view_scratch.screen_positions;
        let radii = &cache.view_scratch.screen_radii;
        let detail = zoom.clamp(0.4, 2.0);

        for edge in &cache.edges {
            let start = positions[edge.from];
            let end = positions[edge.to];
            if !edge_visible(rect, start, end, 4.0) {
                continue;
            }

            let delta = end - start;
            let length = delta.length();
            if length <= radii[edge.from] + radii[edge.to] {
                continue;
            }

            let tier = highlight.edge_tier(edge.id);
            let opacity = tier.opacity();
            let (line_color, width) = match tier {
                EdgeTier::Connected => (theme.text(), 2.0),
                EdgeTier::Normal | EdgeTier::Dimmed => (theme.link(), 1.5),
            };
            let stroke = Stroke::new(width * detail, with_opacity(line_color, opacity));
            let arrow_color = with_opacity(theme.text(), opacity);

            let direction = delta / length;
            let tip = end - direction * radii[edge.to];
            let base = tip - direction * (ARROW_LENGTH * detail);
            painter.line_segment([start + direction * radii[edge.from], base], stroke);

            let normal = vec2(-direction.y, direction.x) * (ARROW_HALF_WIDTH * detail);
            painter.add(Shape::convex_polygon(
                vec![tip, base + normal, base - normal],
                arrow_color,
                Stroke::NONE,
            ));

            text_if_readable(
                &painter,
                start + delta * 0.5,
                Align2::CENTER_BOTTOM,
                &edge.kind,
                10.0 * zoom,
                arrow_color,
            );
        }

        for (index, node) in cache.nodes.iter().enumerate() {
            let position = positions[index];
            let radius = radii[index];
            if !circle_visible(rect, position, radius + 14.0 * zoom) {
                continue;
            }

            let tier = highlight.node_tier(node.id);
            let opacity = tier.opacity();
            let fill = label_color(&node.label);
            painter.circle_filled(position, radius, with_opacity(fill, opacity));

            let outline = match tier {
                NodeTier::Selected => Stroke::new(2.5, theme.selected_outline()),
                NodeTier::Connected => Stroke::new(2.0, border_color(fill)),
                NodeTier::Normal | NodeTier::Dimmed => {
                    Stroke::new(1.5, with_opacity(border_color(fill), opacity))
                }
            };
            painter.circle_stroke(position, radius, outline);

            text_if_readable(
                &painter,
                position,
                Align2::CENTER_CENTER,
                &node.connections.to_string(),
                10.0 * zoom,
                with_opacity(count_text_color(fill), opacity),
            );
            text_if_readable(
                &painter,
                position - vec2(0.0, radius - 8.0 * zoom),
                Align2::CENTER_CENTER,
                &node.label,
                8.0 * zoom,
                with_opacity(theme.muted_text(), opacity),
            );
            text_if_readable(
                &painter,
                position + vec2(0.0, radius + 3.0 * zoom),
                Align2::CENTER_TOP,
                &truncate_label(&node.name),
                10.0 * zoom,
                with_opacity(theme.text(), opacity),
            );
        }

        let hovered = ui
            .input(|input| input.pointer.hover_pos())
            .and_then(|pointer| Some((pointer, node_at(&cache.view_scratch, pointer)?)));
        if let Some((pointer, index)) = hovered {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });

            let node = &cache.nodes[index];
            let galley = painter.layout_no_wrap(
                format!("{} ({})", node.name, node.label),
                FontId::proportional(13.0),
                theme.text(),
            );
            let anchor = pointer + vec2(14.0, 14.0);
            let frame = Rect::from_min_size(anchor, galley.size()).expand(4.0);
            painter.rect_filled(frame, 4.0, ui.visuals().extreme_bg_color);
            painter.galley(anchor, galley, theme.text());
        }
    }
}
