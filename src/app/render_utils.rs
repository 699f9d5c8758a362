use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2, Visuals};

const MIN_NODE_RADIUS: f32 = 10.0;
const MAX_NODE_RADIUS: f32 = 25.0;

const UNKNOWN_LABEL_COLOR: Color32 = Color32::from_rgb(0x75, 0x75, 0x75);

/// Light/dark flag. Only recolors; the layout never reads it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub(in crate::app) fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub(in crate::app) fn visuals(self) -> Visuals {
        match self {
            Self::Light => Visuals::light(),
            Self::Dark => Visuals::dark(),
        }
    }

    /// Node names, edge labels and arrowheads.
    pub(in crate::app) fn text(self) -> Color32 {
        match self {
            Self::Light => Color32::from_rgb(0x0A, 0x0A, 0x0A),
            Self::Dark => Color32::WHITE,
        }
    }

    pub(in crate::app) fn muted_text(self) -> Color32 {
        match self {
            Self::Light => Color32::from_rgb(0x70, 0x70, 0x70),
            Self::Dark => Color32::from_rgb(0xA0, 0xA0, 0xA0),
        }
    }

    pub(in crate::app) fn link(self) -> Color32 {
        match self {
            Self::Light => Color32::from_rgb(0xC0, 0xC0, 0xC0),
            Self::Dark => Color32::from_rgb(0x60, 0x60, 0x60),
        }
    }

    pub(in crate::app) fn selected_outline(self) -> Color32 {
        match self {
            Self::Light => Color32::BLACK,
            Self::Dark => Color32::WHITE,
        }
    }

    fn canvas(self) -> Color32 {
        match self {
            Self::Light => Color32::from_rgb(248, 248, 250),
            Self::Dark => Color32::from_rgb(19, 23, 29),
        }
    }

    fn grid(self) -> Color32 {
        match self {
            Self::Light => Color32::from_rgba_unmultiplied(170, 176, 186, 60),
            Self::Dark => Color32::from_rgba_unmultiplied(60, 70, 80, 70),
        }
    }
}

/// Fill color per node label; unknown labels share one gray.
pub(in crate::app) fn label_color(label: &str) -> Color32 {
    match label {
        "Risco" => Color32::from_rgb(0xF4, 0x43, 0x36),
        "PlanoDeAcao" => Color32::from_rgb(0x4C, 0xAF, 0x50),
        "Acao" => Color32::from_rgb(0x21, 0x96, 0xF3),
        "Estrategia" => Color32::from_rgb(0xFF, 0xC1, 0x07),
        "Visao" => Color32::from_rgb(0x9C, 0x27, 0xB0),
        "Missao" => Color32::from_rgb(0x67, 0x3A, 0xB7),
        "Oportunidade" => Color32::from_rgb(0xFF, 0x98, 0x00),
        "Departamento" => Color32::from_rgb(0x00, 0x96, 0x88),
        "Projeto" => Color32::from_rgb(0x3F, 0x51, 0xB5),
        "Objetivo" => Color32::from_rgb(0xE9, 0x1E, 0x63),
        "KPI" => Color32::from_rgb(0x79, 0x55, 0x48),
        "Stakeholder" => Color32::from_rgb(0xBD, 0xBD, 0xBD),
        "Tecnologia" => Color32::from_rgb(0x00, 0xBC, 0xD4),
        "Produto" => Color32::from_rgb(0x8B, 0xC3, 0x4A),
        "Mercado" => Color32::from_rgb(0xFF, 0xEB, 0x3B),
        "Competidor" => Color32::from_rgb(0xFF, 0x57, 0x22),
        _ => UNKNOWN_LABEL_COLOR,
    }
}

/// Outline drawn around a node: its fill, darkened.
pub(in crate::app) fn border_color(fill: Color32) -> Color32 {
    let factor = 0.7_f32.powf(0.7);
    Color32::from_rgb(
        (fill.r() as f32 * factor) as u8,
        (fill.g() as f32 * factor) as u8,
        (fill.b() as f32 * factor) as u8,
    )
}

fn hsl_lightness(color: Color32) -> f32 {
    let max = color.r().max(color.g()).max(color.b()) as f32;
    let min = color.r().min(color.g()).min(color.b()) as f32;
    (max + min) / (2.0 * 255.0)
}

/// Black on light fills, white on dark ones.
pub(in crate::app) fn count_text_color(fill: Color32) -> Color32 {
    if hsl_lightness(fill) > 0.55 {
        Color32::BLACK
    } else {
        Color32::WHITE
    }
}

pub(in crate::app) fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    color.gamma_multiply(opacity.clamp(0.0, 1.0))
}

pub(in crate::app) fn draw_background(
    painter: &Painter,
    rect: Rect,
    pan: Vec2,
    zoom: f32,
    theme: Theme,
) {
    painter.rect_filled(rect, 0.0, theme.canvas());

    let step = (56.0 * zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + pan;
    let stroke = Stroke::new(1.0, theme.grid());

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(in crate::app) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(in crate::app) fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let min_x = start.x.min(end.x) - padding;
    let max_x = start.x.max(end.x) + padding;
    let min_y = start.y.min(end.y) - padding;
    let max_y = start.y.max(end.y) + padding;

    if max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom() {
        return false;
    }

    if rect.contains(start) || rect.contains(end) {
        return true;
    }

    let top_left = rect.left_top();
    let top_right = rect.right_top();
    let bottom_left = rect.left_bottom();
    let bottom_right = rect.right_bottom();

    segments_intersect(start, end, top_left, top_right)
        || segments_intersect(start, end, top_right, bottom_right)
        || segments_intersect(start, end, bottom_right, bottom_left)
        || segments_intersect(start, end, bottom_left, top_left)
}

fn segments_intersect(a1: Pos2, a2: Pos2, b1: Pos2, b2: Pos2) -> bool {
    fn cross(o: Pos2, a: Pos2, b: Pos2) -> f32 {
        let oa = a - o;
        let ob = b - o;
        (oa.x * ob.y) - (oa.y * ob.x)
    }

    let c1 = cross(a1, a2, b1);
    let c2 = cross(a1, a2, b2);
    let c3 = cross(b1, b2, a1);
    let c4 = cross(b1, b2, a2);

    (c1 <= 0.0 && c2 >= 0.0 || c1 >= 0.0 && c2 <= 0.0)
        && (c3 <= 0.0 && c4 >= 0.0 || c3 >= 0.0 && c4 <= 0.0)
}

/// World origin sits at the middle of the canvas before panning.
pub(in crate::app) fn world_to_screen(rect: Rect, pan: Vec2, zoom: f32, world: Vec2) -> Pos2 {
    rect.center() + pan + world * zoom
}

pub(in crate::app) fn screen_to_world(rect: Rect, pan: Vec2, zoom: f32, screen: Pos2) -> Vec2 {
    (screen - rect.center() - pan) / zoom
}

/// Linear in the visible connection count, from 10 at zero to 25 at the
/// busiest node. With no edges at all every node gets the minimum.
pub(in crate::app) fn node_radius(connections: usize, max_connections: usize) -> f32 {
    if max_connections == 0 {
        return MIN_NODE_RADIUS;
    }
    let fraction = (connections.min(max_connections) as f32) / (max_connections as f32);
    MIN_NODE_RADIUS + fraction * (MAX_NODE_RADIUS - MIN_NODE_RADIUS)
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use super::*;

    #[test]
    fn radius_grows_with_connections() {
        assert_eq!(node_radius(0, 0), MIN_NODE_RADIUS);
        assert_eq!(node_radius(3, 0), MIN_NODE_RADIUS);
        assert_eq!(node_radius(0, 8), MIN_NODE_RADIUS);
        assert_eq!(node_radius(8, 8), MAX_NODE_RADIUS);

        for max in 1..12 {
            for count in 0..max {
                assert!(node_radius(count, max) <= node_radius(count + 1, max));
            }
        }
    }

    #[test]
    fn unknown_labels_fall_back_to_gray() {
        assert_eq!(label_color("Risco"), Color32::from_rgb(0xF4, 0x43, 0x36));
        assert_eq!(label_color("Misterio"), UNKNOWN_LABEL_COLOR);
        assert_eq!(label_color(""), UNKNOWN_LABEL_COLOR);
    }

    #[test]
    fn count_text_contrasts_with_the_fill() {
        assert_eq!(count_text_color(label_color("Mercado")), Color32::BLACK);
        assert_eq!(count_text_color(label_color("Stakeholder")), Color32::BLACK);
        assert_eq!(count_text_color(label_color("Missao")), Color32::WHITE);
        assert_eq!(count_text_color(UNKNOWN_LABEL_COLOR), Color32::WHITE);
    }

    #[test]
    fn screen_and_world_transforms_agree() {
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(800.0, 600.0));
        let pan = vec2(35.0, -12.0);
        let world = vec2(-140.0, 75.0);
        let screen = world_to_screen(rect, pan, 0.85, world);
        let back = screen_to_world(rect, pan, 0.85, screen);
        assert!((back - world).length() < 1.0e-3);
        assert_eq!(world_to_screen(rect, Vec2::ZERO, 2.0, Vec2::ZERO), rect.center());
    }

    #[test]
    fn edges_crossing_the_view_are_kept() {
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(100.0, 100.0));
        assert!(edge_visible(rect, pos2(-50.0, 50.0), pos2(150.0, 50.0), 0.0));
        assert!(!edge_visible(rect, pos2(-50.0, -50.0), pos2(-10.0, -40.0), 0.0));
    }

    #[test]
    fn theme_toggles_between_the_two_palettes() {
        assert_eq!(Theme::default(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_ne!(Theme::Light.text(), Theme::Dark.text());
    }
}
