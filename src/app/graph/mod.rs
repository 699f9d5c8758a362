mod build;
mod interaction;
mod view;

pub(in crate::app) use build::{DEFAULT_CANVAS_SIZE, build_render_graph};
