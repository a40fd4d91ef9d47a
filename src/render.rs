//! Draws a laid-out network to an SVG file.

use std::path::Path;

use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::error::{NetworkError, Result};
use crate::graph::{CooccurrenceGraph, VisualAttributes};

const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);
const EDGE_GRAY: RGBColor = RGBColor(128, 128, 128);
const MARGIN: f64 = 0.08;

/// Static drawing options.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub title: String,
    /// Square canvas edge in pixels
    pub size: u32,
    pub label_font_size: f64,
    pub title_font_size: f64,
}

impl RenderOptions {
    pub fn new(title: impl Into<String>, size: u32) -> Self {
        Self {
            title: title.into(),
            size,
            label_font_size: 10.0,
            title_font_size: 16.0,
        }
    }
}

/// Map a layout coordinate in `[-1, 1]` onto the canvas.
fn to_pixel(value: f64, size: u32) -> i32 {
    let size = f64::from(size);
    let margin = size * MARGIN;
    (margin + (value + 1.0) / 2.0 * (size - 2.0 * margin)).round() as i32
}

/// Marker radius for a node size given as an area, the way scatter plots
/// interpret marker sizes.
fn node_radius(size: f64) -> u32 {
    (size.max(1.0).sqrt() / 2.0).round().max(2.0) as u32
}

fn stroke(width: f64) -> u32 {
    width.round().max(1.0) as u32
}

/// Draw edges (gray, width by weight), nodes (sky blue, area by weighted
/// degree) and labels, then save to `path`.
pub fn render_network(
    graph: &CooccurrenceGraph,
    positions: &[(f64, f64)],
    attrs: &VisualAttributes,
    options: &RenderOptions,
    path: &Path,
) -> Result<()> {
    let render_err = |e: &dyn std::fmt::Display| NetworkError::Render(e.to_string());
    let size = options.size;
    let pixel: Vec<(i32, i32)> = positions
        .iter()
        .map(|&(x, y)| (to_pixel(x, size), to_pixel(-y, size)))
        .collect();

    let root = SVGBackend::new(path, (size, size)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| render_err(&e))?;

    for ((s, t), width) in graph.edge_endpoints().zip(&attrs.edge_widths) {
        let style = ShapeStyle {
            color: EDGE_GRAY.mix(0.6),
            filled: false,
            stroke_width: stroke(*width),
        };
        root.draw(&PathElement::new(vec![pixel[s], pixel[t]], style))
            .map_err(|e| render_err(&e))?;
    }

    for (p, node_size) in pixel.iter().zip(&attrs.node_sizes) {
        root.draw(&Circle::new(*p, node_radius(*node_size), SKY_BLUE.mix(0.8).filled()))
            .map_err(|e| render_err(&e))?;
    }

    let centered = Pos::new(HPos::Center, VPos::Center);
    let label_style = TextStyle::from(("sans-serif", options.label_font_size).into_font())
        .pos(centered);
    for (p, lemma) in pixel.iter().zip(graph.nodes()) {
        root.draw(&Text::new(lemma.to_string(), *p, label_style.clone()))
            .map_err(|e| render_err(&e))?;
    }

    let title_style = TextStyle::from(("sans-serif", options.title_font_size).into_font())
        .pos(Pos::new(HPos::Center, VPos::Top));
    let title_y = (f64::from(size) * MARGIN / 3.0).round() as i32;
    root.draw(&Text::new(
        options.title.clone(),
        (size as i32 / 2, title_y),
        title_style,
    ))
    .map_err(|e| render_err(&e))?;

    root.present().map_err(|e| render_err(&e))?;
    Ok(())
}
