//! SVG builder — collects piano-roll elements by layer and produces the
//! final string.
//!
//! Elements only carry what differs between them (position, box fill, label
//! text). Shared presentation lives on one `<g>` per layer, so the pitch
//! curve always sits behind the boxes and the labels on top.

use std::fmt::Write;

// ═══════════════════════════════════════════════════════════════════════
// Layer styles
// ═══════════════════════════════════════════════════════════════════════

/// Presentation shared by every element of a layer.
pub(super) struct RollStyle<'a> {
    pub(super) curve_color: &'a str,
    pub(super) curve_width: f64,
    pub(super) edge_color: &'a str,
    pub(super) edge_width: f64,
    pub(super) font_px: f64,
    pub(super) font_style: &'a str,
    pub(super) text_color: &'a str,
}

// ═══════════════════════════════════════════════════════════════════════
// SvgBuilder
// ═══════════════════════════════════════════════════════════════════════

pub(super) struct SvgBuilder {
    width: f64,
    height: f64,
    font_family: String,
    pub(super) curves: Vec<String>,
    pub(super) boxes: Vec<String>,
    pub(super) labels: Vec<String>,
}

impl SvgBuilder {
    pub(super) fn new(width: f64, height: f64, font_family: &str) -> Self {
        Self {
            width,
            height,
            font_family: font_family.to_string(),
            curves: Vec::new(),
            boxes: Vec::new(),
            labels: Vec::new(),
        }
    }

    /// Open polyline through `points`; fewer than two points draw nothing.
    pub(super) fn curve(&mut self, points: &[(f64, f64)]) {
        if points.len() < 2 {
            return;
        }
        let mut coords = String::with_capacity(points.len() * 12);
        for (i, (x, y)) in points.iter().enumerate() {
            if i > 0 {
                coords.push(' ');
            }
            let _ = write!(coords, "{x:.1},{y:.1}");
        }
        self.curves.push(format!(r#"<polyline points="{coords}"/>"#));
    }

    /// A note box whose top-left corner is `(x, y)`.
    pub(super) fn note_box(&mut self, x: f64, y: f64, w: f64, h: f64, fill: &str) {
        self.boxes.push(format!(
            r#"<rect x="{x:.1}" y="{y:.1}" width="{w:.1}" height="{h:.1}" fill="{fill}"/>"#
        ));
    }

    /// A text label with its baseline at `y`.
    pub(super) fn label(&mut self, x: f64, y: f64, content: &str, anchor: &str) {
        self.labels.push(format!(
            r#"<text x="{x:.1}" y="{y:.1}" text-anchor="{anchor}">{}</text>"#,
            escape(content)
        ));
    }

    pub(super) fn build(self, style: &RollStyle) -> String {
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w:.1} {h:.1}" width="{w:.1}" height="{h:.1}" style="font-family: {};">"#,
            escape(&self.font_family),
            w = self.width,
            h = self.height,
        );
        svg.push('\n');

        push_layer(
            &mut svg,
            &format!(
                r#"<g class="f0" fill="none" stroke="{}" stroke-width="{:.1}" stroke-linejoin="round">"#,
                style.curve_color, style.curve_width
            ),
            &self.curves,
        );
        push_layer(
            &mut svg,
            &format!(
                r#"<g class="notes" stroke="{}" stroke-width="{:.1}">"#,
                style.edge_color, style.edge_width
            ),
            &self.boxes,
        );
        push_layer(
            &mut svg,
            &format!(
                r#"<g class="labels" font-size="{:.1}" font-style="{}" fill="{}">"#,
                style.font_px,
                escape(style.font_style),
                style.text_color
            ),
            &self.labels,
        );

        svg.push_str("</svg>\n");
        svg
    }
}

/// Append one layer group; empty layers are left out.
fn push_layer(svg: &mut String, open_tag: &str, elements: &[String]) {
    if elements.is_empty() {
        return;
    }
    svg.push_str("  ");
    svg.push_str(open_tag);
    svg.push('\n');
    for el in elements {
        svg.push_str("    ");
        svg.push_str(el);
        svg.push('\n');
    }
    svg.push_str("  </g>\n");
}

fn escape(content: &str) -> String {
    content
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// ═══════════════════════════════════════════════════════════════════════
// Empty SVG fallback
// ═══════════════════════════════════════════════════════════════════════

pub(super) fn empty_svg(message: &str) -> String {
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 400 100\">\
         <text x=\"200\" y=\"50\" text-anchor=\"middle\" font-size=\"14\" fill=\"gray\">{}</text>\
         </svg>",
        escape(message)
    )
}
