//! Piano-roll renderer — draws the expanded unit timeline of a track as SVG.
//!
//! Each BODY/HEAD unit becomes a one-semitone-high box at its pitch, with the
//! phoneme written under it and the lyric above it. SP/AP units and units
//! whose pitch stayed unknown after backfilling are not drawn. The f0 curve
//! of every segment can be drawn behind the boxes.

mod constants;
mod layout;
mod svg_builder;

use crate::config::RenderOptions;
use crate::expander::expand_track;
use crate::model::*;
use crate::pitch::f0_to_semitone;
use constants::*;
use layout::RollLayout;
use svg_builder::{empty_svg, RollStyle, SvgBuilder};

// ═══════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════

/// Expand a track and render it into a complete SVG string.
pub fn render_track_to_svg(track: &Track, options: &RenderOptions) -> String {
    let units = expand_track(track);
    render_units_to_svg(&units, &track.segments, options)
}

/// Render an already expanded unit timeline. `segments` supply the pitch
/// curves; pass an empty slice to draw the boxes only.
pub fn render_units_to_svg(
    units: &[VisualizeUnit],
    segments: &[Segment],
    options: &RenderOptions,
) -> String {
    let Some(layout) = RollLayout::compute(units, options) else {
        return empty_svg("No pitched notes to render");
    };

    let mut svg = SvgBuilder::new(layout.width(), layout.height(), &options.font_family);

    if options.display_f0 {
        for segment in segments {
            render_pitch_curve(&mut svg, &layout, segment);
        }
    }

    for unit in units {
        if unit.category.is_breath_or_silence() {
            continue;
        }
        let Some(pitch) = unit.midi_pitch else {
            continue;
        };
        let pitch = f64::from(pitch);
        let fill = if unit.category == PhonemeCategory::Body {
            &options.color_body
        } else {
            &options.color_head
        };

        svg.note_box(
            layout.x(unit.offset),
            layout.y(pitch + NOTE_HEIGHT_SEMITONES / 2.0),
            unit.duration * layout.scale_x,
            NOTE_HEIGHT_SEMITONES * layout.scale_y,
            fill,
        );
        svg.label(
            layout.x(unit.offset + unit.duration / 2.0),
            layout.y(pitch - PHONEME_DROP_SEMITONES),
            &unit.text_phoneme,
            "middle",
        );
        if !unit.text_lyric.is_empty() {
            svg.label(
                layout.x(unit.offset + LYRIC_X_NUDGE_SECONDS),
                layout.y(pitch + LYRIC_RAISE_SEMITONES),
                &unit.text_lyric,
                "start",
            );
        }
    }

    svg.build(&RollStyle {
        curve_color: &options.color_f0,
        curve_width: F0_LINE_WIDTH,
        edge_color: NOTE_EDGE_COLOR,
        edge_width: NOTE_EDGE_WIDTH,
        font_px: options.font_size * f64::from(options.dpi.max(1)) / POINTS_PER_INCH,
        font_style: &options.font_style,
        text_color: &options.color_text,
    })
}

/// Draw one segment's f0 curve. Unvoiced (non-positive) samples split the
/// curve into separate polylines.
fn render_pitch_curve(svg: &mut SvgBuilder, layout: &RollLayout, segment: &Segment) {
    let curve = &segment.pitch_curve;
    let times = curve.sample_times(segment.offset);
    let mut run: Vec<(f64, f64)> = Vec::new();

    for (&hz, &t) in curve.f0.iter().zip(&times) {
        if hz > 0.0 {
            run.push((layout.x(t), layout.y(f0_to_semitone(hz))));
        } else {
            svg.curve(&run);
            run.clear();
        }
    }
    svg.curve(&run);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(category: PhonemeCategory, pitch: Option<i32>, lyric: &str) -> VisualizeUnit {
        VisualizeUnit {
            text_lyric: lyric.to_string(),
            text_phoneme: "a".to_string(),
            offset: 0.0,
            duration: 0.5,
            midi_pitch: pitch,
            category,
        }
    }

    #[test]
    fn breath_and_unpitched_units_are_not_drawn() {
        let units = vec![
            unit(PhonemeCategory::Body, Some(60), "la"),
            unit(PhonemeCategory::Head, Some(62), ""),
            unit(PhonemeCategory::Sp, Some(60), ""),
            unit(PhonemeCategory::Body, None, "li"),
        ];
        let svg = render_units_to_svg(&units, &[], &RenderOptions::default());
        assert_eq!(svg.matches("<rect").count(), 2);
        assert!(svg.contains("#d34343"));
        assert!(svg.contains("#8c2128"));
        assert!(svg.contains(">la</text>"));
        assert!(!svg.contains(">li</text>"));
    }

    #[test]
    fn unvoiced_samples_break_the_curve() {
        let segment = Segment {
            offset: 0.0,
            notes: Vec::new(),
            pitch_curve: PitchCurve {
                f0: vec![440.0, 441.0, 0.0, 442.0, 443.0, 444.0],
                timestep: 0.1,
            },
        };
        let units = vec![unit(PhonemeCategory::Body, Some(69), "la")];
        let svg = render_units_to_svg(&units, std::slice::from_ref(&segment), &RenderOptions::default());
        assert_eq!(svg.matches("<polyline").count(), 2);

        let hidden = RenderOptions {
            display_f0: false,
            ..RenderOptions::default()
        };
        let svg = render_units_to_svg(&units, &[segment], &hidden);
        assert_eq!(svg.matches("<polyline").count(), 0);
    }

    #[test]
    fn empty_timeline_renders_placeholder() {
        let svg = render_units_to_svg(&[], &[], &RenderOptions::default());
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("No pitched notes"));
    }
}
