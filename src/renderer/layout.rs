//! Layout computation — maps (seconds, semitones) into SVG coordinates.

use crate::config::RenderOptions;
use crate::model::*;
use super::constants::*;

/// Data window and scale of a piano roll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct RollLayout {
    pub(super) time_end: f64,
    pub(super) pitch_min: f64,
    pub(super) pitch_max: f64,
    /// Pixels per second
    pub(super) scale_x: f64,
    /// Pixels per semitone
    pub(super) scale_y: f64,
}

impl RollLayout {
    /// Fit the window around `units`. Returns `None` when no unit carries a
    /// known pitch, since then there is nothing to place vertically.
    pub(super) fn compute(units: &[VisualizeUnit], options: &RenderOptions) -> Option<Self> {
        let (lowest, highest) = units
            .iter()
            .filter_map(|u| u.midi_pitch)
            .fold(None, |acc: Option<(i32, i32)>, p| match acc {
                None => Some((p, p)),
                Some((lo, hi)) => Some((lo.min(p), hi.max(p))),
            })?;

        let last_end = units.iter().map(VisualizeUnit::end).fold(0.0_f64, f64::max);
        let time_end = last_end + TIME_PADDING_SECONDS;
        let scale_x = options.canvas_width() / time_end;
        let aspect = if options.aspect > 0.0 {
            options.aspect
        } else {
            RenderOptions::DEFAULT_ASPECT
        };

        Some(Self {
            time_end,
            pitch_min: f64::from(lowest) - PITCH_PADDING_SEMITONES,
            pitch_max: f64::from(highest) + PITCH_PADDING_SEMITONES,
            scale_x,
            scale_y: scale_x * aspect,
        })
    }

    pub(super) fn width(&self) -> f64 {
        self.time_end * self.scale_x
    }

    pub(super) fn height(&self) -> f64 {
        (self.pitch_max - self.pitch_min) * self.scale_y
    }

    pub(super) fn x(&self, seconds: f64) -> f64 {
        seconds * self.scale_x
    }

    /// SVG y grows downwards, pitch grows upwards.
    pub(super) fn y(&self, semitones: f64) -> f64 {
        (self.pitch_max - semitones) * self.scale_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(offset: f64, duration: f64, pitch: Option<i32>) -> VisualizeUnit {
        VisualizeUnit {
            text_lyric: String::new(),
            text_phoneme: String::new(),
            offset,
            duration,
            midi_pitch: pitch,
            category: PhonemeCategory::Body,
        }
    }

    #[test]
    fn window_pads_time_and_pitch() {
        let units = vec![unit(0.0, 1.0, Some(60)), unit(1.0, 2.0, Some(64)), unit(3.0, 1.0, None)];
        let options = RenderOptions {
            width: 10,
            dpi: 10,
            aspect: 0.5,
            ..RenderOptions::default()
        };
        let layout = RollLayout::compute(&units, &options).expect("has pitches");
        assert_eq!(layout.time_end, 5.0);
        assert_eq!(layout.pitch_min, 59.0);
        assert_eq!(layout.pitch_max, 65.0);
        assert_eq!(layout.scale_x, 20.0);
        assert_eq!(layout.scale_y, 10.0);
        assert_eq!(layout.width(), 100.0);
        assert_eq!(layout.height(), 60.0);
        assert_eq!(layout.y(65.0), 0.0);
        assert_eq!(layout.x(2.5), 50.0);
    }

    #[test]
    fn no_known_pitch_means_no_layout() {
        let units = vec![unit(0.0, 1.0, None)];
        assert!(RollLayout::compute(&units, &RenderOptions::default()).is_none());
    }
}
