//! Data model for a parsed DiffSinger project.
//!
//! A [`Track`] holds one [`Segment`] per input record. Each segment owns its
//! notes, each non-slur note owns the phonemes it introduces, and the
//! expander turns all of it into a flat list of [`VisualizeUnit`]s.

use serde::{Deserialize, Deserializer, Serialize};

use crate::numeric::FixedSum;
use crate::pitch::f0_to_semitone;

/// Structural role of a phoneme inside its phoneme group.
///
/// The classification is positional: the last token of a multi-phoneme group
/// is `Head`, every other token is `Body`, and the literal tokens `SP` and
/// `AP` get their own categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhonemeCategory {
    Body,
    Head,
    /// Silence
    Sp,
    /// Aspiration
    Ap,
}

impl PhonemeCategory {
    /// SP and AP units are neither drawn nor used as pitch sources.
    pub fn is_breath_or_silence(self) -> bool {
        matches!(self, PhonemeCategory::Sp | PhonemeCategory::Ap)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phoneme {
    pub name: String,
    /// Nominal duration in seconds
    pub duration: f64,
    pub category: PhonemeCategory,
}

/// A note of the score. Slur continuations own no phonemes; they borrow the
/// phoneme group of the nearest preceding non-slur note when expanded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Lyric token, or the slur placeholder for continuation notes
    pub text: String,
    pub phonemes: Vec<Phoneme>,
    /// Duration in seconds
    pub duration: f64,
    /// Start time in seconds, relative to the segment start
    pub offset: f64,
    /// Semitone number (C4 = 60); `None` for rests and unresolvable names
    pub midi_pitch: Option<i32>,
    pub is_slur: bool,
}

/// Sampled f0 curve of a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitchCurve {
    /// Frequencies in Hz; zero marks unvoiced frames
    pub f0: Vec<f64>,
    /// Seconds between samples
    pub timestep: f64,
}

impl PitchCurve {
    /// Semitone value of every sample. Non-positive samples come out as
    /// `-inf`/`NaN` and should be skipped by the caller.
    pub fn semitones(&self) -> Vec<f64> {
        self.f0.iter().map(|&hz| f0_to_semitone(hz)).collect()
    }

    /// Absolute time of every sample; the first sample sits one timestep
    /// after `origin`.
    pub fn sample_times(&self, origin: f64) -> Vec<f64> {
        let mut clock = FixedSum::starting_at(origin);
        self.f0
            .iter()
            .map(|_| {
                clock.add(self.timestep);
                clock.value()
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start time of the segment in seconds
    pub offset: f64,
    pub notes: Vec<Note>,
    pub pitch_curve: PitchCurve,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub segments: Vec<Segment>,
    /// Free-form attributes; not interpreted
    pub attributes: String,
}

impl Track {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self {
            segments,
            attributes: String::new(),
        }
    }

    pub fn note_count(&self) -> usize {
        self.segments.iter().map(|s| s.notes.len()).sum()
    }
}

/// One drawable interval: a phoneme sung on a note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizeUnit {
    /// Lyric shown for this interval; empty for SP/AP and HEAD units
    pub text_lyric: String,
    pub text_phoneme: String,
    /// Absolute start time in seconds
    pub offset: f64,
    /// Duration in seconds
    pub duration: f64,
    pub midi_pitch: Option<i32>,
    pub category: PhonemeCategory,
}

impl VisualizeUnit {
    pub fn end(&self) -> f64 {
        self.offset + self.duration
    }
}

// ─── Input records ───────────────────────────────────────────────────

/// One record of a `.ds` project file, as found on disk.
///
/// Array-like fields are whitespace-separated token strings. Scalars may be
/// written either as JSON numbers or as numeric strings. Keys not listed here
/// are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSegment {
    #[serde(default, deserialize_with = "number_or_string")]
    pub offset: f64,
    #[serde(default)]
    pub f0_seq: String,
    #[serde(default = "default_f0_timestep", deserialize_with = "number_or_string")]
    pub f0_timestep: f64,
    pub text: String,
    pub ph_seq: String,
    pub ph_dur: String,
    pub ph_num: String,
    pub note_seq: String,
    pub note_dur: String,
    pub note_slur: String,
}

fn default_f0_timestep() -> f64 {
    0.05
}

fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        Text(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid number '{s}': {e}"))),
    }
}

/// A project file holds either a single record or a list of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawProject {
    Many(Vec<RawSegment>),
    One(RawSegment),
}

impl RawProject {
    pub(crate) fn into_records(self) -> Vec<RawSegment> {
        match self {
            RawProject::Many(records) => records,
            RawProject::One(record) => vec![record],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_segment_accepts_string_and_number_scalars() {
        let json = r#"{
            "offset": "1.5",
            "f0_timestep": 0.005,
            "text": "SP la",
            "ph_seq": "SP l a",
            "ph_dur": "0.1 0.05 0.3",
            "ph_num": "1 2",
            "note_seq": "rest C4",
            "note_dur": "0.1 0.35",
            "note_slur": "0 0",
            "gender": "0 0 0"
        }"#;
        let raw: RawSegment = serde_json::from_str(json).expect("valid record");
        assert_eq!(raw.offset, 1.5);
        assert_eq!(raw.f0_timestep, 0.005);
        assert_eq!(raw.f0_seq, "");
    }

    #[test]
    fn raw_segment_offset_defaults_to_zero() {
        let json = r#"{
            "text": "la", "ph_seq": "a", "ph_dur": "0.2", "ph_num": "1",
            "note_seq": "C4", "note_dur": "0.2", "note_slur": "0",
            "f0_seq": "440 440", "f0_timestep": "0.1"
        }"#;
        let raw: RawSegment = serde_json::from_str(json).expect("valid record");
        assert_eq!(raw.offset, 0.0);
        assert_eq!(raw.f0_timestep, 0.1);
    }

    #[test]
    fn project_accepts_object_or_array() {
        let one = r#"{"text": "", "ph_seq": "", "ph_dur": "", "ph_num": "",
                      "note_seq": "", "note_dur": "", "note_slur": ""}"#;
        let many = format!("[{one}, {one}]");
        let single: RawProject = serde_json::from_str(one).unwrap();
        let list: RawProject = serde_json::from_str(&many).unwrap();
        assert_eq!(single.into_records().len(), 1);
        assert_eq!(list.into_records().len(), 2);
    }

    #[test]
    fn pitch_curve_sample_times_start_one_step_in() {
        let curve = PitchCurve {
            f0: vec![440.0, 0.0, 880.0],
            timestep: 0.1,
        };
        assert_eq!(curve.sample_times(2.0), vec![2.1, 2.2, 2.3]);
        let semis = curve.semitones();
        assert!((semis[0] - 69.0).abs() < 1e-12);
        assert!(semis[1].is_infinite());
        assert!((semis[2] - 81.0).abs() < 1e-12);
    }
}
