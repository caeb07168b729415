//! Segment parser — validates raw `.ds` records and builds the Segment model.

use std::str::FromStr;

use tracing::{debug, warn};

use crate::error::{ProjectError, SegmentError};
use crate::model::*;
use crate::numeric::FixedSum;
use crate::pitch::resolve_note;

/// Lyric recorded on slur-continuation notes.
pub const SLUR_PLACEHOLDER: &str = "-";

/// What to do with a record that fails validation while building a track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RejectPolicy {
    /// Drop the record, log a warning and keep going.
    #[default]
    Skip,
    /// Fail the whole track on the first rejected record.
    Abort,
}

/// Token-decoded fields of one record, before validation.
struct SegmentFields<'a> {
    f0_seq: Vec<f64>,
    text: Vec<&'a str>,
    ph_seq: Vec<&'a str>,
    ph_dur: Vec<f64>,
    ph_num: Vec<usize>,
    note_seq: Vec<&'a str>,
    note_dur: Vec<f64>,
    note_slur: Vec<bool>,
}

impl<'a> SegmentFields<'a> {
    fn decode(raw: &'a RawSegment) -> Result<Self, SegmentError> {
        Ok(Self {
            f0_seq: parse_numbers(&raw.f0_seq, "f0_seq")?,
            text: raw.text.split_whitespace().collect(),
            ph_seq: raw.ph_seq.split_whitespace().collect(),
            ph_dur: parse_numbers(&raw.ph_dur, "ph_dur")?,
            ph_num: parse_numbers(&raw.ph_num, "ph_num")?,
            note_seq: raw.note_seq.split_whitespace().collect(),
            note_dur: parse_numbers(&raw.note_dur, "note_dur")?,
            note_slur: parse_numbers::<i64>(&raw.note_slur, "note_slur")?
                .into_iter()
                .map(|flag| flag != 0)
                .collect(),
        })
    }

    fn validate(&self) -> Result<(), SegmentError> {
        let notes = self.note_seq.len();
        if self.note_dur.len() != notes || self.note_slur.len() != notes {
            return Err(SegmentError::NoteCountMismatch {
                note_seq: notes,
                note_dur: self.note_dur.len(),
                note_slur: self.note_slur.len(),
            });
        }
        if self.text.len() != self.ph_num.len() {
            return Err(SegmentError::LyricCountMismatch {
                text: self.text.len(),
                ph_num: self.ph_num.len(),
            });
        }
        let ph_num_sum = self
            .ph_num
            .iter()
            .try_fold(0usize, |sum, &n| {
                sum.checked_add(n)
                    .ok_or_else(|| SegmentError::invalid_token("ph_num", n.to_string()))
            })?;
        if ph_num_sum != self.ph_seq.len() || self.ph_seq.len() != self.ph_dur.len() {
            return Err(SegmentError::PhonemeCountMismatch {
                ph_num_sum,
                ph_seq: self.ph_seq.len(),
                ph_dur: self.ph_dur.len(),
            });
        }
        let non_slur = self.note_slur.iter().filter(|&&slur| !slur).count();
        if non_slur != self.ph_num.len() {
            return Err(SegmentError::SlurGroupMismatch {
                non_slur,
                ph_num: self.ph_num.len(),
            });
        }
        Ok(())
    }
}

fn parse_numbers<T: FromStr>(field: &str, name: &'static str) -> Result<Vec<T>, SegmentError> {
    field
        .split_whitespace()
        .map(|token| {
            token
                .parse::<T>()
                .map_err(|_| SegmentError::invalid_token(name, token))
        })
        .collect()
}

/// Classify the phoneme at 1-based position `position` of a group of
/// `group_size` tokens.
pub fn classify_phoneme(name: &str, position: usize, group_size: usize) -> PhonemeCategory {
    match name {
        "AP" => PhonemeCategory::Ap,
        "SP" => PhonemeCategory::Sp,
        _ if group_size > 1 && position == group_size => PhonemeCategory::Head,
        _ => PhonemeCategory::Body,
    }
}

/// Parse one raw record into a [`Segment`].
///
/// Fails without partial output when the parallel arrays disagree in length
/// or a numeric token does not parse.
pub fn parse_segment(raw: &RawSegment) -> Result<Segment, SegmentError> {
    let fields = SegmentFields::decode(raw)?;
    fields.validate()?;

    let note_count = fields.note_seq.len();
    let mut notes = Vec::with_capacity(note_count);

    // i walks notes, j walks lyric/phoneme groups, k walks phonemes
    let mut j = 0;
    let mut k = 0;
    let mut clock = FixedSum::new();
    // Slur notes ahead of the first real note have no group to share.
    let mut group_open = false;

    for i in 0..note_count {
        let is_slur = fields.note_slur[i];
        let mut phonemes = Vec::new();

        if !is_slur {
            group_open = true;
            let group_size = fields.ph_num[j];
            for position in 1..=group_size {
                let name = fields.ph_seq[k];
                phonemes.push(Phoneme {
                    name: name.to_string(),
                    duration: fields.ph_dur[k],
                    category: classify_phoneme(name, position, group_size),
                });
                k += 1;
            }
        }

        notes.push(Note {
            text: if is_slur {
                SLUR_PLACEHOLDER.to_string()
            } else {
                fields.text[j].to_string()
            },
            phonemes,
            duration: fields.note_dur[i],
            offset: clock.value(),
            midi_pitch: resolve_note(fields.note_seq[i]),
            is_slur,
        });
        clock.add(fields.note_dur[i]);

        // One group serves a non-slur note plus the slurs that follow it.
        let next_is_slur = fields.note_slur.get(i + 1).copied().unwrap_or(false);
        if !next_is_slur && group_open {
            j += 1;
            group_open = false;
        }
    }

    debug!(
        notes = notes.len(),
        phonemes = k,
        offset = raw.offset,
        "parsed segment"
    );

    Ok(Segment {
        offset: raw.offset,
        notes,
        pitch_curve: PitchCurve {
            f0: fields.f0_seq,
            timestep: raw.f0_timestep,
        },
    })
}

/// Build a [`Track`] from a list of raw records.
pub fn parse_track(records: &[RawSegment], policy: RejectPolicy) -> Result<Track, ProjectError> {
    let mut segments = Vec::with_capacity(records.len());
    for (index, raw) in records.iter().enumerate() {
        match parse_segment(raw) {
            Ok(segment) => segments.push(segment),
            Err(e) => match policy {
                RejectPolicy::Skip => warn!(index, reason = %e, "skipping rejected segment"),
                RejectPolicy::Abort => return Err(ProjectError::rejected(index, e)),
            },
        }
    }
    Ok(Track::new(segments))
}

/// Parse a `.ds` project from its JSON text.
pub fn parse_project_str(json: &str, policy: RejectPolicy) -> Result<Track, ProjectError> {
    let project: RawProject =
        serde_json::from_str(json).map_err(|e| ProjectError::json("decoding project", e))?;
    parse_track(&project.into_records(), policy)
}

/// Parse a `.ds` project from raw bytes.
pub fn parse_project_bytes(data: &[u8], policy: RejectPolicy) -> Result<Track, ProjectError> {
    let project: RawProject =
        serde_json::from_slice(data).map_err(|e| ProjectError::json("decoding project", e))?;
    parse_track(&project.into_records(), policy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(
        text: &str,
        ph_seq: &str,
        ph_dur: &str,
        ph_num: &str,
        note_seq: &str,
        note_dur: &str,
        note_slur: &str,
    ) -> RawSegment {
        RawSegment {
            offset: 0.0,
            f0_seq: "440 440 440".to_string(),
            f0_timestep: 0.1,
            text: text.to_string(),
            ph_seq: ph_seq.to_string(),
            ph_dur: ph_dur.to_string(),
            ph_num: ph_num.to_string(),
            note_seq: note_seq.to_string(),
            note_dur: note_dur.to_string(),
            note_slur: note_slur.to_string(),
        }
    }

    #[test]
    fn classification_is_positional() {
        assert_eq!(classify_phoneme("a", 1, 1), PhonemeCategory::Body);
        assert_eq!(classify_phoneme("k", 1, 2), PhonemeCategory::Body);
        assert_eq!(classify_phoneme("a", 2, 2), PhonemeCategory::Head);
        assert_eq!(classify_phoneme("SP", 1, 1), PhonemeCategory::Sp);
        assert_eq!(classify_phoneme("AP", 2, 2), PhonemeCategory::Ap);
    }

    #[test]
    fn parses_groups_slurs_and_offsets() {
        let segment = parse_segment(&raw(
            "SP la ti",
            "SP l a t i",
            "0.1 0.05 0.25 0.05 0.35",
            "1 2 2",
            "rest C4 D4 E4",
            "0.1 0.2 0.1 0.4",
            "0 0 1 0",
        ))
        .expect("valid segment");

        assert_eq!(segment.notes.len(), 4);
        let texts: Vec<&str> = segment.notes.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, vec!["SP", "la", SLUR_PLACEHOLDER, "ti"]);

        let offsets: Vec<f64> = segment.notes.iter().map(|n| n.offset).collect();
        assert_eq!(offsets, vec![0.0, 0.1, 0.3, 0.4]);

        assert_eq!(segment.notes[0].midi_pitch, None);
        assert_eq!(segment.notes[1].midi_pitch, Some(60));
        assert!(segment.notes[2].is_slur);
        assert!(segment.notes[2].phonemes.is_empty());

        let la: Vec<(&str, PhonemeCategory)> = segment.notes[1]
            .phonemes
            .iter()
            .map(|p| (p.name.as_str(), p.category))
            .collect();
        assert_eq!(
            la,
            vec![("l", PhonemeCategory::Body), ("a", PhonemeCategory::Head)]
        );
        assert_eq!(segment.notes[3].phonemes[0].name, "t");
        assert_eq!(segment.notes[0].phonemes[0].category, PhonemeCategory::Sp);
        assert_eq!(segment.pitch_curve.f0.len(), 3);
    }

    #[test]
    fn leading_slur_notes_borrow_nothing() {
        let segment = parse_segment(&raw(
            "la ti",
            "a i",
            "0.2 0.2",
            "1 1",
            "C4 D4 E4",
            "0.1 0.2 0.2",
            "1 0 0",
        ))
        .expect("valid segment");
        assert_eq!(segment.notes[0].text, SLUR_PLACEHOLDER);
        assert!(segment.notes[0].phonemes.is_empty());
        assert_eq!(segment.notes[1].text, "la");
        assert_eq!(segment.notes[2].text, "ti");
        assert_eq!(segment.notes[2].phonemes[0].name, "i");
    }

    #[test]
    fn rejects_phoneme_count_mismatch() {
        let err = parse_segment(&raw("la", "l a", "0.1 0.2", "3", "C4", "0.3", "0")).unwrap_err();
        assert!(matches!(err, SegmentError::PhonemeCountMismatch { ph_num_sum: 3, ph_seq: 2, .. }));
    }

    #[test]
    fn rejects_note_array_mismatch() {
        let err = parse_segment(&raw("la", "a", "0.1", "1", "C4 D4", "0.3", "0 1")).unwrap_err();
        assert!(matches!(err, SegmentError::NoteCountMismatch { .. }));
    }

    #[test]
    fn rejects_lyric_group_mismatch() {
        let err = parse_segment(&raw("la li", "a", "0.1", "1", "C4", "0.3", "0")).unwrap_err();
        assert!(matches!(err, SegmentError::LyricCountMismatch { text: 2, ph_num: 1 }));
    }

    #[test]
    fn rejects_slur_group_mismatch() {
        let err = parse_segment(&raw("la", "a", "0.1", "1", "C4 D4", "0.1 0.2", "0 0")).unwrap_err();
        assert_eq!(err, SegmentError::SlurGroupMismatch { non_slur: 2, ph_num: 1 });
    }

    #[test]
    fn rejects_bad_numbers() {
        let err = parse_segment(&raw("la", "a", "abc", "1", "C4", "0.3", "0")).unwrap_err();
        assert_eq!(err, SegmentError::invalid_token("ph_dur", "abc"));
    }

    #[test]
    fn rejects_oversized_group_counts() {
        let huge = raw("la li", "l a", "0.1 0.2", "18446744073709551615 2", "C4 D4", "0.1 0.2", "0 0");
        let err = parse_segment(&huge).unwrap_err();
        assert!(matches!(err, SegmentError::InvalidToken { field: "ph_num", .. }));

        let track = parse_track(&[huge], RejectPolicy::Skip).expect("skip never fails");
        assert!(track.segments.is_empty());
    }

    #[test]
    fn track_policy_decides_on_rejections() {
        let good = raw("la", "a", "0.3", "1", "C4", "0.3", "0");
        let bad = raw("la", "a", "0.3", "2", "C4", "0.3", "0");
        let records = vec![good.clone(), bad, good];

        let track = parse_track(&records, RejectPolicy::Skip).expect("skip never fails");
        assert_eq!(track.segments.len(), 2);

        let err = parse_track(&records, RejectPolicy::Abort).unwrap_err();
        assert!(matches!(err, ProjectError::Rejected { index: 1, .. }));
    }
}
