//! Slur expansion — turns a segment's notes into a timeline of visualize units.
//!
//! Notes are grouped into slur stacks: a non-slur note followed by the slur
//! continuations that share its phoneme group. Inside a stack the phonemes of
//! the leading note are redistributed over the whole stack:
//!
//! ```text
//!   0                     body budget                 stack total
//!   |---- body / SP / AP ------|-------- head ------------|
//!   | note 0 | note 1 | note 2 ....| note 3 | note 4      |
//!                        ^ split note
//! ```
//!
//! Notes that end inside the body window get one unit each. The split note
//! is cut at the body budget: its body part is shared by the remaining body
//! phonemes (the last of them absorbs the stretch), its rest belongs to the
//! head phonemes, which then cover every later note of the stack.

use std::ops::Range;

use rayon::prelude::*;
use tracing::debug;

use crate::model::*;
use crate::numeric::{fixed_sum, FixedSum};

/// Split a segment's notes into slur stacks, as index ranges into `notes`.
///
/// A stack starts at a non-slur note and takes every slur note after it.
/// Slur notes at the very start of a segment form a leader-less stack of
/// their own.
pub fn slur_stacks(notes: &[Note]) -> Vec<Range<usize>> {
    let mut stacks = Vec::new();
    let mut start = 0;
    for (i, note) in notes.iter().enumerate().skip(1) {
        if !note.is_slur {
            stacks.push(start..i);
            start = i;
        }
    }
    if !notes.is_empty() {
        stacks.push(start..notes.len());
    }
    stacks
}

/// Number of leading notes of a stack that fit entirely inside `body_budget`.
///
/// A note is counted while subtracting its duration keeps the remaining
/// budget non-negative.
pub fn body_head_split(notes: &[Note], body_budget: f64) -> usize {
    let mut remaining = FixedSum::starting_at(body_budget);
    let mut split = 0;
    for note in notes {
        remaining.add(-note.duration);
        if remaining.value() < 0.0 {
            break;
        }
        split += 1;
    }
    split
}

/// Duration budget of one stack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StackBudget {
    /// Sum of the note durations
    pub stack_total: f64,
    /// Sum of the HEAD phoneme durations
    pub head_total: f64,
    /// Time left for BODY/SP/AP phonemes
    pub body_budget: f64,
    /// Sum of the nominal non-HEAD phoneme durations
    pub body_nominal: f64,
    /// Stretch applied at the body/head boundary
    pub body_delta: f64,
}

impl StackBudget {
    pub fn compute(notes: &[Note], phonemes: &[Phoneme]) -> Self {
        let stack_total = fixed_sum(notes.iter().map(|n| n.duration));
        let head_total = fixed_sum(
            phonemes
                .iter()
                .filter(|p| p.category == PhonemeCategory::Head)
                .map(|p| p.duration),
        );
        let body_budget = fixed_sum([stack_total, -head_total]);
        let body_nominal = fixed_sum(
            phonemes
                .iter()
                .filter(|p| p.category != PhonemeCategory::Head)
                .map(|p| p.duration),
        );
        let body_delta = fixed_sum([body_budget, -body_nominal]);
        Self {
            stack_total,
            head_total,
            body_budget,
            body_nominal,
            body_delta,
        }
    }
}

/// Collects units of one stack on a stack-relative clock.
struct StackEmitter<'a> {
    origin: f64,
    units: &'a mut Vec<VisualizeUnit>,
}

impl StackEmitter<'_> {
    /// Emit `[start, end)` of the stack clock as a unit sung on `note`.
    fn emit(&mut self, note: &Note, phoneme: &Phoneme, start: f64, end: f64) {
        let duration = fixed_sum([end, -start]);
        if duration == 0.0 && !phoneme.category.is_breath_or_silence() {
            return;
        }
        let text_lyric = if phoneme.category == PhonemeCategory::Body {
            note.text.clone()
        } else {
            String::new()
        };
        self.units.push(VisualizeUnit {
            text_lyric,
            text_phoneme: phoneme.name.clone(),
            offset: fixed_sum([self.origin, start]),
            duration,
            midi_pitch: note.midi_pitch,
            category: phoneme.category,
        });
    }
}

/// Expand one slur stack. `origin` is the absolute start time of the stack.
fn expand_stack(stack: &[Note], origin: f64, units: &mut Vec<VisualizeUnit>) {
    let Some(leader) = stack.first() else {
        return;
    };
    let phonemes = &leader.phonemes;
    if phonemes.is_empty() {
        return;
    }

    let (body, heads): (Vec<&Phoneme>, Vec<&Phoneme>) = phonemes
        .iter()
        .partition(|p| p.category != PhonemeCategory::Head);

    let budget = StackBudget::compute(stack, phonemes);
    // Heads longer than the stack leave no body window; without body
    // phonemes the heads take the whole stack.
    let body_end = if body.is_empty() {
        0.0
    } else {
        budget.body_budget.min(budget.stack_total).max(0.0)
    };
    let split = if body.is_empty() {
        0
    } else {
        body_head_split(stack, body_end)
    };

    let mut emitter = StackEmitter { origin, units };
    let mut clock = FixedSum::new();
    let mut note_idx = 0;

    // Notes fully inside the body window: one unit per note, labelled with
    // the body phoneme whose nominal budget is still running.
    let mut ph_idx = 0;
    let mut ph_remaining = FixedSum::starting_at(body.first().map_or(0.0, |p| p.duration));
    while note_idx < split {
        let note = &stack[note_idx];
        let start = clock.value();
        clock.add(note.duration);
        emitter.emit(note, body[ph_idx], start, clock.value());

        ph_remaining.add(-note.duration);
        while ph_remaining.value() <= 0.0 && ph_idx + 1 < body.len() {
            ph_idx += 1;
            ph_remaining.add(body[ph_idx].duration);
        }
        note_idx += 1;
    }

    if note_idx >= stack.len() {
        return;
    }

    // The split note: what is left of the body window goes to the remaining
    // body phonemes in order, the last one absorbing the delta.
    let split_note = &stack[note_idx];
    let mut position = clock.value();
    clock.add(split_note.duration);
    let split_note_end = clock.value();

    for (i, phoneme) in body.iter().enumerate().skip(ph_idx) {
        let end = if i + 1 == body.len() {
            body_end
        } else {
            let share = ph_remaining.value().max(0.0);
            ph_remaining = FixedSum::starting_at(body[i + 1].duration);
            fixed_sum([position, share]).min(body_end)
        };
        emitter.emit(split_note, phoneme, position, end);
        position = end;
    }

    // Head phonemes partition [body_end, stack_total); each note of the head
    // region gets one unit per head phoneme it overlaps.
    let mut head_clock = FixedSum::starting_at(body_end);
    let head_ranges: Vec<(&Phoneme, f64, f64)> = heads
        .iter()
        .enumerate()
        .map(|(i, &phoneme)| {
            let start = head_clock.value();
            let end = if i + 1 == heads.len() {
                budget.stack_total
            } else {
                head_clock.add(phoneme.duration);
                head_clock.value().min(budget.stack_total)
            };
            head_clock = FixedSum::starting_at(end);
            (phoneme, start, end)
        })
        .collect();

    let mut note_start = body_end;
    let mut note_end = split_note_end;
    let mut head_idx = 0;
    loop {
        let note = &stack[note_idx];
        while head_idx < head_ranges.len() {
            let (phoneme, head_start, head_end) = head_ranges[head_idx];
            let start = head_start.max(note_start);
            let end = head_end.min(note_end);
            if end >= start {
                emitter.emit(note, phoneme, start, end);
            }
            if head_end > note_end {
                break;
            }
            head_idx += 1;
        }

        note_idx += 1;
        if note_idx >= stack.len() {
            break;
        }
        note_start = note_end;
        clock.add(stack[note_idx].duration);
        note_end = clock.value();
    }
}

/// Expand a segment into its ordered unit timeline, then backfill unknown
/// pitches.
pub fn expand_segment(segment: &Segment) -> Vec<VisualizeUnit> {
    let mut units = Vec::new();
    for range in slur_stacks(&segment.notes) {
        let stack = &segment.notes[range];
        let origin = fixed_sum([segment.offset, stack[0].offset]);
        expand_stack(stack, origin, &mut units);
    }
    backfill_pitches(&mut units);
    debug!(
        notes = segment.notes.len(),
        units = units.len(),
        "expanded segment"
    );
    units
}

/// Fill unknown pitches of BODY/HEAD units with the nearest later known
/// pitch. SP/AP units are left alone and do not act as pitch sources.
pub fn backfill_pitches(units: &mut [VisualizeUnit]) {
    let mut last_seen: Option<i32> = None;
    for unit in units.iter_mut().rev() {
        if unit.category.is_breath_or_silence() {
            continue;
        }
        match unit.midi_pitch {
            None => unit.midi_pitch = last_seen,
            Some(pitch) => last_seen = Some(pitch),
        }
    }
}

/// Expand every segment of a track. Segments are processed in parallel and
/// concatenated in track order.
pub fn expand_track(track: &Track) -> Vec<VisualizeUnit> {
    track
        .segments
        .par_iter()
        .map(expand_segment)
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}
