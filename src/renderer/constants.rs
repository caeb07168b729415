//! Shared constants for the piano-roll renderer.
//!
//! Distances ending in `_SECONDS` or `_SEMITONES` are in data units and get
//! scaled by the layout; the rest are SVG user units.

// ── Data window ─────────────────────────────────────────────────────
pub(super) const TIME_PADDING_SECONDS: f64 = 1.0; // blank time after the last unit
pub(super) const PITCH_PADDING_SEMITONES: f64 = 1.0; // above the highest / below the lowest note

// ── Note boxes ──────────────────────────────────────────────────────
pub(super) const NOTE_HEIGHT_SEMITONES: f64 = 1.0;
pub(super) const NOTE_EDGE_COLOR: &str = "#400d51";
pub(super) const NOTE_EDGE_WIDTH: f64 = 0.5;

// ── Labels ──────────────────────────────────────────────────────────
pub(super) const LYRIC_X_NUDGE_SECONDS: f64 = 0.01;
pub(super) const LYRIC_RAISE_SEMITONES: f64 = 0.75; // baseline above the note center
pub(super) const PHONEME_DROP_SEMITONES: f64 = 1.0; // baseline below the note center
pub(super) const POINTS_PER_INCH: f64 = 72.0;

// ── Pitch curve ─────────────────────────────────────────────────────
pub(super) const F0_LINE_WIDTH: f64 = 1.5;
