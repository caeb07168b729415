//! Pitch helpers: note-name resolution and f0 → semitone conversion.
//!
//! Semitone numbers follow the MIDI convention, middle C (C4) = 60.

/// Semitone number of the reference pitch A4.
pub const A4_SEMITONE: i32 = 69;
/// Frequency of the reference pitch A4 in Hz.
pub const A4_HZ: f64 = 440.0;

/// Resolve a textual note name such as `C4`, `f#3`, `E♭5` or `rest` into a
/// semitone number.
///
/// Matching is case-insensitive. The unicode flat, sharp, double-sharp and
/// double-flat symbols are accepted in place of `b`, `#`, `##` and `bb`.
/// Returns `None` for rests and for anything that does not parse; an
/// unresolvable name is never an error.
pub fn resolve_note(name: &str) -> Option<i32> {
    let normalized = name
        .trim()
        .replace('\u{266d}', "b")
        .replace('\u{266f}', "#")
        .replace('\u{1d12a}', "##")
        .replace('\u{1d12b}', "bb")
        .to_lowercase();

    if normalized.is_empty() || normalized == "rest" {
        return None;
    }

    let (letter, accidental, octave) = split_note_name(&normalized)?;

    let accidental_offset = match accidental {
        "" => 0,
        "#" => 1,
        "##" => 2,
        "b" => -1,
        "bb" => -2,
        _ => return None,
    };
    let step_offset = match letter {
        'c' => 0,
        'd' => 2,
        'e' => 4,
        'f' => 5,
        'g' => 7,
        'a' => 9,
        'b' => 11,
        _ => return None,
    };

    // Octaves far outside the MIDI range must not overflow.
    octave
        .checked_add(1)?
        .checked_mul(12)?
        .checked_add(step_offset + accidental_offset)
}

/// Find the first `<letter><accidental><octave>` pattern in a lower-cased
/// note name. The accidental is the shortest run of text between the letter
/// and a signed integer; it is validated by the caller.
fn split_note_name(name: &str) -> Option<(char, &str, i32)> {
    for (start, letter) in name.char_indices() {
        if !matches!(letter, 'a'..='g') {
            continue;
        }
        let rest_start = start + letter.len_utf8();
        let rest = &name[rest_start..];
        for (acc_len, _) in rest.char_indices() {
            if let Some(octave) = leading_signed_int(&rest[acc_len..]) {
                return Some((letter, &rest[..acc_len], octave));
            }
        }
    }
    None
}

/// Parse an optionally negative run of ASCII digits at the start of `s`.
fn leading_signed_int(s: &str) -> Option<i32> {
    let (negative, digits_start) = match s.strip_prefix('-') {
        Some(tail) => (true, tail),
        None => (false, s),
    };
    let len = digits_start
        .bytes()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if len == 0 {
        return None;
    }
    let magnitude: i32 = digits_start[..len].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Convert a frequency in Hz to a (fractional) semitone number relative to A4.
///
/// Callers must exclude non-positive frequencies.
pub fn f0_to_semitone(f0_hz: f64) -> f64 {
    f0_to_semitone_with(f0_hz, A4_SEMITONE, A4_HZ)
}

/// [`f0_to_semitone`] with an explicit reference pitch.
pub fn f0_to_semitone_with(f0_hz: f64, reference_semitone: i32, reference_hz: f64) -> f64 {
    12.0 * (f0_hz / reference_hz).log2() + reference_semitone as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_naturals() {
        assert_eq!(resolve_note("C4"), Some(60));
        assert_eq!(resolve_note("A4"), Some(69));
        assert_eq!(resolve_note("B3"), Some(59));
        assert_eq!(resolve_note("c-1"), Some(0));
        assert_eq!(resolve_note("  g5 "), Some(79));
    }

    #[test]
    fn resolves_accidentals() {
        assert_eq!(resolve_note("c#4"), Some(61));
        assert_eq!(resolve_note("C♯4"), Some(61));
        assert_eq!(resolve_note("Eb4"), Some(63));
        assert_eq!(resolve_note("E♭4"), Some(63));
        assert_eq!(resolve_note("F##3"), Some(55));
        assert_eq!(resolve_note("F𝄪3"), Some(55));
        assert_eq!(resolve_note("Bbb2"), Some(45));
        assert_eq!(resolve_note("B𝄫2"), Some(45));
    }

    #[test]
    fn rest_and_garbage_are_unknown() {
        assert_eq!(resolve_note("rest"), None);
        assert_eq!(resolve_note("REST"), None);
        assert_eq!(resolve_note(""), None);
        assert_eq!(resolve_note("hello"), None);
        assert_eq!(resolve_note("C"), None);
        assert_eq!(resolve_note("C999999999"), None);
        assert_eq!(resolve_note("Cb-999999999"), None);
        // "x" is not an accidental spelling
        assert_eq!(resolve_note("Cx4"), None);
        assert_eq!(resolve_note("C###4"), None);
    }

    #[test]
    fn first_letter_wins() {
        // the flat sign is consumed as an accidental, not as a second letter
        assert_eq!(resolve_note("bb4"), Some(70));
        assert_eq!(resolve_note("b4"), Some(71));
    }

    #[test]
    fn f0_conversion_matches_reference_points() {
        assert!((f0_to_semitone(440.0) - 69.0).abs() < 1e-12);
        assert!((f0_to_semitone(880.0) - 81.0).abs() < 1e-12);
        assert!((f0_to_semitone(261.625_565_300_6) - 60.0).abs() < 1e-9);
        assert!((f0_to_semitone_with(220.0, 57, 220.0) - 57.0).abs() < 1e-12);
    }
}
