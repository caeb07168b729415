//! dsvis — DiffSinger project (.ds) parser and piano-roll visualizer.
//!
//! A `.ds` file holds one or more segments, each describing notes, phonemes
//! and an f0 curve as parallel token arrays. The crate validates those arrays
//! into a [`Track`], expands slurred notes into a flat timeline of
//! [`VisualizeUnit`]s and renders the timeline as SVG.
//!
//! # Example
//! ```no_run
//! use dsvis::{expand_track, parse_file, RejectPolicy};
//!
//! let track = parse_file("path/to/song.ds", RejectPolicy::Skip).unwrap();
//! let units = expand_track(&track);
//! println!("Segments: {}", track.segments.len());
//! println!("Units: {}", units.len());
//! ```

pub mod config;
pub mod error;
pub mod expander;
pub mod model;
pub mod numeric;
pub mod parser;
pub mod pitch;
pub mod renderer;

use std::path::Path;

pub use config::{normalize_color, RenderOptions};
pub use error::{ProjectError, SegmentError};
pub use expander::{backfill_pitches, expand_segment, expand_track};
pub use model::*;
pub use parser::{parse_project_bytes, parse_project_str, parse_segment, parse_track, RejectPolicy};
pub use pitch::{f0_to_semitone, resolve_note};
pub use renderer::{render_track_to_svg, render_units_to_svg};

/// Read and parse a `.ds` project file.
pub fn parse_file<P: AsRef<Path>>(path: P, policy: RejectPolicy) -> Result<Track, ProjectError> {
    let data = std::fs::read(path.as_ref()).map_err(|e| ProjectError::io("reading project file", e))?;
    parse_project_bytes(&data, policy)
}

/// Convert an expanded timeline to a JSON string.
pub fn units_to_json(units: &[VisualizeUnit]) -> Result<String, ProjectError> {
    serde_json::to_string_pretty(units).map_err(|e| ProjectError::json("encoding units", e))
}

/// Write an expanded timeline to `path` as pretty-printed JSON.
pub fn write_units_json<P: AsRef<Path>>(path: P, units: &[VisualizeUnit]) -> Result<(), ProjectError> {
    let json = units_to_json(units)?;
    std::fs::write(path.as_ref(), json).map_err(|e| ProjectError::io("writing units json", e))
}

/// Parse a `.ds` file and render it directly to SVG.
pub fn render_file_to_svg<P: AsRef<Path>>(
    path: P,
    policy: RejectPolicy,
    options: &RenderOptions,
) -> Result<String, ProjectError> {
    let track = parse_file(path, policy)?;
    Ok(render_track_to_svg(&track, options))
}

/// Parse `.ds` bytes and render them to SVG.
pub fn render_bytes_to_svg(
    data: &[u8],
    policy: RejectPolicy,
    options: &RenderOptions,
) -> Result<String, ProjectError> {
    let track = parse_project_bytes(data, policy)?;
    Ok(render_track_to_svg(&track, options))
}

// ═══════════════════════════════════════════════════════════════════════
// C FFI
// ═══════════════════════════════════════════════════════════════════════

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

/// Parse a `.ds` file and return SVG as a C string, skipping rejected
/// segments. The caller must free the returned string with
/// `dsvis_free_string`.
///
/// `width` sets the figure width in inches. Pass 0 to use the default.
///
/// # Safety
/// `path` must be a valid null-terminated UTF-8 C string.
#[no_mangle]
pub unsafe extern "C" fn dsvis_render_file(path: *const c_char, width: u32) -> *mut c_char {
    if path.is_null() {
        return std::ptr::null_mut();
    }
    let c_str = unsafe { CStr::from_ptr(path) };
    let path_str = match c_str.to_str() {
        Ok(s) => s,
        Err(_) => return std::ptr::null_mut(),
    };

    let mut options = RenderOptions::default();
    if width > 0 {
        options.width = width;
    }

    match render_file_to_svg(path_str, RejectPolicy::Skip, &options) {
        Ok(svg) => CString::new(svg).unwrap_or_default().into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Free a string previously returned by dsvis functions.
///
/// # Safety
/// `ptr` must be a string previously returned by a dsvis function, or null.
#[no_mangle]
pub unsafe extern "C" fn dsvis_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe {
            let _ = CString::from_raw(ptr);
        }
    }
}
