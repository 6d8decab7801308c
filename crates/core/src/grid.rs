//! Grid snapping for panel positions and sizes.
//!
//! Values are quantized to the nearest grid line, rounding halves up
//! (towards positive infinity): with a 20px grid 113 -> 120, 47 -> 40,
//! -13 -> -20 and -10 -> 0.

use crate::types::Position;

/// Default grid pitch in pixels.
pub const DEFAULT_GRID_SIZE: f64 = 20.0;

/// Snap a scalar to the nearest multiple of `grid_size`.
///
/// A non-positive or non-finite grid disables snapping and returns `value`
/// unchanged.
pub fn snap_value(value: f64, grid_size: f64) -> f64 {
    if !is_usable_grid(grid_size) {
        return value;
    }
    let snapped = (value / grid_size + 0.5).floor() * grid_size;
    // Avoid leaking `-0.0` into persisted layouts.
    if snapped == 0.0 {
        0.0
    } else {
        snapped
    }
}

/// Snap each axis of a position independently.
pub fn snap_position(position: Position, grid_size: f64) -> Position {
    Position {
        x: snap_value(position.x, grid_size),
        y: snap_value(position.y, grid_size),
    }
}

/// Snap a position to the [`DEFAULT_GRID_SIZE`] grid.
pub fn snap_position_default(position: Position) -> Position {
    snap_position(position, DEFAULT_GRID_SIZE)
}

/// Snap `value` to the grid while staying inside `[min, max]`.
///
/// `value` is clamped first. If the nearest grid line falls outside the
/// range, the nearest in-range grid line is used instead; when no grid line
/// fits inside the range at all the clamped value is returned as-is.
pub fn snap_within(value: f64, grid_size: f64, min: f64, max: f64) -> f64 {
    let clamped = crate::types::clamp_axis(value, min, max);
    if !is_usable_grid(grid_size) {
        return clamped;
    }
    let snapped = snap_value(clamped, grid_size);
    if snapped < min {
        let up = (min / grid_size).ceil() * grid_size;
        if up <= max {
            return up;
        }
        return clamped;
    }
    if snapped > max {
        let down = (max / grid_size).floor() * grid_size;
        if down >= min {
            return down;
        }
        return clamped;
    }
    snapped
}

fn is_usable_grid(grid_size: f64) -> bool {
    grid_size.is_finite() && grid_size > 0.0
}
