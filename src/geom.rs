//!
//! # Wafer Cell Geometry
//!
//! Conversions between wafer coordinates and the cell grid, and enumeration
//! of the cells that fit on the wafer once the edge clearances are applied.
//!
//! All coordinates are millimeters. Results are rounded to micrometer
//! (1e-6 mm) precision, matching the job-file's six-decimal fields, so the
//! cell/wafer conversions round-trip exactly for representable inputs.
//!

// Local imports
use crate::data::{PasCell, PasCellIndex, PasError, PasJob, PasPoint, PasResult};
use crate::defaults::DEFAULTS;

/// Round `v` to 1e-6 precision
pub fn round6(v: f64) -> f64 {
    (v * 1e6).round() / 1e6
}

/// Wafer coordinates of the point `offset` from the center of `cell`.
/// Cell (0, 0)'s center sits at the matrix shift.
pub fn cell_to_wafer(grid: &PasCell, cell: PasCellIndex, offset: PasPoint) -> PasPoint {
    let size = grid.cell_size();
    let shift = grid.matrix_shift();
    PasPoint::new(
        round6(cell.c as f64 * size.x + offset.x + shift.x),
        round6(cell.r as f64 * size.y + offset.y + shift.y),
    )
}

/// Cell index and in-cell offset of wafer-coordinate point `wafer_xy`.
///
/// Inverse of [cell_to_wafer] for offsets strictly within half a cell of a
/// cell center; points exactly on the half-cell boundary belong to the
/// higher-indexed cell, with a negative half-cell offset.
pub fn wafer_to_cell(grid: &PasCell, wafer_xy: PasPoint) -> (PasCellIndex, PasPoint) {
    let size = grid.cell_size();
    let shift = grid.matrix_shift();
    let c = ((wafer_xy.x - shift.x + size.x / 2.0) / size.x).floor() as i32;
    let r = ((wafer_xy.y - shift.y + size.y / 2.0) / size.y).floor() as i32;
    let offset = PasPoint::new(
        round6(wafer_xy.x - shift.x - c as f64 * size.x),
        round6(wafer_xy.y - shift.y - r as f64 * size.y),
    );
    (PasCellIndex::new(c, r), offset)
}

/// Cells usable on `job`'s wafer, under its edge-die policy, in sweep order.
///
/// A cell is judged by its four corner vertices against the wafer's effective
/// edge: the wafer radius less the round-edge clearance, and (when the wafer
/// has a flat) the chord at the flat less the flat-edge clearance. Interior
/// policy requires all four corners inside; with edge dies enabled a single
/// corner inside suffices.
///
/// The grid is scanned with an alternating sweep per axis (0, -1, +1, -2,
/// +2, ...), so output order is center-out rather than sorted.
pub fn valid_cells(job: &PasJob) -> PasResult<Vec<PasCellIndex>> {
    let grid = &job.cell;
    let size = grid.cell_size();
    if size.x < DEFAULTS.min_cell_size || size.y < DEFAULTS.min_cell_size {
        return Err(PasError::Invalid(format!(
            "cell size ({}, {}) is below the machine minimum of {}mm",
            size.x, size.y, DEFAULTS.min_cell_size
        )));
    }
    let shift = grid.matrix_shift();
    let eff_diameter = job.wafer_diameter() - 2.0 * grid.round_edge_clearance();
    let eff_radius = eff_diameter / 2.0;

    // Lowest admissible y, when the wafer has a flat
    let flat_y = if grid.flat_enabled {
        let eff_flat = grid.flat_length() - grid.flat_edge_clearance();
        if eff_flat > 0.0 && eff_flat < eff_diameter {
            let half_angle = ((eff_flat / 2.0) / eff_radius).asin();
            Some(-half_angle.cos() * eff_radius)
        } else {
            None
        }
    } else {
        None
    };

    let inside = |v: PasPoint| -> bool {
        if v.radius() > eff_radius {
            return false;
        }
        match flat_y {
            Some(y) => v.y >= y,
            None => true,
        }
    };

    let steps_c = (eff_diameter / size.x).floor() as i32 + 1;
    let steps_r = (eff_diameter / size.y).floor() as i32 + 1;
    let mut cells = Vec::new();
    for c in sweep(steps_c) {
        for r in sweep(steps_r) {
            let center = PasPoint::new(
                c as f64 * size.x + shift.x,
                r as f64 * size.y + shift.y,
            );
            let corners = [
                PasPoint::new(center.x - size.x / 2.0, center.y - size.y / 2.0),
                PasPoint::new(center.x - size.x / 2.0, center.y + size.y / 2.0),
                PasPoint::new(center.x + size.x / 2.0, center.y - size.y / 2.0),
                PasPoint::new(center.x + size.x / 2.0, center.y + size.y / 2.0),
            ];
            let ok = if job.expose_edge_die {
                corners.iter().any(|v| inside(*v))
            } else {
                corners.iter().all(|v| inside(*v))
            };
            if ok {
                cells.push(PasCellIndex::new(c, r));
            }
        }
    }
    Ok(cells)
}

/// Alternating center-out index sweep: 0, -1, +1, -2, +2, ... up to `n`
fn sweep(n: i32) -> impl Iterator<Item = i32> {
    std::iter::once(0).chain((1..=n).flat_map(|k| [-k, k]))
}
