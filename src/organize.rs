//!
//! # Layer Organization
//!
//! Reorders a job's layer list into machine order before export: the zero
//! (mark-printing) layer first, a combine-with-zero layer directly after it,
//! and every other layer in insertion order. Runs on every export and is
//! idempotent.
//!

// Crates.io
use tracing::debug;

// Local imports
use crate::data::{PasError, PasJob, PasLayer, PasResult};

/// Reorder `job`'s layers into machine order.
///
/// At most one layer may be flagged zero and at most one combine-with-zero;
/// violations report every offending layer ID. Finding a combine-with-zero
/// layer also sets the job's `combined_zero_first` flag, which the exporter
/// writes into the GENERAL section.
pub fn organize_layers(job: &mut PasJob) -> PasResult<()> {
    let both: Vec<String> = job
        .layers
        .iter()
        .enumerate()
        .filter(|(_, l)| l.zero && l.combine_with_zero)
        .map(|(i, l)| display_id(i, l))
        .collect();
    if !both.is_empty() {
        return Err(PasError::Invalid(format!(
            "layers {:?} are flagged both zero and combine-with-zero",
            both
        )));
    }

    let zeros: Vec<usize> = job
        .layers
        .iter()
        .enumerate()
        .filter(|(_, l)| l.zero)
        .map(|(i, _)| i)
        .collect();
    if zeros.len() > 1 {
        let ids: Vec<String> = zeros
            .iter()
            .map(|&i| display_id(i, &job.layers[i]))
            .collect();
        return Err(PasError::Invalid(format!(
            "only one zero layer is allowed, but layers {:?} are all flagged zero",
            ids
        )));
    }
    let has_zero = !zeros.is_empty();
    if let Some(&zi) = zeros.first() {
        let layer = job.layers.remove(zi);
        debug!(layer = %layer.layer_id, "moving zero layer to the front");
        job.layers.insert(0, layer);
    }

    let combines: Vec<usize> = job
        .layers
        .iter()
        .enumerate()
        .filter(|(_, l)| l.combine_with_zero)
        .map(|(i, _)| i)
        .collect();
    if combines.len() > 1 {
        let ids: Vec<String> = combines
            .iter()
            .map(|&i| display_id(i, &job.layers[i]))
            .collect();
        return Err(PasError::Invalid(format!(
            "only one combine-with-zero layer is allowed, but layers {:?} are all flagged",
            ids
        )));
    }
    if let Some(&ci) = combines.first() {
        let layer = job.layers.remove(ci);
        let at = if has_zero { 1 } else { 0 };
        debug!(layer = %layer.layer_id, position = at, "moving combine-with-zero layer");
        job.layers.insert(at, layer);
        job.combined_zero_first = true;
    }
    Ok(())
}

/// Layer ID for error messages, falling back to the position number
fn display_id(i: usize, layer: &PasLayer) -> String {
    if layer.layer_id.is_empty() {
        format!("#{}", i)
    } else {
        layer.layer_id.clone()
    }
}
