//!
//! # Machine-Library Images
//!
//! Pre-defined reticle images shipped with the stepper's standard alignment
//! reticle: the PM and SPM alignment marks plus the PF flood image.
//! [mark_image] maps each [PasMarkType] to its canonical image, which
//! [crate::data::PasJob::add_mark] copies into the job's image list.
//!

// Crates.io
use once_cell::sync::Lazy;

// Local imports
use crate::data::{PasImage, PasMarkType, PasPoint};

fn library_image(image_id: &str, size: (f64, f64), shift: (f64, f64)) -> PasImage {
    PasImage {
        image_id: image_id.to_string(),
        reticle_id: "4544020*".to_string(),
        size: PasPoint::new(size.0, size.1),
        shift: PasPoint::new(shift.0, shift.1),
        distribution: Vec::new(),
        base_image_id: None,
    }
}

/// Primary global alignment mark (PM)
pub static PM: Lazy<PasImage> = Lazy::new(|| library_image("PM", (1.640, 1.640), (0.0, 0.0)));

/// Scribe-line primary mark, x-direction gratings
pub static SPM_X: Lazy<PasImage> =
    Lazy::new(|| library_image("SPM-X", (2.912, 0.408), (-11.680, -11.680)));

/// Scribe-line primary mark, y-direction gratings
pub static SPM_Y: Lazy<PasImage> =
    Lazy::new(|| library_image("SPM-Y", (0.400, 2.912), (11.680, -11.680)));

/// Process-flood image, clears resist over previously-printed marks
pub static PF: Lazy<PasImage> =
    Lazy::new(|| library_image("PF", (6.440, 6.440), (10.560, 0.0)));

/// Canonical image for alignment-mark type `tp`.
pub fn mark_image(tp: PasMarkType) -> &'static PasImage {
    match tp {
        PasMarkType::Pm => &PM,
        PasMarkType::SpmX => &SPM_X,
        PasMarkType::SpmY => &SPM_Y,
    }
}
