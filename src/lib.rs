//!
//! # Pas21
//!
//! ## ASML PAS Wafer-Stepper Job Deck Creation & ASCII Job-File Writing
//!
//! Builds exposure-job descriptions for PAS 5500-series wafer steppers and
//! writes them in the machine's fixed-format ASCII job-file dialect, ready
//! for conversion to a binary job on the machine side.
//!
//! A job ([data::PasJob]) owns a wafer cell grid, reticle images, alignment
//! marks & strategies, and process layers. All coordinates are millimeters at
//! wafer (1x) scale. Construction is two-phase: build each entity, then
//! attach it to the job, which cross-checks every ID reference at attach and
//! export time.
//!
//! ```no_run
//! use pas21::{PasExposure, PasImage, PasJob, PasLayer, PasResult};
//!
//! fn main() -> PasResult<()> {
//!     let mut job = PasJob::new();
//!     job.set_comment("Demo device", "Single layer, no alignment", "")?;
//!     job.cell.set_cell_size((5.0, 5.0))?;
//!
//!     let mut image = PasImage::new("DEV", "RETICLE01", (4.0, 4.0), (0.0, 0.0))?;
//!     image.distribute((0, 0), (0.0, 0.0))?;
//!     image.distribute((1, 0), (0.0, 0.0))?;
//!     job.add_image(image)?;
//!
//!     let mut layer = PasLayer::new("METAL")?;
//!     layer.expose_image(job.image("DEV").unwrap(), PasExposure::default())?;
//!     job.add_layer(layer);
//!
//!     job.export("Job_Demo.txt", true)
//! }
//! ```
//!

pub mod data;
pub mod defaults;
pub mod geom;
pub mod images;
pub mod organize;
pub mod utils;
pub mod write;

#[cfg(test)]
mod tests;

pub use data::*;
