//!
//! # Pas Data Model
//!
//! Owned data structures for a PAS wafer-stepper exposure job:
//! the [PasJob] root plus its cell grid, reticle images, alignment marks &
//! strategies, and process layers. Construction is two-phase throughout:
//! entities are built stand-alone, then attached to a [PasJob], which owns
//! them by value. Cross-references between entities (layer to image, strategy
//! to mark) are held as ID strings and checked when attached and again at
//! export time.
//!

// Standard Lib Imports
use std::error::Error;
use std::fmt;
use std::path::Path;

// Crates.io Imports
use derive_builder::Builder;
use derive_more::{Add, AddAssign, Sub, SubAssign};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;

// Local imports
use crate::defaults::DEFAULTS;
use crate::enumstr;
use crate::utils::SerdeFile;
use crate::{geom, images, organize, write};

/// Characters permitted in a sanitized layer ID
const LAYER_ID_CHARS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_-";
/// Maximum length of a layer ID
const LAYER_ID_MAX: usize = 15;
/// Maximum length of a job-comment line
const COMMENT_MAX: usize = 50;

/// # Pas Coordinate Point
///
/// An (x, y) pair in millimeters. Wafer, cell, and reticle coordinates all
/// use the same point type; which frame a point lives in is contextual.
#[derive(
    Clone,
    Copy,
    Default,
    Debug,
    Add,
    AddAssign,
    Sub,
    SubAssign,
    Deserialize,
    Serialize,
    JsonSchema,
    PartialEq,
)]
pub struct PasPoint {
    pub x: f64,
    pub y: f64,
}
impl PasPoint {
    /// Create a new [PasPoint] from (x, y) coordinates
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
    /// Distance from the wafer center (the coordinate origin)
    pub fn radius(&self) -> f64 {
        self.x.hypot(self.y)
    }
}
impl From<(f64, f64)> for PasPoint {
    fn from(xy: (f64, f64)) -> Self {
        Self { x: xy.0, y: xy.1 }
    }
}

/// # Cell Index
///
/// Integer (column, row) index into the wafer's cell grid.
/// Cell (0, 0) is the cell whose center sits at the matrix shift.
#[derive(
    Clone, Copy, Default, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq, Hash,
)]
pub struct PasCellIndex {
    pub c: i32,
    pub r: i32,
}
impl PasCellIndex {
    /// Create a new [PasCellIndex] from (column, row)
    pub fn new(c: i32, r: i32) -> Self {
        Self { c, r }
    }
}
impl From<(i32, i32)> for PasCellIndex {
    fn from(cr: (i32, i32)) -> Self {
        Self { c: cr.0, r: cr.1 }
    }
}

enumstr!(
    /// # Alignment-Mark Types
    /// Canonical string-values match the machine-library image IDs.
    PasMarkType {
        Pm: "PM",
        SpmX: "SPM-X",
        SpmY: "SPM-Y",
    }
);
impl PasMarkType {
    /// Parse a user-facing mark-type spelling.
    /// Case-insensitive and tolerant of the common dash/underscore variants.
    pub fn parse(txt: &str) -> PasResult<Self> {
        let norm = txt.trim().to_uppercase().replace('-', "_");
        match norm.as_str() {
            "PM" | "P" => Ok(Self::Pm),
            "SPM_X" | "SPMX" => Ok(Self::SpmX),
            "SPM_Y" | "SPMY" => Ok(Self::SpmY),
            _ => Err(PasError::Invalid(format!(
                "unknown mark type `{}`, expected one of PM, SPM-X, SPM-Y",
                txt
            ))),
        }
    }
}

enumstr!(
    /// # Strategy Mark-Preference
    PasMarkPreference {
        Preferred: "P",
        Backup: "B",
    }
);
impl PasMarkPreference {
    /// Parse a user-facing preference spelling
    pub fn parse(txt: &str) -> PasResult<Self> {
        match txt.trim().to_uppercase().as_str() {
            "P" | "PREFER" | "PREFERRED" => Ok(Self::Preferred),
            "B" | "BACKUP" => Ok(Self::Backup),
            _ => Err(PasError::Invalid(format!(
                "unknown mark preference `{}`, expected one of P, PREFERRED, B, BACKUP",
                txt
            ))),
        }
    }
}

enumstr!(
    /// # Illumination Modes
    /// Written to the LITHOGRAPHY_PROCESS field of RETICLE_DATA.
    PasIlluminationMode {
        Default: "Default",
        Conventional: "Conventional",
        Annular: "Annular",
    }
);
impl Default for PasIlluminationMode {
    fn default() -> Self {
        Self::Default
    }
}
impl PasIlluminationMode {
    /// Parse a user-facing illumination-mode spelling.
    /// Accepts the single-letter and abbreviated forms.
    pub fn parse(txt: &str) -> PasResult<Self> {
        match txt.trim().to_lowercase().as_str() {
            "default" | "def" | "d" => Ok(Self::Default),
            "conventional" | "conv" | "c" => Ok(Self::Conventional),
            "annular" | "ann" | "a" => Ok(Self::Annular),
            _ => Err(PasError::Invalid(format!(
                "unknown illumination mode `{}`, expected one of Default (d), Conventional (c), Annular (a)",
                txt
            ))),
        }
    }
}

/// # Reticle Image
///
/// A rectangular region of a reticle, placed on the wafer by distributing it
/// into cells. Sizes and shifts are at 1x wafer scale (the machine multiplies
/// by the lens reduction on the reticle side).
#[derive(Default, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct PasImage {
    /// Image ID, unique within a job. Stored upper-case.
    pub image_id: String,
    /// Reticle (barcode) ID
    pub reticle_id: String,
    /// Design size of the image (mm, wafer scale)
    pub size: PasPoint,
    /// Shift of the image center from the reticle center (mm, wafer scale)
    pub shift: PasPoint,
    /// Placements of this image into wafer cells
    pub distribution: Vec<PasDistribution>,
    /// Machine-library image this one was instantiated from, for mark images
    pub base_image_id: Option<String>,
}
/// A single placement of an image: a cell plus an offset from its center.
#[derive(Default, Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct PasDistribution {
    pub cell: PasCellIndex,
    pub shift: PasPoint,
}
impl PasImage {
    /// Create a new [PasImage]. The ID is trimmed and upper-cased; the
    /// reticle ID must be non-empty.
    pub fn new(
        image_id: impl AsRef<str>,
        reticle_id: impl AsRef<str>,
        size: impl Into<PasPoint>,
        shift: impl Into<PasPoint>,
    ) -> PasResult<Self> {
        let reticle_id = reticle_id.as_ref().trim().to_string();
        if reticle_id.is_empty() {
            return Err(PasError::Invalid("reticle ID must be non-empty".into()));
        }
        Ok(Self {
            image_id: normalize_image_id(image_id.as_ref())?,
            reticle_id,
            size: size.into(),
            shift: shift.into(),
            distribution: Vec::new(),
            base_image_id: None,
        })
    }
    /// Rename this image. Applies the same trim & upper-case normalization as [PasImage::new].
    pub fn set_image_id(&mut self, image_id: impl AsRef<str>) -> PasResult<()> {
        self.image_id = normalize_image_id(image_id.as_ref())?;
        Ok(())
    }
    /// Add a placement of this image at cell `cell`, offset `shift` from the cell center.
    pub fn distribute(
        &mut self,
        cell: impl Into<PasCellIndex>,
        shift: impl Into<PasPoint>,
    ) -> PasResult<()> {
        if self.distribution.len() >= DEFAULTS.max_distributions_per_image {
            return Err(PasError::Invalid(format!(
                "image `{}` exceeds the machine limit of {} distributions",
                self.image_id, DEFAULTS.max_distributions_per_image
            )));
        }
        self.distribution.push(PasDistribution {
            cell: cell.into(),
            shift: shift.into(),
        });
        Ok(())
    }
}
fn normalize_image_id(id: &str) -> PasResult<String> {
    let id = id.trim().to_uppercase();
    if id.is_empty() {
        return Err(PasError::Invalid("image ID must be non-empty".into()));
    }
    Ok(id)
}

/// # Wafer Alignment Mark
///
/// A single printed alignment mark: an instance of one of the machine-library
/// mark images ([crate::images]) at a fixed wafer location.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct PasMark {
    /// Mark ID, unique within a job's alignment set
    pub mark_id: String,
    pub mark_type: PasMarkType,
    /// Mark center in wafer coordinates (mm)
    pub wafer_xy: PasPoint,
    /// Use only as a backup mark
    pub backup: bool,
}
impl PasMark {
    /// Create a new [PasMark]
    pub fn new(
        mark_id: impl AsRef<str>,
        mark_type: PasMarkType,
        wafer_xy: impl Into<PasPoint>,
    ) -> PasResult<Self> {
        let mark_id = mark_id.as_ref().trim().to_string();
        if mark_id.is_empty() {
            return Err(PasError::Invalid("mark ID must be non-empty".into()));
        }
        Ok(Self {
            mark_id,
            mark_type,
            wafer_xy: wafer_xy.into(),
            backup: false,
        })
    }
    /// Flag this mark as backup-only
    pub fn set_backup(&mut self, backup: bool) {
        self.backup = backup;
    }
}

/// # Wafer Alignment Strategy
///
/// Selects which marks global wafer alignment uses, with a preference tag per
/// mark and the number of marks the machine must successfully measure.
#[derive(Default, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct PasStrategy {
    /// Strategy ID, unique within a job
    pub strategy_id: String,
    /// IDs of the marks this strategy measures
    pub marks: Vec<String>,
    /// Preference tag per mark, parallel to `marks`
    pub preferences: Vec<PasMarkPreference>,
    /// Number of marks the machine must use. Defaults to all of `marks`.
    pub required_marks: Option<i64>,
}
impl PasStrategy {
    /// Create a new, empty [PasStrategy]
    pub fn new(strategy_id: impl AsRef<str>) -> PasResult<Self> {
        let strategy_id = strategy_id.as_ref().trim().to_string();
        if strategy_id.is_empty() {
            return Err(PasError::Invalid("strategy ID must be non-empty".into()));
        }
        Ok(Self {
            strategy_id,
            ..Default::default()
        })
    }
    /// Add `marks` to this strategy.
    ///
    /// Each mark must already be registered in `alignment`, the alignment set
    /// of the job this strategy will be attached to; a mark belonging to some
    /// other job (unknown ID, or an ID bound to different mark data) is
    /// rejected. `preference` applies to every mark in this call; when `None`,
    /// each mark's own backup flag decides.
    pub fn add_marks(
        &mut self,
        alignment: &PasAlignment,
        marks: &[&PasMark],
        preference: Option<PasMarkPreference>,
    ) -> PasResult<()> {
        for mark in marks {
            match alignment.mark(&mark.mark_id) {
                Some(known) if known == *mark => (),
                _ => {
                    let have: Vec<&str> =
                        alignment.marks.iter().map(|m| m.mark_id.as_str()).collect();
                    return Err(PasError::Invalid(format!(
                        "mark `{}` is not part of this job's alignment set (registered marks: {:?})",
                        mark.mark_id, have
                    )));
                }
            }
            if self.marks.iter().any(|id| id == &mark.mark_id) {
                return Err(PasError::Invalid(format!(
                    "mark `{}` is already part of strategy `{}`",
                    mark.mark_id, self.strategy_id
                )));
            }
            let pref = preference.unwrap_or(if mark.backup {
                PasMarkPreference::Backup
            } else {
                PasMarkPreference::Preferred
            });
            self.marks.push(mark.mark_id.clone());
            self.preferences.push(pref);
        }
        Ok(())
    }
    /// Set the number of marks the machine must successfully measure
    pub fn set_required_marks(&mut self, n: i64) -> PasResult<()> {
        if n < 1 {
            return Err(PasError::Invalid(format!(
                "strategy `{}`: required marks must be at least 1, not {}",
                self.strategy_id, n
            )));
        }
        self.required_marks = Some(n);
        Ok(())
    }
    /// Number of marks written to the NR_OF_MARKS_TO_USE fields
    pub fn required_marks(&self) -> i64 {
        self.required_marks.unwrap_or(self.marks.len() as i64)
    }
}

/// # Wafer Alignment Set
///
/// The marks printed on the wafer and the strategies that measure them.
/// An empty alignment set disables all alignment sections of the job file.
#[derive(Default, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct PasAlignment {
    pub marks: Vec<PasMark>,
    pub strategies: Vec<PasStrategy>,
}
impl PasAlignment {
    /// Look up a mark by ID
    pub fn mark(&self, mark_id: &str) -> Option<&PasMark> {
        self.marks.iter().find(|m| m.mark_id == mark_id)
    }
    /// Look up a strategy by ID
    pub fn strategy(&self, strategy_id: &str) -> Option<&PasStrategy> {
        self.strategies.iter().find(|s| s.strategy_id == strategy_id)
    }
    /// Whether alignment sections are enabled for the job
    pub fn enabled(&self) -> bool {
        !self.marks.is_empty()
    }
}

/// # Exposure Settings
///
/// Illumination settings for one image on one layer.
/// All fields default to the machine defaults ([crate::defaults::DEFAULTS]).
#[derive(Clone, Debug, Builder, Deserialize, Serialize, JsonSchema, PartialEq)]
#[builder(pattern = "owned", setter(into))]
pub struct PasExposure {
    /// Exposure energy (mJ/cm2)
    #[builder(default = "DEFAULTS.reticle.energy")]
    pub energy: f64,
    /// Focus offset (um)
    #[builder(default = "DEFAULTS.reticle.focus")]
    pub focus: f64,
    /// Focus tilt (urad)
    #[builder(default = "DEFAULTS.reticle.focus_tilt.into()")]
    pub focus_tilt: PasPoint,
    /// Numerical aperture of the projection lens
    #[builder(default = "DEFAULTS.reticle.numerical_aperture")]
    pub numerical_aperture: f64,
    /// Outer partial-coherence sigma
    #[builder(default = "DEFAULTS.reticle.sigma_outer")]
    pub sigma_outer: f64,
    /// Inner sigma, for annular illumination only
    #[builder(default)]
    pub sigma_inner: Option<f64>,
    #[builder(default)]
    pub illumination_mode: PasIlluminationMode,
}
impl Default for PasExposure {
    fn default() -> Self {
        Self {
            energy: DEFAULTS.reticle.energy,
            focus: DEFAULTS.reticle.focus,
            focus_tilt: DEFAULTS.reticle.focus_tilt.into(),
            numerical_aperture: DEFAULTS.reticle.numerical_aperture,
            sigma_outer: DEFAULTS.reticle.sigma_outer,
            sigma_inner: None,
            illumination_mode: PasIlluminationMode::Default,
        }
    }
}

/// An image exposed on a layer, with its exposure settings
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct PasLayerImage {
    pub image_id: String,
    pub exposure: PasExposure,
}

/// # Process Layer
///
/// One pass of the wafer through the machine: a set of images to expose,
/// the marks to print or measure, and per-layer process settings.
#[derive(Default, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct PasLayer {
    /// Layer ID. Sanitized on construction; may be empty, in which case the
    /// exporter falls back to the layer's position number.
    pub layer_id: String,
    /// Images exposed on this layer, with exposure settings
    pub exposed: Vec<PasLayerImage>,
    /// IDs of alignment marks printed (exposed) on this layer
    pub marks: Vec<String>,
    /// Strategy used for global wafer alignment on this layer
    pub global_strategy_id: Option<String>,
    /// Mark pair used for optical prealignment on this layer
    pub prealign_marks: Option<(String, String)>,
    /// This is the zero (first, mark-printing) layer
    pub zero: bool,
    /// Expose this layer in the same run as the zero layer
    pub combine_with_zero: bool,
    /// Enable shifted measurement scans
    pub shifted_measurement_scans: bool,
    pub layer_shift: Option<PasPoint>,
    /// Global level sensor points, wafer coordinates
    pub level_points: Option<[PasPoint; 3]>,
}
impl PasLayer {
    /// Create a new [PasLayer]. See [PasLayer::set_layer_id] for ID rules.
    pub fn new(layer_id: impl AsRef<str>) -> PasResult<Self> {
        Ok(Self {
            layer_id: sanitize_layer_id(layer_id.as_ref())?,
            ..Default::default()
        })
    }
    /// Set the layer ID. The ID is trimmed and upper-cased, limited to
    /// 15 characters from `A-Z 0-9 _ -`, and may be empty.
    pub fn set_layer_id(&mut self, layer_id: impl AsRef<str>) -> PasResult<()> {
        self.layer_id = sanitize_layer_id(layer_id.as_ref())?;
        Ok(())
    }
    /// Expose `image` on this layer with settings `exposure`.
    /// Each image may appear at most once per layer.
    pub fn expose_image(&mut self, image: &PasImage, exposure: PasExposure) -> PasResult<()> {
        if self.exposed.iter().any(|e| e.image_id == image.image_id) {
            return Err(PasError::Invalid(format!(
                "image `{}` is already exposed on layer `{}`",
                image.image_id, self.layer_id
            )));
        }
        self.exposed.push(PasLayerImage {
            image_id: image.image_id.clone(),
            exposure,
        });
        Ok(())
    }
    /// Print alignment `marks` on this layer, exposing each mark type's
    /// machine-library image with settings `exposure`. Typically used on the
    /// zero layer. Marks and images already present are skipped.
    pub fn expose_marks(&mut self, marks: &[&PasMark], exposure: PasExposure) -> PasResult<()> {
        for mark in marks {
            if !self.marks.iter().any(|id| id == &mark.mark_id) {
                self.marks.push(mark.mark_id.clone());
            }
            let image_id = &images::mark_image(mark.mark_type).image_id;
            if !self.exposed.iter().any(|e| &e.image_id == image_id) {
                self.exposed.push(PasLayerImage {
                    image_id: image_id.clone(),
                    exposure: exposure.clone(),
                });
            }
        }
        Ok(())
    }
    /// Use `strategy` for global wafer alignment on this layer
    pub fn set_global_strategy(&mut self, strategy: &PasStrategy) {
        self.global_strategy_id = Some(strategy.strategy_id.clone());
    }
    /// Use marks `m1` and `m2` for optical prealignment on this layer.
    ///
    /// Checks every mark-bounding-box vertex against the admissible window:
    /// inside `window.r_min..=window.r_max` from the wafer center and outside
    /// the four diagonal sectors the prealignment optics cannot reach. The two
    /// marks must additionally sit on roughly opposite sides of the wafer, at
    /// least 140 degrees apart. All violations are reported in one error.
    pub fn set_prealignment(
        &mut self,
        m1: &PasMark,
        m2: &PasMark,
        window: &PasPrealignWindow,
    ) -> PasResult<()> {
        let mut problems = Vec::new();
        let d = DEFAULTS.prealign_mark_half_side;
        for mark in [m1, m2] {
            for (dx, dy) in [(-d, -d), (-d, d), (d, -d), (d, d)] {
                let v = PasPoint::new(mark.wafer_xy.x + dx, mark.wafer_xy.y + dy);
                let r = v.radius();
                if r < window.r_min {
                    problems.push(format!(
                        "mark `{}` vertex ({:.3}, {:.3}) is inside the minimum prealignment radius {:.3}mm",
                        mark.mark_id, v.x, v.y, window.r_min
                    ));
                }
                if r > window.r_max {
                    problems.push(format!(
                        "mark `{}` vertex ({:.3}, {:.3}) is outside the maximum prealignment radius {:.3}mm",
                        mark.mark_id, v.x, v.y, window.r_max
                    ));
                }
                let ang = v.y.atan2(v.x).to_degrees();
                if forbidden_sector(ang) {
                    problems.push(format!(
                        "mark `{}` vertex ({:.3}, {:.3}) lies at {:.1} degrees, in a sector the prealignment optics cannot reach",
                        mark.mark_id, v.x, v.y, ang
                    ));
                }
            }
        }
        let a1 = m1.wafer_xy.y.atan2(m1.wafer_xy.x).to_degrees();
        let a2 = m2.wafer_xy.y.atan2(m2.wafer_xy.x).to_degrees();
        let mut sep = (a1 - a2).abs();
        if sep > 180.0 {
            sep = 360.0 - sep;
        }
        if sep < 140.0 {
            problems.push(format!(
                "marks `{}` and `{}` are only {:.1} degrees apart, prealignment needs at least 140",
                m1.mark_id, m2.mark_id, sep
            ));
        }
        if !problems.is_empty() {
            return Err(PasError::Geometry(problems.join("; ")));
        }
        self.prealign_marks = Some((m1.mark_id.clone(), m2.mark_id.clone()));
        Ok(())
    }
    /// Flag this layer as the zero (mark-printing) layer
    pub fn set_zero(&mut self, zero: bool) {
        self.zero = zero;
    }
    /// Expose this layer in the same run as the zero layer
    pub fn set_combine_with_zero(&mut self, combine: bool) {
        self.combine_with_zero = combine;
    }
    pub fn set_shifted_measurement_scans(&mut self, on: bool) {
        self.shifted_measurement_scans = on;
    }
    pub fn set_layer_shift(&mut self, shift: impl Into<PasPoint>) {
        self.layer_shift = Some(shift.into());
    }
    /// Layer shift, falling back to the machine default
    pub fn layer_shift(&self) -> PasPoint {
        self.layer_shift.unwrap_or_else(|| {
            warn!(layer = %self.layer_id, "layer shift unset, using default");
            DEFAULTS.process.layer_shift.into()
        })
    }
    pub fn set_level_points(&mut self, points: [PasPoint; 3]) {
        self.level_points = Some(points);
    }
    /// Global level sensor points, falling back to the machine default
    pub fn level_points(&self) -> [PasPoint; 3] {
        self.level_points.unwrap_or([
            DEFAULTS.reticle.global_level_point_1.into(),
            DEFAULTS.reticle.global_level_point_2.into(),
            DEFAULTS.reticle.global_level_point_3.into(),
        ])
    }
}
/// Sanitize a layer ID: trim, upper-case, and restrict to 15 characters from
/// `A-Z 0-9 _ -`. Empty IDs pass; the exporter numbers those layers instead.
fn sanitize_layer_id(id: &str) -> PasResult<String> {
    let id = id.trim().to_uppercase();
    if id.chars().count() > LAYER_ID_MAX {
        return Err(PasError::Invalid(format!(
            "layer ID `{}` is {} characters long, the maximum is {}",
            id,
            id.chars().count(),
            LAYER_ID_MAX
        )));
    }
    let bad: Vec<char> = id.chars().filter(|c| !LAYER_ID_CHARS.contains(*c)).collect();
    if !bad.is_empty() {
        return Err(PasError::Invalid(format!(
            "layer ID `{}` contains disallowed characters {:?}, only A-Z, 0-9, `_` and `-` are permitted",
            id, bad
        )));
    }
    Ok(id)
}
/// Whether polar angle `ang` (degrees) falls in one of the four diagonal
/// sectors the prealignment optics cannot reach.
fn forbidden_sector(ang: f64) -> bool {
    (20.0..=70.0).contains(&ang)
        || (110.0..=160.0).contains(&ang)
        || (-70.0..=-20.0).contains(&ang)
        || (-160.0..=-110.0).contains(&ang)
}

/// # Wafer Cell Grid
///
/// The rectangular grid of exposure cells covering the wafer, plus the wafer
/// edge clearances that decide which cells are usable. Every field is
/// optional; getters fall back to the machine defaults with a warning.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct PasCell {
    pub cell_size: Option<PasPoint>,
    pub matrix_shift: Option<PasPoint>,
    pub number_dies: Option<(i64, i64)>,
    pub min_number_dies: Option<i64>,
    pub round_edge_clearance: Option<f64>,
    pub flat_edge_clearance: Option<f64>,
    pub edge_exclusion: Option<f64>,
    /// Whether the wafer has a primary flat. Notched wafers set this false.
    pub flat_enabled: bool,
    /// Chord length of the primary flat (mm)
    pub flat_length: Option<f64>,
}
impl Default for PasCell {
    fn default() -> Self {
        Self {
            cell_size: None,
            matrix_shift: None,
            number_dies: None,
            min_number_dies: None,
            round_edge_clearance: None,
            flat_edge_clearance: None,
            edge_exclusion: None,
            flat_enabled: true,
            flat_length: None,
        }
    }
}
impl PasCell {
    /// Set the cell size (mm). Both components must be at least the machine
    /// minimum of [crate::defaults::DEFAULTS].`min_cell_size`.
    pub fn set_cell_size(&mut self, size: impl Into<PasPoint>) -> PasResult<()> {
        let size = size.into();
        if size.x < DEFAULTS.min_cell_size || size.y < DEFAULTS.min_cell_size {
            return Err(PasError::Invalid(format!(
                "cell size ({}, {}) is below the machine minimum of {}mm",
                size.x, size.y, DEFAULTS.min_cell_size
            )));
        }
        self.cell_size = Some(size);
        Ok(())
    }
    /// Set the matrix shift (mm): the offset of cell (0, 0)'s center from the
    /// wafer center. Shifts of half a cell or more re-index the whole grid.
    pub fn set_matrix_shift(&mut self, shift: impl Into<PasPoint>) {
        let shift = shift.into();
        let size = self.cell_size();
        if shift.x.abs() >= size.x / 2.0 || shift.y.abs() >= size.y / 2.0 {
            warn!(
                x = shift.x,
                y = shift.y,
                "matrix shift of half a cell or more re-indexes the cell grid"
            );
        }
        self.matrix_shift = Some(shift);
    }
    pub fn set_number_dies(&mut self, dies: (i64, i64)) {
        self.number_dies = Some(dies);
    }
    pub fn set_min_number_dies(&mut self, n: i64) {
        self.min_number_dies = Some(n);
    }
    pub fn set_round_edge_clearance(&mut self, mm: f64) {
        self.round_edge_clearance = Some(mm);
    }
    pub fn set_flat_edge_clearance(&mut self, mm: f64) {
        self.flat_edge_clearance = Some(mm);
    }
    pub fn set_edge_exclusion(&mut self, mm: f64) {
        self.edge_exclusion = Some(mm);
    }
    pub fn set_flat_enabled(&mut self, on: bool) {
        self.flat_enabled = on;
    }
    pub fn set_flat_length(&mut self, mm: f64) {
        self.flat_length = Some(mm);
    }

    pub fn cell_size(&self) -> PasPoint {
        self.cell_size.unwrap_or_else(|| {
            warn!("cell size unset, using default");
            DEFAULTS.cell_size.into()
        })
    }
    pub fn matrix_shift(&self) -> PasPoint {
        self.matrix_shift.unwrap_or_else(|| DEFAULTS.matrix_shift.into())
    }
    pub fn number_dies(&self) -> (i64, i64) {
        self.number_dies.unwrap_or(DEFAULTS.number_dies)
    }
    pub fn min_number_dies(&self) -> i64 {
        self.min_number_dies.unwrap_or(DEFAULTS.min_number_dies)
    }
    pub fn round_edge_clearance(&self) -> f64 {
        self.round_edge_clearance.unwrap_or(DEFAULTS.round_edge_clearance)
    }
    pub fn flat_edge_clearance(&self) -> f64 {
        self.flat_edge_clearance.unwrap_or(DEFAULTS.flat_edge_clearance)
    }
    pub fn edge_exclusion(&self) -> f64 {
        self.edge_exclusion.unwrap_or(DEFAULTS.edge_exclusion)
    }
    pub fn flat_length(&self) -> f64 {
        self.flat_length.unwrap_or(DEFAULTS.wfr_flat_length)
    }
}

/// # Prealignment Admissibility Window
///
/// Radial band in which optical prealignment marks may sit.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct PasPrealignWindow {
    pub r_min: f64,
    pub r_max: f64,
}

/// # Pas Exposure Job
///
/// Root of the job object model. Owns the cell grid, images, layers, and the
/// alignment set; [PasJob::export] writes the machine-readable ASCII job file.
#[derive(Default, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct PasJob {
    /// Three job-comment lines, up to 50 ASCII characters each
    pub comment: Option<[String; 3]>,
    /// Expose partially-on-wafer (edge) cells
    pub expose_edge_die: bool,
    pub wafer_diameter: Option<f64>,
    pub lens_reduction: Option<f64>,
    pub cell: PasCell,
    pub images: Vec<PasImage>,
    pub layers: Vec<PasLayer>,
    pub alignment: PasAlignment,
    /// Set by layer organization when a combine-with-zero layer exists
    pub combined_zero_first: bool,
}
impl SerdeFile for PasJob {}
impl PasJob {
    /// Create a new, empty [PasJob]
    pub fn new() -> Self {
        Self::default()
    }
    /// Set the three job-comment lines. Each is limited to 50 ASCII characters.
    pub fn set_comment(
        &mut self,
        line1: impl Into<String>,
        line2: impl Into<String>,
        line3: impl Into<String>,
    ) -> PasResult<()> {
        let lines = [line1.into(), line2.into(), line3.into()];
        for (i, line) in lines.iter().enumerate() {
            if !line.is_ascii() {
                return Err(PasError::Invalid(format!(
                    "comment line {} contains non-ASCII characters",
                    i + 1
                )));
            }
            if line.len() > COMMENT_MAX {
                return Err(PasError::Invalid(format!(
                    "comment line {} is {} characters long, the maximum is {}",
                    i + 1,
                    line.len(),
                    COMMENT_MAX
                )));
            }
        }
        self.comment = Some(lines);
        Ok(())
    }
    /// The job-comment lines, falling back to the defaults
    pub fn comment(&self) -> [String; 3] {
        self.comment.clone().unwrap_or_else(|| {
            warn!("job comment unset, using default");
            DEFAULTS.comment.map(String::from)
        })
    }
    /// Enable or disable exposure of edge cells. Enabling also widens the
    /// per-cell die count so the machine accepts partial cells.
    pub fn set_expose_edge_die(&mut self, on: bool) {
        self.expose_edge_die = on;
        if on {
            self.cell.number_dies = Some((10, 10));
            self.cell.min_number_dies = Some(1);
        } else {
            self.cell.number_dies = None;
            self.cell.min_number_dies = None;
        }
    }
    pub fn set_wafer_diameter(&mut self, mm: f64) -> PasResult<()> {
        if mm <= 0.0 {
            return Err(PasError::Invalid(format!(
                "wafer diameter must be positive, not {}",
                mm
            )));
        }
        self.wafer_diameter = Some(mm);
        Ok(())
    }
    pub fn wafer_diameter(&self) -> f64 {
        self.wafer_diameter.unwrap_or(DEFAULTS.wfr_diameter)
    }
    pub fn set_lens_reduction(&mut self, reduction: f64) -> PasResult<()> {
        if reduction <= 0.0 {
            return Err(PasError::Invalid(format!(
                "lens reduction must be positive, not {}",
                reduction
            )));
        }
        self.lens_reduction = Some(reduction);
        Ok(())
    }
    pub fn lens_reduction(&self) -> f64 {
        self.lens_reduction.unwrap_or(DEFAULTS.lens_reduction)
    }

    /// Add `image` to the job. Image IDs must be unique.
    pub fn add_image(&mut self, image: PasImage) -> PasResult<()> {
        if self.image(&image.image_id).is_some() {
            return Err(PasError::Invalid(format!(
                "an image with ID `{}` is already part of this job",
                image.image_id
            )));
        }
        self.images.push(image);
        Ok(())
    }
    pub fn add_images(&mut self, images: Vec<PasImage>) -> PasResult<()> {
        for image in images {
            self.add_image(image)?;
        }
        Ok(())
    }
    /// Add alignment mark `mark` to the job. Mark IDs must be unique.
    ///
    /// Also instantiates the machine-library image for the mark's type into
    /// the job's image list (once per type), recording the library image as
    /// its base image.
    pub fn add_mark(&mut self, mark: PasMark) -> PasResult<()> {
        if self.alignment.mark(&mark.mark_id).is_some() {
            return Err(PasError::Invalid(format!(
                "a mark with ID `{}` is already part of this job",
                mark.mark_id
            )));
        }
        let canonical = images::mark_image(mark.mark_type);
        match self.image_mut(&canonical.image_id) {
            Some(img) => img.base_image_id = Some(canonical.image_id.clone()),
            None => {
                let mut img = canonical.clone();
                img.base_image_id = Some(canonical.image_id.clone());
                self.images.push(img);
            }
        }
        self.alignment.marks.push(mark);
        Ok(())
    }
    pub fn add_marks(&mut self, marks: Vec<PasMark>) -> PasResult<()> {
        for mark in marks {
            self.add_mark(mark)?;
        }
        Ok(())
    }
    /// Add `strategy` to the job's alignment set. Strategy IDs must be
    /// unique, and every mark the strategy references must be registered.
    pub fn add_strategy(&mut self, strategy: PasStrategy) -> PasResult<()> {
        if self.alignment.strategy(&strategy.strategy_id).is_some() {
            return Err(PasError::Invalid(format!(
                "a strategy with ID `{}` is already part of this job",
                strategy.strategy_id
            )));
        }
        let missing: Vec<&str> = strategy
            .marks
            .iter()
            .filter(|id| self.alignment.mark(id).is_none())
            .map(|id| id.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(PasError::Invalid(format!(
                "strategy `{}` references marks {:?} which are not part of this job",
                strategy.strategy_id, missing
            )));
        }
        self.alignment.strategies.push(strategy);
        Ok(())
    }
    /// Append `layer` to the job's layer list. Order is preserved up to the
    /// zero/combine reordering applied at export.
    pub fn add_layer(&mut self, layer: PasLayer) {
        self.layers.push(layer);
    }
    pub fn add_layers(&mut self, layers: Vec<PasLayer>) {
        self.layers.extend(layers);
    }

    /// Look up an image by ID
    pub fn image(&self, image_id: &str) -> Option<&PasImage> {
        self.images.iter().find(|i| i.image_id == image_id)
    }
    pub fn image_mut(&mut self, image_id: &str) -> Option<&mut PasImage> {
        self.images.iter_mut().find(|i| i.image_id == image_id)
    }

    /// The admissible radial window for optical prealignment marks on this
    /// job's wafer
    pub fn prealign_window(&self) -> PasPrealignWindow {
        PasPrealignWindow {
            r_min: DEFAULTS.prealign_r_min,
            r_max: self.wafer_diameter() / 2.0 - self.cell.round_edge_clearance(),
        }
    }

    /// Wafer coordinates of the point `offset` from the center of `cell`
    pub fn cell_to_wafer(
        &self,
        cell: impl Into<PasCellIndex>,
        offset: impl Into<PasPoint>,
    ) -> PasPoint {
        geom::cell_to_wafer(&self.cell, cell.into(), offset.into())
    }
    /// Cell index and in-cell offset of wafer-coordinate point `wafer_xy`
    pub fn wafer_to_cell(&self, wafer_xy: impl Into<PasPoint>) -> (PasCellIndex, PasPoint) {
        geom::wafer_to_cell(&self.cell, wafer_xy.into())
    }
    /// All cells usable under this job's edge-die policy, in sweep order
    pub fn valid_cells(&self) -> PasResult<Vec<PasCellIndex>> {
        geom::valid_cells(self)
    }
    /// Whether `cell` is usable under this job's edge-die policy
    pub fn is_valid_cell(&self, cell: impl Into<PasCellIndex>) -> PasResult<bool> {
        let cell = cell.into();
        Ok(self.valid_cells()?.contains(&cell))
    }

    /// Check every cross-reference held by the job's layers and strategies.
    /// All dangling references are reported in a single error.
    pub fn validate_refs(&self) -> PasResult<()> {
        let mut problems = Vec::new();
        for (i, layer) in self.layers.iter().enumerate() {
            let name = if layer.layer_id.is_empty() {
                format!("#{}", i)
            } else {
                layer.layer_id.clone()
            };
            for exposed in &layer.exposed {
                if self.image(&exposed.image_id).is_none() {
                    problems.push(format!(
                        "layer `{}` exposes image `{}` which is not part of this job",
                        name, exposed.image_id
                    ));
                }
            }
            for mark_id in &layer.marks {
                if self.alignment.mark(mark_id).is_none() {
                    problems.push(format!(
                        "layer `{}` prints mark `{}` which is not part of this job",
                        name, mark_id
                    ));
                }
            }
            if let Some(sid) = &layer.global_strategy_id {
                if self.alignment.strategy(sid).is_none() {
                    problems.push(format!(
                        "layer `{}` selects strategy `{}` which is not part of this job",
                        name, sid
                    ));
                }
            }
            if let Some((m1, m2)) = &layer.prealign_marks {
                for mid in [m1, m2] {
                    if self.alignment.mark(mid).is_none() {
                        problems.push(format!(
                            "layer `{}` prealigns on mark `{}` which is not part of this job",
                            name, mid
                        ));
                    }
                }
            }
        }
        for strategy in &self.alignment.strategies {
            for mark_id in &strategy.marks {
                if self.alignment.mark(mark_id).is_none() {
                    problems.push(format!(
                        "strategy `{}` references mark `{}` which is not part of this job",
                        strategy.strategy_id, mark_id
                    ));
                }
            }
        }
        if !problems.is_empty() {
            return Err(PasError::Invalid(problems.join("; ")));
        }
        Ok(())
    }

    /// Organize, validate, and render the job into PAS ASCII job-file format.
    /// Reorders the layer list (zero layer first, combine-with-zero second).
    pub fn to_ascii(&mut self) -> PasResult<String> {
        organize::organize_layers(self)?;
        self.validate_refs()?;
        write::to_string(self)
    }
    /// Export the job to ASCII job-file `fname`.
    ///
    /// The whole file content is generated, and all validation passes, before
    /// the target path is touched; a failing job never clobbers an existing
    /// file. Refuses to replace an existing file unless `overwrite` is set.
    pub fn export(&mut self, fname: impl AsRef<Path>, overwrite: bool) -> PasResult<()> {
        let ascii = self.to_ascii()?;
        let fname = fname.as_ref();
        if fname.exists() {
            if !overwrite {
                return Err(PasError::Invalid(format!(
                    "file `{}` already exists, pass overwrite=true to replace it",
                    fname.display()
                )));
            }
            warn!(file = %fname.display(), "overwriting existing job file");
        }
        std::fs::write(fname, ascii)?;
        Ok(())
    }
}

/// # Pas Error Enumeration
#[derive(Debug)]
pub enum PasError {
    /// Structural or validation failures
    Invalid(String),
    /// Geometric admissibility failures
    Geometry(String),
    /// Wrapped errors from other crates
    Boxed(Box<dyn Error + Send + Sync>),
    /// Uncategorized errors
    Str(String),
}
impl From<std::io::Error> for PasError {
    fn from(e: std::io::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl From<crate::utils::Error> for PasError {
    fn from(e: crate::utils::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl From<String> for PasError {
    fn from(e: String) -> Self {
        Self::Str(e)
    }
}
impl From<&str> for PasError {
    fn from(e: &str) -> Self {
        Self::Str(e.to_string())
    }
}
impl fmt::Display for PasError {
    /// Delegate down to the (derived) [fmt::Debug] implementation
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
impl Error for PasError {}

pub type PasResult<T> = Result<T, PasError>;
