//!
//! # Pas Job-File Writer Module
//!
//! Renders a [PasJob] into the machine's fixed-format ASCII job file:
//! keyworded `START_SECTION` / `END_SECTION` blocks, three-space tabs, and
//! values starting at column 50. Strings are double-quoted, floats carry six
//! decimals, and cell indices are written as quoted integer pairs.
//!
//! Section order and the blank-line runs separating the section groups are
//! fixed; the job-definition software on the machine side is picky about both.
//!

// Standard Lib Imports
use std::io::Write;
use std::path::Path;

// Crates.io Imports
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;

// Local imports
use crate::data::*;
use crate::defaults::DEFAULTS;
use crate::enumstr;
use crate::images;
use crate::utils::EnumStr;

/// Tab prefixing every field line
const TAB: &str = "   ";
/// Column at which field values start
const COL1: usize = 50;

/// Write an (organized) [PasJob] to job-file `fname`.
/// See [PasJob::export] for the validating, overwrite-checked entry point.
pub fn save(job: &PasJob, fname: impl AsRef<Path>) -> PasResult<()> {
    let f = std::fs::File::create(fname)?;
    PasWriter::new(f).write_job(job)
}
/// Write a [PasJob] to job-file-format [String].
pub fn to_string(job: &PasJob) -> PasResult<String> {
    let mut buf = Vec::new();
    PasWriter::new(&mut buf).write_job(job)?;
    let rv = std::str::from_utf8(buf.as_slice()).unwrap().to_string();
    Ok(rv)
}

enumstr!(
    /// # Job-File Section Names
    /// In the order the sections appear in the file.
    PasSection {
        General: "GENERAL",
        AlignmentMark: "ALIGNMENT_MARK",
        WfrAlignStrategy: "WFR_ALIGN_STRATEGY",
        MarkAlignment: "MARK_ALIGNMENT",
        ImageDefinition: "IMAGE_DEFINITION",
        ImageDistribution: "IMAGE_DISTRIBUTION",
        LayerDefinition: "LAYER_DEFINITION",
        MarksSelection: "MARKS_SELECTION",
        StrategySelection: "STRATEGY_SELECTION",
        ProcessData: "PROCESS_DATA",
        ReticleData: "RETICLE_DATA",
    }
);

enumstr!(
    /// # Job-File Field Keywords
    /// Everything the writer emits on the left-hand side of a field line.
    PasKey {
        Comment: "COMMENT",
        MachineType: "MACHINE_TYPE",
        ReticleSize: "RETICLE_SIZE",
        WfrDiameter: "WFR_DIAMETER",
        WfrNotch: "WFR_NOTCH",
        CellSize: "CELL_SIZE",
        RoundEdgeClearance: "ROUND_EDGE_CLEARANCE",
        FlatEdgeClearance: "FLAT_EDGE_CLEARANCE",
        EdgeExclusion: "EDGE_EXCLUSION",
        CoverMode: "COVER_MODE",
        NumberDies: "NUMBER_DIES",
        MinNumberDies: "MIN_NUMBER_DIES",
        PlacementMode: "PLACEMENT_MODE",
        MatrixShift: "MATRIX_SHIFT",
        PrealignMethod: "PREALIGN_METHOD",
        CombineZeroFirst: "COMBINE_ZERO_FIRST",
        WaferRotation: "WAFER_ROTATION",
        MatchingSetId: "MATCHING_SET_ID",

        MarkId: "MARK_ID",
        ImageId: "IMAGE_ID",
        MarkEdgeClearance: "MARK_EDGE_CLEARANCE",
        WaferSide: "WAFER_SIDE",
        MarkLocation: "MARK_LOCATION",

        StrategyId: "STRATEGY_ID",
        WaferAlignmentMethod: "WAFER_ALIGNMENT_METHOD",
        NrOfMarksToUse: "NR_OF_MARKS_TO_USE",
        NrOfXMarksToUse: "NR_OF_X_MARKS_TO_USE",
        NrOfYMarksToUse: "NR_OF_Y_MARKS_TO_USE",
        MinMarkDistanceCoarse: "MIN_MARK_DISTANCE_COARSE",
        MinMarkDistance: "MIN_MARK_DISTANCE",
        Max8088MarkShift: "MAX_80_88_MARK_SHIFT",
        MaxMarkResidue: "MAX_MARK_RESIDUE",
        SpmMarkScan: "SPM_MARK_SCAN",
        CorrWaferGrid: "CORR_WAFER_GRID",
        ErrDetection888: "ERR_DETECTION_88_8",
        GridOptimisationAlgorithm: "GRID_OPTIMISATION_ALGORITHM",
        FlyerRemovalThreshold: "FLYER_REMOVAL_THRESHOLD",
        AlignmentMonitoring: "ALIGNMENT_MONITORING",
        GlblMarkUsage: "GLBL_MARK_USAGE",
        MarkPreference: "MARK_PREFERENCE",

        ReticleId: "RETICLE_ID",
        ImageSize: "IMAGE_SIZE",
        ImageShift: "IMAGE_SHIFT",
        MaskSize: "MASK_SIZE",
        MaskShift: "MASK_SHIFT",
        BaseImageId: "BASE_IMAGE_ID",
        VariantId: "VARIANT_ID",
        CellSelection: "CELL_SELECTION",
        DistributionAction: "DISTRIBUTION_ACTION",
        OptimizeRoute: "OPTIMIZE_ROUTE",
        ImageCellShift: "IMAGE_CELL_SHIFT",

        LayerNo: "LAYER_NO",
        LayerId: "LAYER_ID",
        StrategyUsage: "STRATEGY_USAGE",

        LensReduction: "LENS_REDUCTION",
        Calibration: "CALIBRATION",
        OpticalPrealignment: "OPTICAL_PREALIGNMENT",
        OptPrealignMarks: "OPT_PREALIGN_MARKS",
        GlblWfrAlignment: "GLBL_WFR_ALIGNMENT",
        CooReduction: "COO_REDUCTION",
        MinNumberPulsesInSlit: "MIN_NUMBER_PULSES_IN_SLIT",
        MinNumberPulses: "MIN_NUMBER_PULSES",
        SkipCoarseWaferAlign: "SKIP_COARSE_WAFER_ALIGN",
        ReduceReticleAlign: "REDUCE_RETICLE_ALIGN",
        ReduceRaDrift: "REDUCE_RA_DRIFT",
        ReduceRaInterval: "REDUCE_RA_INTERVAL",
        RetCoolCorr: "RET_COOL_CORR",
        RetCoolTime: "RET_COOL_TIME",
        RetCoolStartOnLoad: "RET_COOL_START_ON_LOAD",
        RetCoolUsage: "RET_COOL_USAGE",
        GlblRtclAlignment: "GLBL_RTCL_ALIGNMENT",
        GlblOverlayEnhancement: "GLBL_OVERLAY_ENHANCEMENT",
        GlblSymAlignment: "GLBL_SYM_ALIGNMENT",
        WaferAlignRepeats: "WAFER_ALIGN_REPEATS",
        NrWaferAlignRepeats: "NR_WAFER_ALIGN_REPEATS",
        AlignRepeatInterval: "ALIGN_REPEAT_INTERVAL",
        SmartRepeatCount: "SMART_REPEAT_COUNT",
        SmartRepeatThreshold: "SMART_REPEAT_THRESHOLD",
        LayerShift: "LAYER_SHIFT",
        Max8088Shift: "MAX_80_88_SHIFT",
        CorrInterFldExpansion: "CORR_INTER_FLD_EXPANSION",
        CorrInterFldNonortho: "CORR_INTER_FLD_NONORTHO",
        CorrInterFldRotation: "CORR_INTER_FLD_ROTATION",
        CorrInterFldTranslation: "CORR_INTER_FLD_TRANSLATION",
        CorrIntraFldMagnification: "CORR_INTRA_FLD_MAGNIFICATION",
        CorrIntraFldRotation: "CORR_INTRA_FLD_ROTATION",
        CorrIntraFldTranslation: "CORR_INTRA_FLD_TRANSLATION",
        CorrIntraFldAsymRotation: "CORR_INTRA_FLD_ASYM_ROTATION",
        CorrIntraFldAsymMagn: "CORR_INTRA_FLD_ASYM_MAGN",
        CorrPrealignRotation: "CORR_PREALIGN_ROTATION",
        CorrPrealignTranslation: "CORR_PREALIGN_TRANSLATION",
        Corr8088MarkShift: "CORR_80_88_MARK_SHIFT",
        CorrLensHeating: "CORR_LENS_HEATING",
        RtclCheckSurfaces: "RTCL_CHECK_SURFACES",
        RtclCheckLimitsUpper: "RTCL_CHECK_LIMITS_UPPER",
        RtclCheckLimitsLower: "RTCL_CHECK_LIMITS_LOWER",
        AlignmentMethod: "ALIGNMENT_METHOD",
        CloseGreenLaserShutter: "CLOSE_GREEN_LASER_SHUTTER",
        RealignmentMethod: "REALIGNMENT_METHOD",
        ImageOrderOptimisation: "IMAGE_ORDER_OPTIMISATION",
        ReticleAlignment: "RETICLE_ALIGNMENT",
        UseDefaultReticleAlignmentMethod: "USE_DEFAULT_RETICLE_ALIGNMENT_METHOD",
        CriticalPercentage: "CRITICAL_PERCENTAGE",
        ShareLevelInfo: "SHARE_LEVEL_INFO",
        FocusEdgeClearance: "FOCUS_EDGE_CLEARANCE",
        InlineQAbovePCalibration: "INLINE_Q_ABOVE_P_CALIBRATION",
        ShiftedMeasurementScans: "SHIFTED_MEASUREMENT_SCANS",
        FocusMonitoring: "FOCUS_MONITORING",
        FocusMonitoringScanner: "FOCUS_MONITORING_SCANNER",
        DynPerfMonitoring: "DYN_PERF_MONITORING",
        ForceMeanderEnabled: "FORCE_MEANDER_ENABLED",

        ImageUsage: "IMAGE_USAGE",
        EnergyActual: "ENERGY_ACTUAL",
        FocusActual: "FOCUS_ACTUAL",
        FocusTilt: "FOCUS_TILT",
        NumericalAperture: "NUMERICAL_APERTURE",
        SigmaOuter: "SIGMA_OUTER",
        SigmaInner: "SIGMA_INNER",
        ImageExposureOrder: "IMAGE_EXPOSURE_ORDER",
        LithographyProcess: "LITHOGRAPHY_PROCESS",
        ImageIntraFldCorTrans: "IMAGE_INTRA_FLD_COR_TRANS",
        ImageIntraFldCorRot: "IMAGE_INTRA_FLD_COR_ROT",
        ImageIntraFldCorMag: "IMAGE_INTRA_FLD_COR_MAG",
        ImageIntraFldCorAsymRot: "IMAGE_INTRA_FLD_COR_ASYM_ROT",
        ImageIntraFldCorAsymMag: "IMAGE_INTRA_FLD_COR_ASYM_MAG",
        LevelMethodZ: "LEVEL_METHOD_Z",
        LevelMethodRx: "LEVEL_METHOD_RX",
        LevelMethodRy: "LEVEL_METHOD_RY",
        DieSizeDependency: "DIE_SIZE_DEPENDENCY",
        EnableEfese: "ENABLE_EFESE",
        CdFecMode: "CD_FEC_MODE",
        DoseCorrection: "DOSE_CORRECTION",
        DoseCriticalImage: "DOSE_CRITICAL_IMAGE",
        GlobalLevelPoint1: "GLOBAL_LEVEL_POINT_1",
        GlobalLevelPoint2: "GLOBAL_LEVEL_POINT_2",
        GlobalLevelPoint3: "GLOBAL_LEVEL_POINT_3",
    }
);

/// # Pas Job-File Writing Helper
pub struct PasWriter<'wr> {
    /// Write Destination
    dest: Box<dyn Write + 'wr>,
}
impl<'wr> PasWriter<'wr> {
    /// Create a new [PasWriter] to destination `dest`.
    /// Destination is boxed internally.
    fn new(dest: impl Write + 'wr) -> Self {
        Self {
            dest: Box::new(dest),
        }
    }
    /// Write `job` to the destination, in machine section order.
    /// Assumes the layer list has been organized; see [PasJob::to_ascii].
    fn write_job(&mut self, job: &PasJob) -> PasResult<()> {
        // Layers without an ID are renumbered to their position
        let layer_ids: Vec<String> = job
            .layers
            .iter()
            .enumerate()
            .map(|(i, l)| {
                if l.layer_id.is_empty() {
                    warn!(layer = i, "layer has no ID, falling back to its number");
                    i.to_string()
                } else {
                    l.layer_id.clone()
                }
            })
            .collect();
        let align = job.alignment.enabled();

        self.blank(2)?;
        self.write_general(job)?;
        self.blank(5)?;
        if align {
            self.write_alignment_marks(job)?;
            self.blank(5)?;
            self.write_strategies(job)?;
            self.blank(5)?;
            self.write_mark_alignment(job)?;
            self.blank(5)?;
        }
        self.write_image_definitions(job)?;
        self.blank(5)?;
        self.write_image_distributions(job)?;
        self.blank(5)?;
        self.write_layer_definitions(job, &layer_ids)?;
        self.blank(4)?;
        self.write_marks_selection(job, &layer_ids)?;
        self.blank(5)?;
        self.write_strategy_selection(job, &layer_ids)?;
        self.blank(5)?;
        self.write_process_data(job, &layer_ids, align)?;
        self.blank(5)?;
        self.write_reticle_data(job, &layer_ids)?;
        Ok(())
    }
    fn write_general(&mut self, job: &PasJob) -> PasResult<()> {
        use PasKey::*;
        let comment = job.comment();
        self.start_section(PasSection::General)?;
        self.str_field(Comment, &comment[0])?;
        self.continuation(&comment[1])?;
        self.continuation(&comment[2])?;
        self.str_field(MachineType, DEFAULTS.machine_type)?;
        self.int_field(ReticleSize, DEFAULTS.reticle_size)?;
        self.f64_field(WfrDiameter, job.wafer_diameter())?;
        self.str_field(WfrNotch, DEFAULTS.wfr_notch)?;
        self.xy_field(CellSize, job.cell.cell_size())?;
        self.f64_field(RoundEdgeClearance, job.cell.round_edge_clearance())?;
        self.f64_field(FlatEdgeClearance, job.cell.flat_edge_clearance())?;
        self.f64_field(EdgeExclusion, job.cell.edge_exclusion())?;
        self.str_field(CoverMode, DEFAULTS.cover_mode)?;
        self.int_pair_field(NumberDies, job.cell.number_dies())?;
        self.int_field(MinNumberDies, job.cell.min_number_dies())?;
        self.str_field(PlacementMode, DEFAULTS.placement_mode)?;
        self.xy_field(MatrixShift, job.cell.matrix_shift())?;
        self.str_field(PrealignMethod, DEFAULTS.prealign_method)?;
        if job.combined_zero_first {
            self.str_field(CombineZeroFirst, "Y")?;
        } else {
            self.str_field(CombineZeroFirst, DEFAULTS.combine_zero_first)?;
        }
        self.f64_field(WaferRotation, DEFAULTS.wafer_rotation)?;
        self.str_field(MatchingSetId, DEFAULTS.matching_set_id)?;
        self.end_section()?;
        Ok(())
    }
    fn write_alignment_marks(&mut self, job: &PasJob) -> PasResult<()> {
        use PasKey::*;
        for mark in &job.alignment.marks {
            self.start_section(PasSection::AlignmentMark)?;
            self.str_field(MarkId, &mark.mark_id)?;
            self.str_field(ImageId, &images::mark_image(mark.mark_type).image_id)?;
            self.str_field(MarkEdgeClearance, DEFAULTS.mark_edge_clearance)?;
            self.str_field(WaferSide, DEFAULTS.mark_wafer_side)?;
            self.xy_field(MarkLocation, mark.wafer_xy)?;
            self.end_section()?;
            self.blank(1)?;
        }
        Ok(())
    }
    fn write_strategies(&mut self, job: &PasJob) -> PasResult<()> {
        use PasKey::*;
        let d = &DEFAULTS.strategy;
        for strategy in &job.alignment.strategies {
            self.start_section(PasSection::WfrAlignStrategy)?;
            self.str_field(StrategyId, &strategy.strategy_id)?;
            self.str_field(WaferAlignmentMethod, d.wafer_alignment_method)?;
            self.int_field(NrOfMarksToUse, strategy.required_marks())?;
            self.int_field(NrOfXMarksToUse, strategy.required_marks())?;
            self.int_field(NrOfYMarksToUse, strategy.required_marks())?;
            self.f64_field(MinMarkDistanceCoarse, d.min_mark_distance_coarse)?;
            self.int_field(MinMarkDistance, d.min_mark_distance)?;
            self.f64_field(Max8088MarkShift, d.max_80_88_mark_shift)?;
            self.f64_field(MaxMarkResidue, d.max_mark_residue)?;
            self.str_field(SpmMarkScan, d.spm_mark_scan)?;
            self.str_field(CorrWaferGrid, d.corr_wafer_grid)?;
            self.str_field(ErrDetection888, d.err_detection_88_8)?;
            self.str_field(GridOptimisationAlgorithm, d.grid_optimisation_algorithm)?;
            self.f64_field(FlyerRemovalThreshold, d.flyer_removal_threshold)?;
            self.str_field(AlignmentMonitoring, d.alignment_monitoring)?;
            self.end_section()?;
        }
        Ok(())
    }
    fn write_mark_alignment(&mut self, job: &PasJob) -> PasResult<()> {
        use PasKey::*;
        for strategy in &job.alignment.strategies {
            for (mark_id, pref) in strategy.marks.iter().zip(strategy.preferences.iter()) {
                self.start_section(PasSection::MarkAlignment)?;
                self.str_field(StrategyId, &strategy.strategy_id)?;
                self.str_field(MarkId, mark_id)?;
                self.str_field(GlblMarkUsage, DEFAULTS.strategy.glbl_mark_usage)?;
                self.str_field(PasKey::MarkPreference, pref.to_str())?;
                self.end_section()?;
                self.blank(1)?;
            }
            self.blank(2)?;
        }
        Ok(())
    }
    fn write_image_definitions(&mut self, job: &PasJob) -> PasResult<()> {
        use PasKey::*;
        for image in &job.images {
            self.start_section(PasSection::ImageDefinition)?;
            self.str_field(ImageId, &image.image_id)?;
            self.str_field(ReticleId, &image.reticle_id)?;
            self.xy_field(ImageSize, image.size)?;
            self.xy_field(ImageShift, image.shift)?;
            self.xy_field(MaskSize, image.size)?;
            self.xy_field(MaskShift, image.shift)?;
            if let Some(ref base) = image.base_image_id {
                self.str_field(BaseImageId, base)?;
            }
            self.str_field(VariantId, DEFAULTS.image_variant_id)?;
            self.end_section()?;
            self.blank(1)?;
        }
        Ok(())
    }
    fn write_image_distributions(&mut self, job: &PasJob) -> PasResult<()> {
        use PasKey::*;
        for image in &job.images {
            for dist in &image.distribution {
                self.blank(1)?;
                self.start_section(PasSection::ImageDistribution)?;
                self.str_field(ImageId, &image.image_id)?;
                self.cell_field(CellSelection, dist.cell)?;
                self.str_field(DistributionAction, DEFAULTS.image_distribution_action)?;
                self.str_field(OptimizeRoute, DEFAULTS.image_optimize_route)?;
                self.xy_field(ImageCellShift, dist.shift)?;
                self.end_section()?;
                self.blank(2)?;
            }
        }
        Ok(())
    }
    fn write_layer_definitions(&mut self, job: &PasJob, layer_ids: &[String]) -> PasResult<()> {
        use PasKey::*;
        for (i, _layer) in job.layers.iter().enumerate() {
            self.start_section(PasSection::LayerDefinition)?;
            self.int_field(LayerNo, i as i64)?;
            self.str_field(LayerId, &layer_ids[i])?;
            self.str_field(WaferSide, DEFAULTS.layer_wafer_side)?;
            self.end_section()?;
            self.blank(1)?;
        }
        Ok(())
    }
    fn write_marks_selection(&mut self, job: &PasJob, layer_ids: &[String]) -> PasResult<()> {
        use PasKey::*;
        for (i, layer) in job.layers.iter().enumerate() {
            self.blank(1)?;
            for mark in &job.alignment.marks {
                self.start_section(PasSection::MarksSelection)?;
                self.str_field(LayerId, &layer_ids[i])?;
                self.str_field(MarkId, &mark.mark_id)?;
                let usage = if layer.marks.iter().any(|id| id == &mark.mark_id) {
                    "E" // exposed on this layer
                } else {
                    "N"
                };
                self.str_field(GlblMarkUsage, usage)?;
                self.end_section()?;
                self.blank(1)?;
            }
        }
        Ok(())
    }
    fn write_strategy_selection(&mut self, job: &PasJob, layer_ids: &[String]) -> PasResult<()> {
        use PasKey::*;
        for (i, layer) in job.layers.iter().enumerate() {
            if let Some(ref sid) = layer.global_strategy_id {
                self.start_section(PasSection::StrategySelection)?;
                self.str_field(LayerId, &layer_ids[i])?;
                self.str_field(StrategyId, sid)?;
                self.str_field(StrategyUsage, "A")?;
                self.end_section()?;
                self.blank(1)?;
            }
        }
        Ok(())
    }
    fn write_process_data(
        &mut self,
        job: &PasJob,
        layer_ids: &[String],
        align: bool,
    ) -> PasResult<()> {
        use PasKey::*;
        let d = &DEFAULTS.process;
        for (i, layer) in job.layers.iter().enumerate() {
            self.start_section(PasSection::ProcessData)?;
            self.str_field(LayerId, &layer_ids[i])?;
            self.int_field(LensReduction, job.lens_reduction() as i64)?;
            self.str_field(Calibration, d.calibration)?;
            if align {
                if let Some((ref m1, ref m2)) = layer.prealign_marks {
                    self.str_field(OpticalPrealignment, "Y")?;
                    self.str_pair_field(OptPrealignMarks, m1, m2)?;
                } else {
                    self.str_field(OpticalPrealignment, d.optical_prealignment)?;
                }
                let glbl = if layer.global_strategy_id.is_some() {
                    "Y"
                } else {
                    "N"
                };
                self.str_field(GlblWfrAlignment, glbl)?;
            }
            self.str_field(CooReduction, d.coo_reduction)?;
            self.str_field(MinNumberPulsesInSlit, d.min_number_pulses_in_slit)?;
            self.int_field(MinNumberPulses, d.min_number_pulses)?;
            self.str_field(SkipCoarseWaferAlign, d.skip_coarse_wafer_align)?;
            self.str_field(ReduceReticleAlign, d.reduce_reticle_align)?;
            self.f64_field(ReduceRaDrift, d.reduce_ra_drift)?;
            self.int_field(ReduceRaInterval, d.reduce_ra_interval)?;
            self.str_field(RetCoolCorr, d.ret_cool_corr)?;
            self.int_field(RetCoolTime, d.ret_cool_time)?;
            self.str_field(RetCoolStartOnLoad, d.ret_cool_start_on_load)?;
            self.str_field(RetCoolUsage, d.ret_cool_usage)?;
            if align {
                self.str_field(GlblRtclAlignment, d.glbl_rtcl_alignment)?;
            }
            self.str_field(GlblOverlayEnhancement, d.glbl_overlay_enhancement)?;
            if align {
                self.str_field(GlblSymAlignment, d.glbl_sym_alignment)?;
            }
            self.str_field(WaferAlignRepeats, d.wafer_align_repeats)?;
            self.int_field(NrWaferAlignRepeats, d.nr_wafer_align_repeats)?;
            self.int_list_field(AlignRepeatInterval, &d.align_repeat_interval)?;
            self.int_field(SmartRepeatCount, d.smart_repeat_count)?;
            self.f64_field(SmartRepeatThreshold, d.smart_repeat_threshold)?;
            self.xy_field(LayerShift, layer.layer_shift())?;
            if layer.combine_with_zero {
                self.int_field(NrOfMarksToUse, 0)?;
            } else if let Some(ref sid) = layer.global_strategy_id {
                let strategy = job.alignment.strategy(sid).ok_or_else(|| {
                    PasError::Invalid(format!(
                        "layer `{}` selects unknown strategy `{}`",
                        layer_ids[i], sid
                    ))
                })?;
                self.int_field(NrOfMarksToUse, strategy.required_marks())?;
            }
            if align && !layer.zero {
                self.str_field(CorrWaferGrid, d.corr_wafer_grid)?;
                self.f64_field(MinMarkDistanceCoarse, d.min_mark_distance_coarse)?;
                self.int_field(MinMarkDistance, d.min_mark_distance)?;
                self.f64_field(Max8088Shift, d.max_80_88_shift)?;
                self.f64_field(MaxMarkResidue, d.max_mark_residue)?;
                self.str_field(SpmMarkScan, d.spm_mark_scan)?;
                self.str_field(ErrDetection888, d.err_detection_88_8)?;
            }
            self.xy_field(CorrInterFldExpansion, d.corr_inter_fld_expansion.into())?;
            self.f64_field(CorrInterFldNonortho, d.corr_inter_fld_nonortho)?;
            self.f64_field(CorrInterFldRotation, d.corr_inter_fld_rotation)?;
            self.xy_field(CorrInterFldTranslation, d.corr_inter_fld_translation.into())?;
            self.f64_field(CorrIntraFldMagnification, d.corr_intra_fld_magnification)?;
            self.f64_field(CorrIntraFldRotation, d.corr_intra_fld_rotation)?;
            self.xy_field(CorrIntraFldTranslation, d.corr_intra_fld_translation.into())?;
            self.f64_field(CorrIntraFldAsymRotation, d.corr_intra_fld_asym_rotation)?;
            self.f64_field(CorrIntraFldAsymMagn, d.corr_intra_fld_asym_magn)?;
            self.f64_field(CorrPrealignRotation, d.corr_prealign_rotation)?;
            self.xy_field(CorrPrealignTranslation, d.corr_prealign_translation.into())?;
            self.f64_list_field(Corr8088MarkShift, &d.corr_80_88_mark_shift)?;
            self.f64_field(CorrLensHeating, d.corr_lens_heating)?;
            self.str_field(RtclCheckSurfaces, d.rtcl_check_surfaces)?;
            self.int_list_field(RtclCheckLimitsUpper, &d.rtcl_check_limits_upper)?;
            self.int_list_field(RtclCheckLimitsLower, &d.rtcl_check_limits_lower)?;
            if align && !layer.zero {
                self.str_field(AlignmentMethod, d.alignment_method)?;
            }
            self.str_field(CloseGreenLaserShutter, d.close_green_laser_shutter)?;
            self.str_field(RealignmentMethod, d.realignment_method)?;
            self.str_field(ImageOrderOptimisation, d.image_order_optimisation)?;
            self.str_field(ReticleAlignment, d.reticle_alignment)?;
            self.str_field(
                UseDefaultReticleAlignmentMethod,
                d.use_default_reticle_alignment_method,
            )?;
            self.int_field(CriticalPercentage, d.critical_percentage)?;
            self.str_field(ShareLevelInfo, d.share_level_info)?;
            self.f64_field(FocusEdgeClearance, d.focus_edge_clearance)?;
            if align && !layer.zero {
                self.str_field(InlineQAbovePCalibration, "M")?;
            } else {
                self.str_field(InlineQAbovePCalibration, d.inline_q_above_p_calibration)?;
            }
            if layer.shifted_measurement_scans {
                self.str_field(ShiftedMeasurementScans, "Y")?;
            } else {
                self.str_field(ShiftedMeasurementScans, d.shifted_measurement_scans)?;
            }
            self.str_field(FocusMonitoring, d.focus_monitoring)?;
            self.str_field(FocusMonitoringScanner, d.focus_monitoring_scanner)?;
            self.str_field(DynPerfMonitoring, d.dyn_perf_monitoring)?;
            self.str_field(ForceMeanderEnabled, d.force_meander_enabled)?;
            self.end_section()?;
            self.blank(1)?;
        }
        Ok(())
    }
    fn write_reticle_data(&mut self, job: &PasJob, layer_ids: &[String]) -> PasResult<()> {
        use PasKey::*;
        let d = &DEFAULTS.reticle;
        for (i, layer) in job.layers.iter().enumerate() {
            for exposed in &layer.exposed {
                let image = job.image(&exposed.image_id).ok_or_else(|| {
                    PasError::Invalid(format!(
                        "layer `{}` exposes unknown image `{}`",
                        layer_ids[i], exposed.image_id
                    ))
                })?;
                let exp = &exposed.exposure;
                self.start_section(PasSection::ReticleData)?;
                self.str_field(LayerId, &layer_ids[i])?;
                self.str_field(ImageId, &image.image_id)?;
                self.str_field(ImageUsage, "Y")?;
                self.str_field(ReticleId, &image.reticle_id)?;
                self.xy_field(ImageSize, image.size)?;
                self.xy_field(ImageShift, image.shift)?;
                self.xy_field(MaskSize, image.size)?;
                self.xy_field(MaskShift, image.shift)?;
                self.f64_field(EnergyActual, exp.energy)?;
                self.f64_field(FocusActual, exp.focus)?;
                self.xy_field(FocusTilt, exp.focus_tilt)?;
                self.f64_field(NumericalAperture, exp.numerical_aperture)?;
                self.f64_field(SigmaOuter, exp.sigma_outer)?;
                if let Some(sigma_inner) = exp.sigma_inner {
                    self.f64_field(SigmaInner, sigma_inner)?;
                }
                self.int_field(ImageExposureOrder, d.image_exposure_order)?;
                self.str_field(LithographyProcess, exp.illumination_mode.to_str())?;
                self.xy_field(ImageIntraFldCorTrans, d.image_intra_fld_cor_trans.into())?;
                self.f64_field(ImageIntraFldCorRot, d.image_intra_fld_cor_rot)?;
                self.f64_field(ImageIntraFldCorMag, d.image_intra_fld_cor_mag)?;
                self.f64_field(ImageIntraFldCorAsymRot, d.image_intra_fld_cor_asym_rot)?;
                self.f64_field(ImageIntraFldCorAsymMag, d.image_intra_fld_cor_asym_mag)?;
                self.str_field(LevelMethodZ, d.level_method_z)?;
                self.str_field(LevelMethodRx, d.level_method_rx)?;
                self.str_field(LevelMethodRy, d.level_method_ry)?;
                self.str_field(DieSizeDependency, d.die_size_dependency)?;
                self.str_field(EnableEfese, d.enable_efese)?;
                self.str_field(CdFecMode, d.cd_fec_mode)?;
                self.str_field(DoseCorrection, d.dose_correction)?;
                self.str_field(DoseCriticalImage, d.dose_critical_image)?;
                let points = layer.level_points();
                self.xy_field(GlobalLevelPoint1, points[0])?;
                self.xy_field(GlobalLevelPoint2, points[1])?;
                self.xy_field(GlobalLevelPoint3, points[2])?;
                self.end_section()?;
                self.blank(1)?;
            }
        }
        Ok(())
    }

    // Field-formatting primitives.
    // Every field line is `TAB`, the keyword, padding out to column `COL1`,
    // then the formatted value.
    fn line(&mut self, key: &str, val: &str) -> PasResult<()> {
        let lead = format!("{}{}", TAB, key);
        let pad = COL1.saturating_sub(lead.len());
        writeln!(self.dest, "{}{:pad$}{}", lead, "", val)?;
        Ok(())
    }
    /// Quoted-string field
    fn str_field(&mut self, key: PasKey, val: &str) -> PasResult<()> {
        self.line(key.to_str(), &format!("\"{}\"", val))
    }
    /// Continuation line of a multi-line field (the keyword column is blank)
    fn continuation(&mut self, val: &str) -> PasResult<()> {
        self.line("", &format!("\"{}\"", val))
    }
    /// Six-decimal float field
    fn f64_field(&mut self, key: PasKey, val: f64) -> PasResult<()> {
        self.line(key.to_str(), &format!("{:.6}", val))
    }
    /// Unquoted integer field
    fn int_field(&mut self, key: PasKey, val: i64) -> PasResult<()> {
        self.line(key.to_str(), &format!("{}", val))
    }
    /// Coordinate-pair field, six decimals each
    fn xy_field(&mut self, key: PasKey, val: PasPoint) -> PasResult<()> {
        self.line(key.to_str(), &format!("{:.6} {:.6}", val.x, val.y))
    }
    /// Unquoted integer-pair field (NUMBER_DIES)
    fn int_pair_field(&mut self, key: PasKey, val: (i64, i64)) -> PasResult<()> {
        self.line(key.to_str(), &format!("{} {}", val.0, val.1))
    }
    /// Quoted cell-index field (CELL_SELECTION)
    fn cell_field(&mut self, key: PasKey, val: PasCellIndex) -> PasResult<()> {
        self.line(key.to_str(), &format!("\"{}\" \"{}\"", val.c, val.r))
    }
    /// Quoted string-pair field (OPT_PREALIGN_MARKS)
    fn str_pair_field(&mut self, key: PasKey, a: &str, b: &str) -> PasResult<()> {
        self.line(key.to_str(), &format!("\"{}\" \"{}\"", a, b))
    }
    /// Space-separated unquoted integer list
    fn int_list_field(&mut self, key: PasKey, vals: &[i64]) -> PasResult<()> {
        let vals: Vec<String> = vals.iter().map(|v| format!("{}", v)).collect();
        self.line(key.to_str(), &vals.join(" "))
    }
    /// Space-separated six-decimal float list
    fn f64_list_field(&mut self, key: PasKey, vals: &[f64]) -> PasResult<()> {
        let vals: Vec<String> = vals.iter().map(|v| format!("{:.6}", v)).collect();
        self.line(key.to_str(), &vals.join(" "))
    }
    fn start_section(&mut self, section: PasSection) -> PasResult<()> {
        writeln!(self.dest, "START_SECTION {}", section.to_str())?;
        Ok(())
    }
    fn end_section(&mut self) -> PasResult<()> {
        writeln!(self.dest, "END_SECTION")?;
        Ok(())
    }
    fn blank(&mut self, n: usize) -> PasResult<()> {
        for _ in 0..n {
            writeln!(self.dest)?;
        }
        Ok(())
    }
}
