//!
//! # Machine Defaults
//!
//! Default values applied to every field a job does not set explicitly.
//! Values target the PAS 5500/300 DUV stepper; edit [DEFAULTS] (or set the
//! corresponding fields on a [crate::data::PasJob]) for other machines.
//!

/// Default values for everything a [crate::data::PasJob] leaves unset.
/// Grouped roughly by the job-file section each field lands in.
pub struct PasDefaults {
    // Machine / GENERAL section
    pub machine_type: &'static str,
    pub reticle_size: i64,
    pub wfr_diameter: f64,
    pub wfr_notch: &'static str,
    pub cover_mode: &'static str,
    pub placement_mode: &'static str,
    pub prealign_method: &'static str,
    pub wafer_rotation: f64,
    pub matching_set_id: &'static str,
    pub combine_zero_first: &'static str,
    pub lens_reduction: f64,
    pub comment: [&'static str; 3],

    // Cell structure
    pub cell_size: (f64, f64),
    pub matrix_shift: (f64, f64),
    pub number_dies: (i64, i64),
    pub min_number_dies: i64,
    pub round_edge_clearance: f64,
    pub flat_edge_clearance: f64,
    pub edge_exclusion: f64,

    // Software / geometry limits
    pub min_cell_size: f64,
    pub max_distributions_per_image: usize,
    pub wfr_flat_length: f64,
    pub prealign_r_min: f64,
    pub prealign_mark_half_side: f64,

    // Image definition & distribution
    pub image_variant_id: &'static str,
    pub image_optimize_route: &'static str,
    pub image_distribution_action: &'static str,

    // Alignment marks
    pub mark_edge_clearance: &'static str,
    pub mark_wafer_side: &'static str,

    // Layers
    pub layer_wafer_side: &'static str,

    pub strategy: StrategyDefaults,
    pub process: ProcessDefaults,
    pub reticle: ReticleDefaults,
}

/// WFR_ALIGN_STRATEGY section defaults
pub struct StrategyDefaults {
    pub wafer_alignment_method: &'static str,
    pub min_mark_distance_coarse: f64,
    pub min_mark_distance: i64,
    pub max_80_88_mark_shift: f64,
    pub max_mark_residue: f64,
    pub spm_mark_scan: &'static str,
    pub corr_wafer_grid: &'static str,
    pub err_detection_88_8: &'static str,
    pub grid_optimisation_algorithm: &'static str,
    pub flyer_removal_threshold: f64,
    pub alignment_monitoring: &'static str,
    pub glbl_mark_usage: &'static str,
}

/// PROCESS_DATA section defaults
pub struct ProcessDefaults {
    pub calibration: &'static str,
    pub optical_prealignment: &'static str,
    pub coo_reduction: &'static str,
    pub min_number_pulses_in_slit: &'static str,
    pub min_number_pulses: i64,
    pub skip_coarse_wafer_align: &'static str,
    pub reduce_reticle_align: &'static str,
    pub reduce_ra_drift: f64,
    pub reduce_ra_interval: i64,
    pub ret_cool_corr: &'static str,
    pub ret_cool_time: i64,
    pub ret_cool_start_on_load: &'static str,
    pub ret_cool_usage: &'static str,
    pub glbl_rtcl_alignment: &'static str,
    pub glbl_overlay_enhancement: &'static str,
    pub glbl_sym_alignment: &'static str,
    pub wafer_align_repeats: &'static str,
    pub nr_wafer_align_repeats: i64,
    pub align_repeat_interval: [i64; 10],
    pub smart_repeat_count: i64,
    pub smart_repeat_threshold: f64,
    pub layer_shift: (f64, f64),
    pub corr_inter_fld_expansion: (f64, f64),
    pub corr_inter_fld_nonortho: f64,
    pub corr_inter_fld_rotation: f64,
    pub corr_inter_fld_translation: (f64, f64),
    pub corr_intra_fld_magnification: f64,
    pub corr_intra_fld_rotation: f64,
    pub corr_intra_fld_translation: (f64, f64),
    pub corr_intra_fld_asym_rotation: f64,
    pub corr_intra_fld_asym_magn: f64,
    pub corr_prealign_rotation: f64,
    pub corr_prealign_translation: (f64, f64),
    pub corr_80_88_mark_shift: [f64; 4],
    pub corr_lens_heating: f64,
    pub corr_wafer_grid: &'static str,
    pub min_mark_distance_coarse: f64,
    pub min_mark_distance: i64,
    pub max_80_88_shift: f64,
    pub max_mark_residue: f64,
    pub spm_mark_scan: &'static str,
    pub err_detection_88_8: &'static str,
    pub alignment_method: &'static str,
    pub rtcl_check_surfaces: &'static str,
    pub rtcl_check_limits_upper: [i64; 3],
    pub rtcl_check_limits_lower: [i64; 3],
    pub close_green_laser_shutter: &'static str,
    pub realignment_method: &'static str,
    pub image_order_optimisation: &'static str,
    pub reticle_alignment: &'static str,
    pub use_default_reticle_alignment_method: &'static str,
    pub critical_percentage: i64,
    pub share_level_info: &'static str,
    pub focus_edge_clearance: f64,
    pub inline_q_above_p_calibration: &'static str,
    pub shifted_measurement_scans: &'static str,
    pub focus_monitoring: &'static str,
    pub focus_monitoring_scanner: &'static str,
    pub dyn_perf_monitoring: &'static str,
    pub force_meander_enabled: &'static str,
}

/// RETICLE_DATA section defaults
pub struct ReticleDefaults {
    pub energy: f64,
    pub focus: f64,
    pub focus_tilt: (f64, f64),
    pub numerical_aperture: f64,
    pub sigma_outer: f64,
    pub image_exposure_order: i64,
    pub image_intra_fld_cor_trans: (f64, f64),
    pub image_intra_fld_cor_rot: f64,
    pub image_intra_fld_cor_mag: f64,
    pub image_intra_fld_cor_asym_rot: f64,
    pub image_intra_fld_cor_asym_mag: f64,
    pub level_method_z: &'static str,
    pub level_method_rx: &'static str,
    pub level_method_ry: &'static str,
    pub die_size_dependency: &'static str,
    pub enable_efese: &'static str,
    pub cd_fec_mode: &'static str,
    pub dose_correction: &'static str,
    pub dose_critical_image: &'static str,
    pub global_level_point_1: (f64, f64),
    pub global_level_point_2: (f64, f64),
    pub global_level_point_3: (f64, f64),
}

pub const DEFAULTS: PasDefaults = PasDefaults {
    machine_type: "PAS5500/300",
    reticle_size: 6,
    wfr_diameter: 100.0,
    wfr_notch: "N",
    cover_mode: "W",
    placement_mode: "O",
    prealign_method: "STANDARD",
    wafer_rotation: 0.0,
    matching_set_id: "DEFAULT",
    combine_zero_first: "N",
    lens_reduction: 4.0,
    comment: ["Created with pas21", "", ""],

    cell_size: (10.0, 10.0),
    matrix_shift: (0.0, 0.0),
    number_dies: (1, 1),
    min_number_dies: 1,
    round_edge_clearance: 2.0,
    flat_edge_clearance: 2.0,
    edge_exclusion: 2.0,

    min_cell_size: 1.020,
    max_distributions_per_image: 999,
    // Chord length of the primary flat on a 100mm wafer
    wfr_flat_length: 32.5,
    prealign_r_min: 32.5,
    // Quarter of the 1.640mm PM mark span, halved per side
    prealign_mark_half_side: 1.640 / 4.0 / 2.0,

    image_variant_id: "",
    image_optimize_route: "N",
    image_distribution_action: "I",

    mark_edge_clearance: "L",
    mark_wafer_side: "A",

    layer_wafer_side: "A",

    strategy: StrategyDefaults {
        wafer_alignment_method: "T",
        min_mark_distance_coarse: 20.0,
        min_mark_distance: 40,
        max_80_88_mark_shift: 0.5,
        max_mark_residue: 200.0,
        spm_mark_scan: "S",
        corr_wafer_grid: "Default",
        err_detection_88_8: "M",
        grid_optimisation_algorithm: "N",
        flyer_removal_threshold: 0.0,
        alignment_monitoring: "D",
        glbl_mark_usage: "A",
    },

    process: ProcessDefaults {
        calibration: "N",
        optical_prealignment: "N",
        coo_reduction: "D",
        min_number_pulses_in_slit: "D",
        min_number_pulses: 21,
        skip_coarse_wafer_align: "N",
        reduce_reticle_align: "N",
        reduce_ra_drift: 5.0,
        reduce_ra_interval: 2,
        ret_cool_corr: "D",
        ret_cool_time: 0,
        ret_cool_start_on_load: "Y",
        ret_cool_usage: "W",
        glbl_rtcl_alignment: "N",
        glbl_overlay_enhancement: "N",
        glbl_sym_alignment: "N",
        wafer_align_repeats: "N",
        nr_wafer_align_repeats: 2,
        align_repeat_interval: [25; 10],
        smart_repeat_count: 1,
        smart_repeat_threshold: 0.0,
        layer_shift: (0.0, 0.0),
        corr_inter_fld_expansion: (0.0, 0.0),
        corr_inter_fld_nonortho: 0.0,
        corr_inter_fld_rotation: 0.0,
        corr_inter_fld_translation: (0.0, 0.0),
        corr_intra_fld_magnification: 0.0,
        corr_intra_fld_rotation: 0.0,
        corr_intra_fld_translation: (0.0, 0.0),
        corr_intra_fld_asym_rotation: 0.0,
        corr_intra_fld_asym_magn: 0.0,
        corr_prealign_rotation: 0.0,
        corr_prealign_translation: (0.0, 0.0),
        corr_80_88_mark_shift: [0.0; 4],
        corr_lens_heating: 1.0,
        corr_wafer_grid: "Default",
        min_mark_distance_coarse: 20.0,
        min_mark_distance: 40,
        max_80_88_shift: 0.5,
        max_mark_residue: 200.0,
        spm_mark_scan: "S",
        err_detection_88_8: "M",
        alignment_method: "T",
        rtcl_check_surfaces: "N",
        rtcl_check_limits_upper: [50000; 3],
        rtcl_check_limits_lower: [50000; 3],
        close_green_laser_shutter: "N",
        realignment_method: "D",
        image_order_optimisation: "Y",
        reticle_alignment: "T",
        use_default_reticle_alignment_method: "N",
        critical_percentage: 83,
        share_level_info: "N",
        focus_edge_clearance: 3.0,
        inline_q_above_p_calibration: "D",
        shifted_measurement_scans: "N",
        focus_monitoring: "D",
        focus_monitoring_scanner: "D",
        dyn_perf_monitoring: "D",
        force_meander_enabled: "N",
    },

    reticle: ReticleDefaults {
        energy: 20.0,
        focus: 0.0,
        focus_tilt: (0.0, 0.0),
        numerical_aperture: 0.57,
        sigma_outer: 0.75,
        image_exposure_order: 0,
        image_intra_fld_cor_trans: (0.0, 0.0),
        image_intra_fld_cor_rot: 0.0,
        image_intra_fld_cor_mag: 0.0,
        image_intra_fld_cor_asym_rot: 0.0,
        image_intra_fld_cor_asym_mag: 0.0,
        level_method_z: "D",
        level_method_rx: "D",
        level_method_ry: "D",
        die_size_dependency: "N",
        enable_efese: "N",
        cd_fec_mode: "N",
        dose_correction: "N",
        dose_critical_image: "Y",
        global_level_point_1: (0.0, 0.0),
        global_level_point_2: (0.0, 0.0),
        global_level_point_3: (0.0, 0.0),
    },
};
