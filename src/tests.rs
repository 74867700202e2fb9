//!
//! # Unit Tests
//!

use std::collections::HashSet;

use tempfile::tempdir;

use super::*;
use crate::utils::SerializationFormat::Json;

/// Occurrences of `pat` in `s`
fn count(s: &str, pat: &str) -> usize {
    s.matches(pat).count()
}

#[test]
fn test_points() -> PasResult<()> {
    // Basic checks on derived [PasPoint] operators
    assert_eq!(
        PasPoint::new(1.0, 1.0) + PasPoint::new(2.0, 2.0),
        PasPoint::new(3.0, 3.0)
    );
    assert_eq!(
        PasPoint::new(2.0, 2.0) - PasPoint::new(1.0, 1.0),
        PasPoint::new(1.0, 1.0)
    );
    let mut p = PasPoint::new(11.0, 11.0);
    p += PasPoint::new(2.0, 2.0);
    assert_eq!(p, PasPoint::new(13.0, 13.0));
    Ok(())
}

#[test]
fn cell_wafer_roundtrip() -> PasResult<()> {
    let mut job = PasJob::new();
    job.cell.set_cell_size((4.0, 4.0))?;
    job.cell.set_matrix_shift((0.5, 0.5));

    let w = job.cell_to_wafer((2, -5), (1.5, -1.0));
    assert_eq!(w, PasPoint::new(10.0, -20.5));
    let (cell, offset) = job.wafer_to_cell(w);
    assert_eq!(cell, PasCellIndex::new(2, -5));
    assert_eq!(offset, PasPoint::new(1.5, -1.0));

    // And in default (10mm, unshifted) cells
    let job = PasJob::new();
    for (c, r, ox, oy) in [(0, 0, 0.0, 0.0), (-3, 2, 4.999, -4.999), (7, -1, 0.001, 0.0)] {
        let w = job.cell_to_wafer((c, r), (ox, oy));
        let (cell, offset) = job.wafer_to_cell(w);
        assert_eq!(cell, PasCellIndex::new(c, r));
        assert_eq!(offset, PasPoint::new(ox, oy));
    }
    Ok(())
}

#[test]
fn half_cell_boundary_goes_up() -> PasResult<()> {
    // A point exactly half a cell from a center belongs to the next cell over
    let mut job = PasJob::new();
    job.cell.set_cell_size((4.0, 4.0))?;
    job.cell.set_matrix_shift((0.5, 0.5));
    let (cell, offset) = job.wafer_to_cell((2.5, 0.5));
    assert_eq!(cell, PasCellIndex::new(1, 0));
    assert_eq!(offset, PasPoint::new(-2.0, 0.0));
    Ok(())
}

#[test]
fn valid_cells_default_wafer() -> PasResult<()> {
    // 100mm wafer, 2mm round clearance: usable radius 48mm, 10mm cells
    let job = PasJob::new();
    let cells: HashSet<PasCellIndex> = job.valid_cells()?.into_iter().collect();
    assert!(cells.contains(&PasCellIndex::new(0, 0)));
    assert!(cells.contains(&PasCellIndex::new(4, 0)));
    assert!(cells.contains(&PasCellIndex::new(-4, 0)));
    assert!(cells.contains(&PasCellIndex::new(0, -4)));
    assert!(cells.contains(&PasCellIndex::new(4, 1)));
    // Corner at (45, 25) is 51.5mm out
    assert!(!cells.contains(&PasCellIndex::new(4, 2)));
    assert!(!cells.contains(&PasCellIndex::new(5, 0)));
    // No cell center may sit beyond the usable radius
    for cell in &cells {
        let center = ((cell.c as f64 * 10.0).powi(2) + (cell.r as f64 * 10.0).powi(2)).sqrt();
        assert!(center <= 48.0);
    }
    assert!(job.is_valid_cell((0, 0))?);
    assert!(!job.is_valid_cell((5, 5))?);
    Ok(())
}

#[test]
fn valid_cells_symmetry() -> PasResult<()> {
    // Without a flat and without a matrix shift the cell map has four-fold
    // mirror symmetry
    let mut job = PasJob::new();
    job.cell.set_flat_enabled(false);
    job.cell.set_cell_size((7.0, 7.0))?;
    let cells: HashSet<PasCellIndex> = job.valid_cells()?.into_iter().collect();
    assert!(!cells.is_empty());
    for cell in &cells {
        assert!(cells.contains(&PasCellIndex::new(-cell.c, cell.r)));
        assert!(cells.contains(&PasCellIndex::new(cell.c, -cell.r)));
        assert!(cells.contains(&PasCellIndex::new(-cell.c, -cell.r)));
    }
    Ok(())
}

#[test]
fn edge_die_policy_widens_the_map() -> PasResult<()> {
    let mut job = PasJob::new();
    let interior: HashSet<PasCellIndex> = job.valid_cells()?.into_iter().collect();
    job.set_expose_edge_die(true);
    let edge: HashSet<PasCellIndex> = job.valid_cells()?.into_iter().collect();
    // Every fully-interior cell stays valid, and partially-on-wafer cells appear
    assert!(interior.is_subset(&edge));
    assert!(edge.contains(&PasCellIndex::new(4, 2)));
    assert!(!interior.contains(&PasCellIndex::new(4, 2)));
    Ok(())
}

#[test]
fn small_cells_are_rejected() -> PasResult<()> {
    let mut job = PasJob::new();
    assert!(job.cell.set_cell_size((0.5, 10.0)).is_err());
    // A deserialized job can carry a bad size; enumeration re-checks it
    job.cell.cell_size = Some(PasPoint::new(0.5, 10.0));
    assert!(job.valid_cells().is_err());
    Ok(())
}

#[test]
fn layer_id_sanitization() -> PasResult<()> {
    let layer = PasLayer::new(" metal-1 ")?;
    assert_eq!(layer.layer_id, "METAL-1");
    // Spaces are not legal job-file ID characters
    let err = PasLayer::new("layer one").unwrap_err();
    assert!(err.to_string().contains("[' ']"));
    // Neither are IDs beyond 15 characters
    assert!(PasLayer::new("ABCDEFGHIJKLMNOP").is_err());
    // Empty is allowed; the exporter numbers such layers
    assert!(PasLayer::new("").is_ok());
    Ok(())
}

#[test]
fn illumination_mode_synonyms() -> PasResult<()> {
    use PasIlluminationMode::*;
    assert_eq!(PasIlluminationMode::parse("conv")?, Conventional);
    assert_eq!(PasIlluminationMode::parse("C")?, Conventional);
    assert_eq!(PasIlluminationMode::parse(" Annular ")?, Annular);
    assert_eq!(PasIlluminationMode::parse("d")?, Default);
    let err = PasIlluminationMode::parse("quadrupole").unwrap_err();
    assert!(err.to_string().contains("Annular"));
    Ok(())
}

#[test]
fn mark_type_synonyms() -> PasResult<()> {
    use PasMarkType::*;
    assert_eq!(PasMarkType::parse("pm")?, Pm);
    assert_eq!(PasMarkType::parse("SPM-X")?, SpmX);
    assert_eq!(PasMarkType::parse("spm_y")?, SpmY);
    Ok(())
}

#[test]
fn mark_type_rejects_unknown() {
    assert!(PasMarkType::parse("XPA").is_err());
}

#[test]
fn exposure_builder_and_defaults() -> PasResult<()> {
    let exp = PasExposure::default();
    assert_eq!(exp.energy, 20.0);
    assert_eq!(exp.numerical_aperture, 0.57);
    assert_eq!(exp.sigma_inner, None);

    let exp = PasExposureBuilder::default()
        .energy(25.0)
        .sigma_inner(0.4)
        .illumination_mode(PasIlluminationMode::Annular)
        .build()
        .unwrap();
    assert_eq!(exp.energy, 25.0);
    assert_eq!(exp.sigma_inner, Some(0.4));
    assert_eq!(exp.sigma_outer, 0.75);
    Ok(())
}

#[test]
fn comments_are_length_limited() {
    let mut job = PasJob::new();
    assert!(job.set_comment("ok", "", "").is_ok());
    let long = "x".repeat(51);
    let err = job.set_comment("ok", long, "").unwrap_err();
    assert!(err.to_string().contains("line 2"));
}

#[test]
fn distribution_cap() -> PasResult<()> {
    let mut image = PasImage::new("DEV", "R1", (4.0, 4.0), (0.0, 0.0))?;
    for i in 0..999 {
        image.distribute((i, 0), (0.0, 0.0))?;
    }
    assert!(image.distribute((999, 0), (0.0, 0.0)).is_err());
    Ok(())
}

#[test]
fn duplicate_image_on_layer() -> PasResult<()> {
    let image = PasImage::new("DEV", "R1", (4.0, 4.0), (0.0, 0.0))?;
    let mut layer = PasLayer::new("L1")?;
    layer.expose_image(&image, PasExposure::default())?;
    assert!(layer.expose_image(&image, PasExposure::default()).is_err());
    Ok(())
}

#[test]
fn add_mark_instantiates_library_image() -> PasResult<()> {
    let mut job = PasJob::new();
    job.add_mark(PasMark::new("E", PasMarkType::Pm, (44.0, 0.0))?)?;
    let pm = job.image("PM").expect("PM image should be instantiated");
    assert_eq!(pm.base_image_id.as_deref(), Some("PM"));
    assert_eq!(pm.size, PasPoint::new(1.640, 1.640));
    // A second mark of the same type reuses the image
    job.add_mark(PasMark::new("W", PasMarkType::Pm, (-44.0, 0.0))?)?;
    assert_eq!(job.images.len(), 1);
    // Duplicate mark IDs are rejected
    assert!(job
        .add_mark(PasMark::new("E", PasMarkType::Pm, (0.0, 44.0))?)
        .is_err());
    Ok(())
}

#[test]
fn strategy_rejects_foreign_marks() -> PasResult<()> {
    let mut job = PasJob::new();
    job.add_mark(PasMark::new("E", PasMarkType::Pm, (44.0, 0.0))?)?;

    // A mark never registered with this job
    let foreign = PasMark::new("N", PasMarkType::Pm, (0.0, 44.0))?;
    let mut strategy = PasStrategy::new("AS")?;
    assert!(strategy
        .add_marks(&job.alignment, &[&foreign], None)
        .is_err());

    // Same ID, but different mark data: also another job's mark
    let impostor = PasMark::new("E", PasMarkType::Pm, (30.0, 30.0))?;
    assert!(strategy
        .add_marks(&job.alignment, &[&impostor], None)
        .is_err());

    // The genuine article is accepted, once
    let genuine = job.alignment.mark("E").unwrap().clone();
    strategy.add_marks(&job.alignment, &[&genuine], None)?;
    assert!(strategy
        .add_marks(&job.alignment, &[&genuine], None)
        .is_err());
    assert_eq!(strategy.required_marks(), 1);
    Ok(())
}

#[test]
fn backup_marks_get_backup_preference() -> PasResult<()> {
    let mut job = PasJob::new();
    let mut mark = PasMark::new("SE", PasMarkType::Pm, (30.0, -30.0))?;
    mark.set_backup(true);
    job.add_mark(mark)?;
    job.add_mark(PasMark::new("E", PasMarkType::Pm, (44.0, 0.0))?)?;

    let mut strategy = PasStrategy::new("AS")?;
    let se = job.alignment.mark("SE").unwrap().clone();
    let e = job.alignment.mark("E").unwrap().clone();
    strategy.add_marks(&job.alignment, &[&se, &e], None)?;
    assert_eq!(
        strategy.preferences,
        vec![PasMarkPreference::Backup, PasMarkPreference::Preferred]
    );
    // An explicit preference overrides the mark's flag
    let mut strategy2 = PasStrategy::new("AS2")?;
    strategy2.add_marks(&job.alignment, &[&se], Some(PasMarkPreference::Preferred))?;
    assert_eq!(strategy2.preferences, vec![PasMarkPreference::Preferred]);
    Ok(())
}

#[test]
fn prealignment_window_checks() -> PasResult<()> {
    let job = PasJob::new();
    let window = job.prealign_window();
    assert_eq!(window.r_min, 32.5);
    assert_eq!(window.r_max, 48.0);

    let east = PasMark::new("E", PasMarkType::Pm, (44.0, 0.0))?;
    let west = PasMark::new("W", PasMarkType::Pm, (-44.0, 0.0))?;
    let mut layer = PasLayer::new("ZERO")?;
    layer.set_prealignment(&east, &west, &window)?;
    assert_eq!(
        layer.prealign_marks,
        Some(("E".to_string(), "W".to_string()))
    );

    // 45 degrees is inside a forbidden sector, and the pair is under 140 apart
    let ne = PasMark::new("NE", PasMarkType::Pm, (30.0, 30.0))?;
    let err = layer.set_prealignment(&ne, &west, &window).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("sector"));

    // Too close to the wafer center
    let inner = PasMark::new("C", PasMarkType::Pm, (20.0, 0.0))?;
    let err = layer.set_prealignment(&inner, &west, &window).unwrap_err();
    assert!(err.to_string().contains("minimum prealignment radius"));

    // Same side of the wafer: angular separation under 140 degrees
    let e2 = PasMark::new("E2", PasMarkType::Pm, (0.0, 44.0))?;
    let err = layer.set_prealignment(&east, &e2, &window).unwrap_err();
    assert!(err.to_string().contains("140"));
    Ok(())
}

/// Build the job from the classic two-layer, fully-aligned flow:
/// a zero layer printing the marks, and a device layer aligned to them.
fn aligned_job() -> PasResult<PasJob> {
    let mut job = PasJob::new();
    job.set_comment("Aligned test job", "", "")?;
    job.cell.set_cell_size((8.0, 8.0))?;

    let mut image = PasImage::new("DEV", "RETICLE01", (6.0, 6.0), (0.0, 0.0))?;
    image.distribute((0, 0), (0.0, 0.0))?;
    image.distribute((1, -2), (0.25, 0.0))?;
    job.add_image(image)?;

    job.add_mark(PasMark::new("E", PasMarkType::Pm, (44.0, 0.0))?)?;
    job.add_mark(PasMark::new("W", PasMarkType::Pm, (-44.0, 0.0))?)?;

    let mut strategy = PasStrategy::new("AS")?;
    let e = job.alignment.mark("E").unwrap().clone();
    let w = job.alignment.mark("W").unwrap().clone();
    strategy.add_marks(&job.alignment, &[&e, &w], None)?;
    job.add_strategy(strategy)?;

    let mut zero = PasLayer::new("ZERO")?;
    zero.set_zero(true);
    zero.expose_marks(&[&e, &w], PasExposure::default())?;

    let mut dev = PasLayer::new("DEV")?;
    dev.expose_image(job.image("DEV").unwrap(), PasExposure::default())?;
    dev.set_global_strategy(job.alignment.strategy("AS").unwrap());
    dev.set_prealignment(&e, &w, &job.prealign_window())?;
    dev.set_layer_shift((0.0, 0.0));

    job.add_layer(dev);
    job.add_layer(zero);
    Ok(job)
}

#[test]
fn organize_layer_order() -> PasResult<()> {
    let mut job = PasJob::new();
    let mut combine = PasLayer::new("COMBINE")?;
    combine.set_combine_with_zero(true);
    let mut zero = PasLayer::new("ZERO")?;
    zero.set_zero(true);
    job.add_layer(PasLayer::new("A")?);
    job.add_layer(zero);
    job.add_layer(combine);
    job.add_layer(PasLayer::new("B")?);

    organize::organize_layers(&mut job)?;
    let ids: Vec<&str> = job.layers.iter().map(|l| l.layer_id.as_str()).collect();
    assert_eq!(ids, vec!["ZERO", "COMBINE", "A", "B"]);
    assert!(job.combined_zero_first);

    // Idempotent on a second run
    organize::organize_layers(&mut job)?;
    let ids: Vec<&str> = job.layers.iter().map(|l| l.layer_id.as_str()).collect();
    assert_eq!(ids, vec!["ZERO", "COMBINE", "A", "B"]);
    Ok(())
}

#[test]
fn organize_without_zero_layer() -> PasResult<()> {
    let mut job = PasJob::new();
    let mut combine = PasLayer::new("COMBINE")?;
    combine.set_combine_with_zero(true);
    job.add_layer(PasLayer::new("A")?);
    job.add_layer(combine);
    organize::organize_layers(&mut job)?;
    let ids: Vec<&str> = job.layers.iter().map(|l| l.layer_id.as_str()).collect();
    assert_eq!(ids, vec!["COMBINE", "A"]);
    assert!(job.combined_zero_first);
    Ok(())
}

#[test]
fn duplicate_zero_layers_abort_export() -> PasResult<()> {
    let mut job = PasJob::new();
    for id in ["Z1", "Z2"] {
        let mut layer = PasLayer::new(id)?;
        layer.set_zero(true);
        job.add_layer(layer);
    }
    let dir = tempdir().unwrap();
    let path = dir.path().join("job.txt");
    let err = job.export(&path, false).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("Z1") && msg.contains("Z2"));
    // The target file must not be created by a failing export
    assert!(!path.exists());
    Ok(())
}

#[test]
fn export_refuses_overwrite() -> PasResult<()> {
    let mut job = aligned_job()?;
    let dir = tempdir().unwrap();
    let path = dir.path().join("job.txt");
    job.export(&path, false)?;
    assert!(path.exists());
    assert!(job.export(&path, false).is_err());
    job.export(&path, true)?;
    Ok(())
}

#[test]
fn export_is_deterministic() -> PasResult<()> {
    let mut job = aligned_job()?;
    let first = job.to_ascii()?;
    let second = job.to_ascii()?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn ascii_field_formatting() -> PasResult<()> {
    let mut job = aligned_job()?;
    let ascii = job.to_ascii()?;

    // Leading blank lines, then the GENERAL section
    assert!(ascii.starts_with("\n\nSTART_SECTION GENERAL\n"));
    // Values start at column 50: three-space tab, keyword, space padding
    let comment = format!("   COMMENT{}\"Aligned test job\"", " ".repeat(40));
    assert!(ascii.contains(&comment));
    // Quoted-string continuation lines have a blank keyword column
    let continuation = format!("   {}\"\"", " ".repeat(47));
    assert!(ascii.contains(&continuation));
    // Floats carry six decimals
    let diameter = format!("   WFR_DIAMETER{}100.000000", " ".repeat(35));
    assert!(ascii.contains(&diameter));
    // NUMBER_DIES is an unquoted integer pair
    let dies = format!("   NUMBER_DIES{}1 1", " ".repeat(36));
    assert!(ascii.contains(&dies));
    // CELL_SELECTION is a quoted integer pair
    let cell = format!("   CELL_SELECTION{}\"1\" \"-2\"", " ".repeat(33));
    assert!(ascii.contains(&cell));
    // Every section is closed
    assert_eq!(count(&ascii, "START_SECTION "), count(&ascii, "END_SECTION\n"));
    Ok(())
}

#[test]
fn ascii_section_order() -> PasResult<()> {
    let mut job = aligned_job()?;
    let ascii = job.to_ascii()?;
    let sections = [
        "START_SECTION GENERAL",
        "START_SECTION ALIGNMENT_MARK",
        "START_SECTION WFR_ALIGN_STRATEGY",
        "START_SECTION MARK_ALIGNMENT",
        "START_SECTION IMAGE_DEFINITION",
        "START_SECTION IMAGE_DISTRIBUTION",
        "START_SECTION LAYER_DEFINITION",
        "START_SECTION MARKS_SELECTION",
        "START_SECTION STRATEGY_SELECTION",
        "START_SECTION PROCESS_DATA",
        "START_SECTION RETICLE_DATA",
    ];
    let mut last = 0;
    for section in sections {
        let at = ascii.find(section).unwrap_or_else(|| panic!("missing {}", section));
        assert!(at >= last, "{} out of order", section);
        last = at;
    }
    Ok(())
}

#[test]
fn ascii_alignment_content() -> PasResult<()> {
    let mut job = aligned_job()?;
    let ascii = job.to_ascii()?;

    // Two marks, one strategy, two mark-alignment bindings
    assert_eq!(count(&ascii, "START_SECTION ALIGNMENT_MARK"), 2);
    assert_eq!(count(&ascii, "START_SECTION WFR_ALIGN_STRATEGY"), 1);
    assert_eq!(count(&ascii, "START_SECTION MARK_ALIGNMENT"), 2);
    // Marks-selection covers every layer x mark combination
    assert_eq!(count(&ascii, "START_SECTION MARKS_SELECTION"), 4);
    // The zero layer exposes both marks
    let exposed = format!("   GLBL_MARK_USAGE{}\"E\"", " ".repeat(32));
    assert_eq!(count(&ascii, &exposed), 2);
    // The device layer prealigns on the mark pair
    let prealign = format!("   OPT_PREALIGN_MARKS{}\"E\" \"W\"", " ".repeat(29));
    assert!(ascii.contains(&prealign));
    // Alignment-specific process fields appear only on non-zero layers
    assert_eq!(count(&ascii, "\n   ALIGNMENT_METHOD"), 1);
    // The PM library image is exported alongside the device image
    assert_eq!(count(&ascii, "START_SECTION IMAGE_DEFINITION"), 2);
    let base = format!("   BASE_IMAGE_ID{}\"PM\"", " ".repeat(34));
    assert!(ascii.contains(&base));
    Ok(())
}

#[test]
fn combine_layer_uses_zero_marks() -> PasResult<()> {
    let mut job = aligned_job()?;
    let mut combine = PasLayer::new("CMB")?;
    combine.set_combine_with_zero(true);
    job.add_layer(combine);
    let ascii = job.to_ascii()?;

    // GENERAL records the combined run
    let combined = format!("   COMBINE_ZERO_FIRST{}\"Y\"", " ".repeat(29));
    assert!(ascii.contains(&combined));
    // The combined layer aligns on zero marks: zero marks to use itself
    let none_to_use = format!("   NR_OF_MARKS_TO_USE{}0\n", " ".repeat(29));
    assert!(ascii.contains(&none_to_use));
    // And the layer order is zero, combine, then the rest
    let ids: Vec<&str> = job.layers.iter().map(|l| l.layer_id.as_str()).collect();
    assert_eq!(ids, vec!["ZERO", "CMB", "DEV"]);
    Ok(())
}

#[test]
fn unnamed_layers_are_numbered() -> PasResult<()> {
    let mut job = PasJob::new();
    job.add_layer(PasLayer::new("")?);
    let ascii = job.to_ascii()?;
    let layer_id = format!("   LAYER_ID{}\"0\"", " ".repeat(39));
    assert!(ascii.contains(&layer_id));
    Ok(())
}

#[test]
fn dangling_refs_abort_export() -> PasResult<()> {
    let mut job = PasJob::new();
    let ghost = PasImage::new("GHOST", "R1", (1.0, 1.0), (0.0, 0.0))?;
    let mut layer = PasLayer::new("L1")?;
    layer.expose_image(&ghost, PasExposure::default())?;
    job.add_layer(layer);
    // GHOST was never added to the job
    let err = job.to_ascii().unwrap_err();
    assert!(err.to_string().contains("GHOST"));
    Ok(())
}

#[test]
fn serde_roundtrip() -> PasResult<()> {
    let job = aligned_job()?;
    let json = Json.to_string(&job)?;
    let loaded: PasJob = Json.from_str(&json)?;
    assert_eq!(job, loaded);
    Ok(())
}

#[test]
fn job_to_json_file() -> PasResult<()> {
    use crate::utils::SerdeFile;
    let job = aligned_job()?;
    let dir = tempdir().unwrap();
    let path = dir.path().join("job.json");
    job.save(Json, &path)?;
    let loaded = PasJob::open(&path, Json)?;
    assert_eq!(job, loaded);
    Ok(())
}

#[test]
fn library_images() {
    assert_eq!(images::mark_image(PasMarkType::Pm).image_id, "PM");
    assert_eq!(images::mark_image(PasMarkType::SpmX).image_id, "SPM-X");
    assert_eq!(images::mark_image(PasMarkType::SpmY).image_id, "SPM-Y");
    assert_eq!(images::PF.image_id, "PF");
    assert_eq!(images::PM.reticle_id, "4544020*");
}
