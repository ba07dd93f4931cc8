//! Measurement pipeline regression test
//!
//! Runs the full load -> edges -> contours -> length pipeline on
//! synthetic images written to disk in several formats.

use morphomoss::filter::{CannyParams, EdgeDetector};
use morphomoss::{
    GaussianBlur, ImageFormat, LengthUnit, MeasureError, MeasureOptions, PreprocessOptions,
    measure_pix, measure_teeth, measure_tooth_length,
};
use morphomoss_test::{RegParams, synth, write_fixture};

#[test]
fn measure_reg() {
    let mut rp = RegParams::new("measure");
    let opts = MeasureOptions::default();

    // 60x10 bright bar on black, as a PNG file
    let bar = synth::filled_rect(100, 100, 20, 45, 60, 10, 255, 0).unwrap();
    let bar_path = write_fixture(&bar, "measure_bar", ImageFormat::Png).expect("fixture");

    // --- Test 1: a clear outline gives a positive finite length ---
    let px = measure_teeth(&bar_path, None, &opts).expect("measure bar");
    eprintln!(
        "  bar: {} contours, mean {:.3} px",
        px.contour_count, px.mean_px
    );
    rp.compare_values(1.0, px.contour_count as f64, 0.0);
    rp.compare_values(1.0, px.value.is_finite() as u8 as f64, 0.0);
    rp.check_range(30.0, 55.0, px.value);
    rp.compare_strings("pixels", &px.unit.to_string());

    // --- Test 2: scale is applied linearly ---
    for k in [0.5, 2.0, 3.7] {
        let um = measure_tooth_length(&bar_path, Some(k)).expect("scaled");
        rp.compare_values(px.value * k, um, 0.0);
    }
    let um = measure_teeth(&bar_path, Some(2.0), &opts).expect("scaled report");
    rp.compare_values(1.0, (um.unit == LengthUnit::Micrometers) as u8 as f64, 0.0);
    rp.compare_values(px.mean_px, um.mean_px, 0.0);

    // --- Test 3: repeated runs are bit-identical ---
    let again = measure_tooth_length(&bar_path, None).expect("again");
    rp.compare_values(
        1.0,
        (again.to_bits() == px.value.to_bits()) as u8 as f64,
        0.0,
    );

    // --- Test 4: the same image through other formats ---
    for format in [ImageFormat::Bmp, ImageFormat::Pnm, ImageFormat::Tiff] {
        let path = write_fixture(&bar, &format!("measure_bar_{}", format.extension()), format)
            .expect("fixture");
        let v = measure_tooth_length(&path, None).expect("measure format");
        rp.compare_values(px.value, v, 0.0);
    }

    // --- Test 5: gray-equivalent RGB matches gray ---
    let rgb = bar.convert_8_to_32().unwrap();
    let rgb_path = write_fixture(&rgb, "measure_bar_rgb", ImageFormat::Png).expect("fixture");
    let v = measure_tooth_length(&rgb_path, None).expect("rgb");
    rp.compare_values(px.value, v, 0.0);

    // --- Test 6: blank image has no contours ---
    let blank = synth::blank(100, 100, 0).unwrap();
    let blank_path = write_fixture(&blank, "measure_blank", ImageFormat::Png).expect("fixture");
    let err = measure_tooth_length(&blank_path, None).unwrap_err();
    rp.compare_values(1.0, matches!(err, MeasureError::NoContours) as u8 as f64, 0.0);
    let white = synth::blank(100, 100, 255).unwrap();
    let err = measure_pix(&white, None, &opts).unwrap_err();
    rp.compare_values(1.0, matches!(err, MeasureError::NoContours) as u8 as f64, 0.0);

    // --- Test 7: missing and undecodable files are load errors ---
    let err = measure_tooth_length("/nonexistent/peristome.png", None).unwrap_err();
    rp.compare_values(1.0, matches!(err, MeasureError::Load { .. }) as u8 as f64, 0.0);
    let junk_path = format!("{}/measure_junk.png", morphomoss_test::regout_dir());
    std::fs::write(&junk_path, b"not really a png").expect("write junk");
    let err = measure_tooth_length(&junk_path, None).unwrap_err();
    rp.compare_values(1.0, matches!(err, MeasureError::Load { .. }) as u8 as f64, 0.0);

    // --- Test 8: bad scale fails before loading ---
    let err = measure_tooth_length("/nonexistent/peristome.png", Some(-2.0)).unwrap_err();
    rp.compare_values(1.0, matches!(err, MeasureError::InvalidScale(_)) as u8 as f64, 0.0);

    // --- Test 9: two teeth average their lengths ---
    let mut pm = synth::filled_rect(120, 100, 10, 10, 8, 70, 255, 0)
        .unwrap()
        .to_mut();
    for y in 10..40 {
        for x in 60..68 {
            pm.set_pixel_unchecked(x, y, 255);
        }
    }
    let two: morphomoss::Pix = pm.into();
    let m = measure_pix(&two, None, &opts).expect("two teeth");
    rp.compare_values(2.0, m.tooth_count() as f64, 0.0);
    if m.tooth_count() == 2 {
        let (long, short) = (m.lengths_px[0], m.lengths_px[1]);
        eprintln!("  two teeth: {:.2} / {:.2} px", long, short);
        rp.compare_values(1.0, (long > short) as u8 as f64, 0.0);
        rp.compare_values((long + short) / 2.0, m.mean_px, 1e-12);
        // Keeping only the long tooth
        let only_long = opts.with_min_length((long + short) / 2.0);
        let m2 = measure_pix(&two, None, &only_long).expect("min length");
        rp.compare_values(long, m2.value, 0.0);
    }

    // --- Test 10: a one-pixel diagonal line measures about half its length ---
    // Canny outlines both sides of the line; each side is about two
    // diagonal steps shorter than the line itself. A sub-pixel fragment
    // at one end is dropped by the default minimum length.
    let n = 60u32;
    let mut pm = synth::blank(100, 100, 0).unwrap().to_mut();
    for i in 0..n {
        pm.set_pixel_unchecked(20 + i, 20 + i, 255);
    }
    let diagonal: morphomoss::Pix = pm.into();
    let half = (n - 1) as f64 * std::f64::consts::SQRT_2 / 2.0;
    let m = measure_pix(&diagonal, None, &opts).expect("diagonal");
    eprintln!(
        "  diagonal: {} contours, lengths {:?}, mean {:.2} px (L/2 = {:.2})",
        m.contour_count, m.lengths_px, m.value, half
    );
    rp.compare_values(half, m.value, 0.05 * half);
    rp.compare_values(1.0, (m.value <= half) as u8 as f64, 0.0);
    let k = 0.8;
    let scaled = measure_pix(&diagonal, Some(k), &opts).expect("diagonal scaled");
    rp.compare_values(half * k, scaled.value, 0.05 * half * k);
    rp.compare_values(m.mean_px * k, scaled.value, 1e-9);
    rp.compare_strings("micrometers", &scaled.unit.to_string());
    // Averaging every boundary, fragment included, pulls the mean down
    let all = measure_pix(&diagonal, None, &opts.with_min_length(0.0)).expect("all");
    rp.compare_values(1.0, (all.value <= m.value) as u8 as f64, 0.0);

    // A thick tilted tooth still measures
    let tilted = synth::thick_line(100, 100, (20.0, 80.0), (75.0, 20.0), 3.0, 220).unwrap();
    let m = measure_pix(&tilted, None, &opts).expect("tilted");
    eprintln!("  tilted: {} teeth, {:.2} px", m.tooth_count(), m.value);
    rp.compare_values(1.0, (m.tooth_count() >= 1) as u8 as f64, 0.0);
    rp.compare_values(1.0, (m.value.is_finite() && m.value > 0.0) as u8 as f64, 0.0);

    // --- Test 11: preprocessing and sobel detector still measure the bar ---
    let pre = opts.with_preprocess(PreprocessOptions {
        contrast: Some(1.0),
        blur: Some(GaussianBlur::from_sigma(1.0)),
    });
    let m = measure_pix(&bar, None, &pre).expect("preprocessed");
    rp.check_range(20.0, 70.0, m.value);
    let sobel = opts.with_detector(EdgeDetector::Sobel { threshold: 150.0 });
    let m = measure_pix(&bar, None, &sobel).expect("sobel");
    rp.check_range(30.0, 60.0, m.value);
    let strict = opts.with_canny(CannyParams::new(2000.0, 3000.0));
    let err = measure_pix(&bar, None, &strict).unwrap_err();
    rp.compare_values(1.0, matches!(err, MeasureError::NoContours) as u8 as f64, 0.0);

    assert!(rp.cleanup(), "measure regression test failed");
}
