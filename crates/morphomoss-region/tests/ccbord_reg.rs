//! Border tracing and contour regression test
//!
//! Traces external borders of binary masks and of Canny edge maps,
//! and checks point counts, nesting and arc lengths.

use morphomoss_core::{ImageFormat, Pix, PixelDepth};
use morphomoss_filter::{CannyParams, canny_edge};
use morphomoss_region::{
    ChainApprox, ConnectivityType, find_external_contours, get_external_borders,
    label_components, render_borders,
};
use morphomoss_test::{RegParams, synth};

fn mask_from_gray(pix: &Pix) -> Pix {
    let mut pm = Pix::new(pix.width(), pix.height(), PixelDepth::Bit1)
        .unwrap()
        .to_mut();
    for y in 0..pix.height() {
        for x in 0..pix.width() {
            if pix.get_pixel(x, y).unwrap_or(0) != 0 {
                pm.set_pixel_unchecked(x, y, 1);
            }
        }
    }
    pm.into()
}

#[test]
fn ccbord_reg() {
    let mut rp = RegParams::new("ccbord");

    // --- Test 1: filled rectangle gives its four corners ---
    let rect = synth::filled_rect(16, 10, 2, 2, 10, 4, 255, 0).unwrap();
    let mask = mask_from_gray(&rect);
    let contours = find_external_contours(&mask, ChainApprox::Simple).expect("contours");
    rp.compare_values(1.0, contours.len() as f64, 0.0);
    rp.compare_values(4.0, contours[0].len() as f64, 0.0);
    rp.compare_values(15.0, contours[0].arc_length(false), 1e-9);
    rp.compare_values(24.0, contours[0].arc_length(true), 1e-9);

    // 8 bpp input with non-zero foreground gives the same contours
    let from_gray = find_external_contours(&rect, ChainApprox::Simple).expect("gray");
    rp.compare_values(1.0, (from_gray == contours) as u8 as f64, 0.0);

    // --- Test 2: full chain versus simple approximation ---
    let full = find_external_contours(&mask, ChainApprox::None).expect("full");
    rp.compare_values(24.0, full[0].len() as f64, 0.0);
    rp.compare_values(23.0, full[0].arc_length(false), 1e-9);

    // --- Test 3: nested components are not external ---
    let nested = synth::binary_from_ascii(&[
        "...........",
        ".#########.",
        ".#.......#.",
        ".#.#####.#.",
        ".#.#...#.#.",
        ".#.#.#.#.#.",
        ".#.#...#.#.",
        ".#.#####.#.",
        ".#.......#.",
        ".#########.",
        "...........",
    ])
    .unwrap();
    let labels = label_components(&nested, ConnectivityType::EightWay).expect("labels");
    rp.compare_values(3.0, labels.components().len() as f64, 0.0);
    rp.compare_values(1.0, labels.external().count() as f64, 0.0);
    let borders = get_external_borders(&nested).expect("borders");
    rp.compare_values(1.0, borders.len() as f64, 0.0);
    rp.compare_values(32.0, borders[0].len() as f64, 0.0);

    let rendered = render_borders(&borders, nested.width(), nested.height()).expect("render");
    rp.write_pix(&rendered, ImageFormat::Png).expect("write rendered");
    rp.compare_values(32.0, rendered.count_pixels() as f64, 0.0);

    // --- Test 4: Canny outline of a bar is one contour ---
    let bar = synth::filled_rect(100, 100, 20, 45, 60, 10, 255, 0).unwrap();
    let edges = canny_edge(&bar, &CannyParams::default()).expect("canny");
    rp.write_pix(&edges, ImageFormat::Png).expect("write edges");
    let bar_contours = find_external_contours(&edges, ChainApprox::Simple).expect("bar");
    rp.compare_values(1.0, bar_contours.len() as f64, 0.0);
    let half = bar_contours[0].arc_length(false) / 2.0;
    eprintln!("  bar contour: {} points, half length {:.2}", bar_contours[0].len(), half);
    rp.check_range(30.0, 55.0, half);

    // --- Test 5: separate teeth are reported in raster order ---
    let two = synth::filled_rect(60, 40, 5, 5, 10, 30, 255, 0).unwrap();
    let mut pm = two.try_into_mut().unwrap_or_else(|p| p.to_mut());
    for y in 20..35 {
        for x in 40..50 {
            pm.set_pixel_unchecked(x, y, 255);
        }
    }
    let two: Pix = pm.into();
    let edges = canny_edge(&two, &CannyParams::default()).expect("canny two");
    let teeth = find_external_contours(&edges, ChainApprox::Simple).expect("teeth");
    rp.compare_values(2.0, teeth.len() as f64, 0.0);
    if teeth.len() == 2 {
        let (a, b) = (teeth[0].points()[0], teeth[1].points()[0]);
        rp.compare_values(1.0, (a.y < b.y || (a.y == b.y && a.x < b.x)) as u8 as f64, 0.0);
    }

    assert!(rp.cleanup(), "ccbord regression test failed");
}
