//! Edge detection regression test
//!
//! Runs Canny and thresholded Sobel on synthetic bars and checks where
//! edges may and may not appear, plus the effect of blur and contrast
//! preprocessing on edge counts.

use morphomoss_core::{ImageFormat, Pix};
use morphomoss_filter::{
    CannyParams, EdgeDetector, canny_edge, contrast_trc_pix, gaussian_blur, sobel_gradients,
};
use morphomoss_test::{RegParams, synth};

fn edges_outside(edges: &Pix, x0: u32, y0: u32, x1: u32, y1: u32) -> u32 {
    let mut n = 0;
    for y in 0..edges.height() {
        for x in 0..edges.width() {
            let inside = x >= x0 && x <= x1 && y >= y0 && y <= y1;
            if !inside && edges.get_pixel(x, y) == Some(1) {
                n += 1;
            }
        }
    }
    n
}

#[test]
fn edge_reg() {
    let mut rp = RegParams::new("edge");

    // 60x10 bright bar at columns 20..80, rows 45..55
    let bar = synth::filled_rect(100, 100, 20, 45, 60, 10, 255, 0).unwrap();

    // --- Test 1: Canny outlines the bar and nothing else ---
    let edges = canny_edge(&bar, &CannyParams::default()).expect("canny");
    rp.write_pix(&edges, ImageFormat::Png).expect("write edges");
    rp.compare_values(100.0, edges.width() as f64, 0.0);
    rp.compare_values(100.0, edges.height() as f64, 0.0);
    let count = edges.count_pixels();
    eprintln!("  canny edge pixels: {}", count);
    rp.check_range(100.0, 200.0, count as f64);
    rp.compare_values(0.0, edges_outside(&edges, 18, 43, 81, 56) as f64, 0.0);
    // No edges deep inside the bar
    let mut interior = 0;
    for y in 48..52 {
        for x in 23..77 {
            interior += edges.get_pixel(x, y).unwrap_or(0);
        }
    }
    rp.compare_values(0.0, interior as f64, 0.0);

    // --- Test 2: gray-equivalent RGB input needs conversion but matches ---
    let rgb = bar.convert_8_to_32().unwrap();
    let back = rgb.convert_to_8().unwrap();
    let edges_rgb = canny_edge(&back, &CannyParams::default()).expect("canny rgb");
    rp.compare_pix(&edges, &edges_rgb);

    // --- Test 3: thresholds above any gradient give no edges ---
    let high = CannyParams::new(2000.0, 3000.0);
    let none = canny_edge(&bar, &high).expect("canny high");
    rp.compare_values(0.0, none.count_pixels() as f64, 0.0);

    // --- Test 4: Sobel detector gives a thicker outline ---
    let sobel = EdgeDetector::Sobel { threshold: 150.0 }
        .detect(&bar)
        .expect("sobel");
    rp.compare_values(1.0, (sobel.count_pixels() > count) as u8 as f64, 0.0);
    rp.compare_values(0.0, edges_outside(&sobel, 18, 43, 81, 56) as f64, 0.0);
    let grad = sobel_gradients(&bar).expect("sobel_gradients");
    rp.compare_values(1.0, (grad.magnitude(50, 44) >= 255) as u8 as f64, 0.0);
    rp.compare_values(0.0, grad.magnitude(50, 50) as f64, 0.0);

    // --- Test 5: a dim bar is recovered by contrast enhancement ---
    let dim = synth::filled_rect(100, 100, 20, 45, 60, 10, 140, 116).unwrap();
    let before = canny_edge(&dim, &CannyParams::default()).expect("canny dim");
    let boosted = contrast_trc_pix(&dim, 1.0).expect("contrast");
    let after = canny_edge(&boosted, &CannyParams::default()).expect("canny boosted");
    eprintln!(
        "  dim bar edges: before={} after={}",
        before.count_pixels(),
        after.count_pixels()
    );
    rp.compare_values(0.0, before.count_pixels() as f64, 0.0);
    rp.compare_values(1.0, (after.count_pixels() > 0) as u8 as f64, 0.0);

    // --- Test 6: blurring keeps edges near the bar border ---
    let blurred = gaussian_blur(&bar, 2, 1.0).expect("blur");
    let edges_blur = canny_edge(&blurred, &CannyParams::default()).expect("canny blur");
    rp.compare_values(1.0, (edges_blur.count_pixels() > 0) as u8 as f64, 0.0);
    rp.compare_values(0.0, edges_outside(&edges_blur, 15, 40, 84, 59) as f64, 0.0);

    assert!(rp.cleanup(), "edge regression test failed");
}
