//! morphomoss-test - Regression test framework for MorphoMoss
//!
//! Provides [`RegParams`], a small harness that counts comparisons and
//! reports every failure at the end of a test, and [`synth`], builders
//! for synthetic microscopy-like images.
//!
//! # Usage
//!
//! ```ignore
//! use morphomoss_test::{RegParams, synth};
//!
//! let mut rp = RegParams::new("measure");
//! rp.compare_values(40.8, length, 0.5);
//! assert!(rp.cleanup());
//! ```
//!
//! # Environment Variables
//!
//! - `REGTEST_MODE`: Set to "display" to keep intermediate images in
//!   `tests/regout` for visual inspection

mod error;
mod params;
pub mod synth;

pub use error::{TestError, TestResult};
pub use params::{RegParams, RegTestMode};

use morphomoss_core::{ImageFormat, Pix};

/// Get the path to the workspace root
fn workspace_root() -> String {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    // morphomoss-test is at crates/morphomoss-test, so go up two directories
    format!("{}/../..", manifest_dir)
}

/// Get the path to the regout (regression output) directory
pub fn regout_dir() -> String {
    format!("{}/tests/regout", workspace_root())
}

/// Write `pix` into the regout directory and return the file path.
///
/// Used to turn a synthetic image into a file that the path-based
/// measurement entry points can load.
pub fn write_fixture(pix: &Pix, name: &str, format: ImageFormat) -> TestResult<String> {
    let dir = regout_dir();
    std::fs::create_dir_all(&dir)?;
    let path = format!("{}/{}.{}", dir, name, format.extension());
    morphomoss_io::write_image(pix, &path, format).map_err(|e| TestError::ImageWrite {
        path: path.clone(),
        message: e.to_string(),
    })?;
    Ok(path)
}
