//! TOML job files.
//!
//! ```toml
//! [grid]
//! resolution = 512
//! unit = "micrometre"
//! pitch = 2.0
//!
//! [aperture]
//! type = "double_slit"
//! width = 8.0
//! height = 200.0
//! separation = 60.0
//! rotation = 15.0
//!
//! [optics]
//! wavelength_nm = 632.8
//!
//! [display]
//! colormap = "wavelength"
//!
//! [output]
//! image = "out/double_slit.png"
//! profiles = "out/double_slit.csv"
//! aperture_profile = "out/double_slit_aperture.csv"
//! ```
//!
//! Every section and key is optional; missing values fall back to a 256 pixel grid and a
//! 20 pixel circle lit at 500 nm.

use crate::diffraction::IntensityScale;
use crate::error::Result;
use crate::grid::{LengthUnit, SimulationGrid};
use crate::mask::{ApertureSpec, ShapeKind};
use crate::render::Colormap;
use crate::SimulationParams;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level job configuration.
#[derive(Debug, Default, Deserialize)]
pub struct JobConfig {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub aperture: ApertureConfig,
    #[serde(default)]
    pub optics: OpticsConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_resolution")]
    pub resolution: usize,
    /// Size of one pixel in `unit`. Ignored for pixel grids.
    #[serde(default = "default_pitch")]
    pub pitch: f64,
    #[serde(default)]
    pub unit: LengthUnit,
    #[serde(default = "default_supersample")]
    pub supersample: usize,
    /// Round the resolution up to a length with only small prime factors.
    #[serde(default)]
    pub fast_fft: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            resolution: default_resolution(),
            pitch: default_pitch(),
            unit: LengthUnit::Pixel,
            supersample: default_supersample(),
            fast_fft: false,
        }
    }
}

fn default_resolution() -> usize {
    256
}
fn default_pitch() -> f64 {
    1.0
}
fn default_supersample() -> usize {
    1
}

/// The aperture: a `type` tag plus that shape's dimensions.
#[derive(Debug, Deserialize)]
pub struct ApertureConfig {
    #[serde(flatten)]
    pub shape: ApertureSpec,
    /// Degrees, counter-clockwise.
    #[serde(default)]
    pub rotation: f64,
}

impl Default for ApertureConfig {
    fn default() -> Self {
        Self {
            shape: ShapeKind::Circle.default_spec(),
            rotation: 0.0,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OpticsConfig {
    #[serde(default = "default_wavelength")]
    pub wavelength_nm: f64,
    #[serde(default = "default_distance")]
    pub distance_m: f64,
}

impl Default for OpticsConfig {
    fn default() -> Self {
        Self {
            wavelength_nm: default_wavelength(),
            distance_m: default_distance(),
        }
    }
}

fn default_wavelength() -> f64 {
    500.0
}
fn default_distance() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
pub struct DisplayConfig {
    /// Show `ln(1 + I)` rather than `I` (default: true).
    #[serde(default = "default_true")]
    pub log_scale: bool,
    #[serde(default)]
    pub normalise: bool,
    #[serde(default = "default_colormap")]
    pub colormap: Colormap,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            log_scale: true,
            normalise: false,
            colormap: default_colormap(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_colormap() -> Colormap {
    Colormap::Hot
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Two-panel figure (default: "diffraction.png").
    #[serde(default = "default_image")]
    pub image: PathBuf,
    /// CSV of the centre cuts, skipped when unset.
    #[serde(default)]
    pub profiles: Option<PathBuf>,
    /// CSV of the aperture's centre row and its 1D spectrum, skipped when unset.
    #[serde(default)]
    pub aperture_profile: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            image: default_image(),
            profiles: None,
            aperture_profile: None,
        }
    }
}

fn default_image() -> PathBuf {
    "diffraction.png".into()
}

impl JobConfig {
    pub fn scale(&self) -> IntensityScale {
        if self.display.log_scale {
            IntensityScale::Log1p
        } else {
            IntensityScale::Linear
        }
    }

    /// Validated simulation parameters for this job.
    pub fn to_params(&self) -> Result<SimulationParams> {
        let g = &self.grid;
        let mut grid = match g.unit {
            LengthUnit::Pixel => SimulationGrid::pixels(g.resolution),
            LengthUnit::Micrometre => SimulationGrid::micrometres(g.resolution, g.pitch),
        }
        .with_supersample(g.supersample);
        if g.fast_fft {
            grid = grid.with_fast_resolution();
        }

        let params = SimulationParams {
            grid,
            aperture: self.aperture.shape.clone(),
            rotation_deg: self.aperture.rotation,
            wavelength_nm: self.optics.wavelength_nm,
            distance_m: self.optics.distance_m,
            scale: self.scale(),
            normalise: self.display.normalise,
        };
        params.validate()?;
        Ok(params)
    }
}

pub fn parse_config(content: &str) -> Result<JobConfig> {
    Ok(toml::from_str(content)?)
}

/// Load and parse a TOML job configuration file.
pub fn load_config(path: &Path) -> Result<JobConfig> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}
