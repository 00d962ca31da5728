//! The sampling grid shared by the aperture and its diffraction pattern.

use crate::error::{invalid, Result};
use crate::find_fast_number::fastish_fft_len;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Resolutions above this are accepted but logged, the transform cost grows as N² log N.
pub const LARGE_RESOLUTION: usize = 4096;

/// Length unit of the grid pitch and of every aperture dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthUnit {
    Pixel,
    Micrometre,
}

impl Default for LengthUnit {
    fn default() -> Self {
        LengthUnit::Pixel
    }
}

/// Unit attached to a coordinate axis handed to the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AxisUnit {
    Pixel,
    Micrometre,
    Millimetre,
    CyclesPerPixel,
    InverseMillimetre,
}

impl AxisUnit {
    pub fn label(self) -> &'static str {
        match self {
            AxisUnit::Pixel => "px",
            AxisUnit::Micrometre => "um",
            AxisUnit::Millimetre => "mm",
            AxisUnit::CyclesPerPixel => "cycles/px",
            AxisUnit::InverseMillimetre => "1/mm",
        }
    }
}

/// Coordinates of each sample along one axis.
#[derive(Clone, Debug)]
pub struct Axis1D {
    pub values: Array1<f64>,
    pub unit: AxisUnit,
}

/// An N×N sampling of the aperture plane.
///
/// Pixel `i` sits at `(i - N/2) * pitch`, so the centre pixel is `N/2` (rounded down) on both axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationGrid {
    pub resolution: usize,
    pub pitch: f64,
    pub unit: LengthUnit,
    /// Sub-samples per pixel side. 1 gives hard binary edges.
    pub supersample: usize,
}

impl SimulationGrid {
    /// A grid measured in pixels, pitch 1.
    pub fn pixels(resolution: usize) -> Self {
        SimulationGrid {
            resolution,
            pitch: 1.0,
            unit: LengthUnit::Pixel,
            supersample: 1,
        }
    }

    /// A grid with a physical pixel pitch in micrometres.
    pub fn micrometres(resolution: usize, pitch_um: f64) -> Self {
        SimulationGrid {
            resolution,
            pitch: pitch_um,
            unit: LengthUnit::Micrometre,
            supersample: 1,
        }
    }

    pub fn with_supersample(mut self, supersample: usize) -> Self {
        self.supersample = supersample;
        self
    }

    /// Rounds the resolution up to a length that transforms quickly.
    pub fn with_fast_resolution(mut self) -> Self {
        self.resolution = fastish_fft_len(self.resolution);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.resolution < 2 {
            return invalid(format!(
                "resolution must be at least 2, got {}",
                self.resolution
            ));
        }
        if !self.pitch.is_finite() || self.pitch <= 0.0 {
            return invalid(format!("pitch must be positive, got {}", self.pitch));
        }
        if self.supersample == 0 {
            return invalid("supersample must be at least 1");
        }
        if self.resolution > LARGE_RESOLUTION {
            log::warn!(
                "resolution {} exceeds {}, recomputation will be slow",
                self.resolution,
                LARGE_RESOLUTION
            );
        }
        Ok(())
    }

    pub fn center(&self) -> usize {
        self.resolution / 2
    }

    /// Physical width of the whole grid.
    pub fn extent(&self) -> f64 {
        self.resolution as f64 * self.pitch
    }

    /// Centred coordinate of sample `i`.
    pub fn coordinate(&self, i: usize) -> f64 {
        (i as f64 - self.center() as f64) * self.pitch
    }

    /// Aperture-plane axis, in pixels or micrometres.
    pub fn spatial_axis(&self) -> Axis1D {
        let unit = match self.unit {
            LengthUnit::Pixel => AxisUnit::Pixel,
            LengthUnit::Micrometre => AxisUnit::Micrometre,
        };
        Axis1D {
            values: Array1::from_shape_fn(self.resolution, |i| self.coordinate(i)),
            unit,
        }
    }

    /// Centred spatial-frequency axis, the shifted equivalent of numpy's `fftfreq`.
    ///
    /// Cycles per pixel on pixel grids, mm⁻¹ on physical grids.
    pub fn frequency_axis(&self) -> Axis1D {
        let n = self.resolution;
        let c = self.center() as f64;
        match self.unit {
            LengthUnit::Pixel => Axis1D {
                values: Array1::from_shape_fn(n, |k| (k as f64 - c) / n as f64),
                unit: AxisUnit::CyclesPerPixel,
            },
            LengthUnit::Micrometre => {
                // pitch in µm, so 1e3 converts µm⁻¹ to mm⁻¹
                let step = 1e3 / (n as f64 * self.pitch);
                Axis1D {
                    values: Array1::from_shape_fn(n, |k| (k as f64 - c) * step),
                    unit: AxisUnit::InverseMillimetre,
                }
            }
        }
    }

    /// Observation-plane axis of the far-field pattern.
    ///
    /// Only labels the plot: pixel grids keep the frequency axis, physical grids map a spatial
    /// frequency `f` to `f·λ·z` in millimetres. The transform itself never depends on `λ`.
    pub fn observation_axis(&self, wavelength_nm: f64, distance_m: f64) -> Axis1D {
        let freq = self.frequency_axis();
        match self.unit {
            LengthUnit::Pixel => freq,
            LengthUnit::Micrometre => {
                // mm⁻¹ -> m⁻¹, times λ[m]·z[m], -> mm
                let scale = 1e3 * wavelength_nm * 1e-9 * distance_m * 1e3;
                Axis1D {
                    values: freq.values.mapv(|f| f * scale),
                    unit: AxisUnit::Millimetre,
                }
            }
        }
    }
}
