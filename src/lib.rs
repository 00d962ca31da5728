//! Fraunhofer (far-field) diffraction of 2D apertures.
//!
//! A binary aperture is sampled on an N×N grid, its centred 2D DFT is taken, and the squared
//! magnitude is returned as the intensity pattern, optionally log compressed. Everything is
//! recomputed from a [`SimulationParams`] snapshot on each call.
//!
//! ```no_run
//! use fraunhofer::{simulate, SimulationParams};
//!
//! let sim = simulate(&SimulationParams::default()).unwrap();
//! assert_eq!(sim.pattern.argmax(), (128, 128));
//! ```

use crate::diffraction::{diffract, IntensityPattern, IntensityScale};
use crate::error::{invalid, Result};
use crate::grid::SimulationGrid;
use crate::mask::{generate_rotated, ApertureMask, ApertureSpec, ShapeKind};
use crate::profile::{col_profile, row_profile, spectrum_1d, Profile1D};

pub mod config;
pub mod diffraction;
pub mod error;
mod fft2;
mod find_fast_number;
pub mod grid;
pub mod mask;
pub mod profile;
pub mod render;

pub use crate::error::Error;

/// Everything needed to compute one pattern.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationParams {
    pub grid: SimulationGrid,
    pub aperture: ApertureSpec,
    /// Counter-clockwise, degrees.
    pub rotation_deg: f64,
    /// Only labels the observation axis and tints the wavelength colormap.
    pub wavelength_nm: f64,
    pub distance_m: f64,
    pub scale: IntensityScale,
    /// Divide the (scaled) pattern by its peak.
    pub normalise: bool,
}

impl Default for SimulationParams {
    fn default() -> Self {
        SimulationParams {
            grid: SimulationGrid::pixels(256),
            aperture: ShapeKind::Circle.default_spec(),
            rotation_deg: 0.0,
            wavelength_nm: 500.0,
            distance_m: 1.0,
            scale: IntensityScale::Log1p,
            normalise: false,
        }
    }
}

impl SimulationParams {
    pub fn validate(&self) -> Result<()> {
        self.grid.validate()?;
        self.aperture.validate()?;
        if !self.rotation_deg.is_finite() {
            return invalid(format!("rotation must be finite, got {}", self.rotation_deg));
        }
        if !self.wavelength_nm.is_finite() || self.wavelength_nm <= 0.0 {
            return invalid(format!(
                "wavelength must be positive, got {} nm",
                self.wavelength_nm
            ));
        }
        if !self.distance_m.is_finite() || self.distance_m <= 0.0 {
            return invalid(format!(
                "distance must be positive, got {} m",
                self.distance_m
            ));
        }
        Ok(())
    }
}

/// Output of [`simulate`].
#[derive(Clone, Debug)]
pub struct Simulation {
    pub mask: ApertureMask,
    pub pattern: IntensityPattern,
    /// Centre row of the pattern.
    pub horizontal: Profile1D,
    /// Centre column of the pattern.
    pub vertical: Profile1D,
    /// Centre row of the aperture.
    pub aperture_profile: Profile1D,
    /// Centred 1D spectrum magnitude of `aperture_profile`.
    pub aperture_spectrum: Profile1D,
    pub wavelength_nm: f64,
}

/// Runs the whole chain: aperture, far field, profiles.
pub fn simulate(params: &SimulationParams) -> Result<Simulation> {
    params.validate()?;
    let grid = &params.grid;

    let mask = generate_rotated(&params.aperture, grid, params.rotation_deg)?;
    let mut pattern = diffract(&mask, params.scale)?;
    if params.normalise {
        pattern = pattern.normalised();
    }

    let obs_axis = grid.observation_axis(params.wavelength_nm, params.distance_m);
    let horizontal = Profile1D {
        values: row_profile(pattern.values.view(), None)?,
        axis: obs_axis.clone(),
    };
    let vertical = Profile1D {
        values: col_profile(pattern.values.view(), None)?,
        axis: obs_axis,
    };

    let aperture_row = row_profile(mask.values.view(), None)?;
    let aperture_spectrum = Profile1D {
        values: spectrum_1d(aperture_row.view()),
        axis: grid.frequency_axis(),
    };
    let aperture_profile = Profile1D {
        values: aperture_row,
        axis: grid.spatial_axis(),
    };

    log::debug!(
        "{} at N={}: transmission:{} peak:{}",
        params.aperture.kind(),
        grid.resolution,
        mask.transmission(),
        pattern.peak()
    );

    Ok(Simulation {
        mask,
        pattern,
        horizontal,
        vertical,
        aperture_profile,
        aperture_spectrum,
        wavelength_nm: params.wavelength_nm,
    })
}
