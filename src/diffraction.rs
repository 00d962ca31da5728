//! Far-field intensity of an aperture mask.
//!
//! In the Fraunhofer regime the field on the observation plane is the Fourier transform of the
//! aperture transmittance, so the pattern is computed entirely in pixel space. No wavelength or
//! distance enters the transform; they only relabel the axes (see [`SimulationGrid::observation_axis`]).
//!
//! [`SimulationGrid::observation_axis`]: crate::grid::SimulationGrid::observation_axis

use crate::error::{Error, Result};
use crate::fft2::{fft2, fft2_shift_inplace};
use crate::mask::ApertureMask;
use ndarray::Array2;
use num_complex::Complex;
use serde::{Deserialize, Serialize};

/// How intensity values are presented.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntensityScale {
    /// `|F|²`
    Linear,
    /// `ln(1 + |F|²)`, natural log.
    Log1p,
}

impl IntensityScale {
    pub fn apply(self, intensity: f64) -> f64 {
        match self {
            IntensityScale::Linear => intensity,
            IntensityScale::Log1p => intensity.ln_1p(),
        }
    }
}

/// The complex far field of a mask.
///
/// DC value is centered. That is it is at len/2 on each axis.
#[derive(Clone, Debug)]
pub struct DiffractionField {
    pub values: Array2<Complex<f64>>,
}

impl DiffractionField {
    /// Sum of the squared norm of the field.
    ///
    /// The transform is unnormalised, so this is `N·M` times the summed squared transmittance.
    pub fn power(&self) -> f64 {
        self.values.iter().fold(0.0, |sum, &v| sum + v.norm_sqr())
    }

    pub fn intensity(&self, scale: IntensityScale) -> IntensityPattern {
        IntensityPattern {
            values: self.values.mapv(|v| scale.apply(v.norm_sqr())),
            scale,
        }
    }
}

/// Squared magnitude of a [`DiffractionField`], possibly log compressed. Every value is `>= 0`.
#[derive(Clone, Debug)]
pub struct IntensityPattern {
    pub values: Array2<f64>,
    pub scale: IntensityScale,
}

impl IntensityPattern {
    pub fn peak(&self) -> f64 {
        self.values.iter().fold(0.0, |max: f64, &v| v.max(max))
    }

    /// Index of the first maximum in row-major order.
    pub fn argmax(&self) -> (usize, usize) {
        let mut best = ((0, 0), f64::NEG_INFINITY);
        for (idx, &v) in self.values.indexed_iter() {
            if v > best.1 {
                best = (idx, v);
            }
        }
        best.0
    }

    /// Pattern divided by its peak. An all-zero pattern is returned unchanged.
    pub fn normalised(&self) -> IntensityPattern {
        let peak = self.peak();
        if peak <= 0.0 {
            return self.clone();
        }
        IntensityPattern {
            values: self.values.mapv(|v| v / peak),
            scale: self.scale,
        }
    }
}

/// Centred 2D DFT of the mask.
pub fn diffraction_field(mask: &ApertureMask) -> Result<DiffractionField> {
    if mask.values.is_empty() {
        return Err(Error::InvalidParameter("mask has no samples".into()));
    }
    if let Some(v) = mask.values.iter().find(|v| !v.is_finite()) {
        return Err(Error::ComputationFailure(format!(
            "mask contains a non-finite value: {}",
            v
        )));
    }

    let mut values = fft2(mask.values.mapv(|v| Complex::new(v, 0.0)));
    fft2_shift_inplace(values.view_mut());

    if values.iter().any(|v| !v.re.is_finite() || !v.im.is_finite()) {
        return Err(Error::ComputationFailure(
            "transform produced a non-finite value".into(),
        ));
    }

    let field = DiffractionField { values };
    log::debug!(
        "far field: {:?} power:{}",
        field.values.shape(),
        field.power()
    );
    Ok(field)
}

/// Intensity pattern of the mask, `|F|²` or `ln(1 + |F|²)`.
pub fn diffract(mask: &ApertureMask, scale: IntensityScale) -> Result<IntensityPattern> {
    Ok(diffraction_field(mask)?.intensity(scale))
}

#[cfg(test)]
mod tests {
    use super::{diffract, diffraction_field, IntensityScale};
    use crate::error::Error;
    use crate::grid::SimulationGrid;
    use crate::mask::{generate, ApertureMask, ApertureSpec, ShapeKind};
    use ndarray::Array2;

    fn delta(n: usize) -> ApertureMask {
        let grid = SimulationGrid::pixels(n);
        let mut values = Array2::zeros([n, n]);
        values[[grid.center(), grid.center()]] = 1.0;
        ApertureMask { values, grid }
    }

    #[test]
    fn centred_delta_gives_a_flat_pattern() {
        for &n in &[16usize, 17, 64] {
            let pattern = diffract(&delta(n), IntensityScale::Linear).unwrap();
            for &v in pattern.values.iter() {
                assert!((v - 1.0).abs() < 1e-9, "n = {}: {}", n, v);
            }
        }
    }

    #[test]
    fn uniform_mask_lands_on_the_centre() {
        for &n in &[8usize, 9] {
            let grid = SimulationGrid::pixels(n);
            let mask = ApertureMask {
                values: Array2::from_elem([n, n], 1.0),
                grid,
            };
            let pattern = diffract(&mask, IntensityScale::Linear).unwrap();
            let c = n / 2;
            assert_eq!(pattern.argmax(), (c, c));
            assert!((pattern.values[[c, c]] - (n * n * n * n) as f64).abs() < 1e-6);
            assert!(pattern.values.sum() - pattern.values[[c, c]] < 1e-6);
        }
    }

    #[test]
    fn intensity_is_non_negative() {
        let grid = SimulationGrid::pixels(64);
        for kind in ShapeKind::ALL.iter() {
            let mask = generate(&kind.default_spec(), &grid).unwrap();
            for &scale in &[IntensityScale::Linear, IntensityScale::Log1p] {
                let pattern = diffract(&mask, scale).unwrap();
                assert!(pattern.values.iter().all(|&v| v >= 0.0), "{}", kind);
            }
        }
    }

    #[test]
    fn peak_equals_squared_transmission() {
        let grid = SimulationGrid::pixels(64);
        let mask = generate(&ApertureSpec::Square { side: 12.0 }, &grid).unwrap();
        let pattern = diffract(&mask, IntensityScale::Linear).unwrap();
        assert_eq!(pattern.argmax(), (32, 32));
        assert!((pattern.peak() - 144.0 * 144.0).abs() < 1e-6);

        // Parseval with an unnormalised transform
        let field = diffraction_field(&mask).unwrap();
        assert!((field.power() - 64.0 * 64.0 * 144.0).abs() < 1e-6);
    }

    #[test]
    fn log_scale_preserves_ordering() {
        let grid = SimulationGrid::pixels(32);
        let mask = generate(&ApertureSpec::Circle { radius: 5.0 }, &grid).unwrap();
        let field = diffraction_field(&mask).unwrap();
        let linear = field.intensity(IntensityScale::Linear);
        let log = field.intensity(IntensityScale::Log1p);

        for (&l, &g) in linear.values.iter().zip(log.values.iter()) {
            assert!((g - l.ln_1p()).abs() < 1e-12);
        }
        let lin: Vec<f64> = linear.values.iter().copied().collect();
        let lg: Vec<f64> = log.values.iter().copied().collect();
        for i in (0..lin.len()).step_by(7) {
            for j in (0..lin.len()).step_by(11) {
                if lin[i] >= lin[j] {
                    assert!(lg[i] >= lg[j]);
                }
                if lin[i] > lin[j] * (1.0 + 1e-9) + 1e-12 {
                    assert!(lg[i] > lg[j]);
                }
            }
        }
        assert_eq!(linear.argmax(), log.argmax());
    }

    #[test]
    fn normalised_peak_is_one() {
        let grid = SimulationGrid::pixels(32);
        let mask = generate(&ApertureSpec::Circle { radius: 4.0 }, &grid).unwrap();
        let pattern = diffract(&mask, IntensityScale::Linear).unwrap().normalised();
        assert!((pattern.peak() - 1.0).abs() < 1e-12);

        let dark = ApertureMask {
            values: Array2::zeros([8, 8]),
            grid: SimulationGrid::pixels(8),
        };
        let dark = diffract(&dark, IntensityScale::Linear).unwrap();
        assert_eq!(dark.normalised().values, dark.values);
    }

    #[test]
    fn non_finite_masks_are_rejected() {
        let mut mask = delta(8);
        mask.values[[1, 2]] = f64::NAN;
        assert!(matches!(
            diffract(&mask, IntensityScale::Linear),
            Err(Error::ComputationFailure(_))
        ));
    }

    #[test]
    fn field_does_not_alias_the_mask() {
        let mask = delta(16);
        let before = mask.values.clone();
        let _ = diffract(&mask, IntensityScale::Log1p).unwrap();
        assert_eq!(mask.values, before);
    }
}
