//! Raster and CSV export of a computed pattern.

use crate::diffraction::IntensityPattern;
use crate::error::Result;
use crate::mask::ApertureMask;
use crate::profile::Profile1D;
use image::{Rgb, RgbImage};
use ndarray::ArrayView2;
use palette::{LinSrgb, Srgb};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// Blank columns between the aperture and pattern panels.
pub const PANEL_GAP: u32 = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Colormap {
    Grey,
    /// Black through red and yellow to white.
    Hot,
    /// Black to the approximate colour of the light.
    Wavelength,
}

impl Colormap {
    /// Colour of a value in [0, 1]; values outside are clamped.
    pub fn colour(self, value: f64, wavelength_nm: f64) -> Rgb<u8> {
        let v = if value.is_nan() { 0.0 } else { value.max(0.0).min(1.0) };
        let colour = match self {
            Colormap::Grey => Srgb::new(v, v, v),
            Colormap::Hot => Srgb::new(
                (3.0 * v).min(1.0),
                (3.0 * v - 1.0).max(0.0).min(1.0),
                (3.0 * v - 2.0).max(0.0),
            ),
            Colormap::Wavelength => {
                let (r, g, b) = wavelength_to_rgb(wavelength_nm);
                Srgb::from_linear(LinSrgb::new(r * v, g * v, b * v))
            }
        };
        Rgb([
            (colour.red * 255.0).round() as u8,
            (colour.green * 255.0).round() as u8,
            (colour.blue * 255.0).round() as u8,
        ])
    }
}

/// Approximate linear RGB of monochromatic light, dimmed towards the ends of the visible range.
///
/// Black outside 380–780 nm.
pub fn wavelength_to_rgb(wavelength_nm: f64) -> (f64, f64, f64) {
    let w = wavelength_nm;
    let (r, g, b) = if (380.0..440.0).contains(&w) {
        ((440.0 - w) / (440.0 - 380.0), 0.0, 1.0)
    } else if (440.0..490.0).contains(&w) {
        (0.0, (w - 440.0) / (490.0 - 440.0), 1.0)
    } else if (490.0..510.0).contains(&w) {
        (0.0, 1.0, (510.0 - w) / (510.0 - 490.0))
    } else if (510.0..580.0).contains(&w) {
        ((w - 510.0) / (580.0 - 510.0), 1.0, 0.0)
    } else if (580.0..645.0).contains(&w) {
        (1.0, (645.0 - w) / (645.0 - 580.0), 0.0)
    } else if (645.0..=780.0).contains(&w) {
        (1.0, 0.0, 0.0)
    } else {
        (0.0, 0.0, 0.0)
    };

    let factor = if (380.0..420.0).contains(&w) {
        0.3 + 0.7 * (w - 380.0) / (420.0 - 380.0)
    } else if w > 645.0 && w <= 780.0 {
        0.3 + 0.7 * (780.0 - w) / (780.0 - 645.0)
    } else {
        1.0
    };

    (r * factor, g * factor, b * factor)
}

// Draws `arr / max` into `img` with its left edge at `x_offset`. Row 0 of the array is the
// bottom row of the image.
fn draw_panel(
    img: &mut RgbImage,
    arr: ArrayView2<f64>,
    x_offset: u32,
    colormap: Colormap,
    wavelength_nm: f64,
) {
    let (h, w) = arr.dim();
    let max = arr.iter().fold(0.0, |max: f64, &v| v.max(max));
    let max = if max > 0.0 { max } else { 1.0 };

    for ((i, j), &v) in arr.indexed_iter() {
        let px = x_offset + j as u32;
        let py = (h - 1 - i) as u32;
        debug_assert!(px < img.width() && py < img.height() && j < w);
        img.put_pixel(px, py, colormap.colour(v / max, wavelength_nm));
    }
}

/// The aperture in grey beside the pattern in `colormap`, each scaled to its own maximum.
pub fn render_panels(
    mask: &ApertureMask,
    pattern: &IntensityPattern,
    colormap: Colormap,
    wavelength_nm: f64,
) -> RgbImage {
    let (h0, w0) = mask.values.dim();
    let (h1, w1) = pattern.values.dim();
    let width = (w0 + w1) as u32 + PANEL_GAP;
    let height = h0.max(h1) as u32;

    let mut img = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    draw_panel(&mut img, mask.values.view(), 0, Colormap::Grey, wavelength_nm);
    draw_panel(
        &mut img,
        pattern.values.view(),
        w0 as u32 + PANEL_GAP,
        colormap,
        wavelength_nm,
    );
    img
}

/// Writes the two-panel figure. The format follows the file extension.
pub fn save_panels<T: AsRef<Path> + std::fmt::Debug>(
    file_name: T,
    mask: &ApertureMask,
    pattern: &IntensityPattern,
    colormap: Colormap,
    wavelength_nm: f64,
) -> Result<()> {
    let (h, w) = pattern.values.dim();
    log::info!(
        "h:{} w:{} max:{} sum:{} - {:?}",
        h,
        w,
        pattern.peak(),
        pattern.values.sum(),
        file_name
    );
    let img = render_panels(mask, pattern, colormap, wavelength_nm);
    if let Some(parent) = file_name.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    img.save(file_name)?;
    Ok(())
}

/// Writes the horizontal and vertical cuts of a pattern as CSV.
///
/// Both cuts share the axis of `horizontal`; the grid is square so the vertical axis is identical.
pub fn write_profiles_csv<T: AsRef<Path>>(
    path: T,
    horizontal: &Profile1D,
    vertical: &Profile1D,
) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);

    writeln!(file, "# Fraunhofer diffraction profiles through the pattern centre")?;
    writeln!(file, "# Version: {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(file, "# axis unit: {}", horizontal.axis.unit.label())?;
    writeln!(file, "index,axis,horizontal,vertical")?;
    for (i, ((&x, &h), &v)) in horizontal
        .axis
        .values
        .iter()
        .zip(horizontal.values.iter())
        .zip(vertical.values.iter())
        .enumerate()
    {
        writeln!(file, "{},{:.6e},{:.6e},{:.6e}", i, x, h, v)?;
    }
    file.flush()?;
    Ok(())
}

/// Writes the aperture's centre row and the magnitude of its 1D spectrum as CSV.
///
/// The two column pairs carry their own axes: position in the aperture plane and spatial
/// frequency.
pub fn write_aperture_csv<T: AsRef<Path>>(
    path: T,
    profile: &Profile1D,
    spectrum: &Profile1D,
) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);

    writeln!(file, "# Aperture centre row and its 1D spectrum magnitude")?;
    writeln!(file, "# Version: {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(
        file,
        "# position unit: {}, frequency unit: {}",
        profile.axis.unit.label(),
        spectrum.axis.unit.label()
    )?;
    writeln!(file, "index,position,transmission,frequency,spectrum")?;
    let rows = profile
        .axis
        .values
        .iter()
        .zip(profile.values.iter())
        .zip(spectrum.axis.values.iter().zip(spectrum.values.iter()));
    for (i, ((&x, &t), (&f, &m))) in rows.enumerate() {
        writeln!(file, "{},{:.6e},{:.6e},{:.6e},{:.6e}", i, x, t, f, m)?;
    }
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        render_panels, save_panels, wavelength_to_rgb, write_aperture_csv, write_profiles_csv,
        Colormap, PANEL_GAP,
    };
    use crate::diffraction::{diffract, IntensityScale};
    use crate::grid::SimulationGrid;
    use crate::mask::{generate, ApertureSpec};
    use crate::profile::{col_profile, row_profile, spectrum_1d, Profile1D};
    use image::Rgb;

    #[test]
    fn colormap_endpoints() {
        for &map in &[Colormap::Grey, Colormap::Hot] {
            assert_eq!(map.colour(0.0, 500.0), Rgb([0, 0, 0]));
            assert_eq!(map.colour(1.0, 500.0), Rgb([255, 255, 255]));
            assert_eq!(map.colour(7.0, 500.0), Rgb([255, 255, 255]));
            assert_eq!(map.colour(-1.0, 500.0), Rgb([0, 0, 0]));
        }
        assert_eq!(Colormap::Hot.colour(1.0 / 3.0, 500.0), Rgb([255, 0, 0]));
        assert_eq!(Colormap::Wavelength.colour(0.0, 650.0), Rgb([0, 0, 0]));
        let red = Colormap::Wavelength.colour(1.0, 700.0);
        assert!(red[0] > 200 && red[1] == 0 && red[2] == 0);
    }

    #[test]
    fn visible_spectrum() {
        assert_eq!(wavelength_to_rgb(300.0), (0.0, 0.0, 0.0));
        assert_eq!(wavelength_to_rgb(900.0), (0.0, 0.0, 0.0));
        assert_eq!(wavelength_to_rgb(530.0).1, 1.0);
        let (r, g, b) = wavelength_to_rgb(460.0);
        assert!(r == 0.0 && g > 0.0 && b == 1.0);
    }

    #[test]
    fn panels_are_side_by_side_and_bottom_up() {
        let n = 32;
        let grid = SimulationGrid::pixels(n);
        let spec = ApertureSpec::Rectangle {
            width: 4.0,
            height: 2.0,
        };
        let mask = generate(&spec, &grid).unwrap();
        let pattern = diffract(&mask, IntensityScale::Log1p).unwrap();
        let img = render_panels(&mask, &pattern, Colormap::Hot, 550.0);

        assert_eq!(img.width(), 2 * n as u32 + PANEL_GAP);
        assert_eq!(img.height(), n as u32);
        // mask row 16 (y = 0) is open and sits at image row 15
        assert_eq!(*img.get_pixel(16, 15), Rgb([255, 255, 255]));
        assert_eq!(*img.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*img.get_pixel(n as u32 + 1, 0), Rgb([255, 255, 255]));
        // pattern peak at (16, 16) is drawn white
        let x = n as u32 + PANEL_GAP + 16;
        assert_eq!(*img.get_pixel(x, 15), Rgb([255, 255, 255]));
    }

    #[test]
    fn exports() {
        let dir = tempfile::tempdir().unwrap();
        let grid = SimulationGrid::pixels(16);
        let mask = generate(&ApertureSpec::Circle { radius: 3.0 }, &grid).unwrap();
        let pattern = diffract(&mask, IntensityScale::Linear).unwrap();

        let png = dir.path().join("figs").join("pattern.png");
        save_panels(&png, &mask, &pattern, Colormap::Wavelength, 532.0).unwrap();
        let read = image::open(&png).unwrap().to_rgb8();
        assert_eq!(read.dimensions(), (32 + PANEL_GAP, 16));

        let axis = grid.frequency_axis();
        let horizontal = Profile1D {
            values: row_profile(pattern.values.view(), None).unwrap(),
            axis: axis.clone(),
        };
        let vertical = Profile1D {
            values: col_profile(pattern.values.view(), None).unwrap(),
            axis,
        };
        let csv = dir.path().join("profiles.csv");
        write_profiles_csv(&csv, &horizontal, &vertical).unwrap();
        let text = std::fs::read_to_string(&csv).unwrap();
        let rows: Vec<&str> = text.lines().filter(|l| !l.starts_with('#')).collect();
        assert_eq!(rows[0], "index,axis,horizontal,vertical");
        assert_eq!(rows.len(), 17);
        assert!(rows[9].starts_with("8,0.000000e0,"));
    }

    #[test]
    fn aperture_cut_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let grid = SimulationGrid::micrometres(16, 2.0);
        let spec = ApertureSpec::SingleSlit {
            width: 8.0,
            height: 20.0,
        };
        let mask = generate(&spec, &grid).unwrap();
        let row = row_profile(mask.values.view(), None).unwrap();
        let spectrum = Profile1D {
            values: spectrum_1d(row.view()),
            axis: grid.frequency_axis(),
        };
        let profile = Profile1D {
            values: row,
            axis: grid.spatial_axis(),
        };

        let csv = dir.path().join("aperture.csv");
        write_aperture_csv(&csv, &profile, &spectrum).unwrap();
        let text = std::fs::read_to_string(&csv).unwrap();
        assert!(text.contains("# position unit: um, frequency unit: 1/mm"));

        let rows: Vec<Vec<f64>> = text
            .lines()
            .filter(|l| !l.starts_with('#'))
            .skip(1)
            .map(|l| l.split(',').map(|v| v.parse::<f64>().unwrap()).collect())
            .collect();
        assert_eq!(rows.len(), 16);
        for (i, cols) in rows.iter().enumerate() {
            assert_eq!(cols.len(), 5);
            assert_eq!(cols[0], i as f64);
            assert!((cols[1] - profile.axis.values[i]).abs() < 1e-9);
            assert_eq!(cols[2], profile.values[i]);
            assert!((cols[3] - spectrum.axis.values[i]).abs() < 1e-6 * spectrum.axis.values[i].abs().max(1.0));
            assert!((cols[4] - spectrum.values[i]).abs() < 1e-5 * spectrum.values[i].max(1.0));
        }
        // 4 open samples: x = -4, -2, 0, 2 µm; DC of the spectrum is their count
        let open: Vec<f64> = rows.iter().filter(|c| c[2] == 1.0).map(|c| c[1]).collect();
        assert_eq!(open, vec![-4.0, -2.0, 0.0, 2.0]);
        assert!((rows[8][4] - 4.0).abs() < 1e-9);
    }
}
