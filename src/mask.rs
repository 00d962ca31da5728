//! Aperture masks: transmittance in [0, 1] sampled on a [`SimulationGrid`].

use crate::error::{check_length, invalid, Error, Result};
use crate::grid::SimulationGrid;
use ndarray::{Array2, Zip};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Aperture geometry. All lengths are in the unit of the grid it is sampled on.
///
/// Box-like shapes use half-open bounds, `-w/2 <= x < w/2`, so an integer width covers exactly
/// that many pixels. Round shapes use closed bounds.
///
/// On even grids the sample coordinates run from `-N/2` to `N/2 - 1`, so boxes are point
/// symmetric about the pixel corner at `-pitch/2` and round shapes about the centre pixel. On odd
/// grids the samples are symmetric about the centre pixel, round shapes stay symmetric about it,
/// and boxes keep their corner symmetry, which now leaves the last row and column outside.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApertureSpec {
    Circle {
        radius: f64,
    },
    Square {
        side: f64,
    },
    Rectangle {
        width: f64,
        height: f64,
    },
    SingleSlit {
        width: f64,
        height: f64,
    },
    /// Two slits centred at `x = ±separation/2`.
    DoubleSlit {
        width: f64,
        height: f64,
        separation: f64,
    },
    /// A `width × height/5` bar crossed with a `width/5 × height` bar.
    Cross {
        width: f64,
        height: f64,
    },
    /// Isosceles triangle, base along the bottom and apex at the top.
    Triangle {
        base: f64,
        height: f64,
    },
    Annulus {
        inner_radius: f64,
        outer_radius: f64,
    },
    /// An "L" built from two bars a fifth as thick as the bounding box.
    Custom {
        width: f64,
        height: f64,
    },
    /// Major axis along x, minor axis `diameter * sqrt(1 - e²)` along y.
    Ellipse {
        diameter: f64,
        eccentricity: f64,
    },
    /// 3×3 lattice of circles.
    CircleArray {
        diameter: f64,
        spacing: f64,
    },
    /// [`CircleArray`](ApertureSpec::CircleArray) with each centre moved by a uniform random
    /// offset of up to `disorder * 0.075 * spacing` per axis. The same seed gives the same mask.
    DisorderedArray {
        diameter: f64,
        spacing: f64,
        disorder: f64,
        #[serde(default)]
        seed: u64,
    },
    /// A circle on the left and a square on the right, centres `±1.2 * (diameter + side) / 2`
    /// apart from the origin.
    CircleSquare {
        diameter: f64,
        side: f64,
    },
    /// A `width × height` rectangle centred at `y = separation/2` above an annulus centred at
    /// `y = -separation/2`.
    RectangleAnnulus {
        width: f64,
        height: f64,
        inner_radius: f64,
        outer_radius: f64,
        separation: f64,
    },
    /// Stick figure of overall size `height`: a `0.3h × 0.6h` body with a head of radius `0.1h`
    /// centred on its top edge, the pair tilted counter-clockwise by `tilt` degrees.
    WavingGirl {
        height: f64,
        #[serde(default)]
        tilt: f64,
    },
}

impl ApertureSpec {
    pub fn kind(&self) -> ShapeKind {
        match self {
            ApertureSpec::Circle { .. } => ShapeKind::Circle,
            ApertureSpec::Square { .. } => ShapeKind::Square,
            ApertureSpec::Rectangle { .. } => ShapeKind::Rectangle,
            ApertureSpec::SingleSlit { .. } => ShapeKind::SingleSlit,
            ApertureSpec::DoubleSlit { .. } => ShapeKind::DoubleSlit,
            ApertureSpec::Cross { .. } => ShapeKind::Cross,
            ApertureSpec::Triangle { .. } => ShapeKind::Triangle,
            ApertureSpec::Annulus { .. } => ShapeKind::Annulus,
            ApertureSpec::Custom { .. } => ShapeKind::Custom,
            ApertureSpec::Ellipse { .. } => ShapeKind::Ellipse,
            ApertureSpec::CircleArray { .. } => ShapeKind::CircleArray,
            ApertureSpec::DisorderedArray { .. } => ShapeKind::DisorderedArray,
            ApertureSpec::CircleSquare { .. } => ShapeKind::CircleSquare,
            ApertureSpec::RectangleAnnulus { .. } => ShapeKind::RectangleAnnulus,
            ApertureSpec::WavingGirl { .. } => ShapeKind::WavingGirl,
        }
    }

    /// Negative or non-finite lengths are rejected for every shape.
    pub fn validate(&self) -> Result<()> {
        match *self {
            ApertureSpec::Circle { radius } => check_length("radius", radius),
            ApertureSpec::Square { side } => check_length("side", side),
            ApertureSpec::Rectangle { width, height }
            | ApertureSpec::SingleSlit { width, height }
            | ApertureSpec::Cross { width, height }
            | ApertureSpec::Custom { width, height } => {
                check_length("width", width)?;
                check_length("height", height)
            }
            ApertureSpec::DoubleSlit {
                width,
                height,
                separation,
            } => {
                check_length("width", width)?;
                check_length("height", height)?;
                check_length("separation", separation)
            }
            ApertureSpec::Triangle { base, height } => {
                check_length("base", base)?;
                check_length("height", height)
            }
            ApertureSpec::Annulus {
                inner_radius,
                outer_radius,
            } => check_ring(inner_radius, outer_radius),
            ApertureSpec::Ellipse {
                diameter,
                eccentricity,
            } => {
                check_length("diameter", diameter)?;
                if !(0.0..1.0).contains(&eccentricity) {
                    return invalid(format!(
                        "eccentricity must lie in [0, 1), got {}",
                        eccentricity
                    ));
                }
                Ok(())
            }
            ApertureSpec::CircleArray { diameter, spacing } => {
                check_length("diameter", diameter)?;
                check_length("spacing", spacing)
            }
            ApertureSpec::DisorderedArray {
                diameter,
                spacing,
                disorder,
                ..
            } => {
                check_length("diameter", diameter)?;
                check_length("spacing", spacing)?;
                check_length("disorder", disorder)
            }
            ApertureSpec::CircleSquare { diameter, side } => {
                check_length("diameter", diameter)?;
                check_length("side", side)
            }
            ApertureSpec::RectangleAnnulus {
                width,
                height,
                inner_radius,
                outer_radius,
                separation,
            } => {
                check_length("width", width)?;
                check_length("height", height)?;
                check_length("separation", separation)?;
                check_ring(inner_radius, outer_radius)
            }
            ApertureSpec::WavingGirl { height, tilt } => {
                check_length("height", height)?;
                if !tilt.is_finite() {
                    return invalid(format!("tilt must be finite, got {}", tilt));
                }
                Ok(())
            }
        }
    }

    /// Centres of the circles of a lattice shape, empty for every other shape.
    pub fn lattice_centres(&self) -> Vec<(f64, f64)> {
        let (spacing, jitter, seed) = match *self {
            ApertureSpec::CircleArray { spacing, .. } => (spacing, 0.0, 0),
            ApertureSpec::DisorderedArray {
                spacing,
                disorder,
                seed,
                ..
            } => (spacing, disorder * 0.075 * spacing, seed),
            _ => return Vec::new(),
        };

        let mut rng = StdRng::seed_from_u64(seed);
        let mut centres = Vec::with_capacity(9);
        for i in -1..=1 {
            for j in -1..=1 {
                let mut centre = (i as f64 * spacing, j as f64 * spacing);
                if jitter > 0.0 {
                    centre.0 += rng.gen_range(-jitter..=jitter);
                    centre.1 += rng.gen_range(-jitter..=jitter);
                }
                centres.push(centre);
            }
        }
        centres
    }

    /// Whether the centred point `(x, y)` transmits.
    ///
    /// Lattice shapes rebuild their centres on every call; rasterising goes through
    /// [`lattice_centres`](ApertureSpec::lattice_centres) once instead.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.contains_with(&self.lattice_centres(), x, y)
    }

    fn contains_with(&self, centres: &[(f64, f64)], x: f64, y: f64) -> bool {
        match *self {
            ApertureSpec::Circle { radius } => in_circle(x, y, radius),
            ApertureSpec::Square { side } => in_box(x, y, side, side),
            ApertureSpec::Rectangle { width, height }
            | ApertureSpec::SingleSlit { width, height } => in_box(x, y, width, height),
            ApertureSpec::DoubleSlit {
                width,
                height,
                separation,
            } => {
                in_box(x + 0.5 * separation, y, width, height)
                    || in_box(x - 0.5 * separation, y, width, height)
            }
            ApertureSpec::Cross { width, height } => {
                in_box(x, y, width, height / 5.0) || in_box(x, y, width / 5.0, height)
            }
            ApertureSpec::Triangle { base, height } => {
                if base == 0.0 || height == 0.0 {
                    return false;
                }
                in_triangle(
                    (x, y),
                    [
                        (-0.5 * base, -0.5 * height),
                        (0.5 * base, -0.5 * height),
                        (0.0, 0.5 * height),
                    ],
                )
            }
            ApertureSpec::Annulus {
                inner_radius,
                outer_radius,
            } => in_ring(x, y, inner_radius, outer_radius),
            ApertureSpec::Custom { width, height } => {
                let left = -0.5 * width;
                let bottom = -0.5 * height;
                let upright = left <= x && x < left + width / 5.0 && bottom <= y && y < -bottom;
                let foot = left <= x && x < -left && bottom <= y && y < bottom + height / 5.0;
                upright || foot
            }
            ApertureSpec::Ellipse {
                diameter,
                eccentricity,
            } => {
                let a = 0.5 * diameter;
                let b = a * (1.0 - eccentricity * eccentricity).sqrt();
                if a == 0.0 || b == 0.0 {
                    return false;
                }
                (x / a).powi(2) + (y / b).powi(2) <= 1.0
            }
            ApertureSpec::CircleArray { diameter, .. }
            | ApertureSpec::DisorderedArray { diameter, .. } => {
                let radius = 0.5 * diameter;
                centres
                    .iter()
                    .any(|&(cx, cy)| in_circle(x - cx, y - cy, radius))
            }
            ApertureSpec::CircleSquare { diameter, side } => {
                let offset = 0.6 * (diameter + side);
                in_circle(x + offset, y, 0.5 * diameter) || in_box(x - offset, y, side, side)
            }
            ApertureSpec::RectangleAnnulus {
                width,
                height,
                inner_radius,
                outer_radius,
                separation,
            } => {
                let half = 0.5 * separation;
                in_box(x, y - half, width, height) || in_ring(x, y + half, inner_radius, outer_radius)
            }
            ApertureSpec::WavingGirl { height, tilt } => {
                let (sin, cos) = exact_sin_cos(tilt);
                let xr = x * cos + y * sin;
                let yr = y * cos - x * sin;
                let body_h = 0.6 * height;
                in_box(xr, yr, 0.3 * height, body_h) || in_circle(xr, yr - 0.5 * body_h, 0.1 * height)
            }
        }
    }
}

fn check_ring(inner_radius: f64, outer_radius: f64) -> Result<()> {
    check_length("inner_radius", inner_radius)?;
    check_length("outer_radius", outer_radius)?;
    if inner_radius > outer_radius {
        return invalid(format!(
            "inner_radius {} exceeds outer_radius {}",
            inner_radius, outer_radius
        ));
    }
    Ok(())
}

fn in_ring(x: f64, y: f64, inner_radius: f64, outer_radius: f64) -> bool {
    let r2 = x * x + y * y;
    inner_radius * inner_radius <= r2 && r2 <= outer_radius * outer_radius
}

fn in_circle(x: f64, y: f64, radius: f64) -> bool {
    x * x + y * y <= radius * radius
}

fn in_box(x: f64, y: f64, width: f64, height: f64) -> bool {
    -0.5 * width <= x && x < 0.5 * width && -0.5 * height <= y && y < 0.5 * height
}

// Same-side test against each edge; points on an edge are inside.
fn in_triangle(p: (f64, f64), v: [(f64, f64); 3]) -> bool {
    let edge = |a: (f64, f64), b: (f64, f64)| (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0);
    let d = [edge(v[0], v[1]), edge(v[1], v[2]), edge(v[2], v[0])];
    let has_neg = d.iter().any(|&d| d < 0.0);
    let has_pos = d.iter().any(|&d| d > 0.0);
    !(has_neg && has_pos)
}

/// The bare shape tag, as selected from a menu or flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeKind {
    Circle,
    Square,
    Rectangle,
    SingleSlit,
    DoubleSlit,
    Cross,
    Triangle,
    Annulus,
    Custom,
    Ellipse,
    CircleArray,
    DisorderedArray,
    CircleSquare,
    RectangleAnnulus,
    WavingGirl,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 15] = [
        ShapeKind::Circle,
        ShapeKind::Square,
        ShapeKind::Rectangle,
        ShapeKind::SingleSlit,
        ShapeKind::DoubleSlit,
        ShapeKind::Cross,
        ShapeKind::Triangle,
        ShapeKind::Annulus,
        ShapeKind::Custom,
        ShapeKind::Ellipse,
        ShapeKind::CircleArray,
        ShapeKind::DisorderedArray,
        ShapeKind::CircleSquare,
        ShapeKind::RectangleAnnulus,
        ShapeKind::WavingGirl,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Circle => "circle",
            ShapeKind::Square => "square",
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::SingleSlit => "single_slit",
            ShapeKind::DoubleSlit => "double_slit",
            ShapeKind::Cross => "cross",
            ShapeKind::Triangle => "triangle",
            ShapeKind::Annulus => "annulus",
            ShapeKind::Custom => "custom",
            ShapeKind::Ellipse => "ellipse",
            ShapeKind::CircleArray => "circle_array",
            ShapeKind::DisorderedArray => "disordered_array",
            ShapeKind::CircleSquare => "circle_square",
            ShapeKind::RectangleAnnulus => "rectangle_annulus",
            ShapeKind::WavingGirl => "waving_girl",
        }
    }

    /// Default parameters in pixels, sized for a 256 grid.
    pub fn default_spec(self) -> ApertureSpec {
        match self {
            ShapeKind::Circle => ApertureSpec::Circle { radius: 20.0 },
            ShapeKind::Square => ApertureSpec::Square { side: 40.0 },
            ShapeKind::Rectangle => ApertureSpec::Rectangle {
                width: 60.0,
                height: 30.0,
            },
            ShapeKind::SingleSlit => ApertureSpec::SingleSlit {
                width: 10.0,
                height: 80.0,
            },
            ShapeKind::DoubleSlit => ApertureSpec::DoubleSlit {
                width: 8.0,
                height: 80.0,
                separation: 30.0,
            },
            ShapeKind::Cross => ApertureSpec::Cross {
                width: 100.0,
                height: 100.0,
            },
            ShapeKind::Triangle => ApertureSpec::Triangle {
                base: 100.0,
                height: 100.0,
            },
            ShapeKind::Annulus => ApertureSpec::Annulus {
                inner_radius: 25.0,
                outer_radius: 50.0,
            },
            ShapeKind::Custom => ApertureSpec::Custom {
                width: 100.0,
                height: 100.0,
            },
            ShapeKind::Ellipse => ApertureSpec::Ellipse {
                diameter: 100.0,
                eccentricity: 0.5,
            },
            ShapeKind::CircleArray => ApertureSpec::CircleArray {
                diameter: 5.0,
                spacing: 25.0,
            },
            ShapeKind::DisorderedArray => ApertureSpec::DisorderedArray {
                diameter: 5.0,
                spacing: 25.0,
                disorder: 1.0,
                seed: 0,
            },
            ShapeKind::CircleSquare => ApertureSpec::CircleSquare {
                diameter: 30.0,
                side: 30.0,
            },
            ShapeKind::RectangleAnnulus => ApertureSpec::RectangleAnnulus {
                width: 20.0,
                height: 30.0,
                inner_radius: 10.0,
                outer_radius: 20.0,
                separation: 60.0,
            },
            ShapeKind::WavingGirl => ApertureSpec::WavingGirl {
                height: 100.0,
                tilt: 15.0,
            },
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShapeKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let tag = s.trim().to_ascii_lowercase().replace(|c: char| c == '-' || c == ' ', "_");
        ShapeKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == tag)
            .ok_or_else(|| Error::InvalidParameter(format!("unrecognised aperture type '{}'", s)))
    }
}

/// A sampled aperture. Values lie in [0, 1]; they are exactly 0 or 1 unless the grid supersamples.
#[derive(Clone, Debug)]
pub struct ApertureMask {
    pub values: Array2<f64>,
    pub grid: SimulationGrid,
}

impl ApertureMask {
    /// Sum of the transmittance over all pixels.
    pub fn transmission(&self) -> f64 {
        self.values.sum()
    }

    /// Transmitting area in the grid's unit squared.
    pub fn open_area(&self) -> f64 {
        self.transmission() * self.grid.pitch * self.grid.pitch
    }

    pub fn is_binary(&self) -> bool {
        self.values.iter().all(|&v| v == 0.0 || v == 1.0)
    }
}

/// Samples `spec` on `grid` with no rotation.
pub fn generate(spec: &ApertureSpec, grid: &SimulationGrid) -> Result<ApertureMask> {
    generate_rotated(spec, grid, 0.0)
}

/// Samples `spec` rotated counter-clockwise by `rotation_deg` about the grid centre.
///
/// Rotation is applied to the sample coordinates, so masks stay binary at any angle.
pub fn generate_rotated(
    spec: &ApertureSpec,
    grid: &SimulationGrid,
    rotation_deg: f64,
) -> Result<ApertureMask> {
    grid.validate()?;
    spec.validate()?;
    if !rotation_deg.is_finite() {
        return invalid(format!("rotation must be finite, got {}", rotation_deg));
    }

    let shape = grid.resolution;
    let pitch = grid.pitch;
    let c = grid.center() as f64;
    let (sin, cos) = exact_sin_cos(rotation_deg);

    let k = grid.supersample;
    let offsets: Vec<f64> = (0..k)
        .map(|s| ((s as f64 + 0.5) / k as f64 - 0.5) * pitch)
        .collect();
    let samples = k * k;
    let centres = spec.lattice_centres();
    if shape % 2 == 1 {
        log::debug!(
            "odd resolution {}: box edges stay symmetric about x = -pitch/2, not the centre pixel",
            shape
        );
    }

    let mut values = Array2::zeros([shape, shape]);

    Zip::indexed(&mut values).par_for_each(|(y, x), e| {
        let y0 = (y as f64 - c) * pitch;
        let x0 = (x as f64 - c) * pitch;

        let mut hits = 0;
        for &dy in &offsets {
            for &dx in &offsets {
                let (px, py) = (x0 + dx, y0 + dy);
                // undo the shape rotation on the sample point
                let xr = px * cos + py * sin;
                let yr = py * cos - px * sin;
                if spec.contains_with(&centres, xr, yr) {
                    hits += 1;
                }
            }
        }
        *e = if hits == samples {
            1.0
        } else {
            hits as f64 / samples as f64
        };
    });

    let mask = ApertureMask {
        values,
        grid: *grid,
    };
    log::debug!(
        "{} mask: {}x{} rotation:{} transmission:{}",
        spec.kind(),
        shape,
        shape,
        rotation_deg,
        mask.transmission()
    );
    Ok(mask)
}

// Quarter turns get exact values so axis-aligned results stay exact.
fn exact_sin_cos(deg: f64) -> (f64, f64) {
    let turns = deg.rem_euclid(360.0);
    if turns == 0.0 {
        (0.0, 1.0)
    } else if turns == 90.0 {
        (1.0, 0.0)
    } else if turns == 180.0 {
        (0.0, -1.0)
    } else if turns == 270.0 {
        (-1.0, 0.0)
    } else {
        deg.to_radians().sin_cos()
    }
}
