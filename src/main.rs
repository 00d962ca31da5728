//! Fraunhofer diffraction command-line interface.
//!
//! ```sh
//! fraunhofer                                  # default circle -> diffraction.png
//! fraunhofer run job.toml
//! fraunhofer run --shape double-slit -n 512 --profiles cuts.csv --aperture-profile slit.csv
//! fraunhofer validate job.toml
//! fraunhofer shapes
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use fraunhofer::config::{self, JobConfig};
use fraunhofer::grid::LengthUnit;
use fraunhofer::mask::ShapeKind;
use fraunhofer::{render, simulate};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fraunhofer")]
#[command(about = "Far-field diffraction patterns of 2D apertures")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a pattern and write the figure.
    Run {
        /// Path to a TOML job file. Defaults are used when omitted.
        config: Option<PathBuf>,
        /// Aperture type with its default dimensions (overrides the job file).
        #[arg(long)]
        shape: Option<String>,
        /// Grid resolution N.
        #[arg(short = 'n', long)]
        resolution: Option<usize>,
        /// Aperture rotation in degrees.
        #[arg(long)]
        rotation: Option<f64>,
        /// Image path.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// CSV path for the centre cuts.
        #[arg(long)]
        profiles: Option<PathBuf>,
        /// CSV path for the aperture's centre row and its 1D spectrum.
        #[arg(long)]
        aperture_profile: Option<PathBuf>,
        /// Plot |F|² rather than ln(1 + |F|²).
        #[arg(long)]
        linear: bool,
        /// Scale the pattern to a peak of 1.
        #[arg(long)]
        normalise: bool,
    },
    /// Validate a job file without running it.
    Validate {
        /// Path to the job configuration file.
        config: PathBuf,
    },
    /// List the available aperture types.
    Shapes,
}

struct Overrides {
    shape: Option<String>,
    resolution: Option<usize>,
    rotation: Option<f64>,
    output: Option<PathBuf>,
    profiles: Option<PathBuf>,
    aperture_profile: Option<PathBuf>,
    linear: bool,
    normalise: bool,
}

fn apply_overrides(job: &mut JobConfig, o: Overrides) -> anyhow::Result<()> {
    if let Some(shape) = o.shape {
        let kind: ShapeKind = shape.parse()?;
        job.aperture.shape = kind.default_spec();
    }
    if let Some(n) = o.resolution {
        job.grid.resolution = n;
    }
    if let Some(rotation) = o.rotation {
        job.aperture.rotation = rotation;
    }
    if let Some(output) = o.output {
        job.output.image = output;
    }
    if o.profiles.is_some() {
        job.output.profiles = o.profiles;
    }
    if o.aperture_profile.is_some() {
        job.output.aperture_profile = o.aperture_profile;
    }
    if o.linear {
        job.display.log_scale = false;
    }
    if o.normalise {
        job.display.normalise = true;
    }
    Ok(())
}

fn run(job: &JobConfig) -> anyhow::Result<()> {
    let params = job.to_params().context("invalid simulation parameters")?;
    println!(
        "Aperture: {} (rotation {}°), grid {}x{}",
        params.aperture.kind(),
        params.rotation_deg,
        params.grid.resolution,
        params.grid.resolution
    );

    let sim = simulate(&params).context("simulation failed")?;
    println!(
        "Transmission: {} px, peak intensity: {:.4e}",
        sim.mask.transmission(),
        sim.pattern.peak()
    );
    if params.grid.unit == LengthUnit::Micrometre {
        println!("Open area: {:.1} um^2", sim.mask.open_area());
    }

    render::save_panels(
        &job.output.image,
        &sim.mask,
        &sim.pattern,
        job.display.colormap,
        sim.wavelength_nm,
    )
    .with_context(|| format!("writing {}", job.output.image.display()))?;
    println!("Image: {}", job.output.image.display());

    if let Some(path) = &job.output.profiles {
        render::write_profiles_csv(path, &sim.horizontal, &sim.vertical)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Profiles: {}", path.display());
    }
    if let Some(path) = &job.output.aperture_profile {
        render::write_aperture_csv(path, &sim.aperture_profile, &sim.aperture_spectrum)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Aperture profile: {}", path.display());
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        None => run(&JobConfig::default()),
        Some(Commands::Run {
            config,
            shape,
            resolution,
            rotation,
            output,
            profiles,
            aperture_profile,
            linear,
            normalise,
        }) => {
            let mut job = match &config {
                Some(path) => config::load_config(path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => JobConfig::default(),
            };
            apply_overrides(
                &mut job,
                Overrides {
                    shape,
                    resolution,
                    rotation,
                    output,
                    profiles,
                    aperture_profile,
                    linear,
                    normalise,
                },
            )?;
            run(&job)
        }
        Some(Commands::Validate { config }) => {
            let job = config::load_config(&config)
                .with_context(|| format!("loading {}", config.display()))?;
            job.to_params()?;
            println!("Configuration is valid: {}", config.display());
            Ok(())
        }
        Some(Commands::Shapes) => {
            println!("Available apertures:");
            println!();
            for kind in ShapeKind::ALL.iter() {
                println!("  {:<14} {:?}", kind.name(), kind.default_spec());
            }
            Ok(())
        }
    }
}
