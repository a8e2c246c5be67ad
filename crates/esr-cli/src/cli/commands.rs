use super::{CliError, LoadArgs};
use anyhow::Context;
use esr_core::domain::CollectingSink;
use esr_core::ingest::{AxisOverride, load, load_any};
use esr_core::spectrum::{BaselineMethod, SmoothingMethod};
use esr_core::{EsrSpectrum, LoadOutcome, physics};
use std::fs;
use std::path::PathBuf;

#[derive(clap::Args)]
pub(super) struct InfoArgs {
    #[command(flatten)]
    load: LoadArgs,

    /// Emit metadata as JSON instead of key-value lines
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
pub(super) struct ProcessArgs {
    #[command(flatten)]
    load: LoadArgs,

    /// Baseline method: poly or spline
    #[arg(long)]
    baseline: Option<String>,

    /// Polynomial order for the poly baseline
    #[arg(long, default_value_t = 2)]
    baseline_order: usize,

    /// Explicit interior knots (tesla) for the spline baseline
    #[arg(long, value_delimiter = ',')]
    knots: Option<Vec<f64>>,

    /// Savitzky-Golay window (positive odd integer); enables smoothing
    #[arg(long)]
    smooth_window: Option<usize>,

    /// Savitzky-Golay polynomial order
    #[arg(long, default_value_t = 2)]
    smooth_polyorder: usize,

    /// Smoothing method (currently savgol)
    #[arg(long, default_value = "savgol")]
    smooth_method: String,

    /// Apply a fixed phase rotation in degrees
    #[arg(long)]
    phase_deg: Option<f64>,

    /// Search the angle grid for the residual phase and correct it
    #[arg(long)]
    phase_auto: bool,

    /// Integrate the derivative into the absorption spectrum
    #[arg(long)]
    integrate: bool,

    /// Report the absorption area (implies integration)
    #[arg(long)]
    area: bool,

    /// Restrict the area to a field window in tesla: BMIN BMAX
    #[arg(long, num_args = 2, value_names = ["BMIN", "BMAX"])]
    roi: Option<Vec<f64>>,

    /// Write the processed columns as CSV
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct ReportArgs {
    #[command(flatten)]
    load: LoadArgs,

    /// Remove a polynomial baseline of this order first
    #[arg(long)]
    baseline_order: Option<usize>,

    /// Auto-correct the phase before measuring the line
    #[arg(long)]
    phase_auto: bool,

    /// Resonance frequency in GHz, overriding the file header
    #[arg(long)]
    frequency_ghz: Option<f64>,

    /// Restrict the area to a field window in tesla: BMIN BMAX
    #[arg(long, num_args = 2, value_names = ["BMIN", "BMAX"])]
    roi: Option<Vec<f64>>,
}

/// Load the spectrum or print the candidate columns and signal retry.
fn load_spectrum(
    args: &LoadArgs,
    sink: &mut CollectingSink,
) -> Result<Option<EsrSpectrum>, CliError> {
    let outcome = match (&args.x_column, &args.y_column) {
        (Some(x), Some(y)) => {
            let overrides = AxisOverride {
                field: x.clone(),
                signal: y.clone(),
            };
            load(&args.path, Some(&overrides), sink)?
        }
        _ => load_any(&args.path, sink)?,
    };
    match outcome {
        LoadOutcome::Spectrum(spectrum) => {
            tracing::debug!(
                path = %args.path.display(),
                points = spectrum.len(),
                "loaded spectrum"
            );
            Ok(Some(spectrum))
        }
        LoadOutcome::AxisSelectionNeeded { candidates } => {
            eprintln!("Ambiguous axis columns; re-run with --x and --y. Candidates:");
            for candidate in &candidates {
                eprintln!("  {candidate}");
            }
            Ok(None)
        }
    }
}

pub(super) fn run_info(args: InfoArgs) -> Result<i32, CliError> {
    let mut sink = CollectingSink::new();
    let Some(spectrum) = load_spectrum(&args.load, &mut sink)? else {
        return Ok(1);
    };

    let field = spectrum.field_b();
    if args.json {
        let value = serde_json::json!({
            "points": spectrum.len(),
            "field_min_T": field[0].min(field[field.len() - 1]),
            "field_max_T": field[0].max(field[field.len() - 1]),
            "meta": spectrum.meta(),
            "diagnostics": sink.events().iter().map(|e| e.to_string()).collect::<Vec<_>>(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&value).context("serialize info")?
        );
    } else {
        println!("points: {}", spectrum.len());
        println!(
            "field range: {:.6} .. {:.6} T",
            field[0].min(field[field.len() - 1]),
            field[0].max(field[field.len() - 1])
        );
        if let Some(frequency) = spectrum.meta().frequency_hz {
            println!("frequency: {:.6} GHz", frequency / 1.0e9);
        }
        if let Some(temperature) = spectrum.meta().temperature_k {
            println!("temperature: {temperature} K");
        }
        for event in sink.events() {
            println!("note: {event}");
        }
    }
    Ok(0)
}

pub(super) fn run_process(args: ProcessArgs) -> Result<i32, CliError> {
    let mut sink = CollectingSink::new();
    let Some(mut spectrum) = load_spectrum(&args.load, &mut sink)? else {
        return Ok(1);
    };

    if let Some(name) = &args.baseline {
        let method = match BaselineMethod::parse(name)? {
            BaselineMethod::Poly { .. } => BaselineMethod::Poly {
                order: args.baseline_order,
            },
            BaselineMethod::Spline { .. } => BaselineMethod::Spline {
                knots: args.knots.clone(),
                smoothing: None,
            },
        };
        spectrum.baseline(&method)?;
    }

    if let Some(window) = args.smooth_window {
        let method = SmoothingMethod::parse(&args.smooth_method)?;
        spectrum.smooth(method, window, args.smooth_polyorder)?;
    }

    if let Some(degrees) = args.phase_deg {
        spectrum.phase_correct(degrees.to_radians())?;
    }
    if args.phase_auto {
        spectrum.phase_auto()?;
        if let Some(phase) = spectrum.meta().phase_rad {
            println!("phase: {:.3} deg", phase.to_degrees());
        }
    }

    if args.integrate || args.area || args.output.is_some() {
        spectrum.to_absorption()?;
    }
    if args.area {
        let roi = args.roi.as_ref().map(|r| (r[0], r[1]));
        let area = spectrum.to_area(roi)?;
        println!("area: {area:.6e}");
    }

    if let Some(path) = &args.output {
        write_csv(path, &spectrum)?;
        println!("wrote {}", path.display());
    }
    Ok(0)
}

pub(super) fn run_report(args: ReportArgs) -> Result<i32, CliError> {
    let mut sink = CollectingSink::new();
    let Some(mut spectrum) = load_spectrum(&args.load, &mut sink)? else {
        return Ok(1);
    };

    if let Some(order) = args.baseline_order {
        spectrum.baseline(&BaselineMethod::Poly { order })?;
    }
    if args.phase_auto {
        spectrum.phase_auto()?;
    }

    let (b_low, b_high) = derivative_extrema(&spectrum);
    let delta_bpp = b_high - b_low;
    let b0 = 0.5 * (b_low + b_high);
    let fwhm_lorentz = physics::fwhm_from_pp_lorentz(delta_bpp);
    let fwhm_gauss = physics::fwhm_from_pp_gauss(delta_bpp);

    let frequency_hz = args
        .frequency_ghz
        .map(|ghz| ghz * 1.0e9)
        .or(spectrum.meta().frequency_hz);
    let g = match frequency_hz {
        Some(frequency) => Some(physics::g_factor(frequency, b0)?),
        None => None,
    };
    let t2 = match g {
        Some(g) => Some(physics::t2_from_fwhm_lorentz(fwhm_lorentz, g)?),
        None => None,
    };

    let roi = args.roi.as_ref().map(|r| (r[0], r[1]));
    let area = spectrum.to_area(roi)?;

    let report = serde_json::json!({
        "points": spectrum.len(),
        "B0_T": b0,
        "delta_Bpp_T": delta_bpp,
        "fwhm_lorentz_T": fwhm_lorentz,
        "fwhm_gauss_T": fwhm_gauss,
        "g_factor": g,
        "T2_s": t2,
        "area": area,
        "phase_rad": spectrum.meta().phase_rad,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("serialize report")?
    );
    Ok(0)
}

/// Field positions of the derivative maximum and minimum, low field first.
fn derivative_extrema(spectrum: &EsrSpectrum) -> (f64, f64) {
    let signal = spectrum.signal_dabs();
    let mut max_at = 0usize;
    let mut min_at = 0usize;
    for (index, &value) in signal.iter().enumerate() {
        if value > signal[max_at] {
            max_at = index;
        }
        if value < signal[min_at] {
            min_at = index;
        }
    }
    let field = spectrum.field_b();
    let a = field[max_at];
    let b = field[min_at];
    (a.min(b), a.max(b))
}

fn write_csv(path: &PathBuf, spectrum: &EsrSpectrum) -> Result<(), CliError> {
    let mut out = String::from("field_T,signal");
    let absorption = spectrum.absorption();
    if absorption.is_some() {
        out.push_str(",absorption");
    }
    out.push('\n');
    for index in 0..spectrum.len() {
        out.push_str(&format!(
            "{:.9e},{:.9e}",
            spectrum.field_b()[index],
            spectrum.signal_dabs()[index]
        ));
        if let Some(absorption) = absorption {
            out.push_str(&format!(",{:.9e}", absorption[index]));
        }
        out.push('\n');
    }
    fs::write(path, out)
        .with_context(|| format!("write output to {}", path.display()))?;
    Ok(())
}
