use super::CliError;
use anyhow::Context;
use cthyb_core::domain::SolverError;
use cthyb_core::gf::serialization::{ImFreqGfModel, ImTimeGfModel, StructureModel};
use cthyb_core::post::{
    TailFitOptions, dyson_greens_function, dyson_self_energy, fit_tail, fourier_to_matsubara,
};
use cthyb_core::solver::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(clap::Args)]
pub(super) struct PostProcessArgs {
    /// Case file carrying the block structure, bare G0(iw) and measured G(tau)
    #[arg(value_name = "CASE")]
    input: PathBuf,

    /// Result file receiving G(iw) and Sigma(iw)
    #[arg(long, default_value = "post-processed.json")]
    output: PathBuf,

    /// Fit and replace the high-frequency tail of Sigma(iw)
    #[arg(long)]
    tail_fit: bool,

    /// Highest moment order included in the tail fit
    #[arg(long, default_value_t = 3)]
    fit_max_moment: usize,

    /// First mesh index of the fit window
    #[arg(long)]
    fit_min_n: Option<usize>,

    /// One past the last mesh index of the fit window
    #[arg(long)]
    fit_max_n: Option<usize>,

    /// Lower fit window bound as a positive Matsubara frequency
    #[arg(long)]
    fit_min_w: Option<f64>,

    /// Upper fit window bound as a positive Matsubara frequency
    #[arg(long)]
    fit_max_w: Option<f64>,
}

/// On-disk input of one post-processing run.
#[derive(Debug, Deserialize)]
struct CaseModel {
    structure: StructureModel,
    g0_iw: ImFreqGfModel,
    g_tau: ImTimeGfModel,
}

#[derive(Debug, Serialize)]
struct ResultModel {
    g_iw: ImFreqGfModel,
    sigma_iw: ImFreqGfModel,
}

pub(super) fn run_post_process_command(args: PostProcessArgs) -> Result<i32, CliError> {
    let content = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read case file '{}'", args.input.display()))?;
    let case: CaseModel = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse case file '{}'", args.input.display()))?;

    if (case.g0_iw.beta - case.g_tau.beta).abs() > f64::EPSILON * case.g0_iw.beta.abs() {
        return Err(SolverError::configuration(
            "CONFIG.CASE_BETA",
            format!(
                "G0(iw) and G(tau) disagree on beta: {} vs {}",
                case.g0_iw.beta, case.g_tau.beta
            ),
        )
        .into());
    }

    let structure = case.structure.to_structure()?;
    let g0_iw = case.g0_iw.to_gf(&structure)?;
    let g_tau = case.g_tau.to_gf(&structure)?;

    tracing::info!(
        case = %args.input.display(),
        beta = g0_iw.mesh().beta(),
        n_iw = g0_iw.mesh().len(),
        n_tau = g_tau.mesh().len(),
        "post-processing measured G(tau)"
    );

    let mut g_iw = fourier_to_matsubara(&g_tau, g0_iw.mesh().len())?;
    let mut sigma_iw = dyson_self_energy(&g0_iw, &g_iw)?;

    if args.tail_fit {
        let options = TailFitOptions {
            max_moment: args.fit_max_moment,
            known_moments: None,
            fit_min_n: args.fit_min_n,
            fit_max_n: args.fit_max_n,
            fit_min_w: args.fit_min_w,
            fit_max_w: args.fit_max_w,
        };
        let outcome = fit_tail(&mut sigma_iw, &options)?;
        if outcome.used_default_window {
            println!("{}", Diagnostic::DefaultTailFitWindow.banner());
        }
        g_iw = dyson_greens_function(&g0_iw, &sigma_iw)?;
    }

    let result = ResultModel {
        g_iw: ImFreqGfModel::from_gf(&g_iw),
        sigma_iw: ImFreqGfModel::from_gf(&sigma_iw),
    };
    let rendered = serde_json::to_string_pretty(&result)
        .context("failed to serialize post-processing result")?;
    fs::write(&args.output, rendered + "\n")
        .with_context(|| format!("failed to write result file '{}'", args.output.display()))?;

    println!(
        "Post-processed '{}' ({} blocks, n_iw={}) -> '{}'",
        args.input.display(),
        structure.n_blocks(),
        g0_iw.mesh().len(),
        args.output.display()
    );
    Ok(0)
}
