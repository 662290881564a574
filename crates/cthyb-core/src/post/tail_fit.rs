use crate::domain::{SolverError, SolverResult};
use crate::engine::PostProcParameters;
use crate::gf::{BlockGfImFreq, TailMoments};
use crate::numerics::{DenseComplexMatrix, solve};
use num_complex::Complex64;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq)]
pub struct TailFitOptions {
    pub max_moment: usize,
    pub known_moments: Option<TailMoments>,
    pub fit_min_n: Option<usize>,
    pub fit_max_n: Option<usize>,
    pub fit_min_w: Option<f64>,
    pub fit_max_w: Option<f64>,
}

impl TailFitOptions {
    pub fn new(max_moment: usize) -> Self {
        Self {
            max_moment,
            known_moments: None,
            fit_min_n: None,
            fit_max_n: None,
            fit_min_w: None,
            fit_max_w: None,
        }
    }

    pub fn from_post_proc(parameters: &PostProcParameters) -> Self {
        Self {
            max_moment: parameters.fit_max_moment,
            known_moments: parameters.fit_known_moments.clone(),
            fit_min_n: parameters.fit_min_n,
            fit_max_n: parameters.fit_max_n,
            fit_min_w: parameters.fit_min_w,
            fit_max_w: parameters.fit_max_w,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TailFitOutcome {
    pub moments: TailMoments,
    pub window: Range<usize>,
    pub used_default_window: bool,
}

/// Least-squares fit of `f(iw) ~ sum_k M_k / (iw)^k` over a high-frequency
/// window, block-wise and orbital-component-wise independent.
///
/// Known moments stay fixed; only the remaining orders are solved for.
/// Values on and beyond the window start are replaced by the fitted model
/// and the full moment set is attached to the container as tail metadata.
/// Index windows win over frequency windows; with neither given the window
/// falls back to the outer 20% of the mesh (`used_default_window` reports
/// this so the caller can warn).
pub fn fit_tail(gf: &mut BlockGfImFreq, options: &TailFitOptions) -> SolverResult<TailFitOutcome> {
    let (window, used_default_window) = resolve_window(gf, options)?;
    if window.is_empty() {
        return Err(SolverError::configuration(
            "CONFIG.TAIL_FIT_WINDOW",
            format!(
                "tail-fit window [{}, {}) contains no frequency points",
                window.start, window.end
            ),
        ));
    }

    if let Some(known) = &options.known_moments {
        if known.structure() != gf.structure() {
            return Err(SolverError::configuration(
                "CONFIG.TAIL_FIT_KNOWN_MOMENTS",
                "known moments must carry the same block structure as the fitted function",
            ));
        }
    }
    let known_max_order = options
        .known_moments
        .as_ref()
        .map(|known| known.max_order());
    let unknown_orders: Vec<usize> = (0..=options.max_moment)
        .filter(|order| known_max_order.is_none_or(|max| *order > max))
        .collect();

    if window.len() < unknown_orders.len() {
        return Err(SolverError::configuration(
            "CONFIG.TAIL_FIT_WINDOW",
            format!(
                "under-determined tail fit: {} window points for {} unknown moments",
                window.len(),
                unknown_orders.len()
            ),
        ));
    }

    let mesh = *gf.mesh();
    let inverse_frequencies: Vec<Complex64> =
        window.clone().map(|point| mesh.iomega(point).inv()).collect();

    let mut moments = TailMoments::zero(gf.structure().clone(), options.max_moment);
    for block_index in 0..gf.structure().n_blocks() {
        let dim = gf.structure().dim_at(block_index);

        // Carry the known orders over unchanged.
        if let Some(known) = &options.known_moments {
            for order in 0..=known.max_order().min(options.max_moment) {
                moments.set_moment(
                    block_index,
                    order,
                    known
                        .moment(block_index, order)
                        .expect("moment orders are dense")
                        .clone(),
                )?;
            }
        }

        for row in 0..dim {
            for col in 0..dim {
                let fitted = fit_component(
                    gf,
                    block_index,
                    (row, col),
                    &window,
                    &inverse_frequencies,
                    &unknown_orders,
                    options,
                )?;
                for (&order, value) in unknown_orders.iter().zip(fitted) {
                    let mut moment = moments
                        .moment(block_index, order)
                        .expect("moment orders are dense")
                        .clone();
                    moment[(row, col)] = value;
                    moments.set_moment(block_index, order, moment)?;
                }
            }
        }
    }

    replace_with_model(gf, &moments, window.start);
    gf.set_tail(moments.clone());

    Ok(TailFitOutcome {
        moments,
        window,
        used_default_window,
    })
}

fn resolve_window(
    gf: &BlockGfImFreq,
    options: &TailFitOptions,
) -> SolverResult<(Range<usize>, bool)> {
    let n_iw = gf.mesh().len();
    let used_default = options.fit_min_n.is_none()
        && options.fit_max_n.is_none()
        && options.fit_min_w.is_none()
        && options.fit_max_w.is_none();

    let start = match (options.fit_min_n, options.fit_min_w) {
        (Some(index), _) => index,
        (None, Some(omega)) => gf.mesh().index_at_or_above(omega),
        (None, None) => (0.8 * n_iw as f64).floor() as usize,
    };
    let end = match (options.fit_max_n, options.fit_max_w) {
        (Some(index), _) => index,
        (None, Some(omega)) => gf.mesh().index_end_at_or_below(omega),
        (None, None) => n_iw,
    };

    if start > n_iw || end > n_iw {
        return Err(SolverError::configuration(
            "CONFIG.TAIL_FIT_WINDOW",
            format!("tail-fit window [{start}, {end}) exceeds the mesh size {n_iw}"),
        ));
    }
    let start = start.min(end);
    Ok((start..end, used_default))
}

fn fit_component(
    gf: &BlockGfImFreq,
    block_index: usize,
    (row, col): (usize, usize),
    window: &Range<usize>,
    inverse_frequencies: &[Complex64],
    unknown_orders: &[usize],
    options: &TailFitOptions,
) -> SolverResult<Vec<Complex64>> {
    if unknown_orders.is_empty() {
        return Ok(Vec::new());
    }

    // Residual after subtracting the known-moment contribution.
    let residuals: Vec<Complex64> = window
        .clone()
        .zip(inverse_frequencies)
        .map(|(point, &x)| {
            let mut value = gf.value(block_index, point)[(row, col)];
            if let Some(known) = &options.known_moments {
                for order in 0..=known.max_order() {
                    let coefficient =
                        known.moment(block_index, order).expect("moment orders are dense")
                            [(row, col)];
                    value -= coefficient * x.powu(order as u32);
                }
            }
            value
        })
        .collect();

    // Normal equations of the complex least-squares problem in x = 1/(iw).
    let unknowns = unknown_orders.len();
    let mut normal = DenseComplexMatrix::zeros(unknowns, unknowns);
    let mut rhs = vec![Complex64::new(0.0, 0.0); unknowns];
    for (sample, &x) in inverse_frequencies.iter().enumerate() {
        let basis: Vec<Complex64> = unknown_orders
            .iter()
            .map(|&order| x.powu(order as u32))
            .collect();
        for a in 0..unknowns {
            let conjugated = basis[a].conj();
            for b in 0..unknowns {
                normal[(a, b)] += conjugated * basis[b];
            }
            rhs[a] += conjugated * residuals[sample];
        }
    }

    solve(&normal, &rhs).map_err(|error| {
        SolverError::numerical(
            "NUMERICS.TAIL_FIT_SOLVE",
            format!("normal equations for component ({row},{col}): {error}"),
        )
    })
}

fn replace_with_model(gf: &mut BlockGfImFreq, moments: &TailMoments, from_point: usize) {
    let mesh = *gf.mesh();
    for block_index in 0..gf.structure().n_blocks() {
        let dim = gf.structure().dim_at(block_index);
        for point in from_point..mesh.len() {
            let x = mesh.iomega(point).inv();
            let value = gf.value_mut(block_index, point);
            for row in 0..dim {
                for col in 0..dim {
                    let mut model = Complex64::new(0.0, 0.0);
                    for order in 0..=moments.max_order() {
                        let coefficient = moments
                            .moment(block_index, order)
                            .expect("moment orders are dense")[(row, col)];
                        model += coefficient * x.powu(order as u32);
                    }
                    value[(row, col)] = model;
                }
            }
        }
    }
}
