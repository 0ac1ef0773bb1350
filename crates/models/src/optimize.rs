//! Box-constrained Nelder-Mead minimisation for smoothing parameters.

use std::cmp::Ordering;

pub(crate) struct Bounds {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl Bounds {
    fn clamp(&self, point: &mut [f64]) {
        for ((v, lo), hi) in point.iter_mut().zip(&self.lower).zip(&self.upper) {
            *v = v.clamp(*lo, *hi);
        }
    }
}

struct Vertex {
    point: Vec<f64>,
    value: f64,
}

fn by_value(a: &Vertex, b: &Vertex) -> Ordering {
    a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal)
}

/// Minimise `objective` inside `bounds`, starting from `start`.
///
/// Stops after `max_iter` iterations or once the simplex is narrower than
/// `tol` in every coordinate. Non-finite objective values count as worst.
pub(crate) fn minimize<F>(objective: F, start: &[f64], bounds: &Bounds, max_iter: usize, tol: f64) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let eval = |point: &[f64]| {
        let v = objective(point);
        if v.is_finite() {
            v
        } else {
            f64::MAX
        }
    };
    let vertex = |mut point: Vec<f64>| {
        bounds.clamp(&mut point);
        let value = eval(&point);
        Vertex { point, value }
    };

    let dim = start.len();
    if dim == 0 {
        return Vec::new();
    }
    let origin = vertex(start.to_vec());
    let mut simplex = Vec::with_capacity(dim + 1);
    for i in 0..dim {
        let step = 0.1 * (bounds.upper[i] - bounds.lower[i]);
        let mut point = origin.point.clone();
        point[i] = if point[i] + step <= bounds.upper[i] {
            point[i] + step
        } else {
            point[i] - step
        };
        simplex.push(vertex(point));
    }
    simplex.push(origin);

    for _ in 0..max_iter {
        simplex.sort_by(by_value);

        let spread = (0..dim)
            .map(|j| {
                let (lo, hi) = simplex.iter().fold((f64::MAX, f64::MIN), |(lo, hi), v| {
                    (lo.min(v.point[j]), hi.max(v.point[j]))
                });
                hi - lo
            })
            .fold(0.0_f64, f64::max);
        if spread < tol {
            break;
        }

        let worst = dim;
        let centroid: Vec<f64> = (0..dim)
            .map(|j| simplex[..worst].iter().map(|v| v.point[j]).sum::<f64>() / dim as f64)
            .collect();
        let towards = |from: &[f64], factor: f64| -> Vec<f64> {
            centroid
                .iter()
                .zip(from)
                .map(|(c, x)| c + factor * (x - c))
                .collect()
        };

        let reflected = vertex(towards(&simplex[worst].point, -1.0));
        if reflected.value < simplex[0].value {
            let expanded = vertex(towards(&simplex[worst].point, -2.0));
            simplex[worst] = if expanded.value < reflected.value {
                expanded
            } else {
                reflected
            };
            continue;
        }
        if reflected.value < simplex[worst - 1].value {
            simplex[worst] = reflected;
            continue;
        }

        // Contract towards the better of the worst vertex and its reflection.
        let (base, base_value) = if reflected.value < simplex[worst].value {
            (reflected.point.clone(), reflected.value)
        } else {
            (simplex[worst].point.clone(), simplex[worst].value)
        };
        let contracted = vertex(towards(&base, 0.5));
        if contracted.value < base_value {
            simplex[worst] = contracted;
            continue;
        }

        // Shrink everything towards the best vertex.
        let best = simplex[0].point.clone();
        for v in simplex.iter_mut().skip(1) {
            let shrunk = v.point.iter().zip(&best).map(|(x, b)| 0.5 * (x + b)).collect();
            *v = vertex(shrunk);
        }
    }

    simplex
        .into_iter()
        .min_by(by_value)
        .map(|v| v.point)
        .unwrap_or_else(|| start.to_vec())
}
