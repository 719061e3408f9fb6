//! Palette Builder: weighted median cut seeding plus k-means refinement in
//! OKLab + alpha.

extern crate alloc;
use alloc::vec;
use alloc::vec::Vec;

use crate::oklab::OKLabA;

/// A built palette candidate: centroids with their accumulated sample
/// weights, plus the weighted mean squared error of the final assignment.
#[derive(Debug, Clone)]
pub struct BuiltPalette {
    pub centroids: Vec<(OKLabA, f32)>,
    pub mse: f64,
}

/// Histogram entry inside a box, tagged with its original position so sort
/// ties resolve identically on every run.
#[derive(Debug, Clone, Copy)]
struct Sample {
    laba: OKLabA,
    weight: f32,
    order: u32,
}

impl Sample {
    fn channel(&self, axis: usize) -> f32 {
        match axis {
            0 => self.laba.l,
            1 => self.laba.a,
            2 => self.laba.b,
            _ => self.laba.alpha,
        }
    }
}

#[derive(Debug, Clone)]
struct ColorBox {
    samples: Vec<Sample>,
}

impl ColorBox {
    fn total_weight(&self) -> f32 {
        self.samples.iter().map(|s| s.weight).sum()
    }

    /// Weighted variance along each of the four channels.
    fn variances(&self) -> [f32; 4] {
        let w_total = self.total_weight();
        if w_total < 1e-10 {
            return [0.0; 4];
        }

        let mut means = [0.0f32; 4];
        for s in &self.samples {
            for (axis, mean) in means.iter_mut().enumerate() {
                *mean += s.channel(axis) * s.weight;
            }
        }
        for mean in &mut means {
            *mean /= w_total;
        }

        let mut vars = [0.0f32; 4];
        for s in &self.samples {
            for (axis, var) in vars.iter_mut().enumerate() {
                let d = s.channel(axis) - means[axis];
                *var += d * d * s.weight;
            }
        }
        for var in &mut vars {
            *var /= w_total;
        }
        vars
    }

    /// Split priority: heavy boxes with high color variation split first.
    fn priority(&self) -> f32 {
        let vars = self.variances();
        let spread = vars[0].max(vars[1]).max(vars[2]).max(vars[3]);
        self.total_weight() * spread
    }

    fn centroid(&self) -> (OKLabA, f32) {
        let mut sums = [0.0f32; 4];
        let mut w_sum = 0.0f32;
        for s in &self.samples {
            sums[0] += s.laba.l * s.weight;
            sums[1] += s.laba.a * s.weight;
            sums[2] += s.laba.b * s.weight;
            sums[3] += s.laba.alpha * s.weight;
            w_sum += s.weight;
        }
        if w_sum < 1e-10 {
            return (OKLabA::new(0.0, 0.0, 0.0, 1.0), 0.0);
        }
        (
            OKLabA::new(
                sums[0] / w_sum,
                sums[1] / w_sum,
                sums[2] / w_sum,
                sums[3] / w_sum,
            ),
            w_sum,
        )
    }

    /// Split along the highest-variance channel at the weighted median.
    /// Lower channel index wins variance ties; sample order breaks value
    /// ties, so the cut is identical across runs.
    fn split(mut self) -> (ColorBox, ColorBox) {
        let vars = self.variances();
        let mut axis = 0;
        for i in 1..4 {
            if vars[i] > vars[axis] {
                axis = i;
            }
        }

        self.samples
            .sort_by(|a, b| a.channel(axis).total_cmp(&b.channel(axis)).then(a.order.cmp(&b.order)));

        let half_weight = self.total_weight() / 2.0;
        let mut accumulated = 0.0f32;
        let mut split_idx = 1;
        for (i, s) in self.samples.iter().enumerate() {
            accumulated += s.weight;
            if accumulated >= half_weight && i + 1 < self.samples.len() {
                split_idx = i + 1;
                break;
            }
        }
        split_idx = split_idx.clamp(1, self.samples.len() - 1);

        let right = self.samples.split_off(split_idx);
        (ColorBox { samples: self.samples }, ColorBox { samples: right })
    }
}

/// Build up to `max_colors` centroids from weighted histogram entries.
///
/// Seeds by recursive variance-based splitting, then refines with weighted
/// k-means bounded by `max_iterations` (derived from the speed setting) and
/// an early convergence cutoff. Deterministic for identical input.
pub fn build_palette(
    entries: &[(OKLabA, f32)],
    max_colors: usize,
    max_iterations: usize,
) -> BuiltPalette {
    if entries.is_empty() {
        return BuiltPalette {
            centroids: Vec::new(),
            mse: 0.0,
        };
    }

    let samples: Vec<Sample> = entries
        .iter()
        .enumerate()
        .map(|(i, &(laba, weight))| Sample {
            laba,
            weight,
            order: i as u32,
        })
        .collect();

    if samples.len() <= max_colors {
        // Each sample is its own entry; no approximation error against the
        // sampled statistics.
        return BuiltPalette {
            centroids: samples.iter().map(|s| (s.laba, s.weight)).collect(),
            mse: 0.0,
        };
    }

    let mut boxes = Vec::with_capacity(max_colors);
    boxes.push(ColorBox {
        samples: samples.clone(),
    });

    while boxes.len() < max_colors {
        let best = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.samples.len() >= 2)
            .max_by(|(ia, a), (ib, b)| {
                a.priority()
                    .total_cmp(&b.priority())
                    // First candidate wins ties
                    .then(ib.cmp(&ia))
            })
            .map(|(i, _)| i);

        let Some(idx) = best else {
            break;
        };

        let (left, right) = boxes.remove(idx).split();
        boxes.push(left);
        boxes.push(right);
    }

    let mut centroids: Vec<OKLabA> = boxes.iter().map(|b| b.centroid().0).collect();
    refine_kmeans(&mut centroids, &samples, max_iterations);
    finalize(centroids, &samples)
}

/// Weighted k-means over all samples, with an early exit once centroids
/// stop moving.
fn refine_kmeans(centroids: &mut [OKLabA], samples: &[Sample], max_iterations: usize) {
    const CONVERGED: f32 = 1e-6;

    for _ in 0..max_iterations {
        let k = centroids.len();
        let mut sums = vec![[0.0f32; 4]; k];
        let mut weights = vec![0.0f32; k];

        for s in samples {
            let nearest = nearest_centroid(centroids, s.laba);
            sums[nearest][0] += s.laba.l * s.weight;
            sums[nearest][1] += s.laba.a * s.weight;
            sums[nearest][2] += s.laba.b * s.weight;
            sums[nearest][3] += s.laba.alpha * s.weight;
            weights[nearest] += s.weight;
        }

        let mut movement = 0.0f32;
        for i in 0..k {
            if weights[i] < 1e-10 {
                continue; // empty cluster keeps its seed
            }
            let updated = OKLabA::new(
                sums[i][0] / weights[i],
                sums[i][1] / weights[i],
                sums[i][2] / weights[i],
                sums[i][3] / weights[i],
            );
            movement += centroids[i].distance_sq(updated);
            centroids[i] = updated;
        }

        if movement < CONVERGED {
            break;
        }
    }
}

/// Final assignment pass: per-centroid usage weights and the weighted MSE
/// that becomes the fidelity score.
fn finalize(centroids: Vec<OKLabA>, samples: &[Sample]) -> BuiltPalette {
    let mut usage = vec![0.0f32; centroids.len()];
    let mut err_sum = 0.0f64;
    let mut w_sum = 0.0f64;

    for s in samples {
        let nearest = nearest_centroid(&centroids, s.laba);
        usage[nearest] += s.weight;
        err_sum += s.laba.distance_sq(centroids[nearest]) as f64 * s.weight as f64;
        w_sum += s.weight as f64;
    }

    let mse = if w_sum > 0.0 { err_sum / w_sum } else { 0.0 };
    BuiltPalette {
        centroids: centroids.into_iter().zip(usage).collect(),
        mse,
    }
}

fn nearest_centroid(centroids: &[OKLabA], laba: OKLabA) -> usize {
    let mut best = 0;
    let mut best_dist = f32::MAX;
    for (i, c) in centroids.iter().enumerate() {
        let d = laba.distance_sq(*c);
        if d < best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

/// Map weighted MSE in OKLab + alpha onto the 0..=100 fidelity scale.
/// Zero error is 100; errors visible at a glance land well below 50.
pub fn quality_from_mse(mse: f64) -> u8 {
    let score = 100.0 - mse.sqrt() * 400.0;
    score.round().clamp(0.0, 100.0) as u8
}
