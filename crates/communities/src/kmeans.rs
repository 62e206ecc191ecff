use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_N_INIT: usize = 10;
pub const DEFAULT_MAX_ITER: usize = 300;
pub const DEFAULT_TOL: f64 = 1e-4;

/// Seeded Lloyd K-means with k-means++ initialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KMeans {
    pub k: usize,
    pub seed: u64,
    pub n_init: usize,
    pub max_iter: usize,
    /// Relative to the mean per-column variance of the data
    pub tol: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KMeansModel {
    pub centroids: Vec<Vec<f64>>,
    pub labels: Vec<usize>,
    pub inertia: f64,
    pub iterations: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElbowPoint {
    pub k: usize,
    pub inertia: f64,
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Index and squared distance of the nearest centroid; ties go to the lower index
fn nearest(point: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (i, c) in centroids.iter().enumerate() {
        let d = squared_distance(point, c);
        if d < best.1 {
            best = (i, d);
        }
    }
    best
}

impl KMeans {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            seed: DEFAULT_SEED,
            n_init: DEFAULT_N_INIT,
            max_iter: DEFAULT_MAX_ITER,
            tol: DEFAULT_TOL,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init.max(1);
        self
    }

    /// Best of `n_init` seeded runs by inertia.
    pub fn fit(&self, data: &[Vec<f64>]) -> Result<KMeansModel> {
        let n = data.len();
        if self.k == 0 {
            bail!("K-means needs at least one cluster");
        }
        if self.k > n {
            bail!("Cannot form {} clusters from {} samples", self.k, n);
        }
        let width = data[0].len();
        if data.iter().any(|r| r.len() != width) {
            bail!("Samples have different dimensions");
        }

        let tol = self.tol * mean_variance(data);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut best: Option<KMeansModel> = None;

        for run in 0..self.n_init.max(1) {
            let seeds = self.init_plus_plus(data, &mut rng);
            let model = self.lloyd(data, seeds, tol);
            debug!(run, k = self.k, inertia = model.inertia, "K-means run finished");

            if best.as_ref().is_none_or(|b| model.inertia < b.inertia) {
                best = Some(model);
            }
        }

        match best {
            Some(model) => Ok(relabel(model)),
            None => bail!("K-means produced no model"),
        }
    }

    fn init_plus_plus(&self, data: &[Vec<f64>], rng: &mut StdRng) -> Vec<Vec<f64>> {
        let n = data.len();
        let mut centroids = vec![data[rng.gen_range(0..n)].clone()];

        while centroids.len() < self.k {
            let distances: Vec<f64> = data.iter().map(|p| nearest(p, &centroids).1).collect();
            let total: f64 = distances.iter().sum();

            let next = if total > 0.0 {
                let mut target = rng.gen_range(0.0..total);
                let mut chosen = n - 1;
                for (i, d) in distances.iter().enumerate() {
                    if target < *d {
                        chosen = i;
                        break;
                    }
                    target -= d;
                }
                chosen
            } else {
                // every point already sits on a centroid
                rng.gen_range(0..n)
            };

            centroids.push(data[next].clone());
        }

        centroids
    }

    fn lloyd(&self, data: &[Vec<f64>], mut centroids: Vec<Vec<f64>>, tol: f64) -> KMeansModel {
        let width = data[0].len();
        let mut labels: Vec<usize> = data.iter().map(|p| nearest(p, &centroids).0).collect();
        let mut iterations = 0;

        for _ in 0..self.max_iter {
            iterations += 1;

            // Step 1: recompute centroids
            let mut sums = vec![vec![0.0; width]; self.k];
            let mut counts = vec![0usize; self.k];
            for (point, &label) in data.iter().zip(&labels) {
                counts[label] += 1;
                for (s, x) in sums[label].iter_mut().zip(point) {
                    *s += x;
                }
            }

            let mut next: Vec<Vec<f64>> = sums
                .into_iter()
                .zip(&counts)
                .map(|(sum, &count)| {
                    if count == 0 {
                        sum
                    } else {
                        sum.into_iter().map(|s| s / count as f64).collect()
                    }
                })
                .collect();

            // Step 2: an empty cluster takes the point farthest from its centroid
            for cluster in 0..self.k {
                if counts[cluster] > 0 {
                    continue;
                }
                let farthest = data
                    .iter()
                    .zip(&labels)
                    .map(|(p, &l)| squared_distance(p, &next[l]))
                    .enumerate()
                    .fold((0, f64::NEG_INFINITY), |best, (i, d)| if d > best.1 { (i, d) } else { best });
                next[cluster] = data[farthest.0].clone();
            }

            let shift: f64 = centroids
                .iter()
                .zip(&next)
                .map(|(a, b)| squared_distance(a, b))
                .sum();
            centroids = next;

            // Step 3: reassign
            let new_labels: Vec<usize> = data.iter().map(|p| nearest(p, &centroids).0).collect();
            let stable = new_labels == labels;
            labels = new_labels;

            if stable || shift <= tol {
                break;
            }
        }

        let inertia = data
            .iter()
            .zip(&labels)
            .map(|(p, &l)| squared_distance(p, &centroids[l]))
            .sum();

        KMeansModel {
            centroids,
            labels,
            inertia,
            iterations,
        }
    }
}

fn mean_variance(data: &[Vec<f64>]) -> f64 {
    let width = data[0].len();
    if width == 0 {
        return 0.0;
    }

    let n = data.len() as f64;
    let total: f64 = (0..width)
        .map(|col| {
            let mean = data.iter().map(|r| r[col]).sum::<f64>() / n;
            data.iter().map(|r| (r[col] - mean).powi(2)).sum::<f64>() / n
        })
        .sum();

    total / width as f64
}

/// Renumber clusters by order of first appearance in `labels`.
fn relabel(model: KMeansModel) -> KMeansModel {
    let k = model.centroids.len();
    let mut mapping: Vec<Option<usize>> = vec![None; k];
    let mut next_id = 0;

    for &label in &model.labels {
        if mapping[label].is_none() {
            mapping[label] = Some(next_id);
            next_id += 1;
        }
    }
    // clusters nobody landed in keep their relative order at the end
    for slot in mapping.iter_mut() {
        if slot.is_none() {
            *slot = Some(next_id);
            next_id += 1;
        }
    }

    let mapping: Vec<usize> = mapping.into_iter().map(|m| m.unwrap_or(0)).collect();
    let mut centroids = vec![Vec::new(); k];
    for (old, centroid) in model.centroids.into_iter().enumerate() {
        centroids[mapping[old]] = centroid;
    }

    KMeansModel {
        centroids,
        labels: model.labels.iter().map(|&l| mapping[l]).collect(),
        inertia: model.inertia,
        iterations: model.iterations,
    }
}

/// Inertia for every K in `[2, min(n - 1, max_k)]`; empty when the range is.
pub fn elbow_sweep(data: &[Vec<f64>], max_k: usize, template: &KMeans) -> Result<Vec<ElbowPoint>> {
    let upper = data.len().saturating_sub(1).min(max_k);
    let mut points = Vec::new();

    for k in 2..=upper {
        let model = KMeans { k, ..template.clone() }.fit(data)?;
        points.push(ElbowPoint {
            k,
            inertia: model.inertia,
        });
    }

    Ok(points)
}

/// Knee of the elbow curve: the point farthest from the chord between the
/// first and last points, with both axes scaled to [0, 1].
pub fn choose_k(points: &[ElbowPoint]) -> usize {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return 1;
    };

    let k_span = (last.k - first.k) as f64;
    let (lo, hi) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.inertia), hi.max(p.inertia))
        });
    let inertia_span = hi - lo;

    if k_span == 0.0 || inertia_span == 0.0 {
        return first.k;
    }

    let scale = |p: &ElbowPoint| {
        (
            (p.k - first.k) as f64 / k_span,
            (p.inertia - lo) / inertia_span,
        )
    };

    let (x1, y1) = scale(first);
    let (x2, y2) = scale(last);
    let chord = ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt();

    let mut best = (first.k, f64::NEG_INFINITY);
    for p in points {
        let (x, y) = scale(p);
        let distance = ((y2 - y1) * x - (x2 - x1) * y + x2 * y1 - y2 * x1).abs() / chord;
        if distance > best.1 + 1e-12 {
            best = (p.k, distance);
        }
    }

    best.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs() -> Vec<Vec<f64>> {
        vec![
            vec![0.0, 0.0],
            vec![0.1, 0.2],
            vec![0.2, 0.1],
            vec![10.0, 10.0],
            vec![10.1, 9.9],
            vec![9.8, 10.2],
        ]
    }

    #[test]
    fn test_separates_obvious_blobs() {
        let model = KMeans::new(2).fit(&blobs()).unwrap();

        assert_eq!(model.labels, vec![0, 0, 0, 1, 1, 1]);
        assert!(model.inertia < 1.0);
    }

    #[test]
    fn test_fixed_seed_is_reproducible() {
        let data = blobs();
        let a = KMeans::new(3).with_seed(7).fit(&data).unwrap();
        let b = KMeans::new(3).with_seed(7).fit(&data).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_labels_follow_first_appearance() {
        let model = KMeans::new(3).fit(&blobs()).unwrap();
        assert_eq!(model.labels[0], 0);

        let mut seen = 0;
        for &label in &model.labels {
            assert!(label <= seen);
            if label == seen {
                seen += 1;
            }
        }
    }

    #[test]
    fn test_invalid_k() {
        assert!(KMeans::new(0).fit(&blobs()).is_err());
        assert!(KMeans::new(7).fit(&blobs()).is_err());
    }

    #[test]
    fn test_identical_points() {
        let data = vec![vec![1.0, 1.0]; 4];
        let model = KMeans::new(2).fit(&data).unwrap();
        assert_eq!(model.inertia, 0.0);
    }

    #[test]
    fn test_elbow_range() {
        let points = elbow_sweep(&blobs(), 5, &KMeans::new(2)).unwrap();
        let ks: Vec<_> = points.iter().map(|p| p.k).collect();
        assert_eq!(ks, vec![2, 3, 4, 5]);

        assert!(elbow_sweep(&blobs()[..2], 5, &KMeans::new(2)).unwrap().is_empty());
    }

    #[test]
    fn test_choose_k() {
        assert_eq!(choose_k(&[]), 1);
        assert_eq!(choose_k(&[ElbowPoint { k: 2, inertia: 5.0 }]), 2);

        let curve = [
            ElbowPoint { k: 2, inertia: 100.0 },
            ElbowPoint { k: 3, inertia: 20.0 },
            ElbowPoint { k: 4, inertia: 15.0 },
            ElbowPoint { k: 5, inertia: 12.0 },
        ];
        assert_eq!(choose_k(&curve), 3);
    }
}
