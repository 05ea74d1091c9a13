//! Unsupervised colour clustering (k-means in RGB space)

use crate::error::VisionError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub type Color = [f64; 3];

/// Cluster centres plus one label per input pixel.
/// Recomputed from scratch for every frame.
#[derive(Debug, Clone)]
pub struct ColorClusters {
    pub centers: Vec<Color>,
    pub labels: Vec<usize>,
    pub iterations: usize,
}

impl ColorClusters {
    /// Index of the centre closest to `target` (ties go to the lowest index)
    /// together with its distance.
    pub fn nearest_center(&self, target: Color) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, center) in self.centers.iter().enumerate() {
            let dist = squared_distance(center, &target);
            if best.map_or(true, |(_, best_dist)| dist < best_dist) {
                best = Some((idx, dist));
            }
        }
        best.map(|(idx, dist)| (idx, dist.sqrt()))
    }

    /// Number of pixels carrying `label`
    pub fn count(&self, label: usize) -> usize {
        self.labels.iter().filter(|&&l| l == label).count()
    }
}

/// k-means with k-means++ seeding and a fixed seed, so the same pixels
/// always produce the same clusters.
#[derive(Debug, Clone)]
pub struct KMeans {
    k: usize,
    max_iterations: usize,
    tolerance: f64,
    seed: u64,
}

impl KMeans {
    pub fn new(k: usize, max_iterations: usize, tolerance: f64, seed: u64) -> Self {
        Self {
            k,
            max_iterations: max_iterations.max(1),
            tolerance,
            seed,
        }
    }

    pub fn fit(&self, pixels: &[Color]) -> Result<ColorClusters, VisionError> {
        if self.k == 0 {
            return Err(VisionError::Clustering("Cluster count must be greater than 0".to_string()));
        }
        if pixels.is_empty() {
            return Err(VisionError::Clustering("No pixels to cluster".to_string()));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut centers = self.seed_centers(pixels, &mut rng);
        let mut labels = vec![0usize; pixels.len()];
        let mut iterations = 0;

        for _ in 0..self.max_iterations {
            iterations += 1;
            assign(pixels, &centers, &mut labels);

            let mut sums = vec![[0.0f64; 3]; self.k];
            let mut counts = vec![0usize; self.k];
            for (pixel, &label) in pixels.iter().zip(labels.iter()) {
                for c in 0..3 {
                    sums[label][c] += pixel[c];
                }
                counts[label] += 1;
            }

            let mut max_shift = 0.0f64;
            for (idx, center) in centers.iter_mut().enumerate() {
                // Empty clusters keep their previous centre
                if counts[idx] == 0 {
                    continue;
                }
                let n = counts[idx] as f64;
                let updated = [sums[idx][0] / n, sums[idx][1] / n, sums[idx][2] / n];
                max_shift = max_shift.max(squared_distance(center, &updated).sqrt());
                *center = updated;
            }

            if max_shift <= self.tolerance {
                break;
            }
        }

        // Labels must agree with the final centres
        assign(pixels, &centers, &mut labels);

        Ok(ColorClusters {
            centers,
            labels,
            iterations,
        })
    }

    /// k-means++: each further centre is drawn with probability proportional
    /// to its squared distance from the nearest centre chosen so far.
    fn seed_centers(&self, pixels: &[Color], rng: &mut StdRng) -> Vec<Color> {
        let mut centers = Vec::with_capacity(self.k);
        centers.push(pixels[rng.gen_range(0..pixels.len())]);

        let mut nearest: Vec<f64> = pixels
            .iter()
            .map(|p| squared_distance(p, &centers[0]))
            .collect();

        while centers.len() < self.k {
            let total: f64 = nearest.iter().sum();
            let next = if total > 0.0 {
                let mut target = rng.gen::<f64>() * total;
                let mut chosen = pixels.len() - 1;
                for (idx, weight) in nearest.iter().enumerate() {
                    if target < *weight {
                        chosen = idx;
                        break;
                    }
                    target -= weight;
                }
                pixels[chosen]
            } else {
                // Every pixel already coincides with a centre
                centers[0]
            };

            for (dist, pixel) in nearest.iter_mut().zip(pixels.iter()) {
                *dist = dist.min(squared_distance(pixel, &next));
            }
            centers.push(next);
        }

        centers
    }
}

fn assign(pixels: &[Color], centers: &[Color], labels: &mut [usize]) {
    for (pixel, label) in pixels.iter().zip(labels.iter_mut()) {
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (idx, center) in centers.iter().enumerate() {
            let dist = squared_distance(pixel, center);
            if dist < best_dist {
                best = idx;
                best_dist = dist;
            }
        }
        *label = best;
    }
}

#[inline]
pub fn squared_distance(a: &Color, b: &Color) -> f64 {
    let dr = a[0] - b[0];
    let dg = a[1] - b[1];
    let db = a[2] - b[2];
    dr * dr + dg * dg + db * db
}
