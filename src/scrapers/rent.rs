//! Rent estimation from nearby rental listings.

use crate::models::GeoLocation;

/// Rentals considered for each estimate
const NEIGHBOURS: usize = 8;

/// IQR multiplier beyond which a rent counts as an outlier
pub const OUTLIER_THRESHOLD: f64 = 1.5;

/// A rental listing used as evidence for nearby rents
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RentComparable {
    pub location: GeoLocation,
    pub monthly_rent: f64,
}

/// Estimates monthly rent at a point from the surrounding rental market
#[derive(Debug, Clone)]
pub struct RentEstimator {
    comparables: Vec<RentComparable>,
    mean_rent: f64,
}

impl RentEstimator {
    /// Build from raw comparables, discarding outlier rents.
    ///
    /// Returns `None` when nothing usable remains.
    pub fn new(comparables: Vec<RentComparable>) -> Option<Self> {
        let rents: Vec<f64> = comparables.iter().map(|c| c.monthly_rent).collect();
        let (low, high) = outlier_fences(&rents, OUTLIER_THRESHOLD)?;

        let comparables: Vec<_> = comparables
            .into_iter()
            .filter(|c| c.monthly_rent >= low && c.monthly_rent <= high)
            .collect();
        if comparables.is_empty() {
            return None;
        }

        let mean_rent =
            comparables.iter().map(|c| c.monthly_rent).sum::<f64>() / comparables.len() as f64;

        Some(Self {
            comparables,
            mean_rent,
        })
    }

    pub fn mean_rent(&self) -> f64 {
        self.mean_rent
    }

    pub fn len(&self) -> usize {
        self.comparables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comparables.is_empty()
    }

    /// Inverse-distance weighted rent of the nearest comparables.
    pub fn estimate(&self, at: GeoLocation) -> f64 {
        let mut nearest: Vec<(f64, f64)> = self
            .comparables
            .iter()
            .map(|c| (squared_distance(at, c.location), c.monthly_rent))
            .filter(|(d, _)| d.is_finite())
            .collect();
        if nearest.is_empty() {
            return self.mean_rent;
        }
        nearest.sort_by(|a, b| a.0.total_cmp(&b.0));
        nearest.truncate(NEIGHBOURS);

        if let Some(&(_, rent)) = nearest.iter().find(|(d, _)| *d < 1e-12) {
            return rent;
        }

        let (weighted, weights) = nearest
            .iter()
            .fold((0.0, 0.0), |(sum, total), &(d, rent)| {
                let w = 1.0 / d;
                (sum + w * rent, total + w)
            });

        if weights > 0.0 {
            weighted / weights
        } else {
            self.mean_rent
        }
    }
}

/// Lower and upper fences of the IQR rule, using linear-interpolated quartiles.
pub fn outlier_fences(values: &[f64], threshold: f64) -> Option<(f64, f64)> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let q1 = percentile(&sorted, 0.25);
    let q3 = percentile(&sorted, 0.75);
    let iqr = q3 - q1;
    Some((q1 - iqr * threshold, q3 + iqr * threshold))
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    let pos = p * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

// Equirectangular approximation; fine at neighbourhood scale.
fn squared_distance(a: GeoLocation, b: GeoLocation) -> f64 {
    let mean_lat = ((a.latitude + b.latitude) / 2.0).to_radians();
    let dx = (a.longitude - b.longitude) * mean_lat.cos();
    let dy = a.latitude - b.latitude;
    dx * dx + dy * dy
}
