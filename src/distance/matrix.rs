//! Dense distance matrix.

use crate::models::Point;

/// A dense n×n distance matrix stored in row-major order.
///
/// Location 0 is the depot; customers follow in instance order.
///
/// # Examples
///
/// ```
/// use u_ecoroute::models::Point;
/// use u_ecoroute::distance::DistanceMatrix;
///
/// let points = [Point::new(0.0, 0.0), Point::new(3.0, 4.0)];
/// let dm = DistanceMatrix::from_points(&points);
/// assert!((dm.get(0, 1) - 5.0).abs() < 1e-10);
/// assert_eq!(dm.size(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    data: Vec<f64>,
    size: usize,
}

impl DistanceMatrix {
    /// Creates a matrix of the given size, initialized to zero.
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0.0; size * size],
            size,
        }
    }

    /// Euclidean distances between the given points.
    pub fn from_points(points: &[Point]) -> Self {
        Self::from_fn(points, |a, b| a.euclidean(b))
    }

    /// Distances computed by an arbitrary metric.
    ///
    /// The metric is evaluated once per unordered pair and mirrored, so the
    /// result is symmetric by construction; the diagonal stays zero.
    pub fn from_fn<F>(points: &[Point], metric: F) -> Self
    where
        F: Fn(&Point, &Point) -> f64,
    {
        let n = points.len();
        let mut dm = Self::new(n);
        for i in 0..n {
            for j in (i + 1)..n {
                let d = metric(&points[i], &points[j]);
                dm.set(i, j, d);
                dm.set(j, i, d);
            }
        }
        dm
    }

    /// Creates a matrix from an explicit row-major n×n grid.
    ///
    /// Returns `None` if the data length doesn't match `size * size`.
    pub fn from_data(size: usize, data: Vec<f64>) -> Option<Self> {
        if data.len() != size * size {
            return None;
        }
        Some(Self { data, size })
    }

    /// Distance from location `from` to location `to`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.data[from * self.size + to]
    }

    /// Sets the distance from location `from` to location `to`.
    pub fn set(&mut self, from: usize, to: usize, distance: f64) {
        self.data[from * self.size + to] = distance;
    }

    /// Number of locations.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns `true` if the matrix is symmetric within the given tolerance.
    pub fn is_symmetric(&self, tol: f64) -> bool {
        for i in 0..self.size {
            for j in (i + 1)..self.size {
                if (self.get(i, j) - self.get(j, i)).abs() > tol {
                    return false;
                }
            }
        }
        true
    }

    /// Checks that the matrix describes a metric the solver accepts:
    /// finite, non-negative, zero diagonal, symmetric.
    pub fn check_metric(&self, tol: f64) -> Result<(), String> {
        for i in 0..self.size {
            for j in 0..self.size {
                let d = self.get(i, j);
                if !d.is_finite() {
                    return Err(format!("distance ({i}, {j}) is not finite"));
                }
                if d < 0.0 {
                    return Err(format!("distance ({i}, {j}) is negative: {d}"));
                }
            }
            if self.get(i, i).abs() > tol {
                return Err(format!("distance ({i}, {i}) must be zero"));
            }
        }
        if !self.is_symmetric(tol) {
            return Err("distance matrix is not symmetric".into());
        }
        Ok(())
    }
}
