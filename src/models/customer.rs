//! Customer, location, and time window types.

use serde::{Deserialize, Serialize};

/// A 2-D coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X-coordinate.
    pub x: f64,
    /// Y-coordinate.
    pub y: f64,
}

impl Point {
    /// Creates a point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn euclidean(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A service time window with inclusive bounds.
///
/// A vehicle arriving before `early` waits; arriving after `late` is late by
/// `arrival - late`.
///
/// # Examples
///
/// ```
/// use u_ecoroute::models::TimeWindow;
///
/// let tw = TimeWindow::new(8.0, 9.0).unwrap();
/// assert!(tw.contains(8.0));
/// assert!(tw.contains(9.0));
/// assert_eq!(tw.lateness(10.0), 1.0);
/// assert_eq!(tw.waiting_time(5.0), 3.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeWindow {
    early: f64,
    late: f64,
}

impl TimeWindow {
    /// Creates a time window.
    ///
    /// Returns `None` if `early > late` or either bound is non-finite.
    pub fn new(early: f64, late: f64) -> Option<Self> {
        if !early.is_finite() || !late.is_finite() || early > late {
            return None;
        }
        Some(Self { early, late })
    }

    /// Earliest service start.
    pub fn early(&self) -> f64 {
        self.early
    }

    /// Latest allowable arrival.
    pub fn late(&self) -> f64 {
        self.late
    }

    /// Returns `true` if `time` lies within the window (bounds inclusive).
    pub fn contains(&self, time: f64) -> bool {
        time >= self.early && time <= self.late
    }

    /// Waiting time when arriving at `arrival`. Zero unless early.
    pub fn waiting_time(&self, arrival: f64) -> f64 {
        (self.early - arrival).max(0.0)
    }

    /// Lateness when arriving at `arrival`. Zero unless late.
    pub fn lateness(&self, arrival: f64) -> f64 {
        (arrival - self.late).max(0.0)
    }
}

/// A customer to be served from the depot.
///
/// # Examples
///
/// ```
/// use u_ecoroute::models::{Customer, Point, TimeWindow};
///
/// let c = Customer::new(3, Point::new(1.0, 2.0), 10)
///     .with_service_duration(5.0)
///     .with_time_window(TimeWindow::new(0.0, 100.0).unwrap());
/// assert_eq!(c.id(), 3);
/// assert_eq!(c.demand(), 10);
/// assert!(c.time_window().is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Customer {
    id: usize,
    location: Point,
    demand: i32,
    service_duration: f64,
    time_window: Option<TimeWindow>,
}

impl Customer {
    /// Creates a customer with no time window and zero service duration.
    pub fn new(id: usize, location: Point, demand: i32) -> Self {
        Self {
            id,
            location,
            demand,
            service_duration: 0.0,
            time_window: None,
        }
    }

    /// Sets the time window.
    pub fn with_time_window(mut self, tw: TimeWindow) -> Self {
        self.time_window = Some(tw);
        self
    }

    /// Sets the service duration.
    pub fn with_service_duration(mut self, duration: f64) -> Self {
        self.service_duration = duration;
        self
    }

    /// External identifier, unique within an instance.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Location of the customer.
    pub fn location(&self) -> Point {
        self.location
    }

    /// Demand to deliver.
    pub fn demand(&self) -> i32 {
        self.demand
    }

    /// Time spent serving the customer before departing.
    pub fn service_duration(&self) -> f64 {
        self.service_duration
    }

    /// Time window, if any.
    pub fn time_window(&self) -> Option<&TimeWindow> {
        self.time_window.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_window_invalid() {
        assert!(TimeWindow::new(20.0, 10.0).is_none());
        assert!(TimeWindow::new(f64::NAN, 10.0).is_none());
        assert!(TimeWindow::new(10.0, f64::INFINITY).is_none());
    }

    #[test]
    fn test_time_window_degenerate() {
        let tw = TimeWindow::new(5.0, 5.0).expect("valid");
        assert!(tw.contains(5.0));
        assert!(!tw.contains(5.1));
    }

    #[test]
    fn test_time_window_waiting_and_lateness() {
        let tw = TimeWindow::new(10.0, 20.0).expect("valid");
        assert!((tw.waiting_time(4.0) - 6.0).abs() < 1e-10);
        assert_eq!(tw.waiting_time(15.0), 0.0);
        assert_eq!(tw.lateness(20.0), 0.0);
        assert!((tw.lateness(22.5) - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_point_euclidean() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.euclidean(&b) - 5.0).abs() < 1e-10);
        assert!((b.euclidean(&a) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_customer_defaults() {
        let c = Customer::new(1, Point::new(10.0, 20.0), 5);
        assert_eq!(c.service_duration(), 0.0);
        assert!(c.time_window().is_none());
        assert_eq!(c.location(), Point::new(10.0, 20.0));
    }
}
