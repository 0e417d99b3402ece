use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};

use crate::amount::parse_amount;
use crate::error::CoreError;

/// A piecewise-linear function mapping source amount to destination amount
/// for a payment hop.
///
/// Points are ordered and non-decreasing in both axes. Between points the
/// curve interpolates linearly; below the first point it yields zero and
/// beyond the last point it saturates at the final destination amount.
/// Serializes as `[["x", "y"], ...]` with decimal strings to keep exact
/// precision on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<[String; 2]>", into = "Vec<[String; 2]>")]
pub struct LiquidityCurve {
    points: Vec<(BigDecimal, BigDecimal)>,
}

impl LiquidityCurve {
    /// Build a curve from ordered `(source, destination)` points.
    pub fn new(points: Vec<(BigDecimal, BigDecimal)>) -> Result<Self, CoreError> {
        if points.is_empty() {
            return Err(CoreError::InvalidCurve("curve has no points".into()));
        }
        for pair in points.windows(2) {
            if pair[1].0 < pair[0].0 || pair[1].1 < pair[0].1 {
                return Err(CoreError::InvalidCurve(format!(
                    "points must be non-decreasing in both axes: ({}, {}) then ({}, {})",
                    pair[0].0, pair[0].1, pair[1].0, pair[1].1
                )));
            }
        }
        Ok(Self { points })
    }

    /// The ordered `(source, destination)` points.
    pub fn points(&self) -> &[(BigDecimal, BigDecimal)] {
        &self.points
    }

    /// Destination amount obtained for the given source amount.
    pub fn amount_at(&self, x: &BigDecimal) -> BigDecimal {
        let (first, last) = match (self.points.first(), self.points.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return BigDecimal::zero(),
        };
        if x < &first.0 {
            return BigDecimal::zero();
        }
        if x >= &last.0 {
            return last.1.clone();
        }
        for pair in self.points.windows(2) {
            let (x0, y0) = (&pair[0].0, &pair[0].1);
            let (x1, y1) = (&pair[1].0, &pair[1].1);
            if x < x1 {
                if x1 == x0 {
                    return y0.clone();
                }
                let t = (x - x0) / (x1 - x0);
                return y0 + (y1 - y0) * t;
            }
        }
        last.1.clone()
    }

    /// Minimum source amount required to obtain the given destination
    /// amount, or `None` when the curve cannot deliver that much.
    pub fn amount_reverse(&self, y: &BigDecimal) -> Option<BigDecimal> {
        let (first, last) = match (self.points.first(), self.points.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return None,
        };
        if y > &last.1 {
            return None;
        }
        if y.is_zero() || y < &BigDecimal::zero() {
            return Some(BigDecimal::zero());
        }
        if y <= &first.1 {
            return Some(first.0.clone());
        }
        for pair in self.points.windows(2) {
            let (x0, y0) = (&pair[0].0, &pair[0].1);
            let (x1, y1) = (&pair[1].0, &pair[1].1);
            if y <= y1 {
                if y1 == y0 {
                    return Some(x0.clone());
                }
                let t = (y - y0) / (y1 - y0);
                return Some(x0 + (x1 - x0) * t);
            }
        }
        Some(last.0.clone())
    }

    /// Compose this curve (head leg) with a following curve (tail leg).
    ///
    /// The result maps head source amounts directly to tail destination
    /// amounts. Breakpoints of both legs are preserved: the head's own
    /// x-coordinates plus the head-inverse images of the tail's
    /// x-coordinates.
    pub fn join(&self, tail: &LiquidityCurve) -> Result<LiquidityCurve, CoreError> {
        let mut xs: Vec<BigDecimal> = self.points.iter().map(|p| p.0.clone()).collect();
        for (tail_x, _) in tail.points() {
            if let Some(x) = self.amount_reverse(tail_x) {
                xs.push(x);
            }
        }
        xs.sort();
        xs.dedup();
        let points = xs
            .into_iter()
            .map(|x| {
                let y = tail.amount_at(&self.amount_at(&x));
                (x, y)
            })
            .collect();
        LiquidityCurve::new(points)
    }
}

impl TryFrom<Vec<[String; 2]>> for LiquidityCurve {
    type Error = CoreError;

    fn try_from(raw: Vec<[String; 2]>) -> Result<Self, Self::Error> {
        let mut points = Vec::with_capacity(raw.len());
        for [x, y] in raw {
            points.push((parse_amount(&x)?, parse_amount(&y)?));
        }
        LiquidityCurve::new(points)
    }
}

impl From<LiquidityCurve> for Vec<[String; 2]> {
    fn from(curve: LiquidityCurve) -> Self {
        curve
            .points
            .into_iter()
            .map(|(x, y)| [x.to_string(), y.to_string()])
            .collect()
    }
}
