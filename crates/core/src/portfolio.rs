//! In-process holdings keyed by symbol.

use crate::round2;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PortfolioError {
    #[error("shares must be positive (got {0})")]
    NonPositiveShares(i64),

    #[error("cost must be a non-negative number (got {0})")]
    InvalidCost(f64),

    #[error("adding {added} shares to a position of {held} exceeds the share limit")]
    ShareOverflow { held: i64, added: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub shares: i64,
    pub avg_cost: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    pub total_value: f64,
    pub total_cost: f64,
    pub total_gain_loss: f64,
    pub total_gain_loss_percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortfolioManager {
    positions: BTreeMap<String, Position>,
}

impl PortfolioManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_positions(positions: impl IntoIterator<Item = (String, Position)>) -> Self {
        Self {
            positions: positions.into_iter().collect(),
        }
    }

    pub fn positions(&self) -> &BTreeMap<String, Position> {
        &self.positions
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Buy into a symbol. An existing position's average cost becomes the share-weighted
    /// mean of old and new lots, rounded to cents; a new position keeps `cost` as given.
    pub fn add(&mut self, symbol: &str, shares: i64, cost: f64) -> Result<Position, PortfolioError> {
        if shares <= 0 {
            return Err(PortfolioError::NonPositiveShares(shares));
        }
        if !cost.is_finite() || cost < 0.0 {
            return Err(PortfolioError::InvalidCost(cost));
        }

        let position = match self.positions.get(symbol) {
            Some(current) => {
                let total = current
                    .shares
                    .checked_add(shares)
                    .ok_or(PortfolioError::ShareOverflow {
                        held: current.shares,
                        added: shares,
                    })?;
                let weighted = current.shares as f64 * current.avg_cost + shares as f64 * cost;
                Position {
                    shares: total,
                    avg_cost: round2(weighted / total as f64),
                }
            }
            None => Position {
                shares,
                avg_cost: cost,
            },
        };

        self.positions.insert(symbol.to_string(), position);
        Ok(position)
    }

    /// Sell out of a symbol. `None`, or at least the held amount, closes the position.
    /// Returns what is left; unknown symbols are left untouched.
    pub fn remove(&mut self, symbol: &str, shares: Option<i64>) -> Option<Position> {
        let current = *self.positions.get(symbol)?;
        match shares {
            Some(n) if n < current.shares => {
                let left = Position {
                    shares: current.shares - n.max(0),
                    avg_cost: current.avg_cost,
                };
                self.positions.insert(symbol.to_string(), left);
                Some(left)
            }
            _ => {
                self.positions.remove(symbol);
                None
            }
        }
    }

    /// Value positions at `prices`; symbols without a price are left out of both totals.
    pub fn valuation(&self, prices: &HashMap<String, f64>) -> Valuation {
        let mut total_value = 0.0;
        let mut total_cost = 0.0;

        for (symbol, position) in &self.positions {
            let Some(price) = prices.get(symbol).copied().filter(|p| *p > 0.0) else {
                continue;
            };
            total_value += position.shares as f64 * price;
            total_cost += position.shares as f64 * position.avg_cost;
        }

        let gain = total_value - total_cost;
        Valuation {
            total_value: round2(total_value),
            total_cost: round2(total_cost),
            total_gain_loss: round2(gain),
            total_gain_loss_percent: if total_cost > 0.0 {
                round2(gain / total_cost * 100.0)
            } else {
                0.0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_lot_keeps_cost_as_given() {
        let mut pm = PortfolioManager::new();
        let p = pm.add("AAPL", 10, 150.125).unwrap();
        assert_eq!(p, Position { shares: 10, avg_cost: 150.125 });
    }

    #[test]
    fn average_cost_is_share_weighted() {
        let cases = [
            (10, 100.0, 10, 200.0),
            (3, 10.0, 7, 20.0),
            (1, 33.33, 2, 66.67),
            (250, 12.5, 1, 1000.0),
        ];
        for (old_shares, old_avg, added, cost) in cases {
            let mut pm = PortfolioManager::new();
            pm.add("X", old_shares, old_avg).unwrap();
            let p = pm.add("X", added, cost).unwrap();

            let expected = (old_shares as f64 * old_avg + added as f64 * cost)
                / (old_shares + added) as f64;
            assert_eq!(p.shares, old_shares + added);
            assert_eq!(p.avg_cost, round2(expected));
        }
    }

    #[test]
    fn rejects_non_positive_shares_and_bad_cost() {
        let mut pm = PortfolioManager::new();
        assert_eq!(pm.add("X", 0, 1.0), Err(PortfolioError::NonPositiveShares(0)));
        assert_eq!(pm.add("X", -5, 1.0), Err(PortfolioError::NonPositiveShares(-5)));
        assert!(matches!(pm.add("X", 1, -1.0), Err(PortfolioError::InvalidCost(_))));
        assert!(matches!(pm.add("X", 1, f64::NAN), Err(PortfolioError::InvalidCost(_))));
        assert!(pm.is_empty());
    }

    #[test]
    fn rejects_share_count_overflow_and_keeps_position() {
        let mut pm = PortfolioManager::new();
        pm.add("X", i64::MAX, 1.0).unwrap();
        assert_eq!(
            pm.add("X", 1, 1.0),
            Err(PortfolioError::ShareOverflow {
                held: i64::MAX,
                added: 1
            })
        );
        assert_eq!(
            pm.position("X"),
            Some(&Position {
                shares: i64::MAX,
                avg_cost: 1.0
            })
        );
    }

    #[test]
    fn partial_remove_keeps_average_cost() {
        let mut pm = PortfolioManager::new();
        pm.add("MSFT", 10, 300.0).unwrap();
        let left = pm.remove("MSFT", Some(4)).unwrap();
        assert_eq!(left, Position { shares: 6, avg_cost: 300.0 });
    }

    #[test]
    fn removing_at_least_the_holding_clears_it() {
        for n in [Some(10), Some(11), Some(1_000), None] {
            let mut pm = PortfolioManager::new();
            pm.add("MSFT", 10, 300.0).unwrap();
            assert_eq!(pm.remove("MSFT", n), None);
            assert!(pm.position("MSFT").is_none());
        }
    }

    #[test]
    fn removing_unknown_symbol_is_a_no_op() {
        let mut pm = PortfolioManager::new();
        pm.add("MSFT", 1, 1.0).unwrap();
        assert_eq!(pm.remove("GOOG", Some(1)), None);
        assert_eq!(pm.positions().len(), 1);
    }

    #[test]
    fn valuation_skips_unpriced_symbols() {
        let mut pm = PortfolioManager::new();
        pm.add("AAPL", 10, 100.0).unwrap();
        pm.add("MSFT", 5, 200.0).unwrap();
        pm.add("DEAD", 100, 1.0).unwrap();

        let prices = HashMap::from([("AAPL".to_string(), 110.0), ("MSFT".to_string(), 180.0)]);
        let v = pm.valuation(&prices);
        assert_eq!(v.total_value, 2000.0);
        assert_eq!(v.total_cost, 2000.0);
        assert_eq!(v.total_gain_loss, 0.0);
        assert_eq!(v.total_gain_loss_percent, 0.0);

        let prices = HashMap::from([("AAPL".to_string(), 125.0)]);
        let v = pm.valuation(&prices);
        assert_eq!(v.total_value, 1250.0);
        assert_eq!(v.total_cost, 1000.0);
        assert_eq!(v.total_gain_loss, 250.0);
        assert_eq!(v.total_gain_loss_percent, 25.0);
    }

    #[test]
    fn empty_valuation_reports_zero_percent() {
        let v = PortfolioManager::new().valuation(&HashMap::new());
        assert_eq!(v.total_cost, 0.0);
        assert_eq!(v.total_gain_loss_percent, 0.0);
    }
}
