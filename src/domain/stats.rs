//! Portfolio statistics over a set of journal trades.
//!
//! Figures are recomputed from the full slice on every call. Ratios are
//! returned at full precision; rounding is left to presentation code.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::error::JournalError;
use super::trade::{Trade, TradeStatus};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// One bar of the profit/loss chart: a closed trade's entry date and result.
#[derive(Debug, Clone, PartialEq)]
pub struct PnlPoint {
    pub date: DateTime<Utc>,
    pub profit_loss: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioStats {
    /// Every trade passed in, open and closed.
    pub total_trades: usize,
    /// Closed trades only; the denominator of `win_rate`.
    pub total_closed_trades: usize,
    pub open_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub breakeven_trades: usize,
    pub net_profit: Decimal,
    /// Percent of closed trades with positive P/L, on a 0-100 scale.
    pub win_rate: Decimal,
    pub gross_profits: Decimal,
    /// Absolute value of the summed losing P/L.
    pub gross_losses: Decimal,
    pub profit_factor: Decimal,
    pub avg_win: Decimal,
    pub avg_loss: Decimal,
    pub largest_win: Decimal,
    pub largest_loss: Decimal,
    pub time_series: Vec<PnlPoint>,
}

impl PortfolioStats {
    /// Aggregate `trades`. Fails only when a sum or ratio does not fit in a
    /// `Decimal`.
    pub fn compute(trades: &[Trade]) -> Result<Self, JournalError> {
        let mut total_closed_trades = 0usize;
        let mut winning_trades = 0usize;
        let mut losing_trades = 0usize;
        let mut breakeven_trades = 0usize;
        let mut net_profit = Decimal::ZERO;
        let mut gross_profits = Decimal::ZERO;
        let mut losses_sum = Decimal::ZERO;
        let mut largest_win = Decimal::ZERO;
        let mut largest_loss = Decimal::ZERO;
        let mut time_series = Vec::new();

        for trade in trades {
            let pnl = match trade.status() {
                TradeStatus::Open => continue,
                TradeStatus::Closed(leg) => leg.profit_loss,
            };
            total_closed_trades += 1;
            net_profit = add("net_profit", net_profit, pnl)?;

            if pnl > Decimal::ZERO {
                winning_trades += 1;
                gross_profits = add("gross_profits", gross_profits, pnl)?;
                largest_win = largest_win.max(pnl);
            } else if pnl < Decimal::ZERO {
                losing_trades += 1;
                losses_sum = add("gross_losses", losses_sum, pnl)?;
                largest_loss = largest_loss.max(pnl.abs());
            } else {
                breakeven_trades += 1;
            }

            time_series.push(PnlPoint {
                date: trade.date,
                profit_loss: pnl,
            });
        }

        let gross_losses = losses_sum.abs();

        Ok(PortfolioStats {
            total_trades: trades.len(),
            total_closed_trades,
            open_trades: trades.len() - total_closed_trades,
            winning_trades,
            losing_trades,
            breakeven_trades,
            net_profit,
            win_rate: percentage(winning_trades, total_closed_trades),
            gross_profits,
            gross_losses,
            profit_factor: ratio("profit_factor", gross_profits, gross_losses)?,
            avg_win: ratio("avg_win", gross_profits, Decimal::from(winning_trades))?,
            avg_loss: ratio("avg_loss", gross_losses, Decimal::from(losing_trades))?,
            largest_win,
            largest_loss,
            time_series,
        })
    }
}

/// Closed-trade breakdown for a single instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct PairSummary {
    pub pair: String,
    pub closed_trades: usize,
    pub winning_trades: usize,
    pub win_rate: Decimal,
    pub net_profit: Decimal,
}

impl PairSummary {
    /// Per-pair summaries of closed trades, ordered by pair.
    pub fn compute_per_pair(trades: &[Trade]) -> Result<Vec<PairSummary>, JournalError> {
        let mut by_pair: BTreeMap<&str, (usize, usize, Decimal)> = BTreeMap::new();

        for trade in trades {
            let Some(pnl) = trade.profit_loss() else {
                continue;
            };
            let entry = by_pair
                .entry(trade.pair.as_str())
                .or_insert((0, 0, Decimal::ZERO));
            entry.0 += 1;
            if pnl > Decimal::ZERO {
                entry.1 += 1;
            }
            entry.2 = add("net_profit", entry.2, pnl)?;
        }

        Ok(by_pair
            .into_iter()
            .map(|(pair, (closed, won, net))| PairSummary {
                pair: pair.to_string(),
                closed_trades: closed,
                winning_trades: won,
                win_rate: percentage(won, closed),
                net_profit: net,
            })
            .collect())
    }
}

fn add(field: &str, acc: Decimal, value: Decimal) -> Result<Decimal, JournalError> {
    acc.checked_add(value)
        .ok_or_else(|| JournalError::out_of_range(field))
}

fn percentage(part: usize, whole: usize) -> Decimal {
    if whole == 0 {
        return Decimal::ZERO;
    }
    Decimal::from(part) * HUNDRED / Decimal::from(whole)
}

fn ratio(field: &str, numerator: Decimal, denominator: Decimal) -> Result<Decimal, JournalError> {
    if denominator.is_zero() {
        return Ok(Decimal::ZERO);
    }
    numerator
        .checked_div(denominator)
        .ok_or_else(|| JournalError::out_of_range(field))
}
