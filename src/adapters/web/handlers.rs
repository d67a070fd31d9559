//! HTTP request handlers for the web adapter.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::stats::{PairSummary, PortfolioStats};
use crate::domain::trade::{
    Direction, StatusKind, Trade, TradeDraft, TradeId, TradeUpdate, parse_timestamp,
};

use super::{AppState, WebError};

/// Wire shape of a trade.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeJson {
    pub id: TradeId,
    pub date: DateTime<Utc>,
    pub pair: String,
    pub direction: Direction,
    pub entry_price: Decimal,
    pub exit_price: Option<Decimal>,
    pub quantity: Decimal,
    pub fees: Decimal,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub notes: Option<String>,
    pub status: StatusKind,
    pub exit_date: Option<DateTime<Utc>>,
    pub profit_loss: Option<Decimal>,
}

impl From<&Trade> for TradeJson {
    fn from(trade: &Trade) -> Self {
        TradeJson {
            id: trade.id,
            date: trade.date,
            pair: trade.pair.clone(),
            direction: trade.direction,
            entry_price: trade.entry_price,
            exit_price: trade.exit_price(),
            quantity: trade.quantity,
            fees: trade.fees,
            stop_loss: trade.stop_loss,
            take_profit: trade.take_profit,
            notes: trade.notes.clone(),
            status: trade.status_kind(),
            exit_date: trade.exit_date(),
            profit_loss: trade.profit_loss(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PnlPointJson {
    pub date: DateTime<Utc>,
    pub profit_loss: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairSummaryJson {
    pub pair: String,
    pub closed_trades: usize,
    pub winning_trades: usize,
    pub win_rate: Decimal,
    pub net_profit: Decimal,
}

/// Dashboard figures at full precision.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsJson {
    pub total_trades: usize,
    pub total_closed_trades: usize,
    pub open_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub breakeven_trades: usize,
    pub net_profit: Decimal,
    pub win_rate: Decimal,
    pub percent_profitable: Decimal,
    pub gross_profits: Decimal,
    pub gross_losses: Decimal,
    pub profit_factor: Decimal,
    pub avg_win: Decimal,
    pub avg_loss: Decimal,
    pub largest_win: Decimal,
    pub largest_loss: Decimal,
    pub time_series: Vec<PnlPointJson>,
    pub pairs: Vec<PairSummaryJson>,
}

impl StatsJson {
    fn build(stats: PortfolioStats, pairs: Vec<PairSummary>) -> Self {
        StatsJson {
            total_trades: stats.total_trades,
            total_closed_trades: stats.total_closed_trades,
            open_trades: stats.open_trades,
            winning_trades: stats.winning_trades,
            losing_trades: stats.losing_trades,
            breakeven_trades: stats.breakeven_trades,
            net_profit: stats.net_profit,
            win_rate: stats.win_rate,
            percent_profitable: stats.win_rate,
            gross_profits: stats.gross_profits,
            gross_losses: stats.gross_losses,
            profit_factor: stats.profit_factor,
            avg_win: stats.avg_win,
            avg_loss: stats.avg_loss,
            largest_win: stats.largest_win,
            largest_loss: stats.largest_loss,
            time_series: stats
                .time_series
                .into_iter()
                .map(|p| PnlPointJson {
                    date: p.date,
                    profit_loss: p.profit_loss,
                })
                .collect(),
            pairs: pairs
                .into_iter()
                .map(|p| PairSummaryJson {
                    pair: p.pair,
                    closed_trades: p.closed_trades,
                    winning_trades: p.winning_trades,
                    win_rate: p.win_rate,
                    net_profit: p.net_profit,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageJson {
    pub message: String,
}

fn message(text: impl Into<String>) -> Json<MessageJson> {
    Json(MessageJson {
        message: text.into(),
    })
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseRequest {
    pub exit_price: Option<Decimal>,
    pub exit_date: Option<String>,
}

fn parse_id(raw: &str) -> Result<TradeId, WebError> {
    raw.parse::<TradeId>().map_err(WebError::from)
}

pub async fn welcome() -> Json<MessageJson> {
    message("Welcome to the Trading Journal API")
}

pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<MessageJson>, WebError> {
    state.journal.store().ping()?;
    Ok(message("Database connection successful!"))
}

pub async fn list_trades(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<TradeJson>>, WebError> {
    let Query(query) = query?;
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(str::parse::<StatusKind>)
        .transpose()?;

    let trades = state.journal.list(status)?;
    Ok(Json(trades.iter().map(TradeJson::from).collect()))
}

pub async fn create_trade(
    State(state): State<Arc<AppState>>,
    body: Result<Json<TradeDraft>, JsonRejection>,
) -> Result<Response, WebError> {
    let Json(draft) = body?;
    let trade = state.journal.create(draft)?;
    Ok((StatusCode::CREATED, Json(TradeJson::from(&trade))).into_response())
}

pub async fn get_trade(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TradeJson>, WebError> {
    let trade = state.journal.get(parse_id(&id)?)?;
    Ok(Json(TradeJson::from(&trade)))
}

pub async fn update_trade(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<TradeUpdate>, JsonRejection>,
) -> Result<Json<TradeJson>, WebError> {
    let id = parse_id(&id)?;
    let Json(update) = body?;
    let trade = state.journal.update(id, update)?;
    Ok(Json(TradeJson::from(&trade)))
}

pub async fn delete_trade(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageJson>, WebError> {
    state.journal.delete(parse_id(&id)?)?;
    Ok(message("Trade deleted successfully"))
}

pub async fn close_trade(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<CloseRequest>, JsonRejection>,
) -> Result<Json<TradeJson>, WebError> {
    let id = parse_id(&id)?;
    let Json(request) = body?;
    let exit_date = request
        .exit_date
        .as_deref()
        .map(|d| parse_timestamp("exit_date", d))
        .transpose()?;

    let trade = state.journal.close(id, request.exit_price, exit_date)?;
    Ok(Json(TradeJson::from(&trade)))
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<StatsJson>, WebError> {
    let trades = state.journal.list(None)?;
    let stats = PortfolioStats::compute(&trades)?;
    let pairs = PairSummary::compute_per_pair(&trades)?;
    Ok(Json(StatsJson::build(stats, pairs)))
}

pub async fn not_found() -> WebError {
    WebError::not_found("Route not found")
}
