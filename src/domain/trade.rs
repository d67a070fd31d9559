//! Trade records and their open → closed lifecycle.
//!
//! A [`Trade`] carries its exit data inside [`TradeStatus::Closed`], so a
//! closed trade always has an exit price, an exit date and a profit/loss,
//! and an open trade has none of them. Profit/loss is never set by callers;
//! it is derived by [`Trade::compute_profit_loss`] on every path that
//! touches the exit leg.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::JournalError;

/// Storage-assigned trade identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TradeId(pub i64);

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TradeId {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(TradeId)
            .map_err(|_| JournalError::validation("id", format!("'{s}' is not a trade id")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "long" | "buy" => Ok(Direction::Long),
            "short" | "sell" => Ok(Direction::Short),
            other => Err(JournalError::validation(
                "direction",
                format!("'{other}' is not one of long, short"),
            )),
        }
    }
}

/// Lifecycle state without the exit payload; used for filtering and storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Open,
    Closed,
}

impl StatusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusKind::Open => "open",
            StatusKind::Closed => "closed",
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusKind {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(StatusKind::Open),
            "closed" => Ok(StatusKind::Closed),
            other => Err(JournalError::validation(
                "status",
                format!("'{other}' is not one of open, closed"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosedLeg {
    pub exit_price: Decimal,
    pub exit_date: DateTime<Utc>,
    pub profit_loss: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TradeStatus {
    Open,
    Closed(ClosedLeg),
}

impl TradeStatus {
    pub fn kind(&self) -> StatusKind {
        match self {
            TradeStatus::Open => StatusKind::Open,
            TradeStatus::Closed(_) => StatusKind::Closed,
        }
    }
}

/// Realized profit/loss of a position: price move in the trade's favour
/// times size, minus total fees. `None` if the result does not fit in a
/// `Decimal`.
pub fn profit_loss(
    direction: Direction,
    entry_price: Decimal,
    exit_price: Decimal,
    quantity: Decimal,
    fees: Decimal,
) -> Option<Decimal> {
    let diff = match direction {
        Direction::Long => exit_price.checked_sub(entry_price)?,
        Direction::Short => entry_price.checked_sub(exit_price)?,
    };
    diff.checked_mul(quantity)?.checked_sub(fees)
}

/// Validated input for a new trade.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrade {
    pub date: DateTime<Utc>,
    pub pair: String,
    pub direction: Direction,
    pub entry_price: Decimal,
    pub quantity: Decimal,
    pub fees: Decimal,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub id: TradeId,
    pub date: DateTime<Utc>,
    pub pair: String,
    pub direction: Direction,
    pub entry_price: Decimal,
    pub quantity: Decimal,
    pub fees: Decimal,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub notes: Option<String>,
    status: TradeStatus,
}

impl Trade {
    pub fn open(id: TradeId, new: NewTrade) -> Self {
        Trade {
            id,
            date: new.date,
            pair: new.pair,
            direction: new.direction,
            entry_price: new.entry_price,
            quantity: new.quantity,
            fees: new.fees,
            stop_loss: new.stop_loss,
            take_profit: new.take_profit,
            notes: new.notes,
            status: TradeStatus::Open,
        }
    }

    /// Rebuild a trade from stored fields. Profit/loss is recomputed rather
    /// than trusted from storage.
    pub fn restore(
        id: TradeId,
        new: NewTrade,
        exit: Option<(Decimal, DateTime<Utc>)>,
    ) -> Result<Self, JournalError> {
        let mut trade = Trade::open(id, new);
        if let Some((exit_price, exit_date)) = exit {
            let profit_loss = trade.realized(exit_price, "profit_loss")?;
            trade.status = TradeStatus::Closed(ClosedLeg {
                exit_price,
                exit_date,
                profit_loss,
            });
        }
        Ok(trade)
    }

    pub fn status(&self) -> &TradeStatus {
        &self.status
    }

    pub fn status_kind(&self) -> StatusKind {
        self.status.kind()
    }

    pub fn is_open(&self) -> bool {
        matches!(self.status, TradeStatus::Open)
    }

    pub fn is_closed(&self) -> bool {
        !self.is_open()
    }

    pub fn exit_price(&self) -> Option<Decimal> {
        self.closed_leg().map(|leg| leg.exit_price)
    }

    pub fn exit_date(&self) -> Option<DateTime<Utc>> {
        self.closed_leg().map(|leg| leg.exit_date)
    }

    pub fn profit_loss(&self) -> Option<Decimal> {
        self.closed_leg().map(|leg| leg.profit_loss)
    }

    fn closed_leg(&self) -> Option<&ClosedLeg> {
        match &self.status {
            TradeStatus::Open => None,
            TradeStatus::Closed(leg) => Some(leg),
        }
    }

    fn realized(&self, exit_price: Decimal, field: &str) -> Result<Decimal, JournalError> {
        profit_loss(
            self.direction,
            self.entry_price,
            exit_price,
            self.quantity,
            self.fees,
        )
        .ok_or_else(|| JournalError::out_of_range(field))
    }

    /// Re-derive profit/loss from the current fields. No-op on open trades.
    ///
    /// Leaves the trade untouched if the result is out of range.
    pub fn compute_profit_loss(&mut self) -> Result<(), JournalError> {
        let pnl = match &self.status {
            TradeStatus::Open => return Ok(()),
            TradeStatus::Closed(leg) => self.realized(leg.exit_price, "profit_loss")?,
        };
        if let TradeStatus::Closed(leg) = &mut self.status {
            leg.profit_loss = pnl;
        }
        Ok(())
    }

    /// Close the position. `exit_date` defaults to the current time.
    ///
    /// Rejected without touching the trade when it is already closed, the
    /// exit price is not positive or the resulting profit/loss is out of range.
    pub fn close(
        &mut self,
        exit_price: Decimal,
        exit_date: Option<DateTime<Utc>>,
    ) -> Result<(), JournalError> {
        if self.is_closed() {
            return Err(JournalError::already_closed(self.id));
        }
        require_positive("exit_price", exit_price)?;
        let profit_loss = self.realized(exit_price, "exit_price")?;

        self.status = TradeStatus::Closed(ClosedLeg {
            exit_price,
            exit_date: exit_date.unwrap_or_else(Utc::now),
            profit_loss,
        });
        Ok(())
    }

    /// Apply a partial edit. All fields are validated, and profit/loss
    /// re-derived, before any is written.
    pub fn apply(&mut self, update: TradeUpdate) -> Result<(), JournalError> {
        let touches_exit = update.touches_exit();
        let checked = update.check()?;

        if self.is_open() && touches_exit {
            return Err(JournalError::InvalidStateTransition {
                id: self.id,
                reason: "exit fields can only change on a closed trade; close it first".into(),
            });
        }

        let mut next = self.clone();
        if let Some(pair) = checked.pair {
            next.pair = pair;
        }
        if let Some(direction) = checked.direction {
            next.direction = direction;
        }
        if let Some(date) = checked.date {
            next.date = date;
        }
        if let Some(entry_price) = checked.entry_price {
            next.entry_price = entry_price;
        }
        if let Some(quantity) = checked.quantity {
            next.quantity = quantity;
        }
        if let Some(fees) = checked.fees {
            next.fees = fees;
        }
        if let Some(stop_loss) = checked.stop_loss {
            next.stop_loss = stop_loss;
        }
        if let Some(take_profit) = checked.take_profit {
            next.take_profit = take_profit;
        }
        if let Some(notes) = checked.notes {
            next.notes = notes;
        }
        if let TradeStatus::Closed(leg) = &mut next.status {
            if let Some(exit_price) = checked.exit_price {
                leg.exit_price = exit_price;
            }
            if let Some(exit_date) = checked.exit_date {
                leg.exit_date = exit_date;
            }
        }

        next.compute_profit_loss()?;
        *self = next;
        Ok(())
    }
}

/// Unvalidated create request, as it arrives from a form, CLI or JSON body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeDraft {
    pub date: Option<String>,
    pub pair: Option<String>,
    #[serde(alias = "type")]
    pub direction: Option<String>,
    pub entry_price: Option<Decimal>,
    pub quantity: Option<Decimal>,
    pub fees: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub notes: Option<String>,
}

impl TradeDraft {
    pub fn validate(self) -> Result<NewTrade, JournalError> {
        let pair = required_text("pair", self.pair)?;
        let direction: Direction = required_text("direction", self.direction)?.parse()?;
        let entry_price = self
            .entry_price
            .ok_or_else(|| JournalError::missing("entry_price"))?;
        require_positive("entry_price", entry_price)?;
        let quantity = self
            .quantity
            .ok_or_else(|| JournalError::missing("quantity"))?;
        require_positive("quantity", quantity)?;
        let date = parse_timestamp("date", &required_text("date", self.date)?)?;

        let fees = self.fees.unwrap_or(Decimal::ZERO);
        if fees < Decimal::ZERO {
            return Err(JournalError::validation("fees", "must not be negative"));
        }
        if let Some(stop_loss) = self.stop_loss {
            require_positive("stop_loss", stop_loss)?;
        }
        if let Some(take_profit) = self.take_profit {
            require_positive("take_profit", take_profit)?;
        }

        Ok(NewTrade {
            date,
            pair,
            direction,
            entry_price,
            quantity,
            fees,
            stop_loss: self.stop_loss,
            take_profit: self.take_profit,
            notes: normalize_notes(self.notes),
        })
    }
}

/// Partial edit of an existing trade. `None` leaves a field unchanged; an
/// empty `notes` string clears the notes, and the `clear_*` flags remove a
/// stop loss or take profit.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeUpdate {
    pub date: Option<String>,
    pub pair: Option<String>,
    #[serde(alias = "type")]
    pub direction: Option<String>,
    pub entry_price: Option<Decimal>,
    pub quantity: Option<Decimal>,
    pub fees: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub notes: Option<String>,
    pub exit_price: Option<Decimal>,
    pub exit_date: Option<String>,
    #[serde(default)]
    pub clear_stop_loss: bool,
    #[serde(default)]
    pub clear_take_profit: bool,
}

impl TradeUpdate {
    pub fn touches_exit(&self) -> bool {
        self.exit_price.is_some() || self.exit_date.is_some()
    }

    fn check(self) -> Result<CheckedUpdate, JournalError> {
        let pair = match self.pair {
            Some(p) => Some(required_text("pair", Some(p))?),
            None => None,
        };
        let direction = self.direction.as_deref().map(str::parse).transpose()?;
        let date = self
            .date
            .as_deref()
            .map(|d| parse_timestamp("date", d))
            .transpose()?;
        let exit_date = self
            .exit_date
            .as_deref()
            .map(|d| parse_timestamp("exit_date", d))
            .transpose()?;

        for (field, value) in [
            ("entry_price", self.entry_price),
            ("quantity", self.quantity),
            ("exit_price", self.exit_price),
        ] {
            if let Some(v) = value {
                require_positive(field, v)?;
            }
        }
        if let Some(fees) = self.fees {
            if fees < Decimal::ZERO {
                return Err(JournalError::validation("fees", "must not be negative"));
            }
        }

        let stop_loss = optional_level("stop_loss", self.stop_loss, self.clear_stop_loss)?;
        let take_profit =
            optional_level("take_profit", self.take_profit, self.clear_take_profit)?;

        Ok(CheckedUpdate {
            date,
            pair,
            direction,
            entry_price: self.entry_price,
            quantity: self.quantity,
            fees: self.fees,
            stop_loss,
            take_profit,
            notes: self.notes.map(|n| normalize_notes(Some(n))),
            exit_price: self.exit_price,
            exit_date,
        })
    }
}

struct CheckedUpdate {
    date: Option<DateTime<Utc>>,
    pair: Option<String>,
    direction: Option<Direction>,
    entry_price: Option<Decimal>,
    quantity: Option<Decimal>,
    fees: Option<Decimal>,
    stop_loss: Option<Option<Decimal>>,
    take_profit: Option<Option<Decimal>>,
    notes: Option<Option<String>>,
    exit_price: Option<Decimal>,
    exit_date: Option<DateTime<Utc>>,
}

/// Parse an RFC 3339 timestamp or a plain `YYYY-MM-DD` date (midnight UTC).
pub fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, JournalError> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| {
            JournalError::validation(
                field,
                format!("'{value}' is not a date (expected YYYY-MM-DD or RFC 3339)"),
            )
        })
}

fn required_text(field: &str, value: Option<String>) -> Result<String, JournalError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(JournalError::missing(field)),
    }
}

fn require_positive(field: &str, value: Decimal) -> Result<(), JournalError> {
    if value > Decimal::ZERO {
        Ok(())
    } else {
        Err(JournalError::validation(field, "must be greater than zero"))
    }
}

/// Resolve a set-or-clear pair for an optional price level.
fn optional_level(
    field: &str,
    value: Option<Decimal>,
    clear: bool,
) -> Result<Option<Option<Decimal>>, JournalError> {
    match (value, clear) {
        (Some(_), true) => Err(JournalError::validation(
            field,
            "cannot set and clear in the same edit",
        )),
        (Some(v), false) => {
            require_positive(field, v)?;
            Ok(Some(Some(v)))
        }
        (None, true) => Ok(Some(None)),
        (None, false) => Ok(None),
    }
}

fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}
