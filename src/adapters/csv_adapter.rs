//! CSV export of journal trades.

use crate::domain::error::JournalError;
use crate::domain::trade::Trade;
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub const HEADER: [&str; 14] = [
    "id",
    "date",
    "pair",
    "direction",
    "entry_price",
    "exit_price",
    "quantity",
    "fees",
    "stop_loss",
    "take_profit",
    "status",
    "exit_date",
    "profit_loss",
    "notes",
];

/// Write trades as CSV to any writer. Absent optional fields become empty cells.
pub fn write_trades<W: Write>(writer: W, trades: &[Trade]) -> Result<(), JournalError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER).map_err(csv_err)?;

    for trade in trades {
        let record = [
            trade.id.to_string(),
            trade.date.to_rfc3339(),
            trade.pair.clone(),
            trade.direction.to_string(),
            trade.entry_price.to_string(),
            opt(trade.exit_price()),
            trade.quantity.to_string(),
            trade.fees.to_string(),
            opt(trade.stop_loss),
            opt(trade.take_profit),
            trade.status_kind().to_string(),
            trade
                .exit_date()
                .map(|d| d.to_rfc3339())
                .unwrap_or_default(),
            opt(trade.profit_loss()),
            trade.notes.clone().unwrap_or_default(),
        ];
        wtr.write_record(&record).map_err(csv_err)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn export_trades(path: &Path, trades: &[Trade]) -> Result<(), JournalError> {
    let file = File::create(path)?;
    write_trades(file, trades)?;
    tracing::info!(path = %path.display(), count = trades.len(), "trades exported");
    Ok(())
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn csv_err(e: csv::Error) -> JournalError {
    JournalError::Csv {
        reason: e.to_string(),
    }
}
