//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::sqlite_adapter::SqliteTradeStore;
use crate::domain::error::JournalError;
use crate::domain::journal::Journal;
use crate::domain::stats::{PairSummary, PortfolioStats};
use crate::domain::trade::{StatusKind, Trade, TradeDraft, TradeId, TradeUpdate, parse_timestamp};
use crate::logging::{self, LogSettings};
use crate::ports::config_port::ConfigPort;
use crate::ports::trade_store::TradeStore;

const DEFAULT_LISTEN: &str = "127.0.0.1:5000";

#[derive(Parser, Debug)]
#[command(name = "tradejournal", about = "Personal trading journal")]
pub struct Cli {
    /// Journal configuration file (INI)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Record a new open position
    Add {
        #[arg(long)]
        pair: String,
        /// long or short
        #[arg(long)]
        direction: String,
        #[arg(long)]
        entry_price: Decimal,
        #[arg(long)]
        quantity: Decimal,
        /// Entry date, YYYY-MM-DD or RFC 3339
        #[arg(long)]
        date: String,
        #[arg(long)]
        fees: Option<Decimal>,
        #[arg(long)]
        stop_loss: Option<Decimal>,
        #[arg(long)]
        take_profit: Option<Decimal>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Close an open position
    Close {
        id: TradeId,
        #[arg(long)]
        exit_price: Option<Decimal>,
        /// Defaults to now
        #[arg(long)]
        exit_date: Option<String>,
    },
    /// List trades
    List {
        /// open or closed
        #[arg(long)]
        status: Option<StatusKind>,
    },
    /// Show a single trade
    Show { id: TradeId },
    /// Edit fields of a trade
    Update {
        id: TradeId,
        #[arg(long)]
        pair: Option<String>,
        #[arg(long)]
        direction: Option<String>,
        #[arg(long)]
        entry_price: Option<Decimal>,
        #[arg(long)]
        quantity: Option<Decimal>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        fees: Option<Decimal>,
        #[arg(long, conflicts_with = "clear_stop_loss")]
        stop_loss: Option<Decimal>,
        #[arg(long, conflicts_with = "clear_take_profit")]
        take_profit: Option<Decimal>,
        /// Remove the stop loss
        #[arg(long)]
        clear_stop_loss: bool,
        /// Remove the take profit
        #[arg(long)]
        clear_take_profit: bool,
        /// Empty string clears the notes
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        exit_price: Option<Decimal>,
        #[arg(long)]
        exit_date: Option<String>,
    },
    /// Delete a trade
    Delete { id: TradeId },
    /// Show performance statistics
    Stats,
    /// Export trades to CSV
    Export {
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long)]
        status: Option<StatusKind>,
    },
    /// Start the HTTP API
    Serve {
        /// Overrides [web] listen
        #[arg(long)]
        listen: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let config_path = match cli.config {
        Some(p) => p,
        None => {
            eprintln!("error: --config is required");
            return ExitCode::from(2);
        }
    };

    let config = match load_config(&config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    logging::init(&LogSettings::from_config(&config));

    let store = match open_store(&config) {
        Ok(s) => s,
        Err(e) => return report(&e),
    };

    let result = match cli.command {
        Command::Serve { listen } => {
            let listen = listen
                .or_else(|| config.get_string("web", "listen"))
                .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
            run_serve(store, &listen)
        }
        command => {
            let journal = Journal::new(store);
            let stdout = io::stdout();
            execute(command, &journal, &mut stdout.lock())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

pub fn open_store(config: &dyn ConfigPort) -> Result<SqliteTradeStore, JournalError> {
    let store = SqliteTradeStore::from_config(config)?;
    store.initialize_schema()?;
    Ok(store)
}

fn report(err: &JournalError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(err)
}

/// Run one journal command, writing its output to `out`.
pub fn execute<S: TradeStore, W: Write>(
    command: Command,
    journal: &Journal<S>,
    out: &mut W,
) -> Result<(), JournalError> {
    match command {
        Command::Add {
            pair,
            direction,
            entry_price,
            quantity,
            date,
            fees,
            stop_loss,
            take_profit,
            notes,
        } => {
            let trade = journal.create(TradeDraft {
                date: Some(date),
                pair: Some(pair),
                direction: Some(direction),
                entry_price: Some(entry_price),
                quantity: Some(quantity),
                fees,
                stop_loss,
                take_profit,
                notes,
            })?;
            writeln!(out, "Added trade {}", trade.id)?;
            write_trade(out, &trade)?;
        }
        Command::Close {
            id,
            exit_price,
            exit_date,
        } => {
            let exit_date = exit_date
                .as_deref()
                .map(|d| parse_timestamp("exit_date", d))
                .transpose()?;
            let trade = journal.close(id, exit_price, exit_date)?;
            writeln!(out, "Closed trade {}", trade.id)?;
            write_trade(out, &trade)?;
        }
        Command::List { status } => {
            let trades = journal.list(status)?;
            if trades.is_empty() {
                writeln!(out, "No trades found")?;
            }
            for trade in &trades {
                write_row(out, trade)?;
            }
        }
        Command::Show { id } => {
            let trade = journal.get(id)?;
            write_trade(out, &trade)?;
        }
        Command::Update {
            id,
            pair,
            direction,
            entry_price,
            quantity,
            date,
            fees,
            stop_loss,
            take_profit,
            clear_stop_loss,
            clear_take_profit,
            notes,
            exit_price,
            exit_date,
        } => {
            let trade = journal.update(
                id,
                TradeUpdate {
                    date,
                    pair,
                    direction,
                    entry_price,
                    quantity,
                    fees,
                    stop_loss,
                    take_profit,
                    notes,
                    exit_price,
                    exit_date,
                    clear_stop_loss,
                    clear_take_profit,
                },
            )?;
            writeln!(out, "Updated trade {}", trade.id)?;
            write_trade(out, &trade)?;
        }
        Command::Delete { id } => {
            journal.delete(id)?;
            writeln!(out, "Deleted trade {id}")?;
        }
        Command::Stats => {
            let trades = journal.list(None)?;
            write_stats(
                out,
                &PortfolioStats::compute(&trades)?,
                &PairSummary::compute_per_pair(&trades)?,
            )?;
        }
        Command::Export { output, status } => {
            let trades = journal.list(status)?;
            csv_adapter::export_trades(&output, &trades)?;
            writeln!(out, "Exported {} trades to {}", trades.len(), output.display())?;
        }
        Command::Serve { .. } => {
            return Err(JournalError::validation(
                "command",
                "serve needs a shared store; start it through run()",
            ));
        }
    }
    Ok(())
}

/// Two decimal places, for display only.
pub fn fmt2(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}

fn fmt_opt(value: Option<Decimal>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".into())
}

fn write_row<W: Write>(out: &mut W, trade: &Trade) -> io::Result<()> {
    writeln!(
        out,
        "{:>5}  {}  {:<12} {:<5}  entry {:<12} qty {:<10} {:<6} {}",
        trade.id,
        trade.date.format("%Y-%m-%d"),
        trade.pair,
        trade.direction,
        trade.entry_price,
        trade.quantity,
        trade.status_kind(),
        trade
            .profit_loss()
            .map(|p| format!("P/L {}", fmt2(p)))
            .unwrap_or_default(),
    )
}

fn write_trade<W: Write>(out: &mut W, trade: &Trade) -> io::Result<()> {
    writeln!(out, "  id:           {}", trade.id)?;
    writeln!(out, "  date:         {}", trade.date.to_rfc3339())?;
    writeln!(out, "  pair:         {}", trade.pair)?;
    writeln!(out, "  direction:    {}", trade.direction)?;
    writeln!(out, "  entry price:  {}", trade.entry_price)?;
    writeln!(out, "  quantity:     {}", trade.quantity)?;
    writeln!(out, "  fees:         {}", trade.fees)?;
    writeln!(out, "  stop loss:    {}", fmt_opt(trade.stop_loss))?;
    writeln!(out, "  take profit:  {}", fmt_opt(trade.take_profit))?;
    writeln!(out, "  status:       {}", trade.status_kind())?;
    if let (Some(exit_price), Some(exit_date), Some(pnl)) =
        (trade.exit_price(), trade.exit_date(), trade.profit_loss())
    {
        writeln!(out, "  exit price:   {exit_price}")?;
        writeln!(out, "  exit date:    {}", exit_date.to_rfc3339())?;
        writeln!(out, "  profit/loss:  {}", fmt2(pnl))?;
    }
    if let Some(notes) = &trade.notes {
        writeln!(out, "  notes:        {notes}")?;
    }
    Ok(())
}

fn write_stats<W: Write>(
    out: &mut W,
    stats: &PortfolioStats,
    pairs: &[PairSummary],
) -> io::Result<()> {
    writeln!(out, "=== Performance ===")?;
    writeln!(out, "Net Profit:          {}", fmt2(stats.net_profit))?;
    writeln!(out, "Total Trades:        {}", stats.total_trades)?;
    writeln!(out, "Open Trades:         {}", stats.open_trades)?;
    writeln!(out, "Total Closed Trades: {}", stats.total_closed_trades)?;
    writeln!(out, "Percent Profitable:  {}%", fmt2(stats.win_rate))?;
    writeln!(out, "Gross Profits:       {}", fmt2(stats.gross_profits))?;
    writeln!(out, "Gross Losses:        {}", fmt2(stats.gross_losses))?;
    writeln!(out, "Profit Factor:       {}", fmt2(stats.profit_factor))?;
    writeln!(out, "Average Win:         {}", fmt2(stats.avg_win))?;
    writeln!(out, "Average Loss:        {}", fmt2(stats.avg_loss))?;
    writeln!(out, "Largest Win:         {}", fmt2(stats.largest_win))?;
    writeln!(out, "Largest Loss:        {}", fmt2(stats.largest_loss))?;

    if !pairs.is_empty() {
        writeln!(out, "\n=== Per-Pair Summary ===")?;
        for p in pairs {
            let sign = if p.net_profit >= Decimal::ZERO { "+" } else { "" };
            writeln!(
                out,
                "  {}:  {} trades, {}% win rate, {}{}",
                p.pair,
                p.closed_trades,
                fmt2(p.win_rate),
                sign,
                fmt2(p.net_profit),
            )?;
        }
    }

    if !stats.time_series.is_empty() {
        writeln!(out, "\n=== Profit/Loss Over Time ===")?;
        for point in &stats.time_series {
            writeln!(
                out,
                "  {}  {}",
                point.date.format("%Y-%m-%d"),
                fmt2(point.profit_loss)
            )?;
        }
    }
    Ok(())
}

#[cfg(feature = "web")]
fn run_serve(store: SqliteTradeStore, listen: &str) -> Result<(), JournalError> {
    use crate::adapters::web::{AppState, build_router};
    use std::net::SocketAddr;
    use std::sync::Arc;

    let addr: SocketAddr = listen.parse().map_err(|_| JournalError::ConfigInvalid {
        section: "web".into(),
        key: "listen".into(),
        reason: format!("'{listen}' is not a socket address"),
    })?;

    let router = build_router(AppState::new(Arc::new(store)));

    tracing::info!(%addr, "starting web server");
    tokio::runtime::Runtime::new()?.block_on(async {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).await
    })?;
    Ok(())
}

#[cfg(not(feature = "web"))]
fn run_serve(_store: SqliteTradeStore, _listen: &str) -> Result<(), JournalError> {
    Err(JournalError::ConfigInvalid {
        section: "web".into(),
        key: "listen".into(),
        reason: "web feature is required for serve".into(),
    })
}
