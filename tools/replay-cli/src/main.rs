//! Operator CLI for `.snap` captures: inspect files and replay them
//! through the execution simulator with a smoke agent.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use exec_sim::{Ledger, LimitOrderRequest, Side, Simulator, SimulatorParams};
use l2_snap::{SnapReader, PRICE_SCALE};
use tracing::info;

#[derive(Parser)]
#[command(name = "replay-cli", about = "Inspect and replay L2 snapshot captures")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the file header and the first few records.
    Inspect {
        /// Path to a .snap capture.
        file: PathBuf,

        /// Number of records to print.
        #[arg(long, default_value_t = 3)]
        head: u64,
    },

    /// Replay a capture through the simulator.
    Replay {
        /// Path to a .snap capture.
        file: PathBuf,

        /// JSON file with SimulatorParams; defaults otherwise.
        #[arg(long)]
        params: Option<PathBuf>,

        /// Initial cash, fixed-point quote units.
        #[arg(long, default_value_t = 1_000_000 * PRICE_SCALE)]
        cash_q: i64,

        /// Initial position, fixed-point base units.
        #[arg(long, default_value_t = 0)]
        position_q: i64,

        /// Smoke agent: join the best bid with this quantity (fixed
        /// point) once the book has a top. 0 disables the agent.
        #[arg(long, default_value_t = 0)]
        join_qty_q: i64,

        /// Stop after this many records (0 = all).
        #[arg(long, default_value_t = 0)]
        limit: u64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Command::Inspect { file, head } => inspect(file, head),
        Command::Replay { file, params, cash_q, position_q, join_qty_q, limit } => {
            replay(file, params, cash_q, position_q, join_qty_q, limit)
        }
    }
}

fn inspect(file: PathBuf, head: u64) -> Result<()> {
    let mut reader =
        SnapReader::open(&file).with_context(|| format!("opening {}", file.display()))?;
    let h = reader.header();
    println!("magic        {:#010x}", h.magic);
    println!("version      {}", h.version);
    println!("depth        {}", h.depth);
    println!("record_size  {}", h.record_size);
    println!("price_scale  {}", h.price_scale);
    println!("qty_scale    {}", h.qty_scale);
    println!("records      {}", reader.record_count());

    let mut shown = 0u64;
    while shown < head {
        let Some(rec) = reader.next_record()? else { break };
        println!(
            "[{shown}] ts_recv_ns={} ts_event_ms={} best_bid={}/{} best_ask={}/{}",
            rec.ts_recv_ns,
            rec.ts_event_ms,
            rec.bids[0].price_q,
            rec.bids[0].qty_q,
            rec.asks[0].price_q,
            rec.asks[0].qty_q,
        );
        shown += 1;
    }
    Ok(())
}

fn load_params(path: Option<PathBuf>) -> Result<SimulatorParams> {
    match path {
        None => Ok(SimulatorParams::default()),
        Some(p) => {
            let text =
                fs::read_to_string(&p).with_context(|| format!("reading {}", p.display()))?;
            let params: SimulatorParams =
                serde_json::from_str(&text).with_context(|| format!("parsing {}", p.display()))?;
            Ok(params)
        }
    }
}

fn replay(
    file: PathBuf,
    params: Option<PathBuf>,
    cash_q: i64,
    position_q: i64,
    join_qty_q: i64,
    limit: u64,
) -> Result<()> {
    let params = load_params(params)?;
    let mut reader =
        SnapReader::open(&file).with_context(|| format!("opening {}", file.display()))?;
    info!(records = reader.record_count(), "replaying capture");

    let mut sim = Simulator::new(params).map_err(|e| anyhow::anyhow!("invalid params: {e}"))?;
    sim.reset(0, Ledger::new(cash_q, position_q));

    let mut joined = false;
    let mut processed = 0u64;
    while let Some(rec) = reader.next_record()? {
        sim.step(&rec);

        if !joined && join_qty_q > 0 && rec.has_top_of_book() {
            let id = sim.place_limit(&LimitOrderRequest::new(
                Side::Buy,
                rec.best_bid_price_q(),
                join_qty_q,
            ));
            info!(order_id = id, price_q = rec.best_bid_price_q(), "joined best bid");
            joined = true;
        }

        processed += 1;
        if limit != 0 && processed >= limit {
            break;
        }
    }

    let ledger = sim.ledger();
    println!("records processed  {processed}");
    println!("orders             {}", sim.orders().len());
    println!("events             {}", sim.events().len());
    println!("fills              {}", sim.fills().len());
    println!("cash_q             {}", ledger.cash_q);
    println!("position_qty_q     {}", ledger.position_qty_q);
    println!("locked_cash_q      {}", ledger.locked_cash_q);
    println!("locked_position_q  {}", ledger.locked_position_qty_q);
    Ok(())
}
