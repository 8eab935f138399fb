#[cfg(feature = "mimalloc-global")]
#[global_allocator]
static GLOBAL_ALLOCATOR: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use band_life::bandlife::{BandLife, BandLifeConfig, SnapshotSchedule, WorkerTiming};
use band_life::board::{self, Board, BoardAssembler, Render};
use band_life::error::{LifeError, Result};
use band_life::seqlife::SeqLife;
use clap::Parser;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILE: &str = "inputFile";
const DEFAULT_GENS: u64 = 100;
const DEFAULT_ROWS: usize = 100;
const DEFAULT_COLS: usize = 100;
const MAX_LIST_LEN: usize = 100;

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum EngineKind {
    /// Row bands on parallel workers with halo exchange.
    Band,
    /// Whole board on one thread.
    Seq,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Initial board: digits in row-major order, other bytes ignored
    #[arg(long, default_value = DEFAULT_FILE)]
    filename: PathBuf,

    /// Last generation index; generations 0..=gens each run one step
    #[arg(long, default_value_t = DEFAULT_GENS)]
    gens: u64,

    #[arg(long, default_value_t = DEFAULT_ROWS)]
    rows: usize,

    #[arg(long, default_value_t = DEFAULT_COLS)]
    cols: usize,

    /// Generations at which to print the board
    #[arg(long, num_args = 1..)]
    list: Vec<u64>,

    /// Draw live cells with a marker character instead of digits
    #[arg(long, num_args = 0..=1, default_missing_value = "x")]
    marker: Option<char>,

    /// Number of workers (1 or even); defaults to the physical core count
    #[arg(long)]
    workers: Option<usize>,

    #[arg(long)]
    max_workers: Option<usize>,

    #[arg(long, value_enum, default_value = "band")]
    engine: EngineKind,

    /// Also run the other engine and compare final boards
    #[arg(long)]
    check: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_board(generation: u64, board: &Board, style: Render) {
    println!("gen: {generation}");
    print!("{}", board.render(style));
}

fn print_timings(timings: &[WorkerTiming]) {
    for t in timings {
        println!("Processor {}: {:.6} seconds", t.rank, t.total.as_secs_f64());
        println!(
            "  delay over {} gens: min {:.6} s, avg {:.6} s, max {:.6} s",
            t.generations,
            t.min_delay.as_secs_f64(),
            t.avg_delay.as_secs_f64(),
            t.max_delay.as_secs_f64()
        );
    }
}

fn band_config(args: &Args) -> BandLifeConfig {
    let mut config = BandLifeConfig::default();
    if let Some(n) = args.workers {
        config = config.workers(n);
    }
    if let Some(n) = args.max_workers {
        config = config.max_workers(n);
    }
    config
}

fn run_banded(args: &Args, board: Board, schedule: &SnapshotSchedule, style: Render) -> Result<Board> {
    let mut engine = BandLife::with_config(board, band_config(args))?;
    let assembler = BoardAssembler::new(args.rows, args.cols, engine.workers(), |generation, board: &Board| {
        print_board(generation, board, style)
    });
    let report = engine.run(args.gens, schedule, &assembler)?;
    print_timings(&report.timings);
    Ok(report.board)
}

fn run_sequential(args: &Args, board: Board, schedule: &SnapshotSchedule, style: Render) -> Board {
    let start = Instant::now();
    let mut engine = SeqLife::new(board);
    engine.run(args.gens, schedule, |generation, board| {
        print_board(generation, board, style)
    });
    let elapsed = start.elapsed();
    print_timings(&[WorkerTiming {
        rank: 0,
        total: elapsed,
        generations: 0,
        min_delay: Duration::ZERO,
        avg_delay: Duration::ZERO,
        max_delay: Duration::ZERO,
    }]);
    engine.into_board()
}

fn run(args: Args) -> Result<()> {
    if args.list.len() > MAX_LIST_LEN {
        return Err(LifeError::config(format!(
            "--list accepts at most {MAX_LIST_LEN} generations, got {}",
            args.list.len()
        )));
    }
    if args.rows == 0 || args.cols == 0 {
        return Err(LifeError::config("--rows and --cols must be positive"));
    }
    board::cell_count(args.rows, args.cols)?;
    let schedule = SnapshotSchedule::new(args.list.iter().copied());

    println!("fileName: {}", args.filename.display());
    println!("gens: {}", args.gens);
    println!("rows: {}", args.rows);
    println!("cols: {}", args.cols);
    println!("listLen: {}", schedule.len());

    let board = Board::load_file(&args.filename, args.rows, args.cols)?;
    let style = args.marker.map_or(Render::Digits, Render::Marker);

    let initial = args.check.then(|| board.clone());
    let result = match args.engine {
        EngineKind::Band => run_banded(&args, board, &schedule, style)?,
        EngineKind::Seq => run_sequential(&args, board, &schedule, style),
    };

    if let Some(initial) = initial {
        let none = SnapshotSchedule::none();
        let other = match args.engine {
            EngineKind::Band => {
                let mut seq = SeqLife::new(initial);
                seq.run(args.gens, &none, |_, _| {});
                seq.into_board()
            }
            EngineKind::Seq => {
                let mut band = BandLife::with_config(initial, band_config(&args))?;
                band.run(args.gens, &none, &band_life::bandlife::NoSnapshots)?.board
            }
        };
        let status = if other == result { "MATCH" } else { "MISMATCH" };
        println!(
            "check: population {} vs {} [{status}]",
            result.population(),
            other.population()
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            use clap::error::ErrorKind;
            if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                err.exit();
            }
            println!("{err}");
            return ExitCode::FAILURE;
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            println!("{err}");
            ExitCode::FAILURE
        }
    }
}
