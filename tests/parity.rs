use band_life::bandlife::{BandLife, BandLifeConfig, NoSnapshots, SnapshotSchedule};
use band_life::board::Board;
use band_life::seqlife::SeqLife;
use rand::RngCore;
use rand::SeedableRng;

fn random_board(rows: usize, cols: usize, density: f64, seed: u64) -> Board {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let threshold = (u64::MAX as f64 * density) as u64;
    let mut board = Board::new(rows, cols);
    for r in 0..rows {
        for c in 0..cols {
            if rng.next_u64() <= threshold {
                board.set(r, c, true);
            }
        }
    }
    board
}

fn run_parity_case(rows: usize, cols: usize, workers: usize, density: f64, gens: u64, seed: u64) {
    let board = random_board(rows, cols, density, seed);

    let mut seq = SeqLife::new(board.clone());
    seq.run(gens, &SnapshotSchedule::none(), |_, _| {});

    let mut band =
        BandLife::with_config(board, BandLifeConfig::default().workers(workers)).unwrap();
    let report = band.run(gens, &SnapshotSchedule::none(), &NoSnapshots).unwrap();

    assert_eq!(
        report.generation,
        seq.generation(),
        "generation mismatch for {rows}x{cols} workers {workers} seed {seed}"
    );
    assert_eq!(
        report.board.population(),
        seq.population(),
        "population mismatch for {rows}x{cols} workers {workers} seed {seed}"
    );
    assert_eq!(
        &report.board,
        seq.board(),
        "board mismatch for {rows}x{cols} workers {workers} seed {seed}"
    );
}

#[test]
fn single_worker_matches_sequential() {
    run_parity_case(24, 24, 1, 0.10, 12, 0xA1);
    run_parity_case(24, 24, 1, 0.42, 12, 0xB2);
    run_parity_case(7, 11, 1, 0.83, 6, 0xC3);
    run_parity_case(1, 5, 1, 0.50, 4, 0xD4);
}

#[test]
fn even_worker_counts_match_sequential() {
    for workers in [2, 4, 6, 8] {
        run_parity_case(48, 40, workers, 0.35, 16, 11 * workers as u64);
    }
}

#[test]
fn uneven_bands_match_sequential() {
    // 30 rows over 4 workers gives bands of 7 and 8 rows.
    for seed in [22u64, 33, 44] {
        run_parity_case(30, 20, 4, 0.4, 10, seed);
    }
    run_parity_case(5, 9, 4, 0.5, 8, 55);
}

#[test]
fn one_row_bands_match_sequential() {
    run_parity_case(8, 12, 8, 0.45, 12, 0x1EAF);
}

#[test]
fn snapshots_match_sequential_snapshots() {
    let board = random_board(20, 20, 0.37, 0x5EED);
    let schedule = SnapshotSchedule::new([0, 3, 9, 10]);

    let mut expected = Vec::new();
    let mut seq = SeqLife::new(board.clone());
    seq.run(10, &schedule, |generation, board| expected.push((generation, board.clone())));

    let seen = std::sync::Mutex::new(Vec::new());
    let mut band = BandLife::with_config(board, BandLifeConfig::default().workers(4)).unwrap();
    let assembler = band_life::board::BoardAssembler::new(20, 20, band.workers(), |generation, board: &Board| {
        seen.lock().unwrap().push((generation, board.clone()));
    });
    band.run(10, &schedule, &assembler).unwrap();

    assert_eq!(seen.into_inner().unwrap(), expected);
}
