//! End-to-end search scenarios driven through the public engine API.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use cinder_core::{GameOverReason, Position};
use cinder_engine::search::negamax::{MATE_SCORE, MATE_THRESHOLD};
use cinder_engine::{ClockParams, SearchControl, Searcher, limits_from_go};

fn infinite_control() -> SearchControl {
    SearchControl::new_infinite(Arc::new(AtomicBool::new(false)))
}

#[test]
fn mate_in_one_reported_through_the_info_callback() {
    let pos: Position = "6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1".parse().unwrap();
    let mut searcher = Searcher::with_tt_bits(14);
    let control = infinite_control();

    let mut iterations = Vec::new();
    let result = searcher.search(&pos, 3, &control, |depth, score, nodes, pv| {
        iterations.push((depth, score, nodes, pv.to_vec()));
    });

    assert_eq!(iterations.len(), 3, "one callback per completed depth");
    assert!(
        iterations.windows(2).all(|w| w[0].2 <= w[1].2),
        "node counts are cumulative"
    );

    let (_, final_score, _, final_pv) = iterations.last().unwrap();
    assert_eq!(*final_score, MATE_SCORE - 1);
    assert_eq!(final_pv.first().cloned(), result.best_move);
    assert_eq!(pos.to_uci(&result.best_move.unwrap()), "a1a8");
}

#[test]
fn mate_in_two_is_found_and_scored() {
    let pos: Position = "6k1/8/8/8/8/8/1R6/R6K w - - 0 1".parse().unwrap();
    let mut searcher = Searcher::with_tt_bits(14);
    let result = searcher.search(&pos, 4, &infinite_control(), |_, _, _, _| {});

    assert_eq!(result.score, MATE_SCORE - 3);
    assert_eq!(result.pv.first().cloned(), result.best_move);

    // The announced move must actually force mate on the next move,
    // whatever Black replies.
    let mut played = pos.clone();
    played.make(&result.best_move.unwrap());
    let replies = played.legal_moves();
    assert!(!replies.is_empty());
    for reply in &replies {
        played.make(reply);
        let mut mated = false;
        for finisher in &played.legal_moves() {
            played.make(finisher);
            if matches!(played.game_result(), Some((GameOverReason::Checkmate, _))) {
                mated = true;
            }
            played.unmake();
            if mated {
                break;
            }
        }
        assert!(mated, "no mate after reply in {}", played.fen());
        played.unmake();
    }
}

#[test]
fn mated_root_has_no_best_move() {
    // Scholar's mate already delivered; Black is to move and mated.
    let pos: Position = "r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 4"
        .parse()
        .unwrap();
    let mut searcher = Searcher::with_tt_bits(14);
    let result = searcher.search(&pos, 2, &infinite_control(), |_, _, _, _| {});

    assert!(result.best_move.is_none());
    assert!(result.score < -(MATE_SCORE - MATE_THRESHOLD));
}

#[test]
fn stalemate_root_draws_with_no_best_move() {
    let pos: Position = "7k/5Q2/6K1/8/8/8/8/8 b - - 0 1".parse().unwrap();
    let mut searcher = Searcher::with_tt_bits(14);
    let result = searcher.search(&pos, 2, &infinite_control(), |_, _, _, _| {});

    assert!(result.best_move.is_none());
    assert_eq!(result.score, 0);
}

#[test]
fn stop_request_ends_an_infinite_search_promptly() {
    let pos = Position::starting_position();
    let stopped = Arc::new(AtomicBool::new(false));
    let control = SearchControl::new_infinite(Arc::clone(&stopped));

    let handle = std::thread::spawn(move || {
        let mut searcher = Searcher::new();
        let started = Instant::now();
        let result = searcher.search(&pos, 64, &control, |_, _, _, _| {});
        (result, started.elapsed())
    });

    std::thread::sleep(Duration::from_millis(50));
    stopped.store(true, std::sync::atomic::Ordering::Release);

    let (result, elapsed) = handle.join().unwrap();
    assert!(result.best_move.is_some(), "a bestmove is always produced");
    assert!(
        elapsed < Duration::from_secs(2),
        "search should wind down promptly after stop, took {elapsed:?}"
    );
}

#[test]
fn movetime_budget_is_respected() {
    let pos = Position::starting_position();
    let clock = ClockParams { movetime: 100, ..Default::default() };
    let control = limits_from_go(&clock, false, &pos, Arc::new(AtomicBool::new(false)));

    let started = Instant::now();
    let mut searcher = Searcher::new();
    let result = searcher.search(&pos, 64, &control, |_, _, _, _| {});
    let elapsed = started.elapsed();

    assert!(result.best_move.is_some());
    assert!(
        elapsed < Duration::from_millis(1_000),
        "movetime 100 blew through its budget: {elapsed:?}"
    );
}

#[test]
fn identical_searches_produce_identical_output() {
    let pos: Position = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1"
        .parse()
        .unwrap();

    let run = || {
        let mut searcher = Searcher::with_tt_bits(14);
        let mut trace = Vec::new();
        let result = searcher.search(&pos, 4, &infinite_control(), |depth, score, nodes, pv| {
            trace.push((depth, score, nodes, pv.to_vec()));
        });
        (trace, result.best_move, result.nodes)
    };

    let (trace_a, best_a, nodes_a) = run();
    let (trace_b, best_b, nodes_b) = run();

    assert_eq!(trace_a, trace_b);
    assert_eq!(best_a, best_b);
    assert_eq!(nodes_a, nodes_b);
}

#[test]
fn warm_table_run_keeps_bestmove_without_extra_nodes() {
    let pos = Position::starting_position();
    let mut searcher = Searcher::with_tt_bits(16);

    let cold = searcher.search(&pos, 6, &infinite_control(), |_, _, _, _| {});
    let warm = searcher.search(&pos, 6, &infinite_control(), |_, _, _, _| {});

    assert_eq!(cold.best_move, warm.best_move);
    assert!(warm.nodes <= cold.nodes);
}

#[test]
fn search_does_not_disturb_the_caller_position() {
    let pos = Position::starting_position();
    let fen_before = pos.fen();
    let mut searcher = Searcher::with_tt_bits(14);
    searcher.search(&pos, 4, &infinite_control(), |_, _, _, _| {});
    assert_eq!(pos.fen(), fen_before);
}
