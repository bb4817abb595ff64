//! Event-driven UCI engine: stdin reader thread plus a single search thread.

use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};

use tracing::{debug, info, warn};

use cinder_core::Position;
use cinder_engine::search::negamax::{MATE_SCORE, MATE_THRESHOLD};
use cinder_engine::{MAX_DEPTH, SearchControl, SearchResult, Searcher, limits_from_go};

use crate::command::{Command, GoParams, parse_command};
use crate::error::UciError;

/// Whether the engine is between searches or has one running.
enum EngineState {
    Idle,
    Searching,
}

/// Events processed by the main engine loop.
enum EngineEvent {
    UciCommand(Result<Command, UciError>),
    SearchDone(SearchDone),
    InputClosed,
}

/// Payload returned by the search thread when it finishes.
struct SearchDone {
    result: SearchResult,
    searcher: Searcher,
}

/// The UCI engine, holding the current position and the searcher.
///
/// Runs an event loop on the calling thread. A reader thread owns stdin, so
/// `stop` and `quit` are seen while a search runs; the search itself runs on
/// a worker thread that owns the searcher for the duration and hands it
/// back in its completion event.
pub struct UciEngine {
    board: Position,
    searcher: Option<Searcher>,
    state: EngineState,
    stop_flag: Arc<AtomicBool>,
}

impl UciEngine {
    /// Create a new engine with the starting position.
    pub fn new() -> Self {
        Self {
            board: Position::starting_position(),
            searcher: Some(Searcher::new()),
            state: EngineState::Idle,
            stop_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Run the UCI event loop, reading from stdin until `quit` or EOF.
    pub fn run(mut self) -> Result<(), UciError> {
        let (tx, rx) = mpsc::channel::<EngineEvent>();

        let stdin_tx = tx.clone();
        std::thread::spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        let trimmed = line.trim().to_string();
                        if trimmed.is_empty() {
                            continue;
                        }
                        debug!(cmd = %trimmed, "received UCI command");
                        if stdin_tx.send(EngineEvent::UciCommand(parse_command(&trimmed))).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
            let _ = stdin_tx.send(EngineEvent::InputClosed);
        });

        for event in &rx {
            match event {
                EngineEvent::UciCommand(Ok(cmd)) => match cmd {
                    Command::Uci => self.handle_uci(),
                    Command::IsReady => self.handle_isready(),
                    Command::UciNewGame => self.handle_ucinewgame(&rx),
                    Command::Position(pos) => self.handle_position(pos),
                    Command::Go(params) => self.handle_go(params, &tx, &rx),
                    Command::Stop => self.handle_stop(),
                    Command::Print => println!("{}", self.board.pretty()),
                    Command::TtStats => self.handle_ttstats(),
                    Command::Quit => {
                        self.stop_and_join(&rx);
                        break;
                    }
                    Command::Unknown(_) => {}
                },
                EngineEvent::UciCommand(Err(err)) => {
                    warn!(error = %err, "UCI parse error");
                }
                EngineEvent::SearchDone(done) => self.finish_search(done),
                EngineEvent::InputClosed => {
                    self.stop_and_join(&rx);
                    break;
                }
            }
        }

        info!("cinder shutting down");
        Ok(())
    }

    fn handle_uci(&self) {
        println!("id name cinder {}", env!("CARGO_PKG_VERSION"));
        println!("id author the cinder authors");
        println!("uciok");
    }

    fn handle_isready(&self) {
        println!("readyok");
    }

    fn handle_ucinewgame(&mut self, rx: &mpsc::Receiver<EngineEvent>) {
        // Joining first means the searcher is back home and the clear
        // cannot race the search thread.
        self.stop_and_join(rx);
        self.board = Position::starting_position();
        if let Some(searcher) = self.searcher.as_mut() {
            searcher.clear_tt();
        }
    }

    fn handle_position(&mut self, pos: Position) {
        self.board = pos;
    }

    fn handle_go(
        &mut self,
        params: GoParams,
        tx: &mpsc::Sender<EngineEvent>,
        rx: &mpsc::Receiver<EngineEvent>,
    ) {
        // A new `go` supersedes any running search; its bestmove is
        // published before the new search starts.
        self.stop_and_join(rx);

        self.stop_flag = Arc::new(AtomicBool::new(false));
        let control = limits_from_go(
            &params.clock,
            params.infinite,
            &self.board,
            Arc::clone(&self.stop_flag),
        );
        let max_depth = params.depth.unwrap_or(MAX_DEPTH as i32);

        let mut searcher = self.searcher.take().unwrap_or_default();
        let pos = self.board.clone();
        let tx = tx.clone();

        std::thread::spawn(move || {
            let result = searcher.search(&pos, max_depth, &control, |depth, score, nodes, pv| {
                let elapsed_ms = control.elapsed().as_millis().max(1);
                let nps = nodes as u128 * 1000 / elapsed_ms;
                let pv_str: String = pv
                    .iter()
                    .map(|m| pos.to_uci(m))
                    .collect::<Vec<_>>()
                    .join(" ");

                println!(
                    "info depth {depth} nodes {nodes} time {elapsed_ms} nps {nps} score {} pv {pv_str}",
                    format_score(score),
                );
            });
            let _ = tx.send(EngineEvent::SearchDone(SearchDone { result, searcher }));
        });

        self.state = EngineState::Searching;
    }

    fn handle_stop(&mut self) {
        self.stop_flag.store(true, Ordering::Release);
    }

    fn handle_ttstats(&self) {
        match self.searcher.as_ref() {
            Some(searcher) => {
                let stats = searcher.tt_stats();
                println!(
                    "info string tt hits {} stores {} slots {}",
                    stats.hits, stats.stores, stats.slots
                );
            }
            None => println!("info string tt busy: search in progress"),
        }
    }

    /// Stop a running search and process events until its result arrives.
    ///
    /// Publishing the pending `bestmove` before anything else starts is what
    /// keeps the protocol ordering intact.
    fn stop_and_join(&mut self, rx: &mpsc::Receiver<EngineEvent>) {
        if matches!(self.state, EngineState::Idle) {
            return;
        }
        self.stop_flag.store(true, Ordering::Release);
        for event in rx {
            if let EngineEvent::SearchDone(done) = event {
                self.finish_search(done);
                break;
            }
        }
    }

    fn finish_search(&mut self, done: SearchDone) {
        self.searcher = Some(done.searcher);

        match done.result.best_move {
            Some(m) => println!("bestmove {}", self.board.to_uci(&m)),
            None => println!("bestmove (none)"),
        }

        self.state = EngineState::Idle;
    }
}

impl Default for UciEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a score as `cp <n>` or `mate <n>` (full moves, signed).
fn format_score(score: i32) -> String {
    if score.abs() > MATE_SCORE - MATE_THRESHOLD {
        let plies = MATE_SCORE - score.abs();
        let full_moves = (plies + 1) / 2;
        format!("mate {}", if score > 0 { full_moves } else { -full_moves })
    } else {
        format!("cp {score}")
    }
}
