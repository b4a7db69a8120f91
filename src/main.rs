use minesweeper_ai::util::Board;
use minesweeper_ai::{play, Grid, KnowledgeBase, Outcome};
use tracing::error;
use tracing_subscriber::EnvFilter;

const HEIGHT: usize = 8;
const WIDTH: usize = 8;
const MINES: usize = 8;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut rng = rand::thread_rng();
    let grid = Grid::new(HEIGHT, WIDTH);
    let board = match Board::new(grid, MINES, &mut rng) {
        Ok(board) => board,
        Err(err) => {
            error!(error = %err, "couldn't build board");
            std::process::exit(1);
        },
    };
    let mut knowledge = KnowledgeBase::new(grid).with_total_mines(MINES);

    match play(&board, &mut knowledge, &mut rng) {
        Ok(Outcome::Won) => println!("Won: all {MINES} mines identified"),
        Ok(Outcome::Lost(cell)) => println!("Lost: probed the mine at {cell:?}"),
        Ok(Outcome::Exhausted) => {
            println!(
                "Stopped: {} of {MINES} mines identified, no moves left",
                knowledge.mines().len()
            );
        },
        Err(err) => {
            error!(error = %err, "inference failed");
            std::process::exit(1);
        },
    }
    println!("{}", board.render(&knowledge));
    println!("Mines:\n{board}");
}
