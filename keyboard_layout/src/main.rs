//! layout_dump — print the key regions computed for a frame size.

use clap::{Parser, ValueEnum};
use keyboard_layout::{compute_layout, Board, KeyRegion, Layout};

#[derive(Parser, Debug)]
#[command(author, version, about = "Print the virtual piano key regions for a frame size")]
struct Args {
    /// Frame width in pixels
    #[arg(default_value_t = 1280)]
    width: u32,

    /// Frame height in pixels
    #[arg(default_value_t = 720)]
    height: u32,

    /// Only print one keyboard
    #[arg(long, value_enum)]
    board: Option<BoardArg>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum BoardArg {
    Left,
    Right,
}

impl From<BoardArg> for Board {
    fn from(b: BoardArg) -> Self {
        match b {
            BoardArg::Left  => Board::Left,
            BoardArg::Right => Board::Right,
        }
    }
}

fn main() {
    let args = Args::parse();
    let layout = compute_layout(args.width, args.height);
    let only = args.board.map(Board::from);

    println!();
    println!("  Frame {}×{}   key width {}   start x {}   span {:?}   right offset {}",
        layout.frame_width, layout.frame_height,
        layout.key_width, layout.start_x, layout.key_span(), layout.board_offset());

    for board in Board::ALL {
        if only.is_some_and(|b| b != board) { continue; }
        print_board(&layout, board);
    }
    println!();
}

fn print_board(layout: &Layout, board: Board) {
    let (from, to) = layout.board_span(board);
    println!();
    println!("  {} keyboard   x {}..{}", board.name(), from, to);
    println!("  {:<6} {:<5} {:<6} {:>6} {:>6} {:>6} {:>6}",
        "board", "key", "kind", "x_min", "x_max", "y_min", "y_max");
    for r in layout.white_on(board).iter().chain(layout.black_on(board)) {
        print_row(r);
    }
}

fn print_row(r: &KeyRegion) {
    println!("  {:<6} {:<5} {:<6} {:>6} {:>6} {:>6} {:>6}",
        r.board.name(), r.id.label(), r.kind().name(),
        r.x_min, r.x_max, r.y_min, r.y_max);
}
