//! Line-oriented driver standing in for a graphical front end.
//!
//! Each input line is one command; the response is written back as text.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use tracing::debug;

use crate::config::EngineConfig;
use crate::game::{ClickOutcome, Game, GameStatus};
use crate::movegen::MoveSet;
use crate::square::Square;

const HELP: &str = "\
commands:
  new [fen]         start over from the configured or given position
  fen               print the position as FEN
  show              draw the board
  turn              print the side to move
  click <x> <y>     click at a pixel position on the drawn board
  select <square>   click on a square
  moves <square>    list legal moves of the piece on a square
  move <from> <to>  play a move
  status            check, checkmate or stalemate
  quit              leave
";

pub struct ConsoleHandler {
    game: Game,
    config: EngineConfig,
}

impl ConsoleHandler {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let game = Game::from_fen(&config.start_fen)
            .with_context(|| format!("loading start position '{}'", config.start_fen))?;
        Ok(ConsoleHandler { game, config })
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn run(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.run_with(stdin.lock(), stdout.lock())
    }

    /// Read commands from `reader` until `quit` or end of input.
    pub fn run_with(&mut self, mut reader: impl BufRead, mut writer: impl Write) -> Result<()> {
        let mut line = String::new();
        while reader.read_line(&mut line)? > 0 {
            let command = line.trim();
            if command == "quit" {
                break;
            }

            match self.handle_command(command) {
                Ok(response) => write!(writer, "{response}")?,
                Err(e) => writeln!(writer, "error: {e:#}")?,
            }

            writer.flush()?;
            line.clear();
        }
        Ok(())
    }

    pub fn handle_command(&mut self, command: &str) -> Result<String> {
        let parts: Vec<&str> = command.split_whitespace().collect();
        if parts.is_empty() {
            return Ok(String::new());
        }
        debug!(command, "console command");

        match parts[0] {
            "help" => Ok(HELP.to_string()),
            "quit" => Ok(String::new()),
            "new" => self.handle_new(&parts[1..]),
            "fen" => Ok(format!("{}\n", self.game.to_fen())),
            "show" => Ok(self.game.board().render(self.config.unicode)),
            "turn" => Ok(format!("{}\n", self.game.current_player())),
            "click" => self.handle_click(&parts[1..]),
            "select" => {
                let square = parse_square(&parts[1..], 0)?;
                let outcome = self.game.click(square)?;
                Ok(self.describe_outcome(&outcome))
            }
            "moves" => {
                let square = parse_square(&parts[1..], 0)?;
                let moves = self.game.legal_moves(square)?;
                Ok(format!("{}\n", format_moves(&moves)))
            }
            "move" => {
                let from = parse_square(&parts[1..], 0)?;
                let to = parse_square(&parts[1..], 1)?;
                self.game.play(from, to)?;
                Ok(format!("moved {from} {to}\n{}", self.describe_status()))
            }
            "status" => Ok(self.describe_status()),
            other => bail!("unknown command '{other}', try 'help'"),
        }
    }

    fn handle_new(&mut self, args: &[&str]) -> Result<String> {
        let fen = if args.is_empty() {
            self.config.start_fen.clone()
        } else {
            args.join(" ")
        };
        self.game = Game::from_fen(&fen).with_context(|| format!("loading '{fen}'"))?;
        Ok("ok\n".to_string())
    }

    fn handle_click(&mut self, args: &[&str]) -> Result<String> {
        let [x, y] = args else {
            bail!("usage: click <x> <y>");
        };
        let x: u32 = x.parse().with_context(|| format!("bad x coordinate '{x}'"))?;
        let y: u32 = y.parse().with_context(|| format!("bad y coordinate '{y}'"))?;
        let outcome = self.game.click_pixel((x, y), self.config.square_size)?;
        Ok(self.describe_outcome(&outcome))
    }

    fn describe_outcome(&self, outcome: &ClickOutcome) -> String {
        match outcome {
            ClickOutcome::Selected { square, moves } => {
                format!("selected {square}: {}\n", format_moves(moves))
            }
            ClickOutcome::Deselected(square) => format!("deselected {square}\n"),
            ClickOutcome::Moved { from, to } => {
                format!("moved {from} {to}\n{}", self.describe_status())
            }
            ClickOutcome::Ignored => "ignored\n".to_string(),
        }
    }

    fn describe_status(&self) -> String {
        match self.game.status() {
            GameStatus::Ongoing => format!("{} to move\n", self.game.current_player()),
            GameStatus::Check(side) => format!("check: {side} to move\n"),
            GameStatus::Checkmate { winner } => format!("checkmate: {winner} wins\n"),
            GameStatus::Stalemate => "stalemate\n".to_string(),
        }
    }
}

fn parse_square(args: &[&str], index: usize) -> Result<Square> {
    let Some(text) = args.get(index) else {
        bail!("missing square argument");
    };
    Ok(text.parse::<Square>()?)
}

fn format_moves(moves: &MoveSet) -> String {
    if moves.is_empty() {
        return "(none)".to_string();
    }
    moves
        .iter()
        .map(Square::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
