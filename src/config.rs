use crate::board::STARTING_FEN;

/// Console settings parsed from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Edge length of one drawn square, used to map pixel clicks.
    pub square_size: u32,
    /// Position loaded at start-up and by `new` without arguments.
    pub start_fen: String,
    /// Draw pieces as figurines instead of FEN letters.
    pub unicode: bool,
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        EngineConfig {
            square_size: lookup("CHESS_SQUARE_SIZE")
                .and_then(|v| v.parse::<u32>().ok())
                .filter(|&size| size > 0)
                .unwrap_or(defaults.square_size),
            start_fen: lookup("CHESS_START_FEN")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.start_fen),
            unicode: lookup("CHESS_UNICODE")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.unicode),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            square_size: 100,
            start_fen: STARTING_FEN.to_string(),
            unicode: false,
        }
    }
}
