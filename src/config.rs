//! Shared `clap` argument shape for the three binaries, converted once into
//! a validated [`BoardConfig`] before any I/O or allocation happens.

use clap::Args;

use crate::error::ConfigError;
use crate::geometry::BoardConfig;

/// Board/block dimensions as accepted on the command line. The defaults are
/// the target configuration named in the project brief: a 64x64 board tiled
/// into 8x8 blocks.
#[derive(Args, Debug, Clone)]
pub struct BoardArgs {
    /// Board width in squares.
    #[arg(long, default_value_t = 64)]
    pub board_x: u32,

    /// Board height in squares.
    #[arg(long, default_value_t = 64)]
    pub board_y: u32,

    /// Block width in squares; must evenly divide `board_x`.
    #[arg(long, default_value_t = 8)]
    pub block_x: u32,

    /// Block height in squares; must evenly divide `board_y`.
    #[arg(long, default_value_t = 8)]
    pub block_y: u32,
}

impl BoardArgs {
    /// Validates the dimensions and derives the full board geometry. Never
    /// allocates; callers should do this before touching the record store.
    pub fn to_board_config(&self) -> Result<BoardConfig, ConfigError> {
        BoardConfig::new(self.board_x, self.board_y, self.block_x, self.block_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_dimensions_match_target_configuration() {
        let args = BoardArgs { board_x: 64, board_y: 64, block_x: 8, block_y: 8 };
        let config = args.to_board_config().unwrap();
        assert_eq!(config.total_positions, config.partition_count * config.partition_element_count);
    }

    #[test]
    fn non_dividing_block_size_is_a_config_error() {
        let args = BoardArgs { board_x: 64, board_y: 64, block_x: 9, block_y: 8 };
        assert!(args.to_board_config().is_err());
    }
}
