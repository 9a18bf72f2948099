pub mod rscodec;

use crate::tools::error::Result;

/// Erasure-coding collaborator over fixed-length encoding symbols.
///
/// The codec works on a block of `n = k + r` encoding symbols, where symbols
/// `0..k` are source symbols and `k..n` are repair symbols. All symbols of a
/// block have the same length.
pub trait FecCodec {
    /// Build the `r` repair symbols out of the `k` source symbols
    fn encode(&self, source_symbols: &[Vec<u8>]) -> Result<Vec<Vec<u8>>>;

    /// Recover the missing source symbols of a block in place.
    ///
    /// `shards` contains `n` slots indexed by ESI, `None` marking an erased
    /// symbol. Returns `Ok(true)` when all source symbols are present
    /// afterwards, `Ok(false)` when recovery failed (not fatal, the missing
    /// symbols simply stay missing) and `Err` on a fatal codec error.
    fn decode(&self, shards: &mut Vec<Option<Vec<u8>>>) -> Result<bool>;
}

impl std::fmt::Debug for dyn FecCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "FecCodec {{  }}")
    }
}
