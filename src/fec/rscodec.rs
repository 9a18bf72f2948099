use crate::tools::error::{Result, RsFecError};

use super::FecCodec;

/// Reed-Solomon codec over GF(2^8)
#[derive(Debug)]
pub struct RSGalois8Codec {
    nb_source_symbols: usize,
    nb_repair_symbols: usize,
    encoding_symbol_length: usize,
    rs: reed_solomon_erasure::galois_8::ReedSolomon,
}

impl RSGalois8Codec {
    pub fn new(
        nb_source_symbols: usize,
        nb_repair_symbols: usize,
        encoding_symbol_length: usize,
    ) -> Result<RSGalois8Codec> {
        log::debug!(
            "create RS GF(2^8) codec nb_source_symbols={} nb_repair_symbols={} encoding_symbol_length={}",
            nb_source_symbols,
            nb_repair_symbols,
            encoding_symbol_length
        );
        let rs =
            reed_solomon_erasure::galois_8::ReedSolomon::new(nb_source_symbols, nb_repair_symbols)
                .map_err(|_| RsFecError::new("Fail to create RS codec"))?;

        Ok(RSGalois8Codec {
            nb_source_symbols,
            nb_repair_symbols,
            encoding_symbol_length,
            rs,
        })
    }
}

impl FecCodec for RSGalois8Codec {
    fn encode(&self, source_symbols: &[Vec<u8>]) -> Result<Vec<Vec<u8>>> {
        if source_symbols.len() != self.nb_source_symbols {
            return Err(RsFecError::new(format!(
                "nb source symbols is {} instead of {}",
                source_symbols.len(),
                self.nb_source_symbols
            )));
        }
        if source_symbols
            .iter()
            .any(|symbol| symbol.len() != self.encoding_symbol_length)
        {
            return Err(RsFecError::new(format!(
                "source symbols must all be {} bytes long",
                self.encoding_symbol_length
            )));
        }

        let mut shards: Vec<Vec<u8>> = source_symbols.to_vec();
        for _ in 0..self.nb_repair_symbols {
            shards.push(vec![0; self.encoding_symbol_length]);
        }

        self.rs
            .encode(&mut shards)
            .map_err(|_| RsFecError::new("Fail to encode RS"))?;

        Ok(shards.split_off(self.nb_source_symbols))
    }

    fn decode(&self, shards: &mut Vec<Option<Vec<u8>>>) -> Result<bool> {
        if shards.len() != self.nb_source_symbols + self.nb_repair_symbols {
            return Err(RsFecError::new(format!(
                "nb encoding symbols is {} instead of {}",
                shards.len(),
                self.nb_source_symbols + self.nb_repair_symbols
            )));
        }

        let nb_source_received = shards[..self.nb_source_symbols]
            .iter()
            .filter(|shard| shard.is_some())
            .count();
        if nb_source_received == self.nb_source_symbols {
            return Ok(true);
        }

        match self.rs.reconstruct_data(shards) {
            Ok(_) => Ok(true),
            Err(e) => {
                log::error!("Fail to reconstruct source symbols {:?}", e);
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::fec::FecCodec;

    fn source_symbols(nb: usize, length: usize) -> Vec<Vec<u8>> {
        (0..nb)
            .map(|i| (0..length).map(|j| (i * length + j) as u8).collect())
            .collect()
    }

    #[test]
    pub fn test_encode_builds_repair_symbols() {
        crate::tests::init();
        let codec = super::RSGalois8Codec::new(4, 2, 8).unwrap();
        let repair = codec.encode(&source_symbols(4, 8)).unwrap();
        assert_eq!(repair.len(), 2);
        assert!(repair.iter().all(|symbol| symbol.len() == 8));
    }

    #[test]
    pub fn test_encode_wrong_symbol_count() {
        crate::tests::init();
        let codec = super::RSGalois8Codec::new(4, 2, 8).unwrap();
        assert!(codec.encode(&source_symbols(3, 8)).is_err());
    }

    #[test]
    pub fn test_decode_recovers_missing_symbols() {
        crate::tests::init();
        let codec = super::RSGalois8Codec::new(4, 2, 8).unwrap();
        let source = source_symbols(4, 8);
        let repair = codec.encode(&source).unwrap();

        // Erase source symbols 1 and 3, keep both repair symbols
        let mut shards: Vec<Option<Vec<u8>>> = vec![
            Some(source[0].clone()),
            None,
            Some(source[2].clone()),
            None,
            Some(repair[0].clone()),
            Some(repair[1].clone()),
        ];

        assert!(codec.decode(&mut shards).unwrap());
        assert_eq!(shards[1].as_ref().unwrap(), &source[1]);
        assert_eq!(shards[3].as_ref().unwrap(), &source[3]);
    }

    #[test]
    pub fn test_decode_too_many_erasures() {
        crate::tests::init();
        let codec = super::RSGalois8Codec::new(4, 2, 8).unwrap();
        let source = source_symbols(4, 8);
        let repair = codec.encode(&source).unwrap();

        // 3 symbols for k=4, not recoverable
        let mut shards: Vec<Option<Vec<u8>>> = vec![
            Some(source[0].clone()),
            None,
            None,
            None,
            Some(repair[0].clone()),
            Some(repair[1].clone()),
        ];

        assert!(!codec.decode(&mut shards).unwrap());
    }

    #[test]
    pub fn test_decode_all_source_present_is_a_no_op() {
        crate::tests::init();
        let codec = super::RSGalois8Codec::new(2, 1, 4).unwrap();
        let source = source_symbols(2, 4);
        let mut shards: Vec<Option<Vec<u8>>> =
            vec![Some(source[0].clone()), Some(source[1].clone()), None];
        assert!(codec.decode(&mut shards).unwrap());
    }
}
