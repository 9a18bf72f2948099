use std::collections::VecDeque;

use serde::Serialize;

use crate::common::adui;
use crate::common::payloadid::PayloadID;
use crate::common::pkt::Pkt;
use crate::fec::rscodec::RSGalois8Codec;
use crate::fec::FecCodec;
use crate::tools::error::{Result, RsFecError};
use crate::tools::symbolpool::SymbolPool;

// GF(2^8) Reed-Solomon allows at most 2^8 - 1 encoding symbols per block
const MAX_NB_ENCODING_SYMBOLS: usize = (1 << 8) - 1;

/// Configuration of the FEC `Encoder`
///
/// The parameters are fixed for the lifetime of a session and must match
/// the configuration of the receiving side.
#[derive(Clone, Copy, PartialEq, Debug, Serialize)]
pub struct Config {
    /// Number of source symbols (k) per source block. Must be at least 1.
    pub nb_source_symbols: usize,
    /// Number of repair symbols (r) per source block.
    /// 0 disables repair symbol generation. `k + r` must not exceed 255.
    pub nb_repair_symbols: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nb_source_symbols: 4,
            nb_repair_symbols: 2,
        }
    }
}

impl Config {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.nb_source_symbols == 0 {
            return Err(RsFecError::new_kind(
                std::io::ErrorKind::InvalidInput,
                "at least one source symbol per block is required",
            ));
        }
        if self.nb_source_symbols + self.nb_repair_symbols > MAX_NB_ENCODING_SYMBOLS {
            return Err(RsFecError::new_kind(
                std::io::ErrorKind::InvalidInput,
                format!(
                    "invalid total number of encoding symbols, source={} repair={} maximum allowed={}",
                    self.nb_source_symbols, self.nb_repair_symbols, MAX_NB_ENCODING_SYMBOLS
                ),
            ));
        }
        Ok(())
    }
}

///
/// FEC `Encoder` grouping ADUs into source blocks
///
/// Every pushed ADU is framed as a FEC source packet right away, so the
/// encoder adds no latency to the source data. Once `k` ADUs have been
/// collected, the Reed-Solomon repair symbols of the finished block are
/// built and framed as FEC repair packets. Framed packets are drained
/// with [`read`](Encoder::read).
///
#[derive(Debug)]
pub struct Encoder {
    config: Config,
    cur_sbn: u32,
    adu_table: Vec<Option<Vec<u8>>>,
    cur_nb_adus: usize,
    cur_max_adu_length: usize,
    codec: Option<RSGalois8Codec>,
    encoding_symbol_length: usize,
    pool: SymbolPool,
    pkt_queue: VecDeque<Pkt>,
    errored: bool,
}

impl Encoder {
    /// Return a new `Encoder`
    pub fn new(config: &Config) -> Result<Encoder> {
        config.validate()?;
        Ok(Encoder {
            config: *config,
            cur_sbn: 0,
            adu_table: vec![None; config.nb_source_symbols],
            cur_nb_adus: 0,
            cur_max_adu_length: 0,
            codec: None,
            encoding_symbol_length: 0,
            pool: SymbolPool::new(config.nb_source_symbols),
            pkt_queue: VecDeque::new(),
            errored: false,
        })
    }

    /// Push the next ADU into the encoder
    ///
    /// A FEC source packet for this ADU becomes readable immediately. When
    /// this ADU completes a source block, the FEC repair packets of the block
    /// become readable as well.
    ///
    /// ADUs larger than 65535 bytes are rejected; the block in progress is
    /// abandoned and the encoder refuses further input until
    /// [`reset`](Encoder::reset) is called.
    pub fn push_adu(&mut self, adu: &[u8]) -> Result<()> {
        if self.errored {
            return Err(RsFecError::new(
                "encoder is in error state, reset() before pushing more ADUs",
            ));
        }

        if adu.len() > adui::MAX_ADU_LENGTH {
            self.discard_block_in_progress();
            self.errored = true;
            return Err(RsFecError::new_kind(
                std::io::ErrorKind::InvalidData,
                format!(
                    "ADU too large, maximum is {} bytes, ADU size is {}",
                    adui::MAX_ADU_LENGTH,
                    adu.len()
                ),
            ));
        }

        // ADUs fill the table front to back, so the number of ADUs collected
        // so far is also the ESI of the new ADU
        let esi = self.cur_nb_adus as u8;
        self.queue_source_pkt(adu, esi);

        // With no repair symbols the ADU is never needed again after framing
        if self.config.nb_repair_symbols > 0 {
            self.cur_max_adu_length = std::cmp::max(self.cur_max_adu_length, adu.len());
            self.adu_table[esi as usize] = Some(adu.to_vec());
        }
        self.cur_nb_adus += 1;

        if self.cur_nb_adus == self.config.nb_source_symbols {
            self.process_source_block()?;
        }

        Ok(())
    }

    /// Return the next framed FEC packet, `None` when all pending packets
    /// have been read
    pub fn read(&mut self) -> Option<Pkt> {
        self.pkt_queue.pop_front()
    }

    /// Source block number of the block currently being collected
    pub fn current_block_nr(&self) -> u32 {
        self.cur_sbn
    }

    /// Discard the partially collected block and leave the error state.
    ///
    /// The block counter is not reset so that a resumed stream is never
    /// mistaken for the start of the sequence by a receiver. Packets already
    /// framed stay readable.
    pub fn reset(&mut self) {
        if self.cur_nb_adus > 0 {
            log::debug!("flushing {} ADUs of the partial block", self.cur_nb_adus);
        }
        self.discard_block_in_progress();
        self.errored = false;
    }

    fn discard_block_in_progress(&mut self) {
        self.adu_table.iter_mut().for_each(|entry| *entry = None);
        self.cur_nb_adus = 0;
        self.cur_max_adu_length = 0;
    }

    fn queue_source_pkt(&mut self, adu: &[u8], esi: u8) {
        let id = PayloadID::new(self.cur_sbn, esi, self.config.nb_source_symbols as u16);

        let mut payload = Vec::with_capacity(adu.len() + id.to_bytes().len());
        payload.extend_from_slice(adu);
        payload.extend_from_slice(&id.to_bytes());

        log::debug!(
            "push FEC source packet sbn={} esi={} adu_length={}",
            id.sbn,
            esi,
            adu.len()
        );

        self.pkt_queue.push_back(Pkt {
            payload,
            sbn: id.sbn,
            esi,
            is_source_packet: true,
        });
    }

    fn queue_repair_pkt(&mut self, repair_symbol: &[u8], esi: u8) {
        let id = PayloadID::new(self.cur_sbn, esi, self.config.nb_source_symbols as u16);

        let mut payload = Vec::with_capacity(id.to_bytes().len() + repair_symbol.len());
        payload.extend_from_slice(&id.to_bytes());
        payload.extend_from_slice(repair_symbol);

        log::debug!("push FEC repair packet sbn={} esi={}", id.sbn, esi);

        self.pkt_queue.push_back(Pkt {
            payload,
            sbn: id.sbn,
            esi,
            is_source_packet: false,
        });
    }

    /// Reconfigure the codec, only needed when the encoding symbol length
    /// differs from the previous block's
    fn configure_codec(&mut self, encoding_symbol_length: usize) -> Result<()> {
        if self.codec.is_some() && self.encoding_symbol_length == encoding_symbol_length {
            return Ok(());
        }

        self.codec = Some(RSGalois8Codec::new(
            self.config.nb_source_symbols,
            self.config.nb_repair_symbols,
            encoding_symbol_length,
        )?);
        self.encoding_symbol_length = encoding_symbol_length;
        Ok(())
    }

    fn process_source_block(&mut self) -> Result<()> {
        let sbn = self.cur_sbn;
        log::debug!("process source block #{}", sbn);

        if self.config.nb_repair_symbols > 0 {
            let encoding_symbol_length = adui::encoding_symbol_length(self.cur_max_adu_length);
            if let Err(e) = self.build_repair_pkts(encoding_symbol_length) {
                self.discard_block_in_progress();
                self.errored = true;
                return Err(e);
            }
        }

        self.discard_block_in_progress();
        self.cur_sbn = (self.cur_sbn + 1) & 0xFFFFFF;
        Ok(())
    }

    fn build_repair_pkts(&mut self, encoding_symbol_length: usize) -> Result<()> {
        self.configure_codec(encoding_symbol_length)?;

        let mut source_symbols = Vec::with_capacity(self.config.nb_source_symbols);
        for entry in self.adu_table.iter_mut() {
            let adu = entry.take().ok_or_else(|| {
                RsFecError::new("source block processed with an incomplete ADU table")
            })?;
            let mut symbol = self.pool.take(encoding_symbol_length);
            adui::write_adui(&mut symbol, &adu);
            source_symbols.push(symbol);
        }

        let codec = self.codec.as_ref().unwrap();
        let repair_symbols = codec.encode(&source_symbols)?;

        for (i, repair_symbol) in repair_symbols.iter().enumerate() {
            let esi = (self.config.nb_source_symbols + i) as u8;
            self.queue_repair_pkt(repair_symbol, esi);
        }

        for symbol in source_symbols {
            self.pool.put_back(symbol);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::common::payloadid::PayloadID;

    use super::{Config, Encoder};

    fn create_encoder(nb_source_symbols: usize, nb_repair_symbols: usize) -> Encoder {
        Encoder::new(&Config {
            nb_source_symbols,
            nb_repair_symbols,
        })
        .unwrap()
    }

    #[test]
    pub fn test_config_gf8_ceiling() {
        crate::tests::init();
        assert!(Encoder::new(&Config {
            nb_source_symbols: 200,
            nb_repair_symbols: 56,
        })
        .is_err());
        assert!(Encoder::new(&Config {
            nb_source_symbols: 0,
            nb_repair_symbols: 2,
        })
        .is_err());
    }

    #[test]
    pub fn test_source_pkt_emitted_immediately() {
        crate::tests::init();
        let mut encoder = create_encoder(4, 2);
        encoder.push_adu(b"hello").unwrap();

        let pkt = encoder.read().unwrap();
        assert!(pkt.is_source_packet);
        assert_eq!(pkt.sbn, 0);
        assert_eq!(pkt.esi, 0);
        // ADU bytes followed by the 6-byte payload ID
        assert_eq!(&pkt.payload[..5], b"hello");
        assert_eq!(pkt.payload.len(), 5 + 6);

        let id = PayloadID::from_source_pkt(&pkt.payload).unwrap();
        assert_eq!(id.sbn, 0);
        assert_eq!(id.esi, 0);
        assert_eq!(id.source_block_length, 4);

        // No repair packets before the block is full
        assert!(encoder.read().is_none());
    }

    #[test]
    pub fn test_full_block_emits_repair_pkts() {
        crate::tests::init();
        let mut encoder = create_encoder(4, 2);
        for i in 0..4u8 {
            encoder.push_adu(&vec![i; 10 + i as usize]).unwrap();
        }

        let mut nb_source = 0;
        let mut nb_repair = 0;
        let encoding_symbol_length = 3 + 13;
        while let Some(pkt) = encoder.read() {
            if pkt.is_source_packet {
                assert_eq!(pkt.esi, nb_source);
                nb_source += 1;
            } else {
                assert_eq!(pkt.esi as usize, 4 + nb_repair as usize);
                // Repair packet is the 6-byte payload ID plus one symbol
                assert_eq!(pkt.payload.len(), 6 + encoding_symbol_length);
                let id = PayloadID::from_repair_pkt(&pkt.payload).unwrap();
                assert_eq!(id.sbn, 0);
                assert_eq!(id.source_block_length, 4);
                nb_repair += 1;
            }
        }
        assert_eq!(nb_source, 4);
        assert_eq!(nb_repair, 2);
        assert_eq!(encoder.current_block_nr(), 1);
    }

    #[test]
    pub fn test_no_repair_symbols_configured() {
        crate::tests::init();
        let mut encoder = create_encoder(2, 0);
        encoder.push_adu(b"a").unwrap();
        encoder.push_adu(b"b").unwrap();

        let mut nb_pkts = 0;
        while let Some(pkt) = encoder.read() {
            assert!(pkt.is_source_packet);
            nb_pkts += 1;
        }
        assert_eq!(nb_pkts, 2);
        assert_eq!(encoder.current_block_nr(), 1);
    }

    #[test]
    pub fn test_no_repair_symbols_skips_adu_accumulation() {
        crate::tests::init();
        let mut encoder = create_encoder(4, 0);
        encoder.push_adu(b"abc").unwrap();
        encoder.push_adu(b"defg").unwrap();

        // The ADUs were framed and forgotten, nothing is kept for symbol
        // construction
        assert!(encoder.adu_table.iter().all(|entry| entry.is_none()));
        assert_eq!(encoder.cur_max_adu_length, 0);
        assert_eq!(encoder.cur_nb_adus, 2);
    }

    #[test]
    pub fn test_oversize_adu_rejected() {
        crate::tests::init();
        let mut encoder = create_encoder(4, 2);
        encoder.push_adu(b"first").unwrap();
        while encoder.read().is_some() {}

        let oversize = vec![0u8; 70000];
        assert!(encoder.push_adu(&oversize).is_err());
        // No packet was framed for the oversize ADU
        assert!(encoder.read().is_none());

        // The encoder refuses input until it is reset
        assert!(encoder.push_adu(b"second").is_err());
        encoder.reset();
        encoder.push_adu(b"second").unwrap();
        // The abandoned block did not advance the counter
        assert_eq!(encoder.current_block_nr(), 0);
        let pkt = encoder.read().unwrap();
        // The partial block was discarded, the ESI starts over
        assert_eq!(pkt.esi, 0);
    }

    #[test]
    pub fn test_block_counter_survives_reset() {
        crate::tests::init();
        let mut encoder = create_encoder(2, 1);
        encoder.push_adu(b"a").unwrap();
        encoder.push_adu(b"b").unwrap();
        assert_eq!(encoder.current_block_nr(), 1);

        // Mid-block flush discards the partial block but not the counter
        encoder.push_adu(b"c").unwrap();
        encoder.reset();
        assert_eq!(encoder.current_block_nr(), 1);

        encoder.push_adu(b"d").unwrap();
        encoder.push_adu(b"e").unwrap();
        assert_eq!(encoder.current_block_nr(), 2);
    }

    #[test]
    pub fn test_repair_pkts_change_symbol_length_between_blocks() {
        crate::tests::init();
        let mut encoder = create_encoder(2, 1);
        encoder.push_adu(&[1u8; 8]).unwrap();
        encoder.push_adu(&[2u8; 8]).unwrap();
        while encoder.read().is_some() {}

        // Longer ADUs force a codec/pool reconfiguration
        encoder.push_adu(&[3u8; 100]).unwrap();
        encoder.push_adu(&[4u8; 50]).unwrap();

        let repair: Vec<_> = std::iter::from_fn(|| encoder.read())
            .filter(|pkt| !pkt.is_source_packet)
            .collect();
        assert_eq!(repair.len(), 1);
        assert_eq!(repair[0].payload.len(), 6 + 3 + 100);
        assert_eq!(repair[0].sbn, 1);
    }
}
