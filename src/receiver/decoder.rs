use std::collections::HashMap;
use std::rc::Rc;
use std::time::SystemTime;

use serde::Serialize;

use crate::common::adui;
use crate::common::payloadid::{PayloadID, FEC_PAYLOAD_ID_LENGTH};
use crate::fec::rscodec::RSGalois8Codec;
use crate::fec::FecCodec;
use crate::tools::error::{Result, RsFecError};
use crate::tools::symbolpool::SymbolPool;

use super::aging;
use super::sourceblock::SourceBlock;
use super::writer::AduWriter;

// GF(2^8) Reed-Solomon allows at most 2^8 - 1 encoding symbols per block
const MAX_NB_ENCODING_SYMBOLS: usize = (1 << 8) - 1;

/// Configuration of the FEC `Decoder`
///
/// `nb_source_symbols` and `nb_repair_symbols` must match the configuration
/// of the sending side. The parameters are fixed for the lifetime of a
/// session.
#[derive(Clone, Copy, PartialEq, Debug, Serialize)]
pub struct Config {
    /// Number of source symbols (k) per source block. Must be at least 1.
    pub nb_source_symbols: usize,
    /// Number of repair symbols (r) per source block.
    /// 0 disables repair packet consumption. `k + r` must not exceed 255.
    pub nb_repair_symbols: usize,
    /// Number of most recent source blocks kept waiting for packets. Must be
    /// at least 1. Older blocks are pruned; their late packets are dropped.
    pub max_source_block_age: u32,
    /// Deliver ADUs strictly ordered by (block number, ESI). Ordered delivery
    /// buffers each block until it is pruned or drained, adding latency
    /// bounded by `max_source_block_age`. When disabled every ADU is
    /// delivered the moment it is received or recovered, unordered.
    pub sort_output: bool,
    /// Attach the current time to every delivered ADU
    pub timestamp_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nb_source_symbols: 4,
            nb_repair_symbols: 2,
            max_source_block_age: 1,
            sort_output: true,
            timestamp_output: true,
        }
    }
}

impl Config {
    fn validate(&self) -> Result<()> {
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
        if self.max_source_block_age == 0 {
            return Err(RsFecError::new_kind(
                std::io::ErrorKind::InvalidInput,
                "max_source_block_age must be at least 1",
            ));
        }
        Ok(())
    }

    fn nb_encoding_symbols(&self) -> usize {
        self.nb_source_symbols + self.nb_repair_symbols
    }
}

///
/// FEC `Decoder` reassembling ADUs from FEC source and repair packets
///
/// Packets of the two streams are pushed with
/// [`push_source_pkt`](Decoder::push_source_pkt) and
/// [`push_repair_pkt`](Decoder::push_repair_pkt), in any order and with
/// losses. A source block is processed as soon as any `k` of its encoding
/// symbols have arrived, recovering lost ADUs from the repair symbols when
/// needed. Reassembled ADUs are handed to the [`AduWriter`].
///
/// Stale, duplicate or malformed packets are logged and dropped, they never
/// produce an error.
///
#[derive(Debug)]
pub struct Decoder {
    config: Config,
    writer: Rc<dyn AduWriter>,
    blocks: HashMap<u32, SourceBlock>,
    most_recent_block_nr: u32,
    first_pruning: bool,
    codec: Option<RSGalois8Codec>,
    encoding_symbol_length: usize,
    pool: SymbolPool,
    source_eos: bool,
    repair_eos: bool,
    completed: bool,
}

impl Decoder {
    /// Return a new `Decoder` delivering reassembled ADUs to `writer`
    pub fn new(config: &Config, writer: Rc<dyn AduWriter>) -> Result<Decoder> {
        config.validate()?;
        Ok(Decoder {
            config: *config,
            writer,
            blocks: HashMap::new(),
            most_recent_block_nr: 0,
            first_pruning: true,
            codec: None,
            encoding_symbol_length: 0,
            pool: SymbolPool::new(config.nb_encoding_symbols()),
            source_eos: false,
            repair_eos: false,
            completed: false,
        })
    }

    /// Push a received FEC source packet (ADU followed by the 6-byte
    /// payload ID)
    ///
    /// `Err` is only returned on a fatal condition: a failing codec
    /// reconfiguration or a delivery rejected by the writer.
    pub fn push_source_pkt(&mut self, pkt: &[u8]) -> Result<()> {
        if self.source_eos {
            log::warn!("drop FEC source packet received after end-of-stream");
            return Ok(());
        }
        if pkt.len() < FEC_PAYLOAD_ID_LENGTH {
            log::warn!(
                "drop {} byte FEC source packet, too short to carry a payload ID",
                pkt.len()
            );
            return Ok(());
        }

        let id = PayloadID::from_source_pkt(pkt)?;
        if id.esi as usize >= self.config.nb_source_symbols {
            log::warn!(
                "drop FEC source packet with out of range ESI {}, nb_source_symbols is {}",
                id.esi,
                self.config.nb_source_symbols
            );
            return Ok(());
        }

        log::debug!("received FEC source packet sbn={} esi={}", id.sbn, id.esi);
        self.insert_pkt(id, pkt, true)
    }

    /// Push a received FEC repair packet (6-byte payload ID followed by the
    /// repair symbol)
    ///
    /// `Err` is only returned on a fatal condition: a failing codec
    /// reconfiguration or a delivery rejected by the writer.
    pub fn push_repair_pkt(&mut self, pkt: &[u8]) -> Result<()> {
        if self.repair_eos {
            log::warn!("drop FEC repair packet received after end-of-stream");
            return Ok(());
        }
        if pkt.len() < FEC_PAYLOAD_ID_LENGTH {
            log::warn!(
                "drop {} byte FEC repair packet, too short to carry a payload ID",
                pkt.len()
            );
            return Ok(());
        }

        let id = PayloadID::from_repair_pkt(pkt)?;
        let esi = id.esi as usize;
        if esi < self.config.nb_source_symbols || esi >= self.config.nb_encoding_symbols() {
            log::warn!(
                "drop FEC repair packet with out of range ESI {}, repair ESIs are {}..{}",
                id.esi,
                self.config.nb_source_symbols,
                self.config.nb_encoding_symbols()
            );
            return Ok(());
        }

        log::debug!("received FEC repair packet sbn={} esi={}", id.sbn, id.esi);
        self.insert_pkt(id, pkt, false)
    }

    /// Signal end-of-stream on the source packet path
    ///
    /// Once both paths have signaled end-of-stream (or the repair path is
    /// moot because no repair symbols are configured), the remaining source
    /// blocks are drained and the writer is completed.
    pub fn close_source(&mut self) -> Result<()> {
        if self.source_eos {
            return Ok(());
        }
        log::debug!("end-of-stream on the source packet path");
        self.source_eos = true;
        self.try_complete()
    }

    /// Signal end-of-stream on the repair packet path
    pub fn close_repair(&mut self) -> Result<()> {
        if self.repair_eos {
            return Ok(());
        }
        log::debug!("end-of-stream on the repair packet path");
        self.repair_eos = true;
        self.try_complete()
    }

    /// Discard all pending source blocks and reset the session state
    ///
    /// Nothing is delivered, the partial blocks are lost. The pruning
    /// reference is reset as well and is re-seeded by the first packet of
    /// the next segment. Pooled symbol buffers are kept, blocks after the
    /// flush usually reuse the same encoding symbol length.
    pub fn flush(&mut self) {
        log::debug!("flush, discarding {} pending source blocks", self.blocks.len());
        self.blocks.clear();
        self.most_recent_block_nr = 0;
        self.first_pruning = true;
        self.source_eos = false;
        self.repair_eos = false;
        self.completed = false;
    }

    fn timestamp(&self) -> Option<SystemTime> {
        self.config.timestamp_output.then(SystemTime::now)
    }

    fn insert_pkt(&mut self, id: PayloadID, pkt: &[u8], is_source_pkt: bool) -> Result<()> {
        let sbn = id.sbn;

        // The aging reference is seeded by the first inserted packet, so a
        // stream starting at a high block number is not discarded
        if !self.first_pruning
            && !aging::is_recent_enough(
                sbn,
                self.most_recent_block_nr,
                self.config.max_source_block_age,
            )
        {
            log::debug!("drop packet of too old source block #{}", sbn);
            return Ok(());
        }

        let timestamp = self.timestamp();
        let nb_source_symbols = self.config.nb_source_symbols;
        let nb_encoding_symbols = self.config.nb_encoding_symbols();
        let block = self
            .blocks
            .entry(sbn)
            .or_insert_with(|| SourceBlock::new(sbn, nb_source_symbols, nb_encoding_symbols));

        if block.completed || block.is_received(id.esi) {
            log::debug!("drop duplicate packet sbn={} esi={}", sbn, id.esi);
            return Ok(());
        }

        if is_source_pkt {
            block.mark_received(id.esi);
            block.source_esis.push(id.esi);
            // The ADU is available the moment its packet arrives, recovery
            // only ever fills the other slots
            let adu = pkt[..pkt.len() - FEC_PAYLOAD_ID_LENGTH].to_vec();
            if self.config.sort_output {
                block.output_adus[id.esi as usize] = Some(adu);
            } else {
                block.output_adus[id.esi as usize] = Some(adu.clone());
                self.writer.push_adu(adu, timestamp)?;
            }
        } else {
            // All repair packets of a block carry symbols of the same length
            if let Some((_, first)) = block.repair_pkts.first() {
                if first.len() != pkt.len() {
                    log::warn!(
                        "drop {} byte FEC repair packet of source block #{}, expected {} bytes",
                        pkt.len(),
                        sbn,
                        first.len()
                    );
                    return Ok(());
                }
            }
            block.mark_received(id.esi);
            block.repair_pkts.push((id.esi, pkt.to_vec()));
        }

        let recoverable = block.nb_pkts_received() >= nb_source_symbols;
        if recoverable {
            self.process_block(sbn)?;
        }

        self.prune(sbn)
    }

    /// Process a source block for which enough encoding symbols arrived.
    ///
    /// The block is marked complete even when recovery fails, it had its one
    /// chance and is delivered with the ADUs it has.
    fn process_block(&mut self, sbn: u32) -> Result<()> {
        let mut block = match self.blocks.remove(&sbn) {
            Some(block) => block,
            None => return Ok(()),
        };

        log::debug!(
            "process source block #{}, {} source and {} repair packets received",
            sbn,
            block.source_esis.len(),
            block.repair_pkts.len()
        );

        let result = self.recover_block(&mut block);
        block.completed = true;

        // With ordered output the completed block stays in the table until it
        // is pruned or drained. Unordered output has nothing left to deliver.
        if self.config.sort_output {
            self.blocks.insert(sbn, block);
        }
        result
    }

    fn recover_block(&mut self, block: &mut SourceBlock) -> Result<()> {
        if block.source_esis.len() == self.config.nb_source_symbols {
            // Nothing was lost
            return Ok(());
        }
        if block.repair_pkts.is_empty() {
            return Ok(());
        }

        let encoding_symbol_length = block.repair_pkts[0].1.len() - FEC_PAYLOAD_ID_LENGTH;
        self.configure_codec(encoding_symbol_length)?;

        let nb_source_symbols = self.config.nb_source_symbols;
        let mut shards: Vec<Option<Vec<u8>>> = vec![None; self.config.nb_encoding_symbols()];

        for &esi in &block.source_esis {
            let adu = match block.output_adus[esi as usize].as_ref() {
                Some(adu) => adu,
                None => continue,
            };
            if adui::encoding_symbol_length(adu.len()) > encoding_symbol_length {
                log::warn!(
                    "ADU at ESI {} of source block #{} does not fit the block's encoding symbol length",
                    esi,
                    block.sbn
                );
                continue;
            }
            let mut symbol = self.pool.take(encoding_symbol_length);
            adui::write_adui(&mut symbol, adu);
            shards[esi as usize] = Some(symbol);
        }
        for (esi, pkt) in &block.repair_pkts {
            shards[*esi as usize] = Some(pkt[FEC_PAYLOAD_ID_LENGTH..].to_vec());
        }

        let recovered = self.codec.as_ref().unwrap().decode(&mut shards)?;

        let mut result = Ok(());
        if recovered {
            let timestamp = self.timestamp();
            for esi in 0..nb_source_symbols {
                if block.is_received(esi as u8) {
                    continue;
                }
                let symbol = match shards[esi].as_ref() {
                    Some(symbol) => symbol,
                    None => continue,
                };
                let (flow_id, adu) = match adui::extract_adu(symbol) {
                    Ok(adui) => adui,
                    Err(_) => {
                        log::warn!(
                            "recovered symbol at ESI {} of source block #{} is malformed, skipping",
                            esi,
                            block.sbn
                        );
                        continue;
                    }
                };
                if flow_id != adui::ADU_FLOW_ID {
                    log::warn!(
                        "recovered ADU at ESI {} of source block #{} belongs to unsupported flow {}, skipping",
                        esi,
                        block.sbn,
                        flow_id
                    );
                    continue;
                }

                log::debug!(
                    "recovered ADU at ESI {} of source block #{}, {} bytes",
                    esi,
                    block.sbn,
                    adu.len()
                );
                // Copied out, the symbol storage goes back to the pool below
                let adu = adu.to_vec();
                if self.config.sort_output {
                    block.output_adus[esi] = Some(adu);
                } else if let Err(e) = self.writer.push_adu(adu, timestamp) {
                    result = Err(e);
                    break;
                }
            }
        } else {
            log::warn!(
                "source block #{} could not be recovered, delivering with missing ADUs",
                block.sbn
            );
        }

        for shard in shards.into_iter().flatten() {
            self.pool.put_back(shard);
        }
        result
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

    /// Evict the source blocks that aged out after the packet of block
    /// `sbn` was inserted
    fn prune(&mut self, sbn: u32) -> Result<()> {
        if self.first_pruning {
            log::debug!("pruning reference seeded with source block #{}", sbn);
            self.most_recent_block_nr = sbn;
            self.first_pruning = false;
            return Ok(());
        }
        if sbn == self.most_recent_block_nr || !aging::is_newer(sbn, self.most_recent_block_nr) {
            return Ok(());
        }
        self.most_recent_block_nr = sbn;

        let stale: Vec<u32> = self
            .blocks
            .keys()
            .filter(|block_nr| {
                !aging::is_recent_enough(**block_nr, sbn, self.config.max_source_block_age)
            })
            .copied()
            .collect();
        if stale.is_empty() {
            return Ok(());
        }

        let mut evicted: Vec<SourceBlock> = stale
            .iter()
            .filter_map(|block_nr| self.blocks.remove(block_nr))
            .collect();

        if !self.config.sort_output {
            // Their ADUs were already delivered at reception/recovery time
            log::debug!("pruned {} source blocks", evicted.len());
            return Ok(());
        }

        evicted.sort_by(|a, b| aging::cmp_block_nr(a.sbn, b.sbn));

        let mut result = Ok(());
        for block in evicted.iter_mut() {
            // A rejected delivery abandons the remaining evicted blocks
            if result.is_ok() {
                result = self.push_block(block);
            }
        }
        result
    }

    /// Remove every remaining block from the table regardless of age and,
    /// with ordered output, deliver them in order
    fn drain(&mut self) -> Result<()> {
        let mut blocks: Vec<SourceBlock> = self.blocks.drain().map(|(_, block)| block).collect();
        log::debug!("drain {} remaining source blocks", blocks.len());

        if !self.config.sort_output {
            return Ok(());
        }

        blocks.sort_by(|a, b| aging::cmp_block_nr(a.sbn, b.sbn));

        let mut result = Ok(());
        for block in blocks.iter_mut() {
            if result.is_ok() {
                result = self.push_block(block);
            }
        }
        result
    }

    fn push_block(&self, block: &mut SourceBlock) -> Result<()> {
        log::debug!(
            "push {} source block #{} downstream",
            if block.completed { "complete" } else { "incomplete" },
            block.sbn
        );

        let timestamp = self.timestamp();
        for entry in block.output_adus.iter_mut() {
            if let Some(adu) = entry.take() {
                self.writer.push_adu(adu, timestamp)?;
            }
        }
        Ok(())
    }

    fn try_complete(&mut self) -> Result<()> {
        if self.completed || !self.source_eos {
            return Ok(());
        }
        if !self.repair_eos && self.config.nb_repair_symbols > 0 {
            return Ok(());
        }

        log::debug!("both packet paths closed, draining the source block table");
        self.completed = true;
        let result = self.drain();
        self.writer.complete();
        result
    }
}
