/// Reception state of a single source block.
///
/// A source block exists from the first packet referencing its block number
/// until it is pruned, drained or (in immediate output mode) processed. ADUs
/// of received source packets are extracted into `output_adus` at insertion
/// time; recovered ADUs are added there during block processing.
#[derive(Debug)]
pub struct SourceBlock {
    /// Number of this source block
    pub sbn: u32,
    /// Presence flag per ESI, sized to the configured number of
    /// encoding symbols
    received: Vec<bool>,
    /// ESIs of the received FEC source packets, unordered
    pub source_esis: Vec<u8>,
    /// Received FEC repair packets with their ESI, unordered
    pub repair_pkts: Vec<(u8, Vec<u8>)>,
    /// ADUs awaiting delivery, indexed by ESI
    pub output_adus: Vec<Option<Vec<u8>>>,
    /// true once this block has been processed. A complete block discards
    /// any further packet referencing it.
    pub completed: bool,
}

impl SourceBlock {
    pub fn new(sbn: u32, nb_source_symbols: usize, nb_encoding_symbols: usize) -> SourceBlock {
        SourceBlock {
            sbn,
            received: vec![false; nb_encoding_symbols],
            source_esis: Vec::new(),
            repair_pkts: Vec::new(),
            output_adus: vec![None; nb_source_symbols],
            completed: false,
        }
    }

    pub fn is_received(&self, esi: u8) -> bool {
        self.received[esi as usize]
    }

    pub fn mark_received(&mut self, esi: u8) {
        self.received[esi as usize] = true;
    }

    /// Recovery can be attempted once at least k encoding symbols of the
    /// block have been received
    pub fn nb_pkts_received(&self) -> usize {
        self.source_esis.len() + self.repair_pkts.len()
    }
}
