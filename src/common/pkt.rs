/// A framed FEC packet produced by the encoder
///
/// Source packets are the ADU bytes followed by the 6-byte FEC payload ID,
/// repair packets are the payload ID followed by the repair symbol bytes.
#[derive(Debug)]
pub struct Pkt {
    /// Wire representation of this packet
    pub payload: Vec<u8>,
    /// Source block number
    pub sbn: u32,
    /// Encoding Symbol ID
    pub esi: u8,
    /// `true` for a FEC source packet, `false` for a FEC repair packet
    pub is_source_packet: bool,
}
