use crate::tools::error::{Result, RsFecError};

/// Bytes prepended to an ADU to form an ADUI: flow id (1 byte) and
/// ADU length (16-bit big-endian)
pub const ADUI_HEADER_LENGTH: usize = 3;

/// Maximum ADU size, limited by the 16-bit length field of the ADUI
pub const MAX_ADU_LENGTH: usize = 65535;

/// Flow id of every ADUI, only a single ADU flow (flow 0) is supported
pub const ADU_FLOW_ID: u8 = 0;

/// Encoding symbol length of a block whose longest ADU has the given length
pub fn encoding_symbol_length(max_adu_length: usize) -> usize {
    ADUI_HEADER_LENGTH + max_adu_length
}

/// Write an ADUI into `symbol`: flow id, ADU length, ADU bytes, zero padding.
///
/// `symbol.len()` is the encoding symbol length of the block and must be at
/// least `adu.len() + 3`.
pub fn write_adui(symbol: &mut [u8], adu: &[u8]) {
    debug_assert!(adu.len() + ADUI_HEADER_LENGTH <= symbol.len());

    symbol[0] = ADU_FLOW_ID;
    symbol[1] = ((adu.len() >> 8) & 0xFF) as u8;
    symbol[2] = (adu.len() & 0xFF) as u8;
    symbol[ADUI_HEADER_LENGTH..ADUI_HEADER_LENGTH + adu.len()].copy_from_slice(adu);
    symbol[ADUI_HEADER_LENGTH + adu.len()..].fill(0);
}

/// Extract the flow id and the ADU bytes from an ADUI symbol
pub fn extract_adu(symbol: &[u8]) -> Result<(u8, &[u8])> {
    if symbol.len() < ADUI_HEADER_LENGTH {
        return Err(RsFecError::new(format!(
            "symbol too short to contain an ADUI header ({} bytes)",
            symbol.len()
        )));
    }

    let flow_id = symbol[0];
    let adu_length = ((symbol[1] as usize) << 8) | (symbol[2] as usize);
    if ADUI_HEADER_LENGTH + adu_length > symbol.len() {
        return Err(RsFecError::new(format!(
            "ADUI declares {} ADU bytes but symbol is only {} bytes long",
            adu_length,
            symbol.len()
        )));
    }

    Ok((
        flow_id,
        &symbol[ADUI_HEADER_LENGTH..ADUI_HEADER_LENGTH + adu_length],
    ))
}
