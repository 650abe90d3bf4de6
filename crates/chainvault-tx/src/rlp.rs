//! Recursive Length Prefix encoding.
//!
//! Only the encoder side is needed: the wallet builds payloads, it never
//! parses transactions it did not produce.

/// Encode a byte string.
pub fn encode_bytes(bytes: &[u8]) -> Vec<u8> {
    if bytes.len() == 1 && bytes[0] < 0x80 {
        return vec![bytes[0]];
    }
    let mut out = length_prefix(bytes.len(), 0x80);
    out.extend_from_slice(bytes);
    out
}

/// Encode an unsigned integer as its minimal big-endian byte string.
/// Zero encodes as the empty string.
pub fn encode_uint(value: u128) -> Vec<u8> {
    encode_bytes(&trim_leading_zeros(&value.to_be_bytes()))
}

/// Encode a big-endian integer given as raw bytes (e.g. signature `r`/`s`).
pub fn encode_uint_bytes(be: &[u8]) -> Vec<u8> {
    encode_bytes(trim_leading_zeros(be))
}

fn trim_leading_zeros(be: &[u8]) -> &[u8] {
    let start = be.iter().position(|&b| b != 0).unwrap_or(be.len());
    &be[start..]
}

fn length_prefix(len: usize, offset: u8) -> Vec<u8> {
    if len < 56 {
        vec![offset + len as u8]
    } else {
        let len_bytes = trim_leading_zeros(&len.to_be_bytes()).to_vec();
        let mut out = Vec::with_capacity(1 + len_bytes.len());
        out.push(offset + 55 + len_bytes.len() as u8);
        out.extend_from_slice(&len_bytes);
        out
    }
}

/// Builder for an RLP list whose items are appended in order.
#[derive(Debug, Default, Clone)]
pub struct RlpList {
    payload: Vec<u8>,
}

impl RlpList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.payload.extend(encode_bytes(bytes));
        self
    }

    pub fn uint(&mut self, value: u128) -> &mut Self {
        self.payload.extend(encode_uint(value));
        self
    }

    pub fn uint_bytes(&mut self, be: &[u8]) -> &mut Self {
        self.payload.extend(encode_uint_bytes(be));
        self
    }

    /// Append an already-encoded item (typically a nested list)
    pub fn raw(&mut self, encoded: &[u8]) -> &mut Self {
        self.payload.extend_from_slice(encoded);
        self
    }

    pub fn finish(&self) -> Vec<u8> {
        let mut out = length_prefix(self.payload.len(), 0xc0);
        out.extend_from_slice(&self.payload);
        out
    }
}
