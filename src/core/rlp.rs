//! Minimal RLP encoder
//!
//! Only the encoding side is needed: transactions are built and signed
//! here, never parsed back from the wire.

/// An RLP item: a byte string or a list of items
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RlpItem {
    Bytes(Vec<u8>),
    List(Vec<RlpItem>),
}

impl RlpItem {
    /// Unsigned integer as a big-endian byte string with no leading zeros
    pub fn uint(value: u128) -> Self {
        RlpItem::Bytes(trim_leading_zeros(&value.to_be_bytes()).to_vec())
    }

    /// Big-endian 32-byte scalar (signature r/s) with leading zeros stripped
    pub fn scalar(bytes: &[u8; 32]) -> Self {
        RlpItem::Bytes(trim_leading_zeros(bytes).to_vec())
    }

    pub fn bytes(bytes: &[u8]) -> Self {
        RlpItem::Bytes(bytes.to_vec())
    }
}

fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

/// Encode an item
pub fn encode(item: &RlpItem) -> Vec<u8> {
    let mut out = Vec::new();
    encode_into(item, &mut out);
    out
}

fn encode_into(item: &RlpItem, out: &mut Vec<u8>) {
    match item {
        RlpItem::Bytes(bytes) => {
            if bytes.len() == 1 && bytes[0] < 0x80 {
                out.push(bytes[0]);
            } else {
                encode_length(bytes.len(), 0x80, out);
                out.extend_from_slice(bytes);
            }
        }
        RlpItem::List(items) => {
            let mut payload = Vec::new();
            for item in items {
                encode_into(item, &mut payload);
            }
            encode_length(payload.len(), 0xc0, out);
            out.extend_from_slice(&payload);
        }
    }
}

fn encode_length(len: usize, offset: u8, out: &mut Vec<u8>) {
    if len <= 55 {
        out.push(offset + len as u8);
    } else {
        let len_bytes = (len as u64).to_be_bytes();
        let len_bytes = trim_leading_zeros(&len_bytes);
        out.push(offset + 55 + len_bytes.len() as u8);
        out.extend_from_slice(len_bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_strings() {
        assert_eq!(encode(&RlpItem::bytes(b"dog")), vec![0x83, b'd', b'o', b'g']);
        assert_eq!(encode(&RlpItem::bytes(b"")), vec![0x80]);
        assert_eq!(encode(&RlpItem::bytes(&[0x0f])), vec![0x0f]);
        assert_eq!(encode(&RlpItem::bytes(&[0x80])), vec![0x81, 0x80]);
    }

    #[test]
    fn test_encode_integers() {
        assert_eq!(encode(&RlpItem::uint(0)), vec![0x80]);
        assert_eq!(encode(&RlpItem::uint(15)), vec![0x0f]);
        assert_eq!(encode(&RlpItem::uint(1024)), vec![0x82, 0x04, 0x00]);
    }

    #[test]
    fn test_encode_lists() {
        let list = RlpItem::List(vec![RlpItem::bytes(b"cat"), RlpItem::bytes(b"dog")]);
        assert_eq!(
            encode(&list),
            vec![0xc8, 0x83, b'c', b'a', b't', 0x83, b'd', b'o', b'g']
        );
        assert_eq!(encode(&RlpItem::List(vec![])), vec![0xc0]);
    }

    #[test]
    fn test_encode_long_string() {
        let data = vec![b'a'; 56];
        let encoded = encode(&RlpItem::bytes(&data));
        assert_eq!(&encoded[..2], &[0xb8, 56]);
        assert_eq!(encoded.len(), 58);
    }
}
