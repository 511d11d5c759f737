use sha3::{Digest, Keccak256};

/// EIP-55 mixed-case checksum of a hex EVM address
///
/// Returns `None` if `address` is not 20 bytes of hex with a `0x` prefix.
pub fn to_checksum_address(address: &str) -> Option<String> {
    let hex_part = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))?;
    if hex_part.len() != 40 || !hex_part.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let lower = hex_part.to_ascii_lowercase();
    let hash = hex::encode(Keccak256::digest(lower.as_bytes()));

    let checksummed: String = lower
        .chars()
        .zip(hash.chars())
        .map(|(c, h)| {
            if c.is_ascii_alphabetic() && h.to_digit(16).unwrap_or(0) >= 8 {
                c.to_ascii_uppercase()
            } else {
                c
            }
        })
        .collect();

    Some(format!("0x{}", checksummed))
}
