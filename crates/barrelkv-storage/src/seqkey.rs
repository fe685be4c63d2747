//! Transaction-sequence key prefix.
//!
//! Rather than a separate write-ahead log, batch identity is smuggled into
//! the on-disk key via a varint-encoded sequence number. Every read must
//! strip the prefix before the key reaches a caller; this module is the
//! single point of truth for that shape, used by the engine's recovery scan,
//! the batch writer, and the merge pipeline alike.

use integer_encoding::VarInt;

/// Prefixes `key` with `seq`'s unsigned varint encoding.
#[must_use]
pub fn encode(seq: u64, key: &[u8]) -> Vec<u8> {
    let mut varint_buf = [0u8; 10];
    let n = seq.encode_var(&mut varint_buf);
    let mut out = Vec::with_capacity(n + key.len());
    out.extend_from_slice(&varint_buf[..n]);
    out.extend_from_slice(key);
    out
}

/// Splits a seq-prefixed key back into `(seq, real_key)`. `None` if `raw`
/// doesn't even have a valid varint prefix (not a key this engine wrote).
#[must_use]
pub fn decode(raw: &[u8]) -> Option<(u64, &[u8])> {
    let (seq, n) = u64::decode_var(raw)?;
    Some((seq, &raw[n..]))
}
