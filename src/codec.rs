//! LZF block codec
//!
//! A single-pass, greedy LZ77 variant for shrinking block payloads in
//! memory. A 16384-entry hash table maps each 3-byte prefix to the most
//! recent position that started with it; only that single candidate is ever
//! tried.
//!
//! **Encoded stream**: a sequence of control bytes. Values `0..=31` start a
//! literal run of `value + 1` raw bytes. Values `32..=255` encode a
//! back-reference: the top 3 bits give a length band (band 7 reads one more
//! byte and adds it), the low 5 bits plus one following byte give the
//! offset minus one. Match lengths span 3..=264, offsets reach 8192 bytes
//! back.
//!
//! Back-reference copies proceed byte-by-byte in increasing order because a
//! reference may overlap the region still being written; self-referential
//! runs are required behavior, not an accident of implementation.
//!
//! The codec is standalone: the archive compiler stores payloads raw and
//! carries the per-block [`BlockFlags::KEEP_UNCOMPRESSED`](crate::archive::BlockFlags)
//! flag as the intended gate for wiring it in.

use crate::error::{ArchiveError, Result};

/// Number of 3-byte-prefix hash table entries.
const HASH_SIZE: usize = 16384;

/// Longest literal run a single control byte can start.
const MAX_LITERAL: usize = 32;

/// Furthest a back-reference can reach.
const MAX_OFFSET: usize = 8192;

/// Longest encodable match (band 7 plus one extension byte).
const MAX_MATCH: usize = 264;

/// Shortest match worth encoding.
const MIN_MATCH: usize = 3;

/// Control values below this are literal runs.
const LITERAL_CEILING: u8 = 32;

#[inline]
fn prefix_hash(a: u8, b: u8, c: u8) -> usize {
    let v = ((a as u32) << 16) | ((b as u32) << 8) | c as u32;
    (v.wrapping_mul(0x9E37_79B1) >> 18) as usize & (HASH_SIZE - 1)
}

/// Compress `src` into a fresh buffer.
///
/// Always succeeds; incompressible input comes out slightly larger than it
/// went in (literal run control bytes every 32 bytes). Callers that only
/// want a win should use [`compress_if_smaller`].
pub fn compress(src: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(src.len() + src.len() / MAX_LITERAL + 1);
    let mut table = vec![usize::MAX; HASH_SIZE];

    let mut lit_start = 0;
    let mut i = 0;
    while i < src.len() {
        if i + MIN_MATCH <= src.len() {
            let slot = prefix_hash(src[i], src[i + 1], src[i + 2]);
            let candidate = table[slot];
            table[slot] = i;

            if candidate != usize::MAX {
                let offset = i - candidate;
                if offset <= MAX_OFFSET && src[candidate..candidate + MIN_MATCH] == src[i..i + MIN_MATCH]
                {
                    flush_literals(&mut out, &src[lit_start..i]);

                    let limit = MAX_MATCH.min(src.len() - i);
                    let mut len = MIN_MATCH;
                    while len < limit && src[candidate + len] == src[i + len] {
                        len += 1;
                    }
                    emit_match(&mut out, len, offset);

                    // Refresh the table for the two positions at the end of
                    // the match so following data can still find it.
                    let end = i + len;
                    for p in end.saturating_sub(2)..end {
                        if p + MIN_MATCH <= src.len() {
                            table[prefix_hash(src[p], src[p + 1], src[p + 2])] = p;
                        }
                    }

                    i = end;
                    lit_start = i;
                    continue;
                }
            }
        }
        i += 1;
    }
    flush_literals(&mut out, &src[lit_start..]);
    out
}

/// Compress `src`, returning the result only when it is strictly smaller
/// than the input.
pub fn compress_if_smaller(src: &[u8]) -> Option<Vec<u8>> {
    let compressed = compress(src);
    (compressed.len() < src.len()).then_some(compressed)
}

/// Expand an LZF stream back into `expected_len` bytes.
///
/// Fails with [`ArchiveError::TruncatedInput`] when the stream ends early,
/// [`ArchiveError::TruncatedOutput`] when a run or copy would overshoot the
/// destination size, and [`ArchiveError::InvalidBackReference`] when a
/// reference reaches before the start of the output.
pub fn expand(src: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(expected_len);
    let mut ip = 0;

    while out.len() < expected_len {
        let ctrl = *src.get(ip).ok_or(ArchiveError::TruncatedInput)?;
        ip += 1;

        if ctrl < LITERAL_CEILING {
            let run = ctrl as usize + 1;
            let literals = src
                .get(ip..ip + run)
                .ok_or(ArchiveError::TruncatedInput)?;
            ip += run;
            if out.len() + run > expected_len {
                return Err(ArchiveError::TruncatedOutput);
            }
            out.extend_from_slice(literals);
        } else {
            let mut band = (ctrl >> 5) as usize;
            if band == 7 {
                band += *src.get(ip).ok_or(ArchiveError::TruncatedInput)? as usize;
                ip += 1;
            }
            let len = band + 2;

            let offset_low = *src.get(ip).ok_or(ArchiveError::TruncatedInput)? as usize;
            ip += 1;
            let offset = (((ctrl & 0x1F) as usize) << 8 | offset_low) + 1;

            if offset > out.len() {
                return Err(ArchiveError::InvalidBackReference);
            }
            if out.len() + len > expected_len {
                return Err(ArchiveError::TruncatedOutput);
            }

            // Byte-by-byte in increasing order; the reference may overlap
            // the bytes this loop is producing.
            let start = out.len() - offset;
            for k in 0..len {
                let byte = out[start + k];
                out.push(byte);
            }
        }
    }

    Ok(out)
}

fn flush_literals(out: &mut Vec<u8>, literals: &[u8]) {
    for chunk in literals.chunks(MAX_LITERAL) {
        out.push((chunk.len() - 1) as u8);
        out.extend_from_slice(chunk);
    }
}

fn emit_match(out: &mut Vec<u8>, len: usize, offset: usize) {
    debug_assert!((MIN_MATCH..=MAX_MATCH).contains(&len));
    debug_assert!((1..=MAX_OFFSET).contains(&offset));

    let band = len - 2;
    let stored_offset = offset - 1;
    let offset_high = (stored_offset >> 8) as u8;

    if band < 7 {
        out.push(((band as u8) << 5) | offset_high);
    } else {
        out.push((7 << 5) | offset_high);
        out.push((band - 7) as u8);
    }
    out.push(stored_offset as u8);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};

    fn round_trip(data: &[u8]) {
        let compressed = compress(data);
        let expanded = expand(&compressed, data.len()).unwrap();
        assert_eq!(expanded, data, "round trip failed for {} bytes", data.len());
    }

    #[test]
    fn test_empty_input() {
        assert!(compress(&[]).is_empty());
        assert!(expand(&[], 0).unwrap().is_empty());
    }

    #[test]
    fn test_short_inputs() {
        for len in 1..=8 {
            round_trip(&vec![0x5A; len]);
            round_trip(&(0..len as u8).collect::<Vec<u8>>());
        }
    }

    #[test]
    fn test_repetitive_data_shrinks() {
        let data = b"the quick brown fox ".repeat(64);
        let compressed = compress(&data);
        assert!(compressed.len() < data.len() / 2);
        assert_eq!(expand(&compressed, data.len()).unwrap(), data);
    }

    #[test]
    fn test_random_data_round_trips() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(0x5EED);
        for len in [1, 100, 1000, 10_000] {
            let data: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
            round_trip(&data);
        }
    }

    #[test]
    fn test_literal_run_boundaries() {
        // Incompressible runs straddling the 32-byte literal-run limit
        for len in [31, 32, 33, 63, 64, 65] {
            let data: Vec<u8> = (0..len).map(|i| (i * 97 + 13) as u8).collect();
            round_trip(&data);
        }
    }

    #[test]
    fn test_match_length_boundaries() {
        // A long run of one byte produces matches at the 264-byte ceiling
        for len in [263, 264, 265, 266, 530] {
            round_trip(&vec![0xAB; len]);
        }
    }

    #[test]
    fn test_self_overlapping_reference() {
        // Period-3 data forces references whose offset is smaller than
        // their length
        let data: Vec<u8> = b"abc".iter().cycle().take(300).copied().collect();
        round_trip(&data);
    }

    #[test]
    fn test_offset_window_limit() {
        // Identical chunks further apart than 8192 bytes cannot reference
        // each other; nearer ones can. Either way the stream must decode.
        let mut data = vec![0u8; 9000];
        data[..64].copy_from_slice(&[0xCD; 64]);
        data[8936..].copy_from_slice(&[0xCD; 64]);
        round_trip(&data);
    }

    #[test]
    fn test_expand_truncated_input() {
        let data = b"truncation test truncation test truncation test".to_vec();
        let compressed = compress(&data);
        let result = expand(&compressed[..compressed.len() - 1], data.len());
        assert_eq!(result, Err(ArchiveError::TruncatedInput));
    }

    #[test]
    fn test_expand_overrun_is_an_error() {
        // A 4-byte literal run into a 2-byte destination
        let stream = [3u8, b'a', b'b', b'c', b'd'];
        assert_eq!(expand(&stream, 2), Err(ArchiveError::TruncatedOutput));
    }

    #[test]
    fn test_expand_rejects_reference_before_start() {
        // Back-reference with offset 1 at output position 0
        let stream = [0b0010_0000u8, 0x00];
        assert_eq!(expand(&stream, 3), Err(ArchiveError::InvalidBackReference));
    }

    #[test]
    fn test_compress_if_smaller() {
        let repetitive = vec![7u8; 512];
        assert!(compress_if_smaller(&repetitive).is_some());

        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let random: Vec<u8> = (0..512).map(|_| rng.gen()).collect();
        assert!(compress_if_smaller(&random).is_none());
    }
}
