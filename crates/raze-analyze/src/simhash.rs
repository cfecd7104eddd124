//! 64-bit simhash over word shingles.

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Split text into lower-cased runs of ASCII alphanumerics and `_`.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .map(str::to_ascii_lowercase)
        .collect()
}

/// Overlapping `k`-token shingles joined by a single space.
///
/// Fewer than `k` tokens yield the whole sequence as one shingle (possibly empty).
pub fn shingles(tokens: &[String], k: usize) -> Vec<String> {
    let k = k.max(1);
    if tokens.len() < k {
        return vec![tokens.join(" ")];
    }
    tokens.windows(k).map(|w| w.join(" ")).collect()
}

/// 64-bit FNV-1a.
pub fn fnv1a64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |h, &b| (h ^ u64::from(b)).wrapping_mul(FNV_PRIME))
}

/// Simhash of a text using `k`-token shingles.
///
/// Bit `i` is set iff at least as many shingle hashes have it set as unset.
pub fn simhash64(text: &str, k: usize) -> u64 {
    let mut votes = [0i64; 64];
    for shingle in shingles(&tokenize(text), k) {
        let h = fnv1a64(shingle.as_bytes());
        for (bit, vote) in votes.iter_mut().enumerate() {
            if (h >> bit) & 1 == 1 {
                *vote += 1;
            } else {
                *vote -= 1;
            }
        }
    }

    votes
        .iter()
        .enumerate()
        .filter(|(_, v)| **v >= 0)
        .fold(0u64, |out, (bit, _)| out | (1 << bit))
}
