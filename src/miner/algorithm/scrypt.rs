//! Scrypt key derivation implementation
//!
//! Implements the memory-hard Scrypt function used as the proof-of-work hash
//! by Litecoin and related coins, built up from:
//! - HMAC-SHA256 and single-iteration PBKDF2-HMAC-SHA256
//! - The Salsa20/8 core
//! - BlockMix and ROMix over an `N`-entry scratchpad
//!
//! All word arithmetic is unsigned 32-bit with wraparound, so results are
//! bit-exact with other Scrypt implementations. The same [`scrypt`] function
//! serves as a general password KDF.

use crate::miner::algorithm::Algorithm;
use crate::utils::error::MinerError;
use rayon::prelude::*;
use sha2::{Digest, Sha256};

const SHA256_BLOCK_LEN: usize = 64;

/// Scrypt cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScryptParams {
    /// CPU/memory cost; must be a power of two greater than one
    pub n: u64,
    /// Block size factor
    pub r: u32,
    /// Parallelization factor
    pub p: u32,
}

impl ScryptParams {
    /// Parameters used by Litecoin-family proof-of-work
    pub const LITECOIN: ScryptParams = ScryptParams { n: 1024, r: 1, p: 1 };

    /// Checks the parameter constraints before any work is done
    ///
    /// Rejects `N` that is not a power of two (or is below 2), `r` or `p`
    /// of zero, and `r·p ≥ 2^30`.
    pub fn validate(&self) -> Result<(), MinerError> {
        if self.n < 2 || !self.n.is_power_of_two() {
            return Err(MinerError::CryptoError(format!(
                "N must be a power of two greater than 1, got {}",
                self.n
            )));
        }
        if self.r == 0 || self.p == 0 {
            return Err(MinerError::CryptoError(format!(
                "r and p must be non-zero, got r={} p={}",
                self.r, self.p
            )));
        }
        if (self.r as u64) * (self.p as u64) >= 1 << 30 {
            return Err(MinerError::CryptoError(format!(
                "r*p must be below 2^30, got r={} p={}",
                self.r, self.p
            )));
        }
        Ok(())
    }
}

/// Derives `dk_len` bytes from `password` and `salt` with Scrypt
///
/// # Errors
/// Returns `MinerError::CryptoError` without doing any hashing when the
/// parameters violate the Scrypt constraints or `dk_len ≥ 2^32`.
///
/// # Example
/// ```
/// use scrypt_miner_rs::miner::algorithm::scrypt::scrypt;
/// let key = scrypt(b"password", b"NaCl", 16, 1, 1, 32).unwrap();
/// assert_eq!(key.len(), 32);
/// ```
pub fn scrypt(
    password: &[u8],
    salt: &[u8],
    n: u64,
    r: u32,
    p: u32,
    dk_len: usize,
) -> Result<Vec<u8>, MinerError> {
    let params = ScryptParams { n, r, p };
    params.validate()?;
    if dk_len as u64 >= 1 << 32 {
        return Err(MinerError::CryptoError(format!(
            "dkLen must be below 2^32, got {}",
            dk_len
        )));
    }

    let r = r as usize;
    let block_len = 128 * r;
    let mut blocks = pbkdf2_hmac_sha256(password, salt, block_len * p as usize);

    if p > 1 {
        blocks
            .par_chunks_mut(block_len)
            .for_each(|block| romix(block, n, r));
    } else {
        romix(&mut blocks, n, r);
    }

    Ok(pbkdf2_hmac_sha256(password, &blocks, dk_len))
}

/// HMAC-SHA256 with pre-keyed inner and outer states
#[derive(Clone)]
pub struct HmacSha256 {
    inner: Sha256,
    outer: Sha256,
}

impl HmacSha256 {
    /// Keys a new HMAC instance
    pub fn new(key: &[u8]) -> Self {
        let mut block = [0u8; SHA256_BLOCK_LEN];
        if key.len() > SHA256_BLOCK_LEN {
            block[..32].copy_from_slice(&Sha256::digest(key));
        } else {
            block[..key.len()].copy_from_slice(key);
        }

        let mut ipad = [0x36u8; SHA256_BLOCK_LEN];
        let mut opad = [0x5cu8; SHA256_BLOCK_LEN];
        for i in 0..SHA256_BLOCK_LEN {
            ipad[i] ^= block[i];
            opad[i] ^= block[i];
        }

        let mut inner = Sha256::new();
        inner.update(ipad);
        let mut outer = Sha256::new();
        outer.update(opad);

        HmacSha256 { inner, outer }
    }

    /// Absorbs message bytes
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Produces the 32-byte MAC
    pub fn finalize(self) -> [u8; 32] {
        let inner = self.inner.finalize();
        let mut outer = self.outer;
        outer.update(inner);
        outer.finalize().into()
    }

    /// One-shot MAC of `data` under `key`
    pub fn mac(key: &[u8], data: &[u8]) -> [u8; 32] {
        let mut hmac = HmacSha256::new(key);
        hmac.update(data);
        hmac.finalize()
    }
}

/// PBKDF2-HMAC-SHA256 with a single iteration
///
/// With one iteration each output block is just `HMAC(P, S || INT(i))`.
pub fn pbkdf2_hmac_sha256(password: &[u8], salt: &[u8], dk_len: usize) -> Vec<u8> {
    let mut keyed = HmacSha256::new(password);
    keyed.update(salt);

    let mut output = Vec::with_capacity(dk_len);
    let mut index: u32 = 1;
    while output.len() < dk_len {
        let mut hmac = keyed.clone();
        hmac.update(&index.to_be_bytes());
        let block = hmac.finalize();
        let take = (dk_len - output.len()).min(block.len());
        output.extend_from_slice(&block[..take]);
        index = index.wrapping_add(1);
    }
    output
}

#[inline(always)]
fn quarter_round(x: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize) {
    x[b] ^= x[a].wrapping_add(x[d]).rotate_left(7);
    x[c] ^= x[b].wrapping_add(x[a]).rotate_left(9);
    x[d] ^= x[c].wrapping_add(x[b]).rotate_left(13);
    x[a] ^= x[d].wrapping_add(x[c]).rotate_left(18);
}

/// Salsa20/8 core: four double rounds, then the input is added back
pub fn salsa20_8(block: &mut [u32; 16]) {
    let mut x = *block;
    for _ in 0..4 {
        // Columns
        quarter_round(&mut x, 0, 4, 8, 12);
        quarter_round(&mut x, 5, 9, 13, 1);
        quarter_round(&mut x, 10, 14, 2, 6);
        quarter_round(&mut x, 15, 3, 7, 11);
        // Rows
        quarter_round(&mut x, 0, 1, 2, 3);
        quarter_round(&mut x, 5, 6, 7, 4);
        quarter_round(&mut x, 10, 11, 8, 9);
        quarter_round(&mut x, 15, 12, 13, 14);
    }
    for (out, mixed) in block.iter_mut().zip(x.iter()) {
        *out = out.wrapping_add(*mixed);
    }
}

/// BlockMix over `2r` 16-word sub-blocks
///
/// Even-indexed Salsa outputs land in the first half of `output`, odd ones
/// in the second half.
fn block_mix(input: &[u32], output: &mut [u32], r: usize) {
    let mut x = [0u32; 16];
    x.copy_from_slice(&input[(2 * r - 1) * 16..2 * r * 16]);

    for i in 0..2 * r {
        for (xw, bw) in x.iter_mut().zip(&input[i * 16..(i + 1) * 16]) {
            *xw ^= *bw;
        }
        salsa20_8(&mut x);
        let dest = (i / 2 + (i % 2) * r) * 16;
        output[dest..dest + 16].copy_from_slice(&x);
    }
}

/// Integerify: the first 64 bits of the last sub-block, little-endian
#[inline]
fn integerify(x: &[u32], r: usize) -> u64 {
    let base = (2 * r - 1) * 16;
    (x[base] as u64) | ((x[base + 1] as u64) << 32)
}

/// ROMix on one `128·r`-byte block, in place
fn romix(block: &mut [u8], n: u64, r: usize) {
    let words = 32 * r;
    let mut x: Vec<u32> = block
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    let mut y = vec![0u32; words];
    let mut scratch = vec![0u32; words * n as usize];

    for i in 0..n as usize {
        scratch[i * words..(i + 1) * words].copy_from_slice(&x);
        block_mix(&x, &mut y, r);
        std::mem::swap(&mut x, &mut y);
    }

    for _ in 0..n {
        let j = (integerify(&x, r) & (n - 1)) as usize;
        for (xw, vw) in x.iter_mut().zip(&scratch[j * words..(j + 1) * words]) {
            *xw ^= *vw;
        }
        block_mix(&x, &mut y, r);
        std::mem::swap(&mut x, &mut y);
    }

    for (chunk, word) in block.chunks_exact_mut(4).zip(x.iter()) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
}

/// Scrypt proof-of-work hash over block headers
///
/// Hashes a header as `scrypt(header, header, N, r, p, 32)`, the convention
/// used by Litecoin-family coins.
#[derive(Debug, Clone, Copy)]
pub struct ScryptAlgo {
    params: ScryptParams,
}

impl ScryptAlgo {
    /// Creates a hasher for the given cost parameters
    ///
    /// # Errors
    /// Returns `MinerError::CryptoError` if the parameters are invalid.
    pub fn new(params: ScryptParams) -> Result<Self, MinerError> {
        params.validate()?;
        Ok(Self { params })
    }
}

impl Algorithm for ScryptAlgo {
    fn hash(&self, header: &[u8]) -> Result<[u8; 32], MinerError> {
        let ScryptParams { n, r, p } = self.params;
        let digest = scrypt(header, header, n, r, p, 32)?;
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "scrypt"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_hmac_sha256_rfc4231_case2() {
        let mac = HmacSha256::mac(b"Jefe", b"what do ya want for nothing?");
        assert_eq!(
            mac,
            hex!("5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843")
        );
    }

    #[test]
    fn test_pbkdf2_single_iteration_vector() {
        let dk = pbkdf2_hmac_sha256(b"passwd", b"salt", 64);
        assert_eq!(
            dk,
            hex!(
                "55ac046e56e3089fec1691c22544b605f94185216dde0465e68b9d57c20dacbc"
                "49ca9cccf179b645991664b39d77ef317c71b845b1e30bd509112041d3a19783"
            )
        );
    }

    #[test]
    fn test_salsa20_8_core_vector() {
        let input = hex!(
            "7e879a214f3ec9867ca940e641718f26baee555b8c61c1b50df846116dcd3b1d"
            "ee24f319df9b3d8514121e4b5ac5aa3276021d2909c74829edebc68db8b8c25e"
        );
        let expected = hex!(
            "a41f859c6608cc993b81cacb020cef05044b2181a2fd337dfd7b1c6396682f29"
            "b4393168e3c9e6bcfe6bc5b7a06d96bae424cc102c91745c24ad673dc7618f81"
        );

        let mut block = [0u32; 16];
        for (word, chunk) in block.iter_mut().zip(input.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        salsa20_8(&mut block);

        let out: Vec<u8> = block.iter().flat_map(|w| w.to_le_bytes()).collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_scrypt_empty_vector() {
        let dk = scrypt(b"", b"", 16, 1, 1, 64).unwrap();
        assert_eq!(
            dk,
            hex!(
                "77d6576238657b203b19ca42c18a0497f16b4844e3074ae8dfdffa3fede21442"
                "fcd0069ded0948f8326a753a0fc81f17e8d3e0fb2e0d3628cf35e20c38d18906"
            )
        );
    }

    #[test]
    fn test_scrypt_password_nacl_vector() {
        let dk = scrypt(b"password", b"NaCl", 1024, 8, 16, 64).unwrap();
        assert_eq!(
            dk,
            hex!(
                "fdbabe1c9d3472007856e7190d01e9fe7c6ad7cbc8237830e77376634b373162"
                "2eaf30d92e22a3886ff109279d9830dac727afb94a83ee6d8360cbdfa2cc0640"
            )
        );
    }

    #[test]
    fn test_invalid_params_fail_fast() {
        assert!(matches!(
            scrypt(b"p", b"s", 1000, 1, 1, 32),
            Err(MinerError::CryptoError(_))
        ));
        assert!(scrypt(b"p", b"s", 1, 1, 1, 32).is_err());
        assert!(scrypt(b"p", b"s", 16, 1 << 15, 1 << 15, 32).is_err());
        assert!(scrypt(b"p", b"s", 16, 0, 1, 32).is_err());
    }

    #[test]
    fn test_short_output_is_prefix_of_long_output() {
        let long = scrypt(b"pw", b"salt", 16, 1, 1, 64).unwrap();
        let short = scrypt(b"pw", b"salt", 16, 1, 1, 20).unwrap();
        assert_eq!(&long[..20], &short[..]);
    }

    #[test]
    fn test_scrypt_algo_hashes_header_with_itself_as_salt() {
        let algo = ScryptAlgo::new(ScryptParams::LITECOIN).unwrap();
        let header = [0x5au8; 80];
        let hash = algo.hash(&header).unwrap();
        let direct = scrypt(&header, &header, 1024, 1, 1, 32).unwrap();
        assert_eq!(&hash[..], &direct[..]);
        assert!(ScryptAlgo::new(ScryptParams { n: 3, r: 1, p: 1 }).is_err());
    }
}
