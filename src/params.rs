//! Derived WOTS+/XMSS parameters for a given (tree height, Winternitz base) pair.

use crate::error::Error;

/// Canonical hash output size in bytes (N in the scheme's notation).
pub const HASH_BYTES: usize = 32;

/// `(h, w)` and every value derived from them: `log_w`, `len1`, `len2`, `len`,
/// and the tree capacity `2^h`.
///
/// Every on-disk artifact carries its own `(h, w)` so that loaders can reject
/// a mismatch rather than silently reinterpreting bytes under the wrong shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Params {
    h: u32,
    w: u32,
    log_w: u32,
    len1: u32,
    len2: u32,
    len: u32,
}

impl Params {
    /// Derive WOTS+ lengths and tree capacity from `(h, w)`.
    ///
    /// Fails if `w` is not a power of two, `w < 2`, or `h` is outside `[1, 32]`.
    pub fn new(h: u32, w: u32) -> Result<Self, Error> {
        if h == 0 || h > 32 {
            return Err(Error::InvalidParameters {
                h,
                w,
                reason: "tree height must be in [1, 32]",
            });
        }
        if w < 2 || !w.is_power_of_two() {
            return Err(Error::InvalidParameters {
                h,
                w,
                reason: "winternitz parameter must be a power of two and >= 2",
            });
        }

        let log_w = w.trailing_zeros();
        let len1 = (8 * HASH_BYTES as u32).div_ceil(log_w);
        // len2 = floor(log2(len1 * (w - 1)) / log_w) + 1
        let checksum_max = len1 * (w - 1);
        let floor_log2 = 31 - checksum_max.leading_zeros();
        let len2 = floor_log2 / log_w + 1;
        let len = len1 + len2;

        Ok(Params {
            h,
            w,
            log_w,
            len1,
            len2,
            len,
        })
    }

    pub fn h(&self) -> u32 {
        self.h
    }

    pub fn w(&self) -> u32 {
        self.w
    }

    pub fn log_w(&self) -> u32 {
        self.log_w
    }

    pub fn len1(&self) -> usize {
        self.len1 as usize
    }

    pub fn len2(&self) -> usize {
        self.len2 as usize
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Number of distinct leaves / signatures this key can produce: `2^h`.
    pub fn capacity(&self) -> u64 {
        1u64 << self.h
    }

    /// `len * HASH_BYTES + h * HASH_BYTES + 4`, the serialized signature size.
    pub fn signature_len(&self) -> usize {
        4 + (self.len() + self.h() as usize) * HASH_BYTES
    }
}
