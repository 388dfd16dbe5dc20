//! Bit-exact binary layout for signatures, key files, and state files, plus
//! the write-temp-then-rename atomicity every on-disk mutation goes through.

use std::fs::{self, File};
use std::io::{Read as _, Write as _};
use std::path::Path;

use crate::crypto::hash::N;
use crate::error::Error;
use crate::params::Params;
use crate::tree::AuthPath;
use crate::wots::Chain;

/// Hard ceiling on a serialized signature, matching the deployment default
/// this scheme ships with. Not a fundamental XMSS limit — a caller picking
/// (h, w) that exceeds it gets `InvalidParameters` at keygen time rather than
/// a signature that silently can't be written to `sig.bin`.
pub const MAX_SIGNATURE_BYTES: usize = 4096;

/// A complete XMSS signature: the leaf that produced it, its WOTS+ signature
/// chains, and the authentication path up to the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub leaf_index: u32,
    pub wots_sig: Vec<Chain>,
    pub auth_path: AuthPath,
}

/// `[u32 leaf_index][len*N bytes wots sig][h*N bytes auth path]`, little-endian.
///
/// Fails with `MalformedSignature` if the parameters describe a signature
/// longer than [`MAX_SIGNATURE_BYTES`] — this is the enforcement point for
/// the wire-size cap, independent of whether the key behind `sig` was ever
/// produced through `Signer::keygen`.
pub fn serialize_sig(params: &Params, sig: &Signature) -> Result<Vec<u8>, Error> {
    let expected = params.signature_len();
    if expected > MAX_SIGNATURE_BYTES {
        return Err(Error::MalformedSignature {
            reason: format!(
                "(h={}, w={}) signature length {expected} exceeds the {MAX_SIGNATURE_BYTES}-byte cap",
                params.h(),
                params.w(),
            ),
        });
    }

    let mut out = Vec::with_capacity(expected);
    out.extend_from_slice(&sig.leaf_index.to_le_bytes());
    for chain in &sig.wots_sig {
        out.extend_from_slice(chain);
    }
    for node in sig.auth_path.nodes() {
        out.extend_from_slice(node);
    }
    Ok(out)
}

/// Parse a signature serialized by [`serialize_sig`] under the given `params`.
pub fn deserialize_sig(params: &Params, bytes: &[u8]) -> Result<Signature, Error> {
    let expected = params.signature_len();
    if bytes.len() != expected {
        return Err(Error::MalformedSignature {
            reason: format!(
                "expected {expected} bytes for (h={}, w={}), got {}",
                params.h(),
                params.w(),
                bytes.len()
            ),
        });
    }

    let leaf_index = u32::from_le_bytes(bytes[0..4].try_into().unwrap());

    let mut offset = 4;
    let mut wots_sig = Vec::with_capacity(params.len());
    for _ in 0..params.len() {
        wots_sig.push(bytes[offset..offset + N].to_vec());
        offset += N;
    }

    let mut auth_nodes = Vec::with_capacity(params.h() as usize);
    for _ in 0..params.h() {
        let mut node = [0u8; N];
        node.copy_from_slice(&bytes[offset..offset + N]);
        auth_nodes.push(node);
        offset += N;
    }

    Ok(Signature {
        leaf_index,
        wots_sig,
        auth_path: AuthPath::new(auth_nodes),
    })
}

fn io_err(path: &Path, source: std::io::Error) -> Error {
    Error::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Write `contents` to `path` by first writing a sibling temp file and
/// renaming it into place, so a crash mid-write leaves the old file or the
/// new one, never a torn write.
fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), std::io::Error> {
    let tmp_path = path.with_extension("tmp");
    {
        let mut tmp = File::create(&tmp_path)?;
        tmp.write_all(contents)?;
        tmp.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// `[i32 h][i32 w][32B seed][32B root]`, 72 bytes.
pub fn write_key_file(path: &Path, params: &Params, seed: &[u8], root: &[u8]) -> Result<(), Error> {
    debug_assert_eq!(seed.len(), N);
    debug_assert_eq!(root.len(), N);

    let mut buf = Vec::with_capacity(8 + 2 * N);
    buf.extend_from_slice(&(params.h() as i32).to_le_bytes());
    buf.extend_from_slice(&(params.w() as i32).to_le_bytes());
    buf.extend_from_slice(seed);
    buf.extend_from_slice(root);

    write_atomic(path, &buf).map_err(|e| io_err(path, e))
}

/// Read a key file, enforcing that its `(h, w)` matches `expected`.
pub fn read_key_file(path: &Path, expected: &Params) -> Result<([u8; N], [u8; N]), Error> {
    let mut file = File::open(path).map_err(|e| io_err(path, e))?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).map_err(|e| io_err(path, e))?;

    if buf.len() != 8 + 2 * N {
        return Err(Error::StateCorrupt {
            path: path.display().to_string(),
            reason: "key file has the wrong length",
        });
    }

    let found_h = i32::from_le_bytes(buf[0..4].try_into().unwrap()) as u32;
    let found_w = i32::from_le_bytes(buf[4..8].try_into().unwrap()) as u32;
    if found_h != expected.h() || found_w != expected.w() {
        return Err(Error::ParameterMismatch {
            found_h,
            found_w,
            expected_h: expected.h(),
            expected_w: expected.w(),
        });
    }

    let mut seed = [0u8; N];
    seed.copy_from_slice(&buf[8..8 + N]);
    let mut root = [0u8; N];
    root.copy_from_slice(&buf[8 + N..8 + 2 * N]);

    Ok((seed, root))
}

/// `[i32 next_index]`, 4 bytes.
pub fn write_state_file(path: &Path, next_index: u64) -> Result<(), Error> {
    let buf = (next_index as i32).to_le_bytes();
    write_atomic(path, &buf).map_err(|e| Error::StateWriteFailed {
        path: path.display().to_string(),
        source: e,
    })
}

pub fn read_state_file(path: &Path) -> Result<u64, Error> {
    let mut file = File::open(path).map_err(|e| io_err(path, e))?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).map_err(|e| io_err(path, e))?;

    if buf.len() != 4 {
        return Err(Error::StateCorrupt {
            path: path.display().to_string(),
            reason: "state file must be exactly 4 bytes",
        });
    }

    let value = i32::from_le_bytes(buf.try_into().unwrap());
    if value < 0 {
        return Err(Error::StateCorrupt {
            path: path.display().to_string(),
            reason: "next_index is negative",
        });
    }

    Ok(value as u64)
}

/// Uppercase hex of the root followed by a newline.
pub fn write_root_hex_file(path: &Path, root: &[u8]) -> Result<(), Error> {
    let mut hex = String::with_capacity(root.len() * 2 + 1);
    for byte in root {
        hex.push_str(&format!("{byte:02X}"));
    }
    hex.push('\n');
    write_atomic(path, hex.as_bytes()).map_err(|e| io_err(path, e))
}
