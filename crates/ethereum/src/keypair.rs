use alloy::primitives::{Address, B256, keccak256};
use alloy::signers::local::PrivateKeySigner;
use rand::RngCore;
use rand::rngs::OsRng;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Key generation failed: {0}")]
    Crypto(String),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No private key found at {0}")]
    NotFound(PathBuf),

    #[error("Invalid key material: {0}")]
    Parse(String),
}

/// A node's secp256k1 key pair and the address derived from it.
///
/// The private key never appears in `Debug` output and is not serializable.
#[derive(Clone)]
pub struct Identity {
    signer: PrivateKeySigner,
    public_key: [u8; 64],
}

impl Identity {
    /// Generate a fresh key pair from the operating system's random source
    pub fn generate() -> Result<Self, IdentityError> {
        let mut secret = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut secret)
            .map_err(|e| IdentityError::Crypto(format!("random source unavailable: {}", e)))?;

        let signer = PrivateKeySigner::from_bytes(&B256::from(secret))
            .map_err(|e| IdentityError::Crypto(e.to_string()))?;
        Ok(Self::from_signer(signer))
    }

    /// Rebuild an identity from a hex private key, with or without `0x`
    pub fn from_private_key(private_key: &str) -> Result<Self, IdentityError> {
        let key_hex = private_key
            .trim()
            .strip_prefix("0x")
            .or_else(|| private_key.trim().strip_prefix("0X"))
            .unwrap_or(private_key.trim());

        let key_bytes = hex::decode(key_hex)
            .map_err(|e| IdentityError::Parse(format!("invalid hex private key: {}", e)))?;

        let key_array: [u8; 32] = key_bytes.try_into().map_err(|v: Vec<u8>| {
            IdentityError::Parse(format!("private key must be 32 bytes, got {}", v.len()))
        })?;

        let signer = PrivateKeySigner::from_bytes(&B256::from(key_array))
            .map_err(|e| IdentityError::Parse(format!("invalid secp256k1 scalar: {}", e)))?;
        Ok(Self::from_signer(signer))
    }

    fn from_signer(signer: PrivateKeySigner) -> Self {
        let encoded = signer.credential().verifying_key().to_encoded_point(false);
        let mut public_key = [0u8; 64];
        // Skip the 0x04 uncompressed-point tag
        public_key.copy_from_slice(&encoded.as_bytes()[1..]);
        Self { signer, public_key }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Uncompressed public key without the SEC1 tag byte
    pub fn public_key(&self) -> &[u8; 64] {
        &self.public_key
    }

    /// Hex private key with `0x` prefix. Only for writing to the keystore or
    /// showing to an operator who asked for it.
    pub fn expose_private_key_hex(&self) -> String {
        format!("0x{}", hex::encode(self.signer.to_bytes()))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("address", &self.address())
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Last 20 bytes of keccak256 over the uncompressed public key
pub fn address_from_public_key(public_key: &[u8; 64]) -> Address {
    Address::from_slice(&keccak256(public_key)[12..])
}

pub fn private_key_path(directory: &Path, node_name: &str) -> PathBuf {
    directory.join(format!("{}-private.key", node_name))
}

pub fn address_path(directory: &Path, node_name: &str) -> PathBuf {
    directory.join(format!("{}-address.txt", node_name))
}

/// Write `<name>-private.key` (bare hex, owner-only on unix) and
/// `<name>-address.txt` under `directory`, creating it if needed.
///
/// Bare hex is what `geth account import` expects.
pub fn persist_identity(
    identity: &Identity,
    directory: &Path,
    node_name: &str,
) -> Result<(), IdentityError> {
    fs::create_dir_all(directory).map_err(|source| IdentityError::Io {
        path: directory.to_path_buf(),
        source,
    })?;

    let key_path = private_key_path(directory, node_name);
    let key_hex = identity.expose_private_key_hex();
    write_private(&key_path, key_hex.trim_start_matches("0x").as_bytes()).map_err(|source| {
        IdentityError::Io {
            path: key_path.clone(),
            source,
        }
    })?;

    let addr_path = address_path(directory, node_name);
    fs::write(&addr_path, identity.address().to_checksum(None)).map_err(|source| IdentityError::Io {
        path: addr_path.clone(),
        source,
    })?;

    debug!("Saved identity for {} to {:?}", node_name, directory);
    Ok(())
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    fs::write(path, contents)
}

/// Inverse of [`persist_identity`].
///
/// When an address file is present it must match the key.
pub fn load_identity(directory: &Path, node_name: &str) -> Result<Identity, IdentityError> {
    let key_path = private_key_path(directory, node_name);
    let contents = match fs::read_to_string(&key_path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(IdentityError::NotFound(key_path));
        }
        Err(source) => return Err(IdentityError::Io { path: key_path, source }),
    };

    let identity = Identity::from_private_key(&contents)?;

    let addr_path = address_path(directory, node_name);
    if let Ok(stored) = fs::read_to_string(&addr_path) {
        let stored: Address = stored
            .trim()
            .parse()
            .map_err(|e| {
                IdentityError::Parse(format!("invalid address in {:?}: {}", addr_path, e))
            })?;
        if stored != identity.address() {
            return Err(IdentityError::Parse(format!(
                "address file {:?} does not match private key",
                addr_path
            )));
        }
    }

    Ok(identity)
}
