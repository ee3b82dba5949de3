use super::encryption::{KdfParams, NONCE_LEN, SALT_LEN};
use crate::errors::CoreError;

/// Magic bytes identifying an encrypted finance snapshot.
pub const MAGIC: &[u8; 4] = b"FNTK";

pub const CURRENT_VERSION: u16 = 1;

/// magic(4) + version(2) + kdf(12) + salt(16) + nonce(12) + length(8)
pub const HEADER_LEN: usize = 4 + 2 + 12 + SALT_LEN + NONCE_LEN + 8;

/// Header of an encrypted snapshot container.
///
/// Layout (all integers little-endian):
/// ```text
/// [FNTK] [version u16] [memory u32] [time u32] [lanes u32]
/// [salt 16B] [nonce 12B] [ciphertext_len u64] [ciphertext]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader {
    pub version: u16,
    pub kdf_params: KdfParams,
    pub salt: [u8; SALT_LEN],
    pub nonce: [u8; NONCE_LEN],
}

impl ContainerHeader {
    /// Header + ciphertext as one buffer.
    pub fn encode(&self, ciphertext: &[u8]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN + ciphertext.len());
        buf.extend_from_slice(MAGIC);
        buf.extend_from_slice(&self.version.to_le_bytes());
        buf.extend_from_slice(&self.kdf_params.memory_cost.to_le_bytes());
        buf.extend_from_slice(&self.kdf_params.time_cost.to_le_bytes());
        buf.extend_from_slice(&self.kdf_params.parallelism.to_le_bytes());
        buf.extend_from_slice(&self.salt);
        buf.extend_from_slice(&self.nonce);
        buf.extend_from_slice(&(ciphertext.len() as u64).to_le_bytes());
        buf.extend_from_slice(ciphertext);
        buf
    }

    /// Parse and validate a container. Returns the header and the
    /// ciphertext slice (trailing bytes past the declared length are ignored).
    pub fn decode(data: &[u8]) -> Result<(Self, &[u8]), CoreError> {
        if data.len() < HEADER_LEN {
            return Err(CoreError::InvalidFileFormat(format!(
                "Expected at least {HEADER_LEN} bytes, got {}",
                data.len()
            )));
        }

        let mut reader = Reader { data, offset: 0 };
        if reader.take::<4>()? != *MAGIC {
            return Err(CoreError::InvalidFileFormat(
                "Missing FNTK magic bytes".into(),
            ));
        }

        let version = u16::from_le_bytes(reader.take()?);
        if version == 0 || version > CURRENT_VERSION {
            return Err(CoreError::UnsupportedVersion(version));
        }

        let kdf_params = KdfParams {
            memory_cost: u32::from_le_bytes(reader.take()?),
            time_cost: u32::from_le_bytes(reader.take()?),
            parallelism: u32::from_le_bytes(reader.take()?),
        };
        kdf_params.check_bounds()?;

        let salt = reader.take::<SALT_LEN>()?;
        let nonce = reader.take::<NONCE_LEN>()?;
        let declared = u64::from_le_bytes(reader.take()?);

        let remaining = data.len() - reader.offset;
        if (remaining as u64) < declared {
            return Err(CoreError::InvalidFileFormat(format!(
                "Truncated container: {declared} ciphertext bytes declared, {remaining} present"
            )));
        }
        let ciphertext = &data[reader.offset..reader.offset + declared as usize];

        Ok((
            Self {
                version,
                kdf_params,
                salt,
                nonce,
            },
            ciphertext,
        ))
    }
}

struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl Reader<'_> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N], CoreError> {
        let end = self.offset + N;
        let bytes: [u8; N] = self
            .data
            .get(self.offset..end)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| CoreError::InvalidFileFormat("Unexpected end of header".into()))?;
        self.offset = end;
        Ok(bytes)
    }
}
