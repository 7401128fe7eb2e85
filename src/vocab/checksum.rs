use crate::error::ResolveError;
use crate::prelude::*;
use ring::digest;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ChecksumAlgorithm {
    Sha256,
    Sha512,
}

impl ChecksumAlgorithm {
    fn ring_algorithm(&self) -> &'static digest::Algorithm {
        match self {
            ChecksumAlgorithm::Sha256 => &digest::SHA256,
            ChecksumAlgorithm::Sha512 => &digest::SHA512,
        }
    }
}

impl Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChecksumAlgorithm::Sha256 => "sha256",
            ChecksumAlgorithm::Sha512 => "sha512",
        }
        .fmt(f)
    }
}

impl TryFrom<&str> for ChecksumAlgorithm {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Ok(match value {
            "sha256" => ChecksumAlgorithm::Sha256,
            "sha512" => ChecksumAlgorithm::Sha512,
            _ => bail!("unrecognized hash function {:?}", value),
        })
    }
}

/// An expected digest for an artifact, as carried in a simple API link's URL
/// fragment (`...#sha256=deadbeef`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct Checksum {
    pub algorithm: ChecksumAlgorithm,
    pub raw_data: Vec<u8>,
}

impl Checksum {
    pub fn from_hex(algorithm: ChecksumAlgorithm, hex: &str) -> Result<Checksum> {
        Ok(Checksum {
            algorithm,
            raw_data: data_encoding::HEXLOWER_PERMISSIVE.decode(hex.as_bytes())?,
        })
    }

    /// Recompute the digest over `data` and compare. Returns
    /// [`ResolveError::ChecksumMismatch`] on disagreement, so callers can
    /// fall back to another candidate link.
    pub fn verify(&self, data: &[u8]) -> Result<()> {
        let got = digest::digest(self.algorithm.ring_algorithm(), data);
        if got.as_ref() != self.raw_data.as_slice() {
            return Err(ResolveError::ChecksumMismatch {
                expected: data_encoding::HEXLOWER.encode(&self.raw_data),
                got: data_encoding::HEXLOWER.encode(got.as_ref()),
            }
            .into());
        }
        Ok(())
    }
}

impl Display for Checksum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}={}",
            self.algorithm,
            data_encoding::HEXLOWER.encode(&self.raw_data),
        )
    }
}

impl TryFrom<&str> for Checksum {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.split_once('=') {
            None => bail!("expected '=' in checksum fragment {:?}", value),
            Some((algorithm, hex)) => Checksum::from_hex(algorithm.try_into()?, hex),
        }
    }
}

try_from_str_boilerplate!(Checksum);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sha256_roundtrip() {
        let value = "sha256=c27c231e66336183c484fbfe080fa6cc954149366c15dc21db8b7290081ec7b8";
        let obj: Checksum = value.try_into().unwrap();
        assert_eq!(obj.to_string(), value);
    }

    #[test]
    fn test_verify() {
        // sha256 of the empty string
        let checksum: Checksum =
            "sha256=e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
                .try_into()
                .unwrap();
        assert!(checksum.verify(b"").is_ok());

        let err = checksum.verify(b"something else").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ResolveError>(),
            Some(ResolveError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_unknown_algorithm() {
        let bad: Result<Checksum> = "md5=abc123".try_into();
        assert!(bad.is_err());
    }
}
