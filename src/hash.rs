// Implicit digests are the SHA-256 of a Data packet's full wire encoding.
// Entries are matched by full name (name + digest) when an Interest carries one.

pub trait Hasher {
    type Digest;
    fn reset(&mut self);
    fn update(&mut self, input: &[u8]);
    fn finalize_reset(&mut self) -> Self::Digest;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sha256Digest(pub [u8; 32]);

impl Sha256Digest {
    pub fn compute<H: Hasher<Digest = Sha256Digest>>(hasher: &mut H, input: &[u8]) -> Self {
        hasher.reset();
        hasher.update(input);
        hasher.finalize_reset()
    }
}

#[cfg(feature = "sha2")]
mod sha {
    use sha2::{Digest, Sha256};

    use super::{Hasher, Sha256Digest};

    pub struct Sha256Hasher {
        inner: Sha256,
    }

    impl Sha256Hasher {
        pub fn new() -> Self {
            Self {
                inner: Sha256::new(),
            }
        }
    }

    impl Default for Sha256Hasher {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Hasher for Sha256Hasher {
        type Digest = Sha256Digest;

        fn reset(&mut self) {
            Digest::reset(&mut self.inner);
        }

        fn update(&mut self, input: &[u8]) {
            Digest::update(&mut self.inner, input);
        }

        fn finalize_reset(&mut self) -> Self::Digest {
            Sha256Digest(self.inner.finalize_reset().into())
        }
    }
}

#[cfg(feature = "sha2")]
pub use sha::Sha256Hasher;

#[cfg(all(test, feature = "sha2"))]
mod tests {
    use super::{Hasher, Sha256Digest, Sha256Hasher};

    #[test]
    fn test_sha256_empty() {
        let mut hasher = Sha256Hasher::new();
        let digest = Sha256Digest::compute(&mut hasher, &[]);
        assert_eq!(digest.0[..4], [0xe3, 0xb0, 0xc4, 0x42]);

        // The hasher is reusable after finalisation
        hasher.update(b"abc");
        let first = hasher.finalize_reset();
        hasher.update(b"abc");
        assert_eq!(first, hasher.finalize_reset());
        assert_eq!(first.0[..4], [0xba, 0x78, 0x16, 0xbf]);
    }
}
