use core::fmt::{Debug, Display};

use rand::{distributions::Standard, prelude::Distribution};
use serde::Serialize;
use uint::construct_uint;

#[cfg(feature = "secp256k1")]
use secp256k1::PublicKey;
#[cfg(feature = "secp256k1")]
use sha3::{Digest, Keccak256};

macro_rules! impl_hex_fmt {
    ($T:ident) => {
        impl Debug for $T {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str("0x")?;
                for b in self.0 {
                    f.write_fmt(format_args!("{:02x}", b))?;
                }
                Ok(())
            }
        }

        impl Display for $T {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                Debug::fmt(self, f)
            }
        }
    };
}

macro_rules! bytesN {
    ( $T:ident, $N:literal ) => {
        #[derive(PartialEq, Eq, PartialOrd, Ord, core::hash::Hash, Copy, Clone)]
        pub struct $T(pub [u8; $N]);

        impl Serialize for $T {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_bytes(&self.0)
            }
        }

        impl Distribution<$T> for Standard {
            fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> $T {
                $T(rng.gen())
            }
        }

        impl Default for $T {
            fn default() -> Self {
                Self([0; $N])
            }
        }

        impl TryFrom<&[u8]> for $T {
            type Error = core::array::TryFromSliceError;

            fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
                Ok(Self(value.try_into()?))
            }
        }

        impl_hex_fmt!($T);
    };
}

#[cfg(test)]
bytesN!(Bytes3, 3);
#[cfg(test)]
bytesN!(Bytes10, 10);
bytesN!(Bytes32, 32);

bytesN!(Hash, 32);

// r || s || v, with v in {27, 28}
bytesN!(Signature, 65);
impl Signature {
    pub fn new(rs: &[u8; 64], v: u8) -> Self {
        let mut sig: Signature = Signature([0; 65]);
        sig.0[..64].copy_from_slice(rs);
        sig.0[64] = v;
        sig
    }

    /// The all-zero placeholder used for missing signatures.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

// Where the funds of an allocation go when the channel is concluded. Usually
// an Address left-padded to 32 bytes, but it may also be another channel id.
bytesN!(Destination, 32);

impl From<Address> for Destination {
    fn from(addr: Address) -> Self {
        let mut bytes = [0u8; 32];
        bytes[32 - 20..].copy_from_slice(&addr.0);
        Destination(bytes)
    }
}

// primitive_types::U256 serializes to a hex string, which is not what the abi
// encoder needs, so we construct our own.
construct_uint! {
    pub struct U256(4);
}

impl Serialize for U256 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bytes(&self.to_bytes32())
    }
}

impl U256 {
    pub fn to_bytes32(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        self.to_big_endian(&mut bytes);
        bytes
    }
}

impl Distribution<U256> for Standard {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> U256 {
        let buf: [u8; 32] = rng.gen();
        U256::from_big_endian(&buf)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, core::hash::Hash, Default)]
pub struct Address(pub [u8; 20]);
impl_hex_fmt!(Address);

impl TryFrom<&[u8]> for Address {
    type Error = core::array::TryFromSliceError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Ok(Self(value.try_into()?))
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        // abi encoding has addresses right aligned (like uints) instead of
        // left aligned like bytes/bytesN.
        let mut bytes = [0u8; 32];
        bytes[32 - 20..].copy_from_slice(self.0.as_slice());
        serializer.serialize_bytes(&bytes)
    }
}

#[cfg(feature = "secp256k1")]
impl From<PublicKey> for Address {
    fn from(pk: PublicKey) -> Self {
        // See https://ethereum.stackexchange.com/questions/65233/goethereum-getting-public-key-from-private-key-hex-formatting

        // Throw away the first byte, which is not part of the public key. It is
        // added by serialize_uncompressed due to the encoding used.
        let hash: [u8; 32] = Keccak256::digest(&pk.serialize_uncompressed()[1..]).into();

        let mut addr = Address([0; 20]);
        addr.0.copy_from_slice(&hash[32 - 20..]);
        addr
    }
}

impl Distribution<Address> for Standard {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Address {
        Address(rng.gen())
    }
}
