//! Serialize any `&[u8]` as solidity `bytes` (dynamic length bytes).
//!
//! Without this, it would be serialized to a `uint8[]` of fixed or dynamic
//! length.
//!
//! # Example usage
//! ```ignore
//! # // We cannot run this test because abiencode is not public.
//! # use serde::Serialize;
//!
//! #[derive(Serialize, Debug)]
//! pub struct State {
//!     #[serde(with = "as_bytes")]
//!     pub app_data: Vec<u8>,
//! }
//! ```

use super::ser::MARK_BYTES_NAME;
use serde::{Serialize, Serializer};

/// Forwards to `serialize_bytes`, which cannot be reached directly from
/// `serialize_newtype_struct`.
struct RawBytes<'a>(&'a [u8]);

impl<'a> Serialize for RawBytes<'a> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(self.0)
    }
}

pub fn serialize<S>(v: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_newtype_struct(MARK_BYTES_NAME, &RawBytes(v))
}
