//! Serialization and Deserialization implementation

use ::serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::key::ByteKey;

impl Serialize for ByteKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(self.as_bytes())
    }
}

impl<'de> Deserialize<'de> for ByteKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct KeyVisitor;

        impl<'de> serde::de::Visitor<'de> for KeyVisitor {
            type Value = ByteKey;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a length-prefixed key byte string")
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<ByteKey, E>
            where
                E: serde::de::Error,
            {
                Ok(ByteKey::from_raw(v))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<ByteKey, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut buf = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(b) = seq.next_element::<u8>()? {
                    buf.push(b);
                }
                Ok(ByteKey::from_raw(buf))
            }
        }

        deserializer.deserialize_bytes(KeyVisitor)
    }
}
