//! Shared implementation for fixed-size byte types rendered as base58.

macro_rules! base58_bytes {
    ($name:ident, $len:expr) => {
        impl $name {
            pub const LEN: usize = $len;

            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn to_base58(&self) -> String {
                bs58::encode(&self.0).into_string()
            }

            /// Decode from base58, rejecting strings that do not decode to exactly
            /// the expected number of bytes.
            pub fn from_base58(s: &str) -> Result<Self, $crate::TypeError> {
                let decoded = bs58::decode(s.trim())
                    .into_vec()
                    .map_err(|e| $crate::TypeError::InvalidBase58(e.to_string()))?;
                let bytes: [u8; $len] = decoded.as_slice().try_into().map_err(|_| {
                    $crate::TypeError::InvalidLength {
                        expected: $len,
                        actual: decoded.len(),
                    }
                })?;
                Ok(Self(bytes))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.to_base58())
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_base58())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::TypeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_base58(s)
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_base58())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_base58(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}
