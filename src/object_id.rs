use std::{
    fmt,
    str::FromStr,
    sync::{
        OnceLock,
        atomic::{AtomicU32, Ordering},
    },
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CatalogError;

/// Store-assigned document identifier: 4 bytes of seconds since the epoch,
/// 5 bytes unique to this process, and a 3 byte rolling counter. Rendered as
/// 24 lowercase hex characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    pub const HEX_LEN: usize = 24;

    pub fn generate() -> Self {
        let seconds = jiff::Timestamp::now().as_second() as u32;
        let count = counter().fetch_add(1, Ordering::Relaxed) & 0x00ff_ffff;

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(process_unique());
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        Self(bytes)
    }

    pub fn parse_str(s: &str) -> Result<Self, CatalogError> {
        if s.len() != Self::HEX_LEN {
            return Err(CatalogError::InvalidIdentifier(s.to_string()));
        }
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|_| CatalogError::InvalidIdentifier(s.to_string()))?;
        Ok(Self(bytes))
    }

    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }
}

fn process_unique() -> &'static [u8; 5] {
    static PROCESS: OnceLock<[u8; 5]> = OnceLock::new();
    PROCESS.get_or_init(|| {
        let random = uuid::Uuid::new_v4();
        let mut out = [0u8; 5];
        out.copy_from_slice(&random.as_bytes()[..5]);
        out
    })
}

fn counter() -> &'static AtomicU32 {
    static COUNTER: OnceLock<AtomicU32> = OnceLock::new();
    COUNTER.get_or_init(|| {
        let random = uuid::Uuid::new_v4();
        let b = random.as_bytes();
        AtomicU32::new(u32::from_be_bytes([0, b[5], b[6], b[7]]))
    })
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse_str(&s).map_err(serde::de::Error::custom)
    }
}
