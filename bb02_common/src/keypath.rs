use std::fmt;
use std::str::FromStr;

use bitcoin::bip32::DerivationPath;
use serde::{Deserialize, Deserializer, Serialize};

use crate::Error;

/// Offset added to a level to mark it as hardened.
pub const HARDENED: u32 = 0x8000_0000;

/// A BIP32 keypath as sent to the device, one `u32` per level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Keypath(Vec<u32>);

impl Keypath {
    pub fn new(levels: Vec<u32>) -> Self {
        Self(levels)
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Level at `index`, `None` when the keypath is shorter.
    pub fn get(&self, index: usize) -> Option<u32> {
        self.0.get(index).copied()
    }

    pub fn is_hardened(level: u32) -> bool {
        level >= HARDENED
    }

    /// Returns a new keypath with `level` appended.
    pub fn child(&self, level: u32) -> Self {
        let mut levels = self.0.clone();
        levels.push(level);
        Self(levels)
    }
}

impl FromStr for Keypath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidKeypath(s.to_string());
        let mut levels = s.trim().split('/');
        match levels.next() {
            Some("m") | Some("M") => (),
            _ => return Err(invalid()),
        }
        let mut result = vec![];
        for level in levels {
            let (number, hardened) = match level.strip_suffix(['\'', 'h', 'H']) {
                Some(number) => (number, true),
                None => (level, false),
            };
            if !number.starts_with(|c: char| c.is_ascii_digit()) {
                return Err(invalid());
            }
            let number: u32 = number.parse().map_err(|_| invalid())?;
            if number >= HARDENED {
                return Err(invalid());
            }
            result.push(if hardened { number + HARDENED } else { number });
        }
        Ok(Self(result))
    }
}

impl fmt::Display for Keypath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for level in &self.0 {
            if Self::is_hardened(*level) {
                write!(f, "/{}'", level - HARDENED)?;
            } else {
                write!(f, "/{level}")?;
            }
        }
        Ok(())
    }
}

impl From<Vec<u32>> for Keypath {
    fn from(levels: Vec<u32>) -> Self {
        Self(levels)
    }
}

impl From<&[u32]> for Keypath {
    fn from(levels: &[u32]) -> Self {
        Self(levels.to_vec())
    }
}

impl From<&DerivationPath> for Keypath {
    fn from(path: &DerivationPath) -> Self {
        Self(path.into_iter().map(|e| (*e).into()).collect())
    }
}

impl From<&Keypath> for DerivationPath {
    fn from(keypath: &Keypath) -> Self {
        DerivationPath::from_iter(keypath.0.iter().cloned().map(Into::into))
    }
}

impl Serialize for Keypath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Keypath {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        // Web callers pass either "m/84'/0'/0'" or the already expanded integer array.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum StringOrLevels {
            String(String),
            Levels(Vec<u32>),
        }
        match StringOrLevels::deserialize(d)? {
            StringOrLevels::String(s) => s.parse().map_err(serde::de::Error::custom),
            StringOrLevels::Levels(levels) => Ok(Self(levels)),
        }
    }
}
