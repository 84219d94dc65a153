// Path: crates/oio-types/src/position.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stripe coordinates for a chunk: `M` (metachunk index, outer stripe), an
/// optional intra-stripe index `S`, and a parity marker.
///
/// Unlike the reference parser,
/// this parser is strict in every branch: trailing characters after the
/// last numeric field are a parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChunkPosition {
    pub metachunk: u32,
    pub intra: Option<u32>,
    pub parity: bool,
}

impl ChunkPosition {
    pub fn metachunk(m: u32) -> Self {
        Self {
            metachunk: m,
            intra: None,
            parity: false,
        }
    }

    pub fn data(m: u32, s: u32) -> Self {
        Self {
            metachunk: m,
            intra: Some(s),
            parity: false,
        }
    }

    pub fn parity(m: u32, s: u32) -> Self {
        Self {
            metachunk: m,
            intra: Some(s),
            parity: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PositionParseError {
    #[error("empty chunk position")]
    Empty,
    #[error("invalid metachunk index in position {0:?}")]
    InvalidMetachunk(String),
    #[error("invalid intra-stripe index in position {0:?}")]
    InvalidIntra(String),
    #[error("trailing characters after intra-stripe index in position {0:?}")]
    TrailingCharacters(String),
}

impl FromStr for ChunkPosition {
    type Err = PositionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PositionParseError::Empty);
        }
        match s.split_once('.') {
            None => {
                let m: u32 = s
                .parse()
                .map_err(|_| PositionParseError::InvalidMetachunk(s.to_string()))?;
                Ok(ChunkPosition::metachunk(m))
            }
            Some((m_str, rest)) => {
                let m: u32 = m_str
                .parse()
                .map_err(|_| PositionParseError::InvalidMetachunk(s.to_string()))?;
                let (parity, digits) = match rest.strip_prefix('p') {
                    Some(d) => (true, d),
                    None => (false, rest),
                };
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    if digits.chars().any(|c| !c.is_ascii_digit()) {
                        return Err(PositionParseError::TrailingCharacters(s.to_string()));
                    }
                    return Err(PositionParseError::InvalidIntra(s.to_string()));
                }
                let intra: u32 = digits
                .parse()
                .map_err(|_| PositionParseError::InvalidIntra(s.to_string()))?;
                Ok(ChunkPosition {
                        metachunk: m,
                        intra: Some(intra),
                        parity,
                    })
            }
        }
    }
}

impl fmt::Display for ChunkPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.intra {
            None => write!(f, "{}", self.metachunk),
            Some(s) if self.parity => write!(f, "{}.p{}", self.metachunk, s),
            Some(s) => write!(f, "{}.{}", self.metachunk, s),
        }
    }
}

impl Serialize for ChunkPosition {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
    S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ChunkPosition {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
    D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_metachunk() {
        assert_eq!("3".parse(), Ok(ChunkPosition::metachunk(3)));
    }

    #[test]
    fn parses_data_stripe_position() {
        assert_eq!("3.1".parse(), Ok(ChunkPosition::data(3, 1)));
    }

    #[test]
    fn parses_parity_position() {
        assert_eq!("3.p0".parse(), Ok(ChunkPosition::parity(3, 0)));
    }

    #[test]
    fn rejects_trailing_characters_strictly() {
        assert!("3.1x".parse::<ChunkPosition>().is_err());
        assert!("3x".parse::<ChunkPosition>().is_err());
        assert!("3.px".parse::<ChunkPosition>().is_err());
    }

    #[test]
    fn rejects_empty() {
        assert_eq!("".parse::<ChunkPosition>(), Err(PositionParseError::Empty));
    }

    #[test]
    fn display_roundtrips() {
        for p in [
            ChunkPosition::metachunk(0),
            ChunkPosition::data(2, 5),
            ChunkPosition::parity(2, 1),
        ] {
            let s = p.to_string();
            assert_eq!(s.parse::<ChunkPosition>(), Ok(p));
        }
    }
}
