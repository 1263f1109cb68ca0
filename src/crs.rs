use serde::{Deserialize, Deserializer, de::Error};
use std::fmt;
use std::str::FromStr;

/// Coordinate reference system identified by its EPSG code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Crs {
    epsg: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid CRS '{0}', expected 'EPSG:<code>'")]
pub struct CrsParseError(pub String);

impl Crs {
    pub fn from_epsg(epsg: u32) -> Self {
        Self { epsg }
    }

    pub fn epsg(&self) -> u32 {
        self.epsg
    }
}

// NAD83 / UTM zone 12N
impl Default for Crs {
    fn default() -> Self {
        Self { epsg: 26912 }
    }
}

impl FromStr for Crs {
    type Err = CrsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s
            .trim()
            .strip_prefix("EPSG:")
            .or_else(|| s.trim().strip_prefix("epsg:"))
            .ok_or_else(|| CrsParseError(s.to_string()))?;

        match code.parse::<u32>() {
            Ok(epsg) if epsg > 0 => Ok(Self { epsg }),
            _ => Err(CrsParseError(s.to_string())),
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

impl<'de> Deserialize<'de> for Crs {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_epsg() {
        let crs: Crs = "EPSG:26912".parse().unwrap();
        assert_eq!(crs.epsg(), 26912);
        assert_eq!(crs.to_string(), "EPSG:26912");
        assert_eq!(crs, Crs::default());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("26912".parse::<Crs>().is_err());
        assert!("EPSG:".parse::<Crs>().is_err());
        assert!("EPSG:0".parse::<Crs>().is_err());
        assert!("EPSG:utm".parse::<Crs>().is_err());
    }
}
