use serde::Deserialize;
use std::fmt::Display;

/// Landsat Collection 2 Level 2 sensors with surface reflectance products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Sensor {
    #[serde(rename(deserialize = "landsat8"))]
    Landsat8,
    #[serde(rename(deserialize = "landsat9"))]
    Landsat9,
}

/// Metadata keys holding the linear rescaling of one band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleFactor {
    pub band: String,
    pub mult_key: String,
    pub add_key: String,
}

// Bands 1 to 7 (coastal aerosol, blue, green, red, NIR, SWIR1, SWIR2)
const REFLECTANCE_BANDS: &[&str] = &[
    "SR_B1", "SR_B2", "SR_B3", "SR_B4", "SR_B5", "SR_B6", "SR_B7",
];

const THERMAL_BAND: &str = "ST_B10";

impl Sensor {
    pub fn collection_id(&self) -> &'static str {
        match self {
            Sensor::Landsat8 => "LANDSAT/LC08/C02/T1_L2",
            Sensor::Landsat9 => "LANDSAT/LC09/C02/T1_L2",
        }
    }

    /// Bit-encoded pixel quality band.
    pub fn qa_band(&self) -> &'static str {
        "QA_PIXEL"
    }

    /// Radiometric saturation band, zero when no band saturated.
    pub fn saturation_band(&self) -> &'static str {
        "QA_RADSAT"
    }

    pub fn reflectance_bands(&self) -> &'static [&'static str] {
        REFLECTANCE_BANDS
    }

    pub fn scale_factors(&self) -> Vec<ScaleFactor> {
        let mut factors: Vec<ScaleFactor> = self
            .reflectance_bands()
            .iter()
            .map(|band| {
                let number = band.trim_start_matches("SR_B");
                ScaleFactor {
                    band: band.to_string(),
                    mult_key: format!("REFLECTANCE_MULT_BAND_{}", number),
                    add_key: format!("REFLECTANCE_ADD_BAND_{}", number),
                }
            })
            .collect();

        factors.push(ScaleFactor {
            band: THERMAL_BAND.to_string(),
            mult_key: format!("TEMPERATURE_MULT_BAND_{}", THERMAL_BAND),
            add_key: format!("TEMPERATURE_ADD_BAND_{}", THERMAL_BAND),
        });

        factors
    }
}

impl Display for Sensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sensor::Landsat8 => write!(f, "Landsat 8 OLI/TIRS"),
            Sensor::Landsat9 => write!(f, "Landsat 9 OLI-2/TIRS-2"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_factor_keys() {
        let factors = Sensor::Landsat8.scale_factors();

        assert_eq!(factors.len(), 8);
        assert_eq!(factors[2].band, "SR_B3");
        assert_eq!(factors[2].mult_key, "REFLECTANCE_MULT_BAND_3");
        assert_eq!(factors[2].add_key, "REFLECTANCE_ADD_BAND_3");

        let thermal = factors.last().unwrap();
        assert_eq!(thermal.band, "ST_B10");
        assert_eq!(thermal.mult_key, "TEMPERATURE_MULT_BAND_ST_B10");
        assert_eq!(thermal.add_key, "TEMPERATURE_ADD_BAND_ST_B10");
    }

    #[test]
    fn test_collection_ids() {
        assert_eq!(Sensor::Landsat8.collection_id(), "LANDSAT/LC08/C02/T1_L2");
        assert_eq!(Sensor::Landsat9.collection_id(), "LANDSAT/LC09/C02/T1_L2");
    }
}
