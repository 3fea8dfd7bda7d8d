//! Common types for the inspection diagnostics pipeline.
//!
//! Defines the three input document schemas produced by the upstream
//! extraction stages (areas, system findings, thermal readings) and the
//! validation that runs before any merge logic touches them.
//!
//! All enumerated fields round-trip to their exact report strings
//! ("Yes", "Not Available", "Moisture Detected", ...) so the serialized
//! output stays byte-compatible with the upstream artifacts.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sentinel used throughout the reports for unknown or unmeasured values.
pub const NOT_AVAILABLE: &str = "Not Available";

/// Case-insensitive check against the "Not Available" sentinel.
#[must_use]
pub fn is_not_available(value: &str) -> bool {
    value.eq_ignore_ascii_case(NOT_AVAILABLE)
}

/// Declared temperature difference may deviate from the recomputed
/// hotspot − coldspot value by at most this much.
pub const TEMPERATURE_TOLERANCE: f64 = 0.1;

/// Schema validation errors
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("areas[{index}]: {field} must not be empty")]
    EmptyAreaField { index: usize, field: &'static str },

    #[error(
        "thermal_readings[{index}]: temperature_difference {declared} \
         does not match hotspot - coldspot (computed {computed})"
    )]
    TemperatureMismatch {
        index: usize,
        declared: f64,
        computed: f64,
    },
}

/// Tri-state answer to a fixed diagnostic question about a building subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Finding {
    Yes,
    No,
    #[serde(rename = "Not Available")]
    NotAvailable,
}

impl Finding {
    /// True when the question was answered affirmatively.
    #[must_use]
    pub fn is_yes(self) -> bool {
        self == Finding::Yes
    }

    /// True when the report carried no answer for this question.
    #[must_use]
    pub fn is_not_available(self) -> bool {
        self == Finding::NotAvailable
    }
}

/// Extraction confidence as reported by the upstream stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Per-area thermal cross-reference result.
///
/// Upstream extraction always emits the "Not Available" placeholder; the
/// thermal matcher overwrites it with the final classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThermalConfirmation {
    #[serde(rename = "Not Available")]
    NotAvailable,
    #[serde(rename = "Moisture Detected")]
    MoistureDetected,
}

/// Binary moisture flag attached to a thermal reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoistureIndicator {
    Yes,
    No,
}

/// One physical location with an observed defect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AreaRecord {
    /// Free-form, user-facing location name.
    pub area_name: String,
    /// Description of the observed defect.
    pub negative_observation: String,
    /// Suspected water source, or the "Not Available" sentinel.
    pub positive_source: String,
    /// Thermal cross-reference result, resolved by the matcher.
    pub thermal_confirmation: ThermalConfirmation,
    pub confidence: Confidence,
}

/// Areas document: `{"areas": [...]}` from the area extraction stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AreasDocument {
    pub areas: Vec<AreaRecord>,
}

impl AreasDocument {
    /// Checks the constraints the typed parse cannot express:
    /// `area_name` and `negative_observation` must be non-empty.
    ///
    /// # Errors
    /// Returns the first offending field with its area index.
    pub fn validate(&self) -> Result<(), SchemaError> {
        for (index, area) in self.areas.iter().enumerate() {
            if area.area_name.trim().is_empty() {
                return Err(SchemaError::EmptyAreaField {
                    index,
                    field: "area_name",
                });
            }
            if area.negative_observation.trim().is_empty() {
                return Err(SchemaError::EmptyAreaField {
                    index,
                    field: "negative_observation",
                });
            }
        }
        Ok(())
    }
}

/// Bathroom section of the systems document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BathroomIssues {
    pub tile_joint_gaps: Finding,
    pub nahani_trap_damage: Finding,
    pub concealed_plumbing: Finding,
}

/// External wall section of the systems document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExternalWall {
    pub cracks_present: Finding,
    pub vegetation: Finding,
    pub internal_dampness: Finding,
}

/// Terrace section of the systems document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Terrace {
    pub surface_cracks: Finding,
    pub hollow_sound: Finding,
    pub slope_disturbance: Finding,
}

/// Parking section of the systems document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Parking {
    pub ceiling_leakage: Finding,
}

/// System-level findings: four fixed sections, closed schema.
///
/// Immutable within the merge core; read-only input to inference and
/// severity scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SystemsDocument {
    pub bathroom_issues: BathroomIssues,
    pub external_wall: ExternalWall,
    pub terrace: Terrace,
    pub parking: Parking,
}

impl SystemsDocument {
    /// All system findings as `(section, field, value)` triples in schema
    /// declaration order. Declaration order is a contract: the missing-data
    /// report must be reproducible for identical inputs.
    #[must_use]
    pub fn fields(&self) -> [(&'static str, &'static str, Finding); 10] {
        [
            (
                "bathroom_issues",
                "tile_joint_gaps",
                self.bathroom_issues.tile_joint_gaps,
            ),
            (
                "bathroom_issues",
                "nahani_trap_damage",
                self.bathroom_issues.nahani_trap_damage,
            ),
            (
                "bathroom_issues",
                "concealed_plumbing",
                self.bathroom_issues.concealed_plumbing,
            ),
            (
                "external_wall",
                "cracks_present",
                self.external_wall.cracks_present,
            ),
            ("external_wall", "vegetation", self.external_wall.vegetation),
            (
                "external_wall",
                "internal_dampness",
                self.external_wall.internal_dampness,
            ),
            ("terrace", "surface_cracks", self.terrace.surface_cracks),
            ("terrace", "hollow_sound", self.terrace.hollow_sound),
            (
                "terrace",
                "slope_disturbance",
                self.terrace.slope_disturbance,
            ),
            ("parking", "ceiling_leakage", self.parking.ceiling_leakage),
        ]
    }
}

/// One infrared hotspot/coldspot observation tied loosely to an area.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThermalReading {
    pub image_name: String,
    pub hotspot_temp: f64,
    pub coldspot_temp: f64,
    /// Must equal `hotspot_temp - coldspot_temp` within [`TEMPERATURE_TOLERANCE`].
    pub temperature_difference: f64,
    pub moisture_indicator: MoistureIndicator,
    /// Area named in the thermal report, or the "Not Available" sentinel.
    pub area_reference: String,
    pub confidence: Confidence,
}

impl ThermalReading {
    /// True when this reading carries no usable area reference.
    #[must_use]
    pub fn has_area_reference(&self) -> bool {
        !is_not_available(&self.area_reference)
    }
}

/// Thermal document: `{"thermal_readings": [...]}` from the thermal stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThermalDocument {
    pub thermal_readings: Vec<ThermalReading>,
}

impl ThermalDocument {
    /// Cross-field numeric consistency check: recomputes
    /// `round(hotspot - coldspot, 2)` and rejects readings whose declared
    /// difference deviates beyond [`TEMPERATURE_TOLERANCE`].
    ///
    /// # Errors
    /// Returns the first inconsistent reading with both values.
    pub fn validate(&self) -> Result<(), SchemaError> {
        for (index, reading) in self.thermal_readings.iter().enumerate() {
            let computed = round2(reading.hotspot_temp - reading.coldspot_temp);
            if (computed - reading.temperature_difference).abs() > TEMPERATURE_TOLERANCE {
                return Err(SchemaError::TemperatureMismatch {
                    index,
                    declared: reading.temperature_difference,
                    computed,
                });
            }
        }
        Ok(())
    }
}

/// Round to two decimal places, matching the upstream extractor.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_area_json() -> &'static str {
        r#"{
            "areas": [
                {
                    "area_name": "Master Bedroom Wall",
                    "negative_observation": "Dampness patch near the window",
                    "positive_source": "Not Available",
                    "thermal_confirmation": "Not Available",
                    "confidence": "High"
                }
            ]
        }"#
    }

    #[test]
    fn test_area_document_round_trip() {
        let doc: AreasDocument = serde_json::from_str(sample_area_json()).unwrap();
        assert_eq!(doc.areas.len(), 1);
        assert_eq!(doc.areas[0].area_name, "Master Bedroom Wall");
        assert_eq!(
            doc.areas[0].thermal_confirmation,
            ThermalConfirmation::NotAvailable
        );

        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("\"Not Available\""));
        assert!(json.contains("\"High\""));
    }

    #[test]
    fn test_area_extra_key_rejected() {
        let json = r#"{
            "areas": [
                {
                    "area_name": "Kitchen",
                    "negative_observation": "Seepage",
                    "positive_source": "Not Available",
                    "thermal_confirmation": "Not Available",
                    "confidence": "Low",
                    "unexpected": true
                }
            ]
        }"#;
        assert!(serde_json::from_str::<AreasDocument>(json).is_err());
    }

    #[test]
    fn test_area_missing_key_rejected() {
        let json = r#"{
            "areas": [
                {
                    "area_name": "Kitchen",
                    "negative_observation": "Seepage",
                    "thermal_confirmation": "Not Available",
                    "confidence": "Low"
                }
            ]
        }"#;
        assert!(serde_json::from_str::<AreasDocument>(json).is_err());
    }

    #[test]
    fn test_empty_area_name_rejected() {
        let mut doc: AreasDocument = serde_json::from_str(sample_area_json()).unwrap();
        doc.areas[0].area_name = "  ".to_string();
        let err = doc.validate().unwrap_err();
        assert!(matches!(
            err,
            SchemaError::EmptyAreaField {
                index: 0,
                field: "area_name"
            }
        ));
    }

    fn sample_systems() -> SystemsDocument {
        serde_json::from_str(
            r#"{
                "bathroom_issues": {
                    "tile_joint_gaps": "Yes",
                    "nahani_trap_damage": "No",
                    "concealed_plumbing": "Not Available"
                },
                "external_wall": {
                    "cracks_present": "No",
                    "vegetation": "No",
                    "internal_dampness": "No"
                },
                "terrace": {
                    "surface_cracks": "No",
                    "hollow_sound": "No",
                    "slope_disturbance": "No"
                },
                "parking": {
                    "ceiling_leakage": "Not Available"
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_systems_fields_declaration_order() {
        let systems = sample_systems();
        let fields = systems.fields();
        assert_eq!(fields.len(), 10);
        assert_eq!(
            fields[0],
            ("bathroom_issues", "tile_joint_gaps", Finding::Yes)
        );
        assert_eq!(fields[9], ("parking", "ceiling_leakage", Finding::NotAvailable));
    }

    #[test]
    fn test_systems_invalid_value_rejected() {
        let json = r#"{
            "bathroom_issues": {
                "tile_joint_gaps": "Maybe",
                "nahani_trap_damage": "No",
                "concealed_plumbing": "No"
            },
            "external_wall": {
                "cracks_present": "No",
                "vegetation": "No",
                "internal_dampness": "No"
            },
            "terrace": {
                "surface_cracks": "No",
                "hollow_sound": "No",
                "slope_disturbance": "No"
            },
            "parking": {
                "ceiling_leakage": "No"
            }
        }"#;
        assert!(serde_json::from_str::<SystemsDocument>(json).is_err());
    }

    #[test]
    fn test_systems_missing_section_rejected() {
        let json = r#"{
            "bathroom_issues": {
                "tile_joint_gaps": "No",
                "nahani_trap_damage": "No",
                "concealed_plumbing": "No"
            },
            "external_wall": {
                "cracks_present": "No",
                "vegetation": "No",
                "internal_dampness": "No"
            },
            "terrace": {
                "surface_cracks": "No",
                "hollow_sound": "No",
                "slope_disturbance": "No"
            }
        }"#;
        assert!(serde_json::from_str::<SystemsDocument>(json).is_err());
    }

    fn reading(hot: f64, cold: f64, declared: f64) -> ThermalDocument {
        ThermalDocument {
            thermal_readings: vec![ThermalReading {
                image_name: "IR_001.jpg".to_string(),
                hotspot_temp: hot,
                coldspot_temp: cold,
                temperature_difference: declared,
                moisture_indicator: MoistureIndicator::Yes,
                area_reference: "bedroom wall".to_string(),
                confidence: Confidence::High,
            }],
        }
    }

    #[test]
    fn test_temperature_mismatch_rejected() {
        // Declared 10, computed 5.
        let err = reading(30.0, 25.0, 10.0).validate().unwrap_err();
        match err {
            SchemaError::TemperatureMismatch {
                index,
                declared,
                computed,
            } => {
                assert_eq!(index, 0);
                assert_eq!(declared, 10.0);
                assert_eq!(computed, 5.0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_temperature_within_tolerance_accepted() {
        assert!(reading(30.0, 25.0, 5.0).validate().is_ok());
        assert!(reading(30.0, 25.0, 5.1).validate().is_ok());
        assert!(reading(30.25, 25.0, 5.25).validate().is_ok());
    }

    #[test]
    fn test_not_available_sentinel() {
        assert!(is_not_available("Not Available"));
        assert!(is_not_available("not available"));
        assert!(!is_not_available("Terrace"));

        let doc = reading(30.0, 25.0, 5.0);
        assert!(doc.thermal_readings[0].has_area_reference());
    }
}
