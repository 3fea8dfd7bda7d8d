//! Fusion Layer - Merge and Inference over Extracted Inspection Documents
//!
//! Combines the three independently-extracted documents (areas, system
//! findings, thermal readings) into one diagnostic record:
//!
//! 1. **Thermal Matching**: cross-reference thermal anomalies against named
//!    areas by case-insensitive substring containment
//! 2. **Root-Cause Inference**: ordered rule table over system findings
//! 3. **Severity Scoring**: first-match-wins decision table over area count
//!    and system findings
//! 4. **Missing-Data Detection**: declaration-order scan for the
//!    "Not Available" sentinel
//!
//! All steps are synchronous in-memory transformations; inputs are assumed
//! to have passed schema validation upstream.
//!
//! ## Example
//!
//! ```rust
//! use inspection_common::{AreasDocument, SystemsDocument, ThermalDocument};
//! use inspection_fusion::merge_documents;
//!
//! let areas: AreasDocument = serde_json::from_str(r#"{"areas": [{
//!     "area_name": "Master Bedroom Wall",
//!     "negative_observation": "Dampness patch near the window",
//!     "positive_source": "Not Available",
//!     "thermal_confirmation": "Not Available",
//!     "confidence": "High"
//! }]}"#).unwrap();
//! let systems: SystemsDocument = serde_json::from_str(r#"{
//!     "bathroom_issues": {"tile_joint_gaps": "Yes", "nahani_trap_damage": "No", "concealed_plumbing": "No"},
//!     "external_wall": {"cracks_present": "No", "vegetation": "No", "internal_dampness": "No"},
//!     "terrace": {"surface_cracks": "No", "hollow_sound": "No", "slope_disturbance": "No"},
//!     "parking": {"ceiling_leakage": "No"}
//! }"#).unwrap();
//! let thermal = ThermalDocument { thermal_readings: vec![] };
//!
//! let diagnostic = merge_documents(areas, systems, &thermal).unwrap();
//! assert_eq!(diagnostic.overall.primary_root_causes, vec!["Bathroom waterproofing failure"]);
//! ```

use inspection_common::{
    AreaRecord, AreasDocument, BathroomIssues, ExternalWall, Parking, SystemsDocument, Terrace,
    ThermalConfirmation, ThermalDocument, ThermalReading, NOT_AVAILABLE,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Fusion errors
#[derive(Debug, Error)]
pub enum FusionError {
    #[error("diagnostic contains no areas")]
    NoAreas,

    #[error("severity rule table produced no classification for {area_count} areas")]
    SeverityGap { area_count: usize },
}

/// Three-level overall risk classification for the inspected property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Moderate,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Low => "Low",
            Severity::Moderate => "Moderate",
            Severity::High => "High",
        };
        f.write_str(label)
    }
}

/// Cross-document analysis summary attached to the diagnostic record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallAssessment {
    /// Causal hypotheses inferred from system findings, in rule order.
    pub primary_root_causes: Vec<String>,
    pub severity: Severity,
    /// `"<area or section>:<field>"` references for every sentinel value.
    pub missing_information: Vec<String>,
}

/// Final merged diagnostic: annotated areas, the four system sections
/// verbatim, and the overall assessment. Field order here fixes the
/// serialized output layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    pub areas: Vec<AreaRecord>,
    pub bathroom_issues: BathroomIssues,
    pub external_wall: ExternalWall,
    pub terrace: Terrace,
    pub parking: Parking,
    pub overall: OverallAssessment,
}

/// One root-cause inference rule: a predicate over the system findings and
/// the hypothesis it supports.
pub struct CauseRule {
    pub cause: &'static str,
    pub triggered: fn(&SystemsDocument) -> bool,
}

/// Root-cause rule table. Rules are independent; every rule is evaluated.
pub static CAUSE_RULES: &[CauseRule] = &[
    CauseRule {
        cause: "Bathroom waterproofing failure",
        triggered: |s| s.bathroom_issues.tile_joint_gaps.is_yes(),
    },
    CauseRule {
        cause: "External wall crack ingress",
        triggered: |s| s.external_wall.cracks_present.is_yes(),
    },
    CauseRule {
        cause: "Terrace surface deterioration",
        triggered: |s| s.terrace.surface_cracks.is_yes(),
    },
    CauseRule {
        cause: "Vertical moisture migration",
        triggered: |s| s.parking.ceiling_leakage.is_yes(),
    },
];

/// One severity rule: a predicate over area count and system findings.
pub struct SeverityRule {
    pub severity: Severity,
    pub matches: fn(usize, &SystemsDocument) -> bool,
}

/// Severity decision table, evaluated top-down, first match wins.
///
/// The High rule is strictly more specific than the Moderate rule and must
/// stay ahead of it. The Low fallback matches unconditionally.
pub static SEVERITY_RULES: &[SeverityRule] = &[
    SeverityRule {
        severity: Severity::High,
        matches: |count, s| {
            count >= 4
                && (s.bathroom_issues.tile_joint_gaps.is_yes() || s.terrace.surface_cracks.is_yes())
                && s.parking.ceiling_leakage.is_yes()
        },
    },
    SeverityRule {
        severity: Severity::Moderate,
        matches: |count, s| {
            count >= 2
                && (s.bathroom_issues.tile_joint_gaps.is_yes()
                    || s.external_wall.cracks_present.is_yes())
        },
    },
    SeverityRule {
        severity: Severity::Low,
        matches: |_, _| true,
    },
];

/// Merge the three extracted documents into one diagnostic record.
///
/// Runs the thermal matcher, root-cause inference, severity scoring, and
/// missing-data detection, then assembles and structurally validates the
/// result.
///
/// # Errors
///
/// Returns [`FusionError::NoAreas`] for an empty area list and
/// [`FusionError::SeverityGap`] if the severity rule table leaves a gap.
/// Zero inferred root causes and non-empty missing-data lists are
/// advisory: logged as warnings, never fatal.
pub fn merge_documents(
    areas_doc: AreasDocument,
    systems: SystemsDocument,
    thermal: &ThermalDocument,
) -> Result<DiagnosticRecord, FusionError> {
    let mut areas = areas_doc.areas;

    tracing::info!(
        "Starting merge: {} areas, {} thermal readings",
        areas.len(),
        thermal.thermal_readings.len()
    );

    // Step 1: Resolve thermal confirmation per area
    attach_thermal(&mut areas, &thermal.thermal_readings);

    // Step 2: Infer root causes from system findings
    let primary_root_causes = infer_root_causes(&systems);

    // Step 3: Score overall severity
    let severity = compute_severity(areas.len(), &systems)?;

    // Step 4: Detect missing data (after matching, so unmatched areas report
    // their unresolved thermal confirmation)
    let missing_information = detect_missing(&areas, &systems);

    // Step 5: Final structural validation
    if areas.is_empty() {
        return Err(FusionError::NoAreas);
    }
    if primary_root_causes.is_empty() {
        tracing::warn!("No root causes inferred");
    }
    if !missing_information.is_empty() {
        tracing::warn!(
            "{} fields reported as Not Available",
            missing_information.len()
        );
    }

    tracing::info!(
        "Merge complete: {} areas, {} root causes, severity {}",
        areas.len(),
        primary_root_causes.len(),
        severity
    );

    Ok(DiagnosticRecord {
        areas,
        bathroom_issues: systems.bathroom_issues,
        external_wall: systems.external_wall,
        terrace: systems.terrace,
        parking: systems.parking,
        overall: OverallAssessment {
            primary_root_causes,
            severity,
            missing_information,
        },
    })
}

/// Resolve `thermal_confirmation` for every area.
///
/// A reading matches an area when its `area_reference` (lowercased, not the
/// "Not Available" sentinel) occurs anywhere inside the lowercased area
/// name. Substring matching is deliberately permissive to tolerate naming
/// variance between the inspection and thermal reports; one area name
/// containing another's reference can produce a false positive.
pub fn attach_thermal(areas: &mut [AreaRecord], readings: &[ThermalReading]) {
    for area in areas.iter_mut() {
        let area_name = area.area_name.to_lowercase();

        let matched = readings.iter().any(|reading| {
            reading.has_area_reference()
                && area_name.contains(&reading.area_reference.to_lowercase())
        });

        area.thermal_confirmation = if matched {
            tracing::debug!("Thermal match: {}", area.area_name);
            ThermalConfirmation::MoistureDetected
        } else {
            ThermalConfirmation::NotAvailable
        };
    }
}

/// Evaluate the root-cause rule table against the system findings.
///
/// Every rule is evaluated (no short-circuiting); duplicate causes are
/// dropped while preserving rule order, so the output is deterministic.
/// An empty result is valid.
#[must_use]
pub fn infer_root_causes(systems: &SystemsDocument) -> Vec<String> {
    let mut causes: Vec<String> = Vec::with_capacity(CAUSE_RULES.len());

    for rule in CAUSE_RULES {
        if (rule.triggered)(systems) && !causes.iter().any(|c| c == rule.cause) {
            causes.push(rule.cause.to_string());
        }
    }

    causes
}

/// Evaluate the severity decision table top-down; the first matching rule
/// wins.
///
/// # Errors
///
/// Returns [`FusionError::SeverityGap`] if no rule matches, which signals a
/// broken rule table rather than bad input.
pub fn compute_severity(
    area_count: usize,
    systems: &SystemsDocument,
) -> Result<Severity, FusionError> {
    SEVERITY_RULES
        .iter()
        .find(|rule| (rule.matches)(area_count, systems))
        .map(|rule| rule.severity)
        .ok_or(FusionError::SeverityGap { area_count })
}

/// Report every field holding the "Not Available" sentinel as
/// `"<area_name or section>:<field>"`, areas first, then the ten system
/// fields in declaration order. An empty result is the success case.
#[must_use]
pub fn detect_missing(areas: &[AreaRecord], systems: &SystemsDocument) -> Vec<String> {
    let mut missing = Vec::new();

    for area in areas {
        let text_fields = [
            ("area_name", area.area_name.as_str()),
            ("negative_observation", area.negative_observation.as_str()),
            ("positive_source", area.positive_source.as_str()),
        ];
        for (field, value) in text_fields {
            if value == NOT_AVAILABLE {
                missing.push(format!("{}:{}", area.area_name, field));
            }
        }
        if area.thermal_confirmation == ThermalConfirmation::NotAvailable {
            missing.push(format!("{}:thermal_confirmation", area.area_name));
        }
    }

    for (section, field, value) in systems.fields() {
        if value.is_not_available() {
            missing.push(format!("{section}:{field}"));
        }
    }

    missing
}
