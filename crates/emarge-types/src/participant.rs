//! Participant identity.

use serde::{Deserialize, Serialize};

use crate::ids::ParticipantId;

/// Beneficiary category for the disclosure report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeneficiaryType {
    HealthProfessional,
    Student,
    Association,
    /// Free-text category entered by the attendee
    Other(String),
}

impl std::fmt::Display for BeneficiaryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BeneficiaryType::HealthProfessional => write!(f, "health professional"),
            BeneficiaryType::Student => write!(f, "student"),
            BeneficiaryType::Association => write!(f, "association"),
            BeneficiaryType::Other(label) => write!(f, "{label}"),
        }
    }
}

/// An attendee identity, reusable across events via the roster relation.
///
/// Participants are not unique per event: the same person may appear on
/// many rosters and sign at many events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub city: String,
    /// Professional registration number, where the category carries one
    pub professional_number: Option<String>,
    pub beneficiary: BeneficiaryType,
}

impl Participant {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
