//! Domain events
//!
//! Write services return the events their changes imply instead of triggering
//! other modules directly. The caller commits the write, then hands the events
//! to [`CareOrchestrator`](super::orchestrator::CareOrchestrator).

use crate::domain::{EncounterId, PatientId};
use crate::modules::admission::EncounterClass;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A new encounter was committed
    EncounterCreated {
        encounter_id: EncounterId,
        patient_id: PatientId,
        class: EncounterClass,
    },
}

impl DomainEvent {
    /// Event name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::EncounterCreated { .. } => "encounter_created",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_tag() {
        let event = DomainEvent::EncounterCreated {
            encounter_id: EncounterId::new(3),
            patient_id: PatientId::new(1),
            class: EncounterClass::Inpatient,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "encounter_created");
        assert_eq!(json["class"], "inpatient");
        assert_eq!(event.name(), "encounter_created");
    }
}
