//! Monitoring: observations (vital signs, measurements) recorded during an encounter

pub mod access;
pub mod model;
pub mod service;

pub use access::{MonitoringAccess, StoreMonitoringAccess};
pub use model::{NewObservation, ObservationStatus, ObservationSummary};
pub use service::MonitoringService;

use crate::adapters::memory::{RecordSet, Table};
use crate::modules::admission::AdmissionAccess;
use model::Observation;
use std::sync::Arc;

#[derive(Clone)]
struct MonitoringTables {
    observations: Arc<Table<RecordSet<Observation>>>,
}

pub struct MonitoringModule {
    pub access: Arc<dyn MonitoringAccess>,
    pub service: Arc<MonitoringService>,
}

impl MonitoringModule {
    pub fn new(admission: Arc<dyn AdmissionAccess>) -> Self {
        let tables = MonitoringTables {
            observations: Table::new("monitoring.observations", RecordSet::default()),
        };
        Self {
            access: Arc::new(StoreMonitoringAccess::new(tables.clone())),
            service: Arc::new(MonitoringService::new(tables, admission)),
        }
    }
}
