//! Write service for the identity registry
//!
//! All creates deduplicate: registering a record that already exists returns the
//! existing one with `created = false` instead of inserting a second row.

use super::model::{
    practitioner_key, Location, LocationSummary, NewLocation, NewOrganization, NewPatient,
    NewPractitioner, Organization, OrganizationSummary, Patient, PatientSummary, Practitioner,
    PractitionerSummary, Registration,
};
use super::IdentityTables;
use crate::adapters::memory::Transaction;
use crate::core::identifiers::SequentialIdGenerator;
use crate::domain::validate::{match_key, optional_text, required_text};
use crate::domain::{HospitalError, OrganizationId, RequestContext, Result};

pub struct IdentityService {
    tables: IdentityTables,
    ids: SequentialIdGenerator,
    patient_prefix: String,
}

impl IdentityService {
    pub(super) fn new(
        tables: IdentityTables,
        ids: SequentialIdGenerator,
        patient_prefix: String,
    ) -> Self {
        Self {
            tables,
            ids,
            patient_prefix,
        }
    }

    /// Registers an organization, deduplicated on its name
    pub async fn register_organization(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        input: NewOrganization,
    ) -> Result<Registration<OrganizationSummary>> {
        let name = required_text("name", &input.name)?;
        let key = match_key(&name);

        if let Some(existing) = tx
            .read(&self.tables.organizations)
            .values()
            .find(|o| match_key(&o.name) == key)
        {
            return Ok(Registration {
                record: existing.summary(),
                created: false,
            });
        }

        let record = tx
            .write(&self.tables.organizations)
            .create(|id| Organization {
                id,
                name,
                kind: input.kind,
                active: true,
            })
            .summary();

        tracing::info!(
            correlation_id = %ctx.correlation_id(),
            organization_id = %record.id,
            "Organization registered"
        );
        Ok(Registration {
            record,
            created: true,
        })
    }

    /// Activates or deactivates an organization
    ///
    /// Existing references stay valid; deactivation only affects new invoices.
    pub async fn set_organization_active(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        id: OrganizationId,
        active: bool,
    ) -> Result<OrganizationSummary> {
        let organization = tx
            .write(&self.tables.organizations)
            .get_mut(id.value())
            .ok_or_else(|| HospitalError::not_found("organization", "organization_id", id))?;
        organization.active = active;

        tracing::info!(
            correlation_id = %ctx.correlation_id(),
            organization_id = %id,
            active,
            "Organization status changed"
        );
        Ok(organization.summary())
    }

    /// Registers a location, deduplicated on (organization, name)
    pub async fn register_location(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        input: NewLocation,
    ) -> Result<Registration<LocationSummary>> {
        let name = required_text("name", &input.name)?;
        if !tx
            .read(&self.tables.organizations)
            .contains(input.organization_id.value())
        {
            return Err(HospitalError::not_found(
                "organization",
                "organization_id",
                input.organization_id,
            ));
        }

        let key = match_key(&name);
        if let Some(existing) = tx
            .read(&self.tables.locations)
            .values()
            .find(|l| l.organization_id == input.organization_id && match_key(&l.name) == key)
        {
            return Ok(Registration {
                record: existing.summary(),
                created: false,
            });
        }

        let record = tx
            .write(&self.tables.locations)
            .create(|id| Location {
                id,
                organization_id: input.organization_id,
                name,
                kind: input.kind,
            })
            .summary();

        tracing::info!(
            correlation_id = %ctx.correlation_id(),
            location_id = %record.id,
            organization_id = %input.organization_id,
            "Location registered"
        );
        Ok(Registration {
            record,
            created: true,
        })
    }

    /// Registers a practitioner, deduplicated on licence number (or full name
    /// when no licence is given)
    pub async fn register_practitioner(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        input: NewPractitioner,
    ) -> Result<Registration<PractitionerSummary>> {
        let first_name = required_text("first_name", &input.first_name)?;
        let last_name = required_text("last_name", &input.last_name)?;
        let licence_number = optional_text(input.licence_number);
        let key = practitioner_key(&first_name, &last_name, licence_number.as_deref());

        if let Some(existing) = tx
            .read(&self.tables.practitioners)
            .values()
            .find(|p| p.dedup_key() == key)
        {
            return Ok(Registration {
                record: existing.summary(),
                created: false,
            });
        }

        let record = tx
            .write(&self.tables.practitioners)
            .create(|id| Practitioner {
                id,
                first_name,
                last_name,
                licence_number,
                qualification: optional_text(input.qualification),
            })
            .summary();

        tracing::info!(
            correlation_id = %ctx.correlation_id(),
            practitioner_id = %record.id,
            "Practitioner registered"
        );
        Ok(Registration {
            record,
            created: true,
        })
    }

    /// Registers a patient, deduplicated on (first name, last name, birth date)
    ///
    /// A new patient receives the next `<PREFIX>-<YEAR>-<NNNNN>` registry number.
    /// The number is allocated only after the duplicate check, so matching an
    /// existing patient never consumes one.
    pub async fn register_patient(
        &self,
        ctx: &RequestContext,
        tx: &mut Transaction,
        input: NewPatient,
    ) -> Result<Registration<PatientSummary>> {
        let first_name = required_text("first_name", &input.first_name)?;
        let last_name = required_text("last_name", &input.last_name)?;
        if input.birth_date > ctx.today() {
            return Err(HospitalError::Validation(format!(
                "birth_date {} is in the future",
                input.birth_date
            )));
        }

        if let Some(existing) = tx
            .read(&self.tables.patients)
            .values()
            .find(|p| p.matches(&first_name, &last_name, input.birth_date))
        {
            tracing::debug!(
                correlation_id = %ctx.correlation_id(),
                patient_id = existing.id,
                "Patient matched existing registration"
            );
            return Ok(Registration {
                record: existing.summary(),
                created: false,
            });
        }

        let external_id = self.ids.next(ctx, &self.patient_prefix).await?;

        let record = tx
            .write(&self.tables.patients)
            .create(|id| Patient {
                id,
                external_id,
                first_name,
                last_name,
                birth_date: input.birth_date,
                gender: input.gender,
                phone: optional_text(input.phone),
                registered_at: ctx.now(),
            })
            .summary();

        tracing::info!(
            correlation_id = %ctx.correlation_id(),
            patient_id = %record.id,
            external_id = %record.external_id,
            "Patient registered"
        );
        Ok(Registration {
            record,
            created: true,
        })
    }
}
