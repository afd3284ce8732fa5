//! Handlers for the three things the application can do with the store. Each handler performs
//! at most one store request and describes its outcome as a [StateDelta]. None of them retry.

use tracing::{debug, error, info};

use crate::{
    error::{RemoteFailure, ValidationError},
    store::{entities::StudyRecord, RemoteStore},
};

use super::state::{FormState, StateDelta};

/// Turns raw form input into a record. Checks are done in order and the first failing one wins.
pub fn validate(form: &FormState) -> Result<StudyRecord, ValidationError> {
    if form.study.is_empty() || form.study_time.is_empty() {
        return Err(ValidationError::MissingField);
    }
    let time = parse_hours(&form.study_time)?;
    Ok(StudyRecord::new(form.study.as_str(), time))
}

/// Durations have to be finite and can't be negative. Blank input counts as zero hours.
pub fn parse_hours(raw: &str) -> Result<f64, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0.);
    }
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.)
        .ok_or(ValidationError::NotNumeric)
}

pub async fn load(store: &dyn RemoteStore) -> StateDelta {
    match store.list_all().await {
        Ok(records) => {
            info!("Loaded {} records", records.len());
            StateDelta::Loaded(records)
        }
        Err(e) => {
            error!("Failed to load records: {e:?}");
            StateDelta::Failed(RemoteFailure::Load.into())
        }
    }
}

/// Saves an already validated record. Local state is only touched through the returned delta,
/// so nothing changes before the store answers.
pub async fn register(record: StudyRecord, store: &dyn RemoteStore) -> StateDelta {
    debug!("Registering {:?}", record);
    match store.insert(record.clone()).await {
        Ok(()) => {
            info!("Registered {:?}", record);
            StateDelta::Registered(record)
        }
        Err(e) => {
            error!("Failed to save {:?}: {e:?}", record);
            StateDelta::Failed(RemoteFailure::Save.into())
        }
    }
}

pub async fn delete(target: StudyRecord, store: &dyn RemoteStore) -> StateDelta {
    debug!("Deleting records matching {:?}", target);
    match store.delete_matching(target.clone()).await {
        Ok(()) => {
            info!("Deleted records matching {:?}", target);
            StateDelta::Deleted(target)
        }
        Err(e) => {
            error!("Failed to delete {:?}: {e:?}", target);
            StateDelta::Failed(RemoteFailure::Delete.into())
        }
    }
}
