use crate::api::compose::{attach_url, PHOTO_URL_FIELD};
use crate::api::dispatch::Dispatcher;
use crate::api::response::{ApiError, Envelope};
use crate::storage::models::photo_key;
use crate::storage::Record;

pub(crate) async fn list_officers(d: &Dispatcher) -> Result<Envelope, ApiError> {
    let mut officers = d.records.scan(&d.officers)?;
    for officer in &mut officers {
        attach_photo_url(d, officer).await;
    }

    tracing::debug!(count = officers.len(), "Listed officers");
    Envelope::ok(&officers)
}

pub(crate) async fn get_officer(d: &Dispatcher, officer_id: &str) -> Result<Envelope, ApiError> {
    let mut officer = d
        .records
        .get_item(&d.officers, officer_id)?
        .ok_or_else(|| ApiError::not_found("Officer not found"))?;

    attach_photo_url(d, &mut officer).await;
    Envelope::ok(&officer)
}

async fn attach_photo_url(d: &Dispatcher, officer: &mut Record) {
    let url = match d.officers.key_of(officer) {
        Some(id) => d.links.sign(&d.officers_bucket, &photo_key(id)).await,
        None => None,
    };
    attach_url(officer, PHOTO_URL_FIELD, url);
}
