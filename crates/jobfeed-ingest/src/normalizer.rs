//! JSearch payload normalization
//!
//! Flattens raw search responses into [`NormalizedJob`] records. Total over
//! its input: malformed pages contribute nothing and entries without a job id
//! are skipped. No deduplication happens here.

use jobfeed_common::{NormalizedJob, RawPage, RawPayload};
use serde_json::Value;
use tracing::{debug, warn};

/// Upstream field names of a JSearch job entry.
mod fields {
    pub const ID: &str = "job_id";
    pub const TITLE: &str = "job_title";
    pub const COMPANY: &str = "employer_name";
    pub const WEBSITE: &str = "employer_website";
    pub const LOCATION: &str = "job_location";
    pub const CITY: &str = "job_city";
    pub const STATE: &str = "job_state";
    pub const COUNTRY: &str = "job_country";
    pub const EMPLOYMENT_TYPE: &str = "job_employment_type";
    pub const APPLY_LINK: &str = "job_apply_link";
    pub const DESCRIPTION: &str = "job_description";
    pub const POSTED_AT: &str = "job_posted_at";
    pub const PUBLISHER: &str = "job_publisher";
}

/// Normalize a single page or a batch of pages.
pub fn normalize(payload: &RawPayload) -> Vec<NormalizedJob> {
    normalize_pages(payload.pages())
}

pub fn normalize_pages(pages: &[RawPage]) -> Vec<NormalizedJob> {
    let jobs: Vec<NormalizedJob> = pages.iter().flat_map(normalize_page).collect();
    debug!(pages = pages.len(), jobs = jobs.len(), "Normalized pages");
    jobs
}

pub fn normalize_page(page: &RawPage) -> Vec<NormalizedJob> {
    match page.entries() {
        Ok(entries) => entries.iter().filter_map(normalize_entry).collect(),
        Err(err) => {
            warn!(error = %err, "Skipping page without a job list");
            Vec::new()
        },
    }
}

/// Map one raw entry. Returns `None` when the entry has no usable job id.
pub fn normalize_entry(entry: &Value) -> Option<NormalizedJob> {
    let Some(id) = text(entry, fields::ID).filter(|id| !id.is_empty()) else {
        debug!("Dropping entry without job id");
        return None;
    };

    Some(NormalizedJob {
        id,
        title: text(entry, fields::TITLE),
        company: text(entry, fields::COMPANY),
        website: text(entry, fields::WEBSITE),
        location: text(entry, fields::LOCATION),
        city: text(entry, fields::CITY),
        state: text(entry, fields::STATE),
        country: text(entry, fields::COUNTRY),
        employment_type: text(entry, fields::EMPLOYMENT_TYPE),
        apply_link: text(entry, fields::APPLY_LINK),
        description: text(entry, fields::DESCRIPTION).unwrap_or_default(),
        posted_at: text(entry, fields::POSTED_AT),
        publisher: text(entry, fields::PUBLISHER),
    })
}

/// Scalar field as text. Null, arrays and objects count as absent.
fn text(entry: &Value, field: &str) -> Option<String> {
    match entry.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn full_entry() -> Value {
        json!({
            "job_id": "abc123",
            "job_title": "Data Intern",
            "employer_name": "Acme",
            "employer_website": "https://acme.example",
            "job_location": "Pune, MH, IN",
            "job_city": "Pune",
            "job_state": "MH",
            "job_country": "IN",
            "job_employment_type": "INTERN",
            "job_apply_link": "https://acme.example/apply",
            "job_description": "Work on pipelines",
            "job_posted_at": "2 days ago",
            "job_publisher": "LinkedIn",
            "job_is_remote": false
        })
    }

    #[test]
    fn test_maps_every_field() {
        let job = normalize_entry(&full_entry()).unwrap();

        assert_eq!(job.id, "abc123");
        assert_eq!(job.title.as_deref(), Some("Data Intern"));
        assert_eq!(job.company.as_deref(), Some("Acme"));
        assert_eq!(job.website.as_deref(), Some("https://acme.example"));
        assert_eq!(job.location.as_deref(), Some("Pune, MH, IN"));
        assert_eq!(job.city.as_deref(), Some("Pune"));
        assert_eq!(job.state.as_deref(), Some("MH"));
        assert_eq!(job.country.as_deref(), Some("IN"));
        assert_eq!(job.employment_type.as_deref(), Some("INTERN"));
        assert_eq!(job.apply_link.as_deref(), Some("https://acme.example/apply"));
        assert_eq!(job.description, "Work on pipelines");
        assert_eq!(job.posted_at.as_deref(), Some("2 days ago"));
        assert_eq!(job.publisher.as_deref(), Some("LinkedIn"));
    }

    #[test]
    fn test_missing_fields_become_empty() {
        let job = normalize_entry(&json!({ "job_id": "x", "job_description": null })).unwrap();
        assert_eq!(job, NormalizedJob::new("x"));
        assert_eq!(job.description, "");
    }

    #[test]
    fn test_entries_without_id_are_dropped() {
        assert!(normalize_entry(&json!({ "job_title": "No id" })).is_none());
        assert!(normalize_entry(&json!({ "job_id": "", "job_title": "Empty id" })).is_none());
        assert!(normalize_entry(&json!({ "job_id": null })).is_none());
        assert!(normalize_entry(&json!("not an object")).is_none());
    }

    #[test]
    fn test_numeric_id_is_kept_as_text() {
        let job = normalize_entry(&json!({ "job_id": 42 })).unwrap();
        assert_eq!(job.id, "42");
    }

    #[test]
    fn test_malformed_pages_contribute_nothing() {
        let pages = vec![
            RawPage::new(json!({ "status": "ERROR", "message": "quota" })),
            RawPage::new(json!({ "data": [full_entry()] })),
            RawPage::new(json!({ "data": { "job_id": "not-a-list" } })),
            RawPage::new(json!(null)),
        ];

        let jobs = normalize_pages(&pages);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, "abc123");
    }

    #[test]
    fn test_single_and_batch_payloads() {
        let page = RawPage::new(json!({ "data": [full_entry(), { "job_id": "def" }] }));

        let single = normalize(&RawPayload::from(page.clone()));
        let batch = normalize(&RawPayload::from(vec![page.clone(), page]));

        assert_eq!(single.len(), 2);
        // No cross-page deduplication
        assert_eq!(batch.len(), 4);
    }

    proptest! {
        #[test]
        fn prop_entries_without_id_never_survive(
            title in proptest::option::of(".*"),
            company in proptest::option::of(".*"),
            description in proptest::option::of(".*"),
        ) {
            let entry = json!({
                "job_title": title,
                "employer_name": company,
                "job_description": description,
            });
            let page = RawPage::new(json!({ "data": [entry] }));
            prop_assert!(normalize_page(&page).is_empty());
        }
    }
}
