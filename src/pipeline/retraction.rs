//! Retraction status from the primary registry's update-notice index.

use crate::models::{RetractionNotice, UpdateNotice};
use crate::sources::{Source, SourceError};

/// Update types that mark a work as no longer standing
pub const RETRACTION_TYPES: &[&str] = &["retraction", "withdrawal", "removal", "partial_retraction"];

/// Case-insensitive membership in [`RETRACTION_TYPES`]
pub fn is_retraction_type(update_type: &str) -> bool {
    let lowered = update_type.trim().to_lowercase();
    RETRACTION_TYPES.contains(&lowered.as_str())
}

/// Every retraction-type relation declared by `notices`, in notice order
pub fn retraction_notices(notices: &[UpdateNotice]) -> Vec<RetractionNotice> {
    notices
        .iter()
        .flat_map(|notice| {
            notice
                .update_to
                .iter()
                .filter(|relation| is_retraction_type(&relation.update_type))
                .map(move |relation| RetractionNotice {
                    notice_doi: notice.notice_doi.clone(),
                    update_type: relation.update_type.clone(),
                    source: relation.source.clone(),
                    updated: relation.updated,
                    label: relation.label.clone(),
                })
        })
        .collect()
}

/// Whether `doi` is retracted, with the notices that say so.
///
/// Retracted iff at least one notice declares a retraction-type update.
pub async fn check_retraction(
    source: &dyn Source,
    doi: &str,
) -> Result<(bool, Vec<RetractionNotice>), SourceError> {
    let notices = source.find_update_notices(doi).await?;
    let hits = retraction_notices(&notices);
    tracing::debug!(doi, notices = notices.len(), hits = hits.len(), "Checked update notices");
    Ok((!hits.is_empty(), hits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UpdateRelation;
    use crate::sources::MockSource;

    fn relation(update_type: &str) -> UpdateRelation {
        UpdateRelation {
            target_doi: Some("10.1000/xyz".into()),
            update_type: update_type.into(),
            source: Some("publisher".into()),
            updated: None,
            label: None,
        }
    }

    fn notice(doi: &str, types: &[&str]) -> UpdateNotice {
        UpdateNotice {
            notice_doi: Some(doi.into()),
            update_to: types.iter().map(|t| relation(t)).collect(),
        }
    }

    #[test]
    fn test_retraction_types_case_insensitive() {
        assert!(is_retraction_type("Retraction"));
        assert!(is_retraction_type("PARTIAL_RETRACTION"));
        assert!(is_retraction_type("withdrawal"));
        assert!(!is_retraction_type("correction"));
        assert!(!is_retraction_type("erratum"));
        assert!(!is_retraction_type(""));
    }

    #[test]
    fn test_only_retraction_relations_are_collected() {
        let notices = vec![
            notice("10.1000/erratum", &["correction"]),
            notice("10.1000/retraction", &["correction", "removal"]),
        ];
        let hits = retraction_notices(&notices);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].notice_doi.as_deref(), Some("10.1000/retraction"));
        assert_eq!(hits[0].update_type, "removal");
    }

    #[tokio::test]
    async fn test_check_retraction_single_notice() {
        let source = MockSource::new("crossref")
            .with_notices("10.1000/xyz", vec![notice("10.1000/notice", &["retraction"])]);

        let (retracted, notices) = check_retraction(&source, "10.1000/xyz").await.unwrap();
        assert!(retracted);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].notice_doi.as_deref(), Some("10.1000/notice"));
    }

    #[tokio::test]
    async fn test_check_retraction_without_notices() {
        let source = MockSource::new("crossref");
        let (retracted, notices) = check_retraction(&source, "10.1000/clean").await.unwrap();
        assert!(!retracted);
        assert!(notices.is_empty());
    }

    #[tokio::test]
    async fn test_check_retraction_propagates_errors() {
        let source = MockSource::new("crossref").failing();
        assert!(check_retraction(&source, "10.1000/xyz").await.is_err());
    }
}
