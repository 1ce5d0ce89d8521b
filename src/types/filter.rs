use super::CertificateRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wildcard category that matches every record.
pub const ALL_CATEGORIES: &str = "All";

fn all_categories() -> String {
    ALL_CATEGORIES.to_owned()
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    #[serde(default = "all_categories", alias = "category")]
    pub active_category: String,
    #[serde(default, alias = "q")]
    pub search_query: String,
    #[serde(default, alias = "show_expired")]
    pub show_expired: bool,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            active_category: all_categories(),
            search_query: Default::default(),
            show_expired: Default::default(),
        }
    }
}

impl FilterCriteria {
    pub fn matches_category(&self, record: &CertificateRecord) -> bool {
        self.active_category == ALL_CATEGORIES || record.category() == self.active_category
    }

    pub fn matches_search(&self, record: &CertificateRecord) -> bool {
        if self.search_query.is_empty() {
            return true;
        }
        let needle = self.search_query.to_lowercase();
        let contains = |haystack: &str| haystack.to_lowercase().contains(&needle);

        contains(&record.title)
            || contains(&record.issuer)
            || record.skills.iter().any(|skill| contains(skill))
    }

    pub fn matches_expiration(&self, record: &CertificateRecord, now: DateTime<Utc>) -> bool {
        self.show_expired || !record.is_expired(now)
    }

    pub fn matches(&self, record: &CertificateRecord, now: DateTime<Utc>) -> bool {
        self.matches_category(record)
            && self.matches_search(record)
            && self.matches_expiration(record, now)
    }
}

/// Visible subset of `records`, in collection order.
pub fn visible<'a>(
    records: &'a [CertificateRecord],
    criteria: &FilterCriteria,
    now: DateTime<Utc>,
) -> Vec<&'a CertificateRecord> {
    records
        .iter()
        .filter(|record| criteria.matches(record, now))
        .collect()
}

/// `"All"` followed by every distinct category in first-seen order.
pub fn categories(records: &[CertificateRecord]) -> Vec<String> {
    let mut categories = vec![all_categories()];
    for record in records {
        let category = record.category();
        if !categories.iter().any(|seen| seen == category) {
            categories.push(category.to_owned());
        }
    }
    categories
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::parse_date;

    fn record(id: &str, title: &str, issuer: &str, category: &str) -> CertificateRecord {
        let mut record = CertificateRecord::new(id, title, issuer);
        record.category = category.to_owned();
        record
    }

    fn catalog() -> Vec<CertificateRecord> {
        let mut azure = record("azure", "AI Fundamentals", "Microsoft", "Technical");
        azure.skills = vec!["Azure AI".to_owned(), "Machine Learning".to_owned()];

        let mut leadership = record("lead", "Leadership Essentials", "Coursera", "Professional");
        leadership.expiration_date = Some("2024-01-01".to_owned());

        let comms = record("comms", "Business Communication", "LinkedIn", "Professional");
        let python = record("python", "Python for Data Science", "IBM", "Technical");

        vec![azure, leadership, comms, python]
    }

    fn now() -> DateTime<Utc> {
        parse_date("2025-06-01").unwrap()
    }

    fn ids(records: Vec<&CertificateRecord>) -> Vec<&str> {
        records.into_iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn default_criteria_hide_only_expired() {
        let records = catalog();
        let result = visible(&records, &FilterCriteria::default(), now());
        assert_eq!(ids(result), ["azure", "comms", "python"]);
    }

    #[test]
    fn category_filter_returns_non_expired_in_category() {
        let records = catalog();
        let criteria = FilterCriteria {
            active_category: "Professional".to_owned(),
            ..Default::default()
        };
        assert_eq!(ids(visible(&records, &criteria, now())), ["comms"]);

        let criteria = FilterCriteria {
            show_expired: true,
            ..criteria
        };
        assert_eq!(ids(visible(&records, &criteria, now())), ["lead", "comms"]);
    }

    #[test]
    fn search_matches_skills_case_insensitively() {
        let records = catalog();
        let criteria = FilterCriteria {
            search_query: "azure".to_owned(),
            ..Default::default()
        };
        assert_eq!(ids(visible(&records, &criteria, now())), ["azure"]);
    }

    #[test]
    fn search_matches_title_and_issuer() {
        let records = catalog();
        let criteria = FilterCriteria {
            search_query: "IBM".to_owned(),
            ..Default::default()
        };
        assert_eq!(ids(visible(&records, &criteria, now())), ["python"]);

        let criteria = FilterCriteria {
            search_query: "communication".to_owned(),
            ..Default::default()
        };
        assert_eq!(ids(visible(&records, &criteria, now())), ["comms"]);
    }

    #[test]
    fn unknown_category_yields_nothing() {
        let records = catalog();
        let criteria = FilterCriteria {
            active_category: "Mobile".to_owned(),
            show_expired: true,
            ..Default::default()
        };
        assert!(visible(&records, &criteria, now()).is_empty());
    }

    #[test]
    fn filtering_is_pure() {
        let records = catalog();
        let snapshot = records.clone();
        let criteria = FilterCriteria {
            search_query: "a".to_owned(),
            show_expired: true,
            ..Default::default()
        };

        let first = visible(&records, &criteria, now());
        let second = visible(&records, &criteria, now());
        assert_eq!(first, second);
        assert_eq!(records, snapshot);
    }

    #[test]
    fn categories_are_deduplicated_in_order() {
        let records = catalog();
        assert_eq!(categories(&records), ["All", "Technical", "Professional"]);
        assert_eq!(categories(&[]), ["All"]);
    }

    #[test]
    fn blank_category_counts_as_default() {
        let records = vec![record("blank", "Untitled", "Nobody", "")];
        assert_eq!(categories(&records), ["All", "Technical"]);

        let criteria = FilterCriteria {
            active_category: "Technical".to_owned(),
            ..Default::default()
        };
        assert_eq!(ids(visible(&records, &criteria, now())), ["blank"]);
    }

    #[test]
    fn criteria_deserialize_from_query_names() {
        let criteria: FilterCriteria =
            serde_json::from_str(r#"{"category": "Professional", "q": "lead", "show_expired": true}"#)
                .unwrap();
        assert_eq!(criteria.active_category, "Professional");
        assert_eq!(criteria.search_query, "lead");
        assert!(criteria.show_expired);

        let criteria: FilterCriteria = serde_json::from_str("{}").unwrap();
        assert_eq!(criteria, FilterCriteria::default());
    }
}
