use crate::error::{AppResult, ErrorReason};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

pub const DEFAULT_CATEGORY: &str = "Technical";

fn default_category() -> String {
    DEFAULT_CATEGORY.to_owned()
}

/// Blank categories fall back to [`DEFAULT_CATEGORY`].
pub fn normalize_category(category: String) -> String {
    if category.trim().is_empty() {
        default_category()
    } else {
        category
    }
}

fn deserialize_category<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let category = Option::<String>::deserialize(deserializer)?;
    Ok(category.map_or_else(default_category, normalize_category))
}

/// One issued credential as stored in the catalog.
#[skip_serializing_none]
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRecord {
    pub id: String,
    pub title: String,
    pub issuer: String,
    /// Free-form display string such as "March 2025".
    #[serde(default)]
    pub issue_date: String,
    #[serde(default)]
    pub expiration_date: Option<String>,
    #[serde(default, alias = "verificationCode", alias = "verificationId")]
    pub credential_id: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default = "default_category", deserialize_with = "deserialize_category")]
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "pdfUrl", alias = "imageUrl")]
    pub document_url: String,
    #[serde(default)]
    pub credential_url: Option<String>,
    #[serde(default)]
    pub preview_image: Option<String>,
}

impl CertificateRecord {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        issuer: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            issuer: issuer.into(),
            issue_date: Default::default(),
            expiration_date: Default::default(),
            credential_id: Default::default(),
            skills: Default::default(),
            category: default_category(),
            description: Default::default(),
            document_url: Default::default(),
            credential_url: Default::default(),
            preview_image: Default::default(),
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.id.trim().is_empty() {
            return Err(ErrorReason::MissingField("id").into());
        }
        if self.title.trim().is_empty() {
            return Err(ErrorReason::MissingField("title").into());
        }
        if self.issuer.trim().is_empty() {
            return Err(ErrorReason::MissingField("issuer").into());
        }
        Ok(())
    }

    pub fn category(&self) -> &str {
        if self.category.trim().is_empty() {
            DEFAULT_CATEGORY
        } else {
            &self.category
        }
    }

    /// Parsed expiration instant, `None` when absent or unparseable.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expiration_date.as_deref().and_then(parse_date)
    }

    /// A record expires strictly before `now`; the exact instant still counts as valid.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().map_or(false, |expires| expires < now)
    }

    pub fn skill_preview(&self, limit: usize) -> SkillPreview<'_> {
        let shown = &self.skills[..self.skills.len().min(limit)];
        SkillPreview {
            shown,
            hidden: self.skills.len() - shown.len(),
        }
    }

    /// Overwrite every field present in `patch`. The identifier never changes.
    pub fn apply(&mut self, patch: CertificatePatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(issuer) = patch.issuer {
            self.issuer = issuer;
        }
        if let Some(issue_date) = patch.issue_date {
            self.issue_date = issue_date;
        }
        if let Some(expiration_date) = patch.expiration_date {
            self.expiration_date = expiration_date;
        }
        if let Some(credential_id) = patch.credential_id {
            self.credential_id = credential_id;
        }
        if let Some(skills) = patch.skills {
            self.skills = skills;
        }
        if let Some(category) = patch.category {
            self.category = normalize_category(category);
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(document_url) = patch.document_url {
            self.document_url = document_url;
        }
        if let Some(credential_url) = patch.credential_url {
            self.credential_url = credential_url;
        }
        if let Some(preview_image) = patch.preview_image {
            self.preview_image = preview_image;
        }
    }
}

impl Display for CertificateRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}[{} / {}]", self.id, self.title, self.issuer)
    }
}

/// Partial replacement for a record. Optional fields use a nested `Option`
/// so that an explicit `null` clears the value while an absent key keeps it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificatePatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub issue_date: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub expiration_date: Option<Option<String>>,
    #[serde(
        default,
        alias = "verificationCode",
        alias = "verificationId",
        with = "::serde_with::rust::double_option"
    )]
    pub credential_id: Option<Option<String>>,
    #[serde(default)]
    pub skills: Option<Vec<String>>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, alias = "pdfUrl", alias = "imageUrl")]
    pub document_url: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub credential_url: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub preview_image: Option<Option<String>>,
}

impl From<CertificateRecord> for CertificatePatch {
    fn from(record: CertificateRecord) -> Self {
        Self {
            title: Some(record.title),
            issuer: Some(record.issuer),
            issue_date: Some(record.issue_date),
            expiration_date: Some(record.expiration_date),
            credential_id: Some(record.credential_id),
            skills: Some(record.skills),
            category: Some(record.category),
            description: Some(record.description),
            document_url: Some(record.document_url),
            credential_url: Some(record.credential_url),
            preview_image: Some(record.preview_image),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SkillPreview<'a> {
    pub shown: &'a [String],
    pub hidden: usize,
}

/// Parse the date notations found in certificate data. Dates without a time
/// of day resolve to midnight UTC; month-only dates to the first of the month.
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(datetime) = DateTime::parse_from_rfc3339(input) {
        return Some(datetime.with_timezone(&Utc));
    }

    let date = ["%Y-%m-%d", "%B %d, %Y", "%d %B %Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
        .or_else(|| NaiveDate::parse_from_str(&format!("1 {input}"), "%d %B %Y").ok())?;

    date.and_hms_opt(0, 0, 0)
        .map(|midnight| Utc.from_utc_datetime(&midnight))
}

#[cfg(test)]
mod test {
    use super::*;

    fn at(date: &str) -> DateTime<Utc> {
        parse_date(date).unwrap()
    }

    #[test]
    fn parse_supported_notations() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_date("2025-03-01"), Some(expected));
        assert_eq!(parse_date("2025-03-01T00:00:00Z"), Some(expected));
        assert_eq!(parse_date("March 2025"), Some(expected));
        assert_eq!(parse_date("Mar 2025"), Some(expected));
        assert_eq!(parse_date("March 1, 2025"), Some(expected));
        assert_eq!(parse_date("1 March 2025"), Some(expected));
        assert_eq!(parse_date("  2025-03-01 "), Some(expected));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("someday"), None);
        assert_eq!(parse_date("2025-13-45"), None);
    }

    #[test]
    fn expiration_is_strictly_before_now() {
        let mut record = CertificateRecord::new("a", "Azure AI Fundamentals", "Microsoft");
        record.expiration_date = Some("2025-06-01".to_owned());

        assert!(!record.is_expired(at("2025-05-31")));
        assert!(!record.is_expired(at("2025-06-01")));
        assert!(record.is_expired(at("2025-06-01T00:00:01Z")));
    }

    #[test]
    fn missing_or_malformed_expiration_never_expires() {
        let now = at("2099-01-01");
        let mut record = CertificateRecord::new("a", "Title", "Issuer");
        assert!(!record.is_expired(now));

        record.expiration_date = Some("not a date".to_owned());
        assert!(!record.is_expired(now));
    }

    #[test]
    fn deserialize_fills_defaults_and_aliases() {
        let record: CertificateRecord = serde_json::from_str(
            r#"{
                "id": "cert-1",
                "title": "Prompt Engineering",
                "issuer": "IBM",
                "issueDate": "April 2025",
                "pdfUrl": "/certs/prompt.pdf",
                "verificationCode": "XYZ-1",
                "skills": ["LLM"]
            }"#,
        )
        .unwrap();

        assert_eq!(record.category, DEFAULT_CATEGORY);
        assert_eq!(record.document_url, "/certs/prompt.pdf");
        assert_eq!(record.credential_id.as_deref(), Some("XYZ-1"));
        assert_eq!(record.expiration_date, None);
    }

    #[test]
    fn null_or_blank_category_becomes_default() {
        let record: CertificateRecord = serde_json::from_str(
            r#"{"id": "mine", "title": "Mine", "issuer": "Me", "category": null}"#,
        )
        .unwrap();
        assert_eq!(record.category, DEFAULT_CATEGORY);

        let record: CertificateRecord = serde_json::from_str(
            r#"{"id": "mine", "title": "Mine", "issuer": "Me", "category": "  "}"#,
        )
        .unwrap();
        assert_eq!(record.category, DEFAULT_CATEGORY);

        let mut record = CertificateRecord::new("a", "Title", "Issuer");
        record.category = String::new();
        assert_eq!(record.category(), DEFAULT_CATEGORY);
    }

    #[test]
    fn patch_with_blank_category_restores_default() {
        let mut record = CertificateRecord::new("a", "Title", "Issuer");
        record.category = "Professional".to_owned();
        record.apply(CertificatePatch {
            category: Some(String::new()),
            ..Default::default()
        });
        assert_eq!(record.category, DEFAULT_CATEGORY);
    }

    #[test]
    fn serialize_omits_absent_optionals() {
        let record = CertificateRecord::new("a", "Title", "Issuer");
        let value = serde_json::to_value(&record).unwrap();
        let object = value.as_object().unwrap();

        assert!(object.contains_key("documentUrl"));
        assert!(object.contains_key("issueDate"));
        assert!(!object.contains_key("expirationDate"));
        assert!(!object.contains_key("description"));
    }

    #[test]
    fn validate_requires_identity_fields() {
        let record = CertificateRecord::new("a", "  ", "Issuer");
        let err = record.validate().unwrap_err();
        assert!(matches!(err.reason(), ErrorReason::MissingField("title")));

        let record = CertificateRecord::new("", "Title", "Issuer");
        let err = record.validate().unwrap_err();
        assert!(matches!(err.reason(), ErrorReason::MissingField("id")));

        assert!(CertificateRecord::new("a", "Title", "Issuer").validate().is_ok());
    }

    #[test]
    fn skill_preview_truncates_without_mutation() {
        let mut record = CertificateRecord::new("a", "Title", "Issuer");
        assert_eq!(record.skill_preview(3).hidden, 0);
        assert!(record.skill_preview(3).shown.is_empty());

        record.skills = ["Python", "SQL", "pandas", "Jupyter", "Azure"]
            .map(String::from)
            .to_vec();
        let preview = record.skill_preview(3);
        assert_eq!(preview.shown, &record.skills[..3]);
        assert_eq!(preview.hidden, 2);
        assert_eq!(record.skills.len(), 5);
    }

    #[test]
    fn patch_keeps_absent_fields_and_clears_nulls() {
        let mut record = CertificateRecord::new("a", "Title", "Issuer");
        record.description = Some("old".to_owned());
        record.credential_id = Some("ID-1".to_owned());

        let patch: CertificatePatch = serde_json::from_str(
            r#"{"title": "New title", "description": null, "skills": ["Rust"]}"#,
        )
        .unwrap();
        record.apply(patch);

        assert_eq!(record.id, "a");
        assert_eq!(record.title, "New title");
        assert_eq!(record.issuer, "Issuer");
        assert_eq!(record.description, None);
        assert_eq!(record.credential_id.as_deref(), Some("ID-1"));
        assert_eq!(record.skills, vec!["Rust".to_owned()]);
    }

    #[test]
    fn full_patch_replaces_everything_but_id() {
        let mut record = CertificateRecord::new("a", "Title", "Issuer");
        record.description = Some("old".to_owned());

        let mut replacement = CertificateRecord::new("b", "Other", "Someone");
        replacement.category = "Professional".to_owned();
        record.apply(replacement.clone().into());

        assert_eq!(record.id, "a");
        replacement.id = "a".to_owned();
        assert_eq!(record, replacement);
    }
}
