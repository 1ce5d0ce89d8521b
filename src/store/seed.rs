use super::decode_document;
use crate::{configs::SeedSource, error::AppResult, types::CertificateRecord};

/// Dataset used when nothing has been persisted yet, or when the persisted
/// document cannot be read. A configured source replaces the built-in list.
pub async fn load_default_dataset(
    source: Option<&SeedSource>,
) -> AppResult<Vec<CertificateRecord>> {
    let Some(source) = source else {
        return Ok(builtin());
    };
    let data = source.read().await?;
    let records = decode_document(&data)?;
    debug!("Loaded {} default certificates from seed", records.len());
    Ok(records)
}

fn record(
    id: &str,
    title: &str,
    issuer: &str,
    issue_date: &str,
    category: &str,
    skills: &[&str],
    document_url: &str,
) -> CertificateRecord {
    let mut record = CertificateRecord::new(id, title, issuer);
    record.issue_date = issue_date.to_owned();
    record.category = category.to_owned();
    record.skills = skills.iter().map(|&skill| skill.to_owned()).collect();
    record.document_url = document_url.to_owned();
    record
}

pub fn builtin() -> Vec<CertificateRecord> {
    let mut azure_ai = record(
        "azure-ai-fundamentals",
        "Microsoft Certified: Azure AI Fundamentals",
        "Microsoft",
        "March 2025",
        "Technical",
        &["Azure AI", "Machine Learning", "Computer Vision", "NLP"],
        "/certificates/azure-ai-fundamentals.pdf",
    );
    azure_ai.credential_id = Some("AI-900".to_owned());
    azure_ai.description = Some(
        "Foundational knowledge of machine learning and AI workloads on Microsoft Azure."
            .to_owned(),
    );

    let mut data_analytics = record(
        "google-data-analytics",
        "Google Data Analytics Professional Certificate",
        "Google",
        "January 2025",
        "Technical",
        &["SQL", "Data Cleaning", "Tableau", "R"],
        "/certificates/google-data-analytics.pdf",
    );
    data_analytics.credential_url =
        Some("https://www.coursera.org/professional-certificates/google-data-analytics".to_owned());

    let python = record(
        "ibm-python-data-science",
        "Python for Data Science, AI & Development",
        "IBM",
        "November 2024",
        "Technical",
        &["Python", "pandas", "NumPy", "APIs"],
        "/certificates/ibm-python-data-science.pdf",
    );

    let mut ethics = record(
        "ai-ethics",
        "Ethics of Artificial Intelligence",
        "University of Helsinki",
        "October 2024",
        "Professional",
        &["Ethical AI", "Data Governance"],
        "/certificates/ai-ethics.pdf",
    );
    ethics.description =
        Some("Responsible AI principles, fairness and accountability in automated systems.".to_owned());

    let communication = record(
        "business-communication",
        "Business Communication",
        "LinkedIn Learning",
        "August 2024",
        "Professional",
        &["Communication", "Presentation"],
        "/certificates/business-communication.png",
    );

    let mut cloud_practitioner = record(
        "aws-cloud-practitioner",
        "AWS Certified Cloud Practitioner",
        "Amazon Web Services",
        "June 2022",
        "Technical",
        &["AWS", "Cloud Concepts", "Billing"],
        "/certificates/aws-cloud-practitioner.pdf",
    );
    cloud_practitioner.expiration_date = Some("2025-06-15".to_owned());

    vec![
        azure_ai,
        data_analytics,
        python,
        ethics,
        communication,
        cloud_practitioner,
    ]
}
