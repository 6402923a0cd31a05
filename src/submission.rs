use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DiagnosisError;

/// Form fields as received, before trimming.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSubmission {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub route: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub city: String,
    pub route: String,
    pub number: String,
    pub name: String,
    pub submitted_at: DateTime<Utc>,
}

impl Submission {
    /// Free-text directory query: name, city, route and number joined by
    /// single spaces, empty fields skipped.
    pub fn directory_query(&self) -> String {
        join_non_empty(&[&self.name, &self.city, &self.route, &self.number])
    }
}

pub(crate) fn join_non_empty(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Trims the four fields and requires every one of them to be non-empty.
pub fn validate(raw: &RawSubmission) -> Result<Submission, DiagnosisError> {
    let trimmed = |v: &Option<String>| v.as_deref().unwrap_or_default().trim().to_string();

    let city = trimmed(&raw.city);
    let route = trimmed(&raw.route);
    let number = trimmed(&raw.number);
    let name = trimmed(&raw.name);

    let missing: Vec<&'static str> = [
        ("city", &city),
        ("route", &route),
        ("number", &number),
        ("name", &name),
    ]
    .into_iter()
    .filter(|(_, value)| value.is_empty())
    .map(|(field, _)| field)
    .collect();

    if !missing.is_empty() {
        return Err(DiagnosisError::IncompleteSubmission { missing });
    }

    Ok(Submission {
        city,
        route,
        number,
        name,
        submitted_at: Utc::now(),
    })
}

#[cfg(test)]
pub(crate) fn sample_submission() -> Submission {
    Submission {
        city: "Taipei".to_string(),
        route: "Zhongshan Rd".to_string(),
        number: "12".to_string(),
        name: "Sunrise Cafe".to_string(),
        submitted_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(city: &str, route: &str, number: &str, name: &str) -> RawSubmission {
        RawSubmission {
            city: Some(city.to_string()),
            route: Some(route.to_string()),
            number: Some(number.to_string()),
            name: Some(name.to_string()),
        }
    }

    #[test]
    fn test_validate_trims_fields() {
        let submission = validate(&raw("  Taipei ", "Zhongshan Rd\t", " 12", " Sunrise Cafe ")).unwrap();
        assert_eq!(submission.city, "Taipei");
        assert_eq!(submission.route, "Zhongshan Rd");
        assert_eq!(submission.number, "12");
        assert_eq!(submission.name, "Sunrise Cafe");
    }

    #[test]
    fn test_validate_keeps_case_and_inner_spacing() {
        let submission = validate(&raw("TAIPEI", "Sec. 2  Zhongshan", "12-1", "cafe")).unwrap();
        assert_eq!(submission.city, "TAIPEI");
        assert_eq!(submission.route, "Sec. 2  Zhongshan");
        assert_eq!(submission.name, "cafe");
    }

    #[test]
    fn test_validate_rejects_any_blank_field() {
        let cases = vec![
            (raw("", "r", "1", "n"), vec!["city"]),
            (raw("c", "   ", "1", "n"), vec!["route"]),
            (raw("c", "r", "", "n"), vec!["number"]),
            (raw("c", "r", "1", "\n"), vec!["name"]),
            (raw(" ", "", "1", ""), vec!["city", "route", "name"]),
        ];

        for (input, expected) in cases {
            assert_eq!(
                validate(&input),
                Err(DiagnosisError::IncompleteSubmission { missing: expected })
            );
        }
    }

    #[test]
    fn test_validate_rejects_absent_fields() {
        let result = validate(&RawSubmission::default());
        assert_eq!(
            result,
            Err(DiagnosisError::IncompleteSubmission {
                missing: vec!["city", "route", "number", "name"]
            })
        );
    }

    #[test]
    fn test_directory_query_order_and_skipping() {
        let mut submission = sample_submission();
        assert_eq!(submission.directory_query(), "Sunrise Cafe Taipei Zhongshan Rd 12");

        submission.route = String::new();
        assert_eq!(submission.directory_query(), "Sunrise Cafe Taipei 12");

        submission.name = String::new();
        submission.city = String::new();
        submission.number = String::new();
        assert_eq!(submission.directory_query(), "");
    }

    #[test]
    fn test_raw_submission_deserialize_partial() {
        let raw: RawSubmission = serde_json::from_str(r#"{"city": "Taipei"}"#).unwrap();
        assert_eq!(raw.city.as_deref(), Some("Taipei"));
        assert!(raw.name.is_none());
    }
}
