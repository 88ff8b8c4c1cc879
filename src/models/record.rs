use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

/// When a medicine is taken. Unknown values are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TimeOfIntake {
    Morning,
    Afternoon,
    Evening,
    Night,
    Other(String),
}

impl TimeOfIntake {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
            Self::Night => "night",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for TimeOfIntake {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "morning" => Self::Morning,
            "afternoon" => Self::Afternoon,
            "evening" => Self::Evening,
            "night" => Self::Night,
            _ => Self::Other(s),
        }
    }
}

impl From<TimeOfIntake> for String {
    fn from(t: TimeOfIntake) -> Self {
        t.as_str().to_string()
    }
}

/// Whether a medicine is taken before or after meals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MealTiming {
    Before,
    After,
    Other(String),
}

impl MealTiming {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Before => "before",
            Self::After => "after",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for MealTiming {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "before" => Self::Before,
            "after" => Self::After,
            _ => Self::Other(s),
        }
    }
}

impl From<MealTiming> for String {
    fn from(t: MealTiming) -> Self {
        t.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medicine {
    pub id: String,
    pub name: String,
    pub quantity: f64,
    pub time_of_intake: TimeOfIntake,
    pub before_or_after_meals: MealTiming,
}

/// One prescription as extracted and stored by the backend. Read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub serial_no: Option<u32>,
    pub age: f64,
    pub weight: f64,
    pub height: f64,
    pub temperature: f64,
    pub hospital_name: String,
    pub doctor_name: String,
    pub date: String,
    pub medicines: Vec<Medicine>,
    #[serde(rename = "imagekit_url")]
    pub imagekit_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_images: Option<Vec<String>>,
    pub created_at: String,
    #[serde(rename = "user_id")]
    pub user_id: String,
}

impl MedicalRecord {
    /// Parse `date`, accepting RFC 3339 timestamps or plain `YYYY-MM-DD`.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_record_date(&self.date)
    }
}

pub fn parse_record_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Display order: `serial_no` ascending, records without one last.
/// Stable, so equal keys keep their fetched order.
pub fn sort_by_serial(records: &mut [MedicalRecord]) {
    records.sort_by(|a, b| compare_serial(a.serial_no, b.serial_no));
}

fn compare_serial(a: Option<u32>, b: Option<u32>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
pub(crate) fn sample_record(id: &str, serial_no: Option<u32>, date: &str) -> MedicalRecord {
    MedicalRecord {
        id: id.to_string(),
        serial_no,
        age: 34.0,
        weight: 70.0,
        height: 170.0,
        temperature: 98.6,
        hospital_name: "City Hospital".into(),
        doctor_name: "Dr. Rao".into(),
        date: date.to_string(),
        medicines: Vec::new(),
        imagekit_url: format!("https://ik.imagekit.io/demo/{id}.png"),
        report_images: None,
        created_at: "2024-01-15T10:00:00.000Z".into(),
        user_id: "u1".into(),
    }
}
