//! Trend series and distributions for the medical charts screen.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::MedicalRecord;

/// Most medicines shown in the medicine distribution.
pub const MAX_MEDICINE_BUCKETS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Temperature,
    Weight,
    Height,
    Medicines,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        ChartKind::Temperature,
        ChartKind::Weight,
        ChartKind::Height,
        ChartKind::Medicines,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Temperature => "Temperature",
            Self::Weight => "Weight",
            Self::Height => "Height",
            Self::Medicines => "Medicines",
        }
    }

    fn value(&self, record: &MedicalRecord) -> f64 {
        match self {
            Self::Temperature => record.temperature,
            Self::Weight => record.weight,
            Self::Height => record.height,
            Self::Medicines => record.medicines.len() as f64,
        }
    }

    /// Value with its unit, e.g. `98.6°F`, `70 kg`, `2 medicines`.
    pub fn display(&self, value: f64) -> String {
        match self {
            Self::Temperature => format!("{value}°F"),
            Self::Weight => format!("{value} kg"),
            Self::Height => format!("{value} cm"),
            Self::Medicines if value == 1.0 => "1 medicine".to_string(),
            Self::Medicines => format!("{value} medicines"),
        }
    }

    /// Range bucket for a vital sign. Medicines are bucketed by name instead.
    fn bucket(&self, value: f64) -> &'static str {
        match self {
            Self::Temperature if value < 98.0 => "Below Normal",
            Self::Temperature if value <= 99.0 => "Normal",
            Self::Temperature => "Above Normal",
            Self::Weight if value < 60.0 => "Light",
            Self::Weight if value <= 80.0 => "Normal",
            Self::Weight => "Heavy",
            Self::Height if value < 150.0 => "Short",
            Self::Height if value <= 180.0 => "Average",
            Self::Height => "Tall",
            Self::Medicines => "Medicines",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub date: Option<NaiveDate>,
    /// Axis label such as `Jan 15`.
    pub label: String,
    pub value: f64,
    pub display: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartBucket {
    pub name: String,
    pub value: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub latest: f64,
    pub min: f64,
    pub max: f64,
    pub average: f64,
    pub count: usize,
}

/// Records in chronological order. Undated records go last, in input order.
fn chronological(records: &[MedicalRecord]) -> Vec<(Option<NaiveDate>, &MedicalRecord)> {
    let mut dated: Vec<_> = records.iter().map(|r| (r.parsed_date(), r)).collect();
    dated.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    dated
}

pub fn chart_series(records: &[MedicalRecord], kind: ChartKind) -> Vec<ChartPoint> {
    chronological(records)
        .into_iter()
        .map(|(date, record)| {
            let value = kind.value(record);
            ChartPoint {
                date,
                label: date
                    .map(|d| d.format("%b %-d").to_string())
                    .unwrap_or_else(|| record.date.clone()),
                value,
                display: kind.display(value),
            }
        })
        .collect()
}

pub fn distribution(records: &[MedicalRecord], kind: ChartKind) -> Vec<ChartBucket> {
    let mut buckets: Vec<ChartBucket> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut bump = |name: &str| {
        let i = *index.entry(name.to_string()).or_insert_with(|| {
            buckets.push(ChartBucket {
                name: name.to_string(),
                value: 0,
            });
            buckets.len() - 1
        });
        buckets[i].value += 1;
    };

    for (_, record) in chronological(records) {
        if kind == ChartKind::Medicines {
            // Every entry counts, so a morning and a night dose count twice.
            for medicine in &record.medicines {
                bump(&medicine.name);
            }
        } else {
            bump(kind.bucket(kind.value(record)));
        }
    }

    if kind == ChartKind::Medicines {
        buckets.sort_by(|a, b| b.value.cmp(&a.value));
        buckets.truncate(MAX_MEDICINE_BUCKETS);
    }
    buckets
}

pub fn summary(records: &[MedicalRecord], kind: ChartKind) -> Option<SeriesSummary> {
    let series = chart_series(records, kind);
    let latest = series
        .iter()
        .rev()
        .find(|p| p.date.is_some())
        .or_else(|| series.last())?
        .value;

    let values: Vec<f64> = series.iter().map(|p| p.value).collect();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let average = values.iter().sum::<f64>() / values.len() as f64;

    Some(SeriesSummary {
        latest,
        min,
        max,
        average,
        count: values.len(),
    })
}
