use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;

// ---------------------------------------------------------------------------
// Worldwide summary
// ---------------------------------------------------------------------------

/// Worldwide counts at one point in time (`GET /all`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalSummary {
    #[serde(default)]
    pub cases: u64,
    #[serde(default)]
    pub deaths: u64,
    #[serde(default)]
    pub recovered: u64,
    /// Epoch milliseconds of the upstream update.
    #[serde(default)]
    pub updated: i64,
}

/// Display percentages for the summary pie. Sum to 100 when `cases > 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedPercentages {
    /// Derived by subtraction; negative when the two rounded shares exceed 100.
    pub active_pct: i64,
    pub recovered_pct: i64,
    pub deaths_pct: i64,
}

// ---------------------------------------------------------------------------
// Countries
// ---------------------------------------------------------------------------

/// One row of the country list (`GET /countries`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryRecord {
    pub country: String,
    #[serde(default)]
    pub active: u64,
    #[serde(default)]
    pub recovered: u64,
    #[serde(default)]
    pub deaths: u64,
}

/// Full country object (`GET /countries/{name}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryDetail {
    pub country: String,
    #[serde(default)]
    pub cases: u64,
    #[serde(default)]
    pub deaths: u64,
    #[serde(default)]
    pub recovered: u64,
    #[serde(default)]
    pub active: u64,
    #[serde(default)]
    pub today_cases: u64,
    #[serde(default)]
    pub today_deaths: u64,
    #[serde(default)]
    pub updated: i64,
}

/// Upstream sort key for the country list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountrySort {
    #[default]
    Active,
    Cases,
    Deaths,
    Recovered,
}

impl fmt::Display for CountrySort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CountrySort::Active => "active",
            CountrySort::Cases => "cases",
            CountrySort::Deaths => "deaths",
            CountrySort::Recovered => "recovered",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for CountrySort {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(CountrySort::Active),
            "cases" => Ok(CountrySort::Cases),
            "deaths" => Ok(CountrySort::Deaths),
            "recovered" => Ok(CountrySort::Recovered),
            other => Err(AppError::BadRequest(format!("unknown sort key '{other}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Historical timeline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartSeries {
    #[default]
    Cases,
    Deaths,
}

impl fmt::Display for ChartSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartSeries::Cases => write!(f, "cases"),
            ChartSeries::Deaths => write!(f, "deaths"),
        }
    }
}

/// Date label → cumulative count, in upstream order.
///
/// Upstream sends a JSON object keyed by `M/D/YY` labels; those do not sort
/// lexically, so the map is read entry by entry instead of through a sorted map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatedSeries(pub Vec<(String, u64)>);

impl DatedSeries {
    pub fn values(&self) -> impl Iterator<Item = u64> + '_ {
        self.0.iter().map(|(_, v)| *v)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(|(d, _)| d.as_str())
    }

    pub fn last_value(&self) -> Option<u64> {
        self.0.last().map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for DatedSeries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SeriesVisitor;

        impl<'de> Visitor<'de> for SeriesVisitor {
            type Value = DatedSeries;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object of date label to count")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut points = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((date, count)) = map.next_entry::<String, Option<u64>>()? {
                    points.push((date, count.unwrap_or(0)));
                }
                Ok(DatedSeries(points))
            }
        }

        deserializer.deserialize_map(SeriesVisitor)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    #[serde(default)]
    pub cases: DatedSeries,
    #[serde(default)]
    pub deaths: DatedSeries,
}

impl Timeline {
    pub fn series(&self, which: ChartSeries) -> &DatedSeries {
        match which {
            ChartSeries::Cases => &self.cases,
            ChartSeries::Deaths => &self.deaths,
        }
    }
}

/// `GET /historical/{name}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Historical {
    #[serde(default)]
    pub country: String,
    pub timeline: Timeline,
}
