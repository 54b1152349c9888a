use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Vehicle {
    #[serde(rename = "placa")]
    pub plate: String,
    #[serde(rename = "tipo", default, deserialize_with = "de::nullable")]
    pub kind: String,
    #[serde(rename = "proprietario", default, deserialize_with = "de::nullable")]
    pub owner: String,
    #[serde(rename = "telefone", default, deserialize_with = "de::nullable")]
    pub phone: String,
    #[serde(rename = "marca", default, deserialize_with = "de::nullable")]
    pub make: String,
    #[serde(rename = "modelo", default, deserialize_with = "de::nullable")]
    pub model: String,
    #[serde(rename = "cor", default, deserialize_with = "de::nullable")]
    pub color: String,
    #[serde(rename = "ano", default, deserialize_with = "de::year")]
    pub year: Option<i32>,
}

// Billing is done by the backend; `total` is display-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stay {
    pub id: i64,
    #[serde(rename = "placa", default, deserialize_with = "de::nullable")]
    pub plate: String,
    #[serde(rename = "valorHora", default, deserialize_with = "de::amount")]
    pub hourly_rate: Option<f64>,
    #[serde(rename = "entrada", default, with = "timestamp")]
    pub entry: Option<DateTime<Utc>>,
    #[serde(rename = "saida", default, with = "timestamp")]
    pub exit: Option<DateTime<Utc>>,
    #[serde(rename = "valorTotal", default, deserialize_with = "de::amount")]
    pub total: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewStay {
    #[serde(rename = "placa")]
    pub plate: String,
    #[serde(rename = "valorHora")]
    pub hourly_rate: f64,
    #[serde(rename = "entrada", with = "timestamp")]
    pub entry: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct StayPatch {
    #[serde(rename = "placa", skip_serializing_if = "Option::is_none")]
    pub plate: Option<String>,
    #[serde(rename = "valorHora", skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<f64>,
    #[serde(rename = "entrada", skip_serializing_if = "Option::is_none", with = "timestamp")]
    pub entry: Option<DateTime<Utc>>,
    #[serde(rename = "saida", skip_serializing_if = "Option::is_none", with = "timestamp")]
    pub exit: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Option<Self> {
        (from <= to).then_some(Self { from, to })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub active_count: usize,
    pub today_count: usize,
    pub today_revenue: f64,
    pub available_spots: usize,
    pub recent: Vec<Stay>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub api_url: String,
    pub capacity: usize,
    pub loading: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub stay: Stay,
    pub owner: String,
    pub kind: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub range: DateRange,
    pub total_stays: usize,
    pub revenue: f64,
    pub average_duration: String,
    pub rows: Vec<ReportRow>,
    pub from_cache: bool,
}

pub mod timestamp {
    use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};
    use serde::{Deserialize, Deserializer, Serializer};
    use tracing::warn;

    const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

    /// RFC 3339, or a naive ISO date-time read in the local zone.
    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        parse_in(raw, &Local)
    }

    pub fn parse_in<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NAIVE_FORMATS.iter().find_map(|format| {
            let naive = NaiveDateTime::parse_from_str(raw, format).ok()?;
            tz.from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
        })
    }

    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S: Serializer>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serializer.serialize_str(&format(value)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let parsed = parse(&raw);
        if parsed.is_none() && !raw.trim().is_empty() {
            warn!("ignoring unparseable timestamp {raw:?}");
        }
        Ok(parsed)
    }
}

mod de {
    use serde::{de::Error, Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        match Option::<NumberOrText>::deserialize(deserializer)? {
            None => Ok(None),
            Some(NumberOrText::Number(value)) => Ok(Some(value)),
            Some(NumberOrText::Text(text)) => {
                let text = text.trim();
                if text.is_empty() {
                    return Ok(None);
                }
                text.replace(',', ".").parse().map(Some).map_err(D::Error::custom)
            }
        }
    }

    pub fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }

    pub fn amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        number(deserializer)
    }

    pub fn year<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
        let Some(value) = number(deserializer)? else {
            return Ok(None);
        };
        let rounded = value.round();
        if !(f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(&rounded) {
            return Err(D::Error::custom(format!("invalid year {value}")));
        }
        Ok(Some(rounded as i32))
    }
}
