use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use std::collections::BTreeMap;

/// One channel as delivered by the EPG provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EpgChannel {
    #[serde(deserialize_with = "string_or_number")]
    pub id_epg: String,
    pub name: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub number: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    /// Resolved stream URL written to XMLTV.
    #[serde(default)]
    pub url: Option<String>,
    /// Nominal stream URL as listed by the provider.
    #[serde(default)]
    pub stream_url: Option<String>,
    /// Programmes keyed by day.
    #[serde(default)]
    pub epg: BTreeMap<String, Vec<Programme>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Programme {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub pid: Option<String>,
    pub title: String,
    /// First broadcast on TV.
    #[serde(default, rename = "prima")]
    pub prima: bool,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub subgenre: Option<String>,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "data")]
    pub data: ProgrammeData,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub episode: Option<String>,
    #[serde(deserialize_with = "timestamp")]
    pub start: DateTime<FixedOffset>,
    #[serde(deserialize_with = "timestamp")]
    pub stop: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgrammeData {
    #[serde(default)]
    pub desc: Option<String>,
}

impl EpgChannel {
    pub fn programmes(&self) -> impl Iterator<Item = &Programme> {
        self.epg.values().flatten()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Integer(i64),
    Float(f64),
}

impl From<StringOrNumber> for String {
    fn from(v: StringOrNumber) -> Self {
        match v {
            StringOrNumber::String(s) => s,
            StringOrNumber::Integer(i) => i.to_string(),
            StringOrNumber::Float(f) => f.to_string(),
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    StringOrNumber::deserialize(d).map(Into::into)
}

fn opt_string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<StringOrNumber>::deserialize(d)?
        .map(String::from)
        .filter(|s| !s.is_empty()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Text(String),
    Millis(i64),
}

/// RFC 3339, a naive `YYYY-MM-DD HH:MM:SS` taken as UTC, or epoch millis.
fn timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<FixedOffset>, D::Error> {
    match RawTimestamp::deserialize(d)? {
        RawTimestamp::Text(s) => parse_timestamp(&s)
            .ok_or_else(|| D::Error::custom(format!("invalid timestamp: {}", s))),
        RawTimestamp::Millis(ms) => DateTime::from_timestamp_millis(ms)
            .map(|dt| dt.fixed_offset())
            .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {}", ms))),
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    DateTime::parse_from_rfc3339(s).ok().or_else(|| {
        ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            .map(|naive| naive.and_utc().fixed_offset())
    })
}
