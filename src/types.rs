use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::url::WriteValue;

/// A timestamp as the API writes them, `2022-01-03T03:07:00Z`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct MwTimestamp(pub DateTime<Utc>);

fn format(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

impl MwTimestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl fmt::Display for MwTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format(&self.0))
    }
}

impl FromStr for MwTimestamp {
    type Err = chrono::ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DateTime::parse_from_rfc3339(s).map(|d| Self(d.into()))
    }
}

impl Serialize for MwTimestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        format(&self.0).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MwTimestamp {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        crate::util::dt::deserialize(d).map(Self)
    }
}

impl WriteValue for MwTimestamp {
    fn values(&self) -> Option<Vec<String>> {
        Some(vec![format(&self.0)])
    }
}

impl From<DateTime<Utc>> for MwTimestamp {
    fn from(x: DateTime<Utc>) -> Self {
        Self(x)
    }
}
