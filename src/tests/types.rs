use std::error::Error;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::types::MwTimestamp;
use crate::url::WriteValue;

fn ts() -> MwTimestamp {
    MwTimestamp(DateTime::from_utc(
        NaiveDateTime::new(
            NaiveDate::from_ymd_opt(1337, 1, 3).unwrap(),
            NaiveTime::from_hms_opt(3, 7, 0).unwrap(),
        ),
        Utc,
    ))
}

#[test]
fn works() -> Result<(), Box<dyn Error>> {
    #[derive(serde::Serialize, serde::Deserialize)]
    pub struct Testing {
        time: MwTimestamp,
    }

    let j = serde_json::to_value(Testing { time: ts() })?;
    assert_eq!(j, serde_json::json!({ "time": "1337-01-03T03:07:00Z" }));

    let back: Testing = serde_json::from_value(j)?;
    assert_eq!(back.time, ts());
    Ok(())
}

#[test]
fn as_param() {
    assert_eq!(ts().values(), Some(vec!["1337-01-03T03:07:00Z".to_owned()]));
    assert_eq!("1337-01-03T03:07:00Z".parse::<MwTimestamp>().unwrap(), ts());
    assert!("yesterday".parse::<MwTimestamp>().is_err());
}
