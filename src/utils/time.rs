use chrono::{SecondsFormat, Utc};

pub fn time_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
