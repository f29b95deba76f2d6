use chrono::{DateTime, Local, TimeZone};

/// `"<base>-YYYYMMDD-HHMMSS.json"`; `base` defaults to `therapists`.
pub fn timestamped_filename<Tz: TimeZone>(base: Option<&str>, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let base = base.filter(|b| !b.is_empty()).unwrap_or("therapists");
    format!("{}-{}.json", base, now.format("%Y%m%d-%H%M%S"))
}

pub fn timestamped_filename_now(base: Option<&str>) -> String {
    timestamped_filename(base, &Local::now())
}
