use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use mongodb::bson;

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 表单里可能出现的时间格式（不带时区的按 UTC 处理）
const NAIVE_FORMATS: [&str; 4] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];

pub fn now() -> bson::DateTime {
    bson::DateTime::now()
}

/// 解析表单提交的时间；无法解析时返回 None，作为“无效时间”存储而不是拒绝请求
pub fn parse_form_time(raw: Option<&str>) -> Option<bson::DateTime> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(to_bson(t.with_timezone(&Utc)));
    }
    if let Some(t) = NAIVE_FORMATS.iter().find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok()) {
        return Some(to_bson(t.and_utc()));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| to_bson(t.and_utc()))
}

fn to_bson(time: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(time.timestamp_millis())
}

pub fn time_to_str(time: bson::DateTime) -> String {
    DateTime::from_timestamp_millis(time.timestamp_millis())
        .map(|t| t.format(DISPLAY_FORMAT).to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formats() {
        let expected = parse_form_time(Some("2024-03-01T08:30:00Z")).unwrap();
        assert_eq!(parse_form_time(Some("2024-03-01 08:30:00")), Some(expected));
        assert_eq!(parse_form_time(Some("2024-03-01T08:30")), Some(expected));
        assert_eq!(parse_form_time(Some("2024-03-01T16:30:00+08:00")), Some(expected));
        assert_eq!(time_to_str(expected), "2024-03-01 08:30:00");
        assert_eq!(time_to_str(parse_form_time(Some("2024-03-01")).unwrap()), "2024-03-01 00:00:00");
    }

    #[test]
    fn test_invalid_becomes_none() {
        assert_eq!(parse_form_time(Some("not a date")), None);
        assert_eq!(parse_form_time(Some("  ")), None);
        assert_eq!(parse_form_time(None), None);
    }
}
