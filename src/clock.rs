use ::time::{format_description::well_known, macros::format_description, OffsetDateTime};

/// RFC 3339 UTC timestamp stored in snapshots.
pub fn now_rfc3339() -> String {
    format_rfc3339(OffsetDateTime::now_utc())
}

pub fn format_rfc3339(at: OffsetDateTime) -> String {
    at.format(&well_known::Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}

/// `YYYY-MM-DD HH:MM:SS` in local time (UTC when the offset is unknown), for the board header.
pub fn now_display() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    format_display(now)
}

pub fn format_display(at: OffsetDateTime) -> String {
    at.format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::time::macros::datetime;

    #[test]
    fn formats_both_styles() {
        let at = datetime!(2026-03-04 05:06:07 UTC);
        assert_eq!(format_rfc3339(at), "2026-03-04T05:06:07Z");
        assert_eq!(format_display(at), "2026-03-04 05:06:07");
    }
}
