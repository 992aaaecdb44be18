use time::{OffsetDateTime, format_description::FormatItem, macros::format_description};

pub const HUMAN_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[day padding:none] [month repr:long] [year]");

/// Render a store timestamp as `5 March 2024`.
pub fn format_date(value: OffsetDateTime) -> String {
    value
        .format(HUMAN_DATE_FORMAT)
        .unwrap_or_else(|_| value.date().to_string())
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::format_date;

    #[test]
    fn formats_day_month_year() {
        assert_eq!(format_date(datetime!(2024-03-05 10:00 UTC)), "5 March 2024");
        assert_eq!(
            format_date(datetime!(2023-12-31 23:59 UTC)),
            "31 December 2023"
        );
    }
}
