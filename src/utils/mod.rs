pub mod logging;

/// Zero-padded `MM:SS`. Minutes are not wrapped at 60.
pub fn format_clock(total_seconds: u64) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_clock_pads_both_fields() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(7), "00:07");
        assert_eq!(format_clock(65), "01:05");
        assert_eq!(format_clock(20 * 60), "20:00");
    }

    #[test]
    fn format_clock_keeps_counting_past_an_hour() {
        assert_eq!(format_clock(61 * 60 + 1), "61:01");
    }
}
