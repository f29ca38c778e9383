//! Text rendering of readings
//!
//! Hosts that draw their own widgets use the `Reading` directly; this is the
//! plain-text form carried on tick events.

use crate::{ClockReading, DisplayOptions, Reading, TimeBreakdown};

/// Zero-pad `value` to at least `digits` digits
pub fn pad(value: u64, digits: usize) -> String {
    format!("{:0width$}", value, width = digits)
}

pub fn format_reading(reading: &Reading, options: &DisplayOptions) -> String {
    match reading {
        Reading::Span(breakdown) => format_span(breakdown, options),
        Reading::Clock(clock) => format_clock(clock, options),
    }
}

/// `"01 Days 02 Hours 03 Minutes 04 Seconds"`, one part per enabled unit
pub fn format_span(breakdown: &TimeBreakdown, options: &DisplayOptions) -> String {
    let units = [
        (options.show_days, breakdown.days),
        (options.show_hours, breakdown.hours as u64),
        (options.show_minutes, breakdown.minutes as u64),
        (options.show_seconds, breakdown.seconds as u64),
    ];

    let mut parts = Vec::with_capacity(units.len() + 1);
    for (index, (shown, value)) in units.into_iter().enumerate() {
        if !shown {
            continue;
        }
        let mut part = pad(value, 2);
        let label = options.label(index);
        if options.show_labels && !label.is_empty() {
            part.push(' ');
            part.push_str(label);
        }
        parts.push(part);
    }

    if options.shows_milliseconds() {
        parts.push(pad(breakdown.milliseconds as u64, 3));
    }

    parts.join(" ")
}

/// `"hh:mm:ss AM"`, with `.mmm` before the meridiem at millisecond precision
pub fn format_clock(clock: &ClockReading, options: &DisplayOptions) -> String {
    let mut out = format!(
        "{}:{}:{}",
        pad(clock.hours as u64, 2),
        pad(clock.minutes as u64, 2),
        pad(clock.seconds as u64, 2)
    );
    if options.shows_milliseconds() {
        out.push('.');
        out.push_str(&pad(clock.milliseconds as u64, 3));
    }
    out.push(' ');
    out.push_str(clock.meridiem.as_str());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Precision, MS_PER_HOUR};

    #[test]
    fn test_pad() {
        assert_eq!(pad(5, 2), "05");
        assert_eq!(pad(12, 2), "12");
        assert_eq!(pad(3, 3), "003");
        assert_eq!(pad(1234, 2), "1234");
    }

    #[test]
    fn test_span_with_labels() {
        let reading = Reading::Span(TimeBreakdown::from_millis(90_061_000.0));
        let text = format_reading(&reading, &DisplayOptions::default());
        assert_eq!(text, "01 Days 01 Hours 01 Minutes 01 Seconds");
    }

    #[test]
    fn test_span_without_labels_or_days() {
        let options = DisplayOptions {
            show_days: false,
            show_labels: false,
            ..Default::default()
        };
        let reading = Reading::Span(TimeBreakdown::from_millis(3_723_000.0));
        assert_eq!(format_reading(&reading, &options), "01 02 03");
    }

    #[test]
    fn test_milliseconds_need_precision_and_flag() {
        let breakdown = TimeBreakdown::from_millis(1_042.0);
        let mut options = DisplayOptions {
            show_days: false,
            show_hours: false,
            show_minutes: false,
            show_labels: false,
            show_milliseconds: true,
            ..Default::default()
        };
        assert_eq!(format_span(&breakdown, &options), "01");

        options.precision = Precision::Milliseconds;
        assert_eq!(format_span(&breakdown, &options), "01 042");
    }

    #[test]
    fn test_missing_labels_render_bare() {
        let options = DisplayOptions {
            labels: vec!["d".into()],
            ..Default::default()
        };
        let reading = Reading::Span(TimeBreakdown::from_millis(0.0));
        assert_eq!(format_reading(&reading, &options), "00 d 00 00 00");
    }

    #[test]
    fn test_clock_text() {
        let clock = ClockReading::from_epoch_millis((15 * MS_PER_HOUR + 7_250) as f64);
        let mut options = DisplayOptions::default();
        assert_eq!(format_clock(&clock, &options), "03:00:07 PM");

        options.precision = Precision::Milliseconds;
        options.show_milliseconds = true;
        assert_eq!(format_reading(&Reading::Clock(clock), &options), "03:00:07.250 PM");
    }
}
