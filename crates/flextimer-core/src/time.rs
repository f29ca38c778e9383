//! Time primitives for FlexTimer
//!
//! Instants and spans are `f64` milliseconds. Instants are epoch
//! milliseconds, so targets, anchors and "now" share one time base.

pub const MS_PER_SECOND: u64 = 1_000;
pub const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;
pub const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;
pub const MS_PER_DAY: u64 = 24 * MS_PER_HOUR;

/// Whether `ms` can be used as an instant or span
#[inline]
pub fn is_valid_millis(ms: f64) -> bool {
    ms.is_finite()
}

/// A span split into display units
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct TimeBreakdown {
    pub days: u64,
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
    pub milliseconds: u16,
}

impl TimeBreakdown {
    pub const ZERO: TimeBreakdown = TimeBreakdown {
        days: 0,
        hours: 0,
        minutes: 0,
        seconds: 0,
        milliseconds: 0,
    };

    /// Break a span down. Negative or non-finite spans collapse to zero.
    pub fn from_millis(ms: f64) -> Self {
        if !ms.is_finite() || ms < 0.0 {
            return Self::ZERO;
        }
        let total = ms.floor() as u64;
        TimeBreakdown {
            days: total / MS_PER_DAY,
            hours: ((total % MS_PER_DAY) / MS_PER_HOUR) as u8,
            minutes: ((total % MS_PER_HOUR) / MS_PER_MINUTE) as u8,
            seconds: ((total % MS_PER_MINUTE) / MS_PER_SECOND) as u8,
            milliseconds: (total % MS_PER_SECOND) as u16,
        }
    }

    #[inline]
    pub fn total_millis(&self) -> u64 {
        self.days * MS_PER_DAY
            + self.hours as u64 * MS_PER_HOUR
            + self.minutes as u64 * MS_PER_MINUTE
            + self.seconds as u64 * MS_PER_SECOND
            + self.milliseconds as u64
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

/// Half of the day on a 12-hour clock
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Meridiem {
    Am,
    Pm,
}

impl Meridiem {
    pub fn as_str(self) -> &'static str {
        match self {
            Meridiem::Am => "AM",
            Meridiem::Pm => "PM",
        }
    }
}

/// Wall-clock fields on a 12-hour dial
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClockReading {
    /// 1..=12; midnight and noon read as 12
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
    pub milliseconds: u16,
    pub meridiem: Meridiem,
}

impl ClockReading {
    /// Reading for an epoch-millisecond instant that already carries any
    /// timezone offset.
    pub fn from_epoch_millis(ms: f64) -> Self {
        let ms = if ms.is_finite() { ms.floor() as i64 } else { 0 };
        let of_day = ms.rem_euclid(MS_PER_DAY as i64) as u64;
        let hour24 = (of_day / MS_PER_HOUR) as u8;

        ClockReading {
            hours: match hour24 % 12 {
                0 => 12,
                h => h,
            },
            minutes: ((of_day % MS_PER_HOUR) / MS_PER_MINUTE) as u8,
            seconds: ((of_day % MS_PER_MINUTE) / MS_PER_SECOND) as u8,
            milliseconds: (of_day % MS_PER_SECOND) as u16,
            meridiem: if hour24 < 12 { Meridiem::Am } else { Meridiem::Pm },
        }
    }

    /// Hour on the 24-hour dial
    pub fn hour24(&self) -> u8 {
        let base = self.hours % 12;
        match self.meridiem {
            Meridiem::Am => base,
            Meridiem::Pm => base + 12,
        }
    }
}

/// What the engine hands to the display on init and on every tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reading {
    /// Remaining or elapsed span
    Span(TimeBreakdown),
    /// Wall-clock time (clock mode)
    Clock(ClockReading),
}

impl Reading {
    pub fn as_span(&self) -> Option<&TimeBreakdown> {
        match self {
            Reading::Span(b) => Some(b),
            Reading::Clock(_) => None,
        }
    }

    pub fn as_clock(&self) -> Option<&ClockReading> {
        match self {
            Reading::Clock(c) => Some(c),
            Reading::Span(_) => None,
        }
    }
}
