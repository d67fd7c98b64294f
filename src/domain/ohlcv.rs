//! Price bars as delivered by the data port.

use chrono::NaiveDate;

/// One daily session. The strategy only ever reads these.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// True range against the previous session's close. The first bar of a
    /// series has no previous close and uses its own high-low range.
    pub fn true_range(&self, prev_close: Option<f64>) -> f64 {
        let range = self.high - self.low;
        match prev_close {
            Some(pc) => range
                .max((self.high - pc).abs())
                .max((self.low - pc).abs()),
            None => range,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn wide_bar() -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2021, 6, 1).unwrap(),
            open: 48.0,
            high: 52.0,
            low: 46.0,
            close: 50.0,
            volume: 12_000.0,
        }
    }

    #[test]
    fn first_bar_uses_own_range() {
        assert_relative_eq!(wide_bar().true_range(None), 6.0);
    }

    #[test]
    fn inside_previous_close_keeps_range() {
        assert_relative_eq!(wide_bar().true_range(Some(49.0)), 6.0);
    }

    #[test]
    fn gaps_widen_the_range() {
        // prev close 40: |52 - 40| = 12
        assert_relative_eq!(wide_bar().true_range(Some(40.0)), 12.0);
        // prev close 60: |46 - 60| = 14
        assert_relative_eq!(wide_bar().true_range(Some(60.0)), 14.0);
    }
}
