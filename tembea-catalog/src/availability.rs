use crate::listing::Availability;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Calendar view over a listing's booked-out dates. A date is disabled iff
/// it appears in the listing's `booked_dates` by exact match.
#[derive(Debug, Clone, Default)]
pub struct AvailabilityCalendar {
    booked: BTreeSet<NaiveDate>,
}

impl AvailabilityCalendar {
    pub fn new(availability: &Availability) -> Self {
        Self {
            booked: availability.booked_dates.iter().copied().collect(),
        }
    }

    pub fn is_disabled(&self, date: NaiveDate) -> bool {
        self.booked.contains(&date)
    }

    /// Disabled dates in order, for rendering.
    pub fn disabled_dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.booked.iter().copied()
    }

    /// Whether every night in `[check_in, check_out)` is open. A stay that
    /// checks out on a booked date is fine; one that sleeps over it is not.
    pub fn is_range_open(&self, check_in: NaiveDate, check_out: NaiveDate) -> bool {
        let mut night = check_in;
        while night < check_out {
            if self.booked.contains(&night) {
                return false;
            }
            night = night.succ_opt().unwrap_or(check_out);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn booked_dates_are_disabled_by_exact_match() {
        let calendar = AvailabilityCalendar::new(&Availability {
            booked_dates: vec![date("2026-09-01"), date("2026-09-03")],
        });

        assert!(calendar.is_disabled(date("2026-09-01")));
        assert!(!calendar.is_disabled(date("2026-09-02")));
        assert!(calendar.is_disabled(date("2026-09-03")));
    }

    #[test]
    fn empty_availability_disables_nothing() {
        let calendar = AvailabilityCalendar::new(&Availability::default());
        assert!(!calendar.is_disabled(date("2026-09-01")));
        assert_eq!(calendar.disabled_dates().count(), 0);
    }

    #[test]
    fn range_openness_excludes_checkout_night() {
        let calendar = AvailabilityCalendar::new(&Availability {
            booked_dates: vec![date("2026-09-03")],
        });

        assert!(calendar.is_range_open(date("2026-09-01"), date("2026-09-03")));
        assert!(!calendar.is_range_open(date("2026-09-02"), date("2026-09-04")));
    }
}
