use crate::models::PaymentPlan;
use serde::Serialize;
use tembea_catalog::Listing;
use tembea_store::app_config::BusinessRules;

/// Price breakdown for a booking before it is submitted.
///
/// The total is always price-per-traveler times traveler count; a listing
/// without a price (volunteer opportunities) quotes to zero. The amount due
/// now depends on the chosen settlement plan.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct BookingQuote {
    pub total_cents: i64,
    pub due_now_cents: i64,
    pub plan: PaymentPlan,
}

impl BookingQuote {
    pub fn compute(listing: &Listing, travelers: u32, plan: PaymentPlan, rules: &BusinessRules) -> Self {
        let price_per_traveler = listing.price_cents.unwrap_or(0);
        let total_cents = price_per_traveler * i64::from(travelers);

        let due_now_cents = match plan {
            PaymentPlan::Full => total_cents,
            PaymentPlan::Deposit => (total_cents as f64 * rules.deposit_percent).round() as i64,
            PaymentPlan::Installment => total_cents / i64::from(rules.installment_parts.max(1)),
        };

        Self {
            total_cents,
            due_now_cents,
            plan,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tembea_catalog::listing::{Availability, ListingCategory, ListingStatus};
    use uuid::Uuid;

    fn listing(price_cents: Option<i64>, category: ListingCategory) -> Listing {
        Listing {
            id: Uuid::new_v4(),
            title: "Test".to_string(),
            description: None,
            category,
            price_cents,
            rating: None,
            location: None,
            subtype: None,
            availability: Availability::default(),
            images: Vec::new(),
            features: serde_json::Value::Null,
            amenities: serde_json::Value::Null,
            itinerary: serde_json::Value::Null,
            created_at: Utc::now(),
            status: ListingStatus::Published,
        }
    }

    #[test]
    fn total_is_price_times_travelers() {
        let quote = BookingQuote::compute(
            &listing(Some(10_000), ListingCategory::Tour),
            3,
            PaymentPlan::Full,
            &BusinessRules::default(),
        );
        assert_eq!(quote.total_cents, 30_000);
        assert_eq!(quote.due_now_cents, 30_000);
    }

    #[test]
    fn missing_price_quotes_to_zero() {
        let quote = BookingQuote::compute(
            &listing(None, ListingCategory::Volunteer),
            5,
            PaymentPlan::Full,
            &BusinessRules::default(),
        );
        assert_eq!(quote.total_cents, 0);
        assert_eq!(quote.due_now_cents, 0);
    }

    #[test]
    fn deposit_plan_collects_the_configured_share() {
        let quote = BookingQuote::compute(
            &listing(Some(10_000), ListingCategory::Stay),
            2,
            PaymentPlan::Deposit,
            &BusinessRules::default(),
        );
        assert_eq!(quote.total_cents, 20_000);
        assert_eq!(quote.due_now_cents, 3_000); // 15%
    }

    #[test]
    fn installment_plan_collects_the_first_part() {
        let quote = BookingQuote::compute(
            &listing(Some(10_000), ListingCategory::Tour),
            2,
            PaymentPlan::Installment,
            &BusinessRules::default(),
        );
        assert_eq!(quote.due_now_cents, 5_000); // total / 4
    }
}
