pub mod availability;
pub mod filter;
pub mod listing;
pub mod media;

pub use availability::AvailabilityCalendar;
pub use filter::ListingFilter;
pub use listing::{Availability, Listing, ListingCategory, ListingStatus};
pub use media::Gallery;
