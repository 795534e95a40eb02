pub mod bookings;
pub mod listings;
pub mod profile;
pub mod requests;
pub mod view;

pub use bookings::{BookingsQuery, BookingsView};
pub use listings::{ListingQuery, ListingView, ListingsQuery, ListingsView};
pub use profile::{ProfileQuery, ProfileView};
pub use requests::{CustomRequestsQuery, CustomRequestsView};
pub use view::{Phase, ResourceQuery, ResourceState, ResourceView};
