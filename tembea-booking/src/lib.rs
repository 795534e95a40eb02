pub mod intake;
pub mod models;
pub mod paystack;
pub mod quote;
pub mod workflow;

pub use intake::IntakeService;
pub use models::{Booking, CustomRequest, PaymentPlan, PaymentStatus, VolunteerApplication};
pub use paystack::PaystackCheckout;
pub use quote::BookingQuote;
pub use workflow::{BookingRequest, BookingWorkflow, MockCheckout, PendingBooking};
