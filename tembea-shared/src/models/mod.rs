pub mod events;

use serde::{Deserialize, Serialize};

/// Tables owned by the external store. The application never creates or
/// drops tables; it only reads and writes rows through the remote client.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Listings,
    Bookings,
    Profiles,
    VolunteerApplications,
    CustomRequests,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Listings => "listings",
            Table::Bookings => "bookings",
            Table::Profiles => "profiles",
            Table::VolunteerApplications => "volunteer_applications",
            Table::CustomRequests => "custom_requests",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
