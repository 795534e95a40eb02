use crate::view::{ResourceQuery, ResourceView};
use async_trait::async_trait;
use std::sync::Arc;
use tembea_booking::Booking;
use tembea_core::client::{ClientError, Filter, Ordering, Query, RemoteClient, SubscriptionSpec};
use tembea_core::identity::Identity;
use tembea_shared::Table;

/// The signed-in user's bookings, newest first. With no identity the view
/// short-circuits to an empty list without querying or subscribing.
pub struct BookingsQuery {
    pub identity: Option<Identity>,
}

#[async_trait]
impl ResourceQuery for BookingsQuery {
    type Output = Vec<Booking>;

    fn empty(&self) -> Self::Output {
        Vec::new()
    }

    fn is_ready(&self) -> bool {
        self.identity.is_some()
    }

    fn subscription(&self) -> Option<SubscriptionSpec> {
        self.identity.as_ref().map(|identity| {
            SubscriptionSpec::table(Table::Bookings).row_eq("user_id", identity.id.to_string())
        })
    }

    async fn load(&self, client: &dyn RemoteClient) -> Result<Self::Output, ClientError> {
        let Some(identity) = &self.identity else {
            return Ok(Vec::new());
        };
        let rows = client
            .select(
                Query::table(Table::Bookings)
                    .filter(Filter::eq("user_id", identity.id.to_string()))
                    .order_by(Ordering::created_at_desc()),
            )
            .await?;
        rows.into_iter()
            .map(|row| Booking::from_row(row).map_err(|e| ClientError::Decode(e.to_string())))
            .collect()
    }
}

pub type BookingsView = ResourceView<BookingsQuery>;

pub fn bookings_view(
    client: Arc<dyn RemoteClient>,
    identity: Option<Identity>,
) -> Arc<BookingsView> {
    ResourceView::new(client, BookingsQuery { identity })
}
