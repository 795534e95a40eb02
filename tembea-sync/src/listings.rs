use crate::view::{ResourceQuery, ResourceView};
use async_trait::async_trait;
use std::sync::Arc;
use tembea_catalog::{Listing, ListingFilter};
use tembea_core::client::{ClientError, RemoteClient, SubscriptionSpec};
use uuid::Uuid;

/// The published-listings collection, scoped by category and search term.
pub struct ListingsQuery {
    pub filter: ListingFilter,
}

#[async_trait]
impl ResourceQuery for ListingsQuery {
    type Output = Vec<Listing>;

    fn empty(&self) -> Self::Output {
        Vec::new()
    }

    fn subscription(&self) -> Option<SubscriptionSpec> {
        Some(self.filter.subscription())
    }

    async fn load(&self, client: &dyn RemoteClient) -> Result<Self::Output, ClientError> {
        let rows = client.select(self.filter.remote_query()).await?;
        rows.into_iter()
            .map(|row| Listing::from_row(row).map_err(|e| ClientError::Decode(e.to_string())))
            .collect()
    }
}

pub type ListingsView = ResourceView<ListingsQuery>;

pub fn listings_view(client: Arc<dyn RemoteClient>, filter: ListingFilter) -> Arc<ListingsView> {
    ResourceView::new(client, ListingsQuery { filter })
}

/// A single listing by id. Zero or multiple matching rows is a fetch error
/// and the result stays `None`.
pub struct ListingQuery {
    pub id: Uuid,
}

#[async_trait]
impl ResourceQuery for ListingQuery {
    type Output = Option<Listing>;

    fn empty(&self) -> Self::Output {
        None
    }

    fn subscription(&self) -> Option<SubscriptionSpec> {
        Some(ListingFilter::singleton_subscription(self.id))
    }

    fn keeps_data_on_error(&self) -> bool {
        false
    }

    async fn load(&self, client: &dyn RemoteClient) -> Result<Self::Output, ClientError> {
        let row = client
            .select_one(ListingFilter::singleton_query(self.id))
            .await?;
        let listing = Listing::from_row(row).map_err(|e| ClientError::Decode(e.to_string()))?;
        Ok(Some(listing))
    }
}

pub type ListingView = ResourceView<ListingQuery>;

pub fn listing_view(client: Arc<dyn RemoteClient>, id: Uuid) -> Arc<ListingView> {
    ResourceView::new(client, ListingQuery { id })
}
