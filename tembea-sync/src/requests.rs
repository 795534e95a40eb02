use crate::view::{ResourceQuery, ResourceView};
use async_trait::async_trait;
use std::sync::Arc;
use tembea_booking::CustomRequest;
use tembea_core::client::{ClientError, Filter, Ordering, Query, RemoteClient, SubscriptionSpec};
use tembea_core::identity::Identity;
use tembea_shared::Table;

/// The signed-in user's custom trip requests, newest first. Status changes
/// land through the change feed when an admin works the request.
pub struct CustomRequestsQuery {
    pub identity: Option<Identity>,
}

#[async_trait]
impl ResourceQuery for CustomRequestsQuery {
    type Output = Vec<CustomRequest>;

    fn empty(&self) -> Self::Output {
        Vec::new()
    }

    fn is_ready(&self) -> bool {
        self.identity.is_some()
    }

    fn subscription(&self) -> Option<SubscriptionSpec> {
        self.identity.as_ref().map(|identity| {
            SubscriptionSpec::table(Table::CustomRequests)
                .row_eq("user_id", identity.id.to_string())
        })
    }

    async fn load(&self, client: &dyn RemoteClient) -> Result<Self::Output, ClientError> {
        let Some(identity) = &self.identity else {
            return Ok(Vec::new());
        };
        let rows = client
            .select(
                Query::table(Table::CustomRequests)
                    .filter(Filter::eq("user_id", identity.id.to_string()))
                    .order_by(Ordering::created_at_desc()),
            )
            .await?;
        rows.into_iter()
            .map(|row| {
                CustomRequest::from_row(row).map_err(|e| ClientError::Decode(e.to_string()))
            })
            .collect()
    }
}

pub type CustomRequestsView = ResourceView<CustomRequestsQuery>;

pub fn custom_requests_view(
    client: Arc<dyn RemoteClient>,
    identity: Option<Identity>,
) -> Arc<CustomRequestsView> {
    ResourceView::new(client, CustomRequestsQuery { identity })
}
