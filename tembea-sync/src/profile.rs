use crate::view::{ResourceQuery, ResourceView};
use async_trait::async_trait;
use std::sync::Arc;
use tembea_core::client::{
    ClientError, EventMask, Filter, Query, RemoteClient, SubscriptionSpec,
};
use tembea_core::identity::{Identity, Profile};
use tembea_shared::{ChangeAction, Table};

/// The signed-in user's profile row. Only update events are watched; the
/// row is created by the auth service and never deleted by this
/// application.
pub struct ProfileQuery {
    pub identity: Option<Identity>,
}

#[async_trait]
impl ResourceQuery for ProfileQuery {
    type Output = Option<Profile>;

    fn empty(&self) -> Self::Output {
        None
    }

    fn is_ready(&self) -> bool {
        self.identity.is_some()
    }

    fn subscription(&self) -> Option<SubscriptionSpec> {
        self.identity.as_ref().map(|identity| {
            SubscriptionSpec::table(Table::Profiles)
                .events(EventMask::Only(ChangeAction::Update))
                .row_eq("id", identity.id.to_string())
        })
    }

    fn keeps_data_on_error(&self) -> bool {
        false
    }

    async fn load(&self, client: &dyn RemoteClient) -> Result<Self::Output, ClientError> {
        let Some(identity) = &self.identity else {
            return Ok(None);
        };
        let row = client
            .select_one(
                Query::table(Table::Profiles)
                    .filter(Filter::eq("id", identity.id.to_string())),
            )
            .await?;
        let profile: Profile =
            serde_json::from_value(row).map_err(|e| ClientError::Decode(e.to_string()))?;
        Ok(Some(profile))
    }
}

pub type ProfileView = ResourceView<ProfileQuery>;

pub fn profile_view(client: Arc<dyn RemoteClient>, identity: Option<Identity>) -> Arc<ProfileView> {
    ResourceView::new(client, ProfileQuery { identity })
}
