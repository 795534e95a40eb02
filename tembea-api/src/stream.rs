use axum::{
    extract::{Extension, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures_util::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tembea_sync::bookings::bookings_view;
use tembea_sync::listings::listings_view;
use tembea_sync::view::{ResourceQuery, ResourceState, ResourceView};
use tokio_stream::wrappers::WatchStream;

use crate::error::ApiError;
use crate::listings::parse_filter;
use crate::middleware::auth::CurrentUser;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/listings/stream", get(stream_listings))
        .route("/v1/bookings/stream", get(stream_bookings))
}

#[derive(Debug, Deserialize)]
struct StreamParams {
    category: Option<String>,
    search: Option<String>,
}

#[derive(Debug, Serialize)]
struct StateDto<T> {
    data: T,
    loading: bool,
    error: Option<String>,
}

impl<T: Clone> From<ResourceState<T>> for StateDto<T> {
    fn from(state: ResourceState<T>) -> Self {
        Self {
            data: state.data,
            loading: state.loading,
            error: state.error,
        }
    }
}

/// Tears the view down when the SSE connection goes away, the same way a
/// component unmount would.
struct ViewGuard<Q: ResourceQuery>(Option<Arc<ResourceView<Q>>>);

impl<Q: ResourceQuery> Drop for ViewGuard<Q> {
    fn drop(&mut self) {
        if let Some(view) = self.0.take() {
            tokio::spawn(async move { view.teardown().await });
        }
    }
}

fn state_events<Q>(
    view: Arc<ResourceView<Q>>,
) -> impl Stream<Item = Result<Event, axum::Error>>
where
    Q: ResourceQuery,
    Q::Output: Serialize,
{
    let rx = view.state();
    let guard = ViewGuard(Some(view));
    WatchStream::new(rx).map(move |state| {
        let _keep_alive = &guard;
        Event::default()
            .event("state")
            .json_data(StateDto::from(state))
            .map_err(axum::Error::new)
    })
}

/// Live published-listings state for the given scope. Every change
/// notification on the listings table re-materializes the list and pushes a
/// fresh snapshot down the stream.
async fn stream_listings(
    State(state): State<AppState>,
    Query(params): Query<StreamParams>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let filter = parse_filter(params.category.as_deref(), params.search.as_deref())?;

    let view = listings_view(state.client.clone(), filter);
    view.start().await;

    Ok(Sse::new(state_events(view)).keep_alive(KeepAlive::default()))
}

/// Live bookings state for the signed-in user.
async fn stream_bookings(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let identity = user.require()?.clone();

    let view = bookings_view(state.client.clone(), Some(identity));
    view.start().await;

    Ok(Sse::new(state_events(view)).keep_alive(KeepAlive::default()))
}
