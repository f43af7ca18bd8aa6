//! Live views: a snapshot on connect, then a fresh snapshot after every change.

use std::convert::Infallible;

use async_stream::stream;
use axum::{
    extract::{Path, State},
    response::{
        Sse,
        sse::{Event, KeepAlive},
    },
};
use furnish_core::{Customer, InventoryLevel, SalesPoint};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAdminAuth;
use crate::sanity::{ListenEvent, ORDER_TYPE, PRODUCT_TYPE, SanityClient, SanityError, listen_filter};
use crate::state::AppState;

const SNAPSHOT_EVENT: &str = "snapshot";

/// Which list a live connection follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiveFeed {
    Orders,
    Products,
    Customers,
    Sales,
    Inventory,
}

impl LiveFeed {
    /// The document type whose changes invalidate this feed.
    #[must_use]
    pub const fn document_type(self) -> &'static str {
        match self {
            Self::Orders | Self::Customers | Self::Sales => ORDER_TYPE,
            Self::Products | Self::Inventory => PRODUCT_TYPE,
        }
    }

    async fn snapshot(self, sanity: &SanityClient) -> std::result::Result<Value, SanityError> {
        let value = match self {
            Self::Orders => serde_json::to_value(sanity.list_orders(None).await?)?,
            Self::Products => serde_json::to_value(sanity.list_products().await?)?,
            Self::Customers => {
                serde_json::to_value(Customer::from_orders(&sanity.list_orders(None).await?))?
            }
            Self::Sales => {
                serde_json::to_value(SalesPoint::monthly(&sanity.list_orders(None).await?))?
            }
            Self::Inventory => {
                serde_json::to_value(InventoryLevel::top(&sanity.list_products().await?))?
            }
        };
        Ok(value)
    }
}

fn snapshot_event(value: &Value) -> Event {
    Event::default().event(SNAPSHOT_EVENT).data(value.to_string())
}

/// GET /api/live/{feed}
///
/// The first snapshot and the subscription are both set up before the
/// response starts, so failures there surface as ordinary error responses.
#[instrument(skip(state))]
pub async fn feed(
    State(state): State<AppState>,
    RequireAdminAuth(_claims): RequireAdminAuth,
    Path(feed): Path<LiveFeed>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let sanity = state.sanity().clone();
    let initial = feed.snapshot(&sanity).await?;
    let mut changes = sanity.listen(&listen_filter(feed.document_type())).await?;

    let events = stream! {
        yield Ok(snapshot_event(&initial));

        while let Some(change) = changes.next().await {
            match change {
                Ok(ListenEvent::Welcome) => tracing::debug!(?feed, "Live feed subscribed"),
                Ok(ListenEvent::Mutation { document_id, transition }) => {
                    tracing::debug!(%document_id, ?transition, "Document changed");
                    match feed.snapshot(&sanity).await {
                        Ok(value) => yield Ok(snapshot_event(&value)),
                        Err(e) => tracing::warn!(error = %e, ?feed, "Live snapshot refetch failed"),
                    }
                }
                Ok(ListenEvent::Disconnect(reason)) => {
                    tracing::info!(%reason, ?feed, "Live feed disconnected by content store");
                    break;
                }
                Ok(ListenEvent::ChannelError(message)) => {
                    tracing::warn!(%message, ?feed, "Live feed channel error");
                    break;
                }
                Err(e) => {
                    tracing::warn!(error = %e, ?feed, "Live feed stream failed");
                    break;
                }
            }
        }
    };

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
