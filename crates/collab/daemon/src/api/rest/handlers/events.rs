//! Program change streaming

use crate::api::rest::actor::CallingAdmin;
use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use collab_types::{AdminId, CollabError, ProgramChanged};
use futures::stream::{self, Stream};
use serde::Deserialize;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

/// Stream query params
#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    /// Only changes addressed to this admin
    pub admin_id: Option<AdminId>,
    /// Only changes that touch the superadmin queue
    #[serde(default)]
    pub superadmin_queue: bool,
}

impl StreamQuery {
    fn wants(&self, change: &ProgramChanged) -> bool {
        let for_admin = self
            .admin_id
            .as_ref()
            .map_or(true, |admin_id| change.addresses(admin_id));
        let for_queue = !self.superadmin_queue || change.addresses_superadmin_queue();
        for_admin && for_queue
    }
}

/// Stream program changes via SSE
///
/// Organization admins only receive changes addressed to themselves;
/// superadmins may watch everything or narrow the feed.
pub async fn stream_events(
    State(state): State<AppState>,
    CallingAdmin(actor): CallingAdmin,
    Query(mut query): Query<StreamQuery>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    const ACTION: &str = "stream program changes";

    if let Some(admin_id) = &query.admin_id {
        if *admin_id != actor.admin_id {
            return Err(CollabError::forbidden(
                &actor.admin_id,
                ACTION,
                format!("cannot watch the changes of {admin_id}"),
            )
            .into());
        }
    }

    let account = state.service.admin_account(&actor).await?;
    if !account.is_superadmin() {
        if query.superadmin_queue {
            return Err(
                CollabError::forbidden(&actor.admin_id, ACTION, "superadmin role required").into(),
            );
        }
        query.admin_id = Some(account.admin_id);
    }

    let rx = state.event_tx.subscribe();

    let stream = stream::unfold((rx, query), |(mut rx, query)| async move {
        loop {
            match rx.recv().await {
                Ok(change) if query.wants(&change) => {
                    let event = Event::default()
                        .event("program_changed")
                        .id(format!("{}:{}", change.program_id, change.version))
                        .json_data(&change)
                        .unwrap_or_else(|_| Event::default().comment("unserializable change"));
                    return Some((Ok(event), (rx, query)));
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    // Client lagged behind; it should refetch
                    let event = Event::default().event("lagged").data(skipped.to_string());
                    return Some((Ok(event), (rx, query)));
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    ))
}

