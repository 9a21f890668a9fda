//! Application shell: one service, one collection, at most one open view.
//!
//! Navigating always ends the current view first, so its plaintext is dropped
//! and any reply still in flight for it is discarded on arrival.

use crate::collection::Collection;
use crate::issuance::{IssuanceError, IssuedCode};
use crate::lifecycle::{Dispatch, SnippetMachine, SnippetState};
use crate::routes::Route;
use crate::service::SnippetService;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

pub struct Session<S: ?Sized> {
    service: Arc<S>,
    origin: Url,
    collection: Collection<S>,
    route: Route,
    view: Option<SnippetMachine<S>>,
    issued: Option<IssuedCode>,
    notice: Option<String>,
}

impl<S> Session<S>
where
    S: SnippetService + ?Sized,
{
    /// Starts on the collection page without loading it.
    pub fn new(service: Arc<S>, origin: Url) -> Self {
        Self {
            collection: Collection::new(Arc::clone(&service)),
            service,
            origin,
            route: Route::Collection,
            view: None,
            issued: None,
            notice: None,
        }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn collection(&self) -> &Collection<S> {
        &self.collection
    }

    /// Machine behind the current create or view page.
    pub fn view(&self) -> Option<&SnippetMachine<S>> {
        self.view.as_ref()
    }

    /// Code shown on the code-issuance page.
    pub fn issued(&self) -> Option<&IssuedCode> {
        self.issued.as_ref()
    }

    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    pub async fn navigate(&mut self, route: Route) -> Result<(), IssuanceError> {
        if let Some(view) = self.view.take() {
            view.leave().await;
        }
        self.issued = None;
        debug!(from = %self.route.path(), to = %route.path(), "navigate");

        match &route {
            Route::Create => {
                self.view = Some(SnippetMachine::new(Arc::clone(&self.service)));
            }
            Route::Collection => {
                // Failure is kept on the collection for display.
                let _ = self.collection.refresh().await;
            }
            Route::View(reference) => {
                let view = SnippetMachine::new(Arc::clone(&self.service));
                view.locate(reference.clone()).await;
                self.view = Some(view);
            }
            Route::CodeIssuance { id, title } => {
                self.issued = Some(IssuedCode::new(
                    &self.origin,
                    id.clone(),
                    title.clone().unwrap_or_default(),
                )?);
            }
        }
        self.route = route;
        Ok(())
    }

    /// Owner has the password; move on to the code page like the create form does.
    pub async fn confirm_created(&mut self) -> Result<Option<IssuedCode>, IssuanceError> {
        let Some(view) = self.view.clone() else {
            return Ok(None);
        };
        if view.confirm_created().await != Dispatch::Applied {
            return Ok(None);
        }
        let SnippetState::Created { snippet, title, .. } = view.state().await else {
            return Ok(None);
        };

        let issued = IssuedCode::from_created(&self.origin, &snippet, title.clone())?;
        self.navigate(Route::CodeIssuance {
            id: snippet.id,
            title: Some(title),
        })
        .await?;
        Ok(Some(issued))
    }

    /// Confirm the pending delete in the current view. On success the item is
    /// dropped from the collection and the session returns to it.
    pub async fn confirm_delete(&mut self) -> Dispatch {
        let Some(view) = self.view.clone() else {
            return Dispatch::Ignored;
        };
        let outcome = view.confirm_delete().await;

        if let SnippetState::Deleted { id } = view.state().await {
            self.collection.forget(&id).await;
            self.notice = view.notice().await.map(|n| n.message());
            info!(%id, "snippet deleted from view");
            // Nothing to leave behind; a Deleted view has no secrets.
            self.view = None;
            let _ = self.collection.refresh().await;
            self.route = Route::Collection;
        }
        outcome
    }
}
