//! Async driver around the reducer: one instance per snippet in view.

use super::state::{reduce, Effect, Event, Notice, SnippetState};
use crate::access::{self, SnippetRef};
use crate::service::SnippetService;
use crate::snippet::{Draft, Secret};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// What happened to a dispatched event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The event moved the machine (and any request it issued has landed).
    Applied,
    /// The event is not valid right now, e.g. a second decrypt while one is in flight.
    Ignored,
    /// The view was left while the request was out; its result was dropped.
    Discarded,
}

struct Inner {
    state: SnippetState,
    notice: Option<Notice>,
    /// Bumped on leave so late results can be recognised.
    epoch: u64,
}

impl Inner {
    fn apply(&mut self, event: Event) -> (bool, Option<Effect>) {
        if matches!(event, Event::Leave) {
            self.epoch += 1;
        }

        let name = event.name();
        let from = self.state.name();
        let transition = reduce(std::mem::take(&mut self.state), event);
        self.state = transition.state;

        if transition.applied {
            self.notice = transition.notice;
            debug!(event = name, from, to = self.state.name(), "snippet transition");
        } else {
            debug!(event = name, state = from, "event ignored");
        }
        (transition.applied, transition.effect)
    }
}

pub struct SnippetMachine<S: ?Sized> {
    service: Arc<S>,
    inner: Arc<Mutex<Inner>>,
}

impl<S: ?Sized> Clone for SnippetMachine<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> SnippetMachine<S>
where
    S: SnippetService + ?Sized,
{
    /// Fresh machine in `Composing`.
    pub fn new(service: Arc<S>) -> Self {
        Self {
            service,
            inner: Arc::new(Mutex::new(Inner {
                state: SnippetState::default(),
                notice: None,
                epoch: 0,
            })),
        }
    }

    pub async fn state(&self) -> SnippetState {
        self.inner.lock().await.state.clone()
    }

    /// Latest message for the user; replaced on every applied event.
    pub async fn notice(&self) -> Option<Notice> {
        self.inner.lock().await.notice.clone()
    }

    /// Run one event through the reducer and carry out the request it asks for.
    ///
    /// The lock is released while the request is out, so other handles can
    /// observe the busy state (and have their events ignored).
    pub async fn dispatch(&self, event: Event) -> Dispatch {
        let (effect, epoch) = {
            let mut inner = self.inner.lock().await;
            let (applied, effect) = inner.apply(event);
            if !applied {
                return Dispatch::Ignored;
            }
            (effect, inner.epoch)
        };

        let Some(effect) = effect else {
            return Dispatch::Applied;
        };
        let outcome = self.run(effect).await;

        let mut inner = self.inner.lock().await;
        if inner.epoch != epoch {
            info!(result = outcome.name(), "view left before reply arrived; result discarded");
            return Dispatch::Discarded;
        }
        inner.apply(outcome);
        Dispatch::Applied
    }

    async fn run(&self, effect: Effect) -> Event {
        match effect {
            Effect::Create(request) => Event::CreateFinished(self.service.create(&request).await),
            Effect::Locate(reference) => {
                Event::LocateFinished(access::resolve(&*self.service, reference).await)
            }
            Effect::Decrypt { id, password } => {
                Event::DecryptFinished(self.service.decrypt(&id, &password).await)
            }
            Effect::Delete(id) => Event::DeleteFinished(self.service.delete(&id).await),
        }
    }

    /* ---------- composing ---------- */

    pub async fn edit_draft(&self, draft: Draft) -> Dispatch {
        self.dispatch(Event::EditDraft(draft)).await
    }

    pub async fn submit(&self) -> Dispatch {
        self.dispatch(Event::Submit).await
    }

    /// Owner has copied the password; forget it.
    pub async fn confirm_created(&self) -> Dispatch {
        self.dispatch(Event::ConfirmCreated).await
    }

    /* ---------- viewing ---------- */

    pub async fn locate(&self, reference: impl Into<SnippetRef>) -> Dispatch {
        self.dispatch(Event::Locate(reference.into())).await
    }

    pub async fn edit_password(&self, password: impl Into<Secret>) -> Dispatch {
        self.dispatch(Event::EditPassword(password.into())).await
    }

    pub async fn decrypt(&self) -> Dispatch {
        self.dispatch(Event::Decrypt).await
    }

    pub async fn acknowledge(&self) -> Dispatch {
        self.dispatch(Event::Acknowledge).await
    }

    /* ---------- deleting ---------- */

    /// Open the confirmation step. Nothing is sent yet.
    pub async fn request_delete(&self) -> Dispatch {
        self.dispatch(Event::RequestDelete).await
    }

    pub async fn cancel_delete(&self) -> Dispatch {
        self.dispatch(Event::CancelDelete).await
    }

    pub async fn confirm_delete(&self) -> Dispatch {
        self.dispatch(Event::ConfirmDelete).await
    }

    /// End the view: drop secrets and disown any request still in flight.
    pub async fn leave(&self) -> Dispatch {
        self.dispatch(Event::Leave).await
    }
}
