//! States, events and the reducer that ties them together.
//!
//! `reduce` is pure: it never talks to the service. When a transition needs a
//! request it returns an [`Effect`]; the driver runs it and feeds the outcome
//! back as the matching `*Finished` event.

use crate::access::{Located, SnippetRef};
use crate::error::{SnipError, SnipResult, ValidationError};
use crate::snippet::{CreateRequest, CreatedSnippet, Draft, Secret, SnippetId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnippetState {
    Composing {
        draft: Draft,
    },
    Submitting {
        draft: Draft,
    },
    Created {
        snippet: CreatedSnippet,
        title: String,
        /// Shown once so the owner can copy it; dropped on confirmation.
        password: Option<Secret>,
    },
    Locating {
        id: SnippetId,
    },
    LocateFailed {
        id: SnippetId,
        error: SnipError,
    },
    Located {
        snippet: Located,
        password: Secret,
    },
    Decrypting {
        snippet: Located,
        password: Secret,
    },
    Decrypted {
        snippet: Located,
        plaintext: Secret,
    },
    Failed {
        error: SnipError,
        recovery: Recovery,
    },
    ConfirmingDelete {
        prior: Box<SnippetState>,
    },
    Deleting {
        id: SnippetId,
        prior: Box<SnippetState>,
    },
    Deleted {
        id: SnippetId,
    },
}

/// Where a failed request hands control back on acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recovery {
    Compose(Draft),
    Decrypt {
        snippet: Located,
        password: Secret,
    },
}

impl Default for SnippetState {
    fn default() -> Self {
        SnippetState::Composing {
            draft: Draft::default(),
        }
    }
}

impl SnippetState {
    pub fn name(&self) -> &'static str {
        match self {
            SnippetState::Composing { .. } => "composing",
            SnippetState::Submitting { .. } => "submitting",
            SnippetState::Created { .. } => "created",
            SnippetState::Locating { .. } => "locating",
            SnippetState::LocateFailed { .. } => "locate-failed",
            SnippetState::Located { .. } => "located",
            SnippetState::Decrypting { .. } => "decrypting",
            SnippetState::Decrypted { .. } => "decrypted",
            SnippetState::Failed { .. } => "failed",
            SnippetState::ConfirmingDelete { .. } => "confirming-delete",
            SnippetState::Deleting { .. } => "deleting",
            SnippetState::Deleted { .. } => "deleted",
        }
    }

    /// Id of the snippet this state refers to, once the service has one.
    pub fn resolved_id(&self) -> Option<&SnippetId> {
        match self {
            SnippetState::Created { snippet, .. } => Some(&snippet.id),
            SnippetState::Located { snippet, .. }
            | SnippetState::Decrypting { snippet, .. }
            | SnippetState::Decrypted { snippet, .. } => Some(&snippet.id),
            SnippetState::Failed {
                recovery: Recovery::Decrypt { snippet, .. },
                ..
            } => Some(&snippet.id),
            SnippetState::ConfirmingDelete { prior } => prior.resolved_id(),
            SnippetState::Deleting { id, .. } | SnippetState::Deleted { id } => Some(id),
            _ => None,
        }
    }

    /// A request is outstanding; user actions are ignored until it lands.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            SnippetState::Submitting { .. }
                | SnippetState::Locating { .. }
                | SnippetState::Decrypting { .. }
                | SnippetState::Deleting { .. }
        )
    }

    pub fn plaintext(&self) -> Option<&str> {
        match self {
            SnippetState::Decrypted { plaintext, .. } => Some(plaintext.expose()),
            _ => None,
        }
    }

    pub fn located(&self) -> Option<&Located> {
        match self {
            SnippetState::Located { snippet, .. }
            | SnippetState::Decrypting { snippet, .. }
            | SnippetState::Decrypted { snippet, .. } => Some(snippet),
            SnippetState::Failed {
                recovery: Recovery::Decrypt { snippet, .. },
                ..
            } => Some(snippet),
            SnippetState::ConfirmingDelete { prior } | SnippetState::Deleting { prior, .. } => {
                prior.located()
            }
            _ => None,
        }
    }

    fn can_delete(&self) -> bool {
        matches!(
            self,
            SnippetState::Created { .. }
                | SnippetState::Located { .. }
                | SnippetState::Decrypted { .. }
                | SnippetState::Failed {
                    recovery: Recovery::Decrypt { .. },
                    ..
                }
        )
    }

    /// The same state with any plaintext dropped.
    fn without_plaintext(self) -> SnippetState {
        match self {
            SnippetState::Decrypted { snippet, .. } => SnippetState::Located {
                snippet,
                password: Secret::default(),
            },
            other => other,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Event {
    EditDraft(Draft),
    Submit,
    CreateFinished(SnipResult<CreatedSnippet>),
    ConfirmCreated,
    Locate(SnippetRef),
    LocateFinished(SnipResult<Located>),
    EditPassword(Secret),
    Decrypt,
    DecryptFinished(SnipResult<Secret>),
    Acknowledge,
    RequestDelete,
    CancelDelete,
    ConfirmDelete,
    DeleteFinished(SnipResult<()>),
    Leave,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::EditDraft(_) => "edit-draft",
            Event::Submit => "submit",
            Event::CreateFinished(_) => "create-finished",
            Event::ConfirmCreated => "confirm-created",
            Event::Locate(_) => "locate",
            Event::LocateFinished(_) => "locate-finished",
            Event::EditPassword(_) => "edit-password",
            Event::Decrypt => "decrypt",
            Event::DecryptFinished(_) => "decrypt-finished",
            Event::Acknowledge => "acknowledge",
            Event::RequestDelete => "request-delete",
            Event::CancelDelete => "cancel-delete",
            Event::ConfirmDelete => "confirm-delete",
            Event::DeleteFinished(_) => "delete-finished",
            Event::Leave => "leave",
        }
    }
}

/// A request the driver must issue after a transition.
#[derive(Debug, Clone)]
pub enum Effect {
    Create(CreateRequest),
    Locate(SnippetRef),
    Decrypt {
        id: SnippetId,
        password: Secret,
    },
    Delete(SnippetId),
}

/// Something to show the user alongside the new state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Error(SnipError),
    Info(String),
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Notice::Error(error) => error.to_string(),
            Notice::Info(text) => text.clone(),
        }
    }
}

impl From<ValidationError> for Notice {
    fn from(error: ValidationError) -> Self {
        Notice::Error(error.into())
    }
}

#[derive(Debug)]
pub struct Transition {
    pub state: SnippetState,
    pub effect: Option<Effect>,
    pub notice: Option<Notice>,
    /// False when the event was not valid for the current state.
    pub applied: bool,
}

impl Transition {
    fn to(state: SnippetState) -> Self {
        Self {
            state,
            effect: None,
            notice: None,
            applied: true,
        }
    }

    fn ignored(state: SnippetState) -> Self {
        Self {
            state,
            effect: None,
            notice: None,
            applied: false,
        }
    }

    fn with_effect(mut self, effect: Effect) -> Self {
        self.effect = Some(effect);
        self
    }

    fn with_notice(mut self, notice: impl Into<Notice>) -> Self {
        self.notice = Some(notice.into());
        self
    }
}

impl From<SnipError> for Notice {
    fn from(error: SnipError) -> Self {
        Notice::Error(error)
    }
}

pub fn reduce(state: SnippetState, event: Event) -> Transition {
    use SnippetState as S;

    match (state, event) {
        // Leaving ends the view. Nothing secret survives it.
        (S::Deleted { id }, Event::Leave) => Transition::to(S::Deleted { id }),
        (_, Event::Leave) => Transition::to(S::default()),

        /* ---------- creation ---------- */
        (S::Composing { .. }, Event::EditDraft(draft)) => Transition::to(S::Composing { draft }),

        (S::Composing { draft }, Event::Submit) => match draft.validate() {
            Ok(request) => {
                Transition::to(S::Submitting { draft }).with_effect(Effect::Create(request))
            }
            Err(error) => Transition::to(S::Composing { draft }).with_notice(error),
        },

        (S::Submitting { draft }, Event::CreateFinished(Ok(snippet))) => Transition::to(S::Created {
            snippet,
            title: draft.title.clone(),
            password: Some(draft.password.clone()),
        })
        .with_notice(Notice::Info("QR Code generated successfully!".to_string())),

        (S::Submitting { draft }, Event::CreateFinished(Err(error))) => Transition::to(S::Failed {
            error: error.clone(),
            recovery: Recovery::Compose(draft),
        })
        .with_notice(error),

        (S::Created { snippet, title, .. }, Event::ConfirmCreated) => Transition::to(S::Created {
            snippet,
            title,
            password: None,
        }),

        /* ---------- locating ---------- */
        (S::Composing { .. } | S::Created { .. } | S::LocateFailed { .. }, Event::Locate(reference)) => {
            Transition::to(S::Locating {
                id: reference.id().clone(),
            })
            .with_effect(Effect::Locate(reference))
        }

        (S::Locating { .. }, Event::LocateFinished(Ok(snippet))) => Transition::to(S::Located {
            snippet,
            password: Secret::default(),
        }),

        (S::Locating { id }, Event::LocateFinished(Err(error))) => Transition::to(S::LocateFailed {
            id,
            error: error.clone(),
        })
        .with_notice(error),

        /* ---------- decrypting ---------- */
        (S::Located { snippet, .. }, Event::EditPassword(password)) => {
            Transition::to(S::Located { snippet, password })
        }

        (S::Located { snippet, password }, Event::Decrypt) => {
            if password.is_empty() {
                return Transition::to(S::Located { snippet, password })
                    .with_notice(ValidationError::MissingPassword);
            }
            let effect = Effect::Decrypt {
                id: snippet.id.clone(),
                password: password.clone(),
            };
            Transition::to(S::Decrypting { snippet, password }).with_effect(effect)
        }

        (S::Decrypting { snippet, .. }, Event::DecryptFinished(Ok(plaintext))) => {
            Transition::to(S::Decrypted { snippet, plaintext })
        }

        (S::Decrypting { snippet, password }, Event::DecryptFinished(Err(error))) => {
            Transition::to(S::Failed {
                error: error.clone(),
                recovery: Recovery::Decrypt { snippet, password },
            })
            .with_notice(error)
        }

        /* ---------- recovery ---------- */
        (S::Failed { recovery, .. }, Event::Acknowledge) => match recovery {
            Recovery::Compose(draft) => Transition::to(S::Composing { draft }),
            Recovery::Decrypt { snippet, password } => {
                Transition::to(S::Located { snippet, password })
            }
        },

        /* ---------- deletion ---------- */
        (state, Event::RequestDelete) if state.can_delete() => Transition::to(S::ConfirmingDelete {
            prior: Box::new(state),
        }),

        (S::ConfirmingDelete { prior }, Event::CancelDelete) => Transition::to(*prior),

        (S::ConfirmingDelete { prior }, Event::ConfirmDelete) => {
            let prior = prior.without_plaintext();
            match prior.resolved_id().cloned() {
                Some(id) => Transition::to(S::Deleting {
                    id: id.clone(),
                    prior: Box::new(prior),
                })
                .with_effect(Effect::Delete(id)),
                None => Transition::ignored(S::ConfirmingDelete {
                    prior: Box::new(prior),
                }),
            }
        }

        (S::Deleting { id, .. }, Event::DeleteFinished(Ok(()))) => Transition::to(S::Deleted { id })
            .with_notice(Notice::Info("Snippet deleted successfully".to_string())),

        (S::Deleting { prior, .. }, Event::DeleteFinished(Err(error))) => {
            Transition::to(*prior).with_notice(error)
        }

        (state, _) => Transition::ignored(state),
    }
}
