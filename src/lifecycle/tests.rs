//! Unit tests for the reducer and the async driver.

use super::*;
use crate::access::{Located, SnippetRef};
use crate::error::{SnipError, ValidationError};
use crate::service::testing::TestService;
use crate::service::SnippetService;
use crate::snippet::{Draft, Secret, SnippetId};
use tokio_test::assert_pending;

fn located(id: &str) -> Located {
    Located {
        id: SnippetId::new(id),
        title: "Title".to_string(),
        encrypted_payload: "ciphertext".to_string(),
        created_at: None,
    }
}

/* ---------- reducer ---------- */

#[test]
fn submit_with_short_password_stays_composing() {
    let draft = Draft::new("T", "M", "1234", "");
    let t = reduce(SnippetState::Composing { draft: draft.clone() }, Event::Submit);

    assert!(t.applied);
    assert!(t.effect.is_none());
    assert_eq!(t.state, SnippetState::Composing { draft });
    assert_eq!(
        t.notice,
        Some(Notice::Error(
            ValidationError::PasswordTooShort { min: 5 }.into()
        ))
    );
}

#[test]
fn valid_submit_issues_create() {
    let draft = Draft::new("T", "M", "P12345", "a,b");
    let t = reduce(SnippetState::Composing { draft }, Event::Submit);

    assert!(matches!(t.state, SnippetState::Submitting { .. }));
    match t.effect {
        Some(Effect::Create(request)) => assert_eq!(request.tags(), ["a", "b"]),
        other => panic!("expected create effect, got {:?}", other),
    }
}

#[test]
fn decrypt_while_decrypting_is_not_applied() {
    let state = SnippetState::Decrypting {
        snippet: located("a"),
        password: Secret::new("P12345"),
    };
    let t = reduce(state.clone(), Event::Decrypt);
    assert!(!t.applied);
    assert!(t.effect.is_none());
    assert_eq!(t.state, state);
}

#[test]
fn busy_states_ignore_user_actions() {
    let state = SnippetState::Deleting {
        id: SnippetId::new("a"),
        prior: Box::new(SnippetState::Located {
            snippet: located("a"),
            password: Secret::default(),
        }),
    };
    for event in [Event::Decrypt, Event::RequestDelete, Event::ConfirmDelete, Event::Submit] {
        let t = reduce(state.clone(), event);
        assert!(!t.applied);
        assert_eq!(t.state, state);
    }
}

#[test]
fn cancel_delete_restores_prior_exactly() {
    let decrypted = SnippetState::Decrypted {
        snippet: located("a"),
        plaintext: Secret::new("hello"),
    };
    let confirming = reduce(decrypted.clone(), Event::RequestDelete);
    assert!(matches!(confirming.state, SnippetState::ConfirmingDelete { .. }));
    assert!(confirming.effect.is_none());

    let back = reduce(confirming.state, Event::CancelDelete);
    assert_eq!(back.state, decrypted);
}

#[test]
fn confirm_delete_drops_plaintext() {
    let decrypted = SnippetState::Decrypted {
        snippet: located("a"),
        plaintext: Secret::new("hello"),
    };
    let confirming = reduce(decrypted, Event::RequestDelete).state;
    let t = reduce(confirming, Event::ConfirmDelete);

    match &t.state {
        SnippetState::Deleting { id, prior } => {
            assert_eq!(id.as_str(), "a");
            assert_eq!(prior.plaintext(), None);
        }
        other => panic!("expected deleting, got {:?}", other),
    }
    assert!(matches!(t.effect, Some(Effect::Delete(_))));
}

#[test]
fn composing_cannot_be_deleted() {
    let t = reduce(SnippetState::default(), Event::RequestDelete);
    assert!(!t.applied);
}

#[test]
fn leave_keeps_deleted_terminal() {
    let t = reduce(
        SnippetState::Deleted {
            id: SnippetId::new("a"),
        },
        Event::Leave,
    );
    assert!(matches!(t.state, SnippetState::Deleted { .. }));
}

/* ---------- driver ---------- */

#[tokio::test]
async fn short_password_never_reaches_the_service() {
    let service = TestService::new();
    let machine = SnippetMachine::new(service.clone());

    for password in ["", "a", "abcd", "ééé"] {
        machine.edit_draft(Draft::new("T", "M", password, "")).await;
        assert_eq!(machine.submit().await, Dispatch::Applied);
        assert!(matches!(machine.state().await, SnippetState::Composing { .. }));
        assert!(matches!(
            machine.notice().await,
            Some(Notice::Error(SnipError::Validation(
                ValidationError::PasswordTooShort { .. }
            )))
        ));
    }
    assert_eq!(service.calls("create"), 0);
}

#[tokio::test]
async fn blank_title_never_reaches_the_service() {
    let service = TestService::new();
    let machine = SnippetMachine::new(service.clone());

    for title in ["", "   ", "\t\n"] {
        machine.edit_draft(Draft::new(title, "M", "P12345", "")).await;
        machine.submit().await;
        assert_eq!(
            machine.notice().await,
            Some(Notice::Error(ValidationError::EmptyTitle.into()))
        );
    }
    assert_eq!(service.calls("create"), 0);
}

#[tokio::test]
async fn create_then_decrypt_yields_message() {
    let service = TestService::new();
    let machine = SnippetMachine::new(service.clone());

    machine.edit_draft(Draft::new("T", "M", "P12345", "a,b")).await;
    assert_eq!(machine.submit().await, Dispatch::Applied);

    let created = match machine.state().await {
        SnippetState::Created {
            snippet,
            title,
            password,
        } => {
            assert_eq!(title, "T");
            assert_eq!(password.as_deref(), Some("P12345"));
            snippet
        }
        other => panic!("expected created, got {:?}", other),
    };

    machine.confirm_created().await;
    assert!(matches!(
        machine.state().await,
        SnippetState::Created { password: None, .. }
    ));

    machine.locate(created.id.clone()).await;
    machine.edit_password("P12345").await;
    assert_eq!(machine.decrypt().await, Dispatch::Applied);
    assert_eq!(machine.state().await.plaintext(), Some("M"));
}

#[tokio::test]
async fn failed_create_keeps_the_draft() {
    let service = TestService::new();
    service.fail("create", SnipError::Transport("Service unavailable".to_string()));
    let machine = SnippetMachine::new(service.clone());
    let draft = Draft::new("T", "M", "P12345", "x");

    machine.edit_draft(draft.clone()).await;
    machine.submit().await;
    assert!(matches!(
        machine.state().await,
        SnippetState::Failed {
            recovery: Recovery::Compose(_),
            ..
        }
    ));
    assert_eq!(
        machine.notice().await.map(|n| n.message()),
        Some("Service unavailable".to_string())
    );

    machine.acknowledge().await;
    assert_eq!(machine.state().await, SnippetState::Composing { draft });
}

#[tokio::test]
async fn wrong_password_is_repeatable_and_harmless() {
    let service = TestService::new();
    let summary = service.seed("S", "secret", "P12345").await;
    let before = service.local().list().await.unwrap();
    let machine = SnippetMachine::new(service.clone());
    machine.locate(summary).await;

    for _ in 0..3 {
        machine.edit_password("guess-guess").await;
        machine.decrypt().await;
        let state = machine.state().await;
        assert!(matches!(state, SnippetState::Failed { .. }));
        assert_eq!(state.plaintext(), None);
        assert_eq!(
            machine.notice().await,
            Some(Notice::Error(SnipError::WrongPassword(
                "Invalid password".to_string()
            )))
        );

        machine.acknowledge().await;
        match machine.state().await {
            SnippetState::Located { password, .. } => assert_eq!(password.expose(), "guess-guess"),
            other => panic!("expected located, got {:?}", other),
        }
    }

    assert_eq!(service.calls("decrypt"), 3);
    assert_eq!(service.local().list().await.unwrap(), before);
}

#[tokio::test]
async fn empty_password_is_not_sent() {
    let service = TestService::new();
    let summary = service.seed("S", "secret", "P12345").await;
    let machine = SnippetMachine::new(service.clone());
    machine.locate(summary).await;

    machine.edit_password("").await;
    machine.decrypt().await;

    assert!(matches!(machine.state().await, SnippetState::Located { .. }));
    assert_eq!(
        machine.notice().await,
        Some(Notice::Error(ValidationError::MissingPassword.into()))
    );
    assert_eq!(service.calls("decrypt"), 0);
}

#[tokio::test]
async fn whitespace_password_round_trips() {
    let service = TestService::new();
    let machine = SnippetMachine::new(service.clone());
    machine.edit_draft(Draft::new("T", "M", "      ", "")).await;
    machine.submit().await;
    let id = match machine.state().await {
        SnippetState::Created { snippet, .. } => snippet.id,
        other => panic!("expected created, got {:?}", other),
    };

    let view = SnippetMachine::new(service.clone());
    view.locate(SnippetRef::Id(id)).await;
    view.edit_password("      ").await;
    view.decrypt().await;

    assert_eq!(view.state().await.plaintext(), Some("M"));
    assert_eq!(service.calls("decrypt"), 1);
}

#[tokio::test]
async fn second_decrypt_while_outstanding_is_a_no_op() {
    let service = TestService::new();
    let summary = service.seed("S", "secret", "P12345").await;
    service.gate("decrypt");
    let machine = SnippetMachine::new(service.clone());
    machine.locate(summary).await;
    machine.edit_password("P12345").await;

    let mut first = tokio_test::task::spawn(machine.decrypt());
    assert_pending!(first.poll());
    assert!(machine.state().await.is_busy());

    assert_eq!(machine.decrypt().await, Dispatch::Ignored);
    assert_eq!(machine.request_delete().await, Dispatch::Ignored);
    assert_eq!(service.calls("decrypt"), 1);

    service.release("decrypt");
    assert_eq!(first.await, Dispatch::Applied);
    assert_eq!(machine.state().await.plaintext(), Some("secret"));
    assert_eq!(service.calls("decrypt"), 1);
}

#[tokio::test]
async fn result_after_leave_is_discarded() {
    let service = TestService::new();
    let summary = service.seed("S", "secret", "P12345").await;
    service.gate("decrypt");
    let machine = SnippetMachine::new(service.clone());
    machine.locate(summary).await;
    machine.edit_password("P12345").await;

    let mut pending = tokio_test::task::spawn(machine.decrypt());
    assert_pending!(pending.poll());

    assert_eq!(machine.leave().await, Dispatch::Applied);
    service.release("decrypt");

    assert_eq!(pending.await, Dispatch::Discarded);
    let state = machine.state().await;
    assert_eq!(state, SnippetState::default());
    assert_eq!(state.plaintext(), None);
}

#[tokio::test]
async fn leaving_clears_plaintext() {
    let service = TestService::new();
    let summary = service.seed("S", "secret", "P12345").await;
    let machine = SnippetMachine::new(service.clone());
    machine.locate(summary).await;
    machine.edit_password("P12345").await;
    machine.decrypt().await;
    assert_eq!(machine.state().await.plaintext(), Some("secret"));

    machine.leave().await;
    assert_eq!(machine.state().await.plaintext(), None);
}

#[tokio::test]
async fn both_locate_paths_feed_decrypt_the_same_data() {
    let service = TestService::new();
    let summary = service.seed("S", "secret", "P12345").await;

    let direct = SnippetMachine::new(service.clone());
    direct.locate(SnippetRef::Direct(summary.clone())).await;
    let by_id = SnippetMachine::new(service.clone());
    by_id.locate(SnippetRef::Id(summary.id.clone())).await;

    assert_eq!(direct.state().await, by_id.state().await);
    assert_eq!(
        direct.state().await.located(),
        Some(&Located::from(summary))
    );
}

#[tokio::test]
async fn unknown_id_ends_in_locate_failed() {
    let service = TestService::new();
    let machine = SnippetMachine::new(service.clone());

    machine.locate(SnippetId::new("ghost")).await;
    assert!(matches!(
        machine.state().await,
        SnippetState::LocateFailed { .. }
    ));
    assert!(matches!(
        machine.notice().await,
        Some(Notice::Error(SnipError::NotFound(_)))
    ));
}

#[tokio::test]
async fn decrypted_snippet_can_be_deleted() {
    let service = TestService::new();
    let summary = service.seed("S", "secret", "P12345").await;
    let machine = SnippetMachine::new(service.clone());
    machine.locate(summary.clone()).await;
    machine.edit_password("P12345").await;
    machine.decrypt().await;

    assert_eq!(machine.request_delete().await, Dispatch::Applied);
    assert_eq!(service.calls("delete"), 0);
    assert_eq!(machine.confirm_delete().await, Dispatch::Applied);

    assert_eq!(
        machine.state().await,
        SnippetState::Deleted {
            id: summary.id.clone()
        }
    );
    assert!(service.local().fetch_by_id(&summary.id).await.is_err());
}

#[tokio::test]
async fn failed_delete_leaves_snippet_in_place() {
    let service = TestService::new();
    let summary = service.seed("S", "secret", "P12345").await;
    service.fail("delete", SnipError::Transport("Failed to delete snippet.".to_string()));
    let machine = SnippetMachine::new(service.clone());
    machine.locate(summary.clone()).await;

    machine.request_delete().await;
    machine.confirm_delete().await;

    assert!(matches!(machine.state().await, SnippetState::Located { .. }));
    assert_eq!(
        machine.notice().await.map(|n| n.message()),
        Some("Failed to delete snippet.".to_string())
    );
    assert!(service.local().fetch_by_id(&summary.id).await.is_ok());
}

#[tokio::test]
async fn cancelled_delete_sends_nothing() {
    let service = TestService::new();
    let summary = service.seed("S", "secret", "P12345").await;
    let machine = SnippetMachine::new(service.clone());
    machine.locate(summary).await;
    let before = machine.state().await;

    machine.request_delete().await;
    machine.cancel_delete().await;

    assert_eq!(machine.state().await, before);
    assert_eq!(service.calls("delete"), 0);
}
