//! Engine tests against the in-memory store.
//!
//! These exercise the full transition table, the role gate, and the
//! optimistic-concurrency behavior of the start transition.

#![allow(clippy::expect_used)] // Test code uses expect for clear failure messages

use workorder_core::memory::InMemoryRequestStore;
use workorder_core::{
    Action, Actor, CreateRequest, Outcome, RequestFilter, RequestId, RequestStore, Role, Status,
    Transition, TransitionEngine, User, UserId,
};

const DISPATCHER: Actor = Actor {
    id: UserId(1),
    role: Role::Dispatcher,
};

const fn master(id: i64) -> Actor {
    Actor {
        id: UserId(id),
        role: Role::Master,
    }
}

fn intake(client_name: &str) -> CreateRequest {
    CreateRequest {
        client_name: client_name.to_string(),
        phone: "555".to_string(),
        address: "1 Rd".to_string(),
        problem_text: "leak".to_string(),
    }
}

fn engine() -> TransitionEngine<InMemoryRequestStore> {
    let store = InMemoryRequestStore::new();
    store
        .add_user(User {
            id: UserId(7),
            name: "Ivan".to_string(),
            role: Role::Master,
        })
        .expect("add master");
    store
        .add_user(User {
            id: UserId(9),
            name: "Petr".to_string(),
            role: Role::Master,
        })
        .expect("add master");
    store
        .add_user(User {
            id: UserId(1),
            name: "Dana".to_string(),
            role: Role::Dispatcher,
        })
        .expect("add dispatcher");
    TransitionEngine::new(store)
}

fn transition(action: Action, request_id: RequestId, target: Option<UserId>) -> Transition {
    Transition {
        action,
        request_id,
        target,
    }
}

#[tokio::test]
async fn create_then_list_round_trip() {
    let engine = engine();
    let request = engine.create(intake("Alice")).await.expect("create");

    assert_eq!(request.status, Status::New);
    assert_eq!(request.assigned_to, None);
    assert_eq!(request.version, 0);

    let listed = engine
        .store()
        .list(&RequestFilter::default())
        .await
        .expect("list");
    assert_eq!(listed, vec![request]);
}

#[tokio::test]
async fn create_rejects_empty_intake_fields() {
    let engine = engine();
    let mut request = intake("Alice");
    request.phone = "  ".to_string();

    let err = engine.create(request).await.expect_err("must reject");
    assert_eq!(
        err,
        workorder_core::EngineError::InvalidInput("phone")
    );
}

#[tokio::test]
async fn full_lifecycle_scenario() {
    let engine = engine();
    let request = engine.create(intake("Alice")).await.expect("create");
    let id = request.id;

    // Dispatcher assigns to master 7.
    let outcome = engine
        .execute(DISPATCHER, transition(Action::Assign, id, Some(UserId(7))))
        .await
        .expect("assign");
    assert_eq!(outcome, Outcome::Applied);
    let current = engine.store().get(id).expect("get").expect("present");
    assert_eq!(current.status, Status::Assigned);
    assert_eq!(current.assigned_to, Some(UserId(7)));

    // Wrong master cannot start.
    let outcome = engine
        .execute(master(9), transition(Action::Start, id, None))
        .await
        .expect("start");
    assert_eq!(outcome, Outcome::Conflict);

    // Assigned master starts; version fences the transition.
    let outcome = engine
        .execute(master(7), transition(Action::Start, id, None))
        .await
        .expect("start");
    assert_eq!(outcome, Outcome::Applied);
    let current = engine.store().get(id).expect("get").expect("present");
    assert_eq!(current.status, Status::InProgress);
    assert_eq!(current.version, 1);

    // In-progress work is no longer cancellable.
    let outcome = engine
        .execute(DISPATCHER, transition(Action::Cancel, id, None))
        .await
        .expect("cancel");
    assert_eq!(outcome, Outcome::Conflict);

    // Assigned master finishes.
    let outcome = engine
        .execute(master(7), transition(Action::Finish, id, None))
        .await
        .expect("finish");
    assert_eq!(outcome, Outcome::Applied);
    let current = engine.store().get(id).expect("get").expect("present");
    assert_eq!(current.status, Status::Done);
    assert_eq!(current.assigned_to, Some(UserId(7)), "history retained");
}

#[tokio::test]
async fn role_mismatch_is_unauthorized_and_side_effect_free() {
    let engine = engine();
    let request = engine.create(intake("Alice")).await.expect("create");

    // A master submitting a dispatcher action is rejected before any
    // store call.
    let outcome = engine
        .execute(
            master(7),
            transition(Action::Assign, request.id, Some(UserId(7))),
        )
        .await
        .expect("assign");
    assert_eq!(outcome, Outcome::Unauthorized);

    let outcome = engine
        .execute(DISPATCHER, transition(Action::Start, request.id, None))
        .await
        .expect("start");
    assert_eq!(outcome, Outcome::Unauthorized);

    let current = engine
        .store()
        .get(request.id)
        .expect("get")
        .expect("present");
    assert_eq!(current.status, Status::New);
    assert_eq!(current.version, 0);
}

#[tokio::test]
async fn malformed_commands_are_invalid_input() {
    let engine = engine();
    let request = engine.create(intake("Alice")).await.expect("create");

    // Non-positive request id.
    let outcome = engine
        .execute(DISPATCHER, transition(Action::Cancel, RequestId(0), None))
        .await
        .expect("cancel");
    assert_eq!(outcome, Outcome::InvalidInput);

    // Assign without a target.
    let outcome = engine
        .execute(DISPATCHER, transition(Action::Assign, request.id, None))
        .await
        .expect("assign");
    assert_eq!(outcome, Outcome::InvalidInput);

    let current = engine
        .store()
        .get(request.id)
        .expect("get")
        .expect("present");
    assert_eq!(current.status, Status::New);
}

#[tokio::test]
async fn assign_on_non_new_request_conflicts() {
    let engine = engine();
    let request = engine.create(intake("Alice")).await.expect("create");

    let outcome = engine
        .execute(
            DISPATCHER,
            transition(Action::Assign, request.id, Some(UserId(7))),
        )
        .await
        .expect("assign");
    assert_eq!(outcome, Outcome::Applied);

    // Second dispatcher with a stale view loses.
    let outcome = engine
        .execute(
            DISPATCHER,
            transition(Action::Assign, request.id, Some(UserId(9))),
        )
        .await
        .expect("assign");
    assert_eq!(outcome, Outcome::Conflict);

    let current = engine
        .store()
        .get(request.id)
        .expect("get")
        .expect("present");
    assert_eq!(current.assigned_to, Some(UserId(7)));
}

#[tokio::test]
async fn cancel_on_done_request_conflicts() {
    let engine = engine();
    let request = engine.create(intake("Alice")).await.expect("create");
    let id = request.id;

    for (actor, action) in [
        (DISPATCHER, Action::Assign),
        (master(7), Action::Start),
        (master(7), Action::Finish),
    ] {
        let target = (action == Action::Assign).then_some(UserId(7));
        let outcome = engine
            .execute(actor, transition(action, id, target))
            .await
            .expect("transition");
        assert_eq!(outcome, Outcome::Applied);
    }

    let outcome = engine
        .execute(DISPATCHER, transition(Action::Cancel, id, None))
        .await
        .expect("cancel");
    assert_eq!(outcome, Outcome::Conflict);
}

#[tokio::test]
async fn cancel_is_valid_from_new_and_assigned_only() {
    let engine = engine();

    let fresh = engine.create(intake("Alice")).await.expect("create");
    let outcome = engine
        .execute(DISPATCHER, transition(Action::Cancel, fresh.id, None))
        .await
        .expect("cancel");
    assert_eq!(outcome, Outcome::Applied);

    let assigned = engine.create(intake("Bob")).await.expect("create");
    engine
        .execute(
            DISPATCHER,
            transition(Action::Assign, assigned.id, Some(UserId(7))),
        )
        .await
        .expect("assign");
    let outcome = engine
        .execute(DISPATCHER, transition(Action::Cancel, assigned.id, None))
        .await
        .expect("cancel");
    assert_eq!(outcome, Outcome::Applied);

    // Canceled is terminal: the assigned master can no longer start.
    let outcome = engine
        .execute(master(7), transition(Action::Start, assigned.id, None))
        .await
        .expect("start");
    assert_eq!(outcome, Outcome::Conflict);
}

#[tokio::test]
async fn concurrent_starts_apply_exactly_once() {
    // Run the race many times; a single-iteration test can pass by
    // scheduling accident.
    for _ in 0..100 {
        let engine = engine();
        let request = engine.create(intake("Alice")).await.expect("create");
        let id = request.id;

        engine
            .execute(DISPATCHER, transition(Action::Assign, id, Some(UserId(7))))
            .await
            .expect("assign");

        let left = {
            let engine = engine.clone();
            tokio::spawn(async move {
                engine
                    .execute(master(7), transition(Action::Start, id, None))
                    .await
            })
        };
        let right = {
            let engine = engine.clone();
            tokio::spawn(async move {
                engine
                    .execute(master(7), transition(Action::Start, id, None))
                    .await
            })
        };

        let left = left.await.expect("join").expect("start");
        let right = right.await.expect("join").expect("start");

        let applied = [left, right]
            .iter()
            .filter(|o| o.is_applied())
            .count();
        assert_eq!(applied, 1, "exactly one start wins: {left:?} vs {right:?}");
        assert!([left, right].contains(&Outcome::Conflict));

        let current = engine.store().get(id).expect("get").expect("present");
        assert_eq!(current.version, 1, "version bumps exactly once");
        assert_eq!(current.status, Status::InProgress);
    }
}

#[tokio::test]
async fn dashboard_is_role_scoped() {
    let engine = engine();
    let first = engine.create(intake("Alice")).await.expect("create");
    let second = engine.create(intake("Bob")).await.expect("create");

    engine
        .execute(
            DISPATCHER,
            transition(Action::Assign, first.id, Some(UserId(7))),
        )
        .await
        .expect("assign");

    // Dispatcher sees everything plus the master roster.
    let dashboard = engine
        .dashboard(DISPATCHER, None)
        .await
        .expect("dashboard");
    assert_eq!(dashboard.requests.len(), 2);
    assert_eq!(
        dashboard
            .masters
            .iter()
            .map(|m| m.id)
            .collect::<Vec<_>>(),
        vec![UserId(7), UserId(9)]
    );

    // Master 7 sees only their own assignment.
    let dashboard = engine
        .dashboard(master(7), None)
        .await
        .expect("dashboard");
    assert_eq!(
        dashboard.requests.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![first.id]
    );

    // Status filter narrows the dispatcher view.
    let dashboard = engine
        .dashboard(DISPATCHER, Some(Status::New))
        .await
        .expect("dashboard");
    assert_eq!(
        dashboard.requests.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![second.id]
    );
}

#[tokio::test]
async fn listing_order_is_stable_by_id() {
    let engine = engine();
    for name in ["Alice", "Bob", "Carol"] {
        engine.create(intake(name)).await.expect("create");
    }

    let listed = engine
        .store()
        .list(&RequestFilter::default())
        .await
        .expect("list");
    let ids: Vec<_> = listed.iter().map(|r| r.id.0).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted);
}
