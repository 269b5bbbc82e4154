mod common;

use std::sync::Arc;

use common::{Gate, ScriptedTransport, acme_tree};
use hub_core::model::{EntityId, ProjectStatus, TaskStatus};
use hub_core::{Dispatcher, ErrorCode, HubError, LoadState, Mutation, PatchOutcome, Settled};
use serde_json::json;

fn loaded(transport: &Arc<ScriptedTransport>) -> Dispatcher {
    transport.respond("GetOrganizations", acme_tree());
    let mut dispatcher = Dispatcher::new(Arc::clone(transport) as Arc<dyn hub_core::Transport>);
    dispatcher.load_blocking().expect("initial load");
    dispatcher
}

fn task_status(dispatcher: &Dispatcher, id: &str) -> TaskStatus {
    dispatcher
        .snapshot()
        .task(&EntityId::from(id))
        .map(|(_, t)| t.status.clone())
        .expect("task present")
}

fn set_status(id: &str, status: TaskStatus) -> Mutation {
    Mutation::UpdateTaskStatus {
        task_id: EntityId::from(id),
        status,
    }
}

#[test]
fn load_moves_from_pending_to_ready() {
    let transport = ScriptedTransport::new();
    transport.respond("GetOrganizations", acme_tree());
    let mut dispatcher = Dispatcher::new(transport.clone());
    assert_eq!(dispatcher.store().load_state(), &LoadState::Pending);

    let counts = dispatcher.load_blocking().expect("load");
    assert_eq!(counts.organizations, 2);
    assert_eq!(counts.comments, 2);
    assert_eq!(dispatcher.store().load_state(), &LoadState::Ready);
}

#[test]
fn load_failure_message_is_verbatim() {
    let transport = ScriptedTransport::new();
    transport.graphql_error("GetOrganizations", "Authentication required");
    let mut dispatcher = Dispatcher::new(transport.clone());

    let err = dispatcher.load_blocking().expect_err("load fails");
    assert_eq!(err.code(), ErrorCode::GraphqlError);
    assert_eq!(
        dispatcher.store().load_state(),
        &LoadState::Failed("Authentication required".into())
    );
    assert!(dispatcher.snapshot().organizations.is_empty());
}

#[test]
fn created_project_lands_once_in_its_organization() {
    let transport = ScriptedTransport::new();
    let mut dispatcher = loaded(&transport);
    transport.respond(
        "CreateProject",
        json!({"createProject": {"project": {"id": "p9", "name": "Moonshot", "status": "PLANNED"}}}),
    );

    let (_, outcome) = dispatcher
        .submit_blocking(Mutation::CreateProject {
            organization_slug: "globex".into(),
            name: "Moonshot".into(),
            description: None,
            status: None,
        })
        .expect("create project");

    assert_eq!(outcome, PatchOutcome::Applied);
    let globex = dispatcher
        .snapshot()
        .organization_by_slug("globex")
        .expect("globex");
    assert_eq!(globex.projects.len(), 1);
    assert_eq!(globex.projects[0].status, ProjectStatus::Planned);
    assert!(globex.projects[0].tasks.is_empty());
    let acme = dispatcher.snapshot().organization_by_slug("acme").expect("acme");
    assert_eq!(acme.projects.len(), 2);
}

#[test]
fn created_task_uses_the_requested_project() {
    let transport = ScriptedTransport::new();
    let mut dispatcher = loaded(&transport);
    transport.respond(
        "CreateTask",
        json!({"createTask": {"task": {"id": "t9", "title": "Patch servers", "status": "TODO"}}}),
    );

    dispatcher
        .submit_blocking(Mutation::CreateTask {
            project_id: EntityId::from("p2"),
            title: "Patch servers".into(),
            description: None,
            status: None,
        })
        .expect("create task");

    let (project, task) = dispatcher
        .snapshot()
        .task(&EntityId::from("t9"))
        .expect("task present");
    assert_eq!(project.id, "p2");
    assert!(task.comments.is_empty());

    let sent = transport.requests();
    let create = sent.last().expect("request sent");
    assert_eq!(create.variables["projectId"], "p2");
}

#[test]
fn status_update_is_visible_before_the_response() {
    let transport = ScriptedTransport::new();
    let mut dispatcher = loaded(&transport);
    let gate = Gate::default();
    transport.respond_after(
        "UpdateTaskStatus",
        &gate,
        json!({"updateTaskStatus": {"task": {"id": "t1", "status": "DONE"}}}),
    );

    let request = dispatcher.submit(set_status("t1", TaskStatus::Done));
    assert_eq!(task_status(&dispatcher, "t1"), TaskStatus::Done);
    let (_, confirmed) = dispatcher
        .store()
        .confirmed()
        .task(&EntityId::from("t1"))
        .expect("task");
    assert_eq!(confirmed.status, TaskStatus::Todo);

    gate.open();
    let settled = dispatcher.wait(request).expect("settles");
    assert!(settled.error().is_none());
    assert_eq!(task_status(&dispatcher, "t1"), TaskStatus::Done);
    assert_eq!(dispatcher.store().pending_layers(), 0);
}

#[test]
fn server_value_replaces_the_optimistic_guess() {
    let transport = ScriptedTransport::new();
    let mut dispatcher = loaded(&transport);
    transport.respond(
        "UpdateTaskStatus",
        json!({"updateTaskStatus": {"task": {"id": "t1", "status": "IN_PROGRESS"}}}),
    );

    dispatcher
        .submit_blocking(set_status("t1", TaskStatus::Done))
        .expect("update");
    assert_eq!(task_status(&dispatcher, "t1"), TaskStatus::InProgress);
}

#[test]
fn failed_status_update_rolls_back_and_raises_notice() {
    let transport = ScriptedTransport::new();
    let mut dispatcher = loaded(&transport);
    let gate = Gate::default();
    transport.graphql_error_after("UpdateTaskStatus", &gate, "Task not found");

    let request = dispatcher.submit(set_status("t1", TaskStatus::Done));
    assert_eq!(task_status(&dispatcher, "t1"), TaskStatus::Done);
    gate.open();
    let settled = dispatcher.wait(request).expect("settles");

    assert!(matches!(settled.error(), Some(HubError::Graphql { .. })));
    assert_eq!(task_status(&dispatcher, "t1"), TaskStatus::Todo);
    let notice = dispatcher.notices().latest().expect("notice raised");
    assert_eq!(notice.request, Some(request));
    assert!(notice.message.contains("Task not found"));
}

#[test]
fn concurrent_updates_roll_back_independently() {
    let transport = ScriptedTransport::new();
    let mut dispatcher = loaded(&transport);
    let first_gate = Gate::default();
    let second_gate = Gate::default();
    transport.graphql_error_after("UpdateTaskStatus", &first_gate, "conflict");
    transport.respond_after(
        "UpdateTaskStatus",
        &second_gate,
        json!({"updateTaskStatus": {"task": {"id": "t1", "status": "DONE"}}}),
    );

    let first = dispatcher.submit(set_status("t1", TaskStatus::InProgress));
    // Make sure the first worker has claimed the first scripted response.
    while transport.requests().len() < 2 {
        std::thread::yield_now();
    }
    let second = dispatcher.submit(set_status("t1", TaskStatus::Done));
    assert_eq!(dispatcher.store().pending_layers(), 2);

    first_gate.open();
    dispatcher.wait(first).expect("first settles");
    assert_eq!(task_status(&dispatcher, "t1"), TaskStatus::Done);
    assert_eq!(dispatcher.store().pending_layers(), 1);

    second_gate.open();
    dispatcher.wait(second).expect("second settles");
    assert_eq!(task_status(&dispatcher, "t1"), TaskStatus::Done);
    assert_eq!(dispatcher.store().pending_layers(), 0);
}

#[test]
fn deleting_a_comment_keeps_its_siblings() {
    let transport = ScriptedTransport::new();
    let mut dispatcher = loaded(&transport);
    transport.respond(
        "DeleteComment",
        json!({"deleteComment": {"success": true, "taskId": "t1"}}),
    );

    dispatcher
        .submit_blocking(Mutation::DeleteComment {
            comment_id: EntityId::from("c1"),
        })
        .expect("delete");

    let (_, task) = dispatcher
        .snapshot()
        .task(&EntityId::from("t1"))
        .expect("task");
    let ids: Vec<&str> = task.comments.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["c2"]);
    assert_eq!(task.title, "Write spec");
}

#[test]
fn rejected_delete_leaves_snapshot_unchanged() {
    let transport = ScriptedTransport::new();
    let mut dispatcher = loaded(&transport);
    let before = dispatcher.snapshot().clone();
    transport.respond(
        "DeleteComment",
        json!({"deleteComment": {"success": false, "taskId": null}}),
    );

    let err = dispatcher
        .submit_blocking(Mutation::DeleteComment {
            comment_id: EntityId::from("c1"),
        })
        .expect_err("rejected");
    assert_eq!(err.code(), ErrorCode::MutationRejected);
    assert_eq!(dispatcher.snapshot(), &before);
    assert_eq!(dispatcher.notices().len(), 1);
}

#[test]
fn duplicate_comment_delivery_is_idempotent() {
    let transport = ScriptedTransport::new();
    let mut dispatcher = loaded(&transport);
    let payload = json!({"createComment": {"comment": {"id": "c3", "content": "ship it"}}});
    transport.respond("CreateComment", payload.clone());
    transport.respond("CreateComment", payload);

    let comment = || Mutation::CreateComment {
        task_id: EntityId::from("t1"),
        content: "ship it".into(),
    };
    let first = dispatcher.submit(comment());
    let second = dispatcher.submit(comment());
    let settled = dispatcher.wait_all();
    assert_eq!(settled.len(), 2);

    let outcomes: Vec<PatchOutcome> = settled
        .iter()
        .filter_map(|s| match s {
            Settled::Mutated {
                result: Ok((_, outcome)),
                ..
            } => Some(*outcome),
            _ => None,
        })
        .collect();
    assert!(outcomes.contains(&PatchOutcome::Applied));
    assert!(outcomes.contains(&PatchOutcome::AlreadyPresent));
    assert_ne!(first, second);

    let (_, task) = dispatcher
        .snapshot()
        .task(&EntityId::from("t1"))
        .expect("task");
    assert_eq!(task.comments.iter().filter(|c| c.id == "c3").count(), 1);
}

#[test]
fn transport_failure_leaves_snapshot_unchanged() {
    let transport = ScriptedTransport::new();
    let mut dispatcher = loaded(&transport);
    let before = dispatcher.snapshot().clone();
    transport.fail(
        "CreateTask",
        HubError::Http {
            status: 502,
            body: "bad gateway".into(),
        },
    );

    dispatcher
        .submit_blocking(Mutation::CreateTask {
            project_id: EntityId::from("p1"),
            title: "Retry".into(),
            description: None,
            status: None,
        })
        .expect_err("http failure");
    assert_eq!(dispatcher.snapshot(), &before);
    assert_eq!(
        dispatcher.notices().latest().map(|n| n.code),
        Some(ErrorCode::HttpStatus)
    );
}

#[test]
fn poll_is_non_blocking_and_drains_completions() {
    let transport = ScriptedTransport::new();
    let mut dispatcher = loaded(&transport);
    let gate = Gate::default();
    transport.respond_after(
        "RenameProject",
        &gate,
        json!({"renameProject": {"project": {"id": "p1", "name": "Relaunch", "status": "ACTIVE"}}}),
    );

    dispatcher.submit(Mutation::RenameProject {
        project_id: EntityId::from("p1"),
        name: "Relaunch".into(),
    });
    assert!(dispatcher.poll().is_empty());
    assert_eq!(dispatcher.in_flight(), 1);

    gate.open();
    let mut settled = Vec::new();
    while settled.is_empty() {
        settled = dispatcher.poll();
        std::thread::yield_now();
    }
    assert_eq!(dispatcher.in_flight(), 0);
    assert_eq!(
        dispatcher
            .snapshot()
            .project(&EntityId::from("p1"))
            .map(|p| p.name.as_str()),
        Some("Relaunch")
    );
}

#[test]
fn comment_confirmed_during_reload_survives_it() {
    let transport = ScriptedTransport::new();
    let mut dispatcher = loaded(&transport);
    let gate = Gate::default();
    // The reload response was produced before the comment existed.
    transport.respond_after("GetOrganizations", &gate, acme_tree());
    transport.respond(
        "CreateComment",
        json!({"createComment": {"comment": {"id": "c9", "content": "late"}}}),
    );

    let reload = dispatcher.begin_load();
    while transport.requests().len() < 2 {
        std::thread::yield_now();
    }
    dispatcher
        .submit_blocking(Mutation::CreateComment {
            task_id: EntityId::from("t1"),
            content: "late".into(),
        })
        .expect("comment");

    gate.open();
    dispatcher.wait(reload).expect("reload settles");
    assert_eq!(dispatcher.store().load_state(), &LoadState::Ready);
    let (_, task) = dispatcher
        .snapshot()
        .task(&EntityId::from("t1"))
        .expect("task");
    assert!(task.has_comment(&EntityId::from("c9")));
    assert_eq!(task.comments.len(), 3);
}

#[test]
fn older_load_settling_last_is_discarded() {
    let transport = ScriptedTransport::new();
    let mut dispatcher = loaded(&transport);
    let gate = Gate::default();
    transport.respond_after("GetOrganizations", &gate, acme_tree());
    let mut newer = acme_tree();
    newer["organizations"][1]["projects"] =
        json!([{"id": "p7", "name": "Moonshot", "status": "PLANNED", "tasks": []}]);
    transport.respond("GetOrganizations", newer);

    let older = dispatcher.begin_load();
    while transport.requests().len() < 2 {
        std::thread::yield_now();
    }
    let latest = dispatcher.begin_load();
    dispatcher.wait(latest).expect("newer load");
    assert!(dispatcher.snapshot().project(&EntityId::from("p7")).is_some());

    gate.open();
    match dispatcher.wait(older).expect("older load") {
        Settled::Loaded { result, .. } => assert!(result.is_ok()),
        other => panic!("expected a load, got {other:?}"),
    }
    assert!(dispatcher.snapshot().project(&EntityId::from("p7")).is_some());
    assert_eq!(dispatcher.store().load_state(), &LoadState::Ready);
}

#[test]
fn superseded_load_failure_leaves_state_ready() {
    let transport = ScriptedTransport::new();
    let mut dispatcher = loaded(&transport);
    let gate = Gate::default();
    transport.graphql_error_after("GetOrganizations", &gate, "backend restarting");
    transport.respond("GetOrganizations", acme_tree());

    let older = dispatcher.begin_load();
    while transport.requests().len() < 2 {
        std::thread::yield_now();
    }
    let latest = dispatcher.begin_load();
    dispatcher.wait(latest).expect("newer load");

    gate.open();
    let _ = dispatcher.wait(older);
    assert_eq!(dispatcher.store().load_state(), &LoadState::Ready);
    assert!(dispatcher.notices().latest().is_none());
}
