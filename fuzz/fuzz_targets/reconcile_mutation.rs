#![no_main]

use libfuzzer_sys::fuzz_target;

use hub_core::Mutation;
use hub_core::load::decode_snapshot;
use hub_core::model::{EntityId, TaskStatus};

// Any payload a server sends must either fail to reconcile or produce a
// patch that is idempotent on the current tree.
fuzz_target!(|data: &[u8]| {
    let Ok(payload) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let Ok(mut tree) = decode_snapshot(&payload) else {
        return;
    };

    let mutations = [
        Mutation::CreateTask {
            project_id: EntityId::from("1"),
            title: "fuzz".into(),
            description: None,
            status: None,
        },
        Mutation::CreateComment {
            task_id: EntityId::from("1"),
            content: "fuzz".into(),
        },
        Mutation::UpdateTaskStatus {
            task_id: EntityId::from("1"),
            status: TaskStatus::Done,
        },
        Mutation::DeleteComment {
            comment_id: EntityId::from("1"),
        },
    ];

    for mutation in &mutations {
        if let Ok(patch) = mutation.reconcile(&payload) {
            patch.apply(&mut tree);
            let once = tree.clone();
            patch.apply(&mut tree);
            assert_eq!(once, tree);
        }
    }
});
