#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Condvar, Mutex};

use hub_core::HubError;
use hub_core::graphql::{GraphqlRequest, GraphqlResponse};
use hub_core::transport::Transport;
use serde_json::{Value, json};

/// A latch a scripted response can wait on before it is returned.
#[derive(Clone, Default)]
pub struct Gate(Arc<(Mutex<bool>, Condvar)>);

impl Gate {
    pub fn open(&self) {
        let (lock, cvar) = &*self.0;
        *lock.lock().expect("gate lock") = true;
        cvar.notify_all();
    }

    fn wait(&self) {
        let (lock, cvar) = &*self.0;
        let mut open = lock.lock().expect("gate lock");
        while !*open {
            open = cvar.wait(open).expect("gate wait");
        }
    }
}

struct Scripted {
    gate: Option<Gate>,
    response: Result<GraphqlResponse, HubError>,
}

/// Transport that replays canned responses per operation name, in order.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<HashMap<String, VecDeque<Scripted>>>,
    seen: Mutex<Vec<GraphqlRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, operation: &str, data: Value) {
        self.push(operation, None, Ok(ok(data)));
    }

    pub fn respond_after(&self, operation: &str, gate: &Gate, data: Value) {
        self.push(operation, Some(gate.clone()), Ok(ok(data)));
    }

    pub fn graphql_error(&self, operation: &str, message: &str) {
        self.push(operation, None, Ok(error_response(message)));
    }

    pub fn graphql_error_after(&self, operation: &str, gate: &Gate, message: &str) {
        self.push(operation, Some(gate.clone()), Ok(error_response(message)));
    }

    pub fn fail(&self, operation: &str, err: HubError) {
        self.push(operation, None, Err(err));
    }

    pub fn requests(&self) -> Vec<GraphqlRequest> {
        self.seen.lock().expect("seen lock").clone()
    }

    fn push(&self, operation: &str, gate: Option<Gate>, response: Result<GraphqlResponse, HubError>) {
        self.script
            .lock()
            .expect("script lock")
            .entry(operation.to_string())
            .or_default()
            .push_back(Scripted { gate, response });
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: &GraphqlRequest) -> Result<GraphqlResponse, HubError> {
        let next = self
            .script
            .lock()
            .expect("script lock")
            .get_mut(request.operation_name)
            .and_then(VecDeque::pop_front);
        self.seen.lock().expect("seen lock").push(request.clone());
        let Some(next) = next else {
            return Err(HubError::Transport {
                endpoint: self.endpoint().to_string(),
                message: format!("no scripted response for {}", request.operation_name),
            });
        };
        if let Some(gate) = next.gate {
            gate.wait();
        }
        next.response
    }

    fn endpoint(&self) -> &str {
        "scripted://test"
    }
}

fn ok(data: Value) -> GraphqlResponse {
    GraphqlResponse {
        data: Some(data),
        errors: None,
    }
}

fn error_response(message: &str) -> GraphqlResponse {
    serde_json::from_value(json!({"data": null, "errors": [{"message": message}]}))
        .expect("error envelope")
}

/// Acme with one project ("Launch", id p1) holding task t1 and comments c1, c2.
pub fn acme_tree() -> Value {
    json!({
        "organizations": [{
            "id": "1", "name": "Acme", "slug": "acme",
            "projects": [{
                "id": "p1", "name": "Launch", "status": "ACTIVE",
                "tasks": [{
                    "id": "t1", "title": "Write spec", "status": "TODO",
                    "comments": [
                        {"id": "c1", "content": "first"},
                        {"id": "c2", "content": "second"}
                    ]
                }]
            }, {
                "id": "p2", "name": "Maintenance", "status": "PLANNED", "tasks": []
            }]
        }, {
            "id": "2", "name": "Globex", "slug": "globex", "projects": []
        }]
    })
}
