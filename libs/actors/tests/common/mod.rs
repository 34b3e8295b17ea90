//! Shared fixtures for the integration tests

#![allow(dead_code)]

use actor_kernel::{
    ActorConfig, ActorError, ActorId, ActorPid, ActorSnapshot, HandlerBase, LocalRuntime, ManualScheduler, NoTransport,
    Runtime, RuntimeSettings, Transport,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Actor that records everything it receives
pub struct Recorder;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Record {
    Item { seq: u64 },
    Forward { to: ActorPid, seq: u64 },
    SpawnChild { seq: u64 },
    Retire,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecorderState {
    pub received: Vec<(ActorPid, u64)>,
    pub errors: Vec<ActorError>,
    pub children: Vec<ActorId>,
}

impl ActorConfig for Recorder {
    type State = RecorderState;
    type Message = Record;
    const TYPE_NAME: &'static str = "Recorder";

    fn handle<R: Runtime>(mut handler: HandlerBase<'_, R, RecorderState>, message: Record) -> RecorderState {
        match message {
            Record::Item { seq } => {
                let sender = handler.sender().clone();
                handler.state.received.push((sender, seq));
            }
            Record::Forward { to, seq } => handler.dispatch(to, Record::Item { seq }),
            Record::SpawnChild { seq } => {
                let child = handler.spawn::<Recorder>(RecorderState::default(), Record::Item { seq });
                handler.state.children.push(child);
            }
            Record::Retire => handler.finish(),
        }
        handler.into_state()
    }

    fn handle_error<R: Runtime>(mut handler: HandlerBase<'_, R, RecorderState>, error: ActorError) -> RecorderState {
        handler.state.errors.push(error);
        handler.into_state()
    }
}

/// Runtime driven by hand through the returned scheduler
pub fn manual_runtime(server: &str) -> (Arc<ManualScheduler>, Arc<LocalRuntime>) {
    manual_runtime_with(server, Arc::new(NoTransport))
}

pub fn manual_runtime_with(server: &str, transport: Arc<dyn Transport>) -> (Arc<ManualScheduler>, Arc<LocalRuntime>) {
    let scheduler = Arc::new(ManualScheduler::new());
    let settings = RuntimeSettings::default().with_server(server);
    let runtime = LocalRuntime::new(settings, scheduler.clone(), transport);
    (scheduler, runtime)
}

/// PID of something outside the runtime, e.g. a client connection
pub fn outsider(server: &str, id: u64) -> ActorPid {
    ActorPid::new(server, "_system", ActorId::new(id))
}

pub fn recorder_state(runtime: &LocalRuntime, id: ActorId) -> RecorderState {
    let value = runtime.snapshot(id).expect("actor is registered");
    ActorSnapshot::<RecorderState>::from_value(value).unwrap().state
}
