//! Actor Execution Kernel
//!
//! Message-driven actors with strictly sequential per-instance semantics on
//! top of an externally owned scheduler. The kernel owns no threads.
//!
//! # Architecture
//!
//! ```text
//!  producers (any thread)                      scheduler (any thread)
//!  ──────────────────────                      ──────────────────────
//!  process(sender, payload)                    work()
//!    │ resolve type / decode bytes               │ CAS busy false→true ── lost? return
//!    │ push InternalMessage ───► Mailbox ──────► │ pop ≤ batch_size, thread state
//!    └ kick() ─────────────────► schedule(job)   │ clear busy
//!                                                └ mailbox non-empty? kick()
//! ```
//!
//! - **identity**: [`ActorId`], [`ActorPid`]
//! - **messages / error**: [`MessagePayload`], [`MessageOrError`], [`ActorError`]
//! - **actor**: [`ActorBase`] delivery boundary and the [`Actor`] drain kernel
//! - **handler**: [`HandlerBase`], the dispatch / spawn / finish capabilities
//! - **runtime / local / transport**: collaborator traits and the in-process
//!   reference runtime
//!
//! # Example
//!
//! ```rust
//! use actor_kernel::{
//!     ActorConfig, HandlerBase, LocalRuntime, ManualScheduler, NoTransport, Runtime, RuntimeSettings,
//! };
//! use serde::{Deserialize, Serialize};
//! use std::sync::Arc;
//!
//! struct Greeter;
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! enum Greeting {
//!     Hello(String),
//! }
//!
//! impl ActorConfig for Greeter {
//!     type State = Vec<String>;
//!     type Message = Greeting;
//!     const TYPE_NAME: &'static str = "Greeter";
//!
//!     fn handle<R: Runtime>(mut handler: HandlerBase<'_, R, Vec<String>>, message: Greeting) -> Vec<String> {
//!         let Greeting::Hello(name) = message;
//!         handler.state.push(name);
//!         handler.into_state()
//!     }
//! }
//!
//! let scheduler = Arc::new(ManualScheduler::new());
//! let runtime = LocalRuntime::new(RuntimeSettings::default(), scheduler.clone(), Arc::new(NoTransport));
//!
//! let id = runtime.spawn::<Greeter>("_system", Vec::new(), Greeting::Hello("world".to_string()));
//! scheduler.run_until_idle();
//!
//! let snapshot = runtime.snapshot(id).unwrap();
//! assert_eq!(snapshot["state"][0], "world");
//! runtime.shutdown();
//! ```

pub mod actor;
pub mod config;
pub mod error;
pub mod handler;
pub mod identity;
pub mod local;
pub mod logging;
pub mod mailbox;
pub mod messages;
pub mod metrics;
pub mod runtime;
pub mod settings;
pub mod transport;

pub use actor::{Actor, ActorBase, ActorSnapshot, DEFAULT_BATCH_SIZE};
pub use config::ActorConfig;
pub use error::{ActorError, KernelError, Result};
pub use handler::HandlerBase;
pub use identity::{ActorId, ActorPid};
pub use local::LocalRuntime;
pub use logging::{init_tracing, LogFormat};
pub use mailbox::Mailbox;
pub use messages::{ActorMessage, InternalMessage, MessageOrError, MessagePayload};
pub use metrics::{RuntimeMetrics, RuntimeStats};
pub use runtime::{Job, ManualScheduler, Runtime, Scheduler, TokioScheduler};
pub use settings::RuntimeSettings;
pub use transport::{InProcessTransport, NoTransport, Transport};
