//! Worker envelope
//!
//! The transport a host uses to run `optimize` off its main thread is
//! explicitly out of scope, but the wire shape of requests/responses is
//! a stable contract (`spec.md` §6). `spawn_worker` is a reference
//! `std::thread` dispatcher: real hosts are free to replace it with a
//! web worker, an actor, or whatever fits, as long as they speak this
//! envelope.

use std::sync::mpsc;
use std::thread;

use serde::{Deserialize, Serialize};

use crate::evaluator::Objective;
use crate::orchestrator::{optimize, Constraints, OptimizerContext, OptimizerOptions, OptimizerResult};
use crate::player::Player;
use crate::progress::ProgressEvent;

/// Monotonic id attached to every in-flight request so a host can drop
/// responses to requests it has since superseded (`spec.md` §5).
pub type SequenceId = u64;

/// Everything `optimize` needs that travels with one request: the
/// player, the opaque monster value, combat style, objective, and
/// constraints. The catalog/calculator/stores are process-local
/// collaborators the host supplies when it constructs the worker, not
/// part of the message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeRequestData<M> {
    pub player: Player,
    pub monster: M,
    pub combat_style: Option<crate::catalog::CombatStyle>,
    pub objective: Objective,
    pub constraints: Constraints,
}

/// Discriminant for `WorkerRequest`'s `type` field. A single variant
/// today; kept as an enum (rather than a bare string literal) so a
/// second request kind can be added without breaking the wire shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestKind {
    #[serde(rename = "OPTIMIZE")]
    Optimize,
}

/// Inbound request to run one optimization (`spec.md` §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerRequest<M> {
    #[serde(rename = "type")]
    pub kind: RequestKind,
    pub sequence_id: SequenceId,
    pub data: OptimizeRequestData<M>,
}

/// Outbound message, tagged by `type` (`spec.md` §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkerResponse {
    #[serde(rename = "OPTIMIZE_PROGRESS")]
    Progress {
        sequence_id: SequenceId,
        event: ProgressEvent,
    },
    #[serde(rename = "OPTIMIZE")]
    Complete {
        sequence_id: SequenceId,
        result: Result<OptimizerResult, String>,
    },
}

impl WorkerResponse {
    pub fn sequence_id(&self) -> SequenceId {
        match self {
            WorkerResponse::Progress { sequence_id, .. } => *sequence_id,
            WorkerResponse::Complete { sequence_id, .. } => *sequence_id,
        }
    }
}

/// Run `optimize` on a dedicated thread, streaming `Progress` responses
/// and a single terminal `Complete` response over `mpsc`. Mirrors the
/// teacher's pattern of a per-connection worker loop fed by message
/// passing (`net/session.rs`), minus the async runtime the engine has
/// no use for.
///
/// `ctx` must be `'static` because it crosses the thread boundary —
/// callers typically build it from `Arc`-owned catalog data and the
/// process-wide `PriceStore::global()`/`RequirementStore::global()`
/// singletons.
pub fn spawn_worker<M>(
    request: WorkerRequest<M>,
    ctx: OptimizerContext<'static, M>,
) -> (thread::JoinHandle<()>, mpsc::Receiver<WorkerResponse>)
where
    M: Send + Sync + 'static,
{
    let (tx, rx) = mpsc::channel();
    let sequence_id = request.sequence_id;

    let handle = thread::spawn(move || {
        let data = request.data;
        let progress_tx = tx.clone();
        let mut on_progress = move |event: ProgressEvent| {
            // A stale send (receiver already dropped because the host
            // moved on to a newer request) is not this worker's
            // problem to report.
            let _ = progress_tx.send(WorkerResponse::Progress { sequence_id, event });
        };

        let options = OptimizerOptions {
            combat_style: data.combat_style,
            objective: data.objective,
            constraints: data.constraints,
            on_progress: Some(&mut on_progress),
        };

        let result = optimize(&data.player, &data.monster, &ctx, options).map_err(|e| e.to_string());
        let _ = tx.send(WorkerResponse::Complete { sequence_id, result });
    });

    (handle, rx)
}

/// Drop stale responses whose `sequence_id` doesn't match the latest
/// request a host has issued (`spec.md` §5).
pub fn is_stale(response: &WorkerResponse, latest_sequence_id: SequenceId) -> bool {
    response.sequence_id() != latest_sequence_id
}
