use std::{collections::HashMap, fmt::Display, future::Future, sync::Arc};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, warn, Instrument};

use crate::store::{entities::StudyRecord, RemoteStore};

use super::{
    operations,
    state::{AppState, EntryId, FormState, StateDelta},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to an operation running in the background. Dropping it doesn't stop the operation.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: TaskId,
    token: CancellationToken,
}

impl TaskHandle {
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Stops waiting for the store. Whatever the store already did stays done, the local state
    /// just won't reflect it.
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

#[derive(Debug)]
struct Completion {
    task: TaskId,
    /// Empty for cancelled tasks.
    delta: Option<StateDelta>,
}

/// Owns [AppState] and runs operations against the store. Every operation is an independent
/// task, operations are never queued behind each other and their results are applied in the
/// order they finish.
pub struct Controller {
    state: AppState,
    store: Arc<dyn RemoteStore>,
    sender: mpsc::UnboundedSender<Completion>,
    receiver: mpsc::UnboundedReceiver<Completion>,
    pending: HashMap<TaskId, CancellationToken>,
    next_task: u64,
    started: bool,
}

impl Controller {
    pub fn new(store: Arc<dyn RemoteStore>, state: AppState) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            state,
            store,
            sender,
            receiver,
            pending: HashMap::new(),
            next_task: 0,
            started: false,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Form inputs can be edited at any moment, including while operations are pending.
    pub fn form_mut(&mut self) -> &mut FormState {
        &mut self.state.form
    }

    /// Number of operations that haven't reported back yet.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Loads every record from the store. Only the first call does anything.
    pub fn start(&mut self) -> Option<TaskHandle> {
        if self.started {
            warn!("Records were already loaded, ignoring repeated start");
            return None;
        }
        self.started = true;
        Some(self.spawn("load", |store| async move {
            operations::load(store.as_ref()).await
        }))
    }

    /// Registers whatever is currently in the form. Invalid input is reported right away and
    /// never reaches the store.
    pub fn submit(&mut self) -> Option<TaskHandle> {
        let record = match operations::validate(&self.state.form) {
            Ok(record) => record,
            Err(e) => {
                debug!("Rejected form input {:?}: {e}", self.state.form);
                self.state.apply(StateDelta::Failed(e.into()));
                return None;
            }
        };
        self.state.apply(StateDelta::ClearError);
        Some(self.spawn("register", |store| async move {
            operations::register(record, store.as_ref()).await
        }))
    }

    /// Deletes the record shown under `id`, together with every other record sharing its title
    /// and time. Unknown ids are ignored.
    pub fn delete(&mut self, id: EntryId) -> Option<TaskHandle> {
        let Some(entry) = self.state.entry(id) else {
            debug!("No entry with id {id}");
            return None;
        };
        let target = entry.record.clone();
        Some(self.delete_matching(target))
    }

    /// Deletes records by their (title, time) pair, whether they are held locally or not.
    pub fn delete_matching(&mut self, target: StudyRecord) -> TaskHandle {
        self.spawn("delete", |store| async move {
            operations::delete(target, store.as_ref()).await
        })
    }

    /// Waits for the next operation to finish and applies its result. Returns [None] right away
    /// when nothing is pending.
    pub async fn next_completion(&mut self) -> Option<TaskId> {
        if self.pending.is_empty() {
            return None;
        }
        // The controller keeps a sender around, so the channel never closes here.
        let Completion { task, delta } = self.receiver.recv().await?;
        self.pending.remove(&task);
        match delta {
            Some(delta) => self.state.apply(delta),
            None => debug!("Task {task} was cancelled"),
        }
        Some(task)
    }

    /// Applies results until no operation is pending.
    pub async fn settle(&mut self) {
        while self.next_completion().await.is_some() {}
    }

    pub fn cancel_all(&self) {
        for token in self.pending.values() {
            token.cancel();
        }
    }

    fn spawn<F>(
        &mut self,
        kind: &'static str,
        operation: impl FnOnce(Arc<dyn RemoteStore>) -> F,
    ) -> TaskHandle
    where
        F: Future<Output = StateDelta> + Send + 'static,
    {
        let id = TaskId(self.next_task);
        self.next_task += 1;

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let sender = self.sender.clone();
        let operation = operation(self.store.clone());

        let span = info_span!("operation", kind, task = %id);
        tokio::spawn(
            async move {
                let delta = tokio::select! {
                    _ = cancelled.cancelled() => None,
                    delta = operation => Some(delta),
                };
                if sender.send(Completion { task: id, delta }).is_err() {
                    debug!("Controller is gone, dropping result");
                }
            }
            .instrument(span),
        );

        self.pending.insert(id, token.clone());
        TaskHandle { id, token }
    }
}
