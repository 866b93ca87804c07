use async_trait::async_trait;
use futures::future::join_all;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::broadcast::Receiver;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;

pub type State<'a, S> = MutexGuard<'a, S>;
pub type DynFut<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, PartialEq, Eq)]
pub enum ThreadNext {
    Next,
    Terminate,
}

#[derive(Debug)]
pub struct ThreadError {
    pub msg: String,
}

impl From<crate::error::KeeperError> for ThreadError {
    fn from(err: crate::error::KeeperError) -> ThreadError {
        ThreadError {
            msg: err.to_string(),
        }
    }
}

pub type NodeResult = Result<ThreadNext, ThreadError>;
pub type Handles = Vec<JoinHandle<NodeResult>>;

/// True once the drop signal has been sent, or its sender is gone.
pub fn dropped(drop_rx: &mut Receiver<()>) -> bool {
    !matches!(drop_rx.try_recv(), Err(TryRecvError::Empty))
}

pub trait Node<S: Send + 'static> {
    fn get_state_handle(&self) -> Arc<Mutex<S>>;
    fn get_drop_rx(&self) -> Receiver<()>;

    /// Runs `f` once with the locked state.
    fn once(
        &self,
        f: for<'a> fn(State<'a, S>) -> DynFut<'a, NodeResult>,
    ) -> JoinHandle<NodeResult> {
        let state = self.get_state_handle();
        tokio::spawn(async move {
            let guard = state.lock().await;
            f(guard).await
        })
    }

    /// Calls `f` every `period` until it terminates or the node is dropped.
    /// The state is locked only for the duration of each call.
    fn every(
        &self,
        period: Duration,
        f: for<'a> fn(State<'a, S>) -> NodeResult,
    ) -> JoinHandle<NodeResult> {
        let state = self.get_state_handle();
        let mut drop_rx = self.get_drop_rx();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = drop_rx.recv() => {
                        return Ok(ThreadNext::Terminate);
                    },
                    _ = interval.tick() => {
                        let guard = state.lock().await;
                        if f(guard)? == ThreadNext::Terminate {
                            return Ok(ThreadNext::Terminate);
                        }
                    }
                }
            }
        })
    }

    /// Feeds every message from `rx` to `f` until the channel closes or the node is dropped.
    fn subscribe<T: Clone + Send + 'static>(
        &self,
        mut rx: Receiver<T>,
        f: for<'a> fn(T, State<'a, S>) -> NodeResult,
    ) -> JoinHandle<NodeResult> {
        let state = self.get_state_handle();
        let mut drop_rx = self.get_drop_rx();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = drop_rx.recv() => {
                        return Ok(ThreadNext::Terminate);
                    },
                    msg = rx.recv() => {
                        match msg {
                            Ok(inner) => {
                                let guard = state.lock().await;
                                if f(inner, guard)? == ThreadNext::Terminate {
                                    return Ok(ThreadNext::Terminate);
                                }
                            },
                            Err(RecvError::Lagged(cnt)) => {
                                log::warn!(
                                    "Subscriber lagged {} messages, silently ignoring this.",
                                    cnt
                                );
                            },
                            Err(RecvError::Closed) => {
                                return Ok(ThreadNext::Terminate);
                            }
                        }
                    }
                }
            }
        })
    }
}

#[async_trait]
pub trait Executor: Send + Sync {
    fn name(&self) -> &str;
    async fn init(&self) -> Handles;
    async fn run(&self) -> Handles;
    async fn stop(&self) -> Handles;
}

async fn join_phase(phase: &str, nodes: &[Box<dyn Executor>], handles: Vec<(usize, Handles)>) {
    for (index, node_handles) in handles {
        for result in join_all(node_handles).await {
            match result {
                Ok(Ok(_)) => {}
                Ok(Err(err)) => {
                    log::error!("{} failed during {}: {}", nodes[index].name(), phase, err.msg)
                }
                Err(err) => {
                    log::error!("{} panicked during {}: {}", nodes[index].name(), phase, err)
                }
            }
        }
    }
}

/// Drives all nodes through init, run and stop. Each phase waits for every
/// task of the previous one.
pub async fn execute_nodes(nodes: Vec<Box<dyn Executor>>) {
    log::info!("Initializing {} nodes...", nodes.len());
    let mut handles = Vec::new();
    for (index, node) in nodes.iter().enumerate() {
        handles.push((index, node.init().await));
    }
    join_phase("init", &nodes, handles).await;

    log::info!("Running nodes...");
    let mut handles = Vec::new();
    for (index, node) in nodes.iter().enumerate() {
        handles.push((index, node.run().await));
    }
    join_phase("run", &nodes, handles).await;

    log::info!("Stopping nodes...");
    let mut handles = Vec::new();
    for (index, node) in nodes.iter().enumerate() {
        handles.push((index, node.stop().await));
    }
    join_phase("stop", &nodes, handles).await;
    log::info!("All nodes stopped.");
}
