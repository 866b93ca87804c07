use super::goalkeeper::{Goalkeeper, MatchReferee};
use crate::config::Config;
use crate::intercom::TeammateCommand;
use crate::node::*;
use crate::perception::RangeSensor;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{Receiver, Sender};
use tokio::sync::Mutex;

pub struct KeeperState {
    keeper: Goalkeeper,
    referee: Box<dyn MatchReferee>,
    drop_tx: Sender<()>,
    intercepts: usize,
}

pub struct KeeperNode {
    drop_rx: Receiver<()>,
    state: Arc<Mutex<KeeperState>>,
    command_rx: Receiver<TeammateCommand>,
    tick: Duration,
}

fn defend(mut state: State<KeeperState>) -> NodeResult {
    if state.referee.is_match_over() {
        log::info!("Match over after {} intercepts", state.intercepts);
        if state.drop_tx.send(()).is_err() {
            log::warn!("No node left to stop");
        }
        return Ok(ThreadNext::Terminate);
    }

    if let Some(y) = state.keeper.step() {
        state.intercepts += 1;
        let pose = *state.keeper.pose();
        log::info!(
            "Intercept {} at y = {:.2}, keeper now at ({:.2}, {:.2})",
            state.intercepts,
            y,
            pose.x,
            pose.y
        );
    }

    Ok(ThreadNext::Next)
}

fn on_teammate_command(command: TeammateCommand, mut state: State<KeeperState>) -> NodeResult {
    state.keeper.apply(command);
    Ok(ThreadNext::Next)
}

pub fn create(
    config: &Config,
    laser: Box<dyn RangeSensor>,
    referee: Box<dyn MatchReferee>,
    command_rx: Receiver<TeammateCommand>,
    drop_tx: &Sender<()>,
) -> KeeperNode {
    KeeperNode {
        drop_rx: drop_tx.subscribe(),
        command_rx,
        tick: Duration::from_millis(config.keeper.tick_ms.max(1)),
        state: Arc::new(Mutex::new(KeeperState {
            keeper: Goalkeeper::new(config.field, &config.keeper, laser),
            referee,
            drop_tx: drop_tx.clone(),
            intercepts: 0,
        })),
    }
}

impl Node<KeeperState> for KeeperNode {
    fn get_state_handle(&self) -> Arc<Mutex<KeeperState>> {
        self.state.clone()
    }

    fn get_drop_rx(&self) -> Receiver<()> {
        self.drop_rx.resubscribe()
    }
}

#[async_trait]
impl Executor for KeeperNode {
    fn name(&self) -> &str {
        "Keeper"
    }

    async fn init(&self) -> Handles {
        vec![]
    }

    async fn run(&self) -> Handles {
        vec![
            self.every(self.tick, defend),
            self.subscribe(self.command_rx.resubscribe(), on_teammate_command),
        ]
    }

    async fn stop(&self) -> Handles {
        vec![]
    }
}
