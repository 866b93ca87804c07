use super::handler::{interpret, TeammateCommand};
use super::radio::Radio;
use crate::config::Config;
use crate::field::Field;
use crate::node::*;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::select;
use tokio::sync::broadcast::{self, Receiver, Sender};
use tokio::sync::Mutex;

pub struct IntercomState {
    radio: Box<dyn Radio>,
    field: Field,
    command_tx: Sender<TeammateCommand>,
    drop_rx: Receiver<()>,
}

pub struct IntercomNode {
    pub command_tx: Sender<TeammateCommand>,
    state: Arc<Mutex<IntercomState>>,
    drop_rx: Receiver<()>,
}

fn dispatch(field: &Field, command_tx: &Sender<TeammateCommand>, message: &str) {
    log::debug!("Intercom received {:?}", message);
    if let Some(command) = interpret(message, field) {
        if command_tx.send(command).is_err() {
            log::warn!("Nobody listens for teammate commands, dropping {:?}", command);
        }
    }
}

fn listen(mut state: State<IntercomState>) -> DynFut<NodeResult> {
    Box::pin(async move {
        let IntercomState {
            radio,
            field,
            command_tx,
            drop_rx,
        } = &mut *state;

        loop {
            select! {
                _ = drop_rx.recv() => {
                    return Ok(ThreadNext::Terminate);
                },
                message = radio.receive() => {
                    match message {
                        Some(message) => dispatch(field, command_tx, &message),
                        None => {
                            log::info!("Intercom closed, no more teammate messages");
                            return Ok(ThreadNext::Terminate);
                        }
                    }
                }
            }
        }
    })
}

pub fn create(config: &Config, radio: Box<dyn Radio>, drop_tx: &Sender<()>) -> IntercomNode {
    let (command_tx, _) = broadcast::channel(32);

    IntercomNode {
        command_tx: command_tx.clone(),
        drop_rx: drop_tx.subscribe(),
        state: Arc::new(Mutex::new(IntercomState {
            radio,
            field: config.field,
            command_tx,
            drop_rx: drop_tx.subscribe(),
        })),
    }
}

impl Node<IntercomState> for IntercomNode {
    fn get_state_handle(&self) -> Arc<Mutex<IntercomState>> {
        self.state.clone()
    }

    fn get_drop_rx(&self) -> Receiver<()> {
        self.drop_rx.resubscribe()
    }
}

#[async_trait]
impl Executor for IntercomNode {
    fn name(&self) -> &str {
        "Intercom"
    }

    async fn init(&self) -> Handles {
        vec![]
    }

    async fn run(&self) -> Handles {
        vec![self.once(listen)]
    }

    async fn stop(&self) -> Handles {
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intercom::radio::ChannelRadio;
    use crate::math::Vec2;

    #[tokio::test]
    async fn forwards_commands_in_order() {
        let (drop_tx, _) = broadcast::channel(1);
        let (radio_tx, radio) = ChannelRadio::new(8);
        let node = create(&Config::default(), Box::new(radio), &drop_tx);
        let mut commands = node.command_tx.subscribe();

        for message in [
            "position: 3,4",
            "what is this",
            "position: x,4",
            "you are looking in the wrong direction",
            "Go to base",
        ] {
            radio_tx.send(message.to_owned()).await.unwrap();
        }
        drop(radio_tx);

        let handle = node.once(listen);
        assert_eq!(handle.await.unwrap().unwrap(), ThreadNext::Terminate);

        assert_eq!(
            commands.recv().await.unwrap(),
            TeammateCommand::TeammateAt(Vec2::new(3.0, 4.0))
        );
        assert_eq!(commands.recv().await.unwrap(), TeammateCommand::ReverseSearch);
        assert_eq!(
            commands.recv().await.unwrap(),
            TeammateCommand::Relocate(Vec2::new(5.0, 15.0))
        );
        assert!(commands.try_recv().is_err());
    }

    #[tokio::test]
    async fn drop_signal_stops_listening() {
        let (drop_tx, _) = broadcast::channel(1);
        let (_radio_tx, radio) = ChannelRadio::new(8);
        let node = create(&Config::default(), Box::new(radio), &drop_tx);

        let handles = node.run().await;
        drop_tx.send(()).unwrap();
        for result in futures::future::join_all(handles).await {
            assert_eq!(result.unwrap().unwrap(), ThreadNext::Terminate);
        }
    }
}
