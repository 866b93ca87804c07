#![allow(dead_code)]
mod config;
mod error;
mod field;
mod intercom;
mod keeper;
mod math;
mod motion;
mod node;
mod perception;
mod trajectory;

use config::Config;
use env_logger::Env;
use keeper::{Goalkeeper, TimedMatch};
use node::{dropped, execute_nodes};
use perception::RangeSensor;
use std::io::Write;
use std::time::Duration;
use tokio::sync::broadcast;

#[cfg(not(feature = "simulation"))]
compile_error!("no range sensor backend, build with the `simulation` feature");

#[cfg(feature = "simulation")]
fn create_laser(config: &Config) -> Box<dyn RangeSensor> {
    Box::new(perception::SimulatedLaser::new(config.field, &config.simulation))
}

fn custom_ctrlc_handler(ctrlc_tx: broadcast::Sender<()>) -> Result<(), ctrlc::Error> {
    let mut ctrlc_sent = false;
    ctrlc::set_handler(move || {
        if !ctrlc_sent {
            log::warn!("CTRL-C received, drop signal sent, press again to terminate forcefully");
            if ctrlc_tx.send(()).is_err() {
                log::warn!("Nothing left running to stop");
            }
            ctrlc_sent = true;
        } else {
            log::warn!("CTRL-C received again, terminating forcefully");
            std::process::exit(1);
        }
    })
}

fn match_duration(config: &Config) -> Duration {
    Duration::from_secs(config.match_settings.duration_secs)
}

/// Runs the keeper loop directly on a blocking thread, without intercom.
async fn drill(config: Config, mut drop_rx: broadcast::Receiver<()>) {
    let duration = match_duration(&config);
    log::info!("Drill for {:?}", duration);

    let handle = tokio::task::spawn_blocking(move || {
        let mut keeper = Goalkeeper::new(config.field, &config.keeper, create_laser(&config));
        let referee = TimedMatch::new(duration);
        keeper.run(&referee, &mut || dropped(&mut drop_rx))
    });

    match handle.await {
        Ok(intercepts) => log::info!("Drill finished with {} intercepts", intercepts),
        Err(err) => log::error!("Drill panicked: {}", err),
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {} - {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    let config = match config::read_from_disk() {
        Ok(config) => config,
        Err(err) => {
            log::error!("{}", err);
            std::process::exit(1);
        }
    };

    let (drop_tx, _) = broadcast::channel(1);

    if config.drill {
        let drop_rx = drop_tx.subscribe();
        if let Err(err) = custom_ctrlc_handler(drop_tx) {
            log::error!("Cannot install CTRL-C handler: {}", err);
            std::process::exit(1);
        }
        drill(config, drop_rx).await;
        return;
    }

    log::info!("Creating nodes....");
    let radio = intercom::TcpRadio::new(config.intercom.master, config.intercom.port);
    let intercom = intercom::create(&config, Box::new(radio), &drop_tx);
    let keeper = keeper::create(
        &config,
        create_laser(&config),
        Box::new(TimedMatch::new(match_duration(&config))),
        intercom.command_tx.subscribe(),
        &drop_tx,
    );

    if let Err(err) = custom_ctrlc_handler(drop_tx) {
        log::error!("Cannot install CTRL-C handler: {}", err);
        std::process::exit(1);
    }

    execute_nodes(vec![Box::new(intercom), Box::new(keeper)]).await;
}
