use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::mpsc;

/// Teammate radio. `receive` waits for the next message; `None` means the
/// link is gone for good.
#[async_trait]
pub trait Radio: Send {
    async fn receive(&mut self) -> Option<String>;
}

/// Radio fed from an in-process channel.
pub struct ChannelRadio {
    rx: mpsc::Receiver<String>,
}

impl ChannelRadio {
    pub fn new(capacity: usize) -> (mpsc::Sender<String>, ChannelRadio) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, ChannelRadio { rx })
    }
}

#[async_trait]
impl Radio for ChannelRadio {
    async fn receive(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

/// `\0`-framed UTF-8 messages over TCP on localhost. The master accepts a
/// teammate connection, a slave dials the master; both reconnect when the
/// peer goes away.
pub struct TcpRadio {
    master: bool,
    port: u32,
    listener: Option<TcpListener>,
    stream: Option<BufReader<TcpStream>>,
}

impl TcpRadio {
    pub fn new(master: bool, port: u32) -> TcpRadio {
        TcpRadio {
            master,
            port,
            listener: None,
            stream: None,
        }
    }

    /// Master radio with its listener bound up front. Port 0 lets the OS
    /// pick a free port, see `port`.
    pub async fn bind(port: u32) -> std::io::Result<TcpRadio> {
        let mut radio = TcpRadio::new(true, port);
        let listener = TcpListener::bind(radio.address()).await?;
        radio.port = u32::from(listener.local_addr()?.port());
        log::info!("Master intercom accepting connections at {}", radio.address());
        radio.listener = Some(listener);
        Ok(radio)
    }

    pub fn port(&self) -> u32 {
        self.port
    }

    fn address(&self) -> String {
        "127.0.0.1:".to_owned() + &self.port.to_string()
    }

    async fn accept(&mut self) -> std::io::Result<TcpStream> {
        if self.listener.is_none() {
            let listener = TcpListener::bind(self.address()).await?;
            log::info!("Master intercom accepting connections at {}", self.address());
            self.listener = Some(listener);
        }

        match &self.listener {
            Some(listener) => listener.accept().await.map(|(stream, _)| stream),
            None => Err(std::io::ErrorKind::NotConnected.into()),
        }
    }

    async fn connect(&self) -> TcpStream {
        loop {
            let attempt = match self.address().parse::<std::net::SocketAddr>() {
                Ok(addr) => match TcpSocket::new_v4() {
                    Ok(socket) => socket.connect(addr).await,
                    Err(err) => Err(err),
                },
                Err(err) => Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, err)),
            };

            match attempt {
                Ok(stream) => return stream,
                Err(err) => {
                    log::warn!("Slave cannot connect to master, error is {}", err);
                    tokio::time::sleep(Duration::from_millis(1500)).await;
                }
            }
        }
    }
}

#[async_trait]
impl Radio for TcpRadio {
    async fn receive(&mut self) -> Option<String> {
        loop {
            if self.stream.is_none() {
                let stream = if self.master {
                    match self.accept().await {
                        Ok(stream) => stream,
                        Err(err) => {
                            log::error!("Intercom cannot accept connections: {}", err);
                            return None;
                        }
                    }
                } else {
                    self.connect().await
                };
                log::info!("Intercom connected");
                self.stream = Some(BufReader::new(stream));
            }

            let Some(stream) = self.stream.as_mut() else {
                continue;
            };

            let mut frame = Vec::new();
            let read = stream.read_until(b'\0', &mut frame).await;
            match read {
                Ok(0) | Err(_) => {
                    log::info!("Intercom reset connection");
                    self.stream = None;
                }
                Ok(_) => {
                    if frame.last() == Some(&b'\0') {
                        frame.pop();
                    }
                    let message = String::from_utf8_lossy(&frame);
                    let message = message.trim_end_matches(['\r', '\n']);
                    if !message.is_empty() {
                        return Some(message.to_owned());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn channel_radio_delivers_in_order() {
        let (tx, mut radio) = ChannelRadio::new(4);
        tx.send("Go to base".to_owned()).await.unwrap();
        tx.send("position: 1,2".to_owned()).await.unwrap();
        drop(tx);

        assert_eq!(radio.receive().await.as_deref(), Some("Go to base"));
        assert_eq!(radio.receive().await.as_deref(), Some("position: 1,2"));
        assert_eq!(radio.receive().await, None);
    }

    #[tokio::test]
    async fn tcp_radio_splits_frames() {
        let mut master = TcpRadio::bind(0).await.unwrap();
        let port = master.port();
        assert_ne!(port, 0);

        let sender = tokio::spawn(async move {
            let mut teammate = TcpRadio::new(false, port).connect().await;
            teammate
                .write_all(b"position: 3,4\0ball at the left corner\0")
                .await
                .unwrap();
        });

        assert_eq!(master.receive().await.as_deref(), Some("position: 3,4"));
        assert_eq!(
            master.receive().await.as_deref(),
            Some("ball at the left corner")
        );
        sender.await.unwrap();
    }
}
