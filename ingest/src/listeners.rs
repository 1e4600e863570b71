//! UDP and TCP listener tasks. Neither touches the Store directly: a parsed
//! batch is handed to the consumer over the channel, or dropped with an
//! overflow count if the channel is full.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::{mpsc, watch, Semaphore};
use tracing::{debug, warn};

use tsdb_core::OverflowError;
use tsdb_parse::parse_payload;

use crate::message::Message;

const UDP_MAX_DATAGRAM: usize = 65_536;

fn try_enqueue(tx: &mpsc::Sender<Message>, overflow: &AtomicU64, payload: &[u8]) {
    match parse_payload(payload) {
        Ok(samples) => {
            if samples.is_empty() {
                return;
            }
            if let Err(mpsc::error::TrySendError::Full(_)) = tx.try_send(Message::SampleBatch(samples)) {
                overflow.fetch_add(1, Ordering::Relaxed);
                warn!(error = %OverflowError::QueueFull, "dropping payload");
            }
        }
        Err(err) => {
            warn!(error = %err, "dropping payload: parse failure");
        }
    }
}

pub async fn run_udp_listener(
    socket: UdpSocket,
    tx: mpsc::Sender<Message>,
    overflow: Arc<AtomicU64>,
    mut stop: watch::Receiver<bool>,
) {
    let mut buf = vec![0u8; UDP_MAX_DATAGRAM];
    loop {
        tokio::select! {
            res = socket.recv_from(&mut buf) => {
                match res {
                    Ok((n, _addr)) => try_enqueue(&tx, &overflow, &buf[..n]),
                    Err(err) => warn!(error = %err, "udp recv failed"),
                }
            }
            _ = stop.changed() => {
                debug!("udp listener stopping");
                break;
            }
        }
    }
}

pub async fn run_tcp_listener(
    listener: TcpListener,
    tx: mpsc::Sender<Message>,
    overflow: Arc<AtomicU64>,
    mut stop: watch::Receiver<bool>,
    connection_cap: usize,
) {
    let semaphore = Arc::new(Semaphore::new(connection_cap));
    loop {
        tokio::select! {
            res = listener.accept() => {
                match res {
                    Ok((mut conn, _addr)) => {
                        let permit = match semaphore.clone().try_acquire_owned() {
                            Ok(permit) => permit,
                            Err(_) => {
                                overflow.fetch_add(1, Ordering::Relaxed);
                                warn!("tcp connection cap reached, dropping connection");
                                continue;
                            }
                        };
                        let tx = tx.clone();
                        let overflow = overflow.clone();
                        tokio::spawn(async move {
                            let _permit = permit;
                            let mut body = Vec::new();
                            if let Err(err) = conn.read_to_end(&mut body).await {
                                warn!(error = %err, "tcp read failed");
                                return;
                            }
                            try_enqueue(&tx, &overflow, &body);
                        });
                    }
                    Err(err) => warn!(error = %err, "tcp accept failed"),
                }
            }
            _ = stop.changed() => {
                debug!("tcp listener stopping");
                break;
            }
        }
    }
}
