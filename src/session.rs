//! Session: one accepted connection's read/write lifecycle
//!
//! A session owns its TCP stream and runs two duties as independent
//! tasks: the read duty turns incoming bytes into lines and hands them
//! to the room, the write duty drains the outbound queue back onto the
//! socket. Either duty failing tears the whole session down.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::codec;
use crate::config::RelayConfig;
use crate::participant::Participant;
use crate::room::Room;
use crate::types::SessionId;

/// One connected client.
///
/// The outbound mpsc channel doubles as FIFO queue and wake signal: the
/// write duty sleeps in `recv` until a message is enqueued. The watch
/// channel is the stop signal; it is level-triggered, so a duty that
/// starts waiting after the signal fired still observes it.
pub struct Session {
    id: SessionId,
    peer: String,
    room: Arc<Room>,
    outbound: mpsc::Sender<String>,
    stop: watch::Sender<bool>,
    /// Guards the teardown sequence so it runs exactly once
    stopped: AtomicBool,
}

impl Session {
    /// Take ownership of an accepted connection, join the room, and
    /// launch both duties. Returns the shared handle without waiting
    /// for either duty to finish.
    ///
    /// The room join happens before the duties start, so the backlog
    /// replay is queued ahead of any line the peer sends.
    pub fn spawn(stream: TcpStream, room: Arc<Room>, config: &RelayConfig) -> Arc<Session> {
        let peer = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        let (read_half, write_half) = stream.into_split();
        let (outbound_tx, outbound_rx) = mpsc::channel(config.outbound_queue);
        let (stop_tx, _) = watch::channel(false);

        let session = Arc::new(Session {
            id: SessionId::new(),
            peer,
            room: Arc::clone(&room),
            outbound: outbound_tx,
            stop: stop_tx,
            stopped: AtomicBool::new(false),
        });

        info!("session {} connected from {}", session.id, session.peer);

        room.join(session.clone());

        tokio::spawn(read_duty(
            session.clone(),
            read_half,
            config.max_line_bytes,
        ));
        tokio::spawn(write_duty(session.clone(), outbound_rx, write_half));

        session
    }

    /// This session's identity
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Run the stop sequence: revoke room membership, then raise the
    /// stop signal so both duties unblock and release their socket
    /// halves. Idempotent: safe to call from either duty, from
    /// `deliver`, or externally, any number of times.
    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            self.room.leave(self.id);
            info!("session {} disconnected", self.id);
        }
        self.stop.send_replace(true);
    }

    /// Raise the stop signal without touching room state.
    ///
    /// `deliver` runs with the room lock held and must not call back
    /// into the room; the woken duties run the full stop sequence.
    fn signal_stop(&self) {
        self.stop.send_replace(true);
    }
}

impl Participant for Session {
    fn id(&self) -> SessionId {
        self.id
    }

    fn deliver(&self, msg: &str) {
        match self.outbound.try_send(msg.to_string()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                // Bounded-queue policy: a peer that cannot keep up with
                // the room is disconnected rather than buffered forever.
                warn!("session {} outbound queue full, disconnecting slow consumer", self.id);
                self.signal_stop();
            }
            Err(TrySendError::Closed(_)) => {
                // Write duty already exited; the session is tearing down.
                self.signal_stop();
            }
        }
    }
}

/// Read duty: turn the byte stream into lines and broadcast each one.
///
/// Exits on end of stream, any read error (an oversized line counts),
/// or the stop signal, then runs the stop sequence.
async fn read_duty(session: Arc<Session>, read_half: OwnedReadHalf, max_line_bytes: usize) {
    let mut reader = BufReader::new(read_half);
    let mut stop_rx = session.stop.subscribe();
    let mut line = Vec::new();

    loop {
        tokio::select! {
            _ = stop_rx.wait_for(|stopping| *stopping) => break,
            read = codec::read_line_capped(&mut reader, &mut line, max_line_bytes) => {
                match read {
                    Ok(true) => {
                        // Strip only the delimiter; the write duty puts it
                        // back, so bytes pass through unchanged.
                        if line.last() == Some(&b'\n') {
                            line.pop();
                        }
                        let msg = String::from_utf8_lossy(&line);
                        session.room.broadcast(&msg);
                    }
                    Ok(false) => {
                        debug!("session {} reached end of stream", session.id);
                        break;
                    }
                    Err(e) => {
                        debug!("session {} read failed: {}", session.id, e);
                        break;
                    }
                }
            }
        }
    }

    session.stop();
    debug!("read duty ended for {}", session.id);
}

/// Write duty: drain the outbound queue onto the socket, one full line
/// at a time. Sleeps in `recv` while the queue is empty; the stop
/// signal interrupts both the sleep and an in-flight write.
async fn write_duty(
    session: Arc<Session>,
    mut outbound: mpsc::Receiver<String>,
    mut write_half: OwnedWriteHalf,
) {
    let mut stop_rx = session.stop.subscribe();
    let mut write_stop_rx = session.stop.subscribe();

    loop {
        tokio::select! {
            _ = async { let _ = stop_rx.wait_for(|stopping| *stopping).await; } => break,
            recv = outbound.recv() => {
                let Some(msg) = recv else { break };
                tokio::select! {
                    _ = write_stop_rx.wait_for(|stopping| *stopping) => break,
                    written = write_line(&mut write_half, &msg) => {
                        if let Err(e) = written {
                            debug!("session {} write failed: {}", session.id, e);
                            break;
                        }
                    }
                }
            }
        }
    }

    session.stop();
    // Orderly close: flush the FIN so the peer sees EOF, not a reset.
    let _ = write_half.shutdown().await;
    debug!("write duty ended for {}", session.id);
}

async fn write_line(write_half: &mut OwnedWriteHalf, msg: &str) -> std::io::Result<()> {
    write_half.write_all(msg.as_bytes()).await?;
    write_half.write_all(b"\n").await
}
