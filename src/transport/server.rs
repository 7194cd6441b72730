use super::{
    wire::{self, Request, Response},
    Registry,
};
use crate::{Store, TransportError};

use std::{
    io::{BufReader, BufWriter},
    net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};
use tracing::{debug, info, warn};

/// Publishes a [`Store`] on a TCP listener.
pub struct Server {
    store: Arc<Store>,
    listener: TcpListener,
}

/// A running server. Dropping it leaves the server running; call
/// [`ServerHandle::stop`] to stop accepting.
pub struct ServerHandle {
    addr: SocketAddr,
    name: String,
    registry: Registry,
    stopping: Arc<AtomicBool>,
    accept: Option<JoinHandle<()>>,
}

impl Server {
    pub fn bind<A: ToSocketAddrs>(store: Arc<Store>, addr: A) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)?;
        Ok(Self { store, listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.listener.local_addr()?)
    }

    /// Registers the bound address under `name` and starts accepting
    /// connections on a background thread.
    pub fn serve(self, registry: &Registry, name: &str) -> Result<ServerHandle, TransportError> {
        let addr = self.local_addr()?;
        let stopping = Arc::new(AtomicBool::new(false));

        let accept = {
            let stopping = stopping.clone();
            thread::Builder::new()
                .name("listd-accept".into())
                .spawn(move || self.accept_loop(&stopping))?
        };

        registry.rebind(name, addr);
        info!(%addr, name, "store published");

        Ok(ServerHandle {
            addr,
            name: name.to_owned(),
            registry: registry.clone(),
            stopping,
            accept: Some(accept),
        })
    }

    fn accept_loop(self, stopping: &AtomicBool) {
        let mut backoff = AcceptBackoff::default();
        for stream in self.listener.incoming() {
            if stopping.load(Ordering::Acquire) {
                break;
            }
            let stream = match stream {
                Ok(s) => {
                    backoff.reset();
                    s
                }
                Err(e) => {
                    // usually fd exhaustion, which persists until a
                    // connection closes
                    let delay = backoff.next_delay();
                    warn!(%e, delay_ms = delay.as_millis() as u64, "accept failed");
                    thread::sleep(delay);
                    continue;
                }
            };
            let store = self.store.clone();
            let spawned = thread::Builder::new()
                .name("listd-conn".into())
                .spawn(move || {
                    let peer = stream.peer_addr().ok();
                    debug!(?peer, "connection opened");
                    if let Err(e) = handle_connection(&store, stream) {
                        warn!(?peer, %e, "connection failed");
                    }
                    debug!(?peer, "connection closed");
                });
            if let Err(e) = spawned {
                warn!(%e, "could not spawn connection thread");
            }
        }
    }
}

const MIN_ACCEPT_BACKOFF: Duration = Duration::from_millis(5);
const MAX_ACCEPT_BACKOFF: Duration = Duration::from_secs(1);

/// Delay between consecutive failed accepts, doubling up to a ceiling.
#[derive(Debug, Default)]
struct AcceptBackoff {
    failures: u32,
}

impl AcceptBackoff {
    fn next_delay(&mut self) -> Duration {
        let delay = MIN_ACCEPT_BACKOFF
            .checked_mul(1 << self.failures.min(16))
            .map_or(MAX_ACCEPT_BACKOFF, |d| d.min(MAX_ACCEPT_BACKOFF));
        self.failures = self.failures.saturating_add(1);
        delay
    }

    fn reset(&mut self) {
        self.failures = 0;
    }
}

/// Serves one connection until the peer hangs up.
fn handle_connection(store: &Store, stream: TcpStream) -> Result<(), TransportError> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut writer = BufWriter::new(stream);
    let mut buf = Vec::new();

    loop {
        let resp = match wire::read_frame(&mut reader, &mut buf, wire::MAX_FRAME) {
            Ok(None) => break,
            Ok(Some(line)) if line.is_empty() => continue,
            Ok(Some(line)) => match serde_json::from_slice::<Request>(line) {
                Ok(req) => req.apply(store),
                Err(e) => {
                    warn!(%e, "malformed request");
                    Response::Err(format!("malformed request: {}", e))
                }
            },
            Err(TransportError::FrameTooLarge(limit)) => {
                warn!(limit, "oversized request");
                Response::Err(format!("request exceeds {} bytes", limit))
            }
            Err(e) => return Err(e),
        };
        wire::write_frame(&mut writer, &resp)?;
    }

    Ok(())
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Unpublishes the store and stops accepting. Open connections are
    /// served until their peers hang up.
    pub fn stop(mut self) {
        self.registry.unbind(&self.name);
        self.stopping.store(true, Ordering::Release);
        // wake the accept loop so it sees the flag
        let _ = TcpStream::connect(self.addr);
        if let Some(accept) = self.accept.take() {
            let _ = accept.join();
        }
        info!(addr = %self.addr, "server stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_backoff_doubles_to_a_ceiling() {
        let mut backoff = AcceptBackoff::default();
        let delays = (0..12).map(|_| backoff.next_delay()).collect::<Vec<_>>();

        assert_eq!(delays[0], MIN_ACCEPT_BACKOFF);
        assert_eq!(delays[1], MIN_ACCEPT_BACKOFF * 2);
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*delays.last().unwrap(), MAX_ACCEPT_BACKOFF);

        for _ in 0..100 {
            assert!(backoff.next_delay() <= MAX_ACCEPT_BACKOFF);
        }

        backoff.reset();
        assert_eq!(backoff.next_delay(), MIN_ACCEPT_BACKOFF);
    }
}
