use super::{
    wire::{self, Reply, Request, Response},
    Registry,
};
use crate::{ListService, Result, TransportError};
use parking_lot::Mutex;

use std::{
    io::{BufReader, BufWriter},
    net::{SocketAddr, TcpStream},
    time::Duration,
};

#[derive(Clone, Debug, Default)]
pub struct ClientConfig {
    /// Upper bound on a single call; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

struct Conn {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    buf: Vec<u8>,
}

/// A connection to a published store. Calls are serialized on the one
/// connection and never retried.
pub struct Client {
    conn: Mutex<Conn>,
}

impl Client {
    /// Resolves `name` through `registry` and connects.
    pub fn lookup(registry: &Registry, name: &str, config: &ClientConfig) -> Result<Self> {
        let addr = registry.lookup(name)?;
        Self::connect(addr, config)
    }

    pub fn connect(addr: SocketAddr, config: &ClientConfig) -> Result<Self> {
        let stream = match config.timeout {
            Some(t) => TcpStream::connect_timeout(&addr, t),
            None => TcpStream::connect(addr),
        }
        .map_err(TransportError::from)?;
        stream
            .set_read_timeout(config.timeout)
            .map_err(TransportError::from)?;
        stream
            .set_write_timeout(config.timeout)
            .map_err(TransportError::from)?;
        stream.set_nodelay(true).map_err(TransportError::from)?;

        let reader = BufReader::new(stream.try_clone().map_err(TransportError::from)?);
        let writer = BufWriter::new(stream);
        Ok(Self {
            conn: Mutex::new(Conn {
                reader,
                writer,
                buf: Vec::new(),
            }),
        })
    }

    fn call(&self, req: &Request) -> Result<Reply> {
        let mut conn = self.conn.lock();
        let Conn {
            reader,
            writer,
            buf,
        } = &mut *conn;

        wire::write_frame(writer, req)?;
        // replies are not capped; list_ids grows with the store
        let line = wire::read_frame(reader, buf, usize::MAX)?.ok_or(TransportError::Closed)?;
        let resp: Response = serde_json::from_slice(line).map_err(TransportError::from)?;
        resp.into_result()
    }
}

fn unexpected<T>(req: &Request) -> Result<T> {
    Err(TransportError::UnexpectedReply(req.name()).into())
}

impl ListService for Client {
    fn append(&self, list: &str, value: i32) -> Result<bool> {
        let req = Request::Append {
            list: list.to_owned(),
            value,
        };
        match self.call(&req)? {
            Reply::Appended(ok) => Ok(ok),
            _ => unexpected(&req),
        }
    }

    fn get(&self, list: &str, index: i32) -> Result<i32> {
        let req = Request::Get {
            list: list.to_owned(),
            index,
        };
        match self.call(&req)? {
            Reply::Value(v) => Ok(v),
            _ => unexpected(&req),
        }
    }

    fn remove(&self, list: &str) -> Result<i32> {
        let req = Request::Remove {
            list: list.to_owned(),
        };
        match self.call(&req)? {
            Reply::Value(v) => Ok(v),
            _ => unexpected(&req),
        }
    }

    fn size(&self, list: &str) -> Result<usize> {
        let req = Request::Size {
            list: list.to_owned(),
        };
        match self.call(&req)? {
            Reply::Size(n) => Ok(n),
            _ => unexpected(&req),
        }
    }

    fn list_ids(&self) -> Result<Vec<String>> {
        let req = Request::ListIds;
        match self.call(&req)? {
            Reply::ListIds(ids) => Ok(ids),
            _ => unexpected(&req),
        }
    }

    fn shutdown(&self) -> Result<()> {
        let req = Request::Shutdown;
        match self.call(&req)? {
            Reply::Ack => Ok(()),
            _ => unexpected(&req),
        }
    }
}
