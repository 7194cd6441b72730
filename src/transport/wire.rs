//! Line-delimited JSON frames.
//!
//! Every call is one [`Request`] line answered by one [`Response`] line.
//! Failures carry only a message; callers get no structured error codes.

use crate::{Error, Result, Store, TransportError};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Read, Write};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Append { list: String, value: i32 },
    Get { list: String, index: i32 },
    Remove { list: String },
    Size { list: String },
    ListIds,
    Shutdown,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Reply {
    Appended(bool),
    Value(i32),
    Size(usize),
    ListIds(Vec<String>),
    Ack,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    Ok(Reply),
    Err(String),
}

impl Request {
    pub fn name(&self) -> &'static str {
        match self {
            Request::Append { .. } => "append",
            Request::Get { .. } => "get",
            Request::Remove { .. } => "remove",
            Request::Size { .. } => "size",
            Request::ListIds => "list_ids",
            Request::Shutdown => "shutdown",
        }
    }

    /// Runs this request against `store`.
    pub fn apply(self, store: &Store) -> Response {
        let res = match self {
            Request::Append { list, value } => Ok(Reply::Appended(store.append(&list, value))),
            Request::Get { list, index } => store.get(&list, index).map(Reply::Value),
            Request::Remove { list } => store.remove(&list).map(Reply::Value),
            Request::Size { list } => Ok(Reply::Size(store.size(&list))),
            Request::ListIds => Ok(Reply::ListIds(store.list_ids())),
            Request::Shutdown => {
                store.shutdown();
                Ok(Reply::Ack)
            }
        };
        Response::from(res)
    }
}

impl From<Result<Reply>> for Response {
    fn from(res: Result<Reply>) -> Self {
        match res {
            Ok(reply) => Response::Ok(reply),
            Err(e) => Response::Err(e.to_string()),
        }
    }
}

impl Response {
    pub fn into_result(self) -> Result<Reply> {
        match self {
            Response::Ok(reply) => Ok(reply),
            Response::Err(msg) => Err(Error::Remote(msg)),
        }
    }
}

/// Writes `frame` as a single line and flushes.
pub fn write_frame<W: Write, T: Serialize>(w: &mut W, frame: &T) -> Result<(), TransportError> {
    serde_json::to_writer(&mut *w, frame)?;
    w.write_all(b"\n")?;
    w.flush()?;
    Ok(())
}

/// Largest request line the server accepts, newline excluded.
pub const MAX_FRAME: usize = 64 * 1024;

/// Reads one line into `buf` and returns it without the line ending.
/// Returns `Ok(None)` on a clean end of stream.
///
/// A line longer than `limit` is discarded through its newline and reported
/// as [`TransportError::FrameTooLarge`], leaving the reader at the next line.
pub fn read_frame<'a, R: BufRead>(
    r: &mut R,
    buf: &'a mut Vec<u8>,
    limit: usize,
) -> Result<Option<&'a [u8]>, TransportError> {
    buf.clear();
    let cap = (limit as u64).saturating_add(1);
    if r.by_ref().take(cap).read_until(b'\n', buf)? == 0 {
        return Ok(None);
    }
    if buf.last() != Some(&b'\n') && buf.len() > limit {
        skip_line(r)?;
        return Err(TransportError::FrameTooLarge(limit));
    }

    let mut end = buf.len();
    while end > 0 && matches!(buf[end - 1], b'\n' | b'\r') {
        end -= 1;
    }
    Ok(Some(&buf[..end]))
}

// consumes through the next newline without buffering the line
fn skip_line<R: BufRead>(r: &mut R) -> Result<(), TransportError> {
    loop {
        let (newline, len) = {
            let chunk = r.fill_buf()?;
            (chunk.iter().position(|b| *b == b'\n'), chunk.len())
        };
        if len == 0 {
            return Ok(());
        }
        match newline {
            Some(pos) => {
                r.consume(pos + 1);
                return Ok(());
            }
            None => r.consume(len),
        }
    }
}
