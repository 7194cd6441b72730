use std::sync::Arc;

mod error;
pub use error::*;

pub mod list;

pub mod table;

mod store;
pub use store::*;

pub mod transport;
pub use transport::{Client, ClientConfig, Registry, Server, ServerHandle};

pub mod harness;

pub mod logging;

/// The logical name the store is published under.
pub const SERVICE_NAME: &str = "RemoteList";

/// The call surface of the store, as seen by any caller.
///
/// Implemented by [`Store`] for in-process use and by [`Client`] for calls
/// over the transport. Validation failures come back as [`Error::Index`] /
/// [`Error::EmptyOrUnknown`] locally and as [`Error::Remote`] through a
/// client.
pub trait ListService {
    fn append(&self, list: &str, value: i32) -> Result<bool>;

    fn get(&self, list: &str, index: i32) -> Result<i32>;

    fn remove(&self, list: &str) -> Result<i32>;

    fn size(&self, list: &str) -> Result<usize>;

    fn list_ids(&self) -> Result<Vec<String>>;

    fn shutdown(&self) -> Result<()>;
}

impl ListService for Store {
    fn append(&self, list: &str, value: i32) -> Result<bool> {
        Ok(Store::append(self, list, value))
    }

    fn get(&self, list: &str, index: i32) -> Result<i32> {
        Store::get(self, list, index)
    }

    fn remove(&self, list: &str) -> Result<i32> {
        Store::remove(self, list)
    }

    fn size(&self, list: &str) -> Result<usize> {
        Ok(Store::size(self, list))
    }

    fn list_ids(&self) -> Result<Vec<String>> {
        Ok(Store::list_ids(self))
    }

    fn shutdown(&self) -> Result<()> {
        Store::shutdown(self);
        Ok(())
    }
}

impl<S: ListService + ?Sized> ListService for Arc<S> {
    fn append(&self, list: &str, value: i32) -> Result<bool> {
        (**self).append(list, value)
    }

    fn get(&self, list: &str, index: i32) -> Result<i32> {
        (**self).get(list, index)
    }

    fn remove(&self, list: &str) -> Result<i32> {
        (**self).remove(list)
    }

    fn size(&self, list: &str) -> Result<usize> {
        (**self).size(list)
    }

    fn list_ids(&self) -> Result<Vec<String>> {
        (**self).list_ids()
    }

    fn shutdown(&self) -> Result<()> {
        (**self).shutdown()
    }
}
