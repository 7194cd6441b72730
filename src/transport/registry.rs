use crate::TransportError;
use dashmap::DashMap;

use std::{net::SocketAddr, sync::Arc};

/// Name → address directory used to find a published store.
///
/// Cloning shares the same directory.
#[derive(Clone, Default)]
pub struct Registry {
    names: Arc<DashMap<String, SocketAddr>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to `addr`, replacing any previous binding. Returns the
    /// address it replaced.
    pub fn rebind(&self, name: &str, addr: SocketAddr) -> Option<SocketAddr> {
        self.names.insert(name.to_owned(), addr)
    }

    pub fn unbind(&self, name: &str) -> Option<SocketAddr> {
        self.names.remove(name).map(|(_, addr)| addr)
    }

    pub fn lookup(&self, name: &str) -> Result<SocketAddr, TransportError> {
        self.names
            .get(name)
            .map(|r| *r.value())
            .ok_or_else(|| TransportError::NotBound(name.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_lookup_unbind() {
        let registry = Registry::new();
        let addr: SocketAddr = "127.0.0.1:1099".parse().unwrap();

        assert!(matches!(
            registry.lookup("RemoteList"),
            Err(TransportError::NotBound(_))
        ));
        assert_eq!(registry.rebind("RemoteList", addr), None);
        assert_eq!(registry.clone().lookup("RemoteList").unwrap(), addr);
        assert_eq!(registry.unbind("RemoteList"), Some(addr));
        assert!(registry.lookup("RemoteList").is_err());
    }
}
