#![allow(dead_code)]

use listd::{Client, ClientConfig, Registry, Server, ServerHandle, Store, SERVICE_NAME};
use std::{sync::Arc, time::Duration};

/// A store published on a loopback port, with one connected client.
pub struct TestServer {
    pub store: Arc<Store>,
    pub registry: Registry,
    client: Client,
    handle: Option<ServerHandle>,
}

impl TestServer {
    pub fn new() -> Self {
        let store = Arc::new(Store::new());
        let registry = Registry::new();
        let handle = Server::bind(store.clone(), "127.0.0.1:0")
            .expect("failed to bind")
            .serve(&registry, SERVICE_NAME)
            .expect("failed to serve");
        let client = Client::lookup(&registry, SERVICE_NAME, &config()).expect("failed to connect");
        TestServer {
            store,
            registry,
            client,
            handle: Some(handle),
        }
    }

    pub fn connect(&self) -> Client {
        Client::lookup(&self.registry, SERVICE_NAME, &config()).expect("failed to connect")
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop();
        }
    }
}

pub fn config() -> ClientConfig {
    ClientConfig::default().with_timeout(Duration::from_secs(10))
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::ops::Deref for TestServer {
    type Target = Client;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}
