//! Shared helpers for tests that talk to the live mock server.

use std::net::SocketAddr;

use cmis_net::{BackendKind, TransportConfig, TransportService};

/// Start the mock server on a random port in a background runtime.
pub fn spawn_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

/// One service per backend, both with the default configuration.
pub fn services() -> Vec<(BackendKind, Box<dyn TransportService>)> {
    [BackendKind::Ureq, BackendKind::Raw]
        .into_iter()
        .map(|backend| {
            let config = TransportConfig {
                backend,
                ..TransportConfig::default()
            };
            (backend, config.into_service())
        })
        .collect()
}
