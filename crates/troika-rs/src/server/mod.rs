//! The request pipeline: accept, parse, classify, dispatch, serialize.
//!
//! The listening socket is owned by the engine's server, not the host.
//! Each accepted connection becomes one task; a task runs requests to
//! completion one at a time (pipeline depth 1 per connection), honoring
//! HTTP/1.1 keep-alive. Socket accept, read and write are the only
//! suspension points; classification, cache probes and counter updates
//! all complete in bounded time on the task's thread.
//!
//! # Module Organization
//!
//! - [`parser`] - Bounded HTTP/1.1 request parsing
//! - [`response`] - Response serialization
//! - [`Server`] - Listener binding and the accept loop

pub mod parser;
pub mod response;

use crate::models::response::RenderedResponse;
use crate::services::engine::Engine;
use log::{debug, info};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};

use parser::read_request;
use response::write_response;

/// The engine's HTTP server.
///
/// Binding and serving are split so embedders (and tests) can learn the
/// bound address before the accept loop starts:
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use troika_rs::server::Server;
/// use troika_rs::services::engine::Engine;
///
/// # async fn run() -> std::io::Result<()> {
/// let engine = Arc::new(Engine::new());
/// let server = Server::bind(engine, "127.0.0.1", 8080).await?;
/// println!("listening on {}", server.local_addr()?);
/// server.serve().await
/// # }
/// ```
pub struct Server {
    listener: TcpListener,
    engine: Arc<Engine>,
}

impl Server {
    /// Binds the listening socket.
    pub async fn bind(engine: Arc<Engine>, host: &str, port: u16) -> io::Result<Server> {
        let listener = TcpListener::bind((host, port)).await?;
        info!("listening on {}:{}", host, port);
        Ok(Server { listener, engine })
    }

    /// The bound socket address. Useful when binding port 0.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop until the listener fails.
    ///
    /// Each connection is served on its own task; a failed or aborted
    /// connection never takes the server down with it.
    pub async fn serve(self) -> io::Result<()> {
        loop {
            let (stream, peer) = self.listener.accept().await?;
            let engine = self.engine.clone();
            tokio::spawn(async move {
                if let Err(err) = handle_connection(engine, stream).await {
                    debug!("connection from {} ended: {}", peer, err);
                }
            });
        }
    }
}

/// Serves requests on one connection until close.
async fn handle_connection(engine: Arc<Engine>, mut stream: TcpStream) -> io::Result<()> {
    let (read_half, mut write_half) = stream.split();
    let mut reader = BufReader::new(read_half);

    loop {
        match read_request(&mut reader).await {
            // Peer closed cleanly between requests.
            Ok(None) => return Ok(()),
            Ok(Some(request)) => {
                let close = request.wants_close();
                let response = engine.dispatch(request.method, &request.path);
                write_response(&mut write_half, &response, close).await?;
                if close {
                    return Ok(());
                }
            }
            Err(err) => {
                debug!("rejecting request: {}", err);
                let response = RenderedResponse::error_json(err.status(), err.category());
                write_response(&mut write_half, &response, true).await?;
                return Ok(());
            }
        }
    }
}
