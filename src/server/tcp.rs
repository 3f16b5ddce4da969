//! # Servidor TCP
//! src/server/tcp.rs
//!
//! Loop de `accept`: por cada conexión espera un slot libre, mueve la
//! dirección del peer y el socket al trabajo y lo envía al pool de
//! workers. El thread que acepta nunca procesa peticiones.

use crate::config::Config;
use crate::error::InitError;
use crate::server::dispatch::{Dispatcher, WorkerPool};
use crate::server::pipeline::{self, Connection};
use crate::server::state::ServerState;
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Servidor de archivos estáticos
pub struct Server {
    state: Arc<ServerState>,
    listener: TcpListener,
    dispatcher: Box<dyn Dispatcher>,
}

impl Server {
    /// Inicializa el estado, hace bind y arranca `config.workers` workers
    pub fn bind(config: &Config) -> Result<Self, InitError> {
        let workers = WorkerPool::new(config.workers)?;
        Self::with_dispatcher(config, Box::new(workers))
    }

    pub fn with_dispatcher(config: &Config, dispatcher: Box<dyn Dispatcher>) -> Result<Self, InitError> {
        let state = ServerState::initialize(config)?;
        let listener = TcpListener::bind(config.address())?;

        info!(address = %listener.local_addr()?, "server listening");

        Ok(Self {
            state: Arc::new(state),
            listener,
            dispatcher,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn state(&self) -> &Arc<ServerState> {
        &self.state
    }

    /// Acepta conexiones indefinidamente; un error de `accept` solo se
    /// registra.
    pub fn run(&self) -> io::Result<()> {
        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => self.dispatch(stream),
                Err(e) => warn!(error = %e, "accept failed"),
            }
        }

        Ok(())
    }

    fn dispatch(&self, stream: TcpStream) {
        let peer = match stream.peer_addr() {
            Ok(peer) => peer,
            Err(e) => {
                warn!(error = %e, "peer address unavailable, closing connection");
                return;
            }
        };

        let lease = self.state.pool().acquire_blocking();
        debug!(%peer, slot = lease.index(), "connection accepted");

        let state = Arc::clone(&self.state);
        self.dispatcher.submit(Box::new(move || {
            pipeline::handle_connection(Connection::new(peer, stream), lease, &state);
        }));
    }
}
