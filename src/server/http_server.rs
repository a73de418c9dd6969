use may::coroutine::JoinHandle;
use may_minihttp::HttpService;
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// Typed wrapper starting a `may_minihttp` server for any cloneable service.
pub struct HttpServer<T>(pub T);

/// Handle to a running server.
pub struct ServerHandle {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl std::fmt::Debug for ServerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerHandle")
            .field("addr", &self.addr)
            .finish_non_exhaustive()
    }
}

impl ServerHandle {
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Poll the bound address until it accepts a connection.
    ///
    /// # Errors
    ///
    /// `TimedOut` if the listener is not up after about 250ms.
    pub fn wait_ready(&self) -> io::Result<()> {
        for _ in 0..50 {
            if TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "server not ready"))
    }

    /// Cancel the accept coroutine and wait for it to finish.
    pub fn stop(self) {
        // SAFETY: cancel is unsafe in `may` because a cancelled coroutine
        // unwinds at its next yield point. The accept loop owns no state
        // that outlives it and the handle is still valid here.
        unsafe {
            self.handle.coroutine().cancel();
        }
        if self.handle.join().is_err() {
            debug!(addr = %self.addr, "Server coroutine unwound on cancel");
        }
        info!(addr = %self.addr, "Server stopped");
    }

    /// Block until the server coroutine ends.
    ///
    /// # Errors
    ///
    /// Returns the panic payload if the server coroutine panicked.
    pub fn join(self) -> std::thread::Result<()> {
        self.handle.join()
    }
}

impl<T: HttpService + Clone + Send + Sync + 'static> HttpServer<T> {
    /// Bind `addr` and start accepting connections.
    ///
    /// # Errors
    ///
    /// Fails if the address does not resolve or cannot be bound.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid address"))?;
        let handle = may_minihttp::HttpServer(self.0).start(addr)?;
        info!(addr = %addr, "Server listening");
        Ok(ServerHandle { addr, handle })
    }
}
