use may::coroutine::JoinHandle;
use may_minihttp::{HttpServer as MiniHttpServer, HttpService};
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;
use tracing::info;

/// Connection attempts made by [`ServerHandle::wait_ready`]
const READY_ATTEMPTS: u32 = 200;
const READY_POLL: Duration = Duration::from_millis(5);

/// Serves an [`HttpService`] (normally an [`AppService`](super::AppService)) on the
/// `may` runtime.
pub struct HttpServer<T>(pub T);

/// A started server: its bound address and accept-loop coroutine.
pub struct ServerHandle {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ServerHandle {
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Block until the listener accepts a TCP connection.
    ///
    /// # Errors
    ///
    /// `TimedOut` when nothing accepts within about a second.
    pub fn wait_ready(&self) -> io::Result<()> {
        for _ in 0..READY_ATTEMPTS {
            if TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            thread::sleep(READY_POLL);
        }
        Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("dispatcher on {} not accepting connections", self.addr),
        ))
    }

    /// Cancel the accept loop and wait for it to unwind.
    pub fn stop(self) {
        // SAFETY: the accept loop is unwound at its next yield point; it owns no
        // state that outlives it and is joined right after.
        unsafe {
            self.handle.coroutine().cancel();
        }
        let _ = self.handle.join();
        info!(addr = %self.addr, "Dispatcher stopped serving");
    }

    /// Run until the accept loop ends, as `routewise serve` does.
    ///
    /// # Errors
    ///
    /// Returns the panic payload if the accept loop panicked.
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }
}

impl<T: HttpService + Clone + Send + Sync + 'static> HttpServer<T> {
    /// Bind `addr` and start accepting connections.
    ///
    /// # Errors
    ///
    /// Fails when `addr` resolves to nothing or cannot be bound.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "address resolved to nothing"))?;
        let handle = MiniHttpServer(self.0).start(addr)?;
        info!(addr = %addr, "Dispatcher serving");
        Ok(ServerHandle { addr, handle })
    }
}
