use super::error::ServerFault;
use may::coroutine::JoinHandle;
use may_minihttp::HttpService;
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};

/// Pause before retrying a bind that failed on resource exhaustion
pub const EXHAUSTION_BACKOFF: Duration = Duration::from_secs(1);

/// Bind attempts before a resource-exhaustion failure is given up on
pub const MAX_BIND_ATTEMPTS: u32 = 30;

/// Wrapper around may_minihttp's HTTP server.
///
/// The transport spawns one coroutine per accepted connection and calls the
/// service sequentially for each request on it while keep-alive holds.
pub struct HttpServer<T>(pub T);

/// Handle to a running HTTP server
pub struct ServerHandle {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ServerHandle {
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Poll the listen address until it accepts connections.
    ///
    /// # Errors
    ///
    /// `TimedOut` after ~250ms (50 attempts, 5ms apart).
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
        // SAFETY: cancel() is unsafe in may; the handle is owned here and the
        // coroutine is only cancelled once, at shutdown.
        #[allow(unsafe_code)]
        unsafe {
            self.handle.coroutine().cancel();
        }
        if self.handle.join().is_err() {
            warn!(addr = %self.addr, "Server coroutine ended with a panic");
        }
    }

    /// Block until the server stops.
    ///
    /// # Errors
    ///
    /// Returns the panic payload if the accept coroutine panicked.
    pub fn join(self) -> std::thread::Result<()> {
        self.handle.join()
    }
}

impl<T: HttpService + Clone + Send + Sync + 'static> HttpServer<T> {
    /// Bind `addr` and start serving.
    ///
    /// Binding is retried after [`EXHAUSTION_BACKOFF`] while it fails with
    /// EMFILE, ENFILE or ENOMEM; any other failure is returned at once.
    ///
    /// # Errors
    ///
    /// [`ServerFault::Fatal`] for an unusable address or bind error,
    /// [`ServerFault::ResourceExhaustion`] once the retries run out.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> Result<ServerHandle, ServerFault> {
        let addr = addr
            .to_socket_addrs()
            .map_err(ServerFault::Fatal)?
            .next()
            .ok_or_else(|| {
                ServerFault::Fatal(io::Error::new(io::ErrorKind::InvalidInput, "invalid address"))
            })?;

        let mut attempt = 1;
        loop {
            match may_minihttp::HttpServer(self.0.clone()).start(addr) {
                Ok(handle) => {
                    info!(addr = %addr, "HTTP server listening");
                    return Ok(ServerHandle { addr, handle });
                }
                Err(err) => {
                    let fault = ServerFault::from_accept_error(err);
                    if !fault.is_transient() || attempt >= MAX_BIND_ATTEMPTS {
                        error!(addr = %addr, attempt, error = %fault, "HTTP server failed to start");
                        return Err(fault);
                    }
                    warn!(
                        addr = %addr,
                        attempt,
                        backoff_ms = EXHAUSTION_BACKOFF.as_millis() as u64,
                        error = %fault,
                        "Resources exhausted while binding, retrying"
                    );
                    thread::sleep(EXHAUSTION_BACKOFF);
                    attempt += 1;
                }
            }
        }
    }
}
