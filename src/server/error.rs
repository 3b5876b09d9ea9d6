use std::fmt;
use std::io;

/// Faults seen by the connection layer.
///
/// Replaces inspection of raw errno values: callers match on the variant to
/// decide between answering, retrying and giving up.
#[derive(Debug)]
pub enum ServerFault {
    /// The transport handed over a request that cannot be converted
    /// (bad method token, bad target, unreadable body). Answered with 400,
    /// the connection is not reused.
    Protocol { message: String },
    /// Out of file descriptors or memory while binding/accepting. Transient:
    /// pause and retry.
    ResourceExhaustion(io::Error),
    /// Any other bind/accept failure. Stops the server.
    Fatal(io::Error),
    /// The application failed while handling an action. The connection is
    /// closed without a guaranteed response.
    Application(anyhow::Error),
}

impl ServerFault {
    pub fn protocol(message: impl Into<String>) -> Self {
        ServerFault::Protocol {
            message: message.into(),
        }
    }

    /// Classify an accept/bind error.
    #[must_use]
    pub fn from_accept_error(err: io::Error) -> Self {
        let exhausted = matches!(
            err.raw_os_error(),
            Some(libc::EMFILE) | Some(libc::ENFILE) | Some(libc::ENOMEM)
        ) || err.kind() == io::ErrorKind::OutOfMemory;
        if exhausted {
            ServerFault::ResourceExhaustion(err)
        } else {
            ServerFault::Fatal(err)
        }
    }

    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, ServerFault::ResourceExhaustion(_))
    }
}

impl fmt::Display for ServerFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerFault::Protocol { message } => write!(f, "protocol error: {message}"),
            ServerFault::ResourceExhaustion(err) => write!(f, "resource exhaustion: {err}"),
            ServerFault::Fatal(err) => write!(f, "fatal server error: {err}"),
            ServerFault::Application(err) => write!(f, "application error: {err:#}"),
        }
    }
}

impl std::error::Error for ServerFault {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerFault::ResourceExhaustion(err) | ServerFault::Fatal(err) => Some(err),
            ServerFault::Application(err) => Some(err.as_ref()),
            ServerFault::Protocol { .. } => None,
        }
    }
}

impl From<ServerFault> for io::Error {
    fn from(fault: ServerFault) -> Self {
        match fault {
            ServerFault::ResourceExhaustion(err) | ServerFault::Fatal(err) => err,
            ServerFault::Protocol { message } => io::Error::new(io::ErrorKind::InvalidData, message),
            other => io::Error::other(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_exhaustion() {
        for code in [libc::EMFILE, libc::ENFILE, libc::ENOMEM] {
            let fault = ServerFault::from_accept_error(io::Error::from_raw_os_error(code));
            assert!(fault.is_transient(), "errno {code} should be transient");
        }
    }

    #[test]
    fn test_classify_fatal() {
        let fault = ServerFault::from_accept_error(io::Error::from_raw_os_error(libc::EADDRINUSE));
        assert!(matches!(fault, ServerFault::Fatal(_)));
        assert!(!fault.is_transient());
    }

    #[test]
    fn test_application_fault_to_io_error() {
        let err: io::Error = ServerFault::Application(anyhow::anyhow!("boom")).into();
        assert!(err.to_string().contains("boom"));
    }
}
