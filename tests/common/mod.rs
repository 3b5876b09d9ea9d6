#![allow(dead_code)]

pub mod site {
    use std::fs;
    use tempfile::TempDir;

    /// Document root with a few static files:
    /// `assets/style.css`, `hello.txt`, `my file.txt`, `docs/readme.md`
    pub fn create_site() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("assets")).unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("assets/style.css"), "body { color: #333; }\n").unwrap();
        fs::write(dir.path().join("hello.txt"), "Hello\n").unwrap();
        fs::write(dir.path().join("my file.txt"), "spaced").unwrap();
        fs::write(dir.path().join("docs/readme.md"), "# readme\n").unwrap();
        dir
    }
}

pub mod test_server {
    use frontgate::config::{ActionsConfig, GatewayConfig};
    use frontgate::dispatcher::Application;
    use frontgate::gateway::Gateway;
    use frontgate::server::ServerHandle;
    use std::net::{SocketAddr, TcpListener};
    use std::path::Path;
    use std::sync::Once;

    /// Ensures May coroutines are configured only once
    static MAY_INIT: Once = Once::new();

    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
    }

    pub fn free_addr() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        addr
    }

    pub fn test_config(base_dir: &Path) -> GatewayConfig {
        GatewayConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            base_dir: base_dir.to_path_buf(),
            actions: ActionsConfig {
                default_controller: true,
                controllers: vec!["users".to_string(), "forms".to_string()],
                routes: vec!["blog/{slug}".to_string()],
            },
            ..GatewayConfig::default()
        }
    }

    /// Running gateway on an ephemeral port, stopped on drop
    pub struct GatewayTestServer {
        handle: Option<ServerHandle>,
        addr: SocketAddr,
    }

    impl GatewayTestServer {
        pub fn start<A: Application + 'static>(base_dir: &Path, app: A) -> Self {
            setup_may_runtime();
            let gateway = Gateway::new(test_config(base_dir), app).unwrap();
            let addr = free_addr();
            let handle = gateway.start_on(addr).unwrap();
            handle.wait_ready().unwrap();
            Self {
                handle: Some(handle),
                addr,
            }
        }

        pub fn addr(&self) -> SocketAddr {
            self.addr
        }
    }

    impl Drop for GatewayTestServer {
        fn drop(&mut self) {
            if let Some(handle) = self.handle.take() {
                handle.stop();
            }
        }
    }
}

pub mod http {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::time::Duration;

    /// Parsed raw HTTP/1.1 response
    #[derive(Debug)]
    pub struct RawResponse {
        pub status: u16,
        pub headers: Vec<(String, String)>,
        pub body: Vec<u8>,
    }

    impl RawResponse {
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }

        pub fn body_text(&self) -> String {
            String::from_utf8_lossy(&self.body).into_owned()
        }
    }

    /// Write `req` and read one response, honouring `Content-Length`.
    pub fn send_request(addr: &SocketAddr, req: &[u8]) -> RawResponse {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(req).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_millis(2000)))
            .unwrap();

        let mut buf = Vec::new();
        let mut tmp = [0u8; 4096];
        loop {
            if let Some(resp) = try_parse(&buf) {
                return resp;
            }
            match stream.read(&mut tmp) {
                Ok(0) => break,
                Ok(n) => buf.extend_from_slice(&tmp[..n]),
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    break
                }
                Err(e) => panic!("read error: {e:?}"),
            }
        }
        try_parse(&buf).unwrap_or_else(|| {
            panic!("incomplete response: {:?}", String::from_utf8_lossy(&buf))
        })
    }

    fn try_parse(buf: &[u8]) -> Option<RawResponse> {
        let header_end = buf.windows(4).position(|w| w == b"\r\n\r\n")?;
        let head = String::from_utf8_lossy(&buf[..header_end]);
        let mut lines = head.split("\r\n");
        let status = lines.next()?.split_whitespace().nth(1)?.parse().ok()?;
        let headers: Vec<(String, String)> = lines
            .filter_map(|l| l.split_once(':'))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect();
        let len: usize = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, v)| v.parse().ok())
            .unwrap_or(0);
        let body_start = header_end + 4;
        if buf.len() < body_start + len {
            return None;
        }
        Some(RawResponse {
            status,
            headers,
            body: buf[body_start..body_start + len].to_vec(),
        })
    }

    pub fn get(addr: &SocketAddr, path: &str) -> RawResponse {
        let req = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\n\r\n");
        send_request(addr, req.as_bytes())
    }

    pub fn post(addr: &SocketAddr, path: &str, content_type: &str, body: &[u8]) -> RawResponse {
        let mut req = format!(
            "POST {path} HTTP/1.1\r\nHost: localhost\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\n\r\n",
            body.len()
        )
        .into_bytes();
        req.extend_from_slice(body);
        send_request(addr, &req)
    }
}
