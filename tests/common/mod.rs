#![allow(dead_code)]

pub mod test_server {
    use std::sync::Once;

    /// Ensures May coroutines are configured only once
    static MAY_INIT: Once = Once::new();

    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
    }
}

pub mod http {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::time::Duration;

    /// Send a raw HTTP/1.1 request and read until the server goes quiet
    pub fn send_request(addr: &SocketAddr, req: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(req.as_bytes()).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_millis(200)))
            .unwrap();
        let mut buf = Vec::new();
        loop {
            let mut tmp = [0u8; 1024];
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
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Split a raw response into status, lowercase header lines, and body text
    pub fn parse_response(resp: &str) -> (u16, Vec<String>, String) {
        let (head, body) = resp.split_once("\r\n\r\n").unwrap_or((resp, ""));
        let mut lines = head.lines();
        let status = lines
            .next()
            .and_then(|l| l.split_whitespace().nth(1))
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        let headers = lines.map(str::to_ascii_lowercase).collect();
        (status, headers, body.to_string())
    }

    pub fn get(addr: &SocketAddr, path: &str, extra_headers: &[(&str, &str)]) -> (u16, Vec<String>, String) {
        let mut req = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\n");
        for (name, value) in extra_headers {
            req.push_str(&format!("{name}: {value}\r\n"));
        }
        req.push_str("Connection: close\r\n\r\n");
        parse_response(&send_request(addr, &req))
    }
}

pub mod recorders {
    use routewise::dispatcher::{DispatchRequest, HandlerOutput};
    use routewise::pattern::Params;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Handler that counts its invocations and echoes the matched params
    pub fn counting_handler(
        counter: &Arc<AtomicUsize>,
    ) -> impl Fn(&DispatchRequest, &Params) -> anyhow::Result<HandlerOutput> + Send + Sync + 'static {
        let counter = Arc::clone(counter);
        move |_req: &DispatchRequest, params: &Params| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(HandlerOutput::Json(serde_json::json!(params)))
        }
    }
}
