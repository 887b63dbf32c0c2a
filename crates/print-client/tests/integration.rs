//! Integration tests for the dispatcher, against a mock TCP printer.
//!
//! The address policy refuses `127.0.0.1` and any port outside 9100-9109,
//! so the mock printer listens on `127.0.0.2` (routed to loopback on Linux)
//! on the first free port in the raw-print block.

use std::io::Read;
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use zpl_label_print_client::{
    AddressPolicy, AddressRejection, DispatchConfig, DispatchError, Dispatcher, PORT_RANGE,
};

fn open_dispatcher() -> Dispatcher {
    Dispatcher::with_config(AddressPolicy::unrestricted(), fast_config())
}

fn fast_config() -> DispatchConfig {
    let mut cfg = DispatchConfig::default();
    cfg.send_timeout = Duration::from_secs(2);
    cfg.test_timeout = Duration::from_secs(2);
    cfg.settle_delay = Duration::from_millis(10);
    cfg
}

// ── Rejections (no network) ─────────────────────────────────────────────

#[test]
fn validator_table() {
    let open = AddressPolicy::unrestricted();
    let listed = AddressPolicy::with_allow_list(["10.5.5.5"]);

    assert!(open.validate("192.168.1.50", 9100).is_ok());
    assert!(open.validate("127.0.0.1", 9100).is_err());
    assert!(listed.validate("10.5.5.5", 9100).is_ok());
    assert!(listed.validate("10.5.5.6", 9100).is_err());
    assert!(open.validate("192.168.1.50", 9200).is_err());
    assert!(open.validate("999.1.1.1", 9100).is_err());
}

#[test]
fn rejections_short_circuit() {
    let dispatcher = open_dispatcher();
    let started = Instant::now();

    for (address, port) in [
        ("127.0.0.1", 9100),
        ("0.0.0.0", 9100),
        ("255.255.255.255", 9100),
        ("printer.local", 9100),
        ("192.168.1.50", 9200),
    ] {
        let err = dispatcher.send_zpl("^XA^XZ", address, port).unwrap_err();
        assert!(err.is_validation(), "{address}:{port} -> {err}");
        let err = dispatcher.test_connection(address, port).unwrap_err();
        assert!(err.is_validation(), "{address}:{port} -> {err}");
    }

    // No connect attempt means no timeout budget spent.
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[test]
fn test_label_respects_policy() {
    let dispatcher = Dispatcher::new(AddressPolicy::from_config(Some("10.0.0.5")));
    let err = dispatcher
        .print_test_label("10.0.0.6", 9100, "2026-01-01T00:00:00Z")
        .unwrap_err();
    assert_eq!(
        err.rejection(),
        Some(&AddressRejection::NotInAllowList("10.0.0.6".into()))
    );
}

// ── Mock printer ────────────────────────────────────────────────────────

#[cfg(target_os = "linux")]
mod loopback {
    use super::*;

    pub(super) const HOST: &str = "127.0.0.2";

    /// Bind the first free port of the raw-print block on [`HOST`].
    pub(super) fn bind_printer_port() -> TcpListener {
        PORT_RANGE
            .clone()
            .find_map(|port| TcpListener::bind((HOST, port)).ok())
            .expect("no free port in 9100-9109 on 127.0.0.2")
    }

    /// A mock printer on a background thread that accepts `connections`
    /// connections in turn and returns what each one delivered.
    pub(super) struct MockPrinterServer {
        pub(super) port: u16,
        handle: Option<thread::JoinHandle<Vec<Vec<u8>>>>,
    }

    impl MockPrinterServer {
        pub(super) fn start(connections: usize) -> Self {
            let listener = bind_printer_port();
            let port = listener.local_addr().unwrap().port();

            let handle = thread::spawn(move || {
                let mut jobs = Vec::with_capacity(connections);
                for _ in 0..connections {
                    let (mut stream, _) = listener.accept().unwrap();
                    stream
                        .set_read_timeout(Some(Duration::from_secs(5)))
                        .unwrap();
                    let mut received = Vec::new();
                    stream.read_to_end(&mut received).unwrap();
                    jobs.push(received);
                }
                jobs
            });

            Self {
                port,
                handle: Some(handle),
            }
        }

        /// Wait for the server thread and return each connection's data.
        pub(super) fn received_jobs(mut self) -> Vec<Vec<u8>> {
            self.handle.take().unwrap().join().unwrap()
        }
    }
}

// ── Delivery ────────────────────────────────────────────────────────────

#[cfg(target_os = "linux")]
#[test]
fn two_sends_report_payload_length() {
    use loopback::{HOST, MockPrinterServer};

    let server = MockPrinterServer::start(2);
    let dispatcher = open_dispatcher();
    let first = "^XA\n^PW812\n^LL1218\n^FO100,100^A0N,32,26^FDOne^FS\n^XZ\n\n";
    let second = "^XA\n^PW812\n^LL1218\n^FO100,100^A0N,32,26^FDTwo^FS\n^XZ\n\n";

    let a = dispatcher.send_zpl(first, HOST, server.port).unwrap();
    let b = dispatcher.send_zpl(second, HOST, server.port).unwrap();
    assert_eq!(a.bytes_sent, first.len());
    assert_eq!(b.bytes_sent, second.len());

    let jobs = server.received_jobs();
    assert_eq!(jobs, vec![first.as_bytes().to_vec(), second.as_bytes().to_vec()]);
}

#[cfg(target_os = "linux")]
#[test]
fn test_connection_writes_nothing() {
    use loopback::{HOST, MockPrinterServer};

    let server = MockPrinterServer::start(1);
    let report = open_dispatcher()
        .test_connection(HOST, server.port)
        .unwrap();
    assert!(report.latency < Duration::from_secs(2));
    assert_eq!(server.received_jobs(), vec![Vec::<u8>::new()]);
}

#[cfg(target_os = "linux")]
#[test]
fn test_label_is_stamped() {
    use loopback::{HOST, MockPrinterServer};

    let server = MockPrinterServer::start(1);
    let report = open_dispatcher()
        .print_test_label(HOST, server.port, "2026-10-15T09:30:00+00:00")
        .unwrap();

    let jobs = server.received_jobs();
    let zpl = String::from_utf8(jobs[0].clone()).unwrap();
    assert_eq!(report.bytes_sent, zpl.len());
    assert!(zpl.starts_with("^XA"));
    assert!(zpl.trim_end().ends_with("^XZ"));
    assert!(zpl.contains(&format!("Printer: {HOST}")));
    assert!(zpl.contains("2026-10-15T09:30:00+00:00"));
    assert!(zpl.contains("TEST123"));
}

#[cfg(target_os = "linux")]
#[test]
fn concurrent_sends_are_independent() {
    use loopback::{HOST, MockPrinterServer};

    let server = MockPrinterServer::start(4);
    let dispatcher = Arc::new(open_dispatcher());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let dispatcher = Arc::clone(&dispatcher);
            let port = server.port;
            thread::spawn(move || {
                let zpl = format!("^XA^FDjob {i}^FS^XZ");
                let report = dispatcher.send_zpl(&zpl, HOST, port).unwrap();
                assert_eq!(report.bytes_sent, zpl.len());
                zpl
            })
        })
        .collect();

    let mut sent: Vec<Vec<u8>> = handles
        .into_iter()
        .map(|h| h.join().unwrap().into_bytes())
        .collect();
    let mut received = server.received_jobs();
    sent.sort();
    received.sort();
    assert_eq!(sent, received);
}

#[cfg(target_os = "linux")]
#[test]
fn closed_port_is_a_connection_error() {
    // Mock printers only listen on 127.0.0.2, so nothing answers here.
    const HOST: &str = "127.0.0.3";
    let port = 9109;

    let err = open_dispatcher().send_zpl("^XA^XZ", HOST, port).unwrap_err();
    assert!(!err.is_validation());
    assert!(
        matches!(
            err,
            DispatchError::ConnectionRefused { .. } | DispatchError::ConnectionFailed { .. }
        ),
        "{err}"
    );
    assert!(err.to_string().contains(&format!("{HOST}:{port}")));
}

#[cfg(target_os = "linux")]
#[test]
fn stalled_printer_fails_within_budget() {
    use loopback::{HOST, bind_printer_port};
    use std::sync::mpsc;

    let listener = bind_printer_port();
    let port = listener.local_addr().unwrap().port();
    let (release_tx, release_rx) = mpsc::channel::<()>();

    // Accepts, then stops reading until released.
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        release_rx.recv().unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let mut sink = Vec::new();
        stream.read_to_end(&mut sink).map(|_| ())
    });

    let mut cfg = fast_config();
    cfg.send_timeout = Duration::from_millis(300);
    let dispatcher = Dispatcher::with_config(AddressPolicy::unrestricted(), cfg);

    let payload = vec![b'X'; 64 * 1024 * 1024];
    let started = Instant::now();
    let err = dispatcher.send(&payload, HOST, port).unwrap_err();
    assert!(err.is_timeout(), "{err}");
    assert!(started.elapsed() < Duration::from_secs(5));

    release_tx.send(()).unwrap();
    // EOF or reset, never the server's own read timeout.
    if let Err(e) = server.join().unwrap() {
        assert!(
            !matches!(
                e.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
            ),
            "client socket left open: {e}"
        );
    }
}

#[cfg(target_os = "linux")]
#[test]
fn unanswered_handshake_times_out_within_budget() {
    use loopback::HOST;
    use socket2::{Domain, Socket, Type};
    use std::net::{SocketAddr, TcpStream};

    // A listener that never accepts, with its backlog already full: further
    // SYNs are dropped and the client's connect can only time out.
    let listener = Socket::new(Domain::IPV4, Type::STREAM, None).unwrap();
    listener.set_reuse_address(true).unwrap();
    let addr: SocketAddr = PORT_RANGE
        .clone()
        .map(|port| SocketAddr::from(([127, 0, 0, 2], port)))
        .find(|addr| listener.bind(&(*addr).into()).is_ok())
        .expect("no free port in 9100-9109 on 127.0.0.2");
    listener.listen(0).unwrap();

    let fillers: Vec<TcpStream> = (0..4)
        .filter_map(|_| TcpStream::connect_timeout(&addr, Duration::from_millis(200)).ok())
        .collect();
    assert!(!fillers.is_empty(), "backlog was never filled");

    let mut cfg = fast_config();
    cfg.send_timeout = Duration::from_millis(400);
    cfg.test_timeout = Duration::from_millis(300);
    let dispatcher = Dispatcher::with_config(AddressPolicy::unrestricted(), cfg);

    let started = Instant::now();
    let err = dispatcher.send_zpl("^XA^XZ", HOST, addr.port()).unwrap_err();
    let elapsed = started.elapsed();
    assert!(err.is_timeout(), "{err}");
    assert!(
        matches!(err, DispatchError::ConnectionTimeout { timeout, .. } if timeout == Duration::from_millis(400))
    );
    assert!(elapsed >= Duration::from_millis(300), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(2), "{elapsed:?}");

    let started = Instant::now();
    let err = dispatcher.test_connection(HOST, addr.port()).unwrap_err();
    let elapsed = started.elapsed();
    assert!(err.is_timeout(), "{err}");
    assert!(
        matches!(err, DispatchError::ConnectionTimeout { timeout, .. } if timeout == Duration::from_millis(300))
    );
    assert!(elapsed < Duration::from_secs(2), "{elapsed:?}");

    drop(fillers);
}
