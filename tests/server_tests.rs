//! Tests for the TCP server and client
//!
//! These tests verify:
//! - Append/read/ping over the wire
//! - Validation failures surface as INVALID responses
//! - Concurrent clients receive unique offsets
//! - Malformed requests are answered with INVALID
//! - Connection limit and graceful shutdown
//! - The log can be closed once the server has stopped

use std::collections::HashSet;
use std::io::Write;
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use atlaslog::network::{Client, Server, ShutdownHandle};
use atlaslog::protocol::{read_response, Command, Status};
use atlaslog::{AppendLog, Config, LogError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

struct TestServer {
    _temp: TempDir,
    addr: SocketAddr,
    log: Arc<AppendLog>,
    handle: ShutdownHandle,
    thread: JoinHandle<atlaslog::Result<()>>,
}

impl TestServer {
    fn stop(self) {
        self.handle.shutdown();
        self.thread.join().unwrap().unwrap();
    }
}

fn start_server(max_connections: usize) -> TestServer {
    let temp = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp.path())
        .listen_addr("127.0.0.1:0")
        .max_connections(max_connections)
        .worker_threads(4)
        .read_timeout_ms(2000)
        .build();

    let log = Arc::new(AppendLog::open(&config).unwrap());
    let server = Server::bind(config, Arc::clone(&log)).unwrap();
    let addr = server.local_addr().unwrap();
    let handle = server.shutdown_handle();
    let thread = thread::spawn(move || server.run());

    TestServer {
        _temp: temp,
        addr,
        log,
        handle,
        thread,
    }
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_ping() {
    let server = start_server(16);

    let mut client = Client::connect(server.addr).unwrap();
    client.ping().unwrap();

    drop(client);
    server.stop();
}

#[test]
fn test_append_and_read() {
    let server = start_server(16);
    let mut client = Client::connect(server.addr).unwrap();

    assert_eq!(client.append(br#"{"a":1}"#).unwrap(), 0);
    assert_eq!(client.append(br#"{"b":2}"#).unwrap(), 1);

    assert_eq!(client.read("0").unwrap(), br#"{"a":1}"#.to_vec());
    assert_eq!(client.read("1").unwrap(), br#"{"b":2}"#.to_vec());
    assert_eq!(server.log.len(), 2);

    drop(client);
    server.stop();
}

#[test]
fn test_validation_errors_over_wire() {
    let server = start_server(16);
    let mut client = Client::connect(server.addr).unwrap();
    client.append(b"only").unwrap();

    for token in ["1", "-1", "x"] {
        assert!(matches!(client.read(token), Err(LogError::Validation(_))));
    }
    assert!(matches!(client.append(b""), Err(LogError::Validation(_))));

    // Connection stays usable after validation failures
    assert_eq!(client.read("0").unwrap(), b"only");

    let response = client.call(&Command::Read { offset: "9".into() }).unwrap();
    assert_eq!(response.status, Status::Invalid);

    drop(client);
    server.stop();
}

#[test]
fn test_concurrent_clients_unique_offsets() {
    let server = start_server(64);
    let addr = server.addr;

    let handles: Vec<_> = (0..8)
        .map(|t| {
            thread::spawn(move || {
                let mut client = Client::connect(addr).unwrap();
                (0..20)
                    .map(|i| client.append(format!("{}-{}", t, i).as_bytes()).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let offsets: Vec<u64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    let unique: HashSet<u64> = offsets.iter().copied().collect();

    assert_eq!(offsets.len(), 160);
    assert_eq!(unique, (0..160).collect::<HashSet<u64>>());

    server.stop();
}

#[test]
fn test_connection_limit() {
    let server = start_server(1);

    let mut first = Client::connect(server.addr).unwrap();
    first.ping().unwrap();

    let mut second = Client::connect(server.addr).unwrap();
    assert!(second.ping().is_err());

    // The first connection is unaffected
    first.ping().unwrap();

    drop(first);
    drop(second);
    server.stop();
}

#[test]
fn test_data_survives_restart() {
    let temp = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp.path())
        .listen_addr("127.0.0.1:0")
        .worker_threads(2)
        .build();

    {
        let log = AppendLog::open(&config).unwrap();
        log.append(&b"persisted"[..]).unwrap();
        log.close().unwrap();
    }

    let log = Arc::new(AppendLog::open(&config).unwrap());
    let server = Server::bind(config, Arc::clone(&log)).unwrap();
    let addr = server.local_addr().unwrap();
    let handle = server.shutdown_handle();
    let thread = thread::spawn(move || server.run());

    let mut client = Client::connect(addr).unwrap();
    assert_eq!(client.read("0").unwrap(), b"persisted");
    assert_eq!(client.append(b"next").unwrap(), 1);
    drop(client);

    handle.shutdown();
    thread.join().unwrap().unwrap();
}

#[test]
fn test_unknown_command_is_invalid() {
    let server = start_server(16);

    let mut stream = TcpStream::connect(server.addr).unwrap();
    stream.write_all(&[0x7f, 0, 0, 0, 0]).unwrap();
    let response = read_response(&mut stream).unwrap();
    assert_eq!(response.status, Status::Invalid);

    drop(stream);
    server.stop();
}

#[test]
fn test_shutdown_releases_log_for_close() {
    let server = start_server(16);
    let mut client = Client::connect(server.addr).unwrap();
    client.append(b"before-stop").unwrap();
    drop(client);

    let TestServer {
        _temp,
        log,
        handle,
        thread,
        ..
    } = server;
    handle.shutdown();
    thread.join().unwrap().unwrap();

    // run() returned and the server was dropped with its thread
    let log = Arc::try_unwrap(log).ok().expect("log still shared after shutdown");
    assert_eq!(log.len(), 1);
    log.close().unwrap();
}
