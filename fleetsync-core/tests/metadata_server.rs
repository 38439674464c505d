//! `MetadataServer` against local stand-ins for the GCE metadata server.

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use fleetsync_core::{AuthError, MetadataServer};

const SHORT: Duration = Duration::from_millis(300);

/// Answer one request per `(status, body)`, returning the header lines seen.
fn serve_script(responses: Vec<(u16, &'static str)>) -> (SocketAddr, thread::JoinHandle<Vec<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    let handle = thread::spawn(move || {
        let mut requests = Vec::new();
        for (status, body) in responses {
            let (stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream.try_clone().expect("clone"));
            let mut lines = Vec::new();
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).expect("header line");
                let line = line.trim_end().to_string();
                if line.is_empty() {
                    break;
                }
                lines.push(line);
            }
            requests.push(lines);

            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {status} X\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .expect("write response");
        }
        requests
    });
    (addr, handle)
}

/// Accepts connections and never answers until `release` is dropped.
fn stalled_server() -> (SocketAddr, mpsc::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (release, held) = mpsc::channel::<()>();
    thread::spawn(move || {
        let mut open = Vec::new();
        listener.set_nonblocking(true).expect("nonblocking");
        loop {
            if let Ok((stream, _)) = listener.accept() {
                open.push(stream);
            }
            match held.recv_timeout(Duration::from_millis(20)) {
                Err(mpsc::RecvTimeoutError::Timeout) => continue,
                _ => break,
            }
        }
    });
    (addr, release)
}

#[test]
fn stalled_token_request_times_out() {
    let (addr, release) = stalled_server();
    let tokens = MetadataServer::at(&addr.to_string(), SHORT).tokens();

    let started = Instant::now();
    let err = tokens.token().expect_err("server never answers");
    assert!(started.elapsed() < Duration::from_secs(5), "took {:?}", started.elapsed());
    assert!(matches!(err, AuthError::Request { .. }), "got {err}");
    drop(release);
}

#[test]
fn stalled_project_lookup_times_out() {
    let (addr, release) = stalled_server();
    let server = MetadataServer::at(&addr.to_string(), SHORT);

    let started = Instant::now();
    assert!(server.project_id().is_err());
    assert!(started.elapsed() < Duration::from_secs(5), "took {:?}", started.elapsed());
    drop(release);
}

#[test]
fn project_id_is_read_with_metadata_flavor_header() {
    let (addr, server) = serve_script(vec![(200, "mlab-oti\n")]);
    let metadata = MetadataServer::at(&addr.to_string(), SHORT);

    assert_eq!(metadata.project_id().expect("project id"), "mlab-oti");

    let requests = server.join().expect("server thread");
    assert!(requests[0][0].starts_with("GET /computeMetadata/v1/project/project-id "));
    assert!(requests[0]
        .iter()
        .any(|line| line.eq_ignore_ascii_case("metadata-flavor: google")));
}

#[test]
fn empty_project_id_is_an_error() {
    let (addr, server) = serve_script(vec![(200, "  ")]);
    let err = MetadataServer::at(&addr.to_string(), SHORT)
        .project_id()
        .expect_err("empty body");
    assert!(matches!(err, AuthError::EmptyAnswer { .. }), "got {err}");
    server.join().expect("server thread");
}

#[test]
fn token_is_cached_between_calls() {
    let (addr, server) = serve_script(vec![(
        200,
        r#"{"access_token":"ya29.first","expires_in":3600,"token_type":"Bearer"}"#,
    )]);
    let tokens = MetadataServer::at(&addr.to_string(), SHORT).tokens();

    assert_eq!(tokens.token().expect("first"), "ya29.first");
    server.join().expect("server thread");
    // The listener is gone; only the cache can answer now.
    assert_eq!(tokens.token().expect("cached"), "ya29.first");
}
