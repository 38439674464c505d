//! Drives `SheetsClient` against a scripted local HTTP endpoint.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;

use fleetsync_core::{Credentials, FleetRecord, Snapshot};
use fleetsync_sheets::{publish, SheetsClient, UploadError};

struct Seen {
    request_line: String,
    authorization: Option<String>,
    body: String,
}

fn serve_script(statuses: Vec<u16>) -> (String, thread::JoinHandle<Vec<Seen>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let endpoint = format!("http://{}", listener.local_addr().expect("addr"));

    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        for status in statuses {
            let (stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream.try_clone().expect("clone"));

            let mut request_line = String::new();
            reader.read_line(&mut request_line).expect("request line");
            let mut content_length = 0usize;
            let mut authorization = None;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).expect("header");
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().expect("length");
                    } else if name.eq_ignore_ascii_case("authorization") {
                        authorization = Some(value.trim().to_string());
                    }
                }
            }
            let mut body = vec![0u8; content_length];
            reader.read_exact(&mut body).expect("body");
            seen.push(Seen {
                request_line: request_line.trim_end().to_string(),
                authorization,
                body: String::from_utf8(body).expect("utf8"),
            });

            let reply = "{}";
            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{reply}",
                reply.len()
            )
            .expect("write");
        }
        seen
    });

    (endpoint, handle)
}

fn snapshot() -> Snapshot {
    Snapshot::new(vec![
        FleetRecord::new("rsync://mlab2.nuq01/ndt"),
        FleetRecord::new("rsync://mlab1.nuq01/ndt"),
    ])
}

#[test]
fn upsert_overwrites_block_then_clears_tail() {
    let (endpoint, server) = serve_script(vec![200, 200]);
    let client = SheetsClient::with_endpoint(endpoint, Arc::new(Credentials::Static("tok".into())));

    let written = publish(&client, "sheet123", &snapshot()).expect("publish");
    assert_eq!(written, 2);

    let seen = server.join().expect("server");
    assert!(
        seen[0]
            .request_line
            .starts_with("PUT /v4/spreadsheets/sheet123/values/A1:F3?valueInputOption=RAW"),
        "unexpected update request: {}",
        seen[0].request_line
    );
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer tok"));
    let update: serde_json::Value = serde_json::from_str(&seen[0].body).expect("update body");
    assert_eq!(update["values"][0][0], "dropboxrsyncaddress");
    assert_eq!(update["values"][1][0], "rsync://mlab1.nuq01/ndt");
    assert_eq!(update["values"][2][0], "rsync://mlab2.nuq01/ndt");

    assert!(seen[1]
        .request_line
        .starts_with("POST /v4/spreadsheets/sheet123/values:batchClear"));
    let clear: serde_json::Value = serde_json::from_str(&seen[1].body).expect("clear body");
    assert_eq!(clear["ranges"][0], "A4:F");
}

#[test]
fn rejected_update_skips_clear() {
    let (endpoint, server) = serve_script(vec![429]);
    let client = SheetsClient::with_endpoint(endpoint, Arc::new(Credentials::Anonymous));

    let err = publish(&client, "sheet123", &snapshot()).expect_err("quota");
    assert!(matches!(err, UploadError::Rejected { status: 429, .. }), "got {err}");

    let seen = server.join().expect("server");
    assert_eq!(seen.len(), 1);
    assert!(seen[0].authorization.is_none());
}
