//! Tests for [`HttpPageviewSource`] against a scripted local HTTP server.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use geo::Point;
use rstest::rstest;
use summit_core::{Crs, Layer, Peak, RawSignals, SignalSource};
use summit_data::pageviews::{HttpPageviewSource, HttpPageviewSourceConfig, RetryPolicy};

/// One canned HTTP response.
struct Reply {
    status: &'static str,
    headers: &'static [&'static str],
    body: &'static str,
}

const SERIES: &str = r#"{"items":[{"views":40},{"views":2}]}"#;

const OK: Reply = Reply {
    status: "200 OK",
    headers: &["Content-Type: application/json"],
    body: SERIES,
};

const RATE_LIMITED: Reply = Reply {
    status: "429 Too Many Requests",
    headers: &["Retry-After: 0"],
    body: "",
};

const NOT_FOUND: Reply = Reply {
    status: "404 Not Found",
    headers: &[],
    body: "",
};

const SERVER_ERROR: Reply = Reply {
    status: "500 Internal Server Error",
    headers: &[],
    body: "",
};

/// Serve `replies` in order, one per connection, recording request lines.
struct StubServer {
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    handle: JoinHandle<()>,
}

impl StubServer {
    fn start(replies: Vec<Reply>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
        let address = listener.local_addr().expect("stub address");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);
        let handle = thread::spawn(move || {
            for reply in replies {
                let (mut stream, _) = listener.accept().expect("accept connection");
                let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
                let mut request_line = String::new();
                reader.read_line(&mut request_line).expect("read request line");
                loop {
                    let mut header = String::new();
                    reader.read_line(&mut header).expect("read header");
                    if header == "\r\n" || header.is_empty() {
                        break;
                    }
                }
                seen.lock()
                    .expect("request log lock")
                    .push(request_line.trim().to_owned());
                let mut response = format!(
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n",
                    reply.status,
                    reply.body.len()
                );
                for header in reply.headers {
                    response.push_str(header);
                    response.push_str("\r\n");
                }
                response.push_str("\r\n");
                response.push_str(reply.body);
                stream
                    .write_all(response.as_bytes())
                    .expect("write response");
            }
        });
        Self {
            base_url: format!("http://{address}/api"),
            requests,
            handle,
        }
    }

    fn source(&self) -> HttpPageviewSource {
        let config = HttpPageviewSourceConfig::new(self.base_url.clone())
            .with_timeout(Duration::from_secs(5))
            .with_retry_policy(RetryPolicy {
                max_retries: 2,
                default_delay: Duration::from_millis(10),
            })
            .with_batching(0, Duration::ZERO);
        HttpPageviewSource::with_config(config).expect("source should build")
    }

    fn finish(self) -> Vec<String> {
        self.handle.join().expect("stub server thread");
        let requests = self.requests.lock().expect("request log lock");
        requests.clone()
    }
}

fn serles() -> Peak {
    Peak::new(1, "Serles", Point::new(11.38, 47.12))
}

#[rstest]
fn sums_daily_views() {
    let server = StubServer::start(vec![OK]);

    let views = server.source().fetch_raw_signal(&serles());

    assert_eq!(views, Some(42.0));
    let requests = server.finish();
    assert_eq!(requests.len(), 1);
    assert!(
        requests
            .first()
            .is_some_and(|line| line.contains("/all-agents/Serles/daily/")),
        "{requests:?}"
    );
}

#[rstest]
fn retries_after_rate_limiting() {
    let server = StubServer::start(vec![RATE_LIMITED, RATE_LIMITED, OK]);

    let views = server.source().fetch_raw_signal(&serles());

    assert_eq!(views, Some(42.0));
    assert_eq!(server.finish().len(), 3);
}

#[rstest]
fn exhausted_retries_yield_no_signal() {
    let server = StubServer::start(vec![RATE_LIMITED, RATE_LIMITED, RATE_LIMITED]);

    let views = server.source().fetch_raw_signal(&serles());

    assert_eq!(views, None);
    assert_eq!(server.finish().len(), 3);
}

#[rstest]
#[case(NOT_FOUND)]
#[case(SERVER_ERROR)]
fn failed_lookups_yield_no_signal(#[case] reply: Reply) {
    let server = StubServer::start(vec![reply]);

    let views = server.source().fetch_raw_signal(&serles());

    assert_eq!(views, None);
    assert_eq!(server.finish().len(), 1);
}

#[rstest]
fn fetch_view_counts_fills_only_missing_named_peaks() {
    let server = StubServer::start(vec![OK]);
    let known = Peak::new(2, "Habicht", Point::new(11.29, 47.04)).with_signals(RawSignals {
        view_count: Some(7),
        ..RawSignals::default()
    });
    let unnamed = Peak::new(3, "", Point::new(11.2, 47.0));
    let mut peaks = Layer::new("peaks", Some(Crs::Wgs84), vec![known, unnamed, serles()]);

    let filled = server.source().fetch_view_counts(&mut peaks);

    assert_eq!(filled, 1);
    let counts: Vec<Option<i64>> = peaks
        .features()
        .iter()
        .map(|peak| peak.signals.view_count)
        .collect();
    assert_eq!(counts, vec![Some(7), None, Some(42)]);
    assert_eq!(server.finish().len(), 1);
}
