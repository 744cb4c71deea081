//! Exercises the HTTP range source and control fetch against a local server.

use std::thread;

use engine::{ChunkSource, SourceError};
use tiny_http::{Header, Response, Server};
use transfer::{fetch_control, http_client, FetchError, RangeSource};

/// How the fixture server answers ranged requests.
#[derive(Clone, Copy)]
enum Mode {
    /// Honour the range with a 206 and the exact bytes.
    Ranged,
    /// Ignore the range and return the whole body with 200.
    FullBody,
    /// Answer 206 but claim the body is gzip-compressed.
    Gzipped,
    /// Answer 404.
    NotFound,
    /// Answer 206 with only half of the requested bytes.
    Short,
}

fn spawn_server(artifact: Vec<u8>, mode: Mode) -> String {
    let server = Server::http("127.0.0.1:0").expect("bind fixture server");
    let port = server.server_addr().to_ip().expect("tcp listener").port();

    thread::spawn(move || {
        for request in server.incoming_requests() {
            let range = request
                .headers()
                .iter()
                .find(|header| header.field.equiv("Range"))
                .map(|header| parse_range(header.value.as_str()));

            let response = match (mode, range) {
                (Mode::NotFound, _) => Response::from_data(Vec::new()).with_status_code(404),
                (Mode::FullBody, _) | (Mode::Ranged, None) => {
                    Response::from_data(artifact.clone()).with_status_code(200)
                }
                (Mode::Ranged, Some((start, end))) => {
                    Response::from_data(artifact[start..=end].to_vec()).with_status_code(206)
                }
                (Mode::Gzipped, Some((start, end))) => {
                    Response::from_data(artifact[start..=end].to_vec())
                        .with_status_code(206)
                        .with_header(
                            Header::from_bytes(&b"Content-Encoding"[..], &b"gzip"[..])
                                .expect("static header"),
                        )
                }
                (Mode::Short, Some((start, end))) => {
                    let len = (end - start + 1) / 2;
                    Response::from_data(artifact[start..start + len].to_vec())
                        .with_status_code(206)
                }
                (Mode::Gzipped | Mode::Short, None) => {
                    Response::from_data(Vec::new()).with_status_code(400)
                }
            };
            let _ = request.respond(response);
        }
    });

    format!("http://127.0.0.1:{port}/app.AppImage")
}

fn parse_range(value: &str) -> (usize, usize) {
    let spec = value.trim_start_matches("bytes=");
    let (start, end) = spec.split_once('-').expect("range form a-b");
    (start.parse().expect("start"), end.parse().expect("end"))
}

fn artifact() -> Vec<u8> {
    (0..10_000).map(|i| (i % 251) as u8).collect()
}

fn source(mode: Mode) -> (RangeSource, Vec<u8>) {
    let data = artifact();
    let url = spawn_server(data.clone(), mode);
    let client = http_client().expect("client");
    (RangeSource::new(client, url), data)
}

#[test]
fn prefetched_chunk_is_served_from_the_buffer() {
    let (mut source, data) = source(Mode::Ranged);

    source.seek_to(100).unwrap();
    source.prefetch(50).unwrap();

    let mut buf = [0u8; 25];
    source.read_full(&mut buf).unwrap();
    assert_eq!(buf, data[100..125]);
    source.read_full(&mut buf).unwrap();
    assert_eq!(buf, data[125..150]);
}

#[test]
fn read_without_prefetch_issues_an_exact_request() {
    let (mut source, data) = source(Mode::Ranged);

    source.seek_to(9_990).unwrap();
    let mut buf = [0u8; 10];
    source.read_full(&mut buf).unwrap();
    assert_eq!(buf, data[9_990..10_000]);
}

#[test]
fn read_outrunning_the_buffer_fetches_the_remainder() {
    let (mut source, data) = source(Mode::Ranged);

    source.seek_to(0).unwrap();
    source.prefetch(10).unwrap();

    let mut buf = [0u8; 30];
    source.read_full(&mut buf).unwrap();
    assert_eq!(buf[..], data[0..30]);
}

#[test]
fn seeking_discards_stale_buffered_bytes() {
    let (mut source, data) = source(Mode::Ranged);

    source.seek_to(0).unwrap();
    source.prefetch(100).unwrap();
    source.seek_to(5_000).unwrap();

    let mut buf = [0u8; 16];
    source.read_full(&mut buf).unwrap();
    assert_eq!(buf[..], data[5_000..5_016]);
}

#[test]
fn full_body_response_is_rejected() {
    let (mut source, _) = source(Mode::FullBody);

    source.seek_to(0).unwrap();
    let err = source.prefetch(100).unwrap_err();
    assert!(
        matches!(err, SourceError::RangeUnsupported { status: 200, .. }),
        "got {err:?}"
    );
}

#[test]
fn compressed_response_is_rejected() {
    let (mut source, _) = source(Mode::Gzipped);

    source.seek_to(0).unwrap();
    let err = source.prefetch(100).unwrap_err();
    assert!(matches!(err, SourceError::Compressed { .. }), "got {err:?}");
}

#[test]
fn missing_artifact_is_reported_as_not_found() {
    let (mut source, _) = source(Mode::NotFound);

    let err = source.prefetch(100).unwrap_err();
    assert!(matches!(err, SourceError::NotFound { .. }), "got {err:?}");
}

#[test]
fn short_body_is_rejected_with_counts() {
    let (mut source, _) = source(Mode::Short);

    let err = source.prefetch(100).unwrap_err();
    assert!(
        matches!(err, SourceError::ShortRead { got: 50, want: 100 }),
        "got {err:?}"
    );
}

#[test]
fn control_fetch_returns_the_whole_body() {
    let data = artifact();
    let url = spawn_server(data.clone(), Mode::FullBody);
    let client = http_client().unwrap();

    let body = fetch_control(&client, &url).unwrap();
    assert_eq!(body, data);
}

#[test]
fn control_fetch_surfaces_http_failures() {
    let url = spawn_server(Vec::new(), Mode::NotFound);
    let client = http_client().unwrap();

    let err = fetch_control(&client, &url).unwrap_err();
    assert!(
        matches!(err, FetchError::Status { status: 404, .. }),
        "got {err:?}"
    );
}
