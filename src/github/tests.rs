use super::*;
use crate::errors::TidyError;
use crate::github::client::parse_pull_requests;
use crate::remote::RepositoryId;
use reqwest::StatusCode;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

fn widgets() -> RepositoryId {
    RepositoryId {
        owner: "octo".to_string(),
        name: "widgets".to_string(),
    }
}

const MERGED_PR: &str = r#"[
  {
    "number": 10,
    "state": "closed",
    "title": "Add feature a",
    "merged_at": "2024-01-15T10:00:00Z",
    "head": { "ref": "feature/a", "sha": "8c14734b80ff0ffb93caefc85553c7c5b05cca1e" },
    "base": { "ref": "main" }
  }
]"#;

#[test]
fn test_parse_merged_pull_request() {
    let pr = parse_pull_requests(StatusCode::OK, MERGED_PR)
        .unwrap()
        .expect("one pull request");

    assert_eq!(pr.number, 10);
    assert_eq!(pr.state, "closed");
    assert_eq!(pr.merged_at.as_deref(), Some("2024-01-15T10:00:00Z"));
    assert_eq!(pr.head_ref, "feature/a");
    assert!(pr.is_merged());
}

#[test]
fn test_parse_open_pull_request_has_null_merged_at() {
    let body =
        r#"[{"number": 7, "state": "open", "merged_at": null, "head": {"ref": "feature/b"}}]"#;
    let pr = parse_pull_requests(StatusCode::OK, body).unwrap().unwrap();

    assert_eq!(pr.merged_at, None);
    assert!(!pr.is_merged());
}

#[test]
fn test_parse_closed_unmerged_pull_request() {
    let body = r#"[{"number": 8, "state": "closed", "head": {"ref": "feature/c"}}]"#;
    let pr = parse_pull_requests(StatusCode::OK, body).unwrap().unwrap();

    assert_eq!(pr.state, "closed");
    assert!(!pr.is_merged());
}

#[test]
fn test_empty_merged_at_is_not_merged() {
    let body = r#"[{"number": 9, "state": "closed", "merged_at": "", "head": {"ref": "x"}}]"#;
    let pr = parse_pull_requests(StatusCode::OK, body).unwrap().unwrap();
    assert!(!pr.is_merged());
}

#[test]
fn test_parse_no_pull_request() {
    assert_eq!(parse_pull_requests(StatusCode::OK, "[]").unwrap(), None);
}

#[test]
fn test_first_pull_request_wins() {
    let body = r#"[
        {"number": 2, "state": "open", "merged_at": null, "head": {"ref": "feature/a"}},
        {
            "number": 1,
            "state": "closed",
            "merged_at": "2023-05-01T00:00:00Z",
            "head": {"ref": "feature/a"}
        }
    ]"#;
    let pr = parse_pull_requests(StatusCode::OK, body).unwrap().unwrap();

    assert_eq!(pr.number, 2);
    assert!(!pr.is_merged());
}

#[test]
fn test_error_status_keeps_status_and_body() {
    let body =
        r#"{"message":"Bad credentials","documentation_url":"https://docs.github.com/rest"}"#;
    match parse_pull_requests(StatusCode::UNAUTHORIZED, body) {
        Err(TidyError::Api { status, body: error_body }) => {
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(error_body, body);
        }
        other => panic!("expected an API error, got {:?}", other),
    }
}

#[test]
fn test_error_message_mentions_status() {
    let error = parse_pull_requests(StatusCode::NOT_FOUND, "Not Found").unwrap_err();
    let message = error.to_string();
    assert!(message.contains("404"), "{}", message);
    assert!(message.contains("Not Found"), "{}", message);
}

#[test]
fn test_invalid_json_is_an_error() {
    let result = parse_pull_requests(StatusCode::OK, "{\"message\": \"not a list\"}");
    assert!(matches!(result, Err(TidyError::Json(_))));
}

#[test]
fn test_pulls_url() {
    let client = GitHubClient::new("token".to_string()).unwrap();
    assert_eq!(
        client.pulls_url(&widgets()),
        "https://api.github.com/repos/octo/widgets/pulls"
    );

    let client =
        GitHubClient::with_api_url("https://ghe.example.com/api/v3/", "t".to_string()).unwrap();
    assert_eq!(
        client.pulls_url(&widgets()),
        "https://ghe.example.com/api/v3/repos/octo/widgets/pulls"
    );
}

/// Answer a single HTTP request with `status` and `body`
///
/// Returns the base URL to hand to the client and a handle yielding the raw
/// request head that was received.
fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let response = format!(
            concat!(
                "HTTP/1.1 {}\r\n",
                "Content-Type: application/json\r\n",
                "Content-Length: {}\r\n",
                "Connection: close\r\n",
                "\r\n",
                "{}",
            ),
            status,
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).unwrap();
        String::from_utf8_lossy(&request).into_owned()
    });

    (url, handle)
}

#[test]
fn test_find_for_branch_sends_pulls_query() {
    let (url, server) = serve_once("200 OK", MERGED_PR);
    let client = GitHubClient::with_api_url(&url, "tok".to_string()).unwrap();

    let pr = client
        .find_for_branch(&widgets(), "feature/a")
        .unwrap()
        .expect("one pull request");
    let request = server.join().unwrap();

    let request_line = request.lines().next().unwrap();
    let expected = "GET /repos/octo/widgets/pulls?head=octo%3Afeature%2Fa&state=all&per_page=1 ";
    assert!(request_line.starts_with(expected), "{}", request_line);

    let headers = request.to_lowercase();
    assert!(headers.contains("\r\nauthorization: bearer tok\r\n"), "{}", request);
    assert!(headers.contains("\r\naccept: application/vnd.github+json\r\n"), "{}", request);
    assert!(headers.contains("\r\nx-github-api-version: 2022-11-28\r\n"), "{}", request);
    assert!(headers.contains("\r\nuser-agent: git-tidy/"), "{}", request);

    assert_eq!(pr.number, 10);
    assert_eq!(pr.head_ref, "feature/a");
    assert!(pr.is_merged());
}

#[test]
fn test_find_for_branch_error_status() {
    let (url, server) = serve_once("404 Not Found", r#"{"message":"Not Found"}"#);
    let client = GitHubClient::with_api_url(&url, "tok".to_string()).unwrap();

    let result = client.find_for_branch(&widgets(), "feature/a");
    server.join().unwrap();

    match result {
        Err(TidyError::Api { status, body }) => {
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert!(body.contains("Not Found"), "{}", body);
        }
        other => panic!("expected an API error, got {:?}", other),
    }
}

#[test]
fn test_mock_lookup_records_calls() {
    let lookup = MockPullRequestLookup::new()
        .with_merged("feature/a", 10)
        .with_failure("feature/c");

    let merged = lookup.find_for_branch(&widgets(), "feature/a").unwrap();
    assert!(merged.unwrap().is_merged());
    assert_eq!(lookup.find_for_branch(&widgets(), "feature/b").unwrap(), None);
    assert!(lookup.find_for_branch(&widgets(), "feature/c").is_err());

    let calls = lookup.get_calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0], ("octo/widgets".to_string(), "feature/a".to_string()));
}
