use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use tracing::Span;

use crate::error::{MultiShotError, Result};

use super::{GraphClient, QueryResults, SPARQL_RESULTS_JSON};

const MAX_ERROR_BODY_CHARS: usize = 512;

#[derive(Debug, Clone)]
pub struct SparqlClientConfig {
    pub query_endpoint: String,
    pub email: Option<String>,
    pub password: Option<String>,
    pub timeout_ms: Option<u64>,
}

/// Blocking client for the VIVO SPARQL query API.
#[derive(Clone)]
pub struct SparqlClient {
    config: SparqlClientConfig,
    http: Client,
    span: Span,
}

impl std::fmt::Debug for SparqlClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SparqlClient")
            .field("query_endpoint", &self.config.query_endpoint)
            .field("email", &self.config.email)
            .finish_non_exhaustive()
    }
}

impl SparqlClient {
    pub fn new(config: SparqlClientConfig) -> Result<Self> {
        let endpoint = config.query_endpoint.trim();
        if endpoint.is_empty() {
            return Err(MultiShotError::Config(
                "query_endpoint must not be empty".to_string(),
            ));
        }
        reqwest::Url::parse(endpoint).map_err(|err| {
            MultiShotError::Config(format!("invalid query_endpoint {endpoint}: {err}"))
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(SPARQL_RESULTS_JSON));

        let mut builder = Client::builder().default_headers(headers);
        // The blocking client defaults to 30s; unset `timeout_ms` means no timeout.
        builder = match config.timeout_ms {
            Some(ms) => builder.timeout(Duration::from_millis(ms)),
            None => builder.timeout(None::<Duration>),
        };
        let http = builder.build()?;

        Ok(Self {
            config,
            http,
            span: Span::none(),
        })
    }

    /// Parent span for the client's own events, usually the run span.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

impl GraphClient for SparqlClient {
    fn run_query(&self, query: &str) -> Result<QueryResults> {
        let mut form = Vec::with_capacity(3);
        if let Some(email) = &self.config.email {
            form.push(("email", email.as_str()));
        }
        if let Some(password) = &self.config.password {
            form.push(("password", password.as_str()));
        }
        form.push(("query", query));

        tracing::debug!(
            parent: &self.span,
            endpoint = %self.config.query_endpoint,
            query_len = query.len(),
            "sending sparql query"
        );
        let resp = self
            .http
            .post(self.config.query_endpoint.trim())
            .form(&form)
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .unwrap_or_default()
                .chars()
                .take(MAX_ERROR_BODY_CHARS)
                .collect::<String>();
            return Err(MultiShotError::Endpoint {
                status: status.as_u16(),
                body,
            });
        }

        let raw = resp.text()?;
        QueryResults::parse(&raw)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    use super::*;

    /// Accepts one request, answers it with `status` and `body`, and hands
    /// back the raw request text.
    fn one_shot_server(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let endpoint = format!(
            "http://{}/vivo/api/sparqlQuery",
            listener.local_addr().expect("addr")
        );
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream);
            let mut head = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                let read = reader.read_line(&mut line).expect("read line");
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().expect("content length");
                    }
                }
                let done = read == 0 || line == "\r\n";
                head.push_str(&line);
                if done {
                    break;
                }
            }
            let mut form = vec![0u8; content_length];
            reader.read_exact(&mut form).expect("read body");
            head.push_str(&String::from_utf8(form).expect("utf8 body"));

            let mut stream = reader.into_inner();
            write!(
                stream,
                "HTTP/1.1 {status}\r\ncontent-type: application/sparql-results+json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            )
            .expect("write response");
            head
        });
        (endpoint, handle)
    }

    fn config(endpoint: &str) -> SparqlClientConfig {
        SparqlClientConfig {
            query_endpoint: endpoint.to_string(),
            email: Some("vivo_root@example.org".to_string()),
            password: Some("secret".to_string()),
            timeout_ms: None,
        }
    }

    #[test]
    fn new_rejects_empty_endpoint() {
        let err = SparqlClient::new(config("  ")).expect_err("must fail");
        assert!(matches!(err, MultiShotError::Config(_)));
    }

    #[test]
    fn new_rejects_unparseable_endpoint() {
        let err = SparqlClient::new(config("not a url")).expect_err("must fail");
        assert!(matches!(err, MultiShotError::Config(_)));
    }

    #[test]
    fn debug_output_omits_password() {
        let client =
            SparqlClient::new(config("http://localhost:8080/vivo/api/sparqlQuery")).expect("client");
        let rendered = format!("{client:?}");
        assert!(rendered.contains("sparqlQuery"));
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn run_query_posts_credentials_and_query_as_form() {
        let (endpoint, server) = one_shot_server(
            "200 OK",
            r#"{"head":{"vars":["pub"]},"results":{"bindings":[{"pub":{"type":"uri","value":"http://ex.org/p1"}}]}}"#,
        );
        let client = SparqlClient::new(config(&endpoint)).expect("client");

        let results = client.run_query("SELECT ?pub WHERE { ?pub a ?t }").expect("query");
        assert_eq!(results.rows()[0].value("pub"), Some("http://ex.org/p1"));

        let request = server.join().expect("server thread");
        let lower = request.to_ascii_lowercase();
        assert!(request.starts_with("POST /vivo/api/sparqlQuery HTTP/1.1\r\n"), "{request}");
        assert!(lower.contains("accept: application/sparql-results+json\r\n"), "{request}");
        assert!(lower.contains("content-type: application/x-www-form-urlencoded"), "{request}");
        assert!(
            request.ends_with(
                "email=vivo_root%40example.org&password=secret\
                 &query=SELECT+%3Fpub+WHERE+%7B+%3Fpub+a+%3Ft+%7D"
            ),
            "{request}"
        );
    }

    #[test]
    fn non_success_status_is_endpoint_error_with_body() {
        let (endpoint, server) = one_shot_server("500 Internal Server Error", "boom");
        let client = SparqlClient::new(config(&endpoint)).expect("client");

        let err = client.run_query("SELECT * WHERE { ?s ?p ?o }").expect_err("must fail");
        server.join().expect("server thread");
        match err {
            MultiShotError::Endpoint { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("expected endpoint error, got {other:?}"),
        }
    }
}
