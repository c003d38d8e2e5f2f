//! Reqwest-backed transport adapter.
//!
//! This adapter owns wire details only: verb mapping, header forwarding, body
//! encoding and error mapping. It never interprets status codes; the
//! dispatcher does that.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, Url};
use tracing::debug;

use crate::domain::ports::{HttpTransport, TransportError, TransportRequest, TransportResponse};
use crate::domain::{FormPart, HttpMethod, MultipartForm, RequestBody};

const DEFAULT_USER_AGENT: &str = concat!("chatbot-console/", env!("CARGO_PKG_VERSION"));

/// Transport that performs one HTTP exchange per call with a shared client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport with the default user agent and reqwest's default
    /// timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder().user_agent(DEFAULT_USER_AGENT).build()?;
        Ok(Self { client })
    }

    /// Wrap an already configured client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let TransportRequest {
            method,
            url,
            headers,
            body,
        } = request;
        let target = Url::parse(&url).map_err(|error| {
            TransportError::invalid_request(format!("invalid request URL `{url}`: {error}"))
        })?;

        let multipart = matches!(body, Some(RequestBody::Multipart(_)));
        let mut builder = self.client.request(map_method(method), target);
        for (name, value) in forwarded_headers(headers, multipart) {
            builder = builder.header(name, value);
        }
        builder = match body {
            Some(RequestBody::Json(value)) => builder.body(serde_json::to_vec(&value).map_err(
                |error| TransportError::invalid_request(format!("unencodable JSON body: {error}")),
            )?),
            Some(RequestBody::Multipart(form)) => builder.multipart(build_form(form)?),
            None => builder,
        };

        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(map_transport_error)?;
        debug!(status, bytes = bytes.len(), "backend responded");
        Ok(TransportResponse {
            status,
            body: bytes.to_vec(),
        })
    }
}

const fn map_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Multipart bodies carry their own boundary content type, so any caller
/// supplied `Content-Type` is dropped for them.
fn forwarded_headers(
    headers: Vec<(String, String)>,
    multipart: bool,
) -> impl Iterator<Item = (String, String)> {
    headers
        .into_iter()
        .filter(move |(name, _)| !(multipart && name.eq_ignore_ascii_case("content-type")))
}

fn build_form(form: MultipartForm) -> Result<Form, TransportError> {
    form.into_parts()
        .into_iter()
        .try_fold(Form::new(), |acc, part| match part {
            FormPart::Text { name, value } => Ok(acc.text(name, value)),
            FormPart::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                let file = Part::bytes(bytes).file_name(file_name);
                let file = match content_type {
                    Some(mime) => file.mime_str(&mime).map_err(|error| {
                        TransportError::invalid_request(format!(
                            "invalid content type `{mime}` for part `{name}`: {error}"
                        ))
                    })?,
                    None => file,
                };
                Ok(acc.part(name, file))
            }
        })
}

fn map_transport_error(error: reqwest::Error) -> TransportError {
    if error.is_builder() {
        TransportError::invalid_request(error.to_string())
    } else {
        TransportError::network(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for the reqwest adapter, including loopback
    //! exchanges against a canned HTTP responder.

    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    const HEADER_END: &[u8] = b"\r\n\r\n";

    /// Accept one connection, capture the raw request, reply with `response`.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind loopback listener");
        let addr = listener.local_addr().expect("listener address");
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept connection");
            let raw = read_request(&mut socket).await;
            let reply = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket
                .write_all(reply.as_bytes())
                .await
                .expect("write response");
            socket.shutdown().await.ok();
            raw
        });
        (format!("http://{addr}"), handle)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buffer = Vec::new();
        let mut chunk = [0_u8; 1024];
        loop {
            let read = socket.read(&mut chunk).await.expect("read request");
            if read == 0 {
                break;
            }
            buffer.extend_from_slice(chunk.get(..read).expect("chunk bounds"));
            if let Some(end) = find(&buffer, HEADER_END) {
                let head = String::from_utf8_lossy(buffer.get(..end).expect("head bounds"));
                let length = content_length(&head);
                if buffer.len() >= end + HEADER_END.len() + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack
            .windows(needle.len())
            .position(|window| window == needle)
    }

    fn content_length(head: &str) -> usize {
        head.lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse().ok())
            .unwrap_or(0)
    }

    fn request(method: HttpMethod, url: String, body: Option<RequestBody>) -> TransportRequest {
        TransportRequest {
            method,
            url,
            headers: vec![
                ("Accept".into(), "application/json".into()),
                ("Content-Type".into(), "application/json".into()),
                ("Authorization".into(), "Bearer abc.def.ghi".into()),
            ],
            body,
        }
    }

    #[tokio::test]
    async fn forwards_headers_and_json_body() {
        let (base, server) = serve_once("200 OK", r#"{"status":1}"#).await;
        let transport = ReqwestTransport::new().expect("client builds");

        let response = transport
            .send(request(
                HttpMethod::Post,
                format!("{base}/api/v1/subscription"),
                Some(RequestBody::Json(json!({ "plan_id": 3 }))),
            ))
            .await
            .expect("exchange succeeds");

        assert_eq!(response.status, 200);
        assert_eq!(response.body, br#"{"status":1}"#.to_vec());
        let raw = server.await.expect("server task").to_ascii_lowercase();
        assert!(raw.starts_with("post /api/v1/subscription http/1.1"));
        assert!(raw.contains("authorization: bearer abc.def.ghi"));
        assert!(raw.ends_with(r#"{"plan_id":3}"#));
    }

    #[tokio::test]
    async fn returns_error_statuses_untouched() {
        let (base, server) = serve_once("401 Unauthorized", r#"{"message":"jwt expired"}"#).await;
        let transport = ReqwestTransport::new().expect("client builds");

        let response = transport
            .send(request(HttpMethod::Get, format!("{base}/api/v1/chatbots"), None))
            .await
            .expect("exchange succeeds");

        assert_eq!(response.status, 401);
        assert_eq!(response.body, br#"{"message":"jwt expired"}"#.to_vec());
        server.await.expect("server task");
    }

    #[tokio::test]
    async fn multipart_uses_boundary_content_type() {
        let (base, server) = serve_once("200 OK", r#"{"status":1}"#).await;
        let transport = ReqwestTransport::new().expect("client builds");
        let form = MultipartForm::new()
            .text("chatbot_name", "Helper")
            .file("logo", "logo.png", Some("image/png".into()), vec![1, 2, 3]);

        transport
            .send(request(
                HttpMethod::Post,
                format!("{base}/api/v1/chatbots/1/settings"),
                Some(RequestBody::Multipart(form)),
            ))
            .await
            .expect("exchange succeeds");

        let raw = server.await.expect("server task").to_ascii_lowercase();
        assert!(raw.contains("content-type: multipart/form-data; boundary="));
        assert!(!raw.contains("content-type: application/json\r\n"));
        assert!(raw.contains("name=\"chatbot_name\""));
        assert!(raw.contains("filename=\"logo.png\""));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind loopback listener");
        let addr = listener.local_addr().expect("listener address");
        drop(listener);
        let transport = ReqwestTransport::new().expect("client builds");

        let error = transport
            .send(request(HttpMethod::Get, format!("http://{addr}/"), None))
            .await
            .expect_err("nothing is listening");

        assert!(matches!(error, TransportError::Network { .. }));
    }

    #[tokio::test]
    async fn malformed_url_is_rejected_before_sending() {
        let transport = ReqwestTransport::new().expect("client builds");
        let error = transport
            .send(request(HttpMethod::Get, "not a url".into(), None))
            .await
            .expect_err("URL must parse");
        assert!(matches!(error, TransportError::InvalidRequest { .. }));
    }

    #[rstest]
    #[case(HttpMethod::Get, Method::GET)]
    #[case(HttpMethod::Post, Method::POST)]
    #[case(HttpMethod::Put, Method::PUT)]
    #[case(HttpMethod::Delete, Method::DELETE)]
    fn maps_every_verb(#[case] method: HttpMethod, #[case] expected: Method) {
        assert_eq!(map_method(method), expected);
    }

    #[rstest]
    #[case(false, 2)]
    #[case(true, 1)]
    fn drops_content_type_only_for_multipart(#[case] multipart: bool, #[case] expected: usize) {
        let headers = vec![
            ("Accept".to_owned(), "application/json".to_owned()),
            ("content-type".to_owned(), "multipart/form-data".to_owned()),
        ];
        assert_eq!(forwarded_headers(headers, multipart).count(), expected);
    }

    #[test]
    fn rejects_unparseable_part_mime() {
        let form = MultipartForm::new().file("logo", "logo.png", Some("not a mime".into()), vec![]);
        assert!(matches!(
            build_form(form),
            Err(TransportError::InvalidRequest { .. })
        ));
    }
}
