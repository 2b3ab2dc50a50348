use crate::error::MapError;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Where the point data comes from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    Url(String),
}

impl Source {
    /// http(s) locations are fetched over the network, anything else is a path
    pub fn parse(s: &str) -> Self {
        let lower = s.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Source::Url(s.to_string())
        } else {
            Source::File(PathBuf::from(s))
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::File(path) => write!(f, "{}", path.display()),
            Source::Url(url) => f.write_str(url),
        }
    }
}

/// Declared shape of fetched content
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentKind {
    Xml,
    Json,
    Unknown,
}

impl ContentKind {
    pub fn from_content_type(content_type: &str) -> Self {
        let ct = content_type.to_ascii_lowercase();
        if ct.contains("xml") {
            ContentKind::Xml
        } else if ct.contains("json") {
            ContentKind::Json
        } else {
            ContentKind::Unknown
        }
    }

    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("kml" | "xml") => ContentKind::Xml,
            Some("json" | "geojson" | "umap") => ContentKind::Json,
            _ => ContentKind::Unknown,
        }
    }
}

/// Raw content plus what the transport said about it
#[derive(Debug)]
pub struct Fetched {
    pub content: String,
    pub kind: ContentKind,
    /// `Date` header of the response; local files carry none
    pub updated: Option<String>,
}

/// Read a file or perform a single blocking GET. No retries.
pub fn fetch(source: &Source) -> Result<Fetched, MapError> {
    match source {
        Source::File(path) => {
            let content = fs::read_to_string(path).map_err(|source| {
                log::error!("error: {source}");
                MapError::Io {
                    path: path.display().to_string(),
                    source,
                }
            })?;
            Ok(Fetched {
                content,
                kind: ContentKind::from_path(path),
                updated: None,
            })
        }
        Source::Url(url) => fetch_url(url).map_err(|e| {
            log::error!("error: {e}");
            MapError::Network {
                url: url.clone(),
                message: e.to_string(),
            }
        }),
    }
}

fn fetch_url(url: &str) -> Result<Fetched, reqwest::Error> {
    let response = reqwest::blocking::get(url)?.error_for_status()?;
    let header = |name: reqwest::header::HeaderName| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let kind = header(reqwest::header::CONTENT_TYPE)
        .map(|ct| ContentKind::from_content_type(&ct))
        .unwrap_or(ContentKind::Unknown);
    let updated = header(reqwest::header::DATE);
    let content = response.text()?;
    Ok(Fetched {
        content,
        kind,
        updated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve one canned HTTP response on a local port and return its URL
    fn serve_once(status: &'static str, headers: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
                line.clear();
            }
            let mut stream = reader.into_inner();
            write!(
                stream,
                "HTTP/1.1 {status}\r\n{headers}Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .unwrap();
        });
        format!("http://{addr}/map.kml")
    }

    #[rstest]
    #[case("application/vnd.google-earth.kml+xml", ContentKind::Xml)]
    #[case("text/xml; charset=utf-8", ContentKind::Xml)]
    #[case("application/json", ContentKind::Json)]
    #[case("application/geo+json", ContentKind::Json)]
    #[case("text/plain", ContentKind::Unknown)]
    fn test_content_type(#[case] ct: &str, #[case] kind: ContentKind) {
        assert_eq!(ContentKind::from_content_type(ct), kind);
    }

    #[rstest]
    #[case("shelters.KML", ContentKind::Xml)]
    #[case("map.umap", ContentKind::Json)]
    #[case("data.geojson", ContentKind::Json)]
    #[case("data.txt", ContentKind::Unknown)]
    #[case("data", ContentKind::Unknown)]
    fn test_extension(#[case] path: &str, #[case] kind: ContentKind) {
        assert_eq!(ContentKind::from_path(Path::new(path)), kind);
    }

    #[test]
    fn test_source_parse() {
        assert_eq!(
            Source::parse("HTTPS://example.org/a.kml"),
            Source::Url("HTTPS://example.org/a.kml".into())
        );
        assert_eq!(
            Source::parse("data/a.kml"),
            Source::File(PathBuf::from("data/a.kml"))
        );
    }

    #[test]
    fn test_fetch_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"layers": []}}"#).unwrap();
        let fetched = fetch(&Source::File(file.path().to_path_buf())).unwrap();
        assert_eq!(fetched.kind, ContentKind::Json);
        assert_eq!(fetched.content, r#"{"layers": []}"#);
        assert!(fetched.updated.is_none());
    }

    #[test]
    fn test_fetch_missing_file() {
        let err = fetch(&Source::File(PathBuf::from("/nonexistent/points.kml"))).unwrap_err();
        assert!(matches!(err, MapError::Io { .. }));
    }

    #[test]
    fn test_fetch_url_reads_kind_and_date() {
        let url = serve_once(
            "200 OK",
            "Content-Type: application/vnd.google-earth.kml+xml\r\nDate: Mon, 19 Oct 2026 08:00:00 GMT\r\n",
            "<kml/>",
        );
        let fetched = fetch(&Source::Url(url)).unwrap();
        assert_eq!(fetched.kind, ContentKind::Xml);
        assert_eq!(fetched.content, "<kml/>");
        assert_eq!(fetched.updated.as_deref(), Some("Mon, 19 Oct 2026 08:00:00 GMT"));
    }

    #[test]
    fn test_fetch_url_error_status_is_network_error() {
        let url = serve_once("404 Not Found", "", "");
        let err = fetch(&Source::Url(url.clone())).unwrap_err();
        assert!(matches!(err, MapError::Network { url: ref u, .. } if *u == url));
    }

    #[test]
    fn test_fetch_refused_port_is_network_error() {
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let err = fetch(&Source::Url(format!("http://127.0.0.1:{port}/map.json"))).unwrap_err();
        assert!(matches!(err, MapError::Network { .. }));
    }
}
