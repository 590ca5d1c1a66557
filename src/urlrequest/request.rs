use crate::base::neterror::NetError;
use http::{HeaderMap, Method};
use url::Url;

/// A request as seen by the dispatch pipeline.
///
/// Carries everything an interceptor or protocol handler needs to decide
/// whether and how to produce a job.
#[derive(Debug, Clone)]
pub struct URLRequest {
    url: Url,
    method: Method,
    extra_headers: HeaderMap,
}

impl URLRequest {
    pub fn new(url_str: &str) -> Result<Self, NetError> {
        let url = Url::parse(url_str).map_err(|_| NetError::InvalidUrl)?;
        Ok(Self::from_url(url))
    }

    pub fn from_url(url: Url) -> Self {
        Self {
            url,
            method: Method::GET,
            extra_headers: HeaderMap::new(),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    pub fn extra_headers(&self) -> &HeaderMap {
        &self.extra_headers
    }

    pub fn add_header(&mut self, name: &str, value: &str) {
        if let (Ok(name), Ok(value)) = (
            http::header::HeaderName::try_from(name),
            http::HeaderValue::from_str(value),
        ) {
            self.extra_headers.insert(name, value);
        }
    }
}

impl PartialEq for URLRequest {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url && self.method == other.method
    }
}

impl Eq for URLRequest {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url() {
        assert_eq!(URLRequest::new("not a url"), Err(NetError::InvalidUrl));
    }

    #[test]
    fn test_scheme() {
        let req = URLRequest::new("custom://host/path").unwrap();
        assert_eq!(req.scheme(), "custom");
        assert_eq!(req.method(), &Method::GET);
    }

    #[test]
    fn test_headers() {
        let mut req = URLRequest::new("http://example.com/").unwrap();
        req.add_header("X-Custom", "value");
        req.add_header("bad header name\n", "x");
        assert_eq!(req.extra_headers().len(), 1);
    }
}
