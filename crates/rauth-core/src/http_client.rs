#![cfg(feature = "http")]

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::errors::LoginError;
use crate::login::{HttpExecutor, HttpRequest, HttpResponse};

/// [`HttpExecutor`] over a rustls `reqwest` client.
#[derive(Clone)]
pub struct ReqwestExecutor {
    client: reqwest::Client,
}

impl ReqwestExecutor {
    pub fn new() -> Result<Self, LoginError> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .build()
            .map_err(|e| LoginError::Http(e.to_string()))?;
        Ok(Self { client })
    }
}

fn header_map(headers: &[(String, String)]) -> Result<HeaderMap, LoginError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| LoginError::Http(format!("header name {:?}: {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| LoginError::Http(format!("header {}: {}", name, e)))?;
        map.append(name, value);
    }
    Ok(map)
}

#[async_trait]
impl HttpExecutor for ReqwestExecutor {
    async fn post_json(&self, request: HttpRequest) -> Result<HttpResponse, LoginError> {
        let resp = self
            .client
            .post(&request.url)
            .headers(header_map(&request.headers)?)
            .body(request.body)
            .send()
            .await
            .map_err(|e| LoginError::Http(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| LoginError::Http(e.to_string()))?;
        Ok(HttpResponse { status, body })
    }
}
