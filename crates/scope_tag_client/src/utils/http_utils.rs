use std::error::Error;

use log::{debug, error, info};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Response};
use reqwest_middleware::ClientWithMiddleware;
use serde::Serialize;
use url::Url;

use crate::error::Result;

/// Executes an authenticated Graph request.
/// Note: transient-failure retries happen in the middleware stack, not here.
pub async fn execute_request<T: Serialize + ?Sized>(
    client: &ClientWithMiddleware,
    method: Method,
    url: Url,
    bearer_token: &str,
    json_body: Option<&T>,
) -> Result<Response> {
    let mut request_builder = client
        .request(method.clone(), url.clone())
        .header(AUTHORIZATION, format!("Bearer {}", bearer_token))
        .header(ACCEPT, "application/json");

    if let Some(body) = json_body {
        request_builder = request_builder
            .header(CONTENT_TYPE, "application/json")
            .json(body);
    }

    info!("Sending {} request to {}", method.as_str(), url);
    let start_time = std::time::Instant::now();

    match request_builder.send().await {
        Ok(resp) => {
            info!(
                "Got response from {} after {:?} with status {}",
                url,
                start_time.elapsed(),
                resp.status()
            );
            debug!("Response headers: {:?}", resp.headers());
            Ok(resp)
        }
        Err(e) => {
            error!("Failed HTTP request to {}: {}", url, e);
            if let Some(source) = e.source() {
                debug!("Error source: {:?}", source);
            }
            if let reqwest_middleware::Error::Reqwest(inner) = &e {
                if inner.is_timeout() {
                    error!("Request timed out");
                }
                if inner.is_connect() {
                    error!("Connection error");
                }
            }
            Err(e.into())
        }
    }
}
