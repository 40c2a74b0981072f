use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, Method, Proxy, Response, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde_json::Value;
use url::Url;

use crate::auth::SessionContext;
use crate::client_trait::ResourceClient;
use crate::config::Config;
use crate::error::{GraphError, Result};
use crate::utils::http_utils::execute_request;

const USER_AGENT: &str = concat!("scope-tag/", env!("CARGO_PKG_VERSION"));

/// `ResourceClient` backed by Microsoft Graph.
#[derive(Debug, Clone)]
pub struct GraphClient {
    client: Arc<ClientWithMiddleware>,
    api_root: Url,
}

impl GraphClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Self::build_http_client(config)?;
        let retry_client = Self::build_retry_client(client, config.max_retries);
        Ok(GraphClient {
            client: Arc::new(retry_client),
            api_root: Self::api_root(config)?,
        })
    }

    fn build_http_client(config: &Config) -> Result<Client> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if !config.http_proxy.is_empty() {
            builder = builder.proxy(Proxy::http(&config.http_proxy)?);
        }
        if !config.https_proxy.is_empty() {
            builder = builder.proxy(Proxy::https(&config.https_proxy)?);
        }
        Ok(builder.build()?)
    }

    fn build_retry_client(client: Client, max_retries: u32) -> ClientWithMiddleware {
        // Transient failures only; 0 retries sends each request once.
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);

        ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build()
    }

    /// `{base}/{version}/` with exactly one slash between the parts, so that
    /// relative resource paths join underneath it.
    fn api_root(config: &Config) -> Result<Url> {
        let base = config.graph_base_url.trim_end_matches('/');
        let version = config.api_version.trim_matches('/');
        Ok(Url::parse(&format!("{base}/{version}/"))?)
    }

    pub fn resource_url(&self, resource_path: &str) -> Result<Url> {
        Ok(self.api_root.join(resource_path.trim_start_matches('/'))?)
    }

    async fn error_from_response(response: Response) -> GraphError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        error!("Graph request failed with status {status}: {body}");
        GraphError::Api { status, body }
    }
}

#[async_trait]
impl ResourceClient for GraphClient {
    async fn get(&self, session: &SessionContext, resource_path: &str) -> Result<Option<Value>> {
        let url = self.resource_url(resource_path)?;
        let response = execute_request::<Value>(
            &self.client,
            Method::GET,
            url,
            &session.access_token,
            None,
        )
        .await?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!("{resource_path} not found");
                Ok(None)
            }
            status if status.is_success() => Ok(Some(response.json::<Value>().await?)),
            _ => Err(Self::error_from_response(response).await),
        }
    }

    async fn patch(
        &self,
        session: &SessionContext,
        resource_path: &str,
        body: &Value,
    ) -> Result<()> {
        let url = self.resource_url(resource_path)?;
        let response = execute_request(
            &self.client,
            Method::PATCH,
            url,
            &session.access_token,
            Some(body),
        )
        .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_from_response(response).await)
        }
    }
}
