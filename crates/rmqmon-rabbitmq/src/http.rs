//! reqwest-backed implementation of [`ManagementApi`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::ManagementApi;
use crate::error::{ClientError, ClientResult};
use crate::snapshot::{Connection, Node, Overview, PeekedMessage, Queue};

/// Where and how to reach one broker's management plugin.
#[derive(Clone)]
pub struct ManagementEndpoint {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Upper bound for each request, connect included.
    pub timeout: Duration,
}

impl std::fmt::Debug for ManagementEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagementEndpoint")
            .field("scheme", &self.scheme)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct GetMessagesRequest<'a> {
    count: u32,
    requeue: bool,
    ackmode: &'a str,
    encoding: &'a str,
    truncate: u32,
}

/// Management API client for one broker. Built once per source per cycle.
pub struct HttpManagementClient {
    http: reqwest::Client,
    base: Url,
    username: String,
    password: String,
}

impl HttpManagementClient {
    pub fn new(endpoint: &ManagementEndpoint) -> ClientResult<Self> {
        let raw = format!("{}://{}:{}/", endpoint.scheme, endpoint.host, endpoint.port);
        let base = Url::parse(&raw)
            .map_err(|e| ClientError::InvalidEndpoint(format!("{}: {}", raw, e)))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidEndpoint(raw));
        }

        let http = reqwest::Client::builder()
            .connect_timeout(endpoint.timeout)
            .timeout(endpoint.timeout)
            .build()
            .map_err(|e| ClientError::InvalidEndpoint(e.to_string()))?;

        Ok(Self {
            http,
            base,
            username: endpoint.username.clone(),
            password: endpoint.password.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Build `<base>/api/<segments...>`, percent-encoding each segment so a
    /// vhost of `/` becomes `%2F`.
    pub fn api_url(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidEndpoint(self.base.to_string()))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    async fn call<T, B>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.api_url(segments)?;
        let endpoint = url.path().to_string();
        tracing::trace!(%method, %endpoint, "management API request");

        let mut request = self
            .http
            .request(method, url)
            .basic_auth(&self.username, Some(&self.password));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| ClientError::Transport {
            endpoint: endpoint.clone(),
            message: e.to_string(),
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| ClientError::Transport {
            endpoint: endpoint.clone(),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(ClientError::Api {
                endpoint,
                status: status.as_u16(),
                message: text,
            });
        }

        serde_json::from_str(&text).map_err(|e| ClientError::Decode {
            endpoint,
            message: e.to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> ClientResult<T> {
        self.call::<T, ()>(Method::GET, segments, None).await
    }
}

#[async_trait]
impl ManagementApi for HttpManagementClient {
    async fn overview(&self) -> ClientResult<Overview> {
        self.get(&["overview"]).await
    }

    async fn connections(&self) -> ClientResult<Option<Vec<Connection>>> {
        self.get(&["connections"]).await
    }

    async fn nodes(&self) -> ClientResult<Option<Vec<Node>>> {
        self.get(&["nodes"]).await
    }

    async fn queues(&self) -> ClientResult<Option<Vec<Queue>>> {
        self.get(&["queues"]).await
    }

    async fn peek_queue(
        &self,
        vhost: &str,
        queue: &str,
        count: u32,
        requeue: bool,
    ) -> ClientResult<Vec<PeekedMessage>> {
        // `requeue` is what pre-3.7 brokers read, `ackmode` what later ones do.
        let body = GetMessagesRequest {
            count,
            requeue,
            ackmode: if requeue { "ack_requeue_true" } else { "ack_requeue_false" },
            encoding: "auto",
            truncate: 50_000,
        };
        let messages: Option<Vec<PeekedMessage>> = self
            .call(Method::POST, &["queues", vhost, queue, "get"], Some(&body))
            .await?;
        Ok(messages.unwrap_or_default())
    }
}
