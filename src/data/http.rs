use super::{
    FixtureClient, FixtureDetail, MarketClient, MarketRunner, MarketRunnerRequest, MatchResult,
    ResultClient, TeamResultRequest,
};
use crate::error::Error;
use async_trait::async_trait;
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

fn build_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_default()
}

/// Fixture and result lookups against the data service REST API.
pub struct DataServiceClient {
    client: reqwest::Client,
    base_url: String,
}

impl DataServiceClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: build_http_client(),
            base_url,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, String)],
    ) -> Result<T, Error> {
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::DataService(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::DataService(format!(
                "request to {} returned {}: {}",
                url, status, body
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::DataService(format!("failed to parse response from {}: {}", url, e)))
    }
}

#[async_trait]
impl FixtureClient for DataServiceClient {
    async fn by_id(&self, fixture_id: u64) -> Result<FixtureDetail, Error> {
        let url = format!("{}/fixtures/{}", self.base_url, fixture_id);
        self.get_json(url, &[]).await
    }
}

#[async_trait]
impl ResultClient for DataServiceClient {
    async fn by_id(&self, fixture_id: u64) -> Result<MatchResult, Error> {
        let url = format!("{}/results/{}", self.base_url, fixture_id);
        self.get_json(url, &[]).await
    }

    async fn by_team(&self, req: &TeamResultRequest) -> Result<Vec<MatchResult>, Error> {
        let url = format!("{}/teams/{}/results", self.base_url, req.team_id);
        let season_ids = req
            .season_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let query = [
            ("limit", req.limit.to_string()),
            ("dateBefore", req.date_before.to_rfc3339()),
            ("seasonIds", season_ids),
            ("venue", req.venue.as_str().to_string()),
        ];

        self.get_json(url, &query).await
    }
}

/// Streams historical market runners from the odds warehouse search endpoint.
/// The endpoint responds with newline-delimited JSON; runners are decoded as
/// the body arrives and fed into a bounded channel so back-pressure reaches
/// the wire.
pub struct OddsWarehouseClient {
    client: reqwest::Client,
    base_url: String,
}

impl OddsWarehouseClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: build_http_client(),
            base_url,
        }
    }
}

impl MarketClient for OddsWarehouseClient {
    fn market_runner_search(
        &self,
        req: MarketRunnerRequest,
    ) -> (mpsc::Receiver<MarketRunner>, oneshot::Receiver<Error>) {
        let (tx, rx) = mpsc::channel(1000);
        let (err_tx, err_rx) = oneshot::channel();

        let client = self.client.clone();
        let url = format!("{}/market-runners/search", self.base_url);

        tokio::spawn(async move {
            if let Err(e) = stream_market_runners(client, url, req, tx).await {
                let _ = err_tx.send(e);
            }
        });

        (rx, err_rx)
    }
}

async fn stream_market_runners(
    client: reqwest::Client,
    url: String,
    req: MarketRunnerRequest,
    tx: mpsc::Sender<MarketRunner>,
) -> Result<(), Error> {
    let response = client
        .post(&url)
        .json(&req)
        .send()
        .await
        .map_err(|e| Error::DataService(format!("request to {} failed: {}", url, e)))?;

    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::DataService(format!(
            "request to {} returned {}: {}",
            url, status, body
        )));
    }

    let mut body = response.bytes_stream();
    let mut buffer: Vec<u8> = Vec::new();

    while let Some(chunk) = body.next().await {
        let chunk = chunk
            .map_err(|e| Error::DataService(format!("error reading market runner stream: {}", e)))?;

        buffer.extend_from_slice(&chunk);

        while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = buffer.drain(..=pos).collect();

            if !send_runner(&line[..line.len() - 1], &tx).await? {
                return Ok(());
            }
        }
    }

    // Trailing runner without a final newline.
    if !buffer.is_empty() {
        send_runner(&buffer, &tx).await?;
    }

    Ok(())
}

/// Returns Ok(false) when the consumer has gone away and streaming should stop.
async fn send_runner(line: &[u8], tx: &mpsc::Sender<MarketRunner>) -> Result<bool, Error> {
    if line.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(true);
    }

    let runner: MarketRunner = serde_json::from_slice(line)
        .map_err(|e| Error::DataService(format!("failed to parse market runner: {}", e)))?;

    Ok(tx.send(runner).await.is_ok())
}
