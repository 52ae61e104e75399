use super::{Account, ExchangeClient, OrderTicket, PlacedOrder, BETFAIR};
use crate::error::Error;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

const IDENTITY_URL: &str = "https://identitysso.betfair.com/api/login";
const ACCOUNT_URL: &str = "https://api.betfair.com/exchange/account/rest/v1.0";
const BETTING_URL: &str = "https://api.betfair.com/exchange/betting/rest/v1.0";

const ORDER_TYPE_LIMIT: &str = "LIMIT";
const TIME_IN_FORCE_FILL_OR_KILL: &str = "FILL_OR_KILL";
const PERSISTENCE_LAPSE: &str = "LAPSE";

const STATUS_SUCCESS: &str = "SUCCESS";
const ORDER_STATUS_EXECUTION_COMPLETE: &str = "EXECUTION_COMPLETE";

/// Betfair exchange client using interactive credentials. The session token
/// is obtained lazily on the first request and cached for the client's
/// lifetime.
#[derive(Debug)]
pub struct BetfairClient {
    http: reqwest::Client,
    username: String,
    password: String,
    key: String,
    session: Mutex<Option<String>>,
}

impl BetfairClient {
    pub fn new(http: reqwest::Client, username: String, password: String, key: String) -> Self {
        Self {
            http,
            username,
            password,
            key,
            session: Mutex::new(None),
        }
    }

    async fn session_token(&self) -> Result<String, Error> {
        let mut session = self.session.lock().await;

        if let Some(token) = session.as_ref() {
            return Ok(token.clone());
        }

        let response = self
            .http
            .post(IDENTITY_URL)
            .header("X-Application", &self.key)
            .header("Accept", "application/json")
            .form(&[("username", &self.username), ("password", &self.password)])
            .send()
            .await
            .map_err(|e| Error::Exchange(format!("error making 'login' request: {}", e)))?;

        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| Error::Exchange(format!("failed to parse login response: {}", e)))?;

        if login.status != STATUS_SUCCESS {
            return Err(Error::Exchange(format!(
                "login rejected with status {} and error '{}'",
                login.status,
                login.error.unwrap_or_default()
            )));
        }

        let token = login.token.unwrap_or_default();

        if token.is_empty() {
            return Err(Error::InvalidResponse(
                "login response did not contain a session token".to_string(),
            ));
        }

        *session = Some(token.clone());

        Ok(token)
    }

    async fn post<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        action: &str,
        body: &B,
    ) -> Result<T, Error> {
        let token = self.session_token().await?;

        let response = self
            .http
            .post(&url)
            .header("X-Application", &self.key)
            .header("X-Authentication", token)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Exchange(format!("error making '{}' request: {}", action, e)))?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Exchange(format!(
                "'{}' request returned {}: {}",
                action, status, body
            )));
        }

        response.json::<T>().await.map_err(|e| {
            Error::InvalidResponse(format!("failed to parse '{}' response: {}", action, e))
        })
    }
}

#[async_trait]
impl ExchangeClient for BetfairClient {
    async fn account(&self) -> Result<Account, Error> {
        let funds: AccountFundsResponse = self
            .post(
                format!("{}/getAccountFunds/", ACCOUNT_URL),
                "account funds",
                &serde_json::json!({}),
            )
            .await?;

        Ok(Account {
            balance: funds.available_to_bet_balance,
            exposure: funds.exposure,
            exposure_limit: funds.exposure_limit,
        })
    }

    async fn place_order(&self, order: &OrderTicket) -> Result<PlacedOrder, Error> {
        let request = build_place_order_request(order);

        let response: PlaceOrderResponse = self
            .post(
                format!("{}/placeOrders/", BETTING_URL),
                "place orders",
                &request,
            )
            .await?;

        let report = validate_place_order_response(order, &response)?;

        Ok(PlacedOrder {
            exchange: BETFAIR.to_string(),
            reference: report.bet_id.clone().unwrap_or_default(),
            placed_at: report.placed_date.clone().unwrap_or_default(),
        })
    }
}

fn build_place_order_request(order: &OrderTicket) -> PlaceOrderRequest {
    PlaceOrderRequest {
        market_id: order.market_id.clone(),
        instructions: vec![PlaceInstruction {
            order_type: ORDER_TYPE_LIMIT.to_string(),
            selection_id: order.runner_id,
            side: order.side.as_str().to_string(),
            limit_order: LimitOrder {
                size: (order.stake * 100.0).round() / 100.0,
                price: order.price,
                persistence_type: PERSISTENCE_LAPSE.to_string(),
                time_in_force: TIME_IN_FORCE_FILL_OR_KILL.to_string(),
            },
        }],
    }
}

/// Applies the three-stage placement contract: exactly one instruction
/// report, order status SUCCESS, instruction executed in full.
fn validate_place_order_response<'a>(
    order: &OrderTicket,
    response: &'a PlaceOrderResponse,
) -> Result<&'a InstructionReport, Error> {
    if response.instruction_reports.len() != 1 {
        return Err(Error::InvalidResponse(
            "response does not contain expected instruction report".to_string(),
        ));
    }

    let report = &response.instruction_reports[0];

    if response.status != STATUS_SUCCESS {
        return Err(Error::OrderFailure {
            market_id: order.market_id.clone(),
            runner_id: order.runner_id,
            status: report.status.clone(),
            error_code: report.error_code.clone().unwrap_or_default(),
        });
    }

    if report.order_status.as_deref() != Some(ORDER_STATUS_EXECUTION_COMPLETE) {
        return Err(Error::Unmatched {
            market_id: order.market_id.clone(),
            runner_id: order.runner_id,
            status: report.order_status.clone().unwrap_or_default(),
        });
    }

    Ok(report)
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    status: String,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountFundsResponse {
    available_to_bet_balance: f64,
    exposure: f64,
    exposure_limit: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlaceOrderRequest {
    market_id: String,
    instructions: Vec<PlaceInstruction>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlaceInstruction {
    order_type: String,
    selection_id: u64,
    side: String,
    limit_order: LimitOrder,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LimitOrder {
    size: f64,
    price: f64,
    persistence_type: String,
    time_in_force: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaceOrderResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    instruction_reports: Vec<InstructionReport>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstructionReport {
    #[serde(default)]
    status: String,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    order_status: Option<String>,
    #[serde(default)]
    bet_id: Option<String>,
    #[serde(default)]
    placed_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Side;

    fn order() -> OrderTicket {
        OrderTicket {
            market_id: "1.18277761".to_string(),
            runner_id: 47972,
            price: 1.95,
            stake: 10.556,
            side: Side::Back,
        }
    }

    fn report(status: &str, order_status: Option<&str>, error_code: Option<&str>) -> InstructionReport {
        InstructionReport {
            status: status.to_string(),
            error_code: error_code.map(str::to_string),
            order_status: order_status.map(str::to_string),
            bet_id: Some("BET-1".to_string()),
            placed_date: Some("2020-03-07T15:00:01Z".to_string()),
        }
    }

    #[test]
    fn order_request_is_a_single_fill_or_kill_limit_instruction() {
        let request = build_place_order_request(&order());

        assert_eq!(request.instructions.len(), 1);

        let instruction = &request.instructions[0];
        assert_eq!(instruction.order_type, "LIMIT");
        assert_eq!(instruction.side, "BACK");
        assert_eq!(instruction.limit_order.time_in_force, "FILL_OR_KILL");
        assert_eq!(instruction.limit_order.persistence_type, "LAPSE");
        // Stake is rounded to two decimal places before submission.
        assert_eq!(instruction.limit_order.size, 10.56);
    }

    #[test]
    fn a_completed_instruction_passes_validation() {
        let response = PlaceOrderResponse {
            status: "SUCCESS".to_string(),
            instruction_reports: vec![report("SUCCESS", Some("EXECUTION_COMPLETE"), None)],
        };

        let validated = validate_place_order_response(&order(), &response).unwrap();
        assert_eq!(validated.bet_id.as_deref(), Some("BET-1"));
    }

    #[test]
    fn a_missing_instruction_report_is_an_invalid_response() {
        let response = PlaceOrderResponse {
            status: "SUCCESS".to_string(),
            instruction_reports: vec![],
        };

        let err = validate_place_order_response(&order(), &response).unwrap_err();
        assert!(matches!(err, Error::InvalidResponse(_)));
    }

    #[test]
    fn a_failed_order_preserves_the_broker_error_code() {
        let response = PlaceOrderResponse {
            status: "FAILURE".to_string(),
            instruction_reports: vec![report(
                "FAILURE",
                None,
                Some("INSUFFICIENT_FUNDS"),
            )],
        };

        let err = validate_place_order_response(&order(), &response).unwrap_err();

        match err {
            Error::OrderFailure { error_code, .. } => {
                assert_eq!(error_code, "INSUFFICIENT_FUNDS");
            }
            other => panic!("expected OrderFailure, got {:?}", other),
        }
    }

    #[test]
    fn an_unfilled_instruction_is_an_unmatched_error() {
        let response = PlaceOrderResponse {
            status: "SUCCESS".to_string(),
            instruction_reports: vec![report("SUCCESS", Some("EXPIRED"), None)],
        };

        let err = validate_place_order_response(&order(), &response).unwrap_err();

        match err {
            Error::Unmatched { status, .. } => assert_eq!(status, "EXPIRED"),
            other => panic!("expected Unmatched, got {:?}", other),
        }
    }

    #[test]
    fn place_order_payload_uses_the_exchange_field_names() {
        let request = build_place_order_request(&order());
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["marketId"], "1.18277761");
        assert_eq!(value["instructions"][0]["orderType"], "LIMIT");
        assert_eq!(value["instructions"][0]["selectionId"], 47972);
        assert_eq!(
            value["instructions"][0]["limitOrder"]["timeInForce"],
            "FILL_OR_KILL"
        );
    }
}
