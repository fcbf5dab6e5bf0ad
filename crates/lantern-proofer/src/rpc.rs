//! Upstream request shaping.
//!
//! JSON-RPC envelopes are stringified deterministically, so re-entering a
//! builder after a suspension reproduces byte-identical payloads and lands
//! on the already-issued request. JSON-RPC error code −32602 is transient
//! (rotating providers disagree about parameter shapes): the request is
//! flipped back to pending and retried; every other upstream error is
//! terminal.

use log::debug;
use serde_json::Value;

use crate::proofer::{Interrupt, ProofError, ProoferCtx, Step};
use crate::state::{request_id, DataRequest, Encoding, HttpMethod, RequestType};

/// JSON-RPC error code treated as retryable.
const RETRYABLE_CODE: i64 = -32602;

fn issue(
    ctx: &mut ProoferCtx,
    request_type: RequestType,
    method: HttpMethod,
    encoding: Encoding,
    url: Option<String>,
    payload: Vec<u8>,
) -> Step<usize> {
    let id = request_id(method, url.as_deref().unwrap_or(""), &payload);
    if let Some(index) = ctx.state.index_of(&id) {
        let request = ctx.state.at(index);
        if request.is_pending() {
            return Err(Interrupt::Pending);
        }
        if let Some(error) = &request.error {
            return Err(ProofError::Rpc(error.clone()).into());
        }
        return Ok(index);
    }
    debug!(
        "issuing {:?} request ({} bytes payload)",
        request_type,
        payload.len()
    );
    ctx.state.add(DataRequest {
        id,
        chain_id: ctx.chain_id,
        request_type,
        method,
        encoding,
        url,
        payload,
        response: None,
        error: None,
    });
    Err(Interrupt::Pending)
}

/// Send a JSON-RPC call to the execution client, returning its `result`.
pub(crate) fn send_eth_rpc(ctx: &mut ProoferCtx, method: &str, params: &Value) -> Step<Value> {
    let payload = format!(
        "{{\"jsonrpc\":\"2.0\",\"method\":\"{method}\",\"params\":{params},\"id\":1}}"
    );
    let index = issue(
        ctx,
        RequestType::EthRpc,
        HttpMethod::Post,
        Encoding::Json,
        None,
        payload.into_bytes(),
    )?;

    let mut response: Value = {
        let request = ctx.state.at(index);
        let bytes = request.response.as_deref().unwrap_or(&[]);
        serde_json::from_slice(bytes)
            .map_err(|e| ProofError::Rpc(format!("invalid JSON response for {method}: {e}")))?
    };

    if let Some(error) = response.get("error") {
        match error {
            Value::Object(fields) => {
                let code = match fields.get("code") {
                    Some(Value::Number(n)) => n.as_i64(),
                    Some(Value::String(s)) => s.parse::<i64>().ok(),
                    _ => None,
                };
                if code == Some(RETRYABLE_CODE) {
                    debug!("retrying {method} after code {RETRYABLE_CODE}");
                    ctx.state.at_mut(index).retry();
                    return Err(Interrupt::Pending);
                }
                let message = fields
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or("unknown error");
                return Err(ProofError::Rpc(format!("error calling {method}: {message}")).into());
            }
            Value::String(message) => {
                return Err(
                    ProofError::Rpc(format!("error calling {method}: {message}")).into(),
                );
            }
            _ => {}
        }
    }

    match response.get_mut("result") {
        Some(result) if !result.is_null() => Ok(result.take()),
        _ => Err(ProofError::Rpc(format!("no result calling {method}")).into()),
    }
}

/// GET a beacon-API path, returning the raw response bytes.
fn get_beacon(ctx: &mut ProoferCtx, path: &str, encoding: Encoding) -> Step<Vec<u8>> {
    let index = issue(
        ctx,
        RequestType::BeaconApi,
        HttpMethod::Get,
        encoding,
        Some(path.to_string()),
        Vec::new(),
    )?;
    let request = ctx.state.at(index);
    Ok(request.response.clone().unwrap_or_default())
}

/// GET a beacon-API path that answers JSON.
pub(crate) fn get_beacon_json(ctx: &mut ProoferCtx, path: &str) -> Step<Value> {
    let bytes = get_beacon(ctx, path, Encoding::Json)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ProofError::Beacon(format!("invalid JSON from {path}: {e}")).into())
}

/// GET a beacon-API path that answers SSZ.
pub(crate) fn get_beacon_ssz(ctx: &mut ProoferCtx, path: &str) -> Step<Vec<u8>> {
    get_beacon(ctx, path, Encoding::Ssz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proofer::ProoferCtx;
    use serde_json::json;

    fn ctx() -> ProoferCtx {
        ProoferCtx::new("eth_getBalance", "[\"0x00\",\"latest\"]", 1).unwrap()
    }

    fn answer(ctx: &mut ProoferCtx, body: &str) {
        let request = ctx.state.open_requests().next().unwrap();
        request.set_response(body.as_bytes().to_vec());
    }

    #[test]
    fn test_result_extraction() {
        let mut ctx = ctx();
        assert!(matches!(
            send_eth_rpc(&mut ctx, "eth_blockNumber", &json!([])),
            Err(Interrupt::Pending)
        ));
        answer(&mut ctx, r#"{"jsonrpc":"2.0","id":1,"result":"0x10"}"#);
        let result = send_eth_rpc(&mut ctx, "eth_blockNumber", &json!([])).unwrap();
        assert_eq!(result, json!("0x10"));
    }

    #[test]
    fn test_identical_calls_share_one_request() {
        let mut ctx = ctx();
        let _ = send_eth_rpc(&mut ctx, "eth_blockNumber", &json!([]));
        let _ = send_eth_rpc(&mut ctx, "eth_blockNumber", &json!([]));
        assert_eq!(ctx.state.requests().len(), 1);
        let _ = send_eth_rpc(&mut ctx, "eth_chainId", &json!([]));
        assert_eq!(ctx.state.requests().len(), 2);
    }

    #[test]
    fn test_retryable_code_flips_back_to_pending() {
        let mut ctx = ctx();
        let _ = send_eth_rpc(&mut ctx, "eth_blockNumber", &json!([]));
        answer(
            &mut ctx,
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32602,"message":"try again"}}"#,
        );
        assert!(matches!(
            send_eth_rpc(&mut ctx, "eth_blockNumber", &json!([])),
            Err(Interrupt::Pending)
        ));
        // the request is pending again under the same id
        assert_eq!(ctx.state.requests().len(), 1);
        assert!(ctx.state.pending().is_some());
    }

    #[test]
    fn test_other_errors_are_terminal() {
        let mut ctx = ctx();
        let _ = send_eth_rpc(&mut ctx, "eth_blockNumber", &json!([]));
        answer(
            &mut ctx,
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"nope"}}"#,
        );
        assert!(matches!(
            send_eth_rpc(&mut ctx, "eth_blockNumber", &json!([])),
            Err(Interrupt::Failed(ProofError::Rpc(_)))
        ));
    }

    #[test]
    fn test_string_error_shape() {
        let mut ctx = ctx();
        let _ = send_eth_rpc(&mut ctx, "eth_blockNumber", &json!([]));
        answer(&mut ctx, r#"{"jsonrpc":"2.0","id":1,"error":"broken"}"#);
        assert!(matches!(
            send_eth_rpc(&mut ctx, "eth_blockNumber", &json!([])),
            Err(Interrupt::Failed(ProofError::Rpc(_)))
        ));
    }
}
