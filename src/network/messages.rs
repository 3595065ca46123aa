//! Pool protocol frames
//!
//! The pool speaks newline-delimited JSON-RPC without a version field:
//! notifications carry `"id": null`, responses carry `result` and `error`.

use crate::miner::{Job, Share};
use crate::utils::error::MinerError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Subscription request method
pub const SUBSCRIBE: &str = "mining.subscribe";
/// Authorization request method
pub const AUTHORIZE: &str = "mining.authorize";
/// Share submission method
pub const SUBMIT: &str = "mining.submit";
/// New job notification
pub const NOTIFY: &str = "mining.notify";
/// Difficulty change notification
pub const SET_DIFFICULTY: &str = "mining.set_difficulty";

/// JSON-RPC message envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    /// Request or notification (null id)
    Request {
        /// Message id, `None` for notifications
        id: Option<u64>,
        /// Method name
        method: String,
        /// Positional parameters
        params: Value,
    },
    /// Response to a numbered request
    Response {
        /// Id of the request being answered
        id: u64,
        /// Result value on success
        #[serde(default)]
        result: Option<Value>,
        /// Error value on failure
        #[serde(default)]
        error: Option<Value>,
    },
}

impl JsonRpcMessage {
    /// Builds a numbered request
    pub fn request(id: u64, method: impl Into<String>, params: Value) -> Self {
        JsonRpcMessage::Request {
            id: Some(id),
            method: method.into(),
            params,
        }
    }

    /// Builds a notification
    pub fn notification(method: impl Into<String>, params: Value) -> Self {
        JsonRpcMessage::Request {
            id: None,
            method: method.into(),
            params,
        }
    }

    /// Builds a response
    pub fn response(id: u64, result: Option<Value>, error: Option<Value>) -> Self {
        JsonRpcMessage::Response { id, result, error }
    }

    /// Method name for requests
    pub fn method(&self) -> Option<&str> {
        match self {
            JsonRpcMessage::Request { method, .. } => Some(method),
            JsonRpcMessage::Response { .. } => None,
        }
    }
}

/// Session data returned by the subscribe acknowledgement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subscription {
    /// Pool-assigned extranonce prefix
    pub extranonce1: Vec<u8>,
    /// Size in bytes of the miner-chosen extranonce suffix
    pub extranonce2_size: usize,
}

impl Subscription {
    /// Parses `[subscriptions, extranonce1, extranonce2_size]`
    ///
    /// Pools that return a bare `true` get an empty extranonce.
    pub fn from_result(result: &Value) -> Result<Self, MinerError> {
        let Some(fields) = result.as_array() else {
            return Ok(Subscription::default());
        };
        let extranonce1 = match fields.get(1).and_then(Value::as_str) {
            Some(hex_str) => hex::decode(hex_str)?,
            None => Vec::new(),
        };
        let extranonce2_size = fields.get(2).and_then(Value::as_u64).unwrap_or(0) as usize;
        Ok(Subscription {
            extranonce1,
            extranonce2_size,
        })
    }

    /// Bytes spliced between the coinbase fragments
    ///
    /// The extranonce2 suffix is left at zero; nonce ranges keep workers
    /// apart instead.
    pub fn coinbase_extra(&self) -> Vec<u8> {
        let mut extra = self.extranonce1.clone();
        extra.resize(self.extranonce1.len() + self.extranonce2_size, 0);
        extra
    }
}

fn field<'a>(params: &'a [Value], index: usize, name: &str) -> Result<&'a str, MinerError> {
    params
        .get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| MinerError::ProtocolError(format!("notify: {} missing or not a string", name)))
}

fn hash32(hex_str: &str, name: &str) -> Result<[u8; 32], MinerError> {
    let bytes = hex::decode(hex_str)?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| MinerError::ProtocolError(format!("{} has {} bytes, expected 32", name, b.len())))
}

fn hex_u32(hex_str: &str, name: &str) -> Result<u32, MinerError> {
    u32::from_str_radix(hex_str, 16)
        .map_err(|e| MinerError::ProtocolError(format!("notify: {} hex: {}", name, e)))
}

/// Parses `mining.notify` params into a [`Job`]
///
/// # Arguments
/// * `params` - `[job_id, prevhash, coinb1, coinb2, merkle_branch[], version, nbits, ntime, clean_jobs]`
/// * `coinbase_extra` - Extranonce bytes for this session
pub fn parse_notify(params: &Value, coinbase_extra: &[u8]) -> Result<Job, MinerError> {
    let params = params
        .as_array()
        .ok_or_else(|| MinerError::ProtocolError("notify: params not an array".into()))?;
    if params.len() < 9 {
        return Err(MinerError::ProtocolError(format!(
            "notify: expected 9 params, got {}",
            params.len()
        )));
    }

    let merkle_branch = params[4]
        .as_array()
        .ok_or_else(|| MinerError::ProtocolError("notify: merkle_branch not an array".into()))?
        .iter()
        .map(|node| {
            let node = node
                .as_str()
                .ok_or_else(|| MinerError::ProtocolError("notify: merkle node not a string".into()))?;
            hash32(node, "merkle node")
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Job {
        job_id: field(params, 0, "job_id")?.to_string(),
        prev_hash: hash32(field(params, 1, "prevhash")?, "prevhash")?,
        coinbase1: hex::decode(field(params, 2, "coinb1")?)?,
        coinbase2: hex::decode(field(params, 3, "coinb2")?)?,
        coinbase_extra: coinbase_extra.to_vec(),
        merkle_branch,
        version: hex_u32(field(params, 5, "version")?, "version")?,
        nbits: hex_u32(field(params, 6, "nbits")?, "nbits")?,
        ntime: hex_u32(field(params, 7, "ntime")?, "ntime")?,
        clean_jobs: params[8]
            .as_bool()
            .ok_or_else(|| MinerError::ProtocolError("notify: clean_jobs not a bool".into()))?,
    })
}

/// Parses `mining.set_difficulty` params, clamping to at least 1
pub fn parse_difficulty(params: &Value) -> Result<f64, MinerError> {
    let difficulty = params
        .get(0)
        .and_then(Value::as_f64)
        .filter(|d| d.is_finite())
        .ok_or_else(|| MinerError::ProtocolError("set_difficulty: missing numeric param".into()))?;
    if difficulty < 1.0 {
        log::warn!("Pool difficulty {} below 1, clamping", difficulty);
        return Ok(1.0);
    }
    Ok(difficulty)
}

/// `mining.submit` params: `[username, job_id, nonce, ntime, result]`
pub fn submit_params(username: &str, share: &Share) -> Value {
    json!([
        username,
        share.job_id,
        format!("{:08x}", share.nonce),
        format!("{:08x}", share.ntime),
        hex::encode(share.hash),
    ])
}

/// Human-readable reason from a response error value
///
/// Pools send either `[code, message, data]` or an object with `message`.
pub fn error_reason(error: &Value) -> String {
    if let Some(message) = error.get(1).and_then(Value::as_str) {
        return message.to_string();
    }
    if let Some(message) = error.get("message").and_then(Value::as_str) {
        return message.to_string();
    }
    error.to_string()
}
