use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One generated survey submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    #[serde(rename = "Version")]
    pub version: String,
    pub userid: String,
    pub response: Map<String, Value>,
}

/// Parameters of a reporting run: `n` rounds, one second apart, of `m` records each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportRequest {
    pub n: u64,
    pub m: u64,
}

impl ReportRequest {
    /// Reads `N` and `M` from an invocation event.
    ///
    /// Both must be present; numbers and integer strings are accepted.
    pub fn from_event(event: &Value) -> Option<Self> {
        Some(Self {
            n: read_count(event.get("N")?)?,
            m: read_count(event.get("M")?)?,
        })
    }
}

/// Fractional numbers are truncated and negative counts mean zero.
fn read_count(value: &Value) -> Option<u64> {
    let count = match value {
        Value::Number(n) => match n.as_i64() {
            Some(count) => count,
            None if n.is_u64() => return n.as_u64(),
            None => {
                let count = n.as_f64().filter(|f| f.is_finite())?.trunc();
                if count >= u64::MAX as f64 {
                    return Some(u64::MAX);
                }
                count as i64
            }
        },
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    Some(count.max(0) as u64)
}

/// What the ingress endpoint answered to one published round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkResponse {
    pub status: u16,
    pub body: String,
}
