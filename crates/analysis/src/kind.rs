//! `analysis_type` parsing

use std::fmt;

use contracts::{ContractError, TimeUnit};

/// Parsed analysis type
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnalysisKind {
    /// Passthrough, one row per sample
    None,
    /// count / mean / std / min / max of the computed values
    BasicStats,
    /// Period and frequency analysis of a timestamp series
    Timestamp { frequency_hz: f64, unit: TimeUnit },
}

impl AnalysisKind {
    /// Parse `name` or `name(key:value[,key:value])`
    ///
    /// An empty string means `none`.
    ///
    /// # Errors
    /// `ContractError::Config` for unknown names, unknown or duplicate
    /// parameters, and invalid frequencies or units.
    pub fn parse(task_id: &str, analysis_type: &str) -> Result<Self, ContractError> {
        let fail = |message: String| ContractError::config(task_id, message);
        let text = analysis_type.trim();

        let (name, params) = match text.find('(') {
            Some(open) => {
                let inner = text[open + 1..]
                    .strip_suffix(')')
                    .ok_or_else(|| fail(format!("unterminated parameter list in '{text}'")))?;
                (text[..open].trim(), parse_params(inner).map_err(&fail)?)
            }
            None => (text, Vec::new()),
        };

        match name {
            "" | "none" | "basic_stats" => {
                if let Some((key, _)) = params.first() {
                    return Err(fail(format!("'{name}' takes no parameters, got '{key}'")));
                }
                Ok(if name == "basic_stats" {
                    Self::BasicStats
                } else {
                    Self::None
                })
            }
            "timestamp" => {
                let mut frequency_hz = None;
                let mut unit = TimeUnit::default();
                for (key, value) in params {
                    match key {
                        "freq" => {
                            let hz = value
                                .parse::<f64>()
                                .map_err(|_| fail(format!("invalid frequency '{value}'")))?;
                            if !hz.is_finite() || hz <= 0.0 {
                                return Err(fail(format!(
                                    "frequency must be a finite positive number, got '{value}'"
                                )));
                            }
                            frequency_hz = Some(hz);
                        }
                        "unit" => {
                            unit = TimeUnit::parse(value).ok_or_else(|| {
                                fail(format!("unknown time unit '{value}' (ns, us, ms, s)"))
                            })?;
                        }
                        other => {
                            return Err(fail(format!("unknown timestamp parameter '{other}'")))
                        }
                    }
                }
                let frequency_hz = frequency_hz
                    .ok_or_else(|| fail("timestamp analysis requires freq:HZ".to_string()))?;
                Ok(Self::Timestamp { frequency_hz, unit })
            }
            other => Err(fail(format!("unknown analysis type '{other}'"))),
        }
    }

    /// Strategy name
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::BasicStats => "basic_stats",
            Self::Timestamp { .. } => "timestamp",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timestamp { frequency_hz, unit } => {
                write!(f, "timestamp(freq:{frequency_hz},unit:{})", unit.as_str())
            }
            other => f.write_str(other.name()),
        }
    }
}

fn parse_params(inner: &str) -> Result<Vec<(&str, &str)>, String> {
    let mut params: Vec<(&str, &str)> = Vec::new();
    if inner.trim().is_empty() {
        return Ok(params);
    }
    for pair in inner.split(',') {
        let (key, value) = pair
            .split_once(':')
            .ok_or_else(|| format!("expected key:value, got '{}'", pair.trim()))?;
        let (key, value) = (key.trim(), value.trim());
        if params.iter().any(|(k, _)| *k == key) {
            return Err(format!("parameter '{key}' given more than once"));
        }
        params.push((key, value));
    }
    Ok(params)
}
