//! Enhancement options to FFmpeg filter chain.
//!
//! Recognised keys, applied in this order regardless of request order:
//!
//! | key | value | filter |
//! |---|---|---|
//! | `denoise` | `true` or strength 1-10 | `hqdn3d` |
//! | `stabilize` | `true` | `deshake` |
//! | `upscale` | `true` (1080) or target height | `scale=-2:{h}:flags=lanczos` |
//! | `sharpen` | `true` or amount 0.1-3.0 | `unsharp` |
//! | `color_correct` | `true` or `{brightness, contrast, saturation}` | `eq` |
//!
//! `false` disables a key. Unknown keys are ignored with a warning.

use serde_json::Value;
use tracing::warn;

use neo_models::JsonObject;

use crate::error::{MediaError, MediaResult};

const DEFAULT_UPSCALE_HEIGHT: u64 = 1080;
const MAX_UPSCALE_HEIGHT: u64 = 4320;

/// Validated, ordered list of FFmpeg video filters.
#[derive(Debug, Clone, PartialEq)]
pub struct EnhancementPlan {
    filters: Vec<String>,
}

fn flag_or_number(key: &str, value: &Value) -> MediaResult<Option<Option<f64>>> {
    match value {
        Value::Bool(false) | Value::Null => Ok(None),
        Value::Bool(true) => Ok(Some(None)),
        Value::Number(n) => n
            .as_f64()
            .map(|v| Some(Some(v)))
            .ok_or_else(|| MediaError::invalid_options(format!("`{}` is not a finite number", key))),
        other => Err(MediaError::invalid_options(format!(
            "`{}` must be a boolean or a number, got {}",
            key, other
        ))),
    }
}

fn in_range(key: &str, v: f64, lo: f64, hi: f64) -> MediaResult<f64> {
    if (lo..=hi).contains(&v) {
        Ok(v)
    } else {
        Err(MediaError::invalid_options(format!(
            "`{}` must be between {} and {}, got {}",
            key, lo, hi, v
        )))
    }
}

fn denoise(value: &Value) -> MediaResult<Option<String>> {
    match flag_or_number("denoise", value)? {
        None => Ok(None),
        Some(None) => Ok(Some("hqdn3d".to_string())),
        Some(Some(strength)) => {
            let strength = in_range("denoise", strength, 1.0, 10.0)?;
            Ok(Some(format!("hqdn3d={:.1}", strength)))
        }
    }
}

fn stabilize(value: &Value) -> MediaResult<Option<String>> {
    match value {
        Value::Bool(true) => Ok(Some("deshake".to_string())),
        Value::Bool(false) | Value::Null => Ok(None),
        other => Err(MediaError::invalid_options(format!(
            "`stabilize` must be a boolean, got {}",
            other
        ))),
    }
}

fn upscale(value: &Value) -> MediaResult<Option<String>> {
    let height = match value {
        Value::Bool(true) => DEFAULT_UPSCALE_HEIGHT,
        Value::Bool(false) | Value::Null => return Ok(None),
        Value::Number(n) => n
            .as_u64()
            .filter(|h| (2..=MAX_UPSCALE_HEIGHT).contains(h))
            .ok_or_else(|| {
                MediaError::invalid_options(format!(
                    "`upscale` height must be an integer between 2 and {}",
                    MAX_UPSCALE_HEIGHT
                ))
            })?,
        other => {
            return Err(MediaError::invalid_options(format!(
                "`upscale` must be a boolean or a target height, got {}",
                other
            )))
        }
    };
    // Even height keeps yuv420p encoders happy.
    let height = height - height % 2;
    Ok(Some(format!("scale=-2:{}:flags=lanczos", height)))
}

fn sharpen(value: &Value) -> MediaResult<Option<String>> {
    match flag_or_number("sharpen", value)? {
        None => Ok(None),
        Some(None) => Ok(Some("unsharp=5:5:1.0:5:5:0.0".to_string())),
        Some(Some(amount)) => {
            let amount = in_range("sharpen", amount, 0.1, 3.0)?;
            Ok(Some(format!("unsharp=5:5:{:.2}:5:5:0.0", amount)))
        }
    }
}

fn color_correct(value: &Value) -> MediaResult<Option<String>> {
    match value {
        Value::Bool(true) => Ok(Some("eq=contrast=1.05:saturation=1.10".to_string())),
        Value::Bool(false) | Value::Null => Ok(None),
        Value::Object(params) => {
            let get = |name: &str, default: f64, lo: f64, hi: f64| -> MediaResult<f64> {
                match params.get(name) {
                    None => Ok(default),
                    Some(v) => {
                        let v = v.as_f64().ok_or_else(|| {
                            MediaError::invalid_options(format!("`color_correct.{}` must be a number", name))
                        })?;
                        in_range(&format!("color_correct.{}", name), v, lo, hi)
                    }
                }
            };
            let brightness = get("brightness", 0.0, -1.0, 1.0)?;
            let contrast = get("contrast", 1.0, 0.0, 2.0)?;
            let saturation = get("saturation", 1.0, 0.0, 3.0)?;
            Ok(Some(format!(
                "eq=brightness={:.2}:contrast={:.2}:saturation={:.2}",
                brightness, contrast, saturation
            )))
        }
        other => Err(MediaError::invalid_options(format!(
            "`color_correct` must be a boolean or an object, got {}",
            other
        ))),
    }
}

type FilterBuilder = fn(&Value) -> MediaResult<Option<String>>;

const FILTERS: [(&str, FilterBuilder); 5] = [
    ("denoise", denoise),
    ("stabilize", stabilize),
    ("upscale", upscale),
    ("sharpen", sharpen),
    ("color_correct", color_correct),
];

impl EnhancementPlan {
    /// Build the plan from a request's `enhancements` object.
    ///
    /// Fails when a recognised key has an invalid value or when nothing
    /// would be applied.
    pub fn from_options(options: &JsonObject) -> MediaResult<Self> {
        for key in options.keys() {
            if !FILTERS.iter().any(|(name, _)| *name == key.as_str()) {
                warn!("Ignoring unknown enhancement `{}`", key);
            }
        }

        let mut filters = Vec::new();
        for (name, build) in FILTERS {
            if let Some(value) = options.get(name) {
                if let Some(filter) = build(value)? {
                    filters.push(filter);
                }
            }
        }

        if filters.is_empty() {
            return Err(MediaError::invalid_options(format!(
                "no enhancements requested; supported: {}",
                FILTERS.map(|(name, _)| name).join(", ")
            )));
        }

        Ok(Self { filters })
    }

    pub fn filters(&self) -> &[String] {
        &self.filters
    }

    /// Comma-joined chain for `-vf`.
    pub fn filter_chain(&self) -> String {
        self.filters.join(",")
    }
}
