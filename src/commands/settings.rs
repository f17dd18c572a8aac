use crate::analysis::heatmap::{ColorTable, HeatmapConfig};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SETTINGS_SCHEMA_VERSION: i64 = 1;

pub const DEFAULT_API_BASE_URL: &str = "https://codeforces.com";

#[derive(Debug, Clone)]
pub struct EffectiveSettings {
    pub heatmap: HeatmapConfig,
    pub refresh_interval: Duration,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub api_base_url: String,
}

impl Default for EffectiveSettings {
    fn default() -> Self {
        effective_from_value(&default_settings())
    }
}

pub async fn get_settings(data_dir: PathBuf) -> Result<Value, String> {
    load_settings_from_disk(&data_dir)
}

pub async fn save_settings(data_dir: PathBuf, settings: Value) -> Result<Value, String> {
    save_settings_to_disk(&data_dir, settings)
}

pub fn load_effective_settings(data_dir: &Path) -> Result<EffectiveSettings, String> {
    let settings = load_settings_from_disk(data_dir)?;
    Ok(effective_from_value(&settings))
}

fn effective_from_value(settings: &Value) -> EffectiveSettings {
    let u64_or = |key: &str, default: u64| settings.get(key).and_then(Value::as_u64).unwrap_or(default);

    let color_table = settings
        .get("colorTable")
        .and_then(Value::as_str)
        .and_then(ColorTable::from_name)
        .unwrap_or_default();

    EffectiveSettings {
        heatmap: HeatmapConfig {
            color_table,
            corner_radius: u64_or("cornerRadius", 10) as f32,
            cache_enabled: settings
                .get("cacheEnabled")
                .and_then(Value::as_bool)
                .unwrap_or(true),
            bitmap_width: u64_or("bitmapWidth", 693) as u32,
            bitmap_height: u64_or("bitmapHeight", 198) as u32,
        },
        refresh_interval: Duration::from_secs(u64_or("refreshIntervalMinutes", 15) * 60),
        connect_timeout: Duration::from_secs(u64_or("connectTimeoutSecs", 5)),
        read_timeout: Duration::from_secs(u64_or("readTimeoutSecs", 5)),
        api_base_url: settings
            .get("apiBaseUrl")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_API_BASE_URL)
            .trim_end_matches('/')
            .to_string(),
    }
}

pub fn load_settings_from_disk(data_dir: &Path) -> Result<Value, String> {
    let path = settings_path(data_dir);
    ensure_data_dir(data_dir)?;

    let original = if path.exists() {
        let raw = fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read settings.json: {e}"))?;
        serde_json::from_str::<Value>(&raw).unwrap_or_else(|_| json!({}))
    } else {
        json!({})
    };

    let normalized = normalize_settings(original.clone());
    if normalized != original || !path.exists() {
        write_settings_file(&path, &normalized)?;
    }

    Ok(normalized)
}

pub fn save_settings_to_disk(data_dir: &Path, settings: Value) -> Result<Value, String> {
    let path = settings_path(data_dir);
    ensure_data_dir(data_dir)?;

    let mut merged = load_settings_from_disk(data_dir).unwrap_or_else(|_| default_settings());
    merge_settings(&mut merged, &settings);

    let normalized = normalize_settings(merged);
    write_settings_file(&path, &normalized)?;
    Ok(normalized)
}

/// Parses `key=value` pairs from the command line into a settings patch. Values that look like
/// JSON (numbers, booleans) are stored typed, everything else as a string.
pub fn parse_assignments(pairs: &[String]) -> Result<Value, String> {
    let mut patch = Map::new();
    for pair in pairs {
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| format!("Expected key=value, got `{pair}`"))?;
        let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| json!(raw));
        patch.insert(key.trim().to_string(), value);
    }
    Ok(Value::Object(patch))
}

fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join("settings.json")
}

fn ensure_data_dir(data_dir: &Path) -> Result<(), String> {
    fs::create_dir_all(data_dir).map_err(|e| format!("Failed to create data directory: {e}"))
}

fn write_settings_file(path: &Path, settings: &Value) -> Result<(), String> {
    let raw = serde_json::to_string_pretty(settings)
        .map_err(|e| format!("Failed to serialize settings: {e}"))?;
    fs::write(path, raw).map_err(|e| format!("Failed to write settings.json: {e}"))
}

/// Fills missing keys from defaults, clamps values into range and stamps the schema version.
fn normalize_settings(input: Value) -> Value {
    let mut out = match input {
        Value::Object(map) => Value::Object(map),
        _ => Value::Object(Map::new()),
    };

    deep_merge_defaults(&mut out, &default_settings());
    sanitize_settings(&mut out);
    if let Some(obj) = out.as_object_mut() {
        obj.insert("schema_version".to_string(), json!(SETTINGS_SCHEMA_VERSION));
    }

    out
}

fn default_settings() -> Value {
    json!({
        "schema_version": SETTINGS_SCHEMA_VERSION,
        "colorTable": "coarse",
        "cornerRadius": 10,
        "cacheEnabled": true,
        "bitmapWidth": 693,
        "bitmapHeight": 198,
        "refreshIntervalMinutes": 15,
        "connectTimeoutSecs": 5,
        "readTimeoutSecs": 5,
        "apiBaseUrl": DEFAULT_API_BASE_URL
    })
}

fn deep_merge_defaults(target: &mut Value, defaults: &Value) {
    let (Some(target_obj), Some(default_obj)) = (target.as_object_mut(), defaults.as_object()) else {
        return;
    };

    for (key, default_value) in default_obj {
        match target_obj.get_mut(key) {
            Some(existing) => {
                if existing.is_object() && default_value.is_object() {
                    deep_merge_defaults(existing, default_value);
                }
            }
            None => {
                target_obj.insert(key.clone(), default_value.clone());
            }
        }
    }
}

fn merge_settings(target: &mut Value, incoming: &Value) {
    match (target, incoming) {
        (Value::Object(target_obj), Value::Object(incoming_obj)) => {
            for (key, value) in incoming_obj {
                if let Some(existing) = target_obj.get_mut(key) {
                    merge_settings(existing, value);
                } else {
                    target_obj.insert(key.clone(), value.clone());
                }
            }
        }
        (target_slot, incoming_value) => {
            *target_slot = incoming_value.clone();
        }
    }
}

fn sanitize_settings(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };

    // Clamp numerics.
    clamp_u64(obj, "cornerRadius", 0, 40, 10);
    clamp_u64(obj, "bitmapWidth", 100, 4096, 693);
    clamp_u64(obj, "bitmapHeight", 50, 4096, 198);
    clamp_u64(obj, "refreshIntervalMinutes", 15, 1440, 15);
    clamp_u64(obj, "connectTimeoutSecs", 1, 60, 5);
    clamp_u64(obj, "readTimeoutSecs", 1, 60, 5);

    // Validate enums.
    sanitize_enum(obj, "colorTable", &["coarse", "fine"], "coarse");

    // Bools with defaults.
    ensure_bool(obj, "cacheEnabled", true);

    let base_url_ok = obj
        .get("apiBaseUrl")
        .and_then(Value::as_str)
        .is_some_and(|url| url.starts_with("http://") || url.starts_with("https://"));
    if !base_url_ok {
        obj.insert("apiBaseUrl".to_string(), json!(DEFAULT_API_BASE_URL));
    }
}

fn clamp_u64(map: &mut Map<String, Value>, key: &str, min: u64, max: u64, default: u64) {
    let raw = map.get(key).and_then(Value::as_u64).unwrap_or(default);
    map.insert(key.to_string(), json!(raw.clamp(min, max)));
}

fn sanitize_enum(map: &mut Map<String, Value>, key: &str, allowed: &[&str], default: &str) {
    let valid = map
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| allowed.contains(value))
        .unwrap_or(default);
    map.insert(key.to_string(), json!(valid));
}

fn ensure_bool(map: &mut Map<String, Value>, key: &str, default: bool) {
    let value = map.get(key).and_then(Value::as_bool).unwrap_or(default);
    map.insert(key.to_string(), json!(value));
}
