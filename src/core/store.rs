//! Secret-store gateway: path semantics, payload validation, output
//! rendering.
//!
//! Two backend flavors hide behind one contract: the versioned KV2 engine
//! (paths namespaced under `data/` and `metadata/`) and the raw logical API
//! (paths used verbatim). The backend is chosen explicitly per call, never
//! auto-detected.

use crate::constants;
use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};

/// Which secret-store API flavor a location addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Kv2,
    Logical,
}

/// One addressable secret location.
#[derive(Debug, Clone)]
pub struct SecretLocation {
    pub mount: String,
    pub path: String,
    pub kind: BackendKind,
}

impl SecretLocation {
    pub fn new(mount: &str, path: &str, logical: bool) -> Self {
        Self {
            mount: mount.trim_matches('/').to_string(),
            path: path.trim_matches('/').to_string(),
            kind: if logical {
                BackendKind::Logical
            } else {
                BackendKind::Kv2
            },
        }
    }

    /// API path for read and write.
    pub fn data_path(&self) -> String {
        match self.kind {
            BackendKind::Kv2 => format!("{}/data/{}", self.mount, self.path),
            BackendKind::Logical => self.path.clone(),
        }
    }

    /// API path for listing children.
    pub fn list_path(&self) -> String {
        match self.kind {
            BackendKind::Kv2 => format!("{}/metadata/{}", self.mount, self.path),
            BackendKind::Logical => self.path.clone(),
        }
    }

    /// Tag prefixing plain-format output lines.
    pub fn tag(&self) -> String {
        self.path.replace(':', "_")
    }
}

/// Output rendering for `read` without a key selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadFormat {
    /// `<tag>:<key>:<value>` lines.
    Plain,
    /// One JSON object.
    Json,
    /// `export KEY="value"` lines, keys upper-cased.
    Export,
}

impl ReadFormat {
    /// Resolve the two format flags; requesting both is a configuration
    /// error and must fail before any network call.
    pub fn from_flags(json: bool, export: bool) -> Result<Self> {
        match (json, export) {
            (true, true) => bail!("--json and --export are mutually exclusive"),
            (true, false) => Ok(Self::Json),
            (false, true) => Ok(Self::Export),
            (false, false) => Ok(Self::Plain),
        }
    }
}

/// Backend access contract, satisfied by the HTTP adapter and test fakes.
pub trait SecretStore {
    /// Read the data map at a location. `None` means the backend returned
    /// no secret at all (distinct from an empty map).
    fn read(&self, location: &SecretLocation) -> Result<Option<Map<String, Value>>>;

    /// Write a data map to a location.
    fn write(&self, location: &SecretLocation, data: &Map<String, Value>) -> Result<()>;

    /// List child names one level below a location. An absent listing
    /// endpoint yields an empty vector.
    fn list(&self, location: &SecretLocation) -> Result<Vec<String>>;
}

/// Read a secret and render it for output.
pub fn read_secret(
    store: &dyn SecretStore,
    location: &SecretLocation,
    key: Option<&str>,
    format: ReadFormat,
) -> Result<String> {
    let data = store
        .read(location)?
        .with_context(|| format!("no entries returned for '{}'", location.path))?;
    render_data(&data, key, format, &location.tag())
}

/// Validate and parse a write payload: JSON object of non-trivial size.
pub fn parse_write_payload(content: &str) -> Result<Map<String, Value>> {
    if content.len() < constants::MIN_WRITE_PAYLOAD {
        bail!("no data to write, pass a json object or use --data-file");
    }
    let data: Map<String, Value> = serde_json::from_str(content)
        .context("could not parse json data")?;
    Ok(data)
}

/// Write a raw payload string to a location.
pub fn write_secret(store: &dyn SecretStore, location: &SecretLocation, content: &str) -> Result<()> {
    let data = parse_write_payload(content)?;
    store.write(location, &data)
}

/// List children of a location. KV2 results have the metadata namespace
/// prefix stripped before they are reported.
pub fn list_secrets(store: &dyn SecretStore, location: &SecretLocation) -> Result<Vec<String>> {
    let keys = store.list(location)?;
    match location.kind {
        BackendKind::Kv2 => Ok(keys
            .into_iter()
            .map(|k| strip_metadata_prefix(&location.mount, &k))
            .collect()),
        BackendKind::Logical => Ok(keys),
    }
}

/// Strip exactly the `<mount>/metadata/` namespace from a listed child path.
pub fn strip_metadata_prefix(mount: &str, key: &str) -> String {
    let prefix = format!("{}/metadata/", mount.trim_matches('/'));
    key.trim_start_matches('/')
        .strip_prefix(&prefix)
        .unwrap_or_else(|| key.trim_start_matches('/'))
        .to_string()
}

fn render_data(
    data: &Map<String, Value>,
    key: Option<&str>,
    format: ReadFormat,
    tag: &str,
) -> Result<String> {
    if let Some(key) = key {
        return match data.get(key).and_then(Value::as_str) {
            Some(value) => Ok(value.to_string()),
            None => bail!("key '{}' not found", key),
        };
    }
    if data.is_empty() {
        bail!("no data found");
    }
    match format {
        ReadFormat::Json => serde_json::to_string(data).context("cannot generate json output"),
        ReadFormat::Export => Ok(data
            .iter()
            .map(|(k, v)| {
                format!(
                    "export {}=\"{}\"",
                    k.to_uppercase(),
                    value_text(v).replace('"', "\\\"")
                )
            })
            .collect::<Vec<_>>()
            .join("\n")),
        ReadFormat::Plain => Ok(data
            .iter()
            .map(|(k, v)| format!("{}:{}:{}", tag, k, value_text(v)))
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
