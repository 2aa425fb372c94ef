//! Safetensors I/O for the command-line front end.
//!
//! Reader: a feature matrix `x` (`[N, D]`) and an optional label vector `y`
//! (`[N]`) from any safetensors file, e.g. one written by numpy/torch.
//! Writer: [`StWriter`] collects named F64/I64 tensors and writes them in one
//! go.
use anyhow::{bail, Context, Result};
use ndarray::Array2;
use std::collections::HashMap;
use std::path::Path;

use crate::Label;

// ── Low-level safetensors parser (raw bytes → ndarray; no tensor framework
//    needed). ───────────────────────────────────────────────────────────────

fn parse_header(bytes: &[u8]) -> Result<(HashMap<String, serde_json::Value>, usize)> {
    let len_bytes: [u8; 8] = bytes
        .get(..8)
        .context("safetensors file too small")?
        .try_into()
        .context("reading header length")?;
    let data_start = usize::try_from(u64::from_le_bytes(len_bytes))
        .ok()
        .and_then(|n| n.checked_add(8))
        .filter(|&end| end <= bytes.len())
        .with_context(|| format!("safetensors header length exceeds file size {}", bytes.len()))?;
    let header: HashMap<String, serde_json::Value> =
        serde_json::from_slice(&bytes[8..data_start]).context("failed to parse safetensors header")?;
    Ok((header, data_start))
}

fn shape_of(entry: &serde_json::Value) -> Result<Vec<usize>> {
    entry["shape"]
        .as_array()
        .context("tensor entry has no shape")?
        .iter()
        .map(|v| v.as_u64().map(|d| d as usize).context("non-integer dimension"))
        .collect()
}

/// Decode any numeric tensor to `f64`.  Handles F32, F64, I32, I64 and U8.
fn read_tensor_f64(bytes: &[u8], data_start: usize, entry: &serde_json::Value) -> Result<Vec<f64>> {
    let offsets = entry["data_offsets"].as_array().context("tensor entry has no data_offsets")?;
    let (s, e) = match offsets.as_slice() {
        [s, e] => (
            s.as_u64().context("bad start offset")? as usize,
            e.as_u64().context("bad end offset")? as usize,
        ),
        _ => bail!("data_offsets must have two entries"),
    };
    let raw = data_start
        .checked_add(s)
        .zip(data_start.checked_add(e))
        .and_then(|(a, b)| bytes.get(a..b))
        .context("tensor data lies outside the file")?;
    let dtype = entry["dtype"].as_str().context("tensor entry has no dtype")?;

    let vals = match dtype {
        "F32" => raw
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64)
            .collect(),
        "F64" => raw
            .chunks_exact(8)
            .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
            .collect(),
        "I32" => raw
            .chunks_exact(4)
            .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64)
            .collect(),
        "I64" => raw
            .chunks_exact(8)
            .map(|b| i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as f64)
            .collect(),
        "U8" => raw.iter().map(|&b| b as f64).collect(),
        other => bail!("unsupported dtype {other}"),
    };
    Ok(vals)
}

// ── Public structs ────────────────────────────────────────────────────────────

/// Features and optional labels loaded from a safetensors file.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// `[N, D]` features.
    pub x: Array2<f64>,
    /// `[N]` labels, if the file has a `y` tensor.
    pub y: Option<Vec<Label>>,
}

impl Dataset {
    /// Load tensors `x` (required, 2-D) and `y` (optional, 1-D, integral).
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let (header, data_start) = parse_header(&bytes)?;

        let x_entry = header.get("x").context("missing 'x' key")?;
        let x_shape = shape_of(x_entry)?;
        let [rows, cols] = x_shape[..] else {
            bail!("'x' must be 2-D, got shape {x_shape:?}");
        };
        let x_vec = read_tensor_f64(&bytes, data_start, x_entry)?;
        let x = Array2::from_shape_vec((rows, cols), x_vec)?;

        let y = match header.get("y") {
            Some(entry) => {
                let vals = read_tensor_f64(&bytes, data_start, entry)?;
                if vals.len() != rows {
                    bail!("'y' has {} entries but 'x' has {rows} rows", vals.len());
                }
                let labels = vals
                    .iter()
                    .map(|&v| {
                        if v.fract() == 0.0 {
                            Ok(v as Label)
                        } else {
                            bail!("label {v} is not an integer")
                        }
                    })
                    .collect::<Result<Vec<Label>>>()?;
                Some(labels)
            }
            None => None,
        };

        Ok(Dataset { x, y })
    }

    /// Labels, or an error naming the subcommand that needs them.
    pub fn labels(&self, what: &str) -> Result<&[Label]> {
        self.y
            .as_deref()
            .with_context(|| format!("{what} needs a 'y' tensor in the input file"))
    }

    /// Write `x` and, if present, `y` back out.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut w = StWriter::new();
        w.add_f64_arr2("x", &self.x);
        if let Some(y) = &self.y {
            w.add_i64("y", y, &[y.len()]);
        }
        w.write(path)
    }
}

// ── Generic safetensors builder ───────────────────────────────────────────────

/// One tensor queued in a [`StWriter`].
#[derive(Debug)]
struct Tensor {
    name: String,
    dtype: &'static str,
    shape: Vec<usize>,
    data: Vec<u8>,
}

/// Collects F64 / I64 tensors and writes them as one safetensors file.
///
/// ```rust,no_run
/// use putils::io::StWriter;
/// use std::path::Path;
/// let mut w = StWriter::new();
/// w.add_f64("score", &[0.7], &[1]);
/// w.add_i64("lags", &[3, 1, 4], &[3]);
/// w.write(Path::new("/tmp/out.safetensors")).unwrap();
/// ```
#[derive(Debug, Default)]
pub struct StWriter {
    tensors: Vec<Tensor>,
}

impl StWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_f64(&mut self, name: &str, data: &[f64], shape: &[usize]) {
        self.push(name, "F64", shape, data.iter().flat_map(|v| v.to_le_bytes()).collect());
    }

    pub fn add_f64_arr2(&mut self, name: &str, arr: &Array2<f64>) {
        let bytes = arr.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.push(name, "F64", &[arr.nrows(), arr.ncols()], bytes);
    }

    pub fn add_i64(&mut self, name: &str, data: &[i64], shape: &[usize]) {
        self.push(name, "I64", shape, data.iter().flat_map(|v| v.to_le_bytes()).collect());
    }

    fn push(&mut self, name: &str, dtype: &'static str, shape: &[usize], data: Vec<u8>) {
        self.tensors.push(Tensor { name: name.to_string(), dtype, shape: shape.to_vec(), data });
    }

    /// Serialise header and payload, padding the header with spaces to a
    /// multiple of 8 bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut end = 0usize;
        let header: serde_json::Map<String, serde_json::Value> = self
            .tensors
            .iter()
            .map(|t| {
                let begin = end;
                end += t.data.len();
                let entry = serde_json::json!({
                    "dtype": t.dtype,
                    "shape": t.shape,
                    "data_offsets": [begin, end],
                });
                (t.name.clone(), entry)
            })
            .collect();

        let mut header = serde_json::to_vec(&header)?;
        header.resize(header.len().next_multiple_of(8), b' ');

        let mut out = Vec::with_capacity(8 + header.len() + end);
        out.extend_from_slice(&(header.len() as u64).to_le_bytes());
        out.extend_from_slice(&header);
        for t in &self.tensors {
            out.extend_from_slice(&t.data);
        }
        Ok(out)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_bytes()?)
            .with_context(|| format!("writing {}", path.display()))
    }
}
