use anyhow::{bail, ensure, Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};
use tch::{kind::Kind, CModule, Device, Tensor};

use crate::error::PredictionError;
use crate::features::{FeatureRow, FeatureValue, CATEGORICAL_COLUMNS, NUMERIC_COLUMNS};

/// Anything that can price a feature row. Loaded once, then shared read-only.
pub trait PricingModel: Send + Sync {
    fn predict(&self, row: &FeatureRow) -> Result<f64, PredictionError>;
}

// ---------- Fitted preprocessing (meta.json) ----------

#[derive(Deserialize, Debug, Clone)]
pub struct NumericFeature {
    pub name: String,
    #[serde(default)]
    pub mean: f64,
    #[serde(default = "unit_scale")]
    pub scale: f64,
}

fn unit_scale() -> f64 {
    1.0
}

#[derive(Deserialize, Debug, Clone)]
pub struct CategoricalFeature {
    pub name: String,
    pub categories: Vec<String>,
}

#[derive(Deserialize)]
struct MetaJson {
    version: Option<String>,
    numeric_features: Vec<NumericFeature>,
    categorical_features: Vec<CategoricalFeature>,
    in_dim: Option<usize>,
}

/// Column layout and encoding the regressor was fit with: numeric columns
/// standardised, categorical columns one-hot with unknowns as all zeros.
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    version: String,
    numeric: Vec<NumericFeature>,
    categorical: Vec<CategoricalFeature>,
}

impl FeatureSchema {
    pub fn from_json(txt: &str) -> Result<Self> {
        let meta: MetaJson = serde_json::from_str(txt).context("failed to parse meta.json")?;
        let schema = Self {
            version: meta.version.unwrap_or_else(|| "unversioned".to_string()),
            numeric: meta.numeric_features,
            categorical: meta.categorical_features,
        };
        if let Some(in_dim) = meta.in_dim {
            ensure!(
                in_dim == schema.in_dim(),
                "meta.in_dim ({}) does not match encoded width ({})",
                in_dim,
                schema.in_dim()
            );
        }
        Ok(schema)
    }

    pub fn load(meta_path: &str) -> Result<Self> {
        let txt = fs::read_to_string(Path::new(meta_path))
            .with_context(|| format!("failed to read meta at {}", meta_path))?;
        Self::from_json(&txt)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn column_count(&self) -> usize {
        self.numeric.len() + self.categorical.len()
    }

    /// Width of the encoded vector fed to the regressor.
    pub fn in_dim(&self) -> usize {
        self.numeric.len() + self.categorical.iter().map(|c| c.categories.len()).sum::<usize>()
    }

    /// The schema must name exactly the columns [`FeatureRow`] produces, in order.
    pub fn check_row_layout(&self) -> Result<()> {
        let numeric: Vec<&str> = self.numeric.iter().map(|f| f.name.as_str()).collect();
        let categorical: Vec<&str> = self.categorical.iter().map(|f| f.name.as_str()).collect();
        ensure!(
            numeric == NUMERIC_COLUMNS,
            "numeric columns {:?} do not match feature row {:?}",
            numeric,
            NUMERIC_COLUMNS
        );
        ensure!(
            categorical == CATEGORICAL_COLUMNS,
            "categorical columns {:?} do not match feature row {:?}",
            categorical,
            CATEGORICAL_COLUMNS
        );
        Ok(())
    }

    pub fn encode(&self, row: &FeatureRow) -> Result<Vec<f32>, PredictionError> {
        let cols = row.columns();
        if cols.len() != self.column_count() {
            return Err(PredictionError::ColumnCount {
                got: cols.len(),
                expected: self.column_count(),
            });
        }

        let mut v = Vec::with_capacity(self.in_dim());
        let (numeric_cols, categorical_cols) = cols.split_at(self.numeric.len());

        for (i, (spec, (name, value))) in self.numeric.iter().zip(numeric_cols).enumerate() {
            check_name(i, &spec.name, name)?;
            let FeatureValue::Numeric(x) = value else {
                return Err(PredictionError::KindMismatch {
                    column: spec.name.clone(),
                    expected: "numeric",
                });
            };
            let scale = if spec.scale == 0.0 { 1.0 } else { spec.scale };
            v.push(((x - spec.mean) / scale) as f32);
        }

        let offset = self.numeric.len();
        for (i, (spec, (name, value))) in self.categorical.iter().zip(categorical_cols).enumerate() {
            check_name(offset + i, &spec.name, name)?;
            let FeatureValue::Categorical(s) = value else {
                return Err(PredictionError::KindMismatch {
                    column: spec.name.clone(),
                    expected: "categorical",
                });
            };
            v.extend(spec.categories.iter().map(|c| if c == s { 1.0 } else { 0.0 }));
        }

        Ok(v)
    }
}

fn check_name(position: usize, expected: &str, found: &str) -> Result<(), PredictionError> {
    if expected == found {
        Ok(())
    } else {
        Err(PredictionError::SchemaMismatch {
            position,
            expected: expected.to_string(),
            found: found.to_string(),
        })
    }
}

// ---------- TorchScript regressor ----------

pub struct TorchPricingModel {
    module: CModule,
    device: Device,
    schema: FeatureSchema,
}

impl TorchPricingModel {
    /// Reads the schema first, then the TorchScript module. Any failure here
    /// is a startup failure.
    pub fn load(model_path: &str, meta_path: &str) -> Result<Self> {
        let device = Device::Cpu;

        let schema = FeatureSchema::load(meta_path)?;
        schema
            .check_row_layout()
            .with_context(|| format!("schema at {} does not fit the feature row", meta_path))?;

        if !Path::new(model_path).exists() {
            bail!("model not found at {}", model_path);
        }
        let module = CModule::load_on_device(model_path, device)
            .with_context(|| format!("failed to load TorchScript {}", model_path))?;

        Ok(Self {
            module,
            device,
            schema,
        })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// One forward pass on a zero vector, so a broken module fails at startup.
    pub fn warmup(&self) -> Result<f64> {
        let price = self.forward(&vec![0.0; self.schema.in_dim()])?;
        Ok(price)
    }

    fn forward(&self, x: &[f32]) -> Result<f64, PredictionError> {
        let in_dim = self.schema.in_dim();
        if x.len() != in_dim {
            return Err(PredictionError::Dimension {
                got: x.len(),
                expected: in_dim,
            });
        }

        let input = Tensor::from_slice(x)
            .reshape([1, in_dim as i64])
            .to_device(self.device);

        // Output: [1], [1, 1] or a scalar
        let t = self
            .module
            .forward_ts(&[input])
            .map_err(|e| PredictionError::Inference(e.to_string()))?;
        let sz = t.size();
        if sz.iter().product::<i64>() != 1 {
            return Err(PredictionError::Inference(format!(
                "unexpected model output size: {:?}",
                sz
            )));
        }

        let price = t.to_kind(Kind::Double).reshape([1]).double_value(&[0]);
        if !price.is_finite() {
            return Err(PredictionError::NonFinite(price));
        }
        Ok(price)
    }
}

impl PricingModel for TorchPricingModel {
    fn predict(&self, row: &FeatureRow) -> Result<f64, PredictionError> {
        let x = self.schema.encode(row)?;
        self.forward(&x)
    }
}
