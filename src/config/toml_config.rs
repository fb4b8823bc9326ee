use crate::adapters::qr::{ErrorCorrection, Logo, QrOptions};
use crate::core::compositor::DEFAULT_GROUP_ID;
use crate::core::ConfigProvider;
use crate::utils::error::{BatchError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub batch: BatchInfo,
    pub input: InputConfig,
    pub template: TemplateConfig,
    pub output: OutputConfig,
    pub qr: Option<QrConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchInfo {
    pub name: String,
    pub description: Option<String>,
    pub concurrency: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub csv: String,
    pub payload_field: Option<String>,
    pub fallback_field: Option<String>,
    pub identifier_field: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    pub path: String,
    pub group_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrConfig {
    pub size: Option<u32>,
    pub margin: Option<u32>,
    pub dark_color: Option<String>,
    pub light_color: Option<String>,
    pub error_correction: Option<ErrorCorrection>,
    pub logo: Option<String>,
    pub logo_size: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    /// "compact" (預設) 或 "json"
    pub log_format: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(BatchError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| BatchError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_DIR})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| BatchError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("batch.name", &self.batch.name)?;
        validation::validate_path("input.csv", &self.input.csv)?;
        validation::validate_file_extensions("input.csv", std::slice::from_ref(&self.input.csv), &["csv"])?;
        validation::validate_path("template.path", &self.template.path)?;
        validation::validate_file_extensions(
            "template.path",
            std::slice::from_ref(&self.template.path),
            &["svg"],
        )?;
        validation::validate_path("output.path", &self.output.path)?;

        if let Some(concurrency) = self.batch.concurrency {
            validation::validate_positive_number("batch.concurrency", concurrency, 1)?;
        }

        if let Some(qr) = &self.qr {
            if let Some(size) = qr.size {
                validation::validate_range("qr.size", size, 21, 20_000)?;
                if let Some(margin) = qr.margin {
                    validation::validate_range("qr.margin", margin, 0, size / 4)?;
                }
            }
            if let Some(color) = &qr.dark_color {
                validation::validate_color("qr.dark_color", color)?;
            }
            if let Some(color) = &qr.light_color {
                validation::validate_color("qr.light_color", color)?;
            }
            if let Some(logo_size) = qr.logo_size {
                validation::validate_range("qr.logo_size", logo_size, 0.05, 0.5)?;
            }
        }

        if let Some(format) = self.monitoring.as_ref().and_then(|m| m.log_format.as_deref()) {
            if !["compact", "json"].contains(&format) {
                return Err(BatchError::InvalidConfigValueError {
                    field: "monitoring.log_format".to_string(),
                    value: format.to_string(),
                    reason: "Supported formats: compact, json".to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.log_format.as_deref())
            .map(|format| format == "json")
            .unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn csv_path(&self) -> &str {
        &self.input.csv
    }

    fn template_path(&self) -> &str {
        &self.template.path
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn group_id(&self) -> &str {
        self.template.group_id.as_deref().unwrap_or(DEFAULT_GROUP_ID)
    }

    fn payload_field(&self) -> &str {
        self.input.payload_field.as_deref().unwrap_or("url")
    }

    fn fallback_payload_field(&self) -> &str {
        self.input.fallback_field.as_deref().unwrap_or("GenQR")
    }

    fn identifier_field(&self) -> &str {
        self.input.identifier_field.as_deref().unwrap_or("STK")
    }

    fn concurrency(&self) -> usize {
        self.batch.concurrency.unwrap_or(1)
    }

    fn qr_options(&self) -> QrOptions {
        let defaults = QrOptions::default();
        let Some(qr) = &self.qr else {
            return defaults;
        };

        let logo = qr.logo.as_deref().and_then(Logo::load).map(|mut logo| {
            if let Some(size) = qr.logo_size {
                logo.image_size = size;
            }
            logo
        });

        QrOptions {
            size: qr.size.unwrap_or(defaults.size),
            margin: qr.margin.unwrap_or(defaults.margin),
            dark_color: qr.dark_color.clone().unwrap_or(defaults.dark_color),
            light_color: qr.light_color.clone().unwrap_or(defaults.light_color),
            error_correction: qr.error_correction.unwrap_or(defaults.error_correction),
            logo,
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
