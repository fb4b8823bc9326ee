use crate::adapters::qr::{Logo, QrOptions};
use crate::core::compositor::DEFAULT_GROUP_ID;
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_file_extensions, validate_non_empty_string, validate_path, validate_positive_number,
    Validate,
};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "svg-qr-batch")]
#[command(about = "Stamp a QR code for every CSV row into an SVG template")]
pub struct CliConfig {
    /// CSV file with one record per output file
    #[arg(short, long = "csv")]
    pub csv_path: String,

    /// SVG template containing <g id="qrcode">
    #[arg(short, long = "template", default_value = "template.svg")]
    pub template_path: String,

    /// Output directory, created when missing
    #[arg(short, long = "output")]
    pub output_path: String,

    /// SVG logo placed in the middle of each code ("none" disables it)
    #[arg(short, long)]
    pub logo: Option<String>,

    #[arg(long, default_value = DEFAULT_GROUP_ID)]
    pub group_id: String,

    #[arg(long, default_value = "url")]
    pub payload_field: String,

    /// Column used when the payload column is missing or empty
    #[arg(long, default_value = "GenQR")]
    pub fallback_field: String,

    /// Column used verbatim as the output file name
    #[arg(long, default_value = "STK")]
    pub id_field: String,

    #[arg(long, default_value = "1")]
    pub concurrency: usize,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,
}

impl ConfigProvider for CliConfig {
    fn csv_path(&self) -> &str {
        &self.csv_path
    }

    fn template_path(&self) -> &str {
        &self.template_path
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn group_id(&self) -> &str {
        &self.group_id
    }

    fn payload_field(&self) -> &str {
        &self.payload_field
    }

    fn fallback_payload_field(&self) -> &str {
        &self.fallback_field
    }

    fn identifier_field(&self) -> &str {
        &self.id_field
    }

    fn concurrency(&self) -> usize {
        self.concurrency
    }

    fn qr_options(&self) -> QrOptions {
        QrOptions {
            logo: self.logo.as_deref().and_then(Logo::load),
            ..QrOptions::default()
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("csv", &self.csv_path)?;
        validate_path("template", &self.template_path)?;
        validate_path("output", &self.output_path)?;
        validate_file_extensions("template", std::slice::from_ref(&self.template_path), &["svg"])?;
        validate_non_empty_string("group_id", &self.group_id)?;
        validate_non_empty_string("payload_field", &self.payload_field)?;
        validate_non_empty_string("id_field", &self.id_field)?;
        validate_positive_number("concurrency", self.concurrency, 1)?;
        Ok(())
    }
}
