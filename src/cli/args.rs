//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Overrides;
use crate::model::TensorLayout;
use crate::ui::Locale;

/// Classify webcam frames as mask / no mask in the terminal
#[derive(Parser, Debug)]
#[command(name = "mask-detector")]
#[command(version, about = "Face mask detection from your webcam", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Config file path
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Directory containing model.onnx and metadata.json
    #[arg(long, short)]
    pub model_dir: Option<PathBuf>,

    /// Image input layout of the model
    #[arg(long)]
    pub layout: Option<TensorLayout>,

    /// Camera device index (from list-cameras)
    #[arg(long)]
    pub camera: Option<u32>,

    /// UI language
    #[arg(long, short)]
    pub locale: Option<Locale>,

    /// No terminal UI: start immediately and print predictions as JSON lines
    #[arg(long)]
    pub headless: bool,

    /// Hide the ASCII camera preview
    #[arg(long)]
    pub no_preview: bool,

    /// Log debug output to stderr
    #[arg(long, short)]
    pub verbose: bool,
}

impl Args {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            model_dir: self.model_dir.clone(),
            camera: self.camera,
            locale: self.locale,
            layout: self.layout,
            no_preview: self.no_preview,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List available cameras
    ListCameras,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Create default config file
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["mask-detector"]);
        assert!(args.command.is_none());
        assert!(args.config.is_none());
        assert!(args.model_dir.is_none());
        assert!(args.camera.is_none());
        assert!(args.locale.is_none());
        assert!(!args.headless);
        assert!(!args.no_preview);
        assert!(!args.verbose);
    }

    #[test]
    fn test_args_locale_values() {
        let args = Args::parse_from(["mask-detector", "--locale", "th"]);
        assert_eq!(args.locale, Some(Locale::Th));

        let args = Args::parse_from(["mask-detector", "-l", "en"]);
        assert_eq!(args.locale, Some(Locale::En));
    }

    #[test]
    fn test_args_layout_values() {
        let args = Args::parse_from(["mask-detector", "--layout", "nchw"]);
        assert_eq!(args.layout, Some(TensorLayout::Nchw));
    }

    #[test]
    fn test_args_overrides() {
        let args = Args::parse_from([
            "mask-detector",
            "--model-dir",
            "/opt/model",
            "--camera",
            "2",
            "--no-preview",
        ]);
        let o = args.overrides();
        assert_eq!(o.model_dir, Some(PathBuf::from("/opt/model")));
        assert_eq!(o.camera, Some(2));
        assert!(o.no_preview);
        assert!(o.locale.is_none());
    }

    #[test]
    fn test_args_headless_verbose() {
        let args = Args::parse_from(["mask-detector", "--headless", "-v"]);
        assert!(args.headless);
        assert!(args.verbose);
    }

    #[test]
    fn test_args_config_option() {
        let args = Args::parse_from(["mask-detector", "-c", "/tmp/test.toml"]);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/test.toml")));
    }

    #[test]
    fn test_args_subcommands() {
        let args = Args::parse_from(["mask-detector", "list-cameras"]);
        assert!(matches!(args.command, Some(Command::ListCameras)));

        let args = Args::parse_from(["mask-detector", "config", "show"]);
        assert!(matches!(
            args.command,
            Some(Command::Config {
                action: ConfigAction::Show
            })
        ));

        let args = Args::parse_from(["mask-detector", "config", "init"]);
        assert!(matches!(
            args.command,
            Some(Command::Config {
                action: ConfigAction::Init
            })
        ));
    }
}
