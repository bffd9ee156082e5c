//! # Stage CLI
//!
//! Command-line host for Stage scene documents.
//!
//! ## Usage
//!
//! ```bash
//! stage new scene.json
//! stage layout scene.json --json
//! STAGE_CANVAS_WIDTH=1280 stage paint scene.json
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `CliConfig` - Canvas settings derived from the arguments
//! - `commands` - One function per subcommand, writing to any `io::Write`

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

mod commands;

pub use commands::{
    layout_scene, load_scene, new_scene, paint_scene, run, starter_scene, validate_scene,
    SceneSummary,
};

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use stage_core::{DocumentConfig, Rect};

/// Default canvas width in pixels.
pub const DEFAULT_CANVAS_WIDTH: f64 = 1920.0;

/// Default canvas height in pixels.
pub const DEFAULT_CANVAS_HEIGHT: f64 = 1080.0;

/// Command-line arguments for stage.
#[derive(Debug, Clone, Parser)]
#[command(name = "stage")]
#[command(about = "Create, validate, lay out and paint Stage scene documents")]
#[command(version)]
pub struct CliArgs {
    /// Canvas width in pixels
    #[arg(long, global = true, env = "STAGE_CANVAS_WIDTH", default_value = "1920")]
    pub canvas_width: f64,

    /// Canvas height in pixels
    #[arg(long, global = true, env = "STAGE_CANVAS_HEIGHT", default_value = "1080")]
    pub canvas_height: f64,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Write a starter scene with a title and a start button
    New {
        /// Output file
        out: PathBuf,
    },
    /// Parse a scene and report what it holds
    Validate {
        /// Scene file
        scene: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the resolved geometry of every entity
    Layout {
        /// Scene file
        scene: PathBuf,
        /// Print JSON instead of a text outline
        #[arg(long)]
        json: bool,
    },
    /// Print the display list as JSON
    Paint {
        /// Scene file
        scene: PathBuf,
    },
}

/// Canvas settings for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct CliConfig {
    /// Canvas width in pixels.
    pub canvas_width: f64,
    /// Canvas height in pixels.
    pub canvas_height: f64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CliConfig {
    /// Create a configuration with the default canvas size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
        }
    }

    /// Document settings for this canvas. Non-positive or non-finite sizes
    /// fall back to the defaults.
    #[must_use]
    pub fn document_config(&self) -> DocumentConfig {
        let pick = |v: f64, default: f64| if v.is_finite() && v > 0.0 { v } else { default };
        DocumentConfig {
            canvas: Rect::new(
                0.0,
                0.0,
                pick(self.canvas_width, DEFAULT_CANVAS_WIDTH),
                pick(self.canvas_height, DEFAULT_CANVAS_HEIGHT),
            ),
            ..DocumentConfig::default()
        }
    }
}

impl From<&CliArgs> for CliConfig {
    fn from(args: &CliArgs) -> Self {
        Self {
            canvas_width: args.canvas_width,
            canvas_height: args.canvas_height,
        }
    }
}
