//! CLI definition using clap

use std::path::PathBuf;

use bodyfit_app::config::EstimatorBackend;
use bodyfit_types::{Gender, OutputFormat};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bodyfit")]
#[command(author = "yuuji")]
#[command(version)]
#[command(about = "Body measurement and photo verification from pose landmarks")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Estimator backend (openai, command). Uses config value if not specified.
    #[arg(long, global = true)]
    pub backend: Option<EstimatorBackend>,

    /// Model name override
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Output format (json, table). Uses config value if not specified.
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Verbose output (debug logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check whether a photo is good enough for measurement
    Verify {
        /// Path to image file
        image: PathBuf,

        /// Read landmarks from a JSON file instead of running the pose detector
        #[arg(long)]
        landmarks: Option<PathBuf>,
    },

    /// Estimate age, gender, height and weight from a photo
    Measure {
        /// Path to image file
        image: Option<PathBuf>,

        /// Caller's user id (names the scratch copy of the image)
        #[arg(long)]
        user_id: Option<String>,

        /// Warning from an earlier verification, passed on to the estimator
        #[arg(long)]
        warning: Option<String>,

        /// Read landmarks from a JSON file instead of running the pose detector
        #[arg(long)]
        landmarks: Option<PathBuf>,

        /// Known age (skips the face estimator, requires --gender)
        #[arg(long, requires = "gender")]
        age: Option<u32>,

        /// Known gender: male or female (requires --age)
        #[arg(long, requires = "age")]
        gender: Option<Gender>,
    },

    /// Show the geometric measurements derived from a photo
    Geometry {
        /// Path to image file
        image: PathBuf,

        /// Read landmarks from a JSON file instead of running the pose detector
        #[arg(long)]
        landmarks: Option<PathBuf>,
    },

    /// Verify every image in a folder
    Batch {
        /// Path to folder containing images
        folder: PathBuf,

        /// Output file for the JSON report
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Number of parallel verifications. 0 = auto (CPU count). Uses 4 if not specified.
        #[arg(long, short = 'j')]
        jobs: Option<usize>,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Set estimator backend
        #[arg(long)]
        set_backend: Option<EstimatorBackend>,

        /// Set chat model
        #[arg(long)]
        set_model: Option<String>,

        /// Set chat-completions API base URL
        #[arg(long)]
        set_api_base_url: Option<String>,

        /// Set the environment variable holding the API key
        #[arg(long)]
        set_api_key_env: Option<String>,

        /// Set estimator request timeout (seconds)
        #[arg(long)]
        set_timeout: Option<u64>,

        /// Set estimator command (command backend)
        #[arg(long)]
        set_estimator_cmd: Option<String>,

        /// Set pose detector command
        #[arg(long)]
        set_pose_cmd: Option<String>,

        /// Set face attribute estimator command
        #[arg(long)]
        set_face_cmd: Option<String>,

        /// Set maximum image side before downscaling (pixels)
        #[arg(long)]
        set_max_dimension: Option<u32>,

        /// Set the nose-to-shoulder reference length (cm)
        #[arg(long)]
        set_head_length: Option<f64>,

        /// Set default output format
        #[arg(long)]
        set_output: Option<OutputFormat>,

        /// Reset to defaults
        #[arg(long)]
        reset: bool,
    },
}
