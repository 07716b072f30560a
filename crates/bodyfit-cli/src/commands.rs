//! Command implementations

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use bodyfit_app::app::{
    derive_geometry, face_estimator, pose_detector, text_estimator, MeasureRequest,
    MeasurementService, ServiceError, VerificationService,
};
use bodyfit_app::config::{Config, EstimatorBackend};
use bodyfit_app::scanner::scan_directory;
use bodyfit_domain::service::CalibrationEngine;
use bodyfit_types::{
    BatchResults, Error, FaceAttributes, OutputFormat, Result, Retry, Status,
    VerificationEntry, Verdict,
};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use crate::cli::{Cli, Commands};
use crate::output;

/// Run the selected command and return the process exit code
pub fn execute(cli: Cli) -> Result<i32> {
    // Load config
    let mut config = Config::load()?;

    // Override from CLI args
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(ref model) = cli.model {
        config.model = model.clone();
    }
    let output_format = cli.format.unwrap_or(config.output_format);

    match &cli.command {
        Commands::Verify { image, landmarks } => {
            cmd_verify(&config, image, landmarks.as_deref(), output_format)
        }

        Commands::Measure {
            image,
            user_id,
            warning,
            landmarks,
            age,
            gender,
        } => {
            let fixed_face = match (age, gender) {
                (Some(age), Some(gender)) => Some(FaceAttributes {
                    age: *age,
                    gender: *gender,
                }),
                _ => None,
            };
            let request = MeasureRequest {
                image_path: image.clone(),
                user_id: user_id.clone(),
                warning: warning.clone(),
            };
            cmd_measure(&config, &request, landmarks.as_deref(), fixed_face, output_format)
        }

        Commands::Geometry { image, landmarks } => {
            cmd_geometry(&config, image, landmarks.as_deref(), output_format)
        }

        Commands::Batch {
            folder,
            output,
            jobs,
        } => {
            // 0 = auto CPU count, default 4
            let job_count = match jobs {
                Some(0) => num_cpus::get(),
                Some(n) => *n,
                None => 4,
            };
            cmd_batch(&cli, &config, folder, output.clone(), job_count, output_format)
        }

        Commands::Config {
            show,
            set_backend,
            set_model,
            set_api_base_url,
            set_api_key_env,
            set_timeout,
            set_estimator_cmd,
            set_pose_cmd,
            set_face_cmd,
            set_max_dimension,
            set_head_length,
            set_output,
            reset,
        } => cmd_config(
            *show,
            ConfigUpdate {
                backend: *set_backend,
                model: set_model.clone(),
                api_base_url: set_api_base_url.clone(),
                api_key_env: set_api_key_env.clone(),
                timeout_secs: *set_timeout,
                estimator_command: set_estimator_cmd.clone(),
                pose_command: set_pose_cmd.clone(),
                face_command: set_face_cmd.clone(),
                max_image_dimension: *set_max_dimension,
                head_length_cm: *set_head_length,
                output_format: *set_output,
            },
            *reset,
        ),
    }
}

fn verification_service(config: &Config, landmarks: Option<&Path>) -> Result<VerificationService> {
    Ok(VerificationService::new(pose_detector(config, landmarks)?)
        .with_thresholds(config.thresholds.clone())
        .with_max_dimension(config.max_image_dimension))
}

fn cmd_verify(
    config: &Config,
    image: &Path,
    landmarks: Option<&Path>,
    output_format: OutputFormat,
) -> Result<i32> {
    let service = verification_service(config, landmarks)?;

    match service.verify(image) {
        Ok(verdict) => {
            output::output_verdict(output_format, &verdict)?;
            Ok(0)
        }
        // unreadable photos are reported in verdict form so clients can show a retry hint
        Err(ServiceError::InvalidRequest(err @ (Error::InvalidImageFormat(_) | Error::Image(_)))) => {
            let verdict = Verdict::new(
                Status::Error,
                format!("Invalid image format or corrupt image. Error: {}", err),
                Retry::Yes,
            );
            output::output_verdict(output_format, &verdict)?;
            Ok(2)
        }
        Err(err) => {
            output::output_error(output_format, &err.payload())?;
            Ok(err.exit_code())
        }
    }
}

fn cmd_measure(
    config: &Config,
    request: &MeasureRequest,
    landmarks: Option<&Path>,
    fixed_face: Option<FaceAttributes>,
    output_format: OutputFormat,
) -> Result<i32> {
    // Reject incomplete requests before any collaborator is configured
    if let Err(err) = request.validate() {
        let err = ServiceError::from(err);
        output::output_error(output_format, &err.payload())?;
        return Ok(err.exit_code());
    }

    let service = MeasurementService::new(
        face_estimator(config, fixed_face)?,
        pose_detector(config, landmarks)?,
        text_estimator(config)?,
    )
    .with_engine(CalibrationEngine::new(config.head_length_cm));

    match service.measure(request) {
        Ok(result) => {
            output::output_measurement(output_format, &result)?;
            Ok(0)
        }
        Err(err) => {
            output::output_error(output_format, &err.payload())?;
            if output_format == OutputFormat::Table {
                output::print_photo_tips();
            }
            Ok(err.exit_code())
        }
    }
}

fn cmd_geometry(
    config: &Config,
    image: &Path,
    landmarks: Option<&Path>,
    output_format: OutputFormat,
) -> Result<i32> {
    let pose = pose_detector(config, landmarks)?;
    let engine = CalibrationEngine::new(config.head_length_cm);

    match derive_geometry(pose.as_ref(), &engine, image) {
        Ok(measurements) => {
            output::output_geometry(output_format, &measurements)?;
            Ok(0)
        }
        Err(err) => {
            output::output_error(output_format, &err.payload())?;
            Ok(err.exit_code())
        }
    }
}

/// Per-image outcome collected by the batch workers
struct VerificationTaskResult {
    image_path: PathBuf,
    result: std::result::Result<Verdict, String>,
}

fn cmd_batch(
    cli: &Cli,
    config: &Config,
    folder: &Path,
    output: Option<PathBuf>,
    jobs: usize,
    output_format: OutputFormat,
) -> Result<i32> {
    // Scan directory
    let images = scan_directory(folder)?;

    if images.is_empty() {
        return Err(Error::FileNotFound(format!(
            "No images found in {}",
            folder.display()
        )));
    }

    let total_images = images.len();
    let jobs = jobs.clamp(1, total_images);
    debug!(total_images, jobs, "starting batch verification");

    let service = Arc::new(verification_service(config, None)?);

    let pb = ProgressBar::new(total_images as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }

    // Shared results collector
    let results: Arc<Mutex<Vec<VerificationTaskResult>>> = Arc::new(Mutex::new(Vec::new()));
    let images = Arc::new(images);
    let next_index = Arc::new(AtomicUsize::new(0));

    let started_at = Utc::now();

    let mut handles = Vec::new();
    let verbose = cli.verbose;

    for worker_id in 0..jobs {
        let images = Arc::clone(&images);
        let next_index = Arc::clone(&next_index);
        let results = Arc::clone(&results);
        let service = Arc::clone(&service);
        let pb = pb.clone();

        let handle = thread::spawn(move || loop {
            let idx = next_index.fetch_add(1, Ordering::SeqCst);
            if idx >= images.len() {
                break;
            }

            let image = &images[idx];
            if verbose {
                let filename = image.file_name().and_then(|n| n.to_str()).unwrap_or("");
                pb.set_message(format!("[W{}] {}", worker_id, filename));
            }

            let result = service.verify(image).map_err(|e| e.to_string());

            if let Ok(mut guard) = results.lock() {
                guard.push(VerificationTaskResult {
                    image_path: image.clone(),
                    result,
                });
            }

            pb.inc(1);
        });

        handles.push(handle);
    }

    for handle in handles {
        if handle.join().is_err() {
            warn!("batch worker panicked");
        }
    }

    pb.finish_with_message("Complete");
    let completed_at = Utc::now();

    let task_results = match results.lock() {
        Ok(mut guard) => std::mem::take(&mut *guard),
        Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
    };

    let mut entries = Vec::with_capacity(task_results.len());
    let (mut passed, mut rejected, mut failed) = (0, 0, 0);

    for task_result in task_results {
        let image_path = task_result.image_path.display().to_string();
        match task_result.result {
            Ok(verdict) => {
                if verdict.is_success() {
                    passed += 1;
                } else {
                    rejected += 1;
                }
                entries.push(VerificationEntry {
                    image_path,
                    timestamp: Utc::now(),
                    verdict: Some(verdict),
                    error: None,
                });
            }
            Err(e) => {
                warn!(image = %image_path, error = %e, "verification failed");
                failed += 1;
                entries.push(VerificationEntry {
                    image_path,
                    timestamp: Utc::now(),
                    verdict: None,
                    error: Some(e),
                });
            }
        }
    }

    // Sort entries by image path for consistent output
    entries.sort_by(|a, b| a.image_path.cmp(&b.image_path));

    let results = BatchResults {
        entries,
        total_processed: total_images,
        passed,
        rejected,
        failed,
        started_at,
        completed_at,
    };

    if let Some(output_path) = output {
        let content = serde_json::to_string_pretty(&results)?;
        std::fs::write(&output_path, content)?;
        println!("Results saved to: {}", output_path.display());
    } else {
        output::output_batch(output_format, &results)?;
    }

    Ok(if failed > 0 { 1 } else { 0 })
}

/// Settings changed by `config --set-*`
struct ConfigUpdate {
    backend: Option<EstimatorBackend>,
    model: Option<String>,
    api_base_url: Option<String>,
    api_key_env: Option<String>,
    timeout_secs: Option<u64>,
    estimator_command: Option<String>,
    pose_command: Option<String>,
    face_command: Option<String>,
    max_image_dimension: Option<u32>,
    head_length_cm: Option<f64>,
    output_format: Option<OutputFormat>,
}

impl ConfigUpdate {
    /// Apply to `config`, returning whether anything changed
    fn apply(self, config: &mut Config) -> Result<bool> {
        let mut modified = false;

        if let Some(backend) = self.backend {
            config.backend = backend;
            modified = true;
        }
        if let Some(model) = self.model {
            config.model = model;
            modified = true;
        }
        if let Some(url) = self.api_base_url {
            config.api_base_url = url;
            modified = true;
        }
        if let Some(env) = self.api_key_env {
            config.api_key_env = env;
            modified = true;
        }
        if let Some(timeout) = self.timeout_secs {
            config.timeout_secs = timeout;
            modified = true;
        }
        if let Some(cmd) = self.estimator_command {
            config.estimator_command = Some(cmd);
            modified = true;
        }
        if let Some(cmd) = self.pose_command {
            config.pose_command = Some(cmd);
            modified = true;
        }
        if let Some(cmd) = self.face_command {
            config.face_command = Some(cmd);
            modified = true;
        }
        if let Some(max) = self.max_image_dimension {
            if max == 0 {
                return Err(invalid_setting("max_image_dimension", "Max image dimension must be positive"));
            }
            config.max_image_dimension = max;
            modified = true;
        }
        if let Some(head) = self.head_length_cm {
            if !(head > 0.0) {
                return Err(invalid_setting("head_length_cm", "Head length must be positive"));
            }
            config.head_length_cm = head;
            modified = true;
        }
        if let Some(format) = self.output_format {
            config.output_format = format;
            modified = true;
        }

        Ok(modified)
    }
}

fn invalid_setting(field: &str, message: &str) -> Error {
    Error::InputValidation {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn cmd_config(show: bool, update: ConfigUpdate, reset: bool) -> Result<i32> {
    if reset {
        let config = Config::default();
        config.save()?;
        println!("Configuration reset to defaults");
        println!("\n{}", config);
        return Ok(0);
    }

    let mut config = Config::load()?;
    let modified = update.apply(&mut config)?;

    if modified {
        config.save()?;
        println!("Configuration updated");
    }

    if show || !modified {
        println!("{}", config);
    }

    Ok(0)
}
