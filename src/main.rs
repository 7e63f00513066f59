use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;
use webp_bridge::bridge::codec_version;
use webp_bridge::config;
use webp_bridge::config::job::JobFile;
use webp_bridge::config::merged::MergedConfig;
use webp_bridge::pipeline::job_runner::{JobConfig, JobKind};
use webp_bridge::pipeline::orchestrator::run_all_jobs;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("Usage: webp_bridge <jobs.yaml>...");
        eprintln!("  Encode images to WebP or decode WebP files according to job specifications.");
        eprintln!("  --codec-version  Print the linked libwebp versions.");
        return if args.is_empty() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        };
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        eprintln!("webp_bridge {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    if args.iter().any(|a| a == "--codec-version") {
        let version = codec_version();
        let (em, en, er) = version.encoder;
        let (dm, dn, dr) = version.decoder;
        eprintln!("libwebp encoder {em}.{en}.{er}, decoder {dm}.{dn}.{dr}");
        return ExitCode::SUCCESS;
    }

    let mut job_configs: Vec<JobConfig> = Vec::new();
    let mut parallel_workers = 0;

    for job_file_arg in &args {
        let job_file_path = Path::new(job_file_arg);

        // Load settings from the same directory as the job file.
        let settings = match config::load_settings_for_job(job_file_path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("ERROR: Failed to load settings for {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };
        parallel_workers = parallel_workers.max(settings.parallel_workers);

        let yaml_content = match std::fs::read_to_string(job_file_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("ERROR: Failed to read job file {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };

        let job_file = match JobFile::from_yaml(&yaml_content) {
            Ok(jf) => jf,
            Err(e) => {
                eprintln!("ERROR: Failed to parse job file {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };

        // Relative paths in a job file are relative to the job file.
        let job_dir = job_file_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        for job in &job_file.jobs {
            let merged = MergedConfig::new(&settings, job);
            let cache_dir = merged
                .use_cache
                .then(|| resolve_path(&job_dir, &merged.cache_dir.to_string_lossy()));

            job_configs.push(JobConfig {
                input_path: resolve_path(&job_dir, &job.input),
                output_path: resolve_path(&job_dir, &job.output),
                quality: merged.quality,
                lossless: merged.lossless,
                pixel_format: merged.pixel_format,
                cache_dir,
            });
        }
    }

    let results = run_all_jobs(&job_configs, parallel_workers);

    let mut has_error = false;
    for (i, result) in results.iter().enumerate() {
        match result {
            Ok(job_result) => {
                let action = match job_result.kind {
                    JobKind::Encode => "encoded",
                    JobKind::Decode => "decoded",
                };
                let cached = if job_result.cache_hit { ", cached" } else { "" };
                eprintln!(
                    "OK: {} -> {} ({} {}x{}, {} bytes{})",
                    job_result.input_path.display(),
                    job_result.output_path.display(),
                    action,
                    job_result.width,
                    job_result.height,
                    job_result.bytes_written,
                    cached
                );
            }
            Err(e) => {
                eprintln!(
                    "ERROR: {} -> {}: {e}",
                    job_configs[i].input_path.display(),
                    job_configs[i].output_path.display()
                );
                has_error = true;
            }
        }
    }

    if has_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Resolve a potentially relative path against a base directory.
/// If the path is already absolute, return it as-is.
fn resolve_path(base_dir: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}
