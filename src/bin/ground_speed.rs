use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use ground_speed_estimation::batch::{batch_average, estimate_directory};
use ground_speed_estimation::camera::{Camera, CommandCamera, ReplayCamera};
use ground_speed_estimation::io::{create_result_file, format_result, write_result, write_session_report};
use ground_speed_estimation::sampling::SystemClock;
use ground_speed_estimation::synthetic::{shifted_pair, write_jpeg_with_capture_time};
use ground_speed_estimation::{EstimatorConfig, Pipeline, SamplingLoop};
use time::OffsetDateTime;

#[derive(Parser)]
#[command(version, about, author)]
struct GseCli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture image pairs for the configured duration and write the average speed
    Run {
        /// Estimator configuration JSON
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Folder of pre-captured images to replay instead of a live camera
        #[arg(long, conflicts_with = "command")]
        replay: Option<PathBuf>,

        /// Still-capture command, `{path}` is replaced with the output file
        #[arg(long, default_value = "rpicam-still -n -o {path}")]
        command: String,

        /// Save a rerun recording of every cycle
        #[arg(long)]
        rerun: Option<PathBuf>,
    },
    /// Estimate the speed between two images
    Pair {
        first: PathBuf,
        second: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Estimate every pair (1, 2), (3, 4), ... of a folder and write the average speed
    Batch {
        /// path to image folder
        path: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Write a synthetic image pair with EXIF capture times
    Synth {
        /// Output directory
        output: PathBuf,

        /// Horizontal ground shift in pixels
        #[arg(long, default_value = "50")]
        shift: i64,

        /// Seconds between the two captures
        #[arg(long, default_value = "10")]
        seconds: i64,

        #[arg(long, default_value = "640")]
        width: u32,

        #[arg(long, default_value = "480")]
        height: u32,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = GseCli::parse();

    match cli.command {
        Commands::Run {
            config,
            replay,
            command,
            rerun: rerun_path,
        } => {
            let config = EstimatorConfig::load(config.as_deref())?;
            let recording = match rerun_path {
                Some(path) => Some(rerun::RecordingStreamBuilder::new("ground_speed").save(path)?),
                None => None,
            };
            match replay {
                Some(dir) => run_session(&config, &mut ReplayCamera::from_dir(&dir)?, recording.as_ref())?,
                None => run_session(&config, &mut CommandCamera::from_template(&command)?, recording.as_ref())?,
            }
        }
        Commands::Pair {
            first,
            second,
            config,
        } => {
            let config = EstimatorConfig::load(config.as_deref())?;
            let estimate = Pipeline::new(&config).estimate_pair(&first, &second)?;
            let m = estimate.measurement;
            println!("Time difference (seconds): {}", m.time_difference_secs);
            println!("Average feature distance (pixels): {:.3}", m.mean_pixel_displacement);
            println!("Matches: {}", m.match_count);
            println!("Speed (km/s): {:.5}", m.speed_km_per_sec);
        }
        Commands::Batch { path, config } => {
            let config = EstimatorConfig::load(config.as_deref())?;
            let pipeline = Pipeline::new(&config);
            let now = Instant::now();
            let entries = estimate_directory(&path, &pipeline)?;
            let ok = entries.iter().filter(|e| e.outcome.is_ok()).count();
            let average = batch_average(&entries);
            log::info!(
                "{} of {} pairs estimated in {:.3} sec",
                ok,
                entries.len(),
                now.elapsed().as_secs_f64()
            );
            write_result(&config.result_path, average)?;
            println!("Final Average Speed (km/s): {}", format_result(average));
        }
        Commands::Synth {
            output,
            shift,
            seconds,
            width,
            height,
        } => write_synthetic_pair(&output, shift, seconds, width, height)?,
    }
    Ok(())
}

fn run_session<C: Camera>(
    config: &EstimatorConfig,
    camera: &mut C,
    recording: Option<&rerun::RecordingStream>,
) -> Result<(), Box<dyn std::error::Error>> {
    let started_at = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    create_result_file(&config.result_path)?;
    std::fs::create_dir_all(&config.capture_dir)?;

    let pipeline = Pipeline::new(config);
    let clock = SystemClock;
    let mut sampling = SamplingLoop::new(camera, &clock, config.sampling_settings()?);
    let summary = sampling.run(&pipeline, recording);

    write_result(&config.result_path, summary.average_speed_km_per_sec)?;
    if let Some(report_path) = &config.report_path {
        write_session_report(report_path, started_at, config, &summary)?;
    }
    println!(
        "Final Average Speed (km/s): {}",
        format_result(summary.average_speed_km_per_sec)
    );
    Ok(())
}

fn write_synthetic_pair(
    output: &Path,
    shift: i64,
    seconds: i64,
    width: u32,
    height: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(output)?;
    let (img1, img2) = shifted_pair(width, height, shift, 0, 7);
    let t0 = time::macros::datetime!(2024-02-19 13:45:00);
    let t1 = t0 + time::Duration::seconds(seconds);
    write_jpeg_with_capture_time(&output.join("image1.jpg"), &img1, &t0)?;
    write_jpeg_with_capture_time(&output.join("image2.jpg"), &img2, &t1)?;
    println!("Generated image1.jpg and image2.jpg in {}", output.display());
    Ok(())
}
