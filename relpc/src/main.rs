use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use liblpc::filters::{design, FilterKind};
use liblpc::{frame_count, AnalysisConfig, DispatchStrategy};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "relpc")]
#[command(version)]
#[command(about = "Frame-wise LPC analysis of audio files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute LPC coefficients for every frame of an audio file
    Analyze {
        /// Input audio file (wav, flac, mp3, ogg, etc.)
        input: PathBuf,
        /// Frame length in samples (even)
        #[arg(long)]
        frame_len: Option<usize>,
        /// LPC model order
        #[arg(short, long)]
        order: Option<usize>,
        /// Number of workers (default: logical CPUs)
        #[arg(short, long)]
        workers: Option<usize>,
        /// Dispatch strategy (partitioned, per-frame)
        #[arg(long)]
        strategy: Option<String>,
        /// JSON analysis config; flags override its values
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write the result to a .json or .csv file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Show what the analyzer will see in an audio file
    Info {
        /// Input audio file
        input: PathBuf,
        /// Frame length used for the frame count
        #[arg(long, default_value = "512")]
        frame_len: usize,
    },
    /// Rebuild the signal from its frame spectra by overlap-add
    Resynth {
        /// Input audio file
        input: PathBuf,
        /// Output WAV file
        output: PathBuf,
        /// Frame length in samples (even)
        #[arg(long, default_value = "512")]
        frame_len: usize,
    },
    /// Print normalized biquad coefficients
    Biquad {
        /// Filter kind (lowpass, highpass, bandpass, bandpass-skirt, allpass,
        /// lowshelf, highshelf, peak, notch)
        #[arg(long)]
        kind: String,
        /// Center or corner frequency in Hz
        #[arg(long)]
        freq: f64,
        /// Quality factor
        #[arg(short, long, default_value = "0.7071")]
        q: f64,
        /// Gain in dB (shelf and peak filters)
        #[arg(short, long, default_value = "0.0", allow_hyphen_values = true)]
        gain: f64,
        /// Sample rate in Hz
        #[arg(long, default_value = "44100")]
        sample_rate: f64,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            frame_len,
            order,
            workers,
            strategy,
            config,
            output,
        } => {
            let config = build_config(config.as_deref(), frame_len, order, workers, strategy)?;
            analyze(&input, &config, output.as_deref())?;
        }
        Commands::Info { input, frame_len } => {
            info(&input, frame_len)?;
        }
        Commands::Resynth {
            input,
            output,
            frame_len,
        } => {
            resynth(&input, &output, frame_len)?;
        }
        Commands::Biquad {
            kind,
            freq,
            q,
            gain,
            sample_rate,
        } => {
            biquad(&kind, freq, q, gain, sample_rate)?;
        }
    }

    Ok(())
}

fn build_config(
    path: Option<&Path>,
    frame_len: Option<usize>,
    order: Option<usize>,
    workers: Option<usize>,
    strategy: Option<String>,
) -> Result<AnalysisConfig> {
    let mut config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            AnalysisConfig::from_json(&text)?
        }
        None => AnalysisConfig::default(),
    };

    if let Some(frame_len) = frame_len {
        config.frame_len = frame_len;
    }
    if let Some(order) = order {
        config.order = order;
    }
    if let Some(workers) = workers {
        config.worker_count = workers;
    }
    if let Some(strategy) = strategy {
        config.strategy = strategy.parse::<DispatchStrategy>()?;
    }

    config.validate()?;
    Ok(config)
}

fn analyze(input: &Path, config: &AnalysisConfig, output: Option<&Path>) -> Result<()> {
    println!("Reading {}...", input.display());
    let audio = relpc::audio::read_mono_file(input)?;

    println!("  Sample rate: {} Hz", audio.sample_rate);
    println!("  Channels:    {}", audio.channels);
    println!("  Duration:    {:.2}s", audio.duration_secs());

    println!(
        "Analyzing (frame {}, order {}, {} workers, {:?})...",
        config.frame_len, config.order, config.worker_count, config.strategy
    );
    let report = relpc::analyze_audio(&audio, config)?;

    println!("Done!");
    println!("  Frames:      {}", report.matrix.frame_count());
    println!("  Elapsed:     {:.2} ms", report.elapsed_ms);

    let Some(output) = output else {
        return Ok(());
    };

    match output.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => {
            let file = fs::File::create(output).context("Failed to create output file")?;
            relpc::write_matrix_csv(&report.matrix, std::io::BufWriter::new(file))?;
        }
        Some(ext) if ext.eq_ignore_ascii_case("json") => {
            fs::write(output, report.to_json()?).context("Failed to write output file")?;
        }
        _ => bail!(
            "Unknown output format for {} (use .json or .csv)",
            output.display()
        ),
    }
    println!("  Output:      {}", output.display());

    Ok(())
}

fn info(input: &Path, frame_len: usize) -> Result<()> {
    let audio = relpc::audio::read_mono_file(input)?;

    println!("Audio File");
    println!("───────────────────────────────");
    println!("  Sample rate: {} Hz", audio.sample_rate);
    println!("  Channels:    {}", audio.channels);
    println!("  Samples:     {}", audio.samples.len());
    println!("  Duration:    {:.2}s", audio.duration_secs());
    match frame_count(audio.samples.len(), frame_len) {
        Ok(count) => println!("  Frames:      {} (frame length {})", count, frame_len),
        Err(e) => println!("  Frames:      none ({})", e),
    }

    Ok(())
}

fn resynth(input: &Path, output: &Path, frame_len: usize) -> Result<()> {
    println!("Reading {}...", input.display());
    let audio = relpc::audio::read_mono_file(input)?;

    println!("Resynthesizing (frame {})...", frame_len);
    let samples = relpc::resynthesize(&audio, frame_len)?;
    relpc::audio::write_wav(output, &samples, audio.sample_rate, 1)?;

    println!("Done!");
    println!("  Output:      {}", output.display());

    Ok(())
}

fn biquad(kind: &str, freq: f64, q: f64, gain: f64, sample_rate: f64) -> Result<()> {
    let kind: FilterKind = kind.parse()?;
    let filter = design(kind, freq, q, gain, sample_rate)?;
    let [b0, b1, b2, a0, a1, a2] = filter.coefficients();

    println!("{:?} @ {} Hz, Q {}, {} dB", kind, freq, q, gain);
    println!("  b: [{b0:.12}, {b1:.12}, {b2:.12}]");
    println!("  a: [{a0:.12}, {a1:.12}, {a2:.12}]");
    if !kind.uses_gain() && gain != 0.0 {
        log::warn!("gain is ignored for {:?}", kind);
    }

    Ok(())
}
