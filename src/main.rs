//! CLI front end: collects parameters, runs one operation, prints curve or samples as JSON.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use torque_link::communication::frame::ControlMode;
use torque_link::config::{self, Config};
use torque_link::hardware::serial::{HostSerial, SerialInterface};
use torque_link::hardware::transport::TransportMode;
use torque_link::motion::shaper::ShapingFunction;
use torque_link::{Driver, DriverError, SendRequest};

/// Torque correction driver for the serial motion controller
#[derive(Parser, Debug)]
#[command(name = "torque-link", version, about = "Send torque correction frames to the motion controller and read back telemetry.")]
struct Cli {
    /// Path to a TOML config file (defaults are used if it does not exist)
    #[arg(short, long, default_value = "torque-link.toml")]
    config: PathBuf,

    /// Log per-state transitions and traffic
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides for values from the config file
#[derive(clap::Args, Debug, Default)]
struct Params {
    /// Shaping function: constant, linear, "hyperbolic sine", cubic, "hyperbolic sine + cubic" or 0-4
    #[arg(short, long)]
    function: Option<ShapingFunction>,

    /// Dead zone half-width in degrees
    #[arg(short, long)]
    tolerance: Option<u16>,

    /// Value for the constant function
    #[arg(long)]
    constant: Option<i64>,

    /// Amplitude byte (255 = full range)
    #[arg(short, long)]
    amplitude: Option<u8>,

    /// Frequency byte (128 = ±180°)
    #[arg(long)]
    frequency: Option<u8>,

    /// Control mode byte: st or pt
    #[arg(long, value_parser = parse_control_mode)]
    control_mode: Option<ControlMode>,

    /// Stopping points separated with spaces, including the starting point
    #[arg(long)]
    trajectory: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the generated torque curve as JSON
    Curve {
        #[command(flatten)]
        params: Params,
    },
    /// Encode the frames and write them to a file instead of a port
    Encode {
        #[command(flatten)]
        params: Params,
        /// Output file for the raw frame stream
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Exchange frames with the device
    Send {
        #[command(flatten)]
        params: Params,
        /// Serial port identifier
        #[arg(short, long)]
        port: Option<String>,
        /// Transport mode: write_only, read_only or write_then_read
        #[arg(short, long)]
        mode: Option<TransportMode>,
    },
    /// List serial ports
    Ports,
}

fn parse_control_mode(s: &str) -> Result<ControlMode, String> {
    match s.to_ascii_lowercase().as_str() {
        "st" | "0" => Ok(ControlMode::St),
        "pt" | "1" => Ok(ControlMode::Pt),
        _ => Err(format!("Invalid control mode '{}': expected st or pt", s)),
    }
}

impl Params {
    fn apply(&self, config: &mut Config) {
        if let Some(function) = self.function {
            config.shaping.function = Some(function);
        }
        if let Some(tolerance) = self.tolerance {
            config.shaping.tolerance = tolerance;
        }
        if let Some(constant) = self.constant {
            config.shaping.constant = constant;
        }
        if let Some(amplitude) = self.amplitude {
            config.frame.amplitude = amplitude;
        }
        if let Some(frequency) = self.frequency {
            config.frame.frequency = frequency;
        }
        if let Some(control_mode) = self.control_mode {
            config.frame.control_mode = control_mode;
        }
        if let Some(trajectory) = &self.trajectory {
            config.motion.trajectory = trajectory.clone();
        }
    }
}

fn load(path: &Path) -> Result<Config, DriverError> {
    if !path.exists() {
        tracing::info!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }
    tracing::info!("Loading configuration from: {}", path.display());
    Ok(config::load_config(&path.to_string_lossy())?)
}

async fn run(cli: Cli) -> Result<(), DriverError> {
    let mut config = load(&cli.config)?;

    match cli.command {
        Commands::Curve { params } => {
            params.apply(&mut config);
            let curve = SendRequest::from_config(&config).curve()?;
            let points: Vec<_> = curve
                .points()
                .map(|(degree, value)| serde_json::json!({ "degree": degree, "value": value }))
                .collect();
            println!("{}", serde_json::Value::Array(points));
        }
        Commands::Encode { params, output } => {
            params.apply(&mut config);
            let request = SendRequest::from_config(&config);
            let curve = request.curve()?;
            let trajectory = request.trajectory()?;
            let frames = torque_link::communication::frame::encode(&trajectory, &curve, request.header());
            let bytes: Vec<u8> = frames.iter().flat_map(|f| f.as_bytes().iter().copied()).collect();
            std::fs::write(&output, &bytes).map_err(config::ConfigError::Io)?;
            tracing::info!("Wrote {} frame(s) ({} bytes) to {}", frames.len(), bytes.len(), output.display());
        }
        Commands::Send { params, port, mode } => {
            params.apply(&mut config);
            if let Some(port) = port {
                config.device.port = port;
            }
            if let Some(mode) = mode {
                config.transport.mode = Some(mode);
            }
            config.validate()?;

            let driver = Driver::new(HostSerial, config.device.read_timeout());
            let outcome = driver.send(&SendRequest::from_config(&config)).await?;
            for sample in &outcome.samples {
                match serde_json::to_string(sample) {
                    Ok(line) => println!("{}", line),
                    Err(e) => tracing::warn!("Failed to serialize sample: {}", e),
                }
            }
            tracing::info!(
                "Sent {} frame(s), decoded {} sample(s)",
                outcome.frames_sent,
                outcome.samples.len()
            );
        }
        Commands::Ports => {
            let ports = HostSerial.available_ports();
            if ports.is_empty() {
                tracing::info!("No serial ports found");
            }
            for port in ports {
                println!("{}", port);
            }
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    if let Err(e) = run(cli).await {
        tracing::error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}
