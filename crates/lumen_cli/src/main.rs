//! Lumen CLI
//!
//! Convert colors, derive selection colors and replay scroll scenarios
//! against a reveal section.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lumen_animation::{FrameClock, TargetPhase};
use lumen_layout::{RevealSection, VisibilityTrigger};
use lumen_theme::{to_rgba, ColorSpec, SelectionColors, ThemeColors};
use std::path::PathBuf;
use std::thread;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

use config::LumenConfig;

#[derive(Parser)]
#[command(name = "lumen")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Scroll reveal and theme color toolkit", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a color to rgba() at an opacity
    Rgba {
        /// Color name, hex or rgb()/rgba() string
        color: String,

        /// Opacity in [0, 1]
        #[arg(short, long, default_value = "1.0")]
        opacity: f32,
    },

    /// Print the inverted ::selection rule for a theme pair
    Selection {
        /// Primary (foreground) color
        #[arg(short, long)]
        primary: String,

        /// Background color
        #[arg(short, long)]
        background: String,

        /// CSS selector the rule applies to
        #[arg(short, long, default_value = ".inverted-selection")]
        selector: String,

        /// Config file providing the selection opacities
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Replay visibility ratios against a reveal section
    Simulate {
        /// Config file (lumen.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Comma-separated visible ratios, one per step
        #[arg(short, long, value_delimiter = ',', default_value = "0.3,0.6,0.2,0.55")]
        ratios: Vec<f32>,

        /// Text revealed letter by letter
        #[arg(short, long, default_value = "About me.")]
        text: String,

        /// Frame length used to advance the animation
        #[arg(long, default_value = "16")]
        frame_ms: f32,

        /// Time spent at each ratio before moving to the next
        #[arg(long, default_value = "400")]
        step_ms: f32,

        /// Pace frames with the wall clock instead of running instantly
        #[arg(long)]
        realtime: bool,
    },

    /// Print the default configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Rgba { color, opacity } => cmd_rgba(&color, opacity),

        Commands::Selection {
            primary,
            background,
            selector,
            config,
        } => cmd_selection(&primary, &background, &selector, config),

        Commands::Simulate {
            config,
            ratios,
            text,
            frame_ms,
            step_ms,
            realtime,
        } => cmd_simulate(
            config,
            &ratios,
            &text,
            Pacing {
                frame_ms,
                step_ms,
                realtime,
            },
        ),

        Commands::Config => cmd_config(),
    }
}

fn cmd_rgba(color: &str, opacity: f32) -> Result<()> {
    let rgba = to_rgba(color, opacity).with_context(|| format!("Cannot convert '{}'", color))?;
    println!("{}", rgba);
    Ok(())
}

fn cmd_selection(
    primary: &str,
    background: &str,
    selector: &str,
    config: Option<PathBuf>,
) -> Result<()> {
    let config = LumenConfig::load_or_default(config.as_deref())?;
    let theme = ThemeColors::new(ColorSpec::from(primary), ColorSpec::from(background));

    let colors = SelectionColors::derive(&theme, &config.reveal.selection)
        .context("Cannot derive selection colors")?;
    print!("{}", colors.css_rule(selector));
    Ok(())
}

/// How simulated time advances
struct Pacing {
    frame_ms: f32,
    step_ms: f32,
    realtime: bool,
}

fn cmd_simulate(
    config: Option<PathBuf>,
    ratios: &[f32],
    text: &str,
    pacing: Pacing,
) -> Result<()> {
    if !(pacing.frame_ms.is_finite() && pacing.frame_ms > 0.0) {
        anyhow::bail!("--frame-ms must be positive, got {}", pacing.frame_ms);
    }
    if !(pacing.step_ms.is_finite() && pacing.step_ms >= 0.0) {
        anyhow::bail!("--step-ms must not be negative, got {}", pacing.step_ms);
    }

    let config = LumenConfig::load_or_default(config.as_deref())?;
    let trigger = VisibilityTrigger::new(config.page.viewport());
    let mut section = RevealSection::mount(
        &trigger,
        text,
        config.page.section(),
        config.reveal.clone(),
    )
    .context("Cannot mount reveal section")?;

    let selection = section
        .selection_colors(&config.theme)
        .context("Cannot derive selection colors")?;
    info!(
        "Selection: background {} / text {}",
        selection.background, selection.foreground
    );

    let mut clock = FrameClock::new();
    for (step, &ratio) in ratios.iter().enumerate() {
        match section.report_ratio(ratio) {
            Some(run) => info!(
                "Step {}: ratio {:.2} -> run {} over {} letters ({}ms)",
                step + 1,
                ratio,
                run.id.get(),
                run.target_count,
                run.completion_time_ms()
            ),
            None => info!("Step {}: ratio {:.2}", step + 1, ratio),
        }

        let mut elapsed = 0.0;
        while elapsed < pacing.step_ms {
            let dt = if pacing.realtime {
                thread::sleep(clock.remaining_in_frame());
                clock.advance()
            } else {
                pacing.frame_ms.min(pacing.step_ms - elapsed)
            };
            elapsed += dt;

            for update in section.tick(dt) {
                debug!(
                    "  t={:>7.1}ms letter {:>2} {:?} opacity {:.3} offset {:.2}",
                    section.animator().now_ms(),
                    update.index,
                    update.phase,
                    update.state.opacity,
                    update.state.offset_y
                );
            }
        }
    }

    // Let any remaining run finish
    let mut guard_frames = 0u32;
    while section.is_animating() {
        section.tick(pacing.frame_ms);
        guard_frames += 1;
        if guard_frames > 100_000 {
            warn!("Animation still running after {} frames, giving up", guard_frames);
            break;
        }
    }
    section.unmount();

    let settled = section
        .letters()
        .filter(|letter| letter.phase == TargetPhase::Settled)
        .count();
    info!(
        "Done: {} runs, {}/{} letters settled at {}ms",
        section.runs_started(),
        settled,
        section.letters().count(),
        section.animator().now_ms()
    );

    Ok(())
}

fn cmd_config() -> Result<()> {
    print!("{}", LumenConfig::default().to_toml()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulate_defaults() {
        let cli = Cli::try_parse_from(["lumen", "simulate"]).unwrap();
        let Commands::Simulate {
            ratios, text, frame_ms, ..
        } = cli.command
        else {
            panic!("expected simulate");
        };
        assert_eq!(ratios, [0.3, 0.6, 0.2, 0.55]);
        assert_eq!(text, "About me.");
        assert_eq!(frame_ms, 16.0);
    }

    #[test]
    fn test_global_verbose_flag() {
        let cli = Cli::try_parse_from(["lumen", "rgba", "#fff", "-o", "0.7", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Rgba { opacity, .. } if opacity == 0.7));
    }

    #[test]
    fn test_simulate_runs_to_completion() {
        let pacing = Pacing {
            frame_ms: 16.0,
            step_ms: 100.0,
            realtime: false,
        };
        assert!(cmd_simulate(None, &[0.3, 0.6, 0.2, 0.55], "Hi", pacing).is_ok());
    }

    #[test]
    fn test_simulate_rejects_bad_pacing() {
        let pacing = Pacing {
            frame_ms: 0.0,
            step_ms: 100.0,
            realtime: false,
        };
        assert!(cmd_simulate(None, &[0.6], "Hi", pacing).is_err());
    }
}
