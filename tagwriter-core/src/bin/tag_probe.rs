// tagwriter-core/src/bin/tag_probe.rs
//
// Plays tagged text in the terminal.
//
//   tag_probe "[speed=0.08]Hello [b]world[/b][pause=1][br]Bye"
//   echo "..." | tag_probe --config playback.json
//
// Ctrl+C skips to the end.

use std::io::Write;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tagwriter_core::{Typewriter, TypewriterConfig};
use tagwriter_signal::ActionHub;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    // RUST_LOG=tagwriter_core=debug
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

/// Prints only what changed since the last frame; redraws on shrink (`[clear]`).
fn terminal_sink() -> impl Fn(&str) + Send + Sync + 'static {
    let shown = Mutex::new(String::new());
    move |text: &str| {
        let mut shown = shown.lock().unwrap_or_else(|e| e.into_inner());
        let mut out = std::io::stdout().lock();
        let _ = match text.strip_prefix(shown.as_str()) {
            Some(delta) => write!(out, "{delta}"),
            None => write!(out, "\n{text}"),
        };
        let _ = out.flush();
        shown.clear();
        shown.push_str(text);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let mut args = std::env::args().skip(1);
    let mut config = TypewriterConfig::default();
    let mut text = None;

    while let Some(arg) = args.next() {
        if arg == "--config" {
            let path = args.next().context("--config needs a path")?;
            let json = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            config = TypewriterConfig::from_json(&json)?;
        } else {
            text = Some(arg);
        }
    }

    let text = match text {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("stdin read failed")?;
            buf
        }
    };

    ActionHub::global().subscribe(|payload| eprintln!("\n[tag_probe] action: {payload}"));

    let mut typewriter = Typewriter::builder(terminal_sink()).config(config).build();

    let report = typewriter.validate(&text);
    for line in report.report() {
        eprintln!("[tag_probe] {line}");
    }

    let done = Arc::new(Mutex::new(false));
    let flag = done.clone();
    typewriter
        .start(
            &text,
            None,
            Some(Box::new(move || {
                *flag.lock().unwrap_or_else(|e| e.into_inner()) = true;
            })),
        )
        .await;

    let mut state = typewriter.watch_state();
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            typewriter.skip().await;
        }
        _ = state.wait_for(|s| !matches!(s, tagwriter_core::PlaybackState::Typing)) => {}
    }

    println!();
    let completed = *done.lock().unwrap_or_else(|e| e.into_inner());
    eprintln!("[tag_probe] done (completed: {completed})");
    Ok(())
}
