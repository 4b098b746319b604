use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use gl_captures::app::{run_capture, RunOptions};
use gl_captures::captures::{find_route, ROUTES};

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

const USAGE: &str =
    "Usage: gl-captures <capture> [--frames N] [--size WxH] [--texture PATH] | --list";

fn run() -> Result<()> {
    let options = match CliOptions::parse(env::args().skip(1))? {
        Command::List => {
            println!("Available captures:");
            for route in ROUTES {
                println!(" - {}", route.name);
            }
            return Ok(());
        }
        Command::Run(options) => options,
    };

    let route = find_route(&options.capture).ok_or_else(|| {
        anyhow!(
            "Unknown capture '{}'. Run with --list to see the available captures",
            options.capture
        )
    })?;
    let summary = run_capture(route, &options.run)?;
    println!("{summary}");
    Ok(())
}

enum Command {
    List,
    Run(CliOptions),
}

struct CliOptions {
    capture: String,
    run: RunOptions,
}

impl CliOptions {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Command> {
        let mut args = args.into_iter();
        let Some(first) = args.next() else {
            return Err(anyhow!(USAGE));
        };
        if first == "--list" {
            return Ok(Command::List);
        }
        if first.starts_with("--") {
            return Err(anyhow!("Expected a capture name before {first}. {USAGE}"));
        }

        let mut run = RunOptions::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--frames" => {
                    let value = flag_value(&mut args, "--frames")?;
                    run.frames = value
                        .parse()
                        .with_context(|| format!("invalid frame count '{value}'"))?;
                }
                "--size" => {
                    let value = flag_value(&mut args, "--size")?;
                    let (width, height) = parse_size(&value)?;
                    run.width = width;
                    run.height = height;
                }
                "--texture" => {
                    run.texture = Some(PathBuf::from(flag_value(&mut args, "--texture")?));
                }
                other => {
                    return Err(anyhow!(
                        "Unknown argument: {other}. Expected --frames, --size or --texture"
                    ));
                }
            }
        }
        Ok(Command::Run(Self {
            capture: first,
            run,
        }))
    }
}

fn flag_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next()
        .ok_or_else(|| anyhow!("{flag} expects a value"))
}

fn parse_size(value: &str) -> Result<(u32, u32)> {
    let Some((width, height)) = value.split_once(['x', 'X']) else {
        return Err(anyhow!("invalid size '{value}', expected WIDTHxHEIGHT"));
    };
    let width = width
        .parse()
        .with_context(|| format!("invalid width in '{value}'"))?;
    let height = height
        .parse()
        .with_context(|| format!("invalid height in '{value}'"))?;
    Ok((width, height))
}
