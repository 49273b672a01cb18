use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use kamishibai::cli;
use kamishibai::{Conductor, ConductorEvent, Resource, Status, Tag, Value};
use kamishibai::{BR_TAG, CH_TAG, TEXT_KEY};

/// Work a tag handler asks the driver to do once `step` has returned.
/// Handlers cannot re-enter the conductor, so requests are queued here and
/// applied between ticks.
enum Action {
    Sleep(u64),
    Jump(String),
    Eval { code: String, print: bool },
    Stop,
}

#[derive(Default)]
struct PlayerHost {
    pending: Vec<Action>,
}

impl ConductorEvent for PlayerHost {
    fn on_error(&mut self, messages: &[String]) {
        for m in messages {
            eprintln!("kamishibai: {m}");
        }
    }

    fn on_label(&mut self, label: &str) {
        debug!(label, "label passed");
    }

    fn on_code(&mut self, code: &str, print: bool) {
        self.pending.push(Action::Eval {
            code: code.to_owned(),
            print,
        });
    }

    fn on_tag(&mut self, tag: &Tag) {
        match tag.name.as_str() {
            CH_TAG => {
                if let Some(Value::Str(text)) = tag.get(TEXT_KEY) {
                    print!("{text}");
                    let _ = std::io::stdout().flush();
                }
            }
            BR_TAG => println!(),
            "wait" => {
                let ms = tag.get("time").map(Value::as_num).unwrap_or(0.0);
                if ms > 0.0 {
                    self.pending.push(Action::Sleep(ms as u64));
                } else {
                    warn!(body = tag.body(), "wait without a positive time");
                }
            }
            "jump" => match tag.get("label").and_then(Value::as_str) {
                Some(label) => self.pending.push(Action::Jump(label.to_owned())),
                None => warn!(body = tag.body(), "jump without a label"),
            },
            "s" => self.pending.push(Action::Stop),
            other => debug!(name = other, "tag skipped"),
        }
    }
}

fn split_script_path(base_dir: Option<PathBuf>, script: &Path) -> (PathBuf, String) {
    match base_dir {
        // Explicit base: the script argument is taken relative to it.
        Some(dir) => (dir, script.to_string_lossy().into_owned()),
        // Otherwise play the file from its own directory.
        None => {
            let parent = script
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            let name = script
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| script.to_string_lossy().into_owned());
            (parent, name)
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    eprintln!("kamishibai {} — tick-driven script player", env!("CARGO_PKG_VERSION"));

    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("kamishibai: {e}");
            eprintln!("Usage: kamishibai [-b<dir>] [-f<fps>] [-n] <script>");
            std::process::exit(1);
        }
    };

    let (base_dir, script_name) = split_script_path(args.base_dir, &args.script);

    let mut resource = Resource::new(&base_dir);
    if args.no_cache {
        resource.set_cache_enabled(false);
    }
    let mut conductor = Conductor::new(resource);
    let mut host = PlayerHost::default();

    if let Err(e) = conductor.load_script(&script_name).await {
        host.on_error(&[e.to_string()]);
        std::process::exit(1);
    }
    info!(
        script = script_name,
        base = %base_dir.display(),
        fps = args.fps,
        "playing"
    );

    conductor.start();
    let start = Instant::now();
    let mut frames = tokio::time::interval(Duration::from_secs_f64(1.0 / f64::from(args.fps)));

    loop {
        tokio::select! {
            _ = frames.tick() => {
                let tick = start.elapsed().as_millis() as u64;
                if let Err(e) = conductor.step(tick, &mut host) {
                    host.on_error(&[e.to_string()]);
                    conductor.stop();
                }

                let actions: Vec<Action> = host.pending.drain(..).collect();
                for action in actions {
                    match action {
                        Action::Sleep(ms) => conductor.sleep(tick, ms),
                        Action::Jump(label) => {
                            if let Err(e) = conductor.jump_to_label(&label) {
                                host.on_error(&[e.to_string()]);
                                conductor.stop();
                            }
                        }
                        Action::Eval { code, print } => {
                            match conductor.resource_mut().eval(&code) {
                                Ok(value) => {
                                    if print {
                                        println!("{value}");
                                    }
                                }
                                Err(e) => {
                                    host.on_error(&[e.to_string()]);
                                    conductor.stop();
                                }
                            }
                        }
                        Action::Stop => conductor.stop(),
                    }
                }

                if conductor.status() == Status::Stop {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                conductor.stop();
                break;
            }
        }
    }

    // Leave the cursor on a fresh line after a character-by-character reveal.
    println!();
}
