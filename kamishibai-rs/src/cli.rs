//! Command-line argument parsing.
//!
//! Usage:
//!   kamishibai [-b<dir>] [-f<fps>] [-n] <script>

use std::path::PathBuf;

/// Ticks per second when `-f` is not given.
pub const DEFAULT_FPS: u32 = 60;

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug)]
pub struct CliArgs {
    /// Script base directory (`-b<dir>`); defaults to the script's parent.
    pub base_dir: Option<PathBuf>,
    /// Ticks per second (`-f<fps>`).
    pub fps: u32,
    /// Disable the parsed-script cache (`-n`).
    pub no_cache: bool,
    /// Script to play.
    pub script: PathBuf,
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()` and return [`CliArgs`] or an error message.
pub fn parse_args() -> Result<CliArgs, String> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(&raw[1..])
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    let mut base_dir: Option<PathBuf> = None;
    let mut fps: u32 = DEFAULT_FPS;
    let mut no_cache = false;
    let mut positional: Vec<String> = Vec::new();
    let mut i = 0;

    while i < argv.len() {
        let arg = argv[i].as_str();

        // `--` ends flag processing.
        if arg == "--" {
            i += 1;
            positional.extend(argv[i..].iter().cloned());
            break;
        }

        // Non-flag argument.
        if !arg.starts_with('-') || arg == "-" {
            positional.push(arg.to_owned());
            i += 1;
            continue;
        }

        // Flag argument: iterate over characters after the leading `-`.
        let chars: Vec<char> = arg[1..].chars().collect();
        let mut j = 0;
        while j < chars.len() {
            match chars[j] {
                'n' => no_cache = true,

                // -b<dir>
                'b' => {
                    let dir = if j + 1 < chars.len() {
                        let s: String = chars[j + 1..].iter().collect();
                        j = chars.len();
                        s
                    } else if i + 1 < argv.len() {
                        i += 1;
                        argv[i].clone()
                    } else {
                        return Err("-b requires a directory argument".to_owned());
                    };
                    base_dir = Some(PathBuf::from(dir));
                }

                // -f<fps>
                'f' => {
                    let value = if j + 1 < chars.len() {
                        let s: String = chars[j + 1..].iter().collect();
                        j = chars.len();
                        s
                    } else if i + 1 < argv.len() {
                        i += 1;
                        argv[i].clone()
                    } else {
                        return Err("-f requires a ticks-per-second argument".to_owned());
                    };
                    fps = value
                        .parse()
                        .map_err(|_| format!("invalid fps: {value}"))?;
                    if fps == 0 {
                        return Err("fps must be at least 1".to_owned());
                    }
                }

                c => return Err(format!("unknown option: -{c}")),
            }
            j += 1;
        }
        i += 1;
    }

    let script = match positional.len() {
        0 => return Err("missing script path".to_owned()),
        1 => PathBuf::from(positional.remove(0)),
        n => return Err(format!("too many arguments ({n})")),
    };

    Ok(CliArgs {
        base_dir,
        fps,
        no_cache,
        script,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
