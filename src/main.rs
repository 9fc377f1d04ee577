//! slrp CLI: argument parsing, input selection, chain execution, output.
//!
//! ```text
//! echo "Hello, World" | slrp 'x => x.split(" ")' '[0].length'
//! # 6
//! ```

use std::io::{Read, Write};
use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;
use serde_json::Value;
use simplelog::{ColorChoice, TermLogger, TerminalMode};

use slrp::chain;
use slrp::completion::completion_script;
use slrp::config::{ColorMode, Config};
use slrp::error::Error;
use slrp::input::{self, Format};
use slrp::present;

#[derive(Parser)]
#[command(
    name = "slrp",
    version,
    about = "Chain small expressions over stdin, files, and structured data",
    after_help = "EXAMPLE:\n  echo \"Hello, World\" | slrp 'x => x.split(\" \")' '[0].length'\n  # 6"
)]
struct Cli {
    /// Expression segments, applied left to right
    #[arg(value_name = "EXPR")]
    segments: Vec<String>,

    /// Split input by newlines into an array of strings
    #[arg(short, long)]
    newline: bool,

    /// Split input by spaces into an array of strings
    #[arg(short, long = "white-space")]
    white_space: bool,

    /// Run the chain once per input line instead of once over the whole input
    #[arg(short, long)]
    linewise: bool,

    /// Parse input as JSON
    #[arg(short, long)]
    json: bool,

    /// Parse input as YAML
    #[arg(short, long)]
    yaml: bool,

    /// Parse input as XML
    #[arg(short = 'x', long)]
    xml: bool,

    /// Read input from a file, sniffing the format from its extension
    #[arg(short, long, value_name = "PATH")]
    file: Option<String>,

    /// Read input from a file as raw text, no format sniffing
    #[arg(short, long, value_name = "PATH")]
    plain: Option<String>,

    /// Run a command and use its stdout as input
    #[arg(short, long, value_name = "CMD")]
    exec: Option<String>,

    /// Write the result back to the input file (requires --file or --plain)
    #[arg(short, long = "in-place")]
    in_place: bool,

    /// With --in-place, copy the original aside first with this suffix
    #[arg(long, value_name = "SUFFIX")]
    backup: Option<String>,

    /// When to colorize structured output (overrides configuration)
    #[arg(long, value_enum, value_name = "WHEN")]
    color: Option<ColorMode>,

    /// List registered function names and exit
    #[arg(long)]
    list: bool,

    /// Print a bash completion script and exit
    #[arg(long)]
    completion: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("slrp: {e}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let _ = TermLogger::init(
        level,
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}

fn run(cli: Cli) -> Result<(), Error> {
    let config = Config::load();
    // Environment problems are fatal before any input is read
    let env = config.build_env()?;

    if cli.list {
        let mut stdout = std::io::stdout().lock();
        for name in env.function_names() {
            writeln!(stdout, "{name}")?;
        }
        return Ok(());
    }
    if cli.completion {
        print!("{}", completion_script(&env));
        return Ok(());
    }

    let source_path = file_path(&cli);
    if cli.in_place && source_path.is_none() {
        return Err(Error::Config("--in-place requires --file or --plain".into()));
    }

    let text = read_input(&cli, source_path.as_deref())?;

    let output = if cli.linewise {
        chain::run_linewise(&text, &cli.segments, &env)?
    } else {
        let initial = initial_value(&cli, &text)?;
        let result = chain::run(&cli.segments, initial, &env)?;
        let color = !cli.in_place
            && present::should_color(cli.color.unwrap_or(config.settings.color));
        present::render(&result, color)
    };

    match source_path {
        Some(path) if cli.in_place => {
            present::write_in_place(&path, &output, cli.backup.as_deref())?;
        }
        _ => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(output.as_bytes())?;
        }
    }

    Ok(())
}

fn file_path(cli: &Cli) -> Option<PathBuf> {
    cli.file
        .as_deref()
        .or(cli.plain.as_deref())
        .map(|p| PathBuf::from(shellexpand::tilde(p).into_owned()))
}

fn read_input(cli: &Cli, path: Option<&std::path::Path>) -> Result<String, Error> {
    if let Some(cmd) = &cli.exec {
        return Ok(input::exec_input(cmd)?);
    }
    if let Some(path) = path {
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut text = String::new();
    std::io::stdin().read_to_string(&mut text)?;
    Ok(text)
}

/// Build the chain's initial value per flags. Split modes win over format
/// sniffing so `-n -f notes.txt` splits the file's lines.
fn initial_value(cli: &Cli, text: &str) -> Result<Value, Error> {
    if cli.newline {
        return Ok(input::split_newlines(text));
    }
    if cli.white_space {
        return Ok(input::split_spaces(text));
    }

    let format = if cli.json {
        Format::Json
    } else if cli.yaml {
        Format::Yaml
    } else if cli.xml {
        Format::Xml
    } else if let Some(path) = &cli.file {
        input::sniff_format(std::path::Path::new(path))
    } else if cli.plain.is_some() {
        // Raw file content untouched, so in-place edits keep fidelity
        return Ok(Value::String(text.to_string()));
    } else {
        // Bare stdin: trimmed raw text
        return Ok(Value::String(text.trim().to_string()));
    };

    Ok(input::parse_document(text, format)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("slrp").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn segments_collect_in_order() {
        let cli = cli(&["x => x.length", "x => x + x"]);
        assert_eq!(cli.segments, vec!["x => x.length", "x => x + x"]);
    }

    #[test]
    fn short_flags_parse() {
        let cli = cli(&["-n", "-l", "-j", "."]);
        assert!(cli.newline && cli.linewise && cli.json);
        assert_eq!(cli.segments, vec!["."]);
    }

    #[test]
    fn initial_value_newline_split() {
        let cli = cli(&["-n"]);
        assert_eq!(
            initial_value(&cli, "what\nis\nthis\n").unwrap(),
            serde_json::json!(["what", "is", "this"])
        );
    }

    #[test]
    fn initial_value_stdin_is_trimmed() {
        let cli = cli(&[]);
        assert_eq!(initial_value(&cli, "hello\n").unwrap(), serde_json::json!("hello"));
    }

    #[test]
    fn initial_value_plain_file_is_exact() {
        let cli = cli(&["-p", "whatever.js"]);
        assert_eq!(
            initial_value(&cli, "Hello world\n").unwrap(),
            serde_json::json!("Hello world\n")
        );
    }

    #[test]
    fn initial_value_json_flag() {
        let cli = cli(&["-j"]);
        assert_eq!(
            initial_value(&cli, r#"{"someKey": "some value"}"#).unwrap(),
            serde_json::json!({"someKey": "some value"})
        );
    }

    #[test]
    fn split_mode_wins_over_file_sniffing() {
        let cli = cli(&["-n", "-f", "data.json"]);
        assert_eq!(
            initial_value(&cli, "a\nb\n").unwrap(),
            serde_json::json!(["a", "b"])
        );
    }

    #[test]
    fn in_place_without_file_rejected() {
        let c = cli(&["-i", "."]);
        assert!(run_requires_file(&c));
    }

    fn run_requires_file(cli: &Cli) -> bool {
        cli.in_place && file_path(cli).is_none()
    }
}
