use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use itertools::Itertools;
use tracing_subscriber::EnvFilter;

use rematch::{MatchResult, Pattern, compile};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Abort a search after this many backtracking steps
    #[arg(long, value_name = "STEPS", global = true)]
    step_limit: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the leftmost match and its groups
    Find { pattern: String, text: String },
    /// Print the match only if it covers the whole text
    Match { pattern: String, text: String },
    /// Search anywhere in the text (same result as `find`)
    Search { pattern: String, text: String },
    /// Print every non-overlapping match
    All { pattern: String, text: String },
    /// Substitute matches using `$&`, `$N`, `` $` ``, `$'` and `$$`
    Replace {
        pattern: String,
        text: String,
        template: String,
        /// Replace only the first match
        #[arg(long)]
        first: bool,
    },
    /// Run the built-in IP address and word wrapping samples
    Demo,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.verbose);

    let found = match args.command {
        Command::Find { pattern, text } | Command::Search { pattern, text } => {
            let p = build(&pattern, args.step_limit)?;
            let m = p.try_find(&text).context("search aborted")?;
            print_match(m.as_ref(), &text)
        }
        Command::Match { pattern, text } => {
            let p = build(&pattern, args.step_limit)?;
            let m = p.try_full_match(&text).context("match aborted")?;
            print_match(m.as_ref(), &text)
        }
        Command::All { pattern, text } => {
            let p = build(&pattern, args.step_limit)?;
            let mut count = 0usize;
            for m in p.try_find_iter(&text) {
                let m = m.context("search aborted")?;
                print_match(Some(&m), &text);
                count += 1;
            }
            count > 0
        }
        Command::Replace {
            pattern,
            text,
            template,
            first,
        } => {
            let p = build(&pattern, args.step_limit)?;
            let out = if first {
                p.replace_first(&text, &template)
            } else {
                p.replace_all(&text, &template)
            }
            .inspect_err(|err| tracing::error!(%err, "replacement failed"))
            .with_context(|| format!("invalid template {template:?}"))?;
            println!("{out}");
            true
        }
        Command::Demo => {
            demo()?;
            true
        }
    };

    Ok(if found {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build(pattern: &str, step_limit: Option<usize>) -> Result<Pattern> {
    let p = compile(pattern).with_context(|| format!("invalid pattern {pattern:?}"))?;
    Ok(match step_limit {
        Some(limit) => p.with_step_limit(limit),
        None => p,
    })
}

/// Print the whole match followed by each group, three spaces apart.
/// Returns whether there was a match.
fn print_match(m: Option<&MatchResult>, text: &str) -> bool {
    match m {
        Some(m) => {
            println!("{}", match_line(m, text));
            true
        }
        None => {
            println!("no match");
            false
        }
    }
}

fn match_line(m: &MatchResult, text: &str) -> String {
    (0..=m.groups().len())
        .map(|i| m.group_str(text, i).unwrap_or_default())
        .join("   ")
}

/// The IP extraction samples run four ways, then the word wrapping sample.
fn demo() -> Result<()> {
    let ip = compile(r"\[(\d+)\.(\d+)\.(\d+)\.(\d+)\]")?;

    let samples: [(&str, &str, fn(&Pattern, &str) -> Option<MatchResult>); 4] = [
        ("Method 1", "Here we have an IP: >>>[192.168.1.41]<<<", |p, t| {
            p.find_iter(t).next()
        }),
        ("Method 2", "Here we have an IP: >>>[192.168.1.11]<<<", |p, t| {
            rematch::find_all(p, t).next()
        }),
        ("Method 3", "[192.168.1.31]", |p, t| rematch::matches_fully(p, t)),
        ("Method 4", "[192.168.1.101]", |p, t| rematch::find_first(p, t)),
    ];
    for (title, text, run) in samples {
        println!("{title}");
        if let Some(m) = run(&ip, text) {
            println!("{}", match_line(&m, text));
        }
    }

    println!("Replace");
    let words = compile(r"\w+\s")?;
    let out = rematch::replace_all(&words, "Here we have an IP: >>>[192.168.1.11]<<<", "[$&]")?;
    println!("{out}");
    Ok(())
}
