use std::collections::BTreeMap;
use std::sync::Mutex;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use command_grammar_core::{
    ArgsCursor, CommandSource, ParseContext, QuotedTokenizer, RawTokenizer, SpaceTokenizer,
    Tokenizer,
};
use command_grammar_engine::Dispatcher;

mod demo;

/// Output format for machine-readable subcommand results.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
    Table,
}

/// Tokenizer strategy selection.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum TokenizerKind {
    /// Whole line as a single token.
    Raw,
    /// Split on literal spaces.
    Space,
    /// Quoted strings and backslash escapes.
    #[default]
    Quoted,
}

#[derive(Debug, Parser)]
#[command(name = "cmdgram")]
#[command(about = "Argument grammar and dispatch engine demo")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Tokenize a line and print the positioned tokens.
    Tokenize(TokenizeArgs),
    /// Parse a line against the demo command set and print the bound
    /// arguments.
    Parse(LineArgs),
    /// Print completion candidates for a partially-typed line.
    Suggest(LineArgs),
    /// Execute a line against the demo command set.
    Run(LineArgs),
    /// List the demo commands with usage and descriptions.
    Commands(FormatArgs),
}

#[derive(Debug, Args)]
struct TokenizeArgs {
    /// The line to tokenize.
    line: String,
    #[arg(long, value_enum, default_value = "quoted")]
    tokenizer: TokenizerKind,
    /// Recover from malformed quoting instead of failing.
    #[arg(long)]
    lenient: bool,
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct LineArgs {
    /// The command line, starting with the command alias.
    line: String,
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct FormatArgs {
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,
}

#[derive(Debug, Serialize)]
struct TokenReport {
    text: String,
    start: usize,
    end: usize,
}

#[derive(Debug, Serialize)]
struct ParseReport {
    command: String,
    values: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Serialize)]
struct SuggestReport {
    suggestions: Vec<String>,
}

#[derive(Debug, Serialize)]
struct RunReport {
    processed: u64,
    succeeded: u64,
    messages: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CommandReport {
    alias: String,
    usage: String,
    description: Option<String>,
}

/// Source that collects messages for inclusion in reports.
#[derive(Default)]
struct Recording {
    messages: Mutex<Vec<String>>,
}

impl Recording {
    fn into_messages(self) -> Vec<String> {
        self.messages.into_inner().unwrap_or_default()
    }
}

impl CommandSource for Recording {
    fn send_message(&self, text: &str) {
        self.messages.lock().expect("message lock").push(text.to_string());
    }
}

fn emit<T: Serialize>(format: OutputFormat, report: &T, table: impl FnOnce()) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(report).expect("report serializes")
            );
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(report).expect("report serializes"));
        }
        OutputFormat::Table => table(),
    }
}

fn tokenize(args: &TokenizeArgs) -> Result<(), String> {
    let tokens = match args.tokenizer {
        TokenizerKind::Raw => RawTokenizer.tokenize(&args.line, args.lenient),
        TokenizerKind::Space => SpaceTokenizer.tokenize(&args.line, args.lenient),
        TokenizerKind::Quoted => QuotedTokenizer::new().tokenize(&args.line, args.lenient),
    }
    .map_err(|e| e.to_string())?;

    let report: Vec<TokenReport> = tokens
        .iter()
        .map(|t| TokenReport {
            text: t.text.clone(),
            start: t.start,
            end: t.end,
        })
        .collect();
    emit(args.format, &report, || {
        for token in &report {
            println!("{:>3}..{:<3} {}", token.start, token.end, token.text);
        }
    });
    Ok(())
}

fn parse(dispatcher: &Dispatcher, args: &LineArgs) -> Result<(), String> {
    let source = Recording::default();
    let line = args.line.trim_start();
    let (alias, rest) = match line.split_once(' ') {
        Some((alias, rest)) => (alias, rest),
        None => (line, ""),
    };
    let mapping = dispatcher
        .get(alias, Some(&source))
        .ok_or_else(|| format!("unknown command: {alias}"))?;

    let tokens = QuotedTokenizer::new()
        .tokenize(rest, false)
        .map_err(|e| e.to_string())?;
    let mut cursor = ArgsCursor::new(rest, tokens);
    let mut ctx = ParseContext::new();
    match mapping.handler().parse_args(&source, &mut cursor, &mut ctx) {
        Some(Ok(())) => {}
        Some(Err(err)) => {
            return Err(format!("{err}\n{}", err.annotated_position()));
        }
        None => return Err(format!("command {alias} is not grammar-backed")),
    }

    let mut values: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, entries) in ctx.iter() {
        values.insert(
            key.to_string(),
            entries.iter().map(|v| v.to_string()).collect(),
        );
    }
    let report = ParseReport {
        command: mapping.primary_alias().to_string(),
        values,
    };
    emit(args.format, &report, || {
        println!("command: {}", report.command);
        for (key, entries) in &report.values {
            println!("{key}: {}", entries.join(", "));
        }
    });
    Ok(())
}

fn suggest(dispatcher: &Dispatcher, args: &LineArgs) {
    let source = Recording::default();
    let report = SuggestReport {
        suggestions: dispatcher.suggest(&source, &args.line),
    };
    emit(args.format, &report, || {
        for suggestion in &report.suggestions {
            println!("{suggestion}");
        }
    });
}

fn run(dispatcher: &Dispatcher, args: &LineArgs) -> Result<(), String> {
    let source = Recording::default();
    let result = dispatcher.dispatch(&source, &args.line);
    let report = RunReport {
        processed: result.processed,
        succeeded: result.succeeded,
        messages: source.into_messages(),
    };
    emit(args.format, &report, || {
        for message in &report.messages {
            println!("{message}");
        }
        println!("processed: {}, succeeded: {}", report.processed, report.succeeded);
    });
    if result.is_success() {
        Ok(())
    } else {
        Err("command failed".to_string())
    }
}

fn commands(dispatcher: &Dispatcher, args: &FormatArgs) {
    let report: Vec<CommandReport> = dispatcher
        .describe()
        .into_iter()
        .map(|(alias, description)| CommandReport {
            usage: dispatcher.usage_of(&alias).unwrap_or_default(),
            alias,
            description,
        })
        .collect();
    emit(args.format, &report, || {
        for command in &report {
            println!(
                "/{} {}\n    {}",
                command.alias,
                command.usage,
                command.description.as_deref().unwrap_or("(no description)")
            );
        }
    });
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let dispatcher = demo::build();

    let outcome = match &cli.command {
        Command::Tokenize(args) => tokenize(args),
        Command::Parse(args) => parse(&dispatcher, args),
        Command::Suggest(args) => {
            suggest(&dispatcher, args);
            Ok(())
        }
        Command::Run(args) => run(&dispatcher, args),
        Command::Commands(args) => {
            commands(&dispatcher, args);
            Ok(())
        }
    };

    if let Err(message) = outcome {
        eprintln!("error: {message}");
        std::process::exit(1);
    }
}
