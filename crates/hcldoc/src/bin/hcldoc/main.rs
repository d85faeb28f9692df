mod cli;

use anyhow::Context;
use hcldoc::lexer::{Lexer, TokenKind};
use hcldoc::symbol::{SymbolId, SymbolKind, SymbolTree};
use hcldoc::{Map, Recovery, Value};

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("HCLDOC_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let command_result = match cli.command {
        cli::Command::Parse(parse_cli) => parse(parse_cli),
        cli::Command::Blocks(blocks_cli) => blocks(blocks_cli),
        cli::Command::Dev(dev_cli) => dev(dev_cli),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

pub fn parse(cli: cli::ParseCommand) -> anyhow::Result<()> {
    let recovery = Recovery::from(cli.input.ignore_errors);

    let value = match cli.input.files.as_slice() {
        [] => Value::Object(hcldoc::load_reader(std::io::stdin().lock(), recovery)?),
        [path] => Value::Object(
            hcldoc::load_file(path, recovery)
                .with_context(|| format!("Unable to load {}", path.display()))?,
        ),
        paths => {
            let mut documents = Map::new();
            for path in paths {
                let document = hcldoc::load_file(path, recovery)
                    .with_context(|| format!("Unable to load {}", path.display()))?;
                documents.insert(path.display().to_string(), Value::Object(document));
            }
            Value::Object(documents)
        }
    };

    output(&cli.output, &value)
}

pub fn blocks(cli: cli::BlocksCommand) -> anyhow::Result<()> {
    for (name, source) in sources(&cli.input)? {
        let configuration = hcldoc::parse_configuration(&source, cli.input.ignore_errors)
            .with_context(|| format!("Unable to load {name}"))?;

        println!("# {name}");
        for block in configuration.blocks() {
            let names = block.block_names().unwrap_or_default().join(" ");
            println!("block {names} ({}:{})", block.line(), block.column());
        }
        for attribute in configuration.attributes() {
            let name = attribute.name.as_deref().unwrap_or_default();
            println!("attribute {name} ({}:{})", attribute.line(), attribute.column());
        }
    }

    Ok(())
}

/// Name and source text of every input, stdin when no file is given
fn sources(input: &cli::InputArgs) -> anyhow::Result<Vec<(String, String)>> {
    if input.files.is_empty() {
        let stdin = std::io::read_to_string(std::io::stdin())?;
        return Ok(vec![("<stdin>".to_string(), stdin)]);
    }

    input
        .files
        .iter()
        .map(|path| {
            tracing::info!(path=%path.display(), "loading file");
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("Unable to read {}", path.display()))?;
            Ok::<_, anyhow::Error>((path.display().to_string(), source))
        })
        .collect()
}

fn output(output: &cli::OutputArgs, value: &Value) -> anyhow::Result<()> {
    match output.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), value)?,
        cli::OutputFormat::Json => {
            serde_json::to_writer_pretty(std::io::stdout(), value)?;
            println!();
        }
    };

    Ok(())
}

/// (hcldoc-)developer utilities
///
/// A quick way to expose internal structures for debugging purposes
pub fn dev(cli: cli::DevCommand) -> anyhow::Result<()> {
    use cli::DevSubCommand::*;

    for (name, source) in sources(&cli.input)? {
        println!("# {name}");
        match cli.command {
            Tokens => print_tokens(&source)?,
            Symbols => print_outline(&hcldoc::parse_symbols(&source, cli.input.ignore_errors)?),
            Evals => {
                let tree = hcldoc::parse_symbols(&source, cli.input.ignore_errors)?;
                for eval in tree.eval_symbols() {
                    println!("{:?} {}", eval.kind, eval.expression);
                }
            }
        }
    }

    Ok(())
}

fn print_tokens(source: &str) -> anyhow::Result<()> {
    let mut lexer = Lexer::new(source);
    loop {
        let token = lexer.next_token()?;
        println!(
            "{}:{} {:?} {:?}",
            token.span.line(),
            token.span.column(),
            token.kind,
            token.text
        );
        if token.is(TokenKind::Eof) {
            return Ok(());
        }
    }
}

fn print_outline(tree: &SymbolTree) {
    let mut pending: Vec<(SymbolId, usize)> =
        tree.roots().iter().rev().map(|id| (*id, 0)).collect();

    while let Some((id, depth)) = pending.pop() {
        let symbol = &tree[id];
        let detail = match &symbol.kind {
            SymbolKind::Block { names } => names.join(" "),
            SymbolKind::Attribute => symbol.name.clone().unwrap_or_default(),
            SymbolKind::Value { ty, value } => format!("{ty} {value:?}"),
            SymbolKind::Eval(eval) => format!("{:?} {}", eval.kind, eval.expression),
            SymbolKind::Primitive(primitive) => primitive.keyword().to_string(),
            SymbolKind::Array | SymbolKind::Map => String::new(),
        };
        println!(
            "{:indent$}{} {detail} ({}:{})",
            "",
            symbol.kind.describe(),
            symbol.line(),
            symbol.column(),
            indent = depth * 2
        );
        pending.extend(symbol.children().iter().rev().map(|child| (*child, depth + 1)));
    }
}
