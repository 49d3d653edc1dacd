use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use zmark::{Config, Document, Filter, FormatConfig, NodeKind, DEFAULT_MAX_DEPTH};

#[derive(Debug, Parser)]
#[command(
    name = "zmark",
    version,
    about = "Parse, check and query XML/HTML-like markup"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse and print the document back out
    Format {
        #[command(flatten)]
        io: IoArgs,
        #[command(flatten)]
        parse: ParseArgs,
        #[command(flatten)]
        render: RenderArgs,
    },
    /// Parse only and report whether the input is well formed
    Check {
        #[command(flatten)]
        io: IoArgs,
        #[command(flatten)]
        parse: ParseArgs,
    },
    /// Print every node matching a kind and/or element name
    Query {
        #[command(flatten)]
        io: IoArgs,
        #[command(flatten)]
        parse: ParseArgs,
        #[command(flatten)]
        render: RenderArgs,
        /// Node kind to match
        #[arg(short, long, value_enum)]
        kind: Option<KindArg>,
        /// Element name to match
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Print the number of nodes of each kind
    Count {
        #[command(flatten)]
        io: IoArgs,
        #[command(flatten)]
        parse: ParseArgs,
    },
}

#[derive(Debug, Args)]
struct IoArgs {
    /// Input file (defaults to stdin)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,
    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Start from the lenient HTML preset instead of strict XML
    #[arg(long)]
    html: bool,
    /// Close unmatched open elements implicitly
    #[arg(long)]
    auto_close: bool,
    /// Keep comments in the tree
    #[arg(long)]
    keep_comments: bool,
    /// Collapse whitespace runs in text and drop blank text
    #[arg(long)]
    fold_whitespace: bool,
    /// Lowercase element and attribute names
    #[arg(long)]
    case_insensitive: bool,
    /// Accept attributes without a value
    #[arg(long)]
    key_only_attributes: bool,
    /// Treat known void elements as self-closing
    #[arg(long)]
    self_closing_void: bool,
    /// Resolve the HTML named entity table
    #[arg(long)]
    extended_entities: bool,
    /// Do not add a default XML declaration
    #[arg(long)]
    no_declaration: bool,
    /// Deepest element nesting to accept (0 for no limit)
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: u16,
}

impl ParseArgs {
    fn config(&self) -> Config {
        let base = if self.html { Config::html() } else { Config::xml() };
        Config {
            auto_close: base.auto_close || self.auto_close,
            keep_comments: base.keep_comments || self.keep_comments,
            fold_whitespace: base.fold_whitespace || self.fold_whitespace,
            case_insensitive: base.case_insensitive || self.case_insensitive,
            key_only_attributes: base.key_only_attributes || self.key_only_attributes,
            self_closing_void: base.self_closing_void || self.self_closing_void,
            extended_entities: base.extended_entities || self.extended_entities,
            suppress_default_decl: base.suppress_default_decl || self.no_declaration,
            max_depth: self.max_depth,
            ..base
        }
    }
}

#[derive(Debug, Args)]
struct RenderArgs {
    /// Render `key` for attributes whose value equals their name
    #[arg(long)]
    bare_attributes: bool,
    /// Render childless void elements as `<br>`
    #[arg(long)]
    void_tags: bool,
}

impl RenderArgs {
    fn format(&self) -> FormatConfig {
        FormatConfig {
            bare_attributes: self.bare_attributes,
            void_tags: self.void_tags,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
    XmlDecl,
    Dtd,
    Cdata,
    Comment,
    EntityRef,
    ProcessingInstruction,
    Text,
    Element,
}

impl From<KindArg> for NodeKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::XmlDecl => Self::XmlDecl,
            KindArg::Dtd => Self::Dtd,
            KindArg::Cdata => Self::Cdata,
            KindArg::Comment => Self::Comment,
            KindArg::EntityRef => Self::EntityRef,
            KindArg::ProcessingInstruction => Self::ProcessingInstruction,
            KindArg::Text => Self::Text,
            KindArg::Element => Self::Element,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("ZMARK_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Format { io, parse, render } => {
            let doc = load(&io, &parse)?;
            let mut output = doc.outer_with(render.format());
            if !output.ends_with('\n') {
                output.push('\n');
            }
            write_output(&io.output, output.as_bytes())
        }
        Command::Check { io, parse } => {
            let doc = load(&io, &parse)?;
            let nodes = doc.search(Filter::any()).count();
            write_output(&io.output, format!("ok: {nodes} nodes\n").as_bytes())
        }
        Command::Query {
            io,
            parse,
            render,
            kind,
            name,
        } => {
            let doc = load(&io, &parse)?;
            let filter = build_filter(kind, name, &doc);
            let format = render.format();
            let mut output = String::new();
            for node in doc.search(filter) {
                output.push_str(&node.outer_with(format));
                output.push('\n');
            }
            write_output(&io.output, output.as_bytes())
        }
        Command::Count { io, parse } => {
            let doc = load(&io, &parse)?;
            write_output(&io.output, count_kinds(&doc).as_bytes())
        }
    }
}

fn load(io: &IoArgs, parse: &ParseArgs) -> Result<Document> {
    let input = read_input(&io.input)?;
    let config = parse.config();
    debug!(?config, "parsing input");
    let doc = zmark::from_bytes(&input, config).with_context(|| match &io.input {
        Some(path) => format!("failed to parse {}", path.display()),
        None => "failed to parse stdin".to_string(),
    })?;
    info!(children = doc.children().len(), "parsed document");
    Ok(doc)
}

fn build_filter(kind: Option<KindArg>, name: Option<String>, doc: &Document) -> Filter {
    let mut filter = Filter::any().case_insensitive(doc.config().case_insensitive);
    if let Some(kind) = kind {
        filter = filter.kind(kind.into());
    }
    if let Some(name) = name {
        filter = filter.name(name);
    }
    filter
}

fn count_kinds(doc: &Document) -> String {
    let mut counts = [0usize; NodeKind::ALL.len()];
    for node in doc.search(Filter::any()) {
        if let Some(slot) = NodeKind::ALL
            .iter()
            .position(|kind| *kind == node.kind())
            .and_then(|idx| counts.get_mut(idx))
        {
            *slot += 1;
        }
    }
    let mut output = String::new();
    for (kind, count) in NodeKind::ALL.iter().zip(counts) {
        if count > 0 {
            output.push_str(&format!("{kind}: {count}\n"));
        }
    }
    output
}

fn read_input(path: &Option<PathBuf>) -> Result<Vec<u8>> {
    match path {
        Some(path) => std::fs::read(path)
            .with_context(|| format!("failed to read input file {}", path.display())),
        None => {
            let mut buffer = Vec::new();
            io::stdin()
                .read_to_end(&mut buffer)
                .context("failed to read stdin")?;
            if buffer.iter().all(u8::is_ascii_whitespace) {
                bail!("no input provided on stdin");
            }
            Ok(buffer)
        }
    }
}

fn write_output(path: &Option<PathBuf>, data: &[u8]) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, data)
            .with_context(|| format!("failed to write output file {}", path.display())),
        None => {
            let mut stdout = io::stdout();
            stdout.write_all(data).context("failed to write stdout")?;
            Ok(())
        }
    }
}
