use std::env;
use std::io;
use std::io::Write;
use std::process;

use tracing::debug;
use tracing_subscriber::EnvFilter;

use cykparse::utils::tokenize;
use cykparse::{Err, Grammar};

fn usage(prog_name: &str) -> String {
  format!(
    r"Usage: {} FILE [options]

Reads sentences from stdin, one per line, and parses them with the grammar in FILE.

Options:
  -h, --help          Print this message
  -c, --chart         Print the parse charts (defaults to not printing)
  -t, --no-tree       Don't print the best tree (defaults to printing)
  -s, --start SYMBOL  Use SYMBOL as the start symbol instead of the first rule's
  -l, --lowercase     Lowercase sentences before tokenizing

Set RUST_LOG (e.g. RUST_LOG=cykparse=debug) for logging.",
    prog_name
  )
}

struct Args {
  filename: String,
  start: Option<String>,
  print_chart: bool,
  print_tree: bool,
  lowercase: bool,
}

impl Args {
  fn make_error_message(msg: &str, prog_name: impl AsRef<str>) -> String {
    format!("argument error: {}.\n\n{}", msg, usage(prog_name.as_ref()))
  }

  fn parse(v: Vec<String>) -> Result<Self, String> {
    if v.is_empty() {
      return Err(Self::make_error_message("bad argument vector", "cyk"));
    }

    let args_len = v.len();
    let mut iter = v.into_iter();
    let prog_name = iter.next().unwrap_or_else(|| "cyk".to_string());

    if args_len < 2 {
      return Err(Self::make_error_message("not enough arguments", prog_name));
    }

    let mut filename: Option<String> = None;
    let mut start: Option<String> = None;
    let mut print_chart = false;
    let mut print_tree = true;
    let mut lowercase = false;

    while let Some(o) = iter.next() {
      if o == "-h" || o == "--help" {
        println!("{}", usage(&prog_name));
        process::exit(0);
      } else if o == "-c" || o == "--chart" {
        print_chart = true;
      } else if o == "-t" || o == "--no-tree" {
        print_tree = false;
      } else if o == "-l" || o == "--lowercase" {
        lowercase = true;
      } else if o == "-s" || o == "--start" {
        match iter.next() {
          Some(symbol) => start = Some(symbol),
          None => return Err(Self::make_error_message("missing start symbol", prog_name)),
        }
      } else if filename.is_none() && !o.starts_with('-') {
        filename = Some(o);
      } else {
        return Err(Self::make_error_message("invalid arguments", prog_name));
      }
    }

    if let Some(filename) = filename {
      Ok(Self {
        filename,
        start,
        print_chart,
        print_tree,
        lowercase,
      })
    } else {
      Err(Self::make_error_message("missing filename", prog_name))
    }
  }
}

fn parse(g: &Grammar, sentence: &str, opts: &Args) {
  let words = tokenize(sentence);
  debug!(words = words.len(), "parsing sentence");

  let chart = g.recognize(&words);
  if opts.print_chart {
    println!("chart:\n{}", chart);
  }

  if !chart.accepts() {
    println!("not accepted: no derivation from {}", g.name(g.start()));
    return;
  }
  println!("accepted");

  if !g.is_weighted() && !opts.print_tree {
    return;
  }

  let best = g.best_parse(&words);
  if opts.print_chart && g.is_weighted() {
    println!("viterbi chart:\n{}", best);
  }
  if let Some(prob) = best.best_probability().filter(|_| g.is_weighted()) {
    println!("best probability: {}", prob);
  }
  if opts.print_tree {
    match best.best_tree() {
      Ok(tree) => println!("{}", tree),
      Err(e) => println!("{}", e),
    }
  }
}

fn main() -> Result<(), Err> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(io::stderr)
    .init();

  let opts = match Args::parse(env::args().collect()) {
    Ok(opts) => opts,
    Err(msg) => {
      eprintln!("{}", msg);
      process::exit(255);
    }
  };

  let mut g = Grammar::read_from_file(&opts.filename)?;
  if let Some(start) = &opts.start {
    g = g.with_start(start)?;
  }
  debug!(rules = g.rules().len(), start = g.name(g.start()), "loaded grammar");

  let mut input = String::new();
  loop {
    print!("> ");
    io::stdout().flush()?;

    match io::stdin().read_line(&mut input) {
      Ok(_) => {
        if input.is_empty() {
          // ctrl+d
          return Ok(());
        }
        if opts.lowercase {
          input.make_ascii_lowercase();
        }
        parse(&g, input.trim(), &opts);
        println!();
        input.clear();
      }
      Err(error) => return Err(error.into()),
    }
  }
}
