use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use roster::config::Config;
use roster::storage::vfs::StandardFileSystem;
use roster::{display, Fields, RecordStore, Schema, SortKey, COURSE, STUDENT};
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Student and course records kept in CSV files
#[derive(Parser)]
#[command(name = "roster")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Path to a TOML configuration file
  #[arg(long, env = "ROSTER_CONFIG")]
  config: Option<PathBuf>,

  /// Directory holding the store files, overriding the configuration
  #[arg(long, env = "ROSTER_DATA_DIR")]
  data_dir: Option<PathBuf>,

  /// Verbose output
  #[arg(short, long)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Create missing store files with their header rows
  Init,
  /// Student records
  Student {
    #[command(subcommand)]
    action: Action,
  },
  /// Course records
  Course {
    #[command(subcommand)]
    action: Action,
  },
}

#[derive(Subcommand)]
enum Action {
  /// Show every record with its record number
  List,
  /// Add a record; every field except id is required
  Add {
    #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment, required = true)]
    fields: Vec<(String, String)>,
  },
  /// Find records whose name contains QUERY, ignoring case
  Search { query: String },
  /// Change fields of the record at RRN; the id cannot be changed
  Edit {
    rrn: usize,
    #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment, required = true)]
    fields: Vec<(String, String)>,
  },
  /// Delete the record at RRN
  Delete {
    rrn: usize,
    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,
  },
  /// Remove blank rows from the store file
  Compact,
  /// Reorder the store file
  Sort {
    #[arg(value_enum)]
    key: SortArg,
  },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
  Name,
  Id,
}

impl From<SortArg> for SortKey {
  fn from(arg: SortArg) -> Self {
    match arg {
      SortArg::Name => SortKey::Name,
      SortArg::Id => SortKey::Id,
    }
  }
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
  let (field, value) = s.split_once('=').ok_or_else(|| format!("expected FIELD=VALUE, got {:?}", s))?;
  Ok((field.trim().to_ascii_lowercase(), value.to_owned()))
}

fn open_store(config: &Config, schema: &'static Schema) -> Result<RecordStore<StandardFileSystem>> {
  let mut store = RecordStore::in_dir(&config.data_dir, schema, config.file_name(schema));
  store.initialize().with_context(|| format!("cannot initialize {} store", schema.entity))?;
  Ok(store)
}

fn run(store: &mut RecordStore<StandardFileSystem>, action: Action) -> Result<()> {
  let entity = store.schema().entity;
  match action {
    Action::List => {
      let records = store.load_all().with_context(|| format!("cannot list {}s", entity))?;
      println!("{}", display::render_all(&records));
    }
    Action::Add { fields } => {
      let fields: Fields = fields.into_iter().collect();
      let record = store.append(&fields).with_context(|| format!("cannot add {}", entity))?;
      println!("New {} added with id {}.", entity, record.id());
    }
    Action::Search { query } => {
      let found = store.search_by_name(&query).with_context(|| format!("cannot search {}s", entity))?;
      if found.is_empty() {
        println!("No match found for '{}'.", query);
      } else {
        println!("{}", display::render(found.iter().map(|(rrn, record)| (*rrn, record))));
      }
    }
    Action::Edit { rrn, fields } => {
      let fields: Fields = fields.into_iter().collect();
      let record = store.update_at(rrn, &fields).with_context(|| format!("cannot edit {} {}", entity, rrn))?;
      println!("{}", display::render([(rrn, &record)]));
    }
    Action::Delete { rrn, yes } => {
      let record = store.get(rrn).with_context(|| format!("cannot delete {} {}", entity, rrn))?;
      if !yes {
        println!("{}", display::render([(rrn, &record)]));
        let confirmed = dialoguer::Confirm::new()
          .with_prompt("Are you sure you want to delete this entry?")
          .default(false)
          .interact()?;
        if !confirmed {
          println!("Nothing deleted.");
          return Ok(());
        }
      }
      let removed = store.delete_at(rrn).with_context(|| format!("cannot delete {} {}", entity, rrn))?;
      println!("Deleted {} with id {}.", entity, removed.id());
    }
    Action::Compact => {
      let removed = store.compact().with_context(|| format!("cannot compact {} store", entity))?;
      println!("Compacted {}: removed {} blank row(s).", store.path().display(), removed);
    }
    Action::Sort { key } => {
      let key = SortKey::from(key);
      let records = store.sort_by(key).with_context(|| format!("cannot sort {}s by {}", entity, key))?;
      println!("{}", display::render_all(&records));
    }
  }
  Ok(())
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_filter = if cli.verbose { "roster=debug" } else { "roster=warn" };
  tracing_subscriber::registry()
    .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
    .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
    .init();

  let mut config = Config::load(cli.config.as_deref())?;
  if let Some(data_dir) = cli.data_dir {
    config.data_dir = data_dir;
  }
  fs::create_dir_all(&config.data_dir)
    .with_context(|| format!("cannot create data directory {}", config.data_dir.display()))?;
  tracing::debug!(?config, "loaded configuration");

  let mut students = open_store(&config, &STUDENT)?;
  let mut courses = open_store(&config, &COURSE)?;

  match cli.command {
    Command::Init => {
      println!("Initialized {} and {}.", students.path().display(), courses.path().display());
      Ok(())
    }
    Command::Student { action } => run(&mut students, action),
    Command::Course { action } => run(&mut courses, action),
  }
}
