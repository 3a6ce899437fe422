//! Dynamic diagram language CLI.
//!
//! Provides the `dynlang` binary for working with language and model JSON
//! files offline: render a model to its visual tree, preview a single element
//! type, check a language (and optionally a model against it), and import a
//! language into the server's SQLite database.
//!
//! Rendering uses the same resolver as the HTTP server, so output matches
//! what a session returns.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use dynlang_core::{
    showcase, DiagramState, ElementKind, GraphModel, Language, LanguageDocument, Rendered, TypeTag,
};
use dynlang_storage::SqliteStore;

/// Dynamic diagram language tools.
#[derive(Parser)]
#[command(name = "dynlang", about = "Dynamic diagram language tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Render a model to its visual tree (JSON on stdout).
    Render {
        /// Language document (JSON).
        #[arg(short, long)]
        language: PathBuf,

        /// Graph model (JSON).
        #[arg(short, long)]
        model: PathBuf,
    },
    /// Render a single element of one type.
    Showcase {
        /// Language document (JSON).
        #[arg(short, long)]
        language: PathBuf,

        /// Node or edge type to show.
        #[arg(short = 't', long = "type")]
        element_type: String,
    },
    /// Check a language, and optionally a model against it.
    Validate {
        /// Language document (JSON).
        #[arg(short, long)]
        language: PathBuf,

        /// Graph model (JSON).
        #[arg(short, long)]
        model: Option<PathBuf>,
    },
    /// Store a language document in a server database.
    Import {
        /// Path to the database file.
        #[arg(short, long)]
        db: String,

        /// Language document (JSON).
        #[arg(short, long)]
        language: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Render { language, model } => run_render(&language, &model),
        Commands::Showcase {
            language,
            element_type,
        } => run_showcase(&language, &element_type),
        Commands::Validate { language, model } => run_validate(&language, model.as_deref()),
        Commands::Import { db, language } => run_import(&db, &language),
    };
    process::exit(exit_code);
}

// Exit codes: 0 = success, 1 = language or model error, 2 = validation
// issues found, 3 = I/O error.

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, i32> {
    let text = fs::read_to_string(path).map_err(|e| {
        eprintln!("Error: failed to read '{}': {}", path.display(), e);
        3
    })?;
    serde_json::from_str(&text).map_err(|e| {
        eprintln!("Error: '{}' is not valid: {}", path.display(), e);
        1
    })
}

fn load_language(path: &Path) -> Result<Language, i32> {
    let document: LanguageDocument = read_json(path)?;
    Language::compile(document).map_err(|e| {
        eprintln!("Error: language '{}': {}", path.display(), e);
        1
    })
}

fn print_rendered(rendered: &Rendered) -> i32 {
    for diagnostic in &rendered.diagnostics {
        eprintln!(
            "warning: {} ({}): {}",
            diagnostic.element_id, diagnostic.template_id, diagnostic.reason
        );
    }
    match serde_json::to_string_pretty(rendered) {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(e) => {
            eprintln!("Error: failed to serialize render: {}", e);
            1
        }
    }
}

fn run_render(language_path: &Path, model_path: &Path) -> i32 {
    match render_model(language_path, model_path) {
        Ok(rendered) => print_rendered(&rendered),
        Err(code) => code,
    }
}

fn render_model(language_path: &Path, model_path: &Path) -> Result<Rendered, i32> {
    let language = load_language(language_path)?;
    let model: GraphModel = read_json(model_path)?;
    let mut state = DiagramState::new(model).map_err(|e| {
        eprintln!("Error: model '{}': {}", model_path.display(), e);
        1
    })?;
    state.render(&language).map_err(|e| {
        eprintln!("Error: render failed: {}", e);
        1
    })
}

fn run_showcase(language_path: &Path, element_type: &str) -> i32 {
    match render_showcase(language_path, element_type) {
        Ok(rendered) => print_rendered(&rendered),
        Err(code) => code,
    }
}

fn render_showcase(language_path: &Path, element_type: &str) -> Result<Rendered, i32> {
    let language = load_language(language_path)?;
    let mut state = showcase(&language, &TypeTag::from(element_type)).map_err(|e| {
        eprintln!("Error: {}", e);
        1
    })?;
    state.render(&language).map_err(|e| {
        eprintln!("Error: render failed: {}", e);
        1
    })
}

fn run_validate(language_path: &Path, model_path: Option<&Path>) -> i32 {
    let language = match load_language(language_path) {
        Ok(language) => language,
        Err(code) => return code,
    };
    println!(
        "language '{}' v{}: {} node type(s), {} edge type(s)",
        language.id,
        language.version,
        language.nodes().count(),
        language.edges().count()
    );

    let Some(model_path) = model_path else {
        return 0;
    };
    let model: GraphModel = match read_json(model_path) {
        Ok(model) => model,
        Err(code) => return code,
    };

    let issues = model_issues(&language, &model);
    if issues.is_empty() {
        println!("model '{}': {} element(s), no issues", model.id, model.len());
        0
    } else {
        eprintln!("model '{}': {} issue(s):", model.id, issues.len());
        for issue in &issues {
            eprintln!("  - {}", issue);
        }
        2
    }
}

/// Everything wrong with `model` under `language`: structural errors,
/// unknown types and bound data that does not match its schema.
fn model_issues(language: &Language, model: &GraphModel) -> Vec<String> {
    let mut issues = Vec::new();
    if let Err(e) = model.check() {
        issues.push(e.to_string());
    }

    let elements = model
        .nodes
        .values()
        .map(|n| (ElementKind::Node, &n.id, &n.tag, &n.bound_data))
        .chain(
            model
                .edges
                .values()
                .map(|e| (ElementKind::Edge, &e.id, &e.tag, &e.bound_data)),
        );
    for (kind, id, tag, data) in elements {
        if tag.is_untyped() {
            continue;
        }
        match language.element_of(kind, tag) {
            None => issues.push(format!("'{id}': unknown type '{tag}'")),
            Some(element) => {
                if let Some(schema) = &element.schema {
                    issues.extend(schema.validate(data).into_iter().map(|issue| format!("'{id}': {issue}")));
                }
            }
        }
    }
    issues
}

fn run_import(db_path: &str, language_path: &Path) -> i32 {
    let document: LanguageDocument = match read_json(language_path) {
        Ok(document) => document,
        Err(code) => return code,
    };
    // reject documents a session could not load
    if let Err(e) = Language::compile(document.clone()) {
        eprintln!("Error: language '{}': {}", language_path.display(), e);
        return 1;
    }

    let store = match SqliteStore::new(db_path) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error: failed to open database '{}': {}", db_path, e);
            return 3;
        }
    };
    match store.put_language(&document) {
        Ok(()) => {
            println!("imported language '{}' v{}", document.id, document.version);
            0
        }
        Err(e) => {
            eprintln!("Error: failed to store language: {}", e);
            3
        }
    }
}
