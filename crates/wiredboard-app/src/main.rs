//! Command-line entry point (native).

#[cfg(feature = "native")]
mod cli {
    use clap::{Parser, Subcommand};
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use thiserror::Error;
    use wiredboard_app::{App, AppConfig, Notice};
    use wiredboard_core::board::LinkToggle;
    use wiredboard_core::config::ConfigError;
    use wiredboard_core::elements::{ElementId, ElementKind, parse_data_uri};
    use wiredboard_core::onboarding::OnboardingState;
    use wiredboard_core::session::SessionError;
    use wiredboard_core::storage::{FileStorage, StorageError, create_default_storage};
    use kurbo::Point;

    #[derive(Parser)]
    #[command(name = "wiredboard", version, about = "Inspect and edit Wiredboard sessions")]
    pub struct Cli {
        /// Storage directory (defaults to the platform data directory)
        #[arg(long, global = true)]
        storage: Option<PathBuf>,
        /// Board configuration file (JSON)
        #[arg(long, global = true)]
        config: Option<PathBuf>,
        #[command(subcommand)]
        command: Command,
    }

    #[derive(Subcommand)]
    enum Command {
        /// Manage saved sessions
        #[command(subcommand)]
        Sessions(SessionsCommand),
        /// Add a note to a session at a board position
        Note {
            session: String,
            #[arg(long, allow_hyphen_values = true)]
            x: f64,
            #[arg(long, allow_hyphen_values = true)]
            y: f64,
            #[arg(long, default_value = "")]
            text: String,
        },
        /// Import an image file as if dropped at a screen position
        Import {
            session: String,
            file: PathBuf,
            #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
            x: f64,
            #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
            y: f64,
        },
        /// Link two elements (ids or unique id prefixes)
        Link { session: String, from: String, to: String },
        /// Inspect or reset the onboarding flow
        #[command(subcommand)]
        Onboarding(OnboardingCommand),
    }

    #[derive(Subcommand)]
    enum SessionsCommand {
        List,
        Show { name: String },
        Delete { name: String },
        /// Create an empty session
        New { name: Option<String> },
    }

    #[derive(Subcommand)]
    enum OnboardingCommand {
        Status,
        Reset,
    }

    #[derive(Debug, Error)]
    pub enum CliError {
        #[error(transparent)]
        Storage(#[from] StorageError),
        #[error(transparent)]
        Session(#[from] SessionError),
        #[error(transparent)]
        Config(#[from] ConfigError),
        #[error("Failed to read {path}: {reason}")]
        Read { path: String, reason: String },
        #[error("Import failed: {0}")]
        Import(String),
        #[error("No element matches '{0}'")]
        UnknownElement(String),
        #[error("'{0}' matches more than one element")]
        AmbiguousElement(String),
        #[error("Cannot link an element to itself")]
        SelfLink,
    }

    type Board = App<FileStorage>;

    fn open(cli: &Cli) -> Result<Board, CliError> {
        let storage = match &cli.storage {
            Some(dir) => FileStorage::new(dir.clone())?,
            None => create_default_storage()?,
        };
        log::debug!("Using storage at {}", storage.path().display());
        let mut config = match &cli.config {
            Some(path) => AppConfig::with_board_file(path)?,
            None => AppConfig::default(),
        };
        config.storage_dir = cli.storage.clone();
        Ok(App::new(Arc::new(storage), config))
    }

    /// Load a session to edit; a missing one starts empty under that name.
    fn open_for_edit(app: &mut Board, name: &str) -> Result<(), CliError> {
        match app.load_session(name) {
            Ok(()) => Ok(()),
            Err(SessionError::NotFound(_)) => {
                log::info!("Session \"{}\" does not exist yet, creating it", name);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn resolve_id(app: &Board, needle: &str) -> Result<ElementId, CliError> {
        let mut matches = app
            .board()
            .elements_ordered()
            .map(|e| e.id())
            .filter(|id| id.to_string().starts_with(needle));
        let first = matches
            .next()
            .ok_or_else(|| CliError::UnknownElement(needle.to_string()))?;
        if matches.next().is_some() {
            return Err(CliError::AmbiguousElement(needle.to_string()));
        }
        Ok(first)
    }

    fn mime_from_path(path: &Path) -> Option<String> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        let mime = match ext.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "svg" => "image/svg+xml",
            _ => return None,
        };
        Some(mime.to_string())
    }

    fn show(app: &mut Board, name: &str) -> Result<(), CliError> {
        app.load_session(name)?;
        let vp = app.viewport();
        println!("Session \"{}\"", name);
        println!(
            "  viewport: scale {:.3}, offset ({:.1}, {:.1})",
            vp.scale, vp.offset.x, vp.offset.y
        );
        println!("  link color: {}", app.link_color());

        println!("  elements ({}):", app.board().len());
        for element in app.board().elements_ordered() {
            let detail = match &element.kind {
                ElementKind::Note { text } => format!("{:?}", text),
                ElementKind::Image { content } => match parse_data_uri(content) {
                    Some((mime, bytes)) => format!("{}, {} bytes", mime, bytes.len()),
                    None => "external content".to_string(),
                },
            };
            println!(
                "    {} {} at ({:.1}, {:.1}) {:.0}x{:.0} {}",
                element.id(),
                element.kind.name(),
                element.position.x,
                element.position.y,
                element.width,
                element.effective_height(),
                detail
            );
        }

        println!("  links ({}):", app.board().links().len());
        for link in app.board().links() {
            let edges = app.board().edge_points(link).and_then(|e| e.both());
            match edges {
                Some((p1, p2)) => println!(
                    "    {} -> {}  ({:.1}, {:.1}) -> ({:.1}, {:.1})",
                    link.from, link.to, p1.x, p1.y, p2.x, p2.y
                ),
                None => println!("    {} -> {}  (overlapping, not drawn)", link.from, link.to),
            }
        }
        Ok(())
    }

    pub fn run(cli: Cli) -> Result<(), CliError> {
        let mut app = open(&cli)?;

        match cli.command {
            Command::Sessions(SessionsCommand::List) => {
                for name in app.list_sessions()? {
                    println!("{}", name);
                }
            }
            Command::Sessions(SessionsCommand::Show { name }) => show(&mut app, &name)?,
            Command::Sessions(SessionsCommand::Delete { name }) => {
                if !app.list_sessions()?.contains(&name) {
                    return Err(SessionError::NotFound(name).into());
                }
                app.delete_session(&name)?;
                println!("Deleted \"{}\"", name);
            }
            Command::Sessions(SessionsCommand::New { name }) => {
                app.new_session(name.as_deref().unwrap_or(""));
                let current = app.current_session().to_string();
                app.save_session(&current)?;
                println!("Created \"{}\"", current);
            }
            Command::Note { session, x, y, text } => {
                open_for_edit(&mut app, &session)?;
                let id = app.add_note_at(Point::new(x, y), &text);
                app.save_session(&session)?;
                println!("{}", id);
            }
            Command::Import { session, file, x, y } => {
                open_for_edit(&mut app, &session)?;
                let data = std::fs::read(&file).map_err(|e| CliError::Read {
                    path: file.display().to_string(),
                    reason: e.to_string(),
                })?;
                let file_name = file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                app.drop_file(Point::new(x, y), &file_name, mime_from_path(&file), data);
                if app.finish_imports() == 0 {
                    let reason = app
                        .take_notices()
                        .into_iter()
                        .filter_map(|n| match n {
                            Notice::Error(message) => Some(message),
                            Notice::Info(_) => None,
                        })
                        .last()
                        .unwrap_or_else(|| "nothing was imported".to_string());
                    return Err(CliError::Import(reason));
                }
                app.save_session(&session)?;
                if let Some(element) = app.board().elements_ordered().last() {
                    println!("{}", element.id());
                }
            }
            Command::Link { session, from, to } => {
                app.load_session(&session)?;
                let from = resolve_id(&app, &from)?;
                let to = resolve_id(&app, &to)?;
                if from == to {
                    return Err(CliError::SelfLink);
                }
                app.toggle_link(from);
                match app.toggle_link(to) {
                    LinkToggle::Linked(_) => {
                        app.save_session(&session)?;
                        println!("Linked {} -> {}", from, to);
                    }
                    LinkToggle::AlreadyLinked => println!("Already linked"),
                    other => log::warn!("Unexpected link outcome {:?}", other),
                }
            }
            Command::Onboarding(OnboardingCommand::Status) => {
                let onboarding = app.onboarding();
                match onboarding.state() {
                    OnboardingState::Completed => println!("completed"),
                    OnboardingState::Blocked { since } => println!("blocked since {}", since),
                    state => println!("in progress: {:?} (step {:?})", state, onboarding.step_index()),
                }
                if let Some(name) = onboarding.display_name() {
                    println!("name: {}", name);
                }
            }
            Command::Onboarding(OnboardingCommand::Reset) => {
                app.reset_onboarding();
                println!("Onboarding reset");
            }
        }
        Ok(())
    }
}

#[cfg(feature = "native")]
fn main() {
    use clap::Parser;

    env_logger::init();
    log::info!("Starting Wiredboard CLI");

    if let Err(e) = cli::run(cli::Cli::parse()) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "native"))]
fn main() {
    panic!("Native feature not enabled. Use `cargo run --features native`");
}
