use crate::app::{AppMessage, Slideshow, UserCommand};
use crate::services::Trash;
use crate::ui::{Presenter, handlers};
use log::info;
use std::ffi::OsString;
use std::path::PathBuf;

/// Startup options taken from the command line.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct StartupOptions {
    pub folder: Option<PathBuf>,
    pub watch: bool,
}

/// Picks the first non-flag argument that is a directory.
fn folder_from_args<I>(args: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .filter_map(|arg| {
            let arg_str = arg.to_string_lossy();
            if arg_str.starts_with('-') {
                None
            } else {
                Some(PathBuf::from(arg))
            }
        })
        .find(|path| path.is_dir())
}

pub fn parse_args<I>(args: I) -> StartupOptions
where
    I: IntoIterator<Item = OsString>,
{
    let args: Vec<OsString> = args.into_iter().collect();
    StartupOptions {
        watch: !args.iter().any(|arg| arg == "--no-watch"),
        folder: folder_from_args(args),
    }
}

pub fn startup_options_from_args() -> StartupOptions {
    parse_args(std::env::args_os().skip(1))
}

/// Hooks up keyboard input and opens the startup folder.
///
/// A folder given on the command line wins over the one in settings.
pub fn configure_startup_opening<P: Presenter, T: Trash>(
    app: &mut Slideshow<P, T>,
    options: StartupOptions,
) {
    handlers::spawn_input_handler(app.sender());
    println!("{}", handlers::HELP);

    match options.folder {
        Some(folder) => {
            info!("Opening {} from command line", folder.display());
            app.handle(AppMessage::User(UserCommand::ChooseFolder(folder)));
        }
        None => app.start(),
    }
}
