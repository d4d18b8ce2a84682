use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ArgAction, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

fn posts_command() -> Command {
    Command::new("posts")
        .about("Browse and manage posts")
        .subcommand_required(true)
        .subcommand(Command::new("categories").about("List post categories"))
        .subcommand(
            Command::new("list")
                .about("List posts, newest first")
                .arg(
                    Arg::new("page")
                        .long("page")
                        .help("Zero-based page number")
                        .value_parser(clap::value_parser!(u32)),
                )
                .arg(
                    Arg::new("size")
                        .long("size")
                        .help("Page size")
                        .value_parser(clap::value_parser!(u32)),
                )
                .arg(
                    Arg::new("category")
                        .long("category")
                        .help("Filter by category id")
                        .value_parser(clap::value_parser!(i64)),
                )
                .arg(
                    Arg::new("keyword")
                        .long("keyword")
                        .help("Filter by title/content keyword"),
                ),
        )
        .subcommand(
            Command::new("get").about("Show one post").arg(
                Arg::new("id")
                    .required(true)
                    .value_parser(clap::value_parser!(i64)),
            ),
        )
        .subcommand(
            Command::new("create")
                .about("Create a post")
                .arg(
                    Arg::new("category")
                        .long("category")
                        .help("Category id")
                        .required(true)
                        .value_parser(clap::value_parser!(i64)),
                )
                .arg(Arg::new("title").long("title").required(true))
                .arg(Arg::new("content").long("content").required(true)),
        )
        .subcommand(
            Command::new("update")
                .about("Update title and/or content of a post")
                .arg(
                    Arg::new("id")
                        .required(true)
                        .value_parser(clap::value_parser!(i64)),
                )
                .arg(Arg::new("title").long("title"))
                .arg(Arg::new("content").long("content")),
        )
        .subcommand(
            Command::new("delete").about("Delete a post").arg(
                Arg::new("id")
                    .required(true)
                    .value_parser(clap::value_parser!(i64)),
            ),
        )
}

fn comments_command() -> Command {
    Command::new("comments")
        .about("Browse and manage comments")
        .subcommand_required(true)
        .subcommand(
            Command::new("list").about("Comment tree of a post").arg(
                Arg::new("post-id")
                    .required(true)
                    .value_parser(clap::value_parser!(i64)),
            ),
        )
        .subcommand(
            Command::new("add")
                .about("Add a comment or reply")
                .arg(
                    Arg::new("post-id")
                        .required(true)
                        .value_parser(clap::value_parser!(i64)),
                )
                .arg(Arg::new("content").long("content").required(true))
                .arg(
                    Arg::new("parent")
                        .long("parent")
                        .help("Parent comment id for replies")
                        .value_parser(clap::value_parser!(i64)),
                ),
        )
        .subcommand(
            Command::new("edit")
                .about("Edit a comment")
                .arg(
                    Arg::new("id")
                        .required(true)
                        .value_parser(clap::value_parser!(i64)),
                )
                .arg(Arg::new("content").long("content").required(true)),
        )
        .subcommand(
            Command::new("delete").about("Delete a comment").arg(
                Arg::new("id")
                    .required(true)
                    .value_parser(clap::value_parser!(i64)),
            ),
        )
}

fn files_command() -> Command {
    Command::new("files")
        .about("Post attachments")
        .subcommand_required(true)
        .subcommand(
            Command::new("list").about("Attachments of a post").arg(
                Arg::new("post-id")
                    .required(true)
                    .value_parser(clap::value_parser!(i64)),
            ),
        )
        .subcommand(
            Command::new("upload")
                .about("Attach a local file to a post")
                .arg(
                    Arg::new("post-id")
                        .required(true)
                        .value_parser(clap::value_parser!(i64)),
                )
                .arg(
                    Arg::new("path")
                        .required(true)
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )
        .subcommand(
            Command::new("download")
                .about("Download an attachment")
                .arg(
                    Arg::new("file-id")
                        .required(true)
                        .value_parser(clap::value_parser!(i64)),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .help("Destination path (defaults to the server file name)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )
}

fn admin_command() -> Command {
    Command::new("admin")
        .about("Admin console (requires ROLE_ADMIN)")
        .subcommand_required(true)
        .subcommand(
            Command::new("companies")
                .about("Search listed companies; without --keyword, read keywords interactively")
                .arg(Arg::new("keyword").long("keyword").help("Search keyword")),
        )
        .subcommand(
            Command::new("metrics")
                .about("Quarterly report metrics for a company")
                .arg(Arg::new("stock-code").long("stock-code").required(true))
                .arg(
                    Arg::new("from")
                        .long("from")
                        .help("First quarter key, for example 20241")
                        .required(true)
                        .value_parser(clap::value_parser!(i64)),
                )
                .arg(
                    Arg::new("to")
                        .long("to")
                        .help("Last quarter key, for example 20254")
                        .required(true)
                        .value_parser(clap::value_parser!(i64)),
                ),
        )
        .subcommand(
            Command::new("import")
                .about("Import report metrics from a CSV file")
                .arg(
                    Arg::new("csv")
                        .required(true)
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )
        .subcommand(
            Command::new("publish")
                .about("Publish a report: metadata JSON plus the PDF")
                .arg(
                    Arg::new("metadata")
                        .required(true)
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    Arg::new("pdf")
                        .required(true)
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("sentinel")
        .about("Console client for the Sentinel community API")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .help("Base URL of the API server")
                .default_value("http://localhost:8080")
                .env("SENTINEL_API_URL")
                .global(true),
        )
        .arg(
            Arg::new("turnstile-site-key")
                .long("turnstile-site-key")
                .help("Cloudflare Turnstile site key")
                .default_value("")
                .env("SENTINEL_TURNSTILE_SITE_KEY")
                .global(true),
        )
        .arg(
            Arg::new("session-file")
                .long("session-file")
                .help("Where the signed-in session is persisted")
                .env("SENTINEL_SESSION_FILE")
                .global(true)
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("SENTINEL_LOG_LEVEL")
                .global(true)
                .action(ArgAction::Count)
                .value_parser(validator_log_level()),
        )
        .subcommand(Command::new("config").about("Print the effective configuration"))
        .subcommand(
            Command::new("login")
                .about("Sign in and persist the session")
                .arg(Arg::new("email").long("email").required(true))
                .arg(Arg::new("password").long("password").required(true))
                .arg(
                    Arg::new("turnstile-token")
                        .long("turnstile-token")
                        .help("Turnstile response token"),
                ),
        )
        .subcommand(
            Command::new("signup")
                .about("Create an account (email verification follows)")
                .arg(Arg::new("email").long("email").required(true))
                .arg(Arg::new("password").long("password").required(true))
                .arg(Arg::new("name").long("name").required(true))
                .arg(
                    Arg::new("turnstile-token")
                        .long("turnstile-token")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("logout").about("Sign out").arg(
                Arg::new("all")
                    .long("all")
                    .help("Invalidate every session of this account")
                    .action(ArgAction::SetTrue),
            ),
        )
        .subcommand(
            Command::new("change-password")
                .about("Change the account password")
                .arg(Arg::new("current").long("current").required(true))
                .arg(Arg::new("new").long("new").required(true)),
        )
        .subcommand(Command::new("whoami").about("Show the signed-in user"))
        .subcommand(Command::new("claims").about("Show the token claims the server sees"))
        .subcommand(
            Command::new("verify-email")
                .about("Finish email verification")
                .arg(
                    Arg::new("token")
                        .long("token")
                        .help("Verification token from the email link"),
                )
                .arg(
                    Arg::new("status")
                        .long("status")
                        .help("Status delivered by a verification redirect")
                        .conflicts_with("token"),
                )
                .arg(
                    Arg::new("reason")
                        .long("reason")
                        .help("Failure reason accompanying an error status")
                        .requires("status"),
                ),
        )
        .subcommand(
            Command::new("resend-verification")
                .about("Resend the verification email")
                .arg(
                    Arg::new("user-id")
                        .long("user-id")
                        .required(true)
                        .value_parser(clap::value_parser!(i64)),
                ),
        )
        .subcommand(posts_command())
        .subcommand(comments_command())
        .subcommand(files_command())
        .subcommand(admin_command())
}
