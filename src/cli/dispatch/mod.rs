use crate::cli::{actions::Action, globals::GlobalArgs};
use anyhow::{Context, Result};
use std::path::PathBuf;

fn string_arg(matches: &clap::ArgMatches, name: &str) -> Result<String> {
    matches
        .get_one::<String>(name)
        .map(std::string::ToString::to_string)
        .with_context(|| format!("missing required argument: --{name}"))
}

fn opt_string_arg(matches: &clap::ArgMatches, name: &str) -> Option<String> {
    matches
        .get_one::<String>(name)
        .map(std::string::ToString::to_string)
}

fn id_arg(matches: &clap::ArgMatches, name: &str) -> Result<i64> {
    matches
        .get_one::<i64>(name)
        .copied()
        .with_context(|| format!("missing required argument: {name}"))
}

fn path_arg(matches: &clap::ArgMatches, name: &str) -> Result<PathBuf> {
    matches
        .get_one::<PathBuf>(name)
        .cloned()
        .with_context(|| format!("missing required argument: {name}"))
}

fn posts_action(matches: &clap::ArgMatches) -> Result<Action> {
    match matches.subcommand() {
        Some(("categories", _)) => Ok(Action::PostCategories),
        Some(("list", m)) => Ok(Action::PostList {
            page: m.get_one::<u32>("page").copied(),
            size: m.get_one::<u32>("size").copied(),
            category_id: m.get_one::<i64>("category").copied(),
            keyword: opt_string_arg(m, "keyword"),
        }),
        Some(("get", m)) => Ok(Action::PostGet {
            id: id_arg(m, "id")?,
        }),
        Some(("create", m)) => Ok(Action::PostCreate {
            category_id: id_arg(m, "category")?,
            title: string_arg(m, "title")?,
            content: string_arg(m, "content")?,
        }),
        Some(("update", m)) => Ok(Action::PostUpdate {
            id: id_arg(m, "id")?,
            title: opt_string_arg(m, "title"),
            content: opt_string_arg(m, "content"),
        }),
        Some(("delete", m)) => Ok(Action::PostDelete {
            id: id_arg(m, "id")?,
        }),
        _ => anyhow::bail!("unknown posts subcommand"),
    }
}

fn comments_action(matches: &clap::ArgMatches) -> Result<Action> {
    match matches.subcommand() {
        Some(("list", m)) => Ok(Action::CommentList {
            post_id: id_arg(m, "post-id")?,
        }),
        Some(("add", m)) => Ok(Action::CommentAdd {
            post_id: id_arg(m, "post-id")?,
            content: string_arg(m, "content")?,
            parent_id: m.get_one::<i64>("parent").copied(),
        }),
        Some(("edit", m)) => Ok(Action::CommentEdit {
            id: id_arg(m, "id")?,
            content: string_arg(m, "content")?,
        }),
        Some(("delete", m)) => Ok(Action::CommentDelete {
            id: id_arg(m, "id")?,
        }),
        _ => anyhow::bail!("unknown comments subcommand"),
    }
}

fn files_action(matches: &clap::ArgMatches) -> Result<Action> {
    match matches.subcommand() {
        Some(("list", m)) => Ok(Action::FileList {
            post_id: id_arg(m, "post-id")?,
        }),
        Some(("upload", m)) => Ok(Action::FileUpload {
            post_id: id_arg(m, "post-id")?,
            path: path_arg(m, "path")?,
        }),
        Some(("download", m)) => Ok(Action::FileDownload {
            file_id: id_arg(m, "file-id")?,
            out: m.get_one::<PathBuf>("out").cloned(),
        }),
        _ => anyhow::bail!("unknown files subcommand"),
    }
}

fn admin_action(matches: &clap::ArgMatches) -> Result<Action> {
    match matches.subcommand() {
        Some(("companies", m)) => Ok(Action::CompanySearch {
            keyword: opt_string_arg(m, "keyword"),
        }),
        Some(("metrics", m)) => Ok(Action::MetricsGrouped {
            stock_code: string_arg(m, "stock-code")?,
            from_quarter: id_arg(m, "from")?,
            to_quarter: id_arg(m, "to")?,
        }),
        Some(("import", m)) => Ok(Action::MetricsImport {
            path: path_arg(m, "csv")?,
        }),
        Some(("publish", m)) => Ok(Action::ReportPublish {
            metadata: path_arg(m, "metadata")?,
            pdf: path_arg(m, "pdf")?,
        }),
        _ => anyhow::bail!("unknown admin subcommand"),
    }
}

pub fn handler(matches: &clap::ArgMatches) -> Result<(GlobalArgs, Action)> {
    let mut globals = GlobalArgs::new(string_arg(matches, "api-url")?);
    globals.set_turnstile_site_key(
        opt_string_arg(matches, "turnstile-site-key").unwrap_or_default(),
    );
    if let Some(path) = matches.get_one::<PathBuf>("session-file") {
        globals.set_session_file(path.clone());
    }

    let action = match matches.subcommand() {
        Some(("config", _)) => Action::Config,
        Some(("login", m)) => Action::Login {
            email: string_arg(m, "email")?,
            password: string_arg(m, "password")?,
            turnstile_token: opt_string_arg(m, "turnstile-token"),
        },
        Some(("signup", m)) => Action::Signup {
            email: string_arg(m, "email")?,
            password: string_arg(m, "password")?,
            name: string_arg(m, "name")?,
            turnstile_token: string_arg(m, "turnstile-token")?,
        },
        Some(("logout", m)) => Action::Logout {
            all: m.get_flag("all"),
        },
        Some(("change-password", m)) => Action::ChangePassword {
            current_password: string_arg(m, "current")?,
            new_password: string_arg(m, "new")?,
        },
        Some(("whoami", _)) => Action::Whoami,
        Some(("claims", _)) => Action::Claims,
        Some(("verify-email", m)) => Action::VerifyEmail {
            token: opt_string_arg(m, "token"),
            status: opt_string_arg(m, "status"),
            reason: opt_string_arg(m, "reason"),
        },
        Some(("resend-verification", m)) => Action::ResendVerification {
            user_id: id_arg(m, "user-id")?,
        },
        Some(("posts", m)) => posts_action(m)?,
        Some(("comments", m)) => comments_action(m)?,
        Some(("files", m)) => files_action(m)?,
        Some(("admin", m)) => admin_action(m)?,
        _ => anyhow::bail!("no subcommand provided"),
    };

    Ok((globals, action))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;

    #[test]
    fn test_handler_login() -> Result<()> {
        let matches = commands::new().get_matches_from(vec![
            "sentinel",
            "--api-url",
            "https://api.sentinel.dev",
            "login",
            "--email",
            "user@sentinel.dev",
            "--password",
            "hunter2",
        ]);
        let (globals, action) = handler(&matches)?;
        assert_eq!(globals.api_url, "https://api.sentinel.dev");
        match action {
            Action::Login {
                email,
                password,
                turnstile_token,
            } => {
                assert_eq!(email, "user@sentinel.dev");
                assert_eq!(password, "hunter2");
                assert!(turnstile_token.is_none());
            }
            _ => panic!("expected login action"),
        }
        Ok(())
    }

    #[test]
    fn test_handler_logout_all() -> Result<()> {
        let matches = commands::new().get_matches_from(vec!["sentinel", "logout", "--all"]);
        let (_, action) = handler(&matches)?;
        match action {
            Action::Logout { all } => assert!(all),
            _ => panic!("expected logout action"),
        }
        Ok(())
    }

    #[test]
    fn test_handler_nested_subcommands() -> Result<()> {
        let matches = commands::new().get_matches_from(vec![
            "sentinel", "comments", "add", "7", "--content", "hello", "--parent", "3",
        ]);
        let (_, action) = handler(&matches)?;
        match action {
            Action::CommentAdd {
                post_id,
                content,
                parent_id,
            } => {
                assert_eq!(post_id, 7);
                assert_eq!(content, "hello");
                assert_eq!(parent_id, Some(3));
            }
            _ => panic!("expected comment add action"),
        }
        Ok(())
    }

    #[test]
    fn test_handler_session_file_global() -> Result<()> {
        let matches = commands::new().get_matches_from(vec![
            "sentinel",
            "--session-file",
            "/tmp/s.json",
            "whoami",
        ]);
        let (globals, action) = handler(&matches)?;
        assert_eq!(globals.session_file, PathBuf::from("/tmp/s.json"));
        assert!(matches!(action, Action::Whoami));
        Ok(())
    }
}
