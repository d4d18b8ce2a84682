use crate::api::ApiClient;
use crate::cli::{actions::Action, globals::GlobalArgs};
use crate::services::{admin, auth, files, posts};
use crate::session::{AuthState, SessionStore};
use crate::util::debounce::{Debouncer, DEFAULT_DELAY};
use crate::verify::{self, PendingVerification, VerificationFlow, VerifyState};
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::warn;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn file_name_of(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(std::string::ToString::to_string)
        .with_context(|| format!("invalid file name: {}", path.display()))
}

fn guess_content_type(file_name: &str) -> &'static str {
    match file_name.rsplit('.').next().map(str::to_lowercase).as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("pdf") => "application/pdf",
        Some("csv") => "text/csv",
        Some("txt" | "md") => "text/plain",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

fn report_verification(state: &VerifyState) -> Result<()> {
    match state {
        VerifyState::Success => println!("Email verified. You can sign in now."),
        VerifyState::AlreadyVerified => println!("This email was already verified."),
        VerifyState::Expired => {
            println!("The verification link expired. Request a new one with resend-verification.");
        }
        VerifyState::Error(message) => anyhow::bail!("verification failed: {message}"),
        VerifyState::Loading => unreachable!("verification left in loading state"),
    }
    Ok(())
}

async fn watch_companies(client: &ApiClient) -> Result<()> {
    use tokio::io::{AsyncBufReadExt, BufReader};

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut debouncer = Debouncer::default();

    println!("Type a company keyword, empty line to quit:");
    while let Some(line) = lines.next_line().await? {
        let keyword = line.trim().to_string();
        if keyword.is_empty() {
            break;
        }
        let client = client.clone();
        debouncer.call(move || async move {
            match admin::search_companies(&client, &keyword).await {
                Ok(companies) => {
                    for company in &companies {
                        println!("{}  {}", company.stock_code, company.corp_name);
                    }
                }
                Err(err) => warn!("company search failed: {err}"),
            }
        });
    }

    // Give the trailing debounced search a chance to run before returning.
    tokio::time::sleep(DEFAULT_DELAY * 2).await;
    Ok(())
}

/// Handle the console action
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    let store = SessionStore::new(globals.session_file.clone());
    let client = ApiClient::new(globals.api_url.clone(), store.clone())?;
    let mut state = AuthState::new(store);
    state.hydrate();

    match action {
        Action::Config => {
            print_json(&json!({
                "apiUrl": globals.api_url,
                "turnstileSiteKey": globals.turnstile_site_key,
                "sessionFile": globals.session_file,
                "isAuthenticated": state.is_authenticated(),
            }))?;
        }

        Action::Login {
            email,
            password,
            turnstile_token,
        } => {
            let response = auth::login(
                &client,
                &auth::LoginRequest {
                    email,
                    password,
                    turnstile_token,
                },
            )
            .await?;
            state.login(response.access_token.clone(), response.user.clone())?;
            if response.password_expired {
                warn!("password expired, change it soon");
            }
            println!("Signed in as {} ({})", response.user.name, response.user.email);
        }

        Action::Signup {
            email,
            password,
            name,
            turnstile_token,
        } => {
            let response = auth::signup(
                &client,
                &auth::SignupRequest {
                    email,
                    password,
                    name,
                    turnstile_token,
                },
            )
            .await?;
            let mut pending = PendingVerification::default();
            pending.mark_sent(response.id);
            print_json(&response)?;
            if pending.verification_sent {
                println!(
                    "Verification email sent to {}. If it does not arrive, run: sentinel resend-verification --user-id {}",
                    response.email, response.id
                );
            }
        }

        Action::Logout { all } => {
            // Server-side invalidation is best-effort; the local session is
            // dropped no matter what the backend says.
            let result = if all {
                auth::logout_all(&client).await
            } else {
                auth::logout(&client).await
            };
            if let Err(err) = result {
                warn!("session invalidation failed: {err}");
            }
            if all {
                state.logout_all()?;
            } else {
                state.logout()?;
            }
            println!("Signed out.");
        }

        Action::ChangePassword {
            current_password,
            new_password,
        } => {
            auth::change_password(
                &client,
                &auth::ChangePasswordRequest {
                    current_password,
                    new_password,
                },
            )
            .await?;
            println!("Password changed.");
        }

        Action::Whoami => match state.session().user() {
            Some(user) => print_json(user)?,
            None => println!("Not signed in."),
        },

        Action::Claims => print_json(&auth::claims(&client).await?)?,

        Action::VerifyEmail {
            token,
            status,
            reason,
        } => {
            let outcome = match (token, status) {
                (Some(token), _) => {
                    let mut flow = VerificationFlow::new();
                    flow.run(|| auth::verify_email(&client, &token)).await.clone()
                }
                (None, Some(status)) => {
                    verify::resolve_redirect(std::future::ready(Some((status, reason)))).await
                }
                (None, None) => verify::resolve_redirect(std::future::pending()).await,
            };
            report_verification(&outcome)?;
        }

        Action::ResendVerification { user_id } => {
            let message = auth::resend_verification(&client, user_id).await?;
            println!("{message}");
        }

        Action::PostCategories => print_json(&posts::categories(&client).await?)?,

        Action::PostList {
            page,
            size,
            category_id,
            keyword,
        } => {
            let params = posts::PostListParams {
                page,
                size,
                category_id,
                keyword,
            };
            print_json(&posts::list_posts(&client, &params).await?)?;
        }

        Action::PostGet { id } => print_json(&posts::get_post(&client, id).await?)?,

        Action::PostCreate {
            category_id,
            title,
            content,
        } => {
            let request = posts::CreatePostRequest {
                category_id,
                title,
                content,
            };
            print_json(&posts::create_post(&client, &request).await?)?;
        }

        Action::PostUpdate { id, title, content } => {
            let request = posts::UpdatePostRequest { title, content };
            print_json(&posts::update_post(&client, id, &request).await?)?;
        }

        Action::PostDelete { id } => {
            posts::delete_post(&client, id).await?;
            println!("Post {id} deleted.");
        }

        Action::CommentList { post_id } => {
            print_json(&posts::comments(&client, post_id).await?)?;
        }

        Action::CommentAdd {
            post_id,
            content,
            parent_id,
        } => {
            let request = posts::CreateCommentRequest { content, parent_id };
            print_json(&posts::create_comment(&client, post_id, &request).await?)?;
        }

        Action::CommentEdit { id, content } => {
            let request = posts::UpdateCommentRequest { content };
            print_json(&posts::update_comment(&client, id, &request).await?)?;
        }

        Action::CommentDelete { id } => {
            posts::delete_comment(&client, id).await?;
            println!("Comment {id} deleted.");
        }

        Action::FileList { post_id } => print_json(&files::list(&client, post_id).await?)?,

        Action::FileUpload { post_id, path } => {
            let file_name = file_name_of(&path)?;
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            let content_type = guess_content_type(&file_name);
            let uploaded = files::upload(&client, post_id, &file_name, content_type, bytes).await?;
            print_json(&uploaded)?;
        }

        Action::FileDownload { file_id, out } => {
            let scratch_dir = std::env::temp_dir().join("sentinel");
            let downloaded = files::download(&client, file_id, &scratch_dir).await?;
            let dest = out.unwrap_or_else(|| PathBuf::from(&downloaded.file_name));
            tokio::fs::copy(downloaded.scratch.path(), &dest)
                .await
                .with_context(|| format!("failed to write {}", dest.display()))?;
            println!("Saved {}", dest.display());
        }

        Action::CompanySearch { keyword } => match keyword {
            Some(keyword) => print_json(&admin::search_companies(&client, &keyword).await?)?,
            None => watch_companies(&client).await?,
        },

        Action::MetricsGrouped {
            stock_code,
            from_quarter,
            to_quarter,
        } => {
            let grouped =
                admin::grouped_metrics(&client, &stock_code, from_quarter, to_quarter).await?;
            print_json(&grouped)?;
        }

        Action::MetricsImport { path } => {
            let file_name = file_name_of(&path)?;
            let csv = tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            print_json(&admin::import_metrics(&client, &file_name, csv).await?)?;
        }

        Action::ReportPublish { metadata, pdf } => {
            let metadata_text = tokio::fs::read_to_string(&metadata)
                .await
                .with_context(|| format!("failed to read {}", metadata.display()))?;
            let metadata_json: serde_json::Value = serde_json::from_str(&metadata_text)
                .with_context(|| format!("{} is not valid JSON", metadata.display()))?;
            let pdf_name = file_name_of(&pdf)?;
            let pdf_bytes = tokio::fs::read(&pdf)
                .await
                .with_context(|| format!("failed to read {}", pdf.display()))?;
            let published =
                admin::publish_report(&client, &metadata_json, &pdf_name, pdf_bytes).await?;
            print_json(&published)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type("chart.PNG"), "image/png");
        assert_eq!(guess_content_type("report.pdf"), "application/pdf");
        assert_eq!(guess_content_type("metrics.csv"), "text/csv");
        assert_eq!(guess_content_type("mystery"), "application/octet-stream");
    }

    #[test]
    fn test_file_name_of() {
        let name = file_name_of(Path::new("/tmp/reports/q2.pdf")).unwrap();
        assert_eq!(name, "q2.pdf");
    }
}
