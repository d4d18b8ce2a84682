pub mod console;

use std::path::PathBuf;

/// What the invocation asked the console to do.
#[derive(Debug, Clone)]
pub enum Action {
    Config,
    Login {
        email: String,
        password: String,
        turnstile_token: Option<String>,
    },
    Signup {
        email: String,
        password: String,
        name: String,
        turnstile_token: String,
    },
    Logout {
        all: bool,
    },
    ChangePassword {
        current_password: String,
        new_password: String,
    },
    Whoami,
    Claims,
    VerifyEmail {
        token: Option<String>,
        status: Option<String>,
        reason: Option<String>,
    },
    ResendVerification {
        user_id: i64,
    },
    PostCategories,
    PostList {
        page: Option<u32>,
        size: Option<u32>,
        category_id: Option<i64>,
        keyword: Option<String>,
    },
    PostGet {
        id: i64,
    },
    PostCreate {
        category_id: i64,
        title: String,
        content: String,
    },
    PostUpdate {
        id: i64,
        title: Option<String>,
        content: Option<String>,
    },
    PostDelete {
        id: i64,
    },
    CommentList {
        post_id: i64,
    },
    CommentAdd {
        post_id: i64,
        content: String,
        parent_id: Option<i64>,
    },
    CommentEdit {
        id: i64,
        content: String,
    },
    CommentDelete {
        id: i64,
    },
    FileList {
        post_id: i64,
    },
    FileUpload {
        post_id: i64,
        path: PathBuf,
    },
    FileDownload {
        file_id: i64,
        out: Option<PathBuf>,
    },
    CompanySearch {
        keyword: Option<String>,
    },
    MetricsGrouped {
        stock_code: String,
        from_quarter: i64,
        to_quarter: i64,
    },
    MetricsImport {
        path: PathBuf,
    },
    ReportPublish {
        metadata: PathBuf,
        pdf: PathBuf,
    },
}
