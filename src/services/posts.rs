//! Post and comment endpoints. Comments come back as a flat list that
//! represents a tree through `parent_id` plus precomputed `depth` and
//! `sequence`; ordering and indentation are supplied by the backend, never
//! recomputed here.

use super::PageResponse;
use crate::api::{decode, ApiClient, ApiError};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: i64,
    pub user_id: String,
    pub category_id: i64,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub is_pinned: bool,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Flat comment node; the tree shape lives in `parent_id`/`depth`/`sequence`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNode {
    pub id: i64,
    pub user_id: String,
    pub post_id: i64,
    #[serde(default)]
    pub parent_id: Option<i64>,
    pub content: String,
    pub depth: u32,
    pub sequence: u32,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub category_id: i64,
    pub title: String,
    pub content: String,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct UpdateCommentRequest {
    pub content: String,
}

/// List filters, serialized into the query string.
#[derive(Clone, Debug, Default)]
pub struct PostListParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub category_id: Option<i64>,
    pub keyword: Option<String>,
}

impl PostListParams {
    fn query(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        if let Some(page) = self.page {
            serializer.append_pair("page", &page.to_string());
        }
        if let Some(size) = self.size {
            serializer.append_pair("size", &size.to_string());
        }
        if let Some(category_id) = self.category_id {
            serializer.append_pair("categoryId", &category_id.to_string());
        }
        if let Some(keyword) = &self.keyword {
            serializer.append_pair("keyword", keyword);
        }
        serializer.finish()
    }
}

pub async fn categories(client: &ApiClient) -> Result<Vec<Category>, ApiError> {
    decode(client.get("/dev/categories").await?)
}

pub async fn list_posts(
    client: &ApiClient,
    params: &PostListParams,
) -> Result<PageResponse<PostResponse>, ApiError> {
    let query = params.query();
    let endpoint = if query.is_empty() {
        "/posts".to_string()
    } else {
        format!("/posts?{query}")
    };
    decode(client.get(&endpoint).await?)
}

pub async fn get_post(client: &ApiClient, id: i64) -> Result<PostResponse, ApiError> {
    decode(client.get(&format!("/posts/{id}")).await?)
}

pub async fn create_post(
    client: &ApiClient,
    request: &CreatePostRequest,
) -> Result<PostResponse, ApiError> {
    decode(client.post("/posts", request).await?)
}

pub async fn update_post(
    client: &ApiClient,
    id: i64,
    request: &UpdatePostRequest,
) -> Result<PostResponse, ApiError> {
    decode(client.patch(&format!("/posts/{id}"), request).await?)
}

pub async fn delete_post(client: &ApiClient, id: i64) -> Result<(), ApiError> {
    client.delete(&format!("/posts/{id}")).await.map(|_| ())
}

pub async fn comments(client: &ApiClient, post_id: i64) -> Result<Vec<CommentNode>, ApiError> {
    decode(client.get(&format!("/posts/{post_id}/comments")).await?)
}

pub async fn create_comment(
    client: &ApiClient,
    post_id: i64,
    request: &CreateCommentRequest,
) -> Result<CommentNode, ApiError> {
    decode(client.post(&format!("/posts/{post_id}/comments"), request).await?)
}

pub async fn update_comment(
    client: &ApiClient,
    id: i64,
    request: &UpdateCommentRequest,
) -> Result<CommentNode, ApiError> {
    decode(client.patch(&format!("/comments/{id}"), request).await?)
}

pub async fn delete_comment(client: &ApiClient, id: i64) -> Result<(), ApiError> {
    client.delete(&format!("/comments/{id}")).await.map(|_| ())
}
