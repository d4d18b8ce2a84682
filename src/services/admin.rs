//! Admin reporting endpoints: company lookup and report-metric management.
//! The DART sync and metric-prediction jobs stay server-side; the console
//! only uploads source data and reads the grouped results back.

use crate::api::{decode, ApiClient, ApiError};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Percent-encoding set for query-string components; keeps the unreserved
/// marks the backend expects untouched.
pub(crate) const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySearchResponse {
    pub company_id: i64,
    pub corp_name: String,
    #[serde(default)]
    pub corp_eng_name: String,
    pub stock_code: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum MetricValueType {
    #[serde(rename = "ACTUAL")]
    Actual,
    #[serde(rename = "PREDICTED")]
    Predicted,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetricItem {
    pub metric_code: String,
    pub metric_name_ko: String,
    pub metric_value: f64,
    pub value_type: MetricValueType,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetricQuarterGroup {
    pub quarter_key: i64,
    pub version_no: i64,
    pub generated_at: String,
    pub metrics: Vec<ReportMetricItem>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetricGroupedResponse {
    pub corp_name: String,
    pub stock_code: String,
    pub from_quarter_key: i64,
    pub to_quarter_key: i64,
    pub quarters: Vec<ReportMetricQuarterGroup>,
}

/// Company lookup by keyword. The keyword is percent-encoded the way the
/// old console encoded it; blank input is rejected before any call.
///
/// # Errors
/// `ApiError::Config` on a blank keyword, otherwise the pipeline taxonomy.
pub async fn search_companies(
    client: &ApiClient,
    keyword: &str,
) -> Result<Vec<CompanySearchResponse>, ApiError> {
    let trimmed = keyword.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Config("Search keyword is required.".to_string()));
    }

    let encoded = utf8_percent_encode(trimmed, QUERY_COMPONENT);
    decode(
        client
            .get(&format!("/admin/companies/search?keyword={encoded}"))
            .await?,
    )
}

/// Actual and predicted metrics for a stock, grouped by quarter.
pub async fn grouped_metrics(
    client: &ApiClient,
    stock_code: &str,
    from_quarter_key: i64,
    to_quarter_key: i64,
) -> Result<ReportMetricGroupedResponse, ApiError> {
    let encoded = utf8_percent_encode(stock_code.trim(), QUERY_COMPONENT);
    decode(
        client
            .get(&format!(
                "/admin/reports/metrics/grouped?stockCode={encoded}&fromQuarterKey={from_quarter_key}&toQuarterKey={to_quarter_key}"
            ))
            .await?,
    )
}

/// Bulk-imports metric rows from a CSV. Multipart upload; the transport owns
/// the content-type and boundary.
///
/// # Errors
/// `ApiError::Serialization` when the part cannot be built.
pub async fn import_metrics(
    client: &ApiClient,
    file_name: &str,
    csv: Vec<u8>,
) -> Result<Value, ApiError> {
    let part = Part::bytes(csv)
        .file_name(file_name.to_string())
        .mime_str("text/csv")
        .map_err(|err| ApiError::Serialization(format!("Failed to build upload part: {err}")))?;
    let form = Form::new().part("file", part);

    client.post_multipart("/admin/reports/metrics/import", form).await
}

/// Publishes a report: JSON metadata plus the PDF in one multipart request.
pub async fn publish_report(
    client: &ApiClient,
    metadata: &Value,
    pdf_name: &str,
    pdf: Vec<u8>,
) -> Result<Value, ApiError> {
    let metadata_part = Part::text(metadata.to_string())
        .mime_str("application/json")
        .map_err(|err| ApiError::Serialization(format!("Failed to build metadata part: {err}")))?;
    let pdf_part = Part::bytes(pdf)
        .file_name(pdf_name.to_string())
        .mime_str("application/pdf")
        .map_err(|err| ApiError::Serialization(format!("Failed to build PDF part: {err}")))?;
    let form = Form::new()
        .part("metadata", metadata_part)
        .part("file", pdf_part);

    client.post_multipart("/admin/reports/metrics/publish", form).await
}
