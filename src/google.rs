use std::time::Duration;
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use url::Url;
use crate::sheet::{Spreadsheet, UpdateValuesResponse};

const SHEETS_API: &str = "https://sheets.googleapis.com/v4";
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum Error {
    #[error("auth error: {0}")]
    AuthError(#[from] google_cloud_auth::error::Error),

    #[error("auth token error: {0}")]
    AuthTokenError(#[from] Box<dyn std::error::Error + Send + Sync>),

    #[error("reqwest: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("url: {0}")]
    Url(#[from] url::ParseError),

    #[error("code: {0}, body: {1}")]
    Status(u16, String),

    #[error("unexpected response, code: {0}, body: {1}")]
    Deserialize(u16, String),
}

/// Exchange Google credentials for an oauth2 access token with Sheets scope.
///
/// With `credentials_path` set, that service account file is used.
/// Otherwise the application default credentials are.
pub async fn token(credentials_path: Option<&str>) -> Result<String, Error> {
    use google_cloud_auth::credentials::CredentialsFile;
    use google_cloud_auth::{project::Config, token::DefaultTokenSourceProvider};
    use google_cloud_token::TokenSourceProvider as _;

    let audience = "https://oauth2.googleapis.com/token/";
    let scopes = [SHEETS_SCOPE];

    let config = Config::default()
        .with_audience(audience)
        .with_scopes(&scopes);

    let tsp = match credentials_path {
        Some(path) => {
            debug!("Exchanging Google credential file {path} for an oauth2 token");
            let credentials = CredentialsFile::new_from_file(path.to_string()).await?;
            DefaultTokenSourceProvider::new_with_credentials(config, Box::new(credentials)).await?
        }
        None => {
            debug!("Exchanging application default credentials for an oauth2 token");
            DefaultTokenSourceProvider::new(config).await?
        }
    };
    let ts = tsp.token_source();
    let token = ts.token().await.map_err(Error::AuthTokenError)?;
    Ok(token.strip_prefix("Bearer ").unwrap_or(&token).to_string())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange<'a> {
    range: &'a str,
    major_dimension: &'a str,
    values: [[&'a str; 1]; 1],
}

#[derive(serde::Deserialize)]
struct ValueRangeResponse {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Values endpoint of one spreadsheet, for a given A1 range.
pub fn values_url(spreadsheet_id: &str, range: &str) -> Result<Url, Error> {
    let mut url = Url::parse(SHEETS_API)?;
    url.path_segments_mut()
        .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .extend(&["spreadsheets", spreadsheet_id, "values", range]);
    Ok(url)
}

/// Read status and body of a Sheets API response, and decode it as `T`.
async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, Error> {
    let status = resp.status();
    let bytes = resp.bytes().await?;
    let body = || String::from_utf8_lossy(&bytes).to_string();

    if !status.is_success() {
        return Err(Error::Status(status.as_u16(), body()));
    }
    debug!("Sheets API response: {}", body());
    serde_json::from_slice(&bytes).map_err(|_| Error::Deserialize(status.as_u16(), body()))
}

/// Google Sheets REST client bound to one spreadsheet.
pub struct Sheets {
    client: Client,
    token: String,
    spreadsheet_id: String,
}

impl Sheets {
    pub async fn connect(spreadsheet_id: &str, credentials_path: Option<&str>) -> Result<Self, Error> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            token: token(credentials_path).await?,
            spreadsheet_id: spreadsheet_id.to_string(),
        })
    }
}

#[async_trait]
impl Spreadsheet for Sheets {
    async fn read_columns(&self, range: &str) -> Result<Vec<Vec<serde_json::Value>>, Error> {
        let url = values_url(&self.spreadsheet_id, range)?;
        debug!("GET {url}");
        let resp = self.client.get(url)
            .bearer_auth(&self.token)
            .query(&[("majorDimension", "COLUMNS")])
            .send()
            .await?;
        let range: ValueRangeResponse = decode(resp).await?;
        Ok(range.values)
    }

    async fn write_raw(&self, range: &str, value: &str) -> Result<UpdateValuesResponse, Error> {
        let url = values_url(&self.spreadsheet_id, range)?;
        debug!("PUT {url}");
        let body = ValueRange {
            range,
            major_dimension: "ROWS",
            values: [[value]],
        };
        let resp = self.client.put(url)
            .bearer_auth(&self.token)
            .query(&[("valueInputOption", "RAW")])
            .json(&body)
            .send()
            .await?;
        decode(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_url_escapes_range() {
        let url = values_url("abc123", "MediaPortal!C14").unwrap();
        assert_eq!(url.as_str(), "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/MediaPortal!C14");

        let url = values_url("abc123", "My Sheet!A1:A50").unwrap();
        assert_eq!(url.as_str(), "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/My%20Sheet!A1:A50");
    }

    #[test]
    fn write_body() {
        let body = ValueRange {
            range: "MediaPortal!B3",
            major_dimension: "ROWS",
            values: [["1.0.11"]],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"range": "MediaPortal!B3", "majorDimension": "ROWS", "values": [["1.0.11"]]})
        );
    }

    #[test]
    fn decode_update_response() {
        let response: UpdateValuesResponse = serde_json::from_str(
            r#"{"spreadsheetId":"abc","updatedRange":"MediaPortal!B3","updatedRows":1,"updatedColumns":1,"updatedCells":1}"#,
        ).unwrap();
        assert_eq!(response.updated_range.as_deref(), Some("MediaPortal!B3"));
        assert_eq!(response.updated_cells, Some(1));
    }

    #[test]
    fn missing_values_is_empty_range() {
        let range: ValueRangeResponse = serde_json::from_str(r#"{"range":"MediaPortal!A1:A50","majorDimension":"COLUMNS"}"#).unwrap();
        assert!(range.values.is_empty());
    }
}
