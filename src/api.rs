use crate::models::{DateRange, ErrorBody, NewStay, Stay, StayPatch, Vehicle};
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("falha de comunicação com o servidor: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{0}")]
    NotFound(String),

    #[error("URL da API inválida: {0}")]
    InvalidBaseUrl(String),
}

#[derive(Clone)]
pub struct ParkingApi {
    client: Client,
    base_url: Url,
}

impl ParkingApi {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url).map_err(|err| ApiError::InvalidBaseUrl(format!("{base_url}: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }
        let client = Client::builder().build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn fetch_vehicles(&self) -> Result<Vec<Vehicle>, ApiError> {
        let response = self.client.get(self.url(&["veiculos"])?).send().await?;
        decode(response, "Erro ao buscar veículos").await
    }

    pub async fn fetch_vehicle(&self, plate: &str) -> Result<Vehicle, ApiError> {
        let response = self.client.get(self.url(&["veiculos", plate])?).send().await?;
        decode(response, "Erro ao buscar detalhes do veículo").await
    }

    pub async fn create_vehicle(&self, vehicle: &Vehicle) -> Result<Vehicle, ApiError> {
        let response = self
            .client
            .post(self.url(&["veiculos"])?)
            .json(vehicle)
            .send()
            .await?;
        decode(response, "Erro ao adicionar veículo").await
    }

    pub async fn update_vehicle(&self, original_plate: &str, vehicle: &Vehicle) -> Result<Vehicle, ApiError> {
        let response = self
            .client
            .patch(self.url(&["veiculos", original_plate])?)
            .json(vehicle)
            .send()
            .await?;
        decode(response, "Erro ao atualizar veículo").await
    }

    pub async fn fetch_stays(&self, range: Option<&DateRange>) -> Result<Vec<Stay>, ApiError> {
        let mut request = self.client.get(self.url(&["estadias"])?);
        if let Some(range) = range {
            request = request.query(&[
                ("dataInicio", range.from.format("%Y-%m-%d").to_string()),
                ("dataFim", range.to.format("%Y-%m-%d").to_string()),
            ]);
        }
        let response = request.send().await?;
        decode(response, "Erro ao buscar estadias").await
    }

    /// The backend has no single-stay endpoint, so the lookup runs over the
    /// full listing.
    pub async fn fetch_stay(&self, id: i64) -> Result<Stay, ApiError> {
        self.fetch_stays(None)
            .await?
            .into_iter()
            .find(|stay| stay.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("Estadia {id} não encontrada")))
    }

    pub async fn create_stay(&self, stay: &NewStay) -> Result<Stay, ApiError> {
        let response = self
            .client
            .post(self.url(&["estadias"])?)
            .json(stay)
            .send()
            .await?;
        decode(response, "Erro ao registrar estadia").await
    }

    pub async fn update_stay(&self, id: i64, patch: &StayPatch) -> Result<Stay, ApiError> {
        let response = self
            .client
            .patch(self.url(&["estadias", &id.to_string()])?)
            .json(patch)
            .send()
            .await?;
        decode(response, "Erro ao atualizar estadia").await
    }

    pub async fn finish_stay(&self, id: i64, at: DateTime<Utc>) -> Result<Stay, ApiError> {
        let patch = StayPatch {
            exit: Some(at),
            ..StayPatch::default()
        };
        let response = self
            .client
            .patch(self.url(&["estadias", &id.to_string()])?)
            .json(&patch)
            .send()
            .await?;
        decode(response, "Erro ao registrar saída").await
    }
}

async fn decode<T: DeserializeOwned>(response: Response, fallback: &str) -> Result<T, ApiError> {
    let status = response.status();
    debug!(%status, url = %response.url(), "backend response");
    if !status.is_success() {
        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message)
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string());
        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response.json().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_appends_encoded_segments() {
        let api = ParkingApi::new("http://localhost:3001").unwrap();
        assert_eq!(
            api.url(&["veiculos", "ABC 1/2"]).unwrap().as_str(),
            "http://localhost:3001/veiculos/ABC%201%2F2"
        );
    }

    #[test]
    fn url_keeps_base_path() {
        let api = ParkingApi::new("http://backend:9000/api/").unwrap();
        assert_eq!(
            api.url(&["estadias", "12"]).unwrap().as_str(),
            "http://backend:9000/api/estadias/12"
        );
    }

    #[test]
    fn rejects_unusable_base_url() {
        assert!(matches!(
            ParkingApi::new("not a url"),
            Err(ApiError::InvalidBaseUrl(_))
        ));
        assert!(matches!(
            ParkingApi::new("mailto:parking@example.com"),
            Err(ApiError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn status_error_displays_server_message() {
        let err = ApiError::Status {
            status: 409,
            message: "Placa já cadastrada".to_string(),
        };
        assert_eq!(err.to_string(), "Placa já cadastrada");
    }
}
