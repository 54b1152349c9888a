use crate::api::{ApiError, ParkingApi};
use crate::models::{timestamp, NewStay, Stay, StayPatch, Vehicle};
use chrono::{DateTime, Duration, DurationRound, Local, TimeZone, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode<K> {
    Create,
    Edit(K),
}

#[derive(Debug, Error)]
pub enum FormError {
    #[error("Valor por hora inválido: {0}")]
    InvalidRate(String),

    #[error("Data inválida: {0}")]
    InvalidDateTime(String),

    #[error("Estadia inválida: {0}")]
    InvalidKey(String),
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

fn mode_from(original: &str) -> FormMode<String> {
    match original.trim() {
        "" => FormMode::Create,
        key => FormMode::Edit(key.to_string()),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VehicleForm {
    pub placa: String,
    pub placa_original: String,
    pub tipo: String,
    pub proprietario: String,
    pub telefone: String,
    pub marca: String,
    pub modelo: String,
    pub cor: String,
    pub ano: String,
}

impl VehicleForm {
    pub fn edit(vehicle: &Vehicle) -> Self {
        Self {
            placa: vehicle.plate.clone(),
            placa_original: vehicle.plate.clone(),
            tipo: vehicle.kind.clone(),
            proprietario: vehicle.owner.clone(),
            telefone: vehicle.phone.clone(),
            marca: vehicle.make.clone(),
            modelo: vehicle.model.clone(),
            cor: vehicle.color.clone(),
            ano: vehicle.year.map(|year| year.to_string()).unwrap_or_default(),
        }
    }

    pub fn mode(&self) -> FormMode<String> {
        mode_from(&self.placa_original)
    }

    pub fn to_vehicle(&self) -> Vehicle {
        let plate = match self.mode() {
            FormMode::Create => self.placa.trim().to_uppercase(),
            FormMode::Edit(original) => original.to_uppercase(),
        };
        Vehicle {
            plate,
            kind: self.tipo.trim().to_string(),
            owner: self.proprietario.trim().to_string(),
            phone: self.telefone.trim().to_string(),
            make: self.marca.trim().to_string(),
            model: self.modelo.trim().to_string(),
            color: self.cor.trim().to_string(),
            year: self.ano.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StayForm {
    pub id_original: String,
    pub placa: String,
    pub valor_hora: String,
    pub entrada: String,
    pub saida: String,
    pub entrada_original: String,
    pub saida_original: String,
}

pub fn input_date_time(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|value| value.with_timezone(&Local).format("%Y-%m-%dT%H:%M").to_string())
        .unwrap_or_default()
}

impl StayForm {
    pub fn create(plate: &str, rate: Option<f64>, now: DateTime<Utc>) -> Self {
        Self {
            placa: plate.trim().to_uppercase(),
            valor_hora: rate.map(|rate| rate.to_string()).unwrap_or_default(),
            entrada: input_date_time(Some(now)),
            ..Self::default()
        }
    }

    pub fn edit(stay: &Stay) -> Self {
        Self {
            id_original: stay.id.to_string(),
            placa: stay.plate.clone(),
            valor_hora: stay.hourly_rate.map(|rate| rate.to_string()).unwrap_or_default(),
            entrada: input_date_time(stay.entry),
            saida: input_date_time(stay.exit),
            entrada_original: stay.entry.as_ref().map(timestamp::format).unwrap_or_default(),
            saida_original: stay.exit.as_ref().map(timestamp::format).unwrap_or_default(),
        }
    }

    pub fn mode(&self) -> Result<FormMode<i64>, FormError> {
        match mode_from(&self.id_original) {
            FormMode::Create => Ok(FormMode::Create),
            FormMode::Edit(key) => key
                .parse()
                .map(FormMode::Edit)
                .map_err(|_| FormError::InvalidKey(key)),
        }
    }

    fn rate(&self) -> Result<Option<f64>, FormError> {
        let raw = self.valor_hora.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        raw.replace(',', ".")
            .parse::<f64>()
            .ok()
            .filter(|rate| rate.is_finite() && *rate >= 0.0)
            .map(Some)
            .ok_or_else(|| FormError::InvalidRate(raw.to_string()))
    }

    fn date_time<Tz: TimeZone>(raw: &str, tz: &Tz) -> Result<Option<DateTime<Utc>>, FormError> {
        if raw.trim().is_empty() {
            return Ok(None);
        }
        timestamp::parse_in(raw, tz)
            .map(Some)
            .ok_or_else(|| FormError::InvalidDateTime(raw.trim().to_string()))
    }

    /// `datetime-local` inputs carry minutes only, so an input that still
    /// shows the stored time's minute is left out of the patch.
    fn edited_date_time<Tz: TimeZone>(
        raw: &str,
        original: &str,
        tz: &Tz,
    ) -> Result<Option<DateTime<Utc>>, FormError> {
        let Some(value) = Self::date_time(raw, tz)? else {
            return Ok(None);
        };
        let shown = timestamp::parse_in(original, tz)
            .and_then(|original| original.duration_trunc(Duration::minutes(1)).ok());
        Ok((shown != Some(value)).then_some(value))
    }

    pub fn to_new_stay<Tz: TimeZone>(&self, now: DateTime<Utc>, tz: &Tz) -> Result<NewStay, FormError> {
        Ok(NewStay {
            plate: self.placa.trim().to_uppercase(),
            hourly_rate: self.rate()?.unwrap_or(0.0),
            entry: Some(Self::date_time(&self.entrada, tz)?.unwrap_or(now)),
        })
    }

    pub fn to_patch<Tz: TimeZone>(&self, tz: &Tz) -> Result<StayPatch, FormError> {
        let plate = self.placa.trim().to_uppercase();
        Ok(StayPatch {
            plate: (!plate.is_empty()).then_some(plate),
            hourly_rate: self.rate()?,
            entry: Self::edited_date_time(&self.entrada, &self.entrada_original, tz)?,
            exit: Self::edited_date_time(&self.saida, &self.saida_original, tz)?,
        })
    }
}

pub async fn submit_vehicle(api: &ParkingApi, form: &VehicleForm) -> Result<&'static str, SubmitError> {
    let vehicle = form.to_vehicle();
    match form.mode() {
        FormMode::Create => {
            api.create_vehicle(&vehicle).await?;
            info!(plate = %vehicle.plate, "vehicle created");
            Ok("Veículo adicionado com sucesso!")
        }
        FormMode::Edit(original) => {
            api.update_vehicle(&original, &vehicle).await?;
            info!(plate = %original, "vehicle updated");
            Ok("Veículo atualizado com sucesso!")
        }
    }
}

pub async fn submit_stay(api: &ParkingApi, form: &StayForm, now: DateTime<Utc>) -> Result<&'static str, SubmitError> {
    match form.mode()? {
        FormMode::Create => {
            let stay = form.to_new_stay(now, &Local)?;
            let created = api.create_stay(&stay).await?;
            info!(id = created.id, plate = %created.plate, "stay created");
            Ok("Estadia registrada com sucesso!")
        }
        FormMode::Edit(id) => {
            let patch = form.to_patch(&Local)?;
            api.update_stay(id, &patch).await?;
            info!(id, "stay updated");
            Ok("Estadia atualizada com sucesso!")
        }
    }
}
