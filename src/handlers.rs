use crate::api::ApiError;
use crate::errors::AppError;
use crate::filters::{StayFilter, VehicleFilter};
use crate::forms::{self, StayForm, VehicleForm};
use crate::models::{DashboardSummary, DateRange, Report, ServiceStatus};
use crate::state::{AppState, Section, Selection, Session, Toast};
use crate::stats::{build_report, default_report_range, summarize};
use crate::ui;
use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use chrono::{Local, NaiveDate, Utc};
use serde::Deserialize;
use tracing::{error, info, warn};

type Page = Result<Html<String>, AppError>;

fn render(state: &AppState, session: &mut Session, modal: Option<String>) -> Page {
    let body = ui::render_section(session, state.config.capacity, Utc::now())?;
    let toasts = session.take_toasts();
    Ok(Html(ui::render_page(session.section, toasts, body, modal)?))
}

pub async fn dashboard(State(state): State<AppState>) -> Page {
    let _loading = state.begin_loading();
    state.session.lock().await.enter(Section::Dashboard);

    let loaded = tokio::try_join!(state.api.fetch_vehicles(), state.api.fetch_stays(None));

    let mut session = state.session.lock().await;
    match loaded {
        Ok((vehicles, stays)) => {
            session.vehicles = vehicles;
            session.stays = stays;
        }
        Err(err) => {
            error!("failed to load dashboard data: {err}");
            session.push_toast(Toast::error("Erro ao carregar dados do dashboard"));
        }
    }
    render(&state, &mut session, None)
}

pub async fn vehicles(State(state): State<AppState>) -> Page {
    load_collections(state, Section::Vehicles, "Erro ao carregar veículos").await
}

pub async fn stays(State(state): State<AppState>) -> Page {
    load_collections(state, Section::Stays, "Erro ao carregar estadias").await
}

// Both grids show data from the other collection, so each list loader
// refreshes vehicles and stays together.
async fn load_collections(state: AppState, section: Section, failure: &str) -> Page {
    let _loading = state.begin_loading();
    state.session.lock().await.enter(section);

    let loaded = tokio::try_join!(state.api.fetch_vehicles(), state.api.fetch_stays(None));

    let mut session = state.session.lock().await;
    match loaded {
        Ok((vehicles, stays)) => {
            session.vehicles = vehicles;
            session.stays = stays;
        }
        Err(err) => {
            error!("failed to load {}: {err}", section.label());
            session.push_toast(Toast::error(failure));
        }
    }
    render(&state, &mut session, None)
}

pub async fn filter_vehicles(State(state): State<AppState>, Query(filter): Query<VehicleFilter>) -> Page {
    let mut session = state.session.lock().await;
    session.section = Section::Vehicles;
    session.vehicle_filter = filter;
    render(&state, &mut session, None)
}

pub async fn filter_stays(State(state): State<AppState>, Query(filter): Query<StayFilter>) -> Page {
    let mut session = state.session.lock().await;
    session.section = Section::Stays;
    session.stay_filter = filter;
    render(&state, &mut session, None)
}

pub async fn new_vehicle(State(state): State<AppState>) -> Page {
    let mut session = state.session.lock().await;
    let modal = ui::render_vehicle_form(VehicleForm::default(), &session.vehicles, session.section.path())?;
    render(&state, &mut session, Some(modal))
}

pub async fn edit_vehicle(State(state): State<AppState>, Path(plate): Path<String>) -> Page {
    let _loading = state.begin_loading();
    let fetched = state.api.fetch_vehicle(&plate).await;

    let mut session = state.session.lock().await;
    match fetched {
        Ok(vehicle) => {
            let modal = ui::render_vehicle_form(VehicleForm::edit(&vehicle), &session.vehicles, session.section.path())?;
            render(&state, &mut session, Some(modal))
        }
        Err(err) => {
            error!("failed to load vehicle {plate}: {err}");
            session.push_toast(Toast::error("Erro ao carregar dados do veículo"));
            render(&state, &mut session, None)
        }
    }
}

pub async fn vehicle_details(State(state): State<AppState>, Path(plate): Path<String>) -> Page {
    let _loading = state.begin_loading();
    let fetched = state.api.fetch_vehicle(&plate).await;

    let mut session = state.session.lock().await;
    match fetched {
        Ok(vehicle) => {
            session.selected = Some(Selection::Vehicle(vehicle.plate.clone()));
            let modal = ui::render_vehicle_details(&vehicle, &session.stays, Utc::now(), session.section.path())?;
            render(&state, &mut session, Some(modal))
        }
        Err(err) => {
            error!("failed to load vehicle {plate}: {err}");
            session.push_toast(Toast::error("Erro ao carregar detalhes do veículo"));
            render(&state, &mut session, None)
        }
    }
}

pub async fn save_vehicle(State(state): State<AppState>, Form(form): Form<VehicleForm>) -> Result<Response, AppError> {
    let _loading = state.begin_loading();
    let result = forms::submit_vehicle(&state.api, &form).await;

    let mut session = state.session.lock().await;
    match result {
        Ok(message) => {
            session.push_toast(Toast::success(message));
            Ok(Redirect::to(session.section.path()).into_response())
        }
        Err(err) => {
            error!("failed to save vehicle: {err}");
            session.push_toast(Toast::error(err.to_string()));
            let modal = ui::render_vehicle_form(form, &session.vehicles, session.section.path())?;
            Ok(render(&state, &mut session, Some(modal))?.into_response())
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NewStayQuery {
    #[serde(default)]
    pub placa: Option<String>,
}

pub async fn new_stay(State(state): State<AppState>, Query(query): Query<NewStayQuery>) -> Page {
    let mut session = state.session.lock().await;
    let plate = query.placa.unwrap_or_default();
    let form = StayForm::create(&plate, None, Utc::now());
    let modal = ui::render_stay_form(form, &session.vehicles, session.section.path())?;
    render(&state, &mut session, Some(modal))
}

fn stay_lookup_message(err: &ApiError, fallback: &str) -> String {
    match err {
        ApiError::NotFound(message) => message.clone(),
        _ => fallback.to_string(),
    }
}

pub async fn edit_stay(State(state): State<AppState>, Path(id): Path<i64>) -> Page {
    let _loading = state.begin_loading();
    let fetched = state.api.fetch_stay(id).await;

    let mut session = state.session.lock().await;
    match fetched {
        Ok(stay) => {
            let modal = ui::render_stay_form(StayForm::edit(&stay), &session.vehicles, session.section.path())?;
            render(&state, &mut session, Some(modal))
        }
        Err(err) => {
            error!("failed to load stay {id}: {err}");
            session.push_toast(Toast::error(stay_lookup_message(&err, "Erro ao carregar dados da estadia")));
            render(&state, &mut session, None)
        }
    }
}

pub async fn stay_details(State(state): State<AppState>, Path(id): Path<i64>) -> Page {
    let _loading = state.begin_loading();
    let fetched = state.api.fetch_stay(id).await;

    let mut session = state.session.lock().await;
    match fetched {
        Ok(stay) => {
            session.selected = Some(Selection::Stay(stay.id));
            let vehicle = session.vehicle(&stay.plate);
            let modal = ui::render_stay_details(&stay, vehicle, Utc::now(), session.section.path())?;
            render(&state, &mut session, Some(modal))
        }
        Err(err) => {
            error!("failed to load stay {id}: {err}");
            session.push_toast(Toast::error(stay_lookup_message(&err, "Erro ao carregar detalhes da estadia")));
            render(&state, &mut session, None)
        }
    }
}

pub async fn save_stay(State(state): State<AppState>, Form(form): Form<StayForm>) -> Result<Response, AppError> {
    let _loading = state.begin_loading();
    let result = forms::submit_stay(&state.api, &form, Utc::now()).await;

    let mut session = state.session.lock().await;
    match result {
        Ok(message) => {
            session.push_toast(Toast::success(message));
            Ok(Redirect::to(session.section.path()).into_response())
        }
        Err(err) => {
            error!("failed to save stay: {err}");
            session.push_toast(Toast::error(err.to_string()));
            let modal = ui::render_stay_form(form, &session.vehicles, session.section.path())?;
            Ok(render(&state, &mut session, Some(modal))?.into_response())
        }
    }
}

pub async fn finish_stay(State(state): State<AppState>, Path(id): Path<i64>) -> Redirect {
    let _loading = state.begin_loading();
    let result = state.api.finish_stay(id, Utc::now()).await;

    let mut session = state.session.lock().await;
    match result {
        Ok(stay) => {
            info!(id, plate = %stay.plate, "stay finished");
            session.refresh_stay(&stay);
            session.push_toast(Toast::success("Saída registrada com sucesso!"));
            Redirect::to(&session.return_path(&stay))
        }
        Err(err) => {
            error!("failed to finish stay {id}: {err}");
            session.push_toast(Toast::error(err.to_string()));
            Redirect::to(session.section.path())
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

impl ReportQuery {
    pub fn range(&self, today: NaiveDate) -> Result<DateRange, &'static str> {
        let (from, to) = match (self.from.as_deref(), self.to.as_deref()) {
            (None, None) => return Ok(default_report_range(today)),
            (Some(from), Some(to)) if !from.trim().is_empty() && !to.trim().is_empty() => (from, to),
            _ => return Err("Selecione o período para o relatório"),
        };
        let parse = |value: &str| NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d");
        let (Ok(from), Ok(to)) = (parse(from), parse(to)) else {
            return Err("Data inválida para o relatório");
        };
        DateRange::new(from, to).ok_or("A data inicial deve ser anterior à data final")
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub async fn reports(State(state): State<AppState>, Query(query): Query<ReportQuery>) -> Page {
    let _loading = state.begin_loading();
    state.session.lock().await.enter(Section::Reports);

    let range = match query.range(today()) {
        Ok(range) => range,
        Err(message) => {
            let mut session = state.session.lock().await;
            session.push_toast(Toast::warning(message));
            return render(&state, &mut session, None);
        }
    };

    let loaded = tokio::try_join!(state.api.fetch_stays(Some(&range)), state.api.fetch_vehicles());

    let mut session = state.session.lock().await;
    let report = match loaded {
        Ok((stays, vehicles)) => {
            session.vehicles = vehicles;
            build_report(&stays, &session.vehicles, range, false)
        }
        Err(err) => {
            error!("failed to generate report: {err}");
            warn!("building report from {} cached stays", session.stays.len());
            session.push_toast(Toast::error("Erro ao gerar relatório"));
            build_report(&session.stays, &session.vehicles, range, true)
        }
    };
    session.last_report = Some(report);
    render(&state, &mut session, None)
}

pub async fn api_summary(State(state): State<AppState>) -> Result<Json<DashboardSummary>, AppError> {
    let stays = state.api.fetch_stays(None).await?;
    Ok(Json(summarize(&stays, state.config.capacity)))
}

pub async fn api_status(State(state): State<AppState>) -> Json<ServiceStatus> {
    Json(ServiceStatus {
        api_url: state.api.base_url().to_string(),
        capacity: state.config.capacity,
        loading: state.is_loading(),
    })
}

pub async fn api_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Report>, AppError> {
    let range = query.range(today()).map_err(AppError::bad_request)?;
    let (stays, vehicles) = tokio::try_join!(state.api.fetch_stays(Some(&range)), state.api.fetch_vehicles())?;
    Ok(Json(build_report(&stays, &vehicles, range, false)))
}
