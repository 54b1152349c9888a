use crate::filters::{filter_stays, filter_vehicles, vehicle_kinds, StayFilter, VehicleFilter};
use crate::forms::{StayForm, VehicleForm};
use crate::models::{DashboardSummary, Report, Stay, Vehicle};
use crate::state::{Section, Session, Toast};
use crate::stats::{
    build_report, default_report_range, duration_label, format_currency, format_date_time, is_active, summarize_at,
};
use askama::Template;
use chrono::{DateTime, Local, Utc};

const KNOWN_KINDS: [&str; 4] = ["carro", "moto", "caminhonete", "van"];

pub struct NavLink {
    pub href: &'static str,
    pub label: &'static str,
    pub active: bool,
}

pub struct ToastView {
    pub class: String,
    pub icon: &'static str,
    pub message: String,
}

pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "page.html")]
pub struct PageTemplate {
    pub title: String,
    pub nav: Vec<NavLink>,
    pub toasts: Vec<ToastView>,
    pub body: String,
    pub modal: String,
    pub close_href: &'static str,
}

pub struct ActivityView {
    pub title: String,
    pub subtitle: String,
    pub time: String,
    pub href: String,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub active_count: usize,
    pub today_count: usize,
    pub today_revenue: String,
    pub available_spots: usize,
    pub recent: Vec<ActivityView>,
}

pub struct VehicleCard {
    pub plate: String,
    pub kind: String,
    pub owner: String,
    pub phone: String,
    pub make_model: String,
    pub color_year: String,
    pub parked: bool,
    pub detail_href: String,
    pub edit_href: String,
    pub new_stay_href: String,
}

#[derive(Template)]
#[template(path = "vehicles.html")]
pub struct VehicleGridTemplate {
    pub q: String,
    pub kinds: Vec<SelectOption>,
    pub cards: Vec<VehicleCard>,
}

pub struct StayCard {
    pub id: i64,
    pub plate: String,
    pub owner: String,
    pub entry: String,
    pub exit: String,
    pub duration: String,
    pub rate: String,
    pub total: String,
    pub active: bool,
    pub status_label: &'static str,
    pub detail_href: String,
    pub edit_href: String,
    pub finish_action: String,
    pub confirm: String,
}

#[derive(Template)]
#[template(path = "stays.html")]
pub struct StayGridTemplate {
    pub q: String,
    pub statuses: Vec<SelectOption>,
    pub cards: Vec<StayCard>,
}

pub struct ReportRowView {
    pub plate: String,
    pub owner: String,
    pub kind: String,
    pub entry: String,
    pub exit: String,
    pub duration: String,
    pub total: String,
}

#[derive(Template)]
#[template(path = "report.html")]
pub struct ReportTemplate {
    pub from: String,
    pub to: String,
    pub total_stays: usize,
    pub revenue: String,
    pub average: String,
    pub from_cache: bool,
    pub rows: Vec<ReportRowView>,
}

#[derive(Template)]
#[template(path = "vehicle_form.html")]
pub struct VehicleFormTemplate {
    pub title: &'static str,
    pub editing: bool,
    pub form: VehicleForm,
    pub kinds: Vec<SelectOption>,
    pub close_href: &'static str,
}

#[derive(Template)]
#[template(path = "stay_form.html")]
pub struct StayFormTemplate {
    pub title: &'static str,
    pub editing: bool,
    pub form: StayForm,
    pub plates: Vec<String>,
    pub close_href: &'static str,
}

#[derive(Template)]
#[template(path = "vehicle_details.html")]
pub struct VehicleDetailsTemplate {
    pub vehicle: Vehicle,
    pub year: String,
    pub current: Vec<StayCard>,
    pub stay_count: usize,
    pub edit_href: String,
    pub new_stay_href: String,
    pub close_href: &'static str,
}

#[derive(Template)]
#[template(path = "stay_details.html")]
pub struct StayDetailsTemplate {
    pub card: StayCard,
    pub phone: String,
    pub vehicle: String,
    pub close_href: &'static str,
}

fn title_case(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn or_dash(value: &str) -> String {
    if value.trim().is_empty() {
        "—".to_string()
    } else {
        value.to_string()
    }
}

fn kind_options(vehicles: &[Vehicle], include_known: bool, selected: &str) -> Vec<SelectOption> {
    let mut kinds: Vec<String> = if include_known {
        KNOWN_KINDS.iter().map(|kind| kind.to_string()).collect()
    } else {
        Vec::new()
    };
    for kind in vehicle_kinds(vehicles) {
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    kinds
        .into_iter()
        .map(|kind| SelectOption {
            label: title_case(&kind),
            selected: kind == selected,
            value: kind,
        })
        .collect()
}

fn exit_label(stay: &Stay) -> String {
    match stay.exit {
        Some(_) => format_date_time(stay.exit),
        None => "Em andamento".to_string(),
    }
}

fn total_label(stay: &Stay) -> String {
    match stay.total {
        Some(total) => format_currency(total),
        None => "Calculando...".to_string(),
    }
}

pub fn stay_card(stay: &Stay, vehicle: Option<&Vehicle>, now: DateTime<Utc>) -> StayCard {
    let active = is_active(stay, now);
    let id = stay.id;
    StayCard {
        id,
        plate: stay.plate.clone(),
        owner: vehicle.map(|v| or_dash(&v.owner)).unwrap_or_else(|| "—".to_string()),
        entry: format_date_time(stay.entry),
        exit: exit_label(stay),
        duration: duration_label(stay.entry, stay.exit, now),
        rate: format_currency(stay.hourly_rate.unwrap_or(0.0)),
        total: total_label(stay),
        active,
        status_label: if active { "Ativo" } else { "Finalizado" },
        detail_href: format!("/stays/{id}"),
        edit_href: format!("/stays/{id}/edit"),
        finish_action: format!("/stays/{id}/finish"),
        confirm: format!("Confirma a saída do veículo {}?", stay.plate),
    }
}

pub fn toast_views(toasts: Vec<Toast>) -> Vec<ToastView> {
    toasts
        .into_iter()
        .map(|toast| ToastView {
            class: format!("toast toast-{}", toast.kind.as_str()),
            icon: toast.kind.icon(),
            message: toast.message,
        })
        .collect()
}

pub fn render_page(section: Section, toasts: Vec<Toast>, body: String, modal: Option<String>) -> Result<String, askama::Error> {
    PageTemplate {
        title: format!("{} · Estacionamento", section.label()),
        nav: Section::ALL
            .iter()
            .map(|item| NavLink {
                href: item.path(),
                label: item.label(),
                active: *item == section,
            })
            .collect(),
        toasts: toast_views(toasts),
        body,
        modal: modal.unwrap_or_default(),
        close_href: section.path(),
    }
    .render()
}

pub fn render_dashboard(summary: &DashboardSummary, vehicles: &[Vehicle]) -> Result<String, askama::Error> {
    let recent = summary
        .recent
        .iter()
        .map(|stay| {
            let vehicle = vehicles.iter().find(|vehicle| vehicle.plate == stay.plate);
            let (title, subtitle) = match vehicle {
                Some(vehicle) => (
                    format!("{} - {}", stay.plate, vehicle.owner),
                    format!("{} {} ({})", vehicle.make, vehicle.model, vehicle.kind),
                ),
                None => (stay.plate.clone(), "Veículo não cadastrado".to_string()),
            };
            ActivityView {
                title,
                subtitle,
                time: format_date_time(stay.entry),
                href: format!("/stays/{}", stay.id),
            }
        })
        .collect();

    DashboardTemplate {
        active_count: summary.active_count,
        today_count: summary.today_count,
        today_revenue: format_currency(summary.today_revenue),
        available_spots: summary.available_spots,
        recent,
    }
    .render()
}

pub fn render_vehicle_grid(
    vehicles: &[Vehicle],
    stays: &[Stay],
    filter: &VehicleFilter,
    now: DateTime<Utc>,
) -> Result<String, askama::Error> {
    let cards = filter_vehicles(vehicles, filter)
        .into_iter()
        .map(|vehicle| {
            let plate = urlencoding::encode(&vehicle.plate);
            VehicleCard {
                plate: vehicle.plate.clone(),
                kind: title_case(&vehicle.kind),
                owner: or_dash(&vehicle.owner),
                phone: or_dash(&vehicle.phone),
                make_model: or_dash(format!("{} {}", vehicle.make, vehicle.model).trim()),
                color_year: match vehicle.year {
                    Some(year) => format!("{} · {year}", or_dash(&vehicle.color)),
                    None => or_dash(&vehicle.color),
                },
                parked: stays
                    .iter()
                    .any(|stay| stay.plate == vehicle.plate && is_active(stay, now)),
                detail_href: format!("/vehicles/{plate}"),
                edit_href: format!("/vehicles/{plate}/edit"),
                new_stay_href: format!("/stays/new?placa={plate}"),
            }
        })
        .collect();

    VehicleGridTemplate {
        q: filter.q.clone().unwrap_or_default(),
        kinds: kind_options(vehicles, false, filter.tipo.as_deref().unwrap_or_default()),
        cards,
    }
    .render()
}

pub fn render_stay_grid(
    stays: &[Stay],
    vehicles: &[Vehicle],
    filter: &StayFilter,
    now: DateTime<Utc>,
) -> Result<String, askama::Error> {
    let cards = filter_stays(stays, vehicles, filter, now)
        .into_iter()
        .map(|stay| {
            let vehicle = vehicles.iter().find(|vehicle| vehicle.plate == stay.plate);
            stay_card(stay, vehicle, now)
        })
        .collect();
    let status = filter.status.as_deref().unwrap_or_default();

    StayGridTemplate {
        q: filter.q.clone().unwrap_or_default(),
        statuses: [("ativo", "Ativas"), ("finalizado", "Finalizadas")]
            .into_iter()
            .map(|(value, label)| SelectOption {
                value: value.to_string(),
                label: label.to_string(),
                selected: value == status,
            })
            .collect(),
        cards,
    }
    .render()
}

pub fn render_report(report: &Report, now: DateTime<Utc>) -> Result<String, askama::Error> {
    let rows = report
        .rows
        .iter()
        .map(|row| ReportRowView {
            plate: row.stay.plate.clone(),
            owner: or_dash(&row.owner),
            kind: or_dash(&title_case(&row.kind)),
            entry: format_date_time(row.stay.entry),
            exit: exit_label(&row.stay),
            duration: duration_label(row.stay.entry, row.stay.exit, now),
            total: total_label(&row.stay),
        })
        .collect();

    ReportTemplate {
        from: report.range.from.format("%Y-%m-%d").to_string(),
        to: report.range.to.format("%Y-%m-%d").to_string(),
        total_stays: report.total_stays,
        revenue: format_currency(report.revenue),
        average: report.average_duration.clone(),
        from_cache: report.from_cache,
        rows,
    }
    .render()
}

pub fn render_vehicle_form(form: VehicleForm, vehicles: &[Vehicle], close_href: &'static str) -> Result<String, askama::Error> {
    let editing = !form.placa_original.trim().is_empty();
    VehicleFormTemplate {
        title: if editing { "Editar Veículo" } else { "Cadastro de Veículo" },
        editing,
        kinds: kind_options(vehicles, true, &form.tipo),
        form,
        close_href,
    }
    .render()
}

pub fn render_stay_form(form: StayForm, vehicles: &[Vehicle], close_href: &'static str) -> Result<String, askama::Error> {
    let editing = !form.id_original.trim().is_empty();
    StayFormTemplate {
        title: if editing { "Editar Estadia" } else { "Nova Estadia" },
        editing,
        form,
        plates: vehicles.iter().map(|vehicle| vehicle.plate.clone()).collect(),
        close_href,
    }
    .render()
}

pub fn render_vehicle_details(
    vehicle: &Vehicle,
    stays: &[Stay],
    now: DateTime<Utc>,
    close_href: &'static str,
) -> Result<String, askama::Error> {
    let own: Vec<&Stay> = stays.iter().filter(|stay| stay.plate == vehicle.plate).collect();
    let plate = urlencoding::encode(&vehicle.plate);
    VehicleDetailsTemplate {
        year: vehicle.year.map(|year| year.to_string()).unwrap_or_else(|| "—".to_string()),
        current: own
            .iter()
            .filter(|stay| is_active(stay, now))
            .map(|stay| stay_card(stay, Some(vehicle), now))
            .collect(),
        stay_count: own.len(),
        edit_href: format!("/vehicles/{plate}/edit"),
        new_stay_href: format!("/stays/new?placa={plate}"),
        vehicle: vehicle.clone(),
        close_href,
    }
    .render()
}

pub fn render_stay_details(
    stay: &Stay,
    vehicle: Option<&Vehicle>,
    now: DateTime<Utc>,
    close_href: &'static str,
) -> Result<String, askama::Error> {
    StayDetailsTemplate {
        card: stay_card(stay, vehicle, now),
        phone: vehicle.map(|v| or_dash(&v.phone)).unwrap_or_else(|| "—".to_string()),
        vehicle: vehicle
            .map(|v| or_dash(format!("{} {} ({})", v.make, v.model, v.kind).trim()))
            .unwrap_or_else(|| "Veículo não cadastrado".to_string()),
        close_href,
    }
    .render()
}

pub fn render_section(session: &Session, capacity: usize, now: DateTime<Utc>) -> Result<String, askama::Error> {
    match session.section {
        Section::Dashboard => {
            let summary = summarize_at(&session.stays, capacity, now, &Local);
            render_dashboard(&summary, &session.vehicles)
        }
        Section::Vehicles => render_vehicle_grid(&session.vehicles, &session.stays, &session.vehicle_filter, now),
        Section::Stays => render_stay_grid(&session.stays, &session.vehicles, &session.stay_filter, now),
        Section::Reports => match &session.last_report {
            Some(report) => render_report(report, now),
            None => {
                let range = default_report_range(now.with_timezone(&Local).date_naive());
                render_report(&build_report(&[], &[], range, false), now)
            }
        },
    }
}
