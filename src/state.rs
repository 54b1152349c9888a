use crate::api::{ApiError, ParkingApi};
use crate::config::Config;
use crate::filters::{StayFilter, VehicleFilter};
use crate::models::{Report, Stay, Vehicle};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Clone)]
pub struct AppState {
    pub api: ParkingApi,
    pub config: Arc<Config>,
    pub session: Arc<Mutex<Session>>,
    loading: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, ApiError> {
        let api = ParkingApi::new(&config.api_base_url)?;
        Ok(Self {
            api,
            config: Arc::new(config),
            session: Arc::new(Mutex::new(Session::default())),
            loading: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Raises the loading flag until the guard drops. The flag is a plain
    /// boolean: an overlapping action that finishes first clears it.
    pub fn begin_loading(&self) -> LoadingGuard {
        self.loading.store(true, Ordering::SeqCst);
        debug!("loading started");
        LoadingGuard {
            flag: Arc::clone(&self.loading),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }
}

pub struct LoadingGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
        debug!("loading finished");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Section {
    #[default]
    Dashboard,
    Vehicles,
    Stays,
    Reports,
}

impl Section {
    pub const ALL: [Section; 4] = [Section::Dashboard, Section::Vehicles, Section::Stays, Section::Reports];

    pub fn path(self) -> &'static str {
        match self {
            Section::Dashboard => "/",
            Section::Vehicles => "/vehicles",
            Section::Stays => "/stays",
            Section::Reports => "/reports",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Section::Dashboard => "Dashboard",
            Section::Vehicles => "Veículos",
            Section::Stays => "Estadias",
            Section::Reports => "Relatórios",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Vehicle(String),
    Stay(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
}

impl ToastKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ToastKind::Success => "success",
            ToastKind::Error => "error",
            ToastKind::Warning => "warning",
            ToastKind::Info => "info",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            ToastKind::Success => "✔",
            ToastKind::Error => "✖",
            ToastKind::Warning => "⚠",
            ToastKind::Info => "ℹ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Warning,
            message: message.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Session {
    pub vehicles: Vec<Vehicle>,
    pub stays: Vec<Stay>,
    pub last_report: Option<Report>,
    pub vehicle_filter: VehicleFilter,
    pub stay_filter: StayFilter,
    pub selected: Option<Selection>,
    pub section: Section,
    toasts: Vec<Toast>,
}

impl Session {
    pub fn push_toast(&mut self, toast: Toast) {
        self.toasts.push(toast);
    }

    pub fn take_toasts(&mut self) -> Vec<Toast> {
        std::mem::take(&mut self.toasts)
    }

    pub fn vehicle(&self, plate: &str) -> Option<&Vehicle> {
        self.vehicles.iter().find(|vehicle| vehicle.plate == plate)
    }

    pub fn refresh_stay(&mut self, stay: &Stay) {
        if let Some(cached) = self.stays.iter_mut().find(|cached| cached.id == stay.id) {
            *cached = stay.clone();
        }
    }

    /// Where to land after a stay changes: the open details view when it
    /// shows that stay, otherwise the active section.
    pub fn return_path(&self, stay: &Stay) -> String {
        match &self.selected {
            Some(Selection::Stay(id)) if *id == stay.id => format!("/stays/{id}"),
            Some(Selection::Vehicle(plate)) if *plate == stay.plate => {
                format!("/vehicles/{}", urlencoding::encode(plate))
            }
            _ => self.section.path().to_string(),
        }
    }

    pub fn enter(&mut self, section: Section) {
        self.section = section;
        self.selected = None;
        match section {
            Section::Vehicles => self.vehicle_filter = VehicleFilter::default(),
            Section::Stays => self.stay_filter = StayFilter::default(),
            Section::Dashboard | Section::Reports => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState::new(Config::new("http://localhost:3001")).unwrap()
    }

    #[test]
    fn loading_flag_clears_when_guard_drops() {
        let state = state();
        {
            let _guard = state.begin_loading();
            assert!(state.is_loading());
        }
        assert!(!state.is_loading());
    }

    #[test]
    fn loading_flag_is_not_reference_counted() {
        let state = state();
        let first = state.begin_loading();
        let second = state.begin_loading();
        drop(second);
        assert!(!state.is_loading());
        drop(first);
        assert!(!state.is_loading());
    }

    #[test]
    fn toasts_are_drained_once() {
        let mut session = Session::default();
        session.push_toast(Toast::error("falhou"));
        let toasts = session.take_toasts();
        assert_eq!(toasts, vec![Toast::error("falhou")]);
        assert!(session.take_toasts().is_empty());
    }

    #[test]
    fn entering_a_section_resets_its_filter() {
        let mut session = Session::default();
        session.vehicle_filter.q = Some("abc".to_string());
        session.stay_filter.q = Some("xyz".to_string());
        session.selected = Some(Selection::Stay(3));
        session.enter(Section::Vehicles);
        assert_eq!(session.section, Section::Vehicles);
        assert!(session.selected.is_none());
        assert!(session.vehicle_filter.q.is_none());
        assert_eq!(session.stay_filter.q.as_deref(), Some("xyz"));
    }

    fn stay(id: i64, plate: &str) -> Stay {
        Stay {
            id,
            plate: plate.to_string(),
            hourly_rate: Some(5.0),
            entry: None,
            exit: None,
            total: None,
        }
    }

    #[test]
    fn return_path_follows_the_open_details() {
        let mut session = Session::default();
        session.enter(Section::Stays);
        assert_eq!(session.return_path(&stay(3, "ABC1D23")), "/stays");

        session.selected = Some(Selection::Stay(3));
        assert_eq!(session.return_path(&stay(3, "ABC1D23")), "/stays/3");
        assert_eq!(session.return_path(&stay(4, "ABC1D23")), "/stays");

        session.selected = Some(Selection::Vehicle("AB 1".to_string()));
        assert_eq!(session.return_path(&stay(4, "AB 1")), "/vehicles/AB%201");
    }

    #[test]
    fn refresh_replaces_only_the_cached_match() {
        let mut session = Session::default();
        session.stays = vec![stay(1, "AAA0001"), stay(2, "BBB0002")];
        let mut finished = stay(2, "BBB0002");
        finished.total = Some(15.0);

        session.refresh_stay(&finished);
        assert_eq!(session.stays[1].total, Some(15.0));
        assert_eq!(session.stays[0], stay(1, "AAA0001"));

        session.refresh_stay(&stay(9, "ZZZ9999"));
        assert_eq!(session.stays.len(), 2);
    }
}
