use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/vehicles")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

/// The dashboard is pointed at a port nobody listens on, so every backend
/// call fails with a connection error.
async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let backend_port = pick_free_port();
    let child = Command::new(env!("CARGO_BIN_EXE_parking_dashboard"))
        .env("PORT", port.to_string())
        .env("PARKING_API_URL", format!("http://127.0.0.1:{backend_port}"))
        .env("PARKING_CAPACITY", "40")
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn page(server: &TestServer, path: &str) -> String {
    let response = Client::new()
        .get(format!("{}{path}", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    response.text().await.unwrap()
}

#[tokio::test]
async fn dashboard_renders_with_unreachable_backend() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;

    let html = page(&server, "/").await;

    assert_eq!(html.matches("toast toast-error").count(), 1);
    assert!(html.contains("Erro ao carregar dados do dashboard"));
    assert!(html.contains("Nenhuma atividade recente"));
    assert!(html.contains(r#"id="vagas-disponiveis">40</span>"#));
    assert!(html.contains(r#"class="nav-link active" href="/""#));
}

#[tokio::test]
async fn vehicle_list_shows_placeholder_and_error() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;

    let html = page(&server, "/vehicles").await;

    assert_eq!(html.matches("toast toast-error").count(), 1);
    assert!(html.contains("Erro ao carregar veículos"));
    assert!(html.contains("Nenhum veículo encontrado"));
}

#[tokio::test]
async fn reversed_report_range_warns_before_fetching() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;

    let html = page(&server, "/reports?from=2026-10-10&to=2026-10-01").await;

    assert!(html.contains("toast toast-warning"));
    assert!(html.contains("A data inicial deve ser anterior à data final"));
    assert_eq!(html.matches("toast toast-error").count(), 0);
}

#[tokio::test]
async fn api_summary_maps_transport_failure_to_bad_gateway() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;

    let response = Client::new()
        .get(format!("{}/api/summary", server.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}
