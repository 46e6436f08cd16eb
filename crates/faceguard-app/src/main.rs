//! # faceguard-app
//!
//! FaceGuard 바이너리 진입점.
//! DI 컨테이너 역할, 라이프사이클 관리, 헤드리스 페이지 호스트 위에서
//! 선택 → 캡처 → 분석 → 핸드오프 흐름을 실행한다.

mod console;
mod lifecycle;
mod page_host;

use anyhow::{anyhow, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use faceguard_core::config::AppConfig;
use faceguard_core::config_manager::ConfigManager;
use faceguard_core::error::CoreError;
use faceguard_core::models::message::TabId;
use faceguard_core::models::region::{Point, Region};
use faceguard_core::ports::capture::ViewportCapture;
use faceguard_core::ports::detection::DetectionClient;
use faceguard_core::ports::kv::KeyValueStore;
use faceguard_network::HttpDetectionClient;
use faceguard_overlay::{OverlayInput, OverlayState};
use faceguard_relay::popup::PopupDeps;
use faceguard_relay::{
    Coordinator, CoordinatorDeps, CoordinatorEvent, CoordinatorHandle, TransientUi,
};
use faceguard_storage::{HandoffStore, MemoryKeyValueStore, SqliteKeyValueStore};
use faceguard_vision::{FileCapture, RegionProcessor, ScreenCapture};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::lifecycle::LifecycleManager;
use crate::page_host::HeadlessPageHost;

/// 핸드오프 DB 파일 이름
const DB_FILE_NAME: &str = "faceguard.db";

/// 취소 메시지가 팝업에 도달하기를 기다리는 시간
const POPUP_RELAY_WAIT: Duration = Duration::from_secs(1);

/// FaceGuard 클라이언트
///
/// 화면의 얼굴 영역을 선택해 딥페이크 탐지 서비스로 분석한다
#[derive(Parser, Debug)]
#[command(name = "faceguard")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info", global = true)]
    log_level: String,

    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리의 config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 탐지 서비스 엔드포인트
    #[arg(long, short = 'e', global = true)]
    endpoint: Option<String>,

    /// 이미지 멀티파트 필드 이름 (file / image)
    #[arg(long, global = true)]
    field_name: Option<String>,

    /// 데이터 저장 경로 (핸드오프 DB)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// 인메모리 저장소 사용 (프로세스 종료 시 핸드오프 소멸)
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 오버레이로 얼굴 영역을 선택해 분석
    Select(SelectArgs),
    /// 팝업을 열어 최근 결과 표시
    Results,
    /// 이미지 파일을 팝업에서 직접 분석
    Analyze(AnalyzeArgs),
}

#[derive(clap::Args, Debug)]
struct SelectArgs {
    /// 뷰포트 대신 사용할 스크린샷 파일 (없으면 주 모니터 캡처)
    #[arg(long)]
    screenshot: Option<PathBuf>,

    /// 드래그 시작점 (x,y)
    #[arg(long, value_parser = parse_point)]
    from: Point,

    /// 드래그 끝점 (x,y)
    #[arg(long, value_parser = parse_point)]
    to: Point,

    /// 확인 대화상자에서 취소
    #[arg(long)]
    cancel: bool,

    /// 확정 전에 팝업 닫기 (결과는 다음 팝업에서 표시)
    #[arg(long)]
    close_popup: bool,

    /// 활성 탭 번호
    #[arg(long, default_value = "1")]
    tab: u32,
}

#[derive(clap::Args, Debug)]
struct AnalyzeArgs {
    /// 분석할 이미지 파일
    image: PathBuf,

    /// 잘라낼 영역 (x,y,w,h), 없으면 이미지 전체
    #[arg(long, value_parser = parse_region)]
    region: Option<Region>,
}

fn parse_coord(s: &str) -> Result<i32, String> {
    s.trim()
        .parse::<i32>()
        .map_err(|e| format!("좌표 파싱 실패 '{s}': {e}"))
}

/// `x,y` 형식의 좌표 파싱
fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("x,y 형식이 아님: {s}"))?;
    Ok(Point::new(parse_coord(x)?, parse_coord(y)?))
}

/// `x,y,w,h` 형식의 영역 파싱
fn parse_region(s: &str) -> Result<Region, String> {
    let parts: Vec<&str> = s.split(',').collect();
    let [x, y, w, h] = parts.as_slice() else {
        return Err(format!("x,y,w,h 형식이 아님: {s}"));
    };
    let dim = |v: &str| {
        v.trim()
            .parse::<u32>()
            .map_err(|e| format!("크기 파싱 실패 '{v}': {e}"))
    };
    Ok(Region {
        x: parse_coord(x)?,
        y: parse_coord(y)?,
        width: dim(w)?,
        height: dim(h)?,
    })
}

/// 데이터베이스 경로 결정 (CLI 인자 → 설정 → 플랫폼 데이터 디렉토리)
///
/// # 플랫폼별 기본 경로:
/// - macOS: `~/Library/Application Support/dev.faceguard.faceguard/faceguard.db`
/// - Windows: `%APPDATA%\faceguard\faceguard\data\faceguard.db`
/// - Linux: `~/.local/share/faceguard/faceguard.db`
fn resolve_db_path(data_dir: Option<&Path>, config: &AppConfig) -> Result<PathBuf, CoreError> {
    if let Some(dir) = data_dir {
        return Ok(dir.join(DB_FILE_NAME));
    }
    if let Some(path) = &config.storage.db_path {
        return Ok(path.clone());
    }
    Ok(ConfigManager::data_dir()?.join(DB_FILE_NAME))
}

/// 설정 로드 + CLI 오버라이드 (파일에는 저장하지 않음)
fn load_config(args: &Args) -> Result<AppConfig> {
    let manager = match &args.config {
        Some(path) => ConfigManager::with_path(path.clone())?,
        None => ConfigManager::new()?,
    };
    debug!("설정 파일: {}", manager.config_path().display());

    let mut config = manager.get();
    if let Some(endpoint) = &args.endpoint {
        config.detection.endpoint = endpoint.clone();
    }
    if let Some(field_name) = &args.field_name {
        config.detection.field_name = field_name.clone();
    }
    Ok(config)
}

/// 키-값 저장소 생성
fn open_store(args: &Args, config: &AppConfig) -> Result<Arc<dyn KeyValueStore>> {
    if args.ephemeral {
        info!("인메모리 저장소 사용");
        return Ok(Arc::new(MemoryKeyValueStore::new()));
    }

    let db_path = resolve_db_path(args.data_dir.as_deref(), config)?;
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    info!("핸드오프 DB: {}", db_path.display());
    Ok(Arc::new(SqliteKeyValueStore::open(&db_path)?))
}

/// 실행 중인 앱 구성 요소
struct App {
    config: AppConfig,
    pages: Arc<HeadlessPageHost>,
    popup_deps: PopupDeps,
    coordinator: CoordinatorHandle,
}

impl App {
    /// 팝업 열기 (신선한 핸드오프 결과 소비)
    async fn open_popup(&self) -> TransientUi {
        TransientUi::open(self.popup_deps.clone(), self.coordinator.connect_popup()).await
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_filter = [
        "faceguard",
        "faceguard_app",
        "faceguard_core",
        "faceguard_overlay",
        "faceguard_vision",
        "faceguard_network",
        "faceguard_storage",
        "faceguard_relay",
    ]
    .iter()
    .map(|target| format!("{target}={}", args.log_level))
    .collect::<Vec<_>>()
    .join(",");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    let config = load_config(&args)?;
    console::print_banner(&config.detection.endpoint);
    info!("FaceGuard 시작");

    // ── 어댑터 생성 (DI 와이어링) ──

    let kv = open_store(&args, &config)?;
    let handoff = HandoffStore::new(kv, &config.handoff);
    let detection: Arc<dyn DetectionClient> = Arc::new(HttpDetectionClient::new(&config.detection)?);

    let (capture, tab): (Arc<dyn ViewportCapture>, TabId) = match &args.command {
        Command::Select(select) => {
            let capture: Arc<dyn ViewportCapture> = match &select.screenshot {
                Some(path) => Arc::new(FileCapture::new(path.clone())),
                None => Arc::new(ScreenCapture::new()),
            };
            (capture, TabId(select.tab))
        }
        _ => {
            let capture: Arc<dyn ViewportCapture> = Arc::new(ScreenCapture::new());
            (capture, TabId(1))
        }
    };

    let pages = Arc::new(HeadlessPageHost::new(
        Some(tab),
        config.selection.min_dimension,
    ));

    let lifecycle = Arc::new(LifecycleManager::new());
    let coordinator = Coordinator::new(
        CoordinatorDeps {
            capture,
            detection: detection.clone(),
            pages: pages.clone(),
            handoff: handoff.clone(),
        },
        config.capture.format,
    )
    .spawn(lifecycle.subscribe());
    pages.connect(coordinator.runtime());

    let popup_deps = PopupDeps {
        pages: pages.clone(),
        detection,
        handoff,
        real_label: config.detection.real_label.clone(),
    };

    // OS 시그널 대기
    let signal_lifecycle = lifecycle.clone();
    tokio::spawn(async move {
        signal_lifecycle.wait_for_signal().await;
    });

    let app = App {
        config,
        pages,
        popup_deps,
        coordinator,
    };

    let run = match args.command {
        Command::Select(select) => run_select(&app, select, lifecycle.subscribe()).await,
        Command::Results => run_results(&app).await,
        Command::Analyze(analyze) => run_analyze(&app, analyze).await,
    };

    lifecycle.shutdown();
    app.coordinator.join().await?;
    info!("FaceGuard 종료");
    run
}

/// 한 번의 선택 세션 실행
async fn run_select(
    app: &App,
    select: SelectArgs,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let mut events = app.coordinator.subscribe();
    let mut ui = app.open_popup().await;
    let started = ui.start_selection().await?;
    console::print_popup(&ui);
    let Some(tab) = started else {
        return Ok(());
    };
    let mut popup = Some(ui);

    app.pages
        .dispatch(tab, OverlayInput::PointerDown(select.from))?;
    app.pages
        .dispatch(tab, OverlayInput::PointerMove(select.to))?;
    match app.pages.dispatch(tab, OverlayInput::PointerUp(select.to)) {
        Ok(state) => debug!("드래그 완료: {state:?}"),
        Err(CoreError::MinimumSize { .. }) => {
            if let Some(notice) = app.pages.overlay_notice(tab) {
                console::print_notice(&notice);
            }
            if let Some(ui) = popup.as_mut() {
                ui.stop_selection().await?;
                console::print_popup(ui);
            }
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    if select.close_popup {
        info!("팝업 닫힘: 결과는 다음 팝업에서 표시");
        popup = None;
    }

    let input = if select.cancel {
        OverlayInput::Cancel
    } else {
        OverlayInput::Confirm
    };
    let state = app.pages.dispatch(tab, input)?;

    if state == OverlayState::Cancelled {
        println!("선택이 취소되었습니다.");
        if let Some(ui) = popup.as_mut() {
            if tokio::time::timeout(POPUP_RELAY_WAIT, ui.next_message())
                .await
                .is_err()
            {
                debug!("팝업으로 전달된 취소 메시지 없음");
            }
            console::print_popup(ui);
        }
        return Ok(());
    }

    let terminal = tokio::select! {
        event = wait_for_terminal(&mut events) => event,
        _ = shutdown.changed() => {
            warn!("세션 완료 전 종료 요청");
            None
        }
    };

    match terminal {
        Some(CoordinatorEvent::Failed { reason, .. }) => println!("❌ 세션 실패: {reason}"),
        Some(CoordinatorEvent::Cancelled { .. }) => println!("세션이 취소되었습니다."),
        Some(_) => {}
        None => return Ok(()),
    }

    console::print_toasts(&app.pages.visible_toasts_at(Utc::now()));

    match popup.as_mut() {
        Some(ui) => {
            ui.drain_messages().await;
            console::print_popup(ui);
        }
        None => {
            let reopened = app.open_popup().await;
            console::print_popup(&reopened);
        }
    }
    Ok(())
}

/// 세션 종료 이벤트까지 진행 상황 출력
async fn wait_for_terminal(
    events: &mut broadcast::Receiver<CoordinatorEvent>,
) -> Option<CoordinatorEvent> {
    loop {
        match events.recv().await {
            Ok(event) => {
                match &event {
                    CoordinatorEvent::SessionStarted { tab, region, .. } => println!(
                        "📐 {tab}: {}x{} @ ({}, {})",
                        region.width, region.height, region.x, region.y
                    ),
                    CoordinatorEvent::Captured { bytes, .. } => {
                        println!("📸 뷰포트 캡처 완료 ({bytes} bytes)")
                    }
                    CoordinatorEvent::Submitted { .. } => println!("⏳ Analyzing for deepfakes..."),
                    _ => {}
                }
                if event.is_terminal() {
                    return Some(event);
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("코디네이터 이벤트 {skipped}개 누락");
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}

/// 팝업을 열어 최근 결과 표시
async fn run_results(app: &App) -> Result<()> {
    let ui = app.open_popup().await;
    console::print_popup(&ui);
    Ok(())
}

/// 팝업의 직접 분석 (핸드오프 기록 없음)
async fn run_analyze(app: &App, analyze: AnalyzeArgs) -> Result<()> {
    let bytes = tokio::fs::read(&analyze.image)
        .await
        .map_err(|e| anyhow!("이미지 읽기 실패 {}: {e}", analyze.image.display()))?;
    let image = faceguard_vision::crop::decode(&bytes)?;
    let region = analyze.region.unwrap_or(Region {
        x: 0,
        y: 0,
        width: image.width(),
        height: image.height(),
    });
    let payload = RegionProcessor::new().process_image(&image, region, Utc::now())?;

    let mut ui = app.open_popup().await;
    ui.set_selection(payload);
    if ui.analyze_selected().await.is_none() {
        warn!(endpoint = %app.config.detection.endpoint, "직접 분석 실패");
    }
    console::print_popup(&ui);
    Ok(())
}
