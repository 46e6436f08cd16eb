//! 터미널 출력.
//!
//! 팝업 상태 줄, 결과 패널, 페이지 토스트를 콘솔에 그린다.

use faceguard_relay::{StatusKind, TransientUi};

use crate::page_host::Toast;

/// 배너 출력
pub fn print_banner(endpoint: &str) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                                                              ║");
    println!("║                 F A C E G U A R D                            ║");
    println!("║           얼굴 영역 딥페이크 탐지 클라이언트                 ║");
    println!("║                                                              ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!("   탐지 서비스: {endpoint}");
    println!();
}

fn status_icon(kind: StatusKind) -> &'static str {
    match kind {
        StatusKind::Info => "ℹ️ ",
        StatusKind::Loading => "⏳",
        StatusKind::Success => "✅",
        StatusKind::Warning => "⚠️ ",
        StatusKind::Error => "❌",
    }
}

/// 팝업 상태와 결과 패널 출력
pub fn print_popup(ui: &TransientUi) {
    let status = ui.status();
    let controls = ui.controls();

    println!("┌─────────────────────────────────────────────────────────────┐");
    println!("│ {} {}", status_icon(status.kind), status.text);
    println!(
        "│ [Start: {}] [Stop: {}]",
        on_off(controls.start_enabled),
        on_off(controls.stop_enabled)
    );

    if let Some(results) = ui.results() {
        println!("├─────────────────────────────────────────────────────────────┤");
        for line in results.lines() {
            println!("│ {line}");
        }
    }
    println!("└─────────────────────────────────────────────────────────────┘");
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

/// 페이지 토스트 출력
pub fn print_toasts(toasts: &[Toast]) {
    for toast in toasts {
        println!("🔔 [{}] {}", toast.tab, toast.text);
    }
}

/// 오버레이 안내 문구 출력
pub fn print_notice(notice: &str) {
    println!("⚠️  {notice}");
}
