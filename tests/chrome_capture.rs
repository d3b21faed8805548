//! Runs against a real headless Chrome

#![cfg(feature = "cdp")]

use diagshot::cdp::CdpEngine;
use diagshot::runner::{self, RunOutcome};
use diagshot::{DiagramTarget, RunConfig, Viewport};

const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Diagrams</title></head>
<body>
<div id="first" style="width:200px;height:100px;background:#369"></div>
<div id="late" style="width:120px;height:80px"></div>
<script>
  setTimeout(function () {
    var svg = document.createElementNS('http://www.w3.org/2000/svg', 'svg');
    svg.setAttribute('width', '120');
    svg.setAttribute('height', '80');
    document.getElementById('late').appendChild(svg);
  }, 200);
</script>
</body>
</html>"#;

#[tokio::test]
#[ignore] // Requires Chrome to be installed
async fn captures_elements_from_local_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("page.html");
    std::fs::write(&input, PAGE).unwrap();

    let mut late = DiagramTarget::new("late", "late.png", "Late-drawn diagram");
    late.ready_selector = Some("#late svg".into());

    let cfg = RunConfig {
        input,
        output_dir: dir.path().join("images"),
        viewport: Viewport { width: 640, height: 480 },
        settle_delay_ms: 100,
        element_timeout_ms: 5000,
        sandbox: false,
        targets: vec![
            DiagramTarget::new("first", "first.png", "First diagram"),
            late,
            DiagramTarget::new("absent", "absent.png", "Absent diagram"),
        ],
        ..Default::default()
    };

    let engine_config = cfg.engine_config();
    let outcome = match runner::run(
        &cfg,
        move || CdpEngine::launch(engine_config),
        std::future::pending(),
    )
    .await
    {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Skipping: Chrome is not available or failed to launch: {}", e);
            return;
        }
    };

    let RunOutcome::Completed(summary) = outcome else {
        panic!("unexpected interrupt");
    };
    assert_eq!(summary.successes(), 2);
    assert_eq!(summary.exit_code(), 1);

    let png = std::fs::read(cfg.output_dir.join("first.png")).unwrap();
    assert_eq!(&png[0..8], b"\x89PNG\r\n\x1a\n");
    assert!(cfg.output_dir.join("late.png").exists());
    assert!(!cfg.output_dir.join("absent.png").exists());
}
