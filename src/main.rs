use tracing_subscriber::EnvFilter;
use tracing::info;
use vkyc_core::RunStatus;
use vkycflow_rust::{run_demo, write_report, AppConfig, DemoOptions, DemoReport};

fn usage() -> ! {
    eprintln!("uso: main-core run [--seed N] [--deny-camera] [--deny-location] [--step KIND] [--report PATH]");
    eprintln!("     KIND = face_liveness | face_match | handwriting | location");
    std::process::exit(2);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn print_report(report: &DemoReport) {
    println!("run {}", report.run_id);
    for snap in &report.snapshots {
        let step = snap.current
                       .as_ref()
                       .map(|v| format!("{} [{:?}] attempts={}", v.step_id, v.sub_state, v.attempts))
                       .unwrap_or_else(|| "-".into());
        println!("  {:>5.1}% {:?} {step}", snap.progress_percent, snap.status);
    }
    if let Some(last) = report.snapshots.last() {
        match serde_json::to_string_pretty(&last.ledger) {
            Ok(json) => println!("ledger:\n{json}"),
            Err(e) => eprintln!("ledger no serializable: {e}"),
        }
    }
    println!("eventos: {}", report.event_variants.join(""));
    if let Some(fp) = &report.run_fingerprint {
        println!("fingerprint: {fp}");
    }
    if !report.devices_released {
        eprintln!("[main-core] advertencia: quedaron cámaras sin liberar");
    }
}

#[tokio::main]
async fn main() {
    vkycflow_rust::config::init_dotenv();
    init_tracing();
    // CLI mínima: `main-core run [--seed N] [--deny-camera] [--deny-location] [--step KIND] [--report PATH]`
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 || args[1] != "run" {
        usage();
    }
    let opts = match DemoOptions::parse(&args[2..]) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("[main-core] {e}");
            usage();
        }
    };
    let cfg = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("[main-core] {e}");
            std::process::exit(3);
        }
    };
    info!(?opts, seed = cfg.simulation.seed, "starting demo run");
    match run_demo(&opts, &cfg).await {
        Ok(report) => {
            print_report(&report);
            if let Some(path) = &opts.report {
                if let Err(e) = write_report(&report, path) {
                    eprintln!("[main-core] {e}");
                    std::process::exit(5);
                }
            }
            let code = match report.status {
                RunStatus::Complete => 0,
                _ => 1,
            };
            std::process::exit(code);
        }
        Err(e) => {
            eprintln!("[main-core] error: {e}");
            std::process::exit(5);
        }
    }
}
