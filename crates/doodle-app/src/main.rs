//! Main application entry point (native).

#[cfg(feature = "native")]
fn main() {
    env_logger::init();
    log::info!("Starting Doodle Recognizer");

    // A missing or broken model leaves nothing to run.
    if let Err(e) = doodle_app::run() {
        log::error!("{}", e);
        eprintln!("doodle-recognizer: {e}");
        std::process::exit(1);
    }
}

#[cfg(not(feature = "native"))]
fn main() {
    panic!("Native feature not enabled. Use `cargo run --features native`");
}
