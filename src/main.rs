use chrono::Local;
use color_eyre::Result;
use inputaxis::controller::{GilrsBackend, NullBackend};
use inputaxis::{
    AxisBinding, ControllerBackend, Input, InputEvent, InputSettings, KeyCode,
    MouseButton, ScanOutcome,
};
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let settings = InputSettings::load_or_create(&InputSettings::default_path()).await?;
    let frame_interval_ms = settings.frame_interval_ms;
    let log_active_axes = settings.log_active_axes;

    let backend: Box<dyn ControllerBackend> = match GilrsBackend::new() {
        Ok(backend) => Box::new(backend),
        Err(e) => {
            warn!("Gamepad support unavailable, continuing without: {}", e);
            Box::new(NullBackend)
        }
    };

    let mut input = Input::new(settings, backend);
    input.register_bindings(demo_bindings()?)?;

    // No window in the demo; treat the terminal as focused
    input.event_sender().send(InputEvent::FocusGained);

    info!("Starting frame loop with {}ms interval", frame_interval_ms);
    let mut interval_timer =
        tokio::time::interval(tokio::time::Duration::from_millis(frame_interval_ms));

    let mut frames: u64 = 0;
    let mut last_active: Vec<String> = Vec::new();
    let mut last_stats_time = Local::now();
    let stats_interval = chrono::Duration::seconds(30);

    loop {
        tokio::select! {
            _ = interval_timer.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested, stopping frame loop");
                break;
            }
        }

        let report = input.update();
        frames += 1;
        if let Some(ScanOutcome::Detected(name)) = &report.scan {
            debug!("Frame {}: now using {}", frames, name);
        }

        for axis in ["Jump", "Fire"] {
            if input.was_just_activated(axis) {
                info!("{} tapped", axis);
            }
        }

        let active = input.active_axis_names();
        if log_active_axes && active != last_active {
            info!(
                "Active axes: {:?} (throttle {:.2})",
                active,
                input.value("Throttle")
            );
            last_active = active;
        }

        let now = Local::now();
        if now - last_stats_time > stats_interval {
            let elapsed_seconds = (now - last_stats_time).num_seconds().max(1);
            info!(
                "Frame stats: {} frames in {} seconds ({:.2} fps), controller: {}",
                frames,
                elapsed_seconds,
                frames as f64 / elapsed_seconds as f64,
                input.controller_name().unwrap_or("none")
            );
            frames = 0;
            last_stats_time = now;
        }
    }

    Ok(())
}

fn demo_bindings() -> Result<Vec<AxisBinding>> {
    Ok(vec![
        AxisBinding::builder("Jump")
            .key(KeyCode::SPACE)
            .component_names(["Button.South"], 0.5)?
            .build()?,
        AxisBinding::builder("Fire")
            .mouse(MouseButton::LEFT)
            .component_names(["Button.RightTrigger", "Axis.RZ"], 0.5)?
            .build()?,
        AxisBinding::builder("MoveRight")
            .key(KeyCode::D)
            .component_names(["Axis.LeftStickX", "Axis.DPadX"], 0.5)?
            .build()?,
        AxisBinding::builder("MoveLeft")
            .key(KeyCode::A)
            .component_names(["Axis.LeftStickX", "Axis.DPadX"], -0.5)?
            .build()?,
        AxisBinding::builder("Throttle")
            .component_names(["Button.RightTrigger2"], 0.1)?
            .build()?,
    ])
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
