mod app;

use anyhow::Result;
use skycast_core::{AppError, Config};
use skycast_weather::{DayDetailView, Screen};

use crate::app::App;

#[tokio::main]
async fn main() -> Result<()> {
    skycast_core::init()?;

    let (config, _warnings) = match Config::load_validated() {
        Ok(loaded) => loaded,
        Err(e) => {
            match e.downcast_ref::<AppError>() {
                Some(app_err) => eprintln!("{}", app_err.user_message()),
                None => eprintln!("Failed to load configuration"),
            }
            return Err(e);
        }
    };

    let app = App::new(config)?;
    tracing::info!(
        "SkyCast started, config directory {}",
        app.config().config_dir.display()
    );

    let mut states = app.subscribe();
    let task = app.start();
    println!("{}", Screen::from_state(&app.snapshot()));

    tokio::select! {
        settled = states.wait_for(|s| !s.is_loading) => {
            if settled.is_err() {
                tracing::warn!("Fetch orchestrator stopped before a result was published");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted");
        }
    }

    let state = app.snapshot();
    println!("{}", Screen::from_state(&state));
    if let Some(forecast) = &state.forecast {
        for day in 0..forecast.daily.len() {
            if let Some(detail) = DayDetailView::build(forecast, day) {
                println!("\n{}", detail);
            }
        }
    }

    app.shutdown();
    task.await?;

    Ok(())
}
