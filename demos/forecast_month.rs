use riverlevel::{ForecastError, WaterLevelPredictor};
use std::path::Path;

#[tokio::main]
async fn main() -> Result<(), ForecastError> {
    let predictor = WaterLevelPredictor::builder()
        .catalog_path(Path::new("data/water_posts_data.json"))
        .bounds_path(Path::new("data/normalization.json"))
        .model_path(Path::new("data/xgboost.json"))
        .build()
        .await?;

    let days = predictor.reconcile("75163", 2015, 10).await?;
    for day in &days {
        println!(
            "{} {:>4} {:<5} fallback={}",
            day.date,
            day.temperature.map_or("-".to_string(), |t| t.to_string()),
            day.weather,
            day.is_fallback
        );
    }

    let forecast = predictor.predict("75163", 2015, 10).await?;
    if forecast.is_empty() {
        println!("No weather data for this month");
    } else {
        println!("{}", forecast.frame);
    }
    Ok(())
}
