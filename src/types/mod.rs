pub mod day;
pub mod post;
pub mod weather_category;
