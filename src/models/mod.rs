pub mod configuration;
pub mod dashboard;
pub mod forecasts;
pub mod notifications;
pub mod reports;
pub mod treasury;
pub mod votes;
