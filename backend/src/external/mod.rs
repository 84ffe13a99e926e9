//! External integrations: weather API, disease classifier, fertilizer model

pub mod disease_classifier;
pub mod fertilizer_model;
pub mod weather;

pub use disease_classifier::{Classification, DiseaseClassifier, HttpDiseaseClassifier};
pub use fertilizer_model::{load_fertilizer_model, ModelStrategy};
pub use weather::{WeatherClient, WeatherProvider};
