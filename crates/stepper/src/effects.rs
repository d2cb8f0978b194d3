use crate::settings::Settings;
use crate::store::Store;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;

/// Deferred effects that must run outside the main reducer (randomness,
/// file IO)
#[derive(Debug, Clone)]
pub enum Effect {
    /// Generate a new graph from the current settings
    GenerateGraph { seed: Option<u64> },
    /// Load settings from a JSON file
    LoadSettings { path: PathBuf },
}

/// Execute a single effect against the store
pub fn run(store: &mut Store, effect: Effect) {
    match effect {
        Effect::GenerateGraph { seed } => {
            let outcome = match seed {
                Some(seed) => store.regenerate(&mut StdRng::seed_from_u64(seed)),
                None => store.regenerate(&mut rand::rng()),
            };
            if let Err(e) = outcome {
                tracing::warn!(error = %e, "graph generation failed");
                store.error_message = Some(e.to_string());
            }
        }
        Effect::LoadSettings { path } => match Settings::load(&path) {
            Ok(settings) => {
                tracing::info!(path = %path.display(), "loaded settings");
                store.apply_settings(settings);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "settings not loaded");
                store.error_message = Some(e.to_string());
            }
        },
    }
}
