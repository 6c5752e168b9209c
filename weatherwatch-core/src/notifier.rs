use tracing::info;

/// Observer invoked when the weather category changes.
///
/// Called synchronously from the poll completion path, so implementations
/// must return quickly.
pub trait ChangeNotifier: Send + Sync {
    fn on_weather_changed(&self, category: &str);
}

impl<F> ChangeNotifier for F
where
    F: Fn(&str) + Send + Sync,
{
    fn on_weather_changed(&self, category: &str) {
        self(category)
    }
}

/// Writes every change to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl ChangeNotifier for LogNotifier {
    fn on_weather_changed(&self, category: &str) {
        info!(category, "Weather changed to: {category}");
    }
}
