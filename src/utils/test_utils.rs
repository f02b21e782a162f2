use crate::core::app::App;
use crate::core::assistant::sample_registry;
use crate::core::session::Session;

pub fn create_test_app() -> App {
    App::new(Session::new(sample_registry()), "test-model")
}

/// A test app with `text` typed into the input box.
pub fn create_test_app_with_input(text: &str) -> App {
    let mut app = create_test_app();
    app.ui.set_input_text(text);
    app
}
