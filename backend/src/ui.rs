//! Collaborator contracts for user interaction and message translation.
//!
//! The conversion engine never prints or prompts by itself; it reports through a
//! [`Ui`] and translates user-facing strings through a [`Translate`].

/// Confirmation and reporting sink.
pub trait Ui {
    /// Ask a yes/no question. Returning `false` cancels the action.
    fn ask_yes_no(&mut self, text: &str) -> bool;

    /// What is being done, e.g. "Input: ... Output: ...".
    fn set_info_what(&mut self, message: &str);

    /// How it went: one line per run.
    fn set_info_how(&mut self, message: &str);

    fn show_warning(&mut self, message: &str);

    fn show_error(&mut self, message: &str);
}

/// Translation of message ids.
pub trait Translate {
    fn tr(&self, msgid: &str) -> String;
}

/// Returns every message id unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTranslation;

impl Translate for NoTranslation {
    fn tr(&self, msgid: &str) -> String {
        msgid.to_string()
    }
}

/// Records every message and confirms every question.
#[derive(Debug, Clone, Default)]
pub struct DefaultUi {
    pub info_what: String,
    pub info_how: String,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub questions: Vec<String>,
    /// Answer given to `ask_yes_no`.
    pub decline: bool,
}

impl DefaultUi {
    pub fn new() -> Self {
        DefaultUi::default()
    }

    pub fn declining() -> Self {
        DefaultUi {
            decline: true,
            ..DefaultUi::default()
        }
    }
}

impl Ui for DefaultUi {
    fn ask_yes_no(&mut self, text: &str) -> bool {
        self.questions.push(text.to_string());
        !self.decline
    }

    fn set_info_what(&mut self, message: &str) {
        self.info_what = message.to_string();
    }

    fn set_info_how(&mut self, message: &str) {
        self.info_how = message.to_string();
    }

    fn show_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    fn show_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}
