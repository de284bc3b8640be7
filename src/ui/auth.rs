/// Sign-in gate shown while nobody is signed in.

use iced::widget::{button, column, container, text, text_input};
use iced::{Alignment, Element, Length};

#[derive(Debug, Clone)]
pub enum SignInMessage {
    EmailChanged(String),
    PasswordChanged(String),
    Submit,
}

/// Email/password form state
#[derive(Debug, Default)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
    pub error: Option<String>,
    pub busy: bool,
}

impl SignInForm {
    /// Returns the credentials to sign in with once the form is submitted
    pub fn update(&mut self, message: SignInMessage) -> Option<(String, String)> {
        match message {
            SignInMessage::EmailChanged(email) => {
                self.email = email;
                None
            }
            SignInMessage::PasswordChanged(password) => {
                self.password = password;
                None
            }
            SignInMessage::Submit => {
                if self.busy {
                    return None;
                }
                if self.email.trim().is_empty() || self.password.is_empty() {
                    self.error = Some("Enter your email and password.".to_string());
                    return None;
                }
                self.busy = true;
                self.error = None;
                Some((self.email.trim().to_string(), self.password.clone()))
            }
        }
    }

    pub fn finished(&mut self, result: Result<(), String>) {
        self.busy = false;
        match result {
            Ok(()) => {
                self.password.clear();
                self.error = None;
            }
            Err(e) => self.error = Some(e),
        }
    }

    pub fn view(&self) -> Element<'_, SignInMessage> {
        let submit = if self.busy {
            button(text("Signing in..."))
        } else {
            button(text("Sign in")).on_press(SignInMessage::Submit)
        };

        let mut form = column![
            text("AUREVI").size(40),
            text("Sign in to continue").size(16),
            text_input("Email", &self.email)
                .on_input(SignInMessage::EmailChanged)
                .on_submit(SignInMessage::Submit),
            text_input("Password", &self.password)
                .secure(true)
                .on_input(SignInMessage::PasswordChanged)
                .on_submit(SignInMessage::Submit),
            submit.padding(10),
        ]
        .spacing(12)
        .max_width(360)
        .align_x(Alignment::Center);

        if let Some(error) = &self.error {
            form = form.push(text(error).style(text::danger));
        }

        container(form)
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .into()
    }
}
