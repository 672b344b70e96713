use std::sync::Arc;

use tracing::error;

use ozar_gateway::Gateway;

use crate::error::AppError;
use crate::forms::ContactForm;
use crate::notify::Notifications;

pub struct ContactPage {
    gateway: Arc<dyn Gateway>,
    notify: Notifications,
    pub form: ContactForm,
}

impl ContactPage {
    pub fn new(gateway: Arc<dyn Gateway>, notify: Notifications) -> Self {
        Self {
            gateway,
            notify,
            form: ContactForm::default(),
        }
    }

    /// Store the message and clear the form. The form is kept on failure.
    pub async fn submit(&mut self) -> Result<(), AppError> {
        let message = self.form.validate()?;

        if let Err(e) = self.gateway.insert_contact_message(message).await {
            error!("Error sending message: {}", e);
            self.notify.error("Failed to send message. Please try again.");
            return Err(e.into());
        }

        self.notify.success("Message sent successfully! We will get back to you soon.");
        self.form.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::backend;
    use ozar_gateway::LocalGateway;

    #[tokio::test]
    async fn valid_message_is_stored_once_and_form_cleared() {
        let (_dir, backend) = backend(false).await;
        let mut page = ContactPage::new(Arc::new(LocalGateway::new(backend.clone())), Notifications::new());
        page.form = ContactForm {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            subject: "Team plans".into(),
            message: "Do you offer team pricing?".into(),
        };

        page.submit().await.unwrap();
        assert_eq!(page.form, ContactForm::default());
        assert_eq!(crate::testing::contact_count(&backend).await, 1);
    }

    #[tokio::test]
    async fn invalid_message_never_reaches_the_gateway() {
        let (_dir, backend) = backend(false).await;
        let mut page = ContactPage::new(Arc::new(LocalGateway::new(backend.clone())), Notifications::new());
        page.form.name = "Ada".into();

        assert!(matches!(page.submit().await, Err(AppError::Validation(_))));
        assert_eq!(page.form.name, "Ada");
        assert_eq!(crate::testing::contact_count(&backend).await, 0);
    }
}
