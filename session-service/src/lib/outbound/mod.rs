pub mod mailer;
pub mod repositories;
